// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn period_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("from").long("from").help("Start date YYYY-MM-DD (inclusive)"))
        .arg(Arg::new("to").long("to").help("End date YYYY-MM-DD (inclusive)"))
}

fn search_arg() -> Arg {
    Arg::new("search")
        .long("search")
        .short('s')
        .help("Case-insensitive regex matched against text columns")
}

fn stock_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("stock")
            .long("stock")
            .value_parser(value_parser!(i64))
            .help("Flat stock count"),
    )
    .arg(
        Arg::new("sizes")
            .long("sizes")
            .conflicts_with("stock")
            .help("Per-size stock, e.g. 38=2,39=4"),
    )
}

fn product_cmd() -> Command {
    let add = stock_args(
        Command::new("add")
            .about("Add a product")
            .arg(Arg::new("name").long("name").required(true))
            .arg(Arg::new("code").long("code").default_value(""))
            .arg(Arg::new("category").long("category").default_value(""))
            .arg(Arg::new("supplier").long("supplier").default_value(""))
            .arg(
                Arg::new("price")
                    .long("price")
                    .required(true)
                    .help("Unit sale price"),
            )
            .arg(
                Arg::new("cost")
                    .long("cost")
                    .default_value("0")
                    .help("Unit direct cost"),
            ),
    );
    let edit = stock_args(
        Command::new("edit")
            .about("Overwrite product fields (stock edits bypass sales)")
            .arg(Arg::new("name").long("name").required(true))
            .arg(Arg::new("rename").long("rename"))
            .arg(Arg::new("code").long("code"))
            .arg(Arg::new("category").long("category"))
            .arg(Arg::new("supplier").long("supplier"))
            .arg(Arg::new("price").long("price"))
            .arg(Arg::new("cost").long("cost")),
    );
    Command::new("product")
        .about("Manage inventory")
        .subcommand(add)
        .subcommand(json_flags(
            Command::new("list").about("List products").arg(search_arg()),
        ))
        .subcommand(edit)
        .subcommand(
            Command::new("rm")
                .about("Remove a product")
                .arg(Arg::new("name").long("name").required(true)),
        )
        .subcommand(json_flags(
            Command::new("low-stock")
                .about("Products at or below the low-stock threshold")
                .arg(
                    Arg::new("threshold")
                        .long("threshold")
                        .value_parser(value_parser!(i64)),
                ),
        ))
}

fn sale_cmd() -> Command {
    Command::new("sale")
        .about("Record and browse sales")
        .subcommand(
            Command::new("add")
                .about("Register a sale of one or more items")
                .arg(Arg::new("buyer").long("buyer").default_value(""))
                .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today"))
                .arg(
                    Arg::new("item")
                        .long("item")
                        .short('i')
                        .required(true)
                        .action(ArgAction::Append)
                        .help("PRODUCT[:SIZE]=QTY@PRICE, repeatable"),
                ),
        )
        .subcommand(json_flags(period_args(
            Command::new("list")
                .about("List sales")
                .arg(search_arg())
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                ),
        )))
        .subcommand(
            Command::new("rm")
                .about("Delete a sale and return its stock")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                ),
        )
}

fn expense_cmd() -> Command {
    Command::new("expense")
        .about("Record and browse expenses")
        .subcommand(
            Command::new("add")
                .about("Record an expense")
                .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today"))
                .arg(
                    Arg::new("category")
                        .long("category")
                        .default_value("Other")
                        .help("e.g. Marketing, Shipping, Direct costs, Other"),
                )
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("note").long("note")),
        )
        .subcommand(json_flags(period_args(
            Command::new("list").about("List expenses").arg(search_arg()),
        )))
        .subcommand(
            Command::new("rm").about("Delete an expense").arg(
                Arg::new("id")
                    .long("id")
                    .required(true)
                    .value_parser(value_parser!(i64)),
            ),
        )
}

pub fn build_cli() -> Command {
    Command::new("stockbook")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inventory, sales, expenses and income statements for a small business")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("config")
                .about("Show or change settings")
                .subcommand(Command::new("show").about("Show settings"))
                .subcommand(
                    Command::new("set")
                        .about("Change settings")
                        .arg(
                            Arg::new("commission")
                                .long("commission")
                                .help("Commission percent, e.g. 3.5"),
                        )
                        .arg(Arg::new("vat").long("vat").help("VAT percent, e.g. 19"))
                        .arg(
                            Arg::new("low_stock")
                                .long("low-stock")
                                .value_parser(value_parser!(i64)),
                        ),
                ),
        )
        .subcommand(product_cmd())
        .subcommand(sale_cmd())
        .subcommand(expense_cmd())
        .subcommand(
            Command::new("import")
                .about("Bulk load from CSV")
                .subcommand(
                    Command::new("sales")
                        .about("Replace the whole sale history, reconciling stock")
                        .arg(Arg::new("path").long("path").required(true)),
                )
                .subcommand(
                    Command::new("products")
                        .about("Add products from CSV")
                        .arg(Arg::new("path").long("path").required(true)),
                ),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("snapshot")
                    .about("Products, sales and expenses (csv: directory, json: file)")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv|json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(
            Command::new("report")
                .about("Financial reports")
                .subcommand(json_flags(period_args(
                    Command::new("income").about("Income statement for a period"),
                )))
                .subcommand(json_flags(
                    Command::new("cashflow").about("Monthly cash in and out").arg(
                        Arg::new("months")
                            .long("months")
                            .value_parser(value_parser!(usize)),
                    ),
                )),
        )
        .subcommand(
            Command::new("clients")
                .about("Buyers seen in sales")
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("suppliers")
                .about("Suppliers of stocked products")
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(Command::new("doctor").about("Check sales and stock for problems"))
}
