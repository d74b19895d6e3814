// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use stockbook::error::LedgerError;
use stockbook::models::StockShape;
use stockbook::{cli, commands, db};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn run(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["stockbook"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("product", m)) => commands::products::handle(conn, m),
        Some(("sale", m)) => commands::sales::handle(conn, m),
        Some(("config", m)) => commands::config::handle(conn, m),
        other => panic!("unexpected subcommand {:?}", other.map(|(n, _)| n)),
    }
}

fn seed(conn: &mut Connection) {
    run(
        conn,
        &["product", "add", "--name", "Runner-X", "--price", "50000", "--stock", "10"],
    )
    .unwrap();
    run(
        conn,
        &["product", "add", "--name", "Shoe-42", "--price", "30000", "--sizes", "42=3,43=0"],
    )
    .unwrap();
}

#[test]
fn sale_add_decrements_stored_stock() {
    let mut conn = setup();
    seed(&mut conn);
    run(
        &mut conn,
        &["sale", "add", "--buyer", "Ana", "--date", "2025-03-01", "--item", "Runner-X=4@50000"],
    )
    .unwrap();

    let ledger = db::load_ledger(&conn).unwrap();
    assert_eq!(ledger.product("Runner-X").unwrap().stock, StockShape::Flat(6));
    let sale = &ledger.sales()[0];
    assert_eq!(sale.buyer, "Ana");
    assert_eq!(sale.quantity, 4);
    assert_eq!(sale.commission, Decimal::from(1750));
}

#[test]
fn multi_item_sale_rolls_back_on_any_failure() {
    let mut conn = setup();
    seed(&mut conn);
    let err = run(
        &mut conn,
        &[
            "sale", "add", "--buyer", "Bea", "--item", "Shoe-42:42=2@30000", "--item",
            "Shoe-42:43=1@30000",
        ],
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::InsufficientStock { available: 0, .. })
    ));

    let ledger = db::load_ledger(&conn).unwrap();
    assert_eq!(ledger.product("Shoe-42").unwrap().stock_total(), 3);
    assert!(ledger.sales().is_empty());
}

#[test]
fn sale_rm_returns_stock() {
    let mut conn = setup();
    seed(&mut conn);
    run(&mut conn, &["sale", "add", "--item", "Shoe-42:42=2@30000"]).unwrap();
    let id = db::load_ledger(&conn).unwrap().sales()[0].id;

    run(&mut conn, &["sale", "rm", "--id", &id.to_string()]).unwrap();
    let ledger = db::load_ledger(&conn).unwrap();
    assert!(ledger.sales().is_empty());
    assert_eq!(ledger.product("Shoe-42").unwrap().stock_total(), 3);

    assert!(run(&mut conn, &["sale", "rm", "--id", "99"]).is_err());
}

#[test]
fn configured_commission_applies_to_new_sales_only() {
    let mut conn = setup();
    seed(&mut conn);
    run(&mut conn, &["sale", "add", "--item", "Runner-X=1@50000"]).unwrap();
    run(&mut conn, &["config", "set", "--commission", "5"]).unwrap();
    run(&mut conn, &["sale", "add", "--item", "Runner-X=1@50000"]).unwrap();

    let ledger = db::load_ledger(&conn).unwrap();
    let commissions: Vec<Decimal> = ledger.sales().iter().map(|s| s.commission).collect();
    assert_eq!(commissions, vec![Decimal::from(1750), Decimal::from(2500)]);
}

#[test]
fn list_limit_and_search_respected() {
    let mut conn = setup();
    seed(&mut conn);
    for (d, buyer) in [("2025-01-01", "Ana"), ("2025-01-02", "Bea"), ("2025-01-03", "Ana")] {
        run(
            &mut conn,
            &["sale", "add", "--date", d, "--buyer", buyer, "--item", "Runner-X=1@50000"],
        )
        .unwrap();
    }

    let matches = cli::build_cli().get_matches_from(["stockbook", "sale", "list", "--limit", "2"]);
    if let Some(("sale", sale_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = sale_m.subcommand() {
            let rows = commands::sales::query_rows(&conn, list_m).unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].date, "2025-01-03");
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no sale subcommand");
    }

    let matches = cli::build_cli().get_matches_from([
        "stockbook", "sale", "list", "--search", "bea", "--from", "2025-01-02",
    ]);
    let (_, sale_m) = matches.subcommand().unwrap();
    let (_, list_m) = sale_m.subcommand().unwrap();
    let rows = commands::sales::query_rows(&conn, list_m).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].buyer, "Bea");
}

#[test]
fn malformed_item_is_rejected_before_touching_stock() {
    let mut conn = setup();
    seed(&mut conn);
    assert!(run(&mut conn, &["sale", "add", "--item", "Runner-X@50000"]).is_err());
    let ledger = db::load_ledger(&conn).unwrap();
    assert_eq!(ledger.product("Runner-X").unwrap().stock, StockShape::Flat(10));
}
