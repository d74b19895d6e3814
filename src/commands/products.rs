// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{load_ledger, load_settings, with_ledger};
use crate::models::{Product, ProductPatch, StockShape};
use crate::utils::{
    matches_any, maybe_print_json, parse_decimal, pretty_table, search_regex, stock_from_args,
};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            let removed = with_ledger(conn, |ledger| Ok(ledger.remove_product(&name)?))?;
            println!(
                "Removed product '{}' ({} units on hand)",
                removed.name,
                removed.stock_total()
            );
        }
        Some(("low-stock", sub)) => low_stock(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let stock = stock_from_args(sub)?.unwrap_or(StockShape::Flat(0));
    let product = Product {
        name: sub.get_one::<String>("name").unwrap().to_string(),
        code: sub.get_one::<String>("code").unwrap().to_string(),
        category: sub.get_one::<String>("category").unwrap().to_string(),
        supplier: sub.get_one::<String>("supplier").unwrap().to_string(),
        price: parse_decimal(sub.get_one::<String>("price").unwrap())?,
        unit_cost: parse_decimal(sub.get_one::<String>("cost").unwrap())?,
        stock,
    };
    let label = format!("{} [{}]", product.name.trim(), product.stock.describe());
    with_ledger(conn, |ledger| Ok(ledger.add_product(product)?))?;
    println!("Added product {}", label);
    Ok(())
}

fn edit(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    let opt_decimal = |key: &str| -> Result<Option<rust_decimal::Decimal>> {
        sub.get_one::<String>(key)
            .map(|s| parse_decimal(s))
            .transpose()
    };
    let patch = ProductPatch {
        name: sub.get_one::<String>("rename").cloned(),
        code: sub.get_one::<String>("code").cloned(),
        category: sub.get_one::<String>("category").cloned(),
        supplier: sub.get_one::<String>("supplier").cloned(),
        price: opt_decimal("price")?,
        unit_cost: opt_decimal("cost")?,
        stock: stock_from_args(sub)?,
    };
    let orphaned = with_ledger(conn, |ledger| Ok(ledger.update_product(&name, patch)?))?;
    println!("Updated product '{}'", name);
    if orphaned > 0 {
        println!(
            "Warning: {} sale(s) still reference '{}' and will not return stock if deleted",
            orphaned, name
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ProductRow {
    pub name: String,
    pub code: String,
    pub category: String,
    pub supplier: String,
    pub price: String,
    pub unit_cost: String,
    pub stock: String,
    pub total: i64,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            code: p.code.clone(),
            category: p.category.clone(),
            supplier: p.supplier.clone(),
            price: p.price.to_string(),
            unit_cost: p.unit_cost.to_string(),
            stock: p.stock.describe(),
            total: p.stock_total(),
        }
    }
}

impl ProductRow {
    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.code.clone(),
            self.category.clone(),
            self.supplier.clone(),
            self.price.clone(),
            self.unit_cost.clone(),
            self.stock.clone(),
            self.total.to_string(),
        ]
    }
}

const HEADERS: [&str; 8] = [
    "Product", "Code", "Category", "Supplier", "Price", "Cost", "Stock", "Total",
];

pub fn query_products(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<ProductRow>> {
    let re = search_regex(sub.get_one::<String>("search"))?;
    let ledger = load_ledger(conn)?;
    Ok(ledger
        .products()
        .filter(|p| {
            matches_any(
                re.as_ref(),
                &[
                    p.name.as_str(),
                    p.code.as_str(),
                    p.category.as_str(),
                    p.supplier.as_str(),
                ],
            )
        })
        .map(ProductRow::from)
        .collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_products(conn, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let rows = data.iter().map(ProductRow::cells).collect();
    println!("{}", pretty_table(&HEADERS, rows));

    let threshold = load_settings(conn)?.low_stock_threshold;
    let low: Vec<Vec<String>> = data
        .iter()
        .filter(|r| r.total <= threshold)
        .map(|r| vec![r.name.clone(), r.stock.clone(), r.total.to_string()])
        .collect();
    if !low.is_empty() {
        println!("Low stock (<= {})", threshold);
        println!("{}", pretty_table(&["Product", "Stock", "Total"], low));
    }
    Ok(())
}

fn low_stock(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let threshold = match sub.get_one::<i64>("threshold") {
        Some(t) => *t,
        None => load_settings(conn)?.low_stock_threshold,
    };
    let ledger = load_ledger(conn)?;
    let data: Vec<ProductRow> = ledger
        .low_stock(threshold)
        .into_iter()
        .map(ProductRow::from)
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data.iter().map(ProductRow::cells).collect();
        println!("{}", pretty_table(&HEADERS, rows));
    }
    Ok(())
}
