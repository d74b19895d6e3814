// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::with_ledger;
use crate::models::{Product, SaleRequest, StockShape};
use crate::utils::{parse_date, parse_decimal, parse_sizes};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use rusqlite::Connection;
use serde::Deserialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("sales", sub)) => import_sales(conn, sub),
        Some(("products", sub)) => import_products(conn, sub),
        _ => Ok(()),
    }
}

fn reader(path: &str) -> Result<csv::Reader<std::fs::File>> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))
}

/// Columns of a sale history file. Extra columns such as `id`,
/// `commission` or `total` from an export are ignored.
#[derive(Debug, Deserialize)]
struct SaleCsvRow {
    date: String,
    product: String,
    #[serde(default)]
    size: Option<String>,
    quantity: String,
    #[serde(default)]
    buyer: String,
    unit_price: String,
}

pub fn read_sales(path: &str) -> Result<Vec<SaleRequest>> {
    let mut rdr = reader(path)?;
    let mut out = Vec::new();
    for (idx, result) in rdr.deserialize::<SaleCsvRow>().enumerate() {
        let line = idx + 2;
        let row = result.with_context(|| format!("Bad sale row at line {}", line))?;
        out.push(SaleRequest {
            date: parse_date(&row.date).with_context(|| format!("line {}", line))?,
            quantity: row
                .quantity
                .parse()
                .with_context(|| format!("Invalid quantity '{}' at line {}", row.quantity, line))?,
            unit_price: parse_decimal(&row.unit_price).with_context(|| format!("line {}", line))?,
            product: row.product,
            size: row.size.filter(|s| !s.is_empty()),
            buyer: row.buyer,
        });
    }
    Ok(out)
}

fn import_sales(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let requests = read_sales(path)?;
    let report = with_ledger(conn, |ledger| Ok(ledger.reconcile_sales(requests)?))
        .with_context(|| format!("Sale history in {} was not applied", path))?;
    for skip in &report.skipped {
        println!("Warning: {}", skip);
    }
    println!(
        "Replaced {} sale(s) with {} from {}",
        report.reverted, report.applied, path
    );
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ProductCsvRow {
    name: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    supplier: String,
    price: String,
    #[serde(default, alias = "cost")]
    unit_cost: Option<String>,
    #[serde(default)]
    stock: Option<String>,
    #[serde(default)]
    sizes: Option<String>,
}

pub fn read_products(path: &str) -> Result<Vec<Product>> {
    let mut rdr = reader(path)?;
    let mut out = Vec::new();
    for (idx, result) in rdr.deserialize::<ProductCsvRow>().enumerate() {
        let line = idx + 2;
        let row = result.with_context(|| format!("Bad product row at line {}", line))?;
        let stock = match (row.sizes.as_deref(), row.stock.as_deref()) {
            (Some(sizes), _) if !sizes.is_empty() => {
                parse_sizes(sizes).with_context(|| format!("line {}", line))?
            }
            (_, Some(n)) if !n.is_empty() => StockShape::Flat(
                n.parse()
                    .with_context(|| format!("Invalid stock '{}' at line {}", n, line))?,
            ),
            _ => StockShape::Flat(0),
        };
        let unit_cost = match row.unit_cost.as_deref() {
            Some(c) if !c.is_empty() => parse_decimal(c).with_context(|| format!("line {}", line))?,
            _ => rust_decimal::Decimal::ZERO,
        };
        out.push(Product {
            price: parse_decimal(&row.price).with_context(|| format!("line {}", line))?,
            name: row.name,
            code: row.code,
            category: row.category,
            supplier: row.supplier,
            unit_cost,
            stock,
        });
    }
    Ok(out)
}

fn import_products(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let products = read_products(path)?;
    let count = products.len();
    with_ledger(conn, |ledger| {
        for p in products {
            let name = p.name.clone();
            ledger
                .add_product(p)
                .with_context(|| format!("Product '{}' from {}", name, path))?;
        }
        Ok(())
    })?;
    println!("Imported {} product(s) from {}", count, path);
    Ok(())
}
