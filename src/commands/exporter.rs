// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{load_expenses, load_ledger};
use crate::ledger::Ledger;
use crate::models::Expense;
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use serde_json::json;
use std::path::Path;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("snapshot", sub)) => export_snapshot(conn, sub),
        _ => Ok(()),
    }
}

fn export_snapshot(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim();

    let ledger = load_ledger(conn)?;
    let expenses = load_expenses(conn)?;
    match fmt.as_str() {
        "csv" => write_csv(Path::new(out), &ledger, &expenses)?,
        "json" => write_json(Path::new(out), &ledger, &expenses)?,
        _ => return Err(anyhow!("Unknown format: {} (use csv|json)", fmt)),
    }
    tracing::info!(format = %fmt, out, "snapshot exported");
    println!("Exported products, sales and expenses to {}", out);
    Ok(())
}

/// One file per collection inside `dir`.
pub fn write_csv(dir: &Path, ledger: &Ledger, expenses: &[Expense]) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Create export dir {}", dir.display()))?;

    let mut wtr = csv::Writer::from_path(dir.join("products.csv"))?;
    wtr.write_record([
        "name", "code", "category", "supplier", "price", "unit_cost", "stock", "sizes", "total",
    ])?;
    for p in ledger.products() {
        let (stock, sizes) = if p.stock.is_sized() {
            (String::new(), p.stock.describe())
        } else {
            (p.stock.describe(), String::new())
        };
        wtr.write_record([
            p.name.clone(),
            p.code.clone(),
            p.category.clone(),
            p.supplier.clone(),
            p.price.to_string(),
            p.unit_cost.to_string(),
            stock,
            sizes,
            p.stock_total().to_string(),
        ])?;
    }
    wtr.flush()?;

    let mut wtr = csv::Writer::from_path(dir.join("sales.csv"))?;
    wtr.write_record([
        "id", "date", "product", "size", "quantity", "buyer", "unit_price", "commission",
    ])?;
    for s in ledger.sales() {
        wtr.write_record([
            s.id.to_string(),
            s.date.to_string(),
            s.product.clone(),
            s.size.clone().unwrap_or_default(),
            s.quantity.to_string(),
            s.buyer.clone(),
            s.unit_price.to_string(),
            s.commission.to_string(),
        ])?;
    }
    wtr.flush()?;

    let mut wtr = csv::Writer::from_path(dir.join("expenses.csv"))?;
    wtr.write_record(["id", "date", "category", "amount", "note"])?;
    for e in expenses {
        wtr.write_record([
            e.id.to_string(),
            e.date.to_string(),
            e.category.clone(),
            e.amount.to_string(),
            e.note.clone().unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json(path: &Path, ledger: &Ledger, expenses: &[Expense]) -> Result<()> {
    let products: Vec<_> = ledger
        .products()
        .map(|p| {
            json!({
                "name": p.name, "code": p.code, "category": p.category, "supplier": p.supplier,
                "price": p.price.to_string(), "unit_cost": p.unit_cost.to_string(),
                "stock": p.stock, "total": p.stock_total()
            })
        })
        .collect();
    let sales: Vec<_> = ledger
        .sales()
        .iter()
        .map(|s| {
            json!({
                "id": s.id, "date": s.date.to_string(), "product": s.product, "size": s.size,
                "quantity": s.quantity, "buyer": s.buyer,
                "unit_price": s.unit_price.to_string(), "commission": s.commission.to_string()
            })
        })
        .collect();
    let expenses: Vec<_> = expenses
        .iter()
        .map(|e| {
            json!({
                "id": e.id, "date": e.date.to_string(), "category": e.category,
                "amount": e.amount.to_string(), "note": e.note
            })
        })
        .collect();
    let doc = json!({ "products": products, "sales": sales, "expenses": expenses });
    std::fs::write(path, serde_json::to_string_pretty(&doc)?)
        .with_context(|| format!("Write {}", path.display()))?;
    Ok(())
}
