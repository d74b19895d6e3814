// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{load_ledger, with_ledger};
use crate::ledger::StockReturn;
use crate::models::{Sale, SaleItem};
use crate::utils::{
    date_or_today, fmt_money, matches_any, maybe_print_json, parse_date, parse_item,
    pretty_table, search_regex,
};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = date_or_today(sub.get_one::<String>("date"))?;
    let buyer = sub.get_one::<String>("buyer").unwrap().trim().to_string();
    let mut items = sub
        .get_many::<String>("item")
        .unwrap_or_default()
        .map(|s| parse_item(s))
        .collect::<Result<Vec<SaleItem>>>()?;

    let recorded = with_ledger(conn, |ledger| {
        if items.len() == 1 {
            let item = items.remove(0);
            Ok(vec![ledger.apply_sale(item.into_request(&buyer, date))?])
        } else {
            Ok(ledger.apply_multi_sale(&buyer, date, items)?)
        }
    })?;

    let total: rust_decimal::Decimal = recorded.iter().map(Sale::revenue).sum();
    for s in &recorded {
        println!(
            "Sale {}: {} x {}{} @ {} (commission {})",
            s.id,
            s.quantity,
            s.product,
            s.size
                .as_deref()
                .map(|z| format!(" [{}]", z))
                .unwrap_or_default(),
            s.unit_price,
            fmt_money(&s.commission_total())
        );
    }
    println!("Recorded {} item(s) on {}, total {}", recorded.len(), date, fmt_money(&total));
    Ok(())
}

fn remove(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    match with_ledger(conn, |ledger| Ok(ledger.delete_sale(id)?))? {
        StockReturn::Restocked => println!("Deleted sale {} and returned its stock", id),
        StockReturn::Skipped(skip) => {
            println!("Deleted sale {}; stock not returned: {}", id, skip.reason)
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SaleRow {
    pub id: i64,
    pub date: String,
    pub product: String,
    pub size: String,
    pub quantity: i64,
    pub buyer: String,
    pub unit_price: String,
    pub commission: String,
    pub total: String,
}

impl From<&Sale> for SaleRow {
    fn from(s: &Sale) -> Self {
        Self {
            id: s.id,
            date: s.date.to_string(),
            product: s.product.clone(),
            size: s.size.clone().unwrap_or_default(),
            quantity: s.quantity,
            buyer: s.buyer.clone(),
            unit_price: s.unit_price.to_string(),
            commission: s.commission.to_string(),
            total: s.revenue().to_string(),
        }
    }
}

/// Sales filtered by `--search`, `--from`, `--to`, newest first, capped by
/// `--limit`.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<SaleRow>> {
    let re = search_regex(sub.get_one::<String>("search"))?;
    let from = sub.get_one::<String>("from").map(|s| parse_date(s)).transpose()?;
    let to = sub.get_one::<String>("to").map(|s| parse_date(s)).transpose()?;
    let ledger = load_ledger(conn)?;

    let mut sales: Vec<&Sale> = ledger
        .sales()
        .iter()
        .filter(|s| from.is_none_or(|f| s.date >= f) && to.is_none_or(|t| s.date <= t))
        .filter(|s| {
            matches_any(
                re.as_ref(),
                &[
                    s.product.as_str(),
                    s.buyer.as_str(),
                    s.size.as_deref().unwrap_or(""),
                ],
            )
        })
        .collect();
    sales.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sales.truncate(*limit);
    }
    Ok(sales.into_iter().map(SaleRow::from).collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.product.clone(),
                    r.size.clone(),
                    r.quantity.to_string(),
                    r.buyer.clone(),
                    r.unit_price.clone(),
                    r.commission.clone(),
                    r.total.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID", "Date", "Product", "Size", "Qty", "Buyer", "Price", "Commission",
                    "Total"
                ],
                rows,
            )
        );
    }
    Ok(())
}
