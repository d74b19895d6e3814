// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::load_ledger;
use crate::ledger::Ledger;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSummary {
    pub buyer: String,
    pub sales: usize,
    pub units: i64,
    pub revenue: Decimal,
    pub last_purchase: NaiveDate,
}

/// One row per buyer name, biggest revenue first. Sales without a buyer are
/// grouped under "(walk-in)".
pub fn client_summaries(ledger: &Ledger) -> Vec<ClientSummary> {
    let mut map: BTreeMap<&str, ClientSummary> = BTreeMap::new();
    for s in ledger.sales() {
        let buyer = if s.buyer.is_empty() { "(walk-in)" } else { s.buyer.as_str() };
        let entry = map.entry(buyer).or_insert_with(|| ClientSummary {
            buyer: buyer.to_string(),
            sales: 0,
            units: 0,
            revenue: Decimal::ZERO,
            last_purchase: s.date,
        });
        entry.sales += 1;
        entry.units += s.quantity;
        entry.revenue += s.revenue();
        entry.last_purchase = entry.last_purchase.max(s.date);
    }
    let mut out: Vec<ClientSummary> = map.into_values().collect();
    out.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.buyer.cmp(&b.buyer)));
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplierSummary {
    pub supplier: String,
    pub products: usize,
    pub units_on_hand: i64,
    /// Units on hand valued at unit cost.
    pub stock_value: Decimal,
}

pub fn supplier_summaries(ledger: &Ledger) -> Vec<SupplierSummary> {
    let mut map: BTreeMap<&str, SupplierSummary> = BTreeMap::new();
    for p in ledger.products() {
        let supplier = if p.supplier.is_empty() { "(none)" } else { p.supplier.as_str() };
        let entry = map.entry(supplier).or_insert_with(|| SupplierSummary {
            supplier: supplier.to_string(),
            products: 0,
            units_on_hand: 0,
            stock_value: Decimal::ZERO,
        });
        entry.products += 1;
        entry.units_on_hand += p.stock_total();
        entry.stock_value += p.unit_cost * Decimal::from(p.stock_total());
    }
    map.into_values().collect()
}

pub fn handle_clients(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("list", sub)) = m.subcommand() {
        let data = client_summaries(&load_ledger(conn)?);
        if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
            let rows = data
                .iter()
                .map(|c| {
                    vec![
                        c.buyer.clone(),
                        c.sales.to_string(),
                        c.units.to_string(),
                        fmt_money(&c.revenue),
                        c.last_purchase.to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Client", "Sales", "Units", "Revenue", "Last purchase"], rows)
            );
        }
    }
    Ok(())
}

pub fn handle_suppliers(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("list", sub)) = m.subcommand() {
        let data = supplier_summaries(&load_ledger(conn)?);
        if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
            let rows = data
                .iter()
                .map(|s| {
                    vec![
                        s.supplier.clone(),
                        s.products.to_string(),
                        s.units_on_hand.to_string(),
                        fmt_money(&s.stock_value),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Supplier", "Products", "Units", "Stock value (cost)"], rows)
            );
        }
    }
    Ok(())
}
