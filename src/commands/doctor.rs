// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{load_ledger, load_settings};
use crate::error::SkipReason;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

/// Problems found in the stored data, as (issue, detail) pairs.
pub fn diagnose(conn: &Connection) -> Result<Vec<(String, String)>> {
    let ledger = load_ledger(conn)?;
    let threshold = load_settings(conn)?.low_stock_threshold;
    let mut rows = Vec::new();

    // 1) Sales whose stock could not be returned if deleted
    for s in ledger.sales() {
        match ledger.return_blocker(s) {
            Some(SkipReason::ProductMissing) => rows.push((
                "orphan_sale".to_string(),
                format!("sale {} -> '{}'", s.id, s.product),
            )),
            Some(SkipReason::SizeMissing(size)) => rows.push((
                "missing_size".to_string(),
                format!(
                    "sale {} -> '{}' size {}",
                    s.id,
                    s.product,
                    size.unwrap_or_else(|| "(none)".into())
                ),
            )),
            Some(reason @ SkipReason::StockOverflow(_)) => rows.push((
                "stock_overflow".to_string(),
                format!("sale {} -> '{}': {}", s.id, s.product, reason),
            )),
            None => {}
        }
    }

    // 2) Low stock
    for p in ledger.low_stock(threshold) {
        rows.push((
            "low_stock".to_string(),
            format!("'{}' has {} (<= {})", p.name, p.stock_total(), threshold),
        ));
    }
    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = diagnose(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = rows.into_iter().map(|(a, b)| vec![a, b]).collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
