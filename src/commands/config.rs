// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{load_settings, save_settings};
use crate::utils::{parse_decimal, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => show(conn)?,
        Some(("set", sub)) => set(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn show(conn: &Connection) -> Result<()> {
    let s = load_settings(conn)?;
    let rows = vec![
        vec!["commission %".to_string(), s.commission_pct.to_string()],
        vec!["vat %".to_string(), s.vat_pct.to_string()],
        vec!["low-stock threshold".to_string(), s.low_stock_threshold.to_string()],
    ];
    println!("{}", pretty_table(&["Setting", "Value"], rows));
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut s = load_settings(conn)?;
    if let Some(raw) = sub.get_one::<String>("commission") {
        let pct = parse_decimal(raw)?;
        if pct.is_sign_negative() || pct >= rust_decimal::Decimal::ONE_HUNDRED {
            return Err(anyhow!("Commission must be in [0, 100), got {}", pct));
        }
        s.commission_pct = pct;
    }
    if let Some(raw) = sub.get_one::<String>("vat") {
        let pct = parse_decimal(raw)?;
        if pct.is_sign_negative() {
            return Err(anyhow!("VAT cannot be negative, got {}", pct));
        }
        s.vat_pct = pct;
    }
    if let Some(n) = sub.get_one::<i64>("low_stock") {
        s.low_stock_threshold = *n;
    }
    save_settings(conn, &s)?;
    tracing::info!(commission = %s.commission_pct, vat = %s.vat_pct, low_stock = s.low_stock_threshold, "settings saved");
    println!(
        "Settings: commission {}%, VAT {}%, low stock <= {}",
        s.commission_pct, s.vat_pct, s.low_stock_threshold
    );
    Ok(())
}
