// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{SaleItem, StockShape};
use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn first_of_month(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

/// Optional `--date`, defaulting to today.
pub fn date_or_today(raw: Option<&String>) -> Result<NaiveDate> {
    match raw {
        Some(s) => parse_date(s),
        None => Ok(today()),
    }
}

/// Parse "38=2,39=4" into sized stock.
pub fn parse_sizes(s: &str) -> Result<StockShape> {
    let mut buckets = BTreeMap::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (size, qty) = part
            .split_once('=')
            .with_context(|| format!("Invalid size entry '{}', expected SIZE=QTY", part))?;
        let size = size.trim();
        if size.is_empty() {
            return Err(anyhow!("Empty size label in '{}'", part));
        }
        let qty: i64 = qty
            .trim()
            .parse()
            .with_context(|| format!("Invalid quantity in '{}'", part))?;
        if buckets.insert(size.to_string(), qty).is_some() {
            return Err(anyhow!("Size '{}' listed twice", size));
        }
    }
    if buckets.is_empty() {
        return Err(anyhow!("No sizes given in '{}'", s));
    }
    Ok(StockShape::Sized(buckets))
}

/// Stock from `--stock N` or `--sizes 38=2,39=4`; `None` when neither is set.
pub fn stock_from_args(m: &clap::ArgMatches) -> Result<Option<StockShape>> {
    if let Some(sizes) = m.get_one::<String>("sizes") {
        return Ok(Some(parse_sizes(sizes)?));
    }
    Ok(m.get_one::<i64>("stock").map(|n| StockShape::Flat(*n)))
}

/// Parse a sale line `PRODUCT[:SIZE]=QTY@PRICE`.
pub fn parse_item(s: &str) -> Result<SaleItem> {
    let (head, price) = s
        .rsplit_once('@')
        .with_context(|| format!("Invalid item '{}', expected PRODUCT[:SIZE]=QTY@PRICE", s))?;
    let (target, qty) = head
        .rsplit_once('=')
        .with_context(|| format!("Invalid item '{}', missing =QTY", s))?;
    let (product, size) = match target.rsplit_once(':') {
        Some((p, sz)) => (p, Some(sz.trim().to_string()).filter(|x| !x.is_empty())),
        None => (target, None),
    };
    let product = product.trim();
    if product.is_empty() {
        return Err(anyhow!("Invalid item '{}', missing product", s));
    }
    let quantity: i64 = qty
        .trim()
        .parse()
        .with_context(|| format!("Invalid quantity '{}' in item '{}'", qty, s))?;
    Ok(SaleItem {
        product: product.to_string(),
        size,
        quantity,
        unit_price: parse_decimal(price)?,
    })
}

/// Case-insensitive matcher for `--search`.
pub fn search_regex(pattern: Option<&String>) -> Result<Option<Regex>> {
    pattern
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|err| anyhow!("Invalid search pattern '{}': {}", p, err))
        })
        .transpose()
}

pub fn matches_any(re: Option<&Regex>, fields: &[&str]) -> bool {
    match re {
        Some(re) => fields.iter().any(|f| re.is_match(f)),
        None => true,
    }
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
