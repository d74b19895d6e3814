// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{delete_expense, insert_expense, load_expenses};
use crate::models::Expense;
use crate::utils::{
    date_or_today, matches_any, maybe_print_json, parse_date, parse_decimal, pretty_table,
    search_regex,
};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let date = date_or_today(sub.get_one::<String>("date"))?;
            let category = sub.get_one::<String>("category").unwrap().trim().to_string();
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            if amount.is_sign_negative() {
                return Err(anyhow!("Expense amount cannot be negative, got {}", amount));
            }
            let note = sub
                .get_one::<String>("note")
                .map(|s| s.trim())
                .filter(|s| !s.is_empty());
            let id = insert_expense(conn, date, &category, amount, note)?;
            println!("Recorded expense {}: {} {} on {}", id, category, amount, date);
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            if !delete_expense(conn, id)? {
                return Err(anyhow!("Expense {} not found", id));
            }
            println!("Removed expense {}", id);
        }
        _ => {}
    }
    Ok(())
}

pub fn query_expenses(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Expense>> {
    let re = search_regex(sub.get_one::<String>("search"))?;
    let from = sub.get_one::<String>("from").map(|s| parse_date(s)).transpose()?;
    let to = sub.get_one::<String>("to").map(|s| parse_date(s)).transpose()?;
    Ok(load_expenses(conn)?
        .into_iter()
        .filter(|e| from.is_none_or(|f| e.date >= f) && to.is_none_or(|t| e.date <= t))
        .filter(|e| {
            matches_any(
                re.as_ref(),
                &[e.category.as_str(), e.note.as_deref().unwrap_or("")],
            )
        })
        .collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_expenses(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    e.date.to_string(),
                    e.category.clone(),
                    e.amount.to_string(),
                    e.note.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Date", "Category", "Amount", "Note"], rows)
        );
    }
    Ok(())
}
