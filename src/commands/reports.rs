// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{load_expenses, load_ledger, load_settings};
use crate::ledger::Ledger;
use crate::models::{Expense, Settings};
use crate::utils::{first_of_month, fmt_money, maybe_print_json, parse_date, pretty_table, today};
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("income", sub)) => income(conn, sub)?,
        Some(("cashflow", sub)) => cashflow(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomeStatement {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub units_sold: i64,
    /// Sum of price x quantity, VAT included.
    pub gross_revenue: Decimal,
    pub vat: Decimal,
    pub net_revenue: Decimal,
    pub commissions: Decimal,
    /// Unit cost x quantity for sales whose product still exists.
    pub direct_costs: Decimal,
    pub expenses: Decimal,
    pub net_result: Decimal,
    pub net_margin_pct: Decimal,
    /// Sales in the period whose product is gone, so their cost is unknown.
    pub orphaned_sales: usize,
}

/// Income statement over `[from, to]`, both inclusive.
pub fn income_statement(
    ledger: &Ledger,
    expenses: &[Expense],
    settings: &Settings,
    from: NaiveDate,
    to: NaiveDate,
) -> IncomeStatement {
    let in_period = |d: NaiveDate| d >= from && d <= to;

    let mut units_sold = 0;
    let mut gross = Decimal::ZERO;
    let mut commissions = Decimal::ZERO;
    let mut direct_costs = Decimal::ZERO;
    let mut orphaned_sales = 0;
    for s in ledger.sales().iter().filter(|s| in_period(s.date)) {
        units_sold += s.quantity;
        gross += s.revenue();
        commissions += s.commission_total();
        match ledger.product(&s.product) {
            Some(p) => direct_costs += p.unit_cost * Decimal::from(s.quantity),
            None => orphaned_sales += 1,
        }
    }
    let spent: Decimal = expenses
        .iter()
        .filter(|e| in_period(e.date))
        .map(|e| e.amount)
        .sum();

    let net_revenue = (gross / (Decimal::ONE + settings.vat_rate())).round_dp(2);
    let vat = gross - net_revenue;
    let net_result = net_revenue - commissions - direct_costs - spent;
    let net_margin_pct = if net_revenue > Decimal::ZERO {
        (net_result / net_revenue * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    };

    IncomeStatement {
        from,
        to,
        units_sold,
        gross_revenue: gross,
        vat,
        net_revenue,
        commissions,
        direct_costs,
        expenses: spent,
        net_result,
        net_margin_pct,
        orphaned_sales,
    }
}

fn income(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let to = match sub.get_one::<String>("to") {
        Some(s) => parse_date(s)?,
        None => today(),
    };
    let from = match sub.get_one::<String>("from") {
        Some(s) => parse_date(s)?,
        None => first_of_month(to),
    };
    if from > to {
        return Err(anyhow!("--from {} is after --to {}", from, to));
    }
    let ledger = load_ledger(conn)?;
    let expenses = load_expenses(conn)?;
    let settings = load_settings(conn)?;
    let st = income_statement(&ledger, &expenses, &settings, from, to);

    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &st)? {
        return Ok(());
    }
    let rows = vec![
        vec!["Units sold".to_string(), st.units_sold.to_string()],
        vec!["Gross revenue".to_string(), fmt_money(&st.gross_revenue)],
        vec![format!("VAT ({}%)", settings.vat_pct), fmt_money(&st.vat)],
        vec!["Net revenue".to_string(), fmt_money(&st.net_revenue)],
        vec![
            format!("Commissions ({}%)", settings.commission_pct),
            fmt_money(&st.commissions),
        ],
        vec!["Direct costs".to_string(), fmt_money(&st.direct_costs)],
        vec!["Expenses".to_string(), fmt_money(&st.expenses)],
        vec!["Net result".to_string(), fmt_money(&st.net_result)],
        vec!["Net margin %".to_string(), format!("{:.2}", st.net_margin_pct)],
    ];
    println!("Income statement {} .. {}", from, to);
    println!("{}", pretty_table(&["Line", "Amount"], rows));
    if st.orphaned_sales > 0 {
        println!(
            "Note: {} sale(s) reference deleted products; their direct cost is not included",
            st.orphaned_sales
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashflowMonth {
    pub month: String,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub net: Decimal,
}

/// Per-month gross sales in, expenses plus commissions out. Newest month
/// first, at most `months` entries.
pub fn monthly_cashflow(ledger: &Ledger, expenses: &[Expense], months: usize) -> Vec<CashflowMonth> {
    let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for s in ledger.sales() {
        let entry = map
            .entry(s.date.format("%Y-%m").to_string())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 += s.revenue();
        entry.1 += s.commission_total();
    }
    for e in expenses {
        let entry = map
            .entry(e.date.format("%Y-%m").to_string())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.1 += e.amount;
    }
    map.into_iter()
        .rev()
        .take(months)
        .map(|(month, (inflow, outflow))| CashflowMonth {
            month,
            inflow,
            outflow,
            net: inflow - outflow,
        })
        .collect()
}

fn cashflow(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let months: usize = *sub.get_one::<usize>("months").unwrap_or(&12);
    let ledger = load_ledger(conn)?;
    let expenses = load_expenses(conn)?;
    let data = monthly_cashflow(&ledger, &expenses, months);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|m| {
                vec![
                    m.month.clone(),
                    fmt_money(&m.inflow),
                    fmt_money(&m.outflow),
                    fmt_money(&m.net),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "In", "Out", "Net"], rows));
    }
    Ok(())
}
