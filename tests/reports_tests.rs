// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use stockbook::commands::parties::{client_summaries, supplier_summaries};
use stockbook::commands::reports::{income_statement, monthly_cashflow};
use stockbook::commands::doctor::diagnose;
use stockbook::db;
use stockbook::ledger::Ledger;
use stockbook::models::{Expense, Product, SaleRequest, Settings, StockShape};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn sale(date: &str, product: &str, qty: i64, buyer: &str, price: &str) -> SaleRequest {
    SaleRequest {
        date: d(date),
        product: product.into(),
        size: None,
        quantity: qty,
        buyer: buyer.into(),
        unit_price: dec(price),
    }
}

fn expense(id: i64, date: &str, amount: &str) -> Expense {
    Expense {
        id,
        date: d(date),
        category: "Marketing".into(),
        amount: dec(amount),
        note: None,
    }
}

fn shop() -> Ledger {
    let settings = Settings::default();
    let mut l = Ledger::new(settings.commission_rate());
    let mut runner = Product::new("Runner-X", dec("59500"), StockShape::Flat(10));
    runner.unit_cost = dec("20000");
    runner.supplier = "Andes".into();
    l.add_product(runner).unwrap();
    let mut cap = Product::new("Cap", dec("9990"), StockShape::Flat(3));
    cap.unit_cost = dec("4000");
    l.add_product(cap).unwrap();
    l
}

#[test]
fn income_statement_backs_out_vat_and_costs() {
    let mut l = shop();
    l.apply_sale(sale("2025-03-10", "Runner-X", 2, "Ana", "59500")).unwrap();
    l.apply_sale(sale("2025-04-02", "Cap", 1, "Bea", "9990")).unwrap();
    let expenses = vec![expense(1, "2025-03-20", "10005"), expense(2, "2025-04-01", "5000")];

    let st = income_statement(&l, &expenses, &Settings::default(), d("2025-03-01"), d("2025-03-31"));
    assert_eq!(st.units_sold, 2);
    assert_eq!(st.gross_revenue, dec("119000"));
    assert_eq!(st.net_revenue, dec("100000"));
    assert_eq!(st.vat, dec("19000"));
    assert_eq!(st.commissions, dec("4165"));
    assert_eq!(st.direct_costs, dec("40000"));
    assert_eq!(st.expenses, dec("10005"));
    assert_eq!(st.net_result, dec("45830"));
    assert_eq!(st.net_margin_pct, dec("45.83"));
    assert_eq!(st.orphaned_sales, 0);
}

#[test]
fn income_statement_counts_orphans_and_empty_periods() {
    let mut l = shop();
    l.apply_sale(sale("2025-03-10", "Cap", 1, "Ana", "9990")).unwrap();
    l.remove_product("Cap").unwrap();

    let st = income_statement(&l, &[], &Settings::default(), d("2025-03-01"), d("2025-03-31"));
    assert_eq!(st.orphaned_sales, 1);
    assert_eq!(st.direct_costs, Decimal::ZERO);

    let empty = income_statement(&l, &[], &Settings::default(), d("2024-01-01"), d("2024-01-31"));
    assert_eq!(empty.gross_revenue, Decimal::ZERO);
    assert_eq!(empty.net_margin_pct, Decimal::ZERO);
}

#[test]
fn cashflow_lists_newest_month_first() {
    let mut l = shop();
    l.apply_sale(sale("2025-01-15", "Runner-X", 1, "Ana", "59500")).unwrap();
    l.apply_sale(sale("2025-03-10", "Cap", 2, "Bea", "10000")).unwrap();
    let expenses = vec![expense(1, "2025-02-03", "700"), expense(2, "2025-03-04", "300")];

    let months = monthly_cashflow(&l, &expenses, 12);
    let labels: Vec<&str> = months.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(labels, vec!["2025-03", "2025-02", "2025-01"]);
    assert_eq!(months[0].inflow, dec("20000"));
    assert_eq!(months[0].outflow, dec("1000"));
    assert_eq!(months[0].net, dec("19000"));
    assert_eq!(months[1].inflow, Decimal::ZERO);
    assert_eq!(months[1].net, dec("-700"));

    assert_eq!(monthly_cashflow(&l, &expenses, 1).len(), 1);
}

#[test]
fn clients_and_suppliers_are_summarised() {
    let mut l = shop();
    l.apply_sale(sale("2025-03-01", "Cap", 1, "Ana", "9990")).unwrap();
    l.apply_sale(sale("2025-03-05", "Runner-X", 1, "Bea", "59500")).unwrap();
    l.apply_sale(sale("2025-03-09", "Cap", 1, "Ana", "9990")).unwrap();
    l.apply_sale(sale("2025-03-09", "Cap", 1, "", "9990")).unwrap();

    let clients = client_summaries(&l);
    let names: Vec<&str> = clients.iter().map(|c| c.buyer.as_str()).collect();
    assert_eq!(names, vec!["Bea", "Ana", "(walk-in)"]);
    assert_eq!(clients[1].sales, 2);
    assert_eq!(clients[1].revenue, dec("19980"));
    assert_eq!(clients[1].last_purchase, d("2025-03-09"));

    let suppliers = supplier_summaries(&l);
    assert_eq!(suppliers.len(), 2);
    assert_eq!(suppliers[0].supplier, "(none)");
    assert_eq!(suppliers[0].units_on_hand, 0);
    assert_eq!(suppliers[1].supplier, "Andes");
    assert_eq!(suppliers[1].units_on_hand, 9);
    assert_eq!(suppliers[1].stock_value, dec("180000"));
}

#[test]
fn doctor_flags_missing_sizes_and_low_stock() {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    db::with_ledger(&mut conn, |l| {
        l.add_product(Product::new(
            "Trail",
            dec("45990"),
            StockShape::Sized([("38".to_string(), 4), ("39".to_string(), 9)].into()),
        ))?;
        l.add_product(Product::new("Sock", dec("2990"), StockShape::Flat(50)))?;
        l.apply_sale(SaleRequest {
            size: Some("38".into()),
            ..sale("2025-03-01", "Trail", 1, "Ana", "45990")
        })?;
        Ok(())
    })
    .unwrap();
    assert_eq!(diagnose(&conn).unwrap().len(), 0);

    conn.execute("DELETE FROM product_sizes WHERE size = '38'", []).unwrap();
    let issues = diagnose(&conn).unwrap();
    let kinds: Vec<&str> = issues.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(kinds, vec!["missing_size"]);

    conn.execute("UPDATE products SET stock = 2 WHERE name = 'Sock'", []).unwrap();
    let issues = diagnose(&conn).unwrap();
    assert!(issues.iter().any(|(k, d)| k == "low_stock" && d.contains("'Sock'")));
}
