// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::Value;
use std::fs;
use stockbook::{cli, commands, db};
use tempfile::tempdir;

fn seeded_conn() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    for args in [
        vec!["product", "add", "--name", "Cap", "--supplier", "Andes", "--price", "9990", "--stock", "7"],
        vec!["product", "add", "--name", "Trail", "--price", "45990", "--sizes", "38=2,39=1"],
        vec!["sale", "add", "--date", "2025-03-01", "--buyer", "Ana", "--item", "Trail:38=1@45990"],
    ] {
        let mut argv = vec!["stockbook"];
        argv.extend(args);
        let m = cli::build_cli().get_matches_from(argv);
        match m.subcommand() {
            Some(("product", sub)) => commands::products::handle(&mut conn, sub).unwrap(),
            Some(("sale", sub)) => commands::sales::handle(&mut conn, sub).unwrap(),
            _ => unreachable!(),
        }
    }
    db::insert_expense(
        &conn,
        chrono::NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
        "Shipping",
        Decimal::from(3500),
        Some("courier"),
    )
    .unwrap();
    conn
}

fn export(conn: &Connection, format: &str, out: &str) -> anyhow::Result<()> {
    let m = cli::build_cli().get_matches_from([
        "stockbook", "export", "snapshot", "--format", format, "--out", out,
    ]);
    let (_, sub) = m.subcommand().unwrap();
    commands::exporter::handle(conn, sub)
}

#[test]
fn json_snapshot_holds_all_collections() {
    let conn = seeded_conn();
    let dir = tempdir().unwrap();
    let out = dir.path().join("snap.json");
    export(&conn, "JSON", out.to_str().unwrap()).unwrap();

    let doc: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let products = doc["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["name"], "Cap");
    assert_eq!(products[0]["supplier"], "Andes");
    assert_eq!(products[1]["stock"]["kind"], "sized");
    assert_eq!(products[1]["stock"]["stock"]["38"], 1);
    assert_eq!(products[1]["total"], 2);

    let sales = doc["sales"].as_array().unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0]["size"], "38");
    assert_eq!(sales[0]["buyer"], "Ana");
    assert_eq!(sales[0]["unit_price"], "45990");

    assert_eq!(doc["expenses"][0]["category"], "Shipping");
    assert_eq!(doc["expenses"][0]["note"], "courier");
}

#[test]
fn csv_snapshot_writes_one_file_per_collection() {
    let conn = seeded_conn();
    let dir = tempdir().unwrap();
    let out = dir.path().join("snap");
    export(&conn, "csv", out.to_str().unwrap()).unwrap();

    let products = fs::read_to_string(out.join("products.csv")).unwrap();
    let mut lines = products.lines();
    assert_eq!(
        lines.next(),
        Some("name,code,category,supplier,price,unit_cost,stock,sizes,total")
    );
    assert_eq!(lines.next(), Some("Cap,,,Andes,9990,0,7,,7"));
    assert_eq!(lines.next(), Some("Trail,,,,45990,0,,\"38=1, 39=1\",2"));

    let sales = fs::read_to_string(out.join("sales.csv")).unwrap();
    assert_eq!(sales.lines().count(), 2);
    assert!(sales.lines().nth(1).unwrap().starts_with("1,2025-03-01,Trail,38,1,Ana,45990,"));

    let expenses = fs::read_to_string(out.join("expenses.csv")).unwrap();
    assert_eq!(expenses.lines().nth(1), Some("1,2025-03-05,Shipping,3500,courier"));
}

#[test]
fn unknown_format_writes_nothing() {
    let conn = seeded_conn();
    let dir = tempdir().unwrap();
    let out = dir.path().join("snap.xml");
    assert!(export(&conn, "xml", out.to_str().unwrap()).is_err());
    assert!(!out.exists());
}
