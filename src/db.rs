// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::{Expense, Product, Sale, Settings, StockShape};
use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Stockbook", "stockbook"));

pub const DB_ENV: &str = "STOCKBOOK_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("stockbook.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS products(
        name TEXT PRIMARY KEY,
        code TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL DEFAULT '',
        supplier TEXT NOT NULL DEFAULT '',
        price TEXT NOT NULL,
        unit_cost TEXT NOT NULL DEFAULT '0',
        stock_kind TEXT NOT NULL CHECK(stock_kind IN ('flat','sized')),
        stock INTEGER NOT NULL DEFAULT 0 -- flat products only
    );

    CREATE TABLE IF NOT EXISTS product_sizes(
        product TEXT NOT NULL,
        size TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        PRIMARY KEY(product, size),
        FOREIGN KEY(product) REFERENCES products(name) ON UPDATE CASCADE ON DELETE CASCADE
    );

    -- sales reference products by name only; renamed or deleted products orphan them
    CREATE TABLE IF NOT EXISTS sales(
        id INTEGER PRIMARY KEY,
        date TEXT NOT NULL,
        product TEXT NOT NULL,
        size TEXT,
        quantity INTEGER NOT NULL,
        buyer TEXT NOT NULL DEFAULT '',
        unit_price TEXT NOT NULL,
        commission TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_sales_date ON sales(date);

    CREATE TABLE IF NOT EXISTS expenses(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        category TEXT NOT NULL,
        amount TEXT NOT NULL,
        note TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
    "#,
    )?;
    Ok(())
}

fn parse_stored_decimal(s: &str, what: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid {} '{}' in database", what, s))
}

fn parse_stored_date(s: &str) -> Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' in database", s))
}

pub fn load_products(conn: &Connection) -> Result<Vec<Product>> {
    let mut sizes: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();
    let mut stmt = conn.prepare("SELECT product, size, quantity FROM product_sizes")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, i64>(2)?,
        ))
    })?;
    for row in rows {
        let (product, size, qty) = row?;
        sizes.entry(product).or_default().insert(size, qty);
    }

    let mut stmt = conn.prepare(
        "SELECT name, code, category, supplier, price, unit_cost, stock_kind, stock
         FROM products ORDER BY name",
    )?;
    let mut cur = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = cur.next()? {
        let name: String = r.get(0)?;
        let price: String = r.get(4)?;
        let unit_cost: String = r.get(5)?;
        let kind: String = r.get(6)?;
        let stock = match kind.as_str() {
            "flat" => StockShape::Flat(r.get(7)?),
            "sized" => StockShape::Sized(sizes.remove(&name).unwrap_or_default()),
            other => return Err(anyhow!("Unknown stock kind '{}' for '{}'", other, name)),
        };
        out.push(Product {
            code: r.get(1)?,
            category: r.get(2)?,
            supplier: r.get(3)?,
            price: parse_stored_decimal(&price, "price")?,
            unit_cost: parse_stored_decimal(&unit_cost, "unit cost")?,
            stock,
            name,
        });
    }
    Ok(out)
}

pub fn load_sales(conn: &Connection) -> Result<Vec<Sale>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, product, size, quantity, buyer, unit_price, commission
         FROM sales ORDER BY id",
    )?;
    let mut cur = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = cur.next()? {
        let date: String = r.get(1)?;
        let unit_price: String = r.get(6)?;
        let commission: String = r.get(7)?;
        out.push(Sale {
            id: r.get(0)?,
            date: parse_stored_date(&date)?,
            product: r.get(2)?,
            size: r.get(3)?,
            quantity: r.get(4)?,
            buyer: r.get(5)?,
            unit_price: parse_stored_decimal(&unit_price, "unit price")?,
            commission: parse_stored_decimal(&commission, "commission")?,
        });
    }
    Ok(out)
}

pub fn load_ledger(conn: &Connection) -> Result<Ledger> {
    let settings = load_settings(conn)?;
    Ok(Ledger::from_parts(
        load_products(conn)?,
        load_sales(conn)?,
        settings.commission_rate(),
    ))
}

/// Replace the stored products, sizes and sales with the ledger's contents.
pub fn store_ledger(conn: &Connection, ledger: &Ledger) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM sales; DELETE FROM product_sizes; DELETE FROM products;",
    )?;
    let mut ins_p = conn.prepare(
        "INSERT INTO products(name, code, category, supplier, price, unit_cost, stock_kind, stock)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
    )?;
    let mut ins_s = conn
        .prepare("INSERT INTO product_sizes(product, size, quantity) VALUES (?1,?2,?3)")?;
    for p in ledger.products() {
        let (kind, flat) = match &p.stock {
            StockShape::Flat(n) => ("flat", *n),
            StockShape::Sized(_) => ("sized", 0),
        };
        ins_p.execute(params![
            p.name,
            p.code,
            p.category,
            p.supplier,
            p.price.to_string(),
            p.unit_cost.to_string(),
            kind,
            flat
        ])?;
        if let StockShape::Sized(buckets) = &p.stock {
            for (size, qty) in buckets {
                ins_s.execute(params![p.name, size, qty])?;
            }
        }
    }
    let mut ins_sale = conn.prepare(
        "INSERT INTO sales(id, date, product, size, quantity, buyer, unit_price, commission)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
    )?;
    for s in ledger.sales() {
        ins_sale.execute(params![
            s.id,
            s.date.to_string(),
            s.product,
            s.size,
            s.quantity,
            s.buyer,
            s.unit_price.to_string(),
            s.commission.to_string()
        ])?;
    }
    Ok(())
}

/// Run `f` against the stored ledger under an exclusive write lock. The
/// ledger is written back only when `f` succeeds.
pub fn with_ledger<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&mut Ledger) -> Result<T>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut ledger = load_ledger(&tx)?;
    let out = f(&mut ledger)?;
    store_ledger(&tx, &ledger)?;
    tx.commit()?;
    Ok(out)
}

fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn load_settings(conn: &Connection) -> Result<Settings> {
    let mut s = Settings::default();
    if let Some(v) = get_setting(conn, "commission_pct")? {
        s.commission_pct = parse_stored_decimal(&v, "commission_pct")?;
    }
    if let Some(v) = get_setting(conn, "vat_pct")? {
        s.vat_pct = parse_stored_decimal(&v, "vat_pct")?;
    }
    if let Some(v) = get_setting(conn, "low_stock_threshold")? {
        s.low_stock_threshold = v
            .parse()
            .with_context(|| format!("Invalid low_stock_threshold '{}' in database", v))?;
    }
    Ok(s)
}

pub fn save_settings(conn: &Connection, s: &Settings) -> Result<()> {
    set_setting(conn, "commission_pct", &s.commission_pct.to_string())?;
    set_setting(conn, "vat_pct", &s.vat_pct.to_string())?;
    set_setting(conn, "low_stock_threshold", &s.low_stock_threshold.to_string())?;
    Ok(())
}

pub fn insert_expense(
    conn: &Connection,
    date: chrono::NaiveDate,
    category: &str,
    amount: Decimal,
    note: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses(date, category, amount, note) VALUES (?1,?2,?3,?4)",
        params![date.to_string(), category, amount.to_string(), note],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn load_expenses(conn: &Connection) -> Result<Vec<Expense>> {
    let mut stmt =
        conn.prepare("SELECT id, date, category, amount, note FROM expenses ORDER BY date, id")?;
    let mut cur = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = cur.next()? {
        let date: String = r.get(1)?;
        let amount: String = r.get(3)?;
        out.push(Expense {
            id: r.get(0)?,
            date: parse_stored_date(&date)?,
            category: r.get(2)?,
            amount: parse_stored_decimal(&amount, "amount")?,
            note: r.get(4)?,
        });
    }
    Ok(out)
}

/// Returns false when no expense has that id.
pub fn delete_expense(conn: &Connection, id: i64) -> Result<bool> {
    let n = conn.execute("DELETE FROM expenses WHERE id=?1", params![id])?;
    Ok(n > 0)
}
