// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a product keeps its stock: one counter, or one counter per size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "stock", rename_all = "snake_case")]
pub enum StockShape {
    Flat(i64),
    Sized(BTreeMap<String, i64>),
}

impl StockShape {
    /// Total units on hand. For sized stock this is always the sum of the
    /// buckets. Saturates at `i64::MAX`; the ledger never stores stock whose
    /// sum overflows.
    pub fn total(&self) -> i64 {
        match self {
            StockShape::Flat(n) => *n,
            StockShape::Sized(buckets) => buckets.values().fold(0i64, |acc, n| acc.saturating_add(*n)),
        }
    }

    /// Total units, or `None` when the buckets do not sum within `i64`.
    pub fn checked_total(&self) -> Option<i64> {
        match self {
            StockShape::Flat(n) => Some(*n),
            StockShape::Sized(buckets) => buckets
                .values()
                .try_fold(0i64, |acc, n| acc.checked_add(*n)),
        }
    }

    pub fn is_sized(&self) -> bool {
        matches!(self, StockShape::Sized(_))
    }

    /// Smallest counter, used to reject negative stock on input.
    pub fn min_count(&self) -> i64 {
        match self {
            StockShape::Flat(n) => *n,
            StockShape::Sized(buckets) => buckets.values().copied().min().unwrap_or(0),
        }
    }

    /// "38=2, 39=0" style rendering for tables and CSV.
    pub fn describe(&self) -> String {
        match self {
            StockShape::Flat(n) => n.to_string(),
            StockShape::Sized(buckets) => buckets
                .iter()
                .map(|(size, n)| format!("{}={}", size, n))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub code: String,
    pub category: String,
    pub supplier: String,
    pub price: Decimal,
    pub unit_cost: Decimal,
    pub stock: StockShape,
}

impl Product {
    pub fn new(name: impl Into<String>, price: Decimal, stock: StockShape) -> Self {
        Self {
            name: name.into(),
            code: String::new(),
            category: String::new(),
            supplier: String::new(),
            price,
            unit_cost: Decimal::ZERO,
            stock,
        }
    }

    pub fn stock_total(&self) -> i64 {
        self.stock.total()
    }
}

/// Field overwrites for an existing product. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub price: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub stock: Option<StockShape>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub date: NaiveDate,
    pub product: String,
    pub size: Option<String>,
    pub quantity: i64,
    pub buyer: String,
    pub unit_price: Decimal,
    /// Per-unit commission, fixed when the sale was recorded.
    pub commission: Decimal,
}

impl Sale {
    pub fn revenue(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn commission_total(&self) -> Decimal {
        self.commission * Decimal::from(self.quantity)
    }
}

/// A sale as submitted by a caller, before the ledger assigns an id and
/// commission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRequest {
    pub date: NaiveDate,
    pub product: String,
    pub size: Option<String>,
    pub quantity: i64,
    pub buyer: String,
    pub unit_price: Decimal,
}

/// One line of a multi-item sale; buyer and date are shared by the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleItem {
    pub product: String,
    pub size: Option<String>,
    pub quantity: i64,
    pub unit_price: Decimal,
}

impl SaleItem {
    pub fn into_request(self, buyer: &str, date: NaiveDate) -> SaleRequest {
        SaleRequest {
            date,
            product: self.product,
            size: self.size,
            quantity: self.quantity,
            buyer: buyer.to_string(),
            unit_price: self.unit_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub date: NaiveDate,
    pub category: String,
    pub amount: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Percent of the sale price kept by the payment gateway.
    pub commission_pct: Decimal,
    pub vat_pct: Decimal,
    pub low_stock_threshold: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            commission_pct: Decimal::new(35, 1),
            vat_pct: Decimal::new(19, 0),
            low_stock_threshold: 5,
        }
    }
}

impl Settings {
    pub fn commission_rate(&self) -> Decimal {
        self.commission_pct / Decimal::ONE_HUNDRED
    }

    pub fn vat_rate(&self) -> Decimal {
        self.vat_pct / Decimal::ONE_HUNDRED
    }
}
