// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Typed failures raised by the ledger.
//!
//! Every variant is recoverable: the caller gets enough context to fix the
//! input and retry, and the ledger is never left half-mutated.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Product '{0}' not found")]
    ProductNotFound(String),

    /// A sized product was addressed without a size, or with a size it
    /// does not stock.
    #[error("Product '{product}' has no size bucket {size:?}")]
    InvalidSize {
        product: String,
        size: Option<String>,
    },

    #[error("Quantity must be greater than 0 (got {0})")]
    InvalidQuantity(i64),

    #[error("Insufficient stock for '{product}'{}: available {available}, requested {requested}", size_suffix(.size))]
    InsufficientStock {
        product: String,
        size: Option<String>,
        available: i64,
        requested: i64,
    },

    #[error("Sale {0} not found")]
    SaleNotFound(i64),

    #[error("Product '{0}' already exists")]
    DuplicateProduct(String),

    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    #[error("Stock for '{product}' cannot be negative (got {count})")]
    NegativeStock { product: String, count: i64 },
}

fn size_suffix(size: &Option<String>) -> String {
    match size {
        Some(s) => format!(" size {}", s),
        None => String::new(),
    }
}

/// Why a sale's quantity could not be put back on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("product no longer exists")]
    ProductMissing,

    #[error("{}", missing_size(.0))]
    SizeMissing(Option<String>),

    /// The counter cannot hold the returned quantity.
    #[error("returning {0} unit(s) would overflow the stock counter")]
    StockOverflow(i64),
}

fn missing_size(size: &Option<String>) -> String {
    match size {
        Some(s) => format!("size bucket '{}' no longer exists", s),
        None => "sale has no size for a sized product".to_string(),
    }
}

/// A stock return that was dropped instead of applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sale {sale_id}: {quantity} x '{product}' not returned ({reason})")]
pub struct StockReturnSkipped {
    pub sale_id: i64,
    pub product: String,
    pub quantity: i64,
    pub reason: SkipReason,
}
