// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Inventory ledger and sale reconciler.
//!
//! A [`Ledger`] owns every product and every recorded sale. Sales draw stock
//! from exactly one counter: the flat count of a product, or one size bucket
//! of a sized product. All entry points either complete fully or leave the
//! ledger untouched.

use crate::error::{LedgerError, SkipReason, StockReturnSkipped};
use crate::models::{Product, ProductPatch, Sale, SaleItem, SaleRequest, StockShape};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Outcome of putting a deleted sale's quantity back on the shelf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockReturn {
    Restocked,
    Skipped(StockReturnSkipped),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Sales whose stock effect was reverted.
    pub reverted: usize,
    /// Sales applied from the new history.
    pub applied: usize,
    pub skipped: Vec<StockReturnSkipped>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Shelf {
    products: BTreeMap<String, Product>,
}

impl Shelf {
    /// Resolve the counter a sale of `quantity` would draw from and report
    /// how many units it holds. Returns the bucket key (`None` for flat
    /// stock).
    fn check(
        &self,
        product: &str,
        size: Option<&str>,
        quantity: i64,
    ) -> Result<(Option<String>, i64), LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity(quantity));
        }
        let p = self
            .products
            .get(product)
            .ok_or_else(|| LedgerError::ProductNotFound(product.to_string()))?;
        match &p.stock {
            StockShape::Flat(n) => Ok((None, *n)),
            StockShape::Sized(buckets) => match size.and_then(|s| buckets.get_key_value(s)) {
                Some((key, n)) => Ok((Some(key.clone()), *n)),
                None => Err(LedgerError::InvalidSize {
                    product: product.to_string(),
                    size: size.map(str::to_string),
                }),
            },
        }
    }

    fn take(&mut self, product: &str, size: Option<&str>, quantity: i64) -> Result<(), LedgerError> {
        let (key, available) = self.check(product, size, quantity)?;
        if available < quantity {
            return Err(LedgerError::InsufficientStock {
                product: product.to_string(),
                size: key,
                available,
                requested: quantity,
            });
        }
        if let Some(cell) = self
            .products
            .get_mut(product)
            .and_then(|p| cell_mut(&mut p.stock, key.as_deref()))
        {
            *cell -= quantity;
        }
        Ok(())
    }

    fn return_blocker(&self, sale: &Sale) -> Option<SkipReason> {
        let p = match self.products.get(&sale.product) {
            None => return Some(SkipReason::ProductMissing),
            Some(p) => p,
        };
        let counter = match &p.stock {
            StockShape::Flat(n) => *n,
            StockShape::Sized(buckets) => match sale.size.as_ref().and_then(|s| buckets.get(s)) {
                Some(n) => *n,
                None => return Some(SkipReason::SizeMissing(sale.size.clone())),
            },
        };
        let fits = counter.checked_add(sale.quantity).is_some()
            && p.stock
                .checked_total()
                .and_then(|t| t.checked_add(sale.quantity))
                .is_some();
        if fits {
            None
        } else {
            Some(SkipReason::StockOverflow(sale.quantity))
        }
    }

    fn give_back(&mut self, sale: &Sale) -> Result<(), SkipReason> {
        if let Some(reason) = self.return_blocker(sale) {
            return Err(reason);
        }
        if let Some(cell) = self
            .products
            .get_mut(&sale.product)
            .and_then(|p| cell_mut(&mut p.stock, sale.size.as_deref()))
        {
            *cell += sale.quantity;
        }
        Ok(())
    }
}

fn cell_mut<'a>(stock: &'a mut StockShape, key: Option<&str>) -> Option<&'a mut i64> {
    match stock {
        StockShape::Flat(n) => Some(n),
        StockShape::Sized(buckets) => key.and_then(|k| buckets.get_mut(k)),
    }
}

fn clean(s: &str) -> String {
    s.trim().to_string()
}

fn clean_size(size: Option<String>) -> Option<String> {
    size.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn normalized(req: SaleRequest) -> SaleRequest {
    SaleRequest {
        product: clean(&req.product),
        size: clean_size(req.size),
        buyer: clean(&req.buyer),
        ..req
    }
}

fn validate_product(product: &Product) -> Result<(), LedgerError> {
    if product.name.is_empty() {
        return Err(LedgerError::InvalidProduct("name is required".into()));
    }
    if product.price.is_sign_negative() || product.unit_cost.is_sign_negative() {
        return Err(LedgerError::InvalidProduct(format!(
            "price and cost of '{}' cannot be negative",
            product.name
        )));
    }
    if let StockShape::Sized(buckets) = &product.stock {
        if buckets.is_empty() {
            return Err(LedgerError::InvalidProduct(format!(
                "sized stock of '{}' needs at least one size",
                product.name
            )));
        }
    }
    if product.stock.checked_total().is_none() {
        return Err(LedgerError::InvalidProduct(format!(
            "stock of '{}' is too large to total",
            product.name
        )));
    }
    let min = product.stock.min_count();
    if min < 0 {
        return Err(LedgerError::NegativeStock {
            product: product.name.clone(),
            count: min,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    shelf: Shelf,
    sales: Vec<Sale>,
    next_sale_id: i64,
    commission_rate: Decimal,
}

impl Ledger {
    /// Empty ledger. `commission_rate` is a fraction (0.035 for 3.5 %).
    pub fn new(commission_rate: Decimal) -> Self {
        Self {
            shelf: Shelf::default(),
            sales: Vec::new(),
            next_sale_id: 1,
            commission_rate,
        }
    }

    /// Rebuild a ledger from stored rows. Sales keep their ids; new ids
    /// continue after the highest one.
    pub fn from_parts(products: Vec<Product>, sales: Vec<Sale>, commission_rate: Decimal) -> Self {
        let next_sale_id = sales.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let products = products
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        Self {
            shelf: Shelf { products },
            sales,
            next_sale_id,
            commission_rate,
        }
    }

    pub fn commission_rate(&self) -> Decimal {
        self.commission_rate
    }

    /// Applies to sales recorded from now on; existing sales keep theirs.
    pub fn set_commission_rate(&mut self, rate: Decimal) {
        self.commission_rate = rate;
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.shelf.products.values()
    }

    pub fn product(&self, name: &str) -> Option<&Product> {
        self.shelf.products.get(name)
    }

    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn sale(&self, id: i64) -> Option<&Sale> {
        self.sales.iter().find(|s| s.id == id)
    }

    pub fn add_product(&mut self, mut product: Product) -> Result<(), LedgerError> {
        product.name = clean(&product.name);
        product.code = clean(&product.code);
        product.category = clean(&product.category);
        product.supplier = clean(&product.supplier);
        validate_product(&product)?;
        if self.shelf.products.contains_key(&product.name) {
            return Err(LedgerError::DuplicateProduct(product.name));
        }
        debug!(product = %product.name, stock = product.stock_total(), "product added");
        self.shelf.products.insert(product.name.clone(), product);
        Ok(())
    }

    /// Overwrite fields of `name`. Stock is replaced as given, bypassing
    /// sale semantics. Returns how many sales a rename left orphaned.
    pub fn update_product(&mut self, name: &str, patch: ProductPatch) -> Result<usize, LedgerError> {
        let current = self
            .shelf
            .products
            .get(name)
            .ok_or_else(|| LedgerError::ProductNotFound(name.to_string()))?;
        let mut updated = current.clone();
        if let Some(v) = patch.name {
            updated.name = clean(&v);
        }
        if let Some(v) = patch.code {
            updated.code = clean(&v);
        }
        if let Some(v) = patch.category {
            updated.category = clean(&v);
        }
        if let Some(v) = patch.supplier {
            updated.supplier = clean(&v);
        }
        if let Some(v) = patch.price {
            updated.price = v;
        }
        if let Some(v) = patch.unit_cost {
            updated.unit_cost = v;
        }
        if let Some(v) = patch.stock {
            updated.stock = v;
        }
        validate_product(&updated)?;

        let renamed = updated.name != name;
        if renamed && self.shelf.products.contains_key(&updated.name) {
            return Err(LedgerError::DuplicateProduct(updated.name));
        }
        let orphaned = if renamed {
            self.sales.iter().filter(|s| s.product == name).count()
        } else {
            0
        };
        if orphaned > 0 {
            warn!(from = name, to = %updated.name, orphaned, "rename leaves sales pointing at old name");
        }
        self.shelf.products.remove(name);
        self.shelf.products.insert(updated.name.clone(), updated);
        Ok(orphaned)
    }

    pub fn remove_product(&mut self, name: &str) -> Result<Product, LedgerError> {
        let removed = self
            .shelf
            .products
            .remove(name)
            .ok_or_else(|| LedgerError::ProductNotFound(name.to_string()))?;
        let orphaned = self.sales.iter().filter(|s| s.product == name).count();
        if orphaned > 0 {
            warn!(product = name, orphaned, "removed product still has recorded sales");
        }
        Ok(removed)
    }

    /// Products whose total stock is at or below `threshold`.
    pub fn low_stock(&self, threshold: i64) -> Vec<&Product> {
        self.products()
            .filter(|p| p.stock_total() <= threshold)
            .collect()
    }

    /// Why `sale` could not be returned to stock right now, if anything.
    pub fn return_blocker(&self, sale: &Sale) -> Option<SkipReason> {
        self.shelf.return_blocker(sale)
    }

    fn record(&self, id: i64, req: SaleRequest) -> Sale {
        Sale {
            id,
            date: req.date,
            product: req.product,
            size: req.size,
            quantity: req.quantity,
            buyer: req.buyer,
            unit_price: req.unit_price,
            commission: (req.unit_price * self.commission_rate).normalize(),
        }
    }

    /// Sell from one stock counter and record the sale.
    pub fn apply_sale(&mut self, request: SaleRequest) -> Result<Sale, LedgerError> {
        let req = normalized(request);
        self.shelf
            .take(&req.product, req.size.as_deref(), req.quantity)?;
        let sale = self.record(self.next_sale_id, req);
        self.next_sale_id += 1;
        debug!(
            id = sale.id,
            product = %sale.product,
            size = ?sale.size,
            quantity = sale.quantity,
            "sale applied"
        );
        self.sales.push(sale.clone());
        Ok(sale)
    }

    /// Sell several items to one buyer, all or nothing.
    pub fn apply_multi_sale(
        &mut self,
        buyer: &str,
        date: NaiveDate,
        items: Vec<SaleItem>,
    ) -> Result<Vec<Sale>, LedgerError> {
        let requests: Vec<SaleRequest> = items
            .into_iter()
            .map(|item| normalized(item.into_request(buyer, date)))
            .collect();

        let mut pending: HashMap<(String, Option<String>), i64> = HashMap::new();
        for req in &requests {
            let (key, available) =
                self.shelf
                    .check(&req.product, req.size.as_deref(), req.quantity)?;
            let taken = pending.entry((req.product.clone(), key.clone())).or_insert(0);
            let remaining = available - *taken;
            if remaining < req.quantity {
                return Err(LedgerError::InsufficientStock {
                    product: req.product.clone(),
                    size: key,
                    available: remaining,
                    requested: req.quantity,
                });
            }
            *taken += req.quantity;
        }

        // Holding `&mut self` since the dry run, so every item still fits.
        let mut applied = Vec::with_capacity(requests.len());
        for req in requests {
            applied.push(self.apply_sale(req)?);
        }
        Ok(applied)
    }

    /// Replace the whole sale history: revert every current sale, then apply
    /// `new_sales` in order against the restored stock. On failure nothing
    /// changes.
    pub fn reconcile_sales(&mut self, new_sales: Vec<SaleRequest>) -> Result<ReconcileReport, LedgerError> {
        let mut staged = self.shelf.clone();
        let mut skipped = Vec::new();
        for sale in &self.sales {
            if let Err(reason) = staged.give_back(sale) {
                skipped.push(StockReturnSkipped {
                    sale_id: sale.id,
                    product: sale.product.clone(),
                    quantity: sale.quantity,
                    reason,
                });
            }
        }

        let mut next_id = self.next_sale_id;
        let mut rebuilt = Vec::with_capacity(new_sales.len());
        for (line, request) in new_sales.into_iter().enumerate() {
            let req = normalized(request);
            if let Err(err) = staged.take(&req.product, req.size.as_deref(), req.quantity) {
                warn!(line = line + 1, error = %err, "reconciliation aborted");
                return Err(err);
            }
            rebuilt.push(self.record(next_id, req));
            next_id += 1;
        }

        for s in &skipped {
            warn!(sale = s.sale_id, product = %s.product, reason = %s.reason, "stock return skipped");
        }
        let report = ReconcileReport {
            reverted: self.sales.len(),
            applied: rebuilt.len(),
            skipped,
        };
        self.shelf = staged;
        self.sales = rebuilt;
        self.next_sale_id = next_id;
        info!(
            reverted = report.reverted,
            applied = report.applied,
            skipped = report.skipped.len(),
            "sale history reconciled"
        );
        Ok(report)
    }

    /// Remove a sale and put its quantity back in stock when the product
    /// and bucket still exist.
    pub fn delete_sale(&mut self, sale_id: i64) -> Result<StockReturn, LedgerError> {
        let pos = self
            .sales
            .iter()
            .position(|s| s.id == sale_id)
            .ok_or(LedgerError::SaleNotFound(sale_id))?;
        let sale = self.sales.remove(pos);
        match self.shelf.give_back(&sale) {
            Ok(()) => Ok(StockReturn::Restocked),
            Err(reason) => {
                warn!(sale = sale.id, product = %sale.product, reason = %reason, "stock return skipped");
                Ok(StockReturn::Skipped(StockReturnSkipped {
                    sale_id: sale.id,
                    product: sale.product,
                    quantity: sale.quantity,
                    reason,
                }))
            }
        }
    }
}
