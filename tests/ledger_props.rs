// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use stockbook::ledger::Ledger;
use stockbook::models::{Product, SaleItem, SaleRequest, StockShape};

const SIZES: [&str; 3] = ["S", "M", "L"];

fn shop() -> Ledger {
    let mut l = Ledger::new(Decimal::new(35, 3));
    let buckets: BTreeMap<String, i64> = SIZES.iter().map(|s| (s.to_string(), 5)).collect();
    l.add_product(Product::new("Tee", Decimal::from(100), StockShape::Sized(buckets)))
        .unwrap();
    l.add_product(Product::new("Cap", Decimal::from(80), StockShape::Flat(8)))
        .unwrap();
    l
}

fn to_item(product: usize, size: usize, quantity: i64) -> SaleItem {
    if product == 0 {
        SaleItem {
            product: "Tee".into(),
            size: Some(SIZES[size].into()),
            quantity,
            unit_price: Decimal::from(100),
        }
    } else {
        SaleItem {
            product: "Cap".into(),
            size: None,
            quantity,
            unit_price: Decimal::from(80),
        }
    }
}

fn total(l: &Ledger, name: &str) -> i64 {
    l.product(name).unwrap().stock_total()
}

fn bucket_sum(l: &Ledger) -> i64 {
    match &l.product("Tee").unwrap().stock {
        StockShape::Sized(b) => b.values().sum(),
        StockShape::Flat(_) => unreachable!(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// A batch commits exactly when every stock cell covers its cumulative
    /// demand; otherwise the ledger is unchanged.
    #[test]
    fn multi_sale_commits_all_or_nothing(
        lines in prop::collection::vec((0usize..2, 0usize..3, 1i64..6), 1..6)
    ) {
        let mut l = shop();
        let before = l.clone();
        let mut demand: HashMap<(usize, Option<usize>), i64> = HashMap::new();
        for (p, s, q) in &lines {
            let key = if *p == 0 { (0, Some(*s)) } else { (1, None) };
            *demand.entry(key).or_insert(0) += q;
        }
        let fits = demand
            .iter()
            .all(|(k, q)| if k.0 == 0 { *q <= 5 } else { *q <= 8 });

        let items = lines.iter().map(|(p, s, q)| to_item(*p, *s, *q)).collect();
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let result = l.apply_multi_sale("Eve", date, items);

        prop_assert_eq!(result.is_ok(), fits);
        if fits {
            let sold: i64 = lines.iter().map(|(_, _, q)| q).sum();
            prop_assert_eq!(total(&l, "Tee") + total(&l, "Cap"), 15 + 8 - sold);
            prop_assert_eq!(l.sales().len(), lines.len());
        } else {
            prop_assert_eq!(&l, &before);
        }
        prop_assert_eq!(total(&l, "Tee"), bucket_sum(&l));
    }

    /// Stock on hand plus units in recorded sales is conserved across any
    /// mix of sales and deletions.
    #[test]
    fn stock_is_conserved(
        ops in prop::collection::vec((any::<bool>(), 0usize..2, 0usize..3, 1i64..4), 1..30)
    ) {
        let mut l = shop();
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        for (sell, p, s, q) in ops {
            if sell || l.sales().is_empty() {
                let item = to_item(p, s, q);
                let _ = l.apply_sale(SaleRequest {
                    date,
                    product: item.product,
                    size: item.size,
                    quantity: item.quantity,
                    buyer: "Eve".into(),
                    unit_price: item.unit_price,
                });
            } else {
                let id = l.sales()[s % l.sales().len()].id;
                l.delete_sale(id).unwrap();
            }
            let sold: i64 = l.sales().iter().map(|x| x.quantity).sum();
            prop_assert_eq!(total(&l, "Tee") + total(&l, "Cap") + sold, 23);
            prop_assert_eq!(total(&l, "Tee"), bucket_sum(&l));
            prop_assert!(l.products().all(|p| p.stock.min_count() >= 0));
        }
    }
}
