// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod config;
pub mod products;
pub mod sales;
pub mod expenses;
pub mod reports;
pub mod parties;
pub mod importer;
pub mod exporter;
pub mod doctor;
