//! Canonical product record.
//!
//! Every distributor backend translates its own response shape into a
//! [`ProductRecord`]. A record only exists for a fully successful lookup.

use serde::{Deserialize, Serialize};

/// Normalized distributor offer for a single part number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Distributor's own stock number
    pub part_number: String,
    pub mfr_part_number: String,
    pub manufacturer: String,
    pub unit_price: f64,
    pub availability: u64,
    pub description: String,
    pub datasheet: String,
    pub product_url: String,
}
