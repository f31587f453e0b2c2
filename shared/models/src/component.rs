//! Component domain models for the PartPal BOM optimizer.
//!
//! This module defines the canonical BOM line item, the fixed set of canonical
//! fields every line carries, and the single numeric coercion rule shared by
//! price comparison and cost totals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Canonical BOM fields. These are the only fields a parsed component keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Quantity,
    PartNumber,
    Description,
    Cost,
    Distributor,
}

impl Field {
    /// Fields of interest, in display order
    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::Quantity,
        Field::PartNumber,
        Field::Description,
        Field::Cost,
        Field::Distributor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Quantity => "quantity",
            Field::PartNumber => "part_number",
            Field::Description => "description",
            Field::Cost => "cost",
            Field::Distributor => "distributor",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown canonical field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// A single BOM line item.
///
/// Every canonical field is always present and string-valued at rest; absent
/// source columns default to the empty string. Numbers are only coerced on
/// demand through [`parse_amount`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub quantity: String,
    pub part_number: String,
    pub description: String,
    pub cost: String,
    pub distributor: String,
}

/// Coerce a BOM cell to a number.
///
/// Returns `None` ("unset") for anything that is not a finite decimal after
/// trimming surrounding whitespace. Both offer comparison and cost totals go
/// through here so they agree on what counts as unparsable.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

impl Component {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Quantity => &self.quantity,
            Field::PartNumber => &self.part_number,
            Field::Description => &self.description,
            Field::Cost => &self.cost,
            Field::Distributor => &self.distributor,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Name => self.name = value,
            Field::Quantity => self.quantity = value,
            Field::PartNumber => self.part_number = value,
            Field::Description => self.description = value,
            Field::Cost => self.cost = value,
            Field::Distributor => self.distributor = value,
        }
    }

    /// Current unit cost, or `None` when the cost cell is unset/unparsable
    pub fn unit_cost(&self) -> Option<f64> {
        parse_amount(&self.cost)
    }

    pub fn quantity_value(&self) -> Option<f64> {
        parse_amount(&self.quantity)
    }

    /// `cost × quantity`, or `None` if either side does not parse
    pub fn line_cost(&self) -> Option<f64> {
        Some(self.unit_cost()? * self.quantity_value()?)
    }

    /// Whether an offer at `unit_price` beats the current sourcing.
    ///
    /// An unset cost is always beaten; otherwise the offer must be strictly lower.
    pub fn is_improved_by(&self, unit_price: f64) -> bool {
        match self.unit_cost() {
            Some(current) => unit_price < current,
            None => true,
        }
    }

    /// Record a winning offer in place
    pub fn apply_offer(&mut self, unit_price: f64, distributor: &str) {
        self.cost = unit_price.to_string();
        self.distributor = distributor.to_string();
    }
}
