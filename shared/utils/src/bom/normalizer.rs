//! Column Normalizer
//!
//! Maps vendor-specific CSV header wording onto the canonical BOM fields.

use partpal_models::Field;
use std::collections::HashMap;

use crate::error::{PartPalError, PartPalResult};

/// Canonical field → accepted raw header synonyms.
///
/// Matching is exact and case-sensitive. Entries are scanned in insertion order
/// and the first field whose synonyms contain the header wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    entries: Vec<(Field, Vec<String>)>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        let table: [(Field, &[&str]); 6] = [
            (Field::PartNumber, &["P/N", "Part Number", "Part_No", "PartNumber"]),
            (Field::Quantity, &["Qty", "Quantity", "QTY", "Q"]),
            (Field::Name, &["Reference", "Component", "Name", "Item"]),
            (Field::Description, &["Description", "Desc", "Details"]),
            (Field::Cost, &["Cost", "Price", "Unit Price"]),
            (Field::Distributor, &["Distributor", "Vendor"]),
        ];

        Self {
            entries: table
                .iter()
                .map(|(field, synonyms)| {
                    (*field, synonyms.iter().map(|s| s.to_string()).collect())
                })
                .collect(),
        }
    }
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a synonym for a canonical field.
    ///
    /// A header already claimed by an earlier field keeps resolving to that field.
    pub fn with_synonym(mut self, field: Field, header: impl Into<String>) -> Self {
        let header = header.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some((_, synonyms)) => {
                if !synonyms.contains(&header) {
                    synonyms.push(header);
                }
            }
            None => self.entries.push((field, vec![header])),
        }
        self
    }

    /// Extend the default table with synonyms keyed by canonical field name
    pub fn with_extra_synonyms(mut self, extra: &HashMap<String, Vec<String>>) -> PartPalResult<Self> {
        // Sort for a deterministic result regardless of map iteration order
        let mut keys: Vec<&String> = extra.keys().collect();
        keys.sort();

        for key in keys {
            let field: Field = key.parse().map_err(|e| {
                PartPalError::configuration(format!("bom.extra_synonyms: {}", e))
            })?;
            for header in &extra[key] {
                self = self.with_synonym(field, header.clone());
            }
        }
        Ok(self)
    }

    /// Canonical field for a raw header, if any synonym matches exactly
    pub fn field_for(&self, raw_header: &str) -> Option<Field> {
        self.entries
            .iter()
            .find(|(_, synonyms)| synonyms.iter().any(|s| s == raw_header))
            .map(|(field, _)| *field)
    }

    pub fn synonyms(&self, field: Field) -> &[String] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, synonyms)| synonyms.as_slice())
            .unwrap_or(&[])
    }
}

/// Normalize a raw header to its canonical name.
///
/// Unmapped headers are passed through unchanged.
pub fn normalize_header(raw_header: &str, column_map: &ColumnMap) -> String {
    match column_map.field_for(raw_header) {
        Some(field) => field.as_str().to_string(),
        None => raw_header.to_string(),
    }
}
