//! BOM File Parser
//!
//! Reads a CSV bill of materials with arbitrary vendor headers into the
//! canonical [`Bom`].

use partpal_models::{Bom, Component, Field};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::normalizer::ColumnMap;
use crate::error::{PartPalError, PartPalResult};

/// CSV BOM parser
#[derive(Debug, Clone, Default)]
pub struct BomParser {
    column_map: ColumnMap,
}

impl BomParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column_map(column_map: ColumnMap) -> Self {
        Self { column_map }
    }

    /// Parse a BOM file from disk
    pub fn parse_path(&self, path: &Path) -> PartPalResult<Bom> {
        let file = std::fs::File::open(path).map_err(|e| {
            PartPalError::input(format!("Failed to open BOM file {}: {}", path.display(), e))
        })?;

        let bom = self.parse_reader(file)?;
        info!(path = %path.display(), rows = bom.len(), "Parsed BOM");
        Ok(bom)
    }

    /// Parse BOM from bytes
    pub fn parse_bytes(&self, data: &[u8]) -> PartPalResult<Bom> {
        self.parse_reader(data)
    }

    /// Parse CSV from any reader.
    ///
    /// Headers are normalized once. Each data row becomes one component holding
    /// only the canonical fields; anything the source lacks stays empty. When two
    /// columns map to the same field the rightmost one wins. Any read error is
    /// fatal and no partial BOM is returned.
    pub fn parse_reader<R: Read>(&self, source: R) -> PartPalResult<Bom> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(source);

        let headers = reader.headers()
            .map_err(|e| PartPalError::input(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        if headers.is_empty() {
            return Err(PartPalError::input("BOM is missing a header row"));
        }

        // Column index -> canonical field, for mapped columns only
        let mut columns: Vec<(usize, Field)> = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            match self.column_map.field_for(header) {
                Some(field) => columns.push((idx, field)),
                None => debug!(header, "Ignoring unmapped BOM column"),
            }
        }

        let mut components = Vec::new();

        for (idx, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                PartPalError::input(format!("Row {}: Parse error - {}", idx + 2, e))
            })?;

            let mut component = Component::default();
            for &(col, field) in &columns {
                if let Some(value) = record.get(col) {
                    component.set(field, value);
                }
            }
            components.push(component);
        }

        Ok(Bom::new(components))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_csv_parsing() {
        let csv_data = b"Qty,P/N,Description,Cost\n5,ABC123,Widget,1.20";

        let parser = BomParser::new();
        let bom = parser.parse_bytes(csv_data).unwrap();

        assert_eq!(bom.len(), 1);
        assert_eq!(bom.components[0], Component {
            name: String::new(),
            quantity: "5".to_string(),
            part_number: "ABC123".to_string(),
            description: "Widget".to_string(),
            cost: "1.20".to_string(),
            distributor: String::new(),
        });
    }

    #[test]
    fn test_rows_keep_source_order_and_drop_unmapped_columns() {
        let csv_data = b"Reference,Part Number,Footprint,Quantity,Vendor\n\
            R1,RC0603FR-0710KL,0603,10,Mouser\n\
            C1,CL10B104KB8NNNC,0603,4,\n\
            U1,SN74HC595N,DIP-16,1,DigiKey\n";

        let bom = BomParser::new().parse_bytes(csv_data).unwrap();

        let names: Vec<&str> = bom.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["R1", "C1", "U1"]);
        assert_eq!(bom.components[0].distributor, "Mouser");
        assert_eq!(bom.components[1].distributor, "");
        assert_eq!(bom.components[2].quantity, "1");
        assert!(bom.iter().all(|c| !c.description.contains("DIP")));
    }

    #[test]
    fn test_short_rows_default_to_empty() {
        let csv_data = b"P/N,Qty,Cost\nABC,2\n";
        let bom = BomParser::new().parse_bytes(csv_data).unwrap();
        assert_eq!(bom.components[0].quantity, "2");
        assert_eq!(bom.components[0].cost, "");
    }

    #[test]
    fn test_values_are_not_type_checked() {
        let csv_data = b"P/N,Qty,Cost\nABC,lots,call us\n";
        let bom = BomParser::new().parse_bytes(csv_data).unwrap();
        assert_eq!(bom.components[0].cost, "call us");
        assert_eq!(bom.components[0].unit_cost(), None);
    }

    #[test]
    fn test_duplicate_mapping_rightmost_wins() {
        let csv_data = b"Cost,Unit Price\n1.00,0.80\n";
        let bom = BomParser::new().parse_bytes(csv_data).unwrap();
        assert_eq!(bom.components[0].cost, "0.80");
    }

    #[test]
    fn test_empty_source_is_an_input_error() {
        let err = BomParser::new().parse_bytes(b"").unwrap_err();
        assert_eq!(err.error_code(), "INPUT_ERROR");
    }

    #[test]
    fn test_invalid_utf8_is_fatal() {
        let err = BomParser::new().parse_bytes(b"P/N,Qty\nAB\xff,1\n").unwrap_err();
        assert_eq!(err.error_code(), "INPUT_ERROR");
    }

    #[test]
    fn test_missing_file_is_an_input_error() {
        let err = BomParser::new()
            .parse_path(Path::new("/nonexistent/partpal/bom.csv"))
            .unwrap_err();
        assert!(matches!(err, PartPalError::Input { .. }));
    }

    #[test]
    fn test_parse_path_reads_file() {
        let path = std::env::temp_dir().join(format!("partpal_bom_{}.csv", std::process::id()));
        std::fs::write(&path, "Part Number,Description,Qty\n1234-5678,Resistor,10\n9876-5432,Capacitor,5\n").unwrap();

        let bom = BomParser::new().parse_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(bom.len(), 2);
        assert_eq!(bom.components[1].part_number, "9876-5432");
        assert_eq!(bom.components[1].quantity, "5");
    }

    proptest! {
        /// N data rows always produce N components, identically on re-parse
        #[test]
        fn prop_row_count_and_idempotence(
            rows in prop::collection::vec(("[A-Z0-9]{1,8}", "[0-9]{1,3}", "[a-z ]{0,10}"), 0..25)
        ) {
            let mut csv = String::from("P/N,Qty,Notes\n");
            for (pn, qty, notes) in &rows {
                csv.push_str(&format!("{},{},{}\n", pn, qty, notes));
            }

            let parser = BomParser::new();
            let first = parser.parse_bytes(csv.as_bytes()).unwrap();
            let second = parser.parse_bytes(csv.as_bytes()).unwrap();

            prop_assert_eq!(first.len(), rows.len());
            prop_assert_eq!(&first, &second);
            for (component, (pn, qty, _)) in first.iter().zip(&rows) {
                prop_assert_eq!(&component.part_number, pn);
                prop_assert_eq!(&component.quantity, qty);
                prop_assert_eq!(&component.description, "");
            }
        }
    }
}
