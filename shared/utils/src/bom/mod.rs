//! BOM (Bill of Materials) Processing Module
//! 
//! Header normalization, CSV parsing and diagnostic validation for BOM files
//! exported by arbitrary tools.

pub mod normalizer;
pub mod parser;
pub mod validator;

pub use normalizer::{normalize_header, ColumnMap};
pub use parser::BomParser;
pub use validator::{BomValidator, ValidationIssue, ValidationReport, ValidationSeverity};
