//! BOM Validator
//!
//! Reports BOM rows that will not take part in lookups or totals. Values are
//! never rejected at parse time, so this is purely diagnostic.

use partpal_models::{Bom, Field};

/// Validation severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    Warning,
    Info,
}

/// Single validation issue
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    /// 1-based data row (the CSV line is `row + 1`)
    pub row: usize,
    pub field: Field,
    pub message: String,
}

/// Validation result for a BOM
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub total_rows: usize,
    pub issues: Vec<ValidationIssue>,
    pub missing_part_numbers: usize,
    pub unparsable_costs: usize,
    pub unparsable_quantities: usize,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Warning)
            .count()
    }
}

/// BOM validator
#[derive(Debug, Clone, Default)]
pub struct BomValidator;

impl BomValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate parsed BOM
    pub fn validate(&self, bom: &Bom) -> ValidationReport {
        let mut issues = Vec::new();
        let mut missing_part_numbers = 0;
        let mut unparsable_costs = 0;
        let mut unparsable_quantities = 0;

        for (idx, component) in bom.iter().enumerate() {
            let row = idx + 1;

            if component.part_number.trim().is_empty() {
                missing_part_numbers += 1;
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Warning,
                    row,
                    field: Field::PartNumber,
                    message: "Missing part number, row cannot be looked up".to_string(),
                });
            }

            // An empty cost is the normal state before optimization
            if component.unit_cost().is_none() {
                unparsable_costs += 1;
                let severity = if component.cost.trim().is_empty() {
                    ValidationSeverity::Info
                } else {
                    ValidationSeverity::Warning
                };
                issues.push(ValidationIssue {
                    severity,
                    row,
                    field: Field::Cost,
                    message: format!("Cost {:?} is not a number, treated as unset", component.cost),
                });
            }

            if component.quantity_value().is_none() {
                unparsable_quantities += 1;
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Warning,
                    row,
                    field: Field::Quantity,
                    message: format!("Quantity {:?} is not a number, row excluded from total", component.quantity),
                });
            }
        }

        ValidationReport {
            total_rows: bom.len(),
            issues,
            missing_part_numbers,
            unparsable_costs,
            unparsable_quantities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partpal_models::Component;

    fn component(part_number: &str, quantity: &str, cost: &str) -> Component {
        Component {
            part_number: part_number.to_string(),
            quantity: quantity.to_string(),
            cost: cost.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_bom() {
        let bom = Bom::new(vec![component("ABC", "2", "0.10")]);
        let report = BomValidator::new().validate(&bom);
        assert!(report.is_clean());
        assert_eq!(report.total_rows, 1);
    }

    #[test]
    fn test_reports_each_problem_without_dropping_rows() {
        let bom = Bom::new(vec![
            component("", "2", "0.10"),
            component("XYZ", "two", ""),
            component("QRS", "1", "bad"),
        ]);
        let report = BomValidator::new().validate(&bom);

        assert_eq!(report.total_rows, 3);
        assert_eq!(report.missing_part_numbers, 1);
        assert_eq!(report.unparsable_quantities, 1);
        assert_eq!(report.unparsable_costs, 2);
        assert_eq!(report.warning_count(), 3);

        let empty_cost = report.issues.iter()
            .find(|i| i.row == 2 && i.field == Field::Cost)
            .unwrap();
        assert_eq!(empty_cost.severity, ValidationSeverity::Info);
    }
}
