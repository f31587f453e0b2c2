//! Bill of Materials model.
//!
//! A BOM is an ordered list of components. Order is the source row order and is
//! preserved through optimization; components are identified by position.

use serde::{Deserialize, Serialize};

use crate::component::Component;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bom {
    pub components: Vec<Component>,
}

impl Bom {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }

    /// Grand total `Σ cost × quantity`.
    ///
    /// Rows whose cost or quantity does not parse are skipped, not counted as zero.
    pub fn total_cost(&self) -> f64 {
        self.components
            .iter()
            .filter_map(Component::line_cost)
            .sum()
    }

    /// Number of rows that contribute to [`Bom::total_cost`]
    pub fn priced_rows(&self) -> usize {
        self.components
            .iter()
            .filter(|c| c.line_cost().is_some())
            .count()
    }
}

impl From<Vec<Component>> for Bom {
    fn from(components: Vec<Component>) -> Self {
        Self::new(components)
    }
}

impl<'a> IntoIterator for &'a Bom {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(cost: &str, quantity: &str) -> Component {
        Component {
            cost: cost.to_string(),
            quantity: quantity.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_total_skips_unparsable_rows() {
        let bom = Bom::new(vec![line("2.50", "4"), line("bad", "3")]);
        assert!((bom.total_cost() - 10.0).abs() < 1e-9);
        assert_eq!(bom.priced_rows(), 1);
    }

    #[test]
    fn test_total_skips_unparsable_quantity() {
        let bom = Bom::new(vec![line("1.00", ""), line("0.10", "10")]);
        assert!((bom.total_cost() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_bom_total() {
        assert_eq!(Bom::default().total_cost(), 0.0);
    }
}
