//! Material name -> equivalent cost per unit.

use std::collections::HashMap;

use super::error::ConfigurationError;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceTable {
    unit_costs: HashMap<String, f64>,
}

impl ReferenceTable {
    /// Builds the table, refusing duplicate names and costs that are not
    /// strictly positive finite numbers.
    pub fn from_rows<I, S>(rows: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut unit_costs = HashMap::new();
        for (name, value) in rows {
            let name = name.into();
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigurationError::InvalidUnitCost { name, value });
            }
            if unit_costs.contains_key(&name) {
                return Err(ConfigurationError::DuplicateItem(name));
            }
            unit_costs.insert(name, value);
        }

        if unit_costs.is_empty() {
            return Err(ConfigurationError::EmptyReferenceTable);
        }

        Ok(Self { unit_costs })
    }

    /// Exact-match lookup. `None` means the name is not in the table;
    /// no trimming or case folding is applied.
    pub fn resolve(&self, name: &str) -> Option<f64> {
        self.unit_costs.get(name).copied()
    }

    #[allow(dead_code)]
    pub fn contains(&self, name: &str) -> bool {
        self.unit_costs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.unit_costs.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.unit_costs.is_empty()
    }
}
