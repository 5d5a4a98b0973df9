use thiserror::Error;

/// Bad inputs that make a run meaningless. Always fatal, raised before any
/// operator is processed.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("tier {0} has no configured baseline")]
    MissingBaseline(usize),
    #[error("tier {tier} baseline {value} is not a finite number")]
    InvalidBaseline { tier: usize, value: f64 },
    #[error("roster has no tiers")]
    EmptyRoster,
    #[error("duplicate item '{0}' in reference table")]
    DuplicateItem(String),
    #[error("item '{name}' has invalid unit cost {value}")]
    InvalidUnitCost { name: String, value: f64 },
    #[error("reference table has no '{0}' column")]
    MissingColumn(String),
    #[error("row {row}: cost '{value}' for '{name}' is not a number")]
    InvalidCostCell {
        row: usize,
        name: String,
        value: String,
    },
    #[error("reference table is empty")]
    EmptyReferenceTable,
    #[error("malformed roster: {0}")]
    MalformedRoster(String),
}
