//! Tiered roster and the baseline cost paired with each tier.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ConfigurationError;
use crate::util::assets;

/// Operators sharing one baseline, e.g. one rarity class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub label: String,
    pub entities: Vec<String>,
}

impl Tier {
    pub fn new<I, S>(label: impl Into<String>, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            entities: entities.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Roster {
    /// Processed in this order.
    pub tiers: Vec<Tier>,
    /// Keyed by position in `tiers`.
    pub baselines: BTreeMap<usize, f64>,
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    tiers: Vec<TierFile>,
    #[serde(default)]
    baselines: BTreeMap<usize, f64>,
}

#[derive(Debug, Deserialize)]
struct TierFile {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    baseline: Option<f64>,
    entities: Vec<String>,
}

impl Roster {
    #[allow(dead_code)]
    pub fn new(tiers: Vec<Tier>, baselines: BTreeMap<usize, f64>) -> Self {
        Self { tiers, baselines }
    }

    /// Parses a roster file. A tier may carry its own `baseline` or take it
    /// from the top-level `baselines` map, but not both with different values.
    pub fn from_json(raw: &str) -> Result<Self, ConfigurationError> {
        let file: RosterFile = serde_json::from_str(raw)
            .map_err(|err| ConfigurationError::MalformedRoster(err.to_string()))?;

        let mut baselines = file.baselines;
        let mut tiers = Vec::with_capacity(file.tiers.len());
        for (index, tier) in file.tiers.into_iter().enumerate() {
            if let Some(value) = tier.baseline {
                match baselines.get(&index) {
                    Some(existing) if *existing != value => {
                        return Err(ConfigurationError::MalformedRoster(format!(
                            "tier {index} baseline given twice ({existing} and {value})"
                        )));
                    }
                    _ => {
                        baselines.insert(index, value);
                    }
                }
            }
            let label = tier.label.unwrap_or_else(|| format!("tier {index}"));
            tiers.push(Tier {
                label,
                entities: tier.entities,
            });
        }

        let roster = Self { tiers, baselines };
        roster.validate()?;
        Ok(roster)
    }

    /// The roster shipped with the binary.
    pub fn builtin() -> Result<Self, ConfigurationError> {
        Self::from_json(&assets::default_roster_json()?)
    }

    /// Every tier must have a finite baseline; nothing is defaulted.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.tiers.is_empty() {
            return Err(ConfigurationError::EmptyRoster);
        }
        for index in 0..self.tiers.len() {
            let value = self
                .baselines
                .get(&index)
                .copied()
                .ok_or(ConfigurationError::MissingBaseline(index))?;
            if !value.is_finite() {
                return Err(ConfigurationError::InvalidBaseline { tier: index, value });
            }
        }
        Ok(())
    }

    pub fn baseline(&self, tier_index: usize) -> Option<f64> {
        self.baselines.get(&tier_index).copied()
    }

    pub fn entity_count(&self) -> usize {
        self.tiers.iter().map(|tier| tier.entities.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_baselines() {
        let roster = Roster::from_json(
            r#"{"tiers": [
                {"label": "6★", "baseline": 6480.68, "entities": ["银灰", "能天使"]},
                {"label": "1★", "baseline": 43.16, "entities": ["Castle-3"]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(roster.tiers.len(), 2);
        assert_eq!(roster.baseline(0), Some(6480.68));
        assert_eq!(roster.baseline(1), Some(43.16));
        assert_eq!(roster.entity_count(), 3);
    }

    #[test]
    fn parses_top_level_baselines() {
        let roster = Roster::from_json(
            r#"{"tiers": [{"entities": ["X"]}], "baselines": {"0": 10.0}}"#,
        )
        .unwrap();

        assert_eq!(roster.tiers[0].label, "tier 0");
        assert_eq!(roster.baseline(0), Some(10.0));
    }

    #[test]
    fn missing_baseline_is_a_configuration_error() {
        let err = Roster::from_json(
            r#"{"tiers": [{"baseline": 1.0, "entities": ["X"]}, {"entities": ["Y"]}]}"#,
        )
        .unwrap_err();
        assert_eq!(err, ConfigurationError::MissingBaseline(1));
    }

    #[test]
    fn conflicting_baselines_are_rejected() {
        let err = Roster::from_json(
            r#"{"tiers": [{"baseline": 1.0, "entities": []}], "baselines": {"0": 2.0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::MalformedRoster(_)));
    }

    #[test]
    fn validate_rejects_empty_and_non_finite() {
        assert_eq!(
            Roster::default().validate(),
            Err(ConfigurationError::EmptyRoster)
        );

        let roster = Roster::new(
            vec![Tier::new("a", ["X"])],
            BTreeMap::from([(0, f64::INFINITY)]),
        );
        assert!(matches!(
            roster.validate(),
            Err(ConfigurationError::InvalidBaseline { tier: 0, .. })
        ));
    }

    #[test]
    fn builtin_roster_is_complete() {
        let roster = Roster::builtin().unwrap();
        assert_eq!(roster.tiers.len(), 5);
        assert_eq!(roster.baseline(0), Some(6480.68));
        assert_eq!(roster.baseline(4), Some(43.16));
        assert!(roster.tiers[0].entities.iter().any(|name| name == "银灰"));
        assert!(roster
            .tiers
            .iter()
            .flat_map(|tier| &tier.entities)
            .all(|name| name.trim() == name && !name.is_empty()));
    }
}
