use crate::error::{ExitForgeError, Result};
use crate::types::Number;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One of the three weighted categories of exit-logic edit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum MutationTier {
    Parametric,
    Structural,
    Relational,
}

impl MutationTier {
    pub const ALL: [MutationTier; 3] = [
        MutationTier::Parametric,
        MutationTier::Structural,
        MutationTier::Relational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MutationTier::Parametric => "parametric",
            MutationTier::Structural => "structural",
            MutationTier::Relational => "relational",
        }
    }
}

/// Parameters controlling one mutation attempt. Constructed by the caller,
/// read-only to the mutator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// When set, bypasses the weighted draw. Left `None` by production
    /// callers; tests use it to pin a tier.
    pub mutation_tier: Option<MutationTier>,
    /// Relative tier weights; must contain at least one positive entry.
    pub probability_weights: BTreeMap<MutationTier, f64>,
    /// Parameter name -> finite ordered set of legal discrete values.
    pub parameter_ranges: BTreeMap<String, Vec<Number>>,
    /// Pins the random stream for this attempt.
    pub seed: Option<u64>,
}

impl Default for MutationConfig {
    fn default() -> Self {
        let mut probability_weights = BTreeMap::new();
        probability_weights.insert(MutationTier::Parametric, 0.80);
        probability_weights.insert(MutationTier::Structural, 0.15);
        probability_weights.insert(MutationTier::Relational, 0.05);

        let mut parameter_ranges = BTreeMap::new();
        parameter_ranges.insert(
            "stop_atr_mult".to_string(),
            vec![
                Number::Float(1.5),
                Number::Float(2.0),
                Number::Float(2.5),
                Number::Float(3.0),
            ],
        );
        parameter_ranges.insert(
            "profit_atr_mult".to_string(),
            vec![
                Number::Float(2.0),
                Number::Float(3.0),
                Number::Float(4.0),
                Number::Float(5.0),
            ],
        );
        parameter_ranges.insert(
            "max_holding_days".to_string(),
            vec![
                Number::Integer(5),
                Number::Integer(10),
                Number::Integer(20),
                Number::Integer(40),
                Number::Integer(60),
            ],
        );
        parameter_ranges.insert(
            "atr_period".to_string(),
            vec![
                Number::Integer(7),
                Number::Integer(14),
                Number::Integer(21),
                Number::Integer(28),
            ],
        );

        Self {
            mutation_tier: None,
            probability_weights,
            parameter_ranges,
            seed: None,
        }
    }
}

impl MutationConfig {
    pub fn validate(&self) -> Result<()> {
        let mut total = 0.0;
        for (tier, weight) in &self.probability_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ExitForgeError::Configuration(format!(
                    "weight for tier '{}' must be a non-negative finite number",
                    tier.as_str()
                )));
            }
            total += weight;
        }
        if total <= 0.0 {
            return Err(ExitForgeError::Configuration(
                "probability weights must contain at least one positive entry".to_string(),
            ));
        }
        for (name, range) in &self.parameter_ranges {
            if range.is_empty() {
                return Err(ExitForgeError::Configuration(format!(
                    "parameter range for '{}' must not be empty",
                    name
                )));
            }
        }
        Ok(())
    }
}
