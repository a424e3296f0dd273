//! Configuration of the SEG and TRA measures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::lineage::ConsistencyMode;
use crate::{Error, Result};

/// Weights of the six AOGM graph edit operations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyConfig {
    /// Splitting a result vertex that covers several GT objects
    pub split: f64,
    /// Adding a missed (false-negative) vertex
    pub false_negative: f64,
    /// Deleting a spurious (false-positive) vertex
    pub false_positive: f64,
    /// Deleting a redundant edge
    pub redundant_edge: f64,
    /// Adding a missing edge
    pub missing_edge: f64,
    /// Changing the semantics of an edge
    pub wrong_semantics: f64,
}

impl PenaltyConfig {
    /// Create a validated penalty configuration.
    ///
    /// # Arguments
    /// Weights in the order: split, false negative, false positive,
    /// redundant edge, missing edge, wrong semantics.
    pub fn new(
        split: f64,
        false_negative: f64,
        false_positive: f64,
        redundant_edge: f64,
        missing_edge: f64,
        wrong_semantics: f64,
    ) -> Result<Self> {
        let config = Self {
            split,
            false_negative,
            false_positive,
            redundant_edge,
            missing_edge,
            wrong_semantics,
        };
        config.validate()?;
        Ok(config)
    }

    /// The weights used by the Cell Tracking Challenge.
    pub fn cell_tracking_challenge() -> Self {
        Self {
            split: 5.0,
            false_negative: 10.0,
            false_positive: 1.0,
            redundant_edge: 1.0,
            missing_edge: 1.5,
            wrong_semantics: 1.0,
        }
    }

    /// Check that every weight is finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("split", self.split),
            ("false negative", self.false_negative),
            ("false positive", self.false_positive),
            ("redundant edge", self.redundant_edge),
            ("missing edge", self.missing_edge),
            ("wrong semantics", self.wrong_semantics),
        ];
        for (name, w) in weights {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} penalty must be a non-negative number, got {}",
                    name, w
                )));
            }
        }
        Ok(())
    }
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self::cell_tracking_challenge()
    }
}

/// Which value the tracking measure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraMode {
    /// Normalized TRA in [0, 1]
    #[default]
    Tra,
    /// Raw AOGM cost
    Aogm,
}

/// Configuration for the SEG measure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegConfig {
    /// Report the Jaccard index of every GT object
    pub verbose: bool,
}

/// Configuration for the TRA / AOGM measure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraConfig {
    /// Edit operation weights.
    pub penalty: PenaltyConfig,

    /// Lineage consistency checking before scoring.
    pub consistency: ConsistencyMode,

    /// Report TRA or the raw AOGM cost.
    pub mode: TraMode,

    /// Report every edit operation, grouped by category.
    pub verbose: bool,
}

impl TraConfig {
    /// Configuration of the AOGM measure (raw cost, CTC weights).
    pub fn aogm() -> Self {
        Self {
            mode: TraMode::Aogm,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file; missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.as_ref().display(), e)))?;
        config.penalty.validate()?;
        Ok(config)
    }
}
