//! Engine tuning knobs

use crate::error::{RestartError, Result};
use serde::Deserialize;

/// What a step does when no event in the age pool is eligible
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoCandidatesPolicy {
    /// Report `NoCandidates` and leave the session untouched
    #[default]
    Fail,
    /// Let the year pass without an event
    AdvanceAge,
}

/// Engine configuration
///
/// Every field has a default, so `{}` is a valid JSON config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Age a new game starts at
    pub start_age: i32,
    /// Points shared by CHR, INT, STR, MNY and SPR at allocation
    pub allocation_budget: i32,
    /// Largest value any single allocated attribute may receive
    pub attribute_cap: i32,
    /// LIF value at allocation
    pub initial_life: i32,
    /// The game ends once LIF drops below this
    pub min_life: i32,
    /// The game ends once age passes this
    pub max_age: i32,
    /// Longest follow-up chain a single step may resolve
    pub max_chain_depth: usize,
    pub no_candidates: NoCandidatesPolicy,
    /// Sessions idle longer than this are eligible for eviction
    pub idle_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_age: 0,
            allocation_budget: 10,
            attribute_cap: 10,
            initial_life: 1,
            min_life: 1,
            max_age: 500,
            max_chain_depth: 8,
            no_candidates: NoCandidatesPolicy::Fail,
            idle_timeout_secs: 300,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.allocation_budget < 0 {
            return Err(RestartError::InvalidConfig(
                "allocation_budget must not be negative".to_string(),
            ));
        }
        if self.attribute_cap < 0 {
            return Err(RestartError::InvalidConfig(
                "attribute_cap must not be negative".to_string(),
            ));
        }
        // Random allocation must be able to spend the whole budget
        if self.allocation_budget > self.attribute_cap * 5 {
            return Err(RestartError::InvalidConfig(format!(
                "allocation_budget {} cannot fit under attribute_cap {}",
                self.allocation_budget, self.attribute_cap
            )));
        }
        if self.max_age < self.start_age {
            return Err(RestartError::InvalidConfig(
                "max_age is below start_age".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config =
            EngineConfig::from_json(r#"{"allocation_budget": 20, "no_candidates": "advance_age"}"#)
                .unwrap();
        assert_eq!(config.allocation_budget, 20);
        assert_eq!(config.no_candidates, NoCandidatesPolicy::AdvanceAge);
        assert_eq!(config.attribute_cap, 10);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(EngineConfig::from_json(r#"{"allocation_budget": 60}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"max_age": -5}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"attribute_cap": "ten"}"#).is_err());
    }
}
