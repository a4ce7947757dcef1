//! Event configuration structures

use super::{flag, normalize_id, optional_string_id, string_id};
use crate::error::RestartError;
use serde::Deserialize;

/// Event configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EventConfig {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    pub event: String,
    #[serde(default)]
    pub grade: i32,
    #[serde(default, alias = "noRandom", deserialize_with = "flag")]
    pub no_random: bool,
    #[serde(default)]
    pub include: Option<String>,
    #[serde(default)]
    pub exclude: Option<String>,
    #[serde(default)]
    pub effect: EventEffect,
    /// Priority-ordered follow-ups; the first satisfied branch wins
    #[serde(default)]
    pub branch: Vec<EventBranch>,
    /// Follow-up event id applied when no branch matches
    #[serde(default, alias = "postEvent", deserialize_with = "optional_string_id")]
    pub post_event: Option<String>,
}

/// Event effect on attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventEffect {
    #[serde(default, rename = "CHR")]
    pub chr: i32,
    #[serde(default, rename = "INT")]
    pub int: i32,
    #[serde(default, rename = "STR")]
    pub str_: i32,
    #[serde(default, rename = "MNY")]
    pub mny: i32,
    #[serde(default, rename = "SPR")]
    pub spr: i32,
    #[serde(default, rename = "LIF")]
    pub lif: i32,
    /// Years to advance; `None` means the default single year
    #[serde(default, rename = "AGE")]
    pub age: Option<i32>,
}

/// Conditional follow-up, written as `condition:eventId` or a bare `eventId`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct EventBranch {
    pub condition: Option<String>,
    pub event_id: String,
}

impl TryFrom<String> for EventBranch {
    type Error = RestartError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let (condition, event_id) = match raw.rsplit_once(':') {
            Some((condition, id)) => (Some(condition.trim()), id.trim()),
            None => (None, raw.trim()),
        };
        if event_id.is_empty() {
            return Err(RestartError::InvalidCatalog(format!(
                "branch '{}' has no event id",
                raw
            )));
        }
        Ok(EventBranch {
            condition: condition.filter(|c| !c.is_empty()).map(str::to_string),
            event_id: normalize_id(event_id),
        })
    }
}
