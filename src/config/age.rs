//! Age configuration structures

use super::normalize_id;
use crate::error::RestartError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// `eventId` or `eventId*weight`
static WEIGHTED_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([^*\s]+)\s*(?:\*\s*([0-9]+(?:\.[0-9]+)?)\s*)?$").expect("valid regex")
});

/// Age configuration for one year
#[derive(Debug, Clone, Deserialize)]
pub struct AgeConfig {
    pub age: i32,
    /// Event pool for this age, in table order
    #[serde(default, alias = "event")]
    pub events: Vec<WeightedEvent>,
}

/// Reference from an age's pool to an event, with its draw weight
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawRef")]
pub struct WeightedEvent {
    pub event_id: String,
    pub weight: f64,
}

impl WeightedEvent {
    pub fn parse(raw: &str) -> Result<Self, RestartError> {
        let caps = WEIGHTED_REF.captures(raw).ok_or_else(|| {
            RestartError::InvalidCatalog(format!("bad event reference '{}'", raw))
        })?;
        let weight = match caps.get(2) {
            Some(w) => w.as_str().parse::<f64>().map_err(|_| {
                RestartError::InvalidCatalog(format!("bad weight in '{}'", raw))
            })?,
            None => 1.0,
        };
        Ok(WeightedEvent {
            event_id: normalize_id(&caps[1]),
            weight,
        })
    }
}

/// Spreadsheet cells arrive as either text or bare numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRef {
    Text(String),
    Number(i64),
    Float(f64),
}

impl TryFrom<RawRef> for WeightedEvent {
    type Error = RestartError;

    fn try_from(raw: RawRef) -> Result<Self, Self::Error> {
        match raw {
            RawRef::Text(text) => WeightedEvent::parse(&text),
            RawRef::Number(id) => Ok(WeightedEvent {
                event_id: id.to_string(),
                weight: 1.0,
            }),
            RawRef::Float(id) => WeightedEvent::parse(&id.to_string()),
        }
    }
}
