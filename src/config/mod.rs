//! Configuration module for game data structures
//!
//! Event and age tables arrive already loaded (from spreadsheets, JSON, or
//! the Python side); this module validates them into read-only catalogs.

mod age;
mod engine;
mod event;

pub use age::*;
pub use engine::*;
pub use event::*;

use crate::error::{RestartError, Result};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Canonical form of an event id.
///
/// Spreadsheet exports write integer ids as `10001.0`; those lose the zero
/// fraction so they match ids written as `10001`. Anything else is only
/// trimmed.
pub(crate) fn normalize_id(raw: &str) -> String {
    let raw = raw.trim();
    if let Some((whole, fraction)) = raw.split_once('.') {
        let digits = whole.strip_prefix('-').unwrap_or(whole);
        let integral = !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());
        if integral && !fraction.is_empty() && fraction.bytes().all(|b| b == b'0') {
            return whole.to_string();
        }
    }
    raw.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Id {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl Id {
    fn into_id(self) -> std::result::Result<String, String> {
        match self {
            Id::Text(text) => Ok(normalize_id(&text)),
            Id::Integer(n) => Ok(n.to_string()),
            Id::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Ok((f as i64).to_string())
            }
            Id::Float(f) => Err(format!("event id {} is not an integer", f)),
        }
    }
}

/// Accept an id written either as a string or as a bare number
pub(crate) fn string_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Id::deserialize(deserializer)?
        .into_id()
        .map_err(serde::de::Error::custom)
}

/// [`string_id`] for optional fields
pub(crate) fn optional_string_id<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Id>::deserialize(deserializer)?
        .map(Id::into_id)
        .transpose()
        .map_err(serde::de::Error::custom)
}

/// Accept a flag written as a bool or as a 0/1 integer (nonzero is set)
pub(crate) fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(i64),
        Null(()),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Number(n) => n != 0,
        Flag::Null(()) => false,
    })
}

/// All events, keyed by id
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    events: HashMap<String, EventConfig>,
}

impl EventCatalog {
    /// Build a catalog, rejecting duplicate ids
    pub fn new(records: impl IntoIterator<Item = EventConfig>) -> Result<Self> {
        let mut events = HashMap::new();
        for record in records {
            if events.contains_key(&record.id) {
                return Err(RestartError::InvalidCatalog(format!(
                    "duplicate event id {}",
                    record.id
                )));
            }
            events.insert(record.id.clone(), record);
        }
        Ok(Self { events })
    }

    /// Build from a JSON array of event records
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<EventConfig> = serde_json::from_str(json)?;
        Self::new(records)
    }

    pub fn get(&self, id: &str) -> Option<&EventConfig> {
        self.events.get(id)
    }

    /// Like [`get`](Self::get), but a missing id is an error
    pub fn require(&self, id: &str) -> Result<&EventConfig> {
        self.get(id)
            .ok_or_else(|| RestartError::EventNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventConfig> {
        self.events.values()
    }
}

/// All age pools, keyed by age
#[derive(Debug, Clone, Default)]
pub struct AgeCatalog {
    ages: HashMap<i32, AgeConfig>,
}

impl AgeCatalog {
    /// Build a catalog, rejecting duplicate ages and negative weights
    pub fn new(records: impl IntoIterator<Item = AgeConfig>) -> Result<Self> {
        let mut ages = HashMap::new();
        for record in records {
            if let Some(bad) = record
                .events
                .iter()
                .find(|e| !e.weight.is_finite() || e.weight < 0.0)
            {
                return Err(RestartError::InvalidCatalog(format!(
                    "age {} gives event {} weight {}",
                    record.age, bad.event_id, bad.weight
                )));
            }
            if ages.contains_key(&record.age) {
                return Err(RestartError::InvalidCatalog(format!(
                    "duplicate age {}",
                    record.age
                )));
            }
            ages.insert(record.age, record);
        }
        Ok(Self { ages })
    }

    /// Build from a JSON array of age records
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<AgeConfig> = serde_json::from_str(json)?;
        Self::new(records)
    }

    pub fn get(&self, age: i32) -> Option<&AgeConfig> {
        self.ages.get(&age)
    }

    pub fn require(&self, age: i32) -> Result<&AgeConfig> {
        self.get(age).ok_or(RestartError::AgeNotFound(age))
    }

    pub fn len(&self) -> usize {
        self.ages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgeConfig> {
        self.ages.values()
    }
}

/// Check that every age pool, branch, and follow-up names a known event
pub fn validate_references(events: &EventCatalog, ages: &AgeCatalog) -> Result<()> {
    for age in ages.iter() {
        for entry in &age.events {
            if events.get(&entry.event_id).is_none() {
                return Err(RestartError::InvalidCatalog(format!(
                    "age {} references unknown event {}",
                    age.age, entry.event_id
                )));
            }
        }
    }

    for event in events.iter() {
        let follow_ups = event
            .branch
            .iter()
            .map(|b| b.event_id.as_str())
            .chain(event.post_event.as_deref());
        for id in follow_ups {
            if events.get(id).is_none() {
                return Err(RestartError::InvalidCatalog(format!(
                    "event {} chains to unknown event {}",
                    event.id, id
                )));
            }
        }
    }

    Ok(())
}
