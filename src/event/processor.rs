//! Event processing logic

use crate::condition::check_condition;
use crate::config::{EventConfig, EventEffect};
use crate::error::Result;
use crate::property::AttributeSource;

/// Result of processing an event
#[derive(Debug, Clone, PartialEq)]
pub struct EventResult {
    pub event_id: String,
    pub description: String,
    pub grade: i32,
    pub effect: EventEffect,
    pub next_event_id: Option<String>,
}

/// Determine the chained follow-up of an event.
///
/// Branches are tried in order and the first whose condition holds (or which
/// has no condition) wins; otherwise `post_event` applies.
pub fn follow_up<S: AttributeSource + ?Sized>(
    event: &EventConfig,
    source: &S,
) -> Result<Option<String>> {
    for branch in &event.branch {
        let taken = match branch.condition {
            Some(ref condition) => check_condition(condition, source)?,
            None => true,
        };
        if taken {
            return Ok(Some(branch.event_id.clone()));
        }
    }

    Ok(event.post_event.clone())
}

/// Process an event against the attributes it fires on
pub fn process_event<S: AttributeSource + ?Sized>(
    event: &EventConfig,
    source: &S,
) -> Result<EventResult> {
    let next_event_id = follow_up(event, source)?;
    if let Some(ref next) = next_event_id {
        tracing::debug!(event_id = %event.id, next = %next, "follow-up resolved");
    }

    Ok(EventResult {
        event_id: event.id.clone(),
        description: event.event.clone(),
        grade: event.grade,
        effect: event.effect.clone(),
        next_event_id,
    })
}
