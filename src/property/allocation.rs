//! Initial attribute allocation

use crate::config::EngineConfig;
use crate::error::{RestartError, Result};
use crate::property::{AttributeCode, AttributeSet};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;

/// Exactly five whitespace-separated non-negative integers
static MANUAL_INPUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s+(\d+)\s+(\d+)\s+(\d+)\s+(\d+)\s*$").expect("valid regex"));

/// Randomly split the allocation budget across the five allocatable
/// attributes.
///
/// The names are shuffled; each in turn draws from what is left of the
/// budget (never more than the cap) and the last one takes the remainder, so
/// the total always equals the budget.
pub fn random_attributes<R: Rng + ?Sized>(config: &EngineConfig, rng: &mut R) -> AttributeSet {
    let mut names = AttributeCode::ALLOCATABLE;
    names.shuffle(rng);

    let mut set = AttributeSet::new(0, 0, 0, 0, 0, config.initial_life);
    let mut remaining = config.allocation_budget;
    let [first, second, third, fourth, last] = names;
    let rest = [first, second, third, fourth];

    for (i, code) in rest.iter().enumerate() {
        // leave enough room for the names still to come
        let still_to_fill = (rest.len() - i) as i32;
        let floor = (remaining - config.attribute_cap * still_to_fill).max(0);
        let ceiling = remaining.min(config.attribute_cap);
        let value = if floor >= ceiling {
            ceiling
        } else {
            rng.gen_range(floor..=ceiling)
        };
        set.set(*code, value);
        remaining -= value;
    }
    set.set(last, remaining);

    set
}

/// Parse a manual allocation such as `"3 2 1 4 0"`, mapped positionally to
/// CHR INT STR MNY SPR.
///
/// The sum is checked before the per-attribute cap.
pub fn manual_attributes(config: &EngineConfig, raw: &str) -> Result<AttributeSet> {
    let caps = MANUAL_INPUT.captures(raw).ok_or_else(|| {
        RestartError::InvalidAllocation(format!("expected five non-negative integers, got '{}'", raw))
    })?;

    let mut values = [0i32; 5];
    for (slot, value) in values.iter_mut().enumerate() {
        *value = caps[slot + 1]
            .parse()
            .map_err(|_| RestartError::InvalidAllocation(format!("'{}' is out of range", &caps[slot + 1])))?;
    }

    let total: i64 = values.iter().map(|v| i64::from(*v)).sum();
    if total > i64::from(config.allocation_budget) {
        return Err(RestartError::SizeExceeded {
            total: i32::try_from(total).unwrap_or(i32::MAX),
            budget: config.allocation_budget,
        });
    }

    let mut set = AttributeSet::new(0, 0, 0, 0, 0, config.initial_life);
    for (code, value) in AttributeCode::ALLOCATABLE.iter().zip(values) {
        if value > config.attribute_cap {
            return Err(RestartError::ValueExceeded {
                attribute: code.code(),
                value,
                cap: config.attribute_cap,
            });
        }
        set.set(*code, value);
    }

    Ok(set)
}
