//! Event selection logic

use crate::condition::check_condition;
use crate::config::{AgeCatalog, EventCatalog, EventConfig, WeightedEvent};
use crate::error::{RestartError, Result};
use crate::property::{AgedAttributes, AttributeSet, AttributeSource};
use rand::Rng;

/// Whether an event may be drawn for the given attributes.
///
/// `no_random` events never are. A satisfied `exclude` rules the event out;
/// otherwise `include`, when present, decides. Condition failures propagate.
pub fn is_eligible<S: AttributeSource + ?Sized>(event: &EventConfig, source: &S) -> Result<bool> {
    if event.no_random {
        return Ok(false);
    }

    if let Some(ref exclude) = event.exclude {
        if check_condition(exclude, source)? {
            return Ok(false);
        }
    }

    if let Some(ref include) = event.include {
        return check_condition(include, source);
    }

    Ok(true)
}

/// Filter an age pool down to eligible `(event_id, weight)` pairs, in pool
/// order
pub fn eligible_events<'a, S: AttributeSource + ?Sized>(
    pool: &'a [WeightedEvent],
    events: &EventCatalog,
    source: &S,
) -> Result<Vec<(&'a str, f64)>> {
    let mut available = Vec::with_capacity(pool.len());

    for entry in pool {
        let event = events.require(&entry.event_id)?;
        let eligible = is_eligible(event, source).inspect_err(|err| {
            tracing::warn!(event_id = %event.id, error = %err, "event condition failed to evaluate");
        })?;
        if eligible {
            available.push((entry.event_id.as_str(), entry.weight));
        }
    }

    Ok(available)
}

/// Weighted random draw.
///
/// A point is drawn uniformly in `[0, total)` and weights are subtracted in
/// order until the remainder goes negative. If float rounding leaves nothing
/// picked, the last item is returned.
pub fn weighted_random<'a, T, R: Rng + ?Sized>(items: &'a [(T, f64)], rng: &mut R) -> Option<&'a T> {
    let (last, _) = items.last()?;

    let total_weight: f64 = items.iter().map(|(_, w)| w).sum();
    let mut random_value = rng.gen::<f64>() * total_weight;

    for (item, weight) in items {
        random_value -= weight;
        if random_value < 0.0 {
            return Some(item);
        }
    }

    Some(last)
}

/// Pick the next event for a session at `age` and append it to the history
pub fn select_event<R: Rng + ?Sized>(
    age: i32,
    attributes: &mut AttributeSet,
    events: &EventCatalog,
    ages: &AgeCatalog,
    rng: &mut R,
) -> Result<String> {
    let age_config = ages.require(age)?;

    let source = AgedAttributes {
        age,
        attributes: &*attributes,
    };
    let available = eligible_events(&age_config.events, events, &source)?;

    let event_id = weighted_random(&available, rng)
        .map(|id| id.to_string())
        .ok_or(RestartError::NoCandidates(age))?;

    tracing::debug!(
        age,
        event_id = %event_id,
        candidates = available.len(),
        "event selected"
    );

    attributes.record_event(&event_id);
    Ok(event_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgeConfig, EventEffect};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn event(id: &str) -> EventConfig {
        EventConfig {
            id: id.to_string(),
            event: format!("Event {}", id),
            grade: 0,
            no_random: false,
            include: None,
            exclude: None,
            effect: EventEffect::default(),
            branch: Vec::new(),
            post_event: None,
        }
    }

    fn pool(refs: &[&str]) -> Vec<WeightedEvent> {
        refs.iter().map(|r| WeightedEvent::parse(r).unwrap()).collect()
    }

    #[test]
    fn test_weighted_random_single() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(weighted_random(&[("a", 1.0)], &mut rng), Some(&"a"));
    }

    #[test]
    fn test_weighted_random_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let items: Vec<(&str, f64)> = vec![];
        assert_eq!(weighted_random(&items, &mut rng), None);
    }

    #[test]
    fn test_weighted_random_zero_total_falls_back_to_last() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            weighted_random(&[("a", 0.0), ("b", 0.0)], &mut rng),
            Some(&"b")
        );
    }

    #[test]
    fn test_weighted_random_distribution() {
        let mut rng = StdRng::seed_from_u64(42);
        let items = [("A", 1.0), ("B", 3.0)];
        let trials = 20_000;
        let a_count = (0..trials)
            .filter(|_| weighted_random(&items, &mut rng) == Some(&"A"))
            .count();

        let ratio = a_count as f64 / trials as f64;
        assert!((ratio - 0.25).abs() < 0.02, "A ratio {}", ratio);
    }

    #[test]
    fn test_eligibility_rules() {
        let set = AttributeSet::new(0, 0, 0, 6, 0, 1);

        let mut e = event("1");
        assert!(is_eligible(&e, &set).unwrap());

        e.no_random = true;
        assert!(!is_eligible(&e, &set).unwrap());

        let mut e = event("2");
        e.include = Some("MNY>=5".into());
        assert!(is_eligible(&e, &set).unwrap());
        e.include = Some("MNY>=7".into());
        assert!(!is_eligible(&e, &set).unwrap());

        let mut e = event("3");
        e.include = Some("MNY>=5".into());
        e.exclude = Some("CHR<1".into());
        assert!(!is_eligible(&e, &set).unwrap());
    }

    #[test]
    fn test_condition_errors_propagate() {
        let set = AttributeSet::default();
        let mut e = event("1");
        e.exclude = Some("BOGUS>1".into());
        assert!(matches!(
            is_eligible(&e, &set),
            Err(RestartError::MissingAttribute(_))
        ));
    }

    #[test]
    fn test_select_event_records_history() {
        let events = EventCatalog::new(vec![event("1"), event("2")]).unwrap();
        let ages = AgeCatalog::new(vec![AgeConfig {
            age: 0,
            events: pool(&["1", "2*0"]),
        }])
        .unwrap();

        let mut set = AttributeSet::new(0, 0, 0, 0, 0, 1);
        let mut rng = StdRng::seed_from_u64(3);
        let id = select_event(0, &mut set, &events, &ages, &mut rng).unwrap();

        assert_eq!(id, "1");
        assert_eq!(set.evt, vec!["1".to_string()]);
    }

    #[test]
    fn test_select_event_errors() {
        let mut hidden = event("1");
        hidden.no_random = true;
        let events = EventCatalog::new(vec![hidden]).unwrap();
        let ages = AgeCatalog::new(vec![
            AgeConfig {
                age: 0,
                events: pool(&["1"]),
            },
            AgeConfig {
                age: 1,
                events: pool(&["404"]),
            },
        ])
        .unwrap();

        let mut set = AttributeSet::default();
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(
            select_event(0, &mut set, &events, &ages, &mut rng),
            Err(RestartError::NoCandidates(0))
        );
        assert_eq!(
            select_event(1, &mut set, &events, &ages, &mut rng),
            Err(RestartError::EventNotFound("404".into()))
        );
        assert_eq!(
            select_event(2, &mut set, &events, &ages, &mut rng),
            Err(RestartError::AgeNotFound(2))
        );
        assert!(set.evt.is_empty());
    }

    #[test]
    fn test_age_is_visible_to_conditions() {
        let mut adult = event("1");
        adult.include = Some("AGE>=18".into());
        let events = EventCatalog::new(vec![adult, event("2")]).unwrap();
        let ages = AgeCatalog::new(vec![
            AgeConfig {
                age: 10,
                events: pool(&["1*1000", "2*0.001"]),
            },
            AgeConfig {
                age: 20,
                events: pool(&["1*1000", "2*0.001"]),
            },
        ])
        .unwrap();

        let mut rng = StdRng::seed_from_u64(9);
        let mut set = AttributeSet::default();
        assert_eq!(select_event(10, &mut set, &events, &ages, &mut rng).unwrap(), "2");

        let mut set = AttributeSet::default();
        let mut hits = 0;
        for _ in 0..50 {
            if select_event(20, &mut set, &events, &ages, &mut rng).unwrap() == "1" {
                hits += 1;
            }
        }
        assert!(hits >= 45);
    }
}
