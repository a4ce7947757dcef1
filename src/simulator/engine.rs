//! Trajectory runner: allocation and year-by-year stepping

use rand::Rng;

use crate::config::{validate_references, AgeCatalog, EngineConfig, EventCatalog, NoCandidatesPolicy};
use crate::error::{RestartError, Result};
use crate::event::{process_event, select_event};
use crate::property::{manual_attributes, random_attributes, AgedAttributes, AttributeSet};

use super::{SessionStatus, UserSession};

/// Grade markers used in rendered text, indexed by grade
pub const GRADE_MARKERS: [&str; 4] = ["⚪", "🔵", "🟣", "🟠"];

/// One event that fired during a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearEvent {
    pub event_id: String,
    pub description: String,
    pub grade: i32,
}

/// Result of a single step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrajectoryEntry {
    /// Age the events happened at
    pub age: i32,
    /// Primary event first, then its follow-ups in chain order
    pub events: Vec<YearEvent>,
    /// One line per event, prefixed with its grade marker
    pub text: String,
    /// [CHR, INT, STR, MNY, SPR, LIF] after the step
    pub attributes: [i32; 6],
    pub is_end: bool,
}

impl TrajectoryEntry {
    fn new(age: i32, events: Vec<YearEvent>, attributes: &AttributeSet, is_end: bool) -> Self {
        let text = render_text(&events);
        Self {
            age,
            events,
            text,
            attributes: attributes.numbers(),
            is_end,
        }
    }

    pub fn event_ids(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.event_id.as_str())
    }
}

fn grade_marker(grade: i32) -> &'static str {
    usize::try_from(grade)
        .ok()
        .and_then(|g| GRADE_MARKERS.get(g))
        .copied()
        .unwrap_or(GRADE_MARKERS[0])
}

fn render_text(events: &[YearEvent]) -> String {
    events
        .iter()
        .map(|e| format!("{} {}", grade_marker(e.grade), e.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drives sessions through allocation and the yearly event loop.
///
/// Catalogs and config are read-only; all per-player state lives in the
/// [`UserSession`] passed to each call.
#[derive(Debug, Clone)]
pub struct TrajectoryRunner {
    events: EventCatalog,
    ages: AgeCatalog,
    config: EngineConfig,
}

impl TrajectoryRunner {
    pub fn new(events: EventCatalog, ages: AgeCatalog, config: EngineConfig) -> Self {
        Self {
            events,
            ages,
            config,
        }
    }

    /// Like [`new`](Self::new), after checking the config and every event
    /// reference in the catalogs
    pub fn validated(events: EventCatalog, ages: AgeCatalog, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        validate_references(&events, &ages)?;
        tracing::info!(
            events = events.len(),
            ages = ages.len(),
            "trajectory runner ready"
        );
        Ok(Self::new(events, ages, config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn events(&self) -> &EventCatalog {
        &self.events
    }

    pub fn ages(&self) -> &AgeCatalog {
        &self.ages
    }

    // ------------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------------

    pub fn allocate_random(&self, session: &mut UserSession) -> Result<AttributeSet> {
        self.allocate_random_with(session, &mut rand::thread_rng())
    }

    pub fn allocate_random_with<R: Rng + ?Sized>(
        &self,
        session: &mut UserSession,
        rng: &mut R,
    ) -> Result<AttributeSet> {
        ensure_unallocated(session)?;
        let attributes = random_attributes(&self.config, rng);
        Ok(commit_allocation(session, attributes))
    }

    /// Allocate from player input such as `"3 2 1 4 0"`
    pub fn allocate_manual(&self, session: &mut UserSession, raw: &str) -> Result<AttributeSet> {
        ensure_unallocated(session)?;
        let attributes = manual_attributes(&self.config, raw)?;
        Ok(commit_allocation(session, attributes))
    }

    // ------------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------------

    /// Whether a game at `age` with these attributes is over
    pub fn is_terminal(&self, age: i32, attributes: &AttributeSet) -> bool {
        attributes.lif < self.config.min_life || age > self.config.max_age
    }

    pub fn step(&self, session: &mut UserSession) -> Result<TrajectoryEntry> {
        self.step_with_rng(session, &mut rand::thread_rng())
    }

    /// Advance the session by one step.
    ///
    /// The session is only written once the whole step has succeeded.
    pub fn step_with_rng<R: Rng + ?Sized>(
        &self,
        session: &mut UserSession,
        rng: &mut R,
    ) -> Result<TrajectoryEntry> {
        let attributes = active_attributes(session)?;
        let (age, attributes, entry) = self.advance(session.age, attributes, rng)?;
        commit_step(session, age, attributes, &entry);
        Ok(entry)
    }

    pub fn step_many(&self, session: &mut UserSession, n: usize) -> Result<Vec<TrajectoryEntry>> {
        self.step_many_with_rng(session, n, &mut rand::thread_rng())
    }

    /// Step up to `n` times, stopping early at the end of the game.
    ///
    /// All or nothing: if any step fails the session is left exactly as it
    /// was and no entries are returned.
    pub fn step_many_with_rng<R: Rng + ?Sized>(
        &self,
        session: &mut UserSession,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<TrajectoryEntry>> {
        let mut attributes = active_attributes(session)?.clone();
        let mut age = session.age;
        let mut entries = Vec::with_capacity(n.min(64));

        for _ in 0..n {
            let (next_age, next, entry) = self.advance(age, &attributes, rng)?;
            age = next_age;
            attributes = next;
            let is_end = entry.is_end;
            entries.push(entry);
            if is_end {
                break;
            }
        }

        if let Some(last) = entries.last() {
            commit_step(session, age, attributes, last);
        }
        Ok(entries)
    }

    /// Compute one step from `(age, attributes)` without touching the session
    fn advance<R: Rng + ?Sized>(
        &self,
        age: i32,
        attributes: &AttributeSet,
        rng: &mut R,
    ) -> Result<(i32, AttributeSet, TrajectoryEntry)> {
        if self.is_terminal(age, attributes) {
            let entry = TrajectoryEntry::new(age, Vec::new(), attributes, true);
            return Ok((age, attributes.clone(), entry));
        }

        let mut working = attributes.clone();
        let (events, years) = match select_event(age, &mut working, &self.events, &self.ages, rng) {
            Ok(primary) => self.resolve_chain(age, primary, &mut working)?,
            Err(RestartError::NoCandidates(_))
                if self.config.no_candidates == NoCandidatesPolicy::AdvanceAge =>
            {
                tracing::warn!(age, "no eligible event; year passes");
                (Vec::new(), 1)
            }
            Err(err) => return Err(err),
        };

        let next_age = age.saturating_add(years);
        let is_end = self.is_terminal(next_age, &working);
        let entry = TrajectoryEntry::new(age, events, &working, is_end);
        Ok((next_age, working, entry))
    }

    /// Fire the primary event and every chained follow-up.
    ///
    /// Each event's follow-up is decided against the attributes before its
    /// own effect applies. Returns the fired events and the years to advance.
    fn resolve_chain(
        &self,
        age: i32,
        primary: String,
        working: &mut AttributeSet,
    ) -> Result<(Vec<YearEvent>, i32)> {
        let mut fired = Vec::new();
        let mut years = 0i32;
        let mut next = Some(primary);

        while let Some(event_id) = next {
            let depth = fired.len();
            if depth > self.config.max_chain_depth {
                return Err(RestartError::ChainTooDeep(event_id));
            }

            let event = self.events.require(&event_id)?;
            // the selector already recorded the primary
            if depth > 0 {
                working.record_event(&event_id);
            }

            let result = process_event(
                event,
                &AgedAttributes {
                    age,
                    attributes: &*working,
                },
            )?;
            working.apply_effect(&result.effect);

            let advance = match (depth, result.effect.age) {
                (0, explicit) => explicit.unwrap_or(1),
                (_, explicit) => explicit.unwrap_or(0),
            };
            years = years.saturating_add(advance.max(0));

            next = result.next_event_id;
            fired.push(YearEvent {
                event_id: result.event_id,
                description: result.description,
                grade: result.grade,
            });
        }

        Ok((fired, years))
    }
}

fn ensure_unallocated(session: &UserSession) -> Result<()> {
    if session.attributes.is_some() {
        return Err(RestartError::AlreadyAllocated);
    }
    Ok(())
}

fn commit_allocation(session: &mut UserSession, attributes: AttributeSet) -> AttributeSet {
    tracing::info!(
        identity = %session.identity,
        attributes = ?attributes.numbers(),
        "attributes allocated"
    );
    session.attributes = Some(attributes.clone());
    session.status = SessionStatus::Active;
    attributes
}

fn active_attributes(session: &UserSession) -> Result<&AttributeSet> {
    match (session.status, session.attributes.as_ref()) {
        (SessionStatus::Ended, _) => Err(RestartError::AlreadyEnded),
        (SessionStatus::Active, Some(attributes)) => Ok(attributes),
        _ => Err(RestartError::AttributesNotAllocated),
    }
}

fn commit_step(session: &mut UserSession, age: i32, attributes: AttributeSet, last: &TrajectoryEntry) {
    session.age = age;
    session.attributes = Some(attributes);
    if last.is_end {
        session.status = SessionStatus::Ended;
        tracing::info!(identity = %session.identity, age, "game ended");
    }
}
