//! Python bindings
//!
//! The runner and the session store live in process-wide globals so a bot
//! can load its tables once at startup and then drive many players.

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{
    AgeCatalog, AgeConfig, EngineConfig, EventBranch, EventCatalog, EventConfig, EventEffect,
    WeightedEvent, normalize_id,
};
use crate::property::{AttributeCode, AttributeSet};
use crate::simulator::{SessionStore, TrajectoryEntry, TrajectoryRunner};

// ============================================================================
// Globals
// ============================================================================

static RUNNER: OnceCell<RwLock<Arc<TrajectoryRunner>>> = OnceCell::new();

static SESSIONS: Lazy<SessionStore> = Lazy::new(SessionStore::new);

fn runner() -> PyResult<Arc<TrajectoryRunner>> {
    RUNNER
        .get()
        .map(|cell| cell.read().clone())
        .ok_or_else(|| PyRuntimeError::new_err("Engine not initialized. Call init_engine() first."))
}

// ============================================================================
// Extraction helpers
// ============================================================================

/// Read a field from either a dict or an object attribute
fn get_attr<'py>(obj: &Bound<'py, PyAny>, name: &str) -> PyResult<Bound<'py, PyAny>> {
    if let Ok(dict) = obj.downcast::<PyDict>() {
        dict.get_item(name)?
            .ok_or_else(|| pyo3::exceptions::PyKeyError::new_err(name.to_string()))
    } else {
        obj.getattr(name)
    }
}

fn get_attr_opt<'py>(obj: &Bound<'py, PyAny>, name: &str) -> Option<Bound<'py, PyAny>> {
    let value = if let Ok(dict) = obj.downcast::<PyDict>() {
        dict.get_item(name).ok().flatten()
    } else {
        obj.getattr(name).ok()
    };
    value.filter(|v| !v.is_none())
}

/// Ids come from spreadsheets as either ints or strings
fn extract_id(value: &Bound<'_, PyAny>) -> PyResult<String> {
    if let Ok(n) = value.extract::<i64>() {
        return Ok(n.to_string());
    }
    if let Ok(f) = value.extract::<f64>() {
        return Ok(normalize_id(&f.to_string()));
    }
    Ok(normalize_id(&value.extract::<String>()?))
}

fn extract_flag(value: &Bound<'_, PyAny>) -> bool {
    value
        .extract::<bool>()
        .or_else(|_| value.extract::<i64>().map(|n| n != 0))
        .unwrap_or(false)
}

fn extract_event_effect(obj: &Bound<'_, PyAny>) -> PyResult<EventEffect> {
    let field = |name: &str| -> PyResult<i32> {
        get_attr_opt(obj, name).map_or(Ok(0), |v| v.extract())
    };
    Ok(EventEffect {
        chr: field("CHR")?,
        int: field("INT")?,
        str_: field("STR")?,
        mny: field("MNY")?,
        spr: field("SPR")?,
        lif: field("LIF")?,
        age: get_attr_opt(obj, "AGE").map(|v| v.extract()).transpose()?,
    })
}

fn extract_event(obj: &Bound<'_, PyAny>) -> PyResult<EventConfig> {
    let id = extract_id(&get_attr(obj, "id")?)?;
    let event: String = get_attr(obj, "event")?.extract()?;
    let grade: i32 = get_attr_opt(obj, "grade").map_or(Ok(0), |v| v.extract())?;
    let no_random = get_attr_opt(obj, "no_random")
        .or_else(|| get_attr_opt(obj, "noRandom"))
        .is_some_and(|v| extract_flag(&v));
    let include: Option<String> = get_attr_opt(obj, "include").map(|v| v.extract()).transpose()?;
    let exclude: Option<String> = get_attr_opt(obj, "exclude").map(|v| v.extract()).transpose()?;
    let post_event = get_attr_opt(obj, "post_event")
        .or_else(|| get_attr_opt(obj, "postEvent"))
        .map(|v| extract_id(&v))
        .transpose()?;

    let effect = match get_attr_opt(obj, "effect") {
        Some(effect) => extract_event_effect(&effect)?,
        None => EventEffect::default(),
    };

    let mut branch = Vec::new();
    if let Some(list) = get_attr_opt(obj, "branch") {
        let list = list.downcast::<PyList>()?;
        for item in list.iter() {
            let raw: String = item.extract()?;
            branch.push(EventBranch::try_from(raw)?);
        }
    }

    Ok(EventConfig {
        id,
        event,
        grade,
        no_random,
        include: include.filter(|c| !c.trim().is_empty()),
        exclude: exclude.filter(|c| !c.trim().is_empty()),
        effect,
        branch,
        post_event,
    })
}

/// An age pool entry: `"id*weight"`, a bare id, or an `(id, weight)` pair
fn extract_weighted_event(item: &Bound<'_, PyAny>) -> PyResult<WeightedEvent> {
    if let Ok(n) = item.extract::<i64>() {
        return Ok(WeightedEvent {
            event_id: n.to_string(),
            weight: 1.0,
        });
    }
    if let Ok(raw) = item.extract::<String>() {
        return Ok(WeightedEvent::parse(&raw)?);
    }
    let (id, weight): (Bound<'_, PyAny>, f64) = item.extract()?;
    Ok(WeightedEvent {
        event_id: extract_id(&id)?,
        weight,
    })
}

fn extract_age(obj: &Bound<'_, PyAny>) -> PyResult<AgeConfig> {
    let age: i32 = get_attr(obj, "age")?.extract()?;

    let mut events = Vec::new();
    if let Some(list) = get_attr_opt(obj, "events").or_else(|| get_attr_opt(obj, "event")) {
        let list = list.downcast::<PyList>()?;
        for item in list.iter() {
            events.push(extract_weighted_event(&item)?);
        }
    }

    Ok(AgeConfig { age, events })
}

fn attributes_to_dict<'py>(py: Python<'py>, attributes: &AttributeSet) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for code in AttributeCode::ALLOCATABLE.into_iter().chain([AttributeCode::Lif]) {
        dict.set_item(code.code(), attributes.number(code))?;
    }
    Ok(dict)
}

// ============================================================================
// Python classes
// ============================================================================

/// One step of a player's life, as returned to Python
#[pyclass(frozen, get_all)]
#[derive(Debug, Clone)]
pub struct TrajectoryStep {
    pub age: i32,
    pub event_ids: Vec<String>,
    pub text: String,
    /// [CHR, INT, STR, MNY, SPR, LIF]
    pub attributes: [i32; 6],
    pub is_end: bool,
}

impl From<TrajectoryEntry> for TrajectoryStep {
    fn from(entry: TrajectoryEntry) -> Self {
        Self {
            age: entry.age,
            event_ids: entry.events.into_iter().map(|e| e.event_id).collect(),
            text: entry.text,
            attributes: entry.attributes,
            is_end: entry.is_end,
        }
    }
}

#[pymethods]
impl TrajectoryStep {
    fn __repr__(&self) -> String {
        format!(
            "TrajectoryStep(age={}, events={:?}, is_end={})",
            self.age, self.event_ids, self.is_end
        )
    }
}

// ============================================================================
// Python functions
// ============================================================================

/// Load the event and age tables (call once at startup; calling again
/// replaces them)
///
/// # Arguments
/// * `events` - list of event records (dicts or objects)
/// * `ages` - list of age records
/// * `config_json` - optional engine config as a JSON string
#[pyfunction]
#[pyo3(signature = (events, ages, config_json=None))]
fn init_engine(
    events: &Bound<'_, PyList>,
    ages: &Bound<'_, PyList>,
    config_json: Option<&str>,
) -> PyResult<()> {
    let events = events
        .iter()
        .map(|obj| extract_event(&obj))
        .collect::<PyResult<Vec<_>>>()?;
    let ages = ages
        .iter()
        .map(|obj| extract_age(&obj))
        .collect::<PyResult<Vec<_>>>()?;
    let config = match config_json {
        Some(json) => EngineConfig::from_json(json)?,
        None => EngineConfig::default(),
    };

    let runner = Arc::new(TrajectoryRunner::validated(
        EventCatalog::new(events)?,
        AgeCatalog::new(ages)?,
        config,
    )?);

    let cell = RUNNER.get_or_init(|| RwLock::new(Arc::clone(&runner)));
    *cell.write() = runner;

    Ok(())
}

#[pyfunction]
fn is_engine_initialized() -> bool {
    RUNNER.get().is_some()
}

/// Start (or restart) a game for `identity`
#[pyfunction]
fn start_game(identity: &str) -> PyResult<()> {
    let runner = runner()?;
    SESSIONS.start(identity, runner.config().start_age);
    Ok(())
}

/// Randomly allocate attributes; returns {CHR, INT, STR, MNY, SPR, LIF}
#[pyfunction]
fn allocate_random<'py>(py: Python<'py>, identity: &str) -> PyResult<Bound<'py, PyDict>> {
    let runner = runner()?;
    let attributes = SESSIONS.with_session(identity, |session| runner.allocate_random(session))?;
    attributes_to_dict(py, &attributes)
}

/// Allocate from input such as "3 2 1 4 0" (CHR INT STR MNY SPR)
#[pyfunction]
fn allocate_manual<'py>(py: Python<'py>, identity: &str, raw: &str) -> PyResult<Bound<'py, PyDict>> {
    let runner = runner()?;
    let attributes =
        SESSIONS.with_session(identity, |session| runner.allocate_manual(session, raw))?;
    attributes_to_dict(py, &attributes)
}

#[pyfunction]
fn step(identity: &str) -> PyResult<TrajectoryStep> {
    let runner = runner()?;
    let entry = SESSIONS.with_session(identity, |session| runner.step(session))?;
    Ok(entry.into())
}

#[pyfunction]
fn step_many(identity: &str, n: usize) -> PyResult<Vec<TrajectoryStep>> {
    let runner = runner()?;
    let entries = SESSIONS.with_session(identity, |session| runner.step_many(session, n))?;
    Ok(entries.into_iter().map(TrajectoryStep::from).collect())
}

/// Like `step_many`, but runs on a blocking thread and returns an awaitable
#[pyfunction]
fn step_many_async<'py>(py: Python<'py>, identity: String, n: usize) -> PyResult<Bound<'py, PyAny>> {
    let runner = runner()?;

    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let entries = tokio::task::spawn_blocking(move || {
            SESSIONS.with_session(&identity, |session| runner.step_many(session, n))
        })
        .await
        .map_err(|e| PyRuntimeError::new_err(format!("Step task panicked: {}", e)))??;

        Ok(entries
            .into_iter()
            .map(TrajectoryStep::from)
            .collect::<Vec<_>>())
    })
}

/// Drop a player's game; returns whether one existed
#[pyfunction]
fn end_game(identity: &str) -> bool {
    SESSIONS.end(identity)
}

/// Evict sessions idle longer than `timeout_secs` (engine default if omitted)
#[pyfunction]
#[pyo3(signature = (timeout_secs=None))]
fn evict_idle(timeout_secs: Option<u64>) -> PyResult<usize> {
    let timeout = match timeout_secs {
        Some(secs) => secs,
        None => runner()?.config().idle_timeout_secs,
    };
    Ok(SESSIONS.evict_idle(Duration::from_secs(timeout)))
}

// ============================================================================
// Python Module Definition
// ============================================================================

#[pymodule]
fn restart_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(init_engine, m)?)?;
    m.add_function(wrap_pyfunction!(is_engine_initialized, m)?)?;
    m.add_function(wrap_pyfunction!(start_game, m)?)?;
    m.add_function(wrap_pyfunction!(allocate_random, m)?)?;
    m.add_function(wrap_pyfunction!(allocate_manual, m)?)?;
    m.add_function(wrap_pyfunction!(step, m)?)?;
    m.add_function(wrap_pyfunction!(step_many, m)?)?;
    m.add_function(wrap_pyfunction!(step_many_async, m)?)?;
    m.add_function(wrap_pyfunction!(end_game, m)?)?;
    m.add_function(wrap_pyfunction!(evict_idle, m)?)?;
    m.add_class::<TrajectoryStep>()?;
    Ok(())
}
