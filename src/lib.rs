//! Restart Engine - rule evaluation core for a text-based life restart game
//!
//! Players allocate five attributes, then live year by year: each year an
//! event is drawn from that age's weighted pool, filtered by condition
//! strings such as `(MNY>=5)&(EVT![10001])`, and its effects and chained
//! follow-ups are applied until life runs out.
//!
//! Python bindings via PyO3 are available behind the `python` feature.

pub mod condition;
pub mod config;
pub mod error;
pub mod event;
pub mod property;
pub mod simulator;

#[cfg(feature = "python")]
mod python;

pub use crate::condition::{check_condition, evaluate, parse, ConditionExpr};
pub use crate::config::{AgeCatalog, EngineConfig, EventCatalog};
pub use crate::error::{RestartError, Result};
pub use crate::property::{AttributeSet, AttributeSource};
pub use crate::simulator::{SessionStatus, SessionStore, TrajectoryEntry, TrajectoryRunner, UserSession};
