//! Attribute state and allocation

mod allocation;
mod state;


pub use allocation::*;
pub use state::*;
