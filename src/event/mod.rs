//! Event processing module

mod processor;
pub mod selector;


pub use processor::*;
pub use selector::*;
