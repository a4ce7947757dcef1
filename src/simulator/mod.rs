//! Game sessions and the trajectory runner

mod engine;
mod session;


pub use engine::*;
pub use session::*;
