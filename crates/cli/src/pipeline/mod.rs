//! Emission loop and run statistics.

mod emitter;
mod stats;

pub use emitter::{Emitter, RecordSource};
pub use stats::RunStats;
