//! Score aggregation.
//!
//! Reduces one raw evaluation report into the compact scorecard that
//! gets written back to the worklist.

mod aggregator;

pub use aggregator::{aggregate, PID_METRIC};
