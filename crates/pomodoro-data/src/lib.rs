//! Session log storage and study report aggregation.
//!
//! [`store`] persists completed sessions; [`aggregator`] turns a snapshot of
//! the log into a [`aggregator::StudyReport`] for the terminal and export
//! renderers.

pub mod aggregator;
pub mod store;

pub use pomodoro_core as core;
