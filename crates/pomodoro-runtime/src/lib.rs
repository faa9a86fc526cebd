//! Runtime layer for the Pomodoro tracker.
//!
//! Owns the work/break timer and the background task that ticks it and
//! records completed work phases.

pub mod orchestrator;
pub mod timer;

pub use pomodoro_core as core;
pub use pomodoro_data as data;
