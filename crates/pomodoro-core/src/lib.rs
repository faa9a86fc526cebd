//! Shared building blocks for the Pomodoro study tracker.
//!
//! Session models, the common error type, duration formatting, timezone
//! helpers and CLI settings with last-used persistence.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{PomodoroError, Result};
