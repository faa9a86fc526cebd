//! Terminal UI layer for the Pomodoro tracker.
//!
//! Themes, progress bar and header components, the live timer screen, the
//! report screen, report export to HTML / JSON, and the application event
//! loops built on top of [`ratatui`].

pub mod app;
pub mod components;
pub mod export;
pub mod report_view;
pub mod themes;
pub mod timer_view;

pub use pomodoro_core as core;
