//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides a medical-themed interface for:
//! - Home screen with model status
//! - Survey form, one choice control per question
//! - Result view with score, contributions and advice

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::MedicalTheme;
pub use ui::home::HomeState;
