//! Keyboard Button - an interactive virtual keyboard key
//!
//! A key commits its input on a tap, its alternate input on a short
//! downward swipe, and one of its input options after a long press and a
//! drag across the option callout. The crate resolves the callout layout,
//! produces vector drawing instructions, runs the touch gesture state
//! machine, and delivers commits to a focused text target.
//!
//! A terminal playground (`keyboard-button` binary) renders a key row with
//! ratatui and drives it with the mouse.

pub mod button;
pub mod config;
pub mod report;
pub mod ui;

pub use button::{ButtonError, KeyConfig, KeyboardButton};
pub use config::Config;
