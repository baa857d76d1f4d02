//! Terminal User Interface components

mod app;
mod key_visual;
pub mod theme;
mod widgets;

pub use app::{App, AppState, PointerAction, TextDocument, KEY_GAP, KEY_HEIGHT, KEY_WIDTH};
pub use key_visual::KeyVisual;
pub use theme::ThemeColors;
pub use widgets::*;
