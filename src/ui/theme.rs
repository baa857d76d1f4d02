//! Playground chrome colors
//!
//! Covers everything around the keys: the text panel, commit log, tray, and
//! status bar. Keys are painted from their own
//! [`ButtonTheme`](crate::button::ButtonTheme).

use crate::config::Theme;
use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct ThemeColors {
    pub bg: Color,
    pub fg: Color,
    /// Borders and hints
    pub dim: Color,
    /// Focused text panel, help border, cursor
    pub focus: Color,
    /// Commits that reached the text
    pub inserted: Color,
    /// Commits with no focused text to land in
    pub dropped: Color,
    /// Status messages and help headings
    pub notice: Color,
    /// Strip the keys sit on
    pub tray: Color,
    pub bar: Color,
}

impl ThemeColors {
    pub fn from_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb(22, 22, 30),
            fg: Color::Rgb(200, 200, 210),
            dim: Color::Rgb(90, 90, 110),
            focus: Color::Rgb(80, 200, 220),
            inserted: Color::Rgb(80, 200, 120),
            dropped: Color::Rgb(240, 90, 100),
            notice: Color::Rgb(240, 180, 80),
            tray: Color::Rgb(43, 43, 43),
            bar: Color::Rgb(55, 55, 70),
        }
    }

    /// Tray matches the light key theme's keyboard gray
    pub fn light() -> Self {
        Self {
            bg: Color::Rgb(245, 245, 248),
            fg: Color::Rgb(30, 30, 40),
            dim: Color::Rgb(130, 130, 150),
            focus: Color::Rgb(0, 130, 160),
            inserted: Color::Rgb(30, 150, 70),
            dropped: Color::Rgb(200, 50, 60),
            notice: Color::Rgb(180, 120, 0),
            tray: Color::Rgb(209, 212, 217),
            bar: Color::Rgb(200, 200, 212),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_setting_picks_palette() {
        assert_eq!(ThemeColors::from_theme(Theme::Dark).tray, ThemeColors::dark().tray);
        assert_eq!(ThemeColors::from_theme(Theme::Light).tray, ThemeColors::light().tray);
    }

    #[test]
    fn commit_outcomes_are_distinguishable() {
        for colors in [ThemeColors::dark(), ThemeColors::light()] {
            assert_ne!(colors.inserted, colors.dropped);
            assert_ne!(colors.tray, colors.bg);
        }
    }
}
