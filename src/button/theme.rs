//! Visual theme values for a key
//!
//! Themes are plain values resolved once when a key is built. Only the shape
//! renderer reads them; the gesture machine never does.

use super::ButtonStyle;
use crate::config::Theme;
use serde::{Deserialize, Serialize};

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const CLEAR: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn is_clear(&self) -> bool {
        self.a == 0
    }

    /// Interpolate each channel towards `other`
    pub fn mix(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
            channel(self.a, other.a),
        )
    }
}

/// Label font sizes in layout units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontSizes {
    pub primary: f32,
    pub alternate: f32,
    pub options: f32,
}

impl FontSizes {
    pub fn for_style(style: ButtonStyle) -> Self {
        match style {
            ButtonStyle::Phone => Self {
                primary: 22.0,
                alternate: 11.0,
                options: 24.0,
            },
            ButtonStyle::Tablet => Self {
                primary: 24.0,
                alternate: 13.0,
                options: 26.0,
            },
        }
    }
}

/// Every color and stroke setting a key is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButtonTheme {
    /// Key body fill
    pub key_color: Rgba,
    /// Bottom stop of a vertical gradient starting at `key_color`
    pub key_bottom_color: Option<Rgba>,
    /// Label color for the key and its options
    pub key_text_color: Rgba,
    pub key_shadow_color: Rgba,
    /// Key body fill while pressed
    pub key_highlighted_color: Rgba,
    /// Bottom stop of the pressed gradient
    pub key_bottom_highlighted_color: Option<Rgba>,
    /// Fill of the active option cell
    pub option_highlight_color: Rgba,
    /// Label color of the active option cell
    pub option_highlight_text_color: Rgba,
    pub show_shadow: bool,
    pub border_width: f32,
    pub border_color: Rgba,
    pub fonts: FontSizes,
}

impl Default for ButtonTheme {
    fn default() -> Self {
        Self::for_style(ButtonStyle::Phone, Theme::Light)
    }
}

impl ButtonTheme {
    /// Resolve the default theme for a keyboard style and color scheme
    pub fn for_style(style: ButtonStyle, theme: Theme) -> Self {
        let fonts = FontSizes::for_style(style);
        match theme {
            Theme::Light => Self::light(fonts),
            Theme::Dark => Self::dark(fonts),
        }
    }

    fn light(fonts: FontSizes) -> Self {
        Self {
            key_color: Rgba::rgb(255, 255, 255),
            key_bottom_color: None,
            key_text_color: Rgba::rgb(0, 0, 0),
            key_shadow_color: Rgba::rgb(136, 138, 142),
            key_highlighted_color: Rgba::rgb(213, 214, 216),
            key_bottom_highlighted_color: None,
            option_highlight_color: Rgba::rgb(0, 122, 255),
            option_highlight_text_color: Rgba::rgb(255, 255, 255),
            show_shadow: true,
            border_width: 0.0,
            border_color: Rgba::CLEAR,
            fonts,
        }
    }

    fn dark(fonts: FontSizes) -> Self {
        Self {
            key_color: Rgba::rgb(107, 107, 107),
            key_bottom_color: None,
            key_text_color: Rgba::rgb(255, 255, 255),
            key_shadow_color: Rgba::rgb(30, 30, 30),
            key_highlighted_color: Rgba::rgb(70, 70, 70),
            key_bottom_highlighted_color: None,
            option_highlight_color: Rgba::rgb(10, 132, 255),
            option_highlight_text_color: Rgba::rgb(255, 255, 255),
            show_shadow: true,
            border_width: 0.0,
            border_color: Rgba::CLEAR,
            fonts,
        }
    }

    /// Whether a border stroke should be drawn at all
    pub fn has_border(&self) -> bool {
        self.border_width > 0.0 && !self.border_color.is_clear()
    }
}
