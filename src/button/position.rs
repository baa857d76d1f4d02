//! Column position and visual style of a key

use super::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Extra clearance, beyond half the key width, an inner key needs on both sides
const INNER_CLEARANCE_MARGIN: f32 = 8.0;

/// Where a key sits within its row. Decides which way the callout grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ButtonPosition {
    /// Leftmost column, callout grows rightward
    Left,
    /// Interior column, callout is centered on the key
    #[default]
    Inner,
    /// Rightmost column, callout grows leftward
    Right,
}

impl ButtonPosition {
    /// Derive the position from the key frame and the frame of its row.
    ///
    /// A key is `Inner` when both sides have room for half a callout. Otherwise
    /// the callout must grow towards the side with more room.
    pub fn for_frame(key_frame: Rect, container: Rect) -> Self {
        let leading = key_frame.min_x() - container.min_x();
        let trailing = container.max_x() - key_frame.max_x();
        let clearance = key_frame.width / 2.0 + INNER_CLEARANCE_MARGIN;

        if leading >= clearance && trailing >= clearance {
            Self::Inner
        } else if leading > trailing {
            Self::Right
        } else {
            Self::Left
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Inner => "inner",
            Self::Right => "right",
        }
    }
}

/// Overall look of the keyboard the key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ButtonStyle {
    /// Phone keyboard keys
    #[default]
    Phone,
    /// Tablet keyboard keys
    Tablet,
}
