//! Geometry primitives and callout placement
//!
//! Coordinates use the screen convention: `x` grows to the right and `y`
//! grows downward. The callout is always placed above the key it belongs to.

use super::{ButtonPosition, ButtonStyle};
use serde::{Deserialize, Serialize};

/// A point in key-row coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `other`
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

/// Width and height of a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn min_x(&self) -> f32 {
        self.x
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn min_y(&self) -> f32 {
        self.y
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Half-open containment: the max edges are outside
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }

    /// Shrink by `dx` on the left and right and `dy` on the top and bottom
    pub fn inset(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(
            self.x + dx,
            self.y + dy,
            (self.width - 2.0 * dx).max(0.0),
            (self.height - 2.0 * dy).max(0.0),
        )
    }

    /// Grow by `dx` on the left and right and `dy` on the top and bottom
    pub fn outset(&self, dx: f32, dy: f32) -> Rect {
        self.inset(-dx, -dy)
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        let min_x = self.min_x().min(other.min_x());
        let min_y = self.min_y().min(other.min_y());
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Sizing constants used to lay out the option callout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalloutMetrics {
    /// Width of a single option cell
    pub option_width: f32,
    /// Multiplier applied to `option_width` when narrow option width is enabled
    pub narrow_width_factor: f32,
    /// Height added above the key for one row of options (stem included)
    pub row_height: f32,
    /// Height of the neck joining the option row to the key body
    pub stem_height: f32,
    /// Space between the bubble outline and the outermost cells
    pub horizontal_padding: f32,
    /// Corner radius of the bubble and key body
    pub corner_radius: f32,
    /// Lower bound for the option row after the height reduction is applied
    pub min_row_height: f32,
    /// Horizontal extent the bubble must stay inside
    #[serde(default)]
    pub keyboard_bounds: Option<Rect>,
}

impl Default for CalloutMetrics {
    fn default() -> Self {
        Self::phone()
    }
}

impl CalloutMetrics {
    pub fn for_style(style: ButtonStyle) -> Self {
        match style {
            ButtonStyle::Phone => Self::phone(),
            ButtonStyle::Tablet => Self::tablet(),
        }
    }

    /// Point-based metrics matching a phone keyboard
    pub fn phone() -> Self {
        Self {
            option_width: 32.0,
            narrow_width_factor: 0.8,
            row_height: 56.0,
            stem_height: 10.0,
            horizontal_padding: 6.0,
            corner_radius: 6.0,
            min_row_height: 24.0,
            keyboard_bounds: None,
        }
    }

    /// Point-based metrics matching a tablet keyboard
    pub fn tablet() -> Self {
        Self {
            option_width: 52.0,
            narrow_width_factor: 0.8,
            row_height: 68.0,
            stem_height: 12.0,
            horizontal_padding: 8.0,
            corner_radius: 7.0,
            min_row_height: 30.0,
            keyboard_bounds: None,
        }
    }

    /// Cell-based metrics for rendering into a terminal grid
    pub fn terminal() -> Self {
        Self {
            option_width: 4.0,
            narrow_width_factor: 0.75,
            row_height: 4.0,
            stem_height: 1.0,
            horizontal_padding: 1.0,
            corner_radius: 0.5,
            min_row_height: 2.0,
            keyboard_bounds: None,
        }
    }

    /// Width of one option cell for the given density
    pub fn cell_width(&self, narrow: bool) -> f32 {
        if narrow {
            self.option_width * self.narrow_width_factor.clamp(0.1, 1.0)
        } else {
            self.option_width
        }
    }
}

/// Derived layout of the option callout for one touch session
#[derive(Debug, Clone, PartialEq)]
pub struct CalloutGeometry {
    /// Bounding frame of the whole callout (option row, stem, and key body)
    pub frame: Rect,
    /// The option row band above the key
    pub bubble: Rect,
    /// Neck between the bubble and the key body, spanning the key's width
    pub stem: Rect,
    /// The key body the callout grows out of
    pub key: Rect,
    /// Option cell frames in display order, left to right
    pub cells: Vec<Rect>,
}

impl CalloutGeometry {
    pub fn option_count(&self) -> usize {
        self.cells.len()
    }

    /// Resolve a point to an option cell.
    ///
    /// Points outside the callout frame return `None`. Points inside the frame
    /// but left or right of every cell clamp to the nearest edge cell.
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        if !self.frame.contains(point) {
            return None;
        }
        self.nearest_cell(point.x)
    }

    /// Cell under `x`, clamped to the first or last cell
    pub fn nearest_cell(&self, x: f32) -> Option<usize> {
        let first = self.cells.first()?;
        let last_index = self.cells.len() - 1;
        if x < first.min_x() {
            return Some(0);
        }
        if x >= self.cells[last_index].min_x() {
            return Some(last_index);
        }
        self.cells
            .iter()
            .position(|cell| x >= cell.min_x() && x < cell.max_x())
            .or(Some(last_index))
    }
}

/// Compute the callout for a key.
///
/// Returns `None` when there are no options to show. `height_reduction` is
/// subtracted from the option row height, floored at `metrics.min_row_height`.
pub fn resolve_callout(
    key_frame: Rect,
    position: ButtonPosition,
    option_count: usize,
    narrow_width: bool,
    height_reduction: f32,
    metrics: &CalloutMetrics,
) -> Option<CalloutGeometry> {
    if option_count == 0 || key_frame.is_empty() {
        return None;
    }

    let cell_width = metrics.cell_width(narrow_width);
    let row_width = cell_width * option_count as f32;
    let padding = metrics.horizontal_padding.max(0.0);
    let width = (row_width + 2.0 * padding).max(key_frame.width);

    let mut x = match position {
        ButtonPosition::Inner => key_frame.center().x - width / 2.0,
        ButtonPosition::Left => key_frame.min_x(),
        ButtonPosition::Right => key_frame.max_x() - width,
    };
    if let Some(bounds) = metrics.keyboard_bounds {
        if width <= bounds.width {
            x = x.clamp(bounds.min_x(), bounds.max_x() - width);
        } else {
            x = bounds.min_x();
        }
    }

    let row_height = (metrics.row_height - height_reduction.max(0.0)).max(metrics.min_row_height);
    let stem_height = metrics.stem_height.clamp(0.0, row_height / 2.0);
    let bubble_height = row_height - stem_height;

    let bubble = Rect::new(x, key_frame.min_y() - row_height, width, bubble_height);
    let stem = Rect::new(
        key_frame.x,
        key_frame.min_y() - stem_height,
        key_frame.width,
        stem_height,
    );

    // Cells sit inside the padding and keep to the side the bubble grows from.
    let slack = width - 2.0 * padding - row_width;
    let cells_x = match position {
        ButtonPosition::Left => bubble.min_x() + padding,
        ButtonPosition::Inner => bubble.min_x() + padding + slack / 2.0,
        ButtonPosition::Right => bubble.max_x() - padding - row_width,
    };
    let cells = (0..option_count)
        .map(|i| Rect::new(cells_x + cell_width * i as f32, bubble.y, cell_width, bubble.height))
        .collect();

    Some(CalloutGeometry {
        frame: bubble.union(&stem).union(&key_frame),
        bubble,
        stem,
        key: key_frame,
        cells,
    })
}
