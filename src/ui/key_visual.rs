//! Rasterizes a key's vector scene into terminal cells

use crate::button::shape::{FontRole, Layer, ShapeLayer, TextLayer};
use crate::button::{Point, Rgba, VectorScene};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier},
    widgets::Widget,
};

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::Rgb(color.r, color.g, color.b)
    }
}

/// Draws one key scene. Scene coordinates are terminal cells, and drawing
/// is clipped to the render area.
pub struct KeyVisual<'a> {
    scene: &'a VectorScene,
}

impl<'a> KeyVisual<'a> {
    pub fn new(scene: &'a VectorScene) -> Self {
        Self { scene }
    }

    fn fill_shape(shape: &ShapeLayer, area: Rect, buf: &mut Buffer) {
        let Some(bounds) = shape.path.bounds() else {
            return;
        };
        let bounds = match shape.shadow {
            Some(shadow) => bounds.union(&bounds.translate(shadow.offset.x, shadow.offset.y)),
            None => bounds,
        };

        let (x0, x1) = clip(bounds.min_x(), bounds.max_x(), area.x, area.x + area.width);
        let (y0, y1) = clip(bounds.min_y(), bounds.max_y(), area.y, area.y + area.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let sample = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                let color = if shape.path.contains(sample) {
                    shape.fill.color_at(sample)
                } else if let Some(shadow) = shape.shadow {
                    let cast = Point::new(sample.x - shadow.offset.x, sample.y - shadow.offset.y);
                    if !shape.path.contains(cast) {
                        continue;
                    }
                    shadow.color
                } else {
                    continue;
                };
                if color.is_clear() {
                    continue;
                }
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char(' ');
                    cell.set_bg(color.into());
                }
            }
        }
    }

    fn draw_text(text: &TextLayer, area: Rect, buf: &mut Buffer) {
        let width = text.text.chars().count() as f32;
        let row = text.center.y.floor();
        let start = (text.center.x - width / 2.0).round();
        if row < area.y as f32 || row >= (area.y + area.height) as f32 {
            return;
        }

        for (i, ch) in text.text.chars().enumerate() {
            let col = start + i as f32;
            if col < area.x as f32 || col >= (area.x + area.width) as f32 {
                continue;
            }
            if let Some(cell) = buf.cell_mut((col as u16, row as u16)) {
                cell.set_char(ch);
                cell.set_fg(text.color.into());
                match text.role {
                    FontRole::Primary | FontRole::Option => {
                        cell.modifier.insert(Modifier::BOLD);
                    }
                    FontRole::Alternate => {
                        cell.modifier.insert(Modifier::DIM);
                    }
                }
            }
        }
    }
}

/// Whole cells whose centers may fall inside `[min, max)`, limited to the area
fn clip(min: f32, max: f32, lo: u16, hi: u16) -> (u16, u16) {
    let start = min.floor().max(lo as f32).min(hi as f32) as u16;
    let end = max.ceil().max(lo as f32).min(hi as f32) as u16;
    (start, end)
}

impl<'a> Widget for KeyVisual<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for layer in &self.scene.layers {
            match layer {
                Layer::Shape(shape) => Self::fill_shape(shape, area, buf),
                Layer::Text(text) => Self::draw_text(text, area, buf),
            }
        }
    }
}
