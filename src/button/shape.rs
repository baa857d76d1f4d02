//! Vector shapes for the key body and the option callout
//!
//! Rendering is a pure function of the key frame, the callout geometry, and the
//! press state. The output is a [`VectorScene`] that any 2D path API can replay.
//! Every curve control point is derived from frame dimensions, so the shapes
//! scale with the key.

use super::geometry::{CalloutGeometry, Point, Rect};
use super::theme::{ButtonTheme, Rgba};

/// Control point distance for approximating a quarter ellipse with a cubic
pub const KAPPA: f32 = 0.552_284_8;

const EPSILON: f32 = 1e-4;

/// One drawing command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo { ctrl1: Point, ctrl2: Point, to: Point },
    Close,
}

/// An outline made of straight and cubic segments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
    current: Option<Point>,
    start: Option<Point>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn move_to(&mut self, to: Point) -> &mut Self {
        self.commands.push(PathCommand::MoveTo(to));
        self.current = Some(to);
        self.start = Some(to);
        self
    }

    pub fn line_to(&mut self, to: Point) -> &mut Self {
        if self.current.is_none() {
            return self.move_to(to);
        }
        self.commands.push(PathCommand::LineTo(to));
        self.current = Some(to);
        self
    }

    pub fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) -> &mut Self {
        if self.current.is_none() {
            return self.move_to(to);
        }
        self.commands.push(PathCommand::CubicTo { ctrl1, ctrl2, to });
        self.current = Some(to);
        self
    }

    /// Round a convex corner: curve from the current point to `to`, bending
    /// towards `corner`. Both tangents run along the corner's edges.
    pub fn corner_to(&mut self, corner: Point, to: Point) -> &mut Self {
        let Some(from) = self.current else {
            return self.move_to(to);
        };
        self.cubic_to(from.lerp(corner, KAPPA), to.lerp(corner, KAPPA), to)
    }

    pub fn close(&mut self) -> &mut Self {
        if self.current.is_some() {
            self.commands.push(PathCommand::Close);
            self.current = self.start;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Bounding box of all end points and control points
    pub fn bounds(&self) -> Option<Rect> {
        let mut points = self.commands.iter().flat_map(|cmd| match *cmd {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => vec![p],
            PathCommand::CubicTo { ctrl1, ctrl2, to } => vec![ctrl1, ctrl2, to],
            PathCommand::Close => Vec::new(),
        });
        let first = points.next()?;
        let (mut min, mut max) = (first, first);
        for p in points {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }
        Some(Rect::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    /// Approximate the outline as polygons, one per subpath
    pub fn flatten(&self, segments_per_curve: usize) -> Vec<Vec<Point>> {
        let segments = segments_per_curve.max(1);
        let mut polygons = Vec::new();
        let mut polygon: Vec<Point> = Vec::new();

        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) => {
                    if polygon.len() > 1 {
                        polygons.push(std::mem::take(&mut polygon));
                    }
                    polygon.clear();
                    polygon.push(p);
                }
                PathCommand::LineTo(p) => polygon.push(p),
                PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                    let from = polygon.last().copied().unwrap_or(to);
                    for step in 1..=segments {
                        let t = step as f32 / segments as f32;
                        polygon.push(cubic_point(from, ctrl1, ctrl2, to, t));
                    }
                }
                PathCommand::Close => {
                    if polygon.len() > 1 {
                        polygons.push(std::mem::take(&mut polygon));
                    }
                }
            }
        }
        if polygon.len() > 1 {
            polygons.push(polygon);
        }
        polygons
    }

    /// Even-odd containment test against the flattened outline
    pub fn contains(&self, point: Point) -> bool {
        self.flatten(8)
            .iter()
            .filter(|polygon| polygon_contains(polygon, point))
            .count()
            % 2
            == 1
    }
}

fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let u = 1.0 - t;
    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

fn polygon_contains(polygon: &[Point], point: Point) -> bool {
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Rounded rectangle with the radius clamped to half the shorter side
pub fn rounded_rect(rect: Rect, radius: f32) -> Path {
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    let (x0, y0, x1, y1) = (rect.min_x(), rect.min_y(), rect.max_x(), rect.max_y());

    let mut path = Path::new();
    path.move_to(Point::new(x0 + r, y0))
        .line_to(Point::new(x1 - r, y0))
        .corner_to(Point::new(x1, y0), Point::new(x1, y0 + r))
        .line_to(Point::new(x1, y1 - r))
        .corner_to(Point::new(x1, y1), Point::new(x1 - r, y1))
        .line_to(Point::new(x0 + r, y1))
        .corner_to(Point::new(x0, y1), Point::new(x0, y1 - r))
        .line_to(Point::new(x0, y0 + r))
        .corner_to(Point::new(x0, y0), Point::new(x0 + r, y0))
        .close();
    path
}

/// One closed outline uniting the option bubble, the stem, and the key body.
///
/// Where the bubble overhangs the key column, its bottom edge turns into the
/// key side through a concave quarter ellipse whose width is bounded by the
/// overhang and whose height is the stem height. Both tangents match the
/// adjoining edges, so there is no seam.
pub fn callout_outline(geometry: &CalloutGeometry, radius: f32) -> Path {
    let bubble = geometry.bubble;
    let key = geometry.key;
    let stem_height = geometry.stem.height;
    let neck_y = bubble.max_y();

    let r = radius.min(bubble.width / 2.0).min(bubble.height / 2.0).max(0.0);
    let rk = radius.min(key.width / 2.0).min(key.height / 2.0).max(0.0);
    let gap_right = (bubble.max_x() - key.max_x()).max(0.0);
    let gap_left = (key.min_x() - bubble.min_x()).max(0.0);

    let mut path = Path::new();
    path.move_to(Point::new(bubble.min_x() + r, bubble.min_y()))
        .line_to(Point::new(bubble.max_x() - r, bubble.min_y()))
        .corner_to(
            Point::new(bubble.max_x(), bubble.min_y()),
            Point::new(bubble.max_x(), bubble.min_y() + r),
        );

    // Right overhang down into the key's right side
    if gap_right > EPSILON {
        let rr = r.min(gap_right / 2.0);
        let join = (gap_right - rr).min(stem_height.max(r));
        path.line_to(Point::new(bubble.max_x(), neck_y - rr)).corner_to(
            Point::new(bubble.max_x(), neck_y),
            Point::new(bubble.max_x() - rr, neck_y),
        );
        if join > EPSILON && stem_height > EPSILON {
            path.line_to(Point::new(key.max_x() + join, neck_y)).cubic_to(
                Point::new(key.max_x() + join - KAPPA * join, neck_y),
                Point::new(key.max_x(), neck_y + stem_height - KAPPA * stem_height),
                Point::new(key.max_x(), neck_y + stem_height),
            );
        } else {
            path.line_to(Point::new(key.max_x(), neck_y));
        }
    }

    path.line_to(Point::new(key.max_x(), key.max_y() - rk))
        .corner_to(
            Point::new(key.max_x(), key.max_y()),
            Point::new(key.max_x() - rk, key.max_y()),
        )
        .line_to(Point::new(key.min_x() + rk, key.max_y()))
        .corner_to(
            Point::new(key.min_x(), key.max_y()),
            Point::new(key.min_x(), key.max_y() - rk),
        );

    // Key's left side up and out into the left overhang
    if gap_left > EPSILON {
        let rl = r.min(gap_left / 2.0);
        let join = (gap_left - rl).min(stem_height.max(r));
        if join > EPSILON && stem_height > EPSILON {
            path.line_to(Point::new(key.min_x(), neck_y + stem_height)).cubic_to(
                Point::new(key.min_x(), neck_y + stem_height - KAPPA * stem_height),
                Point::new(key.min_x() - join + KAPPA * join, neck_y),
                Point::new(key.min_x() - join, neck_y),
            );
        } else {
            path.line_to(Point::new(key.min_x(), neck_y));
        }
        path.line_to(Point::new(bubble.min_x() + rl, neck_y)).corner_to(
            Point::new(bubble.min_x(), neck_y),
            Point::new(bubble.min_x(), neck_y - rl),
        );
    }

    path.line_to(Point::new(bubble.min_x(), bubble.min_y() + r))
        .corner_to(
            Point::new(bubble.min_x(), bubble.min_y()),
            Point::new(bubble.min_x() + r, bubble.min_y()),
        )
        .close();
    path
}

/// How a shape is filled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid(Rgba),
    /// Two-stop gradient from `start` to `end`
    LinearGradient {
        top: Rgba,
        bottom: Rgba,
        start: Point,
        end: Point,
    },
}

impl Fill {
    /// Solid fill, or a top-to-bottom gradient across `rect` when a second stop is set
    pub fn vertical(top: Rgba, bottom: Option<Rgba>, rect: Rect) -> Self {
        match bottom {
            Some(bottom) => Fill::LinearGradient {
                top,
                bottom,
                start: Point::new(rect.center().x, rect.min_y()),
                end: Point::new(rect.center().x, rect.max_y()),
            },
            None => Fill::Solid(top),
        }
    }

    /// Color of the fill at a point
    pub fn color_at(&self, point: Point) -> Rgba {
        match *self {
            Fill::Solid(color) => color,
            Fill::LinearGradient {
                top,
                bottom,
                start,
                end,
            } => {
                let span = end.y - start.y;
                if span.abs() < EPSILON {
                    return top;
                }
                top.mix(bottom, (point.y - start.y) / span)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Rgba,
    pub offset: Point,
}

/// Which font a label is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRole {
    Primary,
    Alternate,
    Option,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeLayer {
    pub path: Path,
    pub fill: Fill,
    pub stroke: Option<Stroke>,
    pub shadow: Option<Shadow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    pub text: String,
    pub center: Point,
    pub role: FontRole,
    pub size: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Shape(ShapeLayer),
    Text(TextLayer),
}

/// Ordered drawing instructions for one key, back to front
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorScene {
    pub layers: Vec<Layer>,
}

impl VectorScene {
    pub fn shapes(&self) -> impl Iterator<Item = &ShapeLayer> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Shape(shape) => Some(shape),
            Layer::Text(_) => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextLayer> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Text(text) => Some(text),
            Layer::Shape(_) => None,
        })
    }

    fn push_shape(&mut self, shape: ShapeLayer) {
        self.layers.push(Layer::Shape(shape));
    }

    fn push_text(&mut self, text: TextLayer) {
        if !text.text.is_empty() {
            self.layers.push(Layer::Text(text));
        }
    }
}

/// Labels drawn on a key, already resolved from its configuration
#[derive(Debug, Clone, Default)]
pub struct KeyLabels<'a> {
    pub primary: &'a str,
    pub alternate: Option<&'a str>,
    /// One label per option, display names already applied
    pub options: Vec<&'a str>,
    /// Suppresses every label
    pub trackpad: bool,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone)]
pub struct SceneRequest<'a> {
    pub key_frame: Rect,
    pub callout: Option<&'a CalloutGeometry>,
    pub active_option: Option<usize>,
    pub pressed: bool,
    pub corner_radius: f32,
    pub labels: KeyLabels<'a>,
    pub theme: &'a ButtonTheme,
}

/// Build the scene for a key
pub fn render(request: &SceneRequest<'_>) -> VectorScene {
    let theme = request.theme;
    let key = request.key_frame;
    let mut scene = VectorScene::default();

    let stroke = theme.has_border().then_some(Stroke {
        color: theme.border_color,
        width: theme.border_width,
    });
    let shadow = theme.show_shadow.then_some(Shadow {
        color: theme.key_shadow_color,
        offset: Point::new(0.0, 1.0),
    });

    match request.callout {
        Some(callout) => {
            scene.push_shape(ShapeLayer {
                path: callout_outline(callout, request.corner_radius),
                fill: Fill::vertical(theme.key_color, theme.key_bottom_color, callout.frame),
                stroke,
                shadow,
            });
            if let Some(cell) = request.active_option.and_then(|i| callout.cells.get(i)) {
                let highlight = cell.inset(cell.width * 0.08, cell.height * 0.1);
                scene.push_shape(ShapeLayer {
                    path: rounded_rect(highlight, request.corner_radius),
                    fill: Fill::Solid(theme.option_highlight_color),
                    stroke: None,
                    shadow: None,
                });
            }
        }
        None => {
            let fill = if request.pressed {
                Fill::vertical(
                    theme.key_highlighted_color,
                    theme.key_bottom_highlighted_color,
                    key,
                )
            } else {
                Fill::vertical(theme.key_color, theme.key_bottom_color, key)
            };
            scene.push_shape(ShapeLayer {
                path: rounded_rect(key, request.corner_radius),
                fill,
                stroke,
                shadow,
            });
        }
    }

    if request.labels.trackpad {
        return scene;
    }

    scene.push_text(TextLayer {
        text: request.labels.primary.to_string(),
        center: key.center(),
        role: FontRole::Primary,
        size: theme.fonts.primary,
        color: theme.key_text_color,
    });
    if let Some(alternate) = request.labels.alternate {
        scene.push_text(TextLayer {
            text: alternate.to_string(),
            center: Point::new(key.center().x, key.min_y() + key.height * 0.2),
            role: FontRole::Alternate,
            size: theme.fonts.alternate,
            color: theme.key_text_color,
        });
    }
    if let Some(callout) = request.callout {
        for (i, (cell, label)) in callout.cells.iter().zip(&request.labels.options).enumerate() {
            let color = if request.active_option == Some(i) {
                theme.option_highlight_text_color
            } else {
                theme.key_text_color
            };
            scene.push_text(TextLayer {
                text: label.to_string(),
                center: cell.center(),
                role: FontRole::Option,
                size: theme.fonts.options,
                color,
            });
        }
    }

    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::button::geometry::{resolve_callout, CalloutMetrics};
    use crate::button::ButtonPosition;

    fn key() -> Rect {
        Rect::new(100.0, 200.0, 30.0, 42.0)
    }

    fn callout(position: ButtonPosition) -> CalloutGeometry {
        resolve_callout(key(), position, 3, false, 0.0, &CalloutMetrics::phone()).expect("callout")
    }

    fn request<'a>(
        theme: &'a ButtonTheme,
        callout: Option<&'a CalloutGeometry>,
        pressed: bool,
    ) -> SceneRequest<'a> {
        SceneRequest {
            key_frame: key(),
            callout,
            active_option: callout.map(|_| 1),
            pressed,
            corner_radius: 6.0,
            labels: KeyLabels {
                primary: "e",
                alternate: None,
                options: vec!["è", "ê", "ë"],
                trackpad: false,
            },
            theme,
        }
    }

    #[test]
    fn rounded_rect_stays_within_rect() {
        let path = rounded_rect(key(), 6.0);
        let bounds = path.bounds().expect("bounds");
        assert!(bounds.min_x() >= key().min_x() - 1e-3);
        assert!(bounds.max_x() <= key().max_x() + 1e-3);
        assert!(path.contains(key().center()));
        assert!(!path.contains(Point::new(key().min_x() + 0.2, key().min_y() + 0.2)));
    }

    #[test]
    fn oversized_radius_is_clamped() {
        let path = rounded_rect(Rect::new(0.0, 0.0, 10.0, 4.0), 50.0);
        let bounds = path.bounds().expect("bounds");
        assert!((bounds.width - 10.0).abs() < 1e-3);
        assert!((bounds.height - 4.0).abs() < 1e-3);
    }

    #[test]
    fn normal_key_is_single_rounded_body() {
        let theme = ButtonTheme::default();
        let scene = render(&request(&theme, None, false));
        let shapes: Vec<_> = scene.shapes().collect();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].fill, Fill::Solid(theme.key_color));
        assert!(shapes[0].shadow.is_some());
        assert!(shapes[0].stroke.is_none());
    }

    #[test]
    fn pressed_key_uses_highlight_gradient_when_configured() {
        let mut theme = ButtonTheme::default();
        theme.key_bottom_highlighted_color = Some(Rgba::rgb(10, 10, 10));
        let scene = render(&request(&theme, None, true));
        let shape = scene.shapes().next().expect("body");
        match shape.fill {
            Fill::LinearGradient { top, bottom, start, end } => {
                assert_eq!(top, theme.key_highlighted_color);
                assert_eq!(bottom, Rgba::rgb(10, 10, 10));
                assert_eq!(start.y, key().min_y());
                assert_eq!(end.y, key().max_y());
            }
            other => panic!("expected gradient, got {:?}", other),
        }
    }

    #[test]
    fn gradient_color_runs_top_to_bottom() {
        let fill = Fill::vertical(Rgba::rgb(0, 0, 0), Some(Rgba::rgb(200, 200, 200)), key());
        assert_eq!(fill.color_at(Point::new(0.0, key().min_y())), Rgba::rgb(0, 0, 0));
        assert_eq!(fill.color_at(Point::new(0.0, key().max_y())), Rgba::rgb(200, 200, 200));
    }

    #[test]
    fn border_is_stroked_only_when_visible() {
        let mut theme = ButtonTheme::default();
        theme.border_width = 1.0;
        theme.border_color = Rgba::rgb(0, 0, 0);
        let scene = render(&request(&theme, None, false));
        let stroke = scene.shapes().next().and_then(|s| s.stroke).expect("stroke");
        assert_eq!(stroke.width, 1.0);
    }

    #[test]
    fn callout_outline_unites_bubble_and_key() {
        for position in [ButtonPosition::Left, ButtonPosition::Inner, ButtonPosition::Right] {
            let geometry = callout(position);
            let path = callout_outline(&geometry, 6.0);
            assert_eq!(path.flatten(8).len(), 1, "single outline for {:?}", position);
            assert!(path.contains(key().center()));
            assert!(path.contains(geometry.stem.center()));
            for cell in &geometry.cells {
                assert!(path.contains(cell.center()));
            }
            let bounds = path.bounds().expect("bounds");
            assert!(bounds.min_y() >= geometry.frame.min_y() - 1e-3);
            assert!(bounds.max_y() <= geometry.frame.max_y() + 1e-3);
        }
    }

    #[test]
    fn callout_outline_leaves_space_beside_key_open() {
        let geometry = callout(ButtonPosition::Inner);
        let path = callout_outline(&geometry, 6.0);
        let beside_key = Point::new(geometry.bubble.min_x() + 1.0, key().center().y);
        assert!(geometry.frame.contains(beside_key));
        assert!(!path.contains(beside_key));
    }

    #[test]
    fn callout_outline_scales_with_frame() {
        let small = callout_outline(&callout(ButtonPosition::Inner), 6.0);
        let metrics = CalloutMetrics {
            option_width: 64.0,
            row_height: 112.0,
            stem_height: 20.0,
            horizontal_padding: 12.0,
            ..CalloutMetrics::phone()
        };
        let big_key = Rect::new(200.0, 400.0, 60.0, 84.0);
        let geometry = resolve_callout(big_key, ButtonPosition::Inner, 3, false, 0.0, &metrics)
            .expect("callout");
        let big = callout_outline(&geometry, 12.0);
        let (a, b) = (small.bounds().expect("a"), big.bounds().expect("b"));
        assert!((b.width - 2.0 * a.width).abs() < 1e-2);
        assert!((b.height - 2.0 * a.height).abs() < 1e-2);
    }

    #[test]
    fn callout_highlights_only_active_cell() {
        let theme = ButtonTheme::default();
        let geometry = callout(ButtonPosition::Inner);
        let scene = render(&request(&theme, Some(&geometry), true));
        let shapes: Vec<_> = scene.shapes().collect();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[1].fill, Fill::Solid(theme.option_highlight_color));
        assert!(shapes[1].path.contains(geometry.cells[1].center()));
        assert!(!shapes[1].path.contains(geometry.cells[0].center()));

        let active: Vec<_> = scene
            .texts()
            .filter(|t| t.color == theme.option_highlight_text_color)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].text, "ê");
    }

    #[test]
    fn option_labels_are_centered_in_cells() {
        let theme = ButtonTheme::default();
        let geometry = callout(ButtonPosition::Right);
        let scene = render(&request(&theme, Some(&geometry), true));
        let options: Vec<_> = scene.texts().filter(|t| t.role == FontRole::Option).collect();
        assert_eq!(options.len(), 3);
        for (text, cell) in options.iter().zip(&geometry.cells) {
            assert_eq!(text.center, cell.center());
        }
    }

    #[test]
    fn trackpad_mode_hides_all_text() {
        let theme = ButtonTheme::default();
        let geometry = callout(ButtonPosition::Inner);
        let mut req = request(&theme, Some(&geometry), true);
        req.labels.trackpad = true;
        req.labels.alternate = Some("é");
        let scene = render(&req);
        assert_eq!(scene.texts().count(), 0);
        assert_eq!(scene.shapes().count(), 2);
    }

    #[test]
    fn alternate_label_is_drawn_above_center() {
        let theme = ButtonTheme::default();
        let mut req = request(&theme, None, false);
        req.labels.alternate = Some("é");
        let scene = render(&req);
        let alternate = scene
            .texts()
            .find(|t| t.role == FontRole::Alternate)
            .expect("alternate label");
        assert!(alternate.center.y < key().center().y);
    }
}
