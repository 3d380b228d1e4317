//! Connector outlines between node edges.
//!
//! Bézier mode draws the classic Sankey "S": two cubic rails (top and
//! bottom) offset by the half thickness and joined into one closed outline.
//! Ribbon mode samples a single centerline cubic and offsets every sample
//! along its local normal, which keeps the visual width honest through the
//! bend (Tiller–Hanson offsetting).

use crate::ir::RenderMode;

use super::types::{Scale, SankeyFlow, SankeyNode};

pub const RIBBON_STEPS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn offset(self, normal: Point, distance: f32) -> Point {
        Point::new(self.x + normal.x * distance, self.y + normal.y * distance)
    }
}

fn fmt_point(point: Point) -> String {
    format!("{:.2},{:.2}", point.x, point.y)
}

pub fn cubic_point(t: f32, p0: Point, p1: Point, p2: Point, p3: Point) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

pub fn cubic_tangent(t: f32, p0: Point, p1: Point, p2: Point, p3: Point) -> Point {
    let mt = 1.0 - t;
    let a = 3.0 * mt * mt;
    let b = 6.0 * mt * t;
    let c = 3.0 * t * t;
    Point::new(
        a * (p1.x - p0.x) + b * (p2.x - p1.x) + c * (p3.x - p2.x),
        a * (p1.y - p0.y) + b * (p2.y - p1.y) + c * (p3.y - p2.y),
    )
}

/// Unit normal (tangent rotated 90°). A zero-length tangent gives a zero
/// normal so the rails collapse onto the centerline.
pub fn cubic_normal(t: f32, p0: Point, p1: Point, p2: Point, p3: Point) -> Point {
    let tangent = cubic_tangent(t, p0, p1, p2, p3);
    let normal = Point::new(-tangent.y, tangent.x);
    let len = (normal.x * normal.x + normal.y * normal.y).sqrt();
    if len == 0.0 || !len.is_finite() {
        Point::new(0.0, 0.0)
    } else {
        Point::new(normal.x / len, normal.y / len)
    }
}

/// Closed outline of a constant-thickness cubic "S" from `start` to `end`;
/// control points sit one third of the span in from each end.
pub fn bezier_path(start: Point, end: Point, half_thickness: f32) -> String {
    let control = (end.x - start.x) / 3.0;

    let top_start = Point::new(start.x, start.y - half_thickness);
    let top_end = Point::new(end.x, end.y - half_thickness);
    let bottom_start = Point::new(end.x, end.y + half_thickness);
    let bottom_end = Point::new(start.x, start.y + half_thickness);

    let top_ctrl1 = Point::new(start.x + control, top_start.y);
    let top_ctrl2 = Point::new(end.x - control, top_end.y);
    let bottom_ctrl1 = Point::new(top_ctrl2.x, bottom_start.y);
    let bottom_ctrl2 = Point::new(top_ctrl1.x, bottom_end.y);

    format!(
        "M {} C {} {} {} L {} C {} {} {} Z",
        fmt_point(top_start),
        fmt_point(top_ctrl1),
        fmt_point(top_ctrl2),
        fmt_point(top_end),
        fmt_point(bottom_start),
        fmt_point(bottom_ctrl1),
        fmt_point(bottom_ctrl2),
        fmt_point(bottom_end),
    )
}

/// Samples the centerline cubic `steps + 1` times and emits the left rail
/// forward and the right rail backward as one closed polyline.
pub fn ribbon_path(
    p0: Point,
    p1: Point,
    p2: Point,
    p3: Point,
    half_thickness: f32,
    steps: usize,
) -> String {
    let steps = steps.max(1);
    let mut left: Vec<Point> = Vec::with_capacity(steps + 1);
    let mut right: Vec<Point> = Vec::with_capacity(steps + 1);
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let point = cubic_point(t, p0, p1, p2, p3);
        let normal = cubic_normal(t, p0, p1, p2, p3);
        left.push(point.offset(normal, half_thickness));
        right.push(point.offset(normal, -half_thickness));
    }

    let mut commands: Vec<String> = Vec::with_capacity(2 * steps + 3);
    commands.push(format!("M {}", fmt_point(left[0])));
    for point in left.iter().skip(1) {
        commands.push(format!("L {}", fmt_point(*point)));
    }
    for point in right.iter().rev() {
        commands.push(format!("L {}", fmt_point(*point)));
    }
    commands.push("Z".to_string());
    commands.join(" ")
}

/// Outline for `flow` between the right edge of `from` and the left edge of
/// `to`, in pixel space. Thickness is `value / 2 * scale.y` either side.
pub fn flow_path(flow: &SankeyFlow, from: &SankeyNode, to: &SankeyNode, scale: Scale) -> String {
    let mid_value = flow.value / 2.0;
    let half_thickness = mid_value * scale.y;

    let start = Point::new(
        from.pixel_x + from.width,
        from.pixel_y + (mid_value + flow.offset_from) * scale.y,
    );
    let end = Point::new(to.pixel_x, to.pixel_y + (mid_value + flow.offset_to) * scale.y);

    match flow.render {
        RenderMode::Bezier => bezier_path(start, end, half_thickness),
        RenderMode::Ribbon => ribbon_path(
            start,
            Point::new(start.x + scale.x / 2.0, start.y),
            Point::new(end.x - scale.x / 2.0, end.y),
            end,
            half_thickness,
            RIBBON_STEPS,
        ),
    }
}
