//! Resize handles for selected schemas.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 8.0;
/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 6.0;
/// Smallest width or height a resize may produce, in millimeters.
pub const MIN_SIZE_MM: f64 = 1.0;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Corner(Corner),
    Edge(Edge),
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Handle {
    /// Position in page millimeters.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point hits this handle. Tolerance is in the same units as
    /// the point.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point.x - self.position.x).abs() <= tolerance && (point.y - self.position.y).abs() <= tolerance
    }
}

/// The eight resize handles of a bounding box: corners first, then edges.
pub fn handles_for(bounds: Rect) -> Vec<Handle> {
    let center = bounds.center();
    vec![
        Handle::new(Point::new(bounds.x0, bounds.y0), HandleKind::Corner(Corner::TopLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y0), HandleKind::Corner(Corner::TopRight)),
        Handle::new(Point::new(bounds.x0, bounds.y1), HandleKind::Corner(Corner::BottomLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y1), HandleKind::Corner(Corner::BottomRight)),
        Handle::new(Point::new(center.x, bounds.y0), HandleKind::Edge(Edge::Top)),
        Handle::new(Point::new(bounds.x1, center.y), HandleKind::Edge(Edge::Right)),
        Handle::new(Point::new(center.x, bounds.y1), HandleKind::Edge(Edge::Bottom)),
        Handle::new(Point::new(bounds.x0, center.y), HandleKind::Edge(Edge::Left)),
    ]
}

/// Find which handle (if any) is hit at the given point.
pub fn hit_test_handles(bounds: Rect, point: Point, tolerance: f64) -> Option<HandleKind> {
    handles_for(bounds)
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

/// Apply a handle drag to a bounding box.
///
/// The dragged side follows `delta`; the opposite side stays put. Sides that
/// cross are swapped, and the result is never smaller than [`MIN_SIZE_MM`].
pub fn resize_bounds(bounds: Rect, handle: HandleKind, delta: Vec2) -> Rect {
    let (mut x0, mut y0, mut x1, mut y1) = (bounds.x0, bounds.y0, bounds.x1, bounds.y1);
    match handle {
        HandleKind::Corner(Corner::TopLeft) => {
            x0 += delta.x;
            y0 += delta.y;
        }
        HandleKind::Corner(Corner::TopRight) => {
            x1 += delta.x;
            y0 += delta.y;
        }
        HandleKind::Corner(Corner::BottomLeft) => {
            x0 += delta.x;
            y1 += delta.y;
        }
        HandleKind::Corner(Corner::BottomRight) => {
            x1 += delta.x;
            y1 += delta.y;
        }
        HandleKind::Edge(Edge::Top) => y0 += delta.y,
        HandleKind::Edge(Edge::Right) => x1 += delta.x,
        HandleKind::Edge(Edge::Bottom) => y1 += delta.y,
        HandleKind::Edge(Edge::Left) => x0 += delta.x,
    }

    let (x0, x1) = if x0 < x1 { (x0, x1) } else { (x1, x0) };
    let (y0, y1) = if y0 < y1 { (y0, y1) } else { (y1, y0) };
    Rect::new(x0, y0, x0 + (x1 - x0).max(MIN_SIZE_MM), y0 + (y1 - y0).max(MIN_SIZE_MM))
}
