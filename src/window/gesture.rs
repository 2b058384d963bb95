//! Pointer-driven move and resize gestures.
//!
//! A gesture snapshots the pointer and the window geometry when it starts.
//! Every move recomputes geometry from that snapshot, never from the last
//! frame, so rounding errors do not accumulate.

use serde::{Deserialize, Serialize};

/// Pointer position in desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Window rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One of the eight resize hit-zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeEdge {
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeEdge {
    pub const ALL: [Self; 8] = [
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// Parse handle names such as `"top-left"`.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|edge| edge.as_str() == raw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }

    fn moves_top(self) -> bool {
        matches!(self, Self::Top | Self::TopLeft | Self::TopRight)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::Bottom | Self::BottomLeft | Self::BottomRight)
    }

    fn moves_left(self) -> bool {
        matches!(self, Self::Left | Self::TopLeft | Self::BottomLeft)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::Right | Self::TopRight | Self::BottomRight)
    }
}

/// Where a pointer-down landed on a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "edge", rename_all = "snake_case")]
pub enum HitTarget {
    /// Title bar, outside any button.
    Header,
    /// A button embedded in the title bar (close, minimize, ...).
    HeaderButton,
    ResizeHandle(ResizeEdge),
    /// Application content.
    Body,
}

/// What the gesture does with pointer deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    Resize(ResizeEdge),
}

/// An in-progress gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    pub kind: GestureKind,
    pub pointer_start: Point,
    pub start: Geometry,
}

impl Gesture {
    /// Start a gesture for a pointer-down on `target`, if it starts one at all.
    pub fn begin(target: HitTarget, pointer: Point, start: Geometry) -> Option<Self> {
        let kind = match target {
            HitTarget::Header => GestureKind::Move,
            HitTarget::ResizeHandle(edge) => GestureKind::Resize(edge),
            HitTarget::HeaderButton | HitTarget::Body => return None,
        };
        Some(Self {
            kind,
            pointer_start: pointer,
            start,
        })
    }

    /// Geometry for the current pointer position.
    pub fn geometry_at(&self, pointer: Point, min_width: f64, min_height: f64) -> Geometry {
        let dx = pointer.x - self.pointer_start.x;
        let dy = pointer.y - self.pointer_start.y;
        match self.kind {
            GestureKind::Move => Geometry {
                x: self.start.x + dx,
                y: self.start.y + dy,
                ..self.start
            },
            GestureKind::Resize(edge) => {
                resize_geometry(self.start, edge, dx, dy, min_width, min_height)
            }
        }
    }
}

/// Apply a resize delta to `start`.
///
/// Width and height are floored at the minimums. When the left or top edge
/// moves, the opposite edge stays anchored even while the floor is in effect.
pub fn resize_geometry(
    start: Geometry,
    edge: ResizeEdge,
    dx: f64,
    dy: f64,
    min_width: f64,
    min_height: f64,
) -> Geometry {
    let mut next = start;
    if edge.moves_right() {
        next.width = (start.width + dx).max(min_width);
    }
    if edge.moves_bottom() {
        next.height = (start.height + dy).max(min_height);
    }
    if edge.moves_left() {
        next.width = (start.width - dx).max(min_width);
        next.x = start.x + start.width - next.width;
    }
    if edge.moves_top() {
        next.height = (start.height - dy).max(min_height);
        next.y = start.y + start.height - next.height;
    }
    next
}
