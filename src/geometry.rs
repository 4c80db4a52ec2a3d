//! Region geometry: the shapes lines are poured into.
//!
//! A region only has to answer two questions: how far does it extend
//! vertically ([`FlowShape::bounds`]) and which horizontal span is fully
//! inside it for a band of height `h` starting at `y` ([`FlowShape::span_at`]).
//! Shapes may be non-convex, so the span varies with `y` and may vanish
//! (holes, notches) before the shape's bottom is reached.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

/// 2D point in layout space (y grows downward).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Construct a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Horizontal extent `[x0, x1]` available to a line.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// Left edge.
    pub x0: f32,
    /// Right edge.
    pub x1: f32,
}

impl Span {
    /// Usable width, never negative.
    pub fn width(self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    fn intersect(self, other: Span) -> Option<Span> {
        let x0 = self.x0.max(other.x0);
        let x1 = self.x1.min(other.x1);
        (x1 > x0).then_some(Span { x0, x1 })
    }
}

/// Axis-aligned bounding box of a shape.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Right edge.
    pub right: f32,
    /// Bottom edge.
    pub bottom: f32,
}

impl Bounds {
    /// True when all edges are finite and the box is not inverted.
    pub fn is_valid(self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
            && self.right >= self.left
            && self.bottom >= self.top
    }
}

/// Region provider: a geometric area that accepts poured lines.
pub trait FlowShape: Send + Sync {
    /// Bounding box of the shape.
    fn bounds(&self) -> Bounds;

    /// Widest horizontal span fully inside the shape for the band
    /// `[y, y + height]`, or `None` if the band has no interior there.
    fn span_at(&self, y: f32, height: f32) -> Option<Span>;

    /// True when a band starting at `y` with `height` extends past the
    /// shape's bottom edge.
    fn is_past(&self, y: f32, height: f32) -> bool {
        y + height > self.bounds().bottom
    }
}

/// Rectangular region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectShape {
    bounds: Bounds,
}

impl RectShape {
    /// Rectangle with top-left corner `(x, y)`.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            bounds: Bounds {
                left: x,
                top: y,
                right: x + width,
                bottom: y + height,
            },
        }
    }
}

impl FlowShape for RectShape {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn span_at(&self, y: f32, height: f32) -> Option<Span> {
        let b = self.bounds;
        if y < b.top || y + height > b.bottom || b.right <= b.left {
            return None;
        }
        Some(Span {
            x0: b.left,
            x1: b.right,
        })
    }
}

/// Closed polygon region filled with the even-odd rule.
///
/// The span for a band is the widest interval that is inside the polygon on
/// every sampled scanline of the band: just below the top, just above the
/// bottom, and at each vertex height strictly between them.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonShape {
    points: Vec<Point>,
    bounds: Bounds,
}

const SCANLINE_INSET: f32 = 1.0e-3;

impl PolygonShape {
    /// Build a polygon from its vertices; the last vertex connects back to
    /// the first.
    pub fn new(points: Vec<Point>) -> Self {
        let mut bounds = Bounds {
            left: f32::INFINITY,
            top: f32::INFINITY,
            right: f32::NEG_INFINITY,
            bottom: f32::NEG_INFINITY,
        };
        for p in &points {
            bounds.left = bounds.left.min(p.x);
            bounds.top = bounds.top.min(p.y);
            bounds.right = bounds.right.max(p.x);
            bounds.bottom = bounds.bottom.max(p.y);
        }
        Self { points, bounds }
    }

    /// Polygon vertices.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    fn intervals_at(&self, y: f32, out: &mut Vec<Span>) {
        out.clear();
        let n = self.points.len();
        if n < 3 {
            return;
        }
        let mut xs: Vec<f32> = Vec::with_capacity(8);
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let crosses = (a.y <= y && y < b.y) || (b.y <= y && y < a.y);
            if crosses {
                let t = (y - a.y) / (b.y - a.y);
                xs.push(a.x + t * (b.x - a.x));
            }
        }
        xs.sort_by(f32::total_cmp);
        for pair in xs.chunks_exact(2) {
            if pair[1] > pair[0] {
                out.push(Span {
                    x0: pair[0],
                    x1: pair[1],
                });
            }
        }
    }
}

impl FlowShape for PolygonShape {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn span_at(&self, y: f32, height: f32) -> Option<Span> {
        if !self.bounds.is_valid() || y < self.bounds.top || y + height > self.bounds.bottom {
            return None;
        }
        let inset = SCANLINE_INSET.min(height * 0.5);
        let mut samples: Vec<f32> = Vec::with_capacity(4);
        samples.push(y + inset);
        samples.push(y + height - inset);
        for p in &self.points {
            if p.y > y && p.y < y + height {
                samples.push(p.y);
            }
        }

        let mut scratch = Vec::with_capacity(4);
        let mut current: Vec<Span> = Vec::new();
        for (i, &sy) in samples.iter().enumerate() {
            self.intervals_at(sy, &mut scratch);
            if i == 0 {
                current.clone_from(&scratch);
                continue;
            }
            let mut next = Vec::with_capacity(current.len());
            for a in &current {
                for b in &scratch {
                    if let Some(s) = a.intersect(*b) {
                        next.push(s);
                    }
                }
            }
            current = next;
            if current.is_empty() {
                return None;
            }
        }
        current
            .into_iter()
            .max_by(|a, b| a.width().total_cmp(&b.width()))
    }
}

/// One region of the flow, in pour order.
#[derive(Clone)]
pub struct FlowRegion {
    shape: Arc<dyn FlowShape>,
}

impl fmt::Debug for FlowRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowRegion")
            .field("bounds", &self.shape.bounds())
            .finish()
    }
}

impl FlowRegion {
    /// Wrap an arbitrary shape.
    pub fn new(shape: Arc<dyn FlowShape>) -> Self {
        Self { shape }
    }

    /// Rectangular region.
    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(Arc::new(RectShape::new(x, y, width, height)))
    }

    /// Polygon region.
    pub fn polygon(points: Vec<Point>) -> Self {
        Self::new(Arc::new(PolygonShape::new(points)))
    }

    /// The region's shape.
    pub fn shape(&self) -> &dyn FlowShape {
        self.shape.as_ref()
    }
}
