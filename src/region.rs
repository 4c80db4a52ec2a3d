//! Vertical placement progress inside one flow region.

use crate::geometry::{Bounds, FlowRegion, FlowShape, Span};

/// Cursor lifecycle: `ReadyForLine -> LineOpen -> (ReadyForLine | Exhausted)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorState {
    /// No line is being built; the next line starts at the cursor's Y.
    ReadyForLine,
    /// A line is being built at the cursor's Y.
    LineOpen,
    /// No further line fits. Terminal.
    Exhausted,
}

/// Wraps one region and tracks how far down it lines have been placed.
///
/// Y only moves downward.
pub struct RegionCursor<'a> {
    shape: &'a dyn FlowShape,
    bounds: Bounds,
    y: f32,
    line_height: f32,
    committed: f32,
    state: CursorState,
}

impl core::fmt::Debug for RegionCursor<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegionCursor")
            .field("bounds", &self.bounds)
            .field("y", &self.y)
            .field("line_height", &self.line_height)
            .field("state", &self.state)
            .finish()
    }
}

impl<'a> RegionCursor<'a> {
    /// Cursor at the top of `region`. Regions with non-finite or inverted
    /// bounds start exhausted.
    pub fn new(region: &'a FlowRegion) -> Self {
        Self::for_shape(region.shape())
    }

    /// Cursor over a bare shape.
    pub fn for_shape(shape: &'a dyn FlowShape) -> Self {
        let bounds = shape.bounds();
        let state = if bounds.is_valid() {
            CursorState::ReadyForLine
        } else {
            CursorState::Exhausted
        };
        Self {
            shape,
            bounds,
            y: if bounds.top.is_finite() { bounds.top } else { 0.0 },
            line_height: 0.0,
            committed: 0.0,
            state,
        }
    }

    /// Top of the current line slot.
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Lifecycle state.
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// True once no further line fits.
    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }

    /// Region bounds.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Move the line being built down to `y` (never up). Returns `false` and
    /// becomes exhausted when a line of `height` no longer fits above the
    /// region's bottom.
    pub fn goto_y(&mut self, y: f32, height: f32) -> bool {
        if self.is_exhausted() {
            return false;
        }
        if y > self.y {
            self.y = y;
        }
        self.line_height = height;
        if !self.y.is_finite() || self.shape.is_past(self.y, height) {
            log::trace!("region exhausted at y={} (line height {})", self.y, height);
            self.state = CursorState::Exhausted;
            return false;
        }
        self.state = CursorState::LineOpen;
        true
    }

    /// Span offered for a line of `height` at `y`, if any.
    pub fn span_at(&self, y: f32, height: f32) -> Option<Span> {
        if self.is_exhausted() || y < self.y || self.shape.is_past(y, height) {
            return None;
        }
        self.shape.span_at(y, height)
    }

    /// Span offered for a line of `height` at the cursor's Y.
    pub fn span(&self, height: f32) -> Option<Span> {
        self.span_at(self.y, height)
    }

    /// Record that the open line was finalized with `height`.
    pub fn commit_line(&mut self, height: f32) {
        self.committed = height;
        if !self.is_exhausted() {
            self.state = CursorState::ReadyForLine;
        }
    }

    /// Advance past the last committed line and open a slot for a line of
    /// `next_height`. Returns `false` once the region is exhausted.
    pub fn new_line(&mut self, next_height: f32) -> bool {
        if self.is_exhausted() {
            return false;
        }
        let y = self.y + self.committed;
        self.committed = 0.0;
        self.goto_y(y, next_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_advance_until_region_is_exhausted() {
        let region = FlowRegion::rect(0.0, 0.0, 100.0, 30.0);
        let mut cursor = RegionCursor::new(&region);
        assert_eq!(cursor.state(), CursorState::ReadyForLine);
        assert!(cursor.goto_y(0.0, 10.0));
        assert_eq!(cursor.state(), CursorState::LineOpen);
        cursor.commit_line(10.0);
        assert_eq!(cursor.state(), CursorState::ReadyForLine);
        assert!(cursor.new_line(10.0));
        assert_eq!(cursor.y(), 10.0);
        cursor.commit_line(10.0);
        assert!(cursor.new_line(10.0));
        cursor.commit_line(10.0);
        assert!(!cursor.new_line(10.0));
        assert!(cursor.is_exhausted());
        assert!(!cursor.goto_y(0.0, 1.0));
    }

    #[test]
    fn goto_y_never_moves_up() {
        let region = FlowRegion::rect(0.0, 0.0, 100.0, 100.0);
        let mut cursor = RegionCursor::new(&region);
        assert!(cursor.goto_y(40.0, 10.0));
        assert!(cursor.goto_y(20.0, 10.0));
        assert_eq!(cursor.y(), 40.0);
        assert_eq!(cursor.span_at(30.0, 10.0), None);
        assert!(cursor.span(10.0).is_some());
    }

    #[test]
    fn region_too_short_for_one_line_exhausts_immediately() {
        let region = FlowRegion::rect(0.0, 0.0, 100.0, 5.0);
        let mut cursor = RegionCursor::new(&region);
        assert!(!cursor.goto_y(0.0, 10.0));
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn non_finite_bounds_start_exhausted() {
        let region = FlowRegion::rect(0.0, 0.0, 100.0, f32::INFINITY);
        let cursor = RegionCursor::new(&region);
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.span(10.0), None);
    }
}
