//! Shaped glyph storage.
//!
//! A chunk is shaped as one or more [`GlyphRun`]s (one per font/style
//! sub-run). [`GlyphVector`] merges them into a single logical vector with
//! global, monotonic glyph indices; every read and write is delegated to the
//! run that owns the glyph.

extern crate alloc;

use alloc::vec::Vec;

use crate::geometry::Point;

/// Final state of one glyph after a layout pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Placement {
    /// Not yet decided. No glyph is left in this state after a pass.
    #[default]
    Pending,
    /// Visible at the given final position.
    Visible(Point),
    /// Not drawn: structurally invisible, elided, or overflowed.
    Hidden,
}

impl Placement {
    /// True for [`Placement::Visible`].
    pub fn is_visible(self) -> bool {
        matches!(self, Self::Visible(_))
    }

    /// Final position for visible glyphs.
    pub fn position(self) -> Option<Point> {
        match self {
            Self::Visible(p) => Some(p),
            _ => None,
        }
    }
}

/// One glyph as produced by the shaping engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapedGlyph {
    /// Font-specific glyph id.
    pub glyph_id: u32,
    /// Number of source characters this glyph covers (>1 for ligatures).
    pub char_count: usize,
    /// Natural (shaped, unbroken) pen position.
    pub natural: Point,
    placement: Placement,
}

impl ShapedGlyph {
    /// Construct a glyph at its natural position.
    pub fn new(glyph_id: u32, char_count: usize, natural: Point) -> Self {
        Self {
            glyph_id,
            char_count: char_count.max(1),
            natural,
            placement: Placement::Pending,
        }
    }

    /// Layout result for this glyph.
    pub fn placement(&self) -> Placement {
        self.placement
    }
}

/// One shaping sub-run of a chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphRun {
    glyphs: Vec<ShapedGlyph>,
    end: Point,
}

impl GlyphRun {
    /// Build a run; `end` is the pen position after the last glyph.
    pub fn new(glyphs: Vec<ShapedGlyph>, end: Point) -> Self {
        Self { glyphs, end }
    }

    /// Glyphs in this run.
    pub fn glyphs(&self) -> &[ShapedGlyph] {
        &self.glyphs
    }

    /// Pen position after the last glyph.
    pub fn end(&self) -> Point {
        self.end
    }

    /// Number of glyphs.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// True when the run holds no glyphs.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Several [`GlyphRun`]s viewed as one globally indexed glyph sequence.
///
/// Natural positions of all runs are expected to share one coordinate space
/// (each run continues where the previous one ended).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphVector {
    runs: Vec<GlyphRun>,
    /// Global index of each run's first glyph.
    starts: Vec<usize>,
    len: usize,
}

impl GlyphVector {
    /// Merge sub-runs into one logical vector. Empty runs are dropped.
    pub fn from_runs(runs: Vec<GlyphRun>) -> Self {
        let runs: Vec<GlyphRun> = runs.into_iter().filter(|r| !r.is_empty()).collect();
        let mut starts = Vec::with_capacity(runs.len());
        let mut len = 0usize;
        for run in &runs {
            starts.push(len);
            len += run.len();
        }
        Self { runs, starts, len }
    }

    /// Single-run convenience.
    pub fn from_run(run: GlyphRun) -> Self {
        Self::from_runs(alloc::vec![run])
    }

    /// Total glyph count across all runs.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when there are no glyphs.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Underlying sub-runs.
    pub fn runs(&self) -> &[GlyphRun] {
        &self.runs
    }

    fn locate(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.len {
            return None;
        }
        let run = match self.starts.binary_search(&index) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        Some((run, index - self.starts[run]))
    }

    /// Glyph at a global index.
    pub fn glyph(&self, index: usize) -> Option<&ShapedGlyph> {
        let (run, local) = self.locate(index)?;
        self.runs[run].glyphs.get(local)
    }

    /// Characters covered by the glyph at `index` (0 when out of range).
    pub fn char_count(&self, index: usize) -> usize {
        self.glyph(index).map_or(0, |g| g.char_count)
    }

    /// Natural pen position of glyph `index`; `index == len()` yields the
    /// position after the final glyph.
    pub fn natural_position(&self, index: usize) -> Point {
        if let Some(g) = self.glyph(index) {
            return g.natural;
        }
        self.runs.last().map(|r| r.end).unwrap_or_default()
    }

    /// Layout result of glyph `index`.
    pub fn placement(&self, index: usize) -> Placement {
        self.glyph(index).map_or(Placement::Pending, |g| g.placement)
    }

    /// Commit glyph `index` visible at `at`.
    pub fn place(&mut self, index: usize, at: Point) {
        self.set_placement(index, Placement::Visible(at));
    }

    /// Commit glyph `index` hidden.
    pub fn hide(&mut self, index: usize) {
        self.set_placement(index, Placement::Hidden);
    }

    fn set_placement(&mut self, index: usize, placement: Placement) {
        if let Some((run, local)) = self.locate(index) {
            if let Some(g) = self.runs[run].glyphs.get_mut(local) {
                g.placement = placement;
            }
        }
    }

    /// Forget all placements (for re-running a layout pass).
    pub fn reset_placements(&mut self) {
        for run in &mut self.runs {
            for g in &mut run.glyphs {
                g.placement = Placement::Pending;
            }
        }
    }

    /// Iterate placements in global index order.
    pub fn placements(&self) -> impl Iterator<Item = Placement> + '_ {
        self.runs
            .iter()
            .flat_map(|r| r.glyphs.iter().map(|g| g.placement))
    }
}
