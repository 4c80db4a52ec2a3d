//! Line assembly and final glyph placement.
//!
//! A [`LineBuilder`] collects words for one visual row while testing their
//! widths against the span the region offers at the line's Y. `layout`
//! writes the final placement of every glyph of the accepted words; it only
//! reads the analyzer's [`GlyphAdjustments`](crate::words::GlyphAdjustments).

use smallvec::SmallVec;

use crate::config::FlowConfig;
use crate::geometry::{Point, Span};
use crate::glyphs::GlyphVector;
use crate::region::RegionCursor;
use crate::text::{BlockInfo, LineMetrics, TextAlign};
use crate::words::{Word, WordAnalysis};

const FIT_EPSILON: f32 = 1e-3;

/// Committed line, as reported in [`crate::FlowOutcome`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LineSummary {
    /// Region index the line was placed in.
    pub region: usize,
    /// Chunk index the words come from.
    pub chunk: usize,
    /// Index of the first word in the chunk's word stream.
    pub first_word: usize,
    /// Number of words on the line.
    pub word_count: usize,
    /// Top of the line box.
    pub top: f32,
    /// Line box height.
    pub height: f32,
    /// Baseline Y.
    pub baseline: f32,
    /// X of the first glyph.
    pub x: f32,
    /// Width of the placed content, after alignment and justification.
    pub width: f32,
    /// Last line of its paragraph.
    pub para_end: bool,
}

#[derive(Clone, Copy, Debug)]
struct Fit {
    height: f32,
    metrics: LineMetrics,
    span: Span,
}

/// Words accumulated for one visual row.
#[derive(Clone, Debug)]
pub struct LineBuilder {
    block: BlockInfo,
    para_start: bool,
    para_end: bool,
    words: SmallVec<[usize; 16]>,
    /// Width of the accepted words when more content follows.
    advance: f32,
    /// Width of the accepted words when the last one ends the line.
    end_width: f32,
    metrics: Option<LineMetrics>,
    height: f32,
    span: Option<Span>,
}

impl LineBuilder {
    /// Empty line for `block`. `para_start` applies the first-line indent;
    /// `height_hint` is the expected line height.
    pub fn new(block: &BlockInfo, para_start: bool, height_hint: f32) -> Self {
        let height = if height_hint.is_finite() {
            height_hint.max(block.line_height)
        } else {
            block.line_height
        };
        Self {
            block: *block,
            para_start,
            para_end: false,
            words: SmallVec::new(),
            advance: 0.0,
            end_width: 0.0,
            metrics: None,
            height: height.max(0.0),
            span: None,
        }
    }

    /// True when no word was accepted.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Indices of the accepted words.
    pub fn words(&self) -> &[usize] {
        &self.words
    }

    /// Current line height.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Mark the line as the last one of its paragraph.
    pub fn set_para_end(&mut self, para_end: bool) {
        self.para_end = para_end;
    }

    /// Move the line down to `y`. Returns `false` once the region is exhausted.
    pub fn goto_y(&mut self, cursor: &mut RegionCursor<'_>, y: f32) -> bool {
        cursor.goto_y(y, self.height)
    }

    fn usable(&self, span: Span) -> (f32, f32) {
        let mut x0 = span.x0 + self.block.left_margin;
        if self.para_start {
            x0 += self.block.indent;
        }
        let x1 = span.x1 - self.block.right_margin;
        (x0, x1 - x0)
    }

    fn fits_at(&self, cursor: &RegionCursor<'_>, y: f32, word: &Word) -> Option<Fit> {
        let metrics = match self.metrics {
            Some(m) => m.union(word.metrics()),
            None => word.metrics(),
        };
        let height = self
            .height
            .max(word.line_height())
            .max(metrics.height());
        let span = cursor.span_at(y, height)?;
        let (_, width) = self.usable(span);
        (self.advance + word.last_advance() <= width + FIT_EPSILON).then_some(Fit {
            height,
            metrics,
            span,
        })
    }

    fn accept(&mut self, word: &Word, fit: Fit) {
        self.words.push(word.index());
        self.end_width = self.advance + word.last_advance();
        self.advance += word.advance();
        self.metrics = Some(fit.metrics);
        self.height = fit.height;
        self.span = Some(fit.span);
    }

    /// Append `word` at the line's current Y if it fits.
    ///
    /// A word that grows the line height is tested against the span offered
    /// at the new height.
    pub fn add_word(&mut self, cursor: &RegionCursor<'_>, word: &Word) -> bool {
        match self.fits_at(cursor, cursor.y(), word) {
            Some(fit) => {
                self.accept(word, fit);
                true
            }
            None => false,
        }
    }

    /// Place `word` as the first word of this line, moving the line down
    /// until it fits. Returns `false` once the region is exhausted.
    pub fn fit_word(&mut self, cursor: &mut RegionCursor<'_>, word: &Word, cfg: &FlowConfig) -> bool {
        if cursor.is_exhausted() {
            return false;
        }
        if self.add_word(cursor, word) {
            return true;
        }
        let step = cfg.step_for(self.height.max(word.line_height()));
        loop {
            let failed = cursor.y();
            let next = failed + step;
            // Step lost to f32 precision far from the origin.
            if next <= failed {
                return false;
            }
            if self.fits_at(cursor, next, word).is_some() {
                let mut lo = failed;
                let mut hi = next;
                for _ in 0..cfg.fit.refine_iterations() {
                    let mid = lo + (hi - lo) * 0.5;
                    if self.fits_at(cursor, mid, word).is_some() {
                        hi = mid;
                    } else {
                        lo = mid;
                    }
                }
                if !self.goto_y(cursor, hi) {
                    return false;
                }
                return self.add_word(cursor, word);
            }
            if !self.goto_y(cursor, next) {
                return false;
            }
        }
    }

    /// Commit final placements for every glyph of the accepted words and
    /// close the line on `cursor`. Returns `None` for an empty line.
    pub fn layout(
        &self,
        cursor: &mut RegionCursor<'_>,
        glyphs: &mut GlyphVector,
        analysis: &WordAnalysis,
        region: usize,
        chunk: usize,
    ) -> Option<LineSummary> {
        let (&first, &last) = (self.words.first()?, self.words.last()?);
        let span = self.span?;
        let words = analysis.words();
        let adj = analysis.adjustments();
        let metrics = self.metrics.unwrap_or_default();

        let line_end = words.get(last).and_then(|w| w.groups().last()).map(|g| g.end);
        let is_line_end = |g: usize| Some(g) == line_end;

        let (x0, usable) = self.usable(span);
        let extra = (usable - self.end_width).max(0.0);
        let mut x = x0;
        let mut gap = 0.0f32;
        match self.block.align {
            TextAlign::Start => {}
            TextAlign::Middle => x += extra * 0.5,
            TextAlign::End => x += extra,
            TextAlign::Full => {
                if !self.para_end {
                    let spaces = self
                        .words
                        .iter()
                        .filter_map(|&w| words.get(w))
                        .flat_map(Word::glyphs)
                        .filter(|&g| adj.is_space(g) && !is_line_end(g))
                        .count();
                    if spaces > 0 {
                        gap = extra / spaces as f32;
                    }
                }
            }
        }

        let top = cursor.y();
        let baseline = top + (self.height - (metrics.ascent + metrics.descent)) * 0.5 + metrics.ascent;
        let start_x = x;

        for word in self.words.iter().filter_map(|&w| words.get(w)) {
            for group in word.groups() {
                let ends_line = is_line_end(group.end);
                let origin = glyphs.natural_position(group.start);
                let mut shift = 0.0f32;
                for g in group.glyphs() {
                    if adj.is_hidden(g) {
                        glyphs.hide(g);
                        shift += adj.advance_adjust(g);
                        continue;
                    }
                    if adj.is_soft_hyphen(g) && !is_line_end(g) {
                        glyphs.hide(g);
                        shift += adj.advance_adjust(g);
                        continue;
                    }
                    let natural = glyphs.natural_position(g);
                    glyphs.place(
                        g,
                        Point::new(x + natural.x - origin.x + shift, baseline + natural.y),
                    );
                    if adj.is_space(g) && !is_line_end(g) {
                        shift += gap;
                    }
                }
                let advance = if ends_line {
                    group.last_advance
                } else {
                    group.advance
                };
                // Mid-group soft hyphen and space corrections are already in
                // the group advance; only the justification gaps are added.
                let gaps = group
                    .glyphs()
                    .filter(|&g| adj.is_space(g) && !is_line_end(g))
                    .count() as f32
                    * gap;
                x += advance + gaps;
            }
        }

        cursor.commit_line(self.height);
        let summary = LineSummary {
            region,
            chunk,
            first_word: first,
            word_count: self.words.len(),
            top,
            height: self.height,
            baseline,
            x: start_x,
            width: x - start_x,
            para_end: self.para_end,
        };
        log::trace!(
            "line region={} chunk={} words={}..{} top={} height={} width={}",
            region,
            chunk,
            first,
            first + self.words.len(),
            top,
            self.height,
            summary.width
        );
        Some(summary)
    }
}
