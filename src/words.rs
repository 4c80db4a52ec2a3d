//! Word analysis: segmentation of a chunk's glyph stream into words.
//!
//! Three passes over the glyphs:
//!
//! 1. Boundary collapse. A ligature glyph whose characters carry different
//!    word-limit ids joins those words ([`WordUnion`], smallest id wins).
//! 2. Metrics and special characters. Line metrics are folded into the
//!    ending word on every word change and at every font-run limit, so one
//!    word may aggregate several runs. Soft hyphens, zero-width characters
//!    and spaces get their per-glyph adjustments.
//! 3. Grouping. Each word's glyph indices are split into maximal contiguous
//!    [`GlyphGroup`]s.
//!
//! The per-glyph [`GlyphAdjustments`] arrays are written only here. Placement
//! reads them and never mutates them.

extern crate alloc;

use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::glyphs::GlyphVector;
use crate::text::{
    AttributedText, FlowLineId, FontMetrics, LineMetrics, RenderContext, TextRun, SOFT_HYPHEN,
    SPACE, ZERO_WIDTH_JOINER, ZERO_WIDTH_SPACE,
};

const INITIAL_WORD_CAPACITY: usize = 10;

/// Union-find over word-limit ids with path compression.
///
/// The smaller id of a union is always the canonical one. Storage grows by
/// doubling and unseen ids are their own root.
#[derive(Clone, Debug, Default)]
pub struct WordUnion {
    parent: Vec<usize>,
}

impl WordUnion {
    /// Empty structure with room for `capacity` ids.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut union = Self {
            parent: Vec::with_capacity(capacity),
        };
        union.ensure(capacity.saturating_sub(1));
        union
    }

    /// Number of ids currently tracked.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// True when no id is tracked.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Make `id` addressable, doubling storage when needed.
    pub fn ensure(&mut self, id: usize) {
        if id < self.parent.len() {
            return;
        }
        let target = (id + 1).max(self.parent.len() * 2);
        let old = self.parent.len();
        self.parent.extend(old..target);
    }

    /// Canonical id of `id`.
    pub fn find(&mut self, id: usize) -> usize {
        self.ensure(id);
        let mut root = id;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = id;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Merge the sets of `a` and `b`; returns the canonical id.
    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let ra = self.find(a);
        let rb = self.find(b);
        let (keep, merge) = if ra <= rb { (ra, rb) } else { (rb, ra) };
        self.parent[merge] = keep;
        keep
    }
}

/// Per-glyph flags and advance corrections of one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphAdjustments {
    hide: Vec<bool>,
    soft_hyphen: Vec<bool>,
    advance_adjust: Vec<f32>,
    trailing_adjust: Vec<f32>,
    space: Vec<bool>,
}

impl GlyphAdjustments {
    fn with_len(len: usize) -> Self {
        Self {
            hide: alloc::vec![false; len],
            soft_hyphen: alloc::vec![false; len],
            advance_adjust: alloc::vec![0.0; len],
            trailing_adjust: alloc::vec![0.0; len],
            space: alloc::vec![false; len],
        }
    }

    /// Structurally invisible glyph (zero-width joiner/space). Its
    /// `advance_adjust` cancels whatever advance the shaper gave it.
    pub fn is_hidden(&self, glyph: usize) -> bool {
        self.hide.get(glyph).copied().unwrap_or(false)
    }

    /// Soft hyphen: hidden unless it ends a line.
    pub fn is_soft_hyphen(&self, glyph: usize) -> bool {
        self.soft_hyphen.get(glyph).copied().unwrap_or(false)
    }

    /// Advance correction applied when the glyph is elided.
    pub fn advance_adjust(&self, glyph: usize) -> f32 {
        self.advance_adjust.get(glyph).copied().unwrap_or(0.0)
    }

    /// Advance correction applied when the glyph ends a line.
    pub fn trailing_adjust(&self, glyph: usize) -> f32 {
        self.trailing_adjust.get(glyph).copied().unwrap_or(0.0)
    }

    /// Space glyph.
    pub fn is_space(&self, glyph: usize) -> bool {
        self.space.get(glyph).copied().unwrap_or(false)
    }
}

/// Maximal contiguous run of glyphs of one word.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphGroup {
    /// First glyph (inclusive).
    pub start: usize,
    /// Last glyph (inclusive).
    pub end: usize,
    /// The last glyph is a soft hyphen, shown only at a line end.
    pub hide_last: bool,
    /// Width when more content follows on the line.
    pub advance: f32,
    /// Width when the group ends the line.
    pub last_advance: f32,
}

impl GlyphGroup {
    /// Glyph count.
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    /// Groups are never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Glyph indices of this group.
    pub fn glyphs(&self) -> core::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// One resolved word.
#[derive(Clone, Debug, PartialEq)]
pub struct Word {
    index: usize,
    groups: SmallVec<[GlyphGroup; 1]>,
    metrics: LineMetrics,
    line_height: f32,
    flow_line: Option<FlowLineId>,
}

impl Word {
    /// Position of the word in its chunk's word stream.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Glyph groups in index order.
    pub fn groups(&self) -> &[GlyphGroup] {
        &self.groups
    }

    /// Aggregated line metrics of all font runs contributing to this word.
    pub fn metrics(&self) -> LineMetrics {
        self.metrics
    }

    /// Aggregated run line height; at least the metrics height.
    pub fn line_height(&self) -> f32 {
        self.line_height.max(self.metrics.height())
    }

    /// Explicit flow line the word belongs to.
    pub fn flow_line(&self) -> Option<FlowLineId> {
        self.flow_line
    }

    /// Width when followed by more content on the same line.
    pub fn advance(&self) -> f32 {
        self.groups.iter().map(|g| g.advance).sum()
    }

    /// Width when the word ends its line.
    pub fn last_advance(&self) -> f32 {
        match self.groups.split_last() {
            Some((last, rest)) => rest.iter().map(|g| g.advance).sum::<f32>() + last.last_advance,
            None => 0.0,
        }
    }

    /// Glyph count.
    pub fn glyph_count(&self) -> usize {
        self.groups.iter().map(GlyphGroup::len).sum()
    }

    /// Every glyph index of the word, in order.
    pub fn glyphs(&self) -> impl Iterator<Item = usize> + '_ {
        self.groups.iter().flat_map(GlyphGroup::glyphs)
    }
}

/// Result of analyzing one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WordAnalysis {
    words: Vec<Word>,
    glyph_words: Vec<usize>,
    adjustments: GlyphAdjustments,
}

impl WordAnalysis {
    /// Words in source order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Word index owning `glyph`.
    pub fn word_of_glyph(&self, glyph: usize) -> Option<usize> {
        self.glyph_words.get(glyph).copied()
    }

    /// Per-glyph flags and corrections.
    pub fn adjustments(&self) -> &GlyphAdjustments {
        &self.adjustments
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct WordAcc {
    metrics: Option<LineMetrics>,
    line_height: f32,
    flow_line: Option<FlowLineId>,
}

impl WordAcc {
    fn fold(&mut self, metrics: LineMetrics, line_height: f32) {
        self.metrics = Some(match self.metrics {
            Some(m) => m.union(metrics),
            None => metrics,
        });
        self.line_height = self.line_height.max(line_height);
    }
}

struct MetricFolder<'a, F: FontMetrics + ?Sized> {
    text: &'a AttributedText,
    fonts: &'a F,
    ctx: &'a RenderContext,
}

impl<F: FontMetrics + ?Sized> MetricFolder<'_, F> {
    fn fold(&self, acc: &mut WordAcc, start: usize, end: usize, run: &TextRun) {
        let lm = self
            .fonts
            .line_metrics(run.font, self.text.slice(start..end), self.ctx);
        acc.fold(lm, run.line_height);
    }
}

/// Analyze one chunk's glyphs against its attributed text.
pub fn analyze_words<F: FontMetrics + ?Sized>(
    glyphs: &GlyphVector,
    text: &AttributedText,
    fonts: &F,
    ctx: &RenderContext,
) -> WordAnalysis {
    let n = glyphs.len();
    if n == 0 {
        return WordAnalysis::default();
    }

    // Pass 1: collapse word ids joined by ligatures.
    let mut union = WordUnion::with_capacity(INITIAL_WORD_CAPACITY);
    let mut lead_ids = Vec::with_capacity(n);
    let mut char_idx = 0usize;
    for i in 0..n {
        let count = glyphs.char_count(i).max(1);
        let mut min_word = text.word_limit(char_idx);
        union.ensure(min_word);
        for c in 1..count {
            let w = text.word_limit(char_idx + c);
            if w != min_word {
                union.union(min_word, w);
                min_word = min_word.min(w);
            }
        }
        lead_ids.push(min_word);
        char_idx += count;
    }

    let mut roots: Vec<usize> = lead_ids.iter().map(|&id| union.find(id)).collect();
    let mut ordered = roots.clone();
    ordered.sort_unstable();
    ordered.dedup();
    let max_id = union.len();

    // Pass 2: metrics and special characters.
    let mut accs = alloc::vec![WordAcc::default(); max_id];
    let mut adjustments = GlyphAdjustments::with_len(n);
    let folder = MetricFolder { text, fonts, ctx };
    let mut run = text.run_at(0);
    let mut word_start = 0usize;
    let mut prev_word: Option<usize> = None;
    char_idx = 0;
    for i in 0..n {
        let w = union.find(text.word_limit(char_idx));
        if accs[w].flow_line.is_none() {
            accs[w].flow_line = text.flow_line(char_idx);
        }
        match prev_word {
            None => prev_word = Some(w),
            Some(p) if p != w => {
                folder.fold(&mut accs[p], word_start, char_idx, &run);
                word_start = char_idx;
                prev_word = Some(w);
            }
            Some(_) => {}
        }

        let count = glyphs.char_count(i).max(1);
        if count == 1 {
            let advance = glyphs.natural_position(i + 1).x - glyphs.natural_position(i).x;
            // Left side of the pair is the character right before this one,
            // the trailing character of a preceding ligature, matching the
            // pair the shaper kerned.
            let kern = || match (
                char_idx.checked_sub(1).and_then(|p| text.char_at(p)),
                text.char_at(char_idx + 1),
            ) {
                (Some(before), Some(after)) => fonts.hkern(run.font, before, after),
                _ => 0.0,
            };
            match text.char_at(char_idx) {
                Some(SOFT_HYPHEN) => {
                    adjustments.soft_hyphen[i] = true;
                    adjustments.advance_adjust[i] = -(advance + kern());
                }
                Some(ZERO_WIDTH_JOINER | ZERO_WIDTH_SPACE) => {
                    adjustments.hide[i] = true;
                    adjustments.advance_adjust[i] = -advance;
                    adjustments.trailing_adjust[i] = -advance;
                }
                Some(SPACE) => {
                    adjustments.space[i] = true;
                    adjustments.trailing_adjust[i] = -(advance + kern());
                }
                _ => {}
            }
        }

        char_idx += count;
        if char_idx >= run.end {
            // Possible font/size change: close the metrics span at the run limit.
            if let Some(p) = prev_word.take() {
                folder.fold(&mut accs[p], word_start, char_idx, &run);
            }
            word_start = char_idx;
            if char_idx < text.len() {
                run = text.run_at(char_idx);
            }
        }
    }
    if let Some(p) = prev_word {
        folder.fold(&mut accs[p], word_start, char_idx, &run);
    }

    // Pass 3: group glyph indices per resolved word.
    let mut words: Vec<Word> = ordered
        .iter()
        .enumerate()
        .map(|(index, &root)| {
            let acc = accs[root];
            Word {
                index,
                groups: SmallVec::new(),
                metrics: acc.metrics.unwrap_or_default(),
                line_height: acc.line_height,
                flow_line: acc.flow_line,
            }
        })
        .collect();

    for (i, root) in roots.iter_mut().enumerate() {
        let word = ordered.binary_search(&*root).unwrap_or_default();
        *root = word;
        let groups = &mut words[word].groups;
        match groups.last_mut() {
            Some(last) if last.end + 1 == i => last.end = i,
            _ => groups.push(GlyphGroup {
                start: i,
                end: i,
                hide_last: false,
                advance: 0.0,
                last_advance: 0.0,
            }),
        }
    }

    for word in &mut words {
        for group in &mut word.groups {
            measure_group(group, glyphs, &adjustments);
        }
    }

    log::trace!("word analysis: {} glyphs, {} words", n, words.len());

    WordAnalysis {
        words,
        glyph_words: roots,
        adjustments,
    }
}

fn measure_group(group: &mut GlyphGroup, glyphs: &GlyphVector, adj: &GlyphAdjustments) {
    let mut natural =
        glyphs.natural_position(group.end + 1).x - glyphs.natural_position(group.start).x;
    for g in group.start..group.end {
        if adj.is_soft_hyphen(g) || adj.is_hidden(g) {
            natural += adj.advance_adjust(g);
        }
    }
    group.hide_last = adj.is_soft_hyphen(group.end);
    group.advance = natural + adj.advance_adjust(group.end);
    group.last_advance = natural + adj.trailing_adjust(group.end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaping::{HeuristicFonts, HeuristicShaper};
    use crate::text::{AttributedChar, FontSpec, TextBuilder};

    const F10: FontSpec = FontSpec::new(0, 10.0);

    /// Monospace font whose zero-width joiner still takes 5px, like a
    /// `.notdef` fallback glyph.
    struct VisibleJoiner;

    impl FontMetrics for VisibleJoiner {
        fn line_metrics(&self, font: FontSpec, text: &[char], ctx: &RenderContext) -> LineMetrics {
            HeuristicFonts::monospace(0.5).line_metrics(font, text, ctx)
        }

        fn advance(&self, _font: FontSpec, _ch: char) -> f32 {
            5.0
        }
    }

    fn analyze(text: &AttributedText, fonts: &HeuristicFonts, ligatures: &[&str]) -> (GlyphVector, WordAnalysis) {
        let mut shaper = HeuristicShaper::new(fonts);
        for lig in ligatures {
            shaper = shaper.with_ligature(lig);
        }
        let gv = shaper.shape(text);
        let wa = analyze_words(&gv, text, fonts, &RenderContext::default());
        (gv, wa)
    }

    #[test]
    fn union_find_keeps_smallest_id_and_grows() {
        let mut u = WordUnion::with_capacity(2);
        u.union(7, 3);
        u.union(3, 12);
        assert_eq!(u.find(12), 3);
        assert_eq!(u.find(7), 3);
        assert_eq!(u.find(5), 5);
        assert!(u.len() >= 13);
        u.union(12, 1);
        assert_eq!(u.find(7), 1);
    }

    #[test]
    fn words_split_at_spaces_and_keep_trailing_space() {
        let fonts = HeuristicFonts::monospace(0.5);
        let text = TextBuilder::new().push_run("ab cd", F10, 12.0).build();
        let (_, wa) = analyze(&text, &fonts, &[]);
        assert_eq!(wa.words().len(), 2);
        let first = &wa.words()[0];
        assert_eq!(first.groups(), &[GlyphGroup {
            start: 0,
            end: 2,
            hide_last: false,
            advance: 15.0,
            last_advance: 10.0,
        }]);
        assert_eq!(wa.word_of_glyph(3), Some(1));
        assert!(wa.adjustments().is_space(2));
    }

    #[test]
    fn ligature_across_word_boundary_collapses_words() {
        let fonts = HeuristicFonts::monospace(0.5);
        let text = TextBuilder::new().push_run("ab-cd ef", F10, 12.0).build();
        let (gv, wa) = analyze(&text, &fonts, &["-c"]);
        assert_eq!(gv.len(), 7);
        assert_eq!(wa.words().len(), 2);
        assert_eq!(wa.words()[0].glyph_count(), 5);
        assert_eq!(wa.words()[0].groups().len(), 1);
    }

    #[test]
    fn interleaved_word_ids_form_several_groups() {
        let fonts = HeuristicFonts::monospace(0.5);
        let chars = [(b'a', 0), (b'b', 1), (b'c', 0), (b'd', 1)]
            .iter()
            .map(|&(ch, word_limit)| AttributedChar {
                ch: ch as char,
                word_limit,
                flow_line: None,
            })
            .collect();
        let text = AttributedText::from_parts(
            chars,
            vec![TextRun {
                start: 0,
                end: 4,
                font: F10,
                line_height: 12.0,
            }],
            Default::default(),
        );
        let (_, wa) = analyze(&text, &fonts, &[]);
        assert_eq!(wa.words().len(), 2);
        let starts: Vec<usize> = wa.words()[0].groups().iter().map(|g| g.start).collect();
        assert_eq!(starts, vec![0, 2]);
        assert!(wa.words()[0].groups().iter().all(|g| g.len() == 1));
    }

    #[test]
    fn word_spanning_two_runs_aggregates_both_metrics() {
        let fonts = HeuristicFonts::monospace(0.5);
        let text = TextBuilder::new()
            .push_run("sm", F10, 12.0)
            .push_run("ALL rest", FontSpec::new(0, 30.0), 36.0)
            .build();
        let (_, wa) = analyze(&text, &fonts, &[]);
        assert_eq!(wa.words().len(), 2);
        let w = &wa.words()[0];
        assert_eq!(w.metrics().ascent, 24.0);
        assert_eq!(w.line_height(), 36.0);
        let rest = &wa.words()[1];
        assert_eq!(rest.metrics().ascent, 24.0);
    }

    #[test]
    fn soft_hyphen_adjustment_cancels_advance_and_kerning() {
        let fonts = HeuristicFonts::monospace(0.5).with_kern_pair('o', 'p', 0.1);
        let text = TextBuilder::new().push_run("so\u{00AD}py", F10, 12.0).build();
        let (_, wa) = analyze(&text, &fonts, &[]);
        let adj = wa.adjustments();
        assert!(adj.is_soft_hyphen(2));
        assert_eq!(adj.advance_adjust(2), -6.0);
        let first = &wa.words()[0];
        assert!(first.groups()[0].hide_last);
        assert_eq!(first.advance(), 9.0);
        assert_eq!(first.last_advance(), 15.0);
    }

    #[test]
    fn soft_hyphen_after_ligature_kerns_against_its_trailing_character() {
        let fonts = HeuristicFonts::monospace(0.5)
            .with_kern_pair('o', 'p', 0.1)
            .with_kern_pair('f', 'p', 0.3);
        let text = TextBuilder::new().push_run("fo\u{00AD}py", F10, 12.0).build();
        let (gv, wa) = analyze(&text, &fonts, &["fo"]);
        assert_eq!(gv.len(), 4);
        let adj = wa.adjustments();
        assert!(adj.is_soft_hyphen(1));
        assert_eq!(adj.advance_adjust(1), -6.0);
    }

    #[test]
    fn hidden_glyph_advance_is_cancelled() {
        let text = TextBuilder::new().push_run("a\u{200D}b", F10, 12.0).build();
        let gv = HeuristicShaper::new(&VisibleJoiner).shape(&text);
        let wa = analyze_words(&gv, &text, &VisibleJoiner, &RenderContext::default());
        let adj = wa.adjustments();
        assert!(adj.is_hidden(1));
        assert_eq!(adj.advance_adjust(1), -5.0);
        assert_eq!(wa.words().len(), 1);
        assert_eq!(wa.words()[0].advance(), 10.0);
        assert_eq!(wa.words()[0].last_advance(), 10.0);
    }

    #[test]
    fn zero_width_characters_are_structurally_hidden() {
        let fonts = HeuristicFonts::monospace(0.5);
        let text = TextBuilder::new()
            .push_run("a\u{200D}b\u{200B}c", F10, 12.0)
            .build();
        let (_, wa) = analyze(&text, &fonts, &[]);
        let adj = wa.adjustments();
        assert!(adj.is_hidden(1));
        assert!(adj.is_hidden(3));
        assert!(!adj.is_hidden(0));
        assert_eq!(adj.advance_adjust(1), 0.0);
    }

    #[test]
    fn flow_line_marker_comes_from_first_marked_character() {
        let fonts = HeuristicFonts::monospace(0.5);
        let text = TextBuilder::new()
            .push_run("a ", F10, 12.0)
            .begin_flow_line()
            .push_run("b c", F10, 12.0)
            .end_flow_line()
            .build();
        let (_, wa) = analyze(&text, &fonts, &[]);
        let lines: Vec<Option<FlowLineId>> = wa.words().iter().map(Word::flow_line).collect();
        assert_eq!(lines, vec![None, Some(FlowLineId(0)), Some(FlowLineId(0))]);
    }

    #[test]
    fn reanalyzing_resolved_words_is_idempotent() {
        let fonts = HeuristicFonts::monospace(0.5);
        let text = TextBuilder::new()
            .push_run("of-fi ce x\u{00AD}y", F10, 12.0)
            .build();
        let (gv, first) = analyze(&text, &fonts, &["-f", "fi"]);

        let mut chars = Vec::with_capacity(text.len());
        let mut ci = 0usize;
        for g in 0..gv.len() {
            let word = first.word_of_glyph(g).unwrap_or_default();
            for _ in 0..gv.char_count(g) {
                chars.push(AttributedChar {
                    ch: text.char_at(ci).unwrap_or(' '),
                    word_limit: word,
                    flow_line: None,
                });
                ci += 1;
            }
        }
        let resolved = AttributedText::from_parts(chars, text.runs().to_vec(), *text.block());
        let second = analyze_words(&gv, &resolved, &fonts, &RenderContext::default());
        assert_eq!(first.words(), second.words());
    }

    #[test]
    fn empty_glyph_vector_yields_no_words() {
        let fonts = HeuristicFonts::monospace(0.5);
        let text = TextBuilder::new().build();
        let (_, wa) = analyze(&text, &fonts, &[]);
        assert!(wa.words().is_empty());
        assert_eq!(wa.word_of_glyph(0), None);
    }
}
