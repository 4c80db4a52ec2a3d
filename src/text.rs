//! Attributed source text and the font-metrics seam.
//!
//! [`AttributedText`] is the per-character attribute model the word analyzer
//! reads: word-limit ids, explicit flow-line markers, font runs and the
//! chunk's block descriptor. [`FontMetrics`] is the shaping engine's metrics
//! surface (kerning, line metrics, advances).

extern crate alloc;

use alloc::vec::Vec;
use core::ops::Range;

/// Discretionary hyphen: drawn only when a line breaks after it.
pub const SOFT_HYPHEN: char = '\u{00AD}';
/// Zero-width joiner: never drawn.
pub const ZERO_WIDTH_JOINER: char = '\u{200D}';
/// Zero-width space: never drawn.
pub const ZERO_WIDTH_SPACE: char = '\u{200B}';
/// Plain space; excised from the width of a line it ends.
pub const SPACE: char = ' ';

/// A font face at a size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontSpec {
    /// Face identifier understood by the [`FontMetrics`] provider.
    pub face: u32,
    /// Size in pixels.
    pub size_px: f32,
}

impl FontSpec {
    /// Construct a font spec.
    pub const fn new(face: u32, size_px: f32) -> Self {
        Self { face, size_px }
    }
}

/// Vertical metrics of a span of text.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineMetrics {
    /// Distance from baseline to top.
    pub ascent: f32,
    /// Distance from baseline to bottom.
    pub descent: f32,
    /// Recommended extra gap between lines.
    pub leading: f32,
}

impl LineMetrics {
    /// `ascent + descent + leading`.
    pub fn height(self) -> f32 {
        self.ascent + self.descent + self.leading
    }

    /// Component-wise maximum, used to fold several runs into one word.
    pub fn union(self, other: LineMetrics) -> LineMetrics {
        LineMetrics {
            ascent: self.ascent.max(other.ascent),
            descent: self.descent.max(other.descent),
            leading: self.leading.max(other.leading),
        }
    }
}

/// Device/render parameters forwarded to metric queries.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderContext {
    /// Device scale applied to font metrics.
    pub scale: f32,
    /// When false, metrics are rounded to whole device pixels.
    pub fractional_metrics: bool,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            scale: 1.0,
            fractional_metrics: true,
        }
    }
}

/// Font metrics provider supplied by the shaping engine.
pub trait FontMetrics {
    /// Line metrics for `text` rendered with `font`.
    fn line_metrics(&self, font: FontSpec, text: &[char], ctx: &RenderContext) -> LineMetrics;

    /// Horizontal kerning between `left` and `right`, as the amount the pair's
    /// spacing is reduced by (positive tightens).
    fn hkern(&self, _font: FontSpec, _left: char, _right: char) -> f32 {
        0.0
    }

    /// Nominal advance of `ch`; used by fallback shaping only.
    fn advance(&self, font: FontSpec, ch: char) -> f32;
}

/// Identity of an explicit line-break unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowLineId(pub u32);

/// Horizontal alignment of the lines of a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextAlign {
    /// Flush to the usable left edge.
    #[default]
    Start,
    /// Centered in the usable width.
    Middle,
    /// Flush to the usable right edge.
    End,
    /// Stretched to both edges, except a paragraph's last line.
    Full,
}

/// Paragraph/block descriptor of a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockInfo {
    /// Space above the block; collapses with the previous block's bottom margin.
    pub top_margin: f32,
    /// Space below the block.
    pub bottom_margin: f32,
    /// Inset from the left edge of every line's span.
    pub left_margin: f32,
    /// Inset from the right edge of every line's span.
    pub right_margin: f32,
    /// Extra inset of the paragraph's first line.
    pub indent: f32,
    /// Minimum line height of the block.
    pub line_height: f32,
    /// Line alignment.
    pub align: TextAlign,
    /// Start the following chunk in the next region.
    pub region_break: bool,
}

/// One font run: characters `start..end` share font and line height.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextRun {
    /// First character (inclusive).
    pub start: usize,
    /// Run limit (exclusive).
    pub end: usize,
    /// Active font.
    pub font: FontSpec,
    /// Line height contributed by this run.
    pub line_height: f32,
}

/// Attributes of one source character.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttributedChar {
    /// The character.
    pub ch: char,
    /// Source word id before ligature merging.
    pub word_limit: usize,
    /// Explicit flow line the character belongs to.
    pub flow_line: Option<FlowLineId>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct CharAttrs {
    word_limit: usize,
    flow_line: Option<FlowLineId>,
}

/// Attributed source text of one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributedText {
    chars: Vec<char>,
    attrs: Vec<CharAttrs>,
    runs: Vec<TextRun>,
    block: BlockInfo,
}

impl AttributedText {
    /// Assemble from pre-segmented characters. `runs` must be sorted and
    /// non-overlapping; characters they do not cover use a default font.
    pub fn from_parts(chars: Vec<AttributedChar>, runs: Vec<TextRun>, block: BlockInfo) -> Self {
        let mut text = Vec::with_capacity(chars.len());
        let mut attrs = Vec::with_capacity(chars.len());
        for c in chars {
            text.push(c.ch);
            attrs.push(CharAttrs {
                word_limit: c.word_limit,
                flow_line: c.flow_line,
            });
        }
        Self {
            chars: text,
            attrs,
            runs,
            block,
        }
    }

    /// Character count.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// True when there are no characters.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Character at `index`.
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// Characters in `range` (clamped).
    pub fn slice(&self, range: Range<usize>) -> &[char] {
        let end = range.end.min(self.chars.len());
        let start = range.start.min(end);
        &self.chars[start..end]
    }

    /// Word-limit id of the character at `index`.
    pub fn word_limit(&self, index: usize) -> usize {
        self.attrs.get(index).map_or(0, |a| a.word_limit)
    }

    /// Explicit flow-line marker of the character at `index`.
    pub fn flow_line(&self, index: usize) -> Option<FlowLineId> {
        self.attrs.get(index).and_then(|a| a.flow_line)
    }

    /// Block descriptor of this chunk.
    pub fn block(&self) -> &BlockInfo {
        &self.block
    }

    /// Font runs.
    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Run covering `index`. Gaps between declared runs resolve to a
    /// default-font run spanning the gap.
    pub fn run_at(&self, index: usize) -> TextRun {
        let pos = self.runs.partition_point(|r| r.end <= index);
        match self.runs.get(pos) {
            Some(run) if run.start <= index => *run,
            next => {
                let start = if pos == 0 { 0 } else { self.runs[pos - 1].end };
                let end = next.map_or(self.chars.len(), |r| r.start);
                TextRun {
                    start,
                    end: end.max(index + 1),
                    font: FontSpec::default(),
                    line_height: self.block.line_height,
                }
            }
        }
    }
}

/// Incremental builder for [`AttributedText`].
///
/// Word-limit ids are assigned at break opportunities: a new word begins at
/// the first non-break character following a space, hyphen-minus, soft
/// hyphen or zero-width space. Ids are chunk-relative and start at 0.
#[derive(Clone, Debug, Default)]
pub struct TextBuilder {
    chars: Vec<AttributedChar>,
    runs: Vec<TextRun>,
    block: BlockInfo,
    word: usize,
    after_break: bool,
    flow_line: Option<FlowLineId>,
    next_flow_line: u32,
}

fn is_break_after(ch: char) -> bool {
    matches!(ch, SPACE | '-' | SOFT_HYPHEN | ZERO_WIDTH_SPACE | '\t')
}

impl TextBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the block descriptor.
    pub fn block(mut self, block: BlockInfo) -> Self {
        self.block = block;
        self
    }

    /// Append `text` in `font` with the given run line height.
    pub fn push_run(mut self, text: &str, font: FontSpec, line_height: f32) -> Self {
        let start = self.chars.len();
        for ch in text.chars() {
            if self.after_break && !is_break_after(ch) {
                self.word += 1;
                self.after_break = false;
            }
            self.chars.push(AttributedChar {
                ch,
                word_limit: self.word,
                flow_line: self.flow_line,
            });
            if is_break_after(ch) {
                self.after_break = true;
            }
        }
        let end = self.chars.len();
        if end > start {
            self.runs.push(TextRun {
                start,
                end,
                font,
                line_height,
            });
        }
        self
    }

    /// Start an explicit flow line; following text never shares a line with
    /// text outside it.
    pub fn begin_flow_line(mut self) -> Self {
        self.flow_line = Some(FlowLineId(self.next_flow_line));
        self.next_flow_line += 1;
        self.force_word_break();
        self
    }

    /// Close the current explicit flow line.
    pub fn end_flow_line(mut self) -> Self {
        self.flow_line = None;
        self.force_word_break();
        self
    }

    fn force_word_break(&mut self) {
        if !self.chars.is_empty() {
            self.after_break = true;
        }
    }

    /// Finish.
    pub fn build(self) -> AttributedText {
        AttributedText::from_parts(self.chars, self.runs, self.block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const F: FontSpec = FontSpec::new(0, 10.0);

    fn words(text: &AttributedText) -> Vec<usize> {
        (0..text.len()).map(|i| text.word_limit(i)).collect()
    }

    #[test]
    fn break_characters_stay_with_preceding_word() {
        let t = TextBuilder::new().push_run("ab  cd-ef", F, 12.0).build();
        assert_eq!(words(&t), vec![0, 0, 0, 0, 1, 1, 1, 2, 2]);
    }

    #[test]
    fn soft_hyphen_and_zero_width_space_open_new_words() {
        let t = TextBuilder::new()
            .push_run("hy\u{00AD}phen\u{200B}x", F, 12.0)
            .build();
        assert_eq!(t.word_limit(2), 0);
        assert_eq!(t.word_limit(3), 1);
        assert_eq!(t.word_limit(7), 1);
        assert_eq!(t.word_limit(8), 2);
    }

    #[test]
    fn runs_do_not_split_words_but_flow_lines_do() {
        let big = FontSpec::new(1, 20.0);
        let t = TextBuilder::new()
            .push_run("ab", F, 12.0)
            .push_run("cd", big, 24.0)
            .begin_flow_line()
            .push_run("ef", F, 12.0)
            .end_flow_line()
            .build();
        assert_eq!(words(&t), vec![0, 0, 0, 0, 1, 1]);
        assert_eq!(t.flow_line(3), None);
        assert_eq!(t.flow_line(4), Some(FlowLineId(0)));
        assert_eq!(t.run_at(2).font, big);
        assert_eq!(t.run_at(2).end, 4);
    }

    #[test]
    fn run_gaps_resolve_to_default_font() {
        let chars = "abcd"
            .chars()
            .map(|ch| AttributedChar {
                ch,
                word_limit: 0,
                flow_line: None,
            })
            .collect();
        let block = BlockInfo {
            line_height: 9.0,
            ..BlockInfo::default()
        };
        let runs = vec![TextRun {
            start: 2,
            end: 4,
            font: F,
            line_height: 12.0,
        }];
        let t = AttributedText::from_parts(chars, runs, block);
        let gap = t.run_at(0);
        assert_eq!((gap.start, gap.end), (0, 2));
        assert_eq!(gap.line_height, 9.0);
        assert_eq!(t.run_at(3).font, F);
        assert_eq!(t.slice(1..10), &['b', 'c', 'd']);
    }
}
