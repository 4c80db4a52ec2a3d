//! Deterministic fallback font model and shaper.
//!
//! Used when no real shaping engine is installed (tests, benches, heap
//! profiling). Widths follow a per-character-class em model; ligatures and
//! kerning pairs are opt-in so analyzer paths that depend on them can be
//! exercised without font files.

extern crate alloc;

use alloc::vec::Vec;

use crate::geometry::Point;
use crate::glyphs::{GlyphRun, GlyphVector, ShapedGlyph};
use crate::text::{
    AttributedText, FontMetrics, FontSpec, LineMetrics, RenderContext, SOFT_HYPHEN,
    ZERO_WIDTH_JOINER, ZERO_WIDTH_SPACE,
};

const LIGATURE_GLYPH_BASE: u32 = 0xF000;

#[derive(Clone, Copy, Debug, PartialEq)]
struct KernPair {
    left: char,
    right: char,
    em: f32,
}

/// Heuristic [`FontMetrics`] implementation.
#[derive(Clone, Debug, PartialEq)]
pub struct HeuristicFonts {
    monospace_em: Option<f32>,
    ascent_em: f32,
    descent_em: f32,
    leading_em: f32,
    kern_pairs: Vec<KernPair>,
}

impl Default for HeuristicFonts {
    fn default() -> Self {
        Self::proportional()
    }
}

impl HeuristicFonts {
    /// Proportional width classes.
    pub fn proportional() -> Self {
        Self {
            monospace_em: None,
            ascent_em: 0.8,
            descent_em: 0.2,
            leading_em: 0.0,
            kern_pairs: Vec::new(),
        }
    }

    /// Every visible character advances by `em` of the font size.
    pub fn monospace(em: f32) -> Self {
        Self {
            monospace_em: Some(em),
            ..Self::proportional()
        }
    }

    /// Add a kerning pair, in em units of spacing reduction.
    pub fn with_kern_pair(mut self, left: char, right: char, em: f32) -> Self {
        self.kern_pairs.push(KernPair { left, right, em });
        self
    }

    /// Override vertical metrics (em units).
    pub fn with_vertical_metrics(mut self, ascent_em: f32, descent_em: f32, leading_em: f32) -> Self {
        self.ascent_em = ascent_em;
        self.descent_em = descent_em;
        self.leading_em = leading_em;
        self
    }
}

fn proportional_em(ch: char) -> f32 {
    match ch {
        ' ' | '\u{00A0}' => 0.32,
        'i' | 'l' | 'I' | '|' | '!' => 0.24,
        '.' | ',' | ':' | ';' | '\'' | '"' => 0.23,
        '-' | SOFT_HYPHEN => 0.34,
        'f' | 't' | 'j' | 'r' => 0.34,
        'm' | 'w' | 'M' | 'W' => 0.74,
        c if c.is_ascii_digit() => 0.52,
        c if c.is_ascii_uppercase() => 0.64,
        c if c.is_ascii_lowercase() => 0.52,
        _ => 0.56,
    }
}

fn round_device(v: f32, ctx: &RenderContext) -> f32 {
    if ctx.fractional_metrics {
        v
    } else {
        v.round()
    }
}

impl FontMetrics for HeuristicFonts {
    fn line_metrics(&self, font: FontSpec, _text: &[char], ctx: &RenderContext) -> LineMetrics {
        let px = font.size_px * ctx.scale;
        LineMetrics {
            ascent: round_device(self.ascent_em * px, ctx),
            descent: round_device(self.descent_em * px, ctx),
            leading: round_device(self.leading_em * px, ctx),
        }
    }

    fn hkern(&self, font: FontSpec, left: char, right: char) -> f32 {
        self.kern_pairs
            .iter()
            .find(|k| k.left == left && k.right == right)
            .map_or(0.0, |k| k.em * font.size_px)
    }

    fn advance(&self, font: FontSpec, ch: char) -> f32 {
        if matches!(ch, ZERO_WIDTH_JOINER | ZERO_WIDTH_SPACE) {
            return 0.0;
        }
        let em = self.monospace_em.unwrap_or_else(|| proportional_em(ch));
        em * font.size_px
    }
}

/// Shapes [`AttributedText`] one font run at a time, producing one
/// [`GlyphRun`] per run.
#[derive(Clone, Debug)]
pub struct HeuristicShaper<'a, F: FontMetrics> {
    fonts: &'a F,
    ligatures: Vec<Vec<char>>,
}

impl<'a, F: FontMetrics> HeuristicShaper<'a, F> {
    /// Shaper without ligatures.
    pub fn new(fonts: &'a F) -> Self {
        Self {
            fonts,
            ligatures: Vec::new(),
        }
    }

    /// Form one glyph whenever `sequence` appears inside a run.
    pub fn with_ligature(mut self, sequence: &str) -> Self {
        let chars: Vec<char> = sequence.chars().collect();
        if chars.len() > 1 {
            self.ligatures.push(chars);
        }
        self
    }

    fn ligature_at(&self, chars: &[char]) -> Option<usize> {
        self.ligatures
            .iter()
            .position(|lig| chars.starts_with(lig))
    }

    /// Shape every run of `text` into a merged glyph vector.
    pub fn shape(&self, text: &AttributedText) -> GlyphVector {
        let mut runs = Vec::with_capacity(text.runs().len().max(1));
        let mut pen = 0.0f32;
        let mut index = 0usize;
        while index < text.len() {
            let run = text.run_at(index);
            let end = run.end.min(text.len());
            let chars = text.slice(index..end);
            let mut glyphs = Vec::with_capacity(chars.len());
            let mut prev: Option<char> = None;
            let mut i = 0usize;
            while i < chars.len() {
                let (glyph_id, count) = match self.ligature_at(&chars[i..]) {
                    Some(lig) => (LIGATURE_GLYPH_BASE + lig as u32, self.ligatures[lig].len()),
                    None => (chars[i] as u32, 1),
                };
                if let Some(p) = prev {
                    pen -= self.fonts.hkern(run.font, p, chars[i]);
                }
                glyphs.push(ShapedGlyph::new(glyph_id, count, Point::new(pen, 0.0)));
                for &ch in &chars[i..i + count] {
                    pen += self.fonts.advance(run.font, ch);
                }
                prev = Some(chars[i + count - 1]);
                i += count;
            }
            runs.push(GlyphRun::new(glyphs, Point::new(pen, 0.0)));
            index = end;
        }
        GlyphVector::from_runs(runs)
    }
}
