//! Flow layout driver: pours the words of every chunk into the regions.

extern crate alloc;

use alloc::vec::Vec;

use crate::config::FlowConfig;
use crate::error::FlowError;
use crate::geometry::FlowRegion;
use crate::glyphs::{GlyphRun, GlyphVector, Placement};
use crate::line::{LineBuilder, LineSummary};
use crate::region::RegionCursor;
use crate::text::{AttributedText, BlockInfo, FontMetrics, RenderContext};
use crate::words::{analyze_words, WordAnalysis};

/// One attributed text run with its shaped glyphs.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowChunk {
    glyphs: GlyphVector,
    text: AttributedText,
}

impl FlowChunk {
    /// Chunk from an already merged glyph vector.
    pub fn new(glyphs: GlyphVector, text: AttributedText) -> Self {
        Self { glyphs, text }
    }

    /// Chunk from its shaping sub-runs.
    pub fn from_runs(runs: Vec<GlyphRun>, text: AttributedText) -> Self {
        Self::new(GlyphVector::from_runs(runs), text)
    }

    /// Glyphs with their placements.
    pub fn glyphs(&self) -> &GlyphVector {
        &self.glyphs
    }

    /// Source text.
    pub fn text(&self) -> &AttributedText {
        &self.text
    }

    /// Block descriptor of the chunk.
    pub fn block(&self) -> &BlockInfo {
        self.text.block()
    }
}

/// Result of one layout pass.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FlowOutcome {
    /// Some words did not fit in the supplied regions.
    pub overflow: bool,
    /// Committed lines in placement order.
    pub lines: Vec<LineSummary>,
    /// Words placed on some line.
    pub placed_words: usize,
    /// Glyphs left hidden, structurally or by overflow.
    pub hidden_glyphs: usize,
    /// Regions that received at least one line.
    pub regions_used: usize,
}

struct PreparedChunk {
    analysis: WordAnalysis,
    block: BlockInfo,
    top_skip: f32,
}

/// Flow layout with a fixed configuration.
#[derive(Clone, Debug, Default)]
pub struct FlowEngine {
    cfg: FlowConfig,
    ctx: RenderContext,
}

impl FlowEngine {
    /// Engine with `cfg` and the default render context.
    pub fn new(cfg: FlowConfig) -> Self {
        Self {
            cfg,
            ctx: RenderContext::default(),
        }
    }

    /// Use `ctx` for line metric queries.
    pub fn with_context(mut self, ctx: RenderContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &FlowConfig {
        &self.cfg
    }

    /// Check inputs against the configured limits, then lay out.
    ///
    /// Running out of room is reported through [`FlowOutcome::overflow`],
    /// never as an error.
    pub fn layout<F: FontMetrics + ?Sized>(
        &self,
        chunks: &mut [FlowChunk],
        regions: &[FlowRegion],
        fonts: &F,
    ) -> Result<FlowOutcome, FlowError> {
        self.cfg.validate()?;
        let limits = self.cfg.limits;
        check_limit("chunks", chunks.len(), limits.max_chunks)?;
        check_limit("regions", regions.len(), limits.max_regions)?;
        for chunk in chunks.iter() {
            check_limit(
                "glyphs_per_chunk",
                chunk.glyphs.len(),
                limits.max_glyphs_per_chunk,
            )?;
        }
        for (index, region) in regions.iter().enumerate() {
            if !region.shape().bounds().is_valid() {
                return Err(FlowError::InvalidRegion {
                    index,
                    reason: "non-finite or inverted bounds",
                });
            }
        }
        Ok(self.run(chunks, regions, fonts))
    }

    fn run<F: FontMetrics + ?Sized>(
        &self,
        chunks: &mut [FlowChunk],
        regions: &[FlowRegion],
        fonts: &F,
    ) -> FlowOutcome {
        let mut prepared = Vec::with_capacity(chunks.len());
        let mut prev_bottom = 0.0f32;
        for chunk in chunks.iter_mut() {
            chunk.glyphs.reset_placements();
            let block = *chunk.text.block();
            let analysis = analyze_words(&chunk.glyphs, &chunk.text, fonts, &self.ctx);
            let top_skip = prev_bottom.max(block.top_margin);
            // An empty chunk places no line, so its margins fold into the gap
            // between its neighbors.
            prev_bottom = if analysis.words().is_empty() {
                top_skip.max(block.bottom_margin)
            } else {
                block.bottom_margin
            };
            prepared.push(PreparedChunk {
                analysis,
                block,
                top_skip,
            });
        }

        let mut outcome = FlowOutcome::default();
        let mut chunk = 0usize;
        let mut next_word = 0usize;

        for (region_index, region) in regions.iter().enumerate() {
            if chunk >= chunks.len() {
                break;
            }
            if !region.shape().bounds().is_valid() {
                log::debug!("region {} skipped: unusable bounds", region_index);
                continue;
            }
            let mut cursor = RegionCursor::new(region);
            while chunk < chunks.len() {
                if prepared[chunk].analysis.words().is_empty() {
                    chunk += 1;
                    next_word = 0;
                    continue;
                }
                let top_skip = core::mem::take(&mut prepared[chunk].top_skip);
                let prep = &prepared[chunk];
                let words = prep.analysis.words();
                let block = prep.block;
                let glyphs = &mut chunks[chunk].glyphs;

                let word = &words[next_word];
                let mut flow_line = word.flow_line();
                let mut line_height = word.line_height().max(block.line_height);
                let mut line = LineBuilder::new(&block, next_word == 0, line_height);
                let y = cursor.y() + top_skip;
                if !line.goto_y(&mut cursor, y) || !line.fit_word(&mut cursor, word, &self.cfg) {
                    break;
                }
                next_word += 1;

                let mut open = Some(line);
                while next_word < words.len() {
                    let word = &words[next_word];
                    if word.flow_line() == flow_line {
                        if let Some(line) = open.as_mut() {
                            if line.add_word(&cursor, word) {
                                next_word += 1;
                                continue;
                            }
                        }
                    }
                    if let Some(line) = open.take() {
                        commit(&line, &mut cursor, glyphs, prep, region_index, chunk, &mut outcome);
                    }
                    flow_line = word.flow_line();
                    line_height = word.line_height().max(block.line_height);
                    if !cursor.new_line(line_height) {
                        break;
                    }
                    let mut line = LineBuilder::new(&block, false, line_height);
                    if !line.fit_word(&mut cursor, word, &self.cfg) {
                        break;
                    }
                    next_word += 1;
                    open = Some(line);
                }

                if let Some(mut line) = open.take() {
                    line.set_para_end(next_word == words.len());
                    commit(&line, &mut cursor, glyphs, prep, region_index, chunk, &mut outcome);
                }
                if next_word < words.len() {
                    break;
                }
                chunk += 1;
                next_word = 0;
                if block.region_break {
                    log::debug!("region break after chunk {} in region {}", chunk - 1, region_index);
                    break;
                }
                if !cursor.new_line(line_height) {
                    break;
                }
            }
            if chunk < chunks.len() {
                log::debug!(
                    "region {} exhausted at chunk {} word {}",
                    region_index,
                    chunk,
                    next_word
                );
            }
        }

        while chunk < chunks.len() && next_word == 0 && prepared[chunk].analysis.words().is_empty() {
            chunk += 1;
        }
        outcome.overflow = chunk < chunks.len();
        if outcome.overflow {
            log::debug!("overflow: chunk {} word {} and later are hidden", chunk, next_word);
            for (index, (target, prep)) in chunks.iter_mut().zip(&prepared).enumerate().skip(chunk) {
                let first = if index == chunk { next_word } else { 0 };
                for word in prep.analysis.words().iter().skip(first) {
                    for g in word.glyphs() {
                        target.glyphs.hide(g);
                    }
                }
            }
        }

        outcome.placed_words = outcome.lines.iter().map(|l| l.word_count).sum();
        outcome.regions_used = outcome.lines.last().map_or(0, |l| l.region + 1);
        outcome.hidden_glyphs = chunks
            .iter()
            .map(|c| {
                c.glyphs
                    .placements()
                    .filter(|p| *p == Placement::Hidden)
                    .count()
            })
            .sum();
        outcome
    }
}

fn commit(
    line: &LineBuilder,
    cursor: &mut RegionCursor<'_>,
    glyphs: &mut GlyphVector,
    prep: &PreparedChunk,
    region: usize,
    chunk: usize,
    outcome: &mut FlowOutcome,
) {
    if let Some(summary) = line.layout(cursor, glyphs, &prep.analysis, region, chunk) {
        outcome.lines.push(summary);
    }
}

fn check_limit(kind: &'static str, actual: usize, limit: usize) -> Result<(), FlowError> {
    if actual > limit {
        log::warn!("flow limit exceeded: {} (actual={} limit={})", kind, actual, limit);
        return Err(FlowError::LimitExceeded {
            kind,
            actual,
            limit,
        });
    }
    Ok(())
}

/// Lay out `chunks` into `regions` with default configuration.
///
/// Every glyph ends either visible at its final position or hidden. Returns
/// `true` when some content did not fit. Regions with unusable bounds are
/// skipped.
pub fn flow_text<F: FontMetrics + ?Sized>(
    chunks: &mut [FlowChunk],
    regions: &[FlowRegion],
    fonts: &F,
    ctx: &RenderContext,
) -> bool {
    FlowEngine::new(FlowConfig::default())
        .with_context(*ctx)
        .run(chunks, regions, fonts)
        .overflow
}
