//! Flow text layout: pours pre-shaped glyph runs into arbitrarily shaped
//! regions.
//!
//! Each [`FlowChunk`] pairs a shaped [`GlyphVector`] with its
//! [`AttributedText`]. [`flow_text`] (or [`FlowEngine::layout`] for a checked
//! pass with a [`FlowOutcome`] report) segments every chunk into words,
//! breaks them into lines that fit the [`FlowRegion`]s in order, and leaves
//! every glyph either visible at its final position or hidden.
//!
//! ```
//! use flowtext::{flow_text, FlowChunk, FlowRegion, FontSpec, HeuristicFonts, HeuristicShaper,
//!     RenderContext, TextBuilder};
//!
//! let fonts = HeuristicFonts::proportional();
//! let text = TextBuilder::new()
//!     .push_run("Lines flow from one region into the next.", FontSpec::new(0, 12.0), 14.0)
//!     .build();
//! let glyphs = HeuristicShaper::new(&fonts).shape(&text);
//! let mut chunks = vec![FlowChunk::new(glyphs, text)];
//! let regions = [FlowRegion::rect(0.0, 0.0, 120.0, 200.0)];
//! let overflow = flow_text(&mut chunks, &regions, &fonts, &RenderContext::default());
//! assert!(!overflow);
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod config;
pub mod error;
pub mod flow;
pub mod geometry;
pub mod glyphs;
pub mod line;
pub mod region;
pub mod shaping;
pub mod text;
pub mod words;

pub use config::{FitStrategy, FlowConfig, FlowLimits};
pub use error::FlowError;
pub use flow::{flow_text, FlowChunk, FlowEngine, FlowOutcome};
pub use geometry::{Bounds, FlowRegion, FlowShape, Point, PolygonShape, RectShape, Span};
pub use glyphs::{GlyphRun, GlyphVector, Placement, ShapedGlyph};
pub use line::{LineBuilder, LineSummary};
pub use region::{CursorState, RegionCursor};
pub use shaping::{HeuristicFonts, HeuristicShaper};
pub use text::{
    AttributedChar, AttributedText, BlockInfo, FlowLineId, FontMetrics, FontSpec, LineMetrics,
    RenderContext, TextAlign, TextBuilder, TextRun,
};
pub use words::{analyze_words, GlyphAdjustments, GlyphGroup, Word, WordAnalysis, WordUnion};
