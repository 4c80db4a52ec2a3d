//! Flow layout configuration.

use crate::error::FlowError;

/// How a line that does not fit is moved down a non-convex region.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FitStrategy {
    /// Step down by `fraction` of the line height until the word fits.
    Step {
        /// Step size as a fraction of line height.
        fraction: f32,
    },
    /// Step as above, then bisect between the last failing and the first
    /// fitting position for `iterations` rounds.
    StepRefine {
        /// Step size as a fraction of line height.
        fraction: f32,
        /// Bisection rounds after the first fit.
        iterations: u8,
    },
}

impl FitStrategy {
    /// Step fraction of either variant.
    pub fn fraction(self) -> f32 {
        match self {
            Self::Step { fraction } | Self::StepRefine { fraction, .. } => fraction,
        }
    }

    /// Bisection rounds (0 for plain stepping).
    pub fn refine_iterations(self) -> u8 {
        match self {
            Self::Step { .. } => 0,
            Self::StepRefine { iterations, .. } => iterations,
        }
    }
}

impl Default for FitStrategy {
    fn default() -> Self {
        Self::Step { fraction: 0.1 }
    }
}

/// Hard input limits checked by [`crate::FlowEngine::layout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowLimits {
    /// Maximum number of chunks in one pass.
    pub max_chunks: usize,
    /// Maximum glyphs in any one chunk.
    pub max_glyphs_per_chunk: usize,
    /// Maximum number of regions in one pass.
    pub max_regions: usize,
}

impl Default for FlowLimits {
    fn default() -> Self {
        Self {
            max_chunks: 65_536,
            max_glyphs_per_chunk: 1 << 20,
            max_regions: 4096,
        }
    }
}

impl FlowLimits {
    /// Embedded-focused preset with smaller bounds.
    pub fn embedded() -> Self {
        Self {
            max_chunks: 1024,
            max_glyphs_per_chunk: 16 * 1024,
            max_regions: 64,
        }
    }
}

/// Layout options.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowConfig {
    /// Downward search used when a word does not fit at the current Y.
    pub fit: FitStrategy,
    /// Floor for one downward step, so zero-height lines still advance.
    pub min_step_px: f32,
    /// Input limits.
    pub limits: FlowLimits,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            fit: FitStrategy::default(),
            min_step_px: 0.5,
            limits: FlowLimits::default(),
        }
    }
}

impl FlowConfig {
    /// Default options with embedded limits.
    pub fn embedded() -> Self {
        Self {
            limits: FlowLimits::embedded(),
            ..Self::default()
        }
    }

    /// Reject values that would stall the downward search.
    pub fn validate(&self) -> Result<(), FlowError> {
        let fraction = self.fit.fraction();
        if !(fraction.is_finite() && fraction > 0.0) {
            return Err(FlowError::InvalidConfig {
                field: "fit.fraction",
            });
        }
        if !(self.min_step_px.is_finite() && self.min_step_px > 0.0) {
            return Err(FlowError::InvalidConfig {
                field: "min_step_px",
            });
        }
        Ok(())
    }

    /// One downward step for a line of `line_height`.
    pub(crate) fn step_for(&self, line_height: f32) -> f32 {
        let step = line_height * self.fit.fraction();
        if step.is_finite() {
            step.max(self.min_step_px)
        } else {
            self.min_step_px
        }
    }
}
