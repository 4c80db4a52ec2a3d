//! Error types.

use core::fmt;

/// Errors reported by [`crate::FlowEngine::layout`].
///
/// Running out of room is not an error; it is reported as overflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowError {
    /// An input exceeded a configured limit.
    LimitExceeded {
        /// Which limit.
        kind: &'static str,
        /// Observed value.
        actual: usize,
        /// Configured limit.
        limit: usize,
    },
    /// A region's bounds are non-finite or inverted.
    InvalidRegion {
        /// Region position in the input list.
        index: usize,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// A configuration value would stall layout.
    InvalidConfig {
        /// Offending field.
        field: &'static str,
    },
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LimitExceeded {
                kind,
                actual,
                limit,
            } => write!(
                f,
                "flow limit exceeded: {} (actual={} limit={})",
                kind, actual, limit
            ),
            Self::InvalidRegion { index, reason } => {
                write!(f, "invalid flow region {}: {}", index, reason)
            }
            Self::InvalidConfig { field } => write!(f, "invalid flow config: {}", field),
        }
    }
}

impl std::error::Error for FlowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_limit_context() {
        let err = FlowError::LimitExceeded {
            kind: "max_glyphs_per_chunk",
            actual: 10,
            limit: 4,
        };
        assert_eq!(
            err.to_string(),
            "flow limit exceeded: max_glyphs_per_chunk (actual=10 limit=4)"
        );
        let err = FlowError::InvalidRegion {
            index: 2,
            reason: "non-finite bounds",
        };
        assert_eq!(err.to_string(), "invalid flow region 2: non-finite bounds");
    }
}
