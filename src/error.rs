use thiserror::Error;

/// The tagged error set for the whole crate. Every fallible construction
/// and every `solve` call returns one of these; no validation error is
/// recovered internally.
#[derive(Debug, Error)]
pub enum Error {
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("axis {axis} has only {len} points; a three-point stencil needs at least 3")]
    InsufficientStencilWidth { axis: usize, len: usize },

    #[error("no boundary condition supplied for axis {axis}, end {end:?}")]
    BoundarySpecMissing { axis: usize, end: BoundaryEnd },

    #[error("symbol `{symbol}` does not belong to the equation's symbol bundle")]
    SymbolOutOfScope { symbol: String },

    #[error("invalid left-hand-side combination: {0}")]
    LhsCombination(String),

    #[error("non-finite values produced while integrating sub-interval {sub_interval:?}")]
    Divergence { sub_interval: Option<usize> },

    #[error("{what} did not converge within {max_iterations} iterations (residual {residual:e}, tolerance {tolerance:e})")]
    DidNotConverge {
        what: &'static str,
        max_iterations: usize,
        residual: f64,
        tolerance: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryEnd {
    Lower,
    Upper,
}

pub type Result<T> = std::result::Result<T, Error>;
