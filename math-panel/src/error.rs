//! Error types for the panel solver
//!
//! Matrix-level failures (numerical blow-up, singular matrix, malformed wake)
//! abort the enclosing analysis. Per-node reconstruction failures are recovered
//! locally and only logged, so they never appear here.

use solvers::{LstsqError, LuError};
use thiserror::Error;

/// Panel solver errors
#[derive(Error, Debug)]
pub enum PanelError {
    /// NaN or infinity in an influence or quadrature computation
    #[error("Numerical blow-up in the influence of panel {source_panel} on panel {target_panel}")]
    NumericalBlowUp {
        /// Panel whose row was being assembled
        target_panel: usize,
        /// Panel (or wake panel) whose field was being integrated
        source_panel: usize,
    },

    /// Factorization or back substitution failed
    #[error("Linear solver failed: {0}")]
    Solver(#[from] LuError),

    /// Least-squares solve failed
    #[error("Least-squares solve failed: {0}")]
    LeastSquares(#[from] LstsqError),

    /// A wake chain did not reach its sentinel within the hop cap
    #[error("Wake chain starting at wake panel {start} exceeds {max_hops} hops")]
    WakeChainTooLong {
        /// First wake panel of the chain
        start: usize,
        /// Configured hop cap
        max_hops: usize,
    },

    /// Inconsistent mesh data
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Inconsistent analysis configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The cancellation token was raised during a stage
    #[error("Analysis cancelled")]
    Cancelled,

    /// A stage was requested before the stage it depends on
    #[error("Analysis stage out of order: {0}")]
    StageOrder(&'static str),

    /// Precision cannot change once factorization has started
    #[error("Precision is locked once factorization has started")]
    PrecisionLocked,

    /// Zero-moment angle search did not converge
    #[error("Zero-moment angle search did not converge after {iterations} iterations")]
    TrimNotConverged {
        /// Iterations performed
        iterations: usize,
    },

    /// Worker pool could not be created
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    /// File access error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for panel solver operations
pub type Result<T> = std::result::Result<T, PanelError>;
