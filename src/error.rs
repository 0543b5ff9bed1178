//! Error types for RAM mapping runs.

use std::path::PathBuf;

use crate::model::PhysType;

/// Errors raised while loading inputs, building the resource catalog or mapping.
///
/// Everything from [`MapError::NoCandidate`] down is a configuration error: the catalog
/// cannot satisfy the declared demand under the chosen architecture, and the run stops.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// An I/O error occurred while reading or writing a file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Writing the CSV summary failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The numeric architecture selector is not one of the known modes.
    #[error("unknown architecture mode {0} (expected 1-4)")]
    UnknownMode(u32),

    /// The parameter list does not match what the mode needs.
    #[error("mode {mode} expects {expected} parameters, got {got}")]
    MissingParameter {
        /// The mode code.
        mode: u32,
        /// Number of parameters the mode takes.
        expected: usize,
        /// Number of parameters supplied.
        got: usize,
    },

    /// A custom block description is not buildable.
    #[error("invalid block parameters: {reason}")]
    InvalidBlock {
        /// Description of the problem.
        reason: String,
    },

    /// The resource factory produced nothing to map onto.
    #[error("resource catalog is empty")]
    EmptyCatalog,

    /// Every (resource, combination) pair was filtered out for a logical RAM.
    #[error("no admissible mapping for logical RAM {ram_id} in circuit {circuit_id}")]
    NoCandidate {
        /// Circuit being mapped.
        circuit_id: u32,
        /// Logical RAM with no candidate.
        ram_id: u32,
    },

    /// The area estimate of the winning candidate was zero.
    #[error("estimated area is zero for logical RAM {ram_id} in circuit {circuit_id}")]
    ZeroArea {
        /// Circuit being mapped.
        circuit_id: u32,
        /// Logical RAM being mapped.
        ram_id: u32,
    },

    /// A resource type that the active mode must never use ended up in use.
    #[error(
        "{kind} used by logical RAM {ram_id} in circuit {circuit_id}, \
         which {mode} does not allow"
    )]
    UnexpectedResource {
        /// Circuit being mapped.
        circuit_id: u32,
        /// Logical RAM whose commit broke the invariant.
        ram_id: u32,
        /// The offending resource type.
        kind: PhysType,
        /// Name of the active architecture mode.
        mode: &'static str,
    },
}

impl MapError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MapError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, MapError>;
