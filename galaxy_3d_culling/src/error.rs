//! Error types for the Galaxy3D culling crate
//!
//! Most boundary conditions of the culling pipeline are ordinary return
//! values (an empty silhouette, an unpopulated pyramid, a box straddling the
//! near plane). The variants below cover the remaining cases: rejected
//! operations, stale handles, corrupt trees and bad configuration.

use std::fmt;

/// Result type for Galaxy3D culling operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D culling errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Operation rejected, the structure is left unchanged
    /// (e.g. removing an internal BVH node)
    InvalidOperation(String),

    /// Stale or unknown node / object handle
    InvalidHandle(String),

    /// Broken parent/child link found while walking the tree.
    /// Aborts the current pass; callers fall back to "everything visible".
    CorruptTree(String),

    /// Configuration value out of range
    InvalidConfig(String),

    /// External depth rasterizer failure
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            Error::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            Error::CorruptTree(msg) => write!(f, "Corrupt tree: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
