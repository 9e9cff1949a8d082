//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`Error`] covers the failure modes of the composition
//! engine:
//! - Asset loading and decoding errors ([`AssetError`])
//! - Rejected configuration mutations ([`ConfigError`])
//! - Settings I/O and parsing errors
//!
//! A superseded asynchronous load is *not* an error: stale completions are
//! discarded silently by the scene composer.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, Error>`.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::Parameter;

/// Failures raised while resolving or fetching an asset fragment.
#[derive(Error, Debug)]
pub enum AssetError {
    /// The asset file does not exist.
    #[error("Asset not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The asset could not be read.
    #[error("Failed to read asset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// glTF parsing error.
    #[error("glTF error: {0}")]
    Gltf(String),

    /// The asset parsed, but contains no scene to instantiate.
    #[error("Asset {0} contains no scene")]
    EmptyScene(String),

    /// A catalog index outside the catalog bounds.
    #[error("Asset index out of bounds: {catalog} catalog has {len} entries (index: {index})")]
    UnknownIndex {
        /// Name of the catalog being accessed
        catalog: &'static str,
        /// The invalid index
        index: usize,
        /// Number of entries in the catalog
        len: usize,
    },

    /// The loader refused the request (used by external and in-memory loaders).
    #[error("Asset load rejected: {0}")]
    Rejected(String),

    /// Feature not enabled.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(&'static str),
}

/// A configuration mutation that was refused at the mutation boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{parameter} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        parameter: Parameter,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Settings describe an unusable catalog.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// The main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "gltf")]
impl From<gltf::Error> for AssetError {
    fn from(err: gltf::Error) -> Self {
        AssetError::Gltf(err.to_string())
    }
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
