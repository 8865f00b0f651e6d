//! Error taxonomy for the client
//!
//! Every variant is fatal: the client shows one static image and has no
//! partial-success mode, so errors are surfaced where they are detected and
//! turned into a non-zero exit status by the binary.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that terminate the client
#[derive(Debug, Error)]
pub enum LogoError {
    /// The display server socket could not be found or connected to
    #[error("Wayland display `{endpoint}` does not exist: {reason}")]
    EndpointNotFound { endpoint: String, reason: String },

    /// One or more required globals were not advertised by the server
    #[error("Required globals could not be obtained: {}", .missing.join(", "))]
    MissingCapability { missing: Vec<&'static str> },

    /// Descriptor creation, sizing or mapping failed
    #[error("Shared memory allocation failed: {0}")]
    ResourceAllocation(String),

    /// The connection to the server broke during dispatch
    #[error("Wayland transport error: {0}")]
    Transport(#[from] wayland_client::DispatchError),

    /// The pixel source ended before every pixel was read
    #[error("Pixel source truncated: expected {expected} records, found {found}")]
    DataTruncated { expected: usize, found: usize },

    /// A pixel record is not four `u8` values separated by `:`
    #[error("Malformed pixel record on line {line}: {content:?}")]
    MalformedRecord { line: usize, content: String },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O failure while reading the pixel source
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LogoError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        1
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LogoError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type LogoResult<T> = Result<T, LogoError>;
