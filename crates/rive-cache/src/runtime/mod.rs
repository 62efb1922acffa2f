//! The capabilities the cache needs from a Rive runtime binding.
//!
//! A runtime knows how to turn [`RiveFileParams`] into a [`RiveFile`] handle. The handle
//! is loaded asynchronously through [`RiveFile::init`], which yields a single-shot
//! notification future resolving once the load either succeeded or failed.
//!
//! [`fs::FsRuntime`] is a binding that reads files from the local file system.

use std::io;
use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::params::RiveFileParams;

pub mod fs;
pub mod header;

pub use header::{HeaderError, RiveHeader};

/// The single-shot completion of a [`RiveFile`] load.
pub type LoadNotification = BoxFuture<'static, Result<(), FileError>>;

/// An error that happens while creating, loading or cleaning up a [`RiveFile`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileError {
    /// The referenced file does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The `src` uses a URL scheme the runtime cannot load from.
    #[error("unsupported source scheme: {0}")]
    UnsupportedScheme(String),
    /// The `src` could not be resolved to a location.
    #[error("invalid source: {0}")]
    InvalidSource(String),
    /// The file was fetched, but is not a valid Rive file.
    #[error("malformed: {0}")]
    Malformed(String),
    /// Loading failed for another reason.
    #[error("load failed: {0}")]
    LoadFailed(String),
    /// The load was dropped before it could report an outcome.
    ///
    /// This happens when the load panics or its runtime shuts down mid-flight.
    #[error("load aborted")]
    Aborted,
    /// The load was requested outside of a tokio runtime.
    #[error("no async runtime to load on")]
    NoRuntime,
    /// Releasing the resources held by the file failed.
    #[error("cleanup failed: {0}")]
    CleanupFailed(String),
}

impl From<io::Error> for FileError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::LoadFailed(err.to_string()),
        }
    }
}

impl From<HeaderError> for FileError {
    fn from(err: HeaderError) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// A handle to a Rive file owned by some runtime.
pub trait RiveFile: Send + Sync + 'static {
    /// Begins loading the file.
    ///
    /// An `Err` here means the load could not even be started. Otherwise the returned
    /// notification resolves exactly once with the outcome of the load.
    fn init(self: Arc<Self>) -> Result<LoadNotification, FileError>;

    /// Acquires a standing usage claim on the loaded file.
    fn get_instance(&self);

    /// Releases all resources held by the file.
    ///
    /// Must be safe to call on a file that was never fully loaded or used.
    fn cleanup(&self) -> Result<(), FileError>;
}

/// A Rive runtime binding that can construct [`RiveFile`] handles.
pub trait RiveRuntime: Send + Sync + 'static {
    type File: RiveFile;

    /// Constructs a new, not yet loaded, file handle for `params`.
    fn open(&self, params: &RiveFileParams) -> Result<Self::File, FileError>;
}
