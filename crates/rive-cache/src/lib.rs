//! A reference counted cache for Rive animation files.
//!
//! The [`FileCache`] deduplicates concurrent loads of the same file, shares loaded files
//! between all of their users and cleans them up once the last user releases them. Files
//! are loaded through a pluggable [`RiveRuntime`], see [`runtime::fs::FsRuntime`] for a
//! binding backed by the local file system.

pub mod cache;
pub mod config;
pub mod logging;
pub mod params;
pub mod runtime;
pub mod utils;


pub use cache::{CacheKey, FileCache, FileLoadState, FileLoadWatch, FileStatus};
pub use params::{ParamsError, RiveBuffer, RiveFileParams};
pub use runtime::{FileError, RiveFile, RiveRuntime};
