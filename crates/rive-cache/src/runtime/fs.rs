use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures::FutureExt;
use url::Url;

use super::{FileError, LoadNotification, RiveFile, RiveHeader, RiveRuntime};
use crate::config::Config;
use crate::params::RiveFileParams;

/// A [`RiveRuntime`] that loads files from the local file system.
///
/// `src` parameters may be `file://` URLs or paths. Relative paths are resolved against
/// the configured base directory.
#[derive(Debug, Clone, Default)]
pub struct FsRuntime {
    base_dir: PathBuf,
}

impl FsRuntime {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.base_dir.clone().unwrap_or_default())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, src: &str) -> Result<PathBuf, FileError> {
        match Url::parse(src) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|_| FileError::InvalidSource(src.to_owned())),
            // Windows drive letters parse as single character schemes.
            Ok(url) if url.scheme().len() > 1 => {
                Err(FileError::UnsupportedScheme(url.scheme().to_owned()))
            }
            _ if src.is_empty() => Err(FileError::InvalidSource(src.to_owned())),
            _ => Ok(self.base_dir.join(src)),
        }
    }
}

impl RiveRuntime for FsRuntime {
    type File = FsRiveFile;

    fn open(&self, params: &RiveFileParams) -> Result<Self::File, FileError> {
        let location = match params {
            RiveFileParams::Src(src) => Location::Path(self.resolve(src)?),
            RiveFileParams::Buffer(buffer) => Location::Memory(buffer.data().clone()),
        };
        Ok(FsRiveFile {
            location,
            loaded: Mutex::new(None),
            instances: AtomicUsize::new(0),
        })
    }
}

#[derive(Debug)]
enum Location {
    Path(PathBuf),
    Memory(Bytes),
}

#[derive(Debug)]
struct Loaded {
    header: RiveHeader,
    data: Bytes,
}

/// A Rive file loaded by the [`FsRuntime`].
#[derive(Debug)]
pub struct FsRiveFile {
    location: Location,
    loaded: Mutex<Option<Loaded>>,
    instances: AtomicUsize,
}

impl FsRiveFile {
    fn loaded(&self) -> MutexGuard<'_, Option<Loaded>> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The path the file is read from, `None` for in-memory files.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::Path(path) => Some(path),
            Location::Memory(_) => None,
        }
    }

    /// The decoded header, once the file is loaded and until it is cleaned up.
    pub fn header(&self) -> Option<RiveHeader> {
        self.loaded().as_ref().map(|loaded| loaded.header.clone())
    }

    /// The raw file contents, once the file is loaded and until it is cleaned up.
    pub fn data(&self) -> Option<Bytes> {
        self.loaded().as_ref().map(|loaded| loaded.data.clone())
    }

    /// Number of instance claims acquired on this file.
    pub fn instances(&self) -> usize {
        self.instances.load(Ordering::Relaxed)
    }
}

impl RiveFile for FsRiveFile {
    fn init(self: Arc<Self>) -> Result<LoadNotification, FileError> {
        Ok(async move {
            let data = match &self.location {
                Location::Path(path) => {
                    tracing::trace!(path = %path.display(), "Reading Rive file");
                    Bytes::from(tokio::fs::read(path).await?)
                }
                Location::Memory(data) => data.clone(),
            };
            let header = RiveHeader::parse(&data)?;
            tracing::trace!(
                file_id = header.file_id,
                minor_version = header.minor_version,
                len = data.len(),
                "Decoded Rive file header"
            );

            *self.loaded() = Some(Loaded { header, data });
            Ok::<_, FileError>(())
        }
        .boxed())
    }

    fn get_instance(&self) {
        self.instances.fetch_add(1, Ordering::Relaxed);
    }

    fn cleanup(&self) -> Result<(), FileError> {
        self.loaded().take();
        Ok(())
    }
}
