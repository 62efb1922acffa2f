use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::runtime::FileError;

/// The loading status of a Rive file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Nothing is loaded or loading.
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
}

impl FileStatus {
    /// Whether a load with this status has reached its outcome.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot of the state of one loading episode.
pub struct FileLoadState<F> {
    /// The loaded file, set once the status is [`FileStatus::Success`].
    pub file: Option<Arc<F>>,
    pub status: FileStatus,
    /// Why the load failed, set once the status is [`FileStatus::Failed`].
    pub error: Option<FileError>,
}

impl<F> FileLoadState<F> {
    pub(crate) fn loading() -> Self {
        Self {
            file: None,
            status: FileStatus::Loading,
            error: None,
        }
    }

    pub(crate) fn success(file: Arc<F>) -> Self {
        Self {
            file: Some(file),
            status: FileStatus::Success,
            error: None,
        }
    }

    pub(crate) fn failed(error: FileError) -> Self {
        Self {
            file: None,
            status: FileStatus::Failed,
            error: Some(error),
        }
    }
}

impl<F> Default for FileLoadState<F> {
    fn default() -> Self {
        Self {
            file: None,
            status: FileStatus::Idle,
            error: None,
        }
    }
}

impl<F> Clone for FileLoadState<F> {
    fn clone(&self) -> Self {
        Self {
            file: self.file.clone(),
            status: self.status,
            error: self.error.clone(),
        }
    }
}

impl<F> fmt::Debug for FileLoadState<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLoadState")
            .field("file", &self.file.as_ref().map(|_| ".."))
            .field("status", &self.status)
            .field("error", &self.error)
            .finish()
    }
}

pub(crate) type StateSender<F> = watch::Sender<FileLoadState<F>>;

/// A read-only view on the state of a loading episode.
///
/// All views handed out for the same episode observe the same state, which is updated in
/// place as the load progresses.
pub struct FileLoadWatch<F> {
    rx: watch::Receiver<FileLoadState<F>>,
}

impl<F> FileLoadWatch<F> {
    pub(crate) fn new(rx: watch::Receiver<FileLoadState<F>>) -> Self {
        Self { rx }
    }

    /// Returns a snapshot of the current state.
    pub fn get(&self) -> FileLoadState<F> {
        FileLoadState::clone(&self.rx.borrow())
    }

    pub fn status(&self) -> FileStatus {
        self.rx.borrow().status
    }

    pub fn file(&self) -> Option<Arc<F>> {
        self.rx.borrow().file.clone()
    }

    pub fn error(&self) -> Option<FileError> {
        self.rx.borrow().error.clone()
    }

    /// Whether both views observe the same loading episode.
    pub fn same_episode(&self, other: &Self) -> bool {
        self.rx.same_channel(&other.rx)
    }

    /// Waits for the next state update.
    ///
    /// Returns `false` once no further updates can happen.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Waits until the load has succeeded or failed, and returns the settled state.
    ///
    /// If the episode is abandoned without settling, the last known state is returned.
    pub async fn settled(&self) -> FileLoadState<F> {
        let mut rx = self.rx.clone();
        let settled = rx
            .wait_for(|state| state.status.is_settled())
            .await
            .map(|state| FileLoadState::clone(&state));

        match settled {
            Ok(state) => state,
            Err(_) => FileLoadState::clone(&rx.borrow()),
        }
    }
}

impl<F> Clone for FileLoadWatch<F> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<F> fmt::Debug for FileLoadWatch<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FileLoadWatch")
            .field(&*self.rx.borrow())
            .finish()
    }
}
