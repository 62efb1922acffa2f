//! # Rive file cache
//!
//! The [`FileCache`] loads Rive files through a [`RiveRuntime`] and shares the loaded
//! handles between all of its consumers.
//!
//! ## Lifecycle of a key
//!
//! Every [`CacheKey`] is in exactly one of three states:
//!
//! - **absent**: nothing is known about the key.
//! - **pending**: a load was started and has not settled yet. Concurrent requests for the
//!   same key join this load instead of starting a new one.
//! - **cached**: the load succeeded. The entry is reference counted, every
//!   [`FileCache::load_file`] adds a reference and every [`FileCache::release_file`] removes
//!   one. The file is cleaned up once the last reference is gone.
//!
//! A failed load goes straight from pending back to absent. The failure is only ever
//! reported through the [`FileLoadWatch`] of the episode, never as an error of
//! [`FileCache::load_file`] itself.
//!
//! ## Reference counting of joined loads
//!
//! Requests that join a pending load are counted as holders of that load. When the load
//! succeeds the new entry starts out with one reference per holder, so every successful
//! `load_file` call is balanced by exactly one `release_file` call.
//!
//! Releasing a key while its load is still pending does nothing.
//!
//! ## Concurrency
//!
//! All bookkeeping happens under a single lock which is never held while calling into the
//! runtime. Loads run as tokio tasks on the runtime [`FileCache::load_file`] is called
//! from. Outside of a tokio runtime, loads fail right away with [`FileError::NoRuntime`].
//! Loads are never cancelled and never time out.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::Instrument;

use crate::params::RiveFileParams;
use crate::runtime::{FileError, RiveFile, RiveRuntime};
use crate::utils::defer::{DeferGuard, defer};

mod key;
mod state;

pub use key::CacheKey;
pub use state::{FileLoadState, FileLoadWatch, FileStatus};

use state::StateSender;

/// A successfully loaded file.
struct CacheEntry<F> {
    file: Arc<F>,
    state: StateSender<F>,
    ref_count: usize,
}

/// A load that has not settled yet.
struct PendingLoad<F> {
    state: StateSender<F>,
    /// Number of `load_file` calls waiting on this load.
    holders: usize,
}

struct Tables<F> {
    cache: HashMap<CacheKey, CacheEntry<F>>,
    pending: HashMap<CacheKey, PendingLoad<F>>,
}

impl<F> Default for Tables<F> {
    fn default() -> Self {
        Self {
            cache: HashMap::new(),
            pending: HashMap::new(),
        }
    }
}

/// A reference counted cache of loaded Rive files.
///
/// Cloning the cache is cheap, and all clones share the same entries.
pub struct FileCache<R: RiveRuntime> {
    runtime: Arc<R>,
    tables: Arc<Mutex<Tables<R::File>>>,
}

impl<R: RiveRuntime> Clone for FileCache<R> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            tables: Arc::clone(&self.tables),
        }
    }
}

impl<R: RiveRuntime> fmt::Debug for FileCache<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (cached, pending) = self
            .tables
            .try_lock()
            .map(|tables| (tables.cache.len(), tables.pending.len()))
            .unwrap_or_default();
        f.debug_struct("FileCache")
            .field("cached files", &cached)
            .field("pending loads", &pending)
            .finish()
    }
}

impl<R: RiveRuntime> FileCache<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime: Arc::new(runtime),
            tables: Default::default(),
        }
    }

    /// The runtime used to load files.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    fn tables(&self) -> MutexGuard<'_, Tables<R::File>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requests the file described by `params`.
    ///
    /// Returns immediately with a view on the loading episode of the file:
    ///
    /// - If the file is already cached, its reference count is increased and the view
    ///   reports [`FileStatus::Success`].
    /// - If the file is currently loading, the caller joins that load.
    /// - Otherwise a new load is started in the background and the view reports
    ///   [`FileStatus::Loading`] until it settles.
    ///
    /// Every call should eventually be balanced by a call to [`release_file`](Self::release_file).
    pub fn load_file(&self, params: &RiveFileParams) -> FileLoadWatch<R::File> {
        let key = CacheKey::from_params(params);
        let mut tables = self.tables();

        if let Some(entry) = tables.cache.get_mut(&key) {
            entry.ref_count += 1;
            tracing::trace!(%key, ref_count = entry.ref_count, "Rive file cache hit");
            return FileLoadWatch::new(entry.state.subscribe());
        }

        if let Some(pending) = tables.pending.get_mut(&key) {
            pending.holders += 1;
            tracing::trace!(%key, holders = pending.holders, "Joining pending Rive file load");
            return FileLoadWatch::new(pending.state.subscribe());
        }

        // Without a runtime to drive it the load could never settle, so it must not be
        // registered as pending.
        let Ok(handle) = Handle::try_current() else {
            drop(tables);
            tracing::error!(%key, "Cannot load Rive file outside of a tokio runtime");
            let (_, rx) = watch::channel(FileLoadState::failed(FileError::NoRuntime));
            return FileLoadWatch::new(rx);
        };

        let (state, rx) = watch::channel(FileLoadState::loading());
        tables
            .pending
            .insert(key.clone(), PendingLoad { state, holders: 1 });
        drop(tables);

        tracing::trace!(%key, "Starting Rive file load");
        let span = tracing::debug_span!("load_rive_file", %key);
        handle.spawn(
            self.clone()
                .run_load(key, params.clone())
                .instrument(span),
        );

        FileLoadWatch::new(rx)
    }

    /// Releases one reference to the file described by `params`.
    ///
    /// Once the last reference is gone, the file is cleaned up and removed from the cache.
    /// Releasing a file that is not cached does nothing.
    pub fn release_file(&self, params: &RiveFileParams) {
        let key = CacheKey::from_params(params);
        let mut tables = self.tables();

        let Some(entry) = tables.cache.get_mut(&key) else {
            tracing::debug!(%key, "Releasing a Rive file that is not cached");
            return;
        };

        entry.ref_count = entry.ref_count.saturating_sub(1);
        if entry.ref_count > 0 {
            tracing::trace!(%key, ref_count = entry.ref_count, "Released Rive file");
            return;
        }

        let entry = tables.cache.remove(&key);
        drop(tables);

        if let Some(entry) = entry {
            tracing::trace!(%key, "Last reference released, cleaning up Rive file");
            teardown(&key, &entry.file);
        }
    }

    /// Cleans up all cached files, regardless of their reference counts.
    ///
    /// Pending loads are not affected. They complete into the emptied cache as usual.
    pub fn clear_cache(&self) {
        let entries: Vec<_> = self.tables().cache.drain().collect();

        tracing::debug!(count = entries.len(), "Clearing Rive file cache");
        for (key, entry) in entries {
            teardown(&key, &entry.file);
        }
    }

    /// The status of the file described by `params`.
    ///
    /// Files that failed to load, or were never requested, are [`FileStatus::Idle`].
    pub fn status(&self, params: &RiveFileParams) -> FileStatus {
        let key = CacheKey::from_params(params);
        let tables = self.tables();
        if tables.cache.contains_key(&key) {
            FileStatus::Success
        } else if tables.pending.contains_key(&key) {
            FileStatus::Loading
        } else {
            FileStatus::Idle
        }
    }

    /// The current reference count of a cached file.
    pub fn ref_count(&self, params: &RiveFileParams) -> Option<usize> {
        let key = CacheKey::from_params(params);
        self.tables().cache.get(&key).map(|entry| entry.ref_count)
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.tables().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables().cache.is_empty()
    }

    /// Number of loads that have not settled yet.
    pub fn pending_len(&self) -> usize {
        self.tables().pending.len()
    }

    async fn run_load(self, key: CacheKey, params: RiveFileParams) {
        // Settles the episode if this task goes away without reaching an outcome,
        // for example because the load panicked.
        let abort_guard = defer({
            let this = self.clone();
            let key = key.clone();
            move || this.fail(&key, FileError::Aborted, None)
        });

        let file = match self.runtime.open(&params) {
            Ok(file) => Arc::new(file),
            Err(err) => {
                abort_guard.cancel();
                self.fail(&key, err, None);
                return;
            }
        };

        let outcome = match Arc::clone(&file).init() {
            Ok(notification) => notification.await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => self.promote(&key, file, abort_guard),
            Err(err) => {
                abort_guard.cancel();
                self.fail(&key, err, Some(file));
            }
        }
    }

    /// Moves a successfully loaded file from the pending table into the cache.
    ///
    /// The `abort_guard` stays armed until the pending load has been taken out of the table.
    fn promote(
        &self,
        key: &CacheKey,
        file: Arc<R::File>,
        abort_guard: DeferGuard<impl FnOnce()>,
    ) {
        // The cache's own claim, held for as long as the file is cached.
        file.get_instance();

        let mut tables = self.tables();
        let pending = tables.pending.remove(key);
        abort_guard.cancel();

        let Some(pending) = pending else {
            drop(tables);
            tracing::error!(%key, "Rive file load settled without being pending");
            teardown(key, &file);
            return;
        };

        pending
            .state
            .send_replace(FileLoadState::success(Arc::clone(&file)));
        tracing::debug!(%key, ref_count = pending.holders, "Rive file loaded");

        tables.cache.insert(
            key.clone(),
            CacheEntry {
                file,
                state: pending.state,
                ref_count: pending.holders,
            },
        );
    }

    /// Settles a pending load as failed.
    fn fail(&self, key: &CacheKey, error: FileError, file: Option<Arc<R::File>>) {
        tracing::debug!(%key, error = &error as &dyn std::error::Error, "Rive file load failed");

        if let Some(pending) = self.tables().pending.remove(key) {
            pending.state.send_replace(FileLoadState::failed(error));
        }

        if let Some(file) = file {
            teardown(key, &file);
        }
    }
}

/// Cleans up a file, logging instead of propagating errors.
fn teardown<F: RiveFile>(key: &CacheKey, file: &Arc<F>) {
    if let Err(e) = file.cleanup() {
        tracing::error!(
            error = &e as &dyn std::error::Error,
            %key,
            "Failed to clean up Rive file",
        );
    }
}
