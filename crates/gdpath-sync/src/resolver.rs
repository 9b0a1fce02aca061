//! Path resolver
//!
//! [`PathResolver`] maps logical paths onto the remote object graph. It owns
//! the executor every remote call goes through and a process-local
//! [`PathCache`] of the IDs it has resolved so far.
//!
//! ## Resolution
//!
//! - The root path is the `root` sentinel and never costs a remote call.
//! - A cached path is answered from the cache.
//! - Otherwise the containing folder is looked up read-only, segment by
//!   segment, and the leaf is searched among its children.
//!
//! "Not found" is a normal answer (`Ok(None)`), never an error.
//!
//! ## Folder creation
//!
//! [`PathResolver::ensure_folder`] creates every missing folder of a chain.
//! The whole walk runs under the cross-process [`FolderLock`] so concurrent
//! gdpath processes never create the same folder twice. Read-only walks do
//! not take the lock.
//!
//! Every mutation made through the resolver evicts the cache entries it
//! invalidates; callers mutating the remote graph directly must call
//! [`PathResolver::evict`] themselves.

use gdpath_core::config::LockConfig;
use gdpath_core::domain::{DomainError, PathCache, PathKey, RemoteId};
use gdpath_core::ports::{DriveFile, FieldSelector, FileMetadata, FileQuery, RemoteStore};
use gdpath_drive::executor::Executor;
use tracing::{debug, info};

use crate::lock::FolderLock;
use crate::SyncError;

/// Name of the folder backups are moved into
pub const BACKUP_FOLDER: &str = "old";

/// Suffix of backup names; the first free of `.bak`, `.bak1`, `.bak2`, ...
/// is used
pub const BACKUP_SUFFIX: &str = ".bak";

/// Resolves logical paths to remote IDs, creating folders on demand
#[derive(Debug)]
pub struct PathResolver<S> {
    executor: Executor<S>,
    cache: PathCache,
    lock: LockConfig,
}

impl<S: RemoteStore> PathResolver<S> {
    /// Creates a resolver with an empty cache
    pub fn new(executor: Executor<S>, lock: LockConfig) -> Self {
        Self {
            executor,
            cache: PathCache::new(),
            lock,
        }
    }

    pub fn executor(&self) -> &Executor<S> {
        &self.executor
    }

    pub fn cache(&self) -> &PathCache {
        &self.cache
    }

    /// Records that `path` now names `id`
    pub fn remember(&mut self, path: PathKey, id: RemoteId) {
        self.cache.insert(path, id);
    }

    /// Forgets `path` and everything cached under it
    pub fn evict(&mut self, path: &PathKey) -> Option<RemoteId> {
        let evicted = self.cache.evict(path);
        if let Some(id) = &evicted {
            debug!(path = %path, id = %id, "Evicted cache entry");
        }
        evicted
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolves `path` to the ID of the object it names, if any
    pub async fn resolve(&mut self, path: &PathKey) -> Result<Option<RemoteId>, SyncError> {
        if path.is_root() {
            return Ok(Some(RemoteId::root()));
        }
        if let Some(id) = self.cache.get(path) {
            debug!(path = %path, id = %id, "Cache hit");
            return Ok(Some(id.clone()));
        }

        let (dir, leaf) = path.split_leaf();
        let Some(parent) = self.lookup_folder(&dir).await? else {
            return Ok(None);
        };
        let Some(leaf) = leaf else {
            return Ok(Some(parent));
        };

        let found = self.children(&parent, leaf).await?;
        let Some(file) = found.into_iter().next() else {
            debug!(path = %path, "Not found");
            return Ok(None);
        };

        self.cache.insert(path.clone(), file.id.clone());
        Ok(Some(file.id))
    }

    /// Looks up the folder chain `path` without creating anything
    pub async fn lookup_folder(&mut self, path: &PathKey) -> Result<Option<RemoteId>, SyncError> {
        self.walk(path, false).await
    }

    /// Resolves the folder chain `path`, creating every missing folder
    ///
    /// Runs under the folder-creation lock; fails with
    /// [`LockError::Timeout`](crate::lock::LockError::Timeout) if the lock
    /// stays busy for the configured wait.
    pub async fn ensure_folder(&mut self, path: &PathKey) -> Result<RemoteId, SyncError> {
        if path.is_root() {
            return Ok(RemoteId::root());
        }

        let guard = FolderLock::acquire(&self.lock.path, self.lock.max_wait()).await?;
        let walked = self.walk(path, true).await;
        guard.release();

        walked?.ok_or_else(|| SyncError::NotFound(path.to_string()))
    }

    /// Walks the segments of `path` left to right, optionally creating
    /// missing folders
    async fn walk(&mut self, path: &PathKey, create: bool) -> Result<Option<RemoteId>, SyncError> {
        let mut current = RemoteId::root();

        for (prefix, segment) in path.prefixes() {
            if let Some(id) = self.cache.get(&prefix) {
                current = id.clone();
                continue;
            }

            let found = self
                .executor
                .list_all(&FileQuery::folder_named(&current, segment), &FieldSelector::basic())
                .await?;

            let id = match found.into_iter().next() {
                Some(folder) => folder.id,
                None if !create => {
                    debug!(path = %prefix, "Folder not found");
                    return Ok(None);
                }
                None => {
                    let id = self
                        .executor
                        .create(FileMetadata::folder(segment, current.clone()))
                        .await?;
                    info!(path = %prefix, id = %id, "Created folder");
                    id
                }
            };

            self.cache.insert(prefix, id.clone());
            current = id;
        }

        Ok(Some(current))
    }

    /// Every non-trashed object named `name` directly under `parent`
    pub async fn children(
        &self,
        parent: &RemoteId,
        name: &str,
    ) -> Result<Vec<DriveFile>, SyncError> {
        Ok(self
            .executor
            .list_all(&FileQuery::child_named(parent, name), &FieldSelector::basic())
            .await?)
    }

    // ========================================================================
    // Deduplication
    // ========================================================================

    /// Moves the object at `folder/name` out of the way
    ///
    /// The object is renamed to the first free `name.bak`, `name.bak1`, ...
    /// inside `folder/old` (created on demand) and moved there. Returns
    /// `false` when there was nothing to back up. The reserved backup folder
    /// itself cannot be backed up.
    pub async fn backup(&mut self, folder: &PathKey, name: &str) -> Result<bool, SyncError> {
        if name == BACKUP_FOLDER {
            return Err(DomainError::InvalidName(format!(
                "'{name}' is the reserved backup folder"
            ))
            .into());
        }
        let target = folder.join(name)?;
        if self.lookup_folder(folder).await?.is_none() {
            return Ok(false);
        }
        let Some(id) = self.resolve(&target).await? else {
            return Ok(false);
        };

        let backup_dir = self.ensure_folder(&folder.join(BACKUP_FOLDER)?).await?;

        let mut suffix = BACKUP_SUFFIX.to_string();
        let mut probe = 1u32;
        while !self
            .children(&backup_dir, &format!("{name}{suffix}"))
            .await?
            .is_empty()
        {
            suffix = format!("{BACKUP_SUFFIX}{probe}");
            probe += 1;
        }
        let backup_name = format!("{name}{suffix}");

        info!(
            path = %target,
            backup = %format!("{BACKUP_FOLDER}/{backup_name}"),
            "Moving existing object to backup"
        );
        self.executor.rename(&id, &backup_name).await?;
        self.executor.move_to(&id, &backup_dir).await?;
        self.evict(&target);

        Ok(true)
    }

    /// Deletes every object at `folder/name` and returns how many there were
    pub async fn delete_duplicates(
        &mut self,
        folder: &PathKey,
        name: &str,
    ) -> Result<usize, SyncError> {
        let target = folder.join(name)?;
        let Some(parent) = self.lookup_folder(folder).await? else {
            return Ok(0);
        };

        let found = self.children(&parent, name).await?;
        for file in &found {
            self.executor.delete(&file.id).await?;
        }
        if !found.is_empty() {
            info!(path = %target, count = found.len(), "Deleted objects");
        }
        self.evict(&target);

        Ok(found.len())
    }
}
