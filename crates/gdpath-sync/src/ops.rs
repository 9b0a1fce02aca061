//! Drive operations
//!
//! [`DriveOps`] is the command surface of gdpath: short sequences of
//! resolutions and single calls built on the [`PathResolver`]. Unlike the
//! resolver, this layer reports a missing path as
//! [`SyncError::NotFound`].

use std::path::Path;

use gdpath_core::config::PolicyConfig;
use gdpath_core::domain::{DomainError, ObjectKind, PathKey, RemoteId};
use gdpath_core::ports::{
    DriveFile, FieldSelector, FileMetadata, FileQuery, KindFilter, Media, RemoteStore,
};
use gdpath_drive::upload::{guess_mime_type, TSV_MIME};
use serde::Serialize;
use tracing::info;

use crate::resolver::{PathResolver, BACKUP_FOLDER, BACKUP_SUFFIX};
use crate::SyncError;

/// Prefix of browser links to a remote object
pub const OPEN_URL: &str = "https://drive.google.com/open?id=";

/// Browser link to the object `id`
pub fn open_link(id: &RemoteId) -> String {
    format!("{OPEN_URL}{id}")
}

// ============================================================================
// Listings
// ============================================================================

/// One row of a folder listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub id: RemoteId,
    pub name: String,
    pub kind: ObjectKind,
    pub mime_type: String,
    /// Creation time, shortened to `YYYY-MM-DD HH:MM:SS` when possible
    pub created: String,
    /// The reserved backup folder
    pub reserved: bool,
}

impl ListingEntry {
    fn from_file(file: DriveFile) -> Self {
        let kind = file.kind();
        let reserved = kind == ObjectKind::Folder && file.name == BACKUP_FOLDER;
        Self {
            created: short_time(file.created_time.as_deref().unwrap_or_default()),
            mime_type: file.mime_type.unwrap_or_default(),
            id: file.id,
            name: file.name,
            kind,
            reserved,
        }
    }
}

/// Children of a folder with per-kind totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub entries: Vec<ListingEntry>,
    pub folders: usize,
    pub files: usize,
}

/// Shortens a 24-character RFC 3339 timestamp such as
/// `2026-03-01T12:34:56.789Z` to `2026-03-01 12:34:56`
fn short_time(created: &str) -> String {
    if created.len() == 24 {
        if let (Some(date), Some(time)) = (created.get(0..10), created.get(11..19)) {
            return format!("{date} {time}");
        }
    }
    created.to_string()
}

/// Name with any backup suffix removed, so backups sort next to their origin
fn base_name(name: &str) -> &str {
    name.split_once(BACKUP_SUFFIX).map_or(name, |(base, _)| base)
}

// ============================================================================
// DriveOps
// ============================================================================

/// Commands over logical paths
#[derive(Debug)]
pub struct DriveOps<S> {
    resolver: PathResolver<S>,
    policy: PolicyConfig,
}

impl<S: RemoteStore> DriveOps<S> {
    pub fn new(resolver: PathResolver<S>, policy: PolicyConfig) -> Self {
        Self { resolver, policy }
    }

    pub fn resolver(&self) -> &PathResolver<S> {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut PathResolver<S> {
        &mut self.resolver
    }

    async fn require(&mut self, path: &PathKey) -> Result<RemoteId, SyncError> {
        self.resolver
            .resolve(path)
            .await?
            .ok_or_else(|| SyncError::NotFound(path.to_string()))
    }

    fn check_policy(&self, command: &str) -> Result<(), SyncError> {
        if self.policy.allows(command) {
            Ok(())
        } else {
            Err(SyncError::PermissionDenied(command.to_string()))
        }
    }

    /// ID of the object at `path`
    pub async fn id(&mut self, path: &str) -> Result<RemoteId, SyncError> {
        self.require(&PathKey::parse(path)?).await
    }

    /// Browser link to the object at `path`
    pub async fn link(&mut self, path: &str) -> Result<String, SyncError> {
        Ok(open_link(&self.id(path).await?))
    }

    /// All children of the folder at `path`
    ///
    /// Sorted by MIME type, then by name ignoring backup suffixes, then by
    /// creation time.
    pub async fn listing(&mut self, path: &str) -> Result<Listing, SyncError> {
        let folder = self.id(path).await?;
        let files = self
            .resolver
            .executor()
            .list_all(&FileQuery::children_of(&folder), &FieldSelector::listing())
            .await?;

        let mut entries: Vec<ListingEntry> = files.into_iter().map(ListingEntry::from_file).collect();
        entries.sort_by(|a, b| {
            (a.mime_type.as_str(), base_name(&a.name), a.created.as_str()).cmp(&(
                b.mime_type.as_str(),
                base_name(&b.name),
                b.created.as_str(),
            ))
        });

        let folders = entries
            .iter()
            .filter(|e| e.kind == ObjectKind::Folder)
            .count();
        let files = entries.len() - folders;
        Ok(Listing {
            entries,
            folders,
            files,
        })
    }

    /// Non-folder children of the folder at `path`, oldest first
    pub async fn files(&mut self, path: &str) -> Result<Vec<ListingEntry>, SyncError> {
        let folder = self.id(path).await?;
        let files = self
            .resolver
            .executor()
            .list_all(
                &FileQuery::children_of(&folder).with_kind(KindFilter::FilesOnly),
                &FieldSelector::listing(),
            )
            .await?;

        let mut entries: Vec<ListingEntry> = files.into_iter().map(ListingEntry::from_file).collect();
        entries.sort_by(|a, b| a.created.cmp(&b.created));
        Ok(entries)
    }

    /// Deletes every non-folder child of the folder at `path`
    ///
    /// Destructive; refused unless the policy allows `clear`. Returns the
    /// deleted entries.
    pub async fn clear(&mut self, path: &str) -> Result<Vec<ListingEntry>, SyncError> {
        self.check_policy("clear")?;

        let key = PathKey::parse(path)?;
        let entries = self.files(path).await?;
        for entry in &entries {
            self.resolver.executor().delete(&entry.id).await?;
            if let Ok(child) = key.join(&entry.name) {
                self.resolver.evict(&child);
            }
        }
        info!(path = %key, count = entries.len(), "Cleared folder");
        Ok(entries)
    }

    /// Deletes the object at `path`
    pub async fn delete(&mut self, path: &str) -> Result<RemoteId, SyncError> {
        let key = PathKey::parse(path)?;
        if key.is_root() {
            return Err(DomainError::InvalidPath("cannot delete the root folder".into()).into());
        }
        let id = self.require(&key).await?;

        self.resolver.executor().delete(&id).await?;
        self.resolver.evict(&key);
        info!(path = %key, id = %id, "Deleted");
        Ok(id)
    }

    /// Creates the folder chain `path` as needed
    pub async fn mkdir(&mut self, path: &str) -> Result<RemoteId, SyncError> {
        self.resolver.ensure_folder(&PathKey::parse(path)?).await
    }

    /// Uploads the local file `local` to `remote`
    ///
    /// Missing folders are created. With `replace`, an existing object at
    /// `remote` is backed up first; without it the new file is added next to
    /// any existing one.
    pub async fn upload(
        &mut self,
        local: &Path,
        remote: &str,
        replace: bool,
    ) -> Result<RemoteId, SyncError> {
        let media = Media::new(guess_mime_type(local), tokio::fs::read(local).await?);
        self.upload_media(remote, media, replace, FileMetadata::file)
            .await
    }

    /// Uploads the local TSV file `local` to `remote` as a spreadsheet
    pub async fn upload_sheet(
        &mut self,
        local: &Path,
        remote: &str,
        replace: bool,
    ) -> Result<RemoteId, SyncError> {
        let media = Media::new(TSV_MIME, tokio::fs::read(local).await?);
        self.upload_media(remote, media, replace, FileMetadata::spreadsheet)
            .await
    }

    async fn upload_media(
        &mut self,
        remote: &str,
        media: Media,
        replace: bool,
        metadata: fn(String, RemoteId) -> FileMetadata,
    ) -> Result<RemoteId, SyncError> {
        let key = PathKey::parse(remote)?;
        let (dir, name) = split_target(&key, remote)?;

        let parent = self.resolver.ensure_folder(&dir).await?;
        if replace {
            self.resolver.backup(&dir, &name).await?;
        }

        let size = media.bytes.len();
        let id = self
            .resolver
            .executor()
            .upload(metadata(name, parent), media)
            .await?;
        info!(path = %key, id = %id, size, "Uploaded");

        self.resolver.remember(key, id.clone());
        Ok(id)
    }

    /// Creates an empty spreadsheet at `remote`
    pub async fn new_sheet(&mut self, remote: &str) -> Result<RemoteId, SyncError> {
        let key = PathKey::parse(remote)?;
        let (dir, name) = split_target(&key, remote)?;

        let id = self.resolver.executor().create_sheet(&name).await?;
        let parent = self.resolver.ensure_folder(&dir).await?;
        if !parent.is_root() {
            self.resolver.executor().move_to(&id, &parent).await?;
        }
        info!(path = %key, id = %id, "Created spreadsheet");

        self.resolver.remember(key, id.clone());
        Ok(id)
    }

    /// Bolds and freezes the first row of the first sheet
    pub async fn format_header(&self, spreadsheet_id: &RemoteId) -> Result<(), SyncError> {
        self.resolver
            .executor()
            .format_sheet(spreadsheet_id, header_format_requests())
            .await?;
        Ok(())
    }

    /// Moves the object at `path` into the backup folder next to it
    pub async fn backup(&mut self, path: &str) -> Result<bool, SyncError> {
        let key = PathKey::parse(path)?;
        let (dir, name) = split_target(&key, path)?;
        self.resolver.backup(&dir, &name).await
    }

    /// Deletes every object at `path`, duplicates included
    pub async fn dedup(&mut self, path: &str) -> Result<usize, SyncError> {
        let key = PathKey::parse(path)?;
        let (dir, name) = split_target(&key, path)?;
        self.resolver.delete_duplicates(&dir, &name).await
    }
}

/// Splits a target path into its folder and a non-empty leaf name
fn split_target(key: &PathKey, raw: &str) -> Result<(PathKey, String), DomainError> {
    match key.split_leaf() {
        (dir, Some(name)) => Ok((dir, name.to_string())),
        (_, None) => Err(DomainError::InvalidPath(format!(
            "path must name an object below the root: {raw:?}"
        ))),
    }
}

/// Sheets batch-update requests that bold and freeze the first row
fn header_format_requests() -> serde_json::Value {
    serde_json::json!([
        {
            "repeatCell": {
                "range": { "sheetId": 0, "startRowIndex": 0, "endRowIndex": 1 },
                "cell": { "userEnteredFormat": { "textFormat": { "bold": true } } },
                "fields": "userEnteredFormat.textFormat.bold"
            }
        },
        {
            "updateSheetProperties": {
                "properties": { "sheetId": 0, "gridProperties": { "frozenRowCount": 1 } },
                "fields": "gridProperties.frozenRowCount"
            }
        }
    ])
}
