//! Port definitions
//!
//! Ports are the interfaces the core depends on but whose implementations
//! live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`RemoteStore`] - one attempt of one remote call against the object store

pub mod remote_store;

pub use remote_store::{
    ApiError, DriveFile, DriveOp, DriveReply, FieldSelector, FileMetadata, FilePage, FileQuery,
    KindFilter, Media, RemoteStore, FOLDER_MIME, SPREADSHEET_MIME,
};
