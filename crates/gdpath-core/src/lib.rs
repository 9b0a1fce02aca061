//! gdpath Core - Domain types, ports and configuration
//!
//! This crate contains the pieces every other gdpath crate agrees on:
//! - **Domain types** - `PathKey`, `RemoteId`, `RemoteObjectRef`, `PathCache`
//! - **Port definitions** - the [`ports::RemoteStore`] trait and the tagged
//!   [`ports::DriveOp`] / [`ports::DriveReply`] pair exchanged across it
//! - **Configuration** - the YAML-backed [`config::Config`]
//!
//! # Architecture
//!
//! The domain module is pure and has no I/O. Ports define the single seam
//! through which the rest of the system talks to the remote object store;
//! the Google Drive adapter lives in `gdpath-drive`, and tests plug in
//! in-memory implementations.

pub mod config;
pub mod domain;
pub mod ports;
