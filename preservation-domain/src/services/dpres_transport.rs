// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! DPRES SFTP transport port used by the reconciler (§4.6). Named after
//! what it does — an SFTP-shaped remote filesystem view — rather than any
//! one concrete client crate, so `preservation-engine` can back it with
//! `ssh2` without leaking that choice into the domain.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct RemoteDirEntry {
    pub name: String,
    pub is_dir: bool,
    pub modified: DateTime<Utc>,
}

#[async_trait]
pub trait DpresTransport: Send + Sync {
    /// Lists entries directly under `path`. Used both to enumerate the
    /// `accepted/<date>/` and `rejected/<date>/` day-folders and the
    /// `sip_filename` subdirectories beneath each.
    async fn list_dir(&self, path: &str) -> std::io::Result<Vec<RemoteDirEntry>>;

    /// Reads the full contents of a remote file.
    async fn read_file(&self, path: &str) -> std::io::Result<Vec<u8>>;

    /// Downloads a remote file to `local_path` using an atomic
    /// `.download → rename` pattern so a crash mid-transfer never leaves a
    /// partially-written report in place.
    async fn download_file_atomic(&self, remote_path: &str, local_path: &std::path::Path) -> std::io::Result<()>;

    /// Recursively removes a remote directory tree. Used only on
    /// already-consumed rejected-transfer subtrees.
    async fn remove_dir_recursive(&self, path: &str) -> std::io::Result<()>;
}
