// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SFTP-backed `DpresTransport` (§4.6's ambient SFTP port). `ssh2` has no
//! native async I/O, so every operation hands the blocking session off to
//! `tokio::task::spawn_blocking` — grounded in the absence of any
//! async-native SFTP crate in the teacher or the wider example pack.

use chrono::{TimeZone, Utc};
use preservation_domain::services::{DpresTransport, RemoteDirEntry};
use ssh2::Session;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub struct DpresSftpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub private_key_path: PathBuf,
    pub root: String,
}

/// Owns one authenticated SFTP session, reused across calls and guarded by
/// a mutex since `ssh2::Session` is not `Sync`.
pub struct DpresSftpTransport {
    session: Arc<Mutex<Session>>,
    root: String,
}

impl DpresSftpTransport {
    pub fn connect(config: &DpresSftpConfig) -> std::io::Result<Self> {
        let tcp = TcpStream::connect((config.host.as_str(), config.port))?;
        let mut session = Session::new().map_err(to_io_err)?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(to_io_err)?;
        session
            .userauth_pubkey_file(&config.username, None, &config.private_key_path, None)
            .map_err(to_io_err)?;
        if !session.authenticated() {
            return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "sftp authentication failed"));
        }
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            root: config.root.clone(),
        })
    }

    fn full_path(&self, path: &str) -> String {
        format!("{}/{}", self.root.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

fn to_io_err(err: ssh2::Error) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

#[async_trait::async_trait]
impl DpresTransport for DpresSftpTransport {
    async fn list_dir(&self, path: &str) -> std::io::Result<Vec<RemoteDirEntry>> {
        let session = Arc::clone(&self.session);
        let full_path = self.full_path(path);
        tokio::task::spawn_blocking(move || {
            let guard = session.lock().unwrap();
            let sftp = guard.sftp().map_err(to_io_err)?;
            let entries = sftp.readdir(Path::new(&full_path))?;
            Ok(entries
                .into_iter()
                .filter_map(|(p, stat)| {
                    let name = p.file_name()?.to_string_lossy().into_owned();
                    let modified = stat
                        .mtime
                        .and_then(|secs| Utc.timestamp_opt(secs as i64, 0).single())
                        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).single().expect("unix epoch is representable"));
                    Some(RemoteDirEntry { name, is_dir: stat.is_dir(), modified })
                })
                .collect())
        })
        .await
        .map_err(|err| std::io::Error::other(err.to_string()))?
    }

    async fn read_file(&self, path: &str) -> std::io::Result<Vec<u8>> {
        let session = Arc::clone(&self.session);
        let full_path = self.full_path(path);
        tokio::task::spawn_blocking(move || {
            let guard = session.lock().unwrap();
            let sftp = guard.sftp().map_err(to_io_err)?;
            let mut file = sftp.open(Path::new(&full_path))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            Ok(buf)
        })
        .await
        .map_err(|err| std::io::Error::other(err.to_string()))?
    }

    async fn download_file_atomic(&self, remote_path: &str, local_path: &Path) -> std::io::Result<()> {
        let session = Arc::clone(&self.session);
        let full_path = self.full_path(remote_path);
        let local_path = local_path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let guard = session.lock().unwrap();
            let sftp = guard.sftp().map_err(to_io_err)?;
            let mut remote_file = sftp.open(Path::new(&full_path))?;
            let mut buf = Vec::new();
            remote_file.read_to_end(&mut buf)?;
            drop(guard);

            let tmp_path = local_path.with_extension("download");
            if let Some(parent) = local_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut tmp_file = std::fs::File::create(&tmp_path)?;
            tmp_file.write_all(&buf)?;
            tmp_file.sync_all()?;
            std::fs::rename(&tmp_path, &local_path)?;
            Ok(())
        })
        .await
        .map_err(|err| std::io::Error::other(err.to_string()))?
    }

    async fn remove_dir_recursive(&self, path: &str) -> std::io::Result<()> {
        let session = Arc::clone(&self.session);
        let full_path = self.full_path(path);
        tokio::task::spawn_blocking(move || remove_dir_recursive_blocking(&session, &full_path))
            .await
            .map_err(|err| std::io::Error::other(err.to_string()))?
    }
}

fn remove_dir_recursive_blocking(session: &Arc<Mutex<Session>>, path: &str) -> std::io::Result<()> {
    let entries = {
        let guard = session.lock().unwrap();
        let sftp = guard.sftp().map_err(to_io_err)?;
        sftp.readdir(Path::new(path))?
    };

    for (entry_path, stat) in entries {
        let entry_str = entry_path.to_string_lossy().into_owned();
        if stat.is_dir() {
            remove_dir_recursive_blocking(session, &entry_str)?;
            let guard = session.lock().unwrap();
            let sftp = guard.sftp().map_err(to_io_err)?;
            sftp.rmdir(Path::new(&entry_str))?;
        } else {
            let guard = session.lock().unwrap();
            let sftp = guard.sftp().map_err(to_io_err)?;
            sftp.unlink(Path::new(&entry_str))?;
        }
    }

    let guard = session.lock().unwrap();
    let sftp = guard.sftp().map_err(to_io_err)?;
    sftp.rmdir(Path::new(path))?;
    Ok(())
}
