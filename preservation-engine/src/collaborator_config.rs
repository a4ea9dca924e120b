// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Connection settings for the three out-of-scope external collaborators
//! (CMS wire client, DPRES SFTP transport, SIP construction tooling).
//! `original_source/src/passari_workflow/config.py`'s `DEFAULT_CONFIG` has
//! no sections for any of these — in the real Passari deployment each is
//! configured by its own separate package. This crate reads them from
//! environment variables instead of inventing `[cms]`/`[dpres]`/`[sip]`
//! sections that spec.md's configuration surface never names.

use crate::error::EngineError;
use crate::infrastructure::adapters::{CmsHttpClient, DpresSftpConfig, SipToolingConfig};
use std::path::PathBuf;

fn require_env(name: &str) -> Result<String, EngineError> {
    std::env::var(name).map_err(|_| EngineError::Config(format!("missing required environment variable {name}")))
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

pub fn cms_http_client() -> Result<CmsHttpClient, EngineError> {
    let base_url = require_env("CMS_API_BASE_URL")?;
    let api_key = require_env("CMS_API_KEY")?;
    Ok(CmsHttpClient::new(base_url, api_key))
}

pub fn dpres_sftp_config() -> Result<DpresSftpConfig, EngineError> {
    let port: u16 = env_or("DPRES_SFTP_PORT", "22")
        .parse()
        .map_err(|_| EngineError::Config("DPRES_SFTP_PORT must be a valid port number".to_string()))?;
    Ok(DpresSftpConfig {
        host: require_env("DPRES_SFTP_HOST")?,
        port,
        username: require_env("DPRES_SFTP_USERNAME")?,
        private_key_path: PathBuf::from(require_env("DPRES_SFTP_PRIVATE_KEY_PATH")?),
        root: env_or("DPRES_SFTP_ROOT", "/"),
    })
}

pub fn sip_tooling_config() -> Result<SipToolingConfig, EngineError> {
    Ok(SipToolingConfig {
        download_object_bin: PathBuf::from(require_env("SIP_DOWNLOAD_OBJECT_BIN")?),
        create_sip_bin: PathBuf::from(require_env("SIP_CREATE_SIP_BIN")?),
        submit_sip_bin: PathBuf::from(require_env("SIP_SUBMIT_SIP_BIN")?),
        confirm_sip_bin: PathBuf::from(require_env("SIP_CONFIRM_SIP_BIN")?),
    })
}
