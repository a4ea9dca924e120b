// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `dip-tool`: a standalone convenience command to search and download
//! already-preserved packages straight from DPRES, independent of the core
//! workflow — grounded in
//! `original_source/src/passari_workflow/scripts/dip_tool.py`, whose own
//! docstring notes it "isn't used in the workflow at the moment". Speaking
//! the DPRES wire protocol is one of spec.md's explicit non-goals for the
//! core, so this talks to it directly with `reqwest` rather than going
//! through a domain port.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum DipToolError {
    #[error("dip-tool request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("writing {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}

pub struct DipToolConfig {
    pub base_url: String,
    pub accept_invalid_certs: bool,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct DisseminationStarted {
    disseminated: String,
}

#[derive(Deserialize)]
struct DisseminationStatus {
    complete: String,
    actions: DisseminationActions,
}

#[derive(Deserialize)]
struct DisseminationActions {
    download: String,
}

#[derive(Deserialize)]
struct SearchResults {
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    id: String,
}

fn client(config: &DipToolConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
}

/// Requests a DIP be assembled from a preserved AIP, polls until ready, and
/// streams it to `output` (defaulting to `<aip_id>.zip` in the current
/// directory, matching the Python script's default).
pub async fn download(config: &DipToolConfig, aip_id: &str, output: Option<PathBuf>) -> Result<PathBuf, DipToolError> {
    let http = client(config)?;
    let output = output.unwrap_or_else(|| PathBuf::from(format!("{aip_id}.zip")));

    let start: Envelope<DisseminationStarted> = http
        .post(format!("{}/preserved/{}/disseminate", config.base_url, aip_id))
        .query(&[("format", "zip")])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let poll_url = format!("{}{}", config.base_url, start.data.disseminated);
    let download_url = loop {
        let status: Envelope<DisseminationStatus> = http.get(&poll_url).send().await?.error_for_status()?.json().await?;
        if status.data.complete == "true" {
            break format!("{}{}", config.base_url, status.data.actions.download);
        }
        tokio::time::sleep(Duration::from_secs(3)).await;
    };

    let mut response = http.get(&download_url).send().await?.error_for_status()?;
    let mut file = tokio::fs::File::create(&output)
        .await
        .map_err(|source| DipToolError::Write { path: output.clone(), source })?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk)
            .await
            .map_err(|source| DipToolError::Write { path: output.clone(), source })?;
    }

    Ok(output)
}

/// Lists/searches preserved packages.
pub async fn list_pkgs(config: &DipToolConfig, page: u32, limit: u32, query: Option<&str>) -> Result<Vec<String>, DipToolError> {
    let http = client(config)?;
    let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
    if let Some(q) = query {
        params.push(("q", q.to_string()));
    }

    let response: Envelope<SearchResults> = http
        .get(format!("{}/search", config.base_url))
        .query(&params)
        .timeout(Duration::from_secs(10))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(response.data.results.into_iter().map(|r| r.id).collect())
}
