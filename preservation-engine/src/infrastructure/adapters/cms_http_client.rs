// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! HTTP-backed `CmsClient` (spec.md's "CMS HTTP API client", deliberately
//! out of scope). The CMS's own paging/query contract is not specified, so
//! this adapter assumes the conventional shape the teacher uses for its own
//! REST collaborators: offset/limit query params, an opaque bearer token,
//! and a JSON array response with a trailing `has_more` flag.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use preservation_domain::error::DomainError;
use preservation_domain::services::{CmsAttachmentRecord, CmsClient, CmsObjectRecord, Page};
use preservation_domain::value_objects::{AttachmentId, ObjectId};
use reqwest::Client;
use serde::Deserialize;

pub struct CmsHttpClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl CmsHttpClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn map_err(err: reqwest::Error) -> DomainError {
        DomainError::Internal(format!("cms request failed: {err}"))
    }
}

#[derive(Deserialize)]
struct ObjectsResponse {
    records: Vec<ObjectWire>,
    has_more: bool,
}

#[derive(Deserialize)]
struct ObjectWire {
    id: i64,
    title: String,
    created_date: Option<DateTime<Utc>>,
    modified_date: Option<DateTime<Utc>>,
    metadata_hash: Option<String>,
    attachment_ids: Vec<i64>,
}

#[derive(Deserialize)]
struct AttachmentsResponse {
    records: Vec<AttachmentWire>,
    has_more: bool,
}

#[derive(Deserialize)]
struct AttachmentWire {
    id: i64,
    filename: String,
    created_date: Option<DateTime<Utc>>,
    modified_date: Option<DateTime<Utc>>,
    metadata_hash: Option<String>,
    object_ids: Vec<i64>,
}

#[async_trait]
impl CmsClient for CmsHttpClient {
    async fn fetch_objects_page(
        &self,
        offset: i64,
        modified_since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Page<CmsObjectRecord>, DomainError> {
        let mut request = self
            .http
            .get(format!("{}/objects", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&[("offset", offset), ("limit", limit)]);
        if let Some(since) = modified_since {
            request = request.query(&[("modified_since", since.to_rfc3339())]);
        }
        let body: ObjectsResponse = request.send().await.map_err(Self::map_err)?.error_for_status().map_err(Self::map_err)?.json().await.map_err(Self::map_err)?;

        let exhausted = !body.has_more;
        let records = body
            .records
            .into_iter()
            .map(|w| CmsObjectRecord {
                id: ObjectId::new(w.id),
                title: w.title,
                created_date: w.created_date,
                modified_date: w.modified_date,
                metadata_hash: w.metadata_hash,
                attachment_ids: w.attachment_ids.into_iter().map(AttachmentId::new).collect(),
            })
            .collect();
        Ok(Page { records, exhausted })
    }

    async fn fetch_attachments_page(
        &self,
        offset: i64,
        modified_since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Page<CmsAttachmentRecord>, DomainError> {
        let mut request = self
            .http
            .get(format!("{}/attachments", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&[("offset", offset), ("limit", limit)]);
        if let Some(since) = modified_since {
            request = request.query(&[("modified_since", since.to_rfc3339())]);
        }
        let body: AttachmentsResponse = request.send().await.map_err(Self::map_err)?.error_for_status().map_err(Self::map_err)?.json().await.map_err(Self::map_err)?;

        let exhausted = !body.has_more;
        let records = body
            .records
            .into_iter()
            .map(|w| CmsAttachmentRecord {
                id: AttachmentId::new(w.id),
                filename: w.filename,
                created_date: w.created_date,
                modified_date: w.modified_date,
                metadata_hash: w.metadata_hash,
                object_ids: w.object_ids.into_iter().map(ObjectId::new).collect(),
            })
            .collect();
        Ok(Page { records, exhausted })
    }
}
