// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `create-pas-db` schema, executed once by
//! [`crate::application::admin::create_database`]. Kept as a single SQL
//! script rather than a migrations directory — the teacher's `sqlite`
//! adapter embeds its schema the same way (see
//! `sqlite_pipeline_repository_adapter.rs`'s module doc).

pub const SCHEMA: &str = r#"
CREATE EXTENSION IF NOT EXISTS pg_trgm;

CREATE TABLE IF NOT EXISTS objects (
    id                       BIGINT PRIMARY KEY,
    title                    TEXT NOT NULL,
    preserved                BOOLEAN NOT NULL DEFAULT FALSE,
    frozen                   BOOLEAN NOT NULL DEFAULT FALSE,
    freeze_reason            TEXT,
    freeze_source            TEXT,
    created_date             TIMESTAMPTZ,
    modified_date            TIMESTAMPTZ,
    metadata_hash            TEXT,
    attachment_metadata_hash TEXT,
    latest_package_id        BIGINT
);

CREATE INDEX IF NOT EXISTS objects_latest_package_id_idx ON objects (latest_package_id);
CREATE INDEX IF NOT EXISTS objects_frozen_idx ON objects (frozen);
CREATE INDEX IF NOT EXISTS objects_title_trgm_idx ON objects USING GIN (title gin_trgm_ops);
CREATE INDEX IF NOT EXISTS objects_freeze_reason_trgm_idx ON objects USING GIN (freeze_reason gin_trgm_ops);

CREATE TABLE IF NOT EXISTS attachments (
    id            BIGINT PRIMARY KEY,
    filename      TEXT NOT NULL DEFAULT '',
    created_date  TIMESTAMPTZ,
    modified_date TIMESTAMPTZ,
    metadata_hash TEXT
);

CREATE TABLE IF NOT EXISTS object_attachment_links (
    object_id     BIGINT NOT NULL REFERENCES objects(id),
    attachment_id BIGINT NOT NULL REFERENCES attachments(id),
    PRIMARY KEY (object_id, attachment_id)
);

CREATE TABLE IF NOT EXISTS packages (
    id                       BIGSERIAL PRIMARY KEY,
    object_id                BIGINT NOT NULL REFERENCES objects(id),
    sip_filename             TEXT NOT NULL,
    sip_id                   TEXT NOT NULL,
    downloaded               BOOLEAN NOT NULL DEFAULT FALSE,
    packaged                 BOOLEAN NOT NULL DEFAULT FALSE,
    uploaded                 BOOLEAN NOT NULL DEFAULT FALSE,
    rejected                 BOOLEAN NOT NULL DEFAULT FALSE,
    preserved                BOOLEAN NOT NULL DEFAULT FALSE,
    cancelled                BOOLEAN NOT NULL DEFAULT FALSE,
    object_modified_date     TIMESTAMPTZ,
    created_date             TIMESTAMPTZ NOT NULL,
    metadata_hash            TEXT,
    attachment_metadata_hash TEXT,
    UNIQUE (sip_filename)
);

CREATE INDEX IF NOT EXISTS packages_object_id_idx ON packages (object_id, created_date DESC);
CREATE INDEX IF NOT EXISTS packages_created_date_idx ON packages (created_date);
CREATE INDEX IF NOT EXISTS packages_sip_filename_trgm_idx ON packages USING GIN (sip_filename gin_trgm_ops);

CREATE TABLE IF NOT EXISTS package_attachment_links (
    package_id    BIGINT NOT NULL REFERENCES packages(id),
    attachment_id BIGINT NOT NULL REFERENCES attachments(id),
    PRIMARY KEY (package_id, attachment_id)
);

CREATE TABLE IF NOT EXISTS sync_status (
    name                  TEXT PRIMARY KEY,
    start_sync_date       TIMESTAMPTZ,
    prev_start_sync_date  TIMESTAMPTZ,
    "offset"              BIGINT NOT NULL DEFAULT 0
);
"#;
