// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Infrastructure-level errors: everything that can go wrong talking to
//! Postgres, Redis, SFTP, or an external collaborator process. Domain
//! invariant violations stay in [`preservation_domain::error::DomainError`];
//! this enum wraps that one variant (`Domain`) alongside the I/O-shaped
//! failures the domain crate never needs to know about.

use preservation_domain::error::DomainError;
use preservation_domain::value_objects::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("sftp error: {0}")]
    Sftp(#[from] std::io::Error),

    #[error("object {0} is not eligible for reenqueue: {1}")]
    ReenqueueRefused(ObjectId, String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("lock {0} is already held")]
    LockContended(String),
}
