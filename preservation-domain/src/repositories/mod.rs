// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence ports. Each trait is implemented against Postgres in
//! `preservation-engine`; the domain crate only states the contract.

pub mod attachment_repository;
pub mod object_repository;
pub mod package_repository;
pub mod sync_status_repository;

pub use attachment_repository::AttachmentRepository;
pub use object_repository::ObjectRepository;
pub use package_repository::PackageRepository;
pub use sync_status_repository::SyncStatusRepository;
