// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
//! The application layer: orchestrates the domain's entities and ports into
//! the operations the CLI binary dispatches. Nothing here talks to Postgres,
//! Redis or SFTP directly — it is handed trait objects by `main.rs` and only
//! knows the `preservation-domain` ports.

pub mod admin;
pub mod dip_tool;
pub mod jobs;
pub mod services;
pub mod workflow;
