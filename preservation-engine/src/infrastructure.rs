// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete implementations of the domain's ports: Postgres repositories
//! (`db`), the Redis-backed queue/lock/heartbeat layer (`queue`), and the
//! external-collaborator adapters (`adapters`). Config loading and logging
//! setup both live in `preservation-bootstrap` — this crate only emits
//! spans through `tracing` and takes connection strings as plain
//! arguments, it never reads a config file or configures a subscriber
//! itself.

pub mod adapters;
pub mod db;
pub mod queue;
