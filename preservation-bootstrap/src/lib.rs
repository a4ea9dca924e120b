// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Enforce zero-panic production code at compile time
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the enterprise application layers
//! (domain, application, infrastructure) and provides everything the
//! `preservation-engine` binary needs before it can construct a
//! composition root:
//!
//! - **Argument parsing** (`cli`) - the full command surface (§6)
//! - **Configuration** (`config`) - the `AppConfig` search-and-load order
//! - **Exit codes** (`exit_code`) - BSD `sysexits.h`-style mapping from
//!   domain/engine errors to process exit status
//! - **Signal handling** (`signals`) - graceful shutdown on SIGTERM/SIGINT/SIGHUP
//!
//! ## Architecture Position
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          BOOTSTRAP (This Crate)              │
//! │  - CLI Parsing                               │
//! │  - Configuration Loading                     │
//! │  - Signal Handling                           │
//! │  - Exit Code Mapping                         │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │       preservation-engine (binary)           │
//! │  - Composition Root (main.rs)                │
//! │  - Application Layer                         │
//! │  - Infrastructure Layer                      │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │           preservation-domain                │
//! │  - Business Logic                            │
//! │  - Domain Services                           │
//! │  - Entities & Value Objects                  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Config loading and logging setup live here so the binary's `main.rs` can
//! stay a thin composition root; everything past the config/CLI boundary
//! only ever takes plain values and connection handles as arguments, never
//! reaches back into this crate.

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod signals;
