// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain error types.
//!
//! Errors here describe violations of domain invariants and collaborator
//! contract failures. They carry no knowledge of Postgres, Redis, or SFTP;
//! infrastructure-specific failures are mapped onto these variants at the
//! adapter boundary in `preservation-engine`.

mod preservation_error;

pub use preservation_error::DomainError;
