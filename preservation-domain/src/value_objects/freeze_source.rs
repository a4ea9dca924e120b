// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who froze an Object. An Object with `frozen = true` always has this set:
/// `User` for administrative freezes, `Automatic` for the failure-path
/// freeze a stage job performs on a `PreservationFailed` collaborator error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreezeSource {
    User,
    Automatic,
}

impl fmt::Display for FreezeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Automatic => write!(f, "automatic"),
        }
    }
}

impl FreezeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Automatic => "automatic",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "automatic" => Some(Self::Automatic),
            _ => None,
        }
    }
}
