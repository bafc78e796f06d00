// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque version stamp for optimistic concurrency on rule updates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version stamp issued by the service with every rule set.
///
/// Clients pass it back unexamined on the next update; the bytes are never
/// parsed or constructed client side.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictToken(Vec<u8>);

impl ConflictToken {
    /// Wrap service-issued bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ConflictToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConflictToken({} bytes)", self.0.len())
    }
}
