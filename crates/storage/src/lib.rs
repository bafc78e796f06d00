// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Local file-backed rules store for tq

mod config;
mod state;
mod store;

pub use config::StoreConfig;
pub use state::{PollerRecord, QueueState};
pub use store::{LocalRulesStore, StoreError};
