// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! tq-core: Build ID versioning rules for task queues

pub mod apply;
pub mod client;
pub mod clock;
pub mod error;
pub mod operation;
pub mod rules;
pub mod token;
pub mod traced;
pub mod view;

pub use apply::{apply, ApplyContext, RuleLimits};
pub use client::RulesClient;
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::RulesError;
pub use operation::{Operation, PreviewKind};
pub use rules::{
    AssignmentRule, Ramp, RedirectRule, RuleSet, TimestampedAssignmentRule,
    TimestampedRedirectRule, VersioningRules,
};
pub use token::ConflictToken;
pub use traced::TracedRulesClient;
pub use view::{AssignmentRow, RedirectRow, RulesView};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
#[cfg(any(test, feature = "test-support"))]
pub use test_support::{FakeRulesClient, RulesCall};
