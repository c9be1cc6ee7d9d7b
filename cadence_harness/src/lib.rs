// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic simulation harness for the cadence scheduler.
//!
//! - [`host`]: a [`SchedulerClient`](cadence_core::client::SchedulerClient)
//!   whose main thread, draws, and output surface follow a [`HostScript`].
//! - [`session`]: drives a scheduler and a simulated host with a manual clock,
//!   one vsync at a time.
//! - [`pacing`]: swap-to-swap pacing metrics and grading.
//!
//! Everything runs on a [`ManualClock`](cadence_core::time::ManualClock), so a
//! session with the same script always produces the same trace.

#![no_std]

extern crate alloc;

pub mod host;
pub mod pacing;
pub mod session;

pub use host::{HostEvent, HostScript, HostStats, SimulatedHost};
pub use pacing::{PacingGrade, PacingReport, PacingSample, PacingTracker};
pub use session::{FrameOutcome, Session};
