// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vsync-driven frame scheduling for a threaded compositor.
//!
//! `cadence_core` decides *when* a compositor produces, commits, and swaps
//! frames. A main thread (layout, paint) and an impl thread (raster, draw)
//! cooperate; the scheduler lives on the impl thread and reaches the main
//! thread only through its client. It is `no_std` compatible (with `alloc`)
//! and performs no I/O.
//!
//! # Architecture
//!
//! ```text
//!   host stimuli (set_needs_commit, finish_commit, ...)
//!       │
//!       ▼
//!   Scheduler ──► SchedulerStateMachine::next_action() ──► Action
//!       ▲                                                   │
//!       │                  ┌────────────────────────────────┘
//!       │                  ▼
//!   begin_frame(t)    SchedulerClient::scheduled_action_*()
//!       ▲                  │
//!       │                  ▼
//!   vsync source ◄── set_needs_begin_frame_on_impl_thread()
//! ```
//!
//! **[`state_machine`]**: The pure decision procedure: demand flags, commit
//! phase, output surface lifecycle, texture lock, and the fixed action
//! priority.
//!
//! **[`scheduler`]**: The drive loop: forwards stimuli, drains actions,
//! manages the vsync subscription, and predicts the next draw time.
//!
//! **[`client`]**: The [`SchedulerClient`](client::SchedulerClient) trait
//! hosts implement, and the [`SchedulerInputs`](client::SchedulerInputs)
//! handle through which actions report state changes.
//!
//! **[`settings`]**: Capability flags and presets.
//!
//! **[`time`]**: Microsecond [`HostTime`](time::HostTime) and
//! [`Duration`](time::Duration), and the [`Clock`](time::Clock) trait.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! scheduler instrumentation.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables
//!   [`MonotonicClock`](time::MonotonicClock).
//! - `serde` (disabled by default): Derives `Serialize`/`Deserialize` for
//!   [`SchedulerSettings`](settings::SchedulerSettings) and
//!   [`Duration`](time::Duration).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod client;
pub mod scheduler;
pub mod settings;
pub mod state_machine;
pub mod time;
pub mod trace;
