// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vsync-stepped simulation sessions.
//!
//! A [`Session`] owns a [`Scheduler`] wired to a [`SimulatedHost`] and a
//! [`ManualClock`]. Each [`run_frame`](Session::run_frame) call:
//!
//! 1. reports host work that completed before the next vsync, moving the
//!    clock to each completion time,
//! 2. moves the clock to the vsync,
//! 3. applies the script's one-shot events for this frame (surface loss,
//!    readback, visibility),
//! 4. delivers the begin-frame if the scheduler asked for one,
//! 5. feeds any swap into the pacing tracker.

use cadence_core::scheduler::Scheduler;
use cadence_core::settings::SchedulerSettings;
use cadence_core::time::{Clock, Duration, HostTime, ManualClock};
use cadence_core::trace::{NoopSink, TraceSink};

use crate::host::{HostEvent, HostScript, HostStats, SimulatedHost};
use crate::pacing::{PacingReport, PacingSample, PacingTracker};

/// Number of swap-to-swap deltas a [`Session`] keeps for sparklines.
pub const PACING_HISTORY: usize = 60;

/// What happened during one [`Session::run_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Index of the vsync, counted from zero.
    pub frame: u64,
    /// Vsync timestamp.
    pub vsync_time: HostTime,
    /// A begin-frame was delivered to the scheduler.
    pub begin_frame_delivered: bool,
    /// At least one frame reached the display since the previous vsync.
    pub swapped: bool,
}

/// A scheduler driven by a scripted host on a manual clock.
#[derive(Debug)]
pub struct Session<S: TraceSink = NoopSink> {
    scheduler: Scheduler<SimulatedHost, ManualClock, S>,
    clock: ManualClock,
    interval: Duration,
    next_vsync: HostTime,
    frame: u64,
    pacing: PacingTracker<PACING_HISTORY>,
    last_swap: Option<HostTime>,
}

impl Session {
    /// Creates a session that discards trace events.
    #[must_use]
    pub fn new(settings: SchedulerSettings, script: HostScript) -> Self {
        Self::with_trace_sink(settings, script, NoopSink)
    }
}

impl<S: TraceSink> Session<S> {
    /// Creates a session that reports scheduler activity to `sink`.
    ///
    /// The host starts visible and able to draw, with a commit requested.
    /// The first vsync arrives one interval after time zero.
    #[must_use]
    pub fn with_trace_sink(settings: SchedulerSettings, script: HostScript, sink: S) -> Self {
        let clock = ManualClock::new(HostTime(0));
        let host = SimulatedHost::new(script, clock.clone(), settings.impl_side_painting);
        let mut scheduler = Scheduler::with_trace_sink(host, clock.clone(), settings, sink);
        scheduler.set_can_start();
        scheduler.set_visible(true);
        scheduler.set_can_draw(true);
        scheduler.set_needs_commit();

        let interval = scheduler.settings().begin_frame_interval;
        let interval_ms = interval.micros() as f64 / 1000.0;
        Self {
            scheduler,
            clock,
            interval,
            next_vsync: HostTime(0).saturating_add(interval),
            frame: 0,
            pacing: PacingTracker::new(interval_ms),
            last_swap: None,
        }
    }

    /// Advances the simulation to the next vsync.
    pub fn run_frame(&mut self) -> FrameOutcome {
        let frame = self.frame;
        let vsync_time = self.next_vsync;
        let swaps_before = self.scheduler.client().stats().swaps;

        while let Some((at, event)) = self.scheduler.client_mut().take_due_event(vsync_time) {
            self.advance_clock_to(at);
            match event {
                HostEvent::MainFrameFinished => self.scheduler.finish_commit(),
                HostEvent::MainFrameAborted => self.scheduler.begin_frame_aborted_by_main_thread(),
                HostEvent::OutputSurfaceReady => {
                    self.scheduler.did_create_and_initialize_output_surface();
                }
            }
        }
        self.advance_clock_to(vsync_time);

        let script = *self.scheduler.client().script();
        if script.lose_surface_at_frame == Some(frame) {
            self.scheduler.did_lose_output_surface();
        }
        if script.readback_at_frame == Some(frame) {
            self.scheduler.set_needs_forced_commit();
        }
        if script.hide_at_frame == Some(frame) {
            self.scheduler.set_visible(false);
        }
        if script.show_at_frame == Some(frame) {
            self.scheduler.set_visible(true);
        }

        let begin_frame_delivered = self.scheduler.client().vsync_enabled();
        if begin_frame_delivered {
            self.scheduler.begin_frame(vsync_time);
        }

        let swapped = self.scheduler.client().stats().swaps != swaps_before;
        if swapped {
            self.observe_swap();
        }

        self.frame += 1;
        self.next_vsync = vsync_time.saturating_add(self.interval);
        FrameOutcome {
            frame,
            vsync_time,
            begin_frame_delivered,
            swapped,
        }
    }

    /// Runs `frames` vsyncs and returns the pacing report.
    pub fn run(&mut self, frames: u64) -> PacingReport {
        for _ in 0..frames {
            self.run_frame();
        }
        self.pacing.report()
    }

    fn advance_clock_to(&self, t: HostTime) {
        // Host work may already have pushed the clock past `t`.
        if t > self.clock.now() {
            self.clock.set(t);
        }
    }

    fn observe_swap(&mut self) {
        let Some(swap) = self.scheduler.client().last_swap() else {
            return;
        };
        if let Some(previous) = self.last_swap {
            let delta = swap.saturating_duration_since(previous);
            let late_after = self.interval.saturating_mul(3).micros() / 2;
            self.pacing.observe(PacingSample {
                frame_delta_ms: delta.micros() as f64 / 1000.0,
                missed: delta.micros() > late_after,
            });
        }
        self.last_swap = Some(swap);
    }

    /// Number of vsyncs run so far.
    #[must_use]
    pub fn frames_run(&self) -> u64 {
        self.frame
    }

    /// Pacing report for everything run so far.
    #[must_use]
    pub fn report(&self) -> PacingReport {
        self.pacing.report()
    }

    /// Returns the pacing tracker.
    #[must_use]
    pub fn pacing(&self) -> &PacingTracker<PACING_HISTORY> {
        &self.pacing
    }

    /// Returns the scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler<SimulatedHost, ManualClock, S> {
        &self.scheduler
    }

    /// Returns the scheduler mutably, for injecting extra stimuli.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler<SimulatedHost, ManualClock, S> {
        &mut self.scheduler
    }

    /// Returns the simulated host.
    #[must_use]
    pub fn host(&self) -> &SimulatedHost {
        self.scheduler.client()
    }

    /// Returns the host counters.
    #[must_use]
    pub fn stats(&self) -> &HostStats {
        self.scheduler.client().stats()
    }

    /// Returns the trace sink mutably.
    pub fn trace_sink_mut(&mut self) -> &mut S {
        self.scheduler.trace_sink_mut()
    }
}
