// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A scripted compositor host.
//!
//! [`SimulatedHost`] implements [`SchedulerClient`] without any real threads
//! or GPU. A [`HostScript`] decides how long the main thread takes, which
//! draws checkerboard, and when the output surface goes away. Work that
//! completes later (a main-thread frame, a new output surface) is queued as a
//! due time and handed to the [`Session`](crate::session::Session) driver,
//! which reports it back to the scheduler once the clock gets there.

use cadence_core::client::{DrawAndSwapResult, SchedulerClient, SchedulerInputs};
use cadence_core::time::{Clock, Duration, HostTime, ManualClock};

/// Behavior of a [`SimulatedHost`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HostScript {
    /// Time from a begin-frame sent to the main thread until it finishes or
    /// aborts.
    pub main_thread_latency: Duration,
    /// Clock time consumed by each commit.
    pub commit_cost: Duration,
    /// Clock time consumed by each draw.
    pub draw_cost: Duration,
    /// Time from requesting an output surface until it is ready.
    pub surface_creation_latency: Duration,
    /// Every commit requests another one, like a running animation.
    pub continuous_commits: bool,
    /// Every n-th main-thread frame is aborted.
    pub abort_every: Option<u32>,
    /// Every n-th `DrawIfPossible` fails with missing tiles.
    pub checkerboard_every: Option<u32>,
    /// Every n-th successful `DrawIfPossible` swaps incomplete tiles.
    pub incomplete_tile_every: Option<u32>,
    /// Frame at which the output surface is lost.
    pub lose_surface_at_frame: Option<u64>,
    /// Frame at which a synchronous readback forces a commit.
    pub readback_at_frame: Option<u64>,
    /// Frame at which the host becomes invisible.
    pub hide_at_frame: Option<u64>,
    /// Frame at which the host becomes visible again.
    pub show_at_frame: Option<u64>,
}

impl HostScript {
    /// A well-behaved animating host: 4 ms main thread, 2 ms draws.
    #[must_use]
    pub const fn animating() -> Self {
        Self {
            main_thread_latency: Duration::from_millis(4),
            commit_cost: Duration::from_micros(500),
            draw_cost: Duration::from_millis(2),
            surface_creation_latency: Duration::from_millis(1),
            continuous_commits: true,
            abort_every: None,
            checkerboard_every: None,
            incomplete_tile_every: None,
            lose_surface_at_frame: None,
            readback_at_frame: None,
            hide_at_frame: None,
            show_at_frame: None,
        }
    }
}

impl Default for HostScript {
    fn default() -> Self {
        Self::animating()
    }
}

/// Counters kept by a [`SimulatedHost`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostStats {
    /// Begin-frames sent to the main thread.
    pub main_frames: u32,
    /// Main-thread frames aborted.
    pub main_frames_aborted: u32,
    /// Commits performed.
    pub commits: u32,
    /// Completed tile upload checks.
    pub tile_checks: u32,
    /// Pending trees activated.
    pub activations: u32,
    /// `DrawIfPossible` attempts.
    pub draws_attempted: u32,
    /// `DrawIfPossible` attempts that failed.
    pub draws_failed: u32,
    /// Forced draws.
    pub forced_draws: u32,
    /// Frames swapped to the display.
    pub swaps: u32,
    /// Output surfaces requested.
    pub surfaces_requested: u32,
    /// Layer texture hand-offs to the main thread.
    pub texture_acquisitions: u32,
    /// Vsync subscription changes.
    pub vsync_toggles: u32,
}

/// Completed host-side work the driver reports to the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// The main thread finished its frame.
    MainFrameFinished,
    /// The main thread declined its frame.
    MainFrameAborted,
    /// The requested output surface is ready.
    OutputSurfaceReady,
}

/// A [`SchedulerClient`] driven by a [`HostScript`].
#[derive(Debug)]
pub struct SimulatedHost {
    script: HostScript,
    impl_side_painting: bool,
    clock: ManualClock,
    vsync_enabled: bool,
    main_frame_due: Option<HostTime>,
    surface_due: Option<HostTime>,
    successful_draws: u32,
    last_swap: Option<HostTime>,
    anticipated_draw_time: Option<HostTime>,
    stats: HostStats,
}

impl SimulatedHost {
    /// Creates a host that advances `clock` as it works.
    ///
    /// With `impl_side_painting`, commits produce a pending tree that is
    /// activated before drawing.
    #[must_use]
    pub fn new(script: HostScript, clock: ManualClock, impl_side_painting: bool) -> Self {
        Self {
            script,
            impl_side_painting,
            clock,
            vsync_enabled: false,
            main_frame_due: None,
            surface_due: None,
            successful_draws: 0,
            last_swap: None,
            anticipated_draw_time: None,
            stats: HostStats::default(),
        }
    }

    /// Returns the script.
    #[must_use]
    pub fn script(&self) -> &HostScript {
        &self.script
    }

    /// Returns the counters.
    #[must_use]
    pub fn stats(&self) -> &HostStats {
        &self.stats
    }

    /// Whether the scheduler currently wants vsync callbacks.
    #[must_use]
    pub fn vsync_enabled(&self) -> bool {
        self.vsync_enabled
    }

    /// Clock time of the latest swap.
    #[must_use]
    pub fn last_swap(&self) -> Option<HostTime> {
        self.last_swap
    }

    /// The latest draw-time prediction from the scheduler.
    #[must_use]
    pub fn anticipated_draw_time(&self) -> Option<HostTime> {
        self.anticipated_draw_time
    }

    /// Removes and returns the earliest host event due at or before `until`.
    pub fn take_due_event(&mut self, until: HostTime) -> Option<(HostTime, HostEvent)> {
        let surface = self.surface_due.filter(|t| *t <= until);
        let main = self.main_frame_due.filter(|t| *t <= until);
        match (surface, main) {
            (Some(s), Some(m)) if m < s => Some((m, self.finish_main_frame())),
            (Some(s), _) => {
                self.surface_due = None;
                Some((s, HostEvent::OutputSurfaceReady))
            }
            (None, Some(m)) => Some((m, self.finish_main_frame())),
            (None, None) => None,
        }
    }

    fn finish_main_frame(&mut self) -> HostEvent {
        self.main_frame_due = None;
        if every(self.script.abort_every, self.stats.main_frames) {
            self.stats.main_frames_aborted += 1;
            HostEvent::MainFrameAborted
        } else {
            HostEvent::MainFrameFinished
        }
    }

    fn spend(&self, cost: Duration) {
        self.clock.advance(cost);
    }

    fn swapped(&mut self) -> DrawAndSwapResult {
        self.stats.swaps += 1;
        self.last_swap = Some(self.clock.now());
        DrawAndSwapResult::SWAPPED
    }
}

/// Whether the `count`-th occurrence hits an every-n pattern.
fn every(n: Option<u32>, count: u32) -> bool {
    n.is_some_and(|n| n > 0 && count % n == 0)
}

impl SchedulerClient for SimulatedHost {
    fn set_needs_begin_frame_on_impl_thread(&mut self, enable: bool) {
        self.stats.vsync_toggles += 1;
        self.vsync_enabled = enable;
    }

    fn scheduled_action_send_begin_frame_to_main_thread(
        &mut self,
        _: &mut SchedulerInputs<'_>,
    ) {
        debug_assert!(
            self.main_frame_due.is_none(),
            "main thread asked for a frame while one is in flight"
        );
        self.stats.main_frames += 1;
        self.main_frame_due = Some(
            self.clock
                .now()
                .saturating_add(self.script.main_thread_latency),
        );
    }

    fn scheduled_action_commit(&mut self, inputs: &mut SchedulerInputs<'_>) {
        self.stats.commits += 1;
        self.spend(self.script.commit_cost);
        if self.impl_side_painting {
            inputs.set_has_pending_tree(true);
        }
        if self.script.continuous_commits {
            inputs.set_needs_commit();
        }
    }

    fn scheduled_action_check_for_completed_tile_uploads(
        &mut self,
        _: &mut SchedulerInputs<'_>,
    ) {
        self.stats.tile_checks += 1;
    }

    fn scheduled_action_activate_pending_tree_if_needed(
        &mut self,
        inputs: &mut SchedulerInputs<'_>,
    ) {
        self.stats.activations += 1;
        inputs.set_has_pending_tree(false);
        inputs.set_needs_redraw();
    }

    fn scheduled_action_draw_and_swap_if_possible(
        &mut self,
        inputs: &mut SchedulerInputs<'_>,
    ) -> DrawAndSwapResult {
        self.stats.draws_attempted += 1;
        self.spend(self.script.draw_cost);
        if every(self.script.checkerboard_every, self.stats.draws_attempted) {
            self.stats.draws_failed += 1;
            return DrawAndSwapResult::ABORTED;
        }
        self.successful_draws += 1;
        if every(self.script.incomplete_tile_every, self.successful_draws) {
            inputs.did_swap_use_incomplete_tile();
        }
        self.swapped()
    }

    fn scheduled_action_draw_and_swap_forced(
        &mut self,
        _: &mut SchedulerInputs<'_>,
    ) -> DrawAndSwapResult {
        self.stats.forced_draws += 1;
        self.spend(self.script.draw_cost);
        self.swapped()
    }

    fn scheduled_action_begin_output_surface_creation(
        &mut self,
        _: &mut SchedulerInputs<'_>,
    ) {
        self.stats.surfaces_requested += 1;
        self.surface_due = Some(
            self.clock
                .now()
                .saturating_add(self.script.surface_creation_latency),
        );
    }

    fn scheduled_action_acquire_layer_textures_for_main_thread(
        &mut self,
        _: &mut SchedulerInputs<'_>,
    ) {
        self.stats.texture_acquisitions += 1;
    }

    fn did_anticipated_draw_time_change(&mut self, time: HostTime) {
        self.anticipated_draw_time = Some(time);
    }
}
