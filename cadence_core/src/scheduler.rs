// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The vsync-driven drive loop.
//!
//! The [`Scheduler`] owns a [`SchedulerStateMachine`] and a
//! [`SchedulerClient`]. Every stimulus it receives is forwarded to the state
//! machine, after which the scheduler drains actions until the machine
//! settles, dispatching each to the client. It then decides whether vsync
//! callbacks are still needed and tells the client when it expects to draw
//! next.
//!
//! ```text
//!   stimulus ──► state machine ──► next_action ──► client
//!                     ▲                              │
//!                     └──── SchedulerInputs ◄────────┘
//! ```

use core::fmt;

use crate::client::{DrawAndSwapResult, SchedulerClient, SchedulerInputs};
use crate::settings::SchedulerSettings;
use crate::state_machine::{Action, SchedulerStateMachine};
use crate::time::{Clock, Duration, HostTime};
use crate::trace::{
    ActionEvent, BeginFrameEvent, DrawEvent, FrameSummaryBuilder, NeedsBeginFrameEvent, NoopSink,
    Stimulus, StimulusEvent, TraceSink,
};

/// Frame scheduler for one compositor instance.
///
/// # Vsync subscription
///
/// Enabling vsync callbacks is sent to the client immediately. Disabling is
/// deferred until the next [`begin_frame`](Self::begin_frame), so a brief
/// idle gap does not toggle the platform source, unless
/// [`using_synchronous_renderer_compositor`] is set. The client is only told
/// when the value changes, except inside a begin-frame that did not swap,
/// where the scheduler asks for the next begin-frame again.
///
/// # Contract
///
/// One begin-frame at a time: delivering a begin-frame while the previous
/// one is still pending is a contract violation and panics in debug builds.
///
/// Dropping the scheduler disables vsync callbacks.
///
/// [`using_synchronous_renderer_compositor`]: SchedulerSettings::using_synchronous_renderer_compositor
pub struct Scheduler<C: SchedulerClient, K: Clock, S: TraceSink = NoopSink> {
    settings: SchedulerSettings,
    client: C,
    clock: K,
    sink: S,
    state_machine: SchedulerStateMachine,
    last_set_needs_begin_frame: bool,
    has_pending_begin_frame: bool,
    last_begin_frame_time: HostTime,
    interval: Duration,
    frame_summary: Option<FrameSummaryBuilder>,
}

impl<C: SchedulerClient, K: Clock, S: TraceSink> fmt::Debug for Scheduler<C, K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("settings", &self.settings)
            .field("state_machine", &self.state_machine)
            .field("last_set_needs_begin_frame", &self.last_set_needs_begin_frame)
            .field("has_pending_begin_frame", &self.has_pending_begin_frame)
            .field("last_begin_frame_time", &self.last_begin_frame_time)
            .finish_non_exhaustive()
    }
}

impl<C: SchedulerClient, K: Clock> Scheduler<C, K> {
    /// Creates a scheduler that discards trace events.
    #[must_use]
    pub fn new(client: C, clock: K, settings: SchedulerSettings) -> Self {
        Self::with_trace_sink(client, clock, settings, NoopSink)
    }
}

impl<C: SchedulerClient, K: Clock, S: TraceSink> Scheduler<C, K, S> {
    /// Creates a scheduler that reports to `sink`.
    ///
    /// A zero `begin_frame_interval` is replaced with
    /// [`SchedulerSettings::DEFAULT_BEGIN_FRAME_INTERVAL`].
    #[must_use]
    pub fn with_trace_sink(client: C, clock: K, mut settings: SchedulerSettings, sink: S) -> Self {
        if settings.begin_frame_interval.is_zero() {
            settings.begin_frame_interval = SchedulerSettings::DEFAULT_BEGIN_FRAME_INTERVAL;
        }
        let state_machine = SchedulerStateMachine::new(settings);
        debug_assert!(
            !state_machine.begin_frame_needed_by_impl_thread(),
            "a fresh state machine must not need begin-frames"
        );
        Self {
            settings,
            client,
            clock,
            sink,
            state_machine,
            last_set_needs_begin_frame: false,
            has_pending_begin_frame: false,
            last_begin_frame_time: HostTime::default(),
            interval: settings.begin_frame_interval,
            frame_summary: None,
        }
    }

    // -- stimuli -----------------------------------------------------------

    /// Allows output surface creation to start.
    pub fn set_can_start(&mut self) {
        self.state_machine.set_can_start();
        self.process_scheduled_actions();
    }

    /// Sets visibility.
    pub fn set_visible(&mut self, visible: bool) {
        self.state_machine.set_visible(visible);
        self.process_scheduled_actions();
    }

    /// Sets whether the host can draw at all.
    pub fn set_can_draw(&mut self, can_draw: bool) {
        self.state_machine.set_can_draw(can_draw);
        self.process_scheduled_actions();
    }

    /// Sets whether a committed tree awaits activation.
    pub fn set_has_pending_tree(&mut self, has_pending_tree: bool) {
        self.state_machine.set_has_pending_tree(has_pending_tree);
        self.process_scheduled_actions();
    }

    /// Requests a main-thread frame and commit.
    pub fn set_needs_commit(&mut self) {
        self.state_machine.set_needs_commit();
        self.process_scheduled_actions();
    }

    /// Requests a commit that ignores visibility, followed by a forced draw.
    pub fn set_needs_forced_commit(&mut self) {
        self.state_machine.set_needs_commit();
        self.state_machine.set_needs_forced_commit();
        self.process_scheduled_actions();
    }

    /// Requests a draw on the next frame.
    pub fn set_needs_redraw(&mut self) {
        self.state_machine.set_needs_redraw();
        self.process_scheduled_actions();
    }

    /// The last swap showed incomplete tiles.
    pub fn did_swap_use_incomplete_tile(&mut self) {
        self.state_machine.did_swap_use_incomplete_tile();
        self.process_scheduled_actions();
    }

    /// Requests a draw that ignores visibility and readiness.
    pub fn set_needs_forced_redraw(&mut self) {
        self.state_machine.set_needs_forced_redraw();
        self.process_scheduled_actions();
    }

    /// The main thread wants the layer texture lock.
    pub fn set_main_thread_needs_layer_textures(&mut self) {
        self.state_machine.set_main_thread_needs_layer_textures();
        self.process_scheduled_actions();
    }

    /// The main thread finished the frame it was sent.
    pub fn finish_commit(&mut self) {
        self.stimulus(Stimulus::FinishCommit);
        self.state_machine.finish_commit();
        self.process_scheduled_actions();
    }

    /// The main thread declined the frame it was sent.
    pub fn begin_frame_aborted_by_main_thread(&mut self) {
        self.stimulus(Stimulus::BeginFrameAborted);
        self.state_machine.begin_frame_aborted_by_main_thread();
        self.process_scheduled_actions();
    }

    /// The output surface is gone.
    pub fn did_lose_output_surface(&mut self) {
        self.stimulus(Stimulus::OutputSurfaceLost);
        self.state_machine.did_lose_output_surface();
        self.process_scheduled_actions();
    }

    /// A requested output surface is ready.
    ///
    /// Begin-frame bookkeeping starts over: the new surface has no vsync
    /// subscription yet.
    pub fn did_create_and_initialize_output_surface(&mut self) {
        self.stimulus(Stimulus::OutputSurfaceCreated);
        self.state_machine.did_create_and_initialize_output_surface();
        self.has_pending_begin_frame = false;
        self.last_set_needs_begin_frame = false;
        self.process_scheduled_actions();
    }

    /// Delivers a vsync begin-frame with its timestamp.
    ///
    /// # Panics
    ///
    /// In debug builds, if the previous begin-frame is still pending.
    pub fn begin_frame(&mut self, frame_time: HostTime) {
        debug_assert!(
            !self.has_pending_begin_frame,
            "begin-frame delivered while the previous begin-frame is still pending"
        );
        self.has_pending_begin_frame = true;
        self.last_begin_frame_time = frame_time;

        let begin = BeginFrameEvent {
            frame_number: self.state_machine.current_frame_number(),
            frame_time,
        };
        self.sink.on_begin_frame(&begin);
        self.frame_summary = Some(FrameSummaryBuilder::new(&begin));

        self.state_machine.did_enter_begin_frame();
        self.state_machine.set_frame_time(frame_time);
        self.process_scheduled_actions();
        self.state_machine.did_leave_begin_frame();

        if let Some(builder) = self.frame_summary.take() {
            let summary =
                builder.finish(self.last_set_needs_begin_frame, self.anticipated_draw_time());
            self.sink.on_frame_summary(&summary);
        }
    }

    // -- drive loop --------------------------------------------------------

    /// Dispatches actions until the state machine settles, then updates the
    /// vsync subscription and the anticipated draw time.
    ///
    /// Every stimulus already ends with this call; running it again without a
    /// new stimulus dispatches nothing.
    pub fn process_scheduled_actions(&mut self) {
        while let Some(action) = self.state_machine.next_action() {
            self.state_machine.update_state(action);
            self.dispatch(action);
        }
        self.setup_next_begin_frame_if_needed();
        let anticipated = self.anticipated_draw_time();
        self.client.did_anticipated_draw_time_change(anticipated);
    }

    fn dispatch(&mut self, action: Action) {
        self.sink.on_action(&ActionEvent {
            frame_number: self.state_machine.current_frame_number(),
            action,
            timestamp: self.clock.now(),
            inside_begin_frame: self.state_machine.inside_begin_frame(),
        });
        if let Some(builder) = &mut self.frame_summary {
            builder.action(action);
        }

        let mut inputs = SchedulerInputs::new(&mut self.state_machine);
        match action {
            Action::SendBeginFrameToMainThread => self
                .client
                .scheduled_action_send_begin_frame_to_main_thread(&mut inputs),
            Action::Commit => self.client.scheduled_action_commit(&mut inputs),
            Action::CheckForCompletedTileUploads => self
                .client
                .scheduled_action_check_for_completed_tile_uploads(&mut inputs),
            Action::ActivatePendingTreeIfNeeded => self
                .client
                .scheduled_action_activate_pending_tree_if_needed(&mut inputs),
            Action::DrawIfPossible => {
                let result = self
                    .client
                    .scheduled_action_draw_and_swap_if_possible(&mut inputs);
                self.state_machine
                    .did_draw_if_possible_completed(result.did_draw);
                self.did_draw_and_swap(false, result);
            }
            Action::DrawForced => {
                let result = self.client.scheduled_action_draw_and_swap_forced(&mut inputs);
                self.did_draw_and_swap(true, result);
            }
            Action::BeginOutputSurfaceCreation => self
                .client
                .scheduled_action_begin_output_surface_creation(&mut inputs),
            Action::AcquireLayerTexturesForMainThread => self
                .client
                .scheduled_action_acquire_layer_textures_for_main_thread(&mut inputs),
        }
    }

    fn did_draw_and_swap(&mut self, forced: bool, result: DrawAndSwapResult) {
        // A swap uses up the begin-frame it was drawn in.
        if result.did_swap {
            self.has_pending_begin_frame = false;
        }
        self.sink.on_draw(&DrawEvent {
            frame_number: self.state_machine.current_frame_number(),
            forced,
            did_draw: result.did_draw,
            did_swap: result.did_swap,
            timestamp: self.clock.now(),
        });
        if let Some(builder) = &mut self.frame_summary {
            builder.draw(result.did_swap);
        }
    }

    fn setup_next_begin_frame_if_needed(&mut self) {
        let needs_begin_frame = self.state_machine.begin_frame_needed_by_impl_thread();
        let inside_begin_frame = self.state_machine.inside_begin_frame();
        if (needs_begin_frame
            || inside_begin_frame
            || self.settings.using_synchronous_renderer_compositor)
            && needs_begin_frame != self.last_set_needs_begin_frame
        {
            self.set_needs_begin_frame(needs_begin_frame);
        }

        // A begin-frame that did not swap gives its slot back.
        if inside_begin_frame && self.has_pending_begin_frame {
            self.has_pending_begin_frame = false;
            if needs_begin_frame {
                self.set_needs_begin_frame(true);
            }
        }
    }

    fn set_needs_begin_frame(&mut self, enabled: bool) {
        self.client.set_needs_begin_frame_on_impl_thread(enabled);
        self.last_set_needs_begin_frame = enabled;
        self.sink.on_needs_begin_frame(&NeedsBeginFrameEvent {
            enabled,
            timestamp: self.clock.now(),
        });
    }

    fn stimulus(&mut self, stimulus: Stimulus) {
        self.sink.on_stimulus(&StimulusEvent {
            stimulus,
            timestamp: self.clock.now(),
        });
    }

    // -- queries -----------------------------------------------------------

    /// The next vsync boundary strictly after now.
    ///
    /// Counted in whole intervals from the last begin-frame; a clock reading
    /// before the last begin-frame predicts the boundary right after it.
    #[must_use]
    pub fn anticipated_draw_time(&self) -> HostTime {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.last_begin_frame_time);
        let intervals = self
            .interval
            .whole_intervals_in(elapsed)
            .unwrap_or(0)
            .saturating_add(1);
        let anticipated = self
            .last_begin_frame_time
            .saturating_add(self.interval.saturating_mul(intervals));
        debug_assert!(
            anticipated > now || anticipated == HostTime(u64::MAX),
            "anticipated draw time {anticipated:?} is not after now {now:?}"
        );
        anticipated
    }

    /// Timestamp of the last delivered begin-frame.
    #[must_use]
    pub fn last_begin_frame_on_impl_thread_time(&self) -> HostTime {
        self.last_begin_frame_time
    }

    /// Whether a requested redraw would be drawn without waiting for a
    /// commit.
    #[must_use]
    pub fn will_draw_if_needed(&self) -> bool {
        !self.state_machine.draw_suspended_until_commit()
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Returns the state machine.
    #[must_use]
    pub fn state_machine(&self) -> &SchedulerStateMachine {
        &self.state_machine
    }

    /// Returns the client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the client mutably.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// Returns the trace sink.
    #[must_use]
    pub fn trace_sink(&self) -> &S {
        &self.sink
    }

    /// Returns the trace sink mutably.
    pub fn trace_sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<C: SchedulerClient, K: Clock, S: TraceSink> Drop for Scheduler<C, K, S> {
    fn drop(&mut self) {
        self.client.set_needs_begin_frame_on_impl_thread(false);
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;
    use crate::time::ManualClock;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Call {
        SetNeedsBeginFrame(bool),
        SendBeginFrame,
        Commit,
        CheckTiles,
        Activate,
        DrawIfPossible,
        DrawForced,
        BeginOutputSurfaceCreation,
        AcquireTextures,
        AnticipatedDrawTime(HostTime),
    }

    type Log = Rc<RefCell<Vec<Call>>>;

    /// Records every call and performs scripted input changes.
    #[derive(Debug, Default)]
    struct RecordingClient {
        log: Log,
        draw_result: Option<DrawAndSwapResult>,
        pending_tree_on_commit: bool,
        redraw_during_draw: bool,
    }

    impl RecordingClient {
        fn push(&self, call: Call) {
            self.log.borrow_mut().push(call);
        }

        fn draw(&self, inputs: &mut SchedulerInputs<'_>) -> DrawAndSwapResult {
            if self.redraw_during_draw {
                inputs.set_needs_redraw();
            }
            self.draw_result.unwrap_or(DrawAndSwapResult::SWAPPED)
        }
    }

    impl SchedulerClient for RecordingClient {
        fn set_needs_begin_frame_on_impl_thread(&mut self, enable: bool) {
            self.push(Call::SetNeedsBeginFrame(enable));
        }

        fn scheduled_action_send_begin_frame_to_main_thread(
            &mut self,
            _: &mut SchedulerInputs<'_>,
        ) {
            self.push(Call::SendBeginFrame);
        }

        fn scheduled_action_commit(&mut self, inputs: &mut SchedulerInputs<'_>) {
            self.push(Call::Commit);
            if self.pending_tree_on_commit {
                inputs.set_has_pending_tree(true);
            }
        }

        fn scheduled_action_check_for_completed_tile_uploads(
            &mut self,
            _: &mut SchedulerInputs<'_>,
        ) {
            self.push(Call::CheckTiles);
        }

        fn scheduled_action_activate_pending_tree_if_needed(
            &mut self,
            inputs: &mut SchedulerInputs<'_>,
        ) {
            self.push(Call::Activate);
            inputs.set_has_pending_tree(false);
            inputs.set_needs_redraw();
        }

        fn scheduled_action_draw_and_swap_if_possible(
            &mut self,
            inputs: &mut SchedulerInputs<'_>,
        ) -> DrawAndSwapResult {
            self.push(Call::DrawIfPossible);
            self.draw(inputs)
        }

        fn scheduled_action_draw_and_swap_forced(
            &mut self,
            inputs: &mut SchedulerInputs<'_>,
        ) -> DrawAndSwapResult {
            self.push(Call::DrawForced);
            self.draw(inputs)
        }

        fn scheduled_action_begin_output_surface_creation(&mut self, _: &mut SchedulerInputs<'_>) {
            self.push(Call::BeginOutputSurfaceCreation);
        }

        fn scheduled_action_acquire_layer_textures_for_main_thread(
            &mut self,
            _: &mut SchedulerInputs<'_>,
        ) {
            self.push(Call::AcquireTextures);
        }

        fn did_anticipated_draw_time_change(&mut self, time: HostTime) {
            self.push(Call::AnticipatedDrawTime(time));
        }
    }

    /// Takes the recorded calls, minus draw-time notifications.
    fn take(log: &Log) -> Vec<Call> {
        log.borrow_mut()
            .drain(..)
            .filter(|c| !matches!(c, Call::AnticipatedDrawTime(_)))
            .collect()
    }

    type TestScheduler = Scheduler<RecordingClient, ManualClock>;

    fn scheduler_with(
        client: RecordingClient,
        settings: SchedulerSettings,
    ) -> (TestScheduler, Log, ManualClock) {
        let log = client.log.clone();
        let clock = ManualClock::new(HostTime(1_000_000));
        let scheduler = Scheduler::new(client, clock.clone(), settings);
        (scheduler, log, clock)
    }

    /// A visible, drawable scheduler with an active output surface.
    fn active_with(
        client: RecordingClient,
        settings: SchedulerSettings,
    ) -> (TestScheduler, Log, ManualClock) {
        let (mut s, log, clock) = scheduler_with(client, settings);
        s.set_can_start();
        s.set_visible(true);
        s.set_can_draw(true);
        assert_eq!(take(&log), [Call::BeginOutputSurfaceCreation]);
        s.did_create_and_initialize_output_surface();
        assert_eq!(take(&log), []);
        (s, log, clock)
    }

    fn active() -> (TestScheduler, Log, ManualClock) {
        active_with(RecordingClient::default(), SchedulerSettings::new())
    }

    #[test]
    fn commit_then_draw_on_vsync() {
        let (mut s, log, _) = active();
        s.set_needs_commit();
        assert_eq!(take(&log), [Call::SendBeginFrame]);
        s.finish_commit();
        assert_eq!(take(&log), [Call::Commit, Call::SetNeedsBeginFrame(true)]);
        s.begin_frame(HostTime(1_016_666));
        assert_eq!(
            take(&log),
            [Call::DrawIfPossible, Call::SetNeedsBeginFrame(false)]
        );
        assert_eq!(s.last_begin_frame_on_impl_thread_time(), HostTime(1_016_666));
    }

    #[test]
    fn repeated_setters_do_not_re_enable() {
        let (mut s, log, _) = active();
        s.set_needs_redraw();
        s.set_needs_redraw();
        s.set_can_draw(true);
        s.set_visible(true);
        assert_eq!(take(&log), [Call::SetNeedsBeginFrame(true)]);
    }

    #[test]
    fn disable_waits_for_next_begin_frame() {
        let (mut s, log, _) = active();
        s.set_needs_redraw();
        s.set_visible(false);
        assert_eq!(take(&log), [Call::SetNeedsBeginFrame(true)]);
        s.begin_frame(HostTime(1_016_666));
        assert_eq!(take(&log), [Call::SetNeedsBeginFrame(false)]);
    }

    #[test]
    fn synchronous_compositor_disables_at_once() {
        let (mut s, log, _) = active_with(
            RecordingClient::default(),
            SchedulerSettings::synchronous_compositor(),
        );
        s.set_needs_redraw();
        s.set_visible(false);
        assert_eq!(
            take(&log),
            [Call::SetNeedsBeginFrame(true), Call::SetNeedsBeginFrame(false)]
        );
    }

    #[test]
    fn begin_frame_without_swap_requests_the_next_one() {
        let client = RecordingClient {
            draw_result: Some(DrawAndSwapResult::ABORTED),
            ..RecordingClient::default()
        };
        let (mut s, log, _) = active_with(client, SchedulerSettings::new());
        s.set_needs_redraw();
        assert_eq!(take(&log), [Call::SetNeedsBeginFrame(true)]);
        s.begin_frame(HostTime(1_016_666));
        assert_eq!(
            take(&log),
            [
                Call::DrawIfPossible,
                Call::SendBeginFrame,
                Call::SetNeedsBeginFrame(true)
            ]
        );
        // The slot was given back, so the next vsync is accepted.
        s.begin_frame_aborted_by_main_thread();
        s.begin_frame(HostTime(1_033_332));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "previous begin-frame is still pending")]
    fn begin_frame_while_pending_panics() {
        let (mut s, _, _) = active();
        s.has_pending_begin_frame = true;
        s.begin_frame(HostTime(1_016_666));
    }

    #[test]
    fn anticipated_draw_time_counts_whole_intervals() {
        let (mut s, _, clock) = active();
        let t = HostTime(2_000_000);
        clock.set(t);
        s.begin_frame(t);
        clock.set(t + Duration(20_000));
        assert_eq!(s.anticipated_draw_time(), t + Duration(33_332));
    }

    #[test]
    fn anticipated_draw_time_is_in_the_next_interval() {
        let (mut s, _, clock) = active();
        let t = HostTime(2_000_000);
        s.begin_frame(t);
        for offset in [0, 1, 16_665, 16_666, 16_667, 100_000, 1_000_001] {
            let now = t + Duration(offset);
            clock.set(now);
            let anticipated = s.anticipated_draw_time();
            assert!(anticipated > now, "{anticipated:?} <= {now:?}");
            assert!(
                anticipated <= now + Duration(16_666),
                "{anticipated:?} beyond one interval after {now:?}"
            );
        }
    }

    #[test]
    fn zero_interval_falls_back_to_the_default() {
        let settings = SchedulerSettings {
            begin_frame_interval: Duration(0),
            ..SchedulerSettings::new()
        };
        let (mut s, _, clock) = active_with(RecordingClient::default(), settings);
        assert_eq!(
            s.settings().begin_frame_interval,
            SchedulerSettings::DEFAULT_BEGIN_FRAME_INTERVAL,
            "zero interval replaced"
        );
        s.begin_frame(HostTime(1_001_000));
        let now = HostTime(1_005_000);
        clock.set(now);
        let anticipated = s.anticipated_draw_time();
        assert!(anticipated > now, "{anticipated:?} <= {now:?}");
        assert_eq!(anticipated, HostTime(1_017_666), "one default interval later");
    }

    #[test]
    fn client_is_told_the_anticipated_draw_time() {
        let (mut s, log, clock) = active();
        clock.set(HostTime(2_000_000));
        s.begin_frame(HostTime(2_000_000));
        assert!(
            log.borrow()
                .contains(&Call::AnticipatedDrawTime(HostTime(2_016_666))),
            "{:?}",
            log.borrow()
        );
    }

    #[test]
    fn settled_scheduler_dispatches_nothing() {
        let (mut s, log, _) = active();
        s.set_needs_commit();
        s.set_needs_redraw();
        take(&log);
        s.process_scheduled_actions();
        s.process_scheduled_actions();
        assert_eq!(take(&log), []);
    }

    #[test]
    fn invisible_scheduler_only_does_forced_work() {
        let (mut s, log, _) = active();
        s.set_visible(false);
        s.set_needs_commit();
        s.set_needs_redraw();
        assert_eq!(take(&log), []);

        s.set_needs_forced_commit();
        assert_eq!(take(&log), [Call::SendBeginFrame]);
        s.finish_commit();
        assert_eq!(take(&log), [Call::Commit, Call::DrawForced]);
    }

    #[test]
    fn surface_recreation_resets_begin_frame_bookkeeping() {
        let (mut s, log, _) = active();
        s.set_needs_redraw();
        assert_eq!(take(&log), [Call::SetNeedsBeginFrame(true)]);

        s.did_lose_output_surface();
        assert_eq!(take(&log), [Call::BeginOutputSurfaceCreation]);
        assert!(!s.will_draw_if_needed(), "no surface to draw into");
        s.did_create_and_initialize_output_surface();
        assert!(!s.will_draw_if_needed(), "recreated surface waits for a commit");
        assert_eq!(take(&log), [Call::SendBeginFrame]);

        s.finish_commit();
        assert_eq!(take(&log), [Call::Commit, Call::SetNeedsBeginFrame(true)]);
        assert!(s.will_draw_if_needed());
        s.begin_frame(HostTime(1_016_666));
        assert_eq!(
            take(&log),
            [Call::DrawIfPossible, Call::SetNeedsBeginFrame(false)]
        );
    }

    #[test]
    fn inputs_during_actions_feed_the_same_drain() {
        let client = RecordingClient {
            pending_tree_on_commit: true,
            ..RecordingClient::default()
        };
        let (mut s, log, _) = active_with(client, SchedulerSettings::impl_side_painting());
        s.set_needs_commit();
        s.finish_commit();
        assert_eq!(
            take(&log),
            [
                Call::SendBeginFrame,
                Call::Commit,
                Call::SetNeedsBeginFrame(true)
            ]
        );
        s.begin_frame(HostTime(1_016_666));
        assert_eq!(
            take(&log),
            [
                Call::CheckTiles,
                Call::Activate,
                Call::DrawIfPossible,
                Call::SetNeedsBeginFrame(false)
            ]
        );
    }

    #[test]
    fn redraw_requested_while_drawing_waits_for_next_frame() {
        let client = RecordingClient {
            redraw_during_draw: true,
            ..RecordingClient::default()
        };
        let (mut s, log, _) = active_with(client, SchedulerSettings::new());
        s.set_needs_redraw();
        take(&log);
        s.begin_frame(HostTime(1_016_666));
        assert_eq!(take(&log), [Call::DrawIfPossible]);
        s.begin_frame(HostTime(1_033_332));
        assert_eq!(take(&log), [Call::DrawIfPossible]);
    }

    #[test]
    fn main_thread_texture_request_is_served() {
        let (mut s, log, _) = active();
        s.set_main_thread_needs_layer_textures();
        assert_eq!(take(&log), [Call::AcquireTextures, Call::SendBeginFrame]);
        assert!(!s.will_draw_if_needed());
    }

    #[test]
    fn drop_disables_begin_frames() {
        let (mut s, log, _) = active();
        s.set_needs_redraw();
        take(&log);
        drop(s);
        assert_eq!(take(&log), [Call::SetNeedsBeginFrame(false)]);
    }

    #[test]
    fn trace_events_follow_the_drain() {
        #[derive(Debug, Default)]
        struct NameSink {
            events: Vec<&'static str>,
        }
        impl TraceSink for NameSink {
            fn on_begin_frame(&mut self, _: &BeginFrameEvent) {
                self.events.push("begin");
            }
            fn on_action(&mut self, e: &ActionEvent) {
                self.events.push(e.action.as_str());
            }
            fn on_draw(&mut self, e: &DrawEvent) {
                assert!(e.did_swap, "recording client always swaps");
                self.events.push("draw");
            }
            fn on_needs_begin_frame(&mut self, e: &NeedsBeginFrameEvent) {
                self.events.push(if e.enabled { "vsync on" } else { "vsync off" });
            }
            fn on_stimulus(&mut self, e: &StimulusEvent) {
                self.events.push(e.stimulus.as_str());
            }
            fn on_frame_summary(&mut self, s: &crate::trace::FrameSummary) {
                assert!(s.actions.contains(Action::DrawIfPossible), "{s:?}");
                self.events.push("summary");
            }
        }

        let clock = ManualClock::new(HostTime(0));
        let mut s = Scheduler::with_trace_sink(
            RecordingClient::default(),
            clock,
            SchedulerSettings::new(),
            NameSink::default(),
        );
        s.set_can_start();
        s.set_visible(true);
        s.set_can_draw(true);
        s.did_create_and_initialize_output_surface();
        s.set_needs_redraw();
        s.begin_frame(HostTime(16_666));

        assert_eq!(
            s.trace_sink().events,
            [
                "BeginOutputSurfaceCreation",
                "OutputSurfaceCreated",
                "vsync on",
                "begin",
                "DrawIfPossible",
                "draw",
                "vsync off",
                "summary"
            ]
        );
    }
}
