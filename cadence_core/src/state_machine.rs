// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The frame-production decision procedure.
//!
//! [`SchedulerStateMachine`] is a pure function of its flags: it never calls
//! out, never reads a clock, and never fails. The [`Scheduler`] asks it for
//! the [`next_action`](SchedulerStateMachine::next_action), performs that
//! action, and reports it back through
//! [`update_state`](SchedulerStateMachine::update_state).
//!
//! # Phases
//!
//! The current position in the commit pipeline is an explicit
//! [`CommitState`]; the output surface and layer texture lock have their own
//! small enums. Everything else is a demand flag set by the outside world.
//!
//! ```text
//!   Idle ──send begin frame──► FrameInProgress ──finish_commit──► ReadyToCommit
//!    ▲                              │ abort                            │ commit
//!    │                              ▼                                  ▼
//!    └──────────── draw ◄──── WaitingForFirstDraw / WaitingForFirstForcedDraw
//! ```
//!
//! # Priority
//!
//! Within a drain, actions come out in this order: hand layer textures to the
//! main thread, create an output surface, forced work, send a begin-frame to
//! the main thread, commit, check tile uploads, activate the pending tree,
//! draw. Per-frame actions (draw, activation, tile check, begin-frame to main)
//! happen at most once per frame number.
//!
//! [`Scheduler`]: crate::scheduler::Scheduler

use crate::settings::SchedulerSettings;
use crate::time::HostTime;

/// A unit of work the scheduler asks its client to perform.
///
/// "No action" is expressed as `None` from
/// [`SchedulerStateMachine::next_action`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Ask the main thread to produce a frame (layout, paint) for commit.
    SendBeginFrameToMainThread,
    /// Transfer the main thread's finished layer tree to the impl thread.
    Commit,
    /// Poll for raster tiles whose uploads completed.
    CheckForCompletedTileUploads,
    /// Swap the pending tree in for drawing, if it is ready.
    ActivatePendingTreeIfNeeded,
    /// Draw and swap; may fail (e.g. checkerboarding) and be retried.
    DrawIfPossible,
    /// Draw and swap regardless of readiness.
    DrawForced,
    /// Start creating a new output surface.
    BeginOutputSurfaceCreation,
    /// Give the layer texture lock to the main thread.
    AcquireLayerTexturesForMainThread,
}

impl Action {
    /// Every action, in wire-code order.
    pub const ALL: [Self; 8] = [
        Self::SendBeginFrameToMainThread,
        Self::Commit,
        Self::CheckForCompletedTileUploads,
        Self::ActivatePendingTreeIfNeeded,
        Self::DrawIfPossible,
        Self::DrawForced,
        Self::BeginOutputSurfaceCreation,
        Self::AcquireLayerTexturesForMainThread,
    ];

    /// Stable numeric code, used by recorders and action sets.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::SendBeginFrameToMainThread => 0,
            Self::Commit => 1,
            Self::CheckForCompletedTileUploads => 2,
            Self::ActivatePendingTreeIfNeeded => 3,
            Self::DrawIfPossible => 4,
            Self::DrawForced => 5,
            Self::BeginOutputSurfaceCreation => 6,
            Self::AcquireLayerTexturesForMainThread => 7,
        }
    }

    /// Inverse of [`code`](Self::code).
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        if (code as usize) < Self::ALL.len() {
            Some(Self::ALL[code as usize])
        } else {
            None
        }
    }

    /// Returns a short label for logs and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SendBeginFrameToMainThread => "SendBeginFrameToMainThread",
            Self::Commit => "Commit",
            Self::CheckForCompletedTileUploads => "CheckForCompletedTileUploads",
            Self::ActivatePendingTreeIfNeeded => "ActivatePendingTreeIfNeeded",
            Self::DrawIfPossible => "DrawIfPossible",
            Self::DrawForced => "DrawForced",
            Self::BeginOutputSurfaceCreation => "BeginOutputSurfaceCreation",
            Self::AcquireLayerTexturesForMainThread => "AcquireLayerTexturesForMainThread",
        }
    }
}

/// Position in the main-thread commit pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommitState {
    /// No main-thread frame outstanding.
    Idle,
    /// A begin-frame was sent; the main thread is producing a frame.
    FrameInProgress,
    /// The main thread finished; the commit runs next.
    ReadyToCommit,
    /// Committed; the new tree must be drawn before the next commit starts.
    WaitingForFirstDraw,
    /// Committed for a forced commit; a forced draw must follow.
    WaitingForFirstForcedDraw,
}

/// Output surface lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputSurfaceState {
    /// No surface exists and none is being created.
    Lost,
    /// Creation was requested and has not completed.
    Creating,
    /// A surface exists and can be drawn into.
    Active,
}

/// Which thread holds the layer texture lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureState {
    /// Nobody holds the lock.
    Unlocked,
    /// The main thread holds the textures; the impl thread cannot draw.
    AcquiredByMainThread,
    /// The impl thread holds the textures from the last commit until it draws.
    AcquiredByImplThread,
}

/// Deterministic frame-production policy.
///
/// See the [module docs](self) for phases and priority.
#[derive(Clone, Debug)]
pub struct SchedulerStateMachine {
    settings: SchedulerSettings,
    commit_state: CommitState,
    output_surface_state: OutputSurfaceState,
    texture_state: TextureState,

    commit_count: u64,
    current_frame_number: u64,
    last_frame_number_where_begin_frame_sent_to_main_thread: Option<u64>,
    last_frame_number_where_draw_was_called: Option<u64>,
    last_frame_number_where_tree_activation_attempted: Option<u64>,
    last_frame_number_where_check_for_completed_tile_uploads_called: Option<u64>,
    consecutive_failed_draws: u32,
    last_frame_time: Option<HostTime>,

    needs_redraw: bool,
    swap_used_incomplete_tile: bool,
    needs_forced_redraw: bool,
    needs_forced_redraw_after_next_commit: bool,
    needs_commit: bool,
    needs_forced_commit: bool,
    expect_immediate_begin_frame_for_main_thread: bool,
    main_thread_needs_layer_textures: bool,
    inside_begin_frame: bool,
    visible: bool,
    can_start: bool,
    can_draw: bool,
    has_pending_tree: bool,
    draw_if_possible_failed: bool,
    awaiting_commit_after_surface_recreation: bool,
    did_create_and_initialize_first_output_surface: bool,
}

impl SchedulerStateMachine {
    /// Creates a machine with no output surface, invisible, unable to draw,
    /// and not yet allowed to start.
    #[must_use]
    pub fn new(settings: SchedulerSettings) -> Self {
        Self {
            settings,
            commit_state: CommitState::Idle,
            output_surface_state: OutputSurfaceState::Lost,
            texture_state: TextureState::Unlocked,
            commit_count: 0,
            current_frame_number: 0,
            last_frame_number_where_begin_frame_sent_to_main_thread: None,
            last_frame_number_where_draw_was_called: None,
            last_frame_number_where_tree_activation_attempted: None,
            last_frame_number_where_check_for_completed_tile_uploads_called: None,
            consecutive_failed_draws: 0,
            last_frame_time: None,
            needs_redraw: false,
            swap_used_incomplete_tile: false,
            needs_forced_redraw: false,
            needs_forced_redraw_after_next_commit: false,
            needs_commit: false,
            needs_forced_commit: false,
            expect_immediate_begin_frame_for_main_thread: false,
            main_thread_needs_layer_textures: false,
            inside_begin_frame: false,
            visible: false,
            can_start: false,
            can_draw: false,
            has_pending_tree: false,
            draw_if_possible_failed: false,
            awaiting_commit_after_surface_recreation: false,
            did_create_and_initialize_first_output_surface: false,
        }
    }

    // -- decision ----------------------------------------------------------

    /// Returns the single most urgent action, or `None` if the machine is
    /// settled.
    #[must_use]
    pub fn next_action(&self) -> Option<Action> {
        if self.should_acquire_layer_textures_for_main_thread() {
            return Some(Action::AcquireLayerTexturesForMainThread);
        }
        if self.output_surface_state == OutputSurfaceState::Lost && self.can_start {
            return Some(Action::BeginOutputSurfaceCreation);
        }
        match self.commit_state {
            CommitState::Idle => self.next_action_when_idle(),
            CommitState::FrameInProgress => self.next_impl_thread_action(),
            CommitState::ReadyToCommit => Some(Action::Commit),
            CommitState::WaitingForFirstDraw => self.next_action_waiting_for_first_draw(),
            CommitState::WaitingForFirstForcedDraw => self
                .next_tree_maintenance_action()
                .or(self.needs_forced_redraw.then_some(Action::DrawForced)),
        }
    }

    fn next_action_when_idle(&self) -> Option<Action> {
        // Forced work runs without a surface and while invisible.
        if self.needs_forced_redraw {
            return Some(Action::DrawForced);
        }
        if self.needs_forced_commit && !self.has_pending_tree {
            return Some(Action::SendBeginFrameToMainThread);
        }
        if self.output_surface_state != OutputSurfaceState::Active {
            return None;
        }
        if self.needs_commit && self.can_commit_this_frame() && !self.has_pending_tree {
            return Some(Action::SendBeginFrameToMainThread);
        }
        self.next_impl_thread_action()
    }

    fn next_action_waiting_for_first_draw(&self) -> Option<Action> {
        if let Some(action) = self.next_impl_thread_action() {
            return Some(action);
        }
        // The committed tree is owed a draw before the next commit starts,
        // unless drawing is itself blocked on a commit.
        let can_commit = self.needs_forced_commit || self.can_commit_this_frame();
        if self.needs_commit
            && can_commit
            && self.draw_suspended_until_commit()
            && !self.has_pending_tree
        {
            return Some(Action::SendBeginFrameToMainThread);
        }
        None
    }

    fn next_impl_thread_action(&self) -> Option<Action> {
        self.next_tree_maintenance_action()
            .or_else(|| self.should_draw().then(|| self.draw_action()))
    }

    fn next_tree_maintenance_action(&self) -> Option<Action> {
        if self.should_check_for_completed_tile_uploads() {
            Some(Action::CheckForCompletedTileUploads)
        } else if self.should_attempt_tree_activation() {
            Some(Action::ActivatePendingTreeIfNeeded)
        } else {
            None
        }
    }

    fn draw_action(&self) -> Action {
        if self.needs_forced_redraw {
            Action::DrawForced
        } else {
            Action::DrawIfPossible
        }
    }

    fn can_commit_this_frame(&self) -> bool {
        self.visible
            && self
                .last_frame_number_where_begin_frame_sent_to_main_thread
                .is_none_or(|frame| self.current_frame_number > frame)
    }

    fn has_drawn_this_frame(&self) -> bool {
        self.last_frame_number_where_draw_was_called == Some(self.current_frame_number)
    }

    fn has_attempted_tree_activation_this_frame(&self) -> bool {
        self.last_frame_number_where_tree_activation_attempted == Some(self.current_frame_number)
    }

    fn has_checked_for_completed_tile_uploads_this_frame(&self) -> bool {
        self.last_frame_number_where_check_for_completed_tile_uploads_called
            == Some(self.current_frame_number)
    }

    fn scheduled_to_draw(&self) -> bool {
        self.needs_redraw && !self.draw_suspended_until_commit()
    }

    fn should_draw(&self) -> bool {
        if self.needs_forced_redraw {
            return true;
        }
        self.scheduled_to_draw()
            && self.inside_begin_frame
            && !self.has_drawn_this_frame()
            && self.output_surface_state == OutputSurfaceState::Active
    }

    fn should_attempt_tree_activation(&self) -> bool {
        self.has_pending_tree
            && self.inside_begin_frame
            && !self.has_attempted_tree_activation_this_frame()
    }

    fn should_check_for_completed_tile_uploads(&self) -> bool {
        if !self.settings.impl_side_painting
            || self.has_checked_for_completed_tile_uploads_this_frame()
        {
            return false;
        }
        self.should_attempt_tree_activation()
            || self.should_draw()
            || self.swap_used_incomplete_tile
    }

    fn should_acquire_layer_textures_for_main_thread(&self) -> bool {
        if !self.main_thread_needs_layer_textures {
            return false;
        }
        match self.texture_state {
            TextureState::Unlocked => true,
            TextureState::AcquiredByMainThread => false,
            // Hand the lock over at once if the impl thread is not about to
            // draw with it, or the main thread would wait forever.
            TextureState::AcquiredByImplThread => {
                !self.scheduled_to_draw() || !self.begin_frame_needed_by_impl_thread()
            }
        }
    }

    /// Records that `action` was performed.
    ///
    /// Only the flags owned by `action` change.
    pub fn update_state(&mut self, action: Action) {
        match action {
            Action::CheckForCompletedTileUploads => {
                self.last_frame_number_where_check_for_completed_tile_uploads_called =
                    Some(self.current_frame_number);
            }
            Action::ActivatePendingTreeIfNeeded => {
                self.last_frame_number_where_tree_activation_attempted =
                    Some(self.current_frame_number);
            }
            Action::SendBeginFrameToMainThread => {
                debug_assert!(
                    !self.has_pending_tree,
                    "begin-frame sent to the main thread while a pending tree is unactivated"
                );
                self.commit_state = CommitState::FrameInProgress;
                self.needs_commit = false;
                self.needs_forced_commit = false;
                self.last_frame_number_where_begin_frame_sent_to_main_thread =
                    Some(self.current_frame_number);
            }
            Action::Commit => {
                self.commit_count += 1;
                self.commit_state = if self.expect_immediate_begin_frame_for_main_thread {
                    // A forced commit exists to get a frame out; the draw
                    // that follows it is forced too.
                    self.needs_forced_redraw = true;
                    CommitState::WaitingForFirstForcedDraw
                } else if self.output_surface_state == OutputSurfaceState::Active {
                    CommitState::WaitingForFirstDraw
                } else {
                    // Nothing to draw into; surface recreation asks for a
                    // fresh commit anyway.
                    CommitState::Idle
                };
                // With impl-side painting the draw follows activation instead.
                if !self.settings.impl_side_painting {
                    self.needs_redraw = true;
                }
                if self.draw_if_possible_failed {
                    self.last_frame_number_where_draw_was_called = None;
                }
                if self.needs_forced_redraw_after_next_commit {
                    self.needs_forced_redraw_after_next_commit = false;
                    self.needs_forced_redraw = true;
                }
                self.awaiting_commit_after_surface_recreation = false;
                self.texture_state = TextureState::AcquiredByImplThread;
            }
            Action::DrawIfPossible | Action::DrawForced => {
                self.needs_redraw = false;
                self.needs_forced_redraw = false;
                self.draw_if_possible_failed = false;
                self.swap_used_incomplete_tile = false;
                if self.inside_begin_frame {
                    self.last_frame_number_where_draw_was_called = Some(self.current_frame_number);
                }
                match self.commit_state {
                    CommitState::WaitingForFirstForcedDraw => {
                        self.expect_immediate_begin_frame_for_main_thread = false;
                        self.commit_state = CommitState::Idle;
                    }
                    CommitState::WaitingForFirstDraw => self.commit_state = CommitState::Idle,
                    _ => {}
                }
                if self.texture_state == TextureState::AcquiredByImplThread {
                    self.texture_state = TextureState::Unlocked;
                }
            }
            Action::BeginOutputSurfaceCreation => {
                debug_assert_eq!(
                    self.output_surface_state,
                    OutputSurfaceState::Lost,
                    "output surface creation started while one exists"
                );
                self.output_surface_state = OutputSurfaceState::Creating;
            }
            Action::AcquireLayerTexturesForMainThread => {
                self.texture_state = TextureState::AcquiredByMainThread;
                self.main_thread_needs_layer_textures = false;
                if self.commit_state != CommitState::FrameInProgress {
                    self.needs_commit = true;
                }
            }
        }
    }

    /// Whether vsync callbacks are needed for the impl thread to make
    /// progress.
    ///
    /// Forced work always needs them. Otherwise an invisible machine, or one
    /// without an active surface, never does.
    #[must_use]
    pub fn begin_frame_needed_by_impl_thread(&self) -> bool {
        if self.needs_forced_redraw || self.needs_forced_commit {
            return true;
        }
        if !self.visible || self.output_surface_state != OutputSurfaceState::Active {
            return false;
        }
        self.scheduled_to_draw()
            || (self.can_draw && self.swap_used_incomplete_tile)
            || self.has_pending_tree
            || self.commit_waits_for_next_frame()
    }

    fn commit_waits_for_next_frame(&self) -> bool {
        self.needs_commit
            && !self.has_pending_tree
            && matches!(
                self.commit_state,
                CommitState::Idle | CommitState::WaitingForFirstDraw
            )
    }

    /// Whether drawing is blocked until the next commit lands.
    ///
    /// Always true while the output surface is not active.
    #[must_use]
    pub fn draw_suspended_until_commit(&self) -> bool {
        !self.can_draw
            || !self.visible
            || self.texture_state == TextureState::AcquiredByMainThread
            || self.awaiting_commit_after_surface_recreation
            || self.output_surface_state != OutputSurfaceState::Active
    }

    // -- frame bracketing --------------------------------------------------

    /// Marks the start of a vsync-driven production attempt.
    pub fn did_enter_begin_frame(&mut self) {
        debug_assert!(!self.inside_begin_frame, "begin-frame entered twice");
        self.inside_begin_frame = true;
    }

    /// Records the vsync timestamp of the current frame.
    pub fn set_frame_time(&mut self, frame_time: HostTime) {
        self.last_frame_time = Some(frame_time);
    }

    /// Marks the end of the production attempt and advances the frame number.
    pub fn did_leave_begin_frame(&mut self) {
        debug_assert!(self.inside_begin_frame, "begin-frame left without entering");
        self.current_frame_number += 1;
        self.inside_begin_frame = false;
    }

    // -- stimuli -----------------------------------------------------------

    /// Allows output surface creation to start.
    pub fn set_can_start(&mut self) {
        self.can_start = true;
    }

    /// Sets visibility. Invisible machines only perform forced work.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Sets whether the host is able to draw at all.
    pub fn set_can_draw(&mut self, can_draw: bool) {
        self.can_draw = can_draw;
    }

    /// Sets whether a committed tree awaits activation.
    pub fn set_has_pending_tree(&mut self, has_pending_tree: bool) {
        self.has_pending_tree = has_pending_tree;
    }

    /// Requests a main-thread frame and commit.
    pub fn set_needs_commit(&mut self) {
        self.needs_commit = true;
    }

    /// Requests a commit that ignores visibility, followed by a forced draw.
    pub fn set_needs_forced_commit(&mut self) {
        self.needs_forced_commit = true;
        self.expect_immediate_begin_frame_for_main_thread = true;
    }

    /// Requests a draw on the next frame.
    pub fn set_needs_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Requests a draw that ignores visibility and readiness.
    pub fn set_needs_forced_redraw(&mut self) {
        self.needs_forced_redraw = true;
    }

    /// The last swap showed incomplete tiles; another draw is needed.
    pub fn did_swap_use_incomplete_tile(&mut self) {
        self.swap_used_incomplete_tile = true;
        self.needs_redraw = true;
    }

    /// The main thread wants the layer texture lock.
    pub fn set_main_thread_needs_layer_textures(&mut self) {
        debug_assert!(
            !self.main_thread_needs_layer_textures,
            "layer textures requested twice"
        );
        debug_assert_ne!(
            self.texture_state,
            TextureState::AcquiredByMainThread,
            "main thread already holds the layer textures"
        );
        self.main_thread_needs_layer_textures = true;
    }

    /// Reports the outcome of a [`Action::DrawIfPossible`].
    ///
    /// A failure re-arms the redraw and asks for a new commit. Enough failures
    /// in a row force the draw after the next commit.
    pub fn did_draw_if_possible_completed(&mut self, success: bool) {
        self.draw_if_possible_failed = !success;
        if success {
            self.consecutive_failed_draws = 0;
            return;
        }
        self.needs_redraw = true;
        self.needs_commit = true;
        self.consecutive_failed_draws += 1;
        if self.settings.timeout_and_draw_when_animation_checkerboards
            && self.consecutive_failed_draws
                >= self
                    .settings
                    .maximum_number_of_failed_draws_before_draw_is_forced
        {
            self.consecutive_failed_draws = 0;
            // Forcing now would redraw the same missing tiles.
            self.needs_forced_redraw_after_next_commit = true;
        }
    }

    /// The main thread finished the frame it was asked for.
    pub fn finish_commit(&mut self) {
        debug_assert!(
            self.commit_state == CommitState::FrameInProgress
                || (self.expect_immediate_begin_frame_for_main_thread
                    && self.commit_state != CommitState::Idle),
            "commit finished with no main-thread frame in progress ({:?})",
            self.commit_state
        );
        self.commit_state = CommitState::ReadyToCommit;
    }

    /// The main thread declined the frame it was asked for.
    ///
    /// The commit request is re-armed so a later frame can retry. An aborted
    /// forced commit no longer expects its forced draw.
    pub fn begin_frame_aborted_by_main_thread(&mut self) {
        debug_assert_eq!(
            self.commit_state,
            CommitState::FrameInProgress,
            "begin-frame aborted with no main-thread frame in progress"
        );
        self.commit_state = CommitState::Idle;
        self.needs_commit = true;
        self.expect_immediate_begin_frame_for_main_thread = false;
    }

    /// The output surface is gone. Drawing stops until a new one is created.
    pub fn did_lose_output_surface(&mut self) {
        if self.output_surface_state != OutputSurfaceState::Active {
            return;
        }
        self.output_surface_state = OutputSurfaceState::Lost;
        // The owed first draw has nowhere to go.
        if self.commit_state == CommitState::WaitingForFirstDraw {
            self.commit_state = CommitState::Idle;
        }
    }

    /// A requested output surface is ready.
    ///
    /// After a recreation, drawing waits for a fresh commit.
    pub fn did_create_and_initialize_output_surface(&mut self) {
        debug_assert_eq!(
            self.output_surface_state,
            OutputSurfaceState::Creating,
            "output surface created without being requested"
        );
        self.output_surface_state = OutputSurfaceState::Active;
        if self.did_create_and_initialize_first_output_surface {
            self.needs_commit = true;
            self.awaiting_commit_after_surface_recreation = true;
        }
        self.did_create_and_initialize_first_output_surface = true;
    }

    // -- accessors ---------------------------------------------------------

    /// Returns the settings this machine was built with.
    #[must_use]
    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Returns the commit pipeline phase.
    #[must_use]
    pub fn commit_state(&self) -> CommitState {
        self.commit_state
    }

    /// Returns the output surface lifecycle state.
    #[must_use]
    pub fn output_surface_state(&self) -> OutputSurfaceState {
        self.output_surface_state
    }

    /// Returns the layer texture lock holder.
    #[must_use]
    pub fn texture_state(&self) -> TextureState {
        self.texture_state
    }

    /// Returns the frame number; advanced when each begin-frame is left.
    #[must_use]
    pub fn current_frame_number(&self) -> u64 {
        self.current_frame_number
    }

    /// Returns the number of commits performed.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.commit_count
    }

    /// Returns the vsync timestamp recorded for the latest frame.
    #[must_use]
    pub fn last_frame_time(&self) -> Option<HostTime> {
        self.last_frame_time
    }

    /// Whether a main-thread commit is requested.
    #[must_use]
    pub fn needs_commit(&self) -> bool {
        self.needs_commit
    }

    /// Whether a draw is requested.
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Whether a forced draw is requested.
    #[must_use]
    pub fn needs_forced_redraw(&self) -> bool {
        self.needs_forced_redraw
    }

    /// Whether a vsync-driven production attempt is underway.
    #[must_use]
    pub fn inside_begin_frame(&self) -> bool {
        self.inside_begin_frame
    }

    /// Whether an output surface is ready to draw into.
    #[must_use]
    pub fn has_initialized_output_surface(&self) -> bool {
        self.output_surface_state == OutputSurfaceState::Active
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    /// Performs actions until the machine settles.
    fn drain(sm: &mut SchedulerStateMachine) -> Vec<Action> {
        let mut actions = Vec::new();
        while let Some(action) = sm.next_action() {
            sm.update_state(action);
            actions.push(action);
            assert!(actions.len() < 32, "machine did not settle: {actions:?}");
        }
        actions
    }

    /// A visible, drawable machine with an active output surface.
    fn started(settings: SchedulerSettings) -> SchedulerStateMachine {
        let mut sm = SchedulerStateMachine::new(settings);
        sm.set_can_start();
        sm.set_visible(true);
        sm.set_can_draw(true);
        assert_eq!(drain(&mut sm), [Action::BeginOutputSurfaceCreation]);
        sm.did_create_and_initialize_output_surface();
        assert_eq!(sm.next_action(), None);
        sm
    }

    fn in_frame(sm: &mut SchedulerStateMachine, f: impl FnOnce(&mut SchedulerStateMachine)) {
        sm.did_enter_begin_frame();
        f(sm);
        sm.did_leave_begin_frame();
    }

    #[test]
    fn nothing_happens_before_can_start() {
        let mut sm = SchedulerStateMachine::new(SchedulerSettings::new());
        sm.set_visible(true);
        sm.set_can_draw(true);
        sm.set_needs_commit();
        sm.set_needs_redraw();
        assert_eq!(sm.next_action(), None);
        assert!(!sm.begin_frame_needed_by_impl_thread());
    }

    #[test]
    fn commit_then_draw_inside_begin_frame() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_needs_commit();
        assert_eq!(drain(&mut sm), [Action::SendBeginFrameToMainThread]);
        assert_eq!(sm.commit_state(), CommitState::FrameInProgress);
        assert!(!sm.needs_commit());

        sm.finish_commit();
        assert_eq!(drain(&mut sm), [Action::Commit]);
        assert_eq!(sm.commit_state(), CommitState::WaitingForFirstDraw);
        assert!(sm.needs_redraw(), "a commit implies a redraw");
        assert!(sm.begin_frame_needed_by_impl_thread());

        in_frame(&mut sm, |sm| {
            assert_eq!(drain(sm), [Action::DrawIfPossible]);
            sm.did_draw_if_possible_completed(true);
        });
        assert_eq!(sm.commit_state(), CommitState::Idle);
        assert_eq!(sm.commit_count(), 1);
        assert!(!sm.begin_frame_needed_by_impl_thread());
    }

    #[test]
    fn draws_only_inside_begin_frame_and_once_per_frame() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_needs_redraw();
        assert_eq!(sm.next_action(), None, "no draw outside a begin-frame");

        sm.did_enter_begin_frame();
        assert_eq!(drain(&mut sm), [Action::DrawIfPossible]);
        sm.set_needs_redraw();
        assert_eq!(sm.next_action(), None, "second draw in the same frame");
        sm.did_leave_begin_frame();

        in_frame(&mut sm, |sm| assert_eq!(drain(sm), [Action::DrawIfPossible]));
    }

    #[test]
    fn ready_commit_runs_before_draw() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_needs_commit();
        drain(&mut sm);
        sm.set_needs_redraw();
        sm.finish_commit();
        in_frame(&mut sm, |sm| {
            assert_eq!(drain(sm), [Action::Commit, Action::DrawIfPossible]);
        });
    }

    #[test]
    fn begin_frame_to_main_thread_is_sent_before_draw_when_idle() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_needs_redraw();
        sm.set_needs_commit();
        in_frame(&mut sm, |sm| {
            assert_eq!(
                drain(sm),
                [Action::SendBeginFrameToMainThread, Action::DrawIfPossible]
            );
        });
    }

    #[test]
    fn one_begin_frame_to_main_thread_per_frame() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_needs_commit();
        drain(&mut sm);
        sm.begin_frame_aborted_by_main_thread();
        assert!(sm.needs_commit(), "abort re-arms the commit");
        assert_eq!(sm.next_action(), None, "already sent one this frame");
        assert!(
            sm.begin_frame_needed_by_impl_thread(),
            "abort must leave the machine asking for the next vsync"
        );

        in_frame(&mut sm, |_| {});
        assert_eq!(drain(&mut sm), [Action::SendBeginFrameToMainThread]);
    }

    #[test]
    fn invisible_machine_never_commits_or_draws_on_its_own() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_visible(false);
        sm.set_needs_commit();
        sm.set_needs_redraw();
        assert!(!sm.begin_frame_needed_by_impl_thread());
        for _ in 0..3 {
            in_frame(&mut sm, |sm| {
                let actions = drain(sm);
                assert!(
                    !actions.contains(&Action::Commit)
                        && !actions.contains(&Action::DrawIfPossible)
                        && !actions.contains(&Action::SendBeginFrameToMainThread),
                    "{actions:?}"
                );
            });
        }
    }

    #[test]
    fn forced_commit_bypasses_visibility() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_visible(false);
        sm.set_needs_commit();
        sm.set_needs_forced_commit();
        assert!(sm.begin_frame_needed_by_impl_thread());
        assert_eq!(drain(&mut sm), [Action::SendBeginFrameToMainThread]);

        sm.finish_commit();
        assert_eq!(drain(&mut sm), [Action::Commit, Action::DrawForced]);
        assert_eq!(sm.commit_state(), CommitState::Idle);
        assert!(!sm.begin_frame_needed_by_impl_thread());
    }

    #[test]
    fn forced_redraw_runs_without_surface() {
        let mut sm = SchedulerStateMachine::new(SchedulerSettings::new());
        sm.set_needs_forced_redraw();
        assert!(sm.begin_frame_needed_by_impl_thread());
        assert_eq!(drain(&mut sm), [Action::DrawForced]);
        assert!(!sm.needs_forced_redraw());
    }

    #[test]
    fn surface_creation_precedes_forced_work() {
        let mut sm = SchedulerStateMachine::new(SchedulerSettings::new());
        sm.set_can_start();
        sm.set_needs_forced_redraw();
        assert_eq!(
            drain(&mut sm),
            [Action::BeginOutputSurfaceCreation, Action::DrawForced]
        );
    }

    #[test]
    fn surface_loss_blocks_draw_until_recreated_and_committed() {
        let mut sm = started(SchedulerSettings::new());
        sm.did_lose_output_surface();
        assert!(sm.draw_suspended_until_commit(), "no surface to draw into");
        sm.set_needs_redraw();
        assert!(!sm.begin_frame_needed_by_impl_thread());

        sm.did_enter_begin_frame();
        assert_eq!(drain(&mut sm), [Action::BeginOutputSurfaceCreation]);
        assert_eq!(sm.output_surface_state(), OutputSurfaceState::Creating);
        sm.did_lose_output_surface();
        assert_eq!(
            sm.output_surface_state(),
            OutputSurfaceState::Creating,
            "losing a surface that is being created is a no-op"
        );
        sm.did_leave_begin_frame();

        sm.did_create_and_initialize_output_surface();
        assert!(sm.draw_suspended_until_commit());
        assert!(sm.needs_commit());
        in_frame(&mut sm, |sm| {
            assert_eq!(drain(sm), [Action::SendBeginFrameToMainThread]);
        });
        sm.finish_commit();
        assert!(!drain(&mut sm).contains(&Action::DrawIfPossible));
        assert!(!sm.draw_suspended_until_commit());
        in_frame(&mut sm, |sm| assert_eq!(drain(sm), [Action::DrawIfPossible]));
    }

    #[test]
    fn losing_surface_releases_owed_first_draw() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_needs_commit();
        drain(&mut sm);
        sm.finish_commit();
        drain(&mut sm);
        assert_eq!(sm.commit_state(), CommitState::WaitingForFirstDraw);

        sm.did_lose_output_surface();
        assert_eq!(sm.commit_state(), CommitState::Idle);
        assert_eq!(drain(&mut sm), [Action::BeginOutputSurfaceCreation]);
    }

    #[test]
    fn incomplete_tile_swap_requests_another_draw() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_needs_redraw();
        in_frame(&mut sm, |sm| {
            assert_eq!(sm.next_action(), Some(Action::DrawIfPossible));
            sm.update_state(Action::DrawIfPossible);
            sm.did_swap_use_incomplete_tile();
            sm.did_draw_if_possible_completed(true);
        });
        assert!(sm.needs_redraw(), "incomplete tiles do not satisfy the redraw");
        assert!(sm.begin_frame_needed_by_impl_thread());
        in_frame(&mut sm, |sm| {
            assert_eq!(sm.next_action(), Some(Action::DrawIfPossible));
        });
    }

    #[test]
    fn failed_draws_rearm_and_eventually_force() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_needs_redraw();
        for _ in 0..3 {
            in_frame(&mut sm, |sm| {
                let actions = drain(sm);
                assert!(actions.contains(&Action::DrawIfPossible), "{actions:?}");
                sm.did_draw_if_possible_completed(false);
                assert!(sm.needs_redraw() && sm.needs_commit());
            });
            // Let any begin-frame sent this frame come back empty.
            if sm.commit_state() == CommitState::FrameInProgress {
                sm.begin_frame_aborted_by_main_thread();
            }
        }
        // The next commit is followed by a forced draw.
        in_frame(&mut sm, |sm| {
            assert_eq!(sm.next_action(), Some(Action::SendBeginFrameToMainThread));
            sm.update_state(Action::SendBeginFrameToMainThread);
        });
        sm.finish_commit();
        assert_eq!(drain(&mut sm), [Action::Commit, Action::DrawForced]);
    }

    #[test]
    fn failed_draw_may_redraw_in_the_frame_of_the_next_commit() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_needs_commit();
        drain(&mut sm);
        sm.set_needs_redraw();
        sm.did_enter_begin_frame();
        assert_eq!(drain(&mut sm), [Action::DrawIfPossible]);
        sm.did_draw_if_possible_completed(false);
        sm.finish_commit();
        assert_eq!(drain(&mut sm), [Action::Commit, Action::DrawIfPossible]);
        sm.did_leave_begin_frame();
    }

    #[test]
    fn main_thread_takes_textures_when_impl_is_not_drawing() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_main_thread_needs_layer_textures();
        assert_eq!(
            drain(&mut sm),
            [
                Action::AcquireLayerTexturesForMainThread,
                Action::SendBeginFrameToMainThread
            ]
        );
        assert_eq!(sm.texture_state(), TextureState::AcquiredByMainThread);
        assert!(sm.draw_suspended_until_commit());

        sm.finish_commit();
        assert_eq!(drain(&mut sm), [Action::Commit]);
        assert_eq!(sm.texture_state(), TextureState::AcquiredByImplThread);
    }

    #[test]
    fn texture_hand_off_precedes_surface_creation() {
        let mut sm = started(SchedulerSettings::new());
        sm.did_lose_output_surface();
        sm.set_main_thread_needs_layer_textures();
        assert_eq!(
            sm.next_action(),
            Some(Action::AcquireLayerTexturesForMainThread),
            "main thread is unblocked first"
        );
        sm.update_state(Action::AcquireLayerTexturesForMainThread);
        assert_eq!(
            sm.next_action(),
            Some(Action::BeginOutputSurfaceCreation),
            "then the surface is recreated"
        );
    }

    #[test]
    fn main_thread_waits_for_impl_draw_before_taking_textures() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_needs_commit();
        drain(&mut sm);
        sm.finish_commit();
        drain(&mut sm);
        assert_eq!(sm.texture_state(), TextureState::AcquiredByImplThread);

        sm.set_main_thread_needs_layer_textures();
        assert_eq!(sm.next_action(), None, "impl thread is about to draw");
        in_frame(&mut sm, |sm| {
            assert_eq!(
                drain(sm),
                [
                    Action::DrawIfPossible,
                    Action::AcquireLayerTexturesForMainThread
                ]
            );
        });
    }

    #[test]
    fn impl_side_painting_checks_tiles_and_activates_once_per_frame() {
        let mut sm = started(SchedulerSettings::impl_side_painting());
        sm.set_needs_commit();
        drain(&mut sm);
        sm.finish_commit();
        assert_eq!(drain(&mut sm), [Action::Commit]);
        assert!(!sm.needs_redraw(), "draw follows activation instead");
        sm.set_has_pending_tree(true);
        assert!(sm.begin_frame_needed_by_impl_thread());

        in_frame(&mut sm, |sm| {
            assert_eq!(
                drain(sm),
                [
                    Action::CheckForCompletedTileUploads,
                    Action::ActivatePendingTreeIfNeeded
                ]
            );
        });
        in_frame(&mut sm, |sm| {
            assert_eq!(sm.next_action(), Some(Action::CheckForCompletedTileUploads));
            sm.update_state(Action::CheckForCompletedTileUploads);
            assert_eq!(sm.next_action(), Some(Action::ActivatePendingTreeIfNeeded));
            sm.update_state(Action::ActivatePendingTreeIfNeeded);
            sm.set_has_pending_tree(false);
            sm.set_needs_redraw();
            assert_eq!(drain(sm), [Action::DrawIfPossible]);
        });
        assert_eq!(sm.commit_state(), CommitState::Idle);
    }

    #[test]
    fn pending_tree_blocks_next_begin_frame_to_main() {
        let mut sm = started(SchedulerSettings::impl_side_painting());
        sm.set_has_pending_tree(true);
        sm.set_needs_commit();
        assert_eq!(sm.next_action(), None);
        sm.set_has_pending_tree(false);
        assert_eq!(sm.next_action(), Some(Action::SendBeginFrameToMainThread));
    }

    #[test]
    fn settled_machine_stays_settled() {
        let mut sm = started(SchedulerSettings::new());
        sm.set_needs_commit();
        sm.set_needs_redraw();
        sm.did_enter_begin_frame();
        assert!(!drain(&mut sm).is_empty());
        assert!(drain(&mut sm).is_empty());
        assert_eq!(sm.next_action(), None);
    }

    #[test]
    fn frame_bracketing_advances_frame_number() {
        let mut sm = SchedulerStateMachine::new(SchedulerSettings::new());
        assert_eq!(sm.current_frame_number(), 0);
        sm.did_enter_begin_frame();
        sm.set_frame_time(HostTime(16_666));
        assert!(sm.inside_begin_frame());
        sm.did_leave_begin_frame();
        assert!(!sm.inside_begin_frame());
        assert_eq!(sm.current_frame_number(), 1);
        assert_eq!(sm.last_frame_time(), Some(HostTime(16_666)));
    }

    #[test]
    fn action_codes_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_code(action.code()), Some(action));
        }
        assert_eq!(Action::from_code(8), None);
    }
}
