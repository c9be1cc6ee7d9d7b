// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client contract between the scheduler and its host compositor.
//!
//! The [`Scheduler`](crate::scheduler::Scheduler) decides *when* work
//! happens; the host performs it. Hosts implement [`SchedulerClient`]:
//!
//! - **Vsync subscription**: [`set_needs_begin_frame_on_impl_thread`] turns
//!   the platform's begin-frame source on or off. While on, the host calls
//!   [`Scheduler::begin_frame`](crate::scheduler::Scheduler::begin_frame)
//!   once per vsync.
//!
//! - **Scheduled actions**: one method per
//!   [`Action`](crate::state_machine::Action). Each receives a
//!   [`SchedulerInputs`] handle for reporting state changes the action
//!   caused (a commit producing a pending tree, a draw discovering a lost
//!   surface, and so on).
//!
//! - **Draw-time hint**: [`did_anticipated_draw_time_change`] lets the host
//!   align deadlines for work it runs outside the scheduler.
//!
//! # Reentrancy
//!
//! A client callback must not drive the scheduler. While an action runs the
//! scheduler is exclusively borrowed, so the only way back in is through
//! [`SchedulerInputs`], which updates the state machine without starting a
//! nested round of actions. The round already in progress sees the changes
//! when it asks for its next action.
//!
//! [`set_needs_begin_frame_on_impl_thread`]: SchedulerClient::set_needs_begin_frame_on_impl_thread
//! [`did_anticipated_draw_time_change`]: SchedulerClient::did_anticipated_draw_time_change

use crate::state_machine::SchedulerStateMachine;
use crate::time::HostTime;

/// Outcome of a draw-and-swap attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DrawAndSwapResult {
    /// A frame was drawn.
    pub did_draw: bool,
    /// The drawn frame was swapped to the display.
    pub did_swap: bool,
}

impl DrawAndSwapResult {
    /// Drew and swapped.
    pub const SWAPPED: Self = Self {
        did_draw: true,
        did_swap: true,
    };

    /// Nothing reached the display.
    pub const ABORTED: Self = Self {
        did_draw: false,
        did_swap: false,
    };
}

/// State changes a client may report while an action is running.
///
/// Each method forwards to the
/// [`SchedulerStateMachine`] stimulus of the same name. None of them runs
/// actions.
#[derive(Debug)]
pub struct SchedulerInputs<'a> {
    state_machine: &'a mut SchedulerStateMachine,
}

impl<'a> SchedulerInputs<'a> {
    pub(crate) fn new(state_machine: &'a mut SchedulerStateMachine) -> Self {
        Self { state_machine }
    }

    /// Read access to the state machine.
    #[must_use]
    pub fn state_machine(&self) -> &SchedulerStateMachine {
        self.state_machine
    }

    /// A committed tree now awaits activation, or no longer does.
    pub fn set_has_pending_tree(&mut self, has_pending_tree: bool) {
        self.state_machine.set_has_pending_tree(has_pending_tree);
    }

    /// Requests a draw on the next frame.
    pub fn set_needs_redraw(&mut self) {
        self.state_machine.set_needs_redraw();
    }

    /// Requests a forced draw.
    pub fn set_needs_forced_redraw(&mut self) {
        self.state_machine.set_needs_forced_redraw();
    }

    /// Requests another main-thread commit.
    pub fn set_needs_commit(&mut self) {
        self.state_machine.set_needs_commit();
    }

    /// Reports that the swap showed incomplete tiles.
    pub fn did_swap_use_incomplete_tile(&mut self) {
        self.state_machine.did_swap_use_incomplete_tile();
    }

    /// Reports whether the host can draw at all.
    pub fn set_can_draw(&mut self, can_draw: bool) {
        self.state_machine.set_can_draw(can_draw);
    }

    /// Reports that the output surface was lost mid-action.
    pub fn did_lose_output_surface(&mut self) {
        self.state_machine.did_lose_output_surface();
    }
}

/// Host-side operations the scheduler invokes.
///
/// Actions are delivered one at a time, in the order the state machine
/// chooses, never concurrently and never nested.
pub trait SchedulerClient {
    /// Turns vsync begin-frame callbacks on or off.
    fn set_needs_begin_frame_on_impl_thread(&mut self, enable: bool);

    /// Asks the main thread to produce a frame.
    ///
    /// The host later reports
    /// [`finish_commit`](crate::scheduler::Scheduler::finish_commit) or
    /// [`begin_frame_aborted_by_main_thread`](crate::scheduler::Scheduler::begin_frame_aborted_by_main_thread).
    fn scheduled_action_send_begin_frame_to_main_thread(
        &mut self,
        inputs: &mut SchedulerInputs<'_>,
    );

    /// Transfers the finished main-thread tree to the impl thread.
    fn scheduled_action_commit(&mut self, inputs: &mut SchedulerInputs<'_>);

    /// Polls completed tile uploads.
    fn scheduled_action_check_for_completed_tile_uploads(
        &mut self,
        inputs: &mut SchedulerInputs<'_>,
    );

    /// Activates the pending tree if its tiles are ready.
    ///
    /// Report activation with
    /// [`set_has_pending_tree(false)`](SchedulerInputs::set_has_pending_tree).
    fn scheduled_action_activate_pending_tree_if_needed(
        &mut self,
        inputs: &mut SchedulerInputs<'_>,
    );

    /// Draws and swaps if the frame is ready. A result with `did_draw` unset
    /// counts as a failed attempt.
    fn scheduled_action_draw_and_swap_if_possible(
        &mut self,
        inputs: &mut SchedulerInputs<'_>,
    ) -> DrawAndSwapResult;

    /// Draws and swaps whatever is available.
    fn scheduled_action_draw_and_swap_forced(
        &mut self,
        inputs: &mut SchedulerInputs<'_>,
    ) -> DrawAndSwapResult;

    /// Starts creating an output surface.
    ///
    /// The host later reports
    /// [`did_create_and_initialize_output_surface`](crate::scheduler::Scheduler::did_create_and_initialize_output_surface).
    fn scheduled_action_begin_output_surface_creation(
        &mut self,
        inputs: &mut SchedulerInputs<'_>,
    );

    /// Hands the layer texture lock to the main thread.
    fn scheduled_action_acquire_layer_textures_for_main_thread(
        &mut self,
        inputs: &mut SchedulerInputs<'_>,
    );

    /// The predicted next draw time changed.
    fn did_anticipated_draw_time_change(&mut self, time: HostTime) {
        _ = time;
    }
}
