// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the scheduler.
//!
//! The [`Scheduler`](crate::scheduler::Scheduler) reports every begin-frame,
//! dispatched action, draw outcome, vsync toggle, and external stimulus to a
//! [`TraceSink`]. All sink methods default to no-ops, so implementing only the
//! events you care about is fine. The default sink, [`NoopSink`], discards
//! everything and costs nothing after inlining.
//!
//! [`FrameSummaryBuilder`] collects what happened inside one begin-frame and
//! produces a [`FrameSummary`] at the end.

use crate::state_machine::Action;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums and sets
// ---------------------------------------------------------------------------

/// An externally reported event that moved the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stimulus {
    /// The main thread finished its frame.
    FinishCommit,
    /// The main thread declined its frame.
    BeginFrameAborted,
    /// The output surface was lost.
    OutputSurfaceLost,
    /// A new output surface is ready.
    OutputSurfaceCreated,
}

impl Stimulus {
    /// Every stimulus, in wire-code order.
    pub const ALL: [Self; 4] = [
        Self::FinishCommit,
        Self::BeginFrameAborted,
        Self::OutputSurfaceLost,
        Self::OutputSurfaceCreated,
    ];

    /// Stable numeric code, used by recorders.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::FinishCommit => 0,
            Self::BeginFrameAborted => 1,
            Self::OutputSurfaceLost => 2,
            Self::OutputSurfaceCreated => 3,
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
            Self::FinishCommit => "FinishCommit",
            Self::BeginFrameAborted => "BeginFrameAborted",
            Self::OutputSurfaceLost => "OutputSurfaceLost",
            Self::OutputSurfaceCreated => "OutputSurfaceCreated",
        }
    }
}

/// A set of [`Action`]s, stored as a bitmask over [`Action::code`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ActionSet(pub u16);

impl ActionSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Adds `action` to the set.
    #[inline]
    pub fn insert(&mut self, action: Action) {
        self.0 |= 1 << action.code();
    }

    /// Returns `true` if `action` is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, action: Action) -> bool {
        self.0 & (1 << action.code()) != 0
    }

    /// Returns `true` if no action is in the set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the actions in the set, in code order.
    pub fn iter(self) -> impl Iterator<Item = Action> {
        Action::ALL.into_iter().filter(move |a| self.contains(*a))
    }
}

impl core::fmt::Debug for ActionSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a vsync begin-frame is delivered to the scheduler.
#[derive(Clone, Copy, Debug)]
pub struct BeginFrameEvent {
    /// State machine frame number for this begin-frame.
    pub frame_number: u64,
    /// Vsync timestamp.
    pub frame_time: HostTime,
}

/// Emitted when the scheduler dispatches an action to its client.
#[derive(Clone, Copy, Debug)]
pub struct ActionEvent {
    /// State machine frame number at dispatch.
    pub frame_number: u64,
    /// Which action.
    pub action: Action,
    /// Clock reading at dispatch.
    pub timestamp: HostTime,
    /// Whether the action ran inside a begin-frame.
    pub inside_begin_frame: bool,
}

/// Emitted after a draw-and-swap returns.
#[derive(Clone, Copy, Debug)]
pub struct DrawEvent {
    /// State machine frame number of the draw.
    pub frame_number: u64,
    /// `true` for [`Action::DrawForced`].
    pub forced: bool,
    /// Whether a frame was drawn.
    pub did_draw: bool,
    /// Whether a frame was swapped to the display.
    pub did_swap: bool,
    /// Clock reading when the draw returned.
    pub timestamp: HostTime,
}

/// Emitted when the scheduler turns vsync callbacks on or off.
#[derive(Clone, Copy, Debug)]
pub struct NeedsBeginFrameEvent {
    /// New vsync subscription state.
    pub enabled: bool,
    /// Clock reading at the change.
    pub timestamp: HostTime,
}

/// Emitted when an external stimulus arrives.
#[derive(Clone, Copy, Debug)]
pub struct StimulusEvent {
    /// Which stimulus.
    pub stimulus: Stimulus,
    /// Clock reading on arrival.
    pub timestamp: HostTime,
}

/// Per-begin-frame summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct FrameSummary {
    /// State machine frame number.
    pub frame_number: u64,
    /// Vsync timestamp.
    pub frame_time: HostTime,
    /// Actions dispatched during the begin-frame.
    pub actions: ActionSet,
    /// Whether any draw in the begin-frame swapped.
    pub did_swap: bool,
    /// Vsync subscription state when the begin-frame ended.
    pub needs_begin_frame: bool,
    /// Predicted time of the next draw.
    pub anticipated_draw_time: HostTime,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the scheduler.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a begin-frame starts.
    fn on_begin_frame(&mut self, e: &BeginFrameEvent) {
        _ = e;
    }

    /// Called before an action is dispatched to the client.
    fn on_action(&mut self, e: &ActionEvent) {
        _ = e;
    }

    /// Called after a draw-and-swap returns.
    fn on_draw(&mut self, e: &DrawEvent) {
        _ = e;
    }

    /// Called when the vsync subscription changes.
    fn on_needs_begin_frame(&mut self, e: &NeedsBeginFrameEvent) {
        _ = e;
    }

    /// Called when an external stimulus arrives.
    fn on_stimulus(&mut self, e: &StimulusEvent) {
        _ = e;
    }

    /// Called with a summary at the end of each begin-frame.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }
}

impl<T: TraceSink + ?Sized> TraceSink for &mut T {
    fn on_begin_frame(&mut self, e: &BeginFrameEvent) {
        (**self).on_begin_frame(e);
    }

    fn on_action(&mut self, e: &ActionEvent) {
        (**self).on_action(e);
    }

    fn on_draw(&mut self, e: &DrawEvent) {
        (**self).on_draw(e);
    }

    fn on_needs_begin_frame(&mut self, e: &NeedsBeginFrameEvent) {
        (**self).on_needs_begin_frame(e);
    }

    fn on_stimulus(&mut self, e: &StimulusEvent) {
        (**self).on_stimulus(e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        (**self).on_frame_summary(s);
    }
}

/// Fans events out to two sinks, `A` first.
impl<A: TraceSink, B: TraceSink> TraceSink for (A, B) {
    fn on_begin_frame(&mut self, e: &BeginFrameEvent) {
        self.0.on_begin_frame(e);
        self.1.on_begin_frame(e);
    }

    fn on_action(&mut self, e: &ActionEvent) {
        self.0.on_action(e);
        self.1.on_action(e);
    }

    fn on_draw(&mut self, e: &DrawEvent) {
        self.0.on_draw(e);
        self.1.on_draw(e);
    }

    fn on_needs_begin_frame(&mut self, e: &NeedsBeginFrameEvent) {
        self.0.on_needs_begin_frame(e);
        self.1.on_needs_begin_frame(e);
    }

    fn on_stimulus(&mut self, e: &StimulusEvent) {
        self.0.on_stimulus(e);
        self.1.on_stimulus(e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.0.on_frame_summary(s);
        self.1.on_frame_summary(s);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects what happens during one begin-frame and produces a
/// [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    begin: BeginFrameEvent,
    actions: ActionSet,
    did_swap: bool,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the given begin-frame.
    #[must_use]
    pub fn new(begin: &BeginFrameEvent) -> Self {
        Self {
            begin: *begin,
            actions: ActionSet::EMPTY,
            did_swap: false,
        }
    }

    /// Records a dispatched action.
    pub fn action(&mut self, action: Action) {
        self.actions.insert(action);
    }

    /// Records a draw outcome.
    pub fn draw(&mut self, did_swap: bool) {
        self.did_swap |= did_swap;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self, needs_begin_frame: bool, anticipated_draw_time: HostTime) -> FrameSummary {
        FrameSummary {
            frame_number: self.begin.frame_number,
            frame_time: self.begin.frame_time,
            actions: self.actions,
            did_swap: self.did_swap,
            needs_begin_frame,
            anticipated_draw_time,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
