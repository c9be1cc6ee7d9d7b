// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Times are
//! printed in milliseconds.

use std::io::Write;

use cadence_core::time::HostTime;
use cadence_core::trace::{
    ActionEvent, BeginFrameEvent, DrawEvent, FrameSummary, NeedsBeginFrameEvent, StimulusEvent,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    show_actions: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("show_actions", &self.show_actions)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            show_actions: true,
        }
    }

    /// Controls whether individual action lines are printed.
    ///
    /// Frame summaries list the actions of each begin-frame either way.
    #[must_use]
    pub fn show_actions(mut self, show: bool) -> Self {
        self.show_actions = show;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.micros() as f64 / 1000.0
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_begin_frame(&mut self, e: &BeginFrameEvent) {
        let _ = writeln!(
            self.writer,
            "[begin] frame={} t={:.3}ms",
            e.frame_number,
            ms(e.frame_time),
        );
    }

    fn on_action(&mut self, e: &ActionEvent) {
        if !self.show_actions {
            return;
        }
        let origin = if e.inside_begin_frame { "vsync" } else { "stimulus" };
        let _ = writeln!(
            self.writer,
            "[action] frame={} {} ({origin}) at {:.3}ms",
            e.frame_number,
            e.action.as_str(),
            ms(e.timestamp),
        );
    }

    fn on_draw(&mut self, e: &DrawEvent) {
        let kind = if e.forced { "forced" } else { "if-possible" };
        let outcome = match (e.did_draw, e.did_swap) {
            (_, true) => "swapped",
            (true, false) => "drawn",
            (false, false) => "FAILED",
        };
        let _ = writeln!(
            self.writer,
            "[draw] frame={} {kind} {outcome}",
            e.frame_number,
        );
    }

    fn on_needs_begin_frame(&mut self, e: &NeedsBeginFrameEvent) {
        let state = if e.enabled { "on" } else { "off" };
        let _ = writeln!(
            self.writer,
            "[vsync] {state} at {:.3}ms",
            ms(e.timestamp),
        );
    }

    fn on_stimulus(&mut self, e: &StimulusEvent) {
        let _ = writeln!(
            self.writer,
            "[stimulus] {} at {:.3}ms",
            e.stimulus.as_str(),
            ms(e.timestamp),
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let swap = if s.did_swap { "swap" } else { "no-swap" };
        let mut actions = String::new();
        for (i, action) in s.actions.iter().enumerate() {
            if i > 0 {
                actions.push(',');
            }
            actions.push_str(action.as_str());
        }
        let _ = writeln!(
            self.writer,
            "[summary] frame={} {swap} vsync={} next={:.3}ms actions=[{actions}]",
            s.frame_number,
            if s.needs_begin_frame { "on" } else { "off" },
            ms(s.anticipated_draw_time),
        );
    }
}
