// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Scheduler activity is laid out on two tracks: `impl` carries begin-frames,
//! actions, and draws; `main` carries the begin-frames sent to the main
//! thread and the stimuli reported back. The vsync subscription is a counter
//! track.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use cadence_core::state_machine::Action;
use cadence_core::time::HostTime;

use crate::recorder::{RecordedEvent, decode};

const TID_IMPL: u32 = 1;
const TID_MAIN: u32 = 2;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Draws become complete (`X`) events spanning from their dispatch to their
/// result; everything else is an instant or counter event.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> =
        vec![thread_name(TID_IMPL, "impl"), thread_name(TID_MAIN, "main")];
    let mut draw_started: Option<HostTime> = None;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::BeginFrame(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "BeginFrame",
                    "cat": "Scheduler",
                    "ts": e.frame_time.micros(),
                    "pid": 0,
                    "tid": TID_IMPL,
                    "s": "g",
                    "args": {
                        "frame_number": e.frame_number,
                    }
                }));
            }
            RecordedEvent::Action(e) => {
                if matches!(e.action, Action::DrawIfPossible | Action::DrawForced) {
                    draw_started = Some(e.timestamp);
                    continue;
                }
                let tid = match e.action {
                    Action::SendBeginFrameToMainThread => TID_MAIN,
                    _ => TID_IMPL,
                };
                events.push(json!({
                    "ph": "i",
                    "name": e.action.as_str(),
                    "cat": "Action",
                    "ts": e.timestamp.micros(),
                    "pid": 0,
                    "tid": tid,
                    "s": "t",
                    "args": {
                        "frame_number": e.frame_number,
                        "inside_begin_frame": e.inside_begin_frame,
                    }
                }));
            }
            RecordedEvent::Draw(e) => {
                let start = draw_started.take().unwrap_or(e.timestamp);
                events.push(json!({
                    "ph": "X",
                    "name": if e.forced { "DrawForced" } else { "DrawIfPossible" },
                    "cat": "Draw",
                    "ts": start.micros(),
                    "dur": e.timestamp.saturating_duration_since(start).micros(),
                    "pid": 0,
                    "tid": TID_IMPL,
                    "args": {
                        "frame_number": e.frame_number,
                        "did_draw": e.did_draw,
                        "did_swap": e.did_swap,
                    }
                }));
            }
            RecordedEvent::NeedsBeginFrame(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "NeedsBeginFrame",
                    "cat": "Scheduler",
                    "ts": e.timestamp.micros(),
                    "pid": 0,
                    "args": {
                        "enabled": u8::from(e.enabled),
                    }
                }));
            }
            RecordedEvent::Stimulus(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": e.stimulus.as_str(),
                    "cat": "Stimulus",
                    "ts": e.timestamp.micros(),
                    "pid": 0,
                    "tid": TID_MAIN,
                    "s": "t",
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                let actions: Vec<&str> = s.actions.iter().map(Action::as_str).collect();
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": s.frame_time.micros(),
                    "pid": 0,
                    "tid": TID_IMPL,
                    "s": "t",
                    "args": {
                        "frame_number": s.frame_number,
                        "actions": actions,
                        "did_swap": s.did_swap,
                        "needs_begin_frame": s.needs_begin_frame,
                        "anticipated_draw_us": s.anticipated_draw_time.micros(),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn thread_name(tid: u32, name: &str) -> Value {
    json!({
        "ph": "M",
        "name": "thread_name",
        "pid": 0,
        "tid": tid,
        "args": { "name": name },
    })
}
