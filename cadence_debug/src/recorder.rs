// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records, one tag byte followed by
//! the event fields. [`decode`] reads them back as an iterator of
//! [`RecordedEvent`], stopping at the first unknown tag, unknown action or
//! stimulus code, or truncated record.

use cadence_core::state_machine::Action;
use cadence_core::time::HostTime;
use cadence_core::trace::{
    ActionEvent, ActionSet, BeginFrameEvent, DrawEvent, FrameSummary, NeedsBeginFrameEvent,
    Stimulus, StimulusEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_BEGIN_FRAME: u8 = 1;
const TAG_ACTION: u8 = 2;
const TAG_DRAW: u8 = 3;
const TAG_NEEDS_BEGIN_FRAME: u8 = 4;
const TAG_STIMULUS: u8 = 5;
const TAG_FRAME_SUMMARY: u8 = 6;

const DRAW_FORCED: u8 = 1 << 0;
const DRAW_DID_DRAW: u8 = 1 << 1;
const DRAW_DID_SWAP: u8 = 1 << 2;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_time(&mut self, t: HostTime) {
        self.write_u64(t.micros());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }
}

impl TraceSink for RecorderSink {
    fn on_begin_frame(&mut self, e: &BeginFrameEvent) {
        self.write_u8(TAG_BEGIN_FRAME);
        self.write_u64(e.frame_number);
        self.write_time(e.frame_time);
    }

    fn on_action(&mut self, e: &ActionEvent) {
        self.write_u8(TAG_ACTION);
        self.write_u64(e.frame_number);
        self.write_u8(e.action.code());
        self.write_time(e.timestamp);
        self.write_bool(e.inside_begin_frame);
    }

    fn on_draw(&mut self, e: &DrawEvent) {
        let mut flags = 0;
        if e.forced {
            flags |= DRAW_FORCED;
        }
        if e.did_draw {
            flags |= DRAW_DID_DRAW;
        }
        if e.did_swap {
            flags |= DRAW_DID_SWAP;
        }
        self.write_u8(TAG_DRAW);
        self.write_u64(e.frame_number);
        self.write_u8(flags);
        self.write_time(e.timestamp);
    }

    fn on_needs_begin_frame(&mut self, e: &NeedsBeginFrameEvent) {
        self.write_u8(TAG_NEEDS_BEGIN_FRAME);
        self.write_bool(e.enabled);
        self.write_time(e.timestamp);
    }

    fn on_stimulus(&mut self, e: &StimulusEvent) {
        self.write_u8(TAG_STIMULUS);
        self.write_u8(e.stimulus.code());
        self.write_time(e.timestamp);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_number);
        self.write_time(s.frame_time);
        self.write_u16(s.actions.0);
        self.write_bool(s.did_swap);
        self.write_bool(s.needs_begin_frame);
        self.write_time(s.anticipated_draw_time);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`BeginFrameEvent`].
    BeginFrame(BeginFrameEvent),
    /// An [`ActionEvent`].
    Action(ActionEvent),
    /// A [`DrawEvent`].
    Draw(DrawEvent),
    /// A [`NeedsBeginFrameEvent`].
    NeedsBeginFrame(NeedsBeginFrameEvent),
    /// A [`StimulusEvent`].
    Stimulus(StimulusEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
}

impl RecordedEvent {
    /// Replays the event into `sink`.
    pub fn replay(&self, sink: &mut impl TraceSink) {
        match self {
            Self::BeginFrame(e) => sink.on_begin_frame(e),
            Self::Action(e) => sink.on_action(e),
            Self::Draw(e) => sink.on_draw(e),
            Self::NeedsBeginFrame(e) => sink.on_needs_begin_frame(e),
            Self::Stimulus(e) => sink.on_stimulus(e),
            Self::FrameSummary(s) => sink.on_frame_summary(s),
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u16(&mut self) -> Option<u16> {
        self.take().map(u16::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    fn decode_begin_frame(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::BeginFrame(BeginFrameEvent {
            frame_number: self.read_u64()?,
            frame_time: self.read_time()?,
        }))
    }

    fn decode_action(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Action(ActionEvent {
            frame_number: self.read_u64()?,
            action: Action::from_code(self.read_u8()?)?,
            timestamp: self.read_time()?,
            inside_begin_frame: self.read_bool()?,
        }))
    }

    fn decode_draw(&mut self) -> Option<RecordedEvent> {
        let frame_number = self.read_u64()?;
        let flags = self.read_u8()?;
        Some(RecordedEvent::Draw(DrawEvent {
            frame_number,
            forced: flags & DRAW_FORCED != 0,
            did_draw: flags & DRAW_DID_DRAW != 0,
            did_swap: flags & DRAW_DID_SWAP != 0,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_needs_begin_frame(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::NeedsBeginFrame(NeedsBeginFrameEvent {
            enabled: self.read_bool()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_stimulus(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Stimulus(StimulusEvent {
            stimulus: Stimulus::from_code(self.read_u8()?)?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_number: self.read_u64()?,
            frame_time: self.read_time()?,
            actions: ActionSet(self.read_u16()?),
            did_swap: self.read_bool()?,
            needs_begin_frame: self.read_bool()?,
            anticipated_draw_time: self.read_time()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let event = match tag {
            TAG_BEGIN_FRAME => self.decode_begin_frame(),
            TAG_ACTION => self.decode_action(),
            TAG_DRAW => self.decode_draw(),
            TAG_NEEDS_BEGIN_FRAME => self.decode_needs_begin_frame(),
            TAG_STIMULUS => self.decode_stimulus(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            _ => None,
        };
        if event.is_none() {
            // Past a malformed record nothing lines up; stay exhausted.
            self.pos = self.data.len();
        }
        event
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record_frame(rec: &mut RecorderSink) {
        rec.on_begin_frame(&BeginFrameEvent {
            frame_number: 7,
            frame_time: HostTime(116_662),
        });
        rec.on_action(&ActionEvent {
            frame_number: 7,
            action: Action::DrawForced,
            timestamp: HostTime(116_700),
            inside_begin_frame: true,
        });
        rec.on_draw(&DrawEvent {
            frame_number: 7,
            forced: true,
            did_draw: true,
            did_swap: false,
            timestamp: HostTime(118_000),
        });
        rec.on_needs_begin_frame(&NeedsBeginFrameEvent {
            enabled: false,
            timestamp: HostTime(118_001),
        });
        let mut actions = ActionSet::EMPTY;
        actions.insert(Action::DrawForced);
        rec.on_frame_summary(&FrameSummary {
            frame_number: 7,
            frame_time: HostTime(116_662),
            actions,
            did_swap: false,
            needs_begin_frame: false,
            anticipated_draw_time: HostTime(133_328),
        });
    }

    #[test]
    fn frame_decodes_in_order() {
        let mut rec = RecorderSink::new();
        record_frame(&mut rec);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], RecordedEvent::BeginFrame(_)));
        match &events[1] {
            RecordedEvent::Action(e) => {
                assert_eq!(e.action, Action::DrawForced);
                assert!(e.inside_begin_frame);
            }
            other => panic!("expected Action, got {other:?}"),
        }
        match &events[2] {
            RecordedEvent::Draw(e) => {
                assert!(e.forced && e.did_draw && !e.did_swap, "{e:?}");
                assert_eq!(e.timestamp, HostTime(118_000));
            }
            other => panic!("expected Draw, got {other:?}"),
        }
        assert!(matches!(
            events[3],
            RecordedEvent::NeedsBeginFrame(NeedsBeginFrameEvent { enabled: false, .. })
        ));
        match &events[4] {
            RecordedEvent::FrameSummary(s) => {
                assert!(s.actions.contains(Action::DrawForced));
                assert!(!s.actions.contains(Action::DrawIfPossible));
                assert_eq!(s.anticipated_draw_time, HostTime(133_328));
            }
            other => panic!("expected FrameSummary, got {other:?}"),
        }
    }

    #[test]
    fn stimulus_survives_recording() {
        let mut rec = RecorderSink::new();
        rec.on_stimulus(&StimulusEvent {
            stimulus: Stimulus::OutputSurfaceLost,
            timestamp: HostTime(42),
        });
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match &events[..] {
            [RecordedEvent::Stimulus(e)] => {
                assert_eq!(e.stimulus, Stimulus::OutputSurfaceLost);
                assert_eq!(e.timestamp, HostTime(42));
            }
            other => panic!("expected one Stimulus, got {other:?}"),
        }
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        record_frame(&mut rec);
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 3]).collect();
        assert_eq!(events.len(), 4, "the cut summary is dropped");
    }

    #[test]
    fn unknown_action_code_stops_decoding() {
        let mut rec = RecorderSink::new();
        record_frame(&mut rec);
        let mut bytes = rec.into_bytes();
        // Begin-frame record is 17 bytes; the action code follows the next
        // tag and frame number.
        bytes[17 + 1 + 8] = 0xff;
        let events: Vec<_> = decode(&bytes).collect();
        assert_eq!(events.len(), 1);

        let mut iter = decode(&bytes);
        assert!(iter.next().is_some(), "begin-frame decodes");
        assert!(iter.next().is_none(), "bad action code");
        assert!(iter.next().is_none(), "decoder stays exhausted");
    }

    #[test]
    fn replay_feeds_another_sink() {
        let mut rec = RecorderSink::new();
        record_frame(&mut rec);
        let mut copy = RecorderSink::new();
        for event in decode(rec.as_bytes()) {
            event.replay(&mut copy);
        }
        assert_eq!(copy.as_bytes(), rec.as_bytes());
    }
}
