// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Swap pacing metrics and grading.

use alloc::string::String;

/// Per-swap sample fed into [`PacingTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct PacingSample {
    /// Time since the previous swap, in milliseconds.
    pub frame_delta_ms: f64,
    /// At least one vsync went by without a swap.
    pub missed: bool,
}

/// Letter grade for swap pacing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacingGrade {
    /// Swaps on (nearly) every vsync.
    A,
    /// Occasional skipped vsyncs.
    B,
    /// Frequent skipped vsyncs.
    C,
    /// Pacing has broken down.
    D,
}

impl PacingGrade {
    /// Returns a short label for reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    fn for_miss_rate(miss_rate_per_1000: f64) -> Self {
        if miss_rate_per_1000 < 20.0 {
            Self::A
        } else if miss_rate_per_1000 < 50.0 {
            Self::B
        } else if miss_rate_per_1000 < 150.0 {
            Self::C
        } else {
            Self::D
        }
    }
}

/// Aggregated report returned by [`PacingTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct PacingReport {
    /// Current grade.
    pub grade: PacingGrade,
    /// Missed swaps per 1000 observed swaps.
    pub miss_rate_per_1000: f64,
    /// Total swaps observed.
    pub total_frames: u64,
    /// Swaps that arrived late.
    pub missed_frames: u64,
}

/// Rolling pacing tracker with fixed-size frame-delta history.
#[derive(Debug)]
pub struct PacingTracker<const N: usize> {
    deltas_ms: [f64; N],
    cursor: usize,
    total_frames: u64,
    missed_frames: u64,
}

impl<const N: usize> Default for PacingTracker<N> {
    fn default() -> Self {
        Self::new(16.67)
    }
}

impl<const N: usize> PacingTracker<N> {
    /// Creates a tracker with `seed_delta_ms` prefilled in the ring buffer.
    #[must_use]
    pub const fn new(seed_delta_ms: f64) -> Self {
        Self {
            deltas_ms: [seed_delta_ms; N],
            cursor: 0,
            total_frames: 0,
            missed_frames: 0,
        }
    }

    /// Observes one swap and returns an updated report.
    pub fn observe(&mut self, sample: PacingSample) -> PacingReport {
        self.total_frames = self.total_frames.saturating_add(1);
        self.deltas_ms[self.cursor % N] = sample.frame_delta_ms;
        self.cursor = (self.cursor + 1) % N;
        if sample.missed {
            self.missed_frames = self.missed_frames.saturating_add(1);
        }
        self.report()
    }

    /// Returns the report for everything observed so far.
    #[must_use]
    pub fn report(&self) -> PacingReport {
        let miss_rate = if self.total_frames == 0 {
            0.0
        } else {
            self.missed_frames as f64 * 1000.0 / self.total_frames as f64
        };
        PacingReport {
            grade: PacingGrade::for_miss_rate(miss_rate),
            miss_rate_per_1000: miss_rate,
            total_frames: self.total_frames,
            missed_frames: self.missed_frames,
        }
    }

    /// Returns ring-buffer frame deltas oldest→newest.
    #[must_use]
    pub fn frame_deltas(&self) -> [f64; N] {
        let mut out = [0.0; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.deltas_ms[(self.cursor + i) % N];
        }
        out
    }

    /// Returns an ASCII sparkline over `frame_deltas()`.
    #[must_use]
    pub fn sparkline_ascii(&self, min_ms: f64, max_ms: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        let mut out = String::with_capacity(N);
        for v in self.frame_deltas() {
            let t = (v.clamp(min_ms, max_ms) - min_ms) / (max_ms - min_ms);
            #[expect(
                clippy::cast_possible_truncation,
                reason = "index is clamped to ASCII level count"
            )]
            let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
            out.push(LEVELS[level] as char);
        }
        out
    }
}
