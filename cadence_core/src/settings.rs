// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scheduler capability settings.

use crate::time::Duration;

/// Capability flags that shape scheduling policy.
///
/// Settings are fixed for the lifetime of a
/// [`Scheduler`](crate::scheduler::Scheduler).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SchedulerSettings {
    /// Commits produce a pending tree that is activated separately.
    ///
    /// A commit then no longer implies a redraw (drawing follows activation),
    /// and completed tile uploads are polled each frame.
    pub impl_side_painting: bool,
    /// Force a draw after repeated checkerboarded draw attempts.
    pub timeout_and_draw_when_animation_checkerboards: bool,
    /// Consecutive failed `DrawIfPossible` attempts before the draw following
    /// the next commit is forced.
    pub maximum_number_of_failed_draws_before_draw_is_forced: u32,
    /// The host compositor draws synchronously and needs begin-frame disables
    /// delivered immediately rather than on the next tick.
    pub using_synchronous_renderer_compositor: bool,
    /// Vsync period used to predict the next draw time.
    pub begin_frame_interval: Duration,
}

impl SchedulerSettings {
    /// Vsync period of a 60 Hz display.
    pub const DEFAULT_BEGIN_FRAME_INTERVAL: Duration = Duration(16_666);

    /// Default settings: threaded compositor, commit-then-draw, 60 Hz.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            impl_side_painting: false,
            timeout_and_draw_when_animation_checkerboards: true,
            maximum_number_of_failed_draws_before_draw_is_forced: 3,
            using_synchronous_renderer_compositor: false,
            begin_frame_interval: Self::DEFAULT_BEGIN_FRAME_INTERVAL,
        }
    }

    /// Settings for a host that composites synchronously.
    #[must_use]
    pub const fn synchronous_compositor() -> Self {
        Self {
            using_synchronous_renderer_compositor: true,
            ..Self::new()
        }
    }

    /// Settings for a host that rasterizes on the impl thread and activates
    /// pending trees.
    #[must_use]
    pub const fn impl_side_painting() -> Self {
        Self {
            impl_side_painting: true,
            ..Self::new()
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_only_differ_in_their_flag() {
        let base = SchedulerSettings::new();
        assert_eq!(base, SchedulerSettings::default());
        assert_eq!(base.begin_frame_interval, Duration(16_666));

        let sync = SchedulerSettings::synchronous_compositor();
        assert!(sync.using_synchronous_renderer_compositor);
        assert_eq!(
            SchedulerSettings {
                using_synchronous_renderer_compositor: false,
                ..sync
            },
            base
        );

        let isp = SchedulerSettings::impl_side_painting();
        assert!(isp.impl_side_painting);
        assert_eq!(
            isp.maximum_number_of_failed_draws_before_draw_is_forced,
            3
        );
    }
}
