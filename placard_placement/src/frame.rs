// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame bookkeeping: the clock, budgets, and counters.

use std::time::Instant;

/// Monotonic time source in milliseconds.
pub trait FrameClock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> f64;
}

/// [`FrameClock`] backed by [`Instant`].
#[derive(Copy, Clone, Debug)]
pub struct InstantClock {
    origin: Instant,
}

impl InstantClock {
    /// Clock starting at zero now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for InstantClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// A point in time after which budgeted work stops.
#[derive(Copy, Clone)]
pub struct Deadline<'a> {
    clock: &'a dyn FrameClock,
    at_ms: f64,
}

impl<'a> Deadline<'a> {
    /// Deadline `budget_ms` from now.
    pub fn after(clock: &'a dyn FrameClock, budget_ms: f64) -> Self {
        Self {
            at_ms: clock.now_ms() + budget_ms,
            clock,
        }
    }

    /// Whether the deadline has passed. Polls the clock.
    pub fn expired(&self) -> bool {
        self.clock.now_ms() > self.at_ms
    }
}

impl core::fmt::Debug for Deadline<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Deadline")
            .field("at_ms", &self.at_ms)
            .finish_non_exhaustive()
    }
}

/// Counters of one frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PlacementStats {
    /// Candidates with anything drawn at full placement (not fading out).
    pub rendered: usize,
    /// Of those, candidates already visible in the previous frame.
    pub persistent: usize,
    /// Of those, candidates newly shown.
    pub new: usize,
    /// Candidates that lost their space to a higher priority label.
    pub rejected: usize,
    /// Candidates off screen, hidden, or with no space as new labels.
    pub invisible: usize,
    /// Candidates beyond the view distance or the horizon.
    pub too_far: usize,
    /// Candidates waiting for a POI table.
    pub not_ready: usize,
    /// Candidates represented by a duplicate.
    pub duplicate: usize,
    /// Candidates skipped because the label cap was reached.
    pub skipped_by_cap: usize,
    /// Candidates skipped because the time budget ran out.
    pub skipped_by_budget: usize,
    /// New candidates held back while the camera moves.
    pub deferred: usize,
    /// Candidates skipped because their glyphs could not be measured.
    pub malformed: usize,
    /// Elements still fading out.
    pub fading_out: usize,
}

/// Mutable state threaded through one frame of placement.
#[derive(Debug)]
pub struct FrameContext {
    /// Frame counter.
    pub frame_number: u64,
    /// Time of the frame in milliseconds, used for fading.
    pub now: f64,
    /// Whether the candidate count is above the overload threshold.
    pub overloaded: bool,
    /// Whether the camera is moving.
    pub camera_moving: bool,
    /// Candidates placed so far, excluding negative priorities.
    pub placed: usize,
    /// Label cap.
    pub max_placed: usize,
    /// Whether any element still animates and needs another frame.
    pub animating: bool,
    /// Counters.
    pub stats: PlacementStats,
}

impl FrameContext {
    /// Context for a new frame.
    pub fn new(frame_number: u64, now: f64, max_placed: usize) -> Self {
        Self {
            frame_number,
            now,
            overloaded: false,
            camera_moving: false,
            placed: 0,
            max_placed,
            animating: false,
            stats: PlacementStats::default(),
        }
    }

    /// Whether the label cap has been reached.
    pub fn is_full(&self) -> bool {
        self.placed >= self.max_placed
    }
}

/// What [`PlacementScheduler::place_frame`](crate::PlacementScheduler::place_frame) did.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_number: u64,
    /// Counters.
    pub stats: PlacementStats,
    /// Whether the frame ran in overload mode.
    pub overloaded: bool,
    /// Whether the priority walk was cut short by the time budget.
    pub budget_exhausted: bool,
    /// Whether the group state cache was refreshed, completely or in part.
    pub cache_refreshed: bool,
    /// Whether some element is still fading and the host should draw another frame.
    pub needs_redraw: bool,
    /// Wall time spent in the frame.
    pub elapsed_ms: f64,
}
