// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`RenderState`]: the fade timeline of one drawable element.

use crate::ease::smootherstep;
use crate::types::{DEFAULT_FADE_TIME, FadingState};

/// Fade timeline of one drawable element (a label's text or its icon).
///
/// Times are milliseconds on any monotonic clock; frames are the placement
/// frame counter. A state that was not touched during the previous frame is
/// stale and is reset to [`FadingState::Undefined`] the next time it is
/// driven, so an element that left the view and came back fades in fresh.
///
/// `value` is the progress of the current transition in `[0, 1]`. Opacity
/// follows the [`smootherstep`] of that progress from 0 to 1 while fading
/// in and from 1 to 0 while fading out.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderState {
    state: FadingState,
    start_time: f64,
    value: f64,
    opacity: f64,
    fade_duration: f64,
    last_frame: Option<u64>,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new(DEFAULT_FADE_TIME)
    }
}

impl RenderState {
    /// Create an undefined state that fades over `fade_duration` milliseconds.
    ///
    /// Non-positive or non-finite durations make every transition immediate.
    pub fn new(fade_duration: f64) -> Self {
        Self {
            state: FadingState::Undefined,
            start_time: 0.0,
            value: 0.0,
            opacity: 0.0,
            fade_duration: sanitize_duration(fade_duration),
            last_frame: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> FadingState {
        self.state
    }

    /// Progress of the current transition in `[0, 1]`.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Current opacity in `[0, 1]`.
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Time the current transition started, possibly back-dated after a reversal.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Transition duration in milliseconds.
    pub fn fade_duration(&self) -> f64 {
        self.fade_duration
    }

    /// Change the transition duration. Running transitions keep their start time.
    pub fn set_fade_duration(&mut self, fade_duration: f64) {
        self.fade_duration = sanitize_duration(fade_duration);
    }

    /// Frame in which the state was last driven.
    pub fn last_frame_number(&self) -> Option<u64> {
        self.last_frame
    }

    /// Whether the state is [`FadingState::Undefined`].
    pub fn is_undefined(&self) -> bool {
        self.state == FadingState::Undefined
    }

    /// Whether the state is [`FadingState::FadingIn`].
    pub fn is_fading_in(&self) -> bool {
        self.state == FadingState::FadingIn
    }

    /// Whether the state is [`FadingState::FadedIn`].
    pub fn is_faded_in(&self) -> bool {
        self.state == FadingState::FadedIn
    }

    /// Whether the state is [`FadingState::FadingOut`].
    pub fn is_fading_out(&self) -> bool {
        self.state == FadingState::FadingOut
    }

    /// Whether the state is [`FadingState::FadedOut`].
    pub fn is_faded_out(&self) -> bool {
        self.state == FadingState::FadedOut
    }

    /// Whether a transition is in flight.
    pub fn is_fading(&self) -> bool {
        self.state.is_transition()
    }

    /// Whether the element is (at least partly) on screen.
    pub fn is_visible(&self) -> bool {
        self.state.is_visible()
    }

    /// Back to [`FadingState::Undefined`] with zero opacity.
    ///
    /// The fade duration and the last frame number are kept.
    pub fn reset(&mut self) {
        self.state = FadingState::Undefined;
        self.start_time = 0.0;
        self.value = 0.0;
        self.opacity = 0.0;
    }

    /// Record that the state was driven in `frame`.
    pub fn touch(&mut self, frame: u64) {
        self.last_frame = Some(frame);
    }

    /// Whether the state missed the frame before `frame`.
    pub fn is_stale(&self, frame: u64) -> bool {
        self.last_frame.is_some_and(|last| last.saturating_add(1) < frame)
    }

    /// Reset the state if it is stale for `frame`. Returns whether it was reset.
    pub fn reset_if_stale(&mut self, frame: u64) -> bool {
        if self.is_stale(frame) {
            self.reset();
            true
        } else {
            false
        }
    }

    /// Start (or continue) fading in.
    ///
    /// Does nothing when already fading in or faded in. A running fade-out is
    /// reversed from its current opacity. With `disable_fading` the element is
    /// faded in immediately.
    pub fn start_fade_in(&mut self, now: f64, frame: u64, disable_fading: bool) {
        self.reset_if_stale(frame);
        self.touch(frame);
        match self.state {
            FadingState::FadingIn | FadingState::FadedIn => return,
            FadingState::FadingOut => self.reverse(now),
            FadingState::Undefined | FadingState::FadedOut => {
                self.start_time = now;
                self.value = 0.0;
                self.opacity = 0.0;
            }
        }
        self.state = FadingState::FadingIn;
        if disable_fading || self.fade_duration == 0.0 {
            self.finish();
        }
    }

    /// Start (or continue) fading out.
    ///
    /// Does nothing when never shown, already fading out or faded out. A running
    /// fade-in is reversed from its current opacity. With `disable_fading` the
    /// element is faded out immediately.
    pub fn start_fade_out(&mut self, now: f64, frame: u64, disable_fading: bool) {
        self.reset_if_stale(frame);
        self.touch(frame);
        match self.state {
            FadingState::Undefined | FadingState::FadingOut | FadingState::FadedOut => return,
            FadingState::FadingIn => self.reverse(now),
            FadingState::FadedIn => {
                self.start_time = now;
                self.value = 0.0;
                self.opacity = 1.0;
            }
        }
        self.state = FadingState::FadingOut;
        if disable_fading || self.fade_duration == 0.0 {
            self.finish();
        }
    }

    /// Advance a running transition to `now`.
    ///
    /// Returns `true` while the element needs another frame to keep animating,
    /// including the frame in which the transition completes.
    pub fn update_fading(&mut self, now: f64, disable_fading: bool) -> bool {
        if !self.state.is_transition() {
            return false;
        }
        let elapsed = now - self.start_time;
        if disable_fading || self.fade_duration == 0.0 || elapsed >= self.fade_duration {
            self.finish();
            return true;
        }
        self.value = (elapsed / self.fade_duration).clamp(0.0, 1.0);
        self.opacity = match self.state {
            FadingState::FadingIn => smootherstep(0.0, 1.0, self.value),
            _ => smootherstep(1.0, 0.0, self.value),
        };
        true
    }

    /// Mirror the progress of the running transition and back-date its start
    /// so that opacity continues from where it is.
    fn reverse(&mut self, now: f64) {
        self.value = 1.0 - self.value;
        self.start_time = now - self.value * self.fade_duration;
    }

    fn finish(&mut self) {
        self.value = 1.0;
        match self.state {
            FadingState::FadingIn => {
                self.state = FadingState::FadedIn;
                self.opacity = 1.0;
            }
            FadingState::FadingOut => {
                self.state = FadingState::FadedOut;
                self.opacity = 0.0;
            }
            _ => {}
        }
    }
}

fn sanitize_duration(ms: f64) -> f64 {
    if ms.is_finite() && ms > 0.0 { ms } else { 0.0 }
}
