// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Easing curve used for opacity.

/// Quintic ease from `start` to `end` at progress `t ∈ [0, 1]`.
///
/// First and second derivatives vanish at both ends, so an element that starts
/// or finishes fading has no visible jump in velocity. `t` is clamped.
///
/// The curve is point-symmetric: `smootherstep(0, 1, 1 - t) == 1 - smootherstep(0, 1, t)`.
/// Reversing a half-done fade by mirroring its progress therefore keeps opacity unchanged.
#[inline]
pub fn smootherstep(start: f64, end: f64, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let eased = t * t * t * (t * (t * 6.0 - 15.0) + 10.0);
    start + (end - start) * eased
}
