// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placard Fading: per-element fade timelines for map labels.
//!
//! Every label shown by the placement engine owns one [`RenderState`] for its text
//! and one for its icon. Each frame the engine decides whether an element should
//! be visible and calls [`RenderState::start_fade_in`] or
//! [`RenderState::start_fade_out`]; then [`RenderState::update_fading`] advances the
//! opacity along a [`smootherstep`] curve.
//!
//! - Changing direction mid-fade continues from the current opacity.
//! - A state not driven for a whole frame is stale and restarts from
//!   [`FadingState::Undefined`], so labels that come back into view fade in fresh.
//! - Fading can be disabled per call, which makes every transition immediate.
//!
//! # Example
//!
//! ```rust
//! use placard_fading::{FadingState, RenderState};
//!
//! let mut text = RenderState::new(300.0);
//!
//! // Frame 1 at t=0: the label won its space.
//! text.start_fade_in(0.0, 1, false);
//! assert_eq!(text.state(), FadingState::FadingIn);
//!
//! // Frame 2, halfway through.
//! text.start_fade_in(150.0, 2, false);
//! assert!(text.update_fading(150.0, false));
//! assert!((text.opacity() - 0.5).abs() < 1e-9);
//!
//! // Frame 3: the label lost its space and turns around.
//! text.start_fade_out(150.0, 3, false);
//! text.update_fading(150.0, false);
//! assert!((text.opacity() - 0.5).abs() < 1e-9);
//! assert_eq!(text.state(), FadingState::FadingOut);
//! ```
//!
//! This crate is `no_std` and has no dependencies.

#![no_std]

pub mod ease;
pub mod render_state;
pub mod types;

pub use ease::smootherstep;
pub use render_state::RenderState;
pub use types::{DEFAULT_FADE_TIME, FadingState};
