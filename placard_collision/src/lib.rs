// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placard Collision: a screen-space occupancy index for label placement.
//!
//! Labels compete for screen space once per frame. The placement engine asks this
//! index whether a candidate box is on screen and whether the space is still free,
//! then allocates the space of every label it keeps.
//!
//! - Allocate plain boxes, boxes with per-character detail, or blocking segments.
//! - Query coarse occupancy ([`ScreenCollisions::is_allocated`]) and screen
//!   visibility ([`ScreenCollisions::is_visible`], [`ScreenCollisions::is_fully_visible`]).
//! - Narrow down with [`ScreenCollisions::search`] and test glyph boxes exactly with
//!   [`ScreenCollisions::intersects_details`].
//!
//! Screen coordinates are pixels with the origin at the screen center.
//! Boxes that merely touch do not collide.
//!
//! # Example
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use placard_collision::{BlockingLine, ScreenCollisions};
//!
//! let mut sc = ScreenCollisions::new(800.0, 600.0);
//!
//! // A road that labels must not straddle.
//! sc.allocate_lines([BlockingLine::new(Point::new(-400.0, 0.0), Point::new(400.0, 0.0))]);
//!
//! let label = Rect::new(-40.0, -30.0, 40.0, -10.0);
//! assert!(sc.is_visible(&label));
//! assert!(!sc.is_allocated(&label));
//! sc.allocate(label);
//!
//! // A second label in the same spot is rejected, and so is one across the road.
//! assert!(sc.is_allocated(&Rect::new(0.0, -25.0, 60.0, -15.0)));
//! assert!(sc.is_allocated(&Rect::new(100.0, -5.0, 160.0, 5.0)));
//! ```
//!
//! ## Choosing a backend
//!
//! - [`Grid`] (default): dense uniform grid sized to the screen.
//! - [`FlatVec`]: linear scans; smallest, fine for a handful of labels.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod backend;
pub mod backends;
pub mod screen;
pub mod types;

pub use backend::Backend;
pub use backends::flatvec::FlatVec;
pub use backends::grid::Grid;
pub use screen::{ScreenCollisions, ScreenCollisionsGeneric};
pub use types::{BlockingLine, DetailedCollisionBox, Occupant, overlaps};
