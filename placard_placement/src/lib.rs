// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placard Placement: decides, once per frame, which map labels are shown and where.
//!
//! ## Overview
//!
//! Labels ([`Candidate`]s) live in [`LabelTile`]s, bucketed by priority. Every frame
//! the [`PlacementScheduler`]:
//!
//! - pre-filters candidates (visibility, zoom range, POI table readiness, view
//!   distance, globe horizon, duplicates) and caches the results per group;
//! - walks priority tiers from highest to lowest, placing labels that were visible
//!   in the previous frame before new ones so that the picture stays stable;
//! - tests each label against a [`ScreenCollisions`](placard_collision::ScreenCollisions)
//!   index, trying alternative anchor placements for point labels and testing
//!   path labels glyph by glyph;
//! - fades labels in and out with [`RenderState`](placard_fading::RenderState)
//!   timelines, and submits draws to a [`LabelRenderer`].
//!
//! When there are more candidates than [`PlacementConfig::overload_threshold`],
//! cache refreshes and the tier walk run within time budgets. A walk cut short
//! leaves the remaining tiers for the next frame.
//!
//! ## Collaborators
//!
//! Projection, glyph lookup, and text measurement are the host's job, plugged in
//! through a [`PlacementEnv`]:
//!
//! - [`ScreenProjector`]: world to screen, origin at the screen center, y down.
//! - [`GlyphSupplier`]: text to glyphs.
//! - [`TextMeasurer`]: glyph bounds around an anchor or along a screen path.
//! - [`PoiTableLookup`]: optional icon tables that load asynchronously.
//!
//! ## Example
//!
//! ```rust
//! use glam::DVec3;
//! use kurbo::{Point, Rect, Size};
//! use placard_placement::{
//!     Candidate, DrawList, GlyphRun, GlyphSupplier, LabelStyle, LabelTile, MeasureError,
//!     MeasureTarget, PlacementConfig, PlacementEnv, PlacementScheduler, ScreenProjector,
//!     TextMeasurement, TextMeasurer, TileKey, ViewState,
//! };
//!
//! struct Flat;
//! impl ScreenProjector for Flat {
//!     fn project(&self, world: DVec3) -> Option<Point> {
//!         Some(Point::new(world.x, -world.y))
//!     }
//! }
//!
//! struct Glyphs;
//! impl GlyphSupplier for Glyphs {
//!     fn glyphs(&self, text: &str, style: &LabelStyle) -> Result<GlyphRun, MeasureError> {
//!         Ok(GlyphRun::new(text.chars().map(u32::from).collect(), style.font_size))
//!     }
//! }
//!
//! /// Every glyph is 8 x 16 pixels.
//! struct Mono;
//! impl TextMeasurer for Mono {
//!     fn measure(
//!         &self,
//!         glyphs: &GlyphRun,
//!         target: MeasureTarget<'_>,
//!     ) -> Result<TextMeasurement, MeasureError> {
//!         let MeasureTarget::Anchored { anchor, offset } = target else {
//!             return Err(MeasureError::Malformed("no path layout".into()));
//!         };
//!         let bounds = anchor.place(Size::new(8.0 * glyphs.len() as f64, 16.0), offset);
//!         let character_bounds = (0..glyphs.len())
//!             .map(|i| {
//!                 let x = bounds.x0 + 8.0 * i as f64;
//!                 Rect::new(x, bounds.y0, x + 8.0, bounds.y1)
//!             })
//!             .collect();
//!         Ok(TextMeasurement { bounds, character_bounds })
//!     }
//! }
//!
//! let config = PlacementConfig {
//!     disable_fading: true,
//!     ..PlacementConfig::default()
//! };
//! let mut scheduler = PlacementScheduler::new(config, Size::new(800.0, 600.0))?;
//!
//! // Two labels competing for the same spot: the higher priority wins.
//! let mut tile = LabelTile::new(TileKey(1), DVec3::ZERO);
//! tile.add(Candidate::point("Harbor", DVec3::ZERO).with_priority(5));
//! tile.add(Candidate::point("Harbour", DVec3::new(10.0, 0.0, 0.0)).with_priority(2));
//! scheduler.add_tile(tile);
//!
//! let mut draws = DrawList::default();
//! let mut env = PlacementEnv {
//!     projector: &Flat,
//!     glyphs: &Glyphs,
//!     measurer: &Mono,
//!     poi_tables: None,
//!     renderer: &mut draws,
//! };
//! let summary = scheduler.place_frame(&ViewState::default(), &mut env);
//! assert_eq!(summary.stats.rendered, 1);
//! assert_eq!(draws.texts().collect::<Vec<_>>(), ["Harbor"]);
//! # Ok::<(), placard_placement::ConfigError>(())
//! ```
//!
//! ## Features
//!
//! - `serde`: deserialize [`PlacementConfig`] (see [`PlacementConfig::from_json`])
//!   and anchor placements.

pub mod anchor;
pub mod cache;
pub mod candidate;
pub mod config;
pub mod env;
pub mod error;
pub mod evaluate;
pub mod frame;
pub mod group;
pub mod pick;
pub mod placement;
pub mod poi;
pub mod scheduler;
pub mod view;

pub use anchor::{AnchorPlacement, ParseAnchorError};
pub use cache::{DuplicateIndex, GroupStateCache, Registration};
pub use candidate::{
    Candidate, CandidateFlags, Geometry, LabelIdentity, LabelLayout, LabelStyle, MarkerState,
    TextBuffer,
};
pub use config::PlacementConfig;
pub use env::{
    DrawCommand, DrawIcon, DrawList, DrawText, GlyphLayout, GlyphRun, GlyphSupplier,
    LabelRenderer, MeasureTarget, PlacementEnv, ScreenProjector, TextMeasurement, TextMeasurer,
};
pub use error::{ConfigError, MeasureError, PlacementError};
pub use evaluate::{PrePlacementResult, Readiness, check_ready_for_placement};
pub use frame::{FrameClock, FrameContext, FrameSummary, InstantClock, PlacementStats};
pub use group::{CandidateKey, LabelTile, TextElementGroup, TileKey};
pub use pick::{PickKind, PickResult};
pub use placement::PlacementResult;
pub use poi::{PoiAttributes, PoiInfo, PoiLookup, PoiTableLookup};
pub use scheduler::PlacementScheduler;
pub use view::{ProjectionKind, ViewState};
