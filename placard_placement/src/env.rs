// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborators of the placement engine and the draw submissions it produces.
//!
//! The engine does no projection, shaping, or rendering itself. The host plugs
//! these in through a [`PlacementEnv`] once per frame.

use glam::DVec3;
use kurbo::{Point, Rect};

use crate::anchor::AnchorPlacement;
use crate::candidate::LabelStyle;
use crate::error::MeasureError;
use crate::group::CandidateKey;
use crate::poi::PoiTableLookup;

/// Glyphs of a label text, as produced by a [`GlyphSupplier`].
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphRun {
    /// Glyph handles, one per rendered character.
    pub glyphs: Vec<u32>,
    /// Font size the glyphs were produced for.
    pub font_size: f64,
}

impl GlyphRun {
    /// Create a run.
    pub fn new(glyphs: Vec<u32>, font_size: f64) -> Self {
        Self { glyphs, font_size }
    }

    /// Number of glyphs.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether the run has no glyphs.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// What a [`TextMeasurer`] lays glyphs out for.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MeasureTarget<'a> {
    /// Around an anchor at the origin, at scale 1.
    Anchored {
        /// Placement around the anchor.
        anchor: AnchorPlacement,
        /// Distance from the anchor.
        offset: kurbo::Vec2,
    },
    /// Along a screen-space path, one box per glyph in screen coordinates.
    Path(&'a [Point]),
}

/// Result of measuring a glyph run.
#[derive(Clone, Debug, PartialEq)]
pub struct TextMeasurement {
    /// Bounds of the whole text.
    pub bounds: Rect,
    /// One box per glyph.
    pub character_bounds: Vec<Rect>,
}

/// Projects world positions to screen space (pixels, origin at the screen center).
pub trait ScreenProjector {
    /// Screen position of `world`, or `None` when it cannot be seen (behind the camera).
    fn project(&self, world: DVec3) -> Option<Point>;
}

/// Produces glyphs for label text.
pub trait GlyphSupplier {
    /// Glyphs of `text` in `style`.
    fn glyphs(&self, text: &str, style: &LabelStyle) -> Result<GlyphRun, MeasureError>;
}

/// Measures glyph runs.
pub trait TextMeasurer {
    /// Lay out `glyphs` for `target` and return their bounds.
    fn measure(
        &self,
        glyphs: &GlyphRun,
        target: MeasureTarget<'_>,
    ) -> Result<TextMeasurement, MeasureError>;
}

/// Glyph placement of a text draw.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GlyphLayout<'a> {
    /// The whole string laid out around the draw position.
    Anchored {
        /// Placement around the position.
        anchor: AnchorPlacement,
        /// Screen bounds of the text.
        bounds: Rect,
    },
    /// One screen box per glyph (path labels).
    PerCharacter(&'a [Rect]),
}

/// Text draw submission.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DrawText<'a> {
    /// Candidate being drawn.
    pub key: CandidateKey,
    /// Line marker repetition, if any.
    pub marker: Option<usize>,
    /// Text.
    pub text: &'a str,
    /// Glyphs.
    pub glyphs: &'a GlyphRun,
    /// Anchor position on screen.
    pub position: Point,
    /// Distance scale factor.
    pub scale: f64,
    /// Final opacity in `[0, 1]`.
    pub opacity: f64,
    /// Glyph layout.
    pub layout: GlyphLayout<'a>,
}

/// Icon draw submission.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DrawIcon<'a> {
    /// Candidate being drawn.
    pub key: CandidateKey,
    /// Line marker repetition, if any.
    pub marker: Option<usize>,
    /// Texture name.
    pub texture: &'a str,
    /// Screen bounds.
    pub bounds: Rect,
    /// Final opacity in `[0, 1]`.
    pub opacity: f64,
}

/// Receives draw submissions in draw order.
pub trait LabelRenderer {
    /// Draw a text.
    fn draw_text(&mut self, text: DrawText<'_>);
    /// Draw an icon.
    fn draw_icon(&mut self, icon: DrawIcon<'_>);
}

/// Owned record of one draw submission.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// A text draw.
    Text {
        /// Candidate.
        key: CandidateKey,
        /// Line marker repetition, if any.
        marker: Option<usize>,
        /// Text.
        text: String,
        /// Screen bounds.
        bounds: Rect,
        /// Final opacity.
        opacity: f64,
    },
    /// An icon draw.
    Icon {
        /// Candidate.
        key: CandidateKey,
        /// Line marker repetition, if any.
        marker: Option<usize>,
        /// Texture name.
        texture: String,
        /// Screen bounds.
        bounds: Rect,
        /// Final opacity.
        opacity: f64,
    },
}

impl DrawCommand {
    /// Candidate of the draw.
    pub fn key(&self) -> CandidateKey {
        match self {
            Self::Text { key, .. } | Self::Icon { key, .. } => *key,
        }
    }

    /// Opacity of the draw.
    pub fn opacity(&self) -> f64 {
        match self {
            Self::Text { opacity, .. } | Self::Icon { opacity, .. } => *opacity,
        }
    }
}

/// A [`LabelRenderer`] recording owned draw commands, for tests and tooling.
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    /// Commands in submission order.
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Drop all commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Texts drawn, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            DrawCommand::Icon { .. } => None,
        })
    }
}

impl LabelRenderer for DrawList {
    fn draw_text(&mut self, text: DrawText<'_>) {
        let bounds = match text.layout {
            GlyphLayout::Anchored { bounds, .. } => bounds,
            GlyphLayout::PerCharacter(boxes) => boxes
                .iter()
                .copied()
                .reduce(|a, b| a.union(b))
                .unwrap_or(Rect::from_origin_size(text.position, (0.0, 0.0))),
        };
        self.commands.push(DrawCommand::Text {
            key: text.key,
            marker: text.marker,
            text: text.text.to_owned(),
            bounds,
            opacity: text.opacity,
        });
    }

    fn draw_icon(&mut self, icon: DrawIcon<'_>) {
        self.commands.push(DrawCommand::Icon {
            key: icon.key,
            marker: icon.marker,
            texture: icon.texture.to_owned(),
            bounds: icon.bounds,
            opacity: icon.opacity,
        });
    }
}

/// Collaborators for one frame.
pub struct PlacementEnv<'a> {
    /// World to screen projection.
    pub projector: &'a dyn ScreenProjector,
    /// Glyph supplier.
    pub glyphs: &'a dyn GlyphSupplier,
    /// Glyph measurement.
    pub measurer: &'a dyn TextMeasurer,
    /// POI tables, when the host has any.
    pub poi_tables: Option<&'a dyn PoiTableLookup>,
    /// Draw submissions.
    pub renderer: &'a mut dyn LabelRenderer,
}

impl core::fmt::Debug for PlacementEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PlacementEnv")
            .field("poi_tables", &self.poi_tables.is_some())
            .finish_non_exhaustive()
    }
}
