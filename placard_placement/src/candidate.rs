// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Label candidates: what competes for screen space.

use glam::DVec3;
use kurbo::{Rect, Vec2};
use placard_fading::RenderState;

use crate::anchor::AnchorPlacement;
use crate::env::GlyphRun;
use crate::poi::PoiInfo;

bitflags::bitflags! {
    /// Behavior flags of a candidate.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CandidateFlags: u8 {
        /// The candidate is shown at all.
        const VISIBLE        = 0b0000_0001;
        /// The text may overlap other labels.
        const MAY_OVERLAP    = 0b0000_0010;
        /// The text reserves its screen space once placed.
        const RESERVES_SPACE = 0b0000_0100;
        /// The icon is shown even when the text does not fit.
        const TEXT_OPTIONAL  = 0b0000_1000;
        /// The text is shown even when the icon does not fit.
        const ICON_OPTIONAL  = 0b0001_0000;
    }
}

impl Default for CandidateFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::RESERVES_SPACE
    }
}

/// World-space geometry of a candidate, relative to the center of its tile.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// A label at a single point.
    Point(DVec3),
    /// A label laid out along a path.
    Path(Vec<DVec3>),
    /// An icon and label repeated at every vertex of a path (road shields).
    LineMarker(Vec<DVec3>),
}

impl Geometry {
    /// All points of the geometry.
    pub fn points(&self) -> &[DVec3] {
        match self {
            Self::Point(p) => core::slice::from_ref(p),
            Self::Path(pts) | Self::LineMarker(pts) => pts,
        }
    }

    /// First and last point. `None` for an empty path.
    pub fn endpoints(&self) -> Option<(DVec3, DVec3)> {
        let pts = self.points();
        Some((*pts.first()?, *pts.last()?))
    }

    /// Representative point: the point itself, or the middle vertex of a path.
    pub fn anchor(&self) -> Option<DVec3> {
        let pts = self.points();
        pts.get(pts.len() / 2).copied()
    }
}

/// Text style handed to the glyph supplier.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelStyle {
    /// Font family.
    pub font: String,
    /// Font size in pixels at scale 1.
    pub font_size: f64,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font: "sans-serif".into(),
            font_size: 16.0,
        }
    }
}

/// How a point label is arranged around its anchor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelLayout {
    /// Placements to try, in order. Empty or a single entry means a fixed placement
    /// (the single entry, or [`AnchorPlacement::Center`]).
    pub anchors: Vec<AnchorPlacement>,
    /// Distance of the text from its anchor, in pixels.
    pub offset: Vec2,
    /// Minimum screen distance between line markers of one shield group.
    /// `None` uses the configured default.
    pub marker_min_distance: Option<f64>,
}

impl LabelLayout {
    /// A layout scanning `anchors` around the anchor point, `offset` pixels away.
    pub fn with_anchors(anchors: impl Into<Vec<AnchorPlacement>>, offset: Vec2) -> Self {
        Self {
            anchors: anchors.into(),
            offset,
            marker_min_distance: None,
        }
    }

    /// Placement used before any scan has happened.
    pub fn primary_anchor(&self) -> AnchorPlacement {
        self.anchors.first().copied().unwrap_or_default()
    }

    /// Whether more than one placement is configured.
    pub fn has_alternatives(&self) -> bool {
        self.anchors.len() > 1
    }
}

/// Measured layout of a label's glyphs, cached across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBuffer {
    /// Placement the layout was measured for.
    pub anchor: AnchorPlacement,
    /// Bounds relative to the anchor point (point labels) or in screen space
    /// (path labels), at scale 1.
    pub bounds: Rect,
    /// Per-character boxes in the same space as `bounds`.
    pub character_bounds: Vec<Rect>,
}

/// Render states of one repetition of a line marker.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MarkerState {
    /// Fade timeline of the text.
    pub text: RenderState,
    /// Fade timeline of the icon.
    pub icon: RenderState,
}

/// Identity used to recognize the same label in several tiles.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LabelIdentity {
    /// The id of the map feature the label belongs to.
    Feature(u64),
    /// The label text, for candidates without a feature id.
    Text(String),
}

/// A text and/or icon competing for screen space.
#[derive(Clone, Debug)]
pub struct Candidate {
    /// Label text. Empty for icon-only candidates.
    pub text: String,
    /// Id of the map feature the label belongs to.
    pub feature_id: Option<u64>,
    /// Where the label is.
    pub geometry: Geometry,
    priority: i32,
    /// Behavior flags.
    pub flags: CandidateFlags,
    /// Lowest zoom level showing the candidate.
    pub min_zoom: f64,
    /// Zoom level from which the candidate is hidden again.
    pub max_zoom: f64,
    /// Optional icon.
    pub poi: Option<PoiInfo>,
    /// Start of the distance fade, as a fraction of the maximum visibility distance.
    pub fade_near: f64,
    /// End of the distance fade. A value not above `fade_near` disables distance fading.
    pub fade_far: f64,
    /// How strongly the label scales with distance from the focus point. 0 disables it.
    pub distance_scale: f64,
    style: LabelStyle,
    layout: LabelLayout,
    glyphs: Option<GlyphRun>,
    text_buffer: Option<TextBuffer>,
    anchor: Option<AnchorPlacement>,
    pub(crate) text_state: RenderState,
    pub(crate) icon_state: RenderState,
    pub(crate) markers: Vec<MarkerState>,
}

impl Candidate {
    fn with_geometry(text: impl Into<String>, geometry: Geometry) -> Self {
        let markers = match &geometry {
            Geometry::LineMarker(pts) => vec![MarkerState::default(); pts.len()],
            _ => Vec::new(),
        };
        Self {
            text: text.into(),
            feature_id: None,
            geometry,
            priority: 0,
            flags: CandidateFlags::default(),
            min_zoom: f64::NEG_INFINITY,
            max_zoom: f64::INFINITY,
            poi: None,
            fade_near: 0.0,
            fade_far: 0.0,
            distance_scale: 0.0,
            style: LabelStyle::default(),
            layout: LabelLayout::default(),
            glyphs: None,
            text_buffer: None,
            anchor: None,
            text_state: RenderState::default(),
            icon_state: RenderState::default(),
            markers,
        }
    }

    /// A point label.
    pub fn point(text: impl Into<String>, position: DVec3) -> Self {
        Self::with_geometry(text, Geometry::Point(position))
    }

    /// A label along a path.
    pub fn path(text: impl Into<String>, points: Vec<DVec3>) -> Self {
        Self::with_geometry(text, Geometry::Path(points))
    }

    /// An icon and label repeated at every vertex of `points`.
    pub fn line_marker(text: impl Into<String>, points: Vec<DVec3>, poi: PoiInfo) -> Self {
        let mut c = Self::with_geometry(text, Geometry::LineMarker(points));
        c.poi = Some(poi);
        c
    }

    /// Set the priority.
    ///
    /// Once the candidate is in a tile, change it with [`LabelTile::set_priority`].
    ///
    /// [`LabelTile::set_priority`]: crate::LabelTile::set_priority
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Higher is placed first. Negative priorities are always shown.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub(crate) fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Set the feature id.
    #[must_use]
    pub fn with_feature_id(mut self, id: u64) -> Self {
        self.feature_id = Some(id);
        self
    }

    /// Set the flags.
    #[must_use]
    pub fn with_flags(mut self, flags: CandidateFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the zoom range `[min, max)`.
    #[must_use]
    pub fn with_zoom_range(mut self, min: f64, max: f64) -> Self {
        self.min_zoom = min;
        self.max_zoom = max;
        self
    }

    /// Attach an icon.
    #[must_use]
    pub fn with_poi(mut self, poi: PoiInfo) -> Self {
        self.poi = Some(poi);
        self
    }

    /// Set the distance fade range.
    #[must_use]
    pub fn with_fade_distances(mut self, near: f64, far: f64) -> Self {
        self.fade_near = near;
        self.fade_far = far;
        self
    }

    /// Set the distance scale.
    #[must_use]
    pub fn with_distance_scale(mut self, scale: f64) -> Self {
        self.distance_scale = scale;
        self
    }

    /// Set the text style.
    #[must_use]
    pub fn with_style(mut self, style: LabelStyle) -> Self {
        self.set_style(style);
        self
    }

    /// Set the layout.
    #[must_use]
    pub fn with_layout(mut self, layout: LabelLayout) -> Self {
        self.set_layout(layout);
        self
    }

    /// Text style.
    pub fn style(&self) -> &LabelStyle {
        &self.style
    }

    /// Change the text style. Drops the cached glyphs and layout.
    pub fn set_style(&mut self, style: LabelStyle) {
        if self.style != style {
            self.style = style;
            self.glyphs = None;
            self.text_buffer = None;
        }
    }

    /// Layout.
    pub fn layout(&self) -> &LabelLayout {
        &self.layout
    }

    /// Change the layout. Drops the cached layout and the current anchor placement.
    pub fn set_layout(&mut self, layout: LabelLayout) {
        if self.layout != layout {
            self.layout = layout;
            self.text_buffer = None;
            self.anchor = None;
        }
    }

    /// Cached glyphs, if any.
    pub fn glyphs(&self) -> Option<&GlyphRun> {
        self.glyphs.as_ref()
    }

    pub(crate) fn set_glyphs(&mut self, glyphs: GlyphRun) {
        self.glyphs = Some(glyphs);
        self.text_buffer = None;
    }

    /// Cached text layout, if any.
    pub fn text_buffer(&self) -> Option<&TextBuffer> {
        self.text_buffer.as_ref()
    }

    pub(crate) fn set_text_buffer(&mut self, buffer: TextBuffer) {
        self.text_buffer = Some(buffer);
    }

    /// Drop the cached text layout so it is measured again.
    pub fn invalidate_text_buffer(&mut self) {
        self.text_buffer = None;
    }

    /// Placement the label was last shown with.
    pub fn current_anchor(&self) -> AnchorPlacement {
        self.anchor.unwrap_or_else(|| self.layout.primary_anchor())
    }

    /// Switch to another anchor placement. Invalidates the text layout when it changes.
    pub(crate) fn set_anchor(&mut self, anchor: AnchorPlacement) {
        if self.anchor != Some(anchor) {
            self.anchor = Some(anchor);
            if self.text_buffer.as_ref().is_some_and(|b| b.anchor != anchor) {
                self.text_buffer = None;
            }
        }
    }

    /// Fade timeline of the text.
    pub fn text_state(&self) -> &RenderState {
        &self.text_state
    }

    /// Fade timeline of the icon.
    pub fn icon_state(&self) -> &RenderState {
        &self.icon_state
    }

    /// Fade timelines of the line marker repetitions.
    pub fn marker_states(&self) -> &[MarkerState] {
        &self.markers
    }

    /// Mark every fade timeline as current in `frame` without changing it.
    pub(crate) fn touch_states(&mut self, frame: u64) {
        self.text_state.touch(frame);
        self.icon_state.touch(frame);
        for m in &mut self.markers {
            m.text.touch(frame);
            m.icon.touch(frame);
        }
    }

    /// Whether the candidate has an icon that can be shown.
    pub fn has_icon(&self) -> bool {
        self.poi.as_ref().is_some_and(|p| p.valid)
    }

    /// Whether the candidate is shown at `zoom`.
    pub fn is_in_zoom_range(&self, zoom: f64) -> bool {
        zoom >= self.min_zoom && zoom < self.max_zoom
    }

    /// Whether anything of the candidate was rendered in the frame before `frame`.
    pub fn is_rendering(&self, frame: u64) -> bool {
        let live = |s: &RenderState| !s.is_stale(frame) && s.is_visible();
        live(&self.text_state)
            || live(&self.icon_state)
            || self.markers.iter().any(|m| live(&m.text) || live(&m.icon))
    }

    /// Identity for de-duplication: the feature id, else the non-empty text.
    pub fn identity(&self) -> Option<LabelIdentity> {
        match (self.feature_id, self.text.is_empty()) {
            (Some(id), _) => Some(LabelIdentity::Feature(id)),
            (None, false) => Some(LabelIdentity::Text(self.text.clone())),
            (None, true) => None,
        }
    }

    /// Move the render states out, leaving fresh ones behind.
    pub(crate) fn take_states(&mut self) -> CandidateStates {
        CandidateStates {
            text: core::mem::take(&mut self.text_state),
            icon: core::mem::take(&mut self.icon_state),
            markers: core::mem::take(&mut self.markers),
        }
    }

    /// Continue the fade timelines of a replaced duplicate. Only when this candidate has none of its own.
    pub(crate) fn adopt_states(&mut self, states: CandidateStates) -> bool {
        if !(self.text_state.is_undefined() && self.icon_state.is_undefined()) {
            return false;
        }
        self.text_state = states.text;
        self.icon_state = states.icon;
        if states.markers.len() == self.markers.len() {
            self.markers = states.markers;
        }
        true
    }
}

/// Render states detached from a removed candidate.
#[derive(Clone, Debug, Default)]
pub(crate) struct CandidateStates {
    pub(crate) text: RenderState,
    pub(crate) icon: RenderState,
    pub(crate) markers: Vec<MarkerState>,
}
