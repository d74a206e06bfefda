// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame placement walk.

use std::collections::BTreeMap;

use ahash::{AHashMap, AHashSet};
use glam::DVec3;
use kurbo::{Point, Rect, Size};
use placard_collision::{BlockingLine, DetailedCollisionBox, ScreenCollisions};
use placard_fading::RenderState;

use crate::candidate::{Candidate, CandidateFlags, Geometry, MarkerState};
use crate::cache::GroupStateCache;
use crate::config::PlacementConfig;
use crate::env::{DrawIcon, DrawText, GlyphLayout, PlacementEnv, ScreenProjector};
use crate::error::{ConfigError, PlacementError};
use crate::evaluate::{PrePlacementResult, Readiness, distance_fading_factor, distance_scale_factor};
use crate::frame::{Deadline, FrameClock, FrameContext, FrameSummary, InstantClock};
use crate::group::{CandidateKey, LabelTile, TileKey};
use crate::pick::{PickEntry, PickKind, PickResult, pick};
use crate::placement::{
    PlacementResult, PointLabelParams, icon_bounds, measure_anchored, place_icon,
    place_path_label, place_point_label, prepare_glyphs, relayout_path_label, to_screen,
};
use crate::view::ViewState;

/// Places labels frame after frame.
///
/// The scheduler owns the label tiles and the screen collision index. Each call to
/// [`place_frame`](Self::place_frame):
///
/// 1. resets the collision index and pre-allocates blocking lines;
/// 2. refreshes the group state cache when tiles, candidates, or the view changed
///    (within a time budget when overloaded);
/// 3. walks priority tiers from highest to lowest, placing labels that were
///    visible in the previous frame before new ones, and submits draws in
///    placement order.
///
/// Labels that lose their place fade out rather than vanish.
pub struct PlacementScheduler<C: FrameClock = InstantClock> {
    config: PlacementConfig,
    clock: C,
    tiles: BTreeMap<TileKey, LabelTile>,
    cache: GroupStateCache,
    collisions: ScreenCollisions,
    screen_lines: Vec<Vec<Point>>,
    missing_tables: AHashSet<String>,
    frame_number: u64,
    overloaded: bool,
    camera_moving: bool,
    picks: Vec<PickEntry>,
}

impl<C: FrameClock> core::fmt::Debug for PlacementScheduler<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PlacementScheduler")
            .field("tiles", &self.tiles.len())
            .field("cached_groups", &self.cache.len())
            .field("frame_number", &self.frame_number)
            .field("overloaded", &self.overloaded)
            .field("camera_moving", &self.camera_moving)
            .finish_non_exhaustive()
    }
}

impl PlacementScheduler<InstantClock> {
    /// Scheduler for a screen of `screen` pixels, timed by the system clock.
    pub fn new(config: PlacementConfig, screen: Size) -> Result<Self, ConfigError> {
        Self::with_clock(config, screen, InstantClock::new())
    }
}

impl<C: FrameClock> PlacementScheduler<C> {
    /// Scheduler timed by `clock`.
    pub fn with_clock(config: PlacementConfig, screen: Size, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut collisions =
            ScreenCollisions::with_cell_size(config.collision_cell_size, screen.width, screen.height);
        collisions.set_visibility_margin(config.screen_margin);
        Ok(Self {
            config,
            clock,
            tiles: BTreeMap::new(),
            cache: GroupStateCache::new(),
            collisions,
            screen_lines: Vec::new(),
            missing_tables: AHashSet::new(),
            frame_number: 0,
            overloaded: false,
            camera_moving: false,
            picks: Vec::new(),
        })
    }

    /// Configuration.
    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Number of the last placed frame.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Whether the last frame ran in overload mode.
    pub fn is_overloaded(&self) -> bool {
        self.overloaded
    }

    /// The collision index as the last frame left it.
    pub fn collisions(&self) -> &ScreenCollisions {
        &self.collisions
    }

    /// Change the screen size in pixels.
    pub fn set_screen_size(&mut self, size: Size) {
        self.collisions.set_screen_size(size);
        self.collisions.set_visibility_margin(self.config.screen_margin);
    }

    /// Add a tile, replacing any tile with the same key.
    ///
    /// Returns the replaced tile.
    pub fn add_tile(&mut self, tile: LabelTile) -> Option<LabelTile> {
        let old = self.remove_tile(tile.key());
        self.tiles.insert(tile.key(), tile);
        self.cache.invalidate();
        old
    }

    /// Remove a tile.
    ///
    /// Labels of the tile that are on screen hand their fade timelines over to a
    /// duplicate in another tile, if the next refresh finds one.
    pub fn remove_tile(&mut self, key: TileKey) -> Option<LabelTile> {
        let mut tile = self.tiles.remove(&key)?;
        let next = self.frame_number + 1;
        let center = tile.center();
        for c in tile.candidates_mut() {
            if c.is_rendering(next)
                && let Some(identity) = c.identity()
                && let Some(anchor) = c.geometry.anchor()
            {
                self.cache.add_orphan(identity, center + anchor, c.take_states());
            }
        }
        self.cache.invalidate();
        Some(tile)
    }

    /// A tile.
    pub fn tile(&self, key: TileKey) -> Option<&LabelTile> {
        self.tiles.get(&key)
    }

    /// Mutable tile. Invalidates the group state cache.
    pub fn tile_mut(&mut self, key: TileKey) -> Option<&mut LabelTile> {
        self.cache.invalidate();
        self.tiles.get_mut(&key)
    }

    /// Tiles in key order.
    pub fn tiles(&self) -> impl Iterator<Item = &LabelTile> + '_ {
        self.tiles.values()
    }

    /// A candidate.
    pub fn candidate(&self, key: CandidateKey) -> Option<&Candidate> {
        self.tiles.get(&key.tile)?.candidate(key)
    }

    /// Total number of candidates.
    pub fn candidate_count(&self) -> usize {
        self.tiles.values().map(LabelTile::len).sum()
    }

    /// Screen-space polylines that labels must not cross, in addition to the
    /// tiles' own blocking lines.
    pub fn set_blocking_lines(&mut self, lines: Vec<Vec<Point>>) {
        self.screen_lines = lines;
    }

    /// Tell the scheduler whether the camera is moving.
    pub fn set_camera_moving(&mut self, moving: bool) {
        self.camera_moving = moving;
    }

    /// The camera came to rest: refresh the cache and let new labels in.
    pub fn movement_finished(&mut self) {
        self.camera_moving = false;
        self.cache.invalidate();
    }

    /// Force a full re-evaluation on the next frame.
    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }

    /// Labels drawn in the last frame under `point`, topmost first.
    pub fn pick(&self, point: Point) -> Vec<PickResult> {
        pick(&self.picks, point)
    }

    /// Place and draw one frame.
    pub fn place_frame(&mut self, view: &ViewState, env: &mut PlacementEnv<'_>) -> FrameSummary {
        let start = self.clock.now_ms();
        self.frame_number += 1;
        let frame = self.frame_number;
        let mut ctx = FrameContext::new(frame, start, self.config.max_visible_labels);
        ctx.camera_moving = self.camera_moving;

        self.collisions.reset();
        self.picks.clear();

        let total = self.candidate_count();
        let overloaded = total > self.config.overload_threshold;
        if overloaded != self.overloaded {
            if overloaded {
                tracing::info!(candidates = total, threshold = self.config.overload_threshold, "entering overload mode");
            } else {
                tracing::info!(candidates = total, "leaving overload mode");
            }
            self.overloaded = overloaded;
        }
        ctx.overloaded = overloaded;

        allocate_blocking_lines(&mut self.collisions, &self.tiles, &self.screen_lines, env.projector);

        let mut cache_refreshed = false;
        if self.cache.needs_refresh(view) {
            let deadline = overloaded.then(|| Deadline::after(&self.clock, self.config.overload_update_time_ms));
            let status = self.cache.update(
                &mut self.tiles,
                view,
                &self.config,
                env.poi_tables,
                &mut self.missing_tables,
                deadline,
            );
            tracing::trace!(evaluated = status.evaluated, complete = status.complete, "group states refreshed");
            cache_refreshed = true;
        }

        let place_deadline = overloaded.then(|| Deadline::after(&self.clock, self.config.overload_place_time_ms));
        let delay_new = self.config.delay_labels_until_movement_finished && self.camera_moving;
        let mut budget_exhausted = false;
        let mut placer = Placer {
            config: &self.config,
            view,
            collisions: &mut self.collisions,
            env,
            ctx: &mut ctx,
            shields: AHashMap::new(),
            picks: &mut self.picks,
        };

        for priority in self.cache.tiers() {
            let mut entries = Vec::new();
            for gk in self.cache.tier(priority) {
                if let Some(group) = self.cache.group_mut(gk) {
                    entries.extend(group.entries().iter().map(|e| {
                        let key = CandidateKey {
                            tile: gk.tile(),
                            priority,
                            index: e.index,
                        };
                        (key, e.readiness)
                    }));
                }
            }

            if priority >= 0 && (budget_exhausted || place_deadline.is_some_and(|d| d.expired())) {
                if !budget_exhausted {
                    tracing::debug!(priority, "placement time budget exhausted");
                }
                budget_exhausted = true;
                placer.ctx.stats.skipped_by_budget += entries.len();
                // Labels on screen keep their fade for the next frame.
                for (key, _) in &entries {
                    if let Some(c) = self.tiles.get_mut(&key.tile).and_then(|t| t.candidate_mut(*key))
                        && c.is_rendering(frame)
                    {
                        c.touch_states(frame);
                    }
                }
                continue;
            }

            let tiles = &mut self.tiles;
            let work: Vec<(CandidateKey, Readiness, bool)> = entries
                .into_iter()
                .filter_map(|(key, readiness)| {
                    let c = tiles.get(&key.tile)?.candidate(key)?;
                    Some((key, readiness, c.is_rendering(frame)))
                })
                .collect();

            for new_pass in [false, true] {
                if new_pass && delay_new {
                    placer.ctx.stats.deferred += work
                        .iter()
                        .filter(|(_, r, persistent)| !persistent && r.result == PrePlacementResult::Ok)
                        .count();
                    continue;
                }
                for &(key, readiness, persistent) in &work {
                    if persistent == new_pass {
                        continue;
                    }
                    let Some(tile) = tiles.get_mut(&key.tile) else {
                        continue;
                    };
                    let center = tile.center();
                    if let Some(c) = tile.candidate_mut(key) {
                        placer.visit(c, key, center, readiness, persistent);
                    }
                }
            }
        }

        let stats = ctx.stats;
        let elapsed_ms = self.clock.now_ms() - start;
        tracing::debug!(
            frame,
            rendered = stats.rendered,
            persistent = stats.persistent,
            new = stats.new,
            rejected = stats.rejected,
            invisible = stats.invisible,
            too_far = stats.too_far,
            skipped_by_cap = stats.skipped_by_cap,
            skipped_by_budget = stats.skipped_by_budget,
            fading_out = stats.fading_out,
            elapsed_ms,
            "frame placed"
        );
        FrameSummary {
            frame_number: frame,
            stats,
            overloaded,
            budget_exhausted,
            cache_refreshed,
            needs_redraw: ctx.animating || self.cache.is_refreshing() || budget_exhausted,
            elapsed_ms,
        }
    }
}

fn allocate_blocking_lines(
    collisions: &mut ScreenCollisions,
    tiles: &BTreeMap<TileKey, LabelTile>,
    screen_lines: &[Vec<Point>],
    projector: &dyn ScreenProjector,
) {
    for line in screen_lines {
        collisions.allocate_lines(BlockingLine::polyline(line));
    }
    let mut projected = Vec::new();
    for tile in tiles.values() {
        for line in tile.blocking_lines() {
            // A point behind the camera splits the polyline.
            for p in line {
                match projector.project(tile.center() + *p) {
                    Some(s) => projected.push(s),
                    None => {
                        collisions.allocate_lines(BlockingLine::polyline(&projected));
                        projected.clear();
                    }
                }
            }
            collisions.allocate_lines(BlockingLine::polyline(&projected));
            projected.clear();
        }
    }
}

/// Placement state of one element (text or icon) of a candidate.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Element {
    /// Not attempted: empty, too far, or out of its zoom range.
    Absent,
    Placed(Rect),
    Failed(PlacementResult),
}

impl Element {
    fn rect(self) -> Option<Rect> {
        match self {
            Self::Placed(r) => Some(r),
            _ => None,
        }
    }

    fn failed(self) -> bool {
        matches!(self, Self::Failed(_))
    }

    fn rejected(self) -> bool {
        self == Self::Failed(PlacementResult::Rejected)
    }
}

/// Which elements to show. A required element that failed hides the other one.
fn combine(text: Element, icon: Element, flags: CandidateFlags) -> (bool, bool) {
    let show_text =
        text.rect().is_some() && !(icon.failed() && !flags.contains(CandidateFlags::ICON_OPTIONAL));
    let show_icon =
        icon.rect().is_some() && !(text.failed() && !flags.contains(CandidateFlags::TEXT_OPTIONAL));
    (show_text, show_icon)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Outcome {
    Rendered,
    Rejected,
    Invisible,
}

impl Outcome {
    fn of(shown: bool, persistent: bool, rejected: bool) -> Self {
        if shown {
            Self::Rendered
        } else if persistent && rejected {
            Self::Rejected
        } else {
            Self::Invisible
        }
    }
}

struct Placer<'a, 'e> {
    config: &'a PlacementConfig,
    view: &'a ViewState,
    collisions: &'a mut ScreenCollisions,
    env: &'a mut PlacementEnv<'e>,
    ctx: &'a mut FrameContext,
    shields: AHashMap<u32, Vec<Point>>,
    picks: &'a mut Vec<PickEntry>,
}

impl Placer<'_, '_> {
    fn visit(
        &mut self,
        c: &mut Candidate,
        key: CandidateKey,
        center: DVec3,
        readiness: Readiness,
        persistent: bool,
    ) {
        debug_assert_eq!(
            key.priority,
            c.priority(),
            "candidate filed under another priority"
        );
        let stats = &mut self.ctx.stats;
        match readiness.result {
            PrePlacementResult::Ok => {
                let distance = readiness.view_distance.unwrap_or(0.0);
                self.place(c, key, center, distance, persistent);
                return;
            }
            PrePlacementResult::NotReady => stats.not_ready += 1,
            PrePlacementResult::Invisible => stats.invisible += 1,
            PrePlacementResult::TooFar => stats.too_far += 1,
            PrePlacementResult::Duplicate => stats.duplicate += 1,
        }
        tracing::trace!(?key, result = ?readiness.result, "not placed");
        self.retire(c, key, center, readiness.view_distance);
    }

    fn place(&mut self, c: &mut Candidate, key: CandidateKey, center: DVec3, distance: f64, persistent: bool) {
        if c.priority() >= 0 && self.ctx.is_full() {
            self.ctx.stats.skipped_by_cap += 1;
            self.retire(c, key, center, Some(distance));
            return;
        }
        let outcome = match &c.geometry {
            Geometry::Point(p) => {
                let world = center + *p;
                self.place_point(c, key, world, distance, persistent)
            }
            Geometry::Path(_) => self.place_path(c, key, center, distance, persistent),
            Geometry::LineMarker(_) => self.place_markers(c, key, center, distance, persistent),
        };
        let stats = &mut self.ctx.stats;
        match outcome {
            Ok(Outcome::Rendered) => {
                stats.rendered += 1;
                if persistent {
                    stats.persistent += 1;
                } else {
                    stats.new += 1;
                }
                if c.priority() >= 0 {
                    self.ctx.placed += 1;
                }
            }
            Ok(Outcome::Rejected) => {
                stats.rejected += 1;
                tracing::trace!(?key, "rejected");
            }
            Ok(Outcome::Invisible) => stats.invisible += 1,
            Err(err) => {
                stats.malformed += 1;
                tracing::warn!(?key, text = %c.text, %err, "skipping label with malformed glyph data");
                self.retire(c, key, center, Some(distance));
            }
        }
    }

    fn text_in_range(&self, c: &Candidate, distance: f64) -> bool {
        !c.text.is_empty()
            && distance <= self.view.max_visibility_distance * self.config.max_distance_ratio_text
    }

    fn icon_in_range(&self, c: &Candidate, distance: f64) -> bool {
        c.poi
            .as_ref()
            .is_some_and(|poi| poi.is_in_zoom_range(self.view.zoom_level))
            && distance <= self.view.max_visibility_distance * self.config.max_distance_ratio_icon
    }

    fn may_overlap(c: &Candidate) -> bool {
        c.priority() < 0 || c.flags.contains(CandidateFlags::MAY_OVERLAP)
    }

    fn icon_may_overlap(c: &Candidate) -> bool {
        c.priority() < 0 || c.poi.as_ref().is_some_and(|p| p.may_overlap)
    }

    fn icon_reserves_space(c: &Candidate) -> bool {
        c.poi.as_ref().is_some_and(|p| p.reserves_space)
    }

    fn place_point(
        &mut self,
        c: &mut Candidate,
        key: CandidateKey,
        world: DVec3,
        distance: f64,
        persistent: bool,
    ) -> Result<Outcome, PlacementError> {
        let Some(pos) = self.env.projector.project(world) else {
            self.drive_all(c, false, false);
            return Ok(Outcome::Invisible);
        };
        let scale = distance_scale_factor(c, distance, self.view, self.config);

        let text = if self.text_in_range(c, distance) {
            prepare_glyphs(c, self.env.glyphs)?;
            let params = PointLabelParams {
                position: pos,
                scale,
                persistent,
                may_overlap: Self::may_overlap(c),
                margin: self.config.label_margin(persistent),
            };
            let placed = place_point_label(c, &params, self.collisions, self.env.measurer)?;
            match placed.result {
                PlacementResult::Ok => Element::Placed(placed.bounds),
                r => Element::Failed(r),
            }
        } else {
            Element::Absent
        };
        let icon = match &c.poi {
            Some(poi) if self.icon_in_range(c, distance) => {
                let bounds = icon_bounds(poi, pos, scale);
                match place_icon(self.collisions, bounds, Self::icon_may_overlap(c)) {
                    PlacementResult::Ok => Element::Placed(bounds),
                    r => Element::Failed(r),
                }
            }
            _ => Element::Absent,
        };

        let (show_text, show_icon) = combine(text, icon, c.flags);
        if show_text && let Some(r) = text.rect() {
            if c.flags.contains(CandidateFlags::RESERVES_SPACE) {
                self.collisions.allocate(r);
            }
            self.record(c, key, PickKind::Text, r);
        }
        if show_icon && let Some(r) = icon.rect() {
            if Self::icon_reserves_space(c) {
                self.collisions.allocate(r);
            }
            self.record(c, key, PickKind::Icon, r);
        }
        self.drive_all(c, show_text, show_icon);
        let fade = distance_fading_factor(c, distance, self.view);
        self.draw_point(c, key, pos, scale, fade);
        Ok(Outcome::of(
            show_text || show_icon,
            persistent,
            text.rejected() || icon.rejected(),
        ))
    }

    fn place_path(
        &mut self,
        c: &mut Candidate,
        key: CandidateKey,
        center: DVec3,
        distance: f64,
        persistent: bool,
    ) -> Result<Outcome, PlacementError> {
        let projector = self.env.projector;
        let screen: Option<Vec<Point>> = c
            .geometry
            .points()
            .iter()
            .map(|p| projector.project(center + *p))
            .collect();
        let result = match screen {
            Some(screen) if self.text_in_range(c, distance) => {
                prepare_glyphs(c, self.env.glyphs)?;
                match place_path_label(
                    c,
                    &screen,
                    Self::may_overlap(c),
                    self.config.min_average_char_px,
                    self.collisions,
                    self.env.measurer,
                ) {
                    Ok(r) => r,
                    Err(PlacementError::EmptyPath) => PlacementResult::Invisible,
                    Err(err) => return Err(err),
                }
            }
            _ => PlacementResult::Invisible,
        };

        let shown = result == PlacementResult::Ok;
        if shown && let Some(buffer) = c.text_buffer() {
            if c.flags.contains(CandidateFlags::RESERVES_SPACE)
                && let Some(detailed) = DetailedCollisionBox::from_details(buffer.character_bounds.clone())
            {
                self.collisions.allocate_detailed(detailed);
            }
            let bounds = buffer.bounds;
            self.record(c, key, PickKind::Text, bounds);
        }
        self.drive(&mut c.text_state, shown);
        let fade = distance_fading_factor(c, distance, self.view);
        self.draw_path(c, key, fade);
        Ok(Outcome::of(shown, persistent, result == PlacementResult::Rejected))
    }

    fn place_markers(
        &mut self,
        c: &mut Candidate,
        key: CandidateKey,
        center: DVec3,
        distance: f64,
        persistent: bool,
    ) -> Result<Outcome, PlacementError> {
        let points = c.geometry.points().to_vec();
        if c.markers.len() != points.len() {
            c.markers.resize(points.len(), MarkerState::default());
        }
        let scale = distance_scale_factor(c, distance, self.view, self.config);
        let relative = if self.text_in_range(c, distance) {
            prepare_glyphs(c, self.env.glyphs)?;
            let anchor = c.current_anchor();
            Some(measure_anchored(c, anchor, self.env.measurer)?)
        } else {
            None
        };
        let with_icon = self.icon_in_range(c, distance);
        let group = c.poi.as_ref().and_then(|p| p.shield_group);
        let min_distance = c
            .layout()
            .marker_min_distance
            .unwrap_or(self.config.line_marker_min_distance);
        let margin = self.config.label_margin(persistent);
        let fade = distance_fading_factor(c, distance, self.view);

        let (mut any_shown, mut any_rejected) = (false, false);
        for (i, p) in points.iter().enumerate() {
            let pos = self.env.projector.project(center + *p);
            let (mut show_text, mut show_icon) = (false, false);
            if let Some(pos) = pos {
                let crowded = group.is_some_and(|g| {
                    self.shields
                        .get(&g)
                        .is_some_and(|placed| placed.iter().any(|q| q.distance(pos) < min_distance))
                });
                if !crowded {
                    let text = relative.map_or(Element::Absent, |r| {
                        let rect = to_screen(r, pos, scale);
                        if !self.collisions.is_visible(&rect) {
                            Element::Failed(PlacementResult::Invisible)
                        } else if !Self::may_overlap(c)
                            && self.collisions.is_allocated(&rect.inflate(margin.x, margin.y))
                        {
                            Element::Failed(PlacementResult::Rejected)
                        } else {
                            Element::Placed(rect)
                        }
                    });
                    let icon = match &c.poi {
                        Some(poi) if with_icon => {
                            let bounds = icon_bounds(poi, pos, scale);
                            match place_icon(self.collisions, bounds, Self::icon_may_overlap(c)) {
                                PlacementResult::Ok => Element::Placed(bounds),
                                r => Element::Failed(r),
                            }
                        }
                        _ => Element::Absent,
                    };
                    (show_text, show_icon) = combine(text, icon, c.flags);
                    any_rejected |= text.rejected() || icon.rejected();
                    if show_text && let Some(r) = text.rect() {
                        if c.flags.contains(CandidateFlags::RESERVES_SPACE) {
                            self.collisions.allocate(r);
                        }
                        self.record(c, key, PickKind::Text, r);
                    }
                    if show_icon && let Some(r) = icon.rect() {
                        if Self::icon_reserves_space(c) {
                            self.collisions.allocate(r);
                        }
                        self.record(c, key, PickKind::Icon, r);
                    }
                    if (show_text || show_icon)
                        && let Some(g) = group
                    {
                        self.shields.entry(g).or_default().push(pos);
                    }
                }
            }
            any_shown |= show_text || show_icon;
            let marker = &mut c.markers[i];
            self.drive(&mut marker.text, show_text);
            self.drive(&mut marker.icon, show_icon);
            if let Some(pos) = pos {
                self.draw_marker(c, key, i, pos, scale, fade);
            }
        }
        Ok(Outcome::of(any_shown, persistent, any_rejected))
    }

    /// Fade out whatever the candidate still shows and keep drawing it while it fades.
    fn retire(&mut self, c: &mut Candidate, key: CandidateKey, center: DVec3, distance: Option<f64>) {
        if !c.is_rendering(self.ctx.frame_number) {
            return;
        }
        let fade = distance.map_or(1.0, |d| distance_fading_factor(c, d, self.view));
        let scale = distance.map_or(1.0, |d| distance_scale_factor(c, d, self.view, self.config));
        match &c.geometry {
            Geometry::Point(p) => {
                let pos = self.env.projector.project(center + *p);
                self.drive_all(c, false, false);
                if let Some(pos) = pos {
                    self.draw_point(c, key, pos, scale, fade);
                }
            }
            Geometry::Path(points) => {
                let projector = self.env.projector;
                let screen: Option<Vec<Point>> =
                    points.iter().map(|p| projector.project(center + *p)).collect();
                if let Some(screen) = screen
                    && c.text_state.is_visible()
                    && let Err(err) = relayout_path_label(c, &screen, self.env.measurer)
                {
                    tracing::trace!(?key, %err, "fading path label keeps its last layout");
                }
                self.drive(&mut c.text_state, false);
                self.draw_path(c, key, fade);
            }
            Geometry::LineMarker(points) => {
                let projected: Vec<Option<Point>> = points
                    .iter()
                    .map(|p| self.env.projector.project(center + *p))
                    .collect();
                for (i, pos) in projected.into_iter().enumerate() {
                    if let Some(marker) = c.markers.get_mut(i) {
                        self.drive(&mut marker.text, false);
                        self.drive(&mut marker.icon, false);
                    }
                    if let Some(pos) = pos {
                        self.draw_marker(c, key, i, pos, scale, fade);
                    }
                }
            }
        }
    }

    fn drive_all(&mut self, c: &mut Candidate, show_text: bool, show_icon: bool) {
        self.drive(&mut c.text_state, show_text);
        self.drive(&mut c.icon_state, show_icon);
    }

    fn drive(&mut self, state: &mut RenderState, show: bool) {
        let (now, frame, disable) = (self.ctx.now, self.ctx.frame_number, self.config.disable_fading);
        state.set_fade_duration(self.config.fade_duration_ms);
        if show {
            state.start_fade_in(now, frame, disable);
        } else {
            state.start_fade_out(now, frame, disable);
        }
        if state.update_fading(now, disable) {
            self.ctx.animating = true;
        }
        if state.is_fading_out() {
            self.ctx.stats.fading_out += 1;
        }
    }

    fn record(&mut self, c: &Candidate, key: CandidateKey, kind: PickKind, bounds: Rect) {
        self.picks.push(PickEntry {
            result: PickResult {
                key,
                feature_id: c.feature_id,
                kind,
                bounds,
            },
            priority: c.priority(),
        });
    }

    fn draw_point(&mut self, c: &Candidate, key: CandidateKey, pos: Point, scale: f64, fade: f64) {
        if c.text_state.is_visible()
            && let Some(glyphs) = c.glyphs()
            && let Some(buffer) = c.text_buffer()
        {
            let bounds = to_screen(buffer.bounds, pos, scale);
            self.env.renderer.draw_text(DrawText {
                key,
                marker: None,
                text: &c.text,
                glyphs,
                position: pos,
                scale,
                opacity: c.text_state.opacity() * fade,
                layout: GlyphLayout::Anchored {
                    anchor: buffer.anchor,
                    bounds,
                },
            });
        }
        if c.icon_state.is_visible()
            && let Some(poi) = &c.poi
        {
            self.env.renderer.draw_icon(DrawIcon {
                key,
                marker: None,
                texture: &poi.texture,
                bounds: icon_bounds(poi, pos, scale),
                opacity: c.icon_state.opacity() * fade,
            });
        }
    }

    fn draw_path(&mut self, c: &Candidate, key: CandidateKey, fade: f64) {
        if c.text_state.is_visible()
            && let Some(glyphs) = c.glyphs()
            && let Some(buffer) = c.text_buffer()
        {
            self.env.renderer.draw_text(DrawText {
                key,
                marker: None,
                text: &c.text,
                glyphs,
                position: buffer.bounds.center(),
                scale: 1.0,
                opacity: c.text_state.opacity() * fade,
                layout: GlyphLayout::PerCharacter(&buffer.character_bounds),
            });
        }
    }

    fn draw_marker(&mut self, c: &Candidate, key: CandidateKey, i: usize, pos: Point, scale: f64, fade: f64) {
        let Some(marker) = c.markers.get(i) else {
            return;
        };
        if marker.text.is_visible()
            && let Some(glyphs) = c.glyphs()
            && let Some(buffer) = c.text_buffer()
        {
            let bounds = to_screen(buffer.bounds, pos, scale);
            self.env.renderer.draw_text(DrawText {
                key,
                marker: Some(i),
                text: &c.text,
                glyphs,
                position: pos,
                scale,
                opacity: marker.text.opacity() * fade,
                layout: GlyphLayout::Anchored {
                    anchor: buffer.anchor,
                    bounds,
                },
            });
        }
        if marker.icon.is_visible()
            && let Some(poi) = &c.poi
        {
            self.env.renderer.draw_icon(DrawIcon {
                key,
                marker: Some(i),
                texture: &poi.texture,
                bounds: icon_bounds(poi, pos, scale),
                opacity: marker.icon.opacity() * fade,
            });
        }
    }
}
