// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement of single icons, point labels, and path labels.
//!
//! These functions only decide; they never allocate. The scheduler allocates
//! once it knows that both the text and the icon of a candidate are kept.

use kurbo::{Point, Rect, Vec2};
use placard_collision::ScreenCollisions;

use crate::anchor::{AnchorPlacement, next_candidate};
use crate::candidate::{Candidate, TextBuffer};
use crate::env::{GlyphSupplier, MeasureTarget, TextMeasurer};
use crate::error::{MeasureError, PlacementError};
use crate::poi::PoiInfo;

/// Outcome of a placement attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PlacementResult {
    /// On screen and the space is free.
    Ok,
    /// On screen, but the space is taken.
    Rejected,
    /// Not on screen, or otherwise not shown.
    Invisible,
}

/// Screen bounds of an icon drawn at `position`.
pub fn icon_bounds(poi: &PoiInfo, position: Point, scale: f64) -> Rect {
    let center = position + poi.offset * scale;
    Rect::from_center_size(center, poi.size * scale)
}

/// Decide whether an icon with screen `bounds` can be shown.
pub fn place_icon(collisions: &ScreenCollisions, bounds: Rect, may_overlap: bool) -> PlacementResult {
    if !collisions.is_visible(&bounds) {
        PlacementResult::Invisible
    } else if !may_overlap && collisions.is_allocated(&bounds) {
        PlacementResult::Rejected
    } else {
        PlacementResult::Ok
    }
}

/// Fetch and cache the glyphs of `candidate` unless it has them already.
pub fn prepare_glyphs(candidate: &mut Candidate, supplier: &dyn GlyphSupplier) -> Result<(), PlacementError> {
    if candidate.glyphs().is_none() {
        let run = supplier.glyphs(&candidate.text, candidate.style())?;
        candidate.set_glyphs(run);
    }
    Ok(())
}

fn missing_glyphs(candidate: &Candidate) -> PlacementError {
    MeasureError::MissingGlyphs {
        text: candidate.text.clone(),
        missing: candidate.text.chars().count(),
    }
    .into()
}

/// Measure the candidate's text around an anchor at the origin, reusing the cached
/// buffer when it was measured for the same placement. Returns anchor-relative bounds.
pub(crate) fn measure_anchored(
    candidate: &mut Candidate,
    anchor: AnchorPlacement,
    measurer: &dyn TextMeasurer,
) -> Result<Rect, PlacementError> {
    if let Some(buffer) = candidate.text_buffer()
        && buffer.anchor == anchor
    {
        return Ok(buffer.bounds);
    }
    let buffer = measure_at(candidate, anchor, measurer)?;
    let bounds = buffer.bounds;
    candidate.set_text_buffer(buffer);
    Ok(bounds)
}

/// Measure the candidate's text for `anchor` without touching its cached buffer.
fn measure_at(
    candidate: &Candidate,
    anchor: AnchorPlacement,
    measurer: &dyn TextMeasurer,
) -> Result<TextBuffer, PlacementError> {
    let Some(glyphs) = candidate.glyphs() else {
        return Err(missing_glyphs(candidate));
    };
    let offset = candidate.layout().offset;
    let m = measurer.measure(glyphs, MeasureTarget::Anchored { anchor, offset })?;
    check_glyph_count(glyphs.len(), m.character_bounds.len())?;
    Ok(TextBuffer {
        anchor,
        bounds: m.bounds,
        character_bounds: m.character_bounds,
    })
}

fn check_glyph_count(expected: usize, measured: usize) -> Result<(), PlacementError> {
    if expected == measured {
        Ok(())
    } else {
        Err(PlacementError::PartialMeasurement { expected, measured })
    }
}

pub(crate) fn to_screen(relative: Rect, position: Point, scale: f64) -> Rect {
    relative.scale_from_origin(scale) + position.to_vec2()
}

/// Inputs of [`place_point_label`] beyond the candidate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointLabelParams {
    /// Screen position of the anchor point.
    pub position: Point,
    /// Distance scale factor.
    pub scale: f64,
    /// Whether the label was visible in the previous frame.
    pub persistent: bool,
    /// Skip the collision test.
    pub may_overlap: bool,
    /// Margin added around the text for the collision test.
    pub margin: Vec2,
}

/// Result of [`place_point_label`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointLabelPlacement {
    /// Outcome.
    pub result: PlacementResult,
    /// Screen bounds of the text at the chosen placement, or at the last estimate tried.
    pub bounds: Rect,
    /// Chosen placement.
    pub anchor: AnchorPlacement,
}

/// Place a point label, trying alternative anchor placements when the layout has any.
///
/// The scan starts at the placement the label was last shown with and walks the
/// layout's list clockwise. Persistent labels try every placement; new labels give
/// up at the first placement that is off screen. Switching placement re-measures
/// the text and tests the exact bounds again.
///
/// The candidate's glyphs must have been prepared with [`prepare_glyphs`].
pub fn place_point_label(
    candidate: &mut Candidate,
    params: &PointLabelParams,
    collisions: &ScreenCollisions,
    measurer: &dyn TextMeasurer,
) -> Result<PointLabelPlacement, PlacementError> {
    let current = candidate.current_anchor();
    let relative = measure_anchored(candidate, current, measurer)?;
    let size = relative.size();
    let offset = candidate.layout().offset;
    let anchors = candidate.layout().anchors.clone();
    let tries = if candidate.layout().has_alternatives() {
        anchors.len()
    } else {
        1
    };

    let free = |rect: &Rect| {
        params.may_overlap
            || !collisions.is_allocated(&rect.inflate(params.margin.x, params.margin.y))
    };

    let mut collided = false;
    let mut last = to_screen(relative, params.position, params.scale);
    for i in 0..tries {
        let anchor = next_candidate(&anchors, current, i);
        let estimate = if anchor == current {
            relative
        } else {
            anchor.place(size, offset)
        };
        let rect = to_screen(estimate, params.position, params.scale);
        last = rect;
        if !collisions.is_visible(&rect) {
            if params.persistent {
                continue;
            }
            break;
        }
        if !free(&rect) {
            collided = true;
            continue;
        }
        if anchor == current {
            candidate.set_anchor(anchor);
            return Ok(PointLabelPlacement {
                result: PlacementResult::Ok,
                bounds: rect,
                anchor,
            });
        }

        // The candidate keeps its placement until the exact bounds fit.
        let buffer = measure_at(candidate, anchor, measurer)?;
        let exact = to_screen(buffer.bounds, params.position, params.scale);
        if collisions.is_visible(&exact) && free(&exact) {
            candidate.set_anchor(anchor);
            candidate.set_text_buffer(buffer);
            return Ok(PointLabelPlacement {
                result: PlacementResult::Ok,
                bounds: exact,
                anchor,
            });
        }
        collided = true;
    }

    let result = if params.persistent && collided {
        PlacementResult::Rejected
    } else {
        PlacementResult::Invisible
    };
    Ok(PointLabelPlacement {
        result,
        bounds: last,
        anchor: current,
    })
}

/// Whether a path is too short on screen for `glyph_count` characters.
///
/// Compares the diagonal of the path's screen bounds with `glyph_count` times
/// the minimum average width of a character.
pub fn is_path_label_too_small(path: &[Point], glyph_count: usize, min_average_char_px: f64) -> bool {
    let Some((&first, rest)) = path.split_first() else {
        return true;
    };
    let bounds = rest
        .iter()
        .fold(Rect::from_points(first, first), |r, p| r.union_pt(*p));
    let needed = glyph_count as f64 * min_average_char_px;
    bounds.size().to_vec2().hypot() < needed
}

/// Whether text laid out along `path` would be upside down.
///
/// Decided by the direction of the path at half its length.
pub fn is_upside_down(path: &[Point]) -> bool {
    midpoint_tangent(path).is_some_and(|t| t.x < 0.0)
}

/// Direction of the segment holding the point at half the path's length.
fn midpoint_tangent(path: &[Point]) -> Option<Vec2> {
    let length: f64 = path.windows(2).map(|w| w[0].distance(w[1])).sum();
    if length <= 0.0 {
        return None;
    }
    let mut remaining = length * 0.5;
    let mut tangent = None;
    for w in path.windows(2) {
        let segment = w[1] - w[0];
        let l = segment.hypot();
        if l <= 0.0 {
            continue;
        }
        tangent = Some(segment);
        if remaining <= l {
            break;
        }
        remaining -= l;
    }
    tangent
}

/// Place a label along a screen-space path.
///
/// The path is reversed when the text would read upside down. The label is
/// rejected when any single character overlaps an occupant; characters are only
/// tested individually when the whole label's bounds touch occupied space.
/// Whenever the path is long enough to be measured, the candidate's text buffer
/// is updated to the screen-space character boxes along it, shown or not.
///
/// The candidate's glyphs must have been prepared with [`prepare_glyphs`].
pub fn place_path_label(
    candidate: &mut Candidate,
    screen_path: &[Point],
    may_overlap: bool,
    min_average_char_px: f64,
    collisions: &ScreenCollisions,
    measurer: &dyn TextMeasurer,
) -> Result<PlacementResult, PlacementError> {
    if screen_path.len() < 2 {
        return Err(PlacementError::EmptyPath);
    }
    let Some(glyphs) = candidate.glyphs() else {
        return Err(missing_glyphs(candidate));
    };
    if is_path_label_too_small(screen_path, glyphs.len(), min_average_char_px) {
        return Ok(PlacementResult::Invisible);
    }
    let buffer = measure_path(candidate, screen_path, measurer)?;

    let result = if !buffer.character_bounds.iter().all(|c| collisions.is_visible(c)) {
        PlacementResult::Invisible
    } else if !may_overlap && glyphs_collide(&buffer, collisions) {
        PlacementResult::Rejected
    } else {
        PlacementResult::Ok
    };
    candidate.set_text_buffer(buffer);
    Ok(result)
}

fn glyphs_collide(buffer: &TextBuffer, collisions: &ScreenCollisions) -> bool {
    if !collisions.is_allocated(&buffer.bounds) {
        return false;
    }
    let nearby = collisions.search(&buffer.bounds);
    buffer
        .character_bounds
        .iter()
        .any(|c| collisions.intersects_details(c, &nearby))
}

/// Lay the candidate's text out along `screen_path` again without testing it,
/// so that a label fading out follows the map.
pub(crate) fn relayout_path_label(
    candidate: &mut Candidate,
    screen_path: &[Point],
    measurer: &dyn TextMeasurer,
) -> Result<(), PlacementError> {
    if screen_path.len() < 2 {
        return Err(PlacementError::EmptyPath);
    }
    let buffer = measure_path(candidate, screen_path, measurer)?;
    candidate.set_text_buffer(buffer);
    Ok(())
}

fn measure_path(
    candidate: &Candidate,
    screen_path: &[Point],
    measurer: &dyn TextMeasurer,
) -> Result<TextBuffer, PlacementError> {
    let Some(glyphs) = candidate.glyphs() else {
        return Err(missing_glyphs(candidate));
    };
    let reversed: Vec<Point>;
    let path = if is_upside_down(screen_path) {
        reversed = screen_path.iter().rev().copied().collect();
        &reversed[..]
    } else {
        screen_path
    };
    let m = measurer.measure(glyphs, MeasureTarget::Path(path))?;
    check_glyph_count(glyphs.len(), m.character_bounds.len())?;
    Ok(TextBuffer {
        anchor: AnchorPlacement::Center,
        bounds: m.bounds,
        character_bounds: m.character_bounds,
    })
}
