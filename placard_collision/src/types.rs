// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collision primitives: strict box overlap, detailed boxes, and blocking lines.

use alloc::vec::Vec;
use kurbo::{Line, Point, Rect};

/// Whether two rectangles share a region of positive area.
///
/// Rectangles that only touch along an edge or at a corner do not overlap.
/// Labels laid out edge to edge are therefore never considered colliding.
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Whether `inner` lies completely inside `outer` (edges may coincide).
#[inline]
pub fn contains_rect(outer: &Rect, inner: &Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

/// Whether the segment `line` touches or crosses `rect`.
///
/// Uses Liang–Barsky clipping of the segment against the rectangle slabs.
pub fn segment_intersects_rect(line: Line, rect: &Rect) -> bool {
    let dx = line.p1.x - line.p0.x;
    let dy = line.p1.y - line.p0.y;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let slabs = [
        (-dx, line.p0.x - rect.x0),
        (dx, rect.x1 - line.p0.x),
        (-dy, line.p0.y - rect.y0),
        (dy, rect.y1 - line.p0.y),
    ];
    for (p, q) in slabs {
        if p == 0.0 {
            // Parallel to this slab: reject when outside of it.
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return false;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return false;
            }
            t1 = t1.min(t);
        }
    }
    t0 <= t1
}

/// A collision box with optional per-character sub-boxes.
///
/// Path labels allocate one of these so that later path labels can be tested
/// glyph against glyph instead of against the (mostly empty) coarse bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailedCollisionBox {
    /// Coarse bounds, the union of all detail boxes.
    pub bounds: Rect,
    /// Per-character boxes. Empty means the coarse bounds are exact.
    pub details: Vec<Rect>,
}

impl DetailedCollisionBox {
    /// A box without detail, tested by its bounds alone.
    pub fn from_rect(bounds: Rect) -> Self {
        Self {
            bounds,
            details: Vec::new(),
        }
    }

    /// Build a detailed box from per-character boxes. Returns `None` when `details` is empty.
    pub fn from_details(details: Vec<Rect>) -> Option<Self> {
        let mut it = details.iter();
        let first = *it.next()?;
        let bounds = it.fold(first, |acc, r| acc.union(*r));
        Some(Self { bounds, details })
    }

    /// Exact intersection test against `rect`.
    pub fn intersects(&self, rect: &Rect) -> bool {
        if !overlaps(&self.bounds, rect) {
            return false;
        }
        if self.details.is_empty() {
            return true;
        }
        self.details.iter().any(|d| overlaps(d, rect))
    }
}

/// A screen-space segment that labels must never straddle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockingLine {
    /// The segment.
    pub line: Line,
    /// Cached bounding box of the segment.
    pub bounds: Rect,
}

impl BlockingLine {
    /// Create a blocking segment between two screen points.
    pub fn new(p0: Point, p1: Point) -> Self {
        Self {
            line: Line::new(p0, p1),
            bounds: Rect::from_points(p0, p1),
        }
    }

    /// Blocking segments for every consecutive pair of points of a polyline.
    pub fn polyline(points: &[Point]) -> impl Iterator<Item = Self> + '_ {
        points.windows(2).map(|w| Self::new(w[0], w[1]))
    }

    /// Whether the segment touches or crosses `rect`.
    pub fn intersects(&self, rect: &Rect) -> bool {
        // Bounds of an axis-aligned segment are degenerate, so test them inclusively.
        if self.bounds.x1 < rect.x0
            || rect.x1 < self.bounds.x0
            || self.bounds.y1 < rect.y0
            || rect.y1 < self.bounds.y0
        {
            return false;
        }
        segment_intersects_rect(self.line, rect)
    }
}

/// Something that occupies space in the index.
#[derive(Clone, Debug, PartialEq)]
pub enum Occupant {
    /// An allocated label or icon box.
    Box(DetailedCollisionBox),
    /// A pre-allocated blocking segment.
    Line(BlockingLine),
}

impl Occupant {
    /// Coarse bounds used by the spatial backend.
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Box(b) => b.bounds,
            Self::Line(l) => l.bounds,
        }
    }

    /// Coarse test: the whole bounds for boxes, the exact segment for lines.
    pub fn overlaps_coarse(&self, rect: &Rect) -> bool {
        match self {
            Self::Box(b) => overlaps(&b.bounds, rect),
            Self::Line(l) => l.intersects(rect),
        }
    }

    /// Precise test: detail boxes when present, the exact segment for lines.
    pub fn intersects_detail(&self, rect: &Rect) -> bool {
        match self {
            Self::Box(b) => b.intersects(rect),
            Self::Line(l) => l.intersects(rect),
        }
    }
}
