// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`ScreenCollisions`]: the per-frame occupancy index over screen space.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};

use crate::backend::Backend;
use crate::backends::grid::Grid;
use crate::types::{BlockingLine, DetailedCollisionBox, Occupant, contains_rect, overlaps};

/// Default enlargement of the screen bounds used by [`ScreenCollisions::is_visible`].
pub const DEFAULT_VISIBILITY_MARGIN: f64 = 32.0;

/// Occupancy index over screen space, generic over a spatial backend.
///
/// Screen coordinates are pixels with the origin at the screen center, so the
/// screen covers `[-w/2, w/2] × [-h/2, h/2]`.
///
/// The index only grows during a frame; [`reset`](Self::reset) empties it at the
/// start of the next one.
#[derive(Clone, Debug)]
pub struct ScreenCollisionsGeneric<B: Backend> {
    screen: Rect,
    visible: Rect,
    margin: f64,
    occupants: Vec<Occupant>,
    backend: B,
}

/// Screen collision index backed by the uniform [`Grid`].
pub type ScreenCollisions = ScreenCollisionsGeneric<Grid>;

impl ScreenCollisions {
    /// Create an index for a screen of the given pixel size.
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_backend(Grid::default(), width, height)
    }

    /// Create an index with a custom grid cell size.
    pub fn with_cell_size(cell_size: f64, width: f64, height: f64) -> Self {
        Self::with_backend(Grid::new(cell_size), width, height)
    }
}

impl<B: Backend> ScreenCollisionsGeneric<B> {
    /// Create an index using `backend` for acceleration.
    pub fn with_backend(backend: B, width: f64, height: f64) -> Self {
        let mut this = Self {
            screen: Rect::ZERO,
            visible: Rect::ZERO,
            margin: DEFAULT_VISIBILITY_MARGIN,
            occupants: Vec::new(),
            backend,
        };
        this.set_screen_size(Size::new(width, height));
        this
    }

    /// Change the screen size. Drops all allocations.
    pub fn set_screen_size(&mut self, size: Size) {
        let (hw, hh) = (size.width.abs() / 2.0, size.height.abs() / 2.0);
        let screen = Rect::new(-hw, -hh, hw, hh);
        if screen == self.screen {
            self.reset();
            return;
        }
        self.screen = screen;
        self.visible = screen.inflate(self.margin, self.margin);
        self.occupants.clear();
        self.backend.set_extent(self.visible);
    }

    /// Change how far outside the screen a box may lie and still count as visible.
    pub fn set_visibility_margin(&mut self, margin: f64) {
        self.margin = margin.max(0.0);
        self.visible = self.screen.inflate(self.margin, self.margin);
        self.occupants.clear();
        self.backend.set_extent(self.visible);
    }

    /// Screen bounds, centered at the origin.
    pub fn screen_bounds(&self) -> Rect {
        self.screen
    }

    /// Enlarged bounds used by [`is_visible`](Self::is_visible).
    pub fn visible_bounds(&self) -> Rect {
        self.visible
    }

    /// Drop every allocation and blocking line.
    pub fn reset(&mut self) {
        self.occupants.clear();
        self.backend.clear();
    }

    /// Number of occupants (boxes and lines).
    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    /// True when nothing has been allocated since the last reset.
    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Iterate all occupants in allocation order.
    pub fn occupants(&self) -> impl Iterator<Item = &Occupant> + '_ {
        self.occupants.iter()
    }

    fn push(&mut self, occupant: Occupant) {
        let slot = self.occupants.len();
        self.backend.insert(slot, occupant.bounds());
        self.occupants.push(occupant);
    }

    /// Mark `rect` as occupied.
    pub fn allocate(&mut self, rect: Rect) {
        self.push(Occupant::Box(DetailedCollisionBox::from_rect(rect)));
    }

    /// Mark a box with per-character detail as occupied.
    pub fn allocate_detailed(&mut self, detailed: DetailedCollisionBox) {
        self.push(Occupant::Box(detailed));
    }

    /// Pre-allocate blocking segments. Call before placing any label.
    pub fn allocate_lines<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = BlockingLine>,
    {
        for line in lines {
            self.push(Occupant::Line(line));
        }
    }

    /// Whether `rect` overlaps any occupant, using coarse bounds for boxes.
    pub fn is_allocated(&self, rect: &Rect) -> bool {
        self.backend
            .query_rect(*rect)
            .any(|slot| self.occupants[slot].overlaps_coarse(rect))
    }

    /// Whether `rect` intersects the enlarged screen bounds.
    pub fn is_visible(&self, rect: &Rect) -> bool {
        overlaps(&self.visible, rect)
    }

    /// Whether `rect` lies completely on screen, without clipping.
    pub fn is_fully_visible(&self, rect: &Rect) -> bool {
        contains_rect(&self.screen, rect)
    }

    /// Whether `point` lies within the enlarged screen bounds.
    pub fn is_point_visible(&self, point: Point) -> bool {
        self.visible.contains(point)
    }

    /// Occupants whose coarse bounds overlap `rect`.
    ///
    /// Use the result with [`intersects_details`](Self::intersects_details) to test
    /// many small boxes (glyphs) that all lie within `rect`.
    pub fn search(&self, rect: &Rect) -> Vec<&Occupant> {
        self.backend
            .query_rect(*rect)
            .map(|slot| &self.occupants[slot])
            .filter(|o| o.overlaps_coarse(rect))
            .collect()
    }

    /// Exact test of `rect` against previously searched `candidates`.
    pub fn intersects_details(&self, rect: &Rect, candidates: &[&Occupant]) -> bool {
        candidates.iter().any(|o| o.intersects_detail(rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::flatvec::FlatVec;
    use alloc::vec;

    #[test]
    fn screen_is_centered() {
        let sc = ScreenCollisions::new(800.0, 600.0);
        assert_eq!(sc.screen_bounds(), Rect::new(-400.0, -300.0, 400.0, 300.0));
        assert!(sc.is_fully_visible(&Rect::new(-400.0, -300.0, 0.0, 0.0)));
        assert!(!sc.is_fully_visible(&Rect::new(390.0, 0.0, 410.0, 10.0)));
        // Partially off screen is still visible, and so is the margin.
        assert!(sc.is_visible(&Rect::new(390.0, 0.0, 410.0, 10.0)));
        assert!(sc.is_visible(&Rect::new(410.0, 0.0, 420.0, 10.0)));
        assert!(!sc.is_visible(&Rect::new(500.0, 0.0, 520.0, 10.0)));
        assert!(sc.is_point_visible(Point::new(420.0, 0.0)));
    }

    #[test]
    fn allocate_then_query() {
        let mut sc = ScreenCollisions::new(800.0, 600.0);
        let a = Rect::new(0.0, 0.0, 50.0, 20.0);
        assert!(!sc.is_allocated(&a));
        sc.allocate(a);
        assert!(sc.is_allocated(&Rect::new(40.0, 10.0, 60.0, 30.0)));
        assert!(!sc.is_allocated(&Rect::new(50.0, 0.0, 60.0, 20.0)), "touching is free");
        sc.reset();
        assert!(sc.is_empty());
        assert!(!sc.is_allocated(&a));
    }

    #[test]
    fn details_refine_coarse_hits() {
        let mut sc = ScreenCollisions::new(800.0, 600.0);
        let glyphs = vec![
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(10.0, 10.0, 20.0, 20.0),
            Rect::new(20.0, 20.0, 30.0, 30.0),
        ];
        sc.allocate_detailed(DetailedCollisionBox::from_details(glyphs).unwrap());

        // Lies in the empty upper-right part of the diagonal label.
        let query = Rect::new(22.0, 2.0, 28.0, 8.0);
        assert!(sc.is_allocated(&query), "coarse test sees the bounds");
        let candidates = sc.search(&query);
        assert_eq!(candidates.len(), 1);
        assert!(!sc.intersects_details(&query, &candidates));
        let hit = Rect::new(12.0, 12.0, 14.0, 14.0);
        assert!(sc.intersects_details(&hit, &sc.search(&hit)));
    }

    #[test]
    fn blocking_lines_reject_straddling_boxes() {
        let mut sc = ScreenCollisions::new(800.0, 600.0);
        sc.allocate_lines(BlockingLine::polyline(&[
            Point::new(-300.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 200.0),
        ]));
        assert_eq!(sc.len(), 2);
        assert!(sc.is_allocated(&Rect::new(-100.0, -5.0, -50.0, 5.0)));
        assert!(sc.is_allocated(&Rect::new(-5.0, 100.0, 5.0, 110.0)));
        assert!(!sc.is_allocated(&Rect::new(10.0, 10.0, 100.0, 100.0)));
        let query = Rect::new(-5.0, 150.0, 5.0, 160.0);
        assert!(sc.intersects_details(&query, &sc.search(&query)));
    }

    #[test]
    fn flatvec_and_grid_agree() {
        let mut grid = ScreenCollisions::with_cell_size(16.0, 400.0, 400.0);
        let mut flat = ScreenCollisionsGeneric::with_backend(FlatVec::default(), 400.0, 400.0);
        let mut seed = 7_u32;
        let mut next = || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            f64::from(seed >> 16) / 65536.0
        };
        for _ in 0..200 {
            let x = next() * 400.0 - 200.0;
            let y = next() * 400.0 - 200.0;
            let r = Rect::new(x, y, x + next() * 40.0 + 1.0, y + next() * 20.0 + 1.0);
            assert_eq!(grid.is_allocated(&r), flat.is_allocated(&r));
            if !grid.is_allocated(&r) {
                grid.allocate(r);
                flat.allocate(r);
            }
        }
        assert_eq!(grid.len(), flat.len());
    }

    #[test]
    fn resize_drops_allocations() {
        let mut sc = ScreenCollisions::new(800.0, 600.0);
        sc.allocate(Rect::new(0.0, 0.0, 10.0, 10.0));
        sc.set_screen_size(Size::new(1024.0, 768.0));
        assert!(sc.is_empty());
        assert_eq!(sc.screen_bounds().width(), 1024.0);
    }
}
