// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dense uniform grid backend over a bounded screen region.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::Rect;

use crate::backend::Backend;

/// Default edge length of a grid cell in pixels.
pub const DEFAULT_CELL_SIZE: f64 = 64.0;

/// Uniform grid backend.
///
/// The grid covers the extent given by [`Backend::set_extent`] with square cells.
/// Bounds reaching outside the extent are clamped into the border cells, so
/// nothing is ever lost; it is merely less well partitioned.
#[derive(Clone)]
pub struct Grid {
    cell_size: f64,
    extent: Rect,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
    len: usize,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl Grid {
    /// Create a grid with the given cell edge length. The extent starts out empty.
    pub fn new(cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");
        Self {
            cell_size,
            extent: Rect::ZERO,
            cols: 1,
            rows: 1,
            cells: vec![Vec::new()],
            len: 0,
        }
    }

    /// Cell edge length in pixels.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of columns and rows.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    #[inline]
    fn cell_count(span: f64, cell_size: f64) -> usize {
        let n = (span / cell_size).ceil();
        if n.is_nan() || n < 1.0 {
            return 1;
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Screen extents are a few thousand pixels; the cell count fits easily."
        )]
        let n = n as usize;
        n.max(1)
    }

    #[inline]
    fn coord(&self, v: f64, origin: f64, count: usize) -> usize {
        let c = ((v - origin) / self.cell_size).floor();
        if c.is_nan() || c <= 0.0 {
            return 0;
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Clamped to the grid dimensions right after the cast."
        )]
        let c = c as usize;
        c.min(count - 1)
    }

    /// Inclusive column and row ranges covered by `r`.
    fn cell_range(&self, r: &Rect) -> (usize, usize, usize, usize) {
        let c0 = self.coord(r.x0, self.extent.x0, self.cols);
        let c1 = self.coord(r.x1, self.extent.x0, self.cols);
        let r0 = self.coord(r.y0, self.extent.y0, self.rows);
        let r1 = self.coord(r.y1, self.extent.y0, self.rows);
        (c0, c1, r0, r1)
    }
}

impl Backend for Grid {
    fn set_extent(&mut self, extent: Rect) {
        let extent = extent.abs();
        self.extent = extent;
        self.cols = Self::cell_count(extent.width(), self.cell_size);
        self.rows = Self::cell_count(extent.height(), self.cell_size);
        self.cells.clear();
        self.cells.resize_with(self.cols * self.rows, Vec::new);
        self.len = 0;
    }

    fn insert(&mut self, slot: usize, bounds: Rect) {
        let (c0, c1, r0, r1) = self.cell_range(&bounds);
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.cells[row * self.cols + col].push(slot);
            }
        }
        self.len += 1;
    }

    fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.len = 0;
    }

    fn query_rect<'a>(&'a self, rect: Rect) -> Box<dyn Iterator<Item = usize> + 'a> {
        let (c0, c1, r0, r1) = self.cell_range(&rect);
        let mut out = Vec::new();
        for row in r0..=r1 {
            for col in c0..=c1 {
                out.extend_from_slice(&self.cells[row * self.cols + col]);
            }
        }
        out.sort_unstable();
        out.dedup();
        Box::new(out.into_iter())
    }
}

impl Debug for Grid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let occupied = self.cells.iter().filter(|c| !c.is_empty()).count();
        f.debug_struct("Grid")
            .field("cell_size", &self.cell_size)
            .field("extent", &self.extent)
            .field("cols", &self.cols)
            .field("rows", &self.rows)
            .field("len", &self.len)
            .field("occupied_cells", &occupied)
            .finish_non_exhaustive()
    }
}
