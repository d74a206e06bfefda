// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat vector backend with linear scans. Small and simple; good for tiny sets.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::Rect;

use crate::backend::Backend;

/// Flat vector backend with linear scans.
#[derive(Clone, Default)]
pub struct FlatVec {
    entries: Vec<Option<Rect>>,
}

impl Debug for FlatVec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let alive = self.entries.iter().filter(|e| e.is_some()).count();
        f.debug_struct("FlatVec")
            .field("alive", &alive)
            .finish_non_exhaustive()
    }
}

impl Backend for FlatVec {
    fn set_extent(&mut self, _extent: Rect) {}

    fn insert(&mut self, slot: usize, bounds: Rect) {
        if self.entries.len() <= slot {
            self.entries.resize_with(slot + 1, || None);
        }
        self.entries[slot] = Some(bounds);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn query_rect<'a>(&'a self, rect: Rect) -> Box<dyn Iterator<Item = usize> + 'a> {
        Box::new(
            self.entries
                .iter()
                .enumerate()
                .filter_map(move |(i, e)| match e {
                    // Inclusive so that degenerate bounds (axis-aligned lines) are found.
                    Some(b) if b.x0 <= rect.x1 && rect.x0 <= b.x1 && b.y0 <= rect.y1 && rect.y0 <= b.y1 => {
                        Some(i)
                    }
                    _ => None,
                }),
        )
    }
}
