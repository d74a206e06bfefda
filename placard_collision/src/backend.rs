// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for the spatial acceleration behind [`ScreenCollisions`](crate::ScreenCollisions).

use alloc::boxed::Box;
use core::fmt::Debug;

use kurbo::Rect;

/// Spatial backend abstraction used by `ScreenCollisions`.
///
/// Occupants are only ever added during a frame and dropped together by
/// [`clear`](Backend::clear), so there is no update or remove.
/// Queries are coarse: they may return slots whose bounds do not actually
/// overlap the query; callers refine the result.
pub trait Backend: Debug {
    /// Resize the region the backend is tuned for. Called on screen size changes.
    fn set_extent(&mut self, extent: Rect);

    /// Insert a new slot with its coarse bounds.
    fn insert(&mut self, slot: usize, bounds: Rect);

    /// Drop all slots.
    fn clear(&mut self);

    /// Query slots whose bounds may intersect `rect`.
    ///
    /// Slots are yielded in ascending order without duplicates.
    fn query_rect<'a>(&'a self, rect: Rect) -> Box<dyn Iterator<Item = usize> + 'a>;
}
