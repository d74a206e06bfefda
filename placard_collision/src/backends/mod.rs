// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `flatvec`: flat vector with linear scans. Fine for a few dozen labels.
//! - `grid`: dense uniform grid over the visible screen region. The default.
//!
//! Screen space is bounded and labels are small relative to it, so a dense grid
//! sized to the screen keeps every query to a handful of cells.

pub mod flatvec;
pub mod grid;
