// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Anchor placements for point labels.
//!
//! A point label may be configured with an ordered list of placements around its
//! anchor. The scheduler tries them starting from the one used last, so a label
//! does not jump around while its current placement keeps fitting.

use core::fmt;
use core::str::FromStr;

use kurbo::{Rect, Size, Vec2};

/// Where a label sits relative to its anchor point.
///
/// Screen space has `y` pointing down, so [`Top`](Self::Top) is above the anchor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum AnchorPlacement {
    /// Centered on the anchor.
    #[default]
    Center,
    /// Above, horizontally centered.
    Top,
    /// Above and to the right.
    TopRight,
    /// To the right, vertically centered.
    Right,
    /// Below and to the right.
    BottomRight,
    /// Below, horizontally centered.
    Bottom,
    /// Below and to the left.
    BottomLeft,
    /// To the left, vertically centered.
    Left,
    /// Above and to the left.
    TopLeft,
}

/// The eight placements around an anchor, clockwise from the top.
pub const CLOCKWISE: [AnchorPlacement; 8] = [
    AnchorPlacement::Top,
    AnchorPlacement::TopRight,
    AnchorPlacement::Right,
    AnchorPlacement::BottomRight,
    AnchorPlacement::Bottom,
    AnchorPlacement::BottomLeft,
    AnchorPlacement::Left,
    AnchorPlacement::TopLeft,
];

impl AnchorPlacement {
    /// Horizontal and vertical alignment factors in `{-1, 0, 1}`.
    const fn direction(self) -> (f64, f64) {
        match self {
            Self::Center => (0.0, 0.0),
            Self::Top => (0.0, -1.0),
            Self::TopRight => (1.0, -1.0),
            Self::Right => (1.0, 0.0),
            Self::BottomRight => (1.0, 1.0),
            Self::Bottom => (0.0, 1.0),
            Self::BottomLeft => (-1.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::TopLeft => (-1.0, -1.0),
        }
    }

    /// Box of `size` placed around an anchor at the origin, `offset` away from it.
    pub fn place(self, size: Size, offset: Vec2) -> Rect {
        let (dx, dy) = self.direction();
        let x0 = match dx {
            d if d > 0.0 => offset.x,
            d if d < 0.0 => -offset.x - size.width,
            _ => -size.width / 2.0,
        };
        let y0 = match dy {
            d if d > 0.0 => offset.y,
            d if d < 0.0 => -offset.y - size.height,
            _ => -size.height / 2.0,
        };
        Rect::new(x0, y0, x0 + size.width, y0 + size.height)
    }

    /// Kebab-case name, as used in style configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Top => "top",
            Self::TopRight => "top-right",
            Self::Right => "right",
            Self::BottomRight => "bottom-right",
            Self::Bottom => "bottom",
            Self::BottomLeft => "bottom-left",
            Self::Left => "left",
            Self::TopLeft => "top-left",
        }
    }
}

impl fmt::Display for AnchorPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown anchor placement name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown anchor placement {0:?}")]
pub struct ParseAnchorError(String);

impl FromStr for AnchorPlacement {
    type Err = ParseAnchorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        core::iter::once(Self::Center)
            .chain(CLOCKWISE)
            .find(|a| a.name() == s)
            .ok_or_else(|| ParseAnchorError(s.to_owned()))
    }
}

/// The `i`-th placement to try after `current` in `list`, wrapping around.
///
/// When `current` is not in the list the scan starts at the first entry.
/// Returns `current` for an empty list.
pub fn next_candidate(list: &[AnchorPlacement], current: AnchorPlacement, i: usize) -> AnchorPlacement {
    if list.is_empty() {
        return current;
    }
    let start = list.iter().position(|a| *a == current).unwrap_or(0);
    list[(start + i) % list.len()]
}

/// Parse a comma separated placement list such as `"top-right, right, bottom"`.
pub fn parse_anchor_list(s: &str) -> Result<Vec<AnchorPlacement>, ParseAnchorError> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::parse)
        .collect()
}
