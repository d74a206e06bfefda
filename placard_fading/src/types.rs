// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fading states and timing constants.

/// Default duration of a fade transition, in milliseconds.
pub const DEFAULT_FADE_TIME: f64 = 800.0;

/// State of a fade timeline.
///
/// ```text
/// Undefined ──fade in──▶ FadingIn ──timeout──▶ FadedIn
///                          ▲   │                  │
///                  fade in │   │ fade out         │ fade out
///                          │   ▼                  ▼
///             FadedOut ◀──timeout── FadingOut ◀───┘
/// ```
///
/// `FadedOut` may fade in again; `Undefined` is only left by fading in.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum FadingState {
    /// Never shown, or reset after going stale.
    #[default]
    Undefined,
    /// Opacity rising towards 1.
    FadingIn,
    /// Fully shown.
    FadedIn,
    /// Opacity falling towards 0.
    FadingOut,
    /// Fully hidden.
    FadedOut,
}

impl FadingState {
    /// True while a transition is in flight.
    pub const fn is_transition(self) -> bool {
        matches!(self, Self::FadingIn | Self::FadingOut)
    }

    /// True when anything of the element is on screen.
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::FadingIn | Self::FadedIn | Self::FadingOut)
    }

    /// Opacity an element has when it rests in this state.
    ///
    /// Only meaningful for the resting states; transitions report their start value.
    pub const fn resting_opacity(self) -> f64 {
        match self {
            Self::FadedIn | Self::FadingOut => 1.0,
            Self::Undefined | Self::FadingIn | Self::FadedOut => 0.0,
        }
    }
}
