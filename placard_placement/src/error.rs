// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! None of these escape [`PlacementScheduler::place_frame`](crate::PlacementScheduler::place_frame):
//! a candidate whose glyphs cannot be measured is logged and skipped for the frame.

use thiserror::Error;

/// Failure reported by a [`GlyphSupplier`](crate::GlyphSupplier) or
/// [`TextMeasurer`](crate::TextMeasurer).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeasureError {
    /// Some characters have no glyph in the requested style.
    #[error("no glyphs for {missing} character(s) of {text:?}")]
    MissingGlyphs {
        /// The label text.
        text: String,
        /// Number of characters without a glyph.
        missing: usize,
    },
    /// The glyph data could not be laid out.
    #[error("malformed glyph data: {0}")]
    Malformed(String),
}

/// Per-candidate placement failure. Logged, never propagated out of a frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    /// The collaborators could not measure the text.
    #[error(transparent)]
    Measure(#[from] MeasureError),
    /// The measurer returned fewer character boxes than there are glyphs.
    #[error("measured {measured} of {expected} glyphs")]
    PartialMeasurement {
        /// Number of glyphs in the run.
        expected: usize,
        /// Number of character boxes returned.
        measured: usize,
    },
    /// A path label has fewer than two points on screen.
    #[error("path label has no segment on screen")]
    EmptyPath,
}

/// Invalid [`PlacementConfig`](crate::PlacementConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field is out of its valid range.
    #[error("invalid `{field}`: {reason}")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// The JSON document could not be parsed.
    #[cfg(feature = "serde")]
    #[error("failed to parse placement config: {0}")]
    Json(#[from] serde_json::Error),
}
