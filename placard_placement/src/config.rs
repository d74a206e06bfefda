// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tuning knobs of the placement engine.

use kurbo::Vec2;

use crate::error::ConfigError;

/// Placement configuration.
///
/// Every field has a default tuned for a full-screen map view; with the `serde`
/// feature a partial JSON document overrides only the fields it names.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PlacementConfig {
    /// Maximum number of labels rendered per frame. Negative priorities do not count.
    pub max_visible_labels: usize,
    /// Candidate count above which the engine runs in overload mode.
    pub overload_threshold: usize,
    /// Time budget for refreshing the group state cache in overload mode.
    pub overload_update_time_ms: f64,
    /// Time budget for the priority walk in overload mode.
    pub overload_place_time_ms: f64,
    /// Duration of a fade transition.
    pub fade_duration_ms: f64,
    /// Complete every fade transition instantly.
    pub disable_fading: bool,
    /// Do not start showing new labels while the camera moves.
    pub delay_labels_until_movement_finished: bool,
    /// On a globe, labels whose surface normal has a dot product with the view
    /// direction at or above this value are behind the horizon.
    pub horizon_cull_cos: f64,
    /// Text is hidden beyond this fraction of the maximum visibility distance.
    pub max_distance_ratio_text: f64,
    /// Icons are hidden beyond this fraction of the maximum visibility distance.
    pub max_distance_ratio_icon: f64,
    /// Lower clamp of the distance scale factor.
    pub label_distance_scale_min: f64,
    /// Upper clamp of the distance scale factor.
    pub label_distance_scale_max: f64,
    /// Path labels need at least this many pixels of path per character.
    pub min_average_char_px: f64,
    /// Margin added around new point labels for collision tests.
    pub new_label_margin: Vec2,
    /// Margin added around persistent point labels for collision tests.
    pub persistent_label_margin: Vec2,
    /// Distance in pixels beyond the screen edges that still counts as visible.
    pub screen_margin: f64,
    /// Candidates with the same identity closer than this world distance are duplicates.
    pub duplicate_distance: f64,
    /// Default minimum screen distance between line markers of one shield group.
    pub line_marker_min_distance: f64,
    /// Cell size of the collision grid in pixels.
    pub collision_cell_size: f64,
}

/// `cos(108°)`, the default for [`PlacementConfig::horizon_cull_cos`].
pub const DEFAULT_HORIZON_CULL_COS: f64 = -0.309_016_994_374_947_4;

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_visible_labels: 500,
            overload_threshold: 20_000,
            overload_update_time_ms: 5.0,
            overload_place_time_ms: 10.0,
            fade_duration_ms: placard_fading::DEFAULT_FADE_TIME,
            disable_fading: false,
            delay_labels_until_movement_finished: false,
            horizon_cull_cos: DEFAULT_HORIZON_CULL_COS,
            max_distance_ratio_text: 0.99,
            max_distance_ratio_icon: 0.99,
            label_distance_scale_min: 0.7,
            label_distance_scale_max: 1.5,
            min_average_char_px: 5.0,
            new_label_margin: Vec2::new(4.0, 2.0),
            persistent_label_margin: Vec2::new(2.0, 1.0),
            screen_margin: placard_collision::screen::DEFAULT_VISIBILITY_MARGIN,
            duplicate_distance: 1000.0,
            line_marker_min_distance: 100.0,
            collision_cell_size: placard_collision::backends::grid::DEFAULT_CELL_SIZE,
        }
    }
}

impl PlacementConfig {
    /// Parse a configuration from JSON. Missing fields keep their defaults.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, reason })
        }
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;

        if self.max_visible_labels == 0 {
            return invalid("max_visible_labels", "must be at least 1");
        }
        for (field, v) in [
            ("overload_update_time_ms", self.overload_update_time_ms),
            ("overload_place_time_ms", self.overload_place_time_ms),
            ("fade_duration_ms", self.fade_duration_ms),
            ("min_average_char_px", self.min_average_char_px),
            ("screen_margin", self.screen_margin),
            ("duplicate_distance", self.duplicate_distance),
            ("line_marker_min_distance", self.line_marker_min_distance),
        ] {
            if !non_negative(v) {
                return invalid(field, "must be finite and non-negative");
            }
        }
        if !(-1.0..=1.0).contains(&self.horizon_cull_cos) {
            return invalid("horizon_cull_cos", "must be a cosine in [-1, 1]");
        }
        for (field, v) in [
            ("max_distance_ratio_text", self.max_distance_ratio_text),
            ("max_distance_ratio_icon", self.max_distance_ratio_icon),
        ] {
            if !(v > 0.0 && v <= 1.0) {
                return invalid(field, "must be in (0, 1]");
            }
        }
        if !(self.label_distance_scale_min > 0.0
            && self.label_distance_scale_min <= self.label_distance_scale_max
            && self.label_distance_scale_max.is_finite())
        {
            return invalid(
                "label_distance_scale_min",
                "must be positive and not above label_distance_scale_max",
            );
        }
        for (field, m) in [
            ("new_label_margin", self.new_label_margin),
            ("persistent_label_margin", self.persistent_label_margin),
        ] {
            if !(non_negative(m.x) && non_negative(m.y)) {
                return invalid(field, "must be finite and non-negative");
            }
        }
        if !(self.collision_cell_size.is_finite() && self.collision_cell_size > 0.0) {
            return invalid("collision_cell_size", "must be positive");
        }
        Ok(())
    }

    /// Collision margin for a point label, depending on whether it was visible last frame.
    pub fn label_margin(&self, persistent: bool) -> Vec2 {
        if persistent {
            self.persistent_label_margin
        } else {
            self.new_label_margin
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = PlacementConfig::default();
        c.validate().unwrap();
        assert_eq!(c.max_visible_labels, 500);
        assert_eq!(c.overload_threshold, 20_000);
        assert_eq!(c.fade_duration_ms, 800.0);
        assert!((c.horizon_cull_cos - 108_f64.to_radians().cos()).abs() < 1e-12);
    }

    #[test]
    fn persistent_labels_get_the_smaller_margin() {
        let c = PlacementConfig::default();
        assert!(c.label_margin(true).x < c.label_margin(false).x);
        assert!(c.label_margin(true).y < c.label_margin(false).y);
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let c = PlacementConfig {
            max_distance_ratio_text: 1.5,
            ..PlacementConfig::default()
        };
        let err = c.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid `max_distance_ratio_text`: must be in (0, 1]"
        );

        let c = PlacementConfig {
            label_distance_scale_min: 2.0,
            ..PlacementConfig::default()
        };
        assert!(c.validate().is_err());

        let c = PlacementConfig {
            fade_duration_ms: f64::NAN,
            ..PlacementConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_keeps_defaults() {
        let c = PlacementConfig::from_json(r#"{ "max_visible_labels": 64, "disable_fading": true }"#)
            .unwrap();
        assert_eq!(c.max_visible_labels, 64);
        assert!(c.disable_fading);
        assert_eq!(c.overload_threshold, 20_000);
        assert!(PlacementConfig::from_json(r#"{ "max_visible_labels": 0 }"#).is_err());
        assert!(PlacementConfig::from_json("{ nope").is_err());
    }
}
