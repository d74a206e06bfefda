// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cheap pre-filters run before any measuring or collision testing.

use ahash::AHashSet;
use glam::DVec3;

use crate::cache::{DuplicateIndex, Registration};
use crate::candidate::{Candidate, CandidateFlags};
use crate::config::PlacementConfig;
use crate::group::CandidateKey;
use crate::poi::{PoiLookup, PoiTableLookup};
use crate::view::ViewState;

/// Outcome of [`check_ready_for_placement`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrePlacementResult {
    /// Ready for placement.
    Ok,
    /// A POI table the icon depends on is still loading.
    NotReady,
    /// Hidden, out of its zoom range, or without a usable icon.
    Invisible,
    /// Beyond the maximum view distance or behind the horizon.
    TooFar,
    /// Another candidate already represents the same label.
    Duplicate,
}

/// Result and view distance of a candidate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Readiness {
    /// Outcome.
    pub result: PrePlacementResult,
    /// Distance from the camera, when it got that far.
    pub view_distance: Option<f64>,
}

impl Readiness {
    fn rejected(result: PrePlacementResult) -> Self {
        Self {
            result,
            view_distance: None,
        }
    }
}

/// Shared state of one evaluation pass.
pub struct EvalEnv<'a> {
    /// Configuration.
    pub config: &'a PlacementConfig,
    /// Camera.
    pub view: &'a ViewState,
    /// POI tables, when the host has any.
    pub poi_tables: Option<&'a dyn PoiTableLookup>,
    /// Tables already reported missing.
    pub missing_tables: &'a mut AHashSet<String>,
    /// Representatives registered so far in this pass.
    pub duplicates: &'a mut DuplicateIndex,
}

impl core::fmt::Debug for EvalEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EvalEnv")
            .field("view", &self.view)
            .field("missing_tables", &self.missing_tables.len())
            .finish_non_exhaustive()
    }
}

/// Decide whether `candidate` is worth placing, and how far away it is.
///
/// The checks run in a fixed order and stop at the first failure:
///
/// 1. the visibility flag;
/// 2. POI table resolution, which may change visibility and zoom range;
/// 3. visibility and zoom range again, and a usable icon where one is required;
/// 4. view distance, the smaller distance of the geometry's two endpoints;
/// 5. `max_view_distance` and the globe horizon;
/// 6. de-duplication against representatives registered earlier in the pass.
pub fn check_ready_for_placement(
    candidate: &mut Candidate,
    key: CandidateKey,
    tile_center: DVec3,
    env: &mut EvalEnv<'_>,
    max_view_distance: Option<f64>,
) -> Readiness {
    if !candidate.flags.contains(CandidateFlags::VISIBLE) {
        return Readiness::rejected(PrePlacementResult::Invisible);
    }

    if resolve_poi(candidate, env) == PrePlacementResult::NotReady {
        return Readiness::rejected(PrePlacementResult::NotReady);
    }

    let zoom = env.view.zoom_level;
    if !candidate.flags.contains(CandidateFlags::VISIBLE) || !candidate.is_in_zoom_range(zoom) {
        return Readiness::rejected(PrePlacementResult::Invisible);
    }
    if candidate.poi.is_some()
        && !candidate.has_icon()
        && (candidate.text.is_empty() || !candidate.flags.contains(CandidateFlags::ICON_OPTIONAL))
    {
        return Readiness::rejected(PrePlacementResult::Invisible);
    }

    let Some((first, last)) = candidate.geometry.endpoints() else {
        return Readiness::rejected(PrePlacementResult::Invisible);
    };
    let camera = env.view.camera_position;
    let view_distance = camera
        .distance(tile_center + first)
        .min(camera.distance(tile_center + last));

    let anchor = tile_center + candidate.geometry.anchor().unwrap_or(first);
    let too_far = max_view_distance.is_some_and(|max| view_distance > max)
        || env
            .view
            .is_beyond_horizon(anchor, env.config.horizon_cull_cos);
    if too_far {
        return Readiness {
            result: PrePlacementResult::TooFar,
            view_distance: Some(view_distance),
        };
    }

    if let Some(identity) = candidate.identity()
        && let Registration::Duplicate(of) =
            env.duplicates
                .register(identity, anchor, key, env.config.duplicate_distance)
    {
        tracing::trace!(?key, representative = ?of, "duplicate label");
        return Readiness {
            result: PrePlacementResult::Duplicate,
            view_distance: Some(view_distance),
        };
    }

    Readiness {
        result: PrePlacementResult::Ok,
        view_distance: Some(view_distance),
    }
}

/// Resolve the icon's POI table dependency. Returns `NotReady` while the table is loading.
fn resolve_poi(candidate: &mut Candidate, env: &mut EvalEnv<'_>) -> PrePlacementResult {
    let Some(poi) = candidate.poi.as_mut() else {
        return PrePlacementResult::Ok;
    };
    if poi.is_resolved() {
        return PrePlacementResult::Ok;
    }
    let Some(table_ref) = poi.table.clone() else {
        return PrePlacementResult::Ok;
    };
    let Some(tables) = env.poi_tables else {
        return PrePlacementResult::NotReady;
    };
    match tables.lookup(&table_ref.table, &table_ref.name) {
        PoiLookup::NotReady => PrePlacementResult::NotReady,
        PoiLookup::Missing => {
            poi.resolve_missing();
            if env.missing_tables.insert(table_ref.table.clone()) {
                tracing::warn!(table = %table_ref.table, "POI table or entry missing, icons hidden");
            }
            PrePlacementResult::Ok
        }
        PoiLookup::Resolved(attrs) => {
            poi.resolve(&attrs);
            if let Some(visible) = attrs.visible {
                candidate.flags.set(CandidateFlags::VISIBLE, visible);
            }
            if let Some(min) = attrs.min_zoom {
                candidate.min_zoom = candidate.min_zoom.max(min);
            }
            if let Some(max) = attrs.max_zoom {
                candidate.max_zoom = candidate.max_zoom.min(max);
            }
            PrePlacementResult::Ok
        }
    }
}

/// Opacity factor from the candidate's distance fade range, in `[0, 1]`.
///
/// `fade_near` and `fade_far` are fractions of the maximum visibility distance.
/// Beyond `fade_far` the label is fully transparent.
pub fn distance_fading_factor(candidate: &Candidate, view_distance: f64, view: &ViewState) -> f64 {
    let (near, far) = (candidate.fade_near, candidate.fade_far);
    if far.is_nan() || near.is_nan() || far <= near {
        return 1.0;
    }
    let max = view.max_visibility_distance;
    let start = near * max;
    let end = far * max;
    1.0 - ((view_distance - start) / (end - start)).clamp(0.0, 1.0)
}

/// Scale factor of a label at `view_distance`.
///
/// Labels nearer than the focus point grow and farther ones shrink, by the
/// candidate's `distance_scale`, clamped to the configured range.
pub fn distance_scale_factor(
    candidate: &Candidate,
    view_distance: f64,
    view: &ViewState,
    config: &PlacementConfig,
) -> f64 {
    if candidate.distance_scale == 0.0 || view_distance <= 0.0 {
        return 1.0;
    }
    let ratio = view.look_at_distance / view_distance;
    (1.0 + (ratio - 1.0) * candidate.distance_scale)
        .clamp(config.label_distance_scale_min, config.label_distance_scale_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::TileKey;
    use crate::poi::{PoiAttributes, PoiInfo};
    use crate::view::ProjectionKind;
    use core::cell::Cell;
    use kurbo::Size;

    struct Tables {
        answer: PoiLookup,
        calls: Cell<usize>,
    }

    impl PoiTableLookup for Tables {
        fn lookup(&self, _table: &str, _name: &str) -> PoiLookup {
            self.calls.set(self.calls.get() + 1);
            self.answer.clone()
        }
    }

    struct Fixture {
        config: PlacementConfig,
        view: ViewState,
        missing: AHashSet<String>,
        duplicates: DuplicateIndex,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: PlacementConfig::default(),
                view: ViewState::default(),
                missing: AHashSet::new(),
                duplicates: DuplicateIndex::default(),
            }
        }

        fn check(
            &mut self,
            c: &mut Candidate,
            index: usize,
            tables: Option<&dyn PoiTableLookup>,
            max: Option<f64>,
        ) -> Readiness {
            let mut env = EvalEnv {
                config: &self.config,
                view: &self.view,
                poi_tables: tables,
                missing_tables: &mut self.missing,
                duplicates: &mut self.duplicates,
            };
            let key = CandidateKey {
                tile: TileKey(0),
                priority: c.priority(),
                index,
            };
            check_ready_for_placement(c, key, DVec3::ZERO, &mut env, max)
        }
    }

    #[test]
    fn hidden_and_out_of_zoom_are_invisible() {
        let mut f = Fixture::new();
        let mut c = Candidate::point("a", DVec3::ZERO).with_flags(CandidateFlags::empty());
        assert_eq!(f.check(&mut c, 0, None, None).result, PrePlacementResult::Invisible);
        let mut c = Candidate::point("a", DVec3::ZERO).with_zoom_range(12.0, 20.0);
        assert_eq!(f.check(&mut c, 0, None, None).result, PrePlacementResult::Invisible);
    }

    #[test]
    fn view_distance_uses_nearest_endpoint() {
        let mut f = Fixture::new();
        let mut c = Candidate::path(
            "river",
            vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 0.0, 600.0)],
        );
        let r = f.check(&mut c, 0, None, None);
        assert_eq!(r.result, PrePlacementResult::Ok);
        assert_eq!(r.view_distance, Some(400.0));
        let r = f.check(&mut c.clone().with_feature_id(1), 1, None, Some(300.0));
        assert_eq!(r.result, PrePlacementResult::TooFar);
    }

    #[test]
    fn globe_horizon_is_too_far() {
        let mut f = Fixture::new();
        f.view = ViewState {
            camera_position: DVec3::new(0.0, 0.0, 3.0),
            view_direction: DVec3::NEG_Z,
            projection: ProjectionKind::Spherical,
            ..ViewState::default()
        };
        let mut front = Candidate::point("front", DVec3::new(0.0, 0.0, 1.0));
        let mut back = Candidate::point("back", DVec3::new(0.0, 0.0, -1.0));
        assert_eq!(f.check(&mut front, 0, None, None).result, PrePlacementResult::Ok);
        assert_eq!(f.check(&mut back, 1, None, None).result, PrePlacementResult::TooFar);
    }

    #[test]
    fn table_dependency_waits_then_resolves_once() {
        let mut f = Fixture::new();
        let poi = PoiInfo::from_table("shops", "bakery", Size::new(16.0, 16.0));
        let mut c = Candidate::point("", DVec3::ZERO).with_poi(poi);

        let loading = Tables {
            answer: PoiLookup::NotReady,
            calls: Cell::new(0),
        };
        assert_eq!(f.check(&mut c, 0, None, None).result, PrePlacementResult::NotReady);
        assert_eq!(
            f.check(&mut c, 0, Some(&loading), None).result,
            PrePlacementResult::NotReady
        );

        let ready = Tables {
            answer: PoiLookup::Resolved(PoiAttributes {
                texture: Some("bread".into()),
                min_zoom: Some(15.0),
                ..PoiAttributes::default()
            }),
            calls: Cell::new(0),
        };
        // Resolution narrows the zoom range, which the re-check then rejects.
        assert_eq!(
            f.check(&mut c, 0, Some(&ready), None).result,
            PrePlacementResult::Invisible
        );
        assert_eq!(c.min_zoom, 15.0);
        f.view.zoom_level = 16.0;
        assert_eq!(f.check(&mut c, 0, Some(&ready), None).result, PrePlacementResult::Ok);
        assert_eq!(ready.calls.get(), 1, "resolved only once");
    }

    #[test]
    fn resolution_can_hide_the_candidate() {
        let mut f = Fixture::new();
        let poi = PoiInfo::from_table("shops", "closed", Size::new(16.0, 16.0));
        let mut c = Candidate::point("Shop", DVec3::ZERO).with_poi(poi);
        let tables = Tables {
            answer: PoiLookup::Resolved(PoiAttributes {
                texture: Some("shop".into()),
                visible: Some(false),
                ..PoiAttributes::default()
            }),
            calls: Cell::new(0),
        };
        assert_eq!(
            f.check(&mut c, 0, Some(&tables), None).result,
            PrePlacementResult::Invisible
        );
        assert!(!c.flags.contains(CandidateFlags::VISIBLE));
    }

    #[test]
    fn missing_table_is_reported_once() {
        let mut f = Fixture::new();
        let tables = Tables {
            answer: PoiLookup::Missing,
            calls: Cell::new(0),
        };
        for i in 0..3 {
            let poi = PoiInfo::from_table("gone", "x", Size::new(16.0, 16.0));
            let mut c = Candidate::point("", DVec3::ZERO).with_poi(poi);
            assert_eq!(
                f.check(&mut c, i, Some(&tables), None).result,
                PrePlacementResult::Invisible
            );
        }
        assert_eq!(f.missing.len(), 1);
        // Text survives a missing icon when the icon is optional.
        let poi = PoiInfo::from_table("gone", "x", Size::new(16.0, 16.0));
        let mut c = Candidate::point("Cafe", DVec3::ZERO)
            .with_poi(poi)
            .with_flags(CandidateFlags::default() | CandidateFlags::ICON_OPTIONAL);
        assert_eq!(f.check(&mut c, 9, Some(&tables), None).result, PrePlacementResult::Ok);
    }

    #[test]
    fn second_nearby_label_with_same_identity_is_duplicate() {
        let mut f = Fixture::new();
        let mut a = Candidate::point("Main St", DVec3::ZERO);
        let mut b = Candidate::point("Main St", DVec3::new(10.0, 0.0, 0.0));
        let mut far = Candidate::point("Main St", DVec3::new(5000.0, 0.0, 0.0));
        assert_eq!(f.check(&mut a, 0, None, None).result, PrePlacementResult::Ok);
        assert_eq!(f.check(&mut b, 1, None, None).result, PrePlacementResult::Duplicate);
        assert_eq!(f.check(&mut far, 2, None, None).result, PrePlacementResult::Ok);
        // Re-checking the representative itself is not a duplicate.
        assert_eq!(f.check(&mut a, 0, None, None).result, PrePlacementResult::Ok);
    }

    #[test]
    fn distance_factors() {
        let view = ViewState::default();
        let config = PlacementConfig::default();
        let c = Candidate::point("a", DVec3::ZERO).with_fade_distances(0.5, 0.7);
        assert_eq!(distance_fading_factor(&c, 4000.0, &view), 1.0);
        assert!((distance_fading_factor(&c, 6000.0, &view) - 0.5).abs() < 1e-12);
        assert_eq!(distance_fading_factor(&c, 9000.0, &view), 0.0);

        let c = Candidate::point("a", DVec3::ZERO).with_distance_scale(0.5);
        assert_eq!(distance_scale_factor(&c, 1000.0, &view, &config), 1.0);
        assert!((distance_scale_factor(&c, 2000.0, &view, &config) - 0.75).abs() < 1e-12);
        assert_eq!(distance_scale_factor(&c, 100.0, &view, &config), 1.5);
        assert_eq!(distance_scale_factor(&c, 1e9, &view, &config), 0.7);
    }
}
