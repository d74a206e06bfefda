// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Camera state consumed by placement.

use glam::DVec3;

/// How the map surface is projected into world space.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProjectionKind {
    /// A flat map in the `z = 0` plane.
    #[default]
    Planar,
    /// A globe centered at the world origin.
    Spherical,
}

/// Snapshot of the camera for one frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Camera position in world space.
    pub camera_position: DVec3,
    /// Normalized view direction.
    pub view_direction: DVec3,
    /// Distance from the camera to the point it looks at.
    pub look_at_distance: f64,
    /// Current zoom level.
    pub zoom_level: f64,
    /// Far plane distance; labels are never shown beyond it.
    pub max_visibility_distance: f64,
    /// Projection of the map.
    pub projection: ProjectionKind,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            camera_position: DVec3::new(0.0, 0.0, 1000.0),
            view_direction: DVec3::NEG_Z,
            look_at_distance: 1000.0,
            zoom_level: 10.0,
            max_visibility_distance: 10_000.0,
            projection: ProjectionKind::Planar,
        }
    }
}

impl ViewState {
    /// Whether `world` is behind the globe's horizon.
    ///
    /// Always `false` for planar projections. On a globe, a point is culled when the
    /// dot product of its surface normal and the view direction is at least
    /// `horizon_cull_cos`.
    pub fn is_beyond_horizon(&self, world: DVec3, horizon_cull_cos: f64) -> bool {
        if self.projection != ProjectionKind::Spherical {
            return false;
        }
        let normal = world.normalize_or_zero();
        let dir = self.view_direction.normalize_or_zero();
        normal.dot(dir) >= horizon_cull_cos
    }
}
