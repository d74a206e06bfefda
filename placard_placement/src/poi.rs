// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Icon descriptors and the external POI table they may depend on.

use kurbo::{Size, Vec2};

/// Icon attached to a candidate.
///
/// An icon may name an entry of an external POI table (a mapping from POI names
/// to icon attributes, loaded asynchronously by the host). Such an icon is
/// resolved once the table is available, which can change the owning
/// candidate's visibility and zoom range.
#[derive(Clone, Debug, PartialEq)]
pub struct PoiInfo {
    /// Texture (image) name passed to the renderer.
    pub texture: String,
    /// Icon size in pixels at scale 1.
    pub size: Size,
    /// Offset of the icon center from the anchor, in pixels.
    pub offset: Vec2,
    /// Lowest zoom level showing the icon.
    pub min_zoom: f64,
    /// Zoom level from which the icon is hidden again.
    pub max_zoom: f64,
    /// Whether the icon can be shown at all.
    pub valid: bool,
    /// POI table the icon is looked up in, and the entry name.
    pub table: Option<PoiTableRef>,
    /// Line markers sharing a shield group are spaced apart on screen.
    pub shield_group: Option<u32>,
    /// The icon may overlap other labels.
    pub may_overlap: bool,
    /// The icon reserves its screen space.
    pub reserves_space: bool,
    resolved: bool,
}

/// Reference into an external POI table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PoiTableRef {
    /// Table name.
    pub table: String,
    /// Entry name within the table.
    pub name: String,
}

impl PoiInfo {
    /// A valid icon that needs no table lookup.
    pub fn new(texture: impl Into<String>, size: Size) -> Self {
        Self {
            texture: texture.into(),
            size,
            offset: Vec2::ZERO,
            min_zoom: f64::NEG_INFINITY,
            max_zoom: f64::INFINITY,
            valid: true,
            table: None,
            shield_group: None,
            may_overlap: false,
            reserves_space: true,
            resolved: true,
        }
    }

    /// An icon whose attributes come from the entry `name` of the POI table `table`.
    pub fn from_table(table: impl Into<String>, name: impl Into<String>, size: Size) -> Self {
        Self {
            table: Some(PoiTableRef {
                table: table.into(),
                name: name.into(),
            }),
            resolved: false,
            ..Self::new(String::new(), size)
        }
    }

    /// Set the shield group.
    #[must_use]
    pub fn with_shield_group(mut self, group: u32) -> Self {
        self.shield_group = Some(group);
        self
    }

    /// Whether the table dependency (if any) has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Whether the icon is shown at `zoom`.
    pub fn is_in_zoom_range(&self, zoom: f64) -> bool {
        self.valid && zoom >= self.min_zoom && zoom < self.max_zoom
    }

    /// Apply the attributes of a resolved table entry. Only the first call has an effect.
    pub(crate) fn resolve(&mut self, attrs: &PoiAttributes) {
        if self.resolved {
            return;
        }
        self.resolved = true;
        if let Some(texture) = &attrs.texture {
            self.texture.clone_from(texture);
        }
        if let Some(v) = attrs.min_zoom {
            self.min_zoom = v;
        }
        if let Some(v) = attrs.max_zoom {
            self.max_zoom = v;
        }
        if let Some(v) = attrs.icon_may_overlap {
            self.may_overlap = v;
        }
        if let Some(v) = attrs.icon_reserves_space {
            self.reserves_space = v;
        }
        self.valid = !self.texture.is_empty();
    }

    /// Mark the table dependency as permanently unavailable.
    pub(crate) fn resolve_missing(&mut self) {
        self.resolved = true;
        self.valid = false;
    }
}

/// Attributes of a POI table entry. `None` keeps the icon's own value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoiAttributes {
    /// Texture name.
    pub texture: Option<String>,
    /// Whether the owning candidate is visible at all.
    pub visible: Option<bool>,
    /// Lowest zoom level of the icon and its candidate.
    pub min_zoom: Option<f64>,
    /// Upper zoom limit of the icon and its candidate.
    pub max_zoom: Option<f64>,
    /// Icon overlap override.
    pub icon_may_overlap: Option<bool>,
    /// Icon space reservation override.
    pub icon_reserves_space: Option<bool>,
}

/// Answer of a [`PoiTableLookup`].
#[derive(Clone, Debug, PartialEq)]
pub enum PoiLookup {
    /// The table is still loading; ask again next frame.
    NotReady,
    /// The table does not exist, or has no such entry.
    Missing,
    /// The entry was found.
    Resolved(PoiAttributes),
}

/// Non-blocking access to POI tables owned by the host.
pub trait PoiTableLookup {
    /// Look up `name` in `table`.
    fn lookup(&self, table: &str, name: &str) -> PoiLookup;
}
