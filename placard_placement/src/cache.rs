// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Group state cache: evaluation results memoized across frames.
//!
//! Evaluating thousands of candidates is only needed when something changed:
//! the tile set, the candidates, or the camera. The cache keeps one
//! [`GroupState`] per tile and priority and refreshes them all at once, or in
//! slices of a time budget when the scene is overloaded.

use core::cmp::Reverse;
use std::collections::BTreeMap;

use ahash::{AHashMap, AHashSet};
use glam::DVec3;

use crate::candidate::{CandidateStates, LabelIdentity};
use crate::config::PlacementConfig;
use crate::evaluate::{EvalEnv, PrePlacementResult, Readiness, check_ready_for_placement};
use crate::frame::Deadline;
use crate::group::{CandidateKey, LabelTile, TileKey};
use crate::poi::PoiTableLookup;
use crate::view::ViewState;

/// Outcome of [`DuplicateIndex::register`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Registration {
    /// The candidate represents its label.
    Representative,
    /// The label is already represented by the given candidate.
    Duplicate(CandidateKey),
}

/// Representatives of label identities within one refresh.
///
/// Two candidates are the same label when their [`LabelIdentity`] is equal and
/// their anchors are at most `max_distance` apart in world space. The first
/// candidate registered represents the label.
#[derive(Debug, Default, Clone)]
pub struct DuplicateIndex {
    entries: AHashMap<LabelIdentity, Vec<(DVec3, CandidateKey)>>,
}

impl DuplicateIndex {
    /// Register `key` at `position` under `identity`.
    pub fn register(
        &mut self,
        identity: LabelIdentity,
        position: DVec3,
        key: CandidateKey,
        max_distance: f64,
    ) -> Registration {
        let list = self.entries.entry(identity).or_default();
        if list.iter().any(|(_, k)| *k == key) {
            return Registration::Representative;
        }
        if let Some((_, rep)) = list
            .iter()
            .find(|(p, _)| p.distance(position) <= max_distance)
        {
            return Registration::Duplicate(*rep);
        }
        list.push((position, key));
        Registration::Representative
    }

    /// Forget all representatives.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of representatives.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordering key of a group: descending priority, then tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    priority: Reverse<i32>,
    tile: TileKey,
}

impl GroupKey {
    /// Key of the group of `priority` in `tile`.
    pub fn new(tile: TileKey, priority: i32) -> Self {
        Self {
            priority: Reverse(priority),
            tile,
        }
    }

    /// Priority of the group.
    pub fn priority(&self) -> i32 {
        self.priority.0
    }

    /// Tile of the group.
    pub fn tile(&self) -> TileKey {
        self.tile
    }
}

/// Cached evaluation of one candidate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CacheEntry {
    /// Index of the candidate in its group.
    pub index: usize,
    /// Evaluation result.
    pub readiness: Readiness,
}

/// Cached evaluation of one group.
#[derive(Clone, Debug)]
pub struct GroupState {
    key: GroupKey,
    entries: Vec<CacheEntry>,
    visited: bool,
    sorted: bool,
}

impl GroupState {
    /// Key of the group.
    pub fn key(&self) -> GroupKey {
        self.key
    }

    /// Entries, nearest candidates first.
    pub fn entries(&mut self) -> &[CacheEntry] {
        if !self.sorted {
            self.entries.sort_by(|a, b| {
                let da = a.readiness.view_distance.unwrap_or(f64::INFINITY);
                let db = b.readiness.view_distance.unwrap_or(f64::INFINITY);
                da.total_cmp(&db).then(a.index.cmp(&b.index))
            });
            self.sorted = true;
        }
        &self.entries
    }

    /// Number of entries with the given result.
    pub fn count(&self, result: PrePlacementResult) -> usize {
        self.entries
            .iter()
            .filter(|e| e.readiness.result == result)
            .count()
    }
}

/// Progress of a refresh.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RefreshStatus {
    /// Candidates evaluated in this call.
    pub evaluated: usize,
    /// Whether the refresh finished.
    pub complete: bool,
}

#[derive(Debug)]
struct PendingRefresh {
    work: Vec<GroupKey>,
    next: usize,
}

/// Per-group evaluation results, kept across frames.
#[derive(Debug, Default)]
pub struct GroupStateCache {
    groups: BTreeMap<GroupKey, GroupState>,
    duplicates: DuplicateIndex,
    orphans: AHashMap<LabelIdentity, Vec<(DVec3, CandidateStates)>>,
    invalidated: bool,
    pending: Option<PendingRefresh>,
    last_view: Option<ViewState>,
}

impl GroupStateCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a refresh on the next update.
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    /// Whether [`update`](Self::update) has work to do for `view`.
    pub fn needs_refresh(&self, view: &ViewState) -> bool {
        self.invalidated || self.pending.is_some() || self.last_view.as_ref() != Some(view)
    }

    /// Whether a refresh is in progress.
    pub fn is_refreshing(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of cached groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no group is cached.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        *self = Self {
            invalidated: true,
            ..Self::default()
        };
    }

    /// Cached groups in walk order.
    pub fn groups(&self) -> impl Iterator<Item = &GroupState> + '_ {
        self.groups.values()
    }

    /// Mutable group state.
    pub fn group_mut(&mut self, key: GroupKey) -> Option<&mut GroupState> {
        self.groups.get_mut(&key)
    }

    /// Distinct priorities of cached groups, descending.
    pub fn tiers(&self) -> Vec<i32> {
        let mut tiers: Vec<i32> = self.groups.keys().map(GroupKey::priority).collect();
        tiers.dedup();
        tiers
    }

    /// Keys of the cached groups of `priority`.
    pub fn tier(&self, priority: i32) -> Vec<GroupKey> {
        let lo = GroupKey::new(TileKey(u64::MIN), priority);
        let hi = GroupKey::new(TileKey(u64::MAX), priority);
        self.groups.range(lo..=hi).map(|(k, _)| *k).collect()
    }

    /// Cached readiness of a candidate.
    pub fn readiness(&self, key: CandidateKey) -> Option<Readiness> {
        let group = self.groups.get(&GroupKey::new(key.tile, key.priority))?;
        group
            .entries
            .iter()
            .find(|e| e.index == key.index)
            .map(|e| e.readiness)
    }

    /// Keep the render states of a candidate whose tile is going away, so that
    /// a duplicate taking over in the next refresh continues its fade.
    pub(crate) fn add_orphan(&mut self, identity: LabelIdentity, position: DVec3, states: CandidateStates) {
        self.orphans
            .entry(identity)
            .or_default()
            .push((position, states));
    }

    fn take_orphan(
        orphans: &mut AHashMap<LabelIdentity, Vec<(DVec3, CandidateStates)>>,
        identity: &LabelIdentity,
        position: DVec3,
        max_distance: f64,
    ) -> Option<CandidateStates> {
        let list = orphans.get_mut(identity)?;
        let i = list
            .iter()
            .position(|(p, _)| p.distance(position) <= max_distance)?;
        Some(list.swap_remove(i).1)
    }

    /// Refresh group states for `tiles`.
    ///
    /// Without a deadline the refresh runs to completion. With one, it stops when
    /// the deadline expires and resumes on the next call. Groups not visited by a
    /// complete refresh are evicted.
    pub fn update(
        &mut self,
        tiles: &mut BTreeMap<TileKey, LabelTile>,
        view: &ViewState,
        config: &PlacementConfig,
        poi_tables: Option<&dyn PoiTableLookup>,
        missing_tables: &mut AHashSet<String>,
        deadline: Option<Deadline<'_>>,
    ) -> RefreshStatus {
        let max_view_distance = view.max_visibility_distance
            * config
                .max_distance_ratio_text
                .max(config.max_distance_ratio_icon);
        let Self {
            groups,
            duplicates,
            orphans,
            pending,
            invalidated,
            last_view,
        } = self;
        let refresh = pending.get_or_insert_with(|| {
            let mut work: Vec<GroupKey> = tiles
                .values()
                .flat_map(|t| {
                    t.groups()
                        .iter()
                        .map(|g| GroupKey::new(t.key(), g.priority()))
                })
                .collect();
            work.sort_unstable();
            for g in groups.values_mut() {
                g.visited = false;
            }
            duplicates.clear();
            *invalidated = false;
            PendingRefresh { work, next: 0 }
        });
        let mut env = EvalEnv {
            config,
            view,
            poi_tables,
            missing_tables,
            duplicates,
        };

        let mut evaluated = 0;
        while let Some(&gk) = refresh.work.get(refresh.next) {
            if deadline.is_some_and(|d| d.expired()) {
                return RefreshStatus {
                    evaluated,
                    complete: false,
                };
            }
            refresh.next += 1;
            let Some(tile) = tiles.get_mut(&gk.tile) else {
                continue;
            };
            let center = tile.center();
            let Some(group) = tile.group_mut(gk.priority()) else {
                continue;
            };
            let mut entries = Vec::with_capacity(group.len());
            for (index, candidate) in group.candidates_mut().iter_mut().enumerate() {
                let key = CandidateKey {
                    tile: gk.tile,
                    priority: gk.priority(),
                    index,
                };
                let readiness =
                    check_ready_for_placement(candidate, key, center, &mut env, Some(max_view_distance));
                if readiness.result == PrePlacementResult::Ok
                    && !orphans.is_empty()
                    && let Some(identity) = candidate.identity()
                    && let Some(anchor) = candidate.geometry.anchor()
                    && let Some(states) =
                        Self::take_orphan(orphans, &identity, center + anchor, config.duplicate_distance)
                    && candidate.adopt_states(states)
                {
                    tracing::trace!(?key, "continuing fade of a replaced duplicate");
                }
                entries.push(CacheEntry { index, readiness });
            }
            evaluated += entries.len();
            groups.insert(
                gk,
                GroupState {
                    key: gk,
                    entries,
                    visited: true,
                    sorted: false,
                },
            );
        }

        groups.retain(|_, g| g.visited);
        orphans.clear();
        *pending = None;
        *last_view = Some(*view);
        RefreshStatus {
            evaluated,
            complete: true,
        }
    }
}
