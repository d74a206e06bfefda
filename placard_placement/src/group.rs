// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tiles and their priority groups.

use glam::DVec3;

use crate::candidate::Candidate;

/// Identifier of a tile, chosen by the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileKey(pub u64);

/// Address of a candidate: its tile, its group (priority), and its position in the group.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateKey {
    /// Owning tile.
    pub tile: TileKey,
    /// Priority of the owning group.
    pub priority: i32,
    /// Index within the group.
    pub index: usize,
}

/// Candidates of one tile sharing one priority.
#[derive(Clone, Debug)]
pub struct TextElementGroup {
    priority: i32,
    candidates: Vec<Candidate>,
}

impl TextElementGroup {
    /// Empty group.
    pub fn new(priority: i32) -> Self {
        Self {
            priority,
            candidates: Vec::new(),
        }
    }

    /// Shared priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Candidates in insertion order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Mutable candidates.
    pub fn candidates_mut(&mut self) -> &mut [Candidate] {
        &mut self.candidates
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the group is empty.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Labels of one map tile.
///
/// Candidate geometry is relative to the tile center.
#[derive(Clone, Debug)]
pub struct LabelTile {
    key: TileKey,
    center: DVec3,
    groups: Vec<TextElementGroup>,
    blocking_lines: Vec<Vec<DVec3>>,
}

impl LabelTile {
    /// Empty tile centered at `center`.
    pub fn new(key: TileKey, center: DVec3) -> Self {
        Self {
            key,
            center,
            groups: Vec::new(),
            blocking_lines: Vec::new(),
        }
    }

    /// Tile key.
    pub fn key(&self) -> TileKey {
        self.key
    }

    /// Tile center in world space.
    pub fn center(&self) -> DVec3 {
        self.center
    }

    /// Add a candidate to the group of its priority.
    pub fn add(&mut self, candidate: Candidate) -> CandidateKey {
        let priority = candidate.priority();
        // Groups stay sorted by descending priority.
        let pos = match self
            .groups
            .binary_search_by(|g| priority.cmp(&g.priority))
        {
            Ok(pos) => pos,
            Err(pos) => {
                self.groups.insert(pos, TextElementGroup::new(priority));
                pos
            }
        };
        let group = &mut self.groups[pos];
        group.candidates.push(candidate);
        CandidateKey {
            tile: self.key,
            priority,
            index: group.candidates.len() - 1,
        }
    }

    /// Move the candidate at `key` to the group of `priority` and return its new key.
    ///
    /// Candidates after it in its old group move up by one index.
    pub fn set_priority(&mut self, key: CandidateKey, priority: i32) -> Option<CandidateKey> {
        if key.tile != self.key {
            return None;
        }
        if key.priority == priority {
            return self.candidate(key).map(|_| key);
        }
        let pos = self.groups.iter().position(|g| g.priority == key.priority)?;
        let group = &mut self.groups[pos];
        if key.index >= group.candidates.len() {
            return None;
        }
        let mut candidate = group.candidates.remove(key.index);
        if group.candidates.is_empty() {
            self.groups.remove(pos);
        }
        candidate.set_priority(priority);
        Some(self.add(candidate))
    }

    /// Add a world-space polyline, relative to the tile center, that labels must not cross.
    pub fn add_blocking_line(&mut self, points: Vec<DVec3>) {
        self.blocking_lines.push(points);
    }

    /// Blocking polylines.
    pub fn blocking_lines(&self) -> &[Vec<DVec3>] {
        &self.blocking_lines
    }

    /// Groups, highest priority first.
    pub fn groups(&self) -> &[TextElementGroup] {
        &self.groups
    }

    /// The group of `priority`.
    pub fn group(&self, priority: i32) -> Option<&TextElementGroup> {
        self.groups.iter().find(|g| g.priority == priority)
    }

    /// Mutable group of `priority`.
    pub fn group_mut(&mut self, priority: i32) -> Option<&mut TextElementGroup> {
        self.groups.iter_mut().find(|g| g.priority == priority)
    }

    /// The candidate at `key`, if it belongs to this tile.
    pub fn candidate(&self, key: CandidateKey) -> Option<&Candidate> {
        if key.tile != self.key {
            return None;
        }
        self.group(key.priority)?.candidates.get(key.index)
    }

    /// Mutable candidate at `key`.
    pub fn candidate_mut(&mut self, key: CandidateKey) -> Option<&mut Candidate> {
        if key.tile != self.key {
            return None;
        }
        self.group_mut(key.priority)?.candidates.get_mut(key.index)
    }

    /// Total number of candidates.
    pub fn len(&self) -> usize {
        self.groups.iter().map(TextElementGroup::len).sum()
    }

    /// Whether the tile has no candidates.
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(TextElementGroup::is_empty)
    }

    /// All candidates with their keys.
    pub fn iter(&self) -> impl Iterator<Item = (CandidateKey, &Candidate)> + '_ {
        let tile = self.key;
        self.groups.iter().flat_map(move |g| {
            g.candidates.iter().enumerate().map(move |(index, c)| {
                (
                    CandidateKey {
                        tile,
                        priority: g.priority,
                        index,
                    },
                    c,
                )
            })
        })
    }

    pub(crate) fn candidates_mut(&mut self) -> impl Iterator<Item = &mut Candidate> + '_ {
        self.groups.iter_mut().flat_map(|g| g.candidates.iter_mut())
    }
}
