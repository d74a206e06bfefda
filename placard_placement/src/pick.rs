// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping a screen position back to the labels drawn there.

use ahash::AHashSet;
use kurbo::{Point, Rect};

use crate::group::CandidateKey;

/// Which part of a candidate was hit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PickKind {
    /// The text.
    Text,
    /// The icon.
    Icon,
}

/// A label under a picked screen position.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PickResult {
    /// Candidate hit.
    pub key: CandidateKey,
    /// Feature the candidate belongs to.
    pub feature_id: Option<u64>,
    /// Part hit.
    pub kind: PickKind,
    /// Screen bounds of the part.
    pub bounds: Rect,
}

/// A box drawn in the last frame, in draw order.
#[derive(Copy, Clone, Debug)]
pub(crate) struct PickEntry {
    pub(crate) result: PickResult,
    pub(crate) priority: i32,
}

#[derive(PartialEq, Eq, Hash)]
enum PickIdentity {
    Feature(u64),
    Candidate(CandidateKey),
}

/// Entries containing `point`, topmost first, one per feature.
///
/// Topmost means highest priority, then drawn last. Candidates without a
/// feature id are kept apart by their key.
pub(crate) fn pick(entries: &[PickEntry], point: Point) -> Vec<PickResult> {
    let mut hits: Vec<(usize, &PickEntry)> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.result.bounds.contains(point))
        .collect();
    hits.sort_by(|(ia, a), (ib, b)| b.priority.cmp(&a.priority).then(ib.cmp(ia)));

    let mut seen = AHashSet::new();
    hits.into_iter()
        .filter(|(_, e)| {
            seen.insert(match e.result.feature_id {
                Some(id) => PickIdentity::Feature(id),
                None => PickIdentity::Candidate(e.result.key),
            })
        })
        .map(|(_, e)| e.result)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::TileKey;

    fn entry(index: usize, priority: i32, feature_id: Option<u64>, kind: PickKind) -> PickEntry {
        PickEntry {
            result: PickResult {
                key: CandidateKey {
                    tile: TileKey(0),
                    priority,
                    index,
                },
                feature_id,
                kind,
                bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
            },
            priority,
        }
    }

    #[test]
    fn topmost_first_and_one_per_feature() {
        let entries = [
            entry(0, 1, Some(7), PickKind::Text),
            entry(1, 5, None, PickKind::Icon),
            entry(2, 1, Some(8), PickKind::Text),
            entry(0, 1, Some(7), PickKind::Icon),
            entry(3, 1, None, PickKind::Text),
        ];
        let hits = pick(&entries, Point::new(5.0, 5.0));
        let order: Vec<_> = hits.iter().map(|h| (h.key.index, h.kind)).collect();
        assert_eq!(
            order,
            [
                (1, PickKind::Icon),
                (3, PickKind::Text),
                (0, PickKind::Icon),
                (2, PickKind::Text),
            ]
        );
        assert!(pick(&entries, Point::new(50.0, 5.0)).is_empty());
    }
}
