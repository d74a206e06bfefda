// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time-budgeted placement with more candidates than the overload threshold.
//!
//! The test clock advances by a fixed step on every reading, so budgets expire
//! after a known number of polls.

mod common;

use common::{Host, instant, scheduler, text_opacity};
use glam::DVec3;
use placard_placement::{
    Candidate, FrameSummary, LabelTile, PlacementConfig, PlacementStats, TileKey,
};

fn placed(stats: &PlacementStats) -> usize {
    stats.rendered + stats.rejected + stats.invisible + stats.skipped_by_cap
}

/// `tiles` tiles of `per_tile` labels each, spread over `priorities` priorities.
fn crowd(tiles: u64, per_tile: usize, priorities: usize) -> Vec<LabelTile> {
    (0..tiles)
        .map(|t| {
            let x = (t % 16) as f64 * 100.0 - 800.0;
            let y = (t / 16) as f64 * 100.0 - 800.0;
            let mut tile = LabelTile::new(TileKey(t), DVec3::new(x, y, 0.0));
            for i in 0..per_tile {
                let dx = (i % 10) as f64 * 10.0;
                let dy = (i / 10 % 10) as f64 * 10.0;
                let priority = i32::try_from(i % priorities).unwrap();
                tile.add(
                    Candidate::point(format!("{t}/{i}"), DVec3::new(dx, dy, 0.0)).with_priority(priority),
                );
            }
            tile
        })
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn exhausted_budget_skips_remaining_tiers() {
    init_tracing();
    let (mut s, clock) = scheduler(instant());
    let host = Host::default();
    for tile in crowd(250, 100, 20) {
        s.add_tile(tile);
    }
    assert_eq!(s.candidate_count(), 25_000);

    let first = host.frame(&mut s).0;
    assert!(first.overloaded, "more candidates than the threshold");
    assert!(first.cache_refreshed);
    assert!(!first.budget_exhausted, "a frozen clock never runs out of time");
    assert_eq!(placed(&first.stats), 25_000, "every candidate was considered");

    // Ten polls fit in the ten millisecond budget, so ten of twenty tiers run.
    clock.set_step(1.0);
    let second = host.frame(&mut s).0;
    assert!(second.budget_exhausted);
    assert!(second.needs_redraw, "the skipped tiers need another frame");
    assert!(!second.cache_refreshed, "nothing changed since the last refresh");
    assert_eq!(second.stats.skipped_by_budget, 10 * 1250);
    assert_eq!(placed(&second.stats), 10 * 1250);

    clock.set_step(0.0);
    let third = host.frame(&mut s).0;
    assert!(!third.budget_exhausted);
    assert_eq!(third.stats.skipped_by_budget, 0);
    assert_eq!(placed(&third.stats), 25_000);
    assert!(third.stats.rendered <= 500, "the label cap still applies");
}

#[test]
fn refresh_resumes_across_frames() {
    init_tracing();
    let (mut s, clock) = scheduler(instant());
    let host = Host::default();
    for tile in crowd(21, 1000, 1) {
        s.add_tile(tile);
    }
    clock.set_step(1.0);

    // Five groups fit in the five millisecond refresh budget.
    let mut frames: Vec<FrameSummary> = Vec::new();
    loop {
        let summary = host.frame(&mut s).0;
        frames.push(summary);
        if !summary.needs_redraw || frames.len() > 10 {
            break;
        }
    }
    assert_eq!(frames.len(), 5, "21 groups take five frames");
    assert!(frames.iter().all(|f| f.cache_refreshed && !f.budget_exhausted));
    assert_eq!(placed(&frames[0].stats), 5000, "only evaluated groups are placed");
    assert_eq!(placed(&frames[4].stats), 21_000);
}

#[test]
fn skipped_labels_keep_their_fade() {
    let config = PlacementConfig {
        fade_duration_ms: 100.0,
        overload_threshold: 1,
        overload_place_time_ms: 0.0,
        ..PlacementConfig::default()
    };
    let (mut s, clock) = scheduler(config);
    let host = Host::default();
    let mut tile = LabelTile::new(TileKey(1), DVec3::ZERO);
    let west = tile.add(Candidate::point("West", DVec3::new(-200.0, 0.0, 0.0)).with_priority(2));
    tile.add(Candidate::point("East", DVec3::new(200.0, 0.0, 0.0)).with_priority(1));
    s.add_tile(tile);

    host.frame(&mut s);
    clock.set(200.0);
    let (_, draws) = host.frame(&mut s);
    assert_eq!(text_opacity(&draws, "West"), Some(1.0));

    // The first poll already finds the budget spent.
    clock.set(300.0);
    clock.set_step(1.0);
    let (summary, draws) = host.frame(&mut s);
    assert!(summary.budget_exhausted);
    assert_eq!(summary.stats.skipped_by_budget, 2);
    assert!(draws.commands.is_empty());

    clock.set_step(0.0);
    clock.set(400.0);
    let (summary, draws) = host.frame(&mut s);
    assert_eq!(summary.stats.persistent, 2, "skipped labels are still on screen");
    assert_eq!(text_opacity(&draws, "West"), Some(1.0), "no fade in from scratch");
    assert_eq!(text_opacity(&draws, "East"), Some(1.0));
    assert!(s.candidate(west).unwrap().text_state().is_faded_in());
}
