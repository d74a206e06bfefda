// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::DVec3;
use kurbo::{Point, Rect, Size};
use placard_placement::{
    Candidate, DrawList, GlyphRun, GlyphSupplier, LabelStyle, LabelTile, MeasureError,
    MeasureTarget, PlacementConfig, PlacementEnv, PlacementScheduler, ScreenProjector,
    TextMeasurement, TextMeasurer, TileKey, ViewState,
};

struct Flat;

impl ScreenProjector for Flat {
    fn project(&self, world: DVec3) -> Option<Point> {
        Some(Point::new(world.x, -world.y))
    }
}

struct Glyphs;

impl GlyphSupplier for Glyphs {
    fn glyphs(&self, text: &str, style: &LabelStyle) -> Result<GlyphRun, MeasureError> {
        Ok(GlyphRun::new(text.chars().map(u32::from).collect(), style.font_size))
    }
}

struct Mono;

impl TextMeasurer for Mono {
    fn measure(&self, glyphs: &GlyphRun, target: MeasureTarget<'_>) -> Result<TextMeasurement, MeasureError> {
        let n = glyphs.len();
        let bounds = match target {
            MeasureTarget::Anchored { anchor, offset } => {
                anchor.place(Size::new(8.0 * n as f64, 16.0), offset)
            }
            MeasureTarget::Path(path) => {
                let p = path.first().copied().unwrap_or(Point::ZERO);
                Rect::new(p.x, p.y - 8.0, p.x + 8.0 * n as f64, p.y + 8.0)
            }
        };
        let character_bounds = (0..n)
            .map(|i| {
                let x = bounds.x0 + 8.0 * i as f64;
                Rect::new(x, bounds.y0, x + 8.0, bounds.y1)
            })
            .collect();
        Ok(TextMeasurement {
            bounds,
            character_bounds,
        })
    }
}

/// A square of tiles around the origin, `per_tile` labels each over eight priorities.
fn tiles(side: u64, per_tile: usize) -> Vec<LabelTile> {
    let mut out = Vec::new();
    for ty in 0..side {
        for tx in 0..side {
            let center = DVec3::new(tx as f64 * 200.0 - 1000.0, ty as f64 * 200.0 - 1000.0, 0.0);
            let mut tile = LabelTile::new(TileKey(ty * side + tx), center);
            for i in 0..per_tile {
                let p = DVec3::new((i % 8) as f64 * 25.0, (i / 8 % 8) as f64 * 25.0, 0.0);
                tile.add(
                    Candidate::point(format!("{tx}:{ty}:{i}"), p).with_priority((i % 8) as i32),
                );
            }
            out.push(tile);
        }
    }
    out
}

fn scheduler(config: PlacementConfig, side: u64, per_tile: usize) -> PlacementScheduler {
    let mut s = PlacementScheduler::new(config, Size::new(1920.0, 1080.0))
        .unwrap_or_else(|e| panic!("invalid config: {e}"));
    for tile in tiles(side, per_tile) {
        s.add_tile(tile);
    }
    s
}

fn frame(s: &mut PlacementScheduler, view: &ViewState, draws: &mut DrawList) -> usize {
    draws.clear();
    let mut env = PlacementEnv {
        projector: &Flat,
        glyphs: &Glyphs,
        measurer: &Mono,
        poi_tables: None,
        renderer: draws,
    };
    s.place_frame(view, &mut env).stats.rendered
}

fn bench_steady_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("steady_frame");
    let view = ViewState::default();
    for &(side, per_tile) in &[(4_u64, 64_usize), (10, 64), (10, 200)] {
        let count = side * side * per_tile as u64;
        let mut s = scheduler(PlacementConfig::default(), side, per_tile);
        let mut draws = DrawList::default();
        // Warm the cache and the glyph layouts.
        frame(&mut s, &view, &mut draws);
        group.throughput(Throughput::Elements(count));
        group.bench_function(format!("candidates_{count}"), |b| {
            b.iter(|| black_box(frame(&mut s, &view, &mut draws)));
        });
    }
    group.finish();
}

fn bench_first_frame(c: &mut Criterion) {
    let view = ViewState::default();
    c.bench_function("first_frame_6400", |b| {
        b.iter_batched(
            || (scheduler(PlacementConfig::default(), 10, 64), DrawList::default()),
            |(mut s, mut draws)| black_box(frame(&mut s, &view, &mut draws)),
            BatchSize::LargeInput,
        );
    });
}

fn bench_moving_camera(c: &mut Criterion) {
    let mut s = scheduler(PlacementConfig::default(), 10, 64);
    let mut draws = DrawList::default();
    let mut view = ViewState::default();
    c.bench_function("moving_camera_6400", |b| {
        b.iter(|| {
            // A new camera position invalidates the group state cache every frame.
            view.camera_position.x = (view.camera_position.x + 1.0) % 100.0;
            black_box(frame(&mut s, &view, &mut draws))
        });
    });
}

fn bench_overloaded_frame(c: &mut Criterion) {
    let config = PlacementConfig {
        overload_threshold: 1_000,
        ..PlacementConfig::default()
    };
    let mut s = scheduler(config, 10, 200);
    let mut draws = DrawList::default();
    let view = ViewState::default();
    c.bench_function("overloaded_frame_20000", |b| {
        b.iter(|| black_box(frame(&mut s, &view, &mut draws)));
    });
}

criterion_group!(
    benches,
    bench_steady_frame,
    bench_first_frame,
    bench_moving_camera,
    bench_overloaded_frame,
);
criterion_main!(benches);
