// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Rect;
use placard_collision::{Backend, FlatVec, Grid, ScreenCollisionsGeneric};

const SCREEN: (f64, f64) = (1920.0, 1080.0);

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

/// Label-sized boxes scattered over the screen, centered at the origin.
fn gen_label_rects(count: usize, seed: u64) -> Vec<Rect> {
    let mut rng = Rng::new(seed);
    let (w, h) = SCREEN;
    (0..count)
        .map(|_| {
            let x0 = rng.next_f64() * w - w / 2.0;
            let y0 = rng.next_f64() * h - h / 2.0;
            let len = 24.0 + rng.next_f64() * 96.0;
            Rect::new(x0, y0, x0 + len, y0 + 16.0)
        })
        .collect()
}

/// The placement loop in miniature: test each box, allocate it if free.
fn place_all<B: Backend>(sc: &mut ScreenCollisionsGeneric<B>, rects: &[Rect]) -> usize {
    let mut placed = 0;
    for r in rects {
        if sc.is_visible(r) && !sc.is_allocated(r) {
            sc.allocate(*r);
            placed += 1;
        }
    }
    placed
}

fn bench_place<B: Backend>(c: &mut Criterion, name: &str, make: impl Fn() -> B + Copy) {
    let mut group = c.benchmark_group(name);
    for &n in &[500_usize, 2_000, 8_000] {
        let rects = gen_label_rects(n, 0xCAFE_F00D_DEAD_BEEF);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("test_allocate_n{n}"), |b| {
            b.iter_batched(
                || ScreenCollisionsGeneric::with_backend(make(), SCREEN.0, SCREEN.1),
                |mut sc| black_box(place_all(&mut sc, &rects)),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_flatvec(c: &mut Criterion) {
    bench_place(c, "flatvec", FlatVec::default);
}

fn bench_grid(c: &mut Criterion) {
    bench_place(c, "grid", Grid::default);
    bench_place(c, "grid_cell32", || Grid::new(32.0));
}

fn bench_reset_reuse(c: &mut Criterion) {
    let rects = gen_label_rects(2_000, 0xBADC_F00D_1234_5678);
    let mut sc = ScreenCollisionsGeneric::with_backend(Grid::default(), SCREEN.0, SCREEN.1);
    c.bench_function("grid_reset_and_place_n2000", |b| {
        b.iter(|| {
            sc.reset();
            black_box(place_all(&mut sc, &rects))
        });
    });
}

criterion_group!(benches, bench_flatvec, bench_grid, bench_reset_reuse);
criterion_main!(benches);
