// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screen collision basics.
//!
//! Allocate a few label boxes, block a road, and test new boxes against them,
//! first coarsely and then glyph by glyph.
//!
//! Run:
//! - `cargo run -p placard_demos --example collision_basics`

use kurbo::{Point, Rect};
use placard_collision::{BlockingLine, DetailedCollisionBox, ScreenCollisions};

fn main() {
    // Screen coordinates are centered at the origin.
    let mut sc = ScreenCollisions::new(800.0, 600.0);
    println!("screen: {:?}, visible: {:?}", sc.screen_bounds(), sc.visible_bounds());

    // A road the labels must not cross.
    sc.allocate_lines(BlockingLine::polyline(&[
        Point::new(-400.0, 50.0),
        Point::new(0.0, 60.0),
        Point::new(400.0, 40.0),
    ]));

    // A point label.
    sc.allocate(Rect::new(-60.0, -20.0, 20.0, -4.0));

    // A curved label, one box per glyph. Its coarse bounds cover a lot of
    // empty space between the glyphs.
    let glyphs: Vec<Rect> = (0..6)
        .map(|i| {
            let x = 100.0 + f64::from(i) * 12.0;
            let y = -100.0 + f64::from(i * i) * 4.0;
            Rect::new(x, y, x + 10.0, y + 14.0)
        })
        .collect();
    if let Some(curved) = DetailedCollisionBox::from_details(glyphs) {
        sc.allocate_detailed(curved);
    }
    println!("occupants: {}", sc.len());

    let probes = [
        ("overlaps the point label", Rect::new(0.0, -16.0, 40.0, 0.0)),
        ("crosses the road", Rect::new(-100.0, 40.0, -40.0, 70.0)),
        ("between the curved glyphs", Rect::new(150.0, -90.0, 158.0, -80.0)),
        ("free", Rect::new(-300.0, -200.0, -200.0, -180.0)),
        ("off screen", Rect::new(900.0, 0.0, 950.0, 16.0)),
    ];
    for (name, r) in probes {
        let coarse = sc.is_allocated(&r);
        let exact = coarse && sc.intersects_details(&r, &sc.search(&r));
        println!(
            "{name:>28}: visible={} coarse={coarse} exact={exact}",
            sc.is_visible(&r)
        );
    }

    // Next frame starts empty.
    sc.reset();
    assert!(sc.is_empty(), "reset drops every occupant");
}
