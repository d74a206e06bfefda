// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame walk.
//!
//! Place a handful of labels over several frames while the camera pans, and
//! print what gets drawn. Set `RUST_LOG=placard_placement=debug` to see the
//! per-frame summaries, or `trace` for every decision.
//!
//! Run:
//! - `cargo run -p placard_demos --example frame_walk`

use glam::DVec3;
use kurbo::{Point, Rect, Size, Vec2};
use placard_placement::{
    AnchorPlacement, Candidate, DrawCommand, DrawList, GlyphRun, GlyphSupplier, LabelLayout,
    LabelStyle, LabelTile, MeasureError, MeasureTarget, PlacementConfig, PlacementEnv,
    PlacementScheduler, PoiInfo, ScreenProjector, TextMeasurement, TextMeasurer, TileKey,
    ViewState,
};
use tracing_subscriber::EnvFilter;

/// Top-down camera: the screen follows the camera's x and y.
struct TopDown {
    camera: DVec3,
}

impl ScreenProjector for TopDown {
    fn project(&self, world: DVec3) -> Option<Point> {
        let d = world - self.camera;
        Some(Point::new(d.x, -d.y))
    }
}

struct Glyphs;

impl GlyphSupplier for Glyphs {
    fn glyphs(&self, text: &str, style: &LabelStyle) -> Result<GlyphRun, MeasureError> {
        Ok(GlyphRun::new(text.chars().map(u32::from).collect(), style.font_size))
    }
}

/// Glyphs half as wide as the font size.
struct Mono;

impl TextMeasurer for Mono {
    fn measure(&self, glyphs: &GlyphRun, target: MeasureTarget<'_>) -> Result<TextMeasurement, MeasureError> {
        let (w, h) = (glyphs.font_size / 2.0, glyphs.font_size);
        let n = glyphs.len();
        let character_bounds: Vec<Rect> = match target {
            MeasureTarget::Anchored { anchor, offset } => {
                let b = anchor.place(Size::new(w * n as f64, h), offset);
                (0..n)
                    .map(|i| Rect::new(b.x0 + w * i as f64, b.y0, b.x0 + w * (i + 1) as f64, b.y1))
                    .collect()
            }
            // Straight along the first segment.
            MeasureTarget::Path(path) => {
                let (a, b) = (path[0], path[1]);
                let dir = (b - a).normalize();
                (0..n)
                    .map(|i| Rect::from_center_size(a + dir * w * (i as f64 + 0.5), (w, h)))
                    .collect()
            }
        };
        let bounds = character_bounds
            .iter()
            .copied()
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO);
        Ok(TextMeasurement {
            bounds,
            character_bounds,
        })
    }
}

fn city_tile() -> LabelTile {
    let mut tile = LabelTile::new(TileKey(1), DVec3::ZERO);
    let around = LabelLayout::with_anchors(
        [
            AnchorPlacement::Right,
            AnchorPlacement::Left,
            AnchorPlacement::Top,
            AnchorPlacement::Bottom,
        ],
        Vec2::new(10.0, 4.0),
    );
    tile.add(
        Candidate::point("Central Station", DVec3::new(0.0, 0.0, 0.0))
            .with_priority(10)
            .with_poi(PoiInfo::new("rail", Size::new(16.0, 16.0)))
            .with_layout(around.clone()),
    );
    tile.add(
        Candidate::point("Old Market", DVec3::new(40.0, 10.0, 0.0))
            .with_priority(6)
            .with_layout(around),
    );
    tile.add(Candidate::point("Museum", DVec3::new(-60.0, -30.0, 0.0)).with_priority(4));
    tile.add(Candidate::path(
        "River Road",
        vec![DVec3::new(-300.0, -120.0, 0.0), DVec3::new(300.0, -120.0, 0.0)],
    ));
    tile.add(
        Candidate::point("Lake", DVec3::new(350.0, 200.0, 0.0))
            .with_priority(-1)
            .with_fade_distances(0.05, 0.2),
    );
    tile.add_blocking_line(vec![DVec3::new(-400.0, 60.0, 0.0), DVec3::new(400.0, 60.0, 0.0)]);
    tile
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PlacementConfig {
        fade_duration_ms: 200.0,
        ..PlacementConfig::default()
    };
    let mut scheduler = match PlacementScheduler::new(config, Size::new(640.0, 480.0)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("bad config: {e}");
            return;
        }
    };
    scheduler.add_tile(city_tile());

    let mut view = ViewState::default();
    let mut draws = DrawList::default();
    for frame in 0..8 {
        // Pan right; the camera stops after four frames.
        if frame < 4 {
            view.camera_position.x += 60.0;
        }
        let projector = TopDown {
            camera: view.camera_position,
        };
        draws.clear();
        let mut env = PlacementEnv {
            projector: &projector,
            glyphs: &Glyphs,
            measurer: &Mono,
            poi_tables: None,
            renderer: &mut draws,
        };
        let summary = scheduler.place_frame(&view, &mut env);
        println!(
            "frame {}: rendered={} rejected={} invisible={} fading_out={} redraw={}",
            summary.frame_number,
            summary.stats.rendered,
            summary.stats.rejected,
            summary.stats.invisible,
            summary.stats.fading_out,
            summary.needs_redraw,
        );
        for cmd in &draws.commands {
            match cmd {
                DrawCommand::Text {
                    text,
                    bounds,
                    opacity,
                    ..
                } => println!("  text {text:<16} at {:>7.1},{:>7.1} opacity {opacity:.2}", bounds.x0, bounds.y0),
                DrawCommand::Icon {
                    texture,
                    bounds,
                    opacity,
                    ..
                } => println!("  icon {texture:<16} at {:>7.1},{:>7.1} opacity {opacity:.2}", bounds.x0, bounds.y0),
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(60));
    }

    for hit in scheduler.pick(Point::new(-20.0, 0.0)) {
        println!("picked {:?} {:?}", hit.key, hit.kind);
    }
}
