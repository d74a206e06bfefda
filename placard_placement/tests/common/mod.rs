// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborators shared by the integration tests.

#![allow(
    dead_code,
    unreachable_pub,
    reason = "Shared by several test binaries, each using a subset."
)]

use std::cell::Cell;
use std::rc::Rc;

use glam::DVec3;
use kurbo::{Point, Rect, Size};
use placard_placement::{
    DrawCommand, DrawList, FrameClock, FrameSummary, GlyphRun, GlyphSupplier, LabelStyle,
    MeasureError, MeasureTarget, PlacementConfig, PlacementEnv, PlacementScheduler, PoiLookup,
    PoiTableLookup, ScreenProjector, TextMeasurement, TextMeasurer, ViewState,
};

/// Glyph edge lengths of [`Mono`].
pub const GLYPH: Size = Size::new(8.0, 16.0);

/// Top-down projection: world x to the right, world y up.
pub struct Flat;

impl ScreenProjector for Flat {
    fn project(&self, world: DVec3) -> Option<Point> {
        Some(Point::new(world.x, -world.y))
    }
}

/// One glyph per character. Texts containing U+FFFD have no glyphs.
pub struct Glyphs;

impl GlyphSupplier for Glyphs {
    fn glyphs(&self, text: &str, style: &LabelStyle) -> Result<GlyphRun, MeasureError> {
        let missing = text.chars().filter(|c| *c == '\u{fffd}').count();
        if missing > 0 {
            return Err(MeasureError::MissingGlyphs {
                text: text.to_owned(),
                missing,
            });
        }
        Ok(GlyphRun::new(text.chars().map(u32::from).collect(), style.font_size))
    }
}

/// Monospace measurer counting its calls.
#[derive(Default)]
pub struct Mono {
    pub calls: Cell<usize>,
}

fn point_along(path: &[Point], mut distance: f64) -> Point {
    for w in path.windows(2) {
        let len = w[0].distance(w[1]);
        if distance <= len && len > 0.0 {
            return w[0].lerp(w[1], distance / len);
        }
        distance -= len;
    }
    path.last().copied().unwrap_or(Point::ZERO)
}

impl TextMeasurer for Mono {
    fn measure(&self, glyphs: &GlyphRun, target: MeasureTarget<'_>) -> Result<TextMeasurement, MeasureError> {
        self.calls.set(self.calls.get() + 1);
        let n = glyphs.len();
        let character_bounds: Vec<Rect> = match target {
            MeasureTarget::Anchored { anchor, offset } => {
                let b = anchor.place(Size::new(GLYPH.width * n as f64, GLYPH.height), offset);
                (0..n)
                    .map(|i| {
                        let x = b.x0 + GLYPH.width * i as f64;
                        Rect::new(x, b.y0, x + GLYPH.width, b.y1)
                    })
                    .collect()
            }
            MeasureTarget::Path(path) => (0..n)
                .map(|i| {
                    let c = point_along(path, GLYPH.width * (i as f64 + 0.5));
                    Rect::from_center_size(c, GLYPH)
                })
                .collect(),
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

/// POI tables answering every lookup the same way.
pub struct Tables(pub PoiLookup);

impl PoiTableLookup for Tables {
    fn lookup(&self, _table: &str, _name: &str) -> PoiLookup {
        self.0.clone()
    }
}

/// Manually driven clock. Every reading advances it by `step`.
#[derive(Clone, Default)]
pub struct TestClock {
    now: Rc<Cell<f64>>,
    step: Rc<Cell<f64>>,
}

impl TestClock {
    pub fn set(&self, now: f64) {
        self.now.set(now);
    }

    pub fn set_step(&self, step: f64) {
        self.step.set(step);
    }
}

impl FrameClock for TestClock {
    fn now_ms(&self) -> f64 {
        let t = self.now.get();
        self.now.set(t + self.step.get());
        t
    }
}

pub const SCREEN: Size = Size::new(800.0, 600.0);

pub fn scheduler(config: PlacementConfig) -> (PlacementScheduler<TestClock>, TestClock) {
    let clock = TestClock::default();
    let s = PlacementScheduler::with_clock(config, SCREEN, clock.clone()).unwrap();
    (s, clock)
}

/// A fading-free configuration, so every label settles within its first frame.
pub fn instant() -> PlacementConfig {
    PlacementConfig {
        disable_fading: true,
        ..PlacementConfig::default()
    }
}

/// The host side of a frame.
#[derive(Default)]
pub struct Host {
    pub measurer: Mono,
    pub tables: Option<Tables>,
}

impl Host {
    pub fn frame<C: FrameClock>(&self, s: &mut PlacementScheduler<C>) -> (FrameSummary, DrawList) {
        self.frame_with_view(s, &ViewState::default())
    }

    pub fn frame_with_view<C: FrameClock>(
        &self,
        s: &mut PlacementScheduler<C>,
        view: &ViewState,
    ) -> (FrameSummary, DrawList) {
        let mut draws = DrawList::default();
        let mut env = PlacementEnv {
            projector: &Flat,
            glyphs: &Glyphs,
            measurer: &self.measurer,
            poi_tables: self.tables.as_ref().map(|t| t as &dyn PoiTableLookup),
            renderer: &mut draws,
        };
        let summary = s.place_frame(view, &mut env);
        (summary, draws)
    }
}

/// Opacity of the first text draw of `text`.
pub fn text_opacity(draws: &DrawList, text: &str) -> Option<f64> {
    draws.commands.iter().find_map(|c| match c {
        DrawCommand::Text { text: t, opacity, .. } if t == text => Some(*opacity),
        _ => None,
    })
}
