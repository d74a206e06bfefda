// Copyright 2025 the Placard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fading timeline.
//!
//! Drive one label's render state through a fade-in, a reversal halfway through
//! the fade-out, and a frame it misses.
//!
//! Run:
//! - `cargo run -p placard_demos --example fading_timeline`

use placard_fading::RenderState;

fn step(state: &mut RenderState, frame: u64, now: f64, show: bool) {
    if show {
        state.start_fade_in(now, frame, false);
    } else {
        state.start_fade_out(now, frame, false);
    }
    let animating = state.update_fading(now, false);
    let name = format!("{:?}", state.state());
    println!(
        "frame {frame:>2} t={now:>5.0} show={show:<5} {name:<9} opacity={:.3} animating={animating}",
        state.opacity(),
    );
}

fn main() {
    let mut state = RenderState::new(300.0);
    let mut frame = 0;

    for t in [0.0, 50.0, 100.0, 150.0, 200.0, 250.0, 300.0] {
        frame += 1;
        step(&mut state, frame, t, true);
    }
    // Hidden, then shown again before the fade-out completes.
    for t in [400.0, 475.0] {
        frame += 1;
        step(&mut state, frame, t, false);
    }
    for t in [500.0, 550.0, 600.0] {
        frame += 1;
        step(&mut state, frame, t, true);
    }

    // A frame without a call makes the state stale: the next fade starts over.
    frame += 2;
    println!("frame {:>2} skipped", frame - 1);
    step(&mut state, frame, 700.0, true);
}
