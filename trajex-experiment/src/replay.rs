//! Pointer input from a recorded list of frames.

use std::collections::VecDeque;
use trajex_core::{Point, PointerInput, PointerState, Sample};
use trajex_timing::ManualTimer;

/// Plays back `(sample, pressed)` frames; `sample.t` is the absolute frame time.
///
/// When a clock is attached, every poll moves it to the frame's time so the
/// driver sees the recorded timing.
#[derive(Debug, Clone, Default)]
pub struct ReplayInput {
    frames: VecDeque<(Sample, bool)>,
    current: PointerState,
    clock: Option<ManualTimer>,
}

impl ReplayInput {
    pub fn new(frames: impl IntoIterator<Item = (Sample, bool)>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: ManualTimer) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Appends a pressed frame.
    pub fn touch(&mut self, x: f64, y: f64, t: f64) -> &mut Self {
        self.frames.push_back((Sample::new(x, y, t), true));
        self
    }

    /// Appends a released frame.
    pub fn release(&mut self, x: f64, y: f64, t: f64) -> &mut Self {
        self.frames.push_back((Sample::new(x, y, t), false));
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl PointerInput for ReplayInput {
    fn poll(&mut self) -> bool {
        let Some((sample, pressed)) = self.frames.pop_front() else {
            return false;
        };
        if let Some(clock) = &self.clock {
            clock.set_secs(sample.t);
        }
        self.current = PointerState {
            position: sample.position(),
            pressed,
        };
        true
    }

    fn position(&self) -> Point {
        self.current.position
    }

    fn is_pressed(&self) -> bool {
        self.current.pressed
    }
}
