//! Objects that follow the finger during the movement phase.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use trajex_core::{Point, Region, Sample, Shape};

/// Receives every sample of the movement phase, after validation passed.
pub trait TrajectorySensitive: std::fmt::Debug {
    fn reset(&mut self, trial_start_time: f64);

    fn update_xyt(&mut self, position: Point, time: f64);

    /// True once this object considers the trial complete.
    fn target_reached(&self) -> bool {
        false
    }

    /// Response value produced by the trial, if this object measures one.
    fn response(&self) -> Option<f64> {
        None
    }
}

/// Horizontal number line touched from below.
///
/// The line is reached when the finger comes within `touch_distance` of it
/// while horizontally inside its extent (also widened by `touch_distance`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberLine {
    /// Middle of the line.
    pub position: Point,
    pub length: f64,
    pub min_value: f64,
    pub max_value: f64,
    #[serde(default)]
    pub touch_distance: f64,
    #[serde(skip)]
    touched_at: Option<Point>,
}

impl NumberLine {
    pub fn new(position: Point, length: f64, min_value: f64, max_value: f64) -> Self {
        Self {
            position,
            length,
            min_value,
            max_value,
            touch_distance: 0.0,
            touched_at: None,
        }
    }

    pub fn with_touch_distance(mut self, pixels: f64) -> Self {
        self.touch_distance = pixels;
        self
    }

    pub fn left(&self) -> f64 {
        self.position.x - self.length / 2.0
    }

    pub fn right(&self) -> f64 {
        self.position.x + self.length / 2.0
    }

    /// Number-line value under screen x, clamped to the line's range.
    pub fn value_at(&self, x: f64) -> f64 {
        if self.length <= 0.0 {
            return self.min_value;
        }
        let w = ((x - self.left()) / self.length).clamp(0.0, 1.0);
        self.min_value + w * (self.max_value - self.min_value)
    }

    /// Screen x of a number-line value.
    pub fn x_of(&self, value: f64) -> f64 {
        let span = self.max_value - self.min_value;
        if span == 0.0 {
            return self.left();
        }
        self.left() + (value - self.min_value) / span * self.length
    }

    pub fn touched_at(&self) -> Option<Point> {
        self.touched_at
    }
}

impl TrajectorySensitive for NumberLine {
    fn reset(&mut self, _trial_start_time: f64) {
        self.touched_at = None;
    }

    fn update_xyt(&mut self, position: Point, _time: f64) {
        if self.touched_at.is_some() {
            return;
        }
        let reached_y = position.y >= self.position.y - self.touch_distance;
        let within_x =
            position.x >= self.left() - self.touch_distance && position.x <= self.right() + self.touch_distance;
        if reached_y && within_x {
            tracing::debug!(x = position.x, y = position.y, value = self.value_at(position.x), "number line touched");
            self.touched_at = Some(position);
        }
    }

    fn target_reached(&self) -> bool {
        self.touched_at.is_some()
    }

    fn response(&self) -> Option<f64> {
        self.touched_at.map(|p| self.value_at(p.x))
    }
}

/// Success condition for experiments without a number line: reach a region.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetArea {
    pub area: Shape,
    reached: bool,
}

impl TargetArea {
    pub fn new(area: Shape) -> Self {
        Self { area, reached: false }
    }
}

impl TrajectorySensitive for TargetArea {
    fn reset(&mut self, _trial_start_time: f64) {
        self.reached = false;
    }

    fn update_xyt(&mut self, position: Point, _time: f64) {
        self.reached |= self.area.contains(position);
    }

    fn target_reached(&self) -> bool {
        self.reached
    }
}

/// Keeps the trial's samples, timed from the movement start.
///
/// Clones share the same buffer so a session can read what the driver's copy recorded.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryRecorder {
    samples: Rc<RefCell<Vec<Sample>>>,
    start: f64,
}

impl TrajectoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.borrow().is_empty()
    }

    pub fn take(&self) -> Vec<Sample> {
        std::mem::take(&mut *self.samples.borrow_mut())
    }
}

impl TrajectorySensitive for TrajectoryRecorder {
    fn reset(&mut self, trial_start_time: f64) {
        self.start = trial_start_time;
        self.samples.borrow_mut().clear();
    }

    fn update_xyt(&mut self, position: Point, time: f64) {
        self.samples.borrow_mut().push(Sample::at(position, time - self.start));
    }
}
