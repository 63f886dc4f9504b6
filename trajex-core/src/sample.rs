use crate::geometry::Point;
use serde::{Deserialize, Serialize};

/// One pointer reading; `t` is seconds since the trial started.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub t: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, t: f64) -> Self {
        Self { x, y, t }
    }

    pub fn at(position: Point, t: f64) -> Self {
        Self::new(position.x, position.y, t)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}
