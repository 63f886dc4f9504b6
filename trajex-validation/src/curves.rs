//! Zig-zag limit: counts how many times the movement changes direction.
//!
//! The movement direction is sampled each time the finger has travelled
//! `min_distance` from the previous anchor. Consecutive direction changes
//! with the same rotation sense accumulate into one turn; a turn counts as a
//! curve once it reaches `min_angle_change` degrees.

use crate::validator::{Validator, ValidatorCore};
use trajex_core::geometry::normalize_degrees;
use trajex_core::{ErrorCode, LogLevel, Point, SessionContext, ValidationError};

#[derive(Debug, Clone)]
pub struct CurvesValidator {
    core: ValidatorCore,
    pub max_curves: usize,
    pub min_angle_change: f64,
    pub min_distance: f64,
    anchor: Option<Point>,
    last_angle: Option<f64>,
    turn: f64,
    turn_counted: bool,
    curves: usize,
}

impl CurvesValidator {
    pub fn new(ctx: &SessionContext) -> Self {
        Self {
            core: ValidatorCore::new("curves", ctx),
            max_curves: 1,
            min_angle_change: 45.0,
            min_distance: 5.0,
            anchor: None,
            last_angle: None,
            turn: 0.0,
            turn_counted: false,
            curves: 0,
        }
    }

    pub fn with_max_curves(mut self, n: usize) -> Self {
        self.max_curves = n;
        self
    }

    pub fn with_min_angle_change(mut self, degrees: f64) -> Self {
        self.min_angle_change = degrees;
        self
    }

    pub fn with_min_distance(mut self, pixels: f64) -> Self {
        self.min_distance = pixels;
        self
    }

    pub fn curves(&self) -> usize {
        self.curves
    }

    fn track_turn(&mut self, delta: f64) {
        if delta == 0.0 {
            return;
        }
        if self.turn == 0.0 || delta.signum() == self.turn.signum() {
            self.turn += delta;
        } else {
            self.turn = delta;
            self.turn_counted = false;
        }
        if !self.turn_counted && self.turn.abs() >= self.min_angle_change {
            self.turn_counted = true;
            self.curves += 1;
            if self.core.logs(LogLevel::Trace) {
                tracing::trace!(validator = %self.core.name, curves = self.curves, "curve detected");
            }
        }
    }
}

impl Validator for CurvesValidator {
    fn core(&self) -> &ValidatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ValidatorCore {
        &mut self.core
    }

    fn reset(&mut self, trial_start_time: f64) {
        self.core.reset(trial_start_time);
        self.anchor = None;
        self.last_angle = None;
        self.turn = 0.0;
        self.turn_counted = false;
        self.curves = 0;
    }

    fn check_xyt(&mut self, position: Point, time: f64) -> Result<(), ValidationError> {
        if !self.core.enabled {
            return Ok(());
        }
        self.core.advance(time);

        let Some(anchor) = self.anchor else {
            self.anchor = Some(position);
            return Ok(());
        };
        if anchor.distance_to(position) < self.min_distance {
            return Ok(());
        }

        let angle = anchor.angle_to(position);
        self.anchor = Some(position);
        if let Some(prev) = self.last_angle.replace(angle) {
            self.track_turn(normalize_degrees(angle - prev));
        }

        if self.curves > self.max_curves {
            return Err(self.core.report(
                ValidationError::new(ErrorCode::TooManyCurves, "you changed direction too many times")
                    .with_arg("curves", self.curves as f64)
                    .with_arg("max_curves", self.max_curves as f64),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(v: &mut CurvesValidator, points: &[(f64, f64)]) -> Result<(), ValidationError> {
        v.reset(0.0);
        for (i, &(x, y)) in points.iter().enumerate() {
            v.check_xyt(Point::new(x, y), i as f64 * 0.02)?;
        }
        Ok(())
    }

    #[test]
    fn straight_line_has_no_curves() {
        let mut v = CurvesValidator::new(&SessionContext::default()).with_max_curves(0);
        let pts: Vec<_> = (0..20).map(|i| (0.0, i as f64 * 10.0)).collect();
        assert!(feed(&mut v, &pts).is_ok());
        assert_eq!(v.curves(), 0);
    }

    #[test]
    fn zig_zag_counts_each_reversal() {
        let mut v = CurvesValidator::new(&SessionContext::default()).with_max_curves(10);
        // up-right, up-left, up-right, up-left: three reversals of 90 degrees
        let pts = [(0.0, 0.0), (10.0, 10.0), (0.0, 20.0), (10.0, 30.0), (0.0, 40.0)];
        assert!(feed(&mut v, &pts).is_ok());
        assert_eq!(v.curves(), 3);
    }

    #[test]
    fn exceeding_the_limit_fails() {
        let mut v = CurvesValidator::new(&SessionContext::default()).with_max_curves(1);
        let pts = [(0.0, 0.0), (10.0, 10.0), (0.0, 20.0), (10.0, 30.0)];
        let err = feed(&mut v, &pts).unwrap_err();
        assert_eq!(err.code, ErrorCode::TooManyCurves);
        assert_eq!(err.arg("curves"), Some(2.0));
    }

    #[test]
    fn gentle_bend_below_threshold_is_ignored() {
        let mut v = CurvesValidator::new(&SessionContext::default())
            .with_max_curves(0)
            .with_min_angle_change(90.0);
        // 30 degrees to the right, then 30 degrees to the left of vertical
        let pts = [(0.0, 0.0), (5.0, 8.66), (0.0, 17.32)];
        assert!(feed(&mut v, &pts).is_ok());
    }

    #[test]
    fn small_steps_accumulate_to_min_distance() {
        let mut v = CurvesValidator::new(&SessionContext::default()).with_min_distance(10.0);
        let pts = [(0.0, 0.0), (0.0, 3.0), (0.0, 6.0), (0.0, 9.0)];
        assert!(feed(&mut v, &pts).is_ok());
        assert!(v.last_angle.is_none());
    }
}
