//! Movement direction must stay within an angular range.
//!
//! Angles here are compass-like: 0 is straight up and positive values turn
//! clockwise, so 90 is rightwards and -90 leftwards.

use crate::validator::{Validator, ValidatorCore};
use trajex_core::geometry::normalize_degrees;
use trajex_core::{ErrorCode, Point, SessionContext, ValidationError};

#[derive(Debug, Clone)]
pub struct MovementAngleValidator {
    core: ValidatorCore,
    pub min_angle: f64,
    pub max_angle: f64,
    /// Pixels the finger must travel before a direction is computed.
    pub calc_distance: f64,
    pub grace_period: f64,
    anchor: Option<Point>,
}

/// Heading of `from -> to`: 0 up, clockwise positive, in (-180, 180].
pub fn heading(from: Point, to: Point) -> f64 {
    normalize_degrees((to.x - from.x).atan2(to.y - from.y).to_degrees())
}

impl MovementAngleValidator {
    pub fn new(ctx: &SessionContext) -> Self {
        Self {
            core: ValidatorCore::new("movement_angle", ctx),
            min_angle: -90.0,
            max_angle: 90.0,
            calc_distance: 10.0,
            grace_period: 0.0,
            anchor: None,
        }
    }

    pub fn with_range(mut self, min_angle: f64, max_angle: f64) -> Self {
        self.min_angle = min_angle;
        self.max_angle = max_angle;
        self
    }

    pub fn with_calc_distance(mut self, pixels: f64) -> Self {
        self.calc_distance = pixels;
        self
    }
}

impl Validator for MovementAngleValidator {
    fn core(&self) -> &ValidatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ValidatorCore {
        &mut self.core
    }

    fn reset(&mut self, trial_start_time: f64) {
        self.core.reset(trial_start_time);
        self.anchor = None;
    }

    fn check_xyt(&mut self, position: Point, time: f64) -> Result<(), ValidationError> {
        if !self.core.enabled {
            return Ok(());
        }
        let elapsed = self.core.advance(time);
        let Some(anchor) = self.anchor else {
            self.anchor = Some(position);
            return Ok(());
        };
        if anchor.distance_to(position) < self.calc_distance {
            return Ok(());
        }
        self.anchor = Some(position);

        let angle = heading(anchor, position);
        if elapsed >= self.grace_period && (angle < self.min_angle || angle > self.max_angle) {
            return Err(self.core.report(
                ValidationError::new(ErrorCode::WrongDirection, "you moved in the wrong direction")
                    .with_arg("angle", angle)
                    .with_arg("min_angle", self.min_angle)
                    .with_arg("max_angle", self.max_angle),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        normalize_degrees(a - b).abs() < 1e-9
    }

    #[test]
    fn heading_is_clockwise_from_up() {
        let o = Point::ORIGIN;
        assert!(close(heading(o, Point::new(0.0, 1.0)), 0.0));
        assert!(close(heading(o, Point::new(1.0, 0.0)), 90.0));
        assert!(close(heading(o, Point::new(-1.0, 0.0)), -90.0));
        assert!(close(heading(o, Point::new(0.0, -1.0)), 180.0));
    }

    #[test]
    fn moving_down_is_rejected() {
        let mut v = MovementAngleValidator::new(&SessionContext::default());
        v.reset(0.0);
        assert!(v.check_xyt(Point::new(0.0, 0.0), 0.0).is_ok());
        assert!(v.check_xyt(Point::new(5.0, 20.0), 0.1).is_ok());
        let err = v.check_xyt(Point::new(5.0, 0.0), 0.2).unwrap_err();
        assert_eq!(err.code, ErrorCode::WrongDirection);
        assert!(close(err.arg("angle").unwrap(), 180.0));
    }

    #[test]
    fn short_moves_are_not_judged() {
        let mut v = MovementAngleValidator::new(&SessionContext::default()).with_calc_distance(50.0);
        v.reset(0.0);
        v.check_xyt(Point::new(0.0, 0.0), 0.0).unwrap();
        assert!(v.check_xyt(Point::new(0.0, -20.0), 0.1).is_ok());
    }
}
