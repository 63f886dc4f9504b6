use crate::validator::{Validator, ValidatorCore};
use trajex_core::{ErrorCode, Point, Region, SessionContext, Shape, ValidationError};

/// Keeps the finger inside (or outside) a shape.
#[derive(Debug, Clone)]
pub struct RegionValidator {
    core: ValidatorCore,
    pub region: Shape,
    /// When false the finger must stay out of the region instead.
    pub must_be_inside: bool,
    pub grace_period: f64,
}

impl RegionValidator {
    pub fn new(region: Shape, ctx: &SessionContext) -> Self {
        Self {
            core: ValidatorCore::new("region", ctx),
            region,
            must_be_inside: true,
            grace_period: 0.0,
        }
    }

    pub fn outside(mut self) -> Self {
        self.must_be_inside = false;
        self
    }
}

impl Validator for RegionValidator {
    fn core(&self) -> &ValidatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ValidatorCore {
        &mut self.core
    }

    fn reset(&mut self, trial_start_time: f64) {
        self.core.reset(trial_start_time);
    }

    fn check_xyt(&mut self, position: Point, time: f64) -> Result<(), ValidationError> {
        if !self.core.enabled {
            return Ok(());
        }
        let elapsed = self.core.advance(time);
        if elapsed < self.grace_period || self.region.contains(position) == self.must_be_inside {
            return Ok(());
        }
        let message = if self.must_be_inside {
            "you left the allowed area"
        } else {
            "you entered a forbidden area"
        };
        Err(self.core.report(
            ValidationError::new(ErrorCode::OutOfRegion, message)
                .with_arg("x", position.x)
                .with_arg("y", position.y),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajex_core::{Circle, Rectangle};

    #[test]
    fn leaving_the_corridor_fails() {
        let corridor = Shape::Rectangle(Rectangle::new(Point::ORIGIN, 100.0, 400.0));
        let mut v = RegionValidator::new(corridor, &SessionContext::default());
        v.reset(0.0);
        assert!(v.check_xyt(Point::new(50.0, 200.0), 0.0).is_ok());
        let err = v.check_xyt(Point::new(51.0, 0.0), 0.1).unwrap_err();
        assert_eq!(err.code, ErrorCode::OutOfRegion);
        assert_eq!(err.arg("x"), Some(51.0));
    }

    #[test]
    fn forbidden_zone() {
        let hole = Shape::Circle(Circle::new(Point::ORIGIN, 10.0));
        let mut v = RegionValidator::new(hole, &SessionContext::default()).outside();
        v.reset(0.0);
        assert!(v.check_xyt(Point::new(20.0, 0.0), 0.0).is_ok());
        assert!(v.check_xyt(Point::new(10.0, 0.0), 0.1).is_err());
    }
}
