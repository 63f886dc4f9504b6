//! Instantaneous speed limits.
//!
//! Speed is the displacement between the current sample and the latest
//! earlier sample at least `calculation_interval` seconds old, divided by the
//! time between them. Until that much history exists no speed is computed.
//! The reference is always an earlier sample, so an interval of zero measures
//! against the previous one.

use crate::validator::{Axis, Validator, ValidatorCore};
use std::collections::VecDeque;
use trajex_core::{ErrorCode, Point, Sample, SessionContext, ValidationError};

#[derive(Debug, Clone)]
pub struct SpeedValidator {
    core: ValidatorCore,
    pub axis: Axis,
    /// Pixels per second; `None` disables the bound.
    pub min_speed: Option<f64>,
    pub max_speed: Option<f64>,
    /// Seconds after the trial start during which speed is not enforced.
    pub grace_period: f64,
    pub calculation_interval: f64,
    history: VecDeque<Sample>,
}

impl SpeedValidator {
    pub fn new(ctx: &SessionContext) -> Self {
        Self {
            core: ValidatorCore::new("speed", ctx),
            axis: Axis::XY,
            min_speed: None,
            max_speed: None,
            grace_period: 0.0,
            calculation_interval: 0.05,
            history: VecDeque::new(),
        }
    }

    pub fn with_limits(mut self, min_speed: Option<f64>, max_speed: Option<f64>) -> Self {
        self.min_speed = min_speed;
        self.max_speed = max_speed;
        self
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_grace_period(mut self, secs: f64) -> Self {
        self.grace_period = secs;
        self
    }

    pub fn with_calculation_interval(mut self, secs: f64) -> Self {
        self.calculation_interval = secs;
        self
    }

    /// Speed over the last calculation interval, if enough history exists.
    fn current_speed(&mut self, position: Point, time: f64) -> Option<f64> {
        let threshold = time - self.calculation_interval;
        // the last entry is the current sample and never the reference
        while self.history.len() > 2 && self.history[1].t <= threshold {
            self.history.pop_front();
        }
        if self.history.len() < 2 {
            return None;
        }
        let reference = self.history.front()?;
        let dt = time - reference.t;
        if dt < self.calculation_interval || dt <= 0.0 {
            return None;
        }
        Some(self.axis.distance(reference.position(), position) / dt)
    }
}

impl Validator for SpeedValidator {
    fn core(&self) -> &ValidatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ValidatorCore {
        &mut self.core
    }

    fn reset(&mut self, trial_start_time: f64) {
        self.core.reset(trial_start_time);
        self.history.clear();
    }

    fn check_xyt(&mut self, position: Point, time: f64) -> Result<(), ValidationError> {
        if !self.core.enabled {
            return Ok(());
        }
        let elapsed = self.core.advance(time);
        self.history.push_back(Sample::at(position, time));

        let Some(speed) = self.current_speed(position, time) else {
            return Ok(());
        };
        if elapsed < self.grace_period {
            return Ok(());
        }

        if let Some(min) = self.min_speed {
            if speed < min {
                return Err(self.core.report(
                    ValidationError::new(ErrorCode::TooSlow, "you moved too slowly")
                        .with_arg("speed", speed)
                        .with_arg("min_speed", min),
                ));
            }
        }
        if let Some(max) = self.max_speed {
            if speed > max {
                return Err(self.core.report(
                    ValidationError::new(ErrorCode::TooFast, "you moved too fast")
                        .with_arg("speed", speed)
                        .with_arg("max_speed", max),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slow_y() -> SpeedValidator {
        SpeedValidator::new(&SessionContext::default())
            .with_axis(Axis::Y)
            .with_limits(Some(1.0), None)
    }

    fn run(v: &mut SpeedValidator, samples: &[(f64, f64, f64)]) -> Vec<Option<ErrorCode>> {
        v.reset(0.0);
        samples
            .iter()
            .map(|&(x, y, t)| v.check_xyt(Point::new(x, y), t).err().map(|e| e.code))
            .collect()
    }

    #[test]
    fn reports_too_slow_with_measured_speed() {
        let mut v = slow_y();
        v.reset(0.0);
        assert!(v.check_xyt(Point::new(0.0, 0.0), 0.0).is_ok());
        assert!(v.check_xyt(Point::new(0.0, 1.0), 1.0).is_ok());
        let err = v.check_xyt(Point::new(0.0, 1.5), 2.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::TooSlow);
        assert_eq!(err.arg("speed"), Some(0.5));
    }

    #[test]
    fn min_speed_threshold_is_inclusive() {
        for &s in &[0.5, 1.0, 7.25, 300.0] {
            for &dt in &[0.0625, 0.125, 0.5, 2.0] {
                let mut v = SpeedValidator::new(&SessionContext::default())
                    .with_axis(Axis::XY)
                    .with_limits(Some(s), None);
                let exact = s * dt;
                let results = run(
                    &mut v,
                    &[(0.0, 0.0, 0.0), (exact, 0.0, dt), (exact + 0.9 * exact, 0.0, 2.0 * dt)],
                );
                assert_eq!(results[1], None, "s={s} dt={dt}");
                assert_eq!(results[2], Some(ErrorCode::TooSlow), "s={s} dt={dt}");
            }
        }
    }

    #[test]
    fn too_fast() {
        let mut v = SpeedValidator::new(&SessionContext::default()).with_limits(None, Some(100.0));
        let results = run(&mut v, &[(0.0, 0.0, 0.0), (3.0, 4.0, 0.1), (30.0, 40.0, 0.2)]);
        assert_eq!(results, vec![None, None, Some(ErrorCode::TooFast)]);
    }

    #[test]
    fn no_speed_without_enough_history() {
        let mut v = slow_y().with_calculation_interval(0.5);
        let results = run(&mut v, &[(0.0, 0.0, 0.0), (0.0, 0.0, 0.1), (0.0, 0.0, 0.4)]);
        assert_eq!(results, vec![None, None, None]);
    }

    #[test]
    fn zero_interval_measures_against_the_previous_sample() {
        let mut v = slow_y().with_calculation_interval(0.0);
        let results = run(&mut v, &[(0.0, 0.0, 0.0), (0.0, 1.0, 1.0), (0.0, 1.5, 2.0)]);
        assert_eq!(results, vec![None, None, Some(ErrorCode::TooSlow)]);
    }

    #[test]
    fn grace_period_suppresses_but_keeps_baseline() {
        let mut v = slow_y().with_grace_period(1.5);
        let results = run(&mut v, &[(0.0, 0.0, 0.0), (0.0, 0.0, 1.0), (0.0, 0.1, 2.0)]);
        assert_eq!(results, vec![None, None, Some(ErrorCode::TooSlow)]);
    }

    #[test]
    fn disabled_validator_accepts_everything() {
        let mut v = slow_y();
        v.set_enabled(false);
        let results = run(&mut v, &[(0.0, 0.0, 0.0), (0.0, 0.0, 1.0), (0.0, 0.0, 2.0)]);
        assert!(results.iter().all(Option::is_none));
        assert!(v.history.is_empty());
    }

    #[test]
    fn reset_replays_identically() {
        let samples = [
            (0.0, 0.0, 0.0),
            (0.0, 2.0, 0.5),
            (0.0, 2.1, 1.0),
            (0.0, 5.0, 1.5),
            (0.0, 5.1, 2.0),
        ];
        let mut v = slow_y().with_calculation_interval(0.4);
        let first = run(&mut v, &samples);
        let second = run(&mut v, &samples);
        assert_eq!(first, second);
        assert!(first.contains(&Some(ErrorCode::TooSlow)));
    }
}
