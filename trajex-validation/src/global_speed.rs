//! Overall progress must keep pace with a schedule.
//!
//! Progress is the fraction of the way from `origin_coord` to `end_coord`
//! along one axis. The schedule is a list of milestones mapping a fraction of
//! `max_movement_time` to the progress expected by then, linearly
//! interpolated from (0, 0).

use crate::validator::{Axis, Validator, ValidatorCore};
use trajex_core::{ErrorCode, Point, SessionContext, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Milestone {
    pub time_fraction: f64,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MilestoneError {
    #[error("milestone fractions must lie in (0, 1], got time {time} progress {progress}")]
    OutOfRange { time: f64, progress: f64 },

    #[error("milestones must increase in both time and progress")]
    NotIncreasing,
}

/// Validates and completes a milestone list so it ends at (1, 1).
pub fn normalize_milestones(mut points: Vec<Milestone>) -> Result<Vec<Milestone>, MilestoneError> {
    let mut prev = Milestone {
        time_fraction: 0.0,
        progress: 0.0,
    };
    for m in &points {
        if !(m.time_fraction > 0.0 && m.time_fraction <= 1.0 && m.progress > 0.0 && m.progress <= 1.0) {
            return Err(MilestoneError::OutOfRange {
                time: m.time_fraction,
                progress: m.progress,
            });
        }
        if m.time_fraction <= prev.time_fraction || m.progress < prev.progress {
            return Err(MilestoneError::NotIncreasing);
        }
        prev = *m;
    }
    if prev.time_fraction < 1.0 {
        points.push(Milestone {
            time_fraction: 1.0,
            progress: 1.0,
        });
    }
    Ok(points)
}

#[derive(Debug, Clone)]
pub struct GlobalSpeedValidator {
    core: ValidatorCore,
    pub axis: Axis,
    pub origin_coord: f64,
    pub end_coord: f64,
    /// Configured limit, used by trials without their own.
    pub max_movement_time: f64,
    pub grace_period: f64,
    milestones: Vec<Milestone>,
    trial_max_movement_time: Option<f64>,
}

impl GlobalSpeedValidator {
    pub fn new(ctx: &SessionContext) -> Self {
        Self {
            core: ValidatorCore::new("global_speed", ctx),
            axis: Axis::Y,
            origin_coord: 0.0,
            end_coord: 0.0,
            max_movement_time: 2.0,
            grace_period: 0.0,
            milestones: vec![Milestone {
                time_fraction: 1.0,
                progress: 1.0,
            }],
            trial_max_movement_time: None,
        }
    }

    pub fn with_path(mut self, axis: Axis, origin_coord: f64, end_coord: f64) -> Self {
        self.axis = axis;
        self.origin_coord = origin_coord;
        self.end_coord = end_coord;
        self
    }

    pub fn with_max_movement_time(mut self, secs: f64) -> Self {
        self.max_movement_time = secs;
        self
    }

    pub fn with_grace_period(mut self, secs: f64) -> Self {
        self.grace_period = secs;
        self
    }

    pub fn set_milestones(&mut self, milestones: Vec<Milestone>) -> Result<(), MilestoneError> {
        self.milestones = normalize_milestones(milestones)?;
        Ok(())
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    /// Limit in force for the current trial.
    pub fn movement_time_limit(&self) -> f64 {
        self.trial_max_movement_time.unwrap_or(self.max_movement_time)
    }

    /// Progress expected `elapsed` seconds into the movement.
    pub fn expected_progress(&self, elapsed: f64) -> f64 {
        let limit = self.movement_time_limit();
        if limit <= 0.0 {
            return 1.0;
        }
        let f = (elapsed / limit).clamp(0.0, 1.0);
        let mut prev = Milestone {
            time_fraction: 0.0,
            progress: 0.0,
        };
        for m in &self.milestones {
            if f <= m.time_fraction {
                let span = m.time_fraction - prev.time_fraction;
                let w = (f - prev.time_fraction) / span;
                return prev.progress + w * (m.progress - prev.progress);
            }
            prev = *m;
        }
        1.0
    }

    fn actual_progress(&self, position: Point) -> f64 {
        let coord = self.axis.coord(position).unwrap_or(position.y);
        let span = self.end_coord - self.origin_coord;
        if span == 0.0 {
            return 1.0;
        }
        (coord - self.origin_coord) / span
    }
}

impl Validator for GlobalSpeedValidator {
    fn core(&self) -> &ValidatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ValidatorCore {
        &mut self.core
    }

    fn reset(&mut self, trial_start_time: f64) {
        self.core.reset(trial_start_time);
    }

    fn set_max_movement_time(&mut self, secs: Option<f64>) {
        self.trial_max_movement_time = secs;
    }

    fn check_xyt(&mut self, position: Point, time: f64) -> Result<(), ValidationError> {
        if !self.core.enabled {
            return Ok(());
        }
        let elapsed = self.core.advance(time);
        if elapsed < self.grace_period {
            return Ok(());
        }

        let expected = self.expected_progress(elapsed);
        let actual = self.actual_progress(position);
        if actual < expected {
            let expected_coord = self.origin_coord + expected * (self.end_coord - self.origin_coord);
            return Err(self.core.report(
                ValidationError::new(ErrorCode::TooSlow, "you moved too slowly")
                    .with_arg("progress", actual)
                    .with_arg("expected_progress", expected)
                    .with_arg("expected_coord", expected_coord),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upward() -> GlobalSpeedValidator {
        GlobalSpeedValidator::new(&SessionContext::default())
            .with_path(Axis::Y, 0.0, 100.0)
            .with_max_movement_time(2.0)
    }

    #[test]
    fn linear_schedule() {
        let v = upward();
        assert_eq!(v.expected_progress(0.0), 0.0);
        assert_eq!(v.expected_progress(1.0), 0.5);
        assert_eq!(v.expected_progress(5.0), 1.0);
    }

    #[test]
    fn piecewise_schedule() {
        let mut v = upward();
        v.set_milestones(vec![Milestone {
            time_fraction: 0.5,
            progress: 0.25,
        }])
        .unwrap();
        assert_eq!(v.milestones().len(), 2);
        assert_eq!(v.expected_progress(1.0), 0.25);
        assert_eq!(v.expected_progress(1.5), 0.625);
    }

    #[test]
    fn rejects_bad_milestones() {
        let bad = vec![
            Milestone {
                time_fraction: 0.6,
                progress: 0.5,
            },
            Milestone {
                time_fraction: 0.4,
                progress: 0.7,
            },
        ];
        assert_eq!(normalize_milestones(bad), Err(MilestoneError::NotIncreasing));
        assert!(normalize_milestones(vec![Milestone {
            time_fraction: 1.5,
            progress: 1.0
        }])
        .is_err());
    }

    #[test]
    fn falling_behind_fails() {
        let mut v = upward();
        v.reset(0.0);
        assert!(v.check_xyt(Point::new(0.0, 0.0), 0.0).is_ok());
        assert!(v.check_xyt(Point::new(0.0, 60.0), 1.0).is_ok());
        let err = v.check_xyt(Point::new(0.0, 70.0), 1.6).unwrap_err();
        assert_eq!(err.code, ErrorCode::TooSlow);
        assert_eq!(err.arg("expected_coord"), Some(80.0));
    }

    #[test]
    fn per_trial_movement_time() {
        let mut v = upward();
        v.set_max_movement_time(Some(4.0));
        assert_eq!(v.expected_progress(1.0), 0.25);
        v.set_max_movement_time(None);
        assert_eq!(v.movement_time_limit(), 2.0);
        assert_eq!(v.expected_progress(1.0), 0.5);
    }

    #[test]
    fn grace_period_skips_checks() {
        let mut v = upward().with_grace_period(1.0);
        v.reset(0.0);
        assert!(v.check_xyt(Point::new(0.0, 0.0), 0.9).is_ok());
        assert!(v.check_xyt(Point::new(0.0, 0.0), 1.1).is_err());
    }
}
