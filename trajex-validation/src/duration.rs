use crate::validator::{Validator, ValidatorCore};
use trajex_core::{ErrorCode, Point, SessionContext, ValidationError};

/// Fails a trial that runs longer than `max_trial_duration` seconds.
#[derive(Debug, Clone)]
pub struct TrialDurationValidator {
    core: ValidatorCore,
    pub max_trial_duration: f64,
}

impl TrialDurationValidator {
    pub fn new(max_trial_duration: f64, ctx: &SessionContext) -> Self {
        Self {
            core: ValidatorCore::new("trial_duration", ctx),
            max_trial_duration,
        }
    }
}

impl Validator for TrialDurationValidator {
    fn core(&self) -> &ValidatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ValidatorCore {
        &mut self.core
    }

    fn reset(&mut self, trial_start_time: f64) {
        self.core.reset(trial_start_time);
    }

    fn check_xyt(&mut self, _position: Point, time: f64) -> Result<(), ValidationError> {
        if !self.core.enabled {
            return Ok(());
        }
        let elapsed = self.core.advance(time);
        if elapsed > self.max_trial_duration {
            return Err(self.core.report(
                ValidationError::new(ErrorCode::Timeout, "the trial took too long")
                    .with_arg("duration", elapsed)
                    .with_arg("max_duration", self.max_trial_duration),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn times_out_after_limit() {
        let mut v = TrialDurationValidator::new(2.0, &SessionContext::default());
        v.reset(10.0);
        assert!(v.check_xyt(Point::ORIGIN, 12.0).is_ok());
        let err = v.check_xyt(Point::ORIGIN, 12.5).unwrap_err();
        assert_eq!(err.code, ErrorCode::Timeout);
        assert_eq!(err.arg("duration"), Some(2.5));
    }
}
