use crate::validator::Validator;
use trajex_core::{Point, ValidationError};

/// Validators evaluated in registration order for every sample.
///
/// Evaluation stops at the first failure, so when several validators would
/// fail on the same sample the first registered one is reported.
#[derive(Default)]
pub struct ValidatorChain {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, validator: impl Validator + 'static) {
        self.validators.push(Box::new(validator));
    }

    pub fn add_boxed(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn reset(&mut self, trial_start_time: f64) {
        for v in &mut self.validators {
            v.reset(trial_start_time);
        }
    }

    pub fn evaluate(&mut self, position: Point, time: f64) -> Result<(), ValidationError> {
        for v in self.validators.iter_mut().filter(|v| v.is_enabled()) {
            v.check_xyt(position, time)?;
        }
        Ok(())
    }

    /// Switches every validator named `name`. Returns false when none matched.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let mut found = false;
        for v in self.validators.iter_mut().filter(|v| v.name() == name) {
            v.set_enabled(enabled);
            found = true;
        }
        found
    }

    pub fn set_max_movement_time(&mut self, secs: Option<f64>) {
        for v in &mut self.validators {
            v.set_max_movement_time(secs);
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Validator> {
        self.validators.iter().find(|v| v.name() == name).map(|v| v.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Validator> {
        self.validators.iter().map(|v| v.as_ref())
    }
}

impl std::fmt::Debug for ValidatorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.validators.iter().map(|v| v.name())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Axis, SpeedValidator, TrialDurationValidator};
    use trajex_core::{ErrorCode, SessionContext};

    fn chain() -> ValidatorChain {
        let ctx = SessionContext::default();
        let mut chain = ValidatorChain::new();
        chain.add(TrialDurationValidator::new(1.0, &ctx));
        chain.add(
            SpeedValidator::new(&ctx)
                .with_axis(Axis::Y)
                .with_limits(Some(10.0), None),
        );
        chain
    }

    #[test]
    fn first_registered_failure_wins() {
        let mut c = chain();
        c.reset(0.0);
        assert!(c.evaluate(Point::ORIGIN, 0.0).is_ok());
        // both too slow and timed out: duration was registered first
        let err = c.evaluate(Point::ORIGIN, 2.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::Timeout);
    }

    #[test]
    fn disabled_validators_are_skipped() {
        let mut c = chain();
        assert!(c.set_enabled("trial_duration", false));
        assert!(!c.set_enabled("no_such_validator", false));
        c.reset(0.0);
        c.evaluate(Point::ORIGIN, 0.0).unwrap();
        let err = c.evaluate(Point::ORIGIN, 2.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::TooSlow);
        assert!(!c.get("trial_duration").unwrap().is_enabled());
    }

    #[test]
    fn empty_chain_accepts() {
        let mut c = ValidatorChain::new();
        c.reset(0.0);
        assert!(c.evaluate(Point::new(1.0, 2.0), 0.5).is_ok());
        assert!(c.is_empty());
    }
}
