use crate::validator::ValidatorCore;
use trajex_core::{ErrorCode, SessionContext, ValidationError};

/// Detects the finger leaving the screen mid-trial.
///
/// Lifting is tolerated for up to `max_offscreen_duration` seconds; with the
/// default of zero the first lifted frame fails the trial.
#[derive(Debug, Clone)]
pub struct FingerLiftedValidator {
    core: ValidatorCore,
    pub max_offscreen_duration: f64,
    lifted_since: Option<f64>,
}

impl FingerLiftedValidator {
    pub fn new(ctx: &SessionContext) -> Self {
        Self {
            core: ValidatorCore::new("finger_lifted", ctx),
            max_offscreen_duration: 0.0,
            lifted_since: None,
        }
    }

    pub fn with_max_offscreen_duration(mut self, secs: f64) -> Self {
        self.max_offscreen_duration = secs;
        self
    }

    pub fn core_mut(&mut self) -> &mut ValidatorCore {
        &mut self.core
    }

    pub fn reset(&mut self, trial_start_time: f64) {
        self.core.reset(trial_start_time);
        self.lifted_since = None;
    }

    pub fn is_lifted(&self) -> bool {
        self.lifted_since.is_some()
    }

    pub fn check_pressed(&mut self, pressed: bool, time: f64) -> Result<(), ValidationError> {
        if !self.core.enabled {
            return Ok(());
        }
        self.core.advance(time);
        if pressed {
            self.lifted_since = None;
            return Ok(());
        }
        let since = *self.lifted_since.get_or_insert(time);
        let offscreen = time - since;
        if offscreen >= self.max_offscreen_duration {
            return Err(self.core.report(
                ValidationError::new(ErrorCode::FingerLifted, "you lifted your finger")
                    .with_arg("offscreen_duration", offscreen),
            ));
        }
        Ok(())
    }
}
