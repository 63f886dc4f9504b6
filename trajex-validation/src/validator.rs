use trajex_core::{LogLevel, Point, Sample, SessionContext, ValidationError};

/// A rule checked against every pointer sample of a trial.
///
/// `reset` must be called once before the first sample of each trial.
/// Sample times must not decrease between resets; a validator panics when
/// they do, since its history would no longer describe a trajectory.
/// A disabled validator accepts everything and records nothing.
pub trait Validator {
    fn core(&self) -> &ValidatorCore;
    fn core_mut(&mut self) -> &mut ValidatorCore;

    fn reset(&mut self, trial_start_time: f64);

    /// Checks one sample. `time` is in the same clock as `reset`'s argument.
    fn check_xyt(&mut self, position: Point, time: f64) -> Result<(), ValidationError>;

    fn check(&mut self, sample: &Sample) -> Result<(), ValidationError> {
        self.check_xyt(sample.position(), sample.t)
    }

    fn name(&self) -> &str {
        &self.core().name
    }

    fn is_enabled(&self) -> bool {
        self.core().enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.core_mut().enabled = enabled;
    }

    /// Per-trial movement time limit; `None` restores the configured one.
    /// Validators without a limit ignore it.
    fn set_max_movement_time(&mut self, _secs: Option<f64>) {}
}

/// State every validator shares: identity, switches and the trial clock.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorCore {
    pub name: String,
    pub enabled: bool,
    pub log_level: LogLevel,
    trial_start: f64,
    last_time: Option<f64>,
}

impl ValidatorCore {
    pub fn new(name: impl Into<String>, ctx: &SessionContext) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            log_level: ctx.default_log_level,
            trial_start: 0.0,
            last_time: None,
        }
    }

    pub fn reset(&mut self, trial_start_time: f64) {
        self.trial_start = trial_start_time;
        self.last_time = None;
    }

    /// Registers a sample time and returns the seconds elapsed since the trial start.
    ///
    /// # Panics
    /// When `time` is earlier than the previous sample of the same trial.
    pub fn advance(&mut self, time: f64) -> f64 {
        if let Some(last) = self.last_time {
            assert!(
                time >= last,
                "validator {}: sample time went backwards ({time} < {last}) without a reset",
                self.name
            );
        }
        self.last_time = Some(time);
        time - self.trial_start
    }

    pub fn last_time(&self) -> Option<f64> {
        self.last_time
    }

    pub fn logs(&self, level: LogLevel) -> bool {
        self.log_level.allows(level)
    }

    /// Emits the failure at debug level when the configured level permits it.
    pub fn report(&self, err: ValidationError) -> ValidationError {
        if self.logs(LogLevel::Debug) {
            tracing::debug!(validator = %self.name, code = %err.code, args = ?err.args, "{}", err.message);
        }
        err
    }
}

/// Axis along which speed or progress is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    X,
    Y,
    #[default]
    XY,
}

impl Axis {
    pub fn distance(self, from: Point, to: Point) -> f64 {
        match self {
            Axis::X => (to.x - from.x).abs(),
            Axis::Y => (to.y - from.y).abs(),
            Axis::XY => from.distance_to(to),
        }
    }

    /// Coordinate of `p` along a single axis; `XY` has none.
    pub fn coord(self, p: Point) -> Option<f64> {
        match self {
            Axis::X => Some(p.x),
            Axis::Y => Some(p.y),
            Axis::XY => None,
        }
    }

    pub fn parse(text: &str) -> Option<Axis> {
        Some(match text.trim().to_ascii_lowercase().as_str() {
            "x" => Axis::X,
            "y" => Axis::Y,
            "xy" => Axis::XY,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_reports_time_since_trial_start() {
        let mut core = ValidatorCore::new("v", &SessionContext::default());
        core.reset(10.0);
        assert_eq!(core.advance(10.5), 0.5);
        assert_eq!(core.advance(10.5), 0.5);
        core.reset(0.0);
        assert_eq!(core.advance(1.0), 1.0);
    }

    #[test]
    #[should_panic(expected = "went backwards")]
    fn backwards_time_panics() {
        let mut core = ValidatorCore::new("v", &SessionContext::default());
        core.reset(0.0);
        core.advance(2.0);
        core.advance(1.0);
    }

    #[test]
    fn axis_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, -4.0);
        assert_eq!(Axis::X.distance(a, b), 3.0);
        assert_eq!(Axis::Y.distance(a, b), 4.0);
        assert_eq!(Axis::XY.distance(a, b), 5.0);
        assert_eq!(Axis::parse("XY"), Some(Axis::XY));
    }
}
