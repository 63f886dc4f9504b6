use crate::map::ClassificationMap;
use crate::validator::{Validator, ValidatorCore};
use std::collections::HashSet;
use trajex_core::{ErrorCode, Point, SessionContext, ValidationError};

/// The finger must stay on pixels whose colour is in `valid_colors`.
///
/// Positions off the map fail unless `default_valid` is set.
#[derive(Debug, Clone)]
pub struct LocationValidator {
    core: ValidatorCore,
    map: ClassificationMap,
    pub valid_colors: HashSet<u32>,
    pub default_valid: bool,
    pub grace_period: f64,
}

impl LocationValidator {
    pub fn new(map: ClassificationMap, ctx: &SessionContext) -> Self {
        Self {
            core: ValidatorCore::new("location", ctx),
            map,
            valid_colors: HashSet::new(),
            default_valid: false,
            grace_period: 0.0,
        }
    }

    pub fn with_valid_colors(mut self, colors: impl IntoIterator<Item = u32>) -> Self {
        self.valid_colors = colors.into_iter().collect();
        self
    }

    pub fn with_default_valid(mut self, default_valid: bool) -> Self {
        self.default_valid = default_valid;
        self
    }

    pub fn map(&self) -> &ClassificationMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut ClassificationMap {
        &mut self.map
    }

    pub fn set_map(&mut self, map: ClassificationMap) {
        self.map = map;
    }
}

impl Validator for LocationValidator {
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
        if self.core.advance(time) < self.grace_period {
            return Ok(());
        }
        let (ok, color) = match self.map.class_at(position) {
            Some(color) => (self.valid_colors.contains(&color), Some(color)),
            None => (self.default_valid, None),
        };
        if ok {
            return Ok(());
        }
        let mut err = ValidationError::new(ErrorCode::InvalidLocation, "you moved out of the allowed area")
            .with_arg("x", position.x)
            .with_arg("y", position.y);
        if let Some(color) = color {
            err = err.with_arg("color", f64::from(color));
        }
        Err(self.core.report(err))
    }
}
