//! Direction check driven by a gradient image.
//!
//! The map's colour under the finger is read as a progress value. Moving
//! against the gradient by more than `max_valid_back_movement` steps from the
//! furthest point reached fails the trial.
//!
//! With `cyclic` set the gradient wraps around: every step delta is folded
//! into `(-period/2, period/2]`, so crossing from the top of the scale back
//! to its bottom reads as a small forward step. A jump of exactly half a
//! period counts as forward. Without an explicit period the cycle spans the
//! channel values present in the map.
//!
//! Positions off the map fail unless `default_valid` is set.

use crate::map::{ClassificationMap, unpack_rgb};
use crate::validator::{Validator, ValidatorCore};
use trajex_core::{ErrorCode, Point, SessionContext, ValidationError};

/// Which part of the pixel colour carries the gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    #[default]
    Red,
    Green,
    Blue,
    /// The whole packed `0xRRGGBB` value.
    Rgb,
}

impl Channel {
    pub fn value(self, color: u32) -> f64 {
        let [r, g, b] = unpack_rgb(color);
        match self {
            Channel::Red => f64::from(r),
            Channel::Green => f64::from(g),
            Channel::Blue => f64::from(b),
            Channel::Rgb => f64::from(color),
        }
    }

    /// Number of distinct values the channel can take.
    pub fn levels(self) -> f64 {
        match self {
            Channel::Rgb => f64::from(1u32 << 24),
            _ => 256.0,
        }
    }

    /// `max - min + 1` over the channel values in `map`; the full level
    /// count for an empty map.
    pub fn span(self, map: &ClassificationMap) -> f64 {
        let (min, max) = map
            .colors()
            .map(|c| self.value(c))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min > max { self.levels() } else { max - min + 1.0 }
    }

    pub fn parse(text: &str) -> Option<Channel> {
        Some(match text.trim().to_ascii_lowercase().as_str() {
            "r" | "red" => Channel::Red,
            "g" | "green" => Channel::Green,
            "b" | "blue" => Channel::Blue,
            "rgb" => Channel::Rgb,
            _ => return None,
        })
    }
}

/// Folds a signed step count into `(-period/2, period/2]`.
pub fn wrap_cycle(delta: f64, period: f64) -> f64 {
    let w = delta.rem_euclid(period);
    if w > period / 2.0 { w - period } else { w }
}

#[derive(Debug, Clone)]
pub struct GradientValidator {
    core: ValidatorCore,
    map: ClassificationMap,
    pub channel: Channel,
    /// Progress grows with the channel value when true, shrinks otherwise.
    pub ascending: bool,
    pub max_valid_back_movement: f64,
    pub cyclic: bool,
    /// Cycle length used when `cyclic`; `None` uses the map's value span.
    pub period: Option<f64>,
    pub default_valid: bool,
    pub grace_period: f64,
    span: f64,
    last_value: Option<f64>,
    progress: f64,
    peak: f64,
}

impl GradientValidator {
    pub fn new(map: ClassificationMap, ctx: &SessionContext) -> Self {
        let channel = Channel::default();
        Self {
            core: ValidatorCore::new("gradient", ctx),
            span: channel.span(&map),
            map,
            channel,
            ascending: true,
            max_valid_back_movement: 0.0,
            cyclic: false,
            period: None,
            default_valid: false,
            grace_period: 0.0,
            last_value: None,
            progress: 0.0,
            peak: 0.0,
        }
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.set_channel(channel);
        self
    }

    pub fn set_channel(&mut self, channel: Channel) {
        self.channel = channel;
        self.span = channel.span(&self.map);
    }

    pub fn with_max_back_movement(mut self, steps: f64) -> Self {
        self.max_valid_back_movement = steps;
        self
    }

    pub fn descending(mut self) -> Self {
        self.ascending = false;
        self
    }

    pub fn cyclic(mut self) -> Self {
        self.cyclic = true;
        self
    }

    pub fn cyclic_with_period(mut self, period: f64) -> Self {
        self.cyclic = true;
        self.period = Some(period);
        self
    }

    pub fn with_default_valid(mut self, default_valid: bool) -> Self {
        self.default_valid = default_valid;
        self
    }

    pub fn map_mut(&mut self) -> &mut ClassificationMap {
        &mut self.map
    }

    pub fn set_map(&mut self, map: ClassificationMap) {
        self.span = self.channel.span(&map);
        self.map = map;
    }

    /// Cycle length applied to step deltas when `cyclic`.
    pub fn effective_period(&self) -> f64 {
        self.period.unwrap_or(self.span)
    }

    /// Net progress in steps since the first sample on the map.
    pub fn progress(&self) -> f64 {
        self.progress
    }
}

impl Validator for GradientValidator {
    fn core(&self) -> &ValidatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ValidatorCore {
        &mut self.core
    }

    fn reset(&mut self, trial_start_time: f64) {
        self.core.reset(trial_start_time);
        self.last_value = None;
        self.progress = 0.0;
        self.peak = 0.0;
    }

    fn check_xyt(&mut self, position: Point, time: f64) -> Result<(), ValidationError> {
        if !self.core.enabled {
            return Ok(());
        }
        let elapsed = self.core.advance(time);
        let Some(color) = self.map.class_at(position) else {
            if self.default_valid || elapsed < self.grace_period {
                return Ok(());
            }
            return Err(self.core.report(
                ValidationError::new(ErrorCode::InvalidLocation, "you moved off the gradient")
                    .with_arg("x", position.x)
                    .with_arg("y", position.y),
            ));
        };
        let value = self.channel.value(color);
        let Some(last) = self.last_value.replace(value) else {
            return Ok(());
        };

        let mut delta = value - last;
        if !self.ascending {
            delta = -delta;
        }
        let period = self.effective_period();
        if self.cyclic && period > 0.0 {
            delta = wrap_cycle(delta, period);
        }
        self.progress += delta;
        self.peak = self.peak.max(self.progress);

        let back = self.peak - self.progress;
        if elapsed >= self.grace_period && back > self.max_valid_back_movement {
            return Err(self.core.report(
                ValidationError::new(ErrorCode::WrongDirection, "you moved backwards")
                    .with_arg("value", value)
                    .with_arg("back_movement", back)
                    .with_arg("max_back_movement", self.max_valid_back_movement),
            ));
        }
        Ok(())
    }
}
