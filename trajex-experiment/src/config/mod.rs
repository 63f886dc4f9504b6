//! Experiment configuration: one JSON file plus a CSV of trials.
//!
//! ```json
//! {
//!   "trials": "trials.csv",
//!   "start_point": {"x": 0, "y": -300, "width": 80, "height": 40, "exit_area": "up"},
//!   "number_line": {"position": {"x": 0, "y": 250}, "length": 800, "min_value": 0, "max_value": 100},
//!   "validators": {"speed": {"axis": "y", "min_speed": 50}},
//!   "operations": [{"event": "TRIAL_STARTED + 0.2", "action": "show", "stimulus": "target"}]
//! }
//! ```

pub mod registry;
pub mod trials;
pub mod validators;

pub use registry::{ConfigNode, LoadContext, PropertyRegistry};
pub use trials::{TrialSchema, TrialSpec, load_trials, read_trials};
pub use validators::{build_validator, build_validators};

use crate::driver::{TrialDriver, TrialWorld};
use crate::events::EventManager;
use crate::operation::Operation;
use crate::sensitive::{NumberLine, TargetArea};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use trajex_core::{
    Event, EventError, LogLevel, Point, Rectangle, Scene, SessionContext, Shape, Stimulus, StimulusKind,
};
use trajex_validation::{ExitArea, FingerLiftedValidator, StartPoint};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("{element}: {reason}")]
    Structure { element: String, reason: String },

    #[error("{type_name} has no property {property:?}")]
    UnknownProperty { type_name: &'static str, property: String },

    #[error("{type_name}.{property} = {value:?}: {reason}")]
    InvalidValue {
        type_name: &'static str,
        property: String,
        value: String,
        reason: String,
    },

    #[error("unknown validator type {0:?}")]
    UnknownValidator(String),

    #[error("operation {action} refers to unknown {kind} {name:?}")]
    UnknownTarget {
        action: &'static str,
        kind: &'static str,
        name: String,
    },

    #[error("trials file has no {0:?} column")]
    MissingColumn(String),

    #[error("row {row}: missing value for mandatory column {column}")]
    MissingValue { row: usize, column: String },

    #[error("row {row}, column {column}: {value:?} is not a number")]
    InvalidCell { row: usize, column: String, value: String },

    #[error("invalid event: {0}")]
    Event(#[from] EventError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
    pub background: [u8; 4],
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            background: [0, 0, 0, 255],
        }
    }
}

/// Trial sequencing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub shuffle: bool,
    pub seed: Option<u64>,
    /// Failed trials are appended to the end of the queue again.
    pub repeat_failed: bool,
    /// Seconds between the end of one trial and the start of the next.
    pub inter_trial_interval: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shuffle: false,
            seed: None,
            repeat_failed: false,
            inter_trial_interval: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StartPointConfig {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub exit_area: ExitArea,
    /// Colour of the drawn start area; not drawn when absent.
    #[serde(default)]
    pub color: Option<[u8; 4]>,
}

/// An operation bound to an event, as written in the `operations` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OperationBinding {
    pub event: String,
    #[serde(default)]
    pub recurring: bool,
    #[serde(flatten)]
    pub operation: Operation,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub screen: ScreenConfig,
    pub trials: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub log_level: Option<String>,
    pub start_point: StartPointConfig,
    #[serde(default)]
    pub number_line: Option<NumberLine>,
    #[serde(default)]
    pub target_area: Option<Shape>,
    #[serde(default)]
    pub stimuli: Vec<Stimulus>,
    #[serde(default)]
    pub validators: Option<serde_json::Value>,
    #[serde(default)]
    pub operations: Vec<OperationBinding>,
    /// Extra trial columns that must be present in every row.
    #[serde(default)]
    pub mandatory_columns: Vec<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

pub const START_AREA_STIMULUS: &str = "start_area";
pub const NUMBER_LINE_STIMULUS: &str = "number_line";

impl ExperimentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn session_context(&self) -> Result<SessionContext, ConfigError> {
        let mut ctx = SessionContext::new(self.screen.width, self.screen.height);
        if let Some(text) = &self.log_level {
            ctx.default_log_level = LogLevel::parse(text).ok_or_else(|| ConfigError::InvalidValue {
                type_name: "ExperimentConfig",
                property: "log_level".into(),
                value: text.clone(),
                reason: "expected trace, debug, info, warn, error or none".into(),
            })?;
        }
        Ok(ctx)
    }

    pub fn trial_schema(&self) -> TrialSchema {
        self.mandatory_columns
            .iter()
            .fold(TrialSchema::default(), |schema, c| schema.with_mandatory(c))
    }

    fn build_scene(&self) -> Scene {
        let mut scene = Scene::new(self.screen.background);
        let sp = &self.start_point;
        if let Some(color) = sp.color {
            if !self.stimuli.iter().any(|s| s.id == START_AREA_STIMULUS) {
                let mut area = Stimulus::new(
                    START_AREA_STIMULUS,
                    StimulusKind::Rectangle {
                        width: sp.width as f32,
                        height: sp.height as f32,
                        color,
                    },
                    Point::new(sp.x, sp.y),
                );
                area.visible = true;
                scene.add(area);
            }
        }
        if let Some(nl) = &self.number_line {
            if !self.stimuli.iter().any(|s| s.id == NUMBER_LINE_STIMULUS) {
                let mut line = Stimulus::new(
                    NUMBER_LINE_STIMULUS,
                    StimulusKind::Line {
                        length: nl.length as f32,
                        thickness: 2.0,
                        color: [255, 255, 255, 255],
                    },
                    nl.position,
                );
                line.visible = true;
                scene.add(line);
            }
        }
        for s in &self.stimuli {
            scene.add(s.clone());
        }
        scene
    }

    fn check_target(binding: &OperationBinding, driver: &TrialDriver) -> Result<(), ConfigError> {
        let op = &binding.operation;
        let unknown = |kind: &'static str, name: &str| ConfigError::UnknownTarget {
            action: op.action(),
            kind,
            name: name.to_string(),
        };
        match op {
            Operation::Show { stimulus }
            | Operation::Hide { stimulus }
            | Operation::Move { stimulus, .. }
            | Operation::SetText { stimulus, .. }
            | Operation::Animate { stimulus, .. }
            | Operation::StopAnimation { stimulus } => {
                if !driver.world.scene.contains(stimulus) {
                    return Err(unknown("stimulus", stimulus));
                }
            }
            Operation::Enable { validator } | Operation::Disable { validator } => {
                if driver.world.chain.get(validator).is_none() {
                    return Err(unknown("validator", validator));
                }
            }
            Operation::PlaySound { .. } | Operation::DispatchEvent { .. } | Operation::Log { .. } => {}
        }
        Ok(())
    }

    /// Builds the trial driver: scene, start point, validators, operations
    /// and the success condition.
    pub fn build_driver(&self, cx: &LoadContext) -> Result<TrialDriver, ConfigError> {
        let ctx = &cx.session;
        let sp = &self.start_point;
        let start_point = StartPoint::new(Rectangle::new(Point::new(sp.x, sp.y), sp.width, sp.height), sp.exit_area);

        let mut finger = FingerLiftedValidator::new(ctx);
        let chain = match &self.validators {
            Some(value) => build_validators(&ConfigNode::from_json("validators", value)?, cx, &mut finger)?,
            None => Default::default(),
        };

        let world = TrialWorld::new(chain, self.build_scene());
        let mut driver = TrialDriver::new(start_point, world, EventManager::new(), ctx);
        driver.finger = finger;

        for binding in &self.operations {
            Self::check_target(binding, &driver)?;
            match Event::parse(&binding.event)? {
                Some(event) => driver
                    .events
                    .register_operation(event, binding.operation.clone(), binding.recurring)?,
                None => tracing::debug!(action = binding.operation.action(), "operation bound to no event"),
            }
        }

        match (&self.number_line, &self.target_area) {
            (Some(nl), None) => driver.add_sensitive(nl.clone()),
            (None, Some(area)) => driver.add_sensitive(TargetArea::new(*area)),
            (Some(_), Some(_)) => {
                return Err(ConfigError::Structure {
                    element: "experiment".into(),
                    reason: "number_line and target_area are mutually exclusive".into(),
                });
            }
            (None, None) => {
                return Err(ConfigError::Structure {
                    element: "experiment".into(),
                    reason: "either number_line or target_area is required".into(),
                });
            }
        }
        Ok(driver)
    }

    /// Trials file path, resolved against `base_dir` when relative.
    pub fn trials_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.trials)
    }

    pub fn output_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.output_dir)
    }
}
