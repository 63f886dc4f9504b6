//! Trials, sessions and their configuration.

pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod generator;
pub mod operation;
pub mod output;
pub mod replay;
pub mod sensitive;
pub mod session;

pub use config::{ConfigError, ExperimentConfig, SessionConfig, TrialSchema, TrialSpec};
pub use driver::{FrameOutcome, TARGET_ONSET, TrialDriver, TrialEnd, TrialWorld};
pub use error::{Error, Result};
pub use events::{EventManager, Fired};
pub use generator::{Animator, LineTrajectory, SegmentedTrajectory, TrajectoryGenerator, TrajectorySpec};
pub use operation::{Operation, OperationTarget, RecordingTarget};
pub use output::{DiagnosticLog, OutputError, ResultsWriter, TrajectoryWriter};
pub use replay::ReplayInput;
pub use sensitive::{NumberLine, TargetArea, TrajectoryRecorder, TrajectorySensitive};
pub use session::{Session, SessionStatus};
