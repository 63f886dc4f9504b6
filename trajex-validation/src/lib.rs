//! Per-frame trajectory validators and the start-point gate.

pub mod angle;
pub mod chain;
pub mod curves;
pub mod duration;
pub mod finger;
pub mod global_speed;
pub mod gradient;
pub mod location;
pub mod map;
pub mod region;
pub mod speed;
pub mod start_point;
pub mod validator;

pub use angle::MovementAngleValidator;
pub use chain::ValidatorChain;
pub use curves::CurvesValidator;
pub use duration::TrialDurationValidator;
pub use finger::FingerLiftedValidator;
pub use global_speed::{GlobalSpeedValidator, Milestone, MilestoneError};
pub use gradient::{Channel, GradientValidator};
pub use location::LocationValidator;
pub use map::{ClassificationMap, MapError};
pub use region::RegionValidator;
pub use speed::SpeedValidator;
pub use start_point::{ExitArea, StartPoint, StartPointState};
pub use validator::{Axis, Validator, ValidatorCore};
