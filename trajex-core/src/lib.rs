pub mod context;
pub mod error;
pub mod event;
pub mod geometry;
pub mod host;
pub mod sample;
pub mod stimulus;
pub mod trial;

pub use context::{LogLevel, SessionContext};
pub use error::{ErrorCode, UsageError, ValidationError, WriteOnce};
pub use event::{Event, EventError};
pub use geometry::{Circle, Edge, Point, Rectangle, Region, Sector, Shape};
pub use host::{HostError, PointerInput, PointerState, Presenter, SoundPlayer};
pub use sample::Sample;
pub use stimulus::{Scene, Stimulus, StimulusKind};
pub use trial::{TrialInfo, TrialState, TrialStatus};
