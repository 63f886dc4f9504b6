pub mod timer;
pub use timer::{FrameHistory, FrameStats, HighPrecisionTimer, ManualTimer, Timer};
