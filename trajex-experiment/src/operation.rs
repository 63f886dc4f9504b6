//! Tagged operation records fired by the event manager.
//!
//! Operations are plain data: the scheduler decides when they fire and an
//! [`OperationTarget`] decides what they do.

use crate::generator::TrajectorySpec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Operation {
    Show { stimulus: String },
    Hide { stimulus: String },
    Move { stimulus: String, x: f64, y: f64 },
    SetText { stimulus: String, text: String },
    Enable { validator: String },
    Disable { validator: String },
    PlaySound { sound: String },
    /// Moves a stimulus along a trajectory, starting when the operation fires.
    Animate { stimulus: String, trajectory: TrajectorySpec },
    StopAnimation { stimulus: String },
    /// Dispatches another event at the firing time. Handled by the manager itself.
    DispatchEvent { dispatched: String },
    Log { message: String },
}

impl Operation {
    /// Short name used in diagnostic lines.
    pub fn action(&self) -> &'static str {
        match self {
            Operation::Show { .. } => "show",
            Operation::Hide { .. } => "hide",
            Operation::Move { .. } => "move",
            Operation::SetText { .. } => "set_text",
            Operation::Enable { .. } => "enable",
            Operation::Disable { .. } => "disable",
            Operation::PlaySound { .. } => "play_sound",
            Operation::Animate { .. } => "animate",
            Operation::StopAnimation { .. } => "stop_animation",
            Operation::DispatchEvent { .. } => "dispatch_event",
            Operation::Log { .. } => "log",
        }
    }

    /// The object the operation acts on, if any.
    pub fn subject(&self) -> Option<&str> {
        match self {
            Operation::Show { stimulus }
            | Operation::Hide { stimulus }
            | Operation::Move { stimulus, .. }
            | Operation::SetText { stimulus, .. }
            | Operation::Animate { stimulus, .. }
            | Operation::StopAnimation { stimulus } => Some(stimulus),
            Operation::Enable { validator } | Operation::Disable { validator } => Some(validator),
            Operation::PlaySound { sound } => Some(sound),
            Operation::DispatchEvent { dispatched } => Some(dispatched),
            Operation::Log { .. } => None,
        }
    }
}

/// Executes operations against the live trial state.
pub trait OperationTarget {
    /// `time` is the moment the operation was due, in session seconds.
    fn execute(&mut self, operation: &Operation, time: f64);
}

/// Target that only records what it was asked to do.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingTarget {
    pub executed: Vec<(Operation, f64)>,
}

impl OperationTarget for RecordingTarget {
    fn execute(&mut self, operation: &Operation, time: f64) {
        self.executed.push((operation.clone(), time));
    }
}
