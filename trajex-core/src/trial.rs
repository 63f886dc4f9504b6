use crate::error::{ErrorCode, UsageError, ValidationError, WriteOnce};
use serde::Serialize;
use std::collections::BTreeMap;

/// Where a trial is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    /// Waiting for the finger to touch and leave the start area.
    AwaitingStart,
    Moving,
    Succeeded,
    Failed,
    Aborted,
}

impl TrialState {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            TrialState::Succeeded | TrialState::Failed | TrialState::Aborted
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialStatus {
    /// Running, not yet finished.
    Pending,
    Ok,
    Failed,
}

impl TrialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialStatus::Pending => "pending",
            TrialStatus::Ok => "ok",
            TrialStatus::Failed => "failed",
        }
    }
}

/// Recorded result per trial
#[derive(Debug, Clone, Serialize)]
pub struct TrialInfo {
    pub trial_num: usize,
    pub target: f64,
    pub presented_target: String,
    pub status: TrialStatus,
    pub error_code: Option<ErrorCode>,
    pub error_message: Option<String>,
    /// Seconds from start-area exit to the end of the trial.
    pub movement_time: WriteOnce<f64>,
    pub response: WriteOnce<f64>,
    /// `response - target`, once a response exists.
    pub endpoint_error: Option<f64>,
    pub time_in_session: f64,
    /// Trial-file columns outside the schema, written after the fixed columns.
    #[serde(flatten)]
    pub custom: BTreeMap<String, String>,
}

impl TrialInfo {
    pub fn new(trial_num: usize, target: f64, presented_target: impl Into<String>) -> Self {
        Self {
            trial_num,
            target,
            presented_target: presented_target.into(),
            status: TrialStatus::Pending,
            error_code: None,
            error_message: None,
            movement_time: WriteOnce::new("movement_time"),
            response: WriteOnce::new("response"),
            endpoint_error: None,
            time_in_session: 0.0,
            custom: BTreeMap::new(),
        }
    }

    pub fn set_response(&mut self, response: f64) -> Result<(), UsageError> {
        self.response.set(response)?;
        self.endpoint_error = Some(response - self.target);
        Ok(())
    }

    pub fn succeed(&mut self) {
        self.status = TrialStatus::Ok;
    }

    pub fn fail(&mut self, error: &ValidationError) {
        self.status = TrialStatus::Failed;
        self.error_code = Some(error.code.clone());
        self.error_message = Some(error.message.clone());
    }

    pub fn is_success(&self) -> bool {
        self.status == TrialStatus::Ok
    }
}
