use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Stable failure kinds callers can branch on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    TooSlow,
    TooFast,
    Timeout,
    WrongDirection,
    TooManyCurves,
    OutOfRegion,
    InvalidLocation,
    FingerLifted,
    StartWrongDirection,
    Custom(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::TooSlow => "too_slow",
            ErrorCode::TooFast => "too_fast",
            ErrorCode::Timeout => "timeout",
            ErrorCode::WrongDirection => "wrong_direction",
            ErrorCode::TooManyCurves => "too_many_curves",
            ErrorCode::OutOfRegion => "out_of_region",
            ErrorCode::InvalidLocation => "invalid_location",
            ErrorCode::FingerLifted => "finger_lifted",
            ErrorCode::StartWrongDirection => "start_wrong_direction",
            ErrorCode::Custom(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// Why a sample was rejected, with the numbers feedback needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub message: String,
    pub args: BTreeMap<String, f64>,
}

impl ValidationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            args: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, name: &str, value: f64) -> Self {
        self.args.insert(name.to_string(), value);
        self
    }

    pub fn arg(&self, name: &str) -> Option<f64> {
        self.args.get(name).copied()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        for (name, value) in &self.args {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Programming mistakes in how an object is driven.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UsageError {
    #[error("{0} was already set")]
    AlreadySet(&'static str),
}

/// A field that may be assigned once per lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOnce<T> {
    name: &'static str,
    value: Option<T>,
}

impl<T> WriteOnce<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, value: None }
    }

    pub fn set(&mut self, value: T) -> Result<(), UsageError> {
        if self.value.is_some() {
            return Err(UsageError::AlreadySet(self.name));
        }
        self.value = Some(value);
        Ok(())
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }
}

impl<T: Serialize> Serialize for WriteOnce<T> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_strings() {
        assert_eq!(ErrorCode::TooSlow.to_string(), "too_slow");
        assert_eq!(ErrorCode::OutOfRegion.as_str(), "out_of_region");
        assert_eq!(ErrorCode::Custom("late_start".into()).as_str(), "late_start");
    }

    #[test]
    fn error_carries_arguments() {
        let err = ValidationError::new(ErrorCode::TooSlow, "moving too slowly").with_arg("speed", 0.5);
        assert_eq!(err.arg("speed"), Some(0.5));
        assert_eq!(err.to_string(), "too_slow: moving too slowly speed=0.5");
    }

    #[test]
    fn write_once_rejects_second_set() {
        let mut field: WriteOnce<f64> = WriteOnce::new("response");
        assert!(!field.is_set());
        field.set(3.0).unwrap();
        assert_eq!(field.set(4.0), Err(UsageError::AlreadySet("response")));
        assert_eq!(field.get(), Some(&3.0));
    }
}
