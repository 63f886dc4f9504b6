//! Named points in trial time, optionally shifted by an offset.
//!
//! Text form is `"<id>"` or `"<id> + <seconds>"`; the literal `none`
//! denotes the absence of an event.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Add;

pub const TRIAL_INITIALIZED: &str = "TRIAL_INITIALIZED";
pub const TRIAL_STARTED: &str = "TRIAL_STARTED";
pub const TRIAL_SUCCEEDED: &str = "TRIAL_SUCCEEDED";
pub const TRIAL_FAILED: &str = "TRIAL_FAILED";
pub const TRIAL_ENDED: &str = "TRIAL_ENDED";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventError {
    #[error("invalid event id {0:?}")]
    InvalidId(String),

    #[error("invalid event offset {0:?}")]
    InvalidOffset(String),

    #[error("unsupported operator {0:?} in event (only '+' is allowed)")]
    UnsupportedOperator(String),

    #[error("event offset must be non-negative, got {0}")]
    NegativeOffset(f64),

    #[error("operations cannot be registered once trials have started")]
    RegistrationClosed,
}

/// Equality and hashing consider the id only.
#[derive(Debug, Clone)]
pub struct Event {
    id: String,
    offset: f64,
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn validate_id(id: &str) -> Result<(), EventError> {
    let mut chars = id.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return Err(EventError::InvalidId(id.to_string())),
    }
    if chars.all(is_id_char) {
        Ok(())
    } else {
        Err(EventError::InvalidId(id.to_string()))
    }
}

fn validate_offset(offset: f64) -> Result<f64, EventError> {
    if !offset.is_finite() {
        return Err(EventError::InvalidOffset(offset.to_string()));
    }
    if offset < 0.0 {
        return Err(EventError::NegativeOffset(offset));
    }
    Ok(offset)
}

impl Event {
    pub fn new(id: &str, offset: f64) -> Result<Self, EventError> {
        validate_id(id)?;
        Ok(Self {
            id: id.to_string(),
            offset: validate_offset(offset)?,
        })
    }

    pub fn named(id: &str) -> Result<Self, EventError> {
        Self::new(id, 0.0)
    }

    fn builtin(id: &str) -> Self {
        Self {
            id: id.to_string(),
            offset: 0.0,
        }
    }

    pub fn trial_initialized() -> Self {
        Self::builtin(TRIAL_INITIALIZED)
    }

    pub fn trial_started() -> Self {
        Self::builtin(TRIAL_STARTED)
    }

    pub fn trial_succeeded() -> Self {
        Self::builtin(TRIAL_SUCCEEDED)
    }

    pub fn trial_failed() -> Self {
        Self::builtin(TRIAL_FAILED)
    }

    pub fn trial_ended() -> Self {
        Self::builtin(TRIAL_ENDED)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Seconds after the base event at which this event occurs.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Parses the text form; `Ok(None)` for `none`.
    pub fn parse(text: &str) -> Result<Option<Event>, EventError> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("none") {
            return Ok(None);
        }

        let id_end = text.find(|c: char| !is_id_char(c)).unwrap_or(text.len());
        let (id, rest) = text.split_at(id_end);
        validate_id(id)?;

        let rest = rest.trim_start();
        let Some(op) = rest.chars().next() else {
            return Ok(Some(Self::builtin(id)));
        };
        if op != '+' {
            return Err(EventError::UnsupportedOperator(op.to_string()));
        }

        let offset_text = rest[op.len_utf8()..].trim();
        let offset: f64 = offset_text
            .parse()
            .map_err(|_| EventError::InvalidOffset(offset_text.to_string()))?;
        Ok(Some(Self {
            id: id.to_string(),
            offset: validate_offset(offset)?,
        }))
    }
}

impl Add<f64> for Event {
    type Output = Result<Event, EventError>;

    fn add(self, secs: f64) -> Self::Output {
        let offset = validate_offset(self.offset + secs)?;
        Ok(Event {
            id: self.id,
            offset,
        })
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset == 0.0 {
            f.write_str(&self.id)
        } else {
            write!(f, "{} + {}", self.id, self.offset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_then_parse_round_trips() {
        let ev = Event::new("a", 2.5).unwrap();
        let parsed = Event::parse(&ev.to_string()).unwrap().unwrap();
        assert_eq!(parsed.id(), "a");
        assert_eq!(parsed.offset(), 2.5);
    }

    #[test]
    fn parse_is_whitespace_insensitive() {
        let ev = Event::parse("  TRIAL_STARTED+0.3 ").unwrap().unwrap();
        assert_eq!(ev.id(), TRIAL_STARTED);
        assert_eq!(ev.offset(), 0.3);

        let ev = Event::parse("stimulus_onset").unwrap().unwrap();
        assert_eq!(ev.offset(), 0.0);
    }

    #[test]
    fn none_in_any_case_is_no_event() {
        assert_eq!(Event::parse("none").unwrap(), None);
        assert_eq!(Event::parse("  NoNe\t").unwrap(), None);
    }

    #[test]
    fn rejects_bad_offsets_and_operators() {
        assert_eq!(
            Event::parse("a + -1"),
            Err(EventError::NegativeOffset(-1.0))
        );
        assert!(matches!(
            Event::parse("a + soon"),
            Err(EventError::InvalidOffset(_))
        ));
        assert!(matches!(
            Event::parse("a - 1"),
            Err(EventError::UnsupportedOperator(op)) if op == "-"
        ));
        assert!(matches!(Event::parse("9lives"), Err(EventError::InvalidId(_))));
        assert!(matches!(Event::parse(""), Err(EventError::InvalidId(_))));
    }

    #[test]
    fn arithmetic_keeps_offset_non_negative() {
        let ev = Event::trial_started();
        let later = (ev.clone() + 0.1).unwrap();
        assert_eq!(later.offset(), 0.1);
        let back = (later + 0.2).unwrap();
        assert!((back.offset() - 0.3).abs() < 1e-12);
        assert_eq!(ev + -0.5, Err(EventError::NegativeOffset(-0.5)));
        assert!(Event::new("x", -1.0).is_err());
    }

    #[test]
    fn equality_is_by_id() {
        let a = Event::new("go", 0.0).unwrap();
        let b = Event::new("go", 1.0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, Event::named("stop").unwrap());
    }
}
