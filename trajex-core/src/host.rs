//! Seams to the host: pointer polling, frame presentation and sound.

use crate::geometry::Point;
use crate::stimulus::Scene;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error("pointer input closed")]
    InputClosed,

    #[error("presentation failed: {0}")]
    Present(String),
}

/// One frame's pointer reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub position: Point,
    pub pressed: bool,
}

impl PointerState {
    pub fn pressed_at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            pressed: true,
        }
    }

    pub fn released_at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            pressed: false,
        }
    }
}

/// Mouse or touch source, polled once per frame.
pub trait PointerInput {
    /// Moves to the next frame's reading. Returns false once no more input will arrive.
    fn poll(&mut self) -> bool;
    fn position(&self) -> Point;
    fn is_pressed(&self) -> bool;

    fn state(&self) -> PointerState {
        PointerState {
            position: self.position(),
            pressed: self.is_pressed(),
        }
    }
}

/// Flushes the scene to the screen; called once per frame.
pub trait Presenter {
    fn present(&mut self, scene: &Scene) -> Result<(), HostError>;
}

pub trait SoundPlayer {
    fn play(&mut self, sound: &str);
}

/// Sound player for hosts without audio: logs each request.
#[derive(Debug, Default)]
pub struct LoggingSoundPlayer;

impl SoundPlayer for LoggingSoundPlayer {
    fn play(&mut self, sound: &str) {
        tracing::info!(sound, "play sound");
    }
}
