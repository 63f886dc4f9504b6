//! Gate at the beginning of each trial.
//!
//! The subject touches inside the start area, then leaves it. Leaving through
//! the configured edge starts the movement phase; leaving elsewhere is an
//! error, and lifting the finger before leaving aborts the trial.

use serde::{Deserialize, Serialize};
use trajex_core::{Edge, HostError, Point, PointerInput, Rectangle, Region};

/// Which edge the finger must leave the start area through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitArea {
    Up,
    Down,
    Left,
    Right,
    #[default]
    Any,
}

impl ExitArea {
    pub fn allows(self, edge: Option<Edge>) -> bool {
        match self {
            ExitArea::Any => true,
            ExitArea::Up => edge == Some(Edge::Up),
            ExitArea::Down => edge == Some(Edge::Down),
            ExitArea::Left => edge == Some(Edge::Left),
            ExitArea::Right => edge == Some(Edge::Right),
        }
    }

    pub fn parse(text: &str) -> Option<ExitArea> {
        Some(match text.trim().to_ascii_lowercase().as_str() {
            "up" | "top" => ExitArea::Up,
            "down" | "bottom" => ExitArea::Down,
            "left" => ExitArea::Left,
            "right" => ExitArea::Right,
            "any" | "none" | "" => ExitArea::Any,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPointState {
    /// Touched inside the area, waiting for the finger to leave it.
    Init,
    /// Not touched yet.
    MouseUp,
    /// Left through the allowed edge.
    Start,
    Error,
    Aborted,
}

impl StartPointState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StartPointState::Start | StartPointState::Error | StartPointState::Aborted)
    }
}

#[derive(Debug, Clone)]
pub struct StartPoint {
    area: Rectangle,
    pub exit_area: ExitArea,
    state: StartPointState,
}

impl StartPoint {
    pub fn new(area: Rectangle, exit_area: ExitArea) -> Self {
        Self {
            area,
            exit_area,
            state: StartPointState::MouseUp,
        }
    }

    pub fn area(&self) -> &Rectangle {
        &self.area
    }

    pub fn state(&self) -> StartPointState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = StartPointState::MouseUp;
    }

    /// Feeds one frame's pointer reading. Terminal states are sticky until `reset`.
    pub fn update(&mut self, position: Point, pressed: bool) -> StartPointState {
        use StartPointState::*;
        self.state = match self.state {
            MouseUp if pressed && self.area.contains(position) => Init,
            MouseUp => MouseUp,
            Init if !pressed => Aborted,
            Init if self.area.contains(position) => Init,
            Init if self.exit_area.allows(self.area.edge_beyond(position)) => Start,
            Init => Error,
            terminal => terminal,
        };
        self.state
    }

    /// Position-only update for a finger known to be down.
    pub fn check_xy(&mut self, position: Point) -> StartPointState {
        self.update(position, true)
    }

    /// Polls `input` until a terminal state is reached, calling `on_frame`
    /// after every reading.
    pub fn wait_until_exit<I, E>(
        &mut self,
        input: &mut I,
        mut on_frame: impl FnMut(&Self) -> Result<(), E>,
    ) -> Result<StartPointState, E>
    where
        I: PointerInput + ?Sized,
        E: From<HostError>,
    {
        self.reset();
        loop {
            if !input.poll() {
                return Err(HostError::InputClosed.into());
            }
            let state = self.update(input.position(), input.is_pressed());
            on_frame(self)?;
            if state.is_terminal() {
                tracing::debug!(?state, exit_area = ?self.exit_area, "start point resolved");
                return Ok(state);
            }
        }
    }
}
