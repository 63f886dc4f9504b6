use crate::geometry::Point;
use serde::{Deserialize, Serialize};

/// Defines what a stimulus looks like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StimulusKind {
    Circle {
        radius: f32,
        color: [u8; 4],
    },
    Rectangle {
        width: f32,
        height: f32,
        color: [u8; 4],
    },
    /// Horizontal line with end ticks, e.g. a number line.
    Line {
        length: f32,
        thickness: f32,
        color: [u8; 4],
    },
    Text {
        content: String,
        size: f32,
        color: [u8; 4],
    },
}

/// A visual object the trial choreography can show, hide and move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    pub id: String,
    pub kind: StimulusKind,
    pub position: Point,
    #[serde(default)]
    pub visible: bool,
}

impl Stimulus {
    pub fn new(id: impl Into<String>, kind: StimulusKind, position: Point) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            visible: false,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, StimulusKind::Text { .. })
    }
}

/// All stimuli of an experiment plus their per-trial state.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub background: [u8; 4],
    stimuli: Vec<Stimulus>,
    initial: Vec<(Point, bool)>,
}

impl Scene {
    pub fn new(background: [u8; 4]) -> Self {
        Self {
            background,
            stimuli: Vec::new(),
            initial: Vec::new(),
        }
    }

    /// Adds a stimulus; its current position and visibility become the
    /// state restored by [`Scene::reset`].
    pub fn add(&mut self, stimulus: Stimulus) {
        self.initial.push((stimulus.position, stimulus.visible));
        self.stimuli.push(stimulus);
    }

    pub fn get(&self, id: &str) -> Option<&Stimulus> {
        self.stimuli.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Stimulus> {
        self.stimuli.iter_mut().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Returns false when no stimulus has this id.
    pub fn set_visible(&mut self, id: &str, visible: bool) -> bool {
        match self.get_mut(id) {
            Some(s) => {
                s.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn move_to(&mut self, id: &str, position: Point) -> bool {
        match self.get_mut(id) {
            Some(s) => {
                s.position = position;
                true
            }
            None => false,
        }
    }

    /// Replaces the content of a text stimulus.
    pub fn set_text(&mut self, id: &str, text: &str) -> bool {
        match self.get_mut(id).map(|s| &mut s.kind) {
            Some(StimulusKind::Text { content, .. }) => {
                content.clear();
                content.push_str(text);
                true
            }
            _ => false,
        }
    }

    pub fn visible(&self) -> impl Iterator<Item = &Stimulus> {
        self.stimuli.iter().filter(|s| s.visible)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stimulus> {
        self.stimuli.iter()
    }

    pub fn reset(&mut self) {
        for (s, (position, visible)) in self.stimuli.iter_mut().zip(&self.initial) {
            s.position = *position;
            s.visible = *visible;
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new([0, 0, 0, 255])
    }
}
