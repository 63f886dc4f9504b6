use trajex_core::{Point, PointerState};
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, Touch, TouchPhase};

/// Pointer state assembled from window events.
///
/// Mouse and touch feed the same state; a touch only counts while the
/// finger that started it is down.
#[derive(Debug, Default)]
pub struct PointerTracker {
    state: PointerState,
    finger: Option<u64>,
    size: (u32, u32),
}

impl PointerTracker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..Self::default()
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    /// Window pixels to scene coordinates (origin at the centre, y up).
    fn to_scene(&self, pos: PhysicalPosition<f64>) -> Point {
        Point::new(
            pos.x - self.size.0 as f64 / 2.0,
            self.size.1 as f64 / 2.0 - pos.y,
        )
    }

    pub fn cursor_moved(&mut self, pos: PhysicalPosition<f64>) {
        if self.finger.is_none() {
            self.state.position = self.to_scene(pos);
        }
    }

    pub fn mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left && self.finger.is_none() {
            self.state.pressed = state.is_pressed();
        }
    }

    pub fn touch(&mut self, touch: &Touch) {
        match touch.phase {
            TouchPhase::Started if self.finger.is_none() => {
                self.finger = Some(touch.id);
                self.state = PointerState {
                    position: self.to_scene(touch.location),
                    pressed: true,
                };
            }
            TouchPhase::Moved if self.finger == Some(touch.id) => {
                self.state.position = self.to_scene(touch.location);
            }
            TouchPhase::Ended | TouchPhase::Cancelled if self.finger == Some(touch.id) => {
                self.finger = None;
                self.state.position = self.to_scene(touch.location);
                self.state.pressed = false;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_pixels_map_to_centred_coordinates() {
        let mut p = PointerTracker::new(800, 600);
        p.cursor_moved(PhysicalPosition::new(400.0, 300.0));
        assert_eq!(p.state().position, Point::ORIGIN);
        p.cursor_moved(PhysicalPosition::new(500.0, 100.0));
        assert_eq!(p.state().position, Point::new(100.0, 200.0));
    }

    #[test]
    fn left_button_presses() {
        let mut p = PointerTracker::new(100, 100);
        p.mouse_input(MouseButton::Right, ElementState::Pressed);
        assert!(!p.state().pressed);
        p.mouse_input(MouseButton::Left, ElementState::Pressed);
        assert!(p.state().pressed);
        p.mouse_input(MouseButton::Left, ElementState::Released);
        assert!(!p.state().pressed);
    }
}
