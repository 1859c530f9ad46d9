//! Pointer and keyboard state for the canvas.
//!
//! Positions are canvas pixels; conversion to page millimeters happens in the
//! canvas controller.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Modifiers that extend a selection instead of replacing it.
    pub fn toggles_selection(&self) -> bool {
        self.shift || self.command()
    }
}

/// Pointer event delivered by the host toolkit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    /// Pointer left the canvas.
    Leave,
}

/// Keyboard event. Keys use DOM-style names ("Delete", "Escape", "a").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

const DOUBLE_CLICK_MS: u128 = 500;
const DOUBLE_CLICK_PX: f64 = 5.0;

/// Last primary click, for double-click detection.
#[derive(Debug, Clone, Copy)]
struct Click {
    at: Instant,
    position: Point,
}

/// Pointer state carried between canvas events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Latest pointer position in canvas pixels.
    pub pointer_position: Point,
    /// Modifiers of the latest event.
    pub modifiers: Modifiers,
    /// Where the primary button went down, while it is held.
    pub drag_start: Option<Point>,
    /// An editable text field (sidebar input, in-place editor) has focus.
    /// Canvas shortcuts are suspended while set.
    pub text_focus: bool,
    last_click: Option<Click>,
    double_click: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a pointer event.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        self.double_click = false;
        match *event {
            PointerEvent::Down { position, button } => {
                self.pointer_position = position;
                if button == MouseButton::Left {
                    self.double_click = self.register_click(position);
                    self.drag_start = Some(position);
                }
            }
            PointerEvent::Up { position, button } => {
                self.pointer_position = position;
                if button == MouseButton::Left {
                    self.drag_start = None;
                }
            }
            PointerEvent::Move { position } => self.pointer_position = position,
            PointerEvent::Leave => self.drag_start = None,
        }
    }

    /// Record a primary click; true when it completes a double-click.
    fn register_click(&mut self, position: Point) -> bool {
        let now = Instant::now();
        let paired = self.last_click.is_some_and(|last| {
            now.duration_since(last.at).as_millis() < DOUBLE_CLICK_MS
                && position.distance(last.position) < DOUBLE_CLICK_PX
        });
        // A third click starts a new sequence.
        self.last_click = if paired {
            None
        } else {
            Some(Click { at: now, position })
        };
        paired
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    /// Check if the last pointer-down completed a double-click.
    pub fn is_double_click(&self) -> bool {
        self.double_click
    }

    /// Pointer travel since the primary button went down.
    pub fn drag_delta(&self) -> Option<Vec2> {
        self.drag_start.map(|start| self.pointer_position - start)
    }

    /// Check whether canvas shortcuts may fire.
    pub fn shortcuts_enabled(&self) -> bool {
        !self.text_focus
    }

    /// Forget any drag or click sequence. Text focus is kept.
    pub fn reset(&mut self) {
        *self = Self {
            text_focus: self.text_focus,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    #[test]
    fn test_drag_delta_while_held() {
        let mut input = InputState::new();
        assert_eq!(input.drag_delta(), None);

        input.handle_pointer_event(&down(100.0, 100.0));
        input.handle_pointer_event(&PointerEvent::Move {
            position: Point::new(150.0, 120.0),
        });
        assert_eq!(input.drag_delta(), Some(Vec2::new(50.0, 20.0)));

        input.handle_pointer_event(&up(150.0, 120.0));
        assert_eq!(input.drag_delta(), None);
    }

    #[test]
    fn test_secondary_button_does_not_drag() {
        let mut input = InputState::new();
        input.handle_pointer_event(&PointerEvent::Down {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Right,
        });
        assert!(input.drag_start.is_none());
        assert!(!input.is_double_click());
    }

    #[test]
    fn test_leave_ends_drag() {
        let mut input = InputState::new();
        input.handle_pointer_event(&down(10.0, 10.0));
        input.handle_pointer_event(&PointerEvent::Leave);
        assert_eq!(input.drag_delta(), None);
    }

    #[test]
    fn test_double_click_detection() {
        let mut input = InputState::new();
        input.handle_pointer_event(&down(100.0, 100.0));
        assert!(!input.is_double_click());
        input.handle_pointer_event(&up(100.0, 100.0));

        input.handle_pointer_event(&down(101.0, 100.0));
        assert!(input.is_double_click());

        input.handle_pointer_event(&up(101.0, 100.0));
        assert!(!input.is_double_click());

        input.handle_pointer_event(&down(101.0, 100.0));
        assert!(!input.is_double_click());
    }

    #[test]
    fn test_double_click_too_far() {
        let mut input = InputState::new();
        input.handle_pointer_event(&down(100.0, 100.0));
        input.handle_pointer_event(&up(100.0, 100.0));
        input.handle_pointer_event(&down(200.0, 200.0));
        assert!(!input.is_double_click());
    }

    #[test]
    fn test_text_focus_blocks_shortcuts() {
        let mut input = InputState::new();
        assert!(input.shortcuts_enabled());
        input.text_focus = true;
        input.handle_pointer_event(&down(1.0, 1.0));
        assert!(!input.shortcuts_enabled());
        input.reset();
        assert!(input.text_focus);
        assert!(input.drag_start.is_none());
    }

    #[test]
    fn test_command_modifier() {
        assert!(Modifiers::ctrl().command());
        assert!(Modifiers { meta: true, ..Modifiers::NONE }.toggles_selection());
        assert!(Modifiers::shift().toggles_selection());
        assert!(!Modifiers::NONE.toggles_selection());
    }
}
