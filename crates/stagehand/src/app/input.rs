use winit::event::{ElementState, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::rendering::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    KeyDown,
    KeyUp,
    KeyTyped,
    PointerDown,
    PointerUp,
    PointerClick,
    PointerEnter,
    PointerExit,
    PointerMove,
    PointerDrag,
    Wheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Left => Self::Left,
            winit::event::MouseButton::Right => Self::Right,
            winit::event::MouseButton::Middle => Self::Middle,
            winit::event::MouseButton::Back => Self::Other(3),
            winit::event::MouseButton::Forward => Self::Other(4),
            winit::event::MouseButton::Other(code) => Self::Other(code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    /// `None` for keys the platform could not identify.
    pub code: Option<KeyCode>,
    pub repeat: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub position: Point,
    pub button: Option<MouseButton>,
}

/// Wheel movement in lines. Positive `delta_y` scrolls up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub delta_x: f32,
    pub delta_y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyInput),
    KeyUp(KeyInput),
    KeyTyped(String),
    PointerDown(PointerInput),
    PointerUp(PointerInput),
    PointerClick(PointerInput),
    PointerEnter(PointerInput),
    PointerExit(PointerInput),
    PointerMove(PointerInput),
    PointerDrag(PointerInput),
    Wheel(WheelInput),
}

impl InputEvent {
    pub fn kind(&self) -> InputKind {
        match self {
            Self::KeyDown(_) => InputKind::KeyDown,
            Self::KeyUp(_) => InputKind::KeyUp,
            Self::KeyTyped(_) => InputKind::KeyTyped,
            Self::PointerDown(_) => InputKind::PointerDown,
            Self::PointerUp(_) => InputKind::PointerUp,
            Self::PointerClick(_) => InputKind::PointerClick,
            Self::PointerEnter(_) => InputKind::PointerEnter,
            Self::PointerExit(_) => InputKind::PointerExit,
            Self::PointerMove(_) => InputKind::PointerMove,
            Self::PointerDrag(_) => InputKind::PointerDrag,
            Self::Wheel(_) => InputKind::Wheel,
        }
    }

    pub fn pointer(&self) -> Option<&PointerInput> {
        match self {
            Self::PointerDown(pointer)
            | Self::PointerUp(pointer)
            | Self::PointerClick(pointer)
            | Self::PointerEnter(pointer)
            | Self::PointerExit(pointer)
            | Self::PointerMove(pointer)
            | Self::PointerDrag(pointer) => Some(pointer),
            Self::KeyDown(_) | Self::KeyUp(_) | Self::KeyTyped(_) | Self::Wheel(_) => None,
        }
    }

    pub fn position(&self) -> Option<Point> {
        self.pointer().map(|pointer| pointer.position)
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer().is_some()
    }

    /// Same event at `position`. Non-pointer events are returned unchanged.
    pub fn with_position(self, position: Point) -> Self {
        let moved = |pointer: PointerInput| PointerInput {
            position,
            ..pointer
        };
        match self {
            Self::PointerDown(pointer) => Self::PointerDown(moved(pointer)),
            Self::PointerUp(pointer) => Self::PointerUp(moved(pointer)),
            Self::PointerClick(pointer) => Self::PointerClick(moved(pointer)),
            Self::PointerEnter(pointer) => Self::PointerEnter(moved(pointer)),
            Self::PointerExit(pointer) => Self::PointerExit(moved(pointer)),
            Self::PointerMove(pointer) => Self::PointerMove(moved(pointer)),
            Self::PointerDrag(pointer) => Self::PointerDrag(moved(pointer)),
            other => other,
        }
    }

    pub fn key_code(&self) -> Option<KeyCode> {
        match self {
            Self::KeyDown(key) | Self::KeyUp(key) => key.code,
            _ => None,
        }
    }
}

/// Turns window events into [`InputEvent`]s in physical pixel coordinates.
///
/// A press followed by a release of the same button with no cursor motion in
/// between also yields a `PointerClick` after the `PointerUp`.
#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    pending: Vec<InputEvent>,
    cursor: Option<Point>,
    entering: bool,
    held_buttons: Vec<MouseButton>,
    click_armed: Option<MouseButton>,
}

impl InputCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn handle_cursor_moved(&mut self, x: f64, y: f64) {
        let position = Point::new(x, y);
        if self.cursor == Some(position) && !self.entering {
            return;
        }
        self.cursor = Some(position);
        self.click_armed = None;

        if self.entering {
            self.entering = false;
            self.pending.push(InputEvent::PointerEnter(PointerInput {
                position,
                button: None,
            }));
        }

        let event = match self.held_buttons.first().copied() {
            Some(button) => InputEvent::PointerDrag(PointerInput {
                position,
                button: Some(button),
            }),
            None => InputEvent::PointerMove(PointerInput {
                position,
                button: None,
            }),
        };
        self.pending.push(event);
    }

    /// Enter carries no position, so the event is emitted with the next motion.
    pub(crate) fn handle_cursor_entered(&mut self) {
        self.entering = true;
    }

    pub(crate) fn handle_cursor_left(&mut self) {
        self.entering = false;
        self.click_armed = None;
        if let Some(position) = self.cursor.take() {
            self.pending.push(InputEvent::PointerExit(PointerInput {
                position,
                button: None,
            }));
        }
    }

    /// A release outside the window still clears the held button; only the
    /// emitted events need a known cursor position.
    pub(crate) fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        let pointer = self.cursor.map(|position| PointerInput {
            position,
            button: Some(button),
        });

        match state {
            ElementState::Pressed => {
                let Some(pointer) = pointer else {
                    return;
                };
                if !self.held_buttons.contains(&button) {
                    self.held_buttons.push(button);
                }
                self.click_armed = Some(button);
                self.pending.push(InputEvent::PointerDown(pointer));
            }
            ElementState::Released => {
                self.held_buttons.retain(|held| *held != button);
                let clicked = self.click_armed == Some(button);
                if clicked {
                    self.click_armed = None;
                }
                if let Some(pointer) = pointer {
                    self.pending.push(InputEvent::PointerUp(pointer));
                    if clicked {
                        self.pending.push(InputEvent::PointerClick(pointer));
                    }
                }
            }
        }
    }

    pub(crate) fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let (delta_x, delta_y) = lines_from_scroll_delta(delta);
        if delta_x == 0.0 && delta_y == 0.0 {
            return;
        }
        self.pending
            .push(InputEvent::Wheel(WheelInput { delta_x, delta_y }));
    }

    pub(crate) fn handle_key(
        &mut self,
        physical_key: PhysicalKey,
        state: ElementState,
        repeat: bool,
        text: Option<&str>,
    ) {
        let code = match physical_key {
            PhysicalKey::Code(code) => Some(code),
            PhysicalKey::Unidentified(_) => None,
        };
        let key = KeyInput { code, repeat };
        match state {
            ElementState::Pressed => {
                self.pending.push(InputEvent::KeyDown(key));
                if let Some(text) = text.filter(|text| !text.is_empty()) {
                    self.pending.push(InputEvent::KeyTyped(text.to_owned()));
                }
            }
            ElementState::Released => self.pending.push(InputEvent::KeyUp(key)),
        }
    }

    pub(crate) fn take_pending(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.pending)
    }
}

/// Pixel deltas have no line height to divide by, so they become one line
/// step in their direction.
fn lines_from_scroll_delta(delta: MouseScrollDelta) -> (f32, f32) {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => (x, y),
        MouseScrollDelta::PixelDelta(position) => (step(position.x), step(position.y)),
    }
}

fn step(value: f64) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
