// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer input as the session sees it.

use kurbo::Point;

/// The device a pointer event came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// A mouse or trackpad.
    #[default]
    Mouse,
    /// A finger on a touch screen.
    Touch,
    /// A stylus.
    Pen,
}

/// The button involved in a pointer event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Button {
    /// Left mouse button, or contact for touch and pen.
    #[default]
    Primary,
    /// Right mouse button.
    Secondary,
    /// Middle mouse button.
    Auxiliary,
}

/// A pointer event in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    /// Position in screen pixels.
    pub position: Point,
    /// Button pressed or released; for moves, the button held.
    pub button: Button,
    /// Originating device.
    pub pointer: PointerKind,
    /// Host timestamp in milliseconds.
    pub time_ms: u64,
}

impl PointerEvent {
    /// A primary-button mouse event.
    pub fn mouse(position: impl Into<Point>, time_ms: u64) -> Self {
        Self {
            position: position.into(),
            button: Button::Primary,
            pointer: PointerKind::Mouse,
            time_ms,
        }
    }

    /// A touch contact.
    pub fn touch(position: impl Into<Point>, time_ms: u64) -> Self {
        Self {
            pointer: PointerKind::Touch,
            ..Self::mouse(position, time_ms)
        }
    }

    /// The same event with another button.
    pub fn with_button(self, button: Button) -> Self {
        Self { button, ..self }
    }
}
