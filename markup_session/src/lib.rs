// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Markup Session: the interactive edit state machine for 2D annotations.
//!
//! An [`EditSession`] receives pointer events in screen space and turns them into commands on
//! its [`ActionLog`](markup_history::ActionLog). Each annotation kind is driven by an
//! [`EditMode`] picked from a [`ModeRegistry`]: frames are dragged out, arrows and dimensions
//! run from tail to head, strokes are captured and simplified, polylines take one click per
//! vertex, and text opens an inline editor through the [`TextInput`] collaborator.
//!
//! Every gesture runs inside one action group, so it undoes as one step. A gesture that ends
//! too small, or is interrupted by [`cancel`](EditSession::cancel), navigation, or a save,
//! rolls back without leaving history behind.
//!
//! ```rust
//! use markup_model::{AffineViewport, AnnotationKind};
//! use markup_session::{EditSession, PointerEvent, SessionConfig, SessionState};
//!
//! let mut session = EditSession::new(AffineViewport::identity(), SessionConfig::default());
//! session.set_tool(Some(AnnotationKind::Rectangle));
//! session.pointer_down(PointerEvent::mouse((10.0, 10.0), 0));
//! session.pointer_move(PointerEvent::mouse((60.0, 40.0), 16));
//! session.pointer_up(PointerEvent::mouse((60.0, 40.0), 32));
//!
//! assert_eq!(session.state(), SessionState::Idle);
//! assert_eq!(session.annotations().len(), 1);
//! assert!(session.selected().is_some());
//!
//! session.undo();
//! assert!(session.annotations().is_empty());
//! ```
//!
//! Input arbitration ([`InputArbitration`]) ignores the synthetic mouse events some platforms
//! send right after a touch, and [`ClickCounter`] detects double-clicks from raw presses.
//! Every tunable lives in [`SessionConfig`], which loads from JSON.

mod arbitration;
mod click;
mod config;
mod event;
mod mode;
mod session;
mod text;

pub use arbitration::InputArbitration;
pub use click::{ClickCounter, ClickResult, Press};
pub use config::{ConfigError, SessionConfig};
pub use event::{Button, PointerEvent, PointerKind};
pub use mode::{
    DragMode, EditContext, EditMode, Gesture, ModeOutcome, ModeRegistry, MultiClickMode,
    SegmentMode, StrokeMode, TextMode,
};
pub use session::{EditSession, SessionState};
pub use text::{HeadlessTextInput, TextAccepted, TextInput};
