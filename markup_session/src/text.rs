// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The inline text editor collaborator.

use core::fmt;

use kurbo::{Point, Size};
use markup_model::{AnnotationId, Style};

/// An inline editable text surface owned by the host.
///
/// The session opens it over a text, stamp, or dimension annotation and closes it when the
/// edit ends for any reason. The host reports the result back through
/// [`EditSession::accept_text`](crate::EditSession::accept_text).
pub trait TextInput: fmt::Debug {
    /// Show the editor over the screen-space quad of `id`, prefilled with `text`.
    fn open(&mut self, id: AnnotationId, quad: [Point; 4], text: Option<&str>);

    /// Hide the editor, discarding anything typed.
    fn close(&mut self);

    /// Whether the editor is showing.
    fn is_open(&self) -> bool;
}

/// The result of an inline edit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextAccepted {
    /// Final text. Empty (or whitespace only) text deletes the annotation.
    pub text: String,
    /// Size the editor autosized to, in annotation units.
    pub size: Option<Size>,
    /// Style chosen in the editor.
    pub style: Option<Style>,
}

impl TextAccepted {
    /// Accept `text` with the current size and style.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Whether accepting this should delete the annotation.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A [`TextInput`] that only tracks whether it is open.
///
/// Useful for headless hosts and tests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeadlessTextInput {
    open: Option<AnnotationId>,
}

impl HeadlessTextInput {
    /// The annotation the editor is open over.
    pub fn target(&self) -> Option<AnnotationId> {
        self.open
    }
}

impl TextInput for HeadlessTextInput {
    fn open(&mut self, id: AnnotationId, _quad: [Point; 4], _text: Option<&str>) {
        self.open = Some(id);
    }

    fn close(&mut self) {
        self.open = None;
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }
}
