// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public identifier and classification types: ids, kinds, edit families, and flags.

use core::fmt;

/// Identifier of an annotation, unique within a session.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct AnnotationId(pub u64);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "markup-{}", self.0)
    }
}

/// The kind of an annotation.
///
/// The kind decides which geometry fields are meaningful, which style attributes are accepted
/// (see [`AnnotationKind::style_mask`]), and which interactive edit family drives creation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum AnnotationKind {
    /// Straight arrow from a tail to a head.
    Arrow,
    /// Ellipse inscribed in the annotation frame.
    Circle,
    /// Rectangle outlined with outward bumps.
    Cloud,
    /// Freehand pen stroke.
    Freehand,
    /// Wide translucent freehand stroke.
    Highlight,
    /// Open or closed sequence of straight segments.
    Polyline,
    /// Open or closed vertex sequence outlined with outward bumps.
    Polycloud,
    /// Measured segment between two points carrying a label.
    Dimension,
    /// Free text label.
    Text,
    /// Preset label inside a badge.
    Stamp,
    /// Plain rectangle.
    Rectangle,
    /// Rectangle meant to hold a short remark.
    Callout,
}

/// How a kind is created and edited interactively.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EditFamily {
    /// Drag out a frame from one corner to the other.
    Drag,
    /// Drag out a segment from a first point to a second point.
    Segment,
    /// Capture a freehand stroke while the pointer is held.
    Stroke,
    /// Add one vertex per click until closed or finished.
    MultiClick,
    /// Click to place, then type.
    Text,
}

impl AnnotationKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Arrow,
        Self::Circle,
        Self::Cloud,
        Self::Freehand,
        Self::Highlight,
        Self::Polyline,
        Self::Polycloud,
        Self::Dimension,
        Self::Text,
        Self::Stamp,
        Self::Rectangle,
        Self::Callout,
    ];

    /// Stable lowercase name used in metadata.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Arrow => "arrow",
            Self::Circle => "circle",
            Self::Cloud => "cloud",
            Self::Freehand => "freehand",
            Self::Highlight => "highlight",
            Self::Polyline => "polyline",
            Self::Polycloud => "polycloud",
            Self::Dimension => "dimension",
            Self::Text => "text",
            Self::Stamp => "stamp",
            Self::Rectangle => "rectangle",
            Self::Callout => "callout",
        }
    }

    /// Parse a name produced by [`AnnotationKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The interactive edit family of this kind.
    pub const fn edit_family(self) -> EditFamily {
        match self {
            Self::Circle | Self::Cloud | Self::Rectangle | Self::Callout => EditFamily::Drag,
            Self::Arrow | Self::Dimension => EditFamily::Segment,
            Self::Freehand | Self::Highlight => EditFamily::Stroke,
            Self::Polyline | Self::Polycloud => EditFamily::MultiClick,
            Self::Text | Self::Stamp => EditFamily::Text,
        }
    }

    /// Whether this kind stores an ordered point list.
    ///
    /// Segment kinds keep their two endpoints in the point list as well, but they are not
    /// free-form and rescale through their rotation and length instead.
    pub const fn has_point_list(self) -> bool {
        matches!(
            self,
            Self::Freehand | Self::Highlight | Self::Polyline | Self::Polycloud
        )
    }

    /// Whether this kind keeps exactly two endpoints (tail, head).
    pub const fn is_segment(self) -> bool {
        matches!(self, Self::Arrow | Self::Dimension)
    }

    /// Whether creating or editing this kind goes through the inline text editor.
    pub const fn uses_text_editing(self) -> bool {
        matches!(self, Self::Text | Self::Stamp | Self::Dimension)
    }

    /// Whether the outline of this kind is drawn with cloud bumps.
    pub const fn is_cloud(self) -> bool {
        matches!(self, Self::Cloud | Self::Polycloud)
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags::bitflags! {
    /// Per-annotation interaction flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AnnotationFlags: u8 {
        /// The annotation is the session's current selection.
        const SELECTED = 0b0000_0001;
        /// The annotation is highlighted (pointer-over feedback).
        const HIGHLIGHTED = 0b0000_0010;
        /// Point list holds absolute annotation-space coordinates while a stroke is captured.
        const ABSOLUTE_POINTS = 0b0000_0100;
        /// The annotation is excluded from picking and rendering.
        const HIDDEN = 0b0000_1000;
    }
}

/// Name of the layer an annotation is attached to.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct LayerId(pub String);

impl LayerId {
    /// The layer annotations attach to unless moved elsewhere.
    pub fn default_layer() -> Self {
        Self(String::from("markups"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in AnnotationKind::ALL {
            assert_eq!(AnnotationKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(AnnotationKind::from_name("balloon"), None);
    }

    #[test]
    fn text_editing_kinds() {
        let editing: Vec<_> = AnnotationKind::ALL
            .into_iter()
            .filter(|kind| kind.uses_text_editing())
            .collect();
        assert_eq!(
            editing,
            vec![
                AnnotationKind::Dimension,
                AnnotationKind::Text,
                AnnotationKind::Stamp
            ]
        );
    }

    #[test]
    fn id_display() {
        assert_eq!(AnnotationId(7).to_string(), "markup-7");
    }
}
