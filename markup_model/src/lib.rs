// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Markup Model: the geometry and metadata of interactive 2D annotations.
//!
//! This crate holds the per-annotation state that every other Markup crate reads or mutates:
//! an anchor, extents, a rotation, a style restricted to the attributes its kind accepts, and
//! (for strokes and polylines) an anchor-relative point list. Setters always leave position,
//! extents, and points describing the same object.
//!
//! ## Kinds
//!
//! [`AnnotationKind`] enumerates the twelve kinds. Each maps to an [`EditFamily`], which the
//! session crate uses to pick an interactive edit mode, and to a [`KindStrategy`] returned by
//! [`strategy_for`], which carries the per-kind capability set (geometry update, restyle,
//! re-parent, metadata).
//!
//! ## Coordinates
//!
//! Annotation space is the host-independent frame annotations live in. A
//! [`CoordinateTransform`] maps it to screen pixels and, for hit recovery, to scene points.
//! [`AffineViewport`] is a ready-made implementation for flat 2D views.
//!
//! ## Metadata
//!
//! [`Annotation::to_attributes`] and [`Annotation::from_attributes`] convert to and from a
//! flat string map, the shape used by persistence.
//!
//! ## Example
//!
//! ```rust
//! use markup_model::{Annotation, AnnotationId, AnnotationKind, Segment};
//!
//! let mut arrow = Annotation::new(AnnotationId(1), AnnotationKind::Arrow);
//! arrow.set_segment(Segment::new((0.0, 0.0), (100.0, -50.0)));
//! assert!((arrow.size().width - 111.803).abs() < 1e-3);
//!
//! let back = Annotation::from_attributes(&arrow.to_attributes()).unwrap();
//! assert!(back.approx_eq(&arrow, 1e-4));
//! ```

mod attributes;
mod geometry;
mod strategy;
mod style;
mod transform;
mod types;

pub use attributes::{
    AttributeError, AttributeMap, keys, number_attr, point_attr, points_attr, required,
    size_attr,
};
pub use geometry::{Annotation, EPSILON, Frame, MIN_EXTENT, PointFrame, Segment};
pub use strategy::{GeometryUpdate, KindStrategy, strategy_for};
pub use style::{Rgba, Style, StyleAttr, StyleMask, StyleValue};
pub use transform::{AffineViewport, CoordinateTransform, ScenePoint};
pub use types::{AnnotationFlags, AnnotationId, AnnotationKind, EditFamily, LayerId};
