// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-kind behavior behind a single capability set.
//!
//! Each kind gets a [`KindStrategy`]: how to apply a geometry update, restyle, re-parent,
//! rotate, resize, move, and read or write its metadata. [`strategy_for`] is the
//! kind→strategy registry; the session crate mirrors it with a kind→edit-mode registry.

use kurbo::Point;

use crate::attributes::{
    AttributeMap, format_point, format_points, keys, point_attr, points_attr, read_common,
    size_attr, write_common,
};
use crate::{
    Annotation, AnnotationKind, AttributeError, EditFamily, Frame, LayerId, PointFrame, Segment,
    StyleAttr, StyleValue,
};

/// A kind-specific geometry update.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryUpdate {
    /// Anchor and extents.
    Frame(Frame),
    /// Tail and head of a segment kind.
    Segment(Segment),
    /// Anchor, extents, and anchor-relative points.
    Points(PointFrame),
}

/// The capability set every kind implements.
pub trait KindStrategy: Sync {
    /// Interactive edit family.
    fn edit_family(&self) -> EditFamily;

    /// Apply a geometry update. Returns `false` if this kind cannot take `update`.
    fn set(&self, annotation: &mut Annotation, update: &GeometryUpdate) -> bool;

    /// Move the anchor.
    fn set_position(&self, annotation: &mut Annotation, position: Point) {
        annotation.set_position(position);
    }

    /// Set anchor and extents.
    fn set_size(&self, annotation: &mut Annotation, position: Point, width: f64, height: f64) {
        annotation.set_size(position, width, height);
    }

    /// Set rotation in radians.
    fn set_rotation(&self, annotation: &mut Annotation, angle: f64) {
        annotation.set_rotation(angle);
    }

    /// Set one style attribute.
    fn update_style(&self, annotation: &mut Annotation, attr: StyleAttr, value: StyleValue) -> bool {
        annotation.update_style(attr, value)
    }

    /// Attach to another layer.
    fn set_parent(&self, annotation: &mut Annotation, layer: LayerId) {
        annotation.set_layer(layer);
    }

    /// Write the flat attribute map.
    fn metadata(&self, annotation: &Annotation) -> AttributeMap {
        let mut map = AttributeMap::new();
        write_common(annotation, &mut map);
        map
    }

    /// Read the flat attribute map.
    fn set_metadata(
        &self,
        annotation: &mut Annotation,
        map: &AttributeMap,
    ) -> Result<(), AttributeError> {
        read_common(annotation, map)
    }
}

/// Circle, cloud, rectangle, and callout: a plain frame.
#[derive(Debug)]
struct FrameStrategy;

impl KindStrategy for FrameStrategy {
    fn edit_family(&self) -> EditFamily {
        EditFamily::Drag
    }

    fn set(&self, annotation: &mut Annotation, update: &GeometryUpdate) -> bool {
        match update {
            GeometryUpdate::Frame(frame) => {
                self.set_size(
                    annotation,
                    frame.position,
                    frame.size.width,
                    frame.size.height,
                );
                true
            }
            _ => false,
        }
    }

    fn metadata(&self, annotation: &Annotation) -> AttributeMap {
        let mut map = AttributeMap::new();
        write_common(annotation, &mut map);
        if let Some(text) = annotation.text() {
            map.insert(keys::TEXT.into(), text.into());
        }
        map
    }

    fn set_metadata(
        &self,
        annotation: &mut Annotation,
        map: &AttributeMap,
    ) -> Result<(), AttributeError> {
        read_common(annotation, map)?;
        annotation.set_text(map.get(keys::TEXT).cloned());
        Ok(())
    }
}

/// Arrow and dimension: a tail and a head.
#[derive(Debug)]
struct SegmentStrategy;

impl KindStrategy for SegmentStrategy {
    fn edit_family(&self) -> EditFamily {
        EditFamily::Segment
    }

    fn set(&self, annotation: &mut Annotation, update: &GeometryUpdate) -> bool {
        match update {
            GeometryUpdate::Segment(segment) => {
                annotation.set_segment(*segment);
                true
            }
            _ => false,
        }
    }

    fn metadata(&self, annotation: &Annotation) -> AttributeMap {
        let mut map = AttributeMap::new();
        write_common(annotation, &mut map);
        if let Some(segment) = annotation.segment() {
            map.insert(keys::TAIL.into(), format_point(segment.tail));
            map.insert(keys::HEAD.into(), format_point(segment.head));
        }
        if let Some(text) = annotation.text() {
            map.insert(keys::TEXT.into(), text.into());
        }
        map
    }

    fn set_metadata(
        &self,
        annotation: &mut Annotation,
        map: &AttributeMap,
    ) -> Result<(), AttributeError> {
        read_common(annotation, map)?;
        let tail = point_attr(map, keys::TAIL)?;
        let head = point_attr(map, keys::HEAD)?;
        annotation.set_segment(Segment { tail, head });
        annotation.set_text(map.get(keys::TEXT).cloned());
        Ok(())
    }
}

/// Freehand, highlight, polyline, and polycloud: an anchor-relative point list.
#[derive(Debug)]
struct PointListStrategy {
    family: EditFamily,
}

impl KindStrategy for PointListStrategy {
    fn edit_family(&self) -> EditFamily {
        self.family
    }

    fn set(&self, annotation: &mut Annotation, update: &GeometryUpdate) -> bool {
        match update {
            GeometryUpdate::Points(frame) => {
                annotation.set_point_frame(frame.clone());
                true
            }
            GeometryUpdate::Frame(frame) => {
                self.set_size(
                    annotation,
                    frame.position,
                    frame.size.width,
                    frame.size.height,
                );
                true
            }
            GeometryUpdate::Segment(_) => false,
        }
    }

    fn metadata(&self, annotation: &Annotation) -> AttributeMap {
        let mut map = AttributeMap::new();
        write_common(annotation, &mut map);
        map.insert(keys::POINTS.into(), format_points(annotation.points()));
        if self.family == EditFamily::MultiClick {
            map.insert(keys::CLOSED.into(), annotation.is_closed().to_string());
        }
        map
    }

    fn set_metadata(
        &self,
        annotation: &mut Annotation,
        map: &AttributeMap,
    ) -> Result<(), AttributeError> {
        read_common(annotation, map)?;
        let position = point_attr(map, keys::POSITION)?;
        let size = size_attr(map, keys::SIZE)?;
        let points = points_attr(map, keys::POINTS)?;
        annotation.set_point_frame(PointFrame {
            position,
            size,
            points,
        });
        if let Some(closed) = map.get(keys::CLOSED) {
            let closed = closed
                .parse::<bool>()
                .map_err(|_| AttributeError::Invalid {
                    key: keys::CLOSED.into(),
                    value: closed.clone(),
                })?;
            annotation.set_closed(closed);
        }
        Ok(())
    }
}

/// Text and stamp: a frame holding text.
#[derive(Debug)]
struct TextStrategy;

impl KindStrategy for TextStrategy {
    fn edit_family(&self) -> EditFamily {
        EditFamily::Text
    }

    fn set(&self, annotation: &mut Annotation, update: &GeometryUpdate) -> bool {
        match update {
            GeometryUpdate::Frame(frame) => {
                self.set_size(
                    annotation,
                    frame.position,
                    frame.size.width,
                    frame.size.height,
                );
                true
            }
            _ => false,
        }
    }

    fn update_style(&self, annotation: &mut Annotation, attr: StyleAttr, value: StyleValue) -> bool {
        // A larger font never fits in a box shorter than one line.
        let min_height = match (&attr, &value) {
            (StyleAttr::FontSize, StyleValue::Number(size)) => Some(*size),
            _ => None,
        };
        let accepted = annotation.update_style(attr, value);
        if let Some(line) = min_height.filter(|_| accepted) {
            let size = annotation.size();
            if size.height < line {
                annotation.set_size(annotation.position(), size.width, line);
            }
        }
        accepted
    }

    fn metadata(&self, annotation: &Annotation) -> AttributeMap {
        let mut map = AttributeMap::new();
        write_common(annotation, &mut map);
        map.insert(
            keys::TEXT.into(),
            annotation.text().unwrap_or_default().into(),
        );
        map
    }

    fn set_metadata(
        &self,
        annotation: &mut Annotation,
        map: &AttributeMap,
    ) -> Result<(), AttributeError> {
        read_common(annotation, map)?;
        let text = map.get(keys::TEXT).ok_or(AttributeError::Missing(keys::TEXT))?;
        annotation.set_text(Some(text.clone()));
        Ok(())
    }
}

static FRAME: FrameStrategy = FrameStrategy;
static SEGMENT: SegmentStrategy = SegmentStrategy;
static STROKE: PointListStrategy = PointListStrategy {
    family: EditFamily::Stroke,
};
static MULTI_CLICK: PointListStrategy = PointListStrategy {
    family: EditFamily::MultiClick,
};
static TEXT: TextStrategy = TextStrategy;

/// The strategy registered for `kind`.
pub fn strategy_for(kind: AnnotationKind) -> &'static dyn KindStrategy {
    match kind.edit_family() {
        EditFamily::Drag => &FRAME,
        EditFamily::Segment => &SEGMENT,
        EditFamily::Stroke => &STROKE,
        EditFamily::MultiClick => &MULTI_CLICK,
        EditFamily::Text => &TEXT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnnotationId;
    use kurbo::Size;

    #[test]
    fn registry_matches_edit_family() {
        for kind in AnnotationKind::ALL {
            assert_eq!(strategy_for(kind).edit_family(), kind.edit_family());
        }
    }

    #[test]
    fn set_rejects_mismatched_updates() {
        let mut circle = Annotation::new(AnnotationId(1), AnnotationKind::Circle);
        let strategy = strategy_for(AnnotationKind::Circle);
        assert!(!strategy.set(
            &mut circle,
            &GeometryUpdate::Segment(Segment::new((0.0, 0.0), (1.0, 1.0)))
        ));
        assert!(strategy.set(
            &mut circle,
            &GeometryUpdate::Frame(Frame {
                position: Point::new(4.0, 4.0),
                size: Size::new(8.0, 6.0),
            })
        ));
        assert_eq!(circle.size(), Size::new(8.0, 6.0));
    }

    #[test]
    fn text_grows_to_fit_font_size() {
        let mut text = Annotation::new(AnnotationId(1), AnnotationKind::Text);
        text.set_size(Point::new(0.0, 0.0), 100.0, 10.0);
        let strategy = strategy_for(AnnotationKind::Text);
        assert!(strategy.update_style(&mut text, StyleAttr::FontSize, StyleValue::Number(24.0)));
        assert_eq!(text.size(), Size::new(100.0, 24.0));
    }

    #[test]
    fn set_parent_moves_layer() {
        let mut arrow = Annotation::new(AnnotationId(1), AnnotationKind::Arrow);
        strategy_for(AnnotationKind::Arrow).set_parent(&mut arrow, LayerId("review".into()));
        assert_eq!(arrow.layer(), &LayerId("review".into()));
    }
}
