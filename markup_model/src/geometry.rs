// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-annotation positional state and its derived bounding polygon.
//!
//! An [`Annotation`] keeps a center anchor (`position`), extents (`size`), a rotation in
//! radians, and for point-list kinds an ordered list of points stored relative to the anchor
//! and unrotated, so the map from local to annotation space is
//! `translate(position) * rotate(rotation)`.
//!
//! Segment kinds (arrow, dimension) keep their tail and head as a two-point list relative to
//! the anchor but already oriented: `extents.x` is their distance and the rotation their angle.
//!
//! The one exception is the transient capture mode flagged by
//! [`AnnotationFlags::ABSOLUTE_POINTS`]: while a freehand stroke is being drawn its points are
//! absolute annotation-space coordinates, and position and rotation are ignored for them.

use kurbo::{Affine, Point, Rect, Size, Vec2};

use crate::{
    AnnotationFlags, AnnotationId, AnnotationKind, CoordinateTransform, LayerId, Style, StyleAttr,
    StyleValue,
};

/// Tolerance used when comparing geometry for identity.
pub const EPSILON: f64 = 1e-4;

/// Smallest extent an annotation can have on either axis.
pub const MIN_EXTENT: f64 = 1.0;

fn clamp_extent(v: f64) -> f64 {
    if v.is_finite() { v.max(MIN_EXTENT) } else { MIN_EXTENT }
}

fn points_approx_eq(a: &[Point], b: &[Point], eps: f64) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(p, q)| (p.x - q.x).abs() <= eps && (p.y - q.y).abs() <= eps)
}

fn point_approx_eq(a: Point, b: Point, eps: f64) -> bool {
    (a.x - b.x).abs() <= eps && (a.y - b.y).abs() <= eps
}

/// Anchor and extents of an annotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    /// Center anchor in annotation space.
    pub position: Point,
    /// Extents.
    pub size: Size,
}

impl Frame {
    /// A frame spanning two opposite corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let rect = Rect::from_points(a, b);
        Self {
            position: rect.center(),
            size: rect.size(),
        }
    }

    /// The unrotated rectangle covered by the frame.
    pub fn rect(&self) -> Rect {
        Rect::from_center_size(self.position, self.size)
    }

    /// Compare within `eps`.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        point_approx_eq(self.position, other.position, eps)
            && (self.size.width - other.size.width).abs() <= eps
            && (self.size.height - other.size.height).abs() <= eps
    }
}

/// Anchor, extents, and anchor-relative points of a point-list annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct PointFrame {
    /// Center anchor in annotation space.
    pub position: Point,
    /// Extents of the point bounding box (each clamped to [`MIN_EXTENT`]).
    pub size: Size,
    /// Points relative to `position`.
    pub points: Vec<Point>,
}

impl PointFrame {
    /// Recenter absolute annotation-space points on their bounding-box center.
    pub fn from_absolute(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Self {
                position: Point::ZERO,
                size: Size::new(MIN_EXTENT, MIN_EXTENT),
                points: Vec::new(),
            };
        };
        let bounds = points
            .iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p));
        let center = bounds.center();
        Self {
            position: center,
            size: Size::new(clamp_extent(bounds.width()), clamp_extent(bounds.height())),
            points: points.iter().map(|p| (*p - center).to_point()).collect(),
        }
    }

    /// The points in annotation space, ignoring rotation.
    pub fn to_absolute(&self) -> Vec<Point> {
        self.points.iter().map(|p| self.position + p.to_vec2()).collect()
    }

    /// Compare within `eps`.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        point_approx_eq(self.position, other.position, eps)
            && (self.size.width - other.size.width).abs() <= eps
            && (self.size.height - other.size.height).abs() <= eps
            && points_approx_eq(&self.points, &other.points, eps)
    }
}

/// Tail and head of a segment kind in annotation space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Start point.
    pub tail: Point,
    /// End point.
    pub head: Point,
}

impl Segment {
    /// Build a segment.
    pub fn new(tail: impl Into<Point>, head: impl Into<Point>) -> Self {
        Self {
            tail: tail.into(),
            head: head.into(),
        }
    }

    /// Euclidean distance from tail to head.
    pub fn length(&self) -> f64 {
        self.tail.distance(self.head)
    }

    /// Angle of the tail→head direction in radians.
    pub fn angle(&self) -> f64 {
        (self.head - self.tail).atan2()
    }

    /// Midpoint of the segment.
    pub fn center(&self) -> Point {
        self.tail.midpoint(self.head)
    }

    /// Compare within `eps`.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        point_approx_eq(self.tail, other.tail, eps) && point_approx_eq(self.head, other.head, eps)
    }
}

/// A single 2D annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    id: AnnotationId,
    kind: AnnotationKind,
    position: Point,
    size: Size,
    rotation: f64,
    style: Style,
    points: Vec<Point>,
    closed: bool,
    text: Option<String>,
    flags: AnnotationFlags,
    layer: LayerId,
}

impl Annotation {
    /// A new annotation of `kind` at the origin with its kind's default style.
    pub fn new(id: AnnotationId, kind: AnnotationKind) -> Self {
        let mut annotation = Self {
            id,
            kind,
            position: Point::ZERO,
            size: Size::new(MIN_EXTENT, MIN_EXTENT),
            rotation: 0.0,
            style: Style::kind_default(kind),
            points: Vec::new(),
            closed: false,
            text: None,
            flags: AnnotationFlags::empty(),
            layer: LayerId::default_layer(),
        };
        if kind.is_segment() {
            annotation.sync_segment_points();
            annotation.size.height = annotation.segment_thickness();
        }
        annotation
    }

    /// Copy this annotation under a new id.
    ///
    /// Geometry, style, and text are deep-copied; transient interaction state (selection,
    /// highlight, capture mode) is reset rather than carried over.
    pub fn duplicate(&self, id: AnnotationId) -> Self {
        Self {
            id,
            flags: self.flags & AnnotationFlags::HIDDEN,
            ..self.clone()
        }
    }

    /// Identifier.
    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// Kind.
    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    /// Center anchor in annotation space.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Extents.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Rotation in radians about the anchor.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Style.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Raw point list (anchor-relative unless in capture mode).
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Whether a polyline or polycloud closes back to its first vertex.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Interaction flags.
    pub fn flags(&self) -> AnnotationFlags {
        self.flags
    }

    /// Layer the annotation is attached to.
    pub fn layer(&self) -> &LayerId {
        &self.layer
    }

    /// Anchor and extents.
    pub fn frame(&self) -> Frame {
        Frame {
            position: self.position,
            size: self.size,
        }
    }

    /// Anchor, extents, and relative points.
    pub fn point_frame(&self) -> PointFrame {
        PointFrame {
            position: self.position,
            size: self.size,
            points: self.points.clone(),
        }
    }

    /// Endpoints of a segment kind in annotation space.
    pub fn segment(&self) -> Option<Segment> {
        match (self.kind.is_segment(), self.points.as_slice()) {
            (true, [tail, head]) => Some(Segment {
                tail: self.position + tail.to_vec2(),
                head: self.position + head.to_vec2(),
            }),
            _ => None,
        }
    }

    /// Map from anchor-relative local space to annotation space.
    pub fn local_transform(&self) -> Affine {
        Affine::translate(self.position.to_vec2()) * Affine::rotate(self.rotation)
    }

    /// Points in annotation space.
    pub fn absolute_points(&self) -> Vec<Point> {
        if self.flags.contains(AnnotationFlags::ABSOLUTE_POINTS) {
            return self.points.clone();
        }
        if self.kind.is_segment() {
            return self.points.iter().map(|p| self.position + p.to_vec2()).collect();
        }
        let xf = self.local_transform();
        self.points.iter().map(|p| xf * *p).collect()
    }

    /// Move the anchor. Relative points move along with it.
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Set anchor and extents at once.
    ///
    /// Extents are clamped to [`MIN_EXTENT`]. Point-list kinds rescale their points by the
    /// ratio between the new and old extents; segment kinds recompute their endpoints from
    /// the new length.
    pub fn set_size(&mut self, position: Point, width: f64, height: f64) {
        let width = clamp_extent(width);
        let height = clamp_extent(height);
        if self.kind.has_point_list() && !self.flags.contains(AnnotationFlags::ABSOLUTE_POINTS) {
            let sx = width / clamp_extent(self.size.width);
            let sy = height / clamp_extent(self.size.height);
            for p in &mut self.points {
                p.x *= sx;
                p.y *= sy;
            }
        }
        self.position = position;
        self.size = Size::new(width, height);
        if self.kind.is_segment() {
            self.sync_segment_points();
        }
    }

    /// Set rotation in radians.
    pub fn set_rotation(&mut self, angle: f64) {
        self.rotation = if angle.is_finite() { angle } else { 0.0 };
        if self.kind.is_segment() {
            self.sync_segment_points();
        }
    }

    /// Place a segment kind's tail and head.
    ///
    /// The anchor becomes the midpoint, `size.width` the length, and rotation the direction
    /// angle. Ignored for other kinds.
    pub fn set_segment(&mut self, segment: Segment) {
        if !self.kind.is_segment() {
            return;
        }
        let center = segment.center();
        self.position = center;
        self.rotation = segment.angle();
        self.size = Size::new(clamp_extent(segment.length()), self.segment_thickness());
        self.points = vec![
            (segment.tail - center).to_point(),
            (segment.head - center).to_point(),
        ];
    }

    /// Replace anchor, extents, and relative points together.
    pub fn set_point_frame(&mut self, frame: PointFrame) {
        self.position = frame.position;
        self.size = Size::new(clamp_extent(frame.size.width), clamp_extent(frame.size.height));
        self.points = frame.points;
        self.flags.remove(AnnotationFlags::ABSOLUTE_POINTS);
    }

    /// Enter capture mode with absolute annotation-space points.
    pub fn begin_capture(&mut self, start: Point) {
        self.flags.insert(AnnotationFlags::ABSOLUTE_POINTS);
        self.points.clear();
        self.points.push(start);
        self.position = start;
        self.size = Size::new(MIN_EXTENT, MIN_EXTENT);
        self.rotation = 0.0;
    }

    /// Replace the captured absolute points, keeping anchor and extents on their bounds.
    pub fn set_captured_points(&mut self, points: Vec<Point>) {
        let frame = PointFrame::from_absolute(&points);
        self.position = frame.position;
        self.size = frame.size;
        self.points = points;
    }

    /// Set whether a polyline or polycloud is closed.
    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    /// Set text content.
    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    /// Replace the whole style, keeping only attributes this kind accepts.
    pub fn set_style(&mut self, style: &Style) {
        let mut next = Style::empty(self.kind.style_mask());
        next.merge_from(style);
        self.style = next;
        if self.kind.is_segment() {
            self.size.height = self.segment_thickness();
        }
    }

    /// Set a single style attribute. Returns `false` if the kind does not accept it.
    pub fn update_style(&mut self, attr: StyleAttr, value: StyleValue) -> bool {
        let accepted = self.style.set(attr, value);
        if accepted && self.kind.is_segment() && attr == StyleAttr::StrokeWidth {
            self.size.height = self.segment_thickness();
        }
        accepted
    }

    /// Set or clear interaction flags.
    pub fn set_flags(&mut self, flags: AnnotationFlags, on: bool) {
        self.flags.set(flags, on);
    }

    /// Attach to another layer.
    pub fn set_layer(&mut self, layer: LayerId) {
        self.layer = layer;
    }

    /// Four corners of the rotated frame in annotation space.
    ///
    /// Order: top-left, top-right, bottom-right, bottom-left in local space.
    pub fn local_bounding_polygon(&self) -> [Point; 4] {
        let hw = self.size.width / 2.0;
        let hh = self.size.height / 2.0;
        let xf = self.local_transform();
        [
            xf * Point::new(-hw, -hh),
            xf * Point::new(hw, -hh),
            xf * Point::new(hw, hh),
            xf * Point::new(-hw, hh),
        ]
    }

    /// Four corners of the rotated frame in screen space.
    pub fn generate_bounding_polygon(&self, transform: &dyn CoordinateTransform) -> [Point; 4] {
        self.local_bounding_polygon()
            .map(|p| transform.annotation_to_screen(p))
    }

    /// Compare every observable attribute within `eps`.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && point_approx_eq(self.position, other.position, eps)
            && (self.size.width - other.size.width).abs() <= eps
            && (self.size.height - other.size.height).abs() <= eps
            && (self.rotation - other.rotation).abs() <= eps
            && self.style.approx_eq(&other.style, eps)
            && points_approx_eq(&self.points, &other.points, eps)
            && self.closed == other.closed
            && self.text == other.text
            && self.flags == other.flags
            && self.layer == other.layer
    }

    fn segment_thickness(&self) -> f64 {
        clamp_extent(self.style.stroke_width() * 4.0)
    }

    fn sync_segment_points(&mut self) {
        let half = Vec2::from_angle(self.rotation) * (self.size.width / 2.0);
        self.points = vec![(-half).to_point(), half.to_point()];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AffineViewport;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= EPSILON
    }

    #[test]
    fn arrow_extent_matches_endpoint_distance() {
        let mut arrow = Annotation::new(AnnotationId(1), AnnotationKind::Arrow);
        arrow.set_segment(Segment::new((0.0, 0.0), (100.0, -50.0)));
        let expected = (100.0_f64 * 100.0 + 50.0 * 50.0).sqrt();
        assert!(approx(arrow.size().width, expected));
        let seg = arrow.segment().expect("arrow is a segment kind");
        assert!(seg.approx_eq(&Segment::new((0.0, 0.0), (100.0, -50.0)), EPSILON));
    }

    #[test]
    fn degenerate_sizes_clamp_to_one() {
        let mut circle = Annotation::new(AnnotationId(1), AnnotationKind::Circle);
        circle.set_size(Point::new(5.0, 5.0), 0.0, -3.0);
        assert_eq!(circle.size(), Size::new(1.0, 1.0));
        circle.set_size(Point::new(5.0, 5.0), f64::NAN, 4.0);
        assert_eq!(circle.size(), Size::new(1.0, 4.0));
    }

    #[test]
    fn point_list_rescales_with_size() {
        let mut pen = Annotation::new(AnnotationId(1), AnnotationKind::Freehand);
        pen.set_point_frame(PointFrame::from_absolute(&[
            Point::new(0.0, 0.0),
            Point::new(10.0, 20.0),
        ]));
        assert_eq!(pen.points(), &[Point::new(-5.0, -10.0), Point::new(5.0, 10.0)]);
        pen.set_size(Point::new(5.0, 10.0), 20.0, 10.0);
        assert_eq!(pen.points(), &[Point::new(-10.0, -5.0), Point::new(10.0, 5.0)]);
    }

    #[test]
    fn rotated_bounding_polygon() {
        let mut rect = Annotation::new(AnnotationId(1), AnnotationKind::Rectangle);
        rect.set_size(Point::new(10.0, 10.0), 4.0, 2.0);
        rect.set_rotation(core::f64::consts::FRAC_PI_2);
        let poly = rect.generate_bounding_polygon(&AffineViewport::identity());
        // Rotating a 4x2 box by 90 degrees yields a 2x4 box.
        let xs: Vec<f64> = poly.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = poly.iter().map(|p| p.y).collect();
        let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let max_y = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(approx(min_x, 9.0));
        assert!(approx(max_y, 12.0));
    }

    #[test]
    fn capture_mode_keeps_absolute_points() {
        let mut pen = Annotation::new(AnnotationId(1), AnnotationKind::Freehand);
        pen.begin_capture(Point::new(3.0, 4.0));
        pen.set_captured_points(vec![Point::new(3.0, 4.0), Point::new(7.0, 8.0)]);
        assert!(pen.flags().contains(AnnotationFlags::ABSOLUTE_POINTS));
        assert_eq!(pen.absolute_points(), vec![Point::new(3.0, 4.0), Point::new(7.0, 8.0)]);
        assert_eq!(pen.position(), Point::new(5.0, 6.0));
    }

    #[test]
    fn duplicate_resets_transient_flags() {
        let mut a = Annotation::new(AnnotationId(1), AnnotationKind::Text);
        a.set_text(Some(String::from("hello")));
        a.set_flags(AnnotationFlags::SELECTED | AnnotationFlags::HIGHLIGHTED, true);
        let b = a.duplicate(AnnotationId(2));
        assert_eq!(b.id(), AnnotationId(2));
        assert_eq!(b.text(), Some("hello"));
        assert!(b.flags().is_empty());
    }
}
