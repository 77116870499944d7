// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Analytic pick tests for pointer-over and selection.
//!
//! These answer "is the pointer on this annotation?" without a raster. Shapes are given in
//! annotation space and tested with [`PreciseHitTest`]; [`pick_annotation`] ranks several
//! candidates. Scores carry a distance used only for tie-breaking.

use alloc::vec::Vec;
use core::cmp::Ordering;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;

use crate::point_in_polygon;

/// Kind of hit produced by a precise test.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HitKind {
    /// Hit the interior of a shape.
    Fill,
    /// Hit the stroked outline of a shape.
    Stroke,
}

/// Parameters controlling precise hit tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct HitParams {
    /// Tolerance in local units for hits against filled regions.
    pub fill_tolerance: f64,
    /// Tolerance in local units for hits against stroked outlines.
    ///
    /// The renderer's interaction region is enlarged in proportion to stroke width; callers
    /// typically set this to `stroke_width * margin`.
    pub stroke_tolerance: f64,
}

/// Score returned from a precise hit.
///
/// Lower distance is considered a better (closer) hit for tie-breaking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitScore {
    /// Geometric distance in local coordinate space.
    pub distance: f64,
    /// Classification of what was hit.
    pub kind: HitKind,
}

impl HitScore {
    /// A filled hit at distance 0.
    pub const fn filled() -> Self {
        Self {
            distance: 0.0,
            kind: HitKind::Fill,
        }
    }

    /// Compare two scores, preferring smaller distance; ties keep original order.
    pub fn cmp_distance(&self, other: &Self) -> Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// Precise 2D hit testing in the shape's own coordinate space.
pub trait PreciseHitTest {
    /// Returns `Some(HitScore)` when `pt` hits the shape.
    fn hit_test_local(&self, pt: Point, params: &HitParams) -> Option<HitScore>;
}

/// Distance from `pt` to the segment `p0 → p1`.
fn segment_distance(pt: Point, p0: Point, p1: Point) -> f64 {
    let v = p1 - p0;
    let w = pt - p0;
    let len2 = v.hypot2();
    let t = if len2 > 0.0 { w.dot(v) / len2 } else { 0.0 };
    let proj = p0 + v * t.clamp(0.0, 1.0);
    (pt - proj).hypot()
}

/// A possibly rotated rectangle given by its four corners in order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad(pub [Point; 4]);

impl Quad {
    fn edge_distance(&self, pt: Point) -> f64 {
        let q = &self.0;
        (0..4)
            .map(|i| segment_distance(pt, q[i], q[(i + 1) % 4]))
            .fold(f64::INFINITY, f64::min)
    }
}

impl PreciseHitTest for Quad {
    fn hit_test_local(&self, pt: Point, params: &HitParams) -> Option<HitScore> {
        if point_in_polygon(pt, &self.0) {
            return Some(HitScore::filled());
        }
        let dist = self.edge_distance(pt);
        (dist <= params.fill_tolerance).then_some(HitScore {
            distance: dist,
            kind: HitKind::Fill,
        })
    }
}

/// A stroked polyline (centerline + half-width).
///
/// The test compares the distance to the nearest segment against the half-width plus
/// [`HitParams::stroke_tolerance`]. Joins and caps are not modeled.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokedPolyline {
    /// Centerline vertices.
    pub points: Vec<Point>,
    /// Whether the last vertex joins the first.
    pub closed: bool,
    /// Half of the stroke width.
    pub half_width: f64,
}

impl PreciseHitTest for StrokedPolyline {
    fn hit_test_local(&self, pt: Point, params: &HitParams) -> Option<HitScore> {
        let pts = &self.points;
        let closing = match (self.closed && pts.len() > 2, pts.first(), pts.last()) {
            (true, Some(first), Some(last)) => Some((*last, *first)),
            _ => None,
        };
        let single = match pts.as_slice() {
            [only] => Some((*only, *only)),
            _ => None,
        };
        let dist = pts
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(closing)
            .chain(single)
            .map(|(a, b)| segment_distance(pt, a, b))
            .fold(f64::INFINITY, f64::min);
        (dist <= self.half_width + params.stroke_tolerance).then_some(HitScore {
            distance: dist,
            kind: HitKind::Stroke,
        })
    }
}

/// The best hit among `candidates`, given topmost first.
///
/// The closest hit wins; among equally close hits the topmost one does.
pub fn pick_annotation<'a, K: Copy + 'a>(
    candidates: impl IntoIterator<Item = (K, &'a dyn PreciseHitTest)>,
    pt: Point,
    params: &HitParams,
) -> Option<(K, HitScore)> {
    let mut best: Option<(K, HitScore)> = None;
    for (key, shape) in candidates {
        if let Some(score) = shape.hit_test_local(pt, params) {
            let better = match &best {
                None => true,
                Some((_, current)) => score.cmp_distance(current) == Ordering::Less,
            };
            if better {
                best = Some((key, score));
            }
        }
    }
    best
}
