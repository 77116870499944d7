// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cloud outlines: filleted corners joined by rows of outward bumps.

use alloc::vec::Vec;
use core::f64::consts::{PI, TAU};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Arc, BezPath, Ellipse, Point, Rect, Shape, Size, Vec2};
use smallvec::SmallVec;

/// Flattening tolerance for arcs, in annotation units.
const ARC_TOLERANCE: f64 = 0.1;

/// Sides shorter than this many bump diameters collapse a cloud rectangle to an ellipse.
const ELLIPSE_DIAMETERS: f64 = 5.0;

/// Parameters of a cloud outline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudParams {
    /// Corner fillet radius; bumps are sized close to twice this.
    pub bump_radius: f64,
}

impl CloudParams {
    /// Target bump diameter.
    pub fn diameter(&self) -> f64 {
        2.0 * self.bump_radius
    }
}

impl Default for CloudParams {
    fn default() -> Self {
        Self { bump_radius: 10.0 }
    }
}

/// Winding direction of a boundary, in y-down screen convention.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Orientation {
    /// Clockwise on screen (positive cross product with y pointing down).
    Clockwise,
    /// Counter-clockwise on screen.
    CounterClockwise,
}

impl Orientation {
    /// Orientation of a boundary from its first three points.
    ///
    /// With exactly two points (or three colinear ones) the vertical order of the first two
    /// decides.
    pub fn of_points(points: &[Point]) -> Self {
        if let [a, b, c, ..] = points {
            let cross = (*b - *a).cross(*c - *a);
            if cross > 0.0 {
                return Self::Clockwise;
            }
            if cross < 0.0 {
                return Self::CounterClockwise;
            }
        }
        match points {
            [a, b, ..] if b.y < a.y => Self::CounterClockwise,
            _ => Self::Clockwise,
        }
    }

    /// `1.0` for clockwise, `-1.0` otherwise.
    pub fn sign(self) -> f64 {
        match self {
            Self::Clockwise => 1.0,
            Self::CounterClockwise => -1.0,
        }
    }
}

/// Intersections of two circles via the radical line.
///
/// Returns no points for concentric or disjoint circles, or when one contains the other.
pub fn circle_intersections(c0: Point, r0: f64, c1: Point, r1: f64) -> SmallVec<[Point; 2]> {
    let mut out = SmallVec::new();
    let delta = c1 - c0;
    let d = delta.hypot();
    if d == 0.0 || d > r0 + r1 || d < (r0 - r1).abs() {
        return out;
    }
    let a = (r0 * r0 - r1 * r1 + d * d) / (2.0 * d);
    let h2 = r0 * r0 - a * a;
    let dir = delta / d;
    let base = c0 + dir * a;
    if h2 <= 0.0 {
        out.push(base);
        return out;
    }
    let perp = Vec2::new(-dir.y, dir.x) * h2.sqrt();
    out.push(base + perp);
    out.push(base - perp);
    out
}

/// The shared endpoint of two overlapping corner fillets on the edge `a → b`.
///
/// When the fillet circles around `a` (radius `ra`) and `b` (radius `rb`) overlap, that is
/// `ra + rb > |ab|` and `|ra - rb| < |ab|`, returns their intersection on the outer side of the
/// edge for the given orientation. Returns `None` when the fillets do not overlap.
pub fn corner_overlap(
    a: Point,
    ra: f64,
    b: Point,
    rb: f64,
    orientation: Orientation,
) -> Option<Point> {
    let edge = b - a;
    let d = edge.hypot();
    if !(ra + rb > d && (ra - rb).abs() < d) {
        return None;
    }
    let s = orientation.sign();
    circle_intersections(a, ra, b, rb)
        .into_iter()
        .find(|p| s * edge.cross(*p - a) < 0.0)
}

fn drop_repeats(points: &[Point], closed: bool) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().is_none_or(|q| *q != *p) {
            out.push(*p);
        }
    }
    if closed && out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// Append an arc centered on `center` from `from` to `to`, turning in the direction `s`.
fn push_corner(path: &mut BezPath, center: Point, radius: f64, from: Point, to: Point, s: f64) {
    let start = (from - center).atan2();
    let end = (to - center).atan2();
    let mut sweep = s * (end - start);
    while sweep <= 0.0 {
        sweep += TAU;
    }
    while sweep > TAU {
        sweep -= TAU;
    }
    let arc = Arc::new(center, Vec2::new(radius, radius), start, s * sweep, 0.0);
    path.extend(arc.append_iter(ARC_TOLERANCE));
}

/// Append `count` outward semicircular bumps tiling `from → to`.
fn push_bumps(path: &mut BezPath, from: Point, to: Point, diameter: f64, s: f64) {
    let span = to - from;
    let length = span.hypot();
    if length <= 0.0 {
        return;
    }
    let count = (length / diameter).round().max(1.0);
    let step = span / count;
    let radius = length / count / 2.0;
    let start = (-step).atan2();
    // `count` is a small positive integer stored as f64.
    let mut t = 0.0;
    while t < count {
        let center = from + step * (t + 0.5);
        let arc = Arc::new(center, Vec2::new(radius, radius), start, s * PI, 0.0);
        path.extend(arc.append_iter(ARC_TOLERANCE));
        t += 1.0;
    }
}

/// Build a cloud outline over a point sequence.
///
/// Each vertex becomes a fillet of radius [`CloudParams::bump_radius`], sharp at the ends of
/// an open boundary and wherever an adjacent edge is shorter than the radius. Overlapping
/// fillets meet at their circle intersection; the straight remainder of every edge is tiled
/// with outward bumps. Returns an empty path for fewer than two distinct points.
pub fn cloud_outline(points: &[Point], closed: bool, params: &CloudParams) -> BezPath {
    let mut path = BezPath::new();
    let pts = drop_repeats(points, closed);
    let n = pts.len();
    if n < 2 {
        return path;
    }
    let closed = closed && n > 2;
    let orientation = Orientation::of_points(&pts);
    let s = orientation.sign();
    let radius = params.bump_radius.max(0.0);
    let diameter = params.diameter().max(f64::EPSILON);
    let edge_count = if closed { n } else { n - 1 };
    let next = |i: usize| (i + 1) % n;

    let edge_len = |i: usize| (pts[next(i)] - pts[i]).hypot();
    let radii: Vec<f64> = (0..n)
        .map(|i| {
            if !closed && (i == 0 || i == n - 1) {
                return 0.0;
            }
            let prev = (i + n - 1) % n;
            if edge_len(prev) < radius || edge_len(i) < radius {
                0.0
            } else {
                radius
            }
        })
        .collect();

    // Per edge: where its straight span starts and ends.
    let mut span_start = Vec::with_capacity(edge_count);
    let mut span_end = Vec::with_capacity(edge_count);
    for i in 0..edge_count {
        let (a, b) = (pts[i], pts[next(i)]);
        let (ra, rb) = (radii[i], radii[next(i)]);
        let dir = (b - a) / (b - a).hypot();
        match corner_overlap(a, ra, b, rb, orientation) {
            Some(shared) => {
                span_start.push(shared);
                span_end.push(shared);
            }
            None if ra + rb >= (b - a).hypot() => {
                let mid = a + dir * ra;
                span_start.push(mid);
                span_end.push(mid);
            }
            None => {
                span_start.push(a + dir * ra);
                span_end.push(b - dir * rb);
            }
        }
    }

    path.move_to(span_start[0]);
    for i in 0..edge_count {
        push_bumps(&mut path, span_start[i], span_end[i], diameter, s);
        let v = next(i);
        if !closed && v == n - 1 {
            break;
        }
        let to = span_start[next(i) % edge_count];
        if radii[v] > 0.0 {
            push_corner(&mut path, pts[v], radii[v], span_end[i], to, s);
        } else if to != span_end[i] {
            path.line_to(to);
        }
    }
    if closed {
        path.close_path();
    }
    path
}

/// Cloud outline of a `size` rectangle centered on the origin.
///
/// Collapses to an ellipse when both sides are smaller than five bump diameters.
pub fn cloud_rect(size: Size, params: &CloudParams) -> BezPath {
    let rect = Rect::from_center_size(Point::ZERO, size);
    let limit = ELLIPSE_DIAMETERS * params.diameter();
    if size.width < limit && size.height < limit {
        return Ellipse::from_rect(rect).to_path(ARC_TOLERANCE);
    }
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    cloud_outline(&corners, true, params)
}

/// Plain polyline path through `points`.
pub fn polyline_path(points: &[Point], closed: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        path.move_to(*first);
        for p in iter {
            path.line_to(*p);
        }
        if closed && points.len() > 2 {
            path.close_path();
        }
    }
    path
}
