// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stroke simplification: a radial-distance pre-pass followed by Ramer–Douglas–Peucker.
//!
//! Tolerances are squared distances. [`view_tolerance`] derives one from a fraction of the
//! current view diagonal so the result looks the same at every zoom level.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::Point;

/// Squared tolerance for `fraction` of a view whose diagonal is `view_diagonal` long.
pub fn view_tolerance(fraction: f64, view_diagonal: f64) -> f64 {
    let t = fraction * view_diagonal;
    t * t
}

/// Squared distance from `p` to the segment `a → b`.
fn segment_dist2(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 == 0.0 {
        return (p - a).hypot2();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot2()
}

/// Drop points closer than `sqrt(sq_tolerance)` to the last kept point.
///
/// The first and last points are always kept.
pub fn simplify_radial(points: &[Point], sq_tolerance: f64) -> Vec<Point> {
    let Some((&first, rest)) = points.split_first() else {
        return Vec::new();
    };
    let mut out = vec![first];
    let mut last = first;
    for &p in rest {
        if (p - last).hypot2() > sq_tolerance {
            out.push(p);
            last = p;
        }
    }
    if let Some(&end) = points.last()
        && last != end
    {
        out.push(end);
    }
    out
}

/// Ramer–Douglas–Peucker with a squared tolerance.
///
/// A point survives when its squared distance to the chord of its span exceeds
/// `sq_tolerance`. The first and last points are always kept.
pub fn simplify_douglas_peucker(points: &[Point], sq_tolerance: f64) -> Vec<Point> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;
    let mut stack = vec![(0_usize, n - 1)];
    while let Some((first, last)) = stack.pop() {
        let mut max_d2 = 0.0;
        let mut index = first;
        for i in first + 1..last {
            let d2 = segment_dist2(points[i], points[first], points[last]);
            if d2 > max_d2 {
                max_d2 = d2;
                index = i;
            }
        }
        if max_d2 > sq_tolerance {
            keep[index] = true;
            if index - first > 1 {
                stack.push((first, index));
            }
            if last - index > 1 {
                stack.push((index, last));
            }
        }
    }
    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Simplify a finished stroke.
///
/// Runs the radial pre-pass unless `highest_quality` is set, then Douglas–Peucker.
pub fn simplify(points: &[Point], sq_tolerance: f64, highest_quality: bool) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    if highest_quality {
        simplify_douglas_peucker(points, sq_tolerance)
    } else {
        simplify_douglas_peucker(&simplify_radial(points, sq_tolerance), sq_tolerance)
    }
}
