// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raster probes over an [`IdBuffer`]: a DDA line walk and an expanding-ring polygon search.
//!
//! Probe inputs and results are in screen (logical) pixels; the probes scale by the device
//! pixel ratio internally, since the id-buffer is rendered at device resolution.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect};
use smallvec::SmallVec;

use crate::IdBuffer;

#[allow(
    clippy::cast_possible_truncation,
    reason = "Pixel coordinates are rounded first and saturate on overflow."
)]
fn pixel(v: f64) -> i64 {
    v.round() as i64
}

#[allow(
    clippy::cast_precision_loss,
    reason = "Pixel coordinates are far below 2^52."
)]
fn coord(v: i64) -> f64 {
    v as f64
}

/// Center of the occluding run through `(x, y)`, looking one device pixel either way on
/// each axis, mapped back to screen pixels.
fn refine(buffer: &IdBuffer<'_>, x: i64, y: i64, ratio: f64) -> Point {
    let run = |before: bool, after: bool, at: i64| {
        let lo = if before { at - 1 } else { at };
        let hi = if after { at + 1 } else { at };
        (coord(lo) + coord(hi)) / 2.0
    };
    let cx = run(
        buffer.is_occluding(x - 1, y),
        buffer.is_occluding(x + 1, y),
        x,
    );
    let cy = run(
        buffer.is_occluding(x, y - 1),
        buffer.is_occluding(x, y + 1),
        y,
    );
    Point::new(cx / ratio, cy / ratio)
}

fn device_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}

/// Walk from `p0` to `p1` one device pixel at a time and return the first occluding pixel.
///
/// Coincident endpoints probe a single pixel. The hit is refined to the center of the
/// occluding run around it and returned in screen pixels.
pub fn line_probe(p0: Point, p1: Point, buffer: &IdBuffer<'_>, ratio: f64) -> Option<Point> {
    let ratio = device_ratio(ratio);
    let d0 = p0.to_vec2() * ratio;
    let d1 = p1.to_vec2() * ratio;
    let delta = d1 - d0;
    let steps = delta.x.abs().max(delta.y.abs()).ceil();
    if !steps.is_finite() {
        return None;
    }
    let inc = if steps > 0.0 { delta / steps } else { delta };
    let mut i = 0.0;
    while i <= steps {
        let at = d0 + inc * i;
        let (x, y) = (pixel(at.x), pixel(at.y));
        if buffer.is_occluding(x, y) {
            return Some(refine(buffer, x, y, ratio));
        }
        i += 1.0;
    }
    None
}

/// Crossing-number point-in-polygon test.
///
/// Points exactly on a left or bottom edge count as inside, those on a right or top edge
/// as outside.
pub fn point_in_polygon(pt: Point, poly: &[Point]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > pt.y) != (b.y > pt.y) {
            let x = a.x + (pt.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if pt.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Search outward from the center of `quad`'s bounds for an occluding pixel inside `quad`.
///
/// Rings are the boundaries of successively larger squares around the center. The search
/// gives up once a ring no longer touches the bounds, and returns `None` immediately when the
/// bounds miss the buffer.
pub fn polygon_probe(quad: &[Point], buffer: &IdBuffer<'_>, ratio: f64) -> Option<Point> {
    let ratio = device_ratio(ratio);
    let (first, rest) = quad.split_first()?;
    let device = |p: &Point| (p.to_vec2() * ratio).to_point();
    let bounds = rest.iter().fold(
        Rect::from_points(device(first), device(first)),
        |r, p| r.union_pt(device(p)),
    );
    let limits = buffer.bounds();
    if bounds.x1 < limits.x0
        || bounds.y1 < limits.y0
        || bounds.x0 >= limits.x1
        || bounds.y0 >= limits.y1
    {
        return None;
    }
    let device_quad: SmallVec<[Point; 4]> = quad.iter().map(device).collect();

    let x0 = pixel(bounds.x0.floor());
    let y0 = pixel(bounds.y0.floor());
    let x1 = pixel(bounds.x1.ceil());
    let y1 = pixel(bounds.y1.ceil());
    let center = bounds.center();
    let (cx, cy) = (pixel(center.x), pixel(center.y));
    let max_ring = (cx - x0).max(x1 - cx).max(cy - y0).max(y1 - cy);

    let test = |x: i64, y: i64| {
        x >= x0
            && x <= x1
            && y >= y0
            && y <= y1
            && buffer.is_occluding(x, y)
            && point_in_polygon(Point::new(coord(x), coord(y)), &device_quad)
    };

    if test(cx, cy) {
        return Some(refine(buffer, cx, cy, ratio));
    }
    for k in 1..=max_ring {
        // Top and bottom rows of the ring, then the columns between them.
        for x in cx - k..=cx + k {
            for y in [cy - k, cy + k] {
                if test(x, y) {
                    return Some(refine(buffer, x, y, ratio));
                }
            }
        }
        for y in cy - k + 1..cy + k {
            for x in [cx - k, cx + k] {
                if test(x, y) {
                    return Some(refine(buffer, x, y, ratio));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn blank(w: usize, h: usize) -> Vec<u8> {
        vec![0xFF; w * h * 4]
    }

    fn mark(data: &mut [u8], w: usize, x: usize, y: usize) {
        let i = (y * w + x) * 4;
        data[i] = 0x10;
        data[i + 1] = 0x20;
        data[i + 2] = 0x30;
    }

    const UNIT_SQUARE: [Point; 4] = [
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ];

    #[test]
    fn crossing_number_unit_square() {
        assert!(point_in_polygon(Point::new(0.5, 0.5), &UNIT_SQUARE));
        assert!(!point_in_polygon(Point::new(2.0, 2.0), &UNIT_SQUARE));
        assert!(!point_in_polygon(Point::new(0.5, 0.5), &UNIT_SQUARE[..2]));
    }

    #[test]
    fn line_probe_misses_blank_buffer() {
        let data = blank(32, 32);
        let buf = IdBuffer::new(32, 32, &data).expect("sized buffer");
        let hit = line_probe(Point::new(0.0, 0.0), Point::new(31.0, 20.0), &buf, 1.0);
        assert_eq!(hit, None);
    }

    #[test]
    fn line_probe_finds_single_pixel() {
        let mut data = blank(32, 32);
        mark(&mut data, 32, 10, 5);
        let buf = IdBuffer::new(32, 32, &data).expect("sized buffer");
        let hit = line_probe(Point::new(0.0, 0.0), Point::new(20.0, 10.0), &buf, 1.0);
        assert_eq!(hit, Some(Point::new(10.0, 5.0)));
    }

    #[test]
    fn line_probe_refines_to_run_center() {
        let mut data = blank(16, 16);
        for y in 3..=5 {
            mark(&mut data, 16, 8, y);
        }
        let buf = IdBuffer::new(16, 16, &data).expect("sized buffer");
        let hit = line_probe(Point::new(0.0, 3.0), Point::new(15.0, 3.0), &buf, 1.0);
        // Entered the run at its top pixel; refinement looks one pixel down.
        assert_eq!(hit, Some(Point::new(8.0, 3.5)));
    }

    #[test]
    fn line_probe_scales_by_device_ratio() {
        let mut data = blank(40, 40);
        mark(&mut data, 40, 20, 20);
        let buf = IdBuffer::new(40, 40, &data).expect("sized buffer");
        let hit = line_probe(Point::new(0.0, 0.0), Point::new(15.0, 15.0), &buf, 2.0);
        assert_eq!(hit, Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn coincident_endpoints_probe_one_pixel() {
        let mut data = blank(8, 8);
        mark(&mut data, 8, 4, 4);
        let buf = IdBuffer::new(8, 8, &data).expect("sized buffer");
        let p = Point::new(4.0, 4.0);
        assert_eq!(line_probe(p, p, &buf, 1.0), Some(p));
        let q = Point::new(3.0, 4.0);
        assert_eq!(line_probe(q, q, &buf, 1.0), None);
    }

    #[test]
    fn polygon_probe_searches_inside_quad() {
        let mut data = blank(64, 64);
        // Outside the quad: must be ignored.
        mark(&mut data, 64, 2, 2);
        // Inside, off-center.
        mark(&mut data, 64, 30, 12);
        let buf = IdBuffer::new(64, 64, &data).expect("sized buffer");
        let quad = [
            Point::new(10.0, 10.0),
            Point::new(40.0, 10.0),
            Point::new(40.0, 40.0),
            Point::new(10.0, 40.0),
        ];
        assert_eq!(polygon_probe(&quad, &buf, 1.0), Some(Point::new(30.0, 12.0)));
    }

    #[test]
    fn polygon_probe_outside_buffer_misses() {
        let data = blank(16, 16);
        let buf = IdBuffer::new(16, 16, &data).expect("sized buffer");
        let far = UNIT_SQUARE.map(|p| Point::new(p.x + 100.0, p.y + 100.0));
        assert_eq!(polygon_probe(&far, &buf, 1.0), None);
        assert_eq!(polygon_probe(&[], &buf, 1.0), None);
    }
}
