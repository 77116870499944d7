// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-point recovery: cheap line probes first, the ring search only as a fallback.

use alloc::vec::Vec;

use kurbo::{Line, Point};
use smallvec::SmallVec;

use crate::{IdBuffer, line_probe, polygon_probe};

/// Screen-space shape whose natural internal lines are worth probing.
#[derive(Clone, Debug, PartialEq)]
pub enum ProbeShape {
    /// A segment kind: probe the centerline from tail to head.
    Segment(Line),
    /// A framed kind (rectangle, ellipse, cloud, text): probe both diagonals and both
    /// midlines of the bounding quad.
    Frame,
    /// A point-list kind: probe each consecutive pair, closing back to the start if `closed`.
    Path {
        /// Vertices in screen space.
        points: Vec<Point>,
        /// Whether the last vertex joins the first.
        closed: bool,
    },
}

/// What to probe for one annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeTarget {
    /// Kind-specific probe lines.
    pub shape: ProbeShape,
    /// The annotation's rotated bounding quad in screen space.
    pub quad: [Point; 4],
}

impl ProbeTarget {
    /// Probe lines in the order they are tried.
    pub fn probe_lines(&self) -> SmallVec<[Line; 4]> {
        let q = &self.quad;
        match &self.shape {
            ProbeShape::Segment(line) => SmallVec::from_slice(&[*line]),
            ProbeShape::Frame => SmallVec::from_slice(&[
                Line::new(q[0], q[2]),
                Line::new(q[1], q[3]),
                Line::new(q[0].midpoint(q[1]), q[2].midpoint(q[3])),
                Line::new(q[1].midpoint(q[2]), q[3].midpoint(q[0])),
            ]),
            ProbeShape::Path { points, closed } => {
                let mut lines: SmallVec<[Line; 4]> = points
                    .windows(2)
                    .map(|w| Line::new(w[0], w[1]))
                    .collect();
                if *closed
                    && points.len() > 2
                    && let (Some(last), Some(first)) = (points.last(), points.first())
                {
                    lines.push(Line::new(*last, *first));
                }
                if let [only] = points.as_slice() {
                    lines.push(Line::new(*only, *only));
                }
                lines
            }
        }
    }

    /// Screen point on the annotation's rendered silhouette, if any.
    ///
    /// Every probe line is tried before the polygon search runs.
    pub fn recover_screen_point(&self, buffer: &IdBuffer<'_>, ratio: f64) -> Option<Point> {
        self.probe_lines()
            .iter()
            .find_map(|line| line_probe(line.p0, line.p1, buffer, ratio))
            .or_else(|| polygon_probe(&self.quad, buffer, ratio))
    }

    /// Recover a screen point and map it through `to_scene`.
    pub fn recover_scene_point<S>(
        &self,
        buffer: &IdBuffer<'_>,
        ratio: f64,
        to_scene: impl FnOnce(Point) -> Option<S>,
    ) -> Option<S> {
        self.recover_screen_point(buffer, ratio).and_then(to_scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn frame(x0: f64, y0: f64, x1: f64, y1: f64) -> [Point; 4] {
        [
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    fn buffer_with(w: usize, h: usize, pixels: &[(usize, usize)]) -> Vec<u8> {
        let mut data = vec![0xFF; w * h * 4];
        for (x, y) in pixels {
            data[(y * w + x) * 4] = 0;
        }
        data
    }

    #[test]
    fn frame_probes_diagonals_then_midlines() {
        let target = ProbeTarget {
            shape: ProbeShape::Frame,
            quad: frame(0.0, 0.0, 10.0, 4.0),
        };
        let lines = target.probe_lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], Line::new((0.0, 0.0), (10.0, 4.0)));
        assert_eq!(lines[2], Line::new((5.0, 0.0), (5.0, 4.0)));
    }

    #[test]
    fn closed_path_adds_closing_line() {
        let target = ProbeTarget {
            shape: ProbeShape::Path {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(4.0, 0.0),
                    Point::new(4.0, 4.0),
                ],
                closed: true,
            },
            quad: frame(0.0, 0.0, 4.0, 4.0),
        };
        let lines = target.probe_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], Line::new((4.0, 4.0), (0.0, 0.0)));
    }

    #[test]
    fn line_probe_hit_wins_over_polygon_search() {
        // One pixel on the diagonal, one near the quad center.
        let data = buffer_with(32, 32, &[(4, 4), (15, 14)]);
        let buf = IdBuffer::new(32, 32, &data).expect("sized buffer");
        let target = ProbeTarget {
            shape: ProbeShape::Frame,
            quad: frame(0.0, 0.0, 30.0, 30.0),
        };
        assert_eq!(
            target.recover_screen_point(&buf, 1.0),
            Some(Point::new(4.0, 4.0))
        );
    }

    #[test]
    fn polygon_search_covers_line_misses() {
        // Off every diagonal and midline.
        let data = buffer_with(32, 32, &[(20, 9)]);
        let buf = IdBuffer::new(32, 32, &data).expect("sized buffer");
        let target = ProbeTarget {
            shape: ProbeShape::Frame,
            quad: frame(0.0, 0.0, 30.0, 30.0),
        };
        assert_eq!(
            target.recover_screen_point(&buf, 1.0),
            Some(Point::new(20.0, 9.0))
        );
        let scene = target.recover_scene_point(&buf, 1.0, |p| Some((p.x * 2.0, p.y * 2.0)));
        assert_eq!(scene, Some((40.0, 18.0)));
    }

    #[test]
    fn nothing_rendered_means_no_point() {
        let data = buffer_with(16, 16, &[]);
        let buf = IdBuffer::new(16, 16, &data).expect("sized buffer");
        let target = ProbeTarget {
            shape: ProbeShape::Segment(Line::new((1.0, 1.0), (14.0, 9.0))),
            quad: frame(1.0, 1.0, 14.0, 9.0),
        };
        assert_eq!(target.recover_scene_point(&buf, 1.0, Some), None);
    }
}
