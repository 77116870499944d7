// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Live smoothing of a stroke while it is being captured.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use kurbo::{Point, Vec2};

/// Sliding-window averaging of raw pointer samples.
///
/// The most recent `capacity` raw points live in a window. Each push commits the window
/// average as a finished vertex once the window is full (and at odd fill levels while it is
/// still ramping up, so the stroke starts exactly at the first sample). The vertices after the
/// last committed one form a provisional tail of averages over shrinking suffixes of the
/// window; the tail is rebuilt on every push and always ends at the newest raw sample, so the
/// visible stroke neither jitters nor lags behind the pointer.
///
/// ```rust
/// use kurbo::Point;
/// use markup_path::StrokeSmoother;
///
/// let mut smoother = StrokeSmoother::new(3);
/// for x in 0..6 {
///     smoother.push(Point::new(f64::from(x), 0.0));
/// }
/// let pts = smoother.points();
/// assert_eq!(pts.first(), Some(&Point::new(0.0, 0.0)));
/// assert_eq!(pts.last(), Some(&Point::new(5.0, 0.0)));
/// ```
#[derive(Clone, Debug)]
pub struct StrokeSmoother {
    capacity: usize,
    window: VecDeque<Point>,
    committed: Vec<Point>,
    tail: Vec<Point>,
}

fn average<'a>(points: impl Iterator<Item = &'a Point>) -> Point {
    let (sum, n) = points.fold((Vec2::ZERO, 0.0), |(sum, n), p| (sum + p.to_vec2(), n + 1.0));
    (sum / n).to_point()
}

impl StrokeSmoother {
    /// A smoother averaging over at most `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            window: VecDeque::with_capacity(capacity),
            committed: Vec::new(),
            tail: Vec::new(),
        }
    }

    /// Window capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a raw sample and rebuild the provisional tail.
    pub fn push(&mut self, p: Point) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(p);
        let len = self.window.len();
        if len == self.capacity || len % 2 == 1 {
            self.committed.push(average(self.window.iter()));
        }
        self.tail.clear();
        for k in 1..len {
            self.tail.push(average(self.window.range(k..)));
        }
    }

    /// Committed vertices followed by the provisional tail.
    pub fn points(&self) -> Vec<Point> {
        let mut out = Vec::with_capacity(self.committed.len() + self.tail.len());
        out.extend_from_slice(&self.committed);
        out.extend_from_slice(&self.tail);
        out
    }

    /// Take the smoothed stroke and reset.
    pub fn finish(&mut self) -> Vec<Point> {
        let out = self.points();
        self.clear();
        out
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.window.clear();
        self.committed.clear();
        self.tail.clear();
    }

    /// Whether no sample has been pushed since the last reset.
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }
}
