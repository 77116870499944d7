// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Consecutive-click counting.
//!
//! A press counts as the next click of a series when it uses the same button, lands within a
//! distance threshold of the previous click, and follows it within a time threshold. A press
//! whose pointer travels past the distance threshold before release is a drag, not a click,
//! and ends the series.
//!
//! ```
//! use markup_session::{Button, ClickCounter, PointerKind};
//! use kurbo::Point;
//!
//! let mut clicks = ClickCounter::with_thresholds(Some(5.0), Some(400));
//! let p = Point::new(10.0, 10.0);
//! assert_eq!(clicks.on_down(PointerKind::Mouse, Button::Primary, p, 0), 1);
//! clicks.on_up(PointerKind::Mouse, Button::Primary, p);
//! assert_eq!(clicks.on_down(PointerKind::Mouse, Button::Primary, p, 200), 2);
//! ```

use std::collections::BTreeMap;

use kurbo::Point;

use crate::{Button, PointerKind};

/// One press in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Press {
    /// Where the press started.
    pub down_position: Point,
    /// When the press started.
    pub down_time: u64,
    /// The pressed button.
    pub button: Button,
    /// Position of the press in its click series, starting at 1.
    pub count: u32,
    /// Whether the pointer has traveled past the distance threshold.
    pub distance_exceeded: bool,
}

/// Outcome of a release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickResult {
    /// The press completed a click; the value is its position in the series.
    Click(u32),
    /// The release did not complete a click.
    Suppressed,
}

/// Counts consecutive clicks per pointer device.
#[derive(Clone, Debug)]
pub struct ClickCounter {
    presses: BTreeMap<u8, Press>,
    /// Maximum travel, in screen pixels, for a press to stay a click and to join a series.
    ///
    /// `None` disables the distance check.
    pub distance_threshold: Option<f64>,
    /// Maximum delay in milliseconds between clicks of one series.
    ///
    /// `None` disables the time check.
    pub time_threshold: Option<u64>,
    last_click: Option<Press>,
}

fn slot(pointer: PointerKind) -> u8 {
    match pointer {
        PointerKind::Mouse => 0,
        PointerKind::Touch => 1,
        PointerKind::Pen => 2,
    }
}

impl ClickCounter {
    /// A counter with a 5 pixel, 400 millisecond double-click window.
    pub fn new() -> Self {
        Self::with_thresholds(Some(5.0), Some(400))
    }

    /// A counter with explicit thresholds.
    pub fn with_thresholds(distance_threshold: Option<f64>, time_threshold: Option<u64>) -> Self {
        Self {
            presses: BTreeMap::new(),
            distance_threshold,
            time_threshold,
            last_click: None,
        }
    }

    /// Record a press and return its position in the current click series.
    pub fn on_down(
        &mut self,
        pointer: PointerKind,
        button: Button,
        position: Point,
        timestamp: u64,
    ) -> u32 {
        let continues = self.last_click.is_some_and(|last| {
            last.button == button
                && self
                    .distance_threshold
                    .is_none_or(|threshold| last.down_position.distance(position) <= threshold)
                && self
                    .time_threshold
                    .is_none_or(|threshold| timestamp.saturating_sub(last.down_time) <= threshold)
        });
        let count = match (continues, self.last_click) {
            (true, Some(last)) => last.count.saturating_add(1),
            _ => 1,
        };
        self.presses.insert(
            slot(pointer),
            Press {
                down_position: position,
                down_time: timestamp,
                button,
                count,
                distance_exceeded: false,
            },
        );
        count
    }

    /// Track pointer travel. Returns `true` when the press just turned into a drag.
    pub fn on_move(&mut self, pointer: PointerKind, position: Point) -> bool {
        let Some(press) = self.presses.get_mut(&slot(pointer)) else {
            return false;
        };
        if press.distance_exceeded {
            return false;
        }
        let exceeded = self
            .distance_threshold
            .is_some_and(|threshold| press.down_position.distance(position) > threshold);
        press.distance_exceeded = exceeded;
        exceeded
    }

    /// Complete a press.
    pub fn on_up(&mut self, pointer: PointerKind, button: Button, position: Point) -> ClickResult {
        let Some(press) = self.presses.remove(&slot(pointer)) else {
            return ClickResult::Suppressed;
        };
        if press.button != button || press.distance_exceeded {
            self.last_click = None;
            return ClickResult::Suppressed;
        }
        let distance_ok = self
            .distance_threshold
            .is_none_or(|threshold| press.down_position.distance(position) <= threshold);
        if distance_ok {
            self.last_click = Some(press);
            ClickResult::Click(press.count)
        } else {
            self.last_click = None;
            ClickResult::Suppressed
        }
    }

    /// Abandon the press of `pointer`. Returns `true` if one was in flight.
    pub fn cancel(&mut self, pointer: PointerKind) -> bool {
        self.presses.remove(&slot(pointer)).is_some()
    }

    /// Whether `pointer` has a press in flight.
    pub fn is_pressed(&self, pointer: PointerKind) -> bool {
        self.presses.contains_key(&slot(pointer))
    }

    /// The last completed click.
    pub fn last_click(&self) -> Option<Press> {
        self.last_click
    }

    /// Forget presses in flight and end the current series.
    pub fn clear(&mut self) {
        self.presses.clear();
        self.last_click = None;
    }
}

impl Default for ClickCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOUSE: PointerKind = PointerKind::Mouse;
    const PRIMARY: Button = Button::Primary;

    fn click(counter: &mut ClickCounter, at: Point, time: u64) -> (u32, ClickResult) {
        let count = counter.on_down(MOUSE, PRIMARY, at, time);
        (count, counter.on_up(MOUSE, PRIMARY, at))
    }

    #[test]
    fn quick_clicks_form_a_series() {
        let mut counter = ClickCounter::new();
        let p = Point::new(10.0, 20.0);
        assert_eq!(click(&mut counter, p, 1000), (1, ClickResult::Click(1)));
        assert_eq!(
            click(&mut counter, Point::new(12.0, 22.0), 1200),
            (2, ClickResult::Click(2))
        );
        assert_eq!(click(&mut counter, p, 1400), (3, ClickResult::Click(3)));
    }

    #[test]
    fn slow_or_distant_click_starts_over() {
        let mut counter = ClickCounter::new();
        let p = Point::new(10.0, 20.0);
        click(&mut counter, p, 1000);
        assert_eq!(click(&mut counter, p, 1500).0, 1);
        assert_eq!(click(&mut counter, Point::new(30.0, 20.0), 1600).0, 1);
    }

    #[test]
    fn drag_is_not_a_click() {
        let mut counter = ClickCounter::new();
        let p = Point::new(10.0, 20.0);
        counter.on_down(MOUSE, PRIMARY, p, 1000);
        assert!(counter.on_move(MOUSE, Point::new(20.0, 20.0)));
        assert!(!counter.on_move(MOUSE, Point::new(40.0, 20.0)));
        assert_eq!(
            counter.on_up(MOUSE, PRIMARY, Point::new(40.0, 20.0)),
            ClickResult::Suppressed
        );
        assert_eq!(counter.last_click(), None);
    }

    #[test]
    fn wrong_button_or_no_press_is_suppressed() {
        let mut counter = ClickCounter::new();
        let p = Point::new(0.0, 0.0);
        assert_eq!(counter.on_up(MOUSE, PRIMARY, p), ClickResult::Suppressed);
        counter.on_down(MOUSE, PRIMARY, p, 0);
        assert!(counter.is_pressed(MOUSE));
        assert_eq!(
            counter.on_up(MOUSE, Button::Secondary, p),
            ClickResult::Suppressed
        );
        assert!(!counter.is_pressed(MOUSE));
    }

    #[test]
    fn no_thresholds_always_continue() {
        let mut counter = ClickCounter::with_thresholds(None, None);
        click(&mut counter, Point::new(0.0, 0.0), 0);
        assert_eq!(click(&mut counter, Point::new(500.0, 0.0), 90_000).0, 2);
        assert!(!counter.cancel(MOUSE));
    }
}
