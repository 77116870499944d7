// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Touch/mouse input arbitration.
//!
//! Browsers and some toolkits synthesize mouse events right after a tap. While a touch
//! gesture is active, and for a short delay after it ends, mouse events are ignored so the
//! synthetic click does not start a second gesture.

use tracing::trace;

use crate::{PointerEvent, PointerKind};

/// Decides which pointer events a session accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputArbitration {
    mouse_disabled: bool,
    enable_at: Option<u64>,
}

impl InputArbitration {
    /// Accept everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore mouse events until re-enabled.
    pub fn disable_mouse(&mut self) {
        self.mouse_disabled = true;
        self.enable_at = None;
    }

    /// Accept mouse events again, dropping any pending re-enable.
    pub fn enable_mouse(&mut self) {
        self.mouse_disabled = false;
        self.enable_at = None;
    }

    /// Re-enable mouse events once `delay_ms` has passed after `now_ms`.
    pub fn schedule_mouse_enable(&mut self, now_ms: u64, delay_ms: u64) {
        self.enable_at = Some(now_ms.saturating_add(delay_ms));
        trace!(at = now_ms.saturating_add(delay_ms), "mouse re-enable scheduled");
    }

    /// Fire the pending re-enable if its time has come.
    pub fn tick(&mut self, now_ms: u64) {
        if self.enable_at.is_some_and(|at| now_ms >= at) {
            self.enable_mouse();
        }
    }

    /// Whether mouse events are currently ignored.
    pub fn is_mouse_disabled(&self) -> bool {
        self.mouse_disabled
    }

    /// Whether `event` should reach the session. Fires a due re-enable first.
    pub fn accepts(&mut self, event: &PointerEvent) -> bool {
        self.tick(event.time_ms);
        match event.pointer {
            PointerKind::Mouse => !self.mouse_disabled,
            PointerKind::Touch | PointerKind::Pen => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_blocked_until_delay_passes() {
        let mut arbitration = InputArbitration::new();
        assert!(arbitration.accepts(&PointerEvent::mouse((0.0, 0.0), 0)));

        arbitration.disable_mouse();
        assert!(arbitration.accepts(&PointerEvent::touch((0.0, 0.0), 10)));
        assert!(!arbitration.accepts(&PointerEvent::mouse((0.0, 0.0), 20)));

        arbitration.schedule_mouse_enable(100, 500);
        assert!(!arbitration.accepts(&PointerEvent::mouse((0.0, 0.0), 599)));
        assert!(arbitration.accepts(&PointerEvent::mouse((0.0, 0.0), 600)));
        assert!(!arbitration.is_mouse_disabled());
    }

    #[test]
    fn new_touch_cancels_pending_enable() {
        let mut arbitration = InputArbitration::new();
        arbitration.disable_mouse();
        arbitration.schedule_mouse_enable(0, 500);
        arbitration.disable_mouse();
        arbitration.tick(1_000);
        assert!(arbitration.is_mouse_disabled());
    }
}
