// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session tunables.

use kurbo::Size;
use markup_path::CloudParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A configuration document that could not be parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The text is not a valid configuration object.
    #[error("invalid session configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Every tunable constant of an [`EditSession`](crate::EditSession).
///
/// Absent fields take their default, so a partial JSON object is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Screen-space radius around the first vertex that closes a polyline or polycloud.
    pub snap_radius_px: f64,
    /// Minimum on-screen extent for drag and segment creations.
    pub min_size_px: f64,
    /// Cloud fillet radius in annotation units.
    pub bump_radius: f64,
    /// Fraction of the view diagonal used as the stroke simplification distance.
    pub simplify_tolerance: f64,
    /// Use Douglas-Peucker alone, skipping the radial pre-pass.
    pub highest_quality_simplify: bool,
    /// Live-smoothing window capacity.
    pub smoothing_window: usize,
    /// Delay before mouse input is accepted again after a touch gesture ends.
    pub touch_reenable_delay_ms: u64,
    /// Maximum pointer travel between the clicks of a double-click.
    pub double_click_distance_px: f64,
    /// Maximum time between the clicks of a double-click.
    pub double_click_time_ms: u64,
    /// Pointer-over margin as a multiple of the stroke width.
    pub stroke_pick_margin: f64,
    /// Maximum undo steps kept; `None` keeps everything.
    pub history_limit: Option<usize>,
    /// Width and height of a freshly placed text or stamp.
    pub default_text_size: [f64; 2],
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            snap_radius_px: 10.0,
            min_size_px: 5.0,
            bump_radius: 10.0,
            simplify_tolerance: 0.0015,
            highest_quality_simplify: false,
            smoothing_window: 5,
            touch_reenable_delay_ms: 500,
            double_click_distance_px: 5.0,
            double_click_time_ms: 400,
            stroke_pick_margin: 2.0,
            history_limit: None,
            default_text_size: [160.0, 40.0],
        }
    }
}

impl SessionConfig {
    /// Parse a JSON object; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Cloud outline parameters.
    pub fn cloud_params(&self) -> CloudParams {
        CloudParams {
            bump_radius: self.bump_radius,
        }
    }

    /// Size of a freshly placed text or stamp.
    pub fn text_size(&self) -> Size {
        let [width, height] = self.default_text_size;
        Size::new(width, height)
    }
}
