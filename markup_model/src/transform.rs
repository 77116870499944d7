// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate-transform collaborator: screen pixels, annotation space, and the scene.

use kurbo::{Affine, Point};

/// A point in the host's scene (world) space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScenePoint {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate (depth along the view direction).
    pub z: f64,
}

/// Bidirectional conversions among screen-pixel, annotation, and scene spaces.
///
/// Screen space is measured in logical (CSS-like) pixels; multiply by
/// [`device_pixel_ratio`](CoordinateTransform::device_pixel_ratio) for device pixels, which is
/// the space of the id-buffer.
pub trait CoordinateTransform {
    /// Map an annotation-space point to screen space.
    fn annotation_to_screen(&self, p: Point) -> Point;

    /// Map a screen-space point to annotation space.
    fn screen_to_annotation(&self, p: Point) -> Point;

    /// Recover the scene point beneath a screen-space point, if the host can.
    fn screen_to_scene(&self, p: Point) -> Option<ScenePoint>;

    /// Device pixels per screen pixel.
    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }

    /// Screen pixels per annotation unit.
    fn screen_scale(&self) -> f64 {
        let a = self.annotation_to_screen(Point::ZERO);
        let b = self.annotation_to_screen(Point::new(1.0, 0.0));
        a.distance(b)
    }

    /// Length of the visible view diagonal in annotation units.
    fn view_diagonal(&self) -> f64;
}

/// A [`CoordinateTransform`] backed by a single affine map.
///
/// Annotation space lifts to scene space at `z = 0`, which is what a flat 2D sheet viewer
/// provides.
#[derive(Clone, Copy, Debug)]
pub struct AffineViewport {
    to_screen: Affine,
    device_pixel_ratio: f64,
    screen_width: f64,
    screen_height: f64,
}

impl AffineViewport {
    /// Build from an annotation→screen affine and the visible screen extents.
    pub fn new(to_screen: Affine, screen_width: f64, screen_height: f64) -> Self {
        Self {
            to_screen,
            device_pixel_ratio: 1.0,
            screen_width,
            screen_height,
        }
    }

    /// Identity map over a 1000×1000 pixel view.
    pub fn identity() -> Self {
        Self::new(Affine::IDENTITY, 1000.0, 1000.0)
    }

    /// Set device pixels per screen pixel.
    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = if ratio > 0.0 { ratio } else { 1.0 };
        self
    }

    /// Replace the annotation→screen map (pan/zoom).
    pub fn set_view(&mut self, to_screen: Affine) {
        self.to_screen = to_screen;
    }
}

impl CoordinateTransform for AffineViewport {
    fn annotation_to_screen(&self, p: Point) -> Point {
        self.to_screen * p
    }

    fn screen_to_annotation(&self, p: Point) -> Point {
        self.to_screen.inverse() * p
    }

    fn screen_to_scene(&self, p: Point) -> Option<ScenePoint> {
        if self.to_screen.determinant().abs() < f64::EPSILON {
            return None;
        }
        let a = self.screen_to_annotation(p);
        Some(ScenePoint {
            x: a.x,
            y: a.y,
            z: 0.0,
        })
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    fn view_diagonal(&self) -> f64 {
        let inv = self.to_screen.inverse();
        let a = inv * Point::ZERO;
        let b = inv * Point::new(self.screen_width, self.screen_height);
        a.distance(b)
    }
}
