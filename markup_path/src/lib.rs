// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Markup Path: outline and stroke geometry, as pure functions over point sets.
//!
//! - [`cloud_outline`] and [`cloud_rect`] build the scalloped "cloud" outline used by cloud
//!   and polycloud annotations: filleted corners, overlap correction where neighboring
//!   fillets collide, and rows of outward bumps tiling each edge.
//! - [`simplify`] thins a finished freehand stroke with a radial pre-pass and
//!   Ramer–Douglas–Peucker, using a squared tolerance derived from the view diagonal by
//!   [`view_tolerance`].
//! - [`StrokeSmoother`] averages raw samples while a stroke is being captured.
//!
//! Outputs are [`kurbo::BezPath`] values or point lists, ready for a renderer or a hit tester.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Point, Shape};
//! use markup_path::{CloudParams, cloud_outline};
//!
//! let boundary = [
//!     Point::new(0.0, 0.0),
//!     Point::new(120.0, 0.0),
//!     Point::new(120.0, 80.0),
//!     Point::new(0.0, 80.0),
//! ];
//! let path = cloud_outline(&boundary, true, &CloudParams { bump_radius: 10.0 });
//! let bounds = path.bounding_box();
//! assert!(bounds.x0 < 0.0 && bounds.x1 > 120.0);
//! ```
//!
//! This crate is `no_std` and uses `alloc`; enable the `libm` feature when building without
//! `std`.

#![no_std]

extern crate alloc;

mod cloud;
mod simplify;
mod smooth;

pub use cloud::{
    CloudParams, Orientation, circle_intersections, cloud_outline, cloud_rect, corner_overlap,
    polyline_path,
};
pub use simplify::{simplify, simplify_douglas_peucker, simplify_radial, view_tolerance};
pub use smooth::StrokeSmoother;
