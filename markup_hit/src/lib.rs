// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Markup Hit: recovering scene points from rendered annotation silhouettes.
//!
//! The host renders every annotation into an id-buffer, an RGBA raster where anything that
//! is not pure white belongs to some annotation. This crate searches that raster for a pixel
//! of a given annotation and hands the result back to the host's coordinate transform.
//!
//! # Probes
//!
//! - [`line_probe`] walks a segment with a DDA, one device pixel per step, and stops at the
//!   first occluding pixel.
//! - [`polygon_probe`] searches outward in square rings from the center of a quad's bounds,
//!   accepting only occluding pixels inside the quad ([`point_in_polygon`]).
//!
//! Both refine a hit to the center of the occluding run one device pixel either side.
//!
//! # Recovery
//!
//! A [`ProbeTarget`] lists an annotation's cheap probe lines (centerline, diagonals, path
//! segments) and its bounding quad. [`ProbeTarget::recover_screen_point`] tries every line
//! before falling back to the ring search: a line can miss a point the ring search would
//! find, but it is far cheaper.
//!
//! # Picking
//!
//! The [`PreciseHitTest`] trait and [`pick_annotation`] answer pointer-over queries
//! analytically, with no raster involved.
//!
//! ```rust
//! use kurbo::{Line, Point};
//! use markup_hit::{IdBuffer, ProbeShape, ProbeTarget};
//!
//! let mut data = vec![0xFF_u8; 16 * 16 * 4];
//! data[(5 * 16 + 5) * 4] = 0; // one red-less pixel at (5, 5)
//! let buffer = IdBuffer::new(16, 16, &data).unwrap();
//!
//! let target = ProbeTarget {
//!     shape: ProbeShape::Segment(Line::new((0.0, 0.0), (10.0, 10.0))),
//!     quad: [
//!         Point::new(0.0, 0.0),
//!         Point::new(10.0, 0.0),
//!         Point::new(10.0, 10.0),
//!         Point::new(0.0, 10.0),
//!     ],
//! };
//! assert_eq!(target.recover_screen_point(&buffer, 1.0), Some(Point::new(5.0, 5.0)));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod buffer;
mod pick;
mod probe;
mod recover;

pub use buffer::{IdBuffer, RowOrder};
pub use pick::{HitKind, HitParams, HitScore, PreciseHitTest, Quad, StrokedPolyline, pick_annotation};
pub use probe::{line_probe, point_in_polygon, polygon_probe};
pub use recover::{ProbeShape, ProbeTarget};
