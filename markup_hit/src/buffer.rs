// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only view over a rendered id-buffer.

use kurbo::Rect;

/// Storage order of the rows of an id-buffer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RowOrder {
    /// Row 0 is the top of the view.
    #[default]
    TopDown,
    /// Row 0 is the bottom of the view, as in GL read-backs.
    BottomUp,
}

/// An RGBA8 raster used as an occlusion mask.
///
/// Any pixel whose red, green, or blue channel is not `0xFF` is occluding; alpha is ignored.
/// Pixel coordinates are device pixels with `y` growing downward regardless of
/// [`RowOrder`].
#[derive(Clone, Copy, Debug)]
pub struct IdBuffer<'a> {
    width: usize,
    height: usize,
    data: &'a [u8],
    rows: RowOrder,
}

impl<'a> IdBuffer<'a> {
    /// Wrap `data` as a `width × height` top-down buffer.
    ///
    /// Returns `None` if `data` holds fewer than `width * height * 4` bytes.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Option<Self> {
        let needed = width.checked_mul(height)?.checked_mul(4)?;
        (data.len() >= needed).then_some(Self {
            width,
            height,
            data,
            rows: RowOrder::TopDown,
        })
    }

    /// Set the row order.
    pub fn with_row_order(mut self, rows: RowOrder) -> Self {
        self.rows = rows;
        self
    }

    /// Width in device pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in device pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The buffer extent in device pixels.
    #[allow(
        clippy::cast_precision_loss,
        reason = "Raster dimensions are far below 2^52."
    )]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }

    /// Whether the pixel at `(x, y)` is occluding. Out-of-range pixels never are.
    pub fn is_occluding(&self, x: i64, y: i64) -> bool {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return false;
        };
        if x >= self.width || y >= self.height {
            return false;
        }
        let row = match self.rows {
            RowOrder::TopDown => y,
            RowOrder::BottomUp => self.height - 1 - y,
        };
        let i = (row * self.width + x) * 4;
        self.data[i..i + 3].iter().any(|c| *c != 0xFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn short_data_is_rejected() {
        let data = vec![0xFF; 15];
        assert!(IdBuffer::new(2, 2, &data).is_none());
    }

    #[test]
    fn white_is_background_and_alpha_is_ignored() {
        let mut data = vec![0xFF; 2 * 2 * 4];
        data[3] = 0;
        let (x, y) = (1, 1);
        data[(y * 2 + x) * 4 + 2] = 0xFE;
        let buf = IdBuffer::new(2, 2, &data).expect("sized buffer");
        assert!(!buf.is_occluding(0, 0));
        assert!(buf.is_occluding(1, 1));
        assert!(!buf.is_occluding(-1, 0));
        assert!(!buf.is_occluding(2, 0));
    }

    #[test]
    fn bottom_up_rows_are_flipped() {
        let mut data = vec![0xFF; 3 * 4];
        // Row 0 in memory is the bottom row.
        data[0] = 0;
        let buf = IdBuffer::new(1, 3, &data)
            .expect("sized buffer")
            .with_row_order(RowOrder::BottomUp);
        assert!(buf.is_occluding(0, 2));
        assert!(!buf.is_occluding(0, 0));
    }
}
