//! The authoritative signature field, stored in document points.
//!
//! Pixel rectangles are a derived view: the field is converted to pixels for
//! display at the current zoom and back when the user moves or resizes it.

use crate::geometry::PixelRect;

/// Placement of the signature on a page, origin top-left, units are
/// document points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignatureField {
    pub page_index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SignatureField {
    /// Converts an on-screen rectangle back to document points.
    ///
    /// `scale` is pixels per point and must be positive.
    pub fn from_pixel_rect(page_index: usize, rect: PixelRect, scale: f64) -> Self {
        Self {
            page_index,
            x: f64::from(rect.x) / scale,
            y: f64::from(rect.y) / scale,
            width: f64::from(rect.width) / scale,
            height: f64::from(rect.height) / scale,
        }
    }

    /// Projects the field into pixel space at the given scale.
    pub fn to_pixel_rect(&self, scale: f64) -> PixelRect {
        PixelRect::new(
            round_to_i32(self.x * scale),
            round_to_i32(self.y * scale),
            round_to_u32(self.width * scale),
            round_to_u32(self.height * scale),
        )
    }
}

fn round_to_i32(value: f64) -> i32 {
    let rounded = value.round();
    if rounded >= f64::from(i32::MAX) {
        i32::MAX
    } else if rounded <= f64::from(i32::MIN) {
        i32::MIN
    } else {
        rounded as i32
    }
}

fn round_to_u32(value: f64) -> u32 {
    let rounded = value.round();
    if rounded >= f64::from(u32::MAX) {
        u32::MAX
    } else if rounded <= 0.0 {
        0
    } else {
        rounded as u32
    }
}
