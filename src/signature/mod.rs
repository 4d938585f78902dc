//! Signature drawing and storage.
//!
//! [`SignatureCanvas`] is the headless drawing surface: black ink on a white
//! grayscale raster, built from pointer samples. Saved signatures live in a
//! [`store::SignatureStore`] and are referenced by path; stamping re-reads
//! the file, never a cached decode.

pub mod store;

use image::{GrayImage, Luma};
use imageproc::drawing::draw_line_segment_mut;

use crate::geometry::PixelPoint;

pub const CANVAS_WIDTH: u32 = 500;
pub const CANVAS_HEIGHT: u32 = 200;

const WHITE: Luma<u8> = Luma([255]);
const INK: Luma<u8> = Luma([0]);

/// In-memory signature drawing surface.
#[derive(Debug, Clone)]
pub struct SignatureCanvas {
    image: GrayImage,
    last_point: Option<PixelPoint>,
}

impl Default for SignatureCanvas {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

impl SignatureCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::from_pixel(width, height, WHITE),
            last_point: None,
        }
    }

    pub fn begin_stroke(&mut self, pos: PixelPoint) {
        self.draw_segment(pos, pos);
        self.last_point = Some(pos);
    }

    /// Connects the previous sample to `pos`. Without a stroke in progress
    /// this is a no-op.
    pub fn extend_stroke(&mut self, pos: PixelPoint) {
        let Some(last) = self.last_point else {
            return;
        };
        self.draw_segment(last, pos);
        self.last_point = Some(pos);
    }

    pub fn end_stroke(&mut self) {
        self.last_point = None;
    }

    pub fn clear(&mut self) {
        let (width, height) = self.image.dimensions();
        self.image = GrayImage::from_pixel(width, height, WHITE);
        self.last_point = None;
    }

    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|pixel| *pixel == WHITE)
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    // 3 px nib: the segment plus its eight one-pixel offsets.
    fn draw_segment(&mut self, from: PixelPoint, to: PixelPoint) {
        for dx in -1..=1i32 {
            for dy in -1..=1i32 {
                draw_line_segment_mut(
                    &mut self.image,
                    ((from.x + dx) as f32, (from.y + dy) as f32),
                    ((to.x + dx) as f32, (to.y + dy) as f32),
                    INK,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_canvas_is_blank_white() {
        let canvas = SignatureCanvas::default();
        assert!(canvas.is_blank());
        assert_eq!(canvas.image().dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
    }

    #[test]
    fn a_stroke_leaves_ink_along_its_path() {
        let mut canvas = SignatureCanvas::new(100, 50);
        canvas.begin_stroke(PixelPoint::new(10, 25));
        canvas.extend_stroke(PixelPoint::new(60, 25));
        canvas.end_stroke();

        assert!(!canvas.is_blank());
        assert_eq!(canvas.image().get_pixel(30, 25), &Luma([0]));
        // Nib is 3 px wide.
        assert_eq!(canvas.image().get_pixel(30, 24), &Luma([0]));
        assert_eq!(canvas.image().get_pixel(30, 26), &Luma([0]));
    }

    #[test]
    fn extend_without_begin_is_ignored() {
        let mut canvas = SignatureCanvas::new(100, 50);
        canvas.extend_stroke(PixelPoint::new(50, 25));
        assert!(canvas.is_blank());
    }

    #[test]
    fn strokes_are_not_joined_across_end_stroke() {
        let mut canvas = SignatureCanvas::new(100, 50);
        canvas.begin_stroke(PixelPoint::new(5, 10));
        canvas.end_stroke();
        canvas.begin_stroke(PixelPoint::new(95, 40));
        canvas.end_stroke();

        // The midpoint between the two dots stays white.
        assert_eq!(canvas.image().get_pixel(50, 25), &Luma([255]));
    }

    #[test]
    fn clear_resets_to_white() {
        let mut canvas = SignatureCanvas::new(100, 50);
        canvas.begin_stroke(PixelPoint::new(10, 10));
        canvas.extend_stroke(PixelPoint::new(90, 40));
        canvas.clear();
        assert!(canvas.is_blank());
    }
}
