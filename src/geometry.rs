/// Pixel-space primitives shared by the placement state and the page view.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// On-screen rectangle in pixel units, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: PixelPoint) -> bool {
        let right = self
            .x
            .saturating_add(i32::try_from(self.width).unwrap_or(i32::MAX));
        let bottom = self
            .y
            .saturating_add(i32::try_from(self.height).unwrap_or(i32::MAX));
        point.x >= self.x && point.x < right && point.y >= self.y && point.y < bottom
    }

    pub fn top_left(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(
            self.x
                .saturating_add(i32::try_from(self.width / 2).unwrap_or(i32::MAX)),
            self.y
                .saturating_add(i32::try_from(self.height / 2).unwrap_or(i32::MAX)),
        )
    }
}

/// Extent of the rendered page image in pixels at the current zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub width: u32,
    pub height: u32,
}

impl PixelBounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Keeps a rectangle fully inside the page image.
///
/// When the rectangle is wider or taller than the page, the origin pins to 0
/// on that axis and the rectangle overflows the page edge.
pub fn clamp_rect_to_bounds(rect: PixelRect, bounds: PixelBounds) -> PixelRect {
    let max_x = i64::from(bounds.width) - i64::from(rect.width);
    let max_y = i64::from(bounds.height) - i64::from(rect.height);

    let x = i64::from(rect.x).clamp(0, max_x.max(0));
    let y = i64::from(rect.y).clamp(0, max_y.max(0));

    PixelRect::new(
        i32::try_from(x).unwrap_or(0),
        i32::try_from(y).unwrap_or(0),
        rect.width,
        rect.height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn contains_is_inclusive_of_top_left_and_exclusive_of_bottom_right() {
        let rect = PixelRect::new(10, 10, 20, 10);
        assert!(rect.contains(PixelPoint::new(10, 10)));
        assert!(rect.contains(PixelPoint::new(29, 19)));
        assert!(!rect.contains(PixelPoint::new(30, 10)));
        assert!(!rect.contains(PixelPoint::new(10, 20)));
        assert!(!rect.contains(PixelPoint::new(9, 10)));
    }

    #[test]
    fn center_points_at_the_middle_of_the_rect() {
        let rect = PixelRect::new(10, 20, 30, 10);
        assert_eq!(rect.center(), PixelPoint::new(25, 25));
    }

    #[test]
    fn clamp_moves_rect_back_inside_bounds() {
        let bounds = PixelBounds::new(100, 100);
        let clamped = clamp_rect_to_bounds(PixelRect::new(90, 95, 20, 10), bounds);
        assert_eq!(clamped, PixelRect::new(80, 90, 20, 10));

        let clamped = clamp_rect_to_bounds(PixelRect::new(-5, -7, 20, 10), bounds);
        assert_eq!(clamped, PixelRect::new(0, 0, 20, 10));
    }

    #[test]
    fn clamp_pins_oversized_rect_to_origin_and_allows_overflow() {
        let bounds = PixelBounds::new(100, 100);
        let clamped = clamp_rect_to_bounds(PixelRect::new(30, 40, 150, 30), bounds);
        assert_eq!(clamped.x, 0);
        assert_eq!(clamped.y, 40);
        assert_eq!(clamped.width, 150);

        let clamped = clamp_rect_to_bounds(PixelRect::new(30, 40, 150, 130), bounds);
        assert_eq!(clamped, PixelRect::new(0, 0, 150, 130));
    }

    proptest! {
        #[test]
        fn clamp_is_idempotent(
            x in -500i32..500,
            y in -500i32..500,
            width in 1u32..300,
            height in 1u32..300,
            page_w in 1u32..400,
            page_h in 1u32..400,
        ) {
            let bounds = PixelBounds::new(page_w, page_h);
            let once = clamp_rect_to_bounds(PixelRect::new(x, y, width, height), bounds);
            let twice = clamp_rect_to_bounds(once, bounds);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn clamp_keeps_rect_inside_when_it_fits(
            x in -500i32..500,
            y in -500i32..500,
            width in 1u32..100,
            height in 1u32..100,
        ) {
            let bounds = PixelBounds::new(200, 200);
            let clamped = clamp_rect_to_bounds(PixelRect::new(x, y, width, height), bounds);
            prop_assert!(clamped.x >= 0);
            prop_assert!(clamped.y >= 0);
            prop_assert!(clamped.x as i64 + i64::from(clamped.width) <= 200);
            prop_assert!(clamped.y as i64 + i64::from(clamped.height) <= 200);
        }
    }
}
