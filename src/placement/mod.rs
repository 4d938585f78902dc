//! Rectangle placement and drag interaction for the displayed page.
//!
//! This state machine owns only the derived pixel rectangle. Whenever an
//! interaction settles (creation, drag release, resize) it emits the
//! authoritative [`SignatureField`] for the session to store.

use tracing::debug;

use crate::field::SignatureField;
use crate::geometry::{clamp_rect_to_bounds, PixelBounds, PixelPoint, PixelRect};

pub const DEFAULT_BOX_WIDTH_PX: u32 = 150;
pub const DEFAULT_BOX_HEIGHT_PX: u32 = 50;
pub const MIN_BOX_WIDTH_PX: u32 = 20;
pub const MIN_BOX_HEIGHT_PX: u32 = 10;

#[derive(Debug, Clone, Copy)]
struct DragState {
    offset_x: i32,
    offset_y: i32,
}

/// Interaction state for one rendered page.
#[derive(Debug)]
pub struct PagePlacement {
    page_index: usize,
    page_bounds: Option<PixelBounds>,
    scale: f64,
    signature_mode: bool,
    rect: Option<PixelRect>,
    drag: Option<DragState>,
    default_width_px: u32,
    default_height_px: u32,
}

impl Default for PagePlacement {
    fn default() -> Self {
        Self::new()
    }
}

impl PagePlacement {
    pub fn new() -> Self {
        Self {
            page_index: 0,
            page_bounds: None,
            scale: 1.0,
            signature_mode: false,
            rect: None,
            drag: None,
            default_width_px: DEFAULT_BOX_WIDTH_PX,
            default_height_px: DEFAULT_BOX_HEIGHT_PX,
        }
    }

    /// Establishes which rendered page the pointer coordinates refer to.
    pub fn set_page(&mut self, page_index: usize, bounds: PixelBounds, scale: f64) {
        self.page_index = page_index;
        self.page_bounds = Some(bounds);
        self.scale = scale;
    }

    pub fn set_signature_mode(&mut self, enabled: bool) {
        self.signature_mode = enabled;
    }

    pub fn signature_mode(&self) -> bool {
        self.signature_mode
    }

    pub fn rect(&self) -> Option<PixelRect> {
        self.rect
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Pointer press. Starts a drag when the press lands inside the existing
    /// rectangle; otherwise, in signature mode, creates a new default-sized
    /// rectangle anchored at the press point and emits its field.
    pub fn pointer_down(&mut self, pos: PixelPoint) -> Option<SignatureField> {
        let bounds = self.page_bounds?;

        if let Some(rect) = self.rect {
            if rect.contains(pos) {
                self.drag = Some(DragState {
                    offset_x: pos.x - rect.x,
                    offset_y: pos.y - rect.y,
                });
                debug!(x = pos.x, y = pos.y, "drag started");
                return None;
            }
        }

        if !self.signature_mode {
            return None;
        }

        let created = clamp_rect_to_bounds(
            PixelRect::new(pos.x, pos.y, self.default_width_px, self.default_height_px),
            bounds,
        );
        self.rect = Some(created);
        debug!(
            x = created.x,
            y = created.y,
            width = created.width,
            height = created.height,
            "signature box created"
        );
        Some(self.field_from(created))
    }

    /// Pointer motion. Moves the rectangle while a drag is in progress,
    /// clamped to the page. Returns whether the rectangle changed. No field
    /// is emitted mid-drag.
    pub fn pointer_move(&mut self, pos: PixelPoint) -> bool {
        let (Some(drag), Some(rect), Some(bounds)) = (self.drag, self.rect, self.page_bounds)
        else {
            return false;
        };

        let moved = clamp_rect_to_bounds(
            PixelRect::new(
                pos.x - drag.offset_x,
                pos.y - drag.offset_y,
                rect.width,
                rect.height,
            ),
            bounds,
        );
        let changed = moved != rect;
        self.rect = Some(moved);
        changed
    }

    /// Pointer release. Ends the drag and emits the settled field.
    pub fn pointer_up(&mut self) -> Option<SignatureField> {
        if self.drag.take().is_none() {
            return None;
        }
        let rect = self.rect?;
        debug!(x = rect.x, y = rect.y, "drag released");
        Some(self.field_from(rect))
    }

    /// Scales the rectangle around its center, or the default creation size
    /// when no rectangle exists yet. Sizes floor at 20x10 px.
    pub fn resize(&mut self, factor: f64) -> Option<SignatureField> {
        if factor <= 0.0 {
            return None;
        }

        let Some(rect) = self.rect else {
            self.default_width_px =
                scale_dimension(self.default_width_px, factor, MIN_BOX_WIDTH_PX);
            self.default_height_px =
                scale_dimension(self.default_height_px, factor, MIN_BOX_HEIGHT_PX);
            return None;
        };
        let bounds = self.page_bounds?;

        let width = scale_dimension(rect.width, factor, MIN_BOX_WIDTH_PX);
        let height = scale_dimension(rect.height, factor, MIN_BOX_HEIGHT_PX);
        let center = rect.center();
        let resized = clamp_rect_to_bounds(
            PixelRect::new(
                center.x - i32::try_from(width / 2).unwrap_or(i32::MAX),
                center.y - i32::try_from(height / 2).unwrap_or(i32::MAX),
                width,
                height,
            ),
            bounds,
        );
        self.rect = Some(resized);
        Some(self.field_from(resized))
    }

    /// Drops the rectangle and any in-progress drag.
    pub fn clear(&mut self) {
        self.rect = None;
        self.drag = None;
    }

    /// Forgets the rendered page entirely. Pointer events are ignored until
    /// `set_page` establishes a new one.
    pub fn clear_page(&mut self) {
        self.page_bounds = None;
        self.signature_mode = false;
        self.rect = None;
        self.drag = None;
    }

    /// Reprojects an authoritative field at the current scale. A field on a
    /// different page than the one displayed renders as absent.
    pub fn show_field(&mut self, field: Option<&SignatureField>) {
        self.drag = None;
        self.rect = match field {
            Some(field) if field.page_index == self.page_index => {
                Some(field.to_pixel_rect(self.scale))
            }
            _ => None,
        };
    }

    fn field_from(&self, rect: PixelRect) -> SignatureField {
        SignatureField::from_pixel_rect(self.page_index, rect, self.scale)
    }
}

fn scale_dimension(value: u32, factor: f64, floor: u32) -> u32 {
    let scaled = f64::from(value) * factor;
    let truncated = if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else if scaled <= 0.0 {
        0
    } else {
        scaled as u32
    };
    truncated.max(floor)
}
