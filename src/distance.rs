//! Near-bottom detection.

/// Scroll geometry sampled from the host page, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geometry {
    pub document_height: f64,
    pub viewport_height: f64,
    pub scroll_offset: f64,
}

impl Geometry {
    /// Distance left between the viewport bottom and the document end.
    pub fn remaining(&self) -> f64 {
        self.document_height - self.scroll_offset - self.viewport_height
    }
}

/// Distance from the pagination anchor to the end of the document.
///
/// Falls back to the whole document height when the anchor can't be located.
pub fn nav_distance(document_height: f64, anchor_offset: Option<f64>) -> f64 {
    match anchor_offset {
        Some(offset) => document_height - offset,
        None => document_height,
    }
}

/// True once the remaining scroll distance, minus the buffer, has dropped
/// below the nav-to-bottom distance measured at setup.
pub fn near_bottom(geometry: &Geometry, nav_distance: f64, buffer: f64) -> bool {
    geometry.remaining() - buffer < nav_distance
}
