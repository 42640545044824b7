//! Extracted image placements.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::geometry::{header_height, MmBox, Rect};

/// An image found in the source document, extracted to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePlacement {
    /// Path of the extracted raster file
    pub path: PathBuf,
    /// Pixel width of the raster
    pub width_px: u32,
    /// Pixel height of the raster
    pub height_px: u32,
    /// Bounding box in source page coordinates (points, Y-down)
    pub bbox: Rect,
    /// Derived millimeter position and size on the output page
    pub position: MmBox,
}

impl ImagePlacement {
    /// Whether the placement lies within the header region of a page with
    /// the given height (top 25%, in source coordinates).
    pub fn in_header(&self, page_height: f32) -> bool {
        self.bbox.starts_above(header_height(page_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(y0: f32) -> ImagePlacement {
        ImagePlacement {
            path: PathBuf::from("logo.png"),
            width_px: 100,
            height_px: 50,
            bbox: Rect::new(40.0, y0, 140.0, y0 + 50.0),
            position: MmBox::default(),
        }
    }

    #[test]
    fn test_in_header() {
        // Header region of an 842pt page ends at 210.5pt.
        assert!(placement(30.0).in_header(842.0));
        assert!(placement(210.0).in_header(842.0));
        assert!(!placement(400.0).in_header(842.0));
    }
}
