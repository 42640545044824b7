//! Page-coordinate and color utilities.
//!
//! All unit conversions in the pipeline go through the fixed factors
//! defined here; there are no alternate DPI assumptions.

use serde::{Deserialize, Serialize};

/// Millimeters per PDF point.
pub const MM_PER_POINT: f32 = 0.352_778;

/// PDF points per millimeter.
pub const POINTS_PER_MM: f32 = 2.834_65;

/// Estimated millimeters per pixel for rasters without physical metadata
/// (96 DPI assumption, used for DOCX header images).
pub const MM_PER_PIXEL: f32 = 0.265;

/// Fraction of the page height treated as the header region.
pub const HEADER_RATIO: f32 = 0.25;

/// A4 page size in points.
pub const A4_WIDTH_PT: f32 = 595.0;
/// A4 page height in points.
pub const A4_HEIGHT_PT: f32 = 842.0;
/// A4 page width in millimeters.
pub const A4_WIDTH_MM: f32 = 210.0;

/// Convert points to millimeters.
pub fn pt_to_mm(pt: f32) -> f32 {
    pt * MM_PER_POINT
}

/// Convert millimeters to points.
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Convert pixels to estimated millimeters.
pub fn px_to_mm(px: f32) -> f32 {
    px * MM_PER_PIXEL
}

/// Header region height for a page, in the page's own units.
pub fn header_height(page_height: f32) -> f32 {
    page_height * HEADER_RATIO
}

/// Decompose a packed 24-bit RGB value into components.
pub fn unpack_rgb(color: u32) -> (u8, u8, u8) {
    (
        ((color >> 16) & 0xFF) as u8,
        ((color >> 8) & 0xFF) as u8,
        (color & 0xFF) as u8,
    )
}

/// Decompose a packed RGB value into 0.0–1.0 components for a PDF canvas.
pub fn rgb_components(color: u32) -> (f64, f64, f64) {
    let (r, g, b) = unpack_rgb(color);
    (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
}

/// An axis-aligned bounding box in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x0: f32,
    /// Top edge (source documents are Y-down)
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle width.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Rectangle height.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Whether the rectangle's top edge lies above the given Y threshold.
    pub fn starts_above(&self, y: f32) -> bool {
        self.y0 <= y
    }
}

/// A position and size in millimeters on the output page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MmBox {
    /// Left offset in mm
    pub x: f32,
    /// Top offset in mm
    pub y: f32,
    /// Width in mm
    pub width: f32,
    /// Height in mm
    pub height: f32,
}

impl MmBox {
    /// Derive a millimeter box from a point-unit bounding box.
    pub fn from_rect_pt(rect: &Rect) -> Self {
        Self {
            x: pt_to_mm(rect.x0),
            y: pt_to_mm(rect.y0),
            width: pt_to_mm(rect.width()),
            height: pt_to_mm(rect.height()),
        }
    }
}
