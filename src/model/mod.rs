//! Logical document model.
//!
//! This is the intermediate representation shared by both extraction
//! backends: ordered styled text blocks with bounding boxes, image
//! placements, decomposed tables, and the original header content carried
//! for re-rendering fidelity.

mod block;
mod document;
mod image;
mod question;
mod table;

pub use block::{StyleFlags, TextBlock, TextLine, TextSpan};
pub use document::{
    HeaderContent, HeaderOverrides, HeaderParagraph, HeaderRun, PositionedRun, SourceDocument,
};
pub use image::ImagePlacement;
pub use question::{Question, SegmentSignals};
pub use table::TableStructure;
