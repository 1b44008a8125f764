// src/extractors/mod.rs
pub mod heading;
pub mod section;

// Re-export key extraction types for convenience
pub use heading::is_styled_heading;
pub use section::{
    CellSnapshot,
    ExtractedContent,
    ParagraphSnapshot,
    PictureSnapshot,
    RunSnapshot,
    SectionExtractor,
    TableSnapshot,
};
