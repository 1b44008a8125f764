// src/extractors/heading.rs

//! Heuristic heading detection for supplier and template paragraphs.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::docx::{Paragraph, StyleSheet};

const SHORT_LABEL_MAX_CHARS: usize = 100;

static HEADING_TEXT_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[A-Z][a-zA-Z\s]+:$",  // "Storage Conditions:"
        r"^[0-9]+\.\s+[A-Z]",    // "3. Assay Procedure"
        r"^[A-Z][A-Z\s]+$",      // "TECHNICAL DETAILS"
    ]
    .iter()
    .map(|pat| Regex::new(pat).expect("Failed to compile HEADING_TEXT_RE"))
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphKind {
    Heading,
    Body,
}

/// Classifies a paragraph from its display style name, its text and whether
/// its first run is bold.
pub fn classify_paragraph(style_name: &str, text: &str, leading_run_bold: bool) -> ParagraphKind {
    let text = text.trim();
    if style_name.to_lowercase().starts_with("heading") || leading_run_bold {
        return ParagraphKind::Heading;
    }
    if text.is_empty() {
        return ParagraphKind::Body;
    }
    if text.chars().count() < SHORT_LABEL_MAX_CHARS && text.ends_with(':') {
        return ParagraphKind::Heading;
    }
    if HEADING_TEXT_RE.iter().any(|re| re.is_match(text)) {
        return ParagraphKind::Heading;
    }
    ParagraphKind::Body
}

/// Full heuristic, for supplier documents.
pub fn is_heading(styles: &StyleSheet, paragraph: &Paragraph) -> bool {
    let style = styles.display_name(paragraph.style_id());
    let leading_bold = paragraph.runs().next().is_some_and(|run| run.bold());
    classify_paragraph(&style, &paragraph.text(), leading_bold) == ParagraphKind::Heading
}

/// Heading by paragraph style alone. Template sections are bounded by these,
/// so bold lead-ins and colon labels in template prose stay body text.
pub fn is_styled_heading(styles: &StyleSheet, paragraph: &Paragraph) -> bool {
    let style = styles.display_name(paragraph.style_id());
    classify_paragraph(&style, "", false) == ParagraphKind::Heading
}
