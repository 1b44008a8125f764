// src/extractors/section.rs

// --- Imports ---
use serde::Serialize;

use crate::docx::media::{resolve_image, ImageData};
use crate::docx::{Block, Cell, Paragraph, Table, WordDocument};
use crate::profiles::SourcePattern;

use super::heading::is_heading;

// --- Data Structures ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSnapshot {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

/// Text and runs of one source paragraph, captured by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParagraphSnapshot {
    pub text: String,
    pub runs: Vec<RunSnapshot>,
}

impl ParagraphSnapshot {
    pub fn capture(paragraph: &Paragraph) -> Self {
        Self {
            text: paragraph.text(),
            runs: paragraph
                .runs()
                .map(|run| RunSnapshot {
                    text: run.text(),
                    bold: run.bold(),
                    italic: run.italic(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellSnapshot {
    pub paragraphs: Vec<ParagraphSnapshot>,
}

impl CellSnapshot {
    fn capture(cell: &Cell) -> Self {
        Self {
            paragraphs: cell.paragraphs().map(ParagraphSnapshot::capture).collect(),
        }
    }

    /// Paragraph texts joined by newlines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSnapshot {
    pub rows: Vec<Vec<CellSnapshot>>,
}

impl TableSnapshot {
    pub fn capture(table: &Table) -> Self {
        Self {
            rows: table
                .rows
                .iter()
                .map(|row| row.cells.iter().map(CellSnapshot::capture).collect())
                .collect(),
        }
    }

    /// Trimmed first-row cell texts.
    pub fn header(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.iter().map(|c| c.text().trim().to_string()).collect())
            .unwrap_or_default()
    }

    pub fn data_rows(&self) -> &[Vec<CellSnapshot>] {
        self.rows.get(1..).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PictureSnapshot {
    pub rel_id: String,
    /// Extent in EMU as drawn in the source.
    pub extent: Option<(u64, u64)>,
    #[serde(skip)]
    pub image: ImageData,
}

/// A source section: a heading and everything up to the next heading.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedSection {
    pub heading: String,
    pub paragraphs: Vec<ParagraphSnapshot>,
    /// Indices into `ExtractedContent::tables`.
    pub tables: Vec<usize>,
    /// Indices into `ExtractedContent::pictures`.
    pub pictures: Vec<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractedContent {
    pub sections: Vec<ExtractedSection>,
    pub tables: Vec<TableSnapshot>,
    pub pictures: Vec<PictureSnapshot>,
}

impl ExtractedContent {
    /// First section whose heading matches `pattern`.
    pub fn find(&self, pattern: &SourcePattern) -> Option<&ExtractedSection> {
        self.sections.iter().find(|s| pattern.matches(&s.heading))
    }

    pub fn section_tables<'a>(
        &'a self,
        section: &'a ExtractedSection,
    ) -> impl Iterator<Item = &'a TableSnapshot> + 'a {
        section.tables.iter().filter_map(|&i| self.tables.get(i))
    }

    pub fn section_pictures<'a>(
        &'a self,
        section: &'a ExtractedSection,
    ) -> impl Iterator<Item = &'a PictureSnapshot> + 'a {
        section.pictures.iter().filter_map(|&i| self.pictures.get(i))
    }
}

// --- Main Extractor Structure ---
#[derive(Debug, Default)]
pub struct SectionExtractor;

impl SectionExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Segments the document body into heading-delimited sections.
    pub fn extract(&self, doc: &WordDocument) -> ExtractedContent {
        let mut content = ExtractedContent::default();
        let mut dropped_before_first_heading = 0usize;

        for block in &doc.body.blocks {
            match block {
                Block::Paragraph(paragraph) => {
                    let pictures = self.capture_pictures(doc, paragraph, &mut content);
                    if let Some(section) = content.sections.last_mut() {
                        section.pictures.extend(pictures);
                    }

                    let text = paragraph.text();
                    if text.trim().is_empty() {
                        continue;
                    }
                    if is_heading(&doc.styles, paragraph) {
                        tracing::trace!("Found section heading: '{}'", text.trim());
                        content.sections.push(ExtractedSection {
                            heading: text.trim().to_string(),
                            paragraphs: Vec::new(),
                            tables: Vec::new(),
                            pictures: Vec::new(),
                        });
                    } else if let Some(section) = content.sections.last_mut() {
                        section.paragraphs.push(ParagraphSnapshot::capture(paragraph));
                    } else {
                        dropped_before_first_heading += 1;
                    }
                }
                Block::Table(table) => {
                    let index = content.tables.len();
                    content.tables.push(TableSnapshot::capture(table));
                    if let Some(section) = content.sections.last_mut() {
                        section.tables.push(index);
                    }
                }
                Block::SectionBreak(_) | Block::Opaque(_) => {}
            }
        }

        if dropped_before_first_heading > 0 {
            tracing::debug!(
                "Ignored {} paragraphs before the first heading",
                dropped_before_first_heading
            );
        }
        tracing::info!(
            "Extracted {} sections, {} tables, {} pictures",
            content.sections.len(),
            content.tables.len(),
            content.pictures.len()
        );
        content
    }

    /// Resolves the paragraph's inline pictures into `content.pictures` and
    /// returns their indices.
    fn capture_pictures(
        &self,
        doc: &WordDocument,
        paragraph: &Paragraph,
        content: &mut ExtractedContent,
    ) -> Vec<usize> {
        let mut indices = Vec::new();
        for drawing in paragraph.runs().flat_map(|run| run.drawings()) {
            let Some(rel_id) = &drawing.embed else {
                continue;
            };
            match resolve_image(doc.package(), &doc.body.name, rel_id) {
                Ok(Some(image)) => {
                    indices.push(content.pictures.len());
                    content.pictures.push(PictureSnapshot {
                        rel_id: rel_id.clone(),
                        extent: drawing.extent,
                        image,
                    });
                }
                Ok(None) => tracing::debug!("Picture {} has no image part", rel_id),
                Err(e) => tracing::warn!("Could not read picture {}: {}", rel_id, e),
            }
        }
        indices
    }
}
