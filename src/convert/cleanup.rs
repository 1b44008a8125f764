// src/convert/cleanup.rs

use crate::docx::xml::PropertyBag;
use crate::docx::{Alignment, Block, BodyFormat, Paragraph, Run, StyleSheet, WordDocument};
use crate::replace::replace_in_document;
use crate::utils::error::DocxError;

use super::splice::{next_heading, BRAND_REPLACEMENTS};

const DISCLAIMER_LABEL: &str = "DISCLAIMER: ";
const DISCLAIMER_COLOR: &str = "0000FF";
const DISCLAIMER_TEXT: &str = concat!(
    "This information is believed to be correct but does not claim to be all-inclusive ",
    "and shall be used only as a guide. The supplier of this kit shall not be held liable ",
    "for any damage resulting from handling of or contact with the above product.\n",
    "This material is sold for in-vitro use only in manufacturing and research. ",
    "This material is not suitable for human use. It is the responsibility of the user ",
    "to undertake sufficient verification and testing to determine the suitability of ",
    "each product\u{2019}s application. The statements herein are offered for informational ",
    "purposes only and are intended to be used solely for your consideration, ",
    "investigation and verification."
);

const DISCLAIMER_TRIGGERS: &[&str] = &[
    "disclaimer",
    "in-vitro use only",
    "not suitable for human use",
    "sufficient verification and testing",
    "statements herein are offered for informational purposes",
];

pub fn body_format() -> BodyFormat {
    BodyFormat {
        font: "Calibri".to_string(),
        size_pt: 11.0,
        color: "000000".to_string(),
        line_spacing: 1.15,
    }
}

fn single_column(section: &mut PropertyBag) {
    section.set_empty("cols", &[("num", "1"), ("space", "0")]);
}

/// Normal style to Calibri 11pt black at 1.15 spacing; every section to one
/// column.
pub fn apply_global_formatting(doc: &mut WordDocument) -> Result<(), DocxError> {
    if !doc.styles.apply_body_format(&body_format())? {
        tracing::warn!("Template has no default paragraph style, body font left unchanged");
    }

    let mut sections = 0;
    for block in &mut doc.body.blocks {
        if let Block::SectionBreak(section) = block {
            single_column(section);
            sections += 1;
        }
    }
    doc.body.for_each_paragraph_mut(&mut |paragraph| {
        if let Some(section) = paragraph.section.as_mut() {
            single_column(section);
            sections += 1;
        }
    });
    tracing::debug!("Forced single column layout on {} sections", sections);
    Ok(())
}

fn is_disclaimer(paragraph: &Paragraph) -> bool {
    let mentions = |text: String| {
        let lower = text.to_lowercase();
        DISCLAIMER_TRIGGERS.iter().any(|phrase| lower.contains(phrase))
    };
    mentions(paragraph.text()) || paragraph.runs().any(|run| mentions(run.text()))
}

/// Drops paragraphs carrying disclaimer wording. Paragraphs that close a
/// document section are emptied instead.
pub fn remove_disclaimers(blocks: &mut Vec<Block>) -> usize {
    let mut removed = 0;
    blocks.retain_mut(|block| {
        let Block::Paragraph(paragraph) = block else {
            return true;
        };
        if !is_disclaimer(paragraph) {
            return true;
        }
        removed += 1;
        if paragraph.section.is_some() {
            paragraph.inlines.clear();
            true
        } else {
            false
        }
    });
    removed
}

pub fn disclaimer_paragraph() -> Paragraph {
    let mut label = Run::new(DISCLAIMER_LABEL);
    label.set_bold(true);
    label.set_color(DISCLAIMER_COLOR);
    let mut text = Run::new(DISCLAIMER_TEXT);
    text.set_italic(true);

    let mut paragraph = Paragraph::with_runs(vec![label, text]);
    paragraph.set_alignment(Alignment::Justify);
    paragraph
}

/// Removes existing disclaimers and appends the standard one before the
/// final section properties. Returns how many were removed.
pub fn replace_disclaimer(blocks: &mut Vec<Block>) -> usize {
    let removed = remove_disclaimers(blocks);
    let position = match blocks.last() {
        Some(Block::SectionBreak(_)) => blocks.len() - 1,
        _ => blocks.len(),
    };
    blocks.insert(position, Block::Paragraph(disclaimer_paragraph()));
    tracing::debug!("Replaced {} disclaimer paragraphs", removed);
    removed
}

/// Deletes every section whose heading text equals one of `names`, up to the
/// next heading. Section properties are kept.
pub fn remove_sections(blocks: &mut Vec<Block>, styles: &StyleSheet, names: &[String]) -> Vec<String> {
    let mut removed = Vec::new();
    let mut index = 0;
    while index < blocks.len() {
        let matched = blocks[index]
            .as_paragraph()
            .map(|p| p.text().trim().to_string())
            .filter(|text| names.iter().any(|name| name == text));
        let Some(name) = matched else {
            index += 1;
            continue;
        };

        let end = next_heading(blocks, styles, index);
        let mut position = index;
        for _ in index..end {
            match &mut blocks[position] {
                Block::SectionBreak(_) => position += 1,
                Block::Paragraph(p) if p.section.is_some() => {
                    p.inlines.clear();
                    position += 1;
                }
                _ => {
                    blocks.remove(position);
                }
            }
        }
        tracing::info!("Removed section '{}'", name);
        removed.push(name);
        index = position;
    }
    removed
}

/// Brand substitutions over every story. Returns the replacement count.
pub fn replace_brands(doc: &mut WordDocument) -> usize {
    BRAND_REPLACEMENTS
        .iter()
        .map(|(find, replace)| replace_in_document(doc, find, replace))
        .sum()
}
