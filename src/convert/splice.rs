// src/convert/splice.rs

//! Template navigation and section content splicing.

use crate::docx::{Block, Paragraph, Run, StyleSheet};
use crate::extractors::{is_styled_heading, ExtractedContent, ParagraphSnapshot, RunSnapshot};
use crate::profiles::CompanyProfile;

/// Text substitutions applied to inserted content and, at the end, to the
/// whole template.
pub const BRAND_REPLACEMENTS: &[(&str, &str)] = &[("Boster", "Innovative Research"), ("PicoKine", "")];

pub fn apply_replacements(text: &str) -> String {
    BRAND_REPLACEMENTS
        .iter()
        .fold(text.to_string(), |acc, (find, replace)| acc.replace(find, replace))
}

fn is_heading_block(styles: &StyleSheet, block: &Block) -> bool {
    block.as_paragraph().is_some_and(|p| is_styled_heading(styles, p))
}

/// Index of the first heading paragraph whose trimmed text equals `target`,
/// ignoring case.
pub fn find_heading(blocks: &[Block], styles: &StyleSheet, target: &str) -> Option<usize> {
    let target = target.trim().to_lowercase();
    blocks.iter().position(|block| {
        block.as_paragraph().is_some_and(|p| {
            p.text().trim().to_lowercase() == target && is_styled_heading(styles, p)
        })
    })
}

/// Index of the next heading after `index`, or `blocks.len()`.
pub fn next_heading(blocks: &[Block], styles: &StyleSheet, index: usize) -> usize {
    blocks
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|(_, block)| is_heading_block(styles, block))
        .map(|(i, _)| i)
        .unwrap_or(blocks.len())
}

/// First table between the heading at `heading` and the next heading.
pub fn table_after(blocks: &[Block], styles: &StyleSheet, heading: usize) -> Option<usize> {
    let end = next_heading(blocks, styles, heading);
    (heading + 1..end).find(|&i| matches!(blocks[i], Block::Table(_)))
}

/// A template run from a captured source run, brand substitutions applied.
pub fn run_from_snapshot(captured: &RunSnapshot, keep_italic: bool) -> Run {
    let mut run = Run::new(&apply_replacements(&captured.text));
    if captured.bold {
        run.set_bold(true);
    }
    if keep_italic && captured.italic {
        run.set_italic(true);
    } else if !keep_italic {
        run.set_italic(false);
    }
    run
}

/// Builds a template paragraph from captured source content: bold kept,
/// italics off, brand substitutions applied.
pub fn paragraph_from_snapshot(snapshot: &ParagraphSnapshot) -> Paragraph {
    let runs = snapshot
        .runs
        .iter()
        .map(|captured| run_from_snapshot(captured, false))
        .collect();
    Paragraph::with_runs(runs)
}

#[derive(Debug, Default)]
pub struct SpliceOutcome {
    pub replaced: Vec<String>,
    pub skipped: Vec<String>,
}

/// Replaces the body paragraphs of every mapped template section with the
/// matching source content, inserted just before the section heading.
pub fn splice_sections(
    blocks: &mut Vec<Block>,
    styles: &StyleSheet,
    profile: &CompanyProfile,
    content: &ExtractedContent,
) -> SpliceOutcome {
    let mut outcome = SpliceOutcome::default();
    let mut index = 0;

    while index < blocks.len() {
        let Some(rule) = blocks[index]
            .as_paragraph()
            .filter(|p| is_styled_heading(styles, p))
            .and_then(|p| profile.rule_for_target(&p.text()))
        else {
            index += 1;
            continue;
        };

        let Some(section) = content.find(&rule.source) else {
            tracing::info!(
                "No source section matches '{}' for {}",
                rule.source.as_str(),
                rule.target
            );
            outcome.skipped.push(rule.target.clone());
            index += 1;
            continue;
        };

        let selected: Vec<&ParagraphSnapshot> = match rule.selector {
            Some(selector) => match selector.resolve(section.paragraphs.len()) {
                Some(i) => vec![&section.paragraphs[i]],
                None => {
                    tracing::info!(
                        "Paragraph selector {:?} out of range for '{}' ({} paragraphs)",
                        selector,
                        section.heading,
                        section.paragraphs.len()
                    );
                    Vec::new()
                }
            },
            None => section.paragraphs.iter().collect(),
        };
        if selected.is_empty() {
            outcome.skipped.push(rule.target.clone());
            index += 1;
            continue;
        }

        let end = next_heading(blocks, styles, index);
        let mut removed = 0;
        let mut position = index + 1;
        for _ in index + 1..end {
            // Paragraphs closing a document section keep their place.
            if matches!(&blocks[position], Block::Paragraph(p) if p.section.is_none()) {
                blocks.remove(position);
                removed += 1;
            } else {
                position += 1;
            }
        }

        let inserted = selected.len();
        let new_blocks = selected
            .into_iter()
            .map(|snapshot| Block::Paragraph(paragraph_from_snapshot(snapshot)));
        blocks.splice(index..index, new_blocks);

        tracing::debug!(
            "Spliced '{}' into {}: {} paragraphs in, {} out",
            section.heading,
            rule.target,
            inserted,
            removed
        );
        outcome.replaced.push(rule.target.clone());
        index += inserted + 1;
    }

    tracing::info!(
        "Replaced {} template sections, skipped {}",
        outcome.replaced.len(),
        outcome.skipped.len()
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::fixture::{heading, para, runs_para, table, DocBuilder};
    use crate::docx::WordDocument;
    use crate::extractors::SectionExtractor;
    use crate::profiles::{CompanyKey, ProfileTable};

    fn open(bytes: Vec<u8>) -> WordDocument {
        WordDocument::from_bytes(&bytes).unwrap()
    }

    fn texts(blocks: &[Block]) -> Vec<String> {
        blocks
            .iter()
            .map(|b| match b {
                Block::Paragraph(p) => p.text(),
                Block::Table(_) => "<table>".to_string(),
                Block::SectionBreak(_) => "<sectPr>".to_string(),
                Block::Opaque(_) => "<opaque>".to_string(),
            })
            .collect()
    }

    #[test]
    fn replacements_apply_in_order() {
        assert_eq!(
            apply_replacements("Boster PicoKine ELISA"),
            "Innovative Research  ELISA"
        );
    }

    #[test]
    fn selectors_pick_first_and_last_paragraphs() {
        let source = open(
            DocBuilder::new()
                .block(heading(1, "Assay Principle"))
                .block(para("p0 Boster."))
                .block(para("p1."))
                .block(runs_para(&[("p2 ", false, true), ("tail", true, false)]))
                .build(),
        );
        let content = SectionExtractor::new().extract(&source);
        let mut template = open(
            DocBuilder::new()
                .block(heading(1, "INTENDED USE"))
                .block(para("old intended use."))
                .block(heading(1, "ASSAY PRINCIPLE"))
                .block(para("old principle."))
                .block(table(&[&["keep"]]))
                .block(para("old principle 2."))
                .build(),
        );
        let profile = ProfileTable::builtin().get(CompanyKey::Boster).unwrap();
        let styles = template.styles.clone();
        let outcome = splice_sections(&mut template.body.blocks, &styles, profile, &content);

        assert_eq!(outcome.replaced, vec!["INTENDED USE", "ASSAY PRINCIPLE"]);
        assert_eq!(
            texts(&template.body.blocks),
            vec![
                "p0 Innovative Research.",
                "INTENDED USE",
                "p2 tail",
                "ASSAY PRINCIPLE",
                "<table>",
                "<sectPr>",
            ]
        );
        let inserted = template.body.blocks[2].as_paragraph().unwrap();
        let runs: Vec<_> = inserted.runs().collect();
        assert!(!runs[0].italic());
        assert!(!runs[0].bold());
        assert!(runs[1].bold());
    }

    #[test]
    fn bold_lead_ins_in_template_prose_are_cleared() {
        let source = open(
            DocBuilder::new()
                .block(heading(1, "Assay Principle"))
                .block(para("p0."))
                .block(para("p1."))
                .build(),
        );
        let content = SectionExtractor::new().extract(&source);
        let mut template = open(
            DocBuilder::new()
                .block(heading(1, "INTENDED USE"))
                .block(runs_para(&[
                    ("Note:", true, false),
                    (" stale template text", false, false),
                ]))
                .block(para("Storage Conditions:"))
                .block(para("stale 2."))
                .block(heading(1, "ASSAY PRINCIPLE"))
                .build(),
        );
        let profile = ProfileTable::builtin().get(CompanyKey::Boster).unwrap();
        let styles = template.styles.clone();
        splice_sections(&mut template.body.blocks, &styles, profile, &content);

        assert_eq!(
            texts(&template.body.blocks),
            vec!["p0.", "INTENDED USE", "p1.", "ASSAY PRINCIPLE", "<sectPr>"]
        );
        assert_eq!(next_heading(&template.body.blocks, &styles, 1), 3);
    }

    #[test]
    fn unmatched_targets_are_left_alone() {
        let source = open(DocBuilder::new().block(heading(1, "Unrelated")).block(para("x.")).build());
        let content = SectionExtractor::new().extract(&source);
        let mut template = open(
            DocBuilder::new()
                .block(heading(1, "OVERVIEW"))
                .block(para("template overview."))
                .build(),
        );
        let before = texts(&template.body.blocks);
        let profile = ProfileTable::builtin().get(CompanyKey::RedDot).unwrap();
        let styles = template.styles.clone();
        let outcome = splice_sections(&mut template.body.blocks, &styles, profile, &content);
        assert_eq!(outcome.skipped, vec!["OVERVIEW"]);
        assert_eq!(texts(&template.body.blocks), before);
    }

    #[test]
    fn out_of_range_selector_skips_section() {
        let source = open(DocBuilder::new().block(heading(1, "Assay Principle")).build());
        let content = SectionExtractor::new().extract(&source);
        let mut template = open(
            DocBuilder::new()
                .block(heading(1, "INTENDED USE"))
                .block(para("kept."))
                .build(),
        );
        let profile = ProfileTable::builtin().get(CompanyKey::Boster).unwrap();
        let styles = template.styles.clone();
        splice_sections(&mut template.body.blocks, &styles, profile, &content);
        assert_eq!(texts(&template.body.blocks)[1], "kept.");
    }

    #[test]
    fn navigation_helpers_respect_heading_bounds() {
        let template = open(
            DocBuilder::new()
                .block(heading(1, "REPRODUCIBILITY"))
                .block(para("text."))
                .block(heading(1, "OVERVIEW"))
                .block(table(&[&["a"]]))
                .build(),
        );
        let blocks = &template.body.blocks;
        let styles = &template.styles;
        let heading_index = find_heading(blocks, styles, "Reproducibility").unwrap();
        assert_eq!(heading_index, 0);
        assert_eq!(next_heading(blocks, styles, 0), 2);
        assert_eq!(table_after(blocks, styles, 0), None);
        assert_eq!(table_after(blocks, styles, 2), Some(3));
    }
}
