// src/convert/tables.rs

//! Pairs template tables with source tables and copies rows across.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::docx::{Block, Cell, Paragraph, StyleSheet, Table};
use crate::extractors::{CellSnapshot, ExtractedContent, TableSnapshot};
use crate::profiles::CompanyProfile;

use super::splice::{apply_replacements, find_heading, run_from_snapshot, table_after};

const QUANTITY_HEADER: &str = "quantity";
const REAGENTS_MARKER: &str = "REAGENTS";
const VOLUME_HINTS: &[&str] = &["volume", "μl", "µl", "ml"];

static VOLUME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\s*?(?:[μµ]L|mL|ml|L|×\s*\d+)").expect("Failed to compile VOLUME_RE")
});

/// First volume-like token in `text` ("500 μL", "2 × 96").
pub fn extract_volume(text: &str) -> Option<&str> {
    VOLUME_RE.find(text).map(|m| m.as_str())
}

/// Number of (keyword, header cell) pairs where the keyword appears in the
/// cell, ignoring case.
pub fn header_score(keywords: &[String], header: &[String]) -> usize {
    let cells: Vec<String> = header.iter().map(|c| c.to_lowercase()).collect();
    keywords
        .iter()
        .map(|k| k.to_lowercase())
        .map(|k| cells.iter().filter(|cell| cell.contains(&k)).count())
        .sum()
}

/// Maps template columns to source columns.
///
/// Priority per template column: the reagents quantity override, exact
/// header match, containment either way, then the same index.
pub fn column_map(
    template_header: &[String],
    source_header: &[String],
    reagents: bool,
) -> BTreeMap<usize, usize> {
    let source: Vec<String> = source_header.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut map = BTreeMap::new();

    for (t, header) in template_header.iter().enumerate() {
        let header = header.trim().to_lowercase();

        if reagents && header == QUANTITY_HEADER {
            if let Some(s) = source
                .iter()
                .position(|h| VOLUME_HINTS.iter().any(|hint| h.contains(hint)))
            {
                map.insert(t, s);
                continue;
            }
        }
        if let Some(s) = source.iter().position(|h| *h == header) {
            map.insert(t, s);
            continue;
        }
        if !header.is_empty() {
            if let Some(s) = source
                .iter()
                .position(|h| !h.is_empty() && (h.contains(&header) || header.contains(h.as_str())))
            {
                map.insert(t, s);
                continue;
            }
        }
        if t < source.len() {
            map.insert(t, t);
        }
    }
    map
}

/// True when a body paragraph before `index` mentions the reagents list.
fn in_reagents_context(blocks: &[Block], index: usize) -> bool {
    blocks[..index]
        .iter()
        .filter_map(Block::as_paragraph)
        .any(|p| p.text().to_uppercase().contains(REAGENTS_MARKER))
}

/// Rebuilds `cell` paragraph by paragraph from the source cell, keeping run
/// bold and italics.
fn copy_cell(cell: &mut Cell, source: &CellSnapshot) {
    let paragraphs = source
        .paragraphs
        .iter()
        .map(|p| {
            let runs = p.runs.iter().map(|run| run_from_snapshot(run, true)).collect();
            Paragraph::with_runs(runs)
        })
        .collect();
    cell.set_paragraphs(paragraphs);
}

/// Replaces the template table's data rows with the source data rows.
/// Returns the number of rows written.
pub fn fill_table(table: &mut Table, source: &TableSnapshot, reagents: bool) -> usize {
    let template_header = table.header_texts();
    if template_header.is_empty() {
        tracing::warn!("Template table has no header row, skipping");
        return 0;
    }
    let map = column_map(&template_header, &source.header(), reagents);
    tracing::debug!("Column map {:?} (reagents: {})", map, reagents);

    table.clear_data_rows();
    let mut written = 0;
    for source_row in source.data_rows() {
        let mut row = table.new_row();
        for (&t, &s) in &map {
            let Some(source_cell) = source_row.get(s) else {
                tracing::warn!("Source row has no column {}, skipping cell", s);
                continue;
            };
            let Some(cell) = row.cells.get_mut(t) else {
                continue;
            };
            let quantity =
                reagents && template_header[t].trim().eq_ignore_ascii_case(QUANTITY_HEADER);
            match extract_volume(&source_cell.text()).filter(|_| quantity) {
                Some(volume) => cell.set_text(&apply_replacements(volume)),
                None => copy_cell(cell, source_cell),
            }
        }
        table.rows.push(row);
        written += 1;
    }
    table.normalize_borders();
    written
}

#[derive(Debug, Default)]
pub struct TableOutcome {
    pub tables: usize,
    pub rows: usize,
}

/// Header-keyword pairing for every rule that declares `table_headers`.
/// Source tables under the rule's source section are tried before the rest.
pub fn reconcile_mapped_tables(
    blocks: &mut [Block],
    styles: &StyleSheet,
    profile: &CompanyProfile,
    content: &ExtractedContent,
    processed: &mut BTreeSet<usize>,
) -> TableOutcome {
    let mut outcome = TableOutcome::default();

    for rule in profile.rules.iter().filter(|r| !r.table_headers.is_empty()) {
        let Some(heading) = find_heading(blocks, styles, &rule.target) else {
            tracing::debug!("Template has no '{}' heading", rule.target);
            continue;
        };
        let Some(index) = table_after(blocks, styles, heading) else {
            tracing::debug!("No template table under '{}'", rule.target);
            continue;
        };
        if processed.contains(&index) {
            continue;
        }
        let needed = rule.table_headers.len();
        // Tables under the mapped source section first, then the whole document.
        let Some(source) = content
            .find(&rule.source)
            .into_iter()
            .flat_map(|section| content.section_tables(section))
            .chain(content.tables.iter())
            .find(|t| header_score(&rule.table_headers, &t.header()) >= needed)
        else {
            tracing::info!(
                "No source table with headers {:?} for {}",
                rule.table_headers,
                rule.target
            );
            continue;
        };

        let reagents = in_reagents_context(blocks, index);
        if let Some(table) = blocks[index].as_table_mut() {
            outcome.rows += fill_table(table, source, reagents);
            outcome.tables += 1;
            processed.insert(index);
            tracing::debug!("Filled table under '{}'", rule.target);
        }
    }
    outcome
}

/// Pairs each remaining template table with the first source table whose
/// header row contains the template's header row text.
pub fn reconcile_by_header_text(
    blocks: &mut [Block],
    content: &ExtractedContent,
    processed: &mut BTreeSet<usize>,
) -> TableOutcome {
    let mut outcome = TableOutcome::default();

    for index in 0..blocks.len() {
        if processed.contains(&index) {
            continue;
        }
        let Some(template_header) = blocks[index]
            .as_table()
            .map(|t| t.header_texts().join(" ").trim().to_lowercase())
        else {
            continue;
        };
        if template_header.is_empty() {
            continue;
        }
        let Some(source) = content
            .tables
            .iter()
            .find(|t| t.header().join(" ").to_lowercase().contains(&template_header))
        else {
            continue;
        };

        let reagents = in_reagents_context(blocks, index);
        if let Some(table) = blocks[index].as_table_mut() {
            outcome.rows += fill_table(table, source, reagents);
            outcome.tables += 1;
            processed.insert(index);
        }
    }
    if outcome.tables > 0 {
        tracing::debug!("Header-text pairing filled {} tables", outcome.tables);
    }
    outcome
}
