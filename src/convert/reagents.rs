// src/convert/reagents.rs

//! Reagent preparation tables: fixed preparation rows and unit annotations.

use std::collections::BTreeSet;

use crate::docx::{Block, Cell, StyleSheet, Table};
use crate::extractors::is_styled_heading;
use crate::profiles::CompanyProfile;

use super::splice::table_after;

pub const REAGENT_HEADING_MARKER: &str = "REAGENT PREPARATION";

/// (phrase, unit) pairs for the annotation pass.
const UNIT_RULES: &[(&str, &str)] = &[
    ("assay buffer", "1X"),
    ("room temperature", "20-25°C"),
    ("store at 4", "4°C"),
    ("store at -20", "-20°C"),
];

/// Suffix for a synthetic row cell.
fn synthetic_unit(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    if lower.contains("temperature") {
        Some(" (20-25°C)")
    } else if lower.contains("buffer") {
        Some(" (1X)")
    } else {
        None
    }
}

/// Appends the missing units to `text`, or `None` when nothing applies.
pub fn annotate_units(text: &str) -> Option<String> {
    let mut annotated = text.to_string();
    let mut changed = false;
    for (phrase, unit) in UNIT_RULES {
        let lower = annotated.to_lowercase();
        if lower.contains(phrase) && !lower.contains(&unit.to_lowercase()) {
            annotated.push_str(&format!(" ({unit})"));
            changed = true;
        }
    }
    changed.then_some(annotated)
}

fn force_upright(cell: &mut Cell) {
    for paragraph in cell.paragraphs_mut() {
        for run in paragraph.runs_mut() {
            run.set_italic(false);
        }
    }
}

/// Appends the profile's preparation rows. Cells past the table's column
/// count are dropped. Returns the number of rows added.
pub fn inject_rows(table: &mut Table, rows: &[Vec<String>]) -> usize {
    for values in rows {
        let mut row = table.new_row();
        for (cell, value) in row.cells.iter_mut().zip(values) {
            let text = match synthetic_unit(value) {
                Some(unit) => format!("{value}{unit}"),
                None => value.clone(),
            };
            cell.set_text(&text);
        }
        if values.len() > row.cells.len() {
            tracing::debug!(
                "Dropped {} reagent cells beyond {} columns",
                values.len() - row.cells.len(),
                row.cells.len()
            );
        }
        table.rows.push(row);
    }
    rows.len()
}

/// Runs the unit annotation pass over every cell. Returns the number of
/// cells rewritten.
pub fn annotate_table(table: &mut Table) -> usize {
    let mut annotated = 0;
    for cell in table.cells_mut() {
        if let Some(text) = annotate_units(&cell.text()) {
            cell.set_text(&text);
            annotated += 1;
        }
    }
    annotated
}

#[derive(Debug, Default)]
pub struct ReagentOutcome {
    pub tables: usize,
    pub rows_added: usize,
    pub cells_annotated: usize,
}

/// Finds every reagent preparation heading in the template and prepares the
/// table that follows it, once per table.
pub fn prepare_reagent_tables(
    blocks: &mut [Block],
    styles: &StyleSheet,
    profile: &CompanyProfile,
    processed: &mut BTreeSet<usize>,
) -> ReagentOutcome {
    let mut outcome = ReagentOutcome::default();
    let mut prepared = BTreeSet::new();

    let headings: Vec<usize> = blocks
        .iter()
        .enumerate()
        .filter_map(|(i, block)| {
            let paragraph = block.as_paragraph()?;
            if !is_styled_heading(styles, paragraph) {
                return None;
            }
            let text = paragraph.text();
            let special = profile
                .rule_for_target(&text)
                .is_some_and(|rule| rule.reagent_table);
            (special || text.to_uppercase().contains(REAGENT_HEADING_MARKER)).then_some(i)
        })
        .collect();

    for heading in headings {
        let Some(index) = table_after(blocks, styles, heading) else {
            tracing::debug!("Reagent heading at block {} has no table", heading);
            continue;
        };
        if !prepared.insert(index) {
            continue;
        }
        let Some(table) = blocks[index].as_table_mut() else {
            continue;
        };

        for cell in table.cells_mut() {
            force_upright(cell);
        }
        outcome.rows_added += inject_rows(table, &profile.reagent_rows);
        outcome.cells_annotated += annotate_table(table);
        table.normalize_borders();
        processed.insert(index);
        outcome.tables += 1;
    }

    if outcome.tables > 0 {
        tracing::info!(
            "Prepared {} reagent tables: {} rows added, {} cells annotated",
            outcome.tables,
            outcome.rows_added,
            outcome.cells_annotated
        );
    }
    outcome
}
