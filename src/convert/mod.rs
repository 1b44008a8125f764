// src/convert/mod.rs

//! ELISA kit conversion: source sections spliced into a company template.

pub mod cleanup;
pub mod images;
pub mod reagents;
pub mod splice;
pub mod tables;

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::docx::WordDocument;
use crate::extractors::{ExtractedContent, SectionExtractor};
use crate::profiles::{detect_company, CompanyKey, DetectionMethod, ProfileTable};
use crate::utils::error::ConvertError;

/// Summary of one conversion, written as the JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub source: String,
    pub template: String,
    pub company: CompanyKey,
    pub detection: DetectionMethod,
    pub catalog_number: String,
    pub lot_number: String,
    pub sections_found: usize,
    pub sections_replaced: Vec<String>,
    pub sections_skipped: Vec<String>,
    pub tables_filled: usize,
    pub table_rows_copied: usize,
    pub reagent_rows_added: usize,
    pub cells_annotated: usize,
    pub picture_inserted: bool,
    pub brand_replacements: usize,
    pub disclaimers_removed: usize,
    pub sections_removed: Vec<String>,
}

#[derive(Debug)]
pub struct Conversion {
    pub document: WordDocument,
    pub content: ExtractedContent,
    pub report: ConversionReport,
}

/// Identifiers printed on the kit documentation.
#[derive(Debug, Clone)]
pub struct KitNumbers {
    pub catalog: String,
    pub lot: String,
}

pub struct ElisaConverter<'a> {
    profiles: &'a ProfileTable,
    extractor: SectionExtractor,
}

impl<'a> ElisaConverter<'a> {
    pub fn new(profiles: &'a ProfileTable) -> Self {
        Self {
            profiles,
            extractor: SectionExtractor::new(),
        }
    }

    /// Opens both files and converts. Nothing is written.
    pub fn convert_files(
        &self,
        source_path: &Path,
        template_path: &Path,
        numbers: &KitNumbers,
    ) -> Result<Conversion, ConvertError> {
        let source_bytes = std::fs::read(source_path).map_err(|source| ConvertError::Read {
            path: source_path.display().to_string(),
            source,
        })?;
        let source = WordDocument::from_bytes(&source_bytes)?;
        let template = WordDocument::open(template_path)?;

        let source_name = file_name(source_path);
        let mut conversion = self.convert(&source_name, &source, &source_bytes, template, numbers)?;
        conversion.report.template = file_name(template_path);
        Ok(conversion)
    }

    pub fn convert(
        &self,
        source_name: &str,
        source: &WordDocument,
        source_bytes: &[u8],
        mut template: WordDocument,
        numbers: &KitNumbers,
    ) -> Result<Conversion, ConvertError> {
        let detection = detect_company(
            self.profiles,
            source_name,
            &[source.main_part_bytes(), source_bytes],
        );
        let profile = self
            .profiles
            .get(detection.company)
            .unwrap_or_else(|| self.profiles.default_profile());
        tracing::info!(
            "Converting {} as {} (catalog {}, lot {})",
            source_name,
            profile.key,
            numbers.catalog,
            numbers.lot
        );

        let content = self.extractor.extract(source);

        cleanup::apply_global_formatting(&mut template)?;

        let styles = template.styles.clone();
        let blocks = &mut template.body.blocks;

        let spliced = splice::splice_sections(blocks, &styles, profile, &content);

        let mut processed = BTreeSet::new();
        let mapped = tables::reconcile_mapped_tables(blocks, &styles, profile, &content, &mut processed);
        let by_text = tables::reconcile_by_header_text(blocks, &content, &mut processed);
        let reagent = reagents::prepare_reagent_tables(blocks, &styles, profile, &mut processed);

        let picture_inserted = images::insert_standard_curve(&mut template, &content, profile);
        let brand_replacements = cleanup::replace_brands(&mut template);
        let disclaimers_removed = cleanup::replace_disclaimer(&mut template.body.blocks);
        let sections_removed =
            cleanup::remove_sections(&mut template.body.blocks, &styles, &profile.remove_sections);

        let report = ConversionReport {
            source: source_name.to_string(),
            template: String::new(),
            company: profile.key,
            detection: detection.method,
            catalog_number: numbers.catalog.clone(),
            lot_number: numbers.lot.clone(),
            sections_found: content.sections.len(),
            sections_replaced: spliced.replaced,
            sections_skipped: spliced.skipped,
            tables_filled: mapped.tables + by_text.tables,
            table_rows_copied: mapped.rows + by_text.rows,
            reagent_rows_added: reagent.rows_added,
            cells_annotated: reagent.cells_annotated,
            picture_inserted,
            brand_replacements,
            disclaimers_removed,
            sections_removed,
        };
        tracing::info!(
            "Conversion done: {} sections replaced, {} tables filled, {} reagent rows",
            report.sections_replaced.len(),
            report.tables_filled,
            report.reagent_rows_added
        );

        Ok(Conversion {
            document: template,
            content,
            report,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
