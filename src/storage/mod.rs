// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::convert::ConversionReport;
use crate::docx::WordDocument;
use crate::extractors::ExtractedContent;
use crate::utils::error::StorageError;

const OUTPUT_PREFIX: &str = "converted_";

/// Output file for `requested`: the path itself, or
/// `converted_<source stem>.docx` inside it when it is a directory.
pub fn resolve_output_path(requested: &Path, source: &Path) -> PathBuf {
    if requested.is_dir() {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        requested.join(format!("{OUTPUT_PREFIX}{stem}.docx"))
    } else {
        requested.to_path_buf()
    }
}

#[derive(Serialize)]
struct ReportFile<'a> {
    generated_at: String,
    tool_version: &'static str,
    output: String,
    #[serde(flatten)]
    report: &'a ConversionReport,
}

pub struct StorageManager {
    output_path: PathBuf,
}

impl StorageManager {
    /// Creates a StorageManager writing to `output` (see [`resolve_output_path`]).
    pub fn new<P: AsRef<Path>>(output: P, source: &Path) -> Result<Self, StorageError> {
        let output_path = resolve_output_path(output.as_ref(), source);

        // Create the parent directory if it doesn't exist
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(StorageError::IoError)?;
            }
        }

        Ok(Self { output_path })
    }

    /// Sidecar path next to the output, e.g. `out.docx.report.json`.
    fn sidecar(&self, suffix: &str) -> PathBuf {
        let mut name = self.output_path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Serializes the whole document first; the file is only touched once
    /// that succeeded.
    pub fn save_document(&self, doc: &WordDocument) -> Result<PathBuf, StorageError> {
        let bytes = doc.to_bytes()?;
        fs::write(&self.output_path, bytes).map_err(StorageError::IoError)?;
        tracing::info!("Saved document to {}", self.output_path.display());
        Ok(self.output_path.clone())
    }

    /// Saves the conversion report in JSON format
    pub fn save_report(&self, report: &ConversionReport) -> Result<PathBuf, StorageError> {
        let file_path = self.sidecar(".report.json");
        let envelope = ReportFile {
            generated_at: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION"),
            output: self.output_path.display().to_string(),
            report,
        };
        write_json(&file_path, &envelope)?;
        tracing::info!("Saved report to {}", file_path.display());
        Ok(file_path)
    }

    /// Dumps the extracted source sections for debugging
    pub fn save_extraction_dump(&self, content: &ExtractedContent) -> Result<PathBuf, StorageError> {
        let file_path = self.sidecar(".sections.json");
        write_json(&file_path, content)?;
        tracing::info!("Saved extracted sections to {}", file_path.display());
        Ok(file_path)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    fs::write(path, text).map_err(StorageError::IoError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ElisaConverter, KitNumbers};
    use crate::docx::fixture::{heading, para, DocBuilder};
    use crate::profiles::ProfileTable;

    #[test]
    fn directories_get_a_derived_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_output_path(dir.path(), Path::new("in/EK0001 kit.docx"));
        assert_eq!(resolved, dir.path().join("converted_EK0001 kit.docx"));

        let explicit = dir.path().join("out.docx");
        assert_eq!(resolve_output_path(&explicit, Path::new("a.docx")), explicit);
    }

    #[test]
    fn saves_document_report_and_dump() {
        let dir = tempfile::tempdir().unwrap();
        let source_bytes = DocBuilder::new()
            .block(heading(1, "Overview"))
            .block(para("overview text."))
            .build();
        let source = WordDocument::from_bytes(&source_bytes).unwrap();
        let template = WordDocument::from_bytes(
            &DocBuilder::new()
                .block(heading(1, "OVERVIEW"))
                .block(para("old."))
                .build(),
        )
        .unwrap();
        let numbers = KitNumbers {
            catalog: "CAT-1".to_string(),
            lot: "LOT-1".to_string(),
        };
        let conversion = ElisaConverter::new(ProfileTable::builtin())
            .convert("EK1.docx", &source, &source_bytes, template, &numbers)
            .unwrap();

        let storage = StorageManager::new(dir.path().join("nested/out.docx"), Path::new("EK1.docx")).unwrap();
        let saved = storage.save_document(&conversion.document).unwrap();
        assert!(WordDocument::open(&saved).is_ok());

        let report_path = storage.save_report(&conversion.report).unwrap();
        assert_eq!(report_path, dir.path().join("nested/out.docx.report.json"));
        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(report["company"], "boster");
        assert_eq!(report["catalog_number"], "CAT-1");
        assert_eq!(report["sections_replaced"][0], "OVERVIEW");
        assert!(report["generated_at"].as_str().is_some());

        let dump_path = storage.save_extraction_dump(&conversion.content).unwrap();
        let dump: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dump_path).unwrap()).unwrap();
        assert_eq!(dump["sections"][0]["heading"], "Overview");
    }
}
