// src/utils/validate.rs

//! Input checks that run before any document is opened.

use std::path::Path;

use crate::utils::error::AppError;

const ALLOWED_EXTENSION: &str = "docx";

pub fn has_docx_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ALLOWED_EXTENSION))
}

/// An existing, non-empty `.docx` file.
pub fn require_input_docx(path: &Path, label: &str) -> Result<(), AppError> {
    if !has_docx_extension(path) {
        return Err(AppError::InvalidInput(format!(
            "{} '{}' must be a .docx file",
            label,
            path.display()
        )));
    }
    let metadata = std::fs::metadata(path).map_err(|_| {
        AppError::InvalidInput(format!("{} '{}' not found", label, path.display()))
    })?;
    if !metadata.is_file() || metadata.len() == 0 {
        return Err(AppError::InvalidInput(format!(
            "{} '{}' is empty or not a file",
            label,
            path.display()
        )));
    }
    Ok(())
}

/// A `.docx` output path, or an existing directory to write into.
pub fn require_output_target(path: &Path) -> Result<(), AppError> {
    if path.is_dir() || has_docx_extension(path) {
        return Ok(());
    }
    Err(AppError::InvalidInput(format!(
        "Output '{}' must be a .docx file or an existing directory",
        path.display()
    )))
}

/// Trimmed, non-empty text field.
pub fn require_text(value: &str, label: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be empty", label)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_docx_extension(Path::new("EK0001.DOCX")));
        assert!(has_docx_extension(Path::new("dir/a.docx")));
        assert!(!has_docx_extension(Path::new("a.doc")));
        assert!(!has_docx_extension(Path::new("docx")));
    }

    #[test]
    fn input_must_exist_and_be_non_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.docx");
        assert!(matches!(
            require_input_docx(&missing, "Template"),
            Err(AppError::InvalidInput(_))
        ));

        let empty = dir.path().join("empty.docx");
        std::fs::write(&empty, b"").unwrap();
        assert!(require_input_docx(&empty, "Template").is_err());

        let wrong = dir.path().join("notes.txt");
        std::fs::write(&wrong, b"x").unwrap();
        assert!(require_input_docx(&wrong, "Template").is_err());

        let good = dir.path().join("good.docx");
        std::fs::write(&good, b"x").unwrap();
        assert!(require_input_docx(&good, "Template").is_ok());
        assert!(require_output_target(dir.path()).is_ok());
        assert!(require_output_target(&wrong).is_err());
    }

    #[test]
    fn text_fields_are_trimmed() {
        assert_eq!(require_text("  EK0001 ", "Catalog number").unwrap(), "EK0001");
        assert!(require_text("   ", "Lot number").is_err());
    }
}
