// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum DocxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document container: {0}")]
    Zip(#[from] zip::result::ZipError), // Not a zip, or a damaged one

    #[error("XML error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Part {part} is not valid UTF-8: {source}")]
    Encoding {
        part: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Document part missing: {0}")]
    MissingPart(String),

    #[error("Malformed document: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Invalid source pattern for target '{target}': {source}")]
    InvalidPattern {
        target: String,
        #[source]
        source: regex::Error,
    },

    #[error("Could not read profile file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Could not parse profile file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Profile table is empty")]
    Empty,
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Document error: {0}")]
    Docx(#[from] DocxError),

    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Document error: {0}")]
    Document(#[from] DocxError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ProfileError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Document error: {0}")]
    Docx(#[from] DocxError),

    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConvertError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
