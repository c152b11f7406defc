use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum EnaError {
    #[error("failed to read report at {0}")]
    ReportRead(PathBuf),

    #[error("malformed report XML: {0}")]
    Xml(String),

    #[error("report has no root element")]
    EmptyReport,

    #[error("entry {0} has no TAXON/SCIENTIFIC_NAME")]
    MissingTaxon(String),

    #[error("entry #{0} has no WGS prefix/version, alias or accession to identify it")]
    MissingIdentifier(usize),

    #[error("record {id} is missing assembly attribute {tag}")]
    MissingAttribute { id: String, tag: &'static str },

    #[error("record {id} has non-numeric {field}: {value:?}")]
    InvalidNumber {
        id: String,
        field: &'static str,
        value: String,
    },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("ENA request failed: {0}")]
    Http(String),

    #[error("ENA returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("gzip stream could not be decoded: {0}")]
    Decompress(String),

    #[error("failed to write spreadsheet: {0}")]
    Spreadsheet(String),
}
