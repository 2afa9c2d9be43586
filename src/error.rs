// ⚠️ Error taxonomy for the reporting core
//
// Parse problems never show up here: normalizers return Option and the
// importer records them as ImportIssue. Everything below is terminal for the
// operation that raised it, never for the process.

use crate::validation::ValidationError;
use thiserror::Error;

/// Why an operation was refused before any store call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// The sheet had no rows at all (no file picked, or an empty file)
    NoFile,
    /// No acting user to stamp `created_by` with
    NoUser,
    /// Every row was skipped; nothing left to import
    EmptyImport,
}

impl Precondition {
    /// User-facing message, one per cause
    pub fn message(&self) -> &'static str {
        match self {
            Precondition::NoFile => "Pilih file terlebih dahulu (no file selected)",
            Precondition::NoUser => "User tidak ditemukan, silakan login ulang (no user identified)",
            Precondition::EmptyImport => "Tidak ada data valid untuk diimport (nothing to import)",
        }
    }
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Error, Debug)]
pub enum CrmError {
    #[error("Validation failed: {}", join_validation(.0))]
    Validation(Vec<ValidationError>),

    #[error("Precondition failed: {0}")]
    Precondition(Precondition),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record store error: {0}")]
    Store(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<Precondition> for CrmError {
    fn from(p: Precondition) -> Self {
        CrmError::Precondition(p)
    }
}

pub type Result<T> = std::result::Result<T, CrmError>;
