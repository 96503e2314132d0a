use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::Serialize;

use crate::error::PriceHistoryError;

// ---------------------------------------------------------------------------
// SourceKind — the three external inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Prices,
    Supply,
    Images,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Prices, SourceKind::Supply, SourceKind::Images];
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Prices => "prices",
            SourceKind::Supply => "supply",
            SourceKind::Images => "images",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// LoadReport — non-fatal issues collected during one load
// ---------------------------------------------------------------------------

/// A source row that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// 1-based line number in the source file.
    pub line: u64,
    pub message: String,
}

impl RowIssue {
    pub fn new(line: u64, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }

    pub fn to_error(&self) -> PriceHistoryError {
        PriceHistoryError::MalformedRow {
            line: self.line,
            message: self.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub source: SourceKind,
    pub path: PathBuf,
    /// The file did not exist; the loaded table is empty.
    pub unavailable: bool,
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_issues: Vec<RowIssue>,
    /// Modification time of the file at load time.
    pub modified: Option<SystemTime>,
}

impl LoadReport {
    pub fn new(source: SourceKind, path: PathBuf) -> Self {
        Self {
            source,
            path,
            unavailable: false,
            rows_read: 0,
            rows_used: 0,
            row_issues: Vec::new(),
            modified: None,
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.unavailable && self.row_issues.is_empty()
    }

    /// The absorbed issues as error values, for uniform display.
    pub fn errors(&self) -> Vec<PriceHistoryError> {
        let mut errors = Vec::with_capacity(self.row_issues.len() + 1);
        if self.unavailable {
            errors.push(PriceHistoryError::SourceUnavailable(self.path.clone()));
        }
        errors.extend(self.row_issues.iter().map(RowIssue::to_error));
        errors
    }
}

/// A loaded value together with the report of how it was loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub value: T,
    pub report: LoadReport,
}
