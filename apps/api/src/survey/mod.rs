// Survey and roster CSV decoding.
// Column validation always runs against the header before any row is read.

pub mod decoder;
pub mod roster;

use std::collections::HashMap;

use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

use crate::scoring::items::ITEM_COUNT;

/// One student's decoded questionnaire. Immutable once decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyResponse {
    pub student_id: String,
    pub name: String,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub year_level: String,
    pub section: Option<String>,
    pub date: Option<String>,
    /// `answers[n - 1]` is item `n`; 0 means missing or invalid.
    pub answers: [u8; ITEM_COUNT],
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

pub(crate) fn reader(data: &[u8]) -> Reader<&[u8]> {
    ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data)
}

/// Header name → column index. A UTF-8 BOM on the first header is ignored.
pub(crate) struct HeaderIndex(HashMap<String, usize>);

impl HeaderIndex {
    pub(crate) fn new(headers: &StringRecord) -> Self {
        Self(
            headers
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.trim_start_matches('\u{feff}').trim().to_string(), idx))
                .collect(),
        )
    }

    pub(crate) fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub(crate) fn position(&self, column: &str) -> Option<usize> {
        self.0.get(column).copied()
    }

    /// Fails with every missing column, in the order expected.
    pub(crate) fn require<S: AsRef<str>>(&self, expected: &[S]) -> Result<(), DecodeError> {
        let missing: Vec<String> = expected
            .iter()
            .map(AsRef::as_ref)
            .filter(|c| !self.contains(c))
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::MissingColumns(missing))
        }
    }

    /// Trimmed cell text; short rows and absent columns read as "".
    pub(crate) fn cell<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.position(column)
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .unwrap_or("")
    }
}
