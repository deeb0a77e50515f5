//! Survey Decoder: CSV survey exports → `SurveyResponse`s.
//!
//! Two export layouts are in circulation:
//! - `Numbered`: answers in columns `1`..`50`, full demographics (teacher exports)
//! - `Prefixed`: answers in `Answer_1`..`Answer_50` (psychometric office batches)

use csv::StringRecord;
use tracing::warn;

use crate::scoring::items::{ITEM_COUNT, LIKERT_RANGE};
use crate::survey::{reader, DecodeError, HeaderIndex, SurveyResponse};

pub const STUDENT_ID: &str = "STUDENT ID";
pub const STUDENT_NAME: &str = "STUDENT NAME";
pub const YEAR_LEVEL: &str = "YEAR LEVEL";
const AGE: &str = "AGE";
const GENDER: &str = "GENDER";
const SECTION: &str = "Section";
const DATE: &str = "Date";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnScheme {
    Numbered,
    Prefixed,
}

impl ColumnScheme {
    /// `Prefixed` when an `Answer_1` column is present, otherwise `Numbered`.
    pub fn detect(headers: &StringRecord) -> Self {
        if HeaderIndex::new(headers).contains(&ColumnScheme::Prefixed.answer_column(1)) {
            ColumnScheme::Prefixed
        } else {
            ColumnScheme::Numbered
        }
    }

    pub fn answer_column(self, item: usize) -> String {
        match self {
            ColumnScheme::Numbered => item.to_string(),
            ColumnScheme::Prefixed => format!("Answer_{item}"),
        }
    }

    fn identity_columns(self) -> &'static [&'static str] {
        match self {
            ColumnScheme::Numbered => &[
                STUDENT_ID,
                STUDENT_NAME,
                AGE,
                GENDER,
                YEAR_LEVEL,
                SECTION,
                DATE,
            ],
            ColumnScheme::Prefixed => &[STUDENT_ID, STUDENT_NAME, YEAR_LEVEL],
        }
    }

    pub fn expected_columns(self) -> Vec<String> {
        self.identity_columns()
            .iter()
            .map(|c| c.to_string())
            .chain((1..=ITEM_COUNT).map(|item| self.answer_column(item)))
            .collect()
    }
}

/// Rows decoded from one export, plus the file lines of rows dropped for a blank student id.
#[derive(Debug)]
pub struct DecodedSurvey {
    pub responses: Vec<SurveyResponse>,
    pub blank_id_lines: Vec<u64>,
}

/// Decodes a survey export in a known layout.
pub fn decode_responses(
    data: &[u8],
    scheme: ColumnScheme,
) -> Result<Vec<SurveyResponse>, DecodeError> {
    decode_survey(data, scheme).map(|decoded| decoded.responses)
}

pub fn decode_survey(data: &[u8], scheme: ColumnScheme) -> Result<DecodedSurvey, DecodeError> {
    let mut rdr = reader(data);
    let index = HeaderIndex::new(rdr.headers()?);
    index.require(&scheme.expected_columns())?;

    let answer_columns: Vec<String> = (1..=ITEM_COUNT).map(|i| scheme.answer_column(i)).collect();
    let mut responses = Vec::new();
    let mut blank_id_lines = Vec::new();

    for record in rdr.records() {
        let record = record?;
        let student_id = index.cell(&record, STUDENT_ID);
        if student_id.is_empty() {
            let line = record.position().map_or(0, |p| p.line());
            warn!("Skipping survey row at line {line}: no student id");
            blank_id_lines.push(line);
            continue;
        }

        let mut answers = [0u8; ITEM_COUNT];
        for (slot, column) in answers.iter_mut().zip(&answer_columns) {
            *slot = parse_answer(index.cell(&record, column));
        }

        responses.push(SurveyResponse {
            student_id: student_id.to_string(),
            name: index.cell(&record, STUDENT_NAME).to_string(),
            age: optional(index.cell(&record, AGE)),
            gender: optional(index.cell(&record, GENDER)),
            year_level: index.cell(&record, YEAR_LEVEL).to_string(),
            section: optional(index.cell(&record, SECTION)),
            date: optional(index.cell(&record, DATE)),
            answers,
        });
    }

    Ok(DecodedSurvey {
        responses,
        blank_id_lines,
    })
}

/// Decodes a survey export, picking the layout from its header.
pub fn decode_detected(data: &[u8]) -> Result<(ColumnScheme, DecodedSurvey), DecodeError> {
    let scheme = ColumnScheme::detect(reader(data).headers()?);
    Ok((scheme, decode_survey(data, scheme)?))
}

/// A Likert answer. Anything that is not a plain digit string in 1..=5 is 0.
pub fn parse_answer(cell: &str) -> u8 {
    if cell.is_empty() || !cell.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    cell.parse::<u8>()
        .ok()
        .filter(|v| LIKERT_RANGE.contains(v))
        .unwrap_or(0)
}

fn optional(cell: &str) -> Option<String> {
    (!cell.is_empty()).then(|| cell.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(scheme: ColumnScheme) -> String {
        scheme.expected_columns().join(",")
    }

    fn numbered_row(id: &str, answers: &[&str; ITEM_COUNT]) -> String {
        format!("{id},Ana Cruz,15,F,10,Rizal,2024-08-01,{}", answers.join(","))
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("1"), 1);
        assert_eq!(parse_answer("5"), 5);
        assert_eq!(parse_answer("05"), 5);
        assert_eq!(parse_answer("0"), 0);
        assert_eq!(parse_answer("6"), 0);
        assert_eq!(parse_answer("3.0"), 0);
        assert_eq!(parse_answer("-2"), 0);
        assert_eq!(parse_answer("abc"), 0);
        assert_eq!(parse_answer(""), 0);
        assert_eq!(parse_answer("999"), 0);
    }

    #[test]
    fn test_decode_numbered_export() {
        let mut answers = ["3"; ITEM_COUNT];
        answers[0] = "2";
        answers[1] = "x";
        let csv = format!(
            "{}\n{}\n",
            header(ColumnScheme::Numbered),
            numbered_row("2024-001", &answers)
        );

        let responses = decode_responses(csv.as_bytes(), ColumnScheme::Numbered).unwrap();
        assert_eq!(responses.len(), 1);
        let r = &responses[0];
        assert_eq!(r.student_id, "2024-001");
        assert_eq!(r.name, "Ana Cruz");
        assert_eq!(r.age.as_deref(), Some("15"));
        assert_eq!(r.section.as_deref(), Some("Rizal"));
        assert_eq!(r.year_level, "10");
        assert_eq!(r.answers[0], 2);
        assert_eq!(r.answers[1], 0);
        assert_eq!(r.answers[49], 3);
    }

    #[test]
    fn test_missing_columns_abort_before_rows() {
        let csv = "STUDENT ID,STUDENT NAME,1,2\nS1,Ben,3,3\n";
        let err = decode_responses(csv.as_bytes(), ColumnScheme::Numbered).unwrap_err();
        match err {
            DecodeError::MissingColumns(cols) => {
                assert_eq!(&cols[..5], &["AGE", "GENDER", "YEAR LEVEL", "Section", "Date"]);
                assert!(cols.contains(&"50".to_string()));
                assert!(!cols.contains(&"1".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_column_message_names_columns() {
        let err = decode_responses(b"STUDENT ID\n", ColumnScheme::Prefixed).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Missing required columns: STUDENT NAME, YEAR LEVEL, Answer_1"));
    }

    #[test]
    fn test_decode_prefixed_export_with_extra_columns() {
        let answers = vec!["4"; ITEM_COUNT].join(",");
        let csv = format!(
            "EMAIL,{}\nx@school.edu,S9,Cy Reyes,11,{answers}\n",
            header(ColumnScheme::Prefixed)
        );
        let responses = decode_responses(csv.as_bytes(), ColumnScheme::Prefixed).unwrap();
        assert_eq!(responses[0].student_id, "S9");
        assert_eq!(responses[0].age, None);
        assert!(responses[0].answers.iter().all(|a| *a == 4));
    }

    #[test]
    fn test_short_rows_and_blank_ids() {
        let csv = format!(
            "{}\nS1,Dee,10,3,3\n,Nobody,10\n",
            header(ColumnScheme::Prefixed)
        );
        let decoded = decode_survey(csv.as_bytes(), ColumnScheme::Prefixed).unwrap();
        assert_eq!(decoded.blank_id_lines, vec![3]);
        let responses = decoded.responses;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].answers[0], 3);
        assert_eq!(responses[0].answers[1], 3);
        assert!(responses[0].answers[2..].iter().all(|a| *a == 0));
    }

    #[test]
    fn test_detect_scheme_and_bom() {
        let prefixed = format!("\u{feff}{}\n", header(ColumnScheme::Prefixed));
        let (scheme, decoded) = decode_detected(prefixed.as_bytes()).unwrap();
        assert_eq!(scheme, ColumnScheme::Prefixed);
        assert!(decoded.responses.is_empty());
        assert!(decoded.blank_id_lines.is_empty());

        let numbered = format!("\u{feff}{}\n", header(ColumnScheme::Numbered));
        let (scheme, _) = decode_detected(numbered.as_bytes()).unwrap();
        assert_eq!(scheme, ColumnScheme::Numbered);
    }
}
