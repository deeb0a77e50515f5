//! Class master list decoding (teacher roster uploads).

use crate::survey::decoder::{STUDENT_ID, STUDENT_NAME, YEAR_LEVEL};
use crate::survey::{reader, DecodeError, HeaderIndex};

const SUBJECT: &str = "SUBJECT";
const ACADEMIC_YEAR: &str = "ACADEMIC YEAR";

pub const ROSTER_COLUMNS: [&str; 5] = [STUDENT_ID, STUDENT_NAME, SUBJECT, ACADEMIC_YEAR, YEAR_LEVEL];

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub student_id: String,
    pub name: String,
    pub subject: String,
    pub academic_year: String,
    pub year_level: String,
}

pub fn decode_roster(data: &[u8]) -> Result<Vec<RosterEntry>, DecodeError> {
    let mut rdr = reader(data);
    let index = HeaderIndex::new(rdr.headers()?);
    index.require(&ROSTER_COLUMNS)?;

    let mut entries = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let student_id = index.cell(&record, STUDENT_ID);
        if student_id.is_empty() {
            continue;
        }
        entries.push(RosterEntry {
            student_id: student_id.to_string(),
            name: index.cell(&record, STUDENT_NAME).to_string(),
            subject: index.cell(&record, SUBJECT).to_string(),
            academic_year: index.cell(&record, ACADEMIC_YEAR).to_string(),
            year_level: index.cell(&record, YEAR_LEVEL).to_string(),
        });
    }
    Ok(entries)
}
