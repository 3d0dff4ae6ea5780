//! Row normalisation: [`TableRow`] → [`InputRecord`].

use crate::error::RowError;
use crate::pipeline::table::{TableRow, REQUIRED_COLUMNS};
use serde::{Deserialize, Serialize};

/// The four fields printed on a card.
///
/// Every field is kept exactly as the spreadsheet stored it. `year` in
/// particular is opaque text: "007", "2023-24" and "Alumni" all pass through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    pub name: String,
    pub course: String,
    pub year: String,
    pub team: String,
}

impl InputRecord {
    pub fn new(
        name: impl Into<String>,
        course: impl Into<String>,
        year: impl Into<String>,
        team: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            course: course.into(),
            year: year.into(),
            team: team.into(),
        }
    }

    /// `"Label: value"` lines in card order.
    pub fn detail_lines(&self) -> [String; 4] {
        [
            format!("Name: {}", self.name),
            format!("Course: {}", self.course),
            format!("Year: {}", self.year),
            format!("Team: {}", self.team),
        ]
    }

    /// Text encoded in the card's QR block.
    pub fn qr_payload(&self) -> String {
        self.detail_lines().join("\n")
    }
}

/// Extract the four required fields from a row.
///
/// Fields are checked in card order; the first one that is absent or blank is
/// reported as [`RowError::MissingField`].
pub fn normalize(row: &TableRow) -> Result<InputRecord, RowError> {
    let field = |column: &str| -> Result<String, RowError> {
        match row.get(column) {
            Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
            _ => Err(RowError::MissingField {
                row: row.row_num,
                field: column.to_string(),
            }),
        }
    };

    let [name, course, year, team] = REQUIRED_COLUMNS;
    Ok(InputRecord {
        name: field(name)?,
        course: field(course)?,
        year: field(year)?,
        team: field(team)?,
    })
}
