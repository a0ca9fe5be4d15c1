//! Row parser for per-year exam score CSVs.
//!
//! Files use `;` as the field delimiter and a comma as the decimal
//! separator, e.g. `Gdansk;SP 12;75,0;82,5;61,3`.

use csv::{ByteRecord, StringRecord};
use thiserror::Error;

use crate::analyzers::types::ScoreRecord;

/// Field delimiter used by the exam result files.
pub const DELIMITER: u8 = b';';

/// Header names, in the canonical column order.
pub const HEADERS: [&str; 5] = [
    "city",
    "school",
    "polish_average",
    "english_average",
    "math_average",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },
    #[error("missing column `{0}` in header")]
    MissingColumn(&'static str),
}

/// Positions of the five required columns within a file's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    city: usize,
    school: usize,
    polish: usize,
    english: usize,
    math: usize,
    width: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            city: 0,
            school: 1,
            polish: 2,
            english: 3,
            math: 4,
            width: HEADERS.len(),
        }
    }
}

impl ColumnLayout {
    /// Resolves columns by header name so files with reordered or extra
    /// columns still parse.
    pub fn from_headers(headers: &StringRecord) -> Result<Self, ParseError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(ParseError::MissingColumn(name))
        };

        Ok(Self {
            city: find(HEADERS[0])?,
            school: find(HEADERS[1])?,
            polish: find(HEADERS[2])?,
            english: find(HEADERS[3])?,
            math: find(HEADERS[4])?,
            width: headers.len(),
        })
    }

    /// Decodes a raw row as UTF-8, then parses it. Rows saved in another
    /// encoding are reported as malformed.
    pub fn parse_bytes(&self, row: &ByteRecord, year: i32) -> Result<ScoreRecord, ParseError> {
        let line = row.position().map_or(0, |p| p.line());
        let row = StringRecord::from_byte_record(row.clone()).map_err(|e| {
            ParseError::MalformedRow {
                line,
                reason: format!("invalid UTF-8 in field {}", e.utf8_error().field()),
            }
        })?;
        self.parse(&row, year)
    }

    /// Parses one data row recorded in `year`.
    pub fn parse(&self, row: &StringRecord, year: i32) -> Result<ScoreRecord, ParseError> {
        let line = row.position().map_or(0, |p| p.line());
        let malformed = |reason: String| ParseError::MalformedRow { line, reason };

        if row.len() != self.width {
            return Err(malformed(format!(
                "expected {} fields, found {}",
                self.width,
                row.len()
            )));
        }

        let score = |index: usize| {
            parse_score(&row[index]).map_err(|value| malformed(format!("invalid score `{value}`")))
        };

        Ok(ScoreRecord {
            city: row[self.city].to_string(),
            school: row[self.school].to_string(),
            year,
            polish: score(self.polish)?,
            english: score(self.english)?,
            math: score(self.math)?,
        })
    }
}

/// Parses one data row in the canonical column order.
pub fn parse(row: &StringRecord, year: i32) -> Result<ScoreRecord, ParseError> {
    ColumnLayout::default().parse(row, year)
}

/// Converts a comma-decimal cell ("82,5") to a float. Blank cells yield
/// `None`; anything non-numeric is returned as the error value.
pub fn parse_score(text: &str) -> Result<Option<f64>, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_parse_score_comma_decimal() {
        assert_eq!(parse_score("75,0"), Ok(Some(75.0)));
        assert_eq!(parse_score("82,5"), Ok(Some(82.5)));
        assert_eq!(parse_score("0,57"), Ok(Some(0.57)));
    }

    #[test]
    fn test_parse_score_integers_and_dots() {
        assert_eq!(parse_score("1"), Ok(Some(1.0)));
        assert_eq!(parse_score("123"), Ok(Some(123.0)));
        assert_eq!(parse_score("123.123"), Ok(Some(123.123)));
    }

    #[test]
    fn test_parse_score_blank() {
        assert_eq!(parse_score(""), Ok(None));
        assert_eq!(parse_score("   "), Ok(None));
    }

    #[test]
    fn test_parse_score_non_number() {
        assert_eq!(parse_score("A"), Err("A".to_string()));
        assert!(parse_score("NaN").is_err());
        assert!(parse_score("1,2,3").is_err());
    }

    #[test]
    fn test_parse_valid_row() {
        let record = parse(&row(&["Gdansk", "SP 12", "75,0", "82,5", "61,3"]), 2022).unwrap();

        assert_eq!(record.city, "Gdansk");
        assert_eq!(record.school, "SP 12");
        assert_eq!(record.year, 2022);
        assert_eq!(record.polish, Some(75.0));
        assert_eq!(record.english, Some(82.5));
        assert_eq!(record.math, Some(61.3));
    }

    #[test]
    fn test_parse_keeps_names_verbatim() {
        let record = parse(&row(&[" Gdansk", "SP 12 ", "1", "2", "3"]), 2022).unwrap();
        assert_eq!(record.city, " Gdansk");
        assert_eq!(record.school, "SP 12 ");
    }

    #[test]
    fn test_parse_blank_score_cell() {
        let record = parse(&row(&["Gdansk", "SP 12", "75,0", "", "61,3"]), 2022).unwrap();
        assert_eq!(record.english, None);
    }

    #[test]
    fn test_parse_wrong_field_count() {
        let err = parse(&row(&["Gdansk", "SP 12", "75,0", "82,5"]), 2022).unwrap_err();
        assert!(matches!(err, ParseError::MalformedRow { .. }));
    }

    #[test]
    fn test_parse_bad_number() {
        let err = parse(&row(&["Gdansk", "SP 12", "abc", "82,5", "61,3"]), 2022).unwrap_err();
        match err {
            ParseError::MalformedRow { reason, .. } => assert!(reason.contains("abc")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_layout_from_reordered_headers() {
        let headers = row(&[
            "school",
            "math_average",
            "city",
            "voivodeship",
            "english_average",
            "polish_average",
        ]);
        let layout = ColumnLayout::from_headers(&headers).unwrap();

        let record = layout
            .parse(&row(&["SP 1", "40,0", "Krakow", "malopolskie", "50,0", "60,0"]), 2023)
            .unwrap();
        assert_eq!(record.city, "Krakow");
        assert_eq!(record.school, "SP 1");
        assert_eq!(record.polish, Some(60.0));
        assert_eq!(record.english, Some(50.0));
        assert_eq!(record.math, Some(40.0));
    }

    #[test]
    fn test_parse_bytes_invalid_utf8() {
        let fields: Vec<&[u8]> = vec![b"Gda\xf1sk", b"SP 1", b"60,0", b"70,0", b"80,0"];
        let raw = ByteRecord::from(fields);
        let err = ColumnLayout::default().parse_bytes(&raw, 2021).unwrap_err();
        match err {
            ParseError::MalformedRow { reason, .. } => assert!(reason.contains("field 0")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_bytes_valid_row() {
        let raw = ByteRecord::from(vec!["Gdansk", "SP 1", "60,0", "70,0", "80,0"]);
        let record = ColumnLayout::default().parse_bytes(&raw, 2021).unwrap();
        assert_eq!(record.city, "Gdansk");
        assert_eq!(record.math, Some(80.0));
    }

    #[test]
    fn test_layout_missing_column() {
        let headers = row(&["city", "school", "polish_average", "english_average"]);
        assert_eq!(
            ColumnLayout::from_headers(&headers),
            Err(ParseError::MissingColumn("math_average"))
        );
    }
}
