//! Data types shared by the aggregation pipeline.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lowest score a school can report for a subject.
pub const MIN_SCORE: f64 = 0.0;
/// Highest score a school can report for a subject.
pub const MAX_SCORE: f64 = 100.0;

/// An exam subject. `All` is derived from the other three and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Polish,
    English,
    Math,
    All,
}

impl Subject {
    /// The subjects that carry their own series.
    pub const STORED: [Subject; 3] = [Subject::Polish, Subject::English, Subject::Math];

    pub fn name(self) -> &'static str {
        match self {
            Subject::Polish => "polish",
            Subject::English => "english",
            Subject::Math => "math",
            Subject::All => "all",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown subject `{0}` (expected P, E, M or A)")]
pub struct SubjectParseError(pub String);

impl FromStr for Subject {
    type Err = SubjectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "polish" => Ok(Subject::Polish),
            "e" | "english" => Ok(Subject::English),
            "m" | "math" => Ok(Subject::Math),
            "a" | "all" => Ok(Subject::All),
            _ => Err(SubjectParseError(s.to_string())),
        }
    }
}

/// Which metric a report is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Average,
    Trend,
}

impl SortKey {
    pub fn name(self) -> &'static str {
        match self {
            SortKey::Average => "average",
            SortKey::Trend => "trend",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown order `{0}` (expected A for average or T for trend)")]
pub struct SortKeyParseError(pub String);

impl FromStr for SortKey {
    type Err = SortKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "average" => Ok(SortKey::Average),
            "t" | "trend" => Ok(SortKey::Trend),
            _ => Err(SortKeyParseError(s.to_string())),
        }
    }
}

/// Identifies a school across years. Both parts are compared byte for byte:
/// no case folding and no whitespace trimming.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchoolKey {
    pub city: String,
    pub school: String,
}

impl SchoolKey {
    pub fn new(city: impl Into<String>, school: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            school: school.into(),
        }
    }
}

/// One parsed CSV row. A `None` score means the cell was blank for that year.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub city: String,
    pub school: String,
    pub year: i32,
    pub polish: Option<f64>,
    pub english: Option<f64>,
    pub math: Option<f64>,
}

impl ScoreRecord {
    pub fn key(&self) -> SchoolKey {
        SchoolKey::new(self.city.clone(), self.school.clone())
    }

    pub fn score(&self, subject: Subject) -> Option<f64> {
        match subject {
            Subject::Polish => self.polish,
            Subject::English => self.english,
            Subject::Math => self.math,
            Subject::All => None,
        }
    }

    /// Scores that fall outside `[MIN_SCORE, MAX_SCORE]`.
    pub fn out_of_range(&self) -> Vec<(Subject, f64)> {
        Subject::STORED
            .iter()
            .filter_map(|&subject| self.score(subject).map(|score| (subject, score)))
            .filter(|(_, score)| !(MIN_SCORE..=MAX_SCORE).contains(score))
            .collect()
    }
}

/// Raised when a metric is requested for a subject with no recorded years.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no recorded scores for {subject}")]
pub struct InsufficientData {
    pub subject: Subject,
}

/// One line of a report: every average and trend for a single school.
/// `None` marks a metric that could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub school: String,
    pub polish_average: Option<f64>,
    pub polish_trend: Option<f64>,
    pub english_average: Option<f64>,
    pub english_trend: Option<f64>,
    pub math_average: Option<f64>,
    pub math_trend: Option<f64>,
    pub all_average: Option<f64>,
    pub all_trend: Option<f64>,
}

impl ReportRow {
    pub fn metric(&self, subject: Subject, key: SortKey) -> Option<f64> {
        match (subject, key) {
            (Subject::Polish, SortKey::Average) => self.polish_average,
            (Subject::Polish, SortKey::Trend) => self.polish_trend,
            (Subject::English, SortKey::Average) => self.english_average,
            (Subject::English, SortKey::Trend) => self.english_trend,
            (Subject::Math, SortKey::Average) => self.math_average,
            (Subject::Math, SortKey::Trend) => self.math_trend,
            (Subject::All, SortKey::Average) => self.all_average,
            (Subject::All, SortKey::Trend) => self.all_trend,
        }
    }
}

/// Column names in the order a report presents them.
pub const REPORT_COLUMNS: [&str; 9] = [
    "school",
    "polish_average",
    "polish_trend",
    "english_average",
    "english_trend",
    "math_average",
    "math_trend",
    "all_average",
    "all_trend",
];
