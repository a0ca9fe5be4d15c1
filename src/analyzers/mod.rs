//! School score aggregation and trend projection.
//!
//! Parsed rows are collected into per-school time series, which compute
//! per-subject averages and least-squares trends. The report builder turns
//! one city's series into sorted rows.

pub mod report;
pub mod repository;
pub mod series;
pub mod types;
pub mod utility;

pub use report::{ReportBuilder, ReportError, ReportQuery};
pub use repository::{IngestSummary, RepositoryBuilder, ResultsRepository};
pub use series::SchoolTimeSeries;
pub use types::{
    InsufficientData, ReportRow, SchoolKey, ScoreRecord, SortKey, Subject, SubjectParseError,
};
