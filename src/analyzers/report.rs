use std::cmp::Ordering;

use thiserror::Error;
use tracing::debug;

use crate::analyzers::repository::ResultsRepository;
use crate::analyzers::series::SchoolTimeSeries;
use crate::analyzers::types::{ReportRow, SortKey, Subject};

/// What a caller wants to see: one city, the subject of interest, and the
/// metric that orders the rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub city: String,
    pub subject: Subject,
    pub sort: SortKey,
}

impl ReportQuery {
    pub fn new(city: impl Into<String>, subject: Subject, sort: SortKey) -> Self {
        Self {
            city: city.into(),
            subject,
            sort,
        }
    }

    /// Name of the column the rows are sorted by, e.g. `math_trend`.
    pub fn sort_column(&self) -> String {
        format!("{}_{}", self.subject, self.sort)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("no schools found for city `{city}`")]
    EmptyResult { city: String },
    #[error("no exam results have been loaded")]
    NoData,
}

/// Turns repository contents into sorted report rows.
pub struct ReportBuilder<'a> {
    repository: &'a ResultsRepository,
    target_year: Option<i32>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(repository: &'a ResultsRepository) -> Self {
        Self {
            repository,
            target_year: None,
        }
    }

    /// Year the trend columns project to. Defaults to the year after the
    /// latest ingested one, capped at `i32::MAX`.
    pub fn target_year(mut self, year: Option<i32>) -> Self {
        self.target_year = year;
        self
    }

    pub fn resolved_target_year(&self) -> Option<i32> {
        self.target_year
            .or_else(|| self.repository.latest_year().map(|year| year.saturating_add(1)))
    }

    /// Builds every metric for each school in the query's city, sorted
    /// descending by the query's metric. Missing metrics sort last and ties
    /// fall back to school name, ascending.
    #[tracing::instrument(
        skip(self),
        fields(city = %query.city, subject = %query.subject, sort = %query.sort)
    )]
    pub fn build(&self, query: &ReportQuery) -> Result<Vec<ReportRow>, ReportError> {
        let target_year = self.resolved_target_year().ok_or(ReportError::NoData)?;

        let schools = self.repository.schools_in_city(&query.city);
        if schools.is_empty() {
            return Err(ReportError::EmptyResult {
                city: query.city.clone(),
            });
        }

        let mut rows: Vec<ReportRow> = schools
            .into_iter()
            .map(|series| build_row(series, target_year))
            .collect();

        rows.sort_by(|a, b| {
            compare_metric(a.metric(query.subject, query.sort), b.metric(query.subject, query.sort))
                .then_with(|| a.school.cmp(&b.school))
        });

        debug!(rows = rows.len(), target_year, "Report built");
        Ok(rows)
    }
}

/// Computes all eight metrics for one school. A subject without data leaves
/// its columns empty instead of failing the row.
pub fn build_row(series: &SchoolTimeSeries, target_year: i32) -> ReportRow {
    let average = |subject| series.average(subject, None).ok();
    let trend = |subject| series.trend(subject, target_year).ok();

    ReportRow {
        school: series.school().to_string(),
        polish_average: average(Subject::Polish),
        polish_trend: trend(Subject::Polish),
        english_average: average(Subject::English),
        english_trend: trend(Subject::English),
        math_average: average(Subject::Math),
        math_trend: trend(Subject::Math),
        all_average: average(Subject::All),
        all_trend: trend(Subject::All),
    }
}

/// Descending order with `None` after every value.
fn compare_metric(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
