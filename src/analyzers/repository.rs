//! In-memory store of every school's time series, built once at startup.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use tracing::{info, warn};

use crate::analyzers::series::SchoolTimeSeries;
use crate::analyzers::types::{SchoolKey, ScoreRecord};
use crate::parser::{ColumnLayout, DELIMITER};

/// Outcome of ingesting one year's file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestSummary {
    pub year: i32,
    pub rows_read: usize,
    pub rows_ingested: usize,
    pub rows_skipped: usize,
}

/// Mutable side of the repository. Consumed by [`RepositoryBuilder::build`].
#[derive(Debug, Default)]
pub struct RepositoryBuilder {
    schools: BTreeMap<SchoolKey, SchoolTimeSeries>,
    years: BTreeSet<i32>,
}

impl RepositoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parsed record to its school's series, creating the series on first sight.
    pub fn insert(&mut self, record: &ScoreRecord) {
        for (subject, score) in record.out_of_range() {
            warn!(
                city = %record.city,
                school = %record.school,
                year = record.year,
                %subject,
                score,
                "Score outside the 0-100 range"
            );
        }

        self.years.insert(record.year);
        self.schools
            .entry(record.key())
            .or_insert_with_key(|key| SchoolTimeSeries::new(key.clone()))
            .add_record(record);
    }

    /// Reads one year's `;`-delimited CSV. Rows that cannot be decoded or
    /// parsed are logged and skipped; a missing header column or an I/O
    /// failure fails the whole file.
    #[tracing::instrument(skip(self, reader))]
    pub fn ingest<R: Read>(&mut self, year: i32, reader: R) -> Result<IngestSummary> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(DELIMITER)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().context("failed to read CSV header")?.clone();
        let layout = ColumnLayout::from_headers(&headers)?;

        let mut summary = IngestSummary {
            year,
            ..Default::default()
        };

        for result in rdr.byte_records() {
            summary.rows_read += 1;

            let parsed = match result {
                Ok(row) => layout.parse_bytes(&row, year).map_err(anyhow::Error::from),
                Err(e) if e.is_io_error() => {
                    return Err(e).context("failed to read CSV row");
                }
                Err(e) => Err(e.into()),
            };

            match parsed {
                Ok(record) => {
                    self.insert(&record);
                    summary.rows_ingested += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Skipping malformed row");
                    summary.rows_skipped += 1;
                }
            }
        }

        self.years.insert(year);

        info!(
            rows_read = summary.rows_read,
            rows_ingested = summary.rows_ingested,
            rows_skipped = summary.rows_skipped,
            "Year ingested"
        );

        Ok(summary)
    }

    pub fn build(self) -> ResultsRepository {
        ResultsRepository {
            schools: self.schools,
            years: self.years,
        }
    }
}

/// Read-only collection of school series keyed by `(city, school)`.
#[derive(Debug, Default)]
pub struct ResultsRepository {
    schools: BTreeMap<SchoolKey, SchoolTimeSeries>,
    years: BTreeSet<i32>,
}

impl ResultsRepository {
    pub fn builder() -> RepositoryBuilder {
        RepositoryBuilder::new()
    }

    /// Schools whose city equals `city` exactly (case-sensitive, untrimmed),
    /// ordered by school name.
    pub fn schools_in_city(&self, city: &str) -> Vec<&SchoolTimeSeries> {
        self.schools
            .values()
            .filter(|series| series.city() == city)
            .collect()
    }

    pub fn get(&self, key: &SchoolKey) -> Option<&SchoolTimeSeries> {
        self.schools.get(key)
    }

    /// Distinct city names, sorted.
    pub fn cities(&self) -> Vec<&str> {
        self.schools
            .keys()
            .map(|key| key.city.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every ingested year, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.years.iter().copied().collect()
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.years.last().copied()
    }

    pub fn len(&self) -> usize {
        self.schools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schools.is_empty()
    }
}
