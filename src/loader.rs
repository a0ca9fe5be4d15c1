//! Discovery and loading of per-year result files.
//!
//! Files are named `<prefix><year>.csv` (by default `e8-schools-2023.csv`)
//! and all live in a single data directory.

use anyhow::{Context, Result, bail};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::repository::{IngestSummary, ResultsRepository};

/// Default file name prefix for result files.
pub const DEFAULT_PREFIX: &str = "e8-schools-";

/// A result file together with the year encoded in its name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearFile {
    pub year: i32,
    pub path: PathBuf,
}

/// Extracts the year from a file name such as `e8-schools-2022.csv`.
pub fn year_from_file_name(file_name: &str, prefix: &str) -> Option<i32> {
    file_name
        .strip_prefix(prefix)?
        .strip_suffix(".csv")?
        .parse()
        .ok()
}

/// Lists every `<prefix><year>.csv` in `dir`, ascending by year.
pub fn discover_year_files(dir: &Path, prefix: &str) -> Result<Vec<YearFile>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        if let Some(year) = entry
            .file_name()
            .to_str()
            .and_then(|name| year_from_file_name(name, prefix))
        {
            files.push(YearFile {
                year,
                path: entry.path(),
            });
        }
    }

    files.sort();
    debug!(count = files.len(), dir = %dir.display(), "Discovered year files");
    Ok(files)
}

/// Builds the repository from the files in `dir`.
///
/// When `years` is given only those years are loaded, and each must have a
/// file. Otherwise every discovered year is loaded.
#[tracing::instrument(fields(dir = %dir.display()))]
pub fn load_repository(
    dir: &Path,
    prefix: &str,
    years: Option<&[i32]>,
) -> Result<(ResultsRepository, Vec<IngestSummary>)> {
    let discovered = discover_year_files(dir, prefix)?;

    let selected: Vec<YearFile> = match years {
        Some(years) => {
            let mut selected = Vec::with_capacity(years.len());
            for year in years {
                match discovered.iter().find(|f| f.year == *year) {
                    Some(file) => selected.push(file.clone()),
                    None => bail!(
                        "no result file for {year} in {} (expected {prefix}{year}.csv)",
                        dir.display()
                    ),
                }
            }
            selected
        }
        None => discovered,
    };

    if selected.is_empty() {
        bail!("no {prefix}<year>.csv files found in {}", dir.display());
    }

    let mut builder = ResultsRepository::builder();
    let mut summaries = Vec::with_capacity(selected.len());

    for file in &selected {
        let reader = File::open(&file.path)
            .with_context(|| format!("failed to open {}", file.path.display()))?;
        let summary = builder
            .ingest(file.year, reader)
            .with_context(|| format!("failed to ingest {}", file.path.display()))?;
        summaries.push(summary);
    }

    let repository = builder.build();
    info!(
        files = summaries.len(),
        schools = repository.len(),
        "Results loaded"
    );

    Ok((repository, summaries))
}
