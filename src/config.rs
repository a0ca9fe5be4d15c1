//! Runtime settings read from the environment.
//!
//! | Variable           | Default       |
//! |--------------------|---------------|
//! | `EXAM_DATA_DIR`    | `resources`   |
//! | `EXAM_FILE_PREFIX` | `e8-schools-` |
//! | `EXAM_YEARS`       | all found     |
//! | `EXAM_TARGET_YEAR` | latest + 1    |

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::loader::DEFAULT_PREFIX;

pub const DEFAULT_DATA_DIR: &str = "resources";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub file_prefix: String,
    pub years: Option<Vec<i32>>,
    pub target_year: Option<i32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            file_prefix: DEFAULT_PREFIX.to_string(),
            years: None,
            target_year: None,
        }
    }
}

impl AppConfig {
    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("EXAM_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = lookup("EXAM_FILE_PREFIX") {
            config.file_prefix = prefix;
        }
        if let Some(years) = lookup("EXAM_YEARS") {
            config.years = Some(parse_years(&years).context("invalid EXAM_YEARS")?);
        }
        if let Some(year) = lookup("EXAM_TARGET_YEAR") {
            config.target_year = Some(
                year.trim()
                    .parse::<i32>()
                    .with_context(|| format!("invalid EXAM_TARGET_YEAR `{year}`"))?,
            );
        }

        Ok(config)
    }
}

/// Parses a comma-separated year list such as `2021,2022, 2023`.
pub fn parse_years(text: &str) -> Result<Vec<i32>> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>()
                .with_context(|| format!("`{part}` is not a year"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.data_dir, PathBuf::from("resources"));
        assert_eq!(config.file_prefix, "e8-schools-");
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("EXAM_DATA_DIR", "/data/exams"),
            ("EXAM_YEARS", "2021, 2022,2023"),
            ("EXAM_TARGET_YEAR", "2026"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/data/exams"));
        assert_eq!(config.years, Some(vec![2021, 2022, 2023]));
        assert_eq!(config.target_year, Some(2026));
    }

    #[test]
    fn test_invalid_values() {
        assert!(AppConfig::from_lookup(lookup(&[("EXAM_YEARS", "2021,next")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("EXAM_TARGET_YEAR", "soon")])).is_err());
    }

    #[test]
    fn test_parse_years_skips_empty_parts() {
        assert_eq!(parse_years("2021,,2022,").unwrap(), vec![2021, 2022]);
    }
}
