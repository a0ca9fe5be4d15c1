//! Per-school, per-subject score history and the metrics derived from it.

use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::types::{
    InsufficientData, MAX_SCORE, MIN_SCORE, SchoolKey, ScoreRecord, Subject,
};
use crate::analyzers::utility::{LinearFit, mean};

/// Scores for one school, one year-keyed map per stored subject.
///
/// Writing the same year twice overwrites the earlier value.
#[derive(Debug, Clone)]
pub struct SchoolTimeSeries {
    key: SchoolKey,
    results: BTreeMap<Subject, BTreeMap<i32, f64>>,
}

impl SchoolTimeSeries {
    pub fn new(key: SchoolKey) -> Self {
        Self {
            key,
            results: BTreeMap::new(),
        }
    }

    pub fn city(&self) -> &str {
        &self.key.city
    }

    pub fn school(&self) -> &str {
        &self.key.school
    }

    /// Records all three subjects for `year`.
    pub fn add_year(&mut self, year: i32, polish: f64, english: f64, math: f64) {
        self.add_result(Subject::Polish, year, polish);
        self.add_result(Subject::English, year, english);
        self.add_result(Subject::Math, year, math);
    }

    /// Records a single subject for `year`. `Subject::All` is derived and is ignored.
    pub fn add_result(&mut self, subject: Subject, year: i32, score: f64) {
        if subject == Subject::All {
            return;
        }
        self.results.entry(subject).or_default().insert(year, score);
    }

    /// Records the non-blank cells of a parsed row.
    pub fn add_record(&mut self, record: &ScoreRecord) {
        for subject in Subject::STORED {
            if let Some(score) = record.score(subject) {
                self.add_result(subject, record.year, score);
            }
        }
    }

    pub fn has_results(&self, subject: Subject) -> bool {
        self.point_count(subject) > 0
    }

    pub fn point_count(&self, subject: Subject) -> usize {
        match subject {
            Subject::All => self.years().len(),
            _ => self.results.get(&subject).map_or(0, BTreeMap::len),
        }
    }

    /// Every year with at least one recorded subject, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.results
            .values()
            .flat_map(|by_year| by_year.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// `(year, score)` pairs for a stored subject, ascending by year.
    pub fn points(&self, subject: Subject) -> Vec<(i32, f64)> {
        self.results
            .get(&subject)
            .map(|by_year| by_year.iter().map(|(&year, &score)| (year, score)).collect())
            .unwrap_or_default()
    }

    /// Mean score for `subject`, optionally ignoring years after `through_year`.
    ///
    /// For `Subject::All` this is the mean of the per-subject averages of the
    /// subjects that have data.
    pub fn average(
        &self,
        subject: Subject,
        through_year: Option<i32>,
    ) -> Result<f64, InsufficientData> {
        if subject == Subject::All {
            return self.combine(|s| self.average(s, through_year));
        }

        let scores: Vec<f64> = self
            .points(subject)
            .into_iter()
            .filter(|(year, _)| through_year.is_none_or(|cutoff| *year <= cutoff))
            .map(|(_, score)| score)
            .collect();

        mean(&scores).ok_or(InsufficientData { subject })
    }

    /// Least-squares line for a stored subject.
    pub fn fit(&self, subject: Subject) -> Result<LinearFit, InsufficientData> {
        LinearFit::fit(&self.points(subject)).ok_or(InsufficientData { subject })
    }

    /// Projected score for `target_year`, clamped to the valid score range.
    ///
    /// For `Subject::All` each subject is projected on its own and the
    /// projections are averaged.
    pub fn trend(&self, subject: Subject, target_year: i32) -> Result<f64, InsufficientData> {
        if subject == Subject::All {
            return self.combine(|s| self.trend(s, target_year));
        }

        let fit = self.fit(subject)?;
        Ok(fit.predict(target_year).clamp(MIN_SCORE, MAX_SCORE))
    }

    fn combine<F>(&self, metric: F) -> Result<f64, InsufficientData>
    where
        F: Fn(Subject) -> Result<f64, InsufficientData>,
    {
        let values: Vec<f64> = Subject::STORED
            .iter()
            .filter_map(|&subject| metric(subject).ok())
            .collect();

        mean(&values).ok_or(InsufficientData { subject: Subject::All })
    }
}
