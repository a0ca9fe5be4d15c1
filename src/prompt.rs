//! Sources of interactive [`ReportQuery`] values.
//!
//! On a terminal the user is prompted with `dialoguer`, which re-asks until a
//! subject or order code parses. When stdin is piped, queries are read as
//! three lines each (city, subject, order) and a bad code is an error.

use anyhow::{Context, Result, bail};
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use exam_trends::analyzers::{ReportQuery, SortKey, Subject};
use std::io::BufRead;

const CITY_PROMPT: &str = "City (empty to quit)";
const SUBJECT_PROMPT: &str = "Subject (P for polish, E for english, M for math, A for all)";
const ORDER_PROMPT: &str = "Order (A for average, T for trend)";

pub trait QuerySource {
    /// Next query, or `None` once the user is done.
    fn next_query(&mut self) -> Result<Option<ReportQuery>>;
}

/// Prompts on the terminal. The city is used exactly as typed.
#[derive(Default)]
pub struct ConsolePrompt {
    theme: ColorfulTheme,
}

impl QuerySource for ConsolePrompt {
    fn next_query(&mut self) -> Result<Option<ReportQuery>> {
        let city: String = Input::with_theme(&self.theme)
            .with_prompt(CITY_PROMPT)
            .allow_empty(true)
            .interact_text()?;
        if city.is_empty() {
            return Ok(None);
        }

        let subject: Subject = Input::with_theme(&self.theme)
            .with_prompt(SUBJECT_PROMPT)
            .interact_text()?;
        let sort: SortKey = Input::with_theme(&self.theme)
            .with_prompt(ORDER_PROMPT)
            .interact_text()?;

        Ok(Some(ReportQuery::new(city, subject, sort)))
    }
}

/// Reads queries from piped input, three lines per query. An empty city
/// line or end of input finishes the session.
pub struct ScriptedQueries<R> {
    input: R,
}

impl<R: BufRead> ScriptedQueries<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn read_field(&mut self, name: &str) -> Result<String> {
        match self.read_line()? {
            Some(line) => Ok(line),
            None => bail!("input ended before the {name} was given"),
        }
    }
}

impl<R: BufRead> QuerySource for ScriptedQueries<R> {
    fn next_query(&mut self) -> Result<Option<ReportQuery>> {
        let city = match self.read_line()? {
            Some(city) if !city.is_empty() => city,
            _ => return Ok(None),
        };

        let subject = self.read_field("subject")?;
        let subject: Subject = subject.parse().context("invalid subject line")?;
        let sort = self.read_field("order")?;
        let sort: SortKey = sort.parse().context("invalid order line")?;

        Ok(Some(ReportQuery::new(city, subject, sort)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_scripted_query() {
        let mut source = ScriptedQueries::new(Cursor::new("Gdansk\nM\nT\n"));

        let query = source.next_query().unwrap().unwrap();
        assert_eq!(query, ReportQuery::new("Gdansk", Subject::Math, SortKey::Trend));
        assert!(source.next_query().unwrap().is_none());
    }

    #[test]
    fn test_scripted_invalid_choice_is_error() {
        let mut source = ScriptedQueries::new(Cursor::new("Gdansk\nX\nA\n"));
        let err = source.next_query().unwrap_err();
        assert!(format!("{err:#}").contains("unknown subject `X`"));
    }

    #[test]
    fn test_scripted_empty_city_quits() {
        let mut source = ScriptedQueries::new(Cursor::new("\nGdansk\nA\nA\n"));
        assert!(source.next_query().unwrap().is_none());
    }

    #[test]
    fn test_scripted_city_kept_verbatim() {
        let mut source = ScriptedQueries::new(Cursor::new(" warsaw \r\nA\nA\n"));
        let query = source.next_query().unwrap().unwrap();
        assert_eq!(query.city, " warsaw ");
    }

    #[test]
    fn test_scripted_input_closed_mid_query() {
        let mut source = ScriptedQueries::new(Cursor::new("Gdansk\nP\n"));
        assert!(source.next_query().is_err());
    }
}
