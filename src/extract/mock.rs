//! Scripted executor for extractor tests.

use super::{QueryError, QueryExecutor, Row, Value};

struct Script {
    needle: &'static str,
    params: Option<Vec<String>>,
    outcome: Result<Vec<Row>, String>,
}

/// Answers queries by substring match, first registered script wins.
#[derive(Default)]
pub struct MockExecutor {
    scripts: Vec<Script>,
    pub calls: Vec<(String, Vec<String>)>,
}

pub fn row(values: Vec<Value>) -> Row {
    Row::new(values)
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any query containing `needle`.
    pub fn on(mut self, needle: &'static str, rows: Vec<Row>) -> Self {
        self.scripts.push(Script {
            needle,
            params: None,
            outcome: Ok(rows),
        });
        self
    }

    /// Answer queries containing `needle` issued with exactly `params`.
    pub fn on_params(mut self, needle: &'static str, params: &[&str], rows: Vec<Row>) -> Self {
        self.scripts.push(Script {
            needle,
            params: Some(params.iter().map(|p| p.to_string()).collect()),
            outcome: Ok(rows),
        });
        self
    }

    pub fn fail_on(mut self, needle: &'static str, message: &str) -> Self {
        self.scripts.push(Script {
            needle,
            params: None,
            outcome: Err(message.to_string()),
        });
        self
    }

    pub fn count(&self, needle: &str) -> usize {
        self.calls.iter().filter(|(sql, _)| sql.contains(needle)).count()
    }
}

impl QueryExecutor for MockExecutor {
    fn query(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Row>, QueryError> {
        let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
        self.calls.push((sql.to_string(), params.clone()));

        let script = self.scripts.iter().find(|s| {
            sql.contains(s.needle) && s.params.as_ref().is_none_or(|p| *p == params)
        });

        match script {
            Some(Script { outcome: Ok(rows), .. }) => Ok(rows.clone()),
            Some(Script { outcome: Err(msg), .. }) => Err(QueryError::Backend(msg.clone())),
            None => Ok(Vec::new()),
        }
    }
}
