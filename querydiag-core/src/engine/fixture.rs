//! Replay engine driven by a recorded JSON fixture
//!
//! A fixture holds what a real engine produced for one query: its explain
//! plan, the cost lines it logged while executing, and its rows. Replaying it
//! goes through the same capture path as a live engine: cost lines are logged
//! on the query-planning target while `execute` runs, optionally from worker
//! threads.
//!
//! ```json
//! {
//!   "plan": "[cq:Page] as [a] /* nodeType Filter(...) */",
//!   "cost_logs": ["cost for nodeType is 14.0"],
//!   "rows": ["/content/site/en"],
//!   "log_from_workers": true
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::capture::context;
use crate::config::QUERY_PLANNING_LOGGER;
use crate::error::{DiagnosticsError, EngineError, Result};

use super::{QueryEngine, QueryPhase, QueryResult};

/// Injected engine failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureFailure {
    /// Phase that fails
    pub phase: QueryPhase,

    /// Error message the engine reports
    pub message: String,

    /// For iteration failures, rows yielded before the error
    #[serde(default)]
    pub after_rows: usize,
}

/// Recorded engine behaviour for a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFixture {
    /// Explain plan text
    pub plan: String,

    /// Messages logged on the query-planning logger during execution
    #[serde(default)]
    pub cost_logs: Vec<String>,

    /// Result rows, typically node paths
    #[serde(default)]
    pub rows: Vec<String>,

    /// Count the engine reports up front; `None` means unknown
    #[serde(default)]
    pub reported_count: Option<u64>,

    /// Log cost lines from a worker thread instead of the caller's thread
    #[serde(default)]
    pub log_from_workers: bool,

    /// Optional injected failure
    #[serde(default)]
    pub failure: Option<FixtureFailure>,
}

impl EngineFixture {
    pub fn new(plan: &str) -> Self {
        Self {
            plan: plan.to_string(),
            ..Default::default()
        }
    }

    pub fn with_cost_logs(mut self, lines: &[&str]) -> Self {
        self.cost_logs = lines.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_rows(mut self, rows: &[&str]) -> Self {
        self.rows = rows.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_reported_count(mut self, count: u64) -> Self {
        self.reported_count = Some(count);
        self
    }

    pub fn with_worker_logging(mut self) -> Self {
        self.log_from_workers = true;
        self
    }

    pub fn with_failure(mut self, phase: QueryPhase, message: &str) -> Self {
        self.failure = Some(FixtureFailure {
            phase,
            message: message.to_string(),
            after_rows: 0,
        });
        self
    }

    fn failure_at(&self, phase: QueryPhase) -> Option<&FixtureFailure> {
        self.failure.as_ref().filter(|f| f.phase == phase)
    }
}

/// Query engine that replays an [`EngineFixture`] for every query
#[derive(Debug, Clone)]
pub struct FixtureEngine {
    fixture: EngineFixture,
}

impl FixtureEngine {
    pub fn new(fixture: EngineFixture) -> Self {
        Self { fixture }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DiagnosticsError::FixtureLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn fixture(&self) -> &EngineFixture {
        &self.fixture
    }

    fn log_costs(&self) {
        for line in &self.fixture.cost_logs {
            tracing::debug!(target: QUERY_PLANNING_LOGGER, "{}", line);
        }
    }

    fn log_costs_from_worker(&self) {
        let dispatch = tracing::dispatcher::get_default(|d| d.clone());
        let span = tracing::Span::current();
        std::thread::scope(|scope| {
            scope.spawn(context::propagate(|| {
                tracing::dispatcher::with_default(&dispatch, || {
                    span.in_scope(|| self.log_costs());
                });
            }));
        });
    }
}

impl QueryEngine for FixtureEngine {
    type Result = FixtureResult;

    fn explain_plan(&self, _query: &str) -> std::result::Result<String, EngineError> {
        if let Some(failure) = self.fixture.failure_at(QueryPhase::Explain) {
            return Err(failure.message.clone().into());
        }
        Ok(self.fixture.plan.clone())
    }

    fn execute(&self, query: &str) -> std::result::Result<FixtureResult, EngineError> {
        tracing::trace!(query, "replaying fixture execution");

        if self.fixture.log_from_workers {
            self.log_costs_from_worker();
        } else {
            self.log_costs();
        }

        if let Some(failure) = self.fixture.failure_at(QueryPhase::Execute) {
            return Err(failure.message.clone().into());
        }

        Ok(FixtureResult {
            rows: self.fixture.rows.clone(),
            reported_count: self.fixture.reported_count,
            failure: self.fixture.failure.clone(),
            consumed: false,
        })
    }
}

/// Result handle returned by [`FixtureEngine::execute`]
#[derive(Debug, Clone)]
pub struct FixtureResult {
    rows: Vec<String>,
    reported_count: Option<u64>,
    failure: Option<FixtureFailure>,
    consumed: bool,
}

impl QueryResult for FixtureResult {
    type Row = String;
    type Rows<'r> = FixtureRows<'r>;

    fn result_count(&self) -> Option<u64> {
        self.reported_count
    }

    fn rows(&mut self) -> std::result::Result<FixtureRows<'_>, EngineError> {
        if let Some(failure) = self.failure.as_ref().filter(|f| f.phase == QueryPhase::Rows) {
            return Err(failure.message.clone().into());
        }
        if self.consumed {
            return Err("result rows were already consumed; execute the query again".into());
        }
        self.consumed = true;

        let fail_after = self
            .failure
            .as_ref()
            .filter(|f| f.phase == QueryPhase::Iterate)
            .map(|f| (f.after_rows, f.message.as_str()));

        Ok(FixtureRows {
            rows: self.rows.iter(),
            yielded: 0,
            fail_after,
        })
    }
}

/// Row iterator over a fixture result
#[derive(Debug)]
pub struct FixtureRows<'r> {
    rows: std::slice::Iter<'r, String>,
    yielded: usize,
    fail_after: Option<(usize, &'r str)>,
}

impl Iterator for FixtureRows<'_> {
    type Item = std::result::Result<String, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((after, message)) = self.fail_after {
            if self.yielded == after {
                self.fail_after = None;
                return Some(Err(message.into()));
            }
        }
        let row = self.rows.next()?;
        self.yielded += 1;
        Some(Ok(row.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_from_json_defaults() {
        let engine = FixtureEngine::from_json(r#"{"plan": "[nt:base] as [a] /* traverse */"}"#).unwrap();
        assert!(engine.fixture().rows.is_empty());
        assert!(engine.fixture().failure.is_none());
        assert!(!engine.fixture().log_from_workers);
    }

    #[test]
    fn test_rows_are_not_restartable() {
        let engine = FixtureEngine::new(EngineFixture::new("p").with_rows(&["/a", "/b"]));
        let mut result = engine.execute("q").unwrap();

        let rows: Vec<String> = result.rows().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(rows, vec!["/a".to_string(), "/b".to_string()]);
        assert!(result.rows().is_err());
    }

    #[test]
    fn test_iteration_failure_after_rows() {
        let mut fixture = EngineFixture::new("p").with_rows(&["/a", "/b", "/c"]);
        fixture.failure = Some(FixtureFailure {
            phase: QueryPhase::Iterate,
            message: "session closed".to_string(),
            after_rows: 2,
        });
        let engine = FixtureEngine::new(fixture);
        let mut result = engine.execute("q").unwrap();
        let mut rows = result.rows().unwrap();

        assert!(rows.next().unwrap().is_ok());
        assert!(rows.next().unwrap().is_ok());
        let err = rows.next().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "session closed");
    }

    #[test]
    fn test_explain_failure() {
        let engine = FixtureEngine::new(
            EngineFixture::new("p").with_failure(QueryPhase::Explain, "repository unavailable"),
        );
        assert_eq!(
            engine.explain_plan("q").unwrap_err().to_string(),
            "repository unavailable"
        );
    }

    #[test]
    fn test_missing_fixture_file() {
        let err = FixtureEngine::from_file(Path::new("/nonexistent/fixture.json")).unwrap_err();
        assert!(matches!(err, DiagnosticsError::FixtureLoad { .. }));
    }
}
