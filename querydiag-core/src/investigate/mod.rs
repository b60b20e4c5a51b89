//! Investigator - runs one query under observation and reports on it
//!
//! ```text
//! explain_plan ──► PlanParser ──► selected index
//!                                      │
//! open capture window (fresh key) ─────┤
//!   execute ─► rows ─► first page ─► remaining rows   (timed, sequential)
//!                                      │
//! saved_logs ──► CostExtractor ──► ranked costs
//! close capture window (always) ───────┤
//!                                      ▼
//!                             InvestigationReport
//! ```
//!
//! An investigation is synchronous and blocking. There is no timeout: a hung
//! engine call or an endless result set blocks the caller indefinitely.

mod report;
mod timing;

pub use report::InvestigationReport;
pub use timing::{format_millis, timed, PhaseTimings};

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use crate::capture::{context, LogInterceptor};
use crate::config::InvestigatorConfig;
use crate::cost::CostExtractor;
use crate::engine::{QueryEngine, QueryPhase, QueryResult};
use crate::error::{DiagnosticsError, EngineError, Result};
use crate::index::{IndexRegistry, PlanParser};

/// Drives diagnostics for queries against one engine
pub struct Investigator<E> {
    engine: E,
    registry: Arc<IndexRegistry>,
    interceptor: Arc<LogInterceptor>,
    config: InvestigatorConfig,
}

impl<E: QueryEngine> Investigator<E> {
    /// Investigator using the built-in registry and the global interceptor
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            registry: Arc::new(IndexRegistry::new()),
            interceptor: LogInterceptor::global(),
            config: InvestigatorConfig::default(),
        }
    }

    /// Use a custom index registry
    pub fn with_registry(mut self, registry: IndexRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Capture through `interceptor` instead of the global one
    ///
    /// The engine's log events must reach this same interceptor, e.g. through
    /// a [`crate::capture::CaptureLayer`] built from it.
    pub fn with_interceptor(mut self, interceptor: Arc<LogInterceptor>) -> Self {
        self.interceptor = interceptor;
        self
    }

    /// Set investigation settings
    ///
    /// Only `page_size` is read here; `capture` settings apply to whichever
    /// interceptor the caller builds from them.
    pub fn with_config(mut self, config: InvestigatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    pub fn interceptor(&self) -> &Arc<LogInterceptor> {
        &self.interceptor
    }

    pub fn config(&self) -> &InvestigatorConfig {
        &self.config
    }

    /// Investigate `query` and return the rendered report text
    pub fn investigate_text(&self, query: &str) -> Result<String> {
        self.investigate(query).map(|report| report.render())
    }

    /// Investigate `query`
    ///
    /// The capture window for this investigation is closed before returning,
    /// whether the investigation succeeds or fails.
    pub fn investigate(&self, query: &str) -> Result<InvestigationReport> {
        let correlation_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        let plan = self
            .engine
            .explain_plan(query)
            .map_err(|e| DiagnosticsError::engine(QueryPhase::Explain, e))?;
        let index = PlanParser::new(&self.registry).classify(&plan)?;

        tracing::debug!(
            correlation_id = %correlation_id,
            index = %index.class_identifier,
            "query plan classified"
        );

        let window = self.interceptor.open_window(&correlation_id);
        let span = context::span(&correlation_id);
        let entered = span.enter();

        let (result_count, timings) = self.run_timed(query)?;

        drop(entered);
        let lines = window.lines();
        let costs = CostExtractor::new(&self.registry).extract(lines.as_slice());
        drop(window);

        tracing::debug!(
            correlation_id = %correlation_id,
            captured = lines.len(),
            ranked = costs.len(),
            result_count,
            "investigation complete"
        );

        Ok(InvestigationReport {
            correlation_id,
            started_at,
            query: query.to_string(),
            plan,
            index_class: index.class_identifier.clone(),
            costs,
            result_count,
            page_size: self.config.page_size,
            timings,
        })
    }

    /// Execute and fully consume `query`, timing each phase
    fn run_timed(&self, query: &str) -> Result<(u64, PhaseTimings)> {
        let (result, execute) = timed(|| self.engine.execute(query));
        let mut result = result.map_err(|e| DiagnosticsError::engine(QueryPhase::Execute, e))?;

        let (consumed, get_rows, first_page, remaining) = {
            let start = Instant::now();
            let rows = result.rows();
            let get_rows = start.elapsed();
            let mut rows = rows.map_err(|e| DiagnosticsError::engine(QueryPhase::Rows, e))?;

            let (first, first_page) = timed(|| consume(&mut rows, Some(self.config.page_size)));
            let first = first.map_err(|e| DiagnosticsError::engine(QueryPhase::Iterate, e))?;

            let (rest, remaining) = timed(|| consume(&mut rows, None));
            let rest = rest.map_err(|e| DiagnosticsError::engine(QueryPhase::Iterate, e))?;

            (first + rest, get_rows, first_page, remaining)
        };

        let result_count = result.result_count().unwrap_or(consumed);
        let timings = PhaseTimings {
            execute,
            get_rows,
            first_page,
            remaining,
        };
        Ok((result_count, timings))
    }
}

/// Pull up to `limit` rows (all when `None`), returning how many were read
fn consume<R, I>(rows: &mut I, limit: Option<usize>) -> std::result::Result<u64, EngineError>
where
    I: Iterator<Item = std::result::Result<R, EngineError>>,
{
    let budget = limit.unwrap_or(usize::MAX);
    let mut count = 0u64;
    while (count as usize) < budget {
        match rows.next() {
            Some(row) => {
                row?;
                count += 1;
            }
            None => break,
        }
    }
    Ok(count)
}
