//! Investigation report and its text rendering

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cost::RankedCost;

use super::timing::{format_millis, PhaseTimings};

/// Everything one investigation found out about a query
#[derive(Debug, Clone, Serialize)]
pub struct InvestigationReport {
    /// Key the engine's log lines were captured under
    pub correlation_id: String,

    /// When the investigation started
    pub started_at: DateTime<Utc>,

    /// Query text as given
    pub query: String,

    /// Raw explain plan text
    pub plan: String,

    /// Class identifier of the index the plan selected
    pub index_class: String,

    /// Per-index cost estimates, cheapest first
    pub costs: Vec<RankedCost>,

    /// Total number of results
    pub result_count: u64,

    /// Rows read during the first-page phase
    pub page_size: usize,

    /// Phase timings
    pub timings: PhaseTimings,
}

impl InvestigationReport {
    /// The report as one text block
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InvestigationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "QUERY: {}", self.query)?;
        writeln!(f)?;
        writeln!(f, "QUERY PLAN: {}", self.plan)?;
        writeln!(f)?;
        writeln!(f, "INDEX CLASS IN QUERY PLAN: {}", self.index_class)?;
        writeln!(f)?;

        writeln!(f, "QUERY COST PER INDEX:")?;
        for cost in &self.costs {
            writeln!(f, "{}", cost.render())?;
        }
        writeln!(f)?;

        let t = &self.timings;
        writeln!(f, "QUERY PERFORMANCE RESULT:")?;
        writeln!(f, "1. TOTAL NUMBER OF RESULTS: {}", self.result_count)?;
        writeln!(
            f,
            "2. QUERY EXECUTION TIME: {} ms (QueryEngine::execute)",
            format_millis(t.execute)
        )?;
        writeln!(
            f,
            "3. GET RESULT ROWS TIME: {} ms (QueryResult::rows)",
            format_millis(t.get_rows)
        )?;
        writeln!(
            f,
            "4. READ FIRST PAGE TIME: {} ms (first {} rows)",
            format_millis(t.first_page),
            self.page_size
        )?;
        writeln!(
            f,
            "5. READ ALL RESULTS TIME: {} ms (remaining rows)",
            format_millis(t.remaining)
        )?;
        writeln!(
            f,
            "6. TOTAL TIME: {} ms (sum of steps 2-5)",
            format_millis(t.total())
        )
    }
}
