//! Query engine boundary
//!
//! The repository's query engine is an external collaborator. The investigator
//! needs three things from it: the explain plan for a query, a lazy result
//! handle from executing it, and the handle's rows. Anything that can provide
//! those implements [`QueryEngine`].
//!
//! The engine is expected to report per-index costs on the query-planning
//! logger while it executes; see [`crate::capture`].

mod fixture;

pub use fixture::{EngineFixture, FixtureEngine, FixtureFailure, FixtureResult};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Phase of an investigation that talks to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPhase {
    /// Fetching the explain plan
    Explain,
    /// Executing the query
    Execute,
    /// Obtaining the row iterator
    Rows,
    /// Consuming rows
    Iterate,
}

impl fmt::Display for QueryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPhase::Explain => write!(f, "explain plan"),
            QueryPhase::Execute => write!(f, "query execution"),
            QueryPhase::Rows => write!(f, "result iterator retrieval"),
            QueryPhase::Iterate => write!(f, "result iteration"),
        }
    }
}

/// Lazy result of one query execution
///
/// Rows can be iterated once; iterating again requires executing the query
/// again.
pub trait QueryResult {
    /// Row type produced by the engine
    type Row;

    /// Iterator over the rows
    type Rows<'r>: Iterator<Item = Result<Self::Row, EngineError>>
    where
        Self: 'r;

    /// Total number of results if the engine can report it without iterating
    fn result_count(&self) -> Option<u64>;

    /// Obtain the row iterator
    fn rows(&mut self) -> Result<Self::Rows<'_>, EngineError>;
}

/// A query engine that can explain and execute queries
pub trait QueryEngine {
    type Result: QueryResult;

    /// Explain-with-measurement plan text for `query`
    fn explain_plan(&self, query: &str) -> Result<String, EngineError>;

    /// Execute `query`, returning a lazy result handle
    fn execute(&self, query: &str) -> Result<Self::Result, EngineError>;
}

impl<E: QueryEngine + ?Sized> QueryEngine for &E {
    type Result = E::Result;

    fn explain_plan(&self, query: &str) -> Result<String, EngineError> {
        (**self).explain_plan(query)
    }

    fn execute(&self, query: &str) -> Result<Self::Result, EngineError> {
        (**self).execute(query)
    }
}
