//! # querydiag - Query Diagnostics for content-repository query engines
//!
//! Given a query, querydiag answers three questions:
//!
//! - **Which index serves it?** The engine's explain plan is classified
//!   against a closed [`IndexRegistry`].
//! - **What did the planner think of the alternatives?** The engine only
//!   reports per-index cost estimates in its logs, so a [`LogInterceptor`]
//!   captures them under a per-investigation correlation key and a
//!   [`CostExtractor`] ranks them.
//! - **Where does the time go?** Executing the query, obtaining the row
//!   iterator, reading the first page and reading the rest are timed as
//!   separate phases.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use querydiag_core::{CaptureLayer, EngineFixture, FixtureEngine, Investigator, LogInterceptor};
//! use tracing_subscriber::layer::SubscriberExt;
//!
//! let engine = FixtureEngine::new(
//!     EngineFixture::new("[cq:Page] as [a] /* nodeType Filter(query=select * from [cq:Page]) */")
//!         .with_cost_logs(&["cost for nodeType is 14.0", "cost for traverse is Infinity"])
//!         .with_rows(&["/content/site/en"]),
//! );
//!
//! // The engine logs through `tracing`; route its events into the interceptor
//! let interceptor = Arc::new(LogInterceptor::default());
//! let subscriber = tracing_subscriber::registry().with(CaptureLayer::new(interceptor.clone()));
//!
//! let report = tracing::subscriber::with_default(subscriber, || {
//!     Investigator::new(engine)
//!         .with_interceptor(interceptor.clone())
//!         .investigate("SELECT * FROM [cq:Page]")
//! })
//! .unwrap();
//!
//! assert!(report.index_class.ends_with("NodeTypeIndex"));
//! assert_eq!(report.costs.len(), 2);
//! assert_eq!(report.result_count, 1);
//! println!("{}", report);
//! ```

pub mod capture;
pub mod config;
pub mod cost;
pub mod engine;
pub mod error;
pub mod index;
pub mod investigate;

pub use capture::{CaptureLayer, CaptureWindow, LogInterceptor, Verdict};
pub use config::{CaptureConfig, InvestigatorConfig, QUERY_PLANNING_LOGGER};
pub use cost::{CostExtractor, RankedCost};
pub use engine::{EngineFixture, FixtureEngine, QueryEngine, QueryPhase, QueryResult};
pub use error::{DiagnosticsError, ErrorCategory, ErrorResponse, Result};
pub use index::{IndexDescriptor, IndexRegistry, PlanParser};
pub use investigate::{InvestigationReport, Investigator, PhaseTimings};
