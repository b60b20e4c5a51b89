//! Engines that report costs by calling the interceptor hook directly.

use std::sync::Arc;

use querydiag_core::error::EngineError;
use querydiag_core::{
    IndexDescriptor, IndexRegistry, Investigator, LogInterceptor, QueryEngine, QueryResult, Verdict,
    QUERY_PLANNING_LOGGER,
};
use tracing::Level;

/// Minimal engine whose planner logs through `LogInterceptor::decide`
struct HookedEngine {
    interceptor: Arc<LogInterceptor>,
    plan: String,
    costs: Vec<(&'static str, &'static str)>,
    rows: usize,
}

struct CountedResult {
    rows: usize,
}

impl QueryResult for CountedResult {
    type Row = usize;
    type Rows<'r> = std::iter::Map<std::ops::Range<usize>, fn(usize) -> Result<usize, EngineError>>;

    fn result_count(&self) -> Option<u64> {
        None
    }

    fn rows(&mut self) -> Result<Self::Rows<'_>, EngineError> {
        Ok((0..self.rows).map(Ok as fn(usize) -> Result<usize, EngineError>))
    }
}

impl QueryEngine for HookedEngine {
    type Result = CountedResult;

    fn explain_plan(&self, _query: &str) -> Result<String, EngineError> {
        Ok(self.plan.clone())
    }

    fn execute(&self, _query: &str) -> Result<CountedResult, EngineError> {
        for (name, cost) in &self.costs {
            let verdict = self.interceptor.decide(
                QUERY_PLANNING_LOGGER,
                Level::DEBUG,
                Some("cost for {} is {}"),
                &[name, cost],
                None,
            );
            assert_eq!(verdict, Verdict::Neutral);
        }
        // Unrelated logger traffic must be ignored
        self.interceptor.decide(
            "org.apache.jackrabbit.oak.query.QueryEngineImpl",
            Level::DEBUG,
            Some("Parsing {} statement"),
            &[&"JCR-SQL2"],
            None,
        );
        Ok(CountedResult { rows: self.rows })
    }
}

#[test]
fn test_direct_hook_capture() {
    let interceptor = Arc::new(LogInterceptor::default());
    let engine = HookedEngine {
        interceptor: Arc::clone(&interceptor),
        plan: "[nt:base] as [a] /* property sling:resourceType = 'site/page' */".to_string(),
        costs: vec![("property", "2.0"), ("traverse", "Infinity"), ("nodeType", "1.5")],
        rows: 30,
    };
    let investigator = Investigator::new(engine).with_interceptor(Arc::clone(&interceptor));

    let text = investigator.investigate_text("SELECT * FROM [nt:base]").unwrap();

    assert!(text.contains(
        "INDEX CLASS IN QUERY PLAN: org.apache.jackrabbit.oak.plugins.index.property.PropertyIndex"
    ));
    let node_type = text.find("[nodeType]: 1.5").unwrap();
    let property = text.find("[property]: 2.0").unwrap();
    let traverse = text.find("[traverse]: Infinity").unwrap();
    assert!(node_type < property && property < traverse);
    assert!(text.contains("1. TOTAL NUMBER OF RESULTS: 30"));
    assert_eq!(interceptor.active_windows(), 0);
}

#[test]
fn test_custom_registry() {
    let registry = IndexRegistry::from_descriptors(vec![
        IndexDescriptor::new("com.example.search.VectorIndex", "vector:", &["vector"]),
        IndexDescriptor::new("com.example.search.ScanIndex", "scan", &["scan"]),
    ]);
    let interceptor = Arc::new(LogInterceptor::default());
    let engine = HookedEngine {
        interceptor: Arc::clone(&interceptor),
        plan: "[doc] as [d] /* vector:embeddings(/index/embeddings) */".to_string(),
        costs: vec![("scan", "500.0"), ("vector", "2.25")],
        rows: 1,
    };
    let investigator = Investigator::new(engine)
        .with_registry(registry)
        .with_interceptor(interceptor);

    let report = investigator.investigate("SELECT * FROM [doc]").unwrap();
    assert_eq!(report.index_class, "com.example.search.VectorIndex");
    let costs: Vec<&str> = report.costs.iter().map(|c| c.cost.as_str()).collect();
    assert_eq!(costs, vec!["2.25", "500.0"]);
}
