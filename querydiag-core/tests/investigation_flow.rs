//! End-to-end investigations through the tracing capture path.

use std::sync::Arc;

use querydiag_core::{
    CaptureLayer, DiagnosticsError, EngineFixture, FixtureEngine, InvestigationReport, Investigator,
    LogInterceptor, QueryPhase,
};
use tracing_subscriber::layer::SubscriberExt;

const PAGE_QUERY: &str =
    "SELECT * FROM [cq:Page] AS a WHERE ISDESCENDANTNODE(a, '/content/site')";

fn page_fixture() -> FixtureEngine {
    FixtureEngine::from_json(include_str!("../fixtures/page-query.json"))
        .expect("Failed to parse page-query.json")
}

/// Run `investigator` with a subscriber that routes events into its interceptor
fn investigate_captured(
    investigator: &Investigator<FixtureEngine>,
    query: &str,
) -> Result<InvestigationReport, DiagnosticsError> {
    let subscriber = tracing_subscriber::registry()
        .with(CaptureLayer::new(Arc::clone(investigator.interceptor())));
    tracing::subscriber::with_default(subscriber, || investigator.investigate(query))
}

fn isolated(engine: FixtureEngine) -> Investigator<FixtureEngine> {
    Investigator::new(engine).with_interceptor(Arc::new(LogInterceptor::default()))
}

#[test]
fn test_report_sections_in_order() {
    let investigator = isolated(page_fixture());
    let report = investigate_captured(&investigator, PAGE_QUERY).expect("investigation failed");
    let text = report.render();

    let sections = [
        "QUERY:",
        "QUERY PLAN:",
        "INDEX CLASS IN QUERY PLAN:",
        "QUERY COST PER INDEX:",
        "QUERY PERFORMANCE RESULT:",
    ];
    let mut last = 0;
    for section in sections {
        let at = text[last..]
            .find(section)
            .map(|i| i + last)
            .unwrap_or_else(|| panic!("missing section {} in:\n{}", section, text));
        last = at + section.len();
    }

    assert!(text.starts_with(&format!("QUERY: {}\n", PAGE_QUERY)));
    assert!(text.contains(
        "INDEX CLASS IN QUERY PLAN: org.apache.jackrabbit.oak.plugins.index.nodetype.NodeTypeIndex"
    ));

    // Five cost lines, cheapest first, infinities last
    let lines: Vec<&str> = text.lines().collect();
    let header = lines.iter().position(|l| *l == "QUERY COST PER INDEX:").unwrap();
    let cost_lines = &lines[header + 1..header + 6];
    let expected_suffixes = [
        "[nodeType]: 14.0",
        "[lucene-property]: 9357.00",
        "[property]: 1.0E7",
        "[traverse]: Infinity",
        "[reference]: Infinity",
    ];
    for (line, suffix) in cost_lines.iter().zip(expected_suffixes) {
        assert!(line.starts_with("Query cost for '"), "bad cost line {}", line);
        assert!(line.ends_with(suffix), "expected {} to end with {}", line, suffix);
    }
    assert_eq!(lines[header + 6], "");

    // Performance block: count then five numbered timings
    let perf = lines.iter().position(|l| *l == "QUERY PERFORMANCE RESULT:").unwrap();
    assert_eq!(lines[perf + 1], "1. TOTAL NUMBER OF RESULTS: 1");
    for (offset, number) in (2..=6).enumerate() {
        let line = lines[perf + 2 + offset];
        assert!(line.starts_with(&format!("{}. ", number)), "bad timing line {}", line);
        assert!(line.contains(" ms ("), "timing line lacks annotation: {}", line);
    }
    assert_eq!(lines.len(), perf + 7);
}

#[test]
fn test_capture_window_closed_after_success() {
    let investigator = isolated(page_fixture());
    let report = investigate_captured(&investigator, PAGE_QUERY).unwrap();

    assert_eq!(report.costs.len(), 5);
    assert_eq!(investigator.interceptor().active_windows(), 0);
    assert!(investigator
        .interceptor()
        .saved_logs(&report.correlation_id)
        .is_empty());
}

#[test]
fn test_capture_window_closed_after_engine_failure() {
    let engine = FixtureEngine::new(
        EngineFixture::new("[cq:Page] as [a] /* nodeType */")
            .with_cost_logs(&["cost for nodeType is 14.0"])
            .with_failure(QueryPhase::Execute, "repository session closed"),
    );
    let investigator = isolated(engine);

    let err = investigate_captured(&investigator, PAGE_QUERY).unwrap_err();
    assert_eq!(err.phase(), Some(QueryPhase::Execute));
    assert_eq!(err.error_code(), "QUERY_EXECUTION_FAILURE");
    assert!(err.to_string().contains("repository session closed"));

    // The cost line was captured before the failure and must be gone now
    assert_eq!(investigator.interceptor().active_windows(), 0);
}

#[test]
fn test_iteration_failure_propagates() {
    let mut fixture = EngineFixture::new("[nt:base] as [a] /* traverse \"/content//*\" */")
        .with_rows(&["/a", "/b"])
        .with_cost_logs(&["cost for traverse is Infinity"]);
    fixture.failure = Some(querydiag_core::engine::FixtureFailure {
        phase: QueryPhase::Iterate,
        message: "node vanished".to_string(),
        after_rows: 1,
    });
    let investigator = isolated(FixtureEngine::new(fixture));

    let err = investigate_captured(&investigator, "SELECT * FROM [nt:base]").unwrap_err();
    assert_eq!(err.phase(), Some(QueryPhase::Iterate));
    assert_eq!(investigator.interceptor().active_windows(), 0);
}

#[test]
fn test_invalid_plan_is_reported() {
    let investigator = isolated(FixtureEngine::new(EngineFixture::new("")));
    let err = investigate_captured(&investigator, PAGE_QUERY).unwrap_err();
    assert!(matches!(err, DiagnosticsError::InvalidPlanFormat { .. }));
}

#[test]
fn test_explain_failure_is_reported() {
    let investigator = isolated(FixtureEngine::new(
        EngineFixture::new("unused").with_failure(QueryPhase::Explain, "repository unavailable"),
    ));
    let err = investigate_captured(&investigator, PAGE_QUERY).unwrap_err();
    assert_eq!(err.phase(), Some(QueryPhase::Explain));
}

#[test]
fn test_large_result_set_pages() {
    let rows: Vec<String> = (0..45).map(|i| format!("/content/site/page-{}", i)).collect();
    let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let investigator = isolated(FixtureEngine::new(
        EngineFixture::new("[cq:Page] as [a] /* nodeType */").with_rows(&row_refs),
    ));

    let report = investigate_captured(&investigator, "SELECT * FROM [cq:Page]").unwrap();
    assert_eq!(report.result_count, 45);
    assert_eq!(report.page_size, 20);
    assert!(report.costs.is_empty());
    assert!(report.render().contains("4. READ FIRST PAGE TIME: "));
}

#[test]
fn test_concurrent_investigations_are_isolated() {
    let interceptor = Arc::new(LogInterceptor::default());

    let handles: Vec<_> = [("14.0", "Infinity"), ("3.5", "120.0")]
        .into_iter()
        .map(|(node_type, traverse)| {
            let interceptor = Arc::clone(&interceptor);
            std::thread::spawn(move || {
                let node_line = format!("cost for nodeType is {}", node_type);
                let traverse_line = format!("cost for traverse is {}", traverse);
                let engine = FixtureEngine::new(
                    EngineFixture::new("[cq:Page] as [a] /* nodeType */")
                        .with_cost_logs(&[&node_line, &traverse_line])
                        .with_rows(&["/content/a"])
                        .with_worker_logging(),
                );
                let investigator = Investigator::new(engine).with_interceptor(interceptor);
                let report = investigate_captured(&investigator, "SELECT * FROM [cq:Page]").unwrap();
                (node_type, report)
            })
        })
        .collect();

    for handle in handles {
        let (node_type, report) = handle.join().unwrap();
        assert_eq!(report.costs.len(), 2);
        let node = report
            .costs
            .iter()
            .find(|c| c.index.short_names == vec!["nodeType".to_string()])
            .unwrap();
        assert_eq!(node.cost, node_type);
    }

    assert_eq!(interceptor.active_windows(), 0);
}
