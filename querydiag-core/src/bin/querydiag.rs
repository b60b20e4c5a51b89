//! querydiag CLI - investigate a query against a recorded engine fixture
//!
//! Usage:
//!     querydiag --fixture fixtures/page-query.json "SELECT * FROM [cq:Page]"
//!     querydiag --fixture fixtures/page-query.json --json "SELECT * FROM [cq:Page]"
//!     RUST_LOG=querydiag_core=debug querydiag -v --fixture f.json --page-size 50 "..."

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use querydiag_core::{
    CaptureLayer, DiagnosticsError, FixtureEngine, InvestigationReport, Investigator,
    InvestigatorConfig, LogInterceptor,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[derive(Parser, Debug)]
#[command(name = "querydiag")]
#[command(about = "Classify, cost and time a repository query")]
#[command(version)]
struct Args {
    /// The query to investigate
    query: String,

    /// Engine fixture JSON (plan, cost log lines, rows)
    #[arg(short, long)]
    fixture: PathBuf,

    /// Investigator config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rows read in the first-page phase (overrides config)
    #[arg(long)]
    page_size: Option<usize>,

    /// Output the report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "querydiag_core=debug" } else { "querydiag_core=warn" };
    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => exit_with(&e, args.json),
    };

    // Level filtering applies to the stderr output only; the capture layer
    // must see the engine's debug events regardless.
    let interceptor = Arc::new(LogInterceptor::new(config.capture.clone()));
    tracing_subscriber::registry()
        .with(CaptureLayer::new(Arc::clone(&interceptor)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| default_filter.into()),
                ),
        )
        .init();

    let engine = match FixtureEngine::from_file(&args.fixture) {
        Ok(e) => e,
        Err(e) => exit_with(&e, args.json),
    };
    tracing::info!(fixture = %args.fixture.display(), "loaded engine fixture");

    let investigator = Investigator::new(engine)
        .with_interceptor(interceptor)
        .with_config(config);

    match investigator.investigate(&args.query) {
        Ok(report) => output(&report, args.json),
        Err(e) => exit_with(&e, args.json),
    }
}

fn load_config(args: &Args) -> Result<InvestigatorConfig, DiagnosticsError> {
    let mut config = match &args.config {
        Some(path) => InvestigatorConfig::from_file(path)?,
        None => InvestigatorConfig::default(),
    };
    if let Some(page_size) = args.page_size {
        config = config.with_page_size(page_size);
    }
    Ok(config)
}

fn output(report: &InvestigationReport, json: bool) {
    if !json {
        print!("{}", report);
        return;
    }
    match serde_json::to_string_pretty(report) {
        Ok(s) => println!("{}", s),
        Err(e) => exit_with(&DiagnosticsError::from(e), true),
    }
}

fn exit_with(err: &DiagnosticsError, json: bool) -> ! {
    if json {
        if let Ok(s) = serde_json::to_string_pretty(&err.to_error_response()) {
            eprintln!("{}", s);
        }
    } else {
        eprintln!("Error [{}]: {}", err.error_code(), err);
    }
    std::process::exit(1);
}
