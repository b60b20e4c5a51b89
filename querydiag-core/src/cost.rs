//! Cost extraction from captured query-planning lines
//!
//! The planner logs one estimate per candidate index, in one of two shapes:
//!
//! ```text
//! cost for nodeType is 14.0
//! cost for [/oak:index/damAssetLucene] of type (lucene-property) with plan [
//!   ...plan detail, possibly spanning lines...
//! ] is 9357.00
//! ```
//!
//! Compound entries are matched within one captured message. The plan body is
//! matched greedily up to the last `] is <cost>`, so brackets nested inside
//! the plan detail do not cut it short.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::index::{IndexDescriptor, IndexRegistry};

const INFINITY_TOKEN: &str = "Infinity";

/// One index's cost estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCost {
    /// Index the estimate belongs to
    pub index: IndexDescriptor,

    /// Cost token exactly as logged, e.g. `1.0E7` or `Infinity`
    pub cost: String,

    /// Parsed cost used for ordering
    pub value: f64,
}

impl RankedCost {
    pub fn is_infinite(&self) -> bool {
        self.value.is_infinite()
    }

    /// Report line, e.g. `Query cost for '<class>' [<names>]: 14.0`
    pub fn render(&self) -> String {
        format!(
            "Query cost for '{}' [{}]: {}",
            self.index.class_identifier,
            self.index.short_names_display(),
            self.cost
        )
    }
}

/// A cost estimate pulled out of one captured message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostLine<'a> {
    pub short_name: &'a str,
    pub cost: &'a str,
}

fn compound_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)cost for \[[^\]]*\]\s+of type \(([^)\s]+)\)\s+with plan \[.*\]\s+is\s+(\S+)")
            .expect("compound cost pattern is valid")
    })
}

fn simple_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"cost for ([^\s\[]\S*)\s+is\s+(\S+)").expect("simple cost pattern is valid")
    })
}

/// Parse one captured message into its short name and cost token
pub fn parse_cost_line(line: &str) -> Option<CostLine<'_>> {
    let captures = compound_pattern()
        .captures(line)
        .or_else(|| simple_pattern().captures(line))?;

    Some(CostLine {
        short_name: captures.get(1)?.as_str(),
        cost: captures.get(2)?.as_str(),
    })
}

/// Parse a cost token; `Infinity` is positive infinity
pub fn parse_cost(token: &str) -> Option<f64> {
    match token {
        INFINITY_TOKEN => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => token.parse::<f64>().ok(),
    }
}

/// Builds the ranked cost table from captured lines
#[derive(Debug, Clone, Copy)]
pub struct CostExtractor<'a> {
    registry: &'a IndexRegistry,
}

impl<'a> CostExtractor<'a> {
    pub fn new(registry: &'a IndexRegistry) -> Self {
        Self { registry }
    }

    /// One entry per registered index that logged a cost, cheapest first
    ///
    /// Each index takes the first captured line naming it. Infinite costs sort
    /// last; equal costs keep registry order.
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Vec<RankedCost> {
        let parsed: Vec<CostLine<'_>> = lines
            .iter()
            .filter_map(|line| parse_cost_line(line.as_ref()))
            .collect();

        let mut ranked = Vec::new();
        for descriptor in self.registry.all() {
            let Some(line) = parsed
                .iter()
                .find(|l| descriptor.short_names.iter().any(|n| n == l.short_name))
            else {
                continue;
            };

            match parse_cost(line.cost) {
                Some(value) => ranked.push(RankedCost {
                    index: descriptor.clone(),
                    cost: line.cost.to_string(),
                    value,
                }),
                None => tracing::warn!(
                    index = %descriptor.class_identifier,
                    cost = line.cost,
                    "skipping unparseable index cost"
                ),
            }
        }

        ranked.sort_by(|a, b| a.value.total_cmp(&b.value));
        ranked
    }
}

/// Convenience wrapper around [`CostExtractor::extract`]
pub fn extract<S: AsRef<str>>(lines: &[S], registry: &IndexRegistry) -> Vec<RankedCost> {
    CostExtractor::new(registry).extract(lines)
}
