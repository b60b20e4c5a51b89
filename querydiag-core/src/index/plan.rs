//! Explain-plan classification
//!
//! A plan looks like `[cq:Page] as [a] /* nodeType Filter(...) */`: the query
//! shape, the `/* ` marker, then the annotation naming the index that will
//! serve the query.

use crate::error::{DiagnosticsError, Result};

use super::{IndexDescriptor, IndexRegistry};

/// Separates the query shape from the index annotation
pub const PLAN_MARKER: &str = "/* ";

const COMMENT_END: &str = "*/";

/// Classifies explain-plan text against an [`IndexRegistry`]
#[derive(Debug, Clone, Copy)]
pub struct PlanParser<'a> {
    registry: &'a IndexRegistry,
}

impl<'a> PlanParser<'a> {
    pub fn new(registry: &'a IndexRegistry) -> Self {
        Self { registry }
    }

    /// Extract the trimmed index annotation following the plan marker
    pub fn extract_identifier(raw_plan: &str) -> Result<&str> {
        if raw_plan.is_empty() {
            return Err(DiagnosticsError::InvalidPlanFormat {
                reason: "plan text is empty".to_string(),
            });
        }

        let start = raw_plan
            .find(PLAN_MARKER)
            .ok_or_else(|| DiagnosticsError::InvalidPlanFormat {
                reason: format!("no '{}' marker in plan '{}'", PLAN_MARKER.trim(), raw_plan),
            })?;

        let rest = &raw_plan[start + PLAN_MARKER.len()..];
        let line = rest.lines().next().unwrap_or("");
        let line = line.trim_end();
        let identifier = line.strip_suffix(COMMENT_END).unwrap_or(line).trim();

        if identifier.is_empty() {
            return Err(DiagnosticsError::InvalidPlanFormat {
                reason: format!("empty index annotation in plan '{}'", raw_plan),
            });
        }

        Ok(identifier)
    }

    /// Resolve the descriptor of the index serving `raw_plan`
    ///
    /// When several plan prefixes match, the longest one wins; equal lengths
    /// resolve to the earliest registered descriptor.
    pub fn classify(&self, raw_plan: &str) -> Result<&'a IndexDescriptor> {
        let identifier = Self::extract_identifier(raw_plan)?;

        let mut selected: Option<&'a IndexDescriptor> = None;
        for descriptor in self.registry.all() {
            if !descriptor.matches_plan(identifier) {
                continue;
            }
            let longer = selected
                .map(|s| descriptor.plan_prefix.len() > s.plan_prefix.len())
                .unwrap_or(true);
            if longer {
                selected = Some(descriptor);
            }
        }

        selected.ok_or_else(|| DiagnosticsError::UnknownIndexType {
            identifier: identifier.to_string(),
        })
    }
}
