//! Explain plan output
//!
//! Produces deterministic, human-readable explain output, and a JSON form
//! for the `explain` command.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::errors::PlannerError;
use super::planner::QueryPlan;

/// Explain plan output
#[derive(Debug, Clone, Serialize)]
pub struct ExplainPlan {
    /// Whether planning succeeded
    pub accepted: bool,
    /// `find` or `search`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// One line per predicate clause
    pub predicates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Continuation token shape attached to the last row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_shape: Option<String>,
    /// The rendered store request (find filter+sort, or pipeline)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a successful query plan
    pub fn from_plan(plan: &QueryPlan) -> Self {
        let (predicates, sort, request) = match plan {
            QueryPlan::Find(find) => (
                find.predicate.describe(),
                Some(find.sort.describe()),
                serde_json::json!({
                    "filter": find.filter_document(),
                    "sort": find.sort_document(),
                    "limit": find.limit,
                }),
            ),
            QueryPlan::Search(search) => {
                let sort = search
                    .post_sort
                    .as_ref()
                    .or(search.stage_sort.as_ref())
                    .map(|s| s.describe());
                let mut predicates = vec![format!("text \"{}\"", search.query)];
                predicates.extend(search.predicate.describe());
                (
                    predicates,
                    sort,
                    Value::Array(search.to_pipeline()),
                )
            }
        };

        Self {
            accepted: true,
            path: Some(plan.path_name().to_string()),
            predicates,
            sort,
            limit: Some(plan.limit()),
            token_shape: Some(plan.outbound().as_str().to_string()),
            request: Some(request),
            rejection_reason: None,
            rejection_code: None,
        }
    }

    /// Creates an explain plan from a planning error
    pub fn from_error(err: &PlannerError) -> Self {
        Self {
            accepted: false,
            path: None,
            predicates: Vec::new(),
            sort: None,
            limit: None,
            token_shape: None,
            request: None,
            rejection_reason: Some(err.message().to_string()),
            rejection_code: Some(err.code().code().to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if self.accepted {
            writeln!(f, "Status: ACCEPTED")?;
            if let Some(path) = &self.path {
                writeln!(f, "Path: {}", path)?;
            }
            if !self.predicates.is_empty() {
                writeln!(f, "Predicates:")?;
                for pred in &self.predicates {
                    writeln!(f, "  - {}", pred)?;
                }
            }
            if let Some(sort) = &self.sort {
                writeln!(f, "Sort: {}", sort)?;
            }
            if let Some(limit) = self.limit {
                writeln!(f, "Limit: {}", limit)?;
            }
            if let Some(shape) = &self.token_shape {
                writeln!(f, "Token: {}", shape)?;
            }
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }

        Ok(())
    }
}
