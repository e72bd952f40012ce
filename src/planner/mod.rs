//! Query planner subsystem
//!
//! Turns a validated [`Filter`](crate::filter::Filter) into an immutable
//! [`QueryPlan`]: the structured predicate, the ordered sort keys with the
//! row-identifier tie-break, and any inbound cursor folded in.
//!
//! # Design Principles
//!
//! - Deterministic: same filter → same plan
//! - Bounded: every plan carries the result cap
//! - Path resolved once: find or search, never mixed mid-request
//! - Store-agnostic until rendered to documents at the edge

mod ast;
mod compiler;
mod cursor;
mod errors;
mod explain;
mod planner;
mod sort;

pub use ast::{Clause, Condition, FilterOp, Predicate, SortDirection, SortKey, SortSpec, RELEVANCE_KEY};
pub use compiler::{compile_predicate, fields};
pub use cursor::{
    after_row, clause_shape, cursor_clause, BeyondBranch, ClauseShape, CompoundCursor,
    NULL_LITERAL,
};
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult};
pub use explain::ExplainPlan;
pub use planner::{
    FindPlan, OutboundToken, QueryPlan, QueryPlanner, SearchPlan, DEFAULT_RESULT_CAP,
    DEFAULT_SEARCH_INDEX, PAGINATION_TOKEN_FIELD, SEARCH_PATHS,
};
pub use sort::{compile_sort, CompiledSort, SortPlacement};
