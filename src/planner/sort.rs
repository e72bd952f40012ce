//! Sort compiler
//!
//! Builds the ordered sort keys for a request and decides where they are
//! evaluated. The row-identifier tie-break (ascending) is always last, so
//! every order is total and every cursor resumable.

use crate::filter::Filter;
use crate::model::SortField;

use super::ast::{SortDirection, SortSpec};
use super::compiler::fields;

/// Where a compiled sort is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortPlacement {
    /// Sort argument of a plain find
    Find,
    /// Folded into the search stage itself
    SearchStage,
    /// Explicit sort stage after search (materialized field)
    PostSearch,
}

/// Sort keys plus where they run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSort {
    pub spec: SortSpec,
    pub placement: SortPlacement,
}

/// Compiles the sort for a filter
pub fn compile_sort(filter: &Filter) -> CompiledSort {
    let direction = SortDirection::from_ascending(filter.is_ascending());

    let (spec, placement) = match (filter.sort, filter.has_query()) {
        (None, false) => (SortSpec::new(), SortPlacement::Find),
        (None, true) => (SortSpec::new().relevance(), SortPlacement::SearchStage),
        (Some(field), false) => (
            SortSpec::new().field(field.stored_path(), direction),
            SortPlacement::Find,
        ),
        // Read out of an array position: materialize, then sort outside the
        // search stage. Relevance is dropped here.
        (Some(SortField::Calories), true) => (
            SortSpec::new().field(SortField::Calories.search_path(), direction),
            SortPlacement::PostSearch,
        ),
        (Some(field), true) => (
            SortSpec::new().field(field.search_path(), direction).relevance(),
            SortPlacement::SearchStage,
        ),
    };

    CompiledSort {
        spec: spec.asc(fields::ROW_ID),
        placement,
    }
}
