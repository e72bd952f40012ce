//! Filter Model subsystem
//!
//! Parses raw request parameters into a validated [`Filter`], rejecting
//! malformed input before any query is built.
//!
//! # Rules
//!
//! - Numeric params sanitize to a number inside a closed range
//! - Enum params match a closed vocabulary, single value or array
//! - Boolean flags are presence-triggered (tri-state: set or not filtered)
//! - Without a free-text query, a continuation token must name a row id

mod errors;
mod filter;
mod params;

pub use errors::{ValidationError, ValidationResult};
pub use filter::{Filter, CALORIES_RANGE, RATING_RANGE};
pub use params::RawParams;
