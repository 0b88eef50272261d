//! Query constraint engine
//!
//! Value-object filter and sort rules over JSON records, immutable
//! constraint sets, and the Query pipeline that composes them.
//!
//! # Evaluation order (fixed)
//!
//! 1. Filter (conjunction of rules, order-insignificant)
//! 2. Sort (stable, lexicographic tie-break in rule order)
//! 3. Limit
//!
//! # Invariants
//!
//! - Every value type here is immutable after construction; `with`,
//!   `without`, `filter`, `sort`, `max` return new instances and share
//!   storage when nothing changed.
//! - The comparator is a total order, so sorting and cursor derivation
//!   are deterministic.
//! - Malformed compact keys are parse errors, never coerced.

mod compare;
mod errors;
mod filter;
mod filters;
mod key;
mod params;
mod path;
mod query;
mod sort;
mod sorts;

pub use compare::{compare, compare_desc};
pub use errors::{QueryError, QueryResult};
pub use filter::Filter;
pub use filters::Filters;
pub use key::{Direction, FilterOp};
pub use path::{FieldPath, PathSegment};
pub use query::Query;
pub use sort::Sort;
pub use sorts::Sorts;
