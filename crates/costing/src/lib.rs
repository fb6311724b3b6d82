//! Cost resolution over the inventory ledger and the production graph.
//!
//! The resolver is a pure, re-entrant function over an immutable snapshot of
//! ledger state (the [`CostSource`] trait). The source system traversed live
//! ORM relationships during this recursion; here the graph is walked by id
//! with an explicit visited set, which makes cycle detection trivial.

pub mod resolver;
pub mod source;

pub use resolver::{CostResolver, input_cost_map, resolve_cost_per_unit};
pub use source::CostSource;
