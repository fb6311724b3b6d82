//! Production process module.
//!
//! A process consumes input lots and produces output lots, with an explicit
//! input-to-output usage mapping. The aggregate is validated on construction
//! (the source system kept this as a free-form JSON document and re-checked
//! it on every read); cost propagation is a pure function over a resolved
//! input cost map.

pub mod process;
pub mod propagate;

pub use process::{BALANCE_EPSILON, InputUsage, Process, ProcessInput, ProcessOutput};
pub use propagate::propagate_costs;
