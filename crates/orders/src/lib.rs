//! Boundary representations of purchase and customer-order items.
//!
//! These entities live outside this subsystem; only the slice that feeds cost
//! resolution and adjustment bounds checking is modelled here: the recorded
//! quantity/price plus the net note corrections accumulated against them.

pub mod item;

pub use item::{PurchaseItem, SaleItem};
