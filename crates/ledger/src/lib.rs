//! Inventory ledger module.
//!
//! Physical stock is tracked as an append-only event ledger: each lot's
//! quantities are derived by folding its non-reversed events, never stored as
//! mutable counters. Pure domain logic only: no IO, no HTTP, no persistence
//! concerns.

pub mod allocate;
pub mod event;
pub mod lot;

pub use allocate::{Allocation, LotAvailability, allocate, fifo_order};
pub use event::{EventOrigin, EventStatus, LedgerEvent};
pub use lot::InventoryLot;
