//! Engine layer: the storage seam and the service facade exposed to the rest
//! of the system.
//!
//! Domain crates stay pure; everything that reads or writes durable state
//! goes through [`store::LedgerStore`]. [`service::InventoryService`] wires
//! allocation, cost resolution, production and adjustments together, doing
//! all validation reads before any write so a raised error leaves no partial
//! events behind.

pub mod service;
pub mod store;


pub use service::{InventoryService, LotTarget};
pub use store::{InMemoryStore, LedgerStore, StoreSnapshot};
