//! Persistence boundary.

mod in_memory;
mod r#trait;

pub use in_memory::InMemoryStore;
pub use r#trait::{LedgerStore, StoreSnapshot};
