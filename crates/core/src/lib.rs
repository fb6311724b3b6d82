//! `millstock-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the currency value object, and the error
//! taxonomy shared by every ledger/costing crate.

pub mod currency;
pub mod error;
pub mod id;

/// Tolerance for quantity/cost comparisons.
///
/// Quantities and costs are `f64`; conservation checks and "is this lot
/// drained" tests compare against this rather than exact zero.
pub const QTY_EPSILON: f64 = 1e-9;

pub use currency::Currency;
pub use error::{DomainError, DomainResult};
pub use id::{
    CreditNoteId, DebitNoteId, InventoryLotId, LedgerEventId, MaterialId, ProcessId,
    PurchaseItemId, SaleItemId, WarehouseId,
};
