use millstock_core::{DomainResult, InventoryLotId, ProcessId, PurchaseItemId};
use millstock_ledger::LedgerEvent;
use millstock_orders::PurchaseItem;
use millstock_production::Process;

/// Read-only snapshot of the state cost resolution depends on.
///
/// Implementations must present a consistent view for the duration of one
/// resolution call: events appended concurrently may or may not be seen, but
/// the set returned for a given lot must not change mid-call. Resolution
/// never writes through this trait.
pub trait CostSource {
    /// Active baseline events for the lot, in recorded order. Reversed and
    /// non-baseline events are excluded.
    fn baseline_events(&self, lot_id: InventoryLotId) -> DomainResult<Vec<LedgerEvent>>;

    /// Purchase item lookup for purchase-origin cost derivation.
    fn purchase_item(&self, id: PurchaseItemId) -> DomainResult<PurchaseItem>;

    /// Process lookup for production-origin cost derivation.
    fn process(&self, id: ProcessId) -> DomainResult<Process>;
}
