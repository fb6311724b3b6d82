use millstock_adjustments::{NoteItem, NoteRef};
use millstock_core::{
    DomainError, DomainResult, InventoryLotId, LedgerEventId, MaterialId, ProcessId,
    PurchaseItemId, SaleItemId,
};
use millstock_costing::CostSource;
use millstock_ledger::{EventOrigin, InventoryLot, LedgerEvent};
use millstock_orders::{PurchaseItem, SaleItem};
use millstock_production::Process;

/// Storage operations this engine delegates to.
///
/// ## Concurrency contract
///
/// Inventory lots and their ledger events are the only mutable shared state.
/// Implementations backed by real storage must serialize concurrent writers
/// against the *same* lot (row-level locking or optimistic-concurrency
/// retry): the engine assumes "read current quantity, then append event" is
/// one atomic unit per lot and does not lock anything itself. Reads used for
/// cost resolution are lock-free and may be stale across calls, but must be
/// stable within one call (see [`CostSource`]).
///
/// `save_event` upserts by event id: inserting a new event and persisting a
/// reversal go through the same method. Events are otherwise immutable.
pub trait LedgerStore {
    fn find_lot(&self, id: InventoryLotId) -> DomainResult<Option<InventoryLot>>;

    /// Active (`is_active`, not deleted) lots of a material, oldest created
    /// first with the lot-label tie-break, ready for FIFO allocation.
    fn find_active_lots(&self, material_id: MaterialId) -> DomainResult<Vec<InventoryLot>>;

    fn lot_label_exists(&self, label: &str) -> DomainResult<bool>;

    fn save_lot(&self, lot: InventoryLot) -> DomainResult<()>;

    fn find_event(&self, id: LedgerEventId) -> DomainResult<Option<LedgerEvent>>;

    /// Events of one lot in recorded order; reversed events are excluded
    /// unless `include_reversed`.
    fn find_events(
        &self,
        lot_id: InventoryLotId,
        include_reversed: bool,
    ) -> DomainResult<Vec<LedgerEvent>>;

    /// Active events tagged with the given causal origin, across all lots.
    fn find_events_by_origin(&self, origin: EventOrigin) -> DomainResult<Vec<LedgerEvent>>;

    fn save_event(&self, event: LedgerEvent) -> DomainResult<()>;

    fn find_purchase_item(&self, id: PurchaseItemId) -> DomainResult<Option<PurchaseItem>>;
    fn save_purchase_item(&self, item: PurchaseItem) -> DomainResult<()>;

    fn find_sale_item(&self, id: SaleItemId) -> DomainResult<Option<SaleItem>>;
    fn save_sale_item(&self, item: SaleItem) -> DomainResult<()>;

    fn find_process(&self, id: ProcessId) -> DomainResult<Option<Process>>;
    fn save_process(&self, process: Process) -> DomainResult<()>;

    fn find_note(&self, id: NoteRef) -> DomainResult<Option<NoteItem>>;
    fn save_note(&self, note: NoteItem) -> DomainResult<()>;
}

/// Read-only view of a store for one cost-resolution call.
///
/// The resolver memoizes per call and never across calls, so the snapshot is
/// just a borrow; it exists to keep `CostSource` implementable without
/// handing the resolver write access.
pub struct StoreSnapshot<'a, S: LedgerStore>(pub &'a S);

impl<S: LedgerStore> CostSource for StoreSnapshot<'_, S> {
    fn baseline_events(&self, lot_id: InventoryLotId) -> DomainResult<Vec<LedgerEvent>> {
        let events = self.0.find_events(lot_id, false)?;
        Ok(events.into_iter().filter(|e| e.affects_baseline).collect())
    }

    fn purchase_item(&self, id: PurchaseItemId) -> DomainResult<PurchaseItem> {
        self.0
            .find_purchase_item(id)?
            .ok_or_else(|| DomainError::not_found(format!("purchase item {id}")))
    }

    fn process(&self, id: ProcessId) -> DomainResult<Process> {
        self.0
            .find_process(id)?
            .ok_or_else(|| DomainError::not_found(format!("process {id}")))
    }
}
