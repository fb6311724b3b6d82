use std::collections::HashMap;
use std::sync::RwLock;

use millstock_adjustments::{NoteItem, NoteRef};
use millstock_core::{
    DomainError, DomainResult, InventoryLotId, LedgerEventId, MaterialId, ProcessId,
    PurchaseItemId, SaleItemId,
};
use millstock_ledger::{EventOrigin, InventoryLot, LedgerEvent, fifo_order};
use millstock_orders::{PurchaseItem, SaleItem};
use millstock_production::Process;

use super::r#trait::LedgerStore;

/// In-memory store. Intended for tests/dev; not optimized for performance.
///
/// Events live in one append-ordered vector so per-lot queries return
/// recorded order for free. A process-wide `RwLock` per table stands in for
/// the same-lot serialization a real backend must provide.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    lots: RwLock<HashMap<InventoryLotId, InventoryLot>>,
    events: RwLock<Vec<LedgerEvent>>,
    purchase_items: RwLock<HashMap<PurchaseItemId, PurchaseItem>>,
    sale_items: RwLock<HashMap<SaleItemId, SaleItem>>,
    processes: RwLock<HashMap<ProcessId, Process>>,
    notes: RwLock<HashMap<NoteRef, NoteItem>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(_: impl core::fmt::Debug) -> DomainError {
    DomainError::consistency("store lock poisoned")
}

impl LedgerStore for InMemoryStore {
    fn find_lot(&self, id: InventoryLotId) -> DomainResult<Option<InventoryLot>> {
        let lots = self.lots.read().map_err(poisoned)?;
        Ok(lots.get(&id).cloned())
    }

    fn find_active_lots(&self, material_id: MaterialId) -> DomainResult<Vec<InventoryLot>> {
        let lots = self.lots.read().map_err(poisoned)?;
        let mut result: Vec<InventoryLot> = lots
            .values()
            .filter(|lot| lot.material_id == material_id && lot.is_active && !lot.deleted)
            .cloned()
            .collect();
        fifo_order(&mut result);
        Ok(result)
    }

    fn lot_label_exists(&self, label: &str) -> DomainResult<bool> {
        let lots = self.lots.read().map_err(poisoned)?;
        Ok(lots.values().any(|lot| lot.lot_label == label))
    }

    fn save_lot(&self, lot: InventoryLot) -> DomainResult<()> {
        let mut lots = self.lots.write().map_err(poisoned)?;
        lots.insert(lot.id, lot);
        Ok(())
    }

    fn find_event(&self, id: LedgerEventId) -> DomainResult<Option<LedgerEvent>> {
        let events = self.events.read().map_err(poisoned)?;
        Ok(events.iter().find(|e| e.id == id).cloned())
    }

    fn find_events(
        &self,
        lot_id: InventoryLotId,
        include_reversed: bool,
    ) -> DomainResult<Vec<LedgerEvent>> {
        let events = self.events.read().map_err(poisoned)?;
        Ok(events
            .iter()
            .filter(|e| e.lot_id == lot_id && (include_reversed || e.is_active()))
            .cloned()
            .collect())
    }

    fn find_events_by_origin(&self, origin: EventOrigin) -> DomainResult<Vec<LedgerEvent>> {
        let events = self.events.read().map_err(poisoned)?;
        Ok(events
            .iter()
            .filter(|e| e.origin == origin && e.is_active())
            .cloned()
            .collect())
    }

    fn save_event(&self, event: LedgerEvent) -> DomainResult<()> {
        let mut events = self.events.write().map_err(poisoned)?;
        match events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => *existing = event,
            None => events.push(event),
        }
        Ok(())
    }

    fn find_purchase_item(&self, id: PurchaseItemId) -> DomainResult<Option<PurchaseItem>> {
        let items = self.purchase_items.read().map_err(poisoned)?;
        Ok(items.get(&id).cloned())
    }

    fn save_purchase_item(&self, item: PurchaseItem) -> DomainResult<()> {
        let mut items = self.purchase_items.write().map_err(poisoned)?;
        items.insert(item.id, item);
        Ok(())
    }

    fn find_sale_item(&self, id: SaleItemId) -> DomainResult<Option<SaleItem>> {
        let items = self.sale_items.read().map_err(poisoned)?;
        Ok(items.get(&id).cloned())
    }

    fn save_sale_item(&self, item: SaleItem) -> DomainResult<()> {
        let mut items = self.sale_items.write().map_err(poisoned)?;
        items.insert(item.id, item);
        Ok(())
    }

    fn find_process(&self, id: ProcessId) -> DomainResult<Option<Process>> {
        let processes = self.processes.read().map_err(poisoned)?;
        Ok(processes.get(&id).cloned())
    }

    fn save_process(&self, process: Process) -> DomainResult<()> {
        let mut processes = self.processes.write().map_err(poisoned)?;
        processes.insert(process.id, process);
        Ok(())
    }

    fn find_note(&self, id: NoteRef) -> DomainResult<Option<NoteItem>> {
        let notes = self.notes.read().map_err(poisoned)?;
        Ok(notes.get(&id).cloned())
    }

    fn save_note(&self, note: NoteItem) -> DomainResult<()> {
        let mut notes = self.notes.write().map_err(poisoned)?;
        notes.insert(note.id, note);
        Ok(())
    }
}
