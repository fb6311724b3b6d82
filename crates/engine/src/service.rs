use chrono::{DateTime, Utc};
use tracing::{debug, info};

use millstock_adjustments::{NoteItem, NoteOrigin, NoteRef, OriginItem, cascade_reversal, reconcile};
use millstock_core::{
    Currency, DomainError, DomainResult, InventoryLotId, LedgerEventId, MaterialId, ProcessId,
    PurchaseItemId, QTY_EPSILON, SaleItemId, WarehouseId,
};
use millstock_costing::{input_cost_map, resolve_cost_per_unit};
use millstock_ledger::{
    Allocation, EventOrigin, InventoryLot, LedgerEvent, LotAvailability, allocate,
};
use millstock_production::{Process, ProcessInput, ProcessOutput, propagate_costs};

use crate::store::{LedgerStore, StoreSnapshot};

/// Where a purchase fulfillment lands.
#[derive(Debug, Clone)]
pub enum LotTarget {
    /// Receive into an existing lot (material must match the item's).
    Existing(InventoryLotId),
    /// Create a fresh lot in the given warehouse.
    NewInWarehouse { warehouse_id: WarehouseId, unit: String },
}

/// Facade over the ledger, allocator, cost resolver, production propagator
/// and adjustment reconciler.
///
/// Every method runs its validation reads before its first write, so any
/// raised error leaves the store without partial events. Atomicity across
/// the writes of one method is the storage layer's transaction boundary;
/// this service documents the requirement rather than implementing it.
pub struct InventoryService<S: LedgerStore> {
    store: S,
}

impl<S: LedgerStore> InventoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn require_lot(&self, lot_id: InventoryLotId) -> DomainResult<InventoryLot> {
        match self.store.find_lot(lot_id)? {
            Some(lot) if !lot.deleted => Ok(lot),
            _ => Err(DomainError::not_found(format!("inventory lot {lot_id}"))),
        }
    }

    fn available_quantity(&self, lot: &InventoryLot) -> DomainResult<f64> {
        let events = self.store.find_events(lot.id, false)?;
        Ok(lot.current_quantity(&events))
    }

    /// FIFO dry-run/split: no events are appended here, so callers can probe
    /// availability and only commit once the split comes back complete.
    pub fn allocate(&self, material_id: MaterialId, quantity: f64) -> DomainResult<Vec<Allocation>> {
        let lots = self.store.find_active_lots(material_id)?;
        let mut candidates = Vec::with_capacity(lots.len());
        for lot in &lots {
            candidates.push(LotAvailability {
                lot_id: lot.id,
                available: self.available_quantity(lot)?,
            });
        }
        debug!(%material_id, quantity, candidates = candidates.len(), "fifo allocation");
        allocate(&candidates, quantity)
    }

    pub fn create_lot(
        &self,
        material_id: MaterialId,
        warehouse_id: WarehouseId,
        lot_label: Option<String>,
        unit: impl Into<String>,
        currency: Currency,
        at: DateTime<Utc>,
    ) -> DomainResult<InventoryLot> {
        let lot = InventoryLot::new(material_id, warehouse_id, lot_label, unit, currency, at);
        if self.store.lot_label_exists(&lot.lot_label)? {
            return Err(DomainError::validation(format!(
                "lot label '{}' already exists",
                lot.lot_label
            )));
        }
        info!(lot_id = %lot.id, label = %lot.lot_label, "lot created");
        self.store.save_lot(lot.clone())?;
        Ok(lot)
    }

    /// Receive a purchase item into inventory: create-or-reuse the target
    /// lot, then append the baseline purchase event.
    pub fn fulfill_purchase(
        &self,
        item_id: PurchaseItemId,
        target: LotTarget,
        at: DateTime<Utc>,
    ) -> DomainResult<LedgerEvent> {
        let item = self
            .store
            .find_purchase_item(item_id)?
            .ok_or_else(|| DomainError::not_found(format!("purchase item {item_id}")))?;

        let lot = match target {
            LotTarget::Existing(lot_id) => {
                let lot = self.require_lot(lot_id)?;
                if lot.material_id != item.material_id {
                    return Err(DomainError::validation(
                        "target lot holds a different material than the purchase item",
                    ));
                }
                if lot.currency != item.currency {
                    return Err(DomainError::validation(
                        "target lot is denominated in a different currency than the purchase item",
                    ));
                }
                lot
            }
            LotTarget::NewInWarehouse { warehouse_id, unit } => self.create_lot(
                item.material_id,
                warehouse_id,
                None,
                unit,
                item.currency.clone(),
                at,
            )?,
        };

        let event =
            LedgerEvent::baseline(lot.id, item.quantity, EventOrigin::Purchase(item.id), at)?;
        info!(lot_id = %lot.id, item_id = %item.id, quantity = item.quantity, "purchase fulfilled");
        self.store.save_event(event.clone())?;
        Ok(event)
    }

    /// Fulfill a sale: FIFO-split the requested quantity across the item's
    /// material, then append one consumption event per allocated lot. Fails
    /// whole (no events) on insufficient stock.
    pub fn fulfill_sale(
        &self,
        sale_item_id: SaleItemId,
        quantity: f64,
        at: DateTime<Utc>,
    ) -> DomainResult<Vec<LedgerEvent>> {
        let item = self
            .store
            .find_sale_item(sale_item_id)?
            .ok_or_else(|| DomainError::not_found(format!("sale item {sale_item_id}")))?;

        let split = self.allocate(item.material_id, quantity)?;

        let mut events = Vec::with_capacity(split.len());
        for allocation in &split {
            events.push(LedgerEvent::movement(
                allocation.lot_id,
                -allocation.quantity,
                EventOrigin::Sale(sale_item_id),
                at,
            )?);
        }
        info!(%sale_item_id, quantity, lots = split.len(), "sale fulfilled");
        for event in &events {
            self.store.save_event(event.clone())?;
        }
        Ok(events)
    }

    /// Append one consumption event against a specific lot.
    pub fn record_consumption(
        &self,
        lot_id: InventoryLotId,
        quantity: f64,
        origin: EventOrigin,
        at: DateTime<Utc>,
    ) -> DomainResult<LedgerEvent> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(DomainError::validation(
                "consumption quantity must be positive",
            ));
        }
        let lot = self.require_lot(lot_id)?;
        let available = self.available_quantity(&lot)?;
        if quantity > available + QTY_EPSILON {
            return Err(DomainError::insufficient_stock(quantity, available));
        }

        let event = LedgerEvent::movement(lot_id, -quantity, origin, at)?;
        info!(%lot_id, quantity, "consumption recorded");
        self.store.save_event(event.clone())?;
        Ok(event)
    }

    /// Record a manual signed correction against a lot, e.g. a stock-take.
    /// No origin item backs the event, so the cost and currency are stated
    /// explicitly and must match the lot's currency.
    pub fn record_manual_movement(
        &self,
        lot_id: InventoryLotId,
        quantity: f64,
        cost_per_unit: f64,
        currency: Currency,
        at: DateTime<Utc>,
    ) -> DomainResult<LedgerEvent> {
        let lot = self.require_lot(lot_id)?;
        if currency != lot.currency {
            return Err(DomainError::validation(format!(
                "manual movement currency {currency} does not match lot currency {}",
                lot.currency
            )));
        }
        if quantity < 0.0 {
            let available = self.available_quantity(&lot)?;
            if -quantity > available + QTY_EPSILON {
                return Err(DomainError::insufficient_stock(-quantity, available));
            }
        }

        let event = LedgerEvent::movement_manual(lot_id, quantity, cost_per_unit, currency, at)?;
        info!(%lot_id, quantity, "manual movement recorded");
        self.store.save_event(event.clone())?;
        Ok(event)
    }

    /// Run a production process: validate the definition, consume the input
    /// lots, produce the output lots, and persist the process with its
    /// propagated costs.
    pub fn record_production(
        &self,
        kind: impl Into<String>,
        inputs: Vec<ProcessInput>,
        outputs: Vec<ProcessOutput>,
        output_warehouse_id: WarehouseId,
        at: DateTime<Utc>,
    ) -> DomainResult<Process> {
        let process = Process::new(kind, inputs, outputs, output_warehouse_id, at)?;

        // Validation reads: every referenced lot must exist and every input
        // must be coverable, before anything is written.
        for input in process.inputs() {
            let lot = self.require_lot(input.lot_id)?;
            let available = self.available_quantity(&lot)?;
            if input.quantity > available + QTY_EPSILON {
                return Err(DomainError::insufficient_stock(input.quantity, available));
            }
        }
        for output in process.outputs() {
            let lot = self.require_lot(output.lot_id)?;
            if lot.material_id != output.material_id {
                return Err(DomainError::validation(format!(
                    "output lot {} holds a different material than the output declares",
                    lot.id
                )));
            }
        }

        let snapshot = StoreSnapshot(&self.store);
        let costs = input_cost_map(&snapshot, &process)?;
        let process = propagate_costs(&process, &costs)?;

        info!(process_id = %process.id, inputs = process.inputs().len(),
              outputs = process.outputs().len(), "production recorded");

        self.store.save_process(process.clone())?;
        for input in process.inputs() {
            let event = LedgerEvent::movement(
                input.lot_id,
                -input.quantity,
                EventOrigin::Process(process.id),
                at,
            )?;
            self.store.save_event(event)?;
        }
        for output in process.outputs() {
            if output.quantity > QTY_EPSILON {
                let event = LedgerEvent::baseline(
                    output.lot_id,
                    output.quantity,
                    EventOrigin::Process(process.id),
                    at,
                )?;
                self.store.save_event(event)?;
            }
        }
        Ok(process)
    }

    /// Append one more input to an existing process, redistributing its
    /// usage across the outputs and re-propagating output costs.
    pub fn add_process_input(
        &self,
        process_id: ProcessId,
        lot_id: InventoryLotId,
        quantity: f64,
        at: DateTime<Utc>,
    ) -> DomainResult<Process> {
        let mut process = self
            .store
            .find_process(process_id)?
            .ok_or_else(|| DomainError::not_found(format!("process {process_id}")))?;

        let lot = self.require_lot(lot_id)?;
        let available = self.available_quantity(&lot)?;
        if quantity > available + QTY_EPSILON {
            return Err(DomainError::insufficient_stock(quantity, available));
        }

        process.add_input(lot_id, quantity)?;

        let snapshot = StoreSnapshot(&self.store);
        let costs = input_cost_map(&snapshot, &process)?;
        let process = propagate_costs(&process, &costs)?;

        let event =
            LedgerEvent::movement(lot_id, -quantity, EventOrigin::Process(process_id), at)?;
        info!(%process_id, %lot_id, quantity, "process input added");
        self.store.save_process(process.clone())?;
        self.store.save_event(event)?;
        Ok(process)
    }

    pub fn get_current_quantity(&self, lot_id: InventoryLotId) -> DomainResult<f64> {
        let lot = self.require_lot(lot_id)?;
        self.available_quantity(&lot)
    }

    pub fn get_original_quantity(&self, lot_id: InventoryLotId) -> DomainResult<f64> {
        let lot = self.require_lot(lot_id)?;
        let events = self.store.find_events(lot_id, false)?;
        Ok(lot.original_quantity(&events))
    }

    pub fn get_cost_per_unit(&self, lot_id: InventoryLotId) -> DomainResult<f64> {
        self.require_lot(lot_id)?;
        resolve_cost_per_unit(&StoreSnapshot(&self.store), lot_id)
    }

    /// Soft delete: the event flips to `Reversed` and derived quantities
    /// recompute on the next read. Idempotent — reversing twice equals
    /// reversing once.
    pub fn reverse_event(&self, event_id: LedgerEventId) -> DomainResult<()> {
        let mut event = self
            .store
            .find_event(event_id)?
            .ok_or_else(|| DomainError::not_found(format!("ledger event {event_id}")))?;
        if !event.is_active() {
            return Ok(());
        }
        event.reverse();
        info!(%event_id, "ledger event reversed");
        self.store.save_event(event)
    }

    /// Post a debit/credit-note correction: validates against the origin
    /// item, appends the non-baseline event against the lot the origin's
    /// original event targeted, and folds the monetary correction into the
    /// item's adjusted totals.
    pub fn apply_adjustment(&self, note: &NoteItem, at: DateTime<Utc>) -> DomainResult<LedgerEvent> {
        let (event, lot) = match note.origin {
            NoteOrigin::Purchase(item_id) => {
                let item = self
                    .store
                    .find_purchase_item(item_id)?
                    .ok_or_else(|| DomainError::not_found(format!("purchase item {item_id}")))?;
                let lot = self.origin_lot(EventOrigin::Purchase(item_id), true)?;
                let event = reconcile(note, &OriginItem::Purchase(&item), &lot, at)?;

                let mut item = item;
                item.amount_adjustment += self.signed_amount(note);
                item.quantity_adjustment += note.quantity_delta;
                self.store.save_purchase_item(item)?;
                (event, lot)
            }
            NoteOrigin::Sale(item_id) => {
                let item = self
                    .store
                    .find_sale_item(item_id)?
                    .ok_or_else(|| DomainError::not_found(format!("sale item {item_id}")))?;
                let lot = self.origin_lot(EventOrigin::Sale(item_id), false)?;
                let event = reconcile(note, &OriginItem::Sale(&item), &lot, at)?;

                let mut item = item;
                item.amount_adjustment += self.signed_amount(note);
                item.quantity_adjustment += note.quantity_delta;
                self.store.save_sale_item(item)?;
                (event, lot)
            }
            NoteOrigin::Process(process_id) => {
                let process = self
                    .store
                    .find_process(process_id)?
                    .ok_or_else(|| DomainError::not_found(format!("process {process_id}")))?;
                let lot = self.origin_lot(EventOrigin::Process(process_id), true)?;
                let event = reconcile(note, &OriginItem::Process(&process), &lot, at)?;
                (event, lot)
            }
        };

        info!(lot_id = %lot.id, delta = note.quantity_delta, "adjustment applied");
        self.store.save_note(note.clone())?;
        self.store.save_event(event.clone())?;
        Ok(event)
    }

    /// Note deletion cascade: soft-reverse the note's correction events and
    /// roll its monetary correction back out of the origin item.
    pub fn delete_note(&self, note_ref: NoteRef) -> DomainResult<usize> {
        let note = self
            .store
            .find_note(note_ref)?
            .ok_or_else(|| DomainError::not_found("note item"))?;

        let note_event_origin = match note_ref {
            NoteRef::Debit(id) => EventOrigin::DebitNote(id),
            NoteRef::Credit(id) => EventOrigin::CreditNote(id),
        };
        let mut events = self.store.find_events_by_origin(note_event_origin)?;
        let Some(first) = events.first() else {
            return Ok(0);
        };

        let lot = self
            .store
            .find_lot(first.lot_id)?
            .ok_or_else(|| DomainError::not_found(format!("inventory lot {}", first.lot_id)))?;

        let reversed = cascade_reversal(&note, &lot, &mut events)?;

        match note.origin {
            NoteOrigin::Purchase(item_id) => {
                if let Some(mut item) = self.store.find_purchase_item(item_id)? {
                    item.amount_adjustment -= self.signed_amount(&note);
                    item.quantity_adjustment -= note.quantity_delta;
                    self.store.save_purchase_item(item)?;
                }
            }
            NoteOrigin::Sale(item_id) => {
                if let Some(mut item) = self.store.find_sale_item(item_id)? {
                    item.amount_adjustment -= self.signed_amount(&note);
                    item.quantity_adjustment -= note.quantity_delta;
                    self.store.save_sale_item(item)?;
                }
            }
            NoteOrigin::Process(_) => {}
        }

        info!(lot_id = %lot.id, reversed, "note deleted, events reversed");
        for event in events {
            self.store.save_event(event)?;
        }
        Ok(reversed)
    }

    /// Soft-delete a lot. Subsequent appends and adjustments against it
    /// fail with `NotFound`.
    pub fn delete_lot(&self, lot_id: InventoryLotId) -> DomainResult<()> {
        let mut lot = self.require_lot(lot_id)?;
        lot.deleted = true;
        lot.is_active = false;
        info!(%lot_id, "lot deleted");
        self.store.save_lot(lot)
    }

    /// The lot targeted by the origin item's original event.
    fn origin_lot(
        &self,
        origin: EventOrigin,
        baseline_only: bool,
    ) -> DomainResult<InventoryLot> {
        let events = self.store.find_events_by_origin(origin)?;
        let event = events
            .iter()
            .find(|e| !baseline_only || e.affects_baseline)
            .ok_or_else(|| {
                DomainError::not_found("no ledger event recorded for the origin item")
            })?;
        self.require_lot(event.lot_id)
    }

    /// Debit notes raise the origin item's total; credit notes lower it.
    fn signed_amount(&self, note: &NoteItem) -> f64 {
        match note.id {
            NoteRef::Debit(_) => note.amount,
            NoteRef::Credit(_) => -note.amount,
        }
    }
}
