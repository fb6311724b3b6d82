use chrono::{DateTime, Utc};

use millstock_core::{Currency, DomainError, DomainResult};
use millstock_ledger::{EventOrigin, InventoryLot, LedgerEvent};
use millstock_orders::{PurchaseItem, SaleItem};
use millstock_production::{BALANCE_EPSILON, Process};

use crate::note::{NoteItem, NoteRef};

/// The already-loaded origin item a note corrects.
pub enum OriginItem<'a> {
    Purchase(&'a PurchaseItem),
    Sale(&'a SaleItem),
    Process(&'a Process),
}

impl OriginItem<'_> {
    /// Remaining monetary bound an adjustment must stay within: the origin's
    /// recorded total net of corrections already applied, so successive notes
    /// cannot cumulatively overdraw it. For a process origin the bound is the
    /// propagated cost of the output lot being corrected.
    fn adjustment_bound(&self, lot: &InventoryLot) -> DomainResult<f64> {
        match self {
            OriginItem::Purchase(item) => Ok(item.adjusted_total()),
            OriginItem::Sale(item) => Ok(item.adjusted_total()),
            OriginItem::Process(process) => process
                .output_for_lot(lot.id)
                .map(|o| o.total_cost)
                .ok_or_else(|| {
                    DomainError::consistency(format!(
                        "process {} has no output for lot {}",
                        process.id, lot.id
                    ))
                }),
        }
    }

    /// Currency the origin is denominated in. Processes carry no currency of
    /// their own; their costs are denominated in the output lot's currency.
    fn currency<'a>(&'a self, lot: &'a InventoryLot) -> &'a Currency {
        match self {
            OriginItem::Purchase(item) => &item.currency,
            OriginItem::Sale(item) => &item.currency,
            OriginItem::Process(_) => &lot.currency,
        }
    }
}

/// Apply one note-driven correction: validate against the origin item, then
/// build the non-baseline ledger event carrying the signed quantity delta.
///
/// Nothing is persisted here; the caller saves the returned event inside its
/// transaction. The original event the note corrects is never touched.
pub fn reconcile(
    note: &NoteItem,
    origin: &OriginItem<'_>,
    lot: &InventoryLot,
    recorded_at: DateTime<Utc>,
) -> DomainResult<LedgerEvent> {
    if lot.deleted {
        return Err(DomainError::not_found(format!(
            "inventory lot {} is deleted",
            lot.id
        )));
    }

    let expected = origin.currency(lot);
    if &note.currency != expected {
        return Err(DomainError::consistency(format!(
            "note currency {} does not match origin currency {expected}",
            note.currency
        )));
    }

    let bound = origin.adjustment_bound(lot)?;
    if note.amount > bound + BALANCE_EPSILON {
        return Err(DomainError::consistency(format!(
            "note amount {} exceeds origin adjusted total {bound}",
            note.amount
        )));
    }

    let event_origin = match note.id {
        NoteRef::Debit(id) => EventOrigin::DebitNote(id),
        NoteRef::Credit(id) => EventOrigin::CreditNote(id),
    };
    LedgerEvent::movement(lot.id, note.quantity_delta, event_origin, recorded_at)
}

/// Note deletion cascade: soft-reverse every active event the note produced.
///
/// Fails without touching anything if the parent lot has since been deleted;
/// consistency of purchase/sale items referencing the note is checked by the
/// calling domain. Returns how many events were reversed (zero is fine —
/// reversal is idempotent at the note level too).
pub fn cascade_reversal(
    note: &NoteItem,
    lot: &InventoryLot,
    events: &mut [LedgerEvent],
) -> DomainResult<usize> {
    if lot.deleted {
        return Err(DomainError::not_found(format!(
            "inventory lot {} is deleted",
            lot.id
        )));
    }

    let note_origin = match note.id {
        NoteRef::Debit(id) => EventOrigin::DebitNote(id),
        NoteRef::Credit(id) => EventOrigin::CreditNote(id),
    };

    let mut reversed = 0;
    for event in events.iter_mut() {
        if event.lot_id == lot.id && event.origin == note_origin && event.is_active() {
            event.reverse();
            reversed += 1;
        }
    }
    Ok(reversed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteOrigin;
    use millstock_core::{CreditNoteId, MaterialId, PurchaseItemId, WarehouseId};

    fn usd() -> Currency {
        Currency::new("USD").unwrap()
    }

    fn test_lot() -> InventoryLot {
        InventoryLot::new(
            MaterialId::new(),
            WarehouseId::new(),
            None,
            "kg",
            usd(),
            Utc::now(),
        )
    }

    fn test_purchase_item() -> PurchaseItem {
        PurchaseItem::new(PurchaseItemId::new(), MaterialId::new(), 100.0, 2.0, usd()).unwrap()
    }

    fn test_note(amount: f64, currency: Currency, delta: f64, origin: NoteOrigin) -> NoteItem {
        NoteItem::new(
            NoteRef::Credit(CreditNoteId::new()),
            origin,
            amount,
            currency,
            delta,
            "damaged goods",
        )
        .unwrap()
    }

    #[test]
    fn valid_adjustment_builds_a_non_baseline_event() {
        let lot = test_lot();
        let item = test_purchase_item();
        let note = test_note(20.0, usd(), -10.0, NoteOrigin::Purchase(item.id));

        let event = reconcile(&note, &OriginItem::Purchase(&item), &lot, Utc::now()).unwrap();
        assert_eq!(event.lot_id, lot.id);
        assert_eq!(event.quantity, -10.0);
        assert!(!event.affects_baseline);
        assert!(event.is_active());
        assert!(matches!(event.origin, EventOrigin::CreditNote(_)));
    }

    #[test]
    fn currency_mismatch_is_a_consistency_error() {
        let lot = test_lot();
        let item = test_purchase_item();
        let eur = Currency::new("EUR").unwrap();
        let note = test_note(20.0, eur, -10.0, NoteOrigin::Purchase(item.id));

        let err = reconcile(&note, &OriginItem::Purchase(&item), &lot, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Consistency(_)));
    }

    #[test]
    fn amount_above_recorded_total_is_rejected() {
        let lot = test_lot();
        let item = test_purchase_item(); // recorded total 200
        let note = test_note(250.0, usd(), -10.0, NoteOrigin::Purchase(item.id));

        let err = reconcile(&note, &OriginItem::Purchase(&item), &lot, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Consistency(_)));
    }

    #[test]
    fn successive_notes_cannot_overdraw_the_origin_total() {
        let lot = test_lot();
        let mut item = test_purchase_item(); // recorded total 200
        item.amount_adjustment = -150.0; // a prior credit already applied

        // Another 150 would push the adjusted total to -100.
        let too_much = test_note(150.0, usd(), -10.0, NoteOrigin::Purchase(item.id));
        let err =
            reconcile(&too_much, &OriginItem::Purchase(&item), &lot, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Consistency(_)));

        // A note within the remaining 50 still passes.
        let within = test_note(40.0, usd(), -5.0, NoteOrigin::Purchase(item.id));
        assert!(reconcile(&within, &OriginItem::Purchase(&item), &lot, Utc::now()).is_ok());
    }

    #[test]
    fn deleted_lot_fails_not_found() {
        let mut lot = test_lot();
        lot.deleted = true;
        let item = test_purchase_item();
        let note = test_note(20.0, usd(), -10.0, NoteOrigin::Purchase(item.id));

        let err = reconcile(&note, &OriginItem::Purchase(&item), &lot, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn cascade_reverses_only_the_notes_events() {
        let lot = test_lot();
        let item = test_purchase_item();
        let note = test_note(20.0, usd(), -10.0, NoteOrigin::Purchase(item.id));

        let correction =
            reconcile(&note, &OriginItem::Purchase(&item), &lot, Utc::now()).unwrap();
        let unrelated = LedgerEvent::baseline(
            lot.id,
            100.0,
            EventOrigin::Purchase(item.id),
            Utc::now(),
        )
        .unwrap();

        let mut events = vec![correction, unrelated];
        let reversed = cascade_reversal(&note, &lot, &mut events).unwrap();

        assert_eq!(reversed, 1);
        assert!(!events[0].is_active());
        assert!(events[1].is_active());

        // Second cascade is a no-op.
        let reversed_again = cascade_reversal(&note, &lot, &mut events).unwrap();
        assert_eq!(reversed_again, 0);
    }

    #[test]
    fn cascade_fails_if_parent_lot_deleted() {
        let mut lot = test_lot();
        let item = test_purchase_item();
        let note = test_note(20.0, usd(), -10.0, NoteOrigin::Purchase(item.id));
        let correction =
            reconcile(&note, &OriginItem::Purchase(&item), &lot, Utc::now()).unwrap();

        lot.deleted = true;
        let mut events = vec![correction];
        let err = cascade_reversal(&note, &lot, &mut events).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(events[0].is_active());
    }
}
