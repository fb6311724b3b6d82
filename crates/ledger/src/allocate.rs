//! FIFO consumption allocator.
//!
//! Pure read-then-compute: the allocator emits no events itself, so callers
//! can run it as a dry-run availability check and only append consumption
//! events once the split comes back complete.

use millstock_core::{DomainError, DomainResult, InventoryLotId, QTY_EPSILON};

use crate::lot::InventoryLot;

/// An allocation candidate: one active lot and its derived current quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LotAvailability {
    pub lot_id: InventoryLotId,
    pub available: f64,
}

/// One entry of a FIFO split; the per-call entries sum to the request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub lot_id: InventoryLotId,
    pub quantity: f64,
}

/// Order lots oldest-created-first, stable tie-break on lot label.
///
/// Creation timestamp is the primary FIFO key; the label tie-break keeps the
/// order total (labels are unique) and therefore deterministic.
pub fn fifo_order(lots: &mut [InventoryLot]) {
    lots.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.lot_label.cmp(&b.lot_label))
    });
}

/// Split `quantity_needed` across candidates, oldest first.
///
/// Hard stop: if the candidates cannot fully satisfy the request, the call
/// fails with `InsufficientStock` and no allocation entries are returned.
/// Candidates must already be in FIFO order (see [`fifo_order`]).
pub fn allocate(
    candidates: &[LotAvailability],
    quantity_needed: f64,
) -> DomainResult<Vec<Allocation>> {
    if !quantity_needed.is_finite() || quantity_needed <= 0.0 {
        return Err(DomainError::validation(
            "allocation quantity must be positive",
        ));
    }

    let mut remaining = quantity_needed;
    let mut split = Vec::new();

    for candidate in candidates {
        if remaining <= QTY_EPSILON {
            break;
        }
        let take = candidate.available.min(remaining);
        if take > QTY_EPSILON {
            split.push(Allocation {
                lot_id: candidate.lot_id,
                quantity: take,
            });
            remaining -= take;
        }
    }

    if remaining > QTY_EPSILON {
        let available: f64 = candidates.iter().map(|c| c.available.max(0.0)).sum();
        return Err(DomainError::insufficient_stock(quantity_needed, available));
    }

    Ok(split)
}
