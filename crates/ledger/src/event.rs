use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use millstock_core::{
    CreditNoteId, Currency, DebitNoteId, DomainError, DomainResult, InventoryLotId, LedgerEventId,
    ProcessId, PurchaseItemId, SaleItemId,
};

/// Causal origin of a ledger event.
///
/// Exactly one origin reference per event holds by construction: the enum
/// replaces the nullable foreign-key columns of the source schema, so there
/// is no "two references set" state to validate away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOrigin {
    Purchase(PurchaseItemId),
    Sale(SaleItemId),
    Process(ProcessId),
    DebitNote(DebitNoteId),
    CreditNote(CreditNoteId),
    Manual,
}

/// Ledger event lifecycle: `Active → Reversed`, one-way, terminal.
///
/// There is no "updated" state; corrections are always new events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Reversed,
}

/// An immutable, signed quantity delta against one inventory lot.
///
/// Created once by a domain action (purchase receipt, process run, sale
/// fulfillment, adjustment); never mutated afterwards except through
/// [`LedgerEvent::reverse`]. Derived lot quantities recompute automatically
/// once an event is reversed, because aggregation only folds active events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub id: LedgerEventId,
    pub lot_id: InventoryLotId,
    /// Signed delta. Positive for receipts/production, negative for
    /// consumption. Baseline events are positive by construction.
    pub quantity: f64,
    pub origin: EventOrigin,
    /// Baseline events contribute to `original_quantity` and to the lot's
    /// cost basis; non-baseline events only move `current_quantity`.
    pub affects_baseline: bool,
    /// When set, overrides any origin-derived cost during resolution.
    pub explicit_cost_per_unit: Option<f64>,
    pub currency: Option<Currency>,
    status: EventStatus,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEvent {
    /// A baseline (cost-bearing) event: purchase receipt or process output.
    ///
    /// Baseline quantities must be strictly positive; this is what makes the
    /// weighted-average denominator in cost resolution non-zero whenever the
    /// baseline set is non-empty.
    pub fn baseline(
        lot_id: InventoryLotId,
        quantity: f64,
        origin: EventOrigin,
        recorded_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        match origin {
            EventOrigin::Purchase(_) | EventOrigin::Process(_) => {}
            EventOrigin::Manual => {
                return Err(DomainError::validation(
                    "manual baseline events require an explicit cost and currency",
                ));
            }
            _ => {
                return Err(DomainError::validation(
                    "baseline events must originate from a purchase or a process",
                ));
            }
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(DomainError::validation(
                "baseline event quantity must be positive",
            ));
        }
        Ok(Self {
            id: LedgerEventId::new(),
            lot_id,
            quantity,
            origin,
            affects_baseline: true,
            explicit_cost_per_unit: None,
            currency: None,
            status: EventStatus::Active,
            recorded_at,
        })
    }

    /// A manual baseline event. Manual origin carries no item to derive a
    /// cost from, so the cost and currency must be stated explicitly.
    pub fn baseline_manual(
        lot_id: InventoryLotId,
        quantity: f64,
        cost_per_unit: f64,
        currency: Currency,
        recorded_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(DomainError::validation(
                "baseline event quantity must be positive",
            ));
        }
        if !cost_per_unit.is_finite() || cost_per_unit < 0.0 {
            return Err(DomainError::validation(
                "explicit cost per unit must be a non-negative number",
            ));
        }
        Ok(Self {
            id: LedgerEventId::new(),
            lot_id,
            quantity,
            origin: EventOrigin::Manual,
            affects_baseline: true,
            explicit_cost_per_unit: Some(cost_per_unit),
            currency: Some(currency),
            status: EventStatus::Active,
            recorded_at,
        })
    }

    /// A non-baseline movement: consumption, transfer out, or a note-driven
    /// correction. Quantity is signed and must be non-zero.
    pub fn movement(
        lot_id: InventoryLotId,
        quantity: f64,
        origin: EventOrigin,
        recorded_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if matches!(origin, EventOrigin::Manual) {
            return Err(DomainError::validation(
                "manual movements require an explicit cost and currency; use movement_manual",
            ));
        }
        if !quantity.is_finite() || quantity == 0.0 {
            return Err(DomainError::validation(
                "movement quantity must be a non-zero number",
            ));
        }
        Ok(Self {
            id: LedgerEventId::new(),
            lot_id,
            quantity,
            origin,
            affects_baseline: false,
            explicit_cost_per_unit: None,
            currency: None,
            status: EventStatus::Active,
            recorded_at,
        })
    }

    /// A manual non-baseline movement, e.g. a stock-take correction. As with
    /// [`LedgerEvent::baseline_manual`], no origin item backs the event, so
    /// the cost and currency must be stated explicitly.
    pub fn movement_manual(
        lot_id: InventoryLotId,
        quantity: f64,
        cost_per_unit: f64,
        currency: Currency,
        recorded_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if !quantity.is_finite() || quantity == 0.0 {
            return Err(DomainError::validation(
                "movement quantity must be a non-zero number",
            ));
        }
        Self {
            id: LedgerEventId::new(),
            lot_id,
            quantity,
            origin: EventOrigin::Manual,
            affects_baseline: false,
            explicit_cost_per_unit: None,
            currency: None,
            status: EventStatus::Active,
            recorded_at,
        }
        .with_explicit_cost(cost_per_unit, currency)
    }

    /// Attach an explicit per-unit cost (overrides origin-derived cost during
    /// resolution). Currency must accompany the cost.
    pub fn with_explicit_cost(
        mut self,
        cost_per_unit: f64,
        currency: Currency,
    ) -> DomainResult<Self> {
        if !cost_per_unit.is_finite() || cost_per_unit < 0.0 {
            return Err(DomainError::validation(
                "explicit cost per unit must be a non-negative number",
            ));
        }
        self.explicit_cost_per_unit = Some(cost_per_unit);
        self.currency = Some(currency);
        Ok(self)
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == EventStatus::Active
    }

    /// Soft delete: logical reversal, never physical removal.
    ///
    /// Idempotent; reversing a reversed event is a no-op. The transition is
    /// one-way, so the quantity/cost history leading up to it stays intact.
    pub fn reverse(&mut self) {
        self.status = EventStatus::Reversed;
    }
}
