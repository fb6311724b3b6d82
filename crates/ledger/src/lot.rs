use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use millstock_core::{Currency, InventoryLotId, MaterialId, WarehouseId};

use crate::event::LedgerEvent;

/// One identifiable, separately-costed batch of a material at a warehouse.
///
/// The lot record itself carries no quantities: `original_quantity` and
/// `current_quantity` are derived from the lot's active ledger events, so a
/// reversal anywhere in the history recomputes them for free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLot {
    pub id: InventoryLotId,
    pub material_id: MaterialId,
    pub warehouse_id: WarehouseId,
    /// Unique human-facing label; generated from the creation timestamp when
    /// the caller does not provide one.
    pub lot_label: String,
    /// Unit of measure; must match the material's unit.
    pub unit: String,
    pub currency: Currency,
    pub is_active: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl InventoryLot {
    pub fn new(
        material_id: MaterialId,
        warehouse_id: WarehouseId,
        lot_label: Option<String>,
        unit: impl Into<String>,
        currency: Currency,
        created_at: DateTime<Utc>,
    ) -> Self {
        let lot_label = lot_label.unwrap_or_else(|| Self::generate_label(created_at));
        Self {
            id: InventoryLotId::new(),
            material_id,
            warehouse_id,
            lot_label,
            unit: unit.into(),
            currency,
            is_active: true,
            deleted: false,
            created_at,
        }
    }

    /// Dashed UTC timestamp, e.g. "2025-04-27-23:05:42".
    pub fn generate_label(at: DateTime<Utc>) -> String {
        at.format("%Y-%m-%d-%H:%M:%S").to_string()
    }

    /// Sum of active baseline event quantities.
    ///
    /// A lot with no active baseline events has `original_quantity = 0`.
    pub fn original_quantity(&self, events: &[LedgerEvent]) -> f64 {
        self.fold_events(events, |e| e.affects_baseline)
    }

    /// `original_quantity` plus all active non-baseline deltas.
    pub fn current_quantity(&self, events: &[LedgerEvent]) -> f64 {
        self.fold_events(events, |_| true)
    }

    fn fold_events(&self, events: &[LedgerEvent], keep: impl Fn(&LedgerEvent) -> bool) -> f64 {
        events
            .iter()
            .filter(|e| e.lot_id == self.id && e.is_active() && keep(e))
            .map(|e| e.quantity)
            .sum()
    }
}
