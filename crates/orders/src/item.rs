use serde::{Deserialize, Serialize};

use millstock_core::{
    Currency, DomainError, DomainResult, MaterialId, PurchaseItemId, QTY_EPSILON, SaleItemId,
};

/// A purchase order line as seen by the ledger: recorded quantity and price,
/// plus the net corrections posted against it by debit/credit notes.
///
/// `adjusted_price_per_unit` is the cost source for purchase-origin baseline
/// events: total adjusted cost divided by adjusted quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub id: PurchaseItemId,
    pub material_id: MaterialId,
    pub quantity: f64,
    pub price_per_unit: f64,
    pub currency: Currency,
    /// Signed net amount correction from notes (debit positive, credit negative).
    pub amount_adjustment: f64,
    /// Signed net quantity correction from notes.
    pub quantity_adjustment: f64,
}

impl PurchaseItem {
    pub fn new(
        id: PurchaseItemId,
        material_id: MaterialId,
        quantity: f64,
        price_per_unit: f64,
        currency: Currency,
    ) -> DomainResult<Self> {
        validate_line(quantity, price_per_unit)?;
        Ok(Self {
            id,
            material_id,
            quantity,
            price_per_unit,
            currency,
            amount_adjustment: 0.0,
            quantity_adjustment: 0.0,
        })
    }

    /// Total before any note corrections.
    pub fn recorded_total(&self) -> f64 {
        self.quantity * self.price_per_unit
    }

    pub fn adjusted_total(&self) -> f64 {
        self.recorded_total() + self.amount_adjustment
    }

    pub fn adjusted_quantity(&self) -> f64 {
        self.quantity + self.quantity_adjustment
    }

    /// Total adjusted cost divided by adjusted quantity; zero when the item
    /// has been corrected down to nothing.
    pub fn adjusted_price_per_unit(&self) -> f64 {
        let qty = self.adjusted_quantity();
        if qty.abs() <= QTY_EPSILON {
            0.0
        } else {
            self.adjusted_total() / qty
        }
    }
}

/// A customer-order line, mirrored for sale-side adjustments. The ledger
/// never derives cost from sales; this type only feeds bounds checking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: SaleItemId,
    pub material_id: MaterialId,
    pub quantity: f64,
    pub price_per_unit: f64,
    pub currency: Currency,
    pub amount_adjustment: f64,
    pub quantity_adjustment: f64,
}

impl SaleItem {
    pub fn new(
        id: SaleItemId,
        material_id: MaterialId,
        quantity: f64,
        price_per_unit: f64,
        currency: Currency,
    ) -> DomainResult<Self> {
        validate_line(quantity, price_per_unit)?;
        Ok(Self {
            id,
            material_id,
            quantity,
            price_per_unit,
            currency,
            amount_adjustment: 0.0,
            quantity_adjustment: 0.0,
        })
    }

    pub fn recorded_total(&self) -> f64 {
        self.quantity * self.price_per_unit
    }

    pub fn adjusted_total(&self) -> f64 {
        self.recorded_total() + self.amount_adjustment
    }

    pub fn adjusted_quantity(&self) -> f64 {
        self.quantity + self.quantity_adjustment
    }
}

fn validate_line(quantity: f64, price_per_unit: f64) -> DomainResult<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(DomainError::validation("item quantity must be positive"));
    }
    if !price_per_unit.is_finite() || price_per_unit < 0.0 {
        return Err(DomainError::validation(
            "price per unit must be a non-negative number",
        ));
    }
    Ok(())
}
