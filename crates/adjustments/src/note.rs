use serde::{Deserialize, Serialize};

use millstock_core::{
    CreditNoteId, Currency, DebitNoteId, DomainError, DomainResult, ProcessId, PurchaseItemId,
    SaleItemId,
};

/// Which note a correction stems from. Debit and credit notes carry distinct
/// identifier spaces, so the reference is tagged rather than flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteRef {
    Debit(DebitNoteId),
    Credit(CreditNoteId),
}

/// The item a note corrects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteOrigin {
    Purchase(PurchaseItemId),
    Sale(SaleItemId),
    Process(ProcessId),
}

/// One debit or credit note item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteItem {
    pub id: NoteRef,
    pub origin: NoteOrigin,
    /// Monetary correction amount, always positive; direction comes from the
    /// note kind at the accounting layer, not from this subsystem.
    pub amount: f64,
    pub currency: Currency,
    /// Signed quantity correction to post against the origin item's lot.
    pub quantity_delta: f64,
    pub reason: String,
}

impl NoteItem {
    pub fn new(
        id: NoteRef,
        origin: NoteOrigin,
        amount: f64,
        currency: Currency,
        quantity_delta: f64,
        reason: impl Into<String>,
    ) -> DomainResult<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(DomainError::validation(
                "note amount must be a non-negative number",
            ));
        }
        if !quantity_delta.is_finite() || quantity_delta == 0.0 {
            return Err(DomainError::validation(
                "note quantity delta must be a non-zero number",
            ));
        }
        Ok(Self {
            id,
            origin,
            amount,
            currency,
            quantity_delta,
            reason: reason.into(),
        })
    }
}
