//! Adjustment reconciliation.
//!
//! Debit/credit notes correct quantities and amounts after the fact. A
//! correction is always a new non-baseline ledger event against the lot the
//! origin item targeted; the original event is never edited. Deleting a note
//! cascades to soft-reversing the events it produced.

pub mod note;
pub mod reconcile;

pub use note::{NoteItem, NoteOrigin, NoteRef};
pub use reconcile::{OriginItem, cascade_reversal, reconcile};
