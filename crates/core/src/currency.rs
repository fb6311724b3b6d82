//! Currency value object: equality by value, validated once at construction.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// ISO-4217-style currency code (uppercase, three letters).
///
/// Immutable and compared by value. All costs within one inventory lot are
/// denominated in a single currency; this subsystem never converts between
/// currencies, it only checks that they match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl Into<String>) -> DomainResult<Self> {
        let code = code.into();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::validation(format!(
                "currency code must be three letters, got '{code}'"
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
