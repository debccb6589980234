//! The module contains the errors the ledger can throw.
//!
//! The errors are:
//!
//! - [`InvalidItem`] thrown when a producer builds an item that fails validation.
//! - [`InvalidAmount`] thrown when a monetary string cannot be parsed.
//! - [`KeyNotFound`] thrown when a looked-up item does not exist.
//! - [`Database`] wraps any failure of the underlying store.
//!
//!  [`InvalidItem`]: LedgerError::InvalidItem
//!  [`InvalidAmount`]: LedgerError::InvalidAmount
//!  [`KeyNotFound`]: LedgerError::KeyNotFound
//!  [`Database`]: LedgerError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid item: {0}")]
    InvalidItem(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidItem(a), Self::InvalidItem(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
