//! # Transactional Services
//!
//! Orchestration of multi-step stock operations.
//!
//! ## One Operation, One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /ordonnances                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PrescriptionService::create                                            │
//! │       │  BEGIN                                                          │
//! │       │    check treatment, check duplicate                             │
//! │       │    insert prescription                                          │
//! │       │    per line item: read stock, validate, decrement, insert item  │
//! │       │  COMMIT (or implicit ROLLBACK on any error)                     │
//! │       ▼                                                                 │
//! │  Every prior decrement of the request is undone by the rollback, so a   │
//! │  failing request leaves stock exactly where it started.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Services own the `SqlitePool`, begin a transaction per write operation,
//! and thread its connection into the repositories' `*_tx` functions. The
//! repositories never begin transactions themselves.

pub mod prescription;
pub mod procurement;

use thiserror::Error;

use crate::error::DbError;
use sante_core::CoreError;

/// Errors surfaced by the transactional services.
///
/// Both sides are transparent: the service layer adds orchestration, not new
/// failure categories. Handlers map variants to HTTP statuses.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business rule violation (insufficient stock, duplicates, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Database failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
