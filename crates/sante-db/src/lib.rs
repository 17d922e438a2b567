//! # sante-db: Database Layer for Sante
//!
//! This crate provides database access for the Sante backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Sante Data Flow                                 │
//! │                                                                         │
//! │  Axum handler (POST /ordonnances)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     sante-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌────────────────┐   │   │
//! │  │   │   Database    │   │ Repositories  │   │    Services    │   │   │
//! │  │   │   (pool.rs)   │◄──│ (medication,  │◄──│ (prescription, │   │   │
//! │  │   │               │   │  procurement, │   │  procurement)  │   │   │
//! │  │   │ SqlitePool    │   │  ...)         │   │  = one tx each │   │   │
//! │  │   └───────────────┘   └───────────────┘   └────────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, foreign keys on)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (medication, procurement, ...)
//! - [`service`] - Transactional services: every multi-step stock operation
//!   runs inside one `sqlx::Transaction`, threaded into each repository call
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sante_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/sante.db")).await?;
//! let medications = db.medications().list().await?;
//! let created = db.prescription_service().create(new_prescription).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::expense::ExpenseRepository;
pub use repository::medication::MedicationRepository;
pub use repository::prescription::PrescriptionRepository;
pub use repository::procurement::ProcurementRepository;
pub use repository::treatment::TreatmentRepository;

// Service re-exports
pub use service::prescription::{NewLineItem, NewPrescription, PrescriptionService, PrescriptionUpdate};
pub use service::procurement::{NewProcurement, ProcurementService};
pub use service::{ServiceError, ServiceResult};
