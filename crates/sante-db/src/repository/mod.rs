//! # Repository Module
//!
//! Database repository implementations for Sante.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler / Service                                                      │
//! │       │                                                                 │
//! │       │  db.medications().get_by_id(id)                                 │
//! │       ▼                                                                 │
//! │  MedicationRepository                                                   │
//! │       │  SQL query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two calling conventions coexist:
//!
//! - `&self` methods run on the pool and are for plain reads and standalone
//!   CRUD.
//! - Associated `*_tx` functions take a `&mut SqliteConnection` so a
//!   transactional service can thread one `sqlx::Transaction` through every
//!   read and write of a multi-step operation. Never mix the two inside one
//!   orchestrated operation.
//!
//! ## Available Repositories
//!
//! - [`medication::MedicationRepository`] - Medication CRUD + the stock ledger
//! - [`procurement::ProcurementRepository`] - Procurement rows and expansion
//! - [`expense::ExpenseRepository`] - Expense rows
//! - [`prescription::PrescriptionRepository`] - Prescriptions and line items
//! - [`treatment::TreatmentRepository`] - Treatments, patients, doctors

pub mod expense;
pub mod medication;
pub mod prescription;
pub mod procurement;
pub mod treatment;
