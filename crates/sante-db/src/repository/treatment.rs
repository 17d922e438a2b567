//! # Treatment Repository
//!
//! Database operations for treatments and their reference entities
//! (patients, doctors).
//!
//! Treatments carry no stock semantics. They exist so prescriptions have
//! something to hang off (at most one prescription per treatment) and so the
//! dashboard can show patient/doctor context next to a prescription.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use sante_core::{Doctor, Patient, Treatment, TreatmentExpanded};

/// Repository for treatment, patient and doctor operations.
#[derive(Debug, Clone)]
pub struct TreatmentRepository {
    pool: SqlitePool,
}

impl TreatmentRepository {
    /// Creates a new TreatmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TreatmentRepository { pool }
    }

    // =========================================================================
    // Treatments
    // =========================================================================

    /// Lists all treatments, newest first.
    pub async fn list(&self) -> DbResult<Vec<Treatment>> {
        let treatments = sqlx::query_as::<_, Treatment>(
            r#"
            SELECT id, patient_id, doctor_id, diagnosis, created_at
            FROM treatments
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(treatments)
    }

    /// Gets a treatment by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Treatment>> {
        let treatment = sqlx::query_as::<_, Treatment>(
            r#"
            SELECT id, patient_id, doctor_id, diagnosis, created_at
            FROM treatments
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(treatment)
    }

    /// Gets a treatment expanded with its patient and doctor.
    pub async fn get_expanded(&self, id: &str) -> DbResult<Option<TreatmentExpanded>> {
        let treatment = match self.get_by_id(id).await? {
            Some(treatment) => treatment,
            None => return Ok(None),
        };

        let patient = self.get_patient(&treatment.patient_id).await?;
        let doctor = match &treatment.doctor_id {
            Some(doctor_id) => self.get_doctor(doctor_id).await?,
            None => None,
        };

        Ok(Some(TreatmentExpanded {
            treatment,
            patient,
            doctor,
        }))
    }

    /// Inserts a new treatment and returns it.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown patient or doctor
    pub async fn insert(
        &self,
        patient_id: &str,
        doctor_id: Option<&str>,
        diagnosis: Option<&str>,
    ) -> DbResult<Treatment> {
        debug!(patient_id = %patient_id, "Inserting treatment");

        let treatment = Treatment {
            id: Uuid::new_v4().to_string(),
            patient_id: patient_id.to_string(),
            doctor_id: doctor_id.map(str::to_string),
            diagnosis: diagnosis.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO treatments (id, patient_id, doctor_id, diagnosis, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&treatment.id)
        .bind(&treatment.patient_id)
        .bind(&treatment.doctor_id)
        .bind(&treatment.diagnosis)
        .bind(treatment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(treatment)
    }

    // =========================================================================
    // Patients
    // =========================================================================

    /// Gets a patient by its ID.
    pub async fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            SELECT id, full_name, phone, created_at
            FROM patients
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(patient)
    }

    /// Inserts a new patient and returns it.
    pub async fn insert_patient(&self, full_name: &str, phone: Option<&str>) -> DbResult<Patient> {
        debug!(full_name = %full_name, "Inserting patient");

        let patient = Patient {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.to_string(),
            phone: phone.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO patients (id, full_name, phone, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&patient.id)
        .bind(&patient.full_name)
        .bind(&patient.phone)
        .bind(patient.created_at)
        .execute(&self.pool)
        .await?;

        Ok(patient)
    }

    // =========================================================================
    // Doctors
    // =========================================================================

    /// Gets a doctor by its ID.
    pub async fn get_doctor(&self, id: &str) -> DbResult<Option<Doctor>> {
        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            SELECT id, full_name, speciality, created_at
            FROM doctors
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doctor)
    }

    /// Inserts a new doctor and returns it.
    pub async fn insert_doctor(
        &self,
        full_name: &str,
        speciality: Option<&str>,
    ) -> DbResult<Doctor> {
        debug!(full_name = %full_name, "Inserting doctor");

        let doctor = Doctor {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.to_string(),
            speciality: speciality.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO doctors (id, full_name, speciality, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&doctor.id)
        .bind(&doctor.full_name)
        .bind(&doctor.speciality)
        .bind(doctor.created_at)
        .execute(&self.pool)
        .await?;

        Ok(doctor)
    }

    /// Gets a treatment inside a transaction.
    pub async fn get_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Treatment>> {
        let treatment = sqlx::query_as::<_, Treatment>(
            r#"
            SELECT id, patient_id, doctor_id, diagnosis, created_at
            FROM treatments
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(treatment)
    }
}
