//! # Seed Data Generator
//!
//! Populates the database with development data: medications, suppliers,
//! patients, doctors and treatments.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p sante-db --bin seed
//!
//! # Specify database path
//! cargo run -p sante-db --bin seed -- --db ./data/sante.db
//! ```

use std::env;

use sante_db::{Database, DbConfig};

/// Medications with (name, unit price in cents, initial stock).
const MEDICATIONS: &[(&str, i64, i64)] = &[
    ("Paracetamol 500mg", 250, 120),
    ("Amoxicillin 1g", 1450, 60),
    ("Ibuprofen 400mg", 390, 80),
    ("Aspirin 500mg", 320, 100),
    ("Omeprazole 20mg", 980, 45),
    ("Metformin 850mg", 760, 50),
    ("Amlodipine 5mg", 1120, 30),
    ("Azithromycin 250mg", 2150, 25),
    ("Loratadine 10mg", 540, 70),
    ("Salbutamol Inhaler", 3400, 15),
    ("Vitamin C 1g", 300, 200),
    ("Diclofenac Gel", 850, 40),
];

const SUPPLIERS: &[(&str, &str)] = &[
    ("Pharma Atlas", "contact@pharma-atlas.example"),
    ("MediStock SARL", "ventes@medistock.example"),
    ("Grossiste Central", "commande@grossiste-central.example"),
];

const PATIENTS: &[(&str, Option<&str>)] = &[
    ("Fatima Zahra El Amrani", Some("+212600000001")),
    ("Youssef Benali", Some("+212600000002")),
    ("Khadija Mansouri", None),
    ("Omar Tazi", Some("+212600000004")),
    ("Salma Idrissi", None),
];

const DOCTORS: &[(&str, &str)] = &[
    ("Dr. Ahmed Berrada", "General medicine"),
    ("Dr. Leila Chraibi", "Cardiology"),
    ("Dr. Karim Fassi", "Pediatrics"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./sante_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Sante Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./sante_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Sante Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.medications().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} medications", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding reference data...");

    for (name, price_cents, stock) in MEDICATIONS {
        db.medications().insert(name, *price_cents, *stock).await?;
    }
    println!("  {} medications", MEDICATIONS.len());

    for (name, contact) in SUPPLIERS {
        db.procurements().insert_supplier(name, Some(*contact)).await?;
    }
    println!("  {} suppliers", SUPPLIERS.len());

    let mut patient_ids = Vec::new();
    for (full_name, phone) in PATIENTS {
        let patient = db.treatments().insert_patient(full_name, *phone).await?;
        patient_ids.push(patient.id);
    }
    println!("  {} patients", PATIENTS.len());

    let mut doctor_ids = Vec::new();
    for (full_name, speciality) in DOCTORS {
        let doctor = db
            .treatments()
            .insert_doctor(full_name, Some(*speciality))
            .await?;
        doctor_ids.push(doctor.id);
    }
    println!("  {} doctors", DOCTORS.len());

    // One open treatment per patient, doctors assigned round-robin
    let mut treatments = 0;
    for (idx, patient_id) in patient_ids.iter().enumerate() {
        let doctor_id = &doctor_ids[idx % doctor_ids.len()];
        db.treatments()
            .insert(patient_id, Some(doctor_id), Some("Routine consultation"))
            .await?;
        treatments += 1;
    }
    println!("  {} treatments", treatments);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
