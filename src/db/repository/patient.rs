use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::Patient;

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (patient_id, medications) VALUES (?1, ?2)",
        params![patient.patient_id, patient.medications],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, patient_id: &str) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            "SELECT patient_id, medications FROM patients WHERE patient_id = ?1",
            params![patient_id],
            |row| {
                Ok(Patient {
                    patient_id: row.get(0)?,
                    medications: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(patient)
}

pub fn update_patient_medications(
    conn: &Connection,
    patient_id: &str,
    medications: &str,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET medications = ?2 WHERE patient_id = ?1",
        params![patient_id, medications],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: patient_id.into(),
        });
    }
    Ok(())
}
