use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::ReferenceDiagnosis;

pub fn insert_reference_diagnosis(
    conn: &Connection,
    diagnosis: &ReferenceDiagnosis,
) -> Result<(), DatabaseError> {
    let tests = serde_json::to_string(&diagnosis.tests)
        .map_err(|e| DatabaseError::ColumnDecode(e.to_string()))?;
    let embedding = serde_json::to_string(&diagnosis.embedding)
        .map_err(|e| DatabaseError::ColumnDecode(e.to_string()))?;

    conn.execute(
        "INSERT INTO reference_diagnoses (id, description, tests, embedding)
         VALUES (?1, ?2, ?3, ?4)",
        params![diagnosis.id.to_string(), diagnosis.description, tests, embedding],
    )?;
    Ok(())
}

pub fn all_reference_diagnoses(conn: &Connection) -> Result<Vec<ReferenceDiagnosis>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, description, tests, embedding FROM reference_diagnoses")?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut diagnoses = Vec::new();
    for row in rows {
        let (id, description, tests, embedding) = row?;
        diagnoses.push(ReferenceDiagnosis {
            id: Uuid::parse_str(&id).map_err(|e| DatabaseError::ColumnDecode(e.to_string()))?,
            description,
            tests: serde_json::from_str(&tests)
                .map_err(|e| DatabaseError::ColumnDecode(e.to_string()))?,
            embedding: serde_json::from_str(&embedding)
                .map_err(|e| DatabaseError::ColumnDecode(e.to_string()))?,
        });
    }
    Ok(diagnoses)
}
