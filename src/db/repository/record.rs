use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::IntakeRecord;

pub fn insert_record(conn: &Connection, record: &IntakeRecord) -> Result<(), DatabaseError> {
    let candidates = serde_json::to_string(&record.candidates)
        .map_err(|e| DatabaseError::ColumnDecode(e.to_string()))?;
    let suggestions = serde_json::to_string(&record.suggestions)
        .map_err(|e| DatabaseError::ColumnDecode(e.to_string()))?;

    conn.execute(
        "INSERT INTO intake_records (
            record_id, patient_id, record_index, record_date, created_at,
            complete, times_seen_in_visit, is_with_doctor,
            symptoms, tests, history, what_happened,
            diagnosis, treatment, outcome,
            severity, candidates, suggestions, ai_reasoning
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            record.record_id,
            record.patient_id,
            record.index,
            record.date,
            record.created_at,
            record.complete,
            record.times_seen_in_visit,
            record.is_with_doctor,
            record.symptoms,
            record.tests,
            record.history,
            record.what_happened,
            record.diagnosis,
            record.treatment,
            record.outcome,
            record.severity,
            candidates,
            suggestions,
            record.ai_reasoning,
        ],
    )?;
    Ok(())
}

pub fn get_record(conn: &Connection, record_id: &str) -> Result<Option<IntakeRecord>, DatabaseError> {
    let record = conn
        .query_row(
            "SELECT record_id, patient_id, record_index, record_date, created_at,
                    complete, times_seen_in_visit, is_with_doctor,
                    symptoms, tests, history, what_happened,
                    diagnosis, treatment, outcome,
                    severity, candidates, suggestions, ai_reasoning
             FROM intake_records WHERE record_id = ?1",
            params![record_id],
            row_to_record,
        )
        .optional()?;
    Ok(record)
}

/// Next per-patient record index (0 for a patient with no records yet).
pub fn next_record_index(conn: &Connection, patient_id: &str) -> Result<i64, DatabaseError> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(record_index) FROM intake_records WHERE patient_id = ?1",
        params![patient_id],
        |row| row.get(0),
    )?;
    Ok(max.map_or(0, |m| m + 1))
}

/// Partial update applied by the clinician-facing workflow.
/// `None` fields keep their stored value.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordUpdate<'a> {
    pub symptoms: Option<&'a str>,
    pub tests: Option<&'a str>,
    pub history: Option<&'a str>,
    pub what_happened: Option<&'a str>,
    pub diagnosis: Option<&'a str>,
    pub treatment: Option<&'a str>,
    pub outcome: Option<&'a str>,
}

pub fn update_record(
    conn: &Connection,
    record_id: &str,
    update: &RecordUpdate<'_>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE intake_records SET
            symptoms = COALESCE(?2, symptoms),
            tests = COALESCE(?3, tests),
            history = COALESCE(?4, history),
            what_happened = COALESCE(?5, what_happened),
            diagnosis = COALESCE(?6, diagnosis),
            treatment = COALESCE(?7, treatment),
            outcome = COALESCE(?8, outcome)
         WHERE record_id = ?1",
        params![
            record_id,
            update.symptoms,
            update.tests,
            update.history,
            update.what_happened,
            update.diagnosis,
            update.treatment,
            update.outcome,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "intake_record".into(),
            id: record_id.into(),
        });
    }
    Ok(())
}

pub fn mark_complete(conn: &Connection, record_id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE intake_records SET complete = 1 WHERE record_id = ?1",
        params![record_id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "intake_record".into(),
            id: record_id.into(),
        });
    }
    Ok(())
}

/// Count a visit contact: bump the counter and hand the patient back to the
/// waiting area.
pub fn increment_times_seen(conn: &Connection, record_id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE intake_records
         SET times_seen_in_visit = times_seen_in_visit + 1, is_with_doctor = 0
         WHERE record_id = ?1",
        params![record_id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "intake_record".into(),
            id: record_id.into(),
        });
    }
    Ok(())
}

/// Confirmed diagnoses from the patient's past records, oldest first.
/// Blank values (records still awaiting a diagnosis) are excluded.
pub fn past_diagnoses_for(conn: &Connection, patient_id: &str) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT diagnosis FROM intake_records
         WHERE patient_id = ?1 AND diagnosis IS NOT NULL AND TRIM(diagnosis) != ''
         ORDER BY record_index",
    )?;

    let rows = stmt.query_map(params![patient_id], |row| row.get::<_, String>(0))?;

    let mut diagnoses = Vec::new();
    for row in rows {
        diagnoses.push(row?);
    }
    Ok(diagnoses)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<IntakeRecord> {
    let candidates: String = row.get(16)?;
    let suggestions: String = row.get(17)?;

    Ok(IntakeRecord {
        record_id: row.get(0)?,
        patient_id: row.get(1)?,
        index: row.get(2)?,
        date: row.get(3)?,
        created_at: row.get(4)?,
        complete: row.get(5)?,
        times_seen_in_visit: row.get(6)?,
        is_with_doctor: row.get(7)?,
        symptoms: row.get(8)?,
        tests: row.get(9)?,
        history: row.get(10)?,
        what_happened: row.get(11)?,
        diagnosis: row.get(12)?,
        treatment: row.get(13)?,
        outcome: row.get(14)?,
        severity: row.get(15)?,
        candidates: decode_json_column(16, &candidates)?,
        suggestions: decode_json_column(17, &suggestions)?,
        ai_reasoning: row.get(18)?,
    })
}

fn decode_json_column(index: usize, raw: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}
