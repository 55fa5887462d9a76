//! Intake record workflow — patient registration, record creation (where
//! the triage pipeline runs and its insight is persisted), clinician field
//! updates, appointment completion, and visit-contact counting.

use chrono::Local;
use rusqlite::Connection;
use thiserror::Error;

use crate::db::repository::{self, RecordUpdate};
use crate::db::DatabaseError;
use crate::models::{IntakeRecord, Patient};
use crate::pipeline::triage::orchestrator::TriagePipeline;
use crate::pipeline::triage::types::{
    DiagnosisHistory, DiagnosisIndex, EmbeddingModel, LlmClient,
};
use crate::pipeline::triage::TriageError;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Triage pipeline error: {0}")]
    Triage(#[from] TriageError),
}

/// Past-diagnosis lookup over the intake records table.
pub struct SqliteDiagnosisHistory<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteDiagnosisHistory<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl DiagnosisHistory for SqliteDiagnosisHistory<'_> {
    fn past_diagnoses_for(&self, patient_id: &str) -> Result<Vec<String>, TriageError> {
        Ok(repository::past_diagnoses_for(self.conn, patient_id)?)
    }
}

/// Look up a patient by id, registering them on first contact.
/// A blank id is a no-op.
pub fn search_or_create_patient(
    conn: &Connection,
    patient_id: &str,
) -> Result<Option<Patient>, DatabaseError> {
    let patient_id = patient_id.trim();
    if patient_id.is_empty() {
        return Ok(None);
    }

    if let Some(existing) = repository::get_patient(conn, patient_id)? {
        return Ok(Some(existing));
    }

    let patient = Patient {
        patient_id: patient_id.to_string(),
        medications: None,
    };
    repository::insert_patient(conn, &patient)?;
    tracing::info!(patient_id, "Registered new patient");
    Ok(Some(patient))
}

/// Create the next intake record for a patient.
///
/// When symptoms are present the triage pipeline runs and its insight is
/// persisted onto the record. The patient must already exist; an unknown
/// id logs and returns `None` rather than failing the intake flow.
pub fn create_intake_record<E, I, L, H>(
    conn: &Connection,
    pipeline: &TriagePipeline<'_, E, I, L, H>,
    patient_id: &str,
    symptoms: Option<&str>,
    medications: Option<&str>,
    history: Option<&str>,
    what_happened: Option<&str>,
) -> Result<Option<IntakeRecord>, IntakeError>
where
    E: EmbeddingModel,
    I: DiagnosisIndex,
    L: LlmClient,
    H: DiagnosisHistory,
{
    let patient_id = patient_id.trim();
    let symptoms = trimmed_non_empty(symptoms);
    let medications = trimmed_non_empty(medications);
    let history = trimmed_non_empty(history);
    let what_happened = trimmed_non_empty(what_happened);

    if repository::get_patient(conn, patient_id)?.is_none() {
        tracing::warn!(patient_id, "No patient found, nothing to update");
        return Ok(None);
    }

    let index = repository::next_record_index(conn, patient_id)?;
    let now = Local::now().naive_local();

    let mut record = IntakeRecord {
        record_id: format!("{patient_id}-{index}"),
        patient_id: patient_id.to_string(),
        index,
        date: now.date(),
        created_at: now,
        complete: false,
        times_seen_in_visit: 0,
        is_with_doctor: false,
        symptoms: None,
        tests: None,
        history: history.map(str::to_string),
        what_happened: what_happened.map(str::to_string),
        diagnosis: None,
        treatment: None,
        outcome: None,
        severity: None,
        candidates: Vec::new(),
        suggestions: Vec::new(),
        ai_reasoning: None,
    };

    if let Some(symptoms) = symptoms {
        if let Some(insight) =
            pipeline.produce_triage(symptoms, patient_id, history, what_happened)?
        {
            record.severity = Some(insight.severity);
            record.candidates = insight.diagnoses;
            record.suggestions = insight.tests;
            record.ai_reasoning = insight.reasons;
        }
        record.symptoms = Some(symptoms.to_string());
    }

    if let Some(medications) = medications {
        repository::update_patient_medications(conn, patient_id, medications)?;
    }

    repository::insert_record(conn, &record)?;
    tracing::info!(record_id = %record.record_id, "Created intake record");
    Ok(Some(record))
}

/// Clinician-facing field updates for an existing record. Blank values are
/// ignored; medications route to the patient row.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordPatch<'a> {
    pub symptoms: Option<&'a str>,
    pub tests: Option<&'a str>,
    pub history: Option<&'a str>,
    pub medications: Option<&'a str>,
    pub diagnosis: Option<&'a str>,
    pub treatment: Option<&'a str>,
    pub outcome: Option<&'a str>,
    pub what_happened: Option<&'a str>,
}

pub fn update_intake_record(
    conn: &Connection,
    record_id: &str,
    patch: &RecordPatch<'_>,
) -> Result<bool, DatabaseError> {
    let record_id = record_id.trim();

    let record = match repository::get_record(conn, record_id)? {
        Some(r) => r,
        None => {
            tracing::warn!(record_id, "No record found, nothing to update");
            return Ok(false);
        }
    };

    repository::update_record(
        conn,
        record_id,
        &RecordUpdate {
            symptoms: trimmed_non_empty(patch.symptoms),
            tests: trimmed_non_empty(patch.tests),
            history: trimmed_non_empty(patch.history),
            what_happened: trimmed_non_empty(patch.what_happened),
            diagnosis: trimmed_non_empty(patch.diagnosis),
            treatment: trimmed_non_empty(patch.treatment),
            outcome: trimmed_non_empty(patch.outcome),
        },
    )?;

    if let Some(medications) = trimmed_non_empty(patch.medications) {
        repository::update_patient_medications(conn, &record.patient_id, medications)?;
    }

    tracing::info!(record_id, "Record updated");
    Ok(true)
}

/// Mark an appointment's record complete.
pub fn complete_appointment(conn: &Connection, record_id: &str) -> Result<bool, DatabaseError> {
    let record_id = record_id.trim();

    match repository::mark_complete(conn, record_id) {
        Ok(()) => {
            tracing::info!(record_id, "Appointment marked as complete");
            Ok(true)
        }
        Err(DatabaseError::NotFound { .. }) => {
            tracing::warn!(record_id, "No record found, nothing to update");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Count one visit contact and release the patient back to waiting.
pub fn record_seen(conn: &Connection, record_id: &str) -> Result<bool, DatabaseError> {
    let record_id = record_id.trim();

    match repository::increment_times_seen(conn, record_id) {
        Ok(()) => Ok(true),
        Err(DatabaseError::NotFound { .. }) => {
            tracing::warn!(record_id, "No record found, nothing to update");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

fn trimmed_non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
