use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One intake record per visit contact.
///
/// Records are sequenced per patient; `record_id` is
/// `"{patient_id}-{index}"` so clinicians can reference a visit directly.
/// The `severity`/`candidates`/`suggestions`/`ai_reasoning` fields hold the
/// persisted triage insight; `diagnosis`/`treatment`/`outcome` are filled in
/// later by clinician updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub record_id: String,
    pub patient_id: String,
    pub index: i64,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub complete: bool,
    pub times_seen_in_visit: i64,
    pub is_with_doctor: bool,
    pub symptoms: Option<String>,
    pub tests: Option<String>,
    pub history: Option<String>,
    pub what_happened: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub outcome: Option<String>,
    pub severity: Option<u8>,
    pub candidates: Vec<String>,
    pub suggestions: Vec<String>,
    pub ai_reasoning: Option<String>,
}
