use serde::{Deserialize, Serialize};

use super::TriageError;

/// A known diagnosis retrieved for a symptom query, rescored against the
/// query embedding. Immutable once produced.
#[derive(Debug, Clone)]
pub struct DiagnosisCandidate {
    pub description: String,
    pub score: f32,
    pub tests: Vec<String>,
}

/// The pipeline's sole output artifact. Either fully validated from the
/// model response or fully replaced by the deterministic fallback — never
/// partially valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageInsight {
    /// 1 (immediate) to 3 (non-urgent)
    pub severity: u8,
    /// At most two selected diagnoses
    pub diagnoses: Vec<String>,
    pub tests: Vec<String>,
    pub reasons: Option<String>,
}

/// Read-only inputs gathered for one triage request. Scoped to a single
/// invocation, not retained.
#[derive(Debug, Clone)]
pub struct PatientContext {
    pub symptoms: String,
    pub history: Option<String>,
    pub recent_event: Option<String>,
    pub patient_id: String,
    pub past_diagnoses: Vec<String>,
}

/// A raw nearest-neighbor hit from the diagnosis index, before rescoring.
#[derive(Debug, Clone)]
pub struct IndexHit {
    pub embedding: Vec<f32>,
    pub description: String,
    pub tests: Vec<String>,
}

/// Embedding service abstraction. Must be deterministic for identical
/// canonicalized input.
pub trait EmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, TriageError>;
}

/// Nearest-neighbor search over known diagnosis records, ordered by the
/// index's own relevance metric.
pub trait DiagnosisIndex {
    fn nearest_neighbors(&self, query: &[f32], k: usize) -> Result<Vec<IndexHit>, TriageError>;
}

/// Generative language model abstraction (allows mocking).
/// The pipeline always passes temperature 0.
pub trait LlmClient {
    fn complete(&self, system: &str, prompt: &str, temperature: f32)
        -> Result<String, TriageError>;
}

/// Patient-record history lookup for past diagnosis strings.
pub trait DiagnosisHistory {
    fn past_diagnoses_for(&self, patient_id: &str) -> Result<Vec<String>, TriageError>;
}
