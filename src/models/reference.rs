use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A known diagnosis in the searchable reference index.
///
/// `embedding` is the stored vector for the diagnosis's canonical symptom
/// description, fixed dimensionality per embedding model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceDiagnosis {
    pub id: Uuid,
    pub description: String,
    pub tests: Vec<String>,
    pub embedding: Vec<f32>,
}
