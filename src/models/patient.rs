use serde::{Deserialize, Serialize};

/// A registered patient. Created on first contact, keyed by the
/// hospital-issued identifier rather than a surrogate id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: String,
    pub medications: Option<String>,
}
