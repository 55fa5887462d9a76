pub mod types;
pub mod similarity;
pub mod retrieval;
pub mod prompt;
pub mod parser;
pub mod insight;
pub mod orchestrator;
pub mod ollama;

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Ollama is not running at {0}")]
    OllamaConnection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Diagnosis index search failed: {0}")]
    IndexSearch(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
