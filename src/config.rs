use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "IntakeTriage";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME").replace('-', "_"))
}

/// Get the application data directory
/// ~/IntakeTriage/ on all platforms (user-visible by design)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("IntakeTriage")
}

/// Path of the intake database file
pub fn database_path() -> PathBuf {
    app_data_dir().join("intake.db")
}

/// Base URL of the local Ollama instance serving both generation and embeddings
pub fn ollama_base_url() -> String {
    std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| "http://localhost:11434".to_string())
}

/// Generation model used for triage insight requests
pub fn generation_model() -> String {
    std::env::var("TRIAGE_GENERATION_MODEL").unwrap_or_else(|_| "medgemma".to_string())
}

/// Embedding model used for symptom similarity queries
pub fn embedding_model() -> String {
    std::env::var("TRIAGE_EMBEDDING_MODEL").unwrap_or_else(|_| "nomic-embed-text".to_string())
}
