use rusqlite::Connection;

use super::similarity::cosine_similarity;
use super::types::{DiagnosisCandidate, DiagnosisIndex, EmbeddingModel, IndexHit};
use super::TriageError;
use crate::db::repository;

/// Neighbors requested from the index per query.
const NEIGHBOR_POOL: usize = 10;
/// How many of those are rescored against the query embedding.
const RESCORE_TOP: usize = 5;
/// Minimum cosine similarity for a candidate to survive.
const SCORE_THRESHOLD: f32 = 0.85;

/// Canonical form of a free-text symptom list: comma-split, trimmed,
/// lowercased, lexicographically sorted, rejoined. Symptom lists differing
/// only in order, case, or whitespace embed identically.
///
/// Returns `None` for empty/whitespace-only input.
pub fn canonicalize_symptoms(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut tokens: Vec<String> = trimmed
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .collect();
    tokens.sort();
    Some(tokens.join(","))
}

/// Retrieve candidate diagnoses for a symptom description.
///
/// Empty input short-circuits to an empty list without touching the
/// embedder or the index. Each neighbor is rescored with cosine similarity
/// against the query embedding — the index's own relevance ordering is not
/// trusted for the final ranking.
pub fn retrieve_candidates(
    symptoms: &str,
    embedder: &dyn EmbeddingModel,
    index: &dyn DiagnosisIndex,
) -> Result<Vec<DiagnosisCandidate>, TriageError> {
    let canonical = match canonicalize_symptoms(symptoms) {
        Some(c) => c,
        None => return Ok(Vec::new()),
    };

    let query = embedder.embed(&canonical)?;
    let hits = index.nearest_neighbors(&query, NEIGHBOR_POOL)?;

    let mut candidates: Vec<DiagnosisCandidate> = hits
        .into_iter()
        .take(RESCORE_TOP)
        .map(|hit| DiagnosisCandidate {
            score: cosine_similarity(&query, &hit.embedding),
            description: hit.description,
            tests: hit.tests,
        })
        .filter(|c| c.score > SCORE_THRESHOLD)
        .collect();

    // Stable sort: ties keep the index's relevance order.
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    Ok(candidates)
}

/// In-memory diagnosis index for tests and small seeded deployments.
/// Relevance metric: Euclidean distance, nearest first — deliberately not
/// the scorer's metric, so the rescore in `retrieve_candidates` matters.
pub struct InMemoryDiagnosisIndex {
    entries: Vec<IndexHit>,
}

impl InMemoryDiagnosisIndex {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn add(&mut self, description: &str, tests: &[&str], embedding: Vec<f32>) {
        self.entries.push(IndexHit {
            embedding,
            description: description.to_string(),
            tests: tests.iter().map(|t| t.to_string()).collect(),
        });
    }
}

impl Default for InMemoryDiagnosisIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisIndex for InMemoryDiagnosisIndex {
    fn nearest_neighbors(&self, query: &[f32], k: usize) -> Result<Vec<IndexHit>, TriageError> {
        Ok(rank_by_distance(self.entries.iter().cloned(), query, k))
    }
}

/// Diagnosis index over the `reference_diagnoses` table. Brute-force scan;
/// reference sets are small enough that this stays well under the latency
/// of the embedding call itself.
pub struct SqliteDiagnosisIndex<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteDiagnosisIndex<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl DiagnosisIndex for SqliteDiagnosisIndex<'_> {
    fn nearest_neighbors(&self, query: &[f32], k: usize) -> Result<Vec<IndexHit>, TriageError> {
        let stored = repository::all_reference_diagnoses(self.conn)
            .map_err(|e| TriageError::IndexSearch(e.to_string()))?;

        Ok(rank_by_distance(
            stored.into_iter().map(|d| IndexHit {
                embedding: d.embedding,
                description: d.description,
                tests: d.tests,
            }),
            query,
            k,
        ))
    }
}

fn rank_by_distance(
    entries: impl Iterator<Item = IndexHit>,
    query: &[f32],
    k: usize,
) -> Vec<IndexHit> {
    let mut scored: Vec<(f32, IndexHit)> = entries
        .map(|hit| (euclidean_distance(query, &hit.embedding), hit))
        .collect();

    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    scored.into_iter().take(k).map(|(_, hit)| hit).collect()
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::MAX;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
