use super::insight::request_insight;
use super::retrieval::retrieve_candidates;
use super::types::{
    DiagnosisCandidate, DiagnosisHistory, DiagnosisIndex, EmbeddingModel, LlmClient, TriageInsight,
};
use super::TriageError;

/// Full triage pipeline.
///
/// Coordinates: retrieve candidates → suggest tests → request insight.
/// Stateless between invocations; all state lives in the collaborators.
pub struct TriagePipeline<'a, E: EmbeddingModel, I: DiagnosisIndex, L: LlmClient, H: DiagnosisHistory>
{
    embedder: &'a E,
    index: &'a I,
    llm: &'a L,
    history: &'a H,
}

impl<'a, E: EmbeddingModel, I: DiagnosisIndex, L: LlmClient, H: DiagnosisHistory>
    TriagePipeline<'a, E, I, L, H>
{
    pub fn new(embedder: &'a E, index: &'a I, llm: &'a L, history: &'a H) -> Self {
        Self {
            embedder,
            index,
            llm,
            history,
        }
    }

    /// Produce a triage insight for one intake.
    ///
    /// Empty/whitespace symptoms yield `Ok(None)` without invoking any
    /// collaborator. Failures of the embedding, index, history, or model
    /// transport propagate; a malformed model *response* does not (the
    /// insight requester degrades to its deterministic fallback).
    pub fn produce_triage(
        &self,
        symptoms: &str,
        patient_id: &str,
        history: Option<&str>,
        recent_event: Option<&str>,
    ) -> Result<Option<TriageInsight>, TriageError> {
        let symptoms = symptoms.trim();
        if symptoms.is_empty() {
            return Ok(None);
        }

        let candidates = retrieve_candidates(symptoms, self.embedder, self.index)?;
        let suggestions = suggested_tests(&candidates);

        let insight = request_insight(
            symptoms,
            &candidates,
            &suggestions,
            patient_id,
            history,
            recent_event,
            self.llm,
            self.history,
        )?;

        Ok(Some(insight))
    }
}

/// One suggestion string per candidate: its tests, each capitalized at the
/// first character, joined with ", ". Candidates without tests contribute
/// nothing.
fn suggested_tests(candidates: &[DiagnosisCandidate]) -> Vec<String> {
    candidates
        .iter()
        .filter(|c| !c.tests.is_empty())
        .map(|c| {
            c.tests
                .iter()
                .map(|t| capitalize_first(t))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect()
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::triage::retrieval::InMemoryDiagnosisIndex;
    use std::cell::RefCell;

    struct MockEmbedder {
        vector: Vec<f32>,
    }

    impl EmbeddingModel for MockEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, TriageError> {
            Ok(self.vector.clone())
        }
    }

    struct MockLlm {
        response: String,
        prompts: RefCell<Vec<String>>,
    }

    impl MockLlm {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl LlmClient for MockLlm {
        fn complete(
            &self,
            _system: &str,
            prompt: &str,
            _temperature: f32,
        ) -> Result<String, TriageError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(self.response.clone())
        }
    }

    struct EmptyHistory;

    impl DiagnosisHistory for EmptyHistory {
        fn past_diagnoses_for(&self, _patient_id: &str) -> Result<Vec<String>, TriageError> {
            Ok(Vec::new())
        }
    }

    struct UnreachableLlm;

    impl LlmClient for UnreachableLlm {
        fn complete(&self, _: &str, _: &str, _: f32) -> Result<String, TriageError> {
            panic!("LLM invoked for empty symptoms");
        }
    }

    /// Index entries at fixed cosine similarity against query [1, 0]:
    /// each embedding is (cos θ, sin θ) for the wanted score.
    fn scenario_index() -> InMemoryDiagnosisIndex {
        let mut index = InMemoryDiagnosisIndex::new();
        index.add("Angina", &["ECG"], vec![0.95, 0.312_249_9]);
        index.add("Asthma", &["spirometry", "peak flow"], vec![0.90, 0.435_889_9]);
        index.add("Anxiety", &[], vec![0.86, 0.510_294_0]);
        index
    }

    #[test]
    fn empty_symptoms_produce_no_insight() {
        let embedder = MockEmbedder { vector: vec![1.0, 0.0] };
        let index = InMemoryDiagnosisIndex::new();
        let llm = UnreachableLlm;
        let history = EmptyHistory;

        let pipeline = TriagePipeline::new(&embedder, &index, &llm, &history);

        assert!(pipeline.produce_triage("", "P-1", None, None).unwrap().is_none());
        assert!(pipeline.produce_triage("   ", "P-1", None, None).unwrap().is_none());
    }

    #[test]
    fn valid_model_output_is_returned_unchanged() {
        let embedder = MockEmbedder { vector: vec![1.0, 0.0] };
        let index = scenario_index();
        let llm = MockLlm::new(
            r#"{"severity": 1, "diagnoses": ["Angina"], "reasons": "Exertional chest pain with dyspnea.", "tests": ["ECG"]}"#,
        );
        let history = EmptyHistory;

        let pipeline = TriagePipeline::new(&embedder, &index, &llm, &history);
        let insight = pipeline
            .produce_triage("chest pain, shortness of breath", "P-1", None, None)
            .unwrap()
            .unwrap();

        assert_eq!(
            insight,
            TriageInsight {
                severity: 1,
                diagnoses: vec!["Angina".into()],
                tests: vec!["ECG".into()],
                reasons: Some("Exertional chest pain with dyspnea.".into()),
            }
        );
    }

    #[test]
    fn candidates_and_capitalized_tests_reach_the_prompt() {
        let embedder = MockEmbedder { vector: vec![1.0, 0.0] };
        let index = scenario_index();
        let llm = MockLlm::new(r#"{"severity": 2, "diagnoses": [], "tests": []}"#);
        let history = EmptyHistory;

        let pipeline = TriagePipeline::new(&embedder, &index, &llm, &history);
        pipeline
            .produce_triage("chest pain, shortness of breath", "P-1", None, None)
            .unwrap();

        let prompts = llm.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        // Candidates in descending score order
        assert!(prompts[0].contains("Candidate Diagnoses: Angina, Asthma, Anxiety."));
        // One suggestion per candidate with tests, first letters capitalized;
        // the test-less candidate contributes nothing
        assert!(prompts[0].contains("Suggested Tests: ECG, Spirometry, Peak flow."));
    }

    #[test]
    fn malformed_model_output_degrades_to_fallback_end_to_end() {
        let embedder = MockEmbedder { vector: vec![1.0, 0.0] };
        let index = scenario_index();
        let llm = MockLlm::new("Unfortunately I can only reply in prose today.");
        let history = EmptyHistory;

        let pipeline = TriagePipeline::new(&embedder, &index, &llm, &history);
        let insight = pipeline
            .produce_triage("chest pain, shortness of breath", "P-1", None, None)
            .unwrap()
            .unwrap();

        assert_eq!(insight.severity, 2);
        assert_eq!(insight.diagnoses, vec!["Angina", "Asthma"]);
        assert!(insight.tests.is_empty());
    }

    #[test]
    fn suggested_tests_capitalizes_and_groups_by_candidate() {
        let candidates = vec![
            DiagnosisCandidate {
                description: "A".into(),
                score: 0.9,
                tests: vec!["ecg".into(), "troponin".into()],
            },
            DiagnosisCandidate {
                description: "B".into(),
                score: 0.88,
                tests: vec![],
            },
            DiagnosisCandidate {
                description: "C".into(),
                score: 0.87,
                tests: vec!["chest x-ray".into()],
            },
        ];

        assert_eq!(
            suggested_tests(&candidates),
            vec!["Ecg, Troponin".to_string(), "Chest x-ray".to_string()]
        );
    }

    #[test]
    fn capitalize_first_handles_edge_cases() {
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("x"), "X");
        assert_eq!(capitalize_first("éCG"), "ÉCG");
    }
}
