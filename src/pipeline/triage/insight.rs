use super::parser::parse_triage_response;
use super::prompt::{build_intake_prompt, TRIAGE_SYSTEM_PROMPT};
use super::types::{DiagnosisCandidate, DiagnosisHistory, LlmClient, PatientContext, TriageInsight};
use super::TriageError;

/// Ask the language model for a triage insight over the retrieved
/// candidates.
///
/// The model is invoked once, at temperature 0, with the fixed system
/// prompt and the assembled intake prompt. A transport failure propagates;
/// a malformed response (no JSON, invalid JSON, wrong field types) is
/// logged and replaced by the deterministic fallback. The returned insight
/// is always structurally valid.
#[allow(clippy::too_many_arguments)]
pub fn request_insight(
    symptoms: &str,
    candidates: &[DiagnosisCandidate],
    suggested_tests: &[String],
    patient_id: &str,
    history: Option<&str>,
    recent_event: Option<&str>,
    llm: &dyn LlmClient,
    past: &dyn DiagnosisHistory,
) -> Result<TriageInsight, TriageError> {
    let past_diagnoses: Vec<String> = past
        .past_diagnoses_for(patient_id)?
        .into_iter()
        .filter(|d| !d.trim().is_empty())
        .collect();

    let ctx = PatientContext {
        symptoms: symptoms.to_string(),
        history: history.map(str::to_string),
        recent_event: recent_event.map(str::to_string),
        patient_id: patient_id.to_string(),
        past_diagnoses,
    };

    let prompt = build_intake_prompt(&ctx, candidates, suggested_tests);
    let response = llm.complete(TRIAGE_SYSTEM_PROMPT, &prompt, 0.0)?;

    match parse_triage_response(&response) {
        Ok(insight) => Ok(insight),
        Err(e) => {
            tracing::warn!(patient_id, error = %e, "Model response failed validation, using fallback insight");
            Ok(fallback_insight(candidates))
        }
    }
}

/// Deterministic substitute when the model's answer cannot be validated:
/// severity 2, the top two candidates by score, no tests, no reasoning.
/// Never fails, regardless of how few candidates exist.
pub fn fallback_insight(candidates: &[DiagnosisCandidate]) -> TriageInsight {
    let mut ranked: Vec<&DiagnosisCandidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    TriageInsight {
        severity: 2,
        diagnoses: ranked
            .into_iter()
            .take(2)
            .map(|c| c.description.clone())
            .collect(),
        tests: Vec::new(),
        reasons: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct MockLlm {
        response: String,
        calls: RefCell<Vec<(String, String, f32)>>,
    }

    impl MockLlm {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl LlmClient for MockLlm {
        fn complete(
            &self,
            system: &str,
            prompt: &str,
            temperature: f32,
        ) -> Result<String, TriageError> {
            self.calls
                .borrow_mut()
                .push((system.to_string(), prompt.to_string(), temperature));
            Ok(self.response.clone())
        }
    }

    struct FixedHistory(Vec<String>);

    impl DiagnosisHistory for FixedHistory {
        fn past_diagnoses_for(&self, _patient_id: &str) -> Result<Vec<String>, TriageError> {
            Ok(self.0.clone())
        }
    }

    fn make_candidates() -> Vec<DiagnosisCandidate> {
        vec![
            DiagnosisCandidate {
                description: "Asthma".into(),
                score: 0.90,
                tests: vec!["spirometry".into()],
            },
            DiagnosisCandidate {
                description: "Angina".into(),
                score: 0.95,
                tests: vec!["ECG".into()],
            },
            DiagnosisCandidate {
                description: "Anxiety".into(),
                score: 0.86,
                tests: vec![],
            },
        ]
    }

    #[test]
    fn valid_model_response_passes_through() {
        let llm = MockLlm::new(
            r#"{"severity": 1, "diagnoses": ["Angina"], "reasons": "Exertional chest pain.", "tests": ["ECG"]}"#,
        );
        let history = FixedHistory(vec![]);

        let insight = request_insight(
            "chest pain",
            &make_candidates(),
            &[],
            "P-1",
            None,
            None,
            &llm,
            &history,
        )
        .unwrap();

        assert_eq!(insight.severity, 1);
        assert_eq!(insight.diagnoses, vec!["Angina"]);
        assert_eq!(insight.tests, vec!["ECG"]);
    }

    #[test]
    fn model_invoked_once_at_temperature_zero() {
        let llm = MockLlm::new(r#"{"severity": 2, "diagnoses": [], "tests": []}"#);
        let history = FixedHistory(vec![]);

        request_insight("fever", &[], &[], "P-1", None, None, &llm, &history).unwrap();

        let calls = llm.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (system, prompt, temperature) = &calls[0];
        assert_eq!(*temperature, 0.0);
        assert_eq!(system, TRIAGE_SYSTEM_PROMPT);
        assert!(prompt.contains("Symptoms: fever."));
    }

    #[test]
    fn past_diagnoses_reach_the_prompt_without_blanks() {
        let llm = MockLlm::new(r#"{"severity": 2, "diagnoses": [], "tests": []}"#);
        let history = FixedHistory(vec!["Asthma".into(), "  ".into(), "Hypertension".into()]);

        request_insight("fever", &[], &[], "P-1", None, None, &llm, &history).unwrap();

        let calls = llm.calls.borrow();
        let (_, prompt, _) = &calls[0];
        assert!(prompt.contains("Past Diagnoses: Asthma, Hypertension."));
    }

    #[test]
    fn non_json_response_falls_back_to_top_candidates() {
        let llm = MockLlm::new("I'm sorry, I cannot help with that request.");
        let history = FixedHistory(vec![]);

        let insight = request_insight(
            "chest pain",
            &make_candidates(),
            &[],
            "P-1",
            None,
            None,
            &llm,
            &history,
        )
        .unwrap();

        assert_eq!(insight.severity, 2);
        // Top two by score, descending: Angina (0.95), Asthma (0.90)
        assert_eq!(insight.diagnoses, vec!["Angina", "Asthma"]);
        assert!(insight.tests.is_empty());
        assert!(insight.reasons.is_none());
    }

    #[test]
    fn type_invalid_response_falls_back_instead_of_erroring() {
        let llm = MockLlm::new(r#"{"severity": "high", "diagnoses": ["X"], "tests": []}"#);
        let history = FixedHistory(vec![]);

        let insight = request_insight(
            "chest pain",
            &make_candidates(),
            &[],
            "P-1",
            None,
            None,
            &llm,
            &history,
        )
        .unwrap();

        assert_eq!(insight.severity, 2);
        assert_eq!(insight.diagnoses, vec!["Angina", "Asthma"]);
    }

    #[test]
    fn fallback_with_no_candidates_is_still_valid() {
        let llm = MockLlm::new("not json");
        let history = FixedHistory(vec![]);

        let insight =
            request_insight("fever", &[], &[], "P-1", None, None, &llm, &history).unwrap();

        assert_eq!(insight.severity, 2);
        assert!(insight.diagnoses.is_empty());
        assert!(insight.tests.is_empty());
        assert!(insight.reasons.is_none());
    }

    #[test]
    fn fallback_with_single_candidate_returns_one_diagnosis() {
        let candidates = vec![DiagnosisCandidate {
            description: "Migraine".into(),
            score: 0.91,
            tests: vec![],
        }];

        let insight = fallback_insight(&candidates);
        assert_eq!(insight.diagnoses, vec!["Migraine"]);
        assert_eq!(insight.severity, 2);
    }

    #[test]
    fn fallback_does_not_reorder_input() {
        let candidates = make_candidates();
        fallback_insight(&candidates);
        // Input slice order untouched
        assert_eq!(candidates[0].description, "Asthma");
    }
}
