use super::types::{DiagnosisCandidate, PatientContext};

pub const TRIAGE_SYSTEM_PROMPT: &str = r#"You are an AI assistant supporting triage decisions in a hospital emergency setting. You will receive structured patient intake information, including some or all of: reported symptoms, medical history, recent events, past diagnoses, a list of candidate diagnoses, and a list of suggested diagnostic tests.

YOUR TASK:
1. Select the two most appropriate diagnoses from the candidate list. If none fit, suggest more appropriate ones using only the patient's symptoms and medical history.
2. Provide a short, clear clinical justification for the chosen diagnoses, based on the patient's symptoms and medical history. Do not mention the given candidates.
3. Select relevant tests from the suggested list. If none are suitable, suggest better ones or leave the list empty.
4. Assign a severity score from 1 to 3 based only on symptoms and urgency. Do NOT infer severity from the diagnosis alone.

OUTPUT FORMAT:
Return ONLY a valid JSON object in the exact format:
{
  "severity": 1 | 2 | 3,
  "diagnoses": ["Diagnosis A", "Diagnosis B"],
  "reasons": "Concise explanation based on symptoms and history.",
  "tests": ["Test A", "Test B"]
}

Do not include any explanation, markdown, formatting, or extra text. Only the JSON object."#;

/// Build the intake prompt. Each labeled section is included only when it
/// has content, and each ends with a period so the model treats it as one
/// closed field.
pub fn build_intake_prompt(
    ctx: &PatientContext,
    candidates: &[DiagnosisCandidate],
    suggested_tests: &[String],
) -> String {
    let mut prompt = String::from("Patient Intake Data:\n\n");

    prompt.push_str(&format!("Symptoms: {}.\n", ctx.symptoms));

    if let Some(history) = ctx.history.as_deref().filter(|h| !h.is_empty()) {
        prompt.push_str(&format!("Medical History: {history}.\n"));
    }

    if !ctx.past_diagnoses.is_empty() {
        prompt.push_str(&format!(
            "Past Diagnoses: {}.\n",
            ctx.past_diagnoses.join(", ")
        ));
    }

    if let Some(event) = ctx.recent_event.as_deref().filter(|e| !e.is_empty()) {
        prompt.push_str(&format!("Recent Event: {event}.\n"));
    }

    if !candidates.is_empty() {
        let descriptions: Vec<&str> = candidates.iter().map(|c| c.description.as_str()).collect();
        prompt.push_str(&format!(
            "Candidate Diagnoses: {}.\n",
            descriptions.join(", ")
        ));
    }

    if !suggested_tests.is_empty() {
        prompt.push_str(&format!("Suggested Tests: {}.\n", suggested_tests.join(", ")));
    }

    prompt.push_str(
        "\nTriage Severity Definitions:\n\
         1 = Immediate attention — critical or life-threatening\n\
         2 = High priority — serious, but can wait briefly\n\
         3 = Lower priority — stable, non-urgent\n\
         \n\
         Instructions:\n\
         - Base the diagnosis selection on both the reported symptoms and the patient's history.\n\
         - Use this same information to justify your reasoning.\n\
         - Do not assume the diagnosis should determine severity — base severity only on urgency of the presented condition.\n\
         \n\
         Return only the JSON object.",
    );

    prompt
}
