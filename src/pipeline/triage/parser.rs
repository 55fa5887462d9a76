use serde::Deserialize;

use super::types::TriageInsight;
use super::TriageError;

/// Parse a raw model response into a validated `TriageInsight`.
///
/// The model is instructed to answer with a bare JSON object, but replies
/// are tolerated with leading/trailing commentary: the first balanced
/// `{...}` region is extracted and parsed. Any failure — no region, invalid
/// JSON, wrong field types — is an error for the caller to handle.
pub fn parse_triage_response(response: &str) -> Result<TriageInsight, TriageError> {
    let json = extract_json_object(response).ok_or_else(|| {
        TriageError::MalformedResponse("No JSON object found in model response".into())
    })?;
    parse_insight(json)
}

/// Extract the first balanced `{...}` region from free-form model text.
///
/// Explicit bounded scanner rather than a regex: depth-counted from the
/// first `{`, skipping braces inside JSON strings (and escaped quotes
/// inside those). Returns `None` when no `{` exists or the region never
/// closes (truncated output).
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Wire shape of the model's answer. Deserializing through this enforces
/// the validation contract: `severity` numeric, `diagnoses` and `tests`
/// arrays of strings, `reasons` optional.
#[derive(Deserialize)]
struct RawInsight {
    severity: f64,
    diagnoses: Vec<String>,
    tests: Vec<String>,
    reasons: Option<String>,
}

fn parse_insight(json: &str) -> Result<TriageInsight, TriageError> {
    let raw: RawInsight =
        serde_json::from_str(json).map_err(|e| TriageError::JsonParsing(e.to_string()))?;

    // Normalize to the output invariants: severity in 1..=3, at most two
    // diagnoses.
    let severity = (raw.severity as i64).clamp(1, 3) as u8;
    let mut diagnoses = raw.diagnoses;
    diagnoses.truncate(2);

    Ok(TriageInsight {
        severity,
        diagnoses,
        tests: raw.tests,
        reasons: raw.reasons,
    })
}
