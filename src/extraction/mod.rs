//! Notice extraction — the collaborator that turns raw notice text into
//! structured fields.
//!
//! The core only depends on the [`Extractor`] contract; [`LlmExtractor`] is
//! the prompt-driven implementation. Tests substitute in-memory stubs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ExtractionError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// Max characters of notice text sent to the model.
const NOTICE_PREVIEW_CHARS: usize = 4000;

// ── Extract schema ──────────────────────────────────────────────────

/// Structured fields extracted from a notice message.
///
/// Every field is optional: the extractor records what the notice states and
/// nothing more. Downstream policy treats a missing field as "criterion not
/// met", never as an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoticeExtract {
    pub date_of_notice: Option<NaiveDate>,
    /// Entity the notice is addressed to.
    pub entity_name: Option<String>,
    pub entity_phone: Option<String>,
    pub entity_email: Option<String>,
    pub project_id: Option<String>,
    pub site_location: Option<String>,
    /// Short snake_case category, e.g. "safety_violation".
    pub violation_type: Option<String>,
    pub required_changes: Option<String>,
    pub compliance_deadline: Option<NaiveDate>,
    /// Largest monetary penalty named in the notice.
    pub max_potential_fine: Option<Decimal>,
}

// ── Collaborator contract ───────────────────────────────────────────

/// Extraction collaborator. Any implementation satisfying this contract is
/// acceptable to the workflow.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, notice: &str) -> Result<NoticeExtract, ExtractionError>;
}

// ── LLM-backed implementation ───────────────────────────────────────

/// Prompt-driven extractor over an LLM provider.
pub struct LlmExtractor {
    llm: Arc<dyn LlmProvider>,
    max_tokens: u32,
    temperature: f32,
}

impl LlmExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm, max_tokens: 1024, temperature: 0.0 }
    }

    pub fn with_limits(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, notice: &str) -> Result<NoticeExtract, ExtractionError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_extract_system_prompt()),
            ChatMessage::user(build_extract_user_prompt(notice)),
        ])
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let response = self.llm.complete(request).await?;
        if response.content.trim().is_empty() {
            return Err(ExtractionError::Empty);
        }

        parse_extract_response(&response.content)
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_extract_system_prompt() -> String {
    "You extract structured fields from regulatory notice emails.\n\n\
     Respond with ONLY a JSON object:\n\
     {\"date_of_notice\": \"YYYY-MM-DD\", \"entity_name\": \"...\", \
     \"entity_phone\": \"...\", \"entity_email\": \"...\", \"project_id\": \"...\", \
     \"site_location\": \"...\", \"violation_type\": \"...\", \
     \"required_changes\": \"...\", \"compliance_deadline\": \"YYYY-MM-DD\", \
     \"max_potential_fine\": 0.0}\n\n\
     Rules:\n\
     - Use null for any field the notice does not state\n\
     - violation_type is a short snake_case category (e.g. \"safety_violation\")\n\
     - max_potential_fine is the largest dollar amount the notice threatens, as a number\n\
     - Dates must be ISO format (YYYY-MM-DD)"
        .to_string()
}

fn build_extract_user_prompt(notice: &str) -> String {
    // Truncated for token efficiency.
    let preview: String = notice.chars().take(NOTICE_PREVIEW_CHARS).collect();
    format!("Notice message:\n{preview}")
}

// ── Response parsing ────────────────────────────────────────────────

/// Raw shape of the model's JSON, before field-level coercion.
#[derive(Debug, Deserialize)]
struct RawExtract {
    #[serde(default)]
    date_of_notice: Option<String>,
    #[serde(default)]
    entity_name: Option<String>,
    #[serde(default)]
    entity_phone: Option<String>,
    #[serde(default)]
    entity_email: Option<String>,
    #[serde(default)]
    project_id: Option<serde_json::Value>,
    #[serde(default)]
    site_location: Option<String>,
    #[serde(default)]
    violation_type: Option<String>,
    #[serde(default)]
    required_changes: Option<String>,
    #[serde(default)]
    compliance_deadline: Option<String>,
    #[serde(default)]
    max_potential_fine: Option<f64>,
}

/// Parse the model's output into a [`NoticeExtract`].
fn parse_extract_response(raw: &str) -> Result<NoticeExtract, ExtractionError> {
    let json = extract_json_object(raw);
    let parsed: RawExtract = serde_json::from_str(json)
        .map_err(|e| ExtractionError::Schema { reason: e.to_string() })?;

    Ok(NoticeExtract {
        date_of_notice: parsed.date_of_notice.as_deref().and_then(parse_date),
        entity_name: parsed.entity_name,
        entity_phone: parsed.entity_phone,
        entity_email: parsed.entity_email,
        project_id: parsed.project_id.and_then(coerce_id),
        site_location: parsed.site_location,
        violation_type: parsed.violation_type,
        required_changes: parsed.required_changes,
        compliance_deadline: parsed.compliance_deadline.as_deref().and_then(parse_date),
        max_potential_fine: parsed.max_potential_fine.and_then(Decimal::from_f64),
    })
}

/// Pull a JSON object out of model output that may wrap it in markdown
/// fences or prose.
fn extract_json_object(text: &str) -> &str {
    let trimmed = text.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(raw, "Unparseable date in extract, dropping field");
            None
        }
    }
}

/// Models sometimes emit identifiers as numbers; keep them as strings.
fn coerce_id(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_full_payload() {
        let raw = r#"{
            "date_of_notice": "2024-10-15",
            "entity_name": "Blue Ridge Construction",
            "entity_phone": "(214) 555-0199",
            "entity_email": "compliance@blueridge.example",
            "project_id": "111232345",
            "site_location": "Dallas, TX",
            "violation_type": "safety_violation",
            "required_changes": "Install guard rails on all scaffolding",
            "compliance_deadline": "2024-11-10",
            "max_potential_fine": 25000.0
        }"#;

        let extract = parse_extract_response(raw).unwrap();
        assert_eq!(extract.violation_type.as_deref(), Some("safety_violation"));
        assert_eq!(extract.project_id.as_deref(), Some("111232345"));
        assert_eq!(extract.max_potential_fine, Some(dec!(25000)));
        assert_eq!(
            extract.date_of_notice,
            NaiveDate::from_ymd_opt(2024, 10, 15)
        );
        assert_eq!(
            extract.compliance_deadline,
            NaiveDate::from_ymd_opt(2024, 11, 10)
        );
    }

    #[test]
    fn parses_markdown_fenced_payload() {
        let raw = "Here is the extraction:\n```json\n{\"violation_type\": \"late_shipment\", \"max_potential_fine\": 500}\n```";
        let extract = parse_extract_response(raw).unwrap();
        assert_eq!(extract.violation_type.as_deref(), Some("late_shipment"));
        assert_eq!(extract.max_potential_fine, Some(dec!(500)));
    }

    #[test]
    fn tolerates_nulls_and_missing_fields() {
        let raw = r#"{"violation_type": null, "entity_name": "Acme"}"#;
        let extract = parse_extract_response(raw).unwrap();
        assert_eq!(extract.entity_name.as_deref(), Some("Acme"));
        assert!(extract.violation_type.is_none());
        assert!(extract.max_potential_fine.is_none());
        assert!(extract.date_of_notice.is_none());
    }

    #[test]
    fn rejects_non_json_output() {
        let result = parse_extract_response("I could not parse this notice.");
        assert!(matches!(result, Err(ExtractionError::Schema { .. })));
    }

    #[test]
    fn numeric_project_id_coerced_to_string() {
        let raw = r#"{"project_id": 111232345}"#;
        let extract = parse_extract_response(raw).unwrap();
        assert_eq!(extract.project_id.as_deref(), Some("111232345"));
    }

    #[test]
    fn unparseable_date_dropped_not_fatal() {
        let raw = r#"{"date_of_notice": "October 15th", "violation_type": "safety_violation"}"#;
        let extract = parse_extract_response(raw).unwrap();
        assert!(extract.date_of_notice.is_none());
        assert_eq!(extract.violation_type.as_deref(), Some("safety_violation"));
    }

    #[test]
    fn json_object_found_inside_prose() {
        let text = "Sure! {\"a\": 1} Hope that helps.";
        assert_eq!(extract_json_object(text), "{\"a\": 1}");
    }

    #[test]
    fn extract_system_prompt_names_all_fields() {
        let prompt = build_extract_system_prompt();
        assert!(prompt.contains("violation_type"));
        assert!(prompt.contains("max_potential_fine"));
        assert!(prompt.contains("compliance_deadline"));
        assert!(prompt.contains("null"));
    }

    #[test]
    fn user_prompt_truncates_long_notices() {
        let notice = "x".repeat(10_000);
        let prompt = build_extract_user_prompt(&notice);
        assert!(prompt.len() < NOTICE_PREVIEW_CHARS + 100);
    }
}
