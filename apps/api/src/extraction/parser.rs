//! Field parsing backend, the AI formatting/parsing collaborator.
//!
//! Treated as a request/response service: never assumed deterministic, never
//! assumed to return a complete record. `AppState` holds an `Arc<dyn FieldParser>`,
//! chosen at startup by whether an API key is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::extraction::prompts::{FIELD_PARSE_PROMPT, FIELD_PARSE_SYSTEM};
use crate::extraction::text::{extract_fields, level_from_text};
use crate::extraction::text_confidence;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::models::extracted::ExtractedData;
use crate::models::posting::DEFAULT_CONFIDENCE;

/// Upper bound on text sent to the backend; postings past this are boilerplate.
const MAX_PROMPT_TEXT_CHARS: usize = 12_000;

/// Partial fields with a per-field confidence keyed by camelCase field name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedFields {
    pub fields: ExtractedData,
    pub confidence: HashMap<String, f32>,
}

impl ParsedFields {
    /// The fields whose confidence reaches `min_confidence`. A field the backend
    /// returned without a score is taken at `DEFAULT_CONFIDENCE`.
    pub fn accepted(&self, min_confidence: f32) -> ExtractedData {
        let mut fields = self.fields.clone();
        let score = |name: &str| {
            self.confidence
                .get(name)
                .copied()
                .unwrap_or(DEFAULT_CONFIDENCE)
        };
        macro_rules! gate {
            ($($field:ident => $name:literal),* $(,)?) => {
                $(if score($name) < min_confidence {
                    fields.$field = None;
                })*
            };
        }
        gate!(
            title => "title",
            company => "company",
            location => "location",
            work_model => "workModel",
            experience_level => "experienceLevel",
            department => "department",
            employment_type => "employmentType",
            min_salary => "minSalary",
            max_salary => "maxSalary",
            salary_currency => "salaryCurrency",
            skills => "skills",
            requirements => "requirements",
            responsibilities => "responsibilities",
            timeline => "timeline",
            non_negotiables => "nonNegotiables",
            flexible => "flexible",
        );
        fields
    }
}

#[async_trait]
pub trait FieldParser: Send + Sync {
    async fn parse(&self, text: &str, hints: &ExtractedData) -> Result<ParsedFields, AppError>;

    /// Backend label for logs.
    fn name(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmFieldParser
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmFieldParser {
    llm: LlmClient,
}

impl LlmFieldParser {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl FieldParser for LlmFieldParser {
    async fn parse(&self, text: &str, hints: &ExtractedData) -> Result<ParsedFields, AppError> {
        let text: String = text.chars().take(MAX_PROMPT_TEXT_CHARS).collect();
        let hints = serde_json::to_string(hints).map_err(|e| AppError::Internal(e.into()))?;
        let prompt = FIELD_PARSE_PROMPT
            .replace("{hints}", &hints)
            .replace("{no_invention}", NO_INVENTION_INSTRUCTION)
            .replace("{text}", &text);
        let system = format!("{FIELD_PARSE_SYSTEM} {JSON_ONLY_SYSTEM}");

        let parsed: ParsedFields = self
            .llm
            .call_json(&prompt, &system)
            .await
            .map_err(|e| AppError::BackendUnavailable(e.to_string()))?;
        debug!("LLM parser returned {} scored fields", parsed.confidence.len());
        Ok(parsed)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicFieldParser (deterministic fallback)
// ────────────────────────────────────────────────────────────────────────────

/// Runs the free-text pass and scores every field it found with the record
/// confidence. Also reads a bare seniority word ("Senior", "mid-level"),
/// which short chat answers often are.
pub struct HeuristicFieldParser;

#[async_trait]
impl FieldParser for HeuristicFieldParser {
    async fn parse(&self, text: &str, _hints: &ExtractedData) -> Result<ParsedFields, AppError> {
        let mut fields = extract_fields(text);
        if fields.experience_level.is_none() {
            fields.experience_level = level_from_text(text);
        }
        let score = text_confidence(&fields);
        let filled = serde_json::to_value(&fields).map_err(|e| AppError::Internal(e.into()))?;
        let confidence = filled
            .as_object()
            .map(|map| {
                map.iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, _)| (k.clone(), score))
                    .collect()
            })
            .unwrap_or_default();
        Ok(ParsedFields { fields, confidence })
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::posting::WorkModel;

    #[test]
    fn test_accepted_drops_low_confidence_fields() {
        let parsed = ParsedFields {
            fields: ExtractedData {
                title: Some("Engineer".into()),
                company: Some("Maybe Corp".into()),
                min_salary: Some(100_000),
                ..ExtractedData::default()
            },
            confidence: HashMap::from([
                ("title".to_string(), 0.9),
                ("company".to_string(), 0.2),
            ]),
        };
        let accepted = parsed.accepted(0.5);
        assert_eq!(accepted.title.as_deref(), Some("Engineer"));
        assert_eq!(accepted.company, None);
        // unscored fields count at the default confidence
        assert_eq!(accepted.min_salary, Some(100_000));
        assert_eq!(parsed.accepted(0.7).min_salary, None);
    }

    #[test]
    fn test_parsed_fields_deserialize_from_backend_json() {
        let parsed: ParsedFields = serde_json::from_str(
            r#"{"fields": {"title": "Designer", "workModel": "Hybrid"}, "confidence": {"title": 0.95}}"#,
        )
        .unwrap();
        assert_eq!(parsed.fields.work_model, Some(WorkModel::Hybrid));
        assert_eq!(parsed.confidence.get("title"), Some(&0.95));
    }

    #[tokio::test]
    async fn test_heuristic_parser_scores_found_fields() {
        let parsed = HeuristicFieldParser
            .parse("Senior, fully remote", &ExtractedData::default())
            .await
            .unwrap();
        assert_eq!(parsed.fields.experience_level.as_deref(), Some("Senior"));
        assert_eq!(parsed.fields.work_model, Some(WorkModel::Remote));
        assert!(parsed.confidence.contains_key("workModel"));
        assert!(!parsed.confidence.contains_key("title"));
        assert!(parsed.accepted(0.5).work_model.is_some());
    }
}
