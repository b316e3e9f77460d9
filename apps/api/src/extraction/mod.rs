//! Structured Extractor: raw content (HTML, pasted text, scraped records) to a
//! canonical `JobPosting` with confidence and provenance.
//!
//! `extract` never fails. Markup is tried first; the text pass fills whatever
//! it can identify; confidence is a function of which fields ended up populated.

pub mod handlers;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod salary;
pub mod structured;
pub mod text;

use serde::Serialize;

use crate::extraction::salary::parse_salary_range;
use crate::extraction::structured::find_job_posting;
use crate::extraction::text::{extract_fields, looks_like_html, visible_text};
use crate::fetch::origin_of;
use crate::models::extracted::ExtractedData;
use crate::models::posting::{
    dedup_preserving_case, is_filled, JobPosting, RequiredField, WorkModel,
};
use crate::models::scraped::ScrapedPosting;

pub const STRUCTURED_COMPLETE_CONFIDENCE: f32 = 0.92;
pub const STRUCTURED_WITH_SALARY_CONFIDENCE: f32 = 0.95;
const TEXT_CONFIDENCE_FLOOR: f32 = 0.60;
const TEXT_CONFIDENCE_SPAN: f32 = 0.28;
const STRUCTURED_PARTIAL_BONUS: f32 = 0.04;
const STRUCTURED_PARTIAL_CAP: f32 = 0.89;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtractionMethod {
    /// Complete JSON-LD `JobPosting`; the text pass only filled lists.
    StructuredData,
    /// Markup present but incomplete; merged over the text pass.
    StructuredPartial,
    Text,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub posting: JobPosting,
    /// The accumulated partial record the posting was projected from.
    pub data: ExtractedData,
    /// Visible text the fields were read from, handed to the parsing backend.
    pub text: String,
    pub method: ExtractionMethod,
}

impl Extraction {
    pub fn missing_fields(&self) -> Vec<RequiredField> {
        self.posting.missing_fields()
    }

    /// Re-derives the posting after `data` changed, keeping method and provenance.
    pub fn rebuild(&mut self) {
        let confidence = confidence_for(self.method, &self.data);
        self.posting = self
            .data
            .to_posting(&self.posting.source, confidence, self.posting.from_url);
    }
}

/// Readable text of raw content: visible text for HTML, the input otherwise.
pub fn readable_text(content: &str) -> String {
    if looks_like_html(content) {
        visible_text(content)
    } else {
        content.trim().to_string()
    }
}

pub fn extract(content: &str, origin: &str, from_url: bool) -> Extraction {
    extract_document(content, looks_like_html(content), origin, from_url)
}

/// `extract` with the markup decision already made, e.g. from a response's
/// declared content type.
pub fn extract_document(content: &str, markup: bool, origin: &str, from_url: bool) -> Extraction {
    let structured = markup.then(|| find_job_posting(content)).flatten();
    let text = if markup {
        visible_text(content)
    } else {
        content.trim().to_string()
    };

    let mut data = extract_fields(&text);
    let method = match structured {
        Some(found) => {
            if let Some(description) = found.description.as_deref() {
                data.merge(&extract_fields(&readable_text(description)));
            }
            data.merge(&found.data);
            if found.is_complete() {
                ExtractionMethod::StructuredData
            } else {
                ExtractionMethod::StructuredPartial
            }
        }
        None => ExtractionMethod::Text,
    };

    let confidence = confidence_for(method, &data);
    let posting = data.to_posting(origin, confidence, from_url);
    Extraction {
        posting,
        data,
        text,
        method,
    }
}

fn confidence_for(method: ExtractionMethod, data: &ExtractedData) -> f32 {
    match method {
        ExtractionMethod::StructuredData if data.min_salary.is_some() && data.max_salary.is_some() => {
            STRUCTURED_WITH_SALARY_CONFIDENCE
        }
        ExtractionMethod::StructuredData => STRUCTURED_COMPLETE_CONFIDENCE,
        ExtractionMethod::StructuredPartial => {
            (text_confidence(data) + STRUCTURED_PARTIAL_BONUS).min(STRUCTURED_PARTIAL_CAP)
        }
        ExtractionMethod::Text => text_confidence(data),
    }
}

/// `0.60 + 0.28 × f`, where `f` is the weighted fraction of populated fields.
/// Title and the salary band dominate since cards lean on them most.
pub fn text_confidence(data: &ExtractedData) -> f32 {
    let list = |items: &Option<Vec<String>>| items.as_ref().is_some_and(|v| !v.is_empty());
    let weights: [(bool, f32); 11] = [
        (is_filled(&data.title), 0.30),
        (data.min_salary.is_some(), 0.15),
        (data.max_salary.is_some(), 0.15),
        (data.work_model.is_some(), 0.15),
        (is_filled(&data.company), 0.10),
        (is_filled(&data.location), 0.05),
        (is_filled(&data.experience_level), 0.04),
        (list(&data.skills), 0.03),
        (list(&data.requirements), 0.01),
        (is_filled(&data.department), 0.01),
        (is_filled(&data.timeline), 0.01),
    ];
    let fraction: f32 = weights
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, w)| w)
        .sum();
    TEXT_CONFIDENCE_FLOOR + TEXT_CONFIDENCE_SPAN * fraction.min(1.0)
}

impl JobPosting {
    /// Canonical record from an already-scraped posting. Explicit fields win;
    /// the text pass over the description fills the rest.
    pub fn from_scraped(scraped: &ScrapedPosting) -> JobPosting {
        let description = scraped.description.as_deref().map(readable_text);
        let mut data = description
            .as_deref()
            .map(extract_fields)
            .unwrap_or_default();

        let mut explicit = ExtractedData {
            title: scraped.title.clone(),
            company: scraped.company.clone(),
            location: scraped.location.clone(),
            work_model: scraped.work_model.as_deref().and_then(WorkModel::detect),
            experience_level: scraped.experience_level.clone(),
            department: scraped.department.clone(),
            min_salary: scraped.min_salary,
            max_salary: scraped.max_salary,
            requirements: (!scraped.requirements.is_empty()).then(|| scraped.requirements.clone()),
            timeline: scraped.timeline.clone(),
            ..ExtractedData::default()
        };
        if explicit.min_salary.is_none() {
            if let Some(range) = scraped
                .salary
                .as_deref()
                .and_then(|s| parse_salary_range(&format!("salary {s}")))
            {
                explicit.min_salary = Some(range.min);
                explicit.max_salary = Some(range.max);
                explicit.salary_currency = range.currency;
            }
        }
        if explicit.work_model.is_none() {
            explicit.work_model = scraped.location.as_deref().and_then(WorkModel::detect);
        }

        let skills = dedup_preserving_case(
            scraped
                .skills
                .iter()
                .cloned()
                .chain(data.skills.take().unwrap_or_default()),
        );
        data.merge(&explicit);
        data.skills = (!skills.is_empty()).then_some(skills);

        let source = scraped
            .source
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| scraped.url.as_deref().and_then(origin_of))
            .unwrap_or_else(|| "scraped".to_string());
        let confidence = text_confidence(&data);
        data.to_posting(&source, confidence, scraped.url.is_some())
    }
}
