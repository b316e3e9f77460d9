//! Clarity scoring for role descriptions.
//!
//! The score grows with every populated required field; a placeholder value
//! ("TBD", "competitive", ...) counts for half.

use serde::Serialize;

use crate::conversation::state::Step;
use crate::models::posting::{JobPosting, RequiredField};

const PLACEHOLDERS: &[&str] = &[
    "tbd", "tba", "n/a", "na", "unknown", "competitive", "various", "etc", "-", "?",
];
const SHORT_INPUT_CHARS: usize = 40;
const PLACEHOLDER_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarityReport {
    /// 0–100.
    pub clarity: u8,
    pub issues: Vec<String>,
    pub strengths: Vec<String>,
    pub suggestions: Vec<String>,
    pub missing_fields: Vec<RequiredField>,
}

pub fn analyze(raw_input: &str, posting: &JobPosting) -> ClarityReport {
    let missing_fields = posting.missing_fields();
    let mut issues: Vec<String> = missing_fields
        .iter()
        .map(|f| format!("Missing {}", f.label()))
        .collect();

    let mut effective = 0.0_f32;
    for field in RequiredField::ALL {
        if !posting.has(field) {
            continue;
        }
        match placeholder_value(posting, field) {
            Some(value) => {
                effective += PLACEHOLDER_WEIGHT;
                issues.push(format!("The {} is a placeholder (\"{value}\")", field.label()));
            }
            None => effective += 1.0,
        }
    }
    let ratio = effective / RequiredField::ALL.len() as f32;
    let clarity = (100.0 * ratio.powf(1.5)).round().clamp(0.0, 100.0) as u8;

    if let (Some(min), Some(max)) = (posting.min_salary, posting.max_salary) {
        if min > max {
            issues.push("Minimum salary is higher than the maximum".to_string());
        } else if min > 0 && max > min.saturating_mul(2) {
            issues.push(
                "Salary range is very wide (maximum is more than twice the minimum)".to_string(),
            );
        }
    }
    if raw_input.trim().chars().count() < SHORT_INPUT_CHARS {
        issues.push("Description is very short".to_string());
    }
    if posting.skills.len() == 1 {
        issues.push("Only one skill is listed".to_string());
    }

    ClarityReport {
        clarity,
        issues,
        strengths: strengths(posting),
        suggestions: Step::ALL
            .iter()
            .filter(|step| !step.missing(|f| posting.has(f)).is_empty())
            .map(|step| step.question().to_string())
            .collect(),
        missing_fields,
    }
}

fn strengths(posting: &JobPosting) -> Vec<String> {
    let mut out = Vec::new();
    if posting.has(RequiredField::Title)
        && placeholder_value(posting, RequiredField::Title).is_none()
    {
        out.push("Clear job title".to_string());
    }
    if posting.min_salary.is_some() && posting.max_salary.is_some() {
        out.push("Salary range is disclosed".to_string());
    }
    if posting.work_model.is_some() {
        out.push("Work model is stated".to_string());
    }
    if posting.skills.len() >= 3 {
        out.push("Specific skills are listed".to_string());
    }
    if posting.requirements.len() >= 3 {
        out.push("Requirements are concrete".to_string());
    }
    if posting.has(RequiredField::Timeline) {
        out.push("Hiring timeline is stated".to_string());
    }
    out
}

/// The value of `field` when it is only a placeholder.
fn placeholder_value(posting: &JobPosting, field: RequiredField) -> Option<String> {
    let text = match field {
        RequiredField::Title => posting.title.as_deref(),
        RequiredField::Department => posting.department.as_deref(),
        RequiredField::ExperienceLevel => posting.experience_level.as_deref(),
        RequiredField::Location => posting.location.as_deref(),
        RequiredField::Timeline => posting.timeline.as_deref(),
        RequiredField::Skills => {
            return (!posting.skills.is_empty() && posting.skills.iter().all(|s| is_placeholder(s)))
                .then(|| posting.skills.join(", "));
        }
        RequiredField::WorkModel | RequiredField::MinSalary | RequiredField::MaxSalary => None,
    }?;
    is_placeholder(text).then(|| text.trim().to_string())
}

fn is_placeholder(value: &str) -> bool {
    let normalized = value.trim().trim_end_matches('.').to_lowercase();
    PLACEHOLDERS.contains(&normalized.as_str())
}
