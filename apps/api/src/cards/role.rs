//! RoleCard: narrative summary, expected outcomes, and red flags.

use crate::cards::models::{RoleCard, UNKNOWN};
use crate::models::posting::{JobPosting, WorkModel};
use crate::models::scraped::ScrapedProfile;

pub const MAX_SUMMARY_CHARS: usize = 280;
const MAX_LIST_ITEMS: usize = 5;
const MAX_REQUIREMENTS_BEFORE_FLAG: usize = 10;
const LOW_CONFIDENCE: f32 = 0.7;

pub fn role_card(posting: &JobPosting, profiles: &[ScrapedProfile]) -> RoleCard {
    RoleCard {
        title: posting.title.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        company: posting.company.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        summary: truncate_at_word(&summary(posting), MAX_SUMMARY_CHARS),
        expected_outcomes: posting
            .responsibilities
            .iter()
            .take(MAX_LIST_ITEMS)
            .cloned()
            .collect(),
        red_flags: red_flags(posting).into_iter().take(MAX_LIST_ITEMS).collect(),
        critical_skill: posting.critical_skill().map(str::to_string),
        non_negotiables: posting.non_negotiables(),
        candidate_signals: candidate_signals(posting, profiles),
    }
}

fn summary(posting: &JobPosting) -> String {
    let mut headline = String::new();
    if let Some(level) = &posting.experience_level {
        let title_has_level = posting
            .title
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(&level.to_lowercase()));
        if !title_has_level {
            headline.push_str(level);
            headline.push(' ');
        }
    }
    headline.push_str(posting.title.as_deref().unwrap_or("Role"));
    if let Some(company) = &posting.company {
        headline.push_str(" at ");
        headline.push_str(company);
    }

    let place = match (&posting.work_model, &posting.location) {
        (Some(wm), Some(loc)) if !loc.to_lowercase().contains(&wm.as_str().to_lowercase()) => {
            Some(format!("{wm}, {loc}"))
        }
        (_, Some(loc)) => Some(loc.clone()),
        (Some(wm), None) => Some(wm.to_string()),
        (None, None) => None,
    };
    if let Some(place) = place {
        headline.push_str(&format!(" ({place})"));
    }

    let mut parts = vec![format!("{headline}.")];
    if let (Some(min), Some(max)) = (posting.min_salary, posting.max_salary) {
        let currency = posting.salary_currency.as_deref().unwrap_or("USD");
        parts.push(format!("Pays {currency} {min}–{max}."));
    }
    if !posting.skills.is_empty() {
        let top: Vec<&str> = posting.skills.iter().take(3).map(String::as_str).collect();
        parts.push(format!("Key skills: {}.", top.join(", ")));
    }
    if let Some(first) = posting.responsibilities.first() {
        parts.push(format!("Main focus: {}.", first.trim_end_matches('.')));
    }
    parts.join(" ")
}

/// Cuts `text` to at most `max` characters on a word boundary, marking the cut with `…`.
pub fn truncate_at_word(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    // leave room for the ellipsis
    let cut: String = text.chars().take(max - 1).collect();
    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}…", trimmed.trim_end_matches([',', ';', ':', '.', ' ']))
}

fn red_flags(posting: &JobPosting) -> Vec<String> {
    let mut flags = Vec::new();
    match (posting.min_salary, posting.max_salary) {
        (None, None) => flags.push("No salary range disclosed".to_string()),
        (Some(min), Some(max)) if min > 0 && max > min.saturating_mul(2) => {
            flags.push("Salary range is unusually wide".to_string())
        }
        (Some(_), None) | (None, Some(_)) => {
            flags.push("Only one end of the salary range is stated".to_string())
        }
        _ => {}
    }
    if posting.work_model.is_none() {
        flags.push("Work model (on-site, remote, hybrid) not stated".to_string());
    }
    if posting.requirements.len() > MAX_REQUIREMENTS_BEFORE_FLAG {
        flags.push(format!(
            "Long requirements list ({} items)",
            posting.requirements.len()
        ));
    }
    if posting.experience_level.is_none() {
        flags.push("Experience level not stated".to_string());
    }
    if posting.location.is_none() && posting.work_model != Some(WorkModel::Remote) {
        flags.push("Location not stated".to_string());
    }
    if posting.confidence < LOW_CONFIDENCE {
        flags.push("Details were extracted with low confidence; verify before sharing".to_string());
    }
    flags
}

/// How the candidate pool lines up with the posting's top skills.
fn candidate_signals(posting: &JobPosting, profiles: &[ScrapedProfile]) -> Vec<String> {
    if profiles.is_empty() {
        return Vec::new();
    }
    let total = profiles.len();
    let mut signals: Vec<String> = posting
        .skills
        .iter()
        .take(MAX_LIST_ITEMS - 1)
        .map(|skill| {
            let n = profiles
                .iter()
                .filter(|p| p.skills.iter().any(|s| s.eq_ignore_ascii_case(skill)))
                .count();
            format!("{n} of {total} candidate profiles list {skill}")
        })
        .collect();

    let years: Vec<f32> = profiles.iter().filter_map(|p| p.years_of_experience).collect();
    if !years.is_empty() {
        let avg = years.iter().sum::<f32>() / years.len() as f32;
        signals.push(format!("Candidates average {avg:.1} years of experience"));
    }
    signals
}
