use serde::{Deserialize, Serialize};

use crate::models::posting::{
    dedup_preserving_case, is_filled, JobPosting, RequiredField, WorkModel,
};

/// Partial record accumulated across extraction calls and conversation turns.
/// Every field is optional; absence means "not yet known", never "known empty".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedData {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub work_model: Option<WorkModel>,
    pub experience_level: Option<String>,
    pub department: Option<String>,
    pub employment_type: Option<String>,
    pub min_salary: Option<u32>,
    pub max_salary: Option<u32>,
    pub salary_currency: Option<String>,
    pub skills: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub responsibilities: Option<Vec<String>>,
    pub timeline: Option<String>,
    pub non_negotiables: Option<String>,
    pub flexible: Option<String>,
}

impl ExtractedData {
    /// Overlays `update` field by field. A populated field is only replaced by a
    /// non-empty value, so re-applying the same update (or a sparser later one)
    /// never regresses what is already known. Lists are unioned, existing items first.
    pub fn merge(&mut self, update: &ExtractedData) {
        overlay_text(&mut self.title, &update.title);
        overlay_text(&mut self.company, &update.company);
        overlay_text(&mut self.location, &update.location);
        overlay(&mut self.work_model, &update.work_model);
        overlay_text(&mut self.experience_level, &update.experience_level);
        overlay_text(&mut self.department, &update.department);
        overlay_text(&mut self.employment_type, &update.employment_type);
        overlay(&mut self.min_salary, &update.min_salary);
        overlay(&mut self.max_salary, &update.max_salary);
        overlay_text(&mut self.salary_currency, &update.salary_currency);
        overlay_list(&mut self.skills, &update.skills);
        overlay_list(&mut self.requirements, &update.requirements);
        overlay_list(&mut self.responsibilities, &update.responsibilities);
        overlay_text(&mut self.timeline, &update.timeline);
        overlay_text(&mut self.non_negotiables, &update.non_negotiables);
        overlay_text(&mut self.flexible, &update.flexible);
    }

    /// Takes values from `backfill` only where this record has none. Lists are
    /// unioned like `merge`, so known items keep their position.
    pub fn fill_gaps(&mut self, backfill: &ExtractedData) {
        fill_text(&mut self.title, &backfill.title);
        fill_text(&mut self.company, &backfill.company);
        fill_text(&mut self.location, &backfill.location);
        fill(&mut self.work_model, &backfill.work_model);
        fill_text(&mut self.experience_level, &backfill.experience_level);
        fill_text(&mut self.department, &backfill.department);
        fill_text(&mut self.employment_type, &backfill.employment_type);
        fill(&mut self.min_salary, &backfill.min_salary);
        fill(&mut self.max_salary, &backfill.max_salary);
        fill_text(&mut self.salary_currency, &backfill.salary_currency);
        overlay_list(&mut self.skills, &backfill.skills);
        overlay_list(&mut self.requirements, &backfill.requirements);
        overlay_list(&mut self.responsibilities, &backfill.responsibilities);
        fill_text(&mut self.timeline, &backfill.timeline);
        fill_text(&mut self.non_negotiables, &backfill.non_negotiables);
        fill_text(&mut self.flexible, &backfill.flexible);
    }

    pub fn has(&self, field: RequiredField) -> bool {
        match field {
            RequiredField::Title => is_filled(&self.title),
            RequiredField::Department => is_filled(&self.department),
            RequiredField::ExperienceLevel => is_filled(&self.experience_level),
            RequiredField::Location => is_filled(&self.location),
            RequiredField::WorkModel => self.work_model.is_some(),
            RequiredField::Skills => list_filled(&self.skills),
            RequiredField::MinSalary => self.min_salary.is_some(),
            RequiredField::MaxSalary => self.max_salary.is_some(),
            RequiredField::Timeline => is_filled(&self.timeline),
        }
    }

    pub fn missing_fields(&self) -> Vec<RequiredField> {
        RequiredField::ALL
            .into_iter()
            .filter(|f| !self.has(*f))
            .collect()
    }

    /// True when not a single field carries a usable value.
    pub fn is_empty(&self) -> bool {
        !(is_filled(&self.title)
            || is_filled(&self.company)
            || is_filled(&self.location)
            || self.work_model.is_some()
            || is_filled(&self.experience_level)
            || is_filled(&self.department)
            || is_filled(&self.employment_type)
            || self.min_salary.is_some()
            || self.max_salary.is_some()
            || list_filled(&self.skills)
            || list_filled(&self.requirements)
            || list_filled(&self.responsibilities)
            || is_filled(&self.timeline)
            || is_filled(&self.non_negotiables)
            || is_filled(&self.flexible))
    }

    /// Projects the accumulated data onto a canonical record. Free-text
    /// non-negotiables stand in for requirements when none were listed.
    pub fn to_posting(&self, source: &str, confidence: f32, from_url: bool) -> JobPosting {
        let requirements = match (&self.requirements, &self.non_negotiables) {
            (Some(reqs), _) if !reqs.is_empty() => reqs.clone(),
            (_, Some(text)) => split_clauses(text),
            _ => Vec::new(),
        };

        let (min_salary, max_salary) = match (self.min_salary, self.max_salary) {
            (Some(min), Some(max)) if min > max => (Some(max), Some(min)),
            other => other,
        };

        JobPosting {
            title: clean(&self.title),
            company: clean(&self.company),
            location: clean(&self.location),
            work_model: self.work_model,
            experience_level: clean(&self.experience_level),
            department: clean(&self.department),
            employment_type: clean(&self.employment_type),
            min_salary,
            max_salary,
            salary_currency: clean(&self.salary_currency),
            skills: self.skills.clone().unwrap_or_default(),
            requirements,
            responsibilities: self.responsibilities.clone().unwrap_or_default(),
            timeline: clean(&self.timeline),
            source: source.to_string(),
            confidence,
            from_url,
        }
        .normalized()
    }
}

impl From<&JobPosting> for ExtractedData {
    fn from(posting: &JobPosting) -> Self {
        let list = |items: &Vec<String>| (!items.is_empty()).then(|| items.clone());
        Self {
            title: posting.title.clone(),
            company: posting.company.clone(),
            location: posting.location.clone(),
            work_model: posting.work_model,
            experience_level: posting.experience_level.clone(),
            department: posting.department.clone(),
            employment_type: posting.employment_type.clone(),
            min_salary: posting.min_salary,
            max_salary: posting.max_salary,
            salary_currency: posting.salary_currency.clone(),
            skills: list(&posting.skills),
            requirements: list(&posting.requirements),
            responsibilities: list(&posting.responsibilities),
            timeline: posting.timeline.clone(),
            non_negotiables: None,
            flexible: None,
        }
    }
}

fn overlay<T: Clone>(current: &mut Option<T>, update: &Option<T>) {
    if update.is_some() {
        current.clone_from(update);
    }
}

fn overlay_text(current: &mut Option<String>, update: &Option<String>) {
    if is_filled(update) {
        current.clone_from(update);
    }
}

fn overlay_list(current: &mut Option<Vec<String>>, update: &Option<Vec<String>>) {
    let Some(items) = update.as_ref().filter(|_| list_filled(update)) else {
        return;
    };
    let known = current.take().unwrap_or_default();
    *current = Some(dedup_preserving_case(known.iter().chain(items)));
}

fn fill<T: Clone>(current: &mut Option<T>, backfill: &Option<T>) {
    if current.is_none() {
        current.clone_from(backfill);
    }
}

fn fill_text(current: &mut Option<String>, backfill: &Option<String>) {
    if !is_filled(current) && is_filled(backfill) {
        current.clone_from(backfill);
    }
}

fn list_filled(value: &Option<Vec<String>>) -> bool {
    value
        .as_ref()
        .is_some_and(|items| items.iter().any(|i| !i.trim().is_empty()))
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn split_clauses(text: &str) -> Vec<String> {
    dedup_preserving_case(text.split([',', ';', '\n']))
}
