use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Confidence carried by a record when nothing better is known.
/// Deliberately non-zero: a best-effort extraction still carries partial trust.
pub const DEFAULT_CONFIDENCE: f32 = 0.6;

/// Separator used by the condensed `nonNegotiables` view.
const NON_NEGOTIABLES_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkModel {
    #[serde(
        rename = "On-site",
        alias = "on-site",
        alias = "onsite",
        alias = "OnSite",
        alias = "on_site"
    )]
    OnSite,
    #[serde(alias = "remote")]
    Remote,
    #[serde(alias = "hybrid")]
    Hybrid,
}

impl WorkModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkModel::OnSite => "On-site",
            WorkModel::Remote => "Remote",
            WorkModel::Hybrid => "Hybrid",
        }
    }

    /// Detects a work model from free text. Hybrid wins over remote, remote over on-site,
    /// since "remote with occasional office days" is a hybrid arrangement.
    pub fn detect(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("hybrid") {
            return Some(WorkModel::Hybrid);
        }
        let remote = ["remote", "work from home", "wfh", "telecommute", "distributed team"]
            .iter()
            .any(|m| lower.contains(m));
        let negated = ["not remote", "no remote", "non-remote"]
            .iter()
            .any(|m| lower.contains(m));
        if remote && !negated {
            return Some(WorkModel::Remote);
        }
        let onsite = ["on-site", "onsite", "on site", "in-office", "in office", "in-person"]
            .iter()
            .any(|m| lower.contains(m));
        if onsite || negated {
            return Some(WorkModel::OnSite);
        }
        None
    }
}

impl fmt::Display for WorkModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fields a role description must carry before synthesis may run.
/// Grouped into conversation steps by `conversation::state::Step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredField {
    Title,
    Department,
    ExperienceLevel,
    Location,
    WorkModel,
    Skills,
    MinSalary,
    MaxSalary,
    Timeline,
}

impl RequiredField {
    pub const ALL: [RequiredField; 9] = [
        RequiredField::Title,
        RequiredField::Department,
        RequiredField::ExperienceLevel,
        RequiredField::Location,
        RequiredField::WorkModel,
        RequiredField::Skills,
        RequiredField::MinSalary,
        RequiredField::MaxSalary,
        RequiredField::Timeline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredField::Title => "title",
            RequiredField::Department => "department",
            RequiredField::ExperienceLevel => "experienceLevel",
            RequiredField::Location => "location",
            RequiredField::WorkModel => "workModel",
            RequiredField::Skills => "skills",
            RequiredField::MinSalary => "minSalary",
            RequiredField::MaxSalary => "maxSalary",
            RequiredField::Timeline => "timeline",
        }
    }

    /// Human label used in follow-up questions and critique text.
    pub fn label(&self) -> &'static str {
        match self {
            RequiredField::Title => "job title",
            RequiredField::Department => "department",
            RequiredField::ExperienceLevel => "experience level",
            RequiredField::Location => "location",
            RequiredField::WorkModel => "work model",
            RequiredField::Skills => "key skills",
            RequiredField::MinSalary => "minimum salary",
            RequiredField::MaxSalary => "maximum salary",
            RequiredField::Timeline => "hiring timeline",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical job-posting record. Every card is derived from one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub work_model: Option<WorkModel>,
    pub experience_level: Option<String>,
    pub department: Option<String>,
    pub employment_type: Option<String>,
    pub min_salary: Option<u32>,
    pub max_salary: Option<u32>,
    /// ISO 4217 code, e.g. "USD".
    pub salary_currency: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    pub timeline: Option<String>,
    /// Provenance: the host or input channel this record came from.
    pub source: String,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub from_url: bool,
}

fn default_confidence() -> f32 {
    DEFAULT_CONFIDENCE
}

impl Default for JobPosting {
    fn default() -> Self {
        Self {
            title: None,
            company: None,
            location: None,
            work_model: None,
            experience_level: None,
            department: None,
            employment_type: None,
            min_salary: None,
            max_salary: None,
            salary_currency: None,
            skills: Vec::new(),
            requirements: Vec::new(),
            responsibilities: Vec::new(),
            timeline: None,
            source: "unknown".to_string(),
            confidence: DEFAULT_CONFIDENCE,
            from_url: false,
        }
    }
}

impl JobPosting {
    /// Backward-compatible single-skill view: the first canonical skill.
    pub fn critical_skill(&self) -> Option<&str> {
        self.skills.first().map(String::as_str)
    }

    /// Backward-compatible condensed view: the first three requirements joined by `, `.
    pub fn non_negotiables(&self) -> Option<String> {
        if self.requirements.is_empty() {
            return None;
        }
        Some(
            self.requirements
                .iter()
                .take(3)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(NON_NEGOTIABLES_SEPARATOR),
        )
    }

    pub fn has(&self, field: RequiredField) -> bool {
        match field {
            RequiredField::Title => is_filled(&self.title),
            RequiredField::Department => is_filled(&self.department),
            RequiredField::ExperienceLevel => is_filled(&self.experience_level),
            RequiredField::Location => is_filled(&self.location),
            RequiredField::WorkModel => self.work_model.is_some(),
            RequiredField::Skills => !self.skills.is_empty(),
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

    /// Minimum for synthesis: something that names the role or the employer.
    pub fn is_minimally_valid(&self) -> bool {
        is_filled(&self.title) || is_filled(&self.company)
    }

    /// Restores the list invariants (trimmed, deduplicated, insertion-ordered)
    /// and clamps confidence into [0, 1].
    pub fn normalized(mut self) -> Self {
        self.skills = dedup_preserving_case(self.skills);
        self.requirements = dedup_preserving_case(self.requirements);
        self.responsibilities = dedup_preserving_case(self.responsibilities);
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }
}

/// Wire view of a posting: the canonical record plus its computed aliases.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPostingView {
    #[serde(flatten)]
    pub posting: JobPosting,
    pub critical_skill: Option<String>,
    pub non_negotiables: Option<String>,
}

impl From<JobPosting> for JobPostingView {
    fn from(posting: JobPosting) -> Self {
        let critical_skill = posting.critical_skill().map(str::to_string);
        let non_negotiables = posting.non_negotiables();
        Self {
            posting,
            critical_skill,
            non_negotiables,
        }
    }
}

pub(crate) fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Trims, drops empties, and removes case-insensitive duplicates keeping the
/// first-seen casing and order.
pub fn dedup_preserving_case<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    out
}
