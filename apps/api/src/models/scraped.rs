//! Loosely-shaped records produced by external scrapers. Field aliases cover the
//! key spellings older scrapers emit, so callers never have to re-map payloads.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapedPosting {
    #[serde(alias = "jobTitle", alias = "position", alias = "job_title")]
    pub title: Option<String>,
    #[serde(alias = "companyName", alias = "company_name", alias = "employer")]
    pub company: Option<String>,
    #[serde(alias = "jobLocation", alias = "job_location")]
    pub location: Option<String>,
    #[serde(alias = "workplaceType", alias = "work_model", alias = "remoteType")]
    pub work_model: Option<String>,
    #[serde(alias = "seniority", alias = "experience_level")]
    pub experience_level: Option<String>,
    pub department: Option<String>,
    #[serde(alias = "salaryMin", alias = "min_salary")]
    pub min_salary: Option<u32>,
    #[serde(alias = "salaryMax", alias = "max_salary")]
    pub max_salary: Option<u32>,
    /// Free-text pay line, e.g. "$120k - $150k".
    #[serde(alias = "salaryText", alias = "compensation", alias = "pay")]
    pub salary: Option<String>,
    #[serde(alias = "descriptionText", alias = "text", alias = "body")]
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub requirements: Vec<String>,
    pub timeline: Option<String>,
    #[serde(alias = "link", alias = "jobUrl")]
    pub url: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapedProfile {
    pub name: Option<String>,
    pub headline: Option<String>,
    #[serde(alias = "title", alias = "jobTitle", alias = "current_title")]
    pub current_title: Option<String>,
    #[serde(alias = "company", alias = "current_company")]
    pub current_company: Option<String>,
    pub location: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub skills: Vec<String>,
    #[serde(alias = "yearsExperience", alias = "years_experience")]
    pub years_of_experience: Option<f32>,
}

/// Scrapers emit `null` for lists they found nothing for.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_accepts_legacy_aliases() {
        let json = r#"{
            "jobTitle": "Data Engineer",
            "companyName": "Acme",
            "salaryText": "$120k - $150k",
            "descriptionText": "Build pipelines",
            "link": "https://jobs.example.com/1"
        }"#;
        let posting: ScrapedPosting = serde_json::from_str(json).unwrap();
        assert_eq!(posting.title.as_deref(), Some("Data Engineer"));
        assert_eq!(posting.company.as_deref(), Some("Acme"));
        assert_eq!(posting.salary.as_deref(), Some("$120k - $150k"));
        assert_eq!(posting.description.as_deref(), Some("Build pipelines"));
        assert!(posting.skills.is_empty());
    }

    #[test]
    fn test_null_lists_read_as_empty() {
        let posting: ScrapedPosting =
            serde_json::from_str(r#"{"title": "SRE", "skills": null, "requirements": null}"#).unwrap();
        assert!(posting.skills.is_empty());
        assert!(posting.requirements.is_empty());

        let profile: ScrapedProfile = serde_json::from_str(r#"{"skills": null}"#).unwrap();
        assert!(profile.skills.is_empty());
    }

    #[test]
    fn test_profile_accepts_title_alias() {
        let profile: ScrapedProfile =
            serde_json::from_str(r#"{"title": "SRE", "skills": ["Go"]}"#).unwrap();
        assert_eq!(profile.current_title.as_deref(), Some("SRE"));
        assert_eq!(profile.skills, vec!["Go"]);
    }
}
