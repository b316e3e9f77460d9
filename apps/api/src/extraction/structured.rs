//! Structured-data pass: schema.org `JobPosting` nodes embedded as JSON-LD.

use std::sync::OnceLock;

use chrono::NaiveDate;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::extraction::salary::parse_salary_range;
use crate::extraction::text::level_from_text;
use crate::models::extracted::ExtractedData;
use crate::models::posting::{dedup_preserving_case, is_filled, WorkModel};

const HOURS_PER_YEAR: f64 = 2080.0;
const MONTHS_PER_YEAR: f64 = 12.0;

/// Fields mapped from markup plus the raw `description` HTML, which the caller
/// runs through the text pass to recover lists the markup omits.
#[derive(Debug, Clone, Default)]
pub struct StructuredPosting {
    pub data: ExtractedData,
    pub description: Option<String>,
}

impl StructuredPosting {
    /// Complete enough to skip the text pass: names the role and the employer,
    /// and says where (or how) the work happens.
    pub fn is_complete(&self) -> bool {
        is_filled(&self.data.title)
            && is_filled(&self.data.company)
            && (is_filled(&self.data.location) || self.data.work_model.is_some())
    }
}

fn ld_json_selector() -> &'static Selector {
    static LD_JSON: OnceLock<Selector> = OnceLock::new();
    LD_JSON.get_or_init(|| {
        Selector::parse(r#"script[type="application/ld+json"]"#)
            .expect("static ld+json selector is valid")
    })
}

/// Returns the first `JobPosting` node found in any JSON-LD block.
/// Unparseable blocks are skipped rather than failing the page.
pub fn find_job_posting(html: &str) -> Option<StructuredPosting> {
    let document = Html::parse_document(html);
    for script in document.select(ld_json_selector()) {
        let raw = script.text().collect::<String>();
        let value: Value = match serde_json::from_str(raw.trim()) {
            Ok(v) => v,
            Err(e) => {
                debug!("Skipping malformed ld+json block: {e}");
                continue;
            }
        };
        if let Some(node) = find_node(&value) {
            return Some(map_node(node));
        }
    }
    None
}

fn find_node(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_node),
        Value::Object(map) => {
            if is_job_posting_type(map.get("@type")) {
                return Some(value);
            }
            map.get("@graph").and_then(find_node)
        }
        _ => None,
    }
}

fn is_job_posting_type(kind: Option<&Value>) -> bool {
    match kind {
        Some(Value::String(s)) => s == "JobPosting",
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some("JobPosting")),
        _ => false,
    }
}

fn map_node(node: &Value) -> StructuredPosting {
    let mut data = ExtractedData {
        title: text_field(node, "title"),
        company: node
            .get("hiringOrganization")
            .and_then(|org| text_field(org, "name").or_else(|| as_text(org))),
        location: location(node),
        work_model: work_model(node),
        department: text_field(node, "occupationalCategory")
            .or_else(|| text_field(node, "industry")),
        employment_type: node.get("employmentType").and_then(employment_type),
        experience_level: experience_level(node),
        skills: non_empty(string_list(node.get("skills"))),
        requirements: non_empty(
            string_list(node.get("qualifications"))
                .into_iter()
                .chain(experience_text(node))
                .collect(),
        ),
        responsibilities: non_empty(string_list(node.get("responsibilities"))),
        timeline: text_field(node, "validThrough").and_then(|d| apply_by(&d)),
        ..ExtractedData::default()
    };

    if let Some((min, max, currency)) = node.get("baseSalary").and_then(base_salary) {
        data.min_salary = Some(min);
        data.max_salary = Some(max);
        data.salary_currency = currency;
    }

    StructuredPosting {
        data,
        description: text_field(node, "description"),
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_field(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(as_text)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|i| as_text(i).or_else(|| text_field(i, "name")))
            .collect(),
        Some(Value::String(s)) => s
            .split([',', ';', '\n'])
            .map(|p| p.trim().trim_start_matches(['-', '•']).trim().to_string())
            .collect(),
        _ => Vec::new(),
    };
    dedup_preserving_case(items)
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    (!items.is_empty()).then_some(items)
}

fn location(node: &Value) -> Option<String> {
    let place = match node.get("jobLocation")? {
        Value::Array(places) => places.first()?,
        other => other,
    };
    let address = place.get("address").unwrap_or(place);
    if let Some(text) = as_text(address) {
        return Some(text);
    }
    let country = address.get("addressCountry").and_then(|c| as_text(c).or_else(|| text_field(c, "name")));
    let parts: Vec<String> = [
        text_field(address, "addressLocality"),
        text_field(address, "addressRegion"),
        country,
    ]
    .into_iter()
    .flatten()
    .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn work_model(node: &Value) -> Option<WorkModel> {
    let location_type = text_field(node, "jobLocationType")?;
    if location_type.eq_ignore_ascii_case("TELECOMMUTE") {
        Some(WorkModel::Remote)
    } else {
        WorkModel::detect(&location_type)
    }
}

fn employment_type(value: &Value) -> Option<String> {
    let raw = match value {
        Value::Array(kinds) => kinds.first().and_then(as_text)?,
        other => as_text(other)?,
    };
    let label = match raw.to_uppercase().replace([' ', '-'], "_").as_str() {
        "FULL_TIME" => "Full-time",
        "PART_TIME" => "Part-time",
        "CONTRACTOR" | "CONTRACT" => "Contract",
        "INTERN" | "INTERNSHIP" => "Internship",
        "TEMPORARY" => "Temporary",
        "PER_DIEM" => "Per diem",
        "VOLUNTEER" => "Volunteer",
        _ => return Some(raw),
    };
    Some(label.to_string())
}

fn experience_level(node: &Value) -> Option<String> {
    if let Some(level) = text_field(node, "title").and_then(|t| level_from_text(&t)) {
        return Some(level);
    }
    let months = node
        .get("experienceRequirements")
        .and_then(|e| e.get("monthsOfExperience"))
        .and_then(Value::as_f64)?;
    let level = match months {
        m if m < 24.0 => "Entry",
        m if m < 60.0 => "Mid",
        m if m < 96.0 => "Senior",
        _ => "Staff",
    };
    Some(level.to_string())
}

fn experience_text(node: &Value) -> Option<String> {
    match node.get("experienceRequirements")? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        other => text_field(other, "description"),
    }
}

/// `baseSalary` is a `MonetaryAmount` whose `value` is a `QuantitativeValue`,
/// a bare number, or (off-schema but common) a free-text range.
fn base_salary(salary: &Value) -> Option<(u32, u32, Option<String>)> {
    let currency = text_field(salary, "currency").map(|c| c.to_uppercase());
    let value = salary.get("value").unwrap_or(salary);

    let (min, max, unit) = match value {
        Value::Number(n) => {
            let v = n.as_f64()?;
            (v, v, text_field(salary, "unitText"))
        }
        Value::String(s) => {
            let range = parse_salary_range(&format!("salary {s}"))?;
            let currency = currency.or(range.currency);
            return Some((range.min, range.max, currency));
        }
        Value::Object(_) => {
            let single = value.get("value").and_then(Value::as_f64);
            let min = value.get("minValue").and_then(Value::as_f64).or(single)?;
            let max = value.get("maxValue").and_then(Value::as_f64).or(single).unwrap_or(min);
            let unit = text_field(value, "unitText").or_else(|| text_field(salary, "unitText"));
            (min, max, unit)
        }
        _ => return None,
    };

    let factor = match unit.as_deref().map(str::to_uppercase).as_deref() {
        Some("HOUR") => HOURS_PER_YEAR,
        Some("MONTH") => MONTHS_PER_YEAR,
        _ => 1.0,
    };
    let (min, max) = (annualize(min, factor)?, annualize(max, factor)?);
    Some((min.min(max), min.max(max), currency))
}

fn annualize(amount: f64, factor: f64) -> Option<u32> {
    let yearly = (amount * factor).round();
    (yearly > 0.0 && yearly <= u32::MAX as f64).then_some(yearly as u32)
}

fn apply_by(valid_through: &str) -> Option<String> {
    let date_part = valid_through.get(..10).unwrap_or(valid_through);
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    Some(format!("Apply by {}", date.format("%B %-d, %Y")))
}
