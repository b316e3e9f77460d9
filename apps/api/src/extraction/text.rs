//! Visible-text extraction and the deterministic free-text field pass.
//!
//! Every rule here is first-match-wins so that the same input always yields the
//! same record. Lists are collected in document order and deduplicated
//! case-insensitively downstream (`JobPosting::normalized`).

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::extraction::salary::parse_salary_range;
use crate::models::extracted::ExtractedData;
use crate::models::posting::{dedup_preserving_case, WorkModel};

/// Elements rendered as their own line. Inline tags (span, b, a) stay inside their block.
const BLOCK_TAGS: &[&str] = &[
    "title", "h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "dt", "dd", "td", "th", "div",
    "section", "article", "header", "pre", "blockquote", "label",
];

/// Only the first few lines are considered for title/company/location guesses.
const HEADER_WINDOW: usize = 15;
const MAX_TITLE_LEN: usize = 90;
const MAX_LIST_ITEM_LEN: usize = 200;
const MAX_INLINE_SKILL_LEN: usize = 40;
const MAX_FALLBACK_REQUIREMENTS: usize = 8;

/// Known skills scanned for anywhere in the text. The flag marks terms that are
/// safe to match case-insensitively; the rest are ordinary English words in lowercase.
const SKILL_VOCABULARY: &[(&str, bool)] = &[
    ("Rust", true),
    ("Python", true),
    ("Java", true),
    ("TypeScript", true),
    ("JavaScript", true),
    ("Golang", true),
    ("Go", false),
    ("C++", true),
    ("C#", true),
    ("Ruby", false),
    ("Scala", true),
    ("Kotlin", true),
    ("Swift", false),
    ("SQL", false),
    ("PostgreSQL", true),
    ("MySQL", true),
    ("MongoDB", true),
    ("Redis", true),
    ("Kafka", true),
    ("Spark", false),
    ("Airflow", true),
    ("Snowflake", false),
    ("AWS", false),
    ("GCP", false),
    ("Azure", false),
    ("Kubernetes", true),
    ("Docker", true),
    ("Terraform", true),
    ("Linux", true),
    ("GraphQL", true),
    ("gRPC", true),
    ("REST", false),
    ("React", false),
    ("Vue", false),
    ("Angular", false),
    ("Node.js", true),
    ("Django", true),
    ("Rails", false),
    ("PyTorch", true),
    ("TensorFlow", true),
    ("Machine Learning", true),
    ("Figma", true),
    ("Tableau", true),
    ("Excel", false),
    ("Salesforce", true),
    ("HubSpot", true),
    ("CI/CD", true),
    ("Microservices", true),
    ("Distributed Systems", true),
];

const STOP_ADJECTIVES: &[&str] = &[
    "growing", "amazing", "talented", "small", "global", "fast-growing", "world-class", "new",
    "great", "friendly", "remote", "diverse", "dynamic", "awesome", "entire", "wider",
];

const US_STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
    "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY",
];

const COUNTRIES: &[&str] = &[
    "USA", "US", "United States", "UK", "United Kingdom", "Canada", "Germany", "France",
    "Spain", "Netherlands", "Ireland", "India", "Australia", "Poland", "Portugal", "Sweden",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Requirements,
    Skills,
    Responsibilities,
    Other,
}

// ────────────────────────────────────────────────────────────────────────────
// HTML → visible text
// ────────────────────────────────────────────────────────────────────────────

pub fn looks_like_html(content: &str) -> bool {
    let head: String = content.chars().take(4096).collect::<String>().to_lowercase();
    ["<!doctype", "<html", "<body", "<div", "<p>", "<p ", "<li", "<h1", "<script"]
        .iter()
        .any(|tag| head.contains(tag))
}

fn non_visible_regex() -> &'static Regex {
    static NON_VISIBLE: OnceLock<Regex> = OnceLock::new();
    NON_VISIBLE.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<noscript\b.*?</noscript>")
            .expect("static non-visible markup regex is valid")
    })
}

fn block_selector() -> &'static Selector {
    static BLOCKS: OnceLock<Selector> = OnceLock::new();
    BLOCKS.get_or_init(|| {
        Selector::parse(&BLOCK_TAGS.join(", ")).expect("static block CSS selector is valid")
    })
}

/// Renders the readable text of an HTML document, one line per innermost block
/// element. List items are prefixed with `- ` so list structure survives.
pub fn visible_text(html: &str) -> String {
    let stripped = non_visible_regex().replace_all(html, " ");
    let document = Html::parse_document(&stripped);

    let mut lines = Vec::new();
    for element in document.select(block_selector()) {
        let has_nested_block = element.descendants().skip(1).any(|node| {
            node.value()
                .as_element()
                .is_some_and(|e| BLOCK_TAGS.contains(&e.name()))
        });
        if has_nested_block {
            continue;
        }
        let text = normalize_whitespace(&element.text().collect::<String>());
        if text.is_empty() {
            continue;
        }
        if element.value().name() == "li" {
            lines.push(format!("- {text}"));
        } else {
            lines.push(text);
        }
    }

    if lines.is_empty() {
        return normalize_whitespace(&document.root_element().text().collect::<Vec<_>>().join(" "));
    }
    lines.join("\n")
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ────────────────────────────────────────────────────────────────────────────
// Free-text field pass
// ────────────────────────────────────────────────────────────────────────────

/// Fills whichever fields the text identifies. Never fails; unknown stays `None`.
pub fn extract_fields(text: &str) -> ExtractedData {
    let lines: Vec<String> = text
        .lines()
        .map(normalize_whitespace)
        .filter(|l| !l.is_empty())
        .collect();

    let mut data = ExtractedData::default();
    let mut labeled_skills = Vec::new();
    let mut labeled_requirements = Vec::new();

    for line in &lines {
        apply_label(
            strip_bullet(line).unwrap_or(line.as_str()),
            &mut data,
            &mut labeled_skills,
            &mut labeled_requirements,
        );
    }

    let title_line = lines
        .iter()
        .take(HEADER_WINDOW)
        .find(|l| is_title_candidate(l));
    if let Some(line) = title_line {
        let (title, company) = split_title_line(line);
        data.title.get_or_insert(title);
        if let Some(company) = company {
            data.company.get_or_insert(company);
        }
    }

    if data.company.is_none() {
        data.company = find_company(&lines);
    }

    if data.experience_level.is_none() {
        data.experience_level = data
            .title
            .as_deref()
            .and_then(level_from_text)
            .or_else(|| level_from_years(text));
    }

    if data.department.is_none() {
        data.department = department_from_team_phrase(text)
            .or_else(|| data.title.as_deref().and_then(department_from_title));
    }

    if data.location.is_none() {
        data.location = find_location(&lines);
    }

    if data.work_model.is_none() {
        data.work_model = data
            .location
            .as_deref()
            .and_then(WorkModel::detect)
            .or_else(|| title_line.and_then(|l| WorkModel::detect(l)))
            .or_else(|| WorkModel::detect(text));
    }

    if data.min_salary.is_none() {
        if let Some(range) = parse_salary_range(text) {
            data.min_salary = Some(range.min);
            data.max_salary = Some(range.max);
            data.salary_currency = range.currency;
        }
    }

    if data.employment_type.is_none() {
        data.employment_type = find_employment_type(text);
    }

    if data.timeline.is_none() {
        data.timeline = find_timeline(text);
    }

    let sections = collect_sections(&lines);

    let mut skills = labeled_skills;
    skills.extend(sections.skills);
    skills.extend(scan_skills(text));
    data.skills = non_empty(dedup_preserving_case(skills));

    let mut requirements = labeled_requirements;
    requirements.extend(sections.requirements);
    if requirements.is_empty() {
        requirements = fallback_requirements(&lines);
    }
    data.requirements = non_empty(dedup_preserving_case(requirements));
    data.responsibilities = non_empty(dedup_preserving_case(sections.responsibilities));

    data
}

/// Canonical skill names found anywhere in `text`, in order of first appearance.
pub fn scan_skills(text: &str) -> Vec<String> {
    let mut hits: Vec<(usize, &'static str)> = skill_patterns()
        .iter()
        .filter_map(|(re, name)| re.find(text).map(|m| (m.start(), *name)))
        .collect();
    hits.sort_by_key(|(pos, _)| *pos);
    hits.into_iter().map(|(_, name)| name.to_string()).collect()
}

fn skill_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        SKILL_VOCABULARY
            .iter()
            .map(|(name, insensitive)| {
                let flags = if *insensitive { "(?i)" } else { "" };
                let pattern = format!(
                    r"{flags}(?:^|[^A-Za-z0-9+#.])({})(?:$|[^A-Za-z0-9+#])",
                    regex::escape(name)
                );
                (
                    Regex::new(&pattern).expect("skill vocabulary patterns are valid"),
                    *name,
                )
            })
            .collect()
    })
}

fn label_regex() -> &'static Regex {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    LABEL.get_or_init(|| {
        Regex::new(
            r"(?i)^(job title|title|position|role|company|employer|organization|location|work model|workplace type|workplace|work type|remote policy|department|team|experience level|seniority|level|employment type|job type|salary|compensation|pay|start date|hiring timeline|timeline|skills|tech stack|technologies|requirements|qualifications)\s*[:：]\s*(.+)$",
        )
        .expect("static label regex is valid")
    })
}

fn apply_label(
    line: &str,
    data: &mut ExtractedData,
    skills: &mut Vec<String>,
    requirements: &mut Vec<String>,
) {
    let Some(caps) = label_regex().captures(line) else {
        return;
    };
    let label = caps[1].to_lowercase();
    let value = caps[2].trim().to_string();

    match label.as_str() {
        "job title" | "title" | "position" | "role" => {
            if value.len() <= MAX_TITLE_LEN {
                data.title.get_or_insert(value);
            }
        }
        "company" | "employer" | "organization" => {
            data.company.get_or_insert(value);
        }
        "location" => {
            if data.work_model.is_none() {
                data.work_model = WorkModel::detect(&value);
            }
            data.location.get_or_insert(value);
        }
        "work model" | "workplace type" | "workplace" | "work type" | "remote policy" => {
            if data.work_model.is_none() {
                data.work_model = WorkModel::detect(&value);
            }
        }
        "department" | "team" => {
            data.department.get_or_insert(value);
        }
        "experience level" | "seniority" | "level" => {
            let level = level_from_text(&value).unwrap_or(value);
            data.experience_level.get_or_insert(level);
        }
        "employment type" | "job type" => {
            let kind = find_employment_type(&value).unwrap_or(value);
            data.employment_type.get_or_insert(kind);
        }
        "salary" | "compensation" | "pay" => {
            if data.min_salary.is_none() {
                if let Some(range) = parse_salary_range(line) {
                    data.min_salary = Some(range.min);
                    data.max_salary = Some(range.max);
                    data.salary_currency = range.currency;
                }
            }
        }
        "start date" | "hiring timeline" | "timeline" => {
            data.timeline.get_or_insert(value);
        }
        "skills" | "tech stack" | "technologies" => {
            skills.extend(split_list(&value));
        }
        "requirements" | "qualifications" => {
            requirements.extend(split_list(&value));
        }
        _ => {}
    }
}

pub fn split_list(value: &str) -> Vec<String> {
    value
        .split([',', ';', '|', '•'])
        .map(|s| s.trim().trim_end_matches('.').trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn strip_bullet(line: &str) -> Option<&str> {
    static NUMBERED: OnceLock<Regex> = OnceLock::new();
    let numbered = NUMBERED
        .get_or_init(|| Regex::new(r"^\d{1,2}[.)]\s+").expect("static numbered-list regex is valid"));

    for marker in ["- ", "* ", "• ", "· ", "– ", "— "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }
    numbered.find(line).map(|m| line[m.end()..].trim())
}

// ────────────────────────────────────────────────────────────────────────────
// Title / company
// ────────────────────────────────────────────────────────────────────────────

fn role_noun_regex() -> &'static Regex {
    static ROLE: OnceLock<Regex> = OnceLock::new();
    ROLE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(engineer|developer|manager|designer|analyst|scientist|director|architect|specialist|coordinator|consultant|administrator|lead|head of|recruiter|accountant|technician|officer|associate|intern|representative|writer|editor|marketer|strategist|researcher|programmer|sre|devops|executive|product owner|vp)\b",
        )
        .expect("static role noun regex is valid")
    })
}

fn is_title_candidate(line: &str) -> bool {
    if strip_bullet(line).is_some() || line.len() > MAX_TITLE_LEN || line.ends_with('.') {
        return false;
    }
    let lower = line.to_lowercase();
    let sentence_start = ["about", "we ", "we'", "you ", "you'", "our ", "join ", "as a", "this "]
        .iter()
        .any(|p| lower.starts_with(p));
    !sentence_start && !line.contains(':') && role_noun_regex().is_match(line)
}

/// Splits "Senior Engineer at Acme" / "Senior Engineer - Acme | Careers" into
/// a title and, when the remainder looks like an employer, a company. The
/// earliest separator whose left side names a role is used.
fn split_title_line(line: &str) -> (String, Option<String>) {
    let mut splits: Vec<(usize, &str)> = [" at ", " @ ", " | ", " — ", " – ", " - "]
        .into_iter()
        .filter_map(|sep| line.find(sep).map(|pos| (pos, sep)))
        .collect();
    splits.sort_by_key(|(pos, _)| *pos);

    for (pos, sep) in splits {
        let (left, right) = (&line[..pos], &line[pos + sep.len()..]);
        if !role_noun_regex().is_match(left) {
            continue;
        }
        let candidate = right
            .split(['|', '(', '—', '–'])
            .next()
            .unwrap_or(right)
            .split(" - ")
            .next()
            .unwrap_or(right)
            .trim();
        let explicit = sep == " at " || sep == " @ ";
        let company = is_company_candidate(candidate, explicit).then(|| candidate.to_string());
        return (left.trim().to_string(), company);
    }
    (line.trim().to_string(), None)
}

fn is_company_candidate(candidate: &str, explicit: bool) -> bool {
    if candidate.is_empty() || candidate.len() > 50 || candidate.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let lower = candidate.to_lowercase();
    let noise = ["careers", "jobs", "linkedin", "indeed", "glassdoor", "job board", "apply"];
    if noise.iter().any(|n| lower.contains(n)) || WorkModel::detect(candidate).is_some() {
        return false;
    }
    if role_noun_regex().is_match(candidate) {
        return false;
    }
    explicit || candidate.chars().next().is_some_and(char::is_uppercase)
}

fn find_company(lines: &[String]) -> Option<String> {
    static ABOUT: OnceLock<Regex> = OnceLock::new();
    static HIRING: OnceLock<Regex> = OnceLock::new();
    let about = ABOUT.get_or_init(|| {
        Regex::new(r"^About ([A-Z][\w&.'\-]*(?:\s+[A-Z][\w&.'\-]*){0,3})\s*:?$")
            .expect("static about-company regex is valid")
    });
    let hiring = HIRING.get_or_init(|| {
        Regex::new(r"\b([A-Z][\w&.'\-]*(?:\s+[A-Z][\w&.'\-]*){0,3}) is hiring\b")
            .expect("static is-hiring regex is valid")
    });

    let not_company = ["The", "Us", "You", "This", "Our", "Me", "We", "Your"];
    lines
        .iter()
        .filter_map(|line| {
            about
                .captures(line)
                .or_else(|| hiring.captures(line))
                .map(|c| c[1].trim().to_string())
        })
        .find(|name| {
            let first = name.split_whitespace().next().unwrap_or("");
            !not_company.contains(&first) && is_company_candidate(name, false)
        })
}

// ────────────────────────────────────────────────────────────────────────────
// Level / department / location
// ────────────────────────────────────────────────────────────────────────────

/// Normalised experience level from a title or label value.
pub fn level_from_text(text: &str) -> Option<String> {
    static LEVELS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    let levels = LEVELS.get_or_init(|| {
        [
            (r"(?i)\bintern(ship)?\b", "Intern"),
            (r"(?i)\bprincipal\b", "Principal"),
            (r"(?i)\bstaff\b", "Staff"),
            (r"(?i)\b(senior|sr)\b", "Senior"),
            (r"(?i)\b(director|head of|vp|vice president)\b", "Director"),
            (r"(?i)\blead\b", "Lead"),
            (r"(?i)\b(mid[- ]level|intermediate|mid)\b", "Mid"),
            (r"(?i)\b(junior|jr)\b", "Junior"),
            (r"(?i)\b(entry[- ]level|graduate|new grad)\b", "Entry"),
        ]
        .into_iter()
        .map(|(p, l)| (Regex::new(p).expect("static level regex is valid"), l))
        .collect()
    });
    levels
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, level)| level.to_string())
}

fn level_from_years(text: &str) -> Option<String> {
    static YEARS: OnceLock<Regex> = OnceLock::new();
    let years = YEARS.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2})\s*\+?\s*(?:-\s*\d{1,2}\s*)?(?:years|yrs)\b")
            .expect("static years regex is valid")
    });
    let n: u32 = years.captures(text)?[1].parse().ok()?;
    let level = match n {
        0..=1 => "Entry",
        2..=4 => "Mid",
        5..=7 => "Senior",
        _ => "Staff",
    };
    Some(level.to_string())
}

fn department_from_team_phrase(text: &str) -> Option<String> {
    static TEAM: OnceLock<Regex> = OnceLock::new();
    let team = TEAM.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:join|on|in)\s+(?:the|our)\s+([a-z][a-z&/\-]*(?:\s[a-z][a-z&/\-]*)?)\s+(?:team|department|org|organization|group)\b",
        )
        .expect("static team phrase regex is valid")
    });
    team.captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .find(|name| !STOP_ADJECTIVES.contains(&name.to_lowercase().as_str()))
        .map(|name| capitalize(&name))
}

fn department_from_title(title: &str) -> Option<String> {
    let lower = title.to_lowercase();
    let rules: &[(&[&str], &str)] = &[
        (&["product manager", "product owner"], "Product"),
        (&["engineer", "developer", "sre", "devops", "architect", "programmer"], "Engineering"),
        (&["designer", "ux", "ui "], "Design"),
        (&["data scientist", "data analyst", "analyst", "machine learning"], "Data"),
        (&["recruiter", "talent", "people", "hr "], "People"),
        (&["sales", "account executive"], "Sales"),
        (&["marketing", "marketer", "growth"], "Marketing"),
        (&["accountant", "finance", "controller"], "Finance"),
        (&["support", "customer success"], "Customer Support"),
        (&["counsel", "legal"], "Legal"),
        (&["operations"], "Operations"),
    ];
    rules
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map(|(_, dept)| dept.to_string())
}

/// A bare country name or US state code ("Germany", "TX").
pub fn is_known_region(text: &str) -> bool {
    let text = text.trim().trim_end_matches('.');
    US_STATES.contains(&text)
        || COUNTRIES
            .iter()
            .any(|c| *c == text || (c.len() > 3 && c.eq_ignore_ascii_case(text)))
}

fn find_location(lines: &[String]) -> Option<String> {
    static CITY: OnceLock<Regex> = OnceLock::new();
    static BASED: OnceLock<Regex> = OnceLock::new();
    let city = CITY.get_or_init(|| {
        Regex::new(r"\b([A-Z][a-zA-Z.\-]+(?:\s[A-Z][a-zA-Z.\-]+){0,2}),\s([A-Z]{2}|[A-Z][a-zA-Z]+(?:\s[A-Z][a-zA-Z]+)?)\b")
            .expect("static city regex is valid")
    });
    let based = BASED.get_or_init(|| {
        Regex::new(r"(?i)\b(?:based in|located in|office in|offices in)\s+([A-Z][\w .\-]+?)(?:[.,;(]|$)")
            .expect("static based-in regex is valid")
    });

    for line in lines.iter().take(HEADER_WINDOW) {
        for caps in city.captures_iter(line) {
            let region = &caps[2];
            if US_STATES.contains(&region) || COUNTRIES.contains(&region) {
                return Some(caps[0].trim().to_string());
            }
        }
    }
    lines
        .iter()
        .find_map(|line| based.captures(line).map(|c| c[1].trim().to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Employment type / timeline
// ────────────────────────────────────────────────────────────────────────────

fn find_employment_type(text: &str) -> Option<String> {
    static KIND: OnceLock<Regex> = OnceLock::new();
    let kind = KIND.get_or_init(|| {
        Regex::new(r"(?i)\b(full[- ]time|part[- ]time|contractor|contract|internship|temporary|freelance)\b")
            .expect("static employment type regex is valid")
    });
    let found = kind.captures(text)?[1].to_lowercase();
    let label = match found.as_str() {
        "full-time" | "full time" => "Full-time",
        "part-time" | "part time" => "Part-time",
        "contract" | "contractor" => "Contract",
        "internship" => "Internship",
        "temporary" => "Temporary",
        _ => "Freelance",
    };
    Some(label.to_string())
}

fn find_timeline(text: &str) -> Option<String> {
    static TIMELINE: OnceLock<Regex> = OnceLock::new();
    let timeline = TIMELINE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(asap|immediately|immediate start|start(?:ing)?\s+(?:in|by|on)\s+[^.;\n]{2,30}|within\s+\d+\s+(?:days|weeks|months)|hiring\s+by\s+[^.;\n]{2,30}|by\s+(?:q[1-4]|end of [a-z]+)(?:\s+\d{4})?|q[1-4]\s+\d{4})",
        )
        .expect("static timeline regex is valid")
    });
    timeline
        .captures(text)
        .map(|c| c[1].trim().trim_end_matches(',').to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Sections (requirements / skills / responsibilities lists)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SectionLists {
    requirements: Vec<String>,
    skills: Vec<String>,
    responsibilities: Vec<String>,
}

fn heading_section(line: &str) -> Option<Section> {
    if strip_bullet(line).is_some() || line.len() > 60 {
        return None;
    }
    if line.contains(':') && !line.ends_with(':') {
        return None;
    }
    let lower = line.trim_end_matches(':').trim().to_lowercase();
    let classify = |l: &str| -> Section {
        if ["nice to have", "preferred", "bonus", "plus"].iter().any(|k| l.contains(k)) {
            Section::Other
        } else if [
            "requirement", "qualification", "what you'll need", "what you need",
            "what we're looking for", "what we are looking for", "must have", "must-have",
            "you have", "about you", "who you are", "you bring", "what you bring",
        ]
        .iter()
        .any(|k| l.contains(k))
        {
            Section::Requirements
        } else if ["skill", "tech stack", "technolog", "tools", "stack"].iter().any(|k| l.contains(k)) {
            Section::Skills
        } else if [
            "responsibilit", "what you'll do", "what you will do", "the role", "your role",
            "day to day", "day-to-day", "duties", "in this role", "your impact",
        ]
        .iter()
        .any(|k| l.contains(k))
        {
            Section::Responsibilities
        } else {
            Section::Other
        }
    };

    if line.ends_with(':') {
        return Some(classify(&lower));
    }
    let known = [
        "requirements", "qualifications", "responsibilities", "skills", "benefits", "perks",
        "about us", "about the company", "about the role", "what you'll do", "what you'll need",
        "who you are", "nice to have", "tech stack", "what we offer", "the role",
    ];
    (lower.split_whitespace().count() <= 7 && known.iter().any(|k| lower.starts_with(k)))
        .then(|| classify(&lower))
}

/// Walks the lines tracking the current heading. In a bulleted section a plain
/// line ends the section; in an unbulleted one short plain lines are items.
fn collect_sections(lines: &[String]) -> SectionLists {
    let mut lists = SectionLists::default();
    let mut current = Section::Other;
    let mut bulleted = false;

    for line in lines {
        if let Some(section) = heading_section(line) {
            current = section;
            bulleted = false;
            continue;
        }
        let bullet = strip_bullet(line);
        if label_regex().is_match(bullet.unwrap_or(line.as_str())) {
            continue;
        }
        let item = match bullet {
            Some(item) => {
                bulleted = true;
                item
            }
            None if !bulleted && line.len() <= MAX_LIST_ITEM_LEN && current != Section::Other => {
                line.as_str()
            }
            None => {
                current = Section::Other;
                continue;
            }
        };
        let item = item.trim_end_matches(['.', ';']).trim();
        if item.is_empty() || item.len() > MAX_LIST_ITEM_LEN {
            continue;
        }
        match current {
            Section::Requirements => lists.requirements.push(item.to_string()),
            Section::Responsibilities => lists.responsibilities.push(item.to_string()),
            Section::Skills => {
                if item.len() <= MAX_INLINE_SKILL_LEN {
                    lists.skills.extend(split_list(item));
                }
            }
            Section::Other => {}
        }
    }
    lists
}

fn fallback_requirements(lines: &[String]) -> Vec<String> {
    static CUE: OnceLock<Regex> = OnceLock::new();
    let cue = CUE.get_or_init(|| {
        Regex::new(r"(?i)\b(required|must have|must-have|\d+\+?\s*years|experience with|proficien)")
            .expect("static requirement cue regex is valid")
    });
    lines
        .iter()
        .filter_map(|l| strip_bullet(l))
        .filter(|item| item.len() <= MAX_LIST_ITEM_LEN && cue.is_match(item))
        .map(|item| item.trim_end_matches('.').to_string())
        .take(MAX_FALLBACK_REQUIREMENTS)
        .collect()
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    (!items.is_empty()).then_some(items)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN_POSTING: &str = "\
Senior Backend Engineer at Acme Cloud
Austin, TX (Hybrid)
Join our Platform team to build the billing pipeline.

Responsibilities:
- Own the payments service end to end
- Improve p99 latency of the ledger API

Requirements:
- 5+ years of backend experience
- Production Rust or Go
- Comfortable with on-call

Tech stack: Rust, PostgreSQL, Kafka, rust

Compensation: $140,000–$170,000 plus equity
Start date: within 30 days
Full-time";

    #[test]
    fn test_plain_posting_fields() {
        let d = extract_fields(PLAIN_POSTING);
        assert_eq!(d.title.as_deref(), Some("Senior Backend Engineer"));
        assert_eq!(d.company.as_deref(), Some("Acme Cloud"));
        assert_eq!(d.location.as_deref(), Some("Austin, TX"));
        assert_eq!(d.work_model, Some(WorkModel::Hybrid));
        assert_eq!(d.experience_level.as_deref(), Some("Senior"));
        assert_eq!(d.department.as_deref(), Some("Platform"));
        assert_eq!(d.min_salary, Some(140_000));
        assert_eq!(d.max_salary, Some(170_000));
        assert_eq!(d.salary_currency.as_deref(), Some("USD"));
        assert_eq!(d.timeline.as_deref(), Some("within 30 days"));
        assert_eq!(d.employment_type.as_deref(), Some("Full-time"));
    }

    #[test]
    fn test_lists_are_ordered_and_deduplicated() {
        let d = extract_fields(PLAIN_POSTING);
        let skills = d.skills.unwrap();
        assert_eq!(&skills[..3], &["Rust", "PostgreSQL", "Kafka"]);
        assert_eq!(skills.iter().filter(|s| s.eq_ignore_ascii_case("rust")).count(), 1);

        let reqs = d.requirements.unwrap();
        assert_eq!(reqs[0], "5+ years of backend experience");
        assert_eq!(reqs.len(), 3);

        let resp = d.responsibilities.unwrap();
        assert_eq!(resp[0], "Own the payments service end to end");
    }

    #[test]
    fn test_empty_text_yields_empty_record() {
        assert!(extract_fields("").is_empty());
        assert!(extract_fields("lorem ipsum dolor sit amet").is_empty());
    }

    #[test]
    fn test_labeled_lines_win() {
        let text = "Job Title: Product Designer\nCompany: Northwind\nLocation: Remote (EU)\nDepartment: Design Systems\nSeniority: mid-level";
        let d = extract_fields(text);
        assert_eq!(d.title.as_deref(), Some("Product Designer"));
        assert_eq!(d.company.as_deref(), Some("Northwind"));
        assert_eq!(d.location.as_deref(), Some("Remote (EU)"));
        assert_eq!(d.work_model, Some(WorkModel::Remote));
        assert_eq!(d.department.as_deref(), Some("Design Systems"));
        assert_eq!(d.experience_level.as_deref(), Some("Mid"));
    }

    #[test]
    fn test_title_split_rejects_job_board_suffix() {
        let (title, company) = split_title_line("Data Analyst - Contoso | LinkedIn");
        assert_eq!(title, "Data Analyst");
        assert_eq!(company.as_deref(), Some("Contoso"));

        let (title, company) = split_title_line("Staff Engineer - Remote");
        assert_eq!(title, "Staff Engineer");
        assert_eq!(company, None);
    }

    #[test]
    fn test_company_from_about_heading() {
        let d = extract_fields("Frontend Developer\nAbout Globex\nWe build things.");
        assert_eq!(d.company.as_deref(), Some("Globex"));
        assert_eq!(d.department.as_deref(), Some("Engineering"));
    }

    #[test]
    fn test_level_from_years_when_title_is_plain() {
        let d = extract_fields("Backend Developer\n- 8+ years building APIs");
        assert_eq!(d.experience_level.as_deref(), Some("Staff"));
        assert_eq!(d.requirements.unwrap(), vec!["8+ years building APIs"]);
    }

    #[test]
    fn test_scan_skills_respects_case_sensitive_terms() {
        let skills = scan_skills("You will react to incidents and rest easy. Uses React and kubernetes.");
        assert_eq!(skills, vec!["React", "Kubernetes"]);
        assert!(scan_skills("JavaScript only").iter().all(|s| s != "Java"));
    }

    #[test]
    fn test_go_matches_only_as_a_proper_noun() {
        assert_eq!(scan_skills("Services in Go, Rust and gRPC"), vec!["Go", "Rust", "gRPC"]);
        assert!(scan_skills("You will go deep on the ledger and good things follow").is_empty());
        assert_eq!(scan_skills("Golang or Rust"), vec!["Golang", "Rust"]);
        assert!(scan_skills("We use MongoDB and Google Cloud").iter().all(|s| s != "Go"));
    }

    #[test]
    fn test_visible_text_skips_scripts_and_marks_list_items() {
        let html = r#"<html><head><title>Job</title><script>var secret = 1;</script></head>
            <body><h1>Site Reliability Engineer</h1><p>Salary: <b>$120k</b> - $150k</p>
            <ul><li>Kubernetes</li><li>Terraform</li></ul><style>.x{}</style></body></html>"#;
        let text = visible_text(html);
        assert!(!text.contains("secret"));
        assert!(!text.contains(".x{}"));
        assert!(text.contains("Site Reliability Engineer"));
        assert!(text.contains("Salary: $120k - $150k"));
        assert!(text.contains("- Kubernetes"));
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("<!DOCTYPE html><html></html>"));
        assert!(looks_like_html("<div>Engineer</div>"));
        assert!(!looks_like_html("Engineer, 5 years, <3 the team"));
    }
}
