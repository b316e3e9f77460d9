// Prompts for the AI field-parsing backend.

pub const FIELD_PARSE_SYSTEM: &str = "You are an expert recruiter who reads job descriptions \
    and extracts their facts into a fixed JSON schema. You MUST respond with valid JSON only.";

/// `{text}` is the posting or chat message; `{hints}` is what is already known.
pub const FIELD_PARSE_PROMPT: &str = r#"Extract job-posting fields from the text below.

Already known (JSON, may be empty; do not contradict it unless the text clearly corrects it):
{hints}

Return a JSON object with exactly two keys:
{
  "fields": {
    "title": string, "company": string, "location": string,
    "workModel": "On-site" | "Remote" | "Hybrid",
    "experienceLevel": string, "department": string, "employmentType": string,
    "minSalary": integer (annual), "maxSalary": integer (annual), "salaryCurrency": ISO 4217 code,
    "skills": [string], "requirements": [string], "responsibilities": [string],
    "timeline": string, "nonNegotiables": string, "flexible": string
  },
  "confidence": { "<field name>": number between 0 and 1 }
}

Omit any field you cannot determine. Give a confidence entry for every field you return.

{no_invention}

TEXT:
{text}"#;
