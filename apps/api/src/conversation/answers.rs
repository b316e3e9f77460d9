//! Reads a short chat reply as the answer to the question the active step asked.
//!
//! The field parser sees a message on its own, so "120k - 150k" or "Berlin"
//! carries nothing it can recognise. Here the step supplies the missing
//! context. Values found this way only fill what the parser left empty.

use crate::conversation::state::Step;
use crate::extraction::salary::parse_bare_range;
use crate::extraction::text::{is_known_region, level_from_text, split_list};
use crate::models::extracted::ExtractedData;
use crate::models::posting::{RequiredField, WorkModel};

const MAX_SHORT_ANSWER_CHARS: usize = 80;
const MAX_SKILL_WORDS: usize = 3;

/// Fields `content` supplies when read as a reply to `step`'s question.
/// `known` is the session's record so far, `parsed` what the parser already
/// took from this message.
pub fn read_step_answer(
    step: Step,
    content: &str,
    known: &ExtractedData,
    parsed: &ExtractedData,
) -> ExtractedData {
    let answer = content.trim().trim_end_matches('.').trim();
    let mut data = ExtractedData::default();
    if answer.is_empty() {
        return data;
    }
    if step == Step::Compensation {
        if let Some(range) = parse_bare_range(answer) {
            data.min_salary = Some(range.min);
            data.max_salary = Some(range.max);
            data.salary_currency = range.currency;
        }
        return data;
    }

    let short = !answer.contains('\n') && answer.chars().count() <= MAX_SHORT_ANSWER_CHARS;
    if !short {
        return data;
    }

    match step {
        Step::Skills => {
            let skills: Vec<String> = split_list(&answer.replace(" and ", ", "))
                .into_iter()
                .filter(|s| s.split_whitespace().count() <= MAX_SKILL_WORDS)
                .collect();
            data.skills = (!skills.is_empty()).then_some(skills);
        }
        Step::Timeline if parsed.is_empty() && !known.has(RequiredField::Timeline) => {
            data.timeline = Some(answer.to_string());
        }
        Step::Basics if parsed.is_empty() => {
            let missing = step.missing(|f| known.has(f));
            match missing.as_slice() {
                [field] => fill_single(&mut data, *field, answer),
                _ if missing.contains(&RequiredField::Location) && is_known_region(answer) => {
                    data.location = Some(answer.to_string());
                }
                _ => {}
            }
        }
        _ => {}
    }
    data
}

/// With one field left in the step, a bare reply is that field.
fn fill_single(data: &mut ExtractedData, field: RequiredField, answer: &str) {
    let value = Some(answer.to_string());
    match field {
        RequiredField::Title => data.title = value,
        RequiredField::Department => data.department = value,
        RequiredField::Location => data.location = value,
        RequiredField::ExperienceLevel => {
            data.experience_level = level_from_text(answer).or(value);
        }
        RequiredField::WorkModel => data.work_model = WorkModel::detect(answer),
        RequiredField::Skills
        | RequiredField::MinSalary
        | RequiredField::MaxSalary
        | RequiredField::Timeline => {}
    }
}
