//! Conversation state machine.
//!
//! ```text
//! Collecting ──(message completes active step)──▶ StepComplete
//! StepComplete ──advance──▶ Collecting (first incomplete step) | Ready (none left)
//! any ──cancel──▶ Aborted (terminal)
//! ```
//!
//! Step completeness is recomputed from the accumulated record on every call and
//! never stored, so it cannot go stale across merges.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::conversation::models::{Message, Role};
use crate::extraction::text_confidence;
use crate::models::extracted::ExtractedData;
use crate::models::posting::{JobPosting, RequiredField};

pub const CONVERSATION_SOURCE: &str = "conversation";

const SYSTEM_PROMPT: &str =
    "Collect the details of one job opening, one group of fields at a time.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Collecting,
    StepComplete,
    Ready,
    Aborted,
}

/// Logical field groups, asked for in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Basics,
    Skills,
    Compensation,
    Timeline,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Basics, Step::Skills, Step::Compensation, Step::Timeline];

    pub fn required_fields(&self) -> &'static [RequiredField] {
        match self {
            Step::Basics => &[
                RequiredField::Title,
                RequiredField::Department,
                RequiredField::ExperienceLevel,
                RequiredField::Location,
                RequiredField::WorkModel,
            ],
            Step::Skills => &[RequiredField::Skills],
            Step::Compensation => &[RequiredField::MinSalary, RequiredField::MaxSalary],
            Step::Timeline => &[RequiredField::Timeline],
        }
    }

    /// Required fields of this step for which `has` is false.
    pub fn missing(&self, has: impl Fn(RequiredField) -> bool) -> Vec<RequiredField> {
        self.required_fields()
            .iter()
            .copied()
            .filter(|f| !has(*f))
            .collect()
    }

    pub fn is_complete(&self, data: &ExtractedData) -> bool {
        self.missing(|f| data.has(f)).is_empty()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::Basics => "role basics",
            Step::Skills => "skills",
            Step::Compensation => "compensation",
            Step::Timeline => "timeline",
        }
    }

    /// Follow-up question asked while this step is collecting.
    pub fn question(&self) -> &'static str {
        match self {
            Step::Basics => "What is the job title, which team or department is it in, what seniority \
                 level, where is it based, and is it on-site, remote, or hybrid?",
            Step::Skills => "Which skills are essential for this role?",
            Step::Compensation => "What is the salary range (minimum and maximum)?",
            Step::Timeline => "When do you need this person to start?",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("session has been cancelled")]
    Aborted,

    #[error("cannot advance: {step} still needs {missing}")]
    StepIncomplete { step: &'static str, missing: String },

    #[error("all steps are complete; nothing to advance")]
    AlreadyReady,

    #[error("session is not ready for synthesis ({phase:?})")]
    NotReady { phase: Phase },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    pub step: Step,
    pub complete: bool,
    pub missing_fields: Vec<RequiredField>,
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    pub id: Uuid,
    messages: Vec<Message>,
    data: ExtractedData,
    active: Step,
    phase: Phase,
}

impl ConversationState {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            messages: vec![
                Message::new(Role::System, SYSTEM_PROMPT),
                Message::new(Role::Assistant, Step::Basics.question()),
            ],
            data: ExtractedData::default(),
            active: Step::Basics,
            phase: Phase::Collecting,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn active_step(&self) -> Step {
        self.active
    }

    pub fn data(&self) -> &ExtractedData {
        &self.data
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Fails fast before any backend work is spent on a dead session.
    pub fn ensure_open(&self) -> Result<(), TransitionError> {
        match self.phase {
            Phase::Aborted => Err(TransitionError::Aborted),
            _ => Ok(()),
        }
    }

    /// Records a user message and merges the fields extracted from it.
    pub fn accept(&mut self, content: &str, update: &ExtractedData) -> Result<Phase, TransitionError> {
        self.ensure_open()?;
        self.messages.push(Message::new(Role::User, content));
        self.data.merge(update);

        if self.phase == Phase::Collecting && self.active.is_complete(&self.data) {
            self.phase = Phase::StepComplete;
        }
        let reply = self.follow_up();
        self.messages.push(Message::new(Role::Assistant, reply));
        Ok(self.phase)
    }

    /// StepComplete → Collecting on the first incomplete step, or Ready when none is left.
    pub fn advance(&mut self) -> Result<Phase, TransitionError> {
        match self.phase {
            Phase::Aborted => return Err(TransitionError::Aborted),
            Phase::Ready => return Err(TransitionError::AlreadyReady),
            Phase::Collecting => {
                let missing = self.active.missing(|f| self.data.has(f));
                return Err(TransitionError::StepIncomplete {
                    step: self.active.label(),
                    missing: labels(&missing),
                });
            }
            Phase::StepComplete => {}
        }

        match Step::ALL.into_iter().find(|s| !s.is_complete(&self.data)) {
            Some(next) => {
                self.active = next;
                self.phase = Phase::Collecting;
            }
            None => self.phase = Phase::Ready,
        }
        let reply = self.follow_up();
        self.messages.push(Message::new(Role::Assistant, reply));
        Ok(self.phase)
    }

    /// Any state → Aborted. Cancelling twice is a no-op.
    pub fn cancel(&mut self) -> Phase {
        if self.phase != Phase::Aborted {
            self.phase = Phase::Aborted;
            self.messages
                .push(Message::new(Role::System, "Session cancelled by the user."));
        }
        self.phase
    }

    pub fn steps(&self) -> Vec<StepStatus> {
        Step::ALL
            .into_iter()
            .map(|step| {
                let missing_fields = step.missing(|f| self.data.has(f));
                StepStatus {
                    step,
                    complete: missing_fields.is_empty(),
                    missing_fields,
                }
            })
            .collect()
    }

    /// The accumulated record projected onto a canonical posting.
    pub fn posting(&self) -> JobPosting {
        self.data
            .to_posting(CONVERSATION_SOURCE, text_confidence(&self.data), false)
    }

    /// Canonical record for synthesis; only available once Ready.
    pub fn ready_posting(&self) -> Result<JobPosting, TransitionError> {
        match self.phase {
            Phase::Ready => Ok(self.posting()),
            phase => Err(TransitionError::NotReady { phase }),
        }
    }

    /// Everything the user typed, for critique of the raw input.
    pub fn user_input(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn follow_up(&self) -> String {
        match self.phase {
            Phase::Collecting => {
                let missing = self.active.missing(|f| self.data.has(f));
                format!("Still needed: {}. {}", labels(&missing), self.active.question())
            }
            Phase::StepComplete => format!(
                "That covers the {}. Advance when you are ready to continue.",
                self.active.label()
            ),
            Phase::Ready => "All details are in. The cards can be generated now.".to_string(),
            Phase::Aborted => "This session has been cancelled.".to_string(),
        }
    }
}

fn labels(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::posting::WorkModel;

    fn complete_data() -> ExtractedData {
        ExtractedData {
            title: Some("Staff Engineer".into()),
            department: Some("Platform".into()),
            experience_level: Some("Staff".into()),
            location: Some("Berlin".into()),
            work_model: Some(WorkModel::Hybrid),
            skills: Some(vec!["Rust".into()]),
            min_salary: Some(90_000),
            max_salary: Some(120_000),
            timeline: Some("Q3".into()),
            ..ExtractedData::default()
        }
    }

    fn without(field: RequiredField) -> ExtractedData {
        let mut d = complete_data();
        match field {
            RequiredField::Title => d.title = None,
            RequiredField::Department => d.department = None,
            RequiredField::ExperienceLevel => d.experience_level = None,
            RequiredField::Location => d.location = None,
            RequiredField::WorkModel => d.work_model = None,
            RequiredField::Skills => d.skills = Some(vec![]),
            RequiredField::MinSalary => d.min_salary = None,
            RequiredField::MaxSalary => d.max_salary = None,
            RequiredField::Timeline => d.timeline = Some("  ".into()),
        }
        d
    }

    /// Feeds `data` in one message, then advances for as long as the machine allows.
    fn drive(data: &ExtractedData) -> Phase {
        let mut s = ConversationState::new(Uuid::new_v4());
        s.accept("everything at once", data).unwrap();
        while let Ok(phase) = s.advance() {
            if phase == Phase::Ready {
                break;
            }
        }
        s.phase()
    }

    #[test]
    fn test_ready_when_all_groups_complete() {
        assert_eq!(drive(&complete_data()), Phase::Ready);
    }

    #[test]
    fn test_removing_any_required_field_prevents_ready() {
        for field in RequiredField::ALL {
            assert_ne!(drive(&without(field)), Phase::Ready, "ready without {field}");
        }
    }

    #[test]
    fn test_step_by_step_flow() {
        let mut s = ConversationState::new(Uuid::new_v4());
        let basics = ExtractedData {
            title: Some("Designer".into()),
            department: Some("Design".into()),
            experience_level: Some("Mid".into()),
            location: Some("Lisbon".into()),
            ..ExtractedData::default()
        };
        assert_eq!(s.accept("basics", &basics).unwrap(), Phase::Collecting);
        let wm = ExtractedData {
            work_model: Some(WorkModel::Remote),
            ..ExtractedData::default()
        };
        assert_eq!(s.accept("remote", &wm).unwrap(), Phase::StepComplete);
        assert_eq!(s.advance().unwrap(), Phase::Collecting);
        assert_eq!(s.active_step(), Step::Skills);

        let skills = ExtractedData {
            skills: Some(vec!["Figma".into()]),
            ..ExtractedData::default()
        };
        assert_eq!(s.accept("figma", &skills).unwrap(), Phase::StepComplete);
        s.advance().unwrap();
        assert_eq!(s.active_step(), Step::Compensation);
        assert!(!s.steps()[2].complete);
        assert_eq!(s.steps()[2].missing_fields.len(), 2);
    }

    #[test]
    fn test_advance_while_collecting_is_rejected() {
        let mut s = ConversationState::new(Uuid::new_v4());
        match s.advance() {
            Err(TransitionError::StepIncomplete { step, missing }) => {
                assert_eq!(step, "role basics");
                assert!(missing.contains("job title"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_cancel_is_terminal() {
        let mut s = ConversationState::new(Uuid::new_v4());
        assert_eq!(s.cancel(), Phase::Aborted);
        assert_eq!(s.cancel(), Phase::Aborted);
        assert_eq!(
            s.accept("hello", &ExtractedData::default()),
            Err(TransitionError::Aborted)
        );
        assert_eq!(s.advance(), Err(TransitionError::Aborted));
        assert!(s.ready_posting().is_err());
    }

    #[test]
    fn test_later_empty_turn_does_not_erase() {
        let mut s = ConversationState::new(Uuid::new_v4());
        s.accept("all", &complete_data()).unwrap();
        s.accept("never mind", &ExtractedData::default()).unwrap();
        assert_eq!(s.data(), &complete_data());
    }

    #[test]
    fn test_transcript_records_both_sides() {
        let mut s = ConversationState::new(Uuid::new_v4());
        s.accept("Senior designer", &ExtractedData::default()).unwrap();
        let roles: Vec<Role> = s.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(s.user_input(), "Senior designer");
    }

    #[test]
    fn test_ready_posting_uses_conversation_source() {
        let mut s = ConversationState::new(Uuid::new_v4());
        s.accept("all", &complete_data()).unwrap();
        s.advance().unwrap();
        let posting = s.ready_posting().unwrap();
        assert_eq!(posting.source, CONVERSATION_SOURCE);
        assert!(!posting.from_url);
    }
}
