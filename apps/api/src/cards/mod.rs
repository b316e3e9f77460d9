pub mod handlers;
pub mod market;
pub mod models;
pub mod pay;
pub mod role;

use std::collections::HashSet;

use chrono::Utc;
use tracing::error;

use crate::errors::AppError;
use crate::models::posting::{JobPosting, RequiredField};
use crate::models::scraped::ScrapedProfile;

pub use models::CardSet;
use models::{InputsConsidered, SynthesisMetadata};

/// Builds all three cards for `posting`. Never fails: every card field has a
/// default, so an empty posting still yields a complete set.
pub fn synthesize(
    posting: &JobPosting,
    peers: &[JobPosting],
    profiles: &[ScrapedProfile],
) -> CardSet {
    let mut set = CardSet {
        pay_card: pay::pay_card(posting, peers),
        market_card: market::market_card(posting, peers, profiles),
        role_card: role::role_card(posting, profiles),
        metadata: SynthesisMetadata {
            inputs_considered: InputsConsidered {
                postings: 1,
                peer_postings: peers.len(),
                candidate_profiles: profiles.len(),
            },
            cards_generated: Vec::new(),
            generated_at: Utc::now(),
        },
    };
    set.metadata.cards_generated = set.cards().iter().map(|c| c.kind()).collect();
    set
}

/// Gate in front of `synthesize` for records arriving over the API.
///
/// A record naming neither the role nor the employer is rejected; one that
/// breaks the record invariants is a defect upstream and is reported as such.
pub fn validate_for_synthesis(posting: &JobPosting) -> Result<(), AppError> {
    if !posting.is_minimally_valid() {
        let missing_fields = posting.missing_fields();
        let nothing_recovered = missing_fields.len() == RequiredField::ALL.len()
            && posting.requirements.is_empty()
            && posting.responsibilities.is_empty();
        if nothing_recovered {
            return Err(AppError::ExtractionUncertain {
                message: "No job details could be recovered".to_string(),
                missing_fields,
            });
        }
        return Err(AppError::InvalidInput(
            "a posting needs at least a title or a company".to_string(),
        ));
    }

    let violation = if !(0.0..=1.0).contains(&posting.confidence) {
        Some(format!("confidence {} is outside [0, 1]", posting.confidence))
    } else if let (Some(min), Some(max)) = (posting.min_salary, posting.max_salary) {
        (min > max).then(|| format!("minSalary {min} exceeds maxSalary {max}"))
    } else {
        None
    };
    let violation = violation.or_else(|| {
        let mut seen = HashSet::new();
        posting
            .skills
            .iter()
            .find(|s| !seen.insert(s.to_lowercase()))
            .map(|s| format!("duplicate skill {s:?}"))
    });

    match violation {
        Some(detail) => {
            error!(source = %posting.source, "Posting failed invariant check: {detail}");
            Err(AppError::InternalInconsistency(detail))
        }
        None => Ok(()),
    }
}
