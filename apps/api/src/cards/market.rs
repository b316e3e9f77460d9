//! MarketCard: competition from peer postings, saturation from candidate profiles.
//!
//! Either input may be absent; the card then degrades to `Unknown` levels and a
//! lower estimate confidence instead of failing.

use std::collections::HashMap;

use crate::cards::models::{Level, MarketCard};
use crate::models::posting::JobPosting;
use crate::models::scraped::ScrapedProfile;

const MAX_SHARED_SKILLS: usize = 5;

pub fn market_card(
    posting: &JobPosting,
    peers: &[JobPosting],
    profiles: &[ScrapedProfile],
) -> MarketCard {
    let own: Vec<String> = posting.skills.iter().map(|s| s.to_lowercase()).collect();

    // How many peers mention each of the posting's skills.
    let mut peer_hits: HashMap<&str, usize> = HashMap::new();
    for peer in peers {
        for skill in &peer.skills {
            let lower = skill.to_lowercase();
            if let Some(own_skill) = own.iter().find(|s| **s == lower) {
                *peer_hits.entry(own_skill.as_str()).or_default() += 1;
            }
        }
    }

    let skill_overlap = if own.is_empty() || peers.is_empty() {
        0.0
    } else {
        round2(peer_hits.len() as f32 / own.len() as f32)
    };

    let mut shared: Vec<(usize, &String)> = posting
        .skills
        .iter()
        .enumerate()
        .filter(|(i, _)| peer_hits.contains_key(own[*i].as_str()))
        .collect();
    // most-mentioned first, posting order breaks ties
    shared.sort_by_key(|(i, _)| (std::cmp::Reverse(peer_hits[own[*i].as_str()]), *i));
    let shared_skills = shared
        .into_iter()
        .take(MAX_SHARED_SKILLS)
        .map(|(_, s)| s.clone())
        .collect();

    let similar_peers = peers
        .iter()
        .filter(|p| own.is_empty() || shares_skill(&own, &p.skills))
        .count();
    let matching_profiles = profiles
        .iter()
        .filter(|p| own.is_empty() || shares_skill(&own, &p.skills))
        .count();

    let competition_level = match (peers.is_empty(), similar_peers) {
        (true, _) => Level::Unknown,
        (false, 0..=4) => Level::Low,
        (false, 5..=14) => Level::Moderate,
        (false, _) => Level::High,
    };

    let candidate_saturation = if profiles.is_empty() {
        Level::Unknown
    } else {
        let per_opening = matching_profiles as f32 / similar_peers.max(1) as f32;
        match per_opening {
            r if r < 2.0 => Level::Low,
            r if r < 6.0 => Level::Moderate,
            _ => Level::High,
        }
    };

    let coverage = match (peers.is_empty(), profiles.is_empty()) {
        (false, false) => 1.0,
        (false, true) | (true, false) => 0.6,
        (true, true) => 0.3,
    };

    MarketCard {
        peer_posting_count: peers.len(),
        candidate_profile_count: profiles.len(),
        skill_overlap,
        shared_skills,
        competition_level,
        candidate_saturation,
        estimate_confidence: round2(posting.confidence * coverage),
    }
}

fn shares_skill(own_lower: &[String], skills: &[String]) -> bool {
    skills
        .iter()
        .any(|s| own_lower.iter().any(|o| o.eq_ignore_ascii_case(s)))
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}
