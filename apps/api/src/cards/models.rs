use chrono::{DateTime, Utc};
use serde::Serialize;

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Pay,
    Market,
    Role,
}

/// The closed set of derived views. Each variant is produced by a pure
/// function of the canonical record plus optional peer data.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Card {
    Pay(PayCard),
    Market(MarketCard),
    Role(RoleCard),
}

impl Card {
    pub fn kind(&self) -> CardKind {
        match self {
            Card::Pay(_) => CardKind::Pay,
            Card::Market(_) => CardKind::Market,
            Card::Role(_) => CardKind::Role,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PayCard
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryBand {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkBasis {
    /// Percentiles over peer postings that disclose pay.
    Peers,
    /// No comparable peers; the posting's own band.
    Posting,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Benchmark {
    pub low: u32,
    pub high: u32,
    pub median: u32,
    pub sample_size: usize,
    pub basis: BenchmarkBasis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketPosition {
    Below,
    Within,
    Above,
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayCard {
    pub title: String,
    pub salary_band: SalaryBand,
    pub benchmark: Benchmark,
    pub market_position: MarketPosition,
    pub currency: String,
    /// True when the currency was not stated and USD was assumed.
    pub currency_assumed: bool,
    pub locale: String,
    pub confidence: f32,
}

// ────────────────────────────────────────────────────────────────────────────
// MarketCard
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    Low,
    Moderate,
    High,
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketCard {
    pub peer_posting_count: usize,
    pub candidate_profile_count: usize,
    /// Share of the posting's skills that also appear in peer postings, 0–1.
    pub skill_overlap: f32,
    pub shared_skills: Vec<String>,
    pub competition_level: Level,
    pub candidate_saturation: Level,
    pub estimate_confidence: f32,
}

// ────────────────────────────────────────────────────────────────────────────
// RoleCard
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCard {
    pub title: String,
    pub company: String,
    pub summary: String,
    pub expected_outcomes: Vec<String>,
    pub red_flags: Vec<String>,
    pub critical_skill: Option<String>,
    pub non_negotiables: Option<String>,
    pub candidate_signals: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// CardSet
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputsConsidered {
    pub postings: usize,
    pub peer_postings: usize,
    pub candidate_profiles: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisMetadata {
    pub inputs_considered: InputsConsidered,
    pub cards_generated: Vec<CardKind>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSet {
    pub pay_card: PayCard,
    pub market_card: MarketCard,
    pub role_card: RoleCard,
    pub metadata: SynthesisMetadata,
}

impl CardSet {
    /// The three cards as tagged variants, in generation order.
    pub fn cards(&self) -> Vec<Card> {
        vec![
            Card::Pay(self.pay_card.clone()),
            Card::Market(self.market_card.clone()),
            Card::Role(self.role_card.clone()),
        ]
    }
}
