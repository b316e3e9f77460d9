//! PayCard: the posting's band set against peer postings that disclose pay.

use crate::cards::models::{
    Benchmark, BenchmarkBasis, MarketPosition, PayCard, SalaryBand, UNKNOWN,
};
use crate::models::posting::JobPosting;

const ASSUMED_CURRENCY: &str = "USD";

pub fn pay_card(posting: &JobPosting, peers: &[JobPosting]) -> PayCard {
    let currency = posting
        .salary_currency
        .clone()
        .or_else(|| majority_currency(peers));
    let currency_assumed = currency.is_none();
    let currency = currency.unwrap_or_else(|| ASSUMED_CURRENCY.to_string());

    let benchmark = benchmark(posting, peers, &currency);
    let market_position = match (benchmark.basis, midpoint(posting)) {
        (BenchmarkBasis::Peers, Some(mid)) if mid < benchmark.low => MarketPosition::Below,
        (BenchmarkBasis::Peers, Some(mid)) if mid > benchmark.high => MarketPosition::Above,
        (BenchmarkBasis::Peers, Some(_)) => MarketPosition::Within,
        _ => MarketPosition::Unknown,
    };

    PayCard {
        title: posting.title.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        salary_band: SalaryBand {
            min: posting.min_salary,
            max: posting.max_salary,
        },
        benchmark,
        market_position,
        locale: locale_for(&currency).to_string(),
        currency,
        currency_assumed,
        confidence: posting.confidence,
    }
}

fn benchmark(posting: &JobPosting, peers: &[JobPosting], currency: &str) -> Benchmark {
    let mut peer_mids: Vec<u32> = peers
        .iter()
        .filter(|p| {
            p.salary_currency
                .as_deref()
                .map_or(true, |c| c.eq_ignore_ascii_case(currency))
        })
        .filter_map(midpoint)
        .collect();

    if !peer_mids.is_empty() {
        peer_mids.sort_unstable();
        return Benchmark {
            low: percentile(&peer_mids, 25),
            high: percentile(&peer_mids, 75),
            median: percentile(&peer_mids, 50),
            sample_size: peer_mids.len(),
            basis: BenchmarkBasis::Peers,
        };
    }

    match (posting.min_salary, posting.max_salary) {
        (Some(min), Some(max)) => Benchmark {
            low: min,
            high: max,
            median: mid_of(min, max),
            sample_size: 1,
            basis: BenchmarkBasis::Posting,
        },
        _ => Benchmark {
            low: 0,
            high: 0,
            median: 0,
            sample_size: 0,
            basis: BenchmarkBasis::None,
        },
    }
}

/// Midpoint of a disclosed band; a single bound stands for itself.
fn midpoint(posting: &JobPosting) -> Option<u32> {
    match (posting.min_salary, posting.max_salary) {
        (Some(min), Some(max)) => Some(mid_of(min, max)),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

fn mid_of(a: u32, b: u32) -> u32 {
    ((a as u64 + b as u64) / 2) as u32
}

/// Nearest-rank percentile over sorted values.
fn percentile(sorted: &[u32], p: usize) -> u32 {
    let rank = (p * sorted.len()).div_ceil(100).max(1);
    sorted[rank.min(sorted.len()) - 1]
}

fn majority_currency(peers: &[JobPosting]) -> Option<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for code in peers.iter().filter_map(|p| p.salary_currency.as_deref()) {
        let code = code.to_uppercase();
        match counts.iter_mut().find(|(c, _)| *c == code) {
            Some((_, n)) => *n += 1,
            None => counts.push((code, 1)),
        }
    }
    // first-seen wins ties
    counts
        .into_iter()
        .fold(None::<(String, usize)>, |best, (code, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((code, n)),
        })
        .map(|(code, _)| code)
}

pub fn locale_for(currency: &str) -> &'static str {
    match currency.to_uppercase().as_str() {
        "GBP" => "en-GB",
        "EUR" => "de-DE",
        "CAD" => "en-CA",
        "AUD" => "en-AU",
        _ => "en-US",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(min: Option<u32>, max: Option<u32>) -> JobPosting {
        JobPosting {
            title: Some("Engineer".into()),
            min_salary: min,
            max_salary: max,
            ..JobPosting::default()
        }
    }

    #[test]
    fn test_band_matches_posting_exactly() {
        let posting = JobPosting {
            salary_currency: Some("USD".into()),
            confidence: 0.82,
            ..band(Some(140_000), Some(170_000))
        };
        let card = pay_card(&posting, &[]);
        assert_eq!(card.salary_band.min, Some(140_000));
        assert_eq!(card.salary_band.max, Some(170_000));
        assert_eq!(card.benchmark.basis, BenchmarkBasis::Posting);
        assert_eq!(card.benchmark.median, 155_000);
        assert_eq!(card.market_position, MarketPosition::Unknown);
        assert_eq!(card.locale, "en-US");
        assert!(!card.currency_assumed);
        assert!((card.confidence - 0.82).abs() < f32::EPSILON);
    }

    #[test]
    fn test_peer_benchmark_and_position() {
        let peers: Vec<JobPosting> = [100_000, 110_000, 120_000, 130_000]
            .into_iter()
            .map(|v| band(Some(v), Some(v)))
            .collect();
        let card = pay_card(&band(Some(150_000), Some(170_000)), &peers);
        assert_eq!(card.benchmark.basis, BenchmarkBasis::Peers);
        assert_eq!(card.benchmark.sample_size, 4);
        assert_eq!(card.benchmark.low, 100_000);
        assert_eq!(card.benchmark.median, 110_000);
        assert_eq!(card.benchmark.high, 120_000);
        assert_eq!(card.market_position, MarketPosition::Above);
    }

    #[test]
    fn test_peers_in_other_currencies_are_ignored() {
        let mut eur_peer = band(Some(60_000), Some(70_000));
        eur_peer.salary_currency = Some("EUR".into());
        let mut posting = band(Some(90_000), Some(100_000));
        posting.salary_currency = Some("GBP".into());
        let card = pay_card(&posting, &[eur_peer]);
        assert_eq!(card.benchmark.basis, BenchmarkBasis::Posting);
        assert_eq!(card.locale, "en-GB");
    }

    #[test]
    fn test_empty_posting_has_neutral_defaults() {
        let card = pay_card(&JobPosting::default(), &[]);
        assert_eq!(card.title, UNKNOWN);
        assert_eq!(card.salary_band, SalaryBand { min: None, max: None });
        assert_eq!(card.benchmark.basis, BenchmarkBasis::None);
        assert_eq!(card.benchmark.sample_size, 0);
        assert_eq!(card.currency, "USD");
        assert!(card.currency_assumed);
    }

    #[test]
    fn test_currency_taken_from_peers_when_posting_silent() {
        let mut peer = band(Some(50_000), Some(60_000));
        peer.salary_currency = Some("eur".into());
        let card = pay_card(&band(None, None), &[peer]);
        assert_eq!(card.currency, "EUR");
        assert_eq!(card.locale, "de-DE");
        assert!(!card.currency_assumed);
    }

    #[test]
    fn test_percentile_nearest_rank() {
        assert_eq!(percentile(&[5], 25), 5);
        assert_eq!(percentile(&[1, 2, 3, 4, 5], 50), 3);
        assert_eq!(percentile(&[1, 2, 3, 4, 5], 75), 4);
    }
}
