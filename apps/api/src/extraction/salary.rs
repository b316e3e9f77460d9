//! Salary range parsing: "$140,000–$170,000", "$150k - 180k", "90.000 - 110.000 EUR".

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Amounts below this (after `k` scaling) are not salaries ("3-5 years").
const MIN_PLAUSIBLE_SALARY: u32 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalaryRange {
    pub min: u32,
    pub max: u32,
    pub currency: Option<String>,
}

fn pay_context_regex() -> &'static Regex {
    static CONTEXT: OnceLock<Regex> = OnceLock::new();
    CONTEXT.get_or_init(|| {
        Regex::new(r"(?i)\b(?:salary|compensation|pay|base|ote|range|wage)\b")
            .expect("static pay context regex is valid")
    })
}

/// Retirement plans ("401k", "403(b)") and percentages, which read like amounts.
fn benefit_token_regex() -> &'static Regex {
    static BENEFIT: OnceLock<Regex> = OnceLock::new();
    BENEFIT.get_or_init(|| {
        Regex::new(r"(?i)(^|[^$€£\w])40[13]\s*\(?[kb]\)?|\d+(?:\.\d+)?\s*%")
            .expect("static benefit token regex is valid")
    })
}

fn range_regex() -> &'static Regex {
    static RANGE: OnceLock<Regex> = OnceLock::new();
    RANGE.get_or_init(|| {
        Regex::new(
            r"(?i)(?P<c1>[$€£])?\s*(?P<a>\d{1,3}(?:[,.]\d{3})+|\d+(?:\.\d+)?)\s*(?P<ak>k)?\s*(?:-|–|—|to)\s*(?P<c2>[$€£])?\s*(?P<b>\d{1,3}(?:[,.]\d{3})+|\d+(?:\.\d+)?)\s*(?P<bk>k)?(?:\s*(?P<code>USD|EUR|GBP|CAD|AUD)\b)?",
        )
        .expect("static salary range regex is valid")
    })
}

/// Finds the first plausible salary range in `text`. A numeric range only counts
/// when it sits next to a currency marker or on a line that talks about pay.
pub fn parse_salary_range(text: &str) -> Option<SalaryRange> {
    find_range(text, false)
}

/// Like `parse_salary_range`, but every line is taken to be about pay. For
/// answers to a direct salary question ("120k - 150k").
pub fn parse_bare_range(text: &str) -> Option<SalaryRange> {
    find_range(text, true)
}

fn find_range(text: &str, about_pay: bool) -> Option<SalaryRange> {
    for line in text.lines() {
        let pay_context = about_pay || pay_context_regex().is_match(line);
        let line = benefit_token_regex().replace_all(line, "${1} ");
        for caps in range_regex().captures_iter(&line) {
            if let Some(range) = range_from_captures(&caps, pay_context) {
                return Some(range);
            }
        }
    }
    None
}

fn range_from_captures(caps: &Captures<'_>, pay_context: bool) -> Option<SalaryRange> {
    let symbol = caps
        .name("c1")
        .or_else(|| caps.name("c2"))
        .map(|m| m.as_str());
    let code = caps.name("code").map(|m| m.as_str().to_uppercase());
    if symbol.is_none() && code.is_none() && !pay_context {
        return None;
    }

    let a_k = caps.name("ak").is_some();
    let b_k = caps.name("bk").is_some();
    // "$150 - 180k": the suffix on the upper bound applies to both.
    let mut min = parse_amount(caps.name("a")?.as_str(), a_k || b_k)?;
    let mut max = parse_amount(caps.name("b")?.as_str(), b_k || a_k)?;
    if min < MIN_PLAUSIBLE_SALARY || max < MIN_PLAUSIBLE_SALARY {
        return None;
    }
    if symbol.is_none() && code.is_none() && looks_like_years(min, max) {
        return None;
    }
    if min > max {
        std::mem::swap(&mut min, &mut max);
    }

    let currency = code.or_else(|| symbol.and_then(currency_for_symbol).map(str::to_string));
    Some(SalaryRange { min, max, currency })
}

fn looks_like_years(a: u32, b: u32) -> bool {
    (1900..=2100).contains(&a) && (1900..=2100).contains(&b)
}

fn parse_amount(raw: &str, thousands: bool) -> Option<u32> {
    let grouped = raw.contains(',')
        || raw
            .rsplit_once('.')
            .is_some_and(|(_, frac)| frac.len() == 3);
    let value = if grouped {
        raw.replace([',', '.'], "").parse::<f64>().ok()?
    } else {
        raw.parse::<f64>().ok()?
    };
    let value = if thousands { value * 1000.0 } else { value };
    if !(0.0..=u32::MAX as f64).contains(&value) {
        return None;
    }
    Some(value.round() as u32)
}

pub fn currency_for_symbol(symbol: &str) -> Option<&'static str> {
    match symbol {
        "$" => Some("USD"),
        "€" => Some("EUR"),
        "£" => Some("GBP"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_amounts_with_en_dash() {
        let r = parse_salary_range("Compensation: $140,000–$170,000 per year").unwrap();
        assert_eq!((r.min, r.max), (140_000, 170_000));
        assert_eq!(r.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_k_suffix_applies_to_both_bounds() {
        let r = parse_salary_range("$150 - 180k base").unwrap();
        assert_eq!((r.min, r.max), (150_000, 180_000));
    }

    #[test]
    fn test_k_suffix_each_bound() {
        let r = parse_salary_range("Range: £60k to £75k").unwrap();
        assert_eq!((r.min, r.max), (60_000, 75_000));
        assert_eq!(r.currency.as_deref(), Some("GBP"));
    }

    #[test]
    fn test_dot_grouping_and_trailing_code() {
        let r = parse_salary_range("Gehalt 90.000 - 110.000 EUR").unwrap();
        assert_eq!((r.min, r.max), (90_000, 110_000));
        assert_eq!(r.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_bare_range_needs_pay_context() {
        assert!(parse_salary_range("We have 120,000 - 150,000 users").is_none());
        let r = parse_salary_range("Salary 120,000 - 150,000").unwrap();
        assert_eq!((r.min, r.max), (120_000, 150_000));
        assert_eq!(r.currency, None);
    }

    #[test]
    fn test_years_of_experience_is_not_salary() {
        assert!(parse_salary_range("Salary depends on 3-5 years of experience").is_none());
    }

    #[test]
    fn test_date_span_is_not_salary() {
        assert!(parse_salary_range("Remote pay band, tenure 2019 - 2023").is_none());
        assert!(parse_salary_range("Fully remote since 2020 - 2024").is_none());
    }

    #[test]
    fn test_bare_range_answer() {
        assert!(parse_salary_range("120k - 150k").is_none());
        let r = parse_bare_range("120k - 150k").unwrap();
        assert_eq!((r.min, r.max), (120_000, 150_000));
        assert_eq!(r.currency, None);
        assert!(parse_bare_range("3-5 years").is_none());
        assert!(parse_bare_range("2024 - 2025").is_none());
    }

    #[test]
    fn test_retirement_match_is_not_salary() {
        assert!(parse_salary_range("Base pay plus 401k - 4% match").is_none());
        assert!(parse_salary_range("Benefits range from 401(k) to 6% matching").is_none());
        let r = parse_salary_range("Base range $120k - $150k, 401(k) with 4% match").unwrap();
        assert_eq!((r.min, r.max), (120_000, 150_000));
    }

    #[test]
    fn test_inverted_range_is_ordered() {
        let r = parse_salary_range("$170,000 - $140,000").unwrap();
        assert_eq!((r.min, r.max), (140_000, 170_000));
    }
}
