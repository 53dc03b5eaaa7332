// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `RawListing` to `Listing` normalization.
//!
//! Normalization is total: a missing or unrecognized optional field becomes
//! `None` or the `unspecified` variant, never an error. The only rejected
//! input is a blank `source_id`, since it cannot be deduplicated.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use frilans_core::types::{
    ExperienceLevel, Listing, PaymentType, ProjectType, RawListing, SourceKind,
};

const UNTITLED: &str = "(untitled)";

/// A number optionally preceded by a range marker. Thousands may be grouped
/// with spaces, no-break spaces, or commas.
static BUDGET_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\b(от|from|до|up to|to)\s*)?(\d{1,3}(?:[ \u{a0},]\d{3})+|\d+)(?:\.(\d+))?",
    )
    .unwrap()
});

const EXPERIENCE_RULES: &[(ExperienceLevel, &[&str])] = &[
    (
        ExperienceLevel::Junior,
        &["junior", "начинающ", "стажер", "стажёр", "entry level", "entry-level"],
    ),
    (
        ExperienceLevel::Mid,
        &["middle", "mid-level", "intermediate", "средний уровень"],
    ),
    (
        ExperienceLevel::Senior,
        &["senior", "старший", "эксперт", "expert", "lead"],
    ),
];

const PAYMENT_RULES: &[(PaymentType, &[&str])] = &[
    (PaymentType::Prepay, &["предоплат", "prepay", "upfront"]),
    (
        PaymentType::Postpay,
        &["постоплат", "postpay", "оплата по факту"],
    ),
    (
        PaymentType::Escrow,
        &["безопасная сделка", "escrow", "safe deal"],
    ),
];

const PROJECT_RULES: &[(ProjectType, &[&str])] = &[
    (
        ProjectType::Hourly,
        &["почасов", "hourly", "в час", "за час", "per hour", "/hr"],
    ),
    (
        ProjectType::Fixed,
        &["фиксирован", "fixed price", "fixed budget", "fixed-price"],
    ),
];

/// Normalize one raw listing reported by `source`.
///
/// Returns `None` when the listing has no usable `source_id`.
pub fn normalize(source: SourceKind, raw: RawListing, fetched_at: DateTime<Utc>) -> Option<Listing> {
    let source_id = raw.source_id.trim().to_string();
    if source_id.is_empty() {
        return None;
    }

    let title = match raw.title.trim() {
        "" => UNTITLED.to_string(),
        t => t.to_string(),
    };
    let description = raw.description.unwrap_or_default().trim().to_string();
    let text = format!("{title}\n{description}").to_lowercase();

    let (budget_min, budget_max) = match (clean_amount(raw.budget_min), clean_amount(raw.budget_max)) {
        (None, None) => raw
            .budget_text
            .as_deref()
            .map(parse_budget_text)
            .unwrap_or((None, None)),
        (Some(a), Some(b)) if a > b => (Some(b), Some(a)),
        bounds => bounds,
    };
    let currency = raw
        .currency
        .as_deref()
        .and_then(normalize_currency)
        .or_else(|| raw.budget_text.as_deref().and_then(infer_currency));

    Some(Listing {
        source,
        source_id,
        title,
        description,
        url: raw.url.unwrap_or_default().trim().to_string(),
        budget_min,
        budget_max,
        currency,
        regions: term_set(raw.regions),
        technologies: term_set(raw.technologies),
        project_type: resolve(raw.project_type.as_deref(), &text, PROJECT_RULES),
        experience_level: resolve(raw.experience_level.as_deref(), &text, EXPERIENCE_RULES),
        payment_type: resolve(raw.payment_type.as_deref(), &text, PAYMENT_RULES),
        posted_at: raw.posted_at.as_deref().and_then(parse_posted_at),
        fetched_at,
    })
}

fn clean_amount(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

fn term_set(terms: Vec<String>) -> BTreeSet<String> {
    terms
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parse a free-form budget such as `"от 10 000 до 20 000 руб."`,
/// `"$500"` or `"up to 3,000 USD"` into `(min, max)`.
///
/// A single unmarked amount is an exact budget and fills both bounds.
pub fn parse_budget_text(text: &str) -> (Option<f64>, Option<f64>) {
    let mut amounts = Vec::new();
    for caps in BUDGET_NUMBER.captures_iter(text) {
        let marker = caps.get(1).map(|m| m.as_str().to_lowercase());
        let digits: String = caps[2].chars().filter(char::is_ascii_digit).collect();
        let Ok(mut value) = digits.parse::<f64>() else {
            continue;
        };
        if let Some(frac) = caps.get(3)
            && let Ok(frac) = format!("0.{}", frac.as_str()).parse::<f64>()
        {
            value += frac;
        }
        amounts.push((marker, value));
    }

    match amounts.as_slice() {
        [] => (None, None),
        [(Some(m), v)] if m == "от" || m == "from" => (Some(*v), None),
        [(Some(_), v)] => (None, Some(*v)),
        [(None, v)] => (Some(*v), Some(*v)),
        [(_, a), (_, b), ..] => (Some(a.min(*b)), Some(a.max(*b))),
    }
}

fn normalize_currency(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    infer_currency(trimmed).or_else(|| Some(trimmed.to_uppercase()))
}

fn infer_currency(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let code = if lower.contains("руб") || lower.contains('₽') || lower.contains("rub") {
        "RUB"
    } else if lower.contains('$') || lower.contains("usd") || lower.contains("долл") {
        "USD"
    } else if lower.contains('€') || lower.contains("eur") || lower.contains("евро") {
        "EUR"
    } else {
        return None;
    };
    Some(code.to_string())
}

/// Best-effort parse of a source-reported timestamp. Naive forms are taken as UTC.
pub fn parse_posted_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d.%m.%Y %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in ["%Y-%m-%d", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

/// Explicit value first, then keyword inference over the explicit value and
/// the listing text. Inference only commits when exactly one category hits.
fn resolve<T>(explicit: Option<&str>, text: &str, rules: &[(T, &[&str])]) -> T
where
    T: FromStr + Copy + Default + PartialEq,
{
    if let Some(raw) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        if let Ok(value) = T::from_str(raw) {
            return value;
        }
        if let Some(value) = infer(&raw.to_lowercase(), rules) {
            return value;
        }
    }
    infer(text, rules).unwrap_or_default()
}

fn infer<T: Copy>(text: &str, rules: &[(T, &[&str])]) -> Option<T> {
    let mut hits = rules
        .iter()
        .filter(|(_, needles)| needles.iter().any(|n| text.contains(n)))
        .map(|(value, _)| *value);
    match (hits.next(), hits.next()) {
        (Some(value), None) => Some(value),
        _ => None,
    }
}
