// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text message rendering.

use std::collections::BTreeSet;

use frilans_core::types::{Listing, StoredListing};

const ELLIPSIS: char = '…';

/// Renders listings into message text.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    description_max_chars: usize,
}

impl Renderer {
    pub fn new(description_max_chars: usize) -> Self {
        Self {
            description_max_chars,
        }
    }

    /// Message body for an instant notification. `part` is 1-based.
    pub fn instant(&self, listings: &[StoredListing], part: usize, parts: usize) -> String {
        let mut out = String::new();
        if parts > 1 {
            out.push_str(&format!("New listings (part {part}/{parts})\n\n"));
        }
        self.push_blocks(&mut out, listings);
        out
    }

    /// Message body for one part of a daily digest covering `total` listings.
    pub fn digest(
        &self,
        listings: &[StoredListing],
        total: usize,
        part: usize,
        parts: usize,
    ) -> String {
        let mut out = format!("Daily digest: {total} new {}", plural(total));
        if parts > 1 {
            out.push_str(&format!(" (part {part}/{parts})"));
        }
        out.push_str("\n\n");
        self.push_blocks(&mut out, listings);
        out
    }

    fn push_blocks(&self, out: &mut String, listings: &[StoredListing]) {
        let blocks: Vec<String> = listings.iter().map(|s| self.block(&s.listing)).collect();
        out.push_str(&blocks.join("\n\n"));
    }

    fn block(&self, l: &Listing) -> String {
        let mut lines = vec![l.title.clone()];
        if !l.description.is_empty() {
            lines.push(truncate(&l.description, self.description_max_chars));
        }
        if let Some(budget) = budget_line(l) {
            lines.push(format!("Budget: {budget}"));
        }
        if !l.regions.is_empty() {
            lines.push(format!("Regions: {}", joined(&l.regions)));
        }
        if !l.technologies.is_empty() {
            lines.push(format!("Technologies: {}", joined(&l.technologies)));
        }
        if !l.url.is_empty() {
            lines.push(l.url.clone());
        }
        lines.join("\n")
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "listing" } else { "listings" }
}

fn joined(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Cut to at most `max` characters, the last being an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.truncate(cut.trim_end().len());
    cut.push(ELLIPSIS);
    cut
}

fn amount(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn budget_line(l: &Listing) -> Option<String> {
    let range = match (l.budget_min, l.budget_max) {
        (None, None) => return None,
        (Some(a), Some(b)) if a == b => amount(a),
        (Some(a), Some(b)) => format!("{}–{}", amount(a), amount(b)),
        (Some(a), None) => format!("from {}", amount(a)),
        (None, Some(b)) => format!("up to {}", amount(b)),
    };
    Some(match &l.currency {
        Some(c) => format!("{range} {c}"),
        None => range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use frilans_core::types::{
        ExperienceLevel, ListingId, PaymentType, ProjectType, SourceKind,
    };

    fn stored(title: &str, description: &str) -> StoredListing {
        StoredListing {
            id: ListingId(1),
            listing: Listing {
                source: SourceKind::FlRu,
                source_id: "1".into(),
                title: title.into(),
                description: description.into(),
                url: "https://fl.example/projects/1".into(),
                budget_min: Some(10_000.0),
                budget_max: Some(20_000.0),
                currency: Some("RUB".into()),
                regions: BTreeSet::new(),
                technologies: ["python".to_string(), "django".to_string()].into(),
                project_type: ProjectType::Fixed,
                experience_level: ExperienceLevel::Unspecified,
                payment_type: PaymentType::Unspecified,
                posted_at: None,
                fetched_at: Utc::now(),
            },
        }
    }

    #[test]
    fn truncate_respects_char_limit() {
        assert_eq!(truncate("short", 10), "short");
        let cut = truncate("Нужен телеграм бот для магазина", 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with(ELLIPSIS));
        assert_eq!(truncate("hello world", 7), "hello…");
    }

    #[test]
    fn block_lists_every_known_field() {
        let text = Renderer::new(300).instant(&[stored("Shop backend", "Cart and checkout")], 1, 1);
        assert!(text.starts_with("Shop backend\nCart and checkout\n"));
        assert!(text.contains("Budget: 10000–20000 RUB"));
        assert!(text.contains("Technologies: django, python"));
        assert!(!text.contains("Regions:"));
        assert!(text.ends_with("https://fl.example/projects/1"));
    }

    #[test]
    fn digest_header_counts_and_numbers_parts() {
        let r = Renderer::new(300);
        let one = r.digest(&[stored("A", "")], 1, 1, 1);
        assert!(one.starts_with("Daily digest: 1 new listing\n\n"));
        let split = r.digest(&[stored("A", "")], 7, 2, 2);
        assert!(split.starts_with("Daily digest: 7 new listings (part 2/2)"));
    }

    #[test]
    fn open_budget_ranges() {
        let mut s = stored("A", "");
        s.listing.budget_max = None;
        assert_eq!(budget_line(&s.listing).unwrap(), "from 10000 RUB");
        s.listing.budget_min = None;
        s.listing.budget_max = Some(99.5);
        s.listing.currency = None;
        assert_eq!(budget_line(&s.listing).unwrap(), "up to 99.50");
    }
}
