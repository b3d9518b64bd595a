// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporal anchor detection.
//!
//! A bounded set of calendar patterns: month names, four-digit years,
//! weekday names, and common relative period phrases. A question whose
//! anchors are not all visible in the cached digest forces a refresh
//! without consulting the model; questions with no recognised anchor
//! fall through to the model's judgement.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

const MONTHS: &[(&str, &str)] = &[
    ("january", "jan"),
    ("february", "feb"),
    ("march", "mar"),
    ("april", "apr"),
    ("may", "may"),
    ("june", "jun"),
    ("july", "jul"),
    ("august", "aug"),
    ("september", "sep"),
    ("october", "oct"),
    ("november", "nov"),
    ("december", "dec"),
];

const WEEKDAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

const RELATIVE_PHRASES: &[&str] = &[
    "today",
    "yesterday",
    "tomorrow",
    "this week",
    "last week",
    "next week",
    "this weekend",
    "last weekend",
    "next weekend",
    "this month",
    "last month",
    "next month",
    "this year",
    "last year",
    "next year",
];

fn year_pattern() -> &'static Regex {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").expect("year pattern is valid"))
}

/// Extracts the set of temporal anchor tokens visible in `text`.
///
/// Tokens are normalised: months as `month:november`, years as
/// `year:2024`, weekdays as `weekday:saturday`, relative phrases
/// verbatim (e.g. `last month`).
pub fn temporal_anchors(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    let mut anchors = BTreeSet::new();

    let words: BTreeSet<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    for (full, abbrev) in MONTHS {
        // "may" as an abbreviation is too ambiguous to count alone.
        if words.contains(full) || (*abbrev != "may" && words.contains(abbrev)) {
            anchors.insert(format!("month:{full}"));
        }
    }

    for day in WEEKDAYS {
        if words.contains(day) {
            anchors.insert(format!("weekday:{day}"));
        }
    }

    for year in year_pattern().find_iter(&lower) {
        anchors.insert(format!("year:{}", year.as_str()));
    }

    for phrase in RELATIVE_PHRASES {
        if lower.contains(phrase) {
            anchors.insert((*phrase).to_string());
        }
    }

    anchors
}

/// True when the question carries at least one anchor that is not
/// visible in the digest text.
pub fn anchors_shifted(question: &str, digest_text: &str) -> bool {
    let question_anchors = temporal_anchors(question);
    if question_anchors.is_empty() {
        return false;
    }
    let digest_anchors = temporal_anchors(digest_text);
    question_anchors
        .iter()
        .any(|anchor| !digest_anchors.contains(anchor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_and_years_detected() {
        let anchors = temporal_anchors("How many incidents in November 2024?");
        assert!(anchors.contains("month:november"));
        assert!(anchors.contains("year:2024"));
    }

    #[test]
    fn month_abbreviations_detected() {
        let anchors = temporal_anchors("stats for Oct?");
        assert!(anchors.contains("month:october"));
    }

    #[test]
    fn bare_may_not_counted_as_month_abbreviation() {
        // "may" the modal verb must not register as the month.
        let anchors = temporal_anchors("may I see the totals?");
        assert!(anchors.is_empty());
    }

    #[test]
    fn full_may_detected() {
        let anchors = temporal_anchors("what happened in May?");
        assert!(anchors.contains("month:may"));
    }

    #[test]
    fn relative_phrases_detected() {
        let anchors = temporal_anchors("What events are on this weekend?");
        assert!(anchors.contains("this weekend"));
    }

    #[test]
    fn weekdays_detected() {
        let anchors = temporal_anchors("anything happening on Saturday?");
        assert!(anchors.contains("weekday:saturday"));
    }

    #[test]
    fn no_anchor_in_plain_question() {
        assert!(temporal_anchors("What do residents say about traffic?").is_empty());
    }

    #[test]
    fn shift_when_question_names_unseen_month() {
        assert!(anchors_shifted(
            "What about October?",
            "last answer: There were 42 reports in November 2024.",
        ));
    }

    #[test]
    fn no_shift_when_anchor_matches_digest() {
        assert!(!anchors_shifted(
            "Break down the November numbers.",
            "last answer: There were 42 reports in November 2024.",
        ));
    }

    #[test]
    fn no_shift_without_question_anchor() {
        assert!(!anchors_shifted(
            "Tell me more about that.",
            "last answer: There were 42 reports in November 2024.",
        ));
    }

    #[test]
    fn year_only_shift_detected() {
        assert!(anchors_shifted(
            "And in 2023?",
            "last answer: There were 42 reports in November 2024.",
        ));
    }
}
