//! Keyword coverage: expected keywords vs. what the CV actually contains.
//!
//! Expected keywords come from user context (`targetKeywords` / `keywords`) or
//! from `Mots-clés: a, b, c` lines in the AI text. Expected counts come from the
//! job description when one is supplied; detected counts from the CV text when
//! supplied, otherwise from the AI text with the keyword lists removed.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::artifacts::generators::GeneratorInput;
use crate::artifacts::models::KeywordMatch;
use crate::artifacts::patterns::cached_regex;
use crate::artifacts::text::{count_occurrences, strip_markdown};

const MAX_KEYWORDS: usize = 15;
const MAX_KEYWORD_CHARS: usize = 40;
const MAX_EXPECTED_COUNT: u32 = 5;

const MATCH_POINTS: i32 = 3;
const GAP_POINTS: i32 = 2;
const MAX_GAP_PENALTY: i32 = 10;

static KEYWORD_LIST: OnceLock<Regex> = OnceLock::new();
const KEYWORD_LIST_SOURCE: &str = r"(?mi)^[ \t]*(?:[-*•][ \t]+)?(?:\*\*)?(?:mots[- ]cl[ée]s|keywords?)(?P<qualifier>[ \t]+[\p{L}'’ ]{1,30}?)?(?:\*\*)?[ \t]*:(?:\*\*)?[ \t]*(?P<list>[^\n]+)$";

/// What the text already says about a keyword list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListedAs {
    Missing,
    Present,
    Unspecified,
}

#[derive(Debug, Clone)]
struct ExpectedKeyword {
    keyword: String,
    listed_as: ListedAs,
}

/// One `KeywordMatch` per expected keyword, in first-seen order.
pub fn keyword_matches(input: &GeneratorInput<'_>) -> Vec<KeywordMatch> {
    let expected = expected_keywords(input);
    if expected.is_empty() {
        return Vec::new();
    }

    let job_description = input.context_str_any(&["jobDescription", "jobOffer"]);
    let cv_text = input.context_str_any(&["cvText", "resumeText"]);
    let prose = cached_regex(&KEYWORD_LIST, KEYWORD_LIST_SOURCE).replace_all(input.content, "");

    expected
        .into_iter()
        .map(|entry| {
            let expected_count = job_description
                .map(|jd| count_occurrences(jd, &entry.keyword).clamp(1, MAX_EXPECTED_COUNT))
                .unwrap_or(1);
            let detected = match (cv_text, entry.listed_as) {
                (Some(cv), _) => count_occurrences(cv, &entry.keyword),
                (None, ListedAs::Missing) => 0,
                (None, ListedAs::Present) => count_occurrences(&prose, &entry.keyword).max(1),
                (None, ListedAs::Unspecified) => count_occurrences(&prose, &entry.keyword),
            };
            KeywordMatch {
                impact: keyword_impact(expected_count, detected),
                keyword: entry.keyword,
                expected: expected_count,
                detected,
            }
        })
        .collect()
}

/// `+3` when the expected count is met, otherwise `-2` per missing occurrence,
/// floored at `-10`.
pub fn keyword_impact(expected: u32, detected: u32) -> i32 {
    if detected >= expected {
        return MATCH_POINTS;
    }
    let missing = (expected - detected) as i32;
    -(missing * GAP_POINTS).min(MAX_GAP_PENALTY)
}

/// Weighted coverage in 0–100: each keyword contributes `min(detected, expected) / expected`.
pub fn keyword_coverage(matches: &[KeywordMatch]) -> Option<u32> {
    if matches.is_empty() {
        return None;
    }
    let covered: f64 = matches
        .iter()
        .map(|m| m.detected.min(m.expected) as f64 / m.expected.max(1) as f64)
        .sum();
    Some((covered / matches.len() as f64 * 100.0).round() as u32)
}

fn expected_keywords(input: &GeneratorInput<'_>) -> Vec<ExpectedKeyword> {
    let mut from_context: Vec<String> = input.context_list("targetKeywords");
    if from_context.is_empty() {
        from_context = input.context_list("keywords");
    }

    let entries: Vec<ExpectedKeyword> = if from_context.is_empty() {
        listed_keywords(input.content)
    } else {
        from_context
            .into_iter()
            .map(|keyword| ExpectedKeyword {
                keyword,
                listed_as: ListedAs::Unspecified,
            })
            .collect()
    };

    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            let len = entry.keyword.chars().count();
            len > 0 && len <= MAX_KEYWORD_CHARS && seen.insert(entry.keyword.to_lowercase())
        })
        .take(MAX_KEYWORDS)
        .collect()
}

fn listed_keywords(content: &str) -> Vec<ExpectedKeyword> {
    cached_regex(&KEYWORD_LIST, KEYWORD_LIST_SOURCE)
        .captures_iter(content)
        .flat_map(|caps| {
            let qualifier = caps
                .name("qualifier")
                .map(|m| m.as_str().to_lowercase())
                .unwrap_or_default();
            let listed_as = classify_list(&qualifier);
            let list = caps.name("list").map_or("", |m| m.as_str());
            split_keywords(list)
                .into_iter()
                .map(move |keyword| ExpectedKeyword { keyword, listed_as })
        })
        .collect()
}

fn classify_list(qualifier: &str) -> ListedAs {
    const MISSING: &[&str] = &["manquant", "absent", "missing", "à ajouter", "a ajouter", "to add"];
    const PRESENT: &[&str] = &["présent", "present", "détecté", "detecte", "found", "trouvé", "identifié"];
    if MISSING.iter().any(|m| qualifier.contains(m)) {
        ListedAs::Missing
    } else if PRESENT.iter().any(|p| qualifier.contains(p)) {
        ListedAs::Present
    } else {
        ListedAs::Unspecified
    }
}

fn split_keywords(list: &str) -> Vec<String> {
    list.split(|c: char| matches!(c, ',' | ';' | '/' | '|' | '·'))
        .map(|part| strip_markdown(part).trim_end_matches('.').trim().to_string())
        // "Mots-clés : 40%" is a sub-score line, not a list.
        .filter(|part| part.chars().any(char::is_alphabetic))
        .collect()
}
