//! Salary negotiator: the `salary-negotiation` composite.
//!
//! Current/target salary come from a currency progression (`45k€ → 52k€`) or
//! from labeled amounts; the market range from `entre X et Y` or `X - Y €`.
//! Strategies are rated on a fixed risk ladder.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::artifacts::detectors::chart::parse_progressions;
use crate::artifacts::generators::{CompositeGenerator, GeneratorInput};
use crate::artifacts::models::{
    Artifact, ArtifactData, ArtifactType, NegotiationStrategy, Priority, Risk, SalaryData,
    SalaryRange,
};
use crate::artifacts::patterns::{amount, cached_regex};
use crate::artifacts::text::{
    clean_inline, headed_bullets, normalize_key, normalize_unit, parse_amount, truncate_chars,
};

const BASE_CONFIDENCE: u8 = 60;
const FIGURE_BONUS: u8 = 10;
const RANGE_BONUS: u8 = 10;
const STRATEGY_BONUS: u8 = 5;
const MAX_CONFIDENCE: u8 = 95;

const MAX_STRATEGIES: usize = 6;
const MAX_ARGUMENTS: usize = 8;
const MAX_STRATEGY_NAME_CHARS: usize = 60;
const MAX_SUCCESS_RATE: u8 = 90;
const QUANTIFIED_BONUS: u8 = 5;

/// Below this a "range" is a duration or a count, not a salary.
const MIN_SALARY: f64 = 1_000.0;

const CURRENCY_SYMBOLS: &[&str] = &["€", "$", "£"];

const HIGH_RISK_MARKERS: &[&str] = &[
    "risqué",
    "risque élevé",
    "agressi",
    "ultimatum",
    "offre concurrente",
    "contre-offre",
    "démission",
    "quitter",
    "aggressive",
    "high risk",
    "competing offer",
    "counter-offer",
];
const LOW_RISK_MARKERS: &[&str] = &[
    "sans risque",
    "faible risque",
    "données du marché",
    "étude de marché",
    "préparer",
    "valoriser",
    "documenter",
    "low risk",
    "market data",
    "prepare",
    "document",
    "highlight",
];

static CURRENT_SALARY: OnceLock<Regex> = OnceLock::new();
static TARGET_SALARY: OnceLock<Regex> = OnceLock::new();
static RANGE_WORDS: OnceLock<Regex> = OnceLock::new();
static RANGE_DASH: OnceLock<Regex> = OnceLock::new();
static STRATEGY_LINE: OnceLock<Regex> = OnceLock::new();
static STRATEGY_HEADING: OnceLock<Regex> = OnceLock::new();
static ARGUMENT_HEADING: OnceLock<Regex> = OnceLock::new();

const CURRENT_SALARY_SOURCE: &str = concat!(
    r"(?i)(?:salaire actuel|r[ée]mun[ée]ration actuelle|current salary|current pay)[^\n\d€$£]{0,20}?(?P<cur>[€$£])?[ \t]*(?P<amount>",
    amount!(),
    r")[ \t]*(?P<mult>[kKM])?[ \t]*(?P<unit>[€$£]|euros?|eur|usd)?"
);
const TARGET_SALARY_SOURCE: &str = concat!(
    r"(?i)(?:salaire (?:vis[ée]|cible|souhait[ée]|demand[ée])|objectif salarial|pr[ée]tentions?(?: salariales?)?|target salary|salary target)[^\n\d€$£]{0,20}?(?P<cur>[€$£])?[ \t]*(?P<amount>",
    amount!(),
    r")[ \t]*(?P<mult>[kKM])?[ \t]*(?P<unit>[€$£]|euros?|eur|usd)?"
);
const RANGE_WORDS_SOURCE: &str = concat!(
    r"(?i)\b(?:entre|between)[ \t]+(?P<cur1>[€$£])?[ \t]*(?P<min>",
    amount!(),
    r")[ \t]*(?P<mult1>[kKM])?[ \t]*(?P<unit1>[€$£]|euros?)?[ \t]+(?:et|and)[ \t]+(?P<cur2>[€$£])?[ \t]*(?P<max>",
    amount!(),
    r")[ \t]*(?P<mult2>[kKM])?[ \t]*(?P<unit2>[€$£]|euros?)?"
);
const RANGE_DASH_SOURCE: &str = concat!(
    r"(?P<cur1>[€$£])?[ \t]*(?P<min>",
    amount!(),
    r")[ \t]*(?P<mult1>[kKM])?[ \t]*(?P<unit1>[€$£])?[ \t]*(?:-|–|à|to)[ \t]*(?P<cur2>[€$£])?[ \t]*(?P<max>",
    amount!(),
    r")[ \t]*(?P<mult2>[kKM])?[ \t]*(?P<unit2>[€$£]|euros?)"
);
const STRATEGY_LINE_SOURCE: &str = r"(?mi)^[ \t]*(?:[-*•][ \t]+|#{1,6}[ \t]+)?(?:\*\*)?(?:strat[ée]gie|strategy|option)[ \t]*(?P<n>\d{1,2})?[ \t]*(?:\*\*)?[ \t]*[:.\-–][ \t]*(?:\*\*)?(?P<text>[^\n]+)$";
const STRATEGY_HEADING_SOURCE: &str = r"(?i)^(?:#{1,6}[ \t]*)?(?:\*\*)?[ \t]*(?:strat[ée]gies|strategies|tactiques|tactics|approches|leviers de n[ée]gociation)\b";
const ARGUMENT_HEADING_SOURCE: &str = r"(?i)^(?:#{1,6}[ \t]*)?(?:\*\*)?[ \t]*(?:arguments?|points? (?:de|à|a) (?:n[ée]gociation|mettre en avant)|justifications?|talking points|key arguments)\b";

pub struct SalaryNegotiator;

impl CompositeGenerator for SalaryNegotiator {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::SalaryNegotiator
    }

    fn generate(&self, input: &GeneratorInput<'_>) -> Option<Artifact> {
        let content = input.content;
        let figures = salary_figures(content);
        let market_range = market_range(content);
        let strategies = strategies(content);

        let has_figure = figures.current.is_some() || figures.target.is_some();
        if !has_figure && market_range.is_none() && strategies.is_empty() {
            return None;
        }

        let arguments = headed_bullets(
            content,
            cached_regex(&ARGUMENT_HEADING, ARGUMENT_HEADING_SOURCE),
            MAX_ARGUMENTS,
        );

        let mut confidence = BASE_CONFIDENCE;
        if has_figure {
            confidence += FIGURE_BONUS;
        }
        if market_range.is_some() {
            confidence += RANGE_BONUS;
        }
        let per_strategy = (strategies.len() as u8).saturating_mul(STRATEGY_BONUS);
        confidence = confidence.saturating_add(per_strategy).min(MAX_CONFIDENCE);

        let (market_range, range_currency) = match market_range {
            Some((range, currency)) => (Some(range), currency),
            None => (None, None),
        };
        let data = SalaryData {
            current_salary: figures.current,
            target_salary: figures.target,
            market_range,
            currency: figures.currency.or(range_currency),
            strategies,
            arguments,
        };
        Some(Artifact::new(
            ArtifactType::SalaryNegotiator,
            "Salary Negotiation Plan",
            ArtifactData::SalaryNegotiator(data),
            confidence,
            content,
            Some(input.service_id),
            Priority::High,
        ))
    }
}

#[derive(Debug, Default)]
struct SalaryFigures {
    current: Option<f64>,
    target: Option<f64>,
    currency: Option<String>,
}

fn salary_figures(content: &str) -> SalaryFigures {
    let progression = parse_progressions(content).into_iter().find(|p| {
        p.unit
            .as_deref()
            .is_some_and(|unit| CURRENCY_SYMBOLS.contains(&unit))
            && p.from >= MIN_SALARY
            && p.to >= MIN_SALARY
    });
    if let Some(p) = progression {
        return SalaryFigures {
            current: Some(p.from),
            target: Some(p.to),
            currency: p.unit,
        };
    }

    let current = labeled_amount(content, cached_regex(&CURRENT_SALARY, CURRENT_SALARY_SOURCE));
    let target = labeled_amount(content, cached_regex(&TARGET_SALARY, TARGET_SALARY_SOURCE));
    let currency = current
        .as_ref()
        .and_then(|(_, cur)| cur.clone())
        .or_else(|| target.as_ref().and_then(|(_, cur)| cur.clone()));
    SalaryFigures {
        current: current.map(|(amount, _)| amount),
        target: target.map(|(amount, _)| amount),
        currency,
    }
}

fn labeled_amount(content: &str, pattern: &Regex) -> Option<(f64, Option<String>)> {
    pattern.captures_iter(content).find_map(|caps| {
        let amount = parse_amount(caps.name("amount")?.as_str(), group(&caps, "mult"))?;
        (amount >= MIN_SALARY).then(|| (amount, currency_of(&caps, &["unit", "cur"])))
    })
}

fn market_range(content: &str) -> Option<(SalaryRange, Option<String>)> {
    let patterns = [
        cached_regex(&RANGE_WORDS, RANGE_WORDS_SOURCE),
        cached_regex(&RANGE_DASH, RANGE_DASH_SOURCE),
    ];
    patterns
        .into_iter()
        .flat_map(|pattern| pattern.captures_iter(content))
        .find_map(|caps| parse_range(&caps))
}

fn parse_range(caps: &Captures<'_>) -> Option<(SalaryRange, Option<String>)> {
    let mult1 = group(caps, "mult1");
    let mult2 = group(caps, "mult2");
    // "45 - 55 k€": the trailing multiplier applies to both bounds.
    let min = parse_amount(caps.name("min")?.as_str(), mult1.or(mult2))?;
    let max = parse_amount(caps.name("max")?.as_str(), mult2.or(mult1))?;
    if min < MIN_SALARY || max <= min {
        return None;
    }
    let currency = currency_of(caps, &["unit2", "unit1", "cur2", "cur1"]);
    Some((SalaryRange { min, max }, currency))
}

fn group<'h>(caps: &Captures<'h>, name: &str) -> Option<&'h str> {
    caps.name(name).map(|m| m.as_str())
}

fn currency_of(caps: &Captures<'_>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| group(caps, name))
        .find_map(normalize_unit)
}

fn strategies(content: &str) -> Vec<NegotiationStrategy> {
    let lines = cached_regex(&STRATEGY_LINE, STRATEGY_LINE_SOURCE)
        .captures_iter(content)
        .filter_map(|caps| caps.name("text").map(|m| clean_inline(m.as_str())));
    let listed = headed_bullets(
        content,
        cached_regex(&STRATEGY_HEADING, STRATEGY_HEADING_SOURCE),
        MAX_STRATEGIES,
    );

    let mut seen = HashSet::new();
    lines
        .chain(listed)
        .filter(|text| !text.is_empty() && seen.insert(normalize_key(text)))
        .take(MAX_STRATEGIES)
        .map(|text| rate_strategy(&text))
        .collect()
}

/// `"Ancrage haut : annoncer 55k€"` → name `Ancrage haut`, described by the rest.
fn rate_strategy(text: &str) -> NegotiationStrategy {
    let (name, description) = match text.split_once(':').or_else(|| text.split_once(" - ")) {
        Some((name, rest)) if !name.trim().is_empty() && !rest.trim().is_empty() => {
            (name.trim().to_string(), rest.trim().to_string())
        }
        _ => (truncate_chars(text, MAX_STRATEGY_NAME_CHARS), text.to_string()),
    };

    let risk = risk_of(text);
    let (base_rate, timeframe) = match risk {
        Risk::Low => (75, "Immediate"),
        Risk::Medium => (60, "1-3 months"),
        Risk::High => (35, "3-6 months"),
    };
    let quantified = if text.chars().any(|c| c.is_ascii_digit()) { QUANTIFIED_BONUS } else { 0 };

    NegotiationStrategy {
        name: truncate_chars(&name, MAX_STRATEGY_NAME_CHARS),
        description,
        risk,
        success_rate: (base_rate + quantified).min(MAX_SUCCESS_RATE),
        timeframe: timeframe.to_string(),
    }
}

fn risk_of(text: &str) -> Risk {
    let lowered = text.to_lowercase();
    if HIGH_RISK_MARKERS.iter().any(|m| lowered.contains(m)) {
        Risk::High
    } else if LOW_RISK_MARKERS.iter().any(|m| lowered.contains(m)) {
        Risk::Low
    } else {
        Risk::Medium
    }
}
