//! Roadmap detector: phased, ordinal, and relative-time step sequences.

use std::sync::OnceLock;

use regex::Regex;

use crate::artifacts::detectors::DetectedArtifact;
use crate::artifacts::models::{
    Artifact, ArtifactData, ArtifactFamily, ArtifactType, RoadmapData, RoadmapStep, ServiceId,
    Span,
};
use crate::artifacts::patterns::{cached_regex, library, ArtifactCandidate};
use crate::artifacts::prioritizer::priority_for_confidence;
use crate::artifacts::text::{clean_inline, excerpt, heading_above};

pub const MIN_STEPS: usize = 2;
pub const DEFAULT_CURRENT_POSITION: &str = "Current position";

const STEP_BONUS: u8 = 5;
const RELATIVE_TIME_BONUS: u8 = 5;
const MAX_CONFIDENCE: u8 = 90;

const MIN_PROBABILITY: f64 = 20.0;
const MAX_PROBABILITY: f64 = 90.0;

static CURRENT_POSITION: OnceLock<Regex> = OnceLock::new();
static TARGET_POSITION: OnceLock<Regex> = OnceLock::new();

const CURRENT_POSITION_SOURCE: &str = r"(?mi)^[ \t]*(?:[-*•][ \t]+)?(?:\*\*)?(?:poste actuel|position actuelle|situation actuelle|current (?:role|position)|actuellement)(?:\*\*)?[ \t]*:(?:\*\*)?[ \t]*(?P<value>[^\n]+)$";
const TARGET_POSITION_SOURCE: &str = r"(?mi)^[ \t]*(?:[-*•][ \t]+)?(?:\*\*)?(?:objectif(?: final)?|poste (?:vis[ée]|cible)|target (?:role|position)|goal)(?:\*\*)?[ \t]*:(?:\*\*)?[ \t]*(?P<value>[^\n]+)$";

/// Ordered steps plus what the confidence and probability heuristics need.
#[derive(Debug, Clone, Default)]
pub struct RoadmapExtraction {
    pub steps: Vec<RoadmapStep>,
    pub spans: Vec<Span>,
    /// Steps carrying a concrete timeframe (relative time or a phase duration).
    pub timed_steps: usize,
    pub has_relative_time: bool,
    last_timeframe: Option<String>,
}

impl RoadmapExtraction {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn confidence(&self) -> u8 {
        let extra = self.len().saturating_sub(MIN_STEPS).min(u8::MAX as usize) as u8;
        let relative = if self.has_relative_time { RELATIVE_TIME_BONUS } else { 0 };
        library()
            .roadmap_phase
            .base_confidence
            .saturating_add(extra.saturating_mul(STEP_BONUS))
            .saturating_add(relative)
            .min(MAX_CONFIDENCE)
    }

    /// Overall horizon: the last concrete timeframe, else the step count.
    pub fn timeframe(&self) -> String {
        self.last_timeframe
            .clone()
            .unwrap_or_else(|| format!("{} steps", self.len()))
    }
}

struct StepMatch {
    span: Span,
    step: RoadmapStep,
    timed: bool,
    relative: bool,
}

pub fn detect_roadmaps(content: &str, service_id: Option<ServiceId>) -> Vec<DetectedArtifact> {
    let extraction = extract_steps(content);
    if extraction.len() < MIN_STEPS {
        return Vec::new();
    }
    let confidence = extraction.confidence();
    let data = build_roadmap_data(content, &extraction, None, None);
    let source = Span::covering(&extraction.spans)
        .map(|s| excerpt(content, s.start, s.end))
        .unwrap_or_default();
    let title = heading_above(content, extraction.spans[0].start, "Roadmap");

    let artifact = Artifact::new(
        ArtifactType::Roadmap,
        title,
        ArtifactData::Roadmap(data),
        confidence,
        source,
        service_id,
        priority_for_confidence(confidence),
    );
    vec![DetectedArtifact::new(ArtifactFamily::Roadmap, artifact, extraction.spans)]
}

/// Steps from all three roadmap rules, one per line, in document order.
pub fn extract_steps(content: &str) -> RoadmapExtraction {
    let lib = library();
    let mut matches: Vec<StepMatch> = Vec::new();
    matches.extend(lib.roadmap_phase.candidates(content).filter_map(|c| phase_step(&c)));
    matches.extend(lib.roadmap_ordinal.candidates(content).filter_map(|c| ordinal_step(&c)));
    matches.extend(lib.roadmap_relative.candidates(content).filter_map(|c| relative_step(&c)));
    matches.sort_by_key(|m| m.span.start);

    let mut extraction = RoadmapExtraction::default();
    let mut last_end = 0usize;
    for m in matches {
        if !extraction.spans.is_empty() && m.span.start < last_end {
            continue;
        }
        last_end = m.span.end;
        if m.timed {
            extraction.timed_steps += 1;
            extraction.last_timeframe = Some(m.step.timeframe.clone());
        }
        extraction.has_relative_time |= m.relative;
        extraction.spans.push(m.span);
        extraction.steps.push(m.step);
    }
    extraction
}

fn phase_step(candidate: &ArtifactCandidate<'_>) -> Option<StepMatch> {
    let number = candidate.group("n")?;
    let time = candidate.group("time").map(str::trim).filter(|t| !t.is_empty());
    let timeframe = match time {
        Some(time) => time.to_string(),
        None => format!("Phase {number}"),
    };
    step_match(candidate, timeframe, time.is_some(), false)
}

fn ordinal_step(candidate: &ArtifactCandidate<'_>) -> Option<StepMatch> {
    let index = ordinal_index(&candidate.group("ord")?.to_lowercase())?;
    step_match(candidate, format!("Step {index}"), false, false)
}

fn relative_step(candidate: &ArtifactCandidate<'_>) -> Option<StepMatch> {
    let time = clean_inline(candidate.group("time")?);
    step_match(candidate, capitalize(&time), true, true)
}

fn step_match(
    candidate: &ArtifactCandidate<'_>,
    timeframe: String,
    timed: bool,
    relative: bool,
) -> Option<StepMatch> {
    let description = clean_inline(candidate.group("desc")?);
    if description.is_empty() {
        return None;
    }
    Some(StepMatch {
        span: candidate.span,
        step: RoadmapStep {
            timeframe,
            description,
            completed: false,
        },
        timed,
        relative,
    })
}

fn ordinal_index(word: &str) -> Option<usize> {
    let index = match word {
        w if w.starts_with("premi") || w == "first" => 1,
        w if w.starts_with("deuxi") || w.starts_with("second") => 2,
        w if w.starts_with("troisi") || w == "third" => 3,
        w if w.starts_with("quatri") || w == "fourth" => 4,
        w if w.starts_with("cinqui") || w == "fifth" => 5,
        w if w.starts_with("sixi") || w == "sixth" => 6,
        _ => return None,
    };
    Some(index)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Roadmap payload; explicit positions (from user context) win over the text.
pub fn build_roadmap_data(
    content: &str,
    extraction: &RoadmapExtraction,
    current_override: Option<String>,
    target_override: Option<String>,
) -> RoadmapData {
    let current_position = current_override
        .or_else(|| find_position(content, cached_regex(&CURRENT_POSITION, CURRENT_POSITION_SOURCE)))
        .unwrap_or_else(|| DEFAULT_CURRENT_POSITION.to_string());
    let target_position = target_override
        .or_else(|| find_position(content, cached_regex(&TARGET_POSITION, TARGET_POSITION_SOURCE)))
        .or_else(|| extraction.steps.last().map(|step| step.description.clone()))
        .unwrap_or_default();

    RoadmapData {
        steps: extraction.steps.clone(),
        current_position,
        target_position,
        timeframe: extraction.timeframe(),
        success_probability: success_probability(extraction.len(), extraction.timed_steps),
    }
}

fn find_position(content: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures(content)
        .and_then(|caps| caps.name("value"))
        .map(|m| clean_inline(m.as_str()))
        .filter(|value| !value.is_empty())
}

/// Heuristic estimate, not a statistical probability: more steps and more
/// concretely timed steps read as a more actionable plan. Bounded to [20, 90].
pub fn success_probability(step_count: usize, timed_steps: usize) -> u8 {
    if step_count == 0 {
        return MIN_PROBABILITY as u8;
    }
    let structure = 45.0 + 5.0 * step_count.min(5) as f64;
    let density = timed_steps.min(step_count) as f64 / step_count as f64;
    (structure + density * 15.0)
        .round()
        .clamp(MIN_PROBABILITY, MAX_PROBABILITY) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::models::Priority;

    fn roadmap(detected: &DetectedArtifact) -> &RoadmapData {
        match &detected.artifact.data {
            ArtifactData::Roadmap(data) => data,
            other => panic!("expected roadmap payload, got {other:?}"),
        }
    }

    #[test]
    fn test_phased_roadmap() {
        let content = "Poste actuel : Développeur backend\nObjectif : Tech Lead\n\n**Phase 1 (0-3 mois)** : Consolider l'architecture\n**Phase 2 (3-6 mois)** : Encadrer un junior\n**Phase 3 (6-12 mois)** : Piloter un projet transverse";
        let detected = detect_roadmaps(content, None);
        assert_eq!(detected.len(), 1);
        let data = roadmap(&detected[0]);
        assert_eq!(data.steps.len(), 3);
        assert_eq!(data.steps[0].timeframe, "0-3 mois");
        assert_eq!(data.steps[2].description, "Piloter un projet transverse");
        assert!(data.steps.iter().all(|s| !s.completed));
        assert_eq!(data.current_position, "Développeur backend");
        assert_eq!(data.target_position, "Tech Lead");
        assert_eq!(data.timeframe, "6-12 mois");
        assert_eq!(detected[0].artifact.confidence, 75);
        assert_eq!(detected[0].artifact.priority(), Priority::Medium);
    }

    #[test]
    fn test_relative_time_steps_in_document_order() {
        let content = "Dans 3 mois: Obtenir la certification AWS\nDans 6 mois: Postuler en interne\nDans 12 mois: Viser un poste senior";
        let detected = detect_roadmaps(content, None);
        let data = roadmap(&detected[0]);
        let frames: Vec<&str> = data.steps.iter().map(|s| s.timeframe.as_str()).collect();
        assert_eq!(frames, vec!["Dans 3 mois", "Dans 6 mois", "Dans 12 mois"]);
        assert_eq!(data.current_position, DEFAULT_CURRENT_POSITION);
        assert_eq!(data.target_position, "Viser un poste senior");
        assert_eq!(detected[0].artifact.confidence, 80);
    }

    #[test]
    fn test_ordinal_steps() {
        let content = "Première étape : Faire un bilan de compétences\nDeuxième étape : Suivre une formation\nTroisième étape : Se reconvertir";
        let detected = detect_roadmaps(content, None);
        let data = roadmap(&detected[0]);
        assert_eq!(data.steps[1].timeframe, "Step 2");
        assert_eq!(data.timeframe, "3 steps");
    }

    #[test]
    fn test_single_step_is_not_a_roadmap() {
        assert!(detect_roadmaps("Phase 1 : Se former", None).is_empty());
    }

    #[test]
    fn test_success_probability_bounds() {
        for steps in 0..20 {
            for timed in 0..=steps {
                let p = success_probability(steps, timed);
                assert!((20..=90).contains(&p), "{steps}/{timed} -> {p}");
            }
        }
        assert!(success_probability(4, 4) > success_probability(4, 0));
        assert!(success_probability(5, 0) > success_probability(2, 0));
    }

    #[test]
    fn test_overrides_win() {
        let extraction = extract_steps("Phase 1: A faire\nPhase 2: B faire");
        let data = build_roadmap_data(
            "Poste actuel: Dev",
            &extraction,
            Some("Analyste".to_string()),
            Some("Data Scientist".to_string()),
        );
        assert_eq!(data.current_position, "Analyste");
        assert_eq!(data.target_position, "Data Scientist");
    }
}
