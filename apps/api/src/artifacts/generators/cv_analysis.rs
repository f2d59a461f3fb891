//! CV analysis: the `resume-review` composite.
//!
//! Emitted for any non-blank content. Every field degrades to empty / `None`
//! rather than suppressing the artifact.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::artifacts::detectors::score::{analyze_scores, MAX_SCORE};
use crate::artifacts::generators::keywords::{keyword_coverage, keyword_matches};
use crate::artifacts::generators::{CompositeGenerator, GeneratorInput};
use crate::artifacts::models::{
    Artifact, ArtifactData, ArtifactType, CvAnalysisData, Priority, SectionScore, SectionStatus,
};
use crate::artifacts::patterns::cached_regex;
use crate::artifacts::text::{headed_bullets, normalize_key, strip_markdown};

const BASE_CONFIDENCE: u8 = 60;
const SCORE_BONUS: u8 = 10;
const SECTIONS_BONUS: u8 = 5;
const KEYWORDS_BONUS: u8 = 10;
const FEEDBACK_BONUS: u8 = 5;
const MAX_CONFIDENCE: u8 = 95;

const MAX_FEEDBACK_ITEMS: usize = 8;

/// Canonical CV sections and the words that reveal each one.
const CANONICAL_SECTIONS: &[(&str, &[&str])] = &[
    ("Expérience", &["expérience", "experience", "parcours professionnel"]),
    ("Formation", &["formation", "education", "éducation", "diplôme"]),
    ("Compétences", &["compétences", "competences", "skills"]),
    ("Langues", &["langues", "languages"]),
    ("Profil", &["profil", "profile", "résumé", "summary", "à propos"]),
    ("Contact", &["contact", "e-mail", "email", "téléphone", "phone"]),
];

static STRENGTHS_HEADING: OnceLock<Regex> = OnceLock::new();
static IMPROVEMENTS_HEADING: OnceLock<Regex> = OnceLock::new();
static MISSING_HEADING: OnceLock<Regex> = OnceLock::new();
static MISSING_INLINE: OnceLock<Regex> = OnceLock::new();

const STRENGTHS_HEADING_SOURCE: &str =
    r"(?i)^(?:#{1,6}[ \t]*)?(?:\*\*)?[ \t]*(?:points? forts?|forces|atouts|strengths)\b";
const IMPROVEMENTS_HEADING_SOURCE: &str = r"(?i)^(?:#{1,6}[ \t]*)?(?:\*\*)?[ \t]*(?:axes? d['’]am[ée]lioration|points? (?:à|a) am[ée]liorer|am[ée]liorations?|faiblesses|improvements?|areas? (?:for|of) improvement|weaknesses)\b";
const MISSING_HEADING_SOURCE: &str =
    r"(?i)^(?:#{1,6}[ \t]*)?(?:\*\*)?[ \t]*(?:sections? manquantes?|missing sections?)\b";
const MISSING_INLINE_SOURCE: &str = r"(?mi)^[ \t]*(?:[-*•][ \t]+)?(?:\*\*)?(?:sections? manquantes?|missing sections?)(?:\*\*)?[ \t]*:(?:\*\*)?[ \t]*(?P<list>[^\n]+)$";

pub struct CvAnalysisGenerator;

impl CompositeGenerator for CvAnalysisGenerator {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::CvAnalysis
    }

    fn generate(&self, input: &GeneratorInput<'_>) -> Option<Artifact> {
        let content = input.content;
        if content.is_empty() {
            return None;
        }

        let analysis = analyze_scores(content);
        let keywords = keyword_matches(input);
        let coverage = keyword_coverage(&keywords);

        let sections: Vec<SectionScore> = analysis
            .sub_scores
            .iter()
            .map(|sub| {
                let percentage = sub.percentage();
                SectionScore {
                    name: sub.label.clone(),
                    score: percentage.round() as u32,
                    status: SectionStatus::from_percentage(percentage),
                }
            })
            .collect();

        let strengths = headed_bullets(
            content,
            cached_regex(&STRENGTHS_HEADING, STRENGTHS_HEADING_SOURCE),
            MAX_FEEDBACK_ITEMS,
        );
        let mut improvements = headed_bullets(
            content,
            cached_regex(&IMPROVEMENTS_HEADING, IMPROVEMENTS_HEADING_SOURCE),
            MAX_FEEDBACK_ITEMS,
        );
        if improvements.is_empty() {
            improvements = analysis.recommendations.clone();
        }

        let missing_sections = match input.context_str_any(&["cvText", "resumeText"]) {
            Some(cv_text) => absent_sections(cv_text),
            None => reported_missing_sections(content),
        };

        let global_score = analysis.global_score().or(coverage);

        let mut confidence = BASE_CONFIDENCE;
        if global_score.is_some() {
            confidence += SCORE_BONUS;
        }
        if !sections.is_empty() {
            confidence += SECTIONS_BONUS;
        }
        if !keywords.is_empty() {
            confidence += KEYWORDS_BONUS;
        }
        if !strengths.is_empty() || !improvements.is_empty() {
            confidence += FEEDBACK_BONUS;
        }

        let data = CvAnalysisData {
            global_score,
            max_score: MAX_SCORE,
            sections,
            keywords,
            strengths,
            improvements,
            missing_sections,
            ats_compatibility: coverage,
        };
        Some(Artifact::new(
            ArtifactType::CvAnalysis,
            "CV Analysis",
            ArtifactData::CvAnalysis(data),
            confidence.min(MAX_CONFIDENCE),
            content,
            Some(input.service_id),
            Priority::High,
        ))
    }
}

/// Canonical sections with no trace in the CV text.
fn absent_sections(cv_text: &str) -> Vec<String> {
    let lowered = cv_text.to_lowercase();
    CANONICAL_SECTIONS
        .iter()
        .filter(|(_, aliases)| !aliases.iter().any(|alias| lowered.contains(alias)))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Sections the AI text itself lists as missing, inline or as a bullet list.
fn reported_missing_sections(content: &str) -> Vec<String> {
    let inline = cached_regex(&MISSING_INLINE, MISSING_INLINE_SOURCE)
        .captures_iter(content)
        .filter_map(|caps| caps.name("list"))
        .flat_map(|list| {
            list.as_str()
                .split(|c: char| c == ',' || c == ';')
                .map(strip_markdown)
                .collect::<Vec<_>>()
        });
    let listed = headed_bullets(
        content,
        cached_regex(&MISSING_HEADING, MISSING_HEADING_SOURCE),
        MAX_FEEDBACK_ITEMS,
    );

    let mut seen = HashSet::new();
    inline
        .chain(listed)
        .map(|name| name.trim_end_matches('.').to_string())
        .filter(|name| !name.is_empty() && seen.insert(normalize_key(name)))
        .collect()
}
