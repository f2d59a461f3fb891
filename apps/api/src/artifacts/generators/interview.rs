//! Interview simulator: the `interview-prep` composite.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::artifacts::generators::{CompositeGenerator, GeneratorInput};
use crate::artifacts::models::{
    Artifact, ArtifactData, ArtifactType, Difficulty, InterviewData, InterviewQuestion, Priority,
    QuestionCategory, Span,
};
use crate::artifacts::patterns::cached_regex;
use crate::artifacts::text::{clean_inline, count_occurrences, excerpt, normalize_key};

const MIN_QUESTION_CHARS: usize = 8;
const MAX_QUESTION_CHARS: usize = 250;
const MAX_QUESTIONS: usize = 15;

const BASE_CONFIDENCE: u8 = 65;
const QUESTION_BONUS: u8 = 5;
const MAX_CONFIDENCE: u8 = 92;

static QUESTION: OnceLock<Regex> = OnceLock::new();
const QUESTION_SOURCE: &str = r"(?mi)^[ \t]*(?:[-*•+][ \t]+|\d{1,2}[.)][ \t]+)?(?:\*\*)?(?:(?:q|question)[ \t]*\d{0,2}[ \t]*[:.)\-–][ \t]*)?(?:\*\*)?[ \t]*(?P<q>[^\n]*?\?)[ \t]*(?:\*\*)?[ \t]*$";

// Substring stems, checked in category order.
const BEHAVIORAL_CUES: &[&str] = &[
    "racontez",
    "décrivez une situation",
    "parlez-moi d'une",
    "donnez un exemple",
    "exemple concret",
    "réussite",
    "échec",
    "conflit",
    "tell me about a time",
    "describe a time",
    "describe a situation",
    "give an example",
    "achievement",
    "failure",
    "conflict",
];
const SITUATIONAL_CUES: &[&str] = &[
    "que feriez-vous",
    "comment réagiriez",
    "comment géreriez",
    "imaginez",
    "si vous deviez",
    "what would you do",
    "how would you handle",
    "how would you react",
    "if you were",
    "imagine",
    "suppose",
];
const TECHNICAL_CUES: &[&str] = &[
    "technique",
    "technical",
    "algorithm",
    "architecture",
    "expliquez",
    "explain",
    "comment fonctionne",
    "how does",
    "différence entre",
    "difference between",
    "optimiser",
    "optimize",
];
/// Short technical terms, matched as whole words.
const TECHNICAL_TERMS: &[&str] = &["api", "sql", "code", "docker", "cloud", "python", "java", "rust"];
const MOTIVATION_CUES: &[&str] = &[
    "pourquoi",
    "why",
    "motivation",
    "motive",
    "intéresse",
    "interested",
    "vous voyez-vous",
    "see yourself",
    "nos valeurs",
    "our values",
];

pub struct InterviewSimulator;

impl CompositeGenerator for InterviewSimulator {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::InterviewSimulator
    }

    fn generate(&self, input: &GeneratorInput<'_>) -> Option<Artifact> {
        let (questions, spans) = extract_questions(input.content);
        if questions.is_empty() {
            return None;
        }

        let total_duration_minutes = questions.iter().map(|q| q.expected_time_minutes).sum();
        let mut focus_areas: Vec<QuestionCategory> = Vec::new();
        for question in &questions {
            if !focus_areas.contains(&question.category) {
                focus_areas.push(question.category);
            }
        }

        let step = (questions.len().min(u8::MAX as usize) as u8).saturating_mul(QUESTION_BONUS);
        let confidence = BASE_CONFIDENCE.saturating_add(step).min(MAX_CONFIDENCE);
        let source = Span::covering(&spans)
            .map(|s| excerpt(input.content, s.start, s.end))
            .unwrap_or_default();

        let data = InterviewData {
            questions,
            total_duration_minutes,
            focus_areas,
        };
        Some(Artifact::new(
            ArtifactType::InterviewSimulator,
            "Interview Simulation",
            ArtifactData::InterviewSimulator(data),
            confidence,
            source,
            Some(input.service_id),
            Priority::High,
        ))
    }
}

fn extract_questions(content: &str) -> (Vec<InterviewQuestion>, Vec<Span>) {
    let mut seen = HashSet::new();
    let mut questions = Vec::new();
    let mut spans = Vec::new();

    for caps in cached_regex(&QUESTION, QUESTION_SOURCE).captures_iter(content) {
        let Some(q) = caps.name("q") else {
            continue;
        };
        let text = clean_inline(q.as_str());
        let len = text.chars().count();
        if !(MIN_QUESTION_CHARS..=MAX_QUESTION_CHARS).contains(&len) {
            continue;
        }
        if !seen.insert(normalize_key(&text)) {
            continue;
        }
        let category = categorize(&text);
        questions.push(InterviewQuestion {
            expected_time_minutes: expected_minutes(category),
            difficulty: difficulty_for(category),
            question: text,
            category,
        });
        spans.push(Span::new(q.start(), q.end()));
        if questions.len() >= MAX_QUESTIONS {
            break;
        }
    }
    (questions, spans)
}

fn categorize(question: &str) -> QuestionCategory {
    let lowered = question.to_lowercase();
    let cued = |cues: &[&str]| cues.iter().any(|cue| lowered.contains(cue));

    if cued(BEHAVIORAL_CUES) {
        QuestionCategory::Behavioral
    } else if cued(SITUATIONAL_CUES) {
        QuestionCategory::Situational
    } else if cued(TECHNICAL_CUES) || TECHNICAL_TERMS.iter().any(|t| count_occurrences(&lowered, t) > 0) {
        QuestionCategory::Technical
    } else if cued(MOTIVATION_CUES) {
        QuestionCategory::Motivation
    } else {
        QuestionCategory::General
    }
}

fn expected_minutes(category: QuestionCategory) -> u32 {
    match category {
        QuestionCategory::Behavioral => 3,
        QuestionCategory::Situational => 4,
        QuestionCategory::Technical => 5,
        QuestionCategory::Motivation | QuestionCategory::General => 2,
    }
}

fn difficulty_for(category: QuestionCategory) -> Difficulty {
    match category {
        QuestionCategory::Technical => Difficulty::Hard,
        QuestionCategory::Behavioral | QuestionCategory::Situational => Difficulty::Medium,
        QuestionCategory::Motivation | QuestionCategory::General => Difficulty::Easy,
    }
}
