//! Checklist detector: actionable list items scored for relevance.
//!
//! Any bullet, numbered line, `Step N`, `Conseil:` line, or checkbox glyph line
//! is a candidate. Each candidate gets a relevance score from cheap lexical
//! signals; only the ones above the bar become checklist items.

use std::collections::HashSet;

use tracing::debug;

use crate::artifacts::detectors::DetectedArtifact;
use crate::artifacts::models::{
    Artifact, ArtifactData, ArtifactFamily, ArtifactType, ChecklistData, ChecklistItem,
    Difficulty, Priority, ServiceId, Span,
};
use crate::artifacts::patterns::{library, ArtifactCandidate, DetectionPattern};
use crate::artifacts::prioritizer::priority_for_checklist;
use crate::artifacts::text::{clean_inline, excerpt, heading_above, normalize_key};

const MIN_ITEMS: usize = 2;
/// Items must score strictly above this to qualify.
const MIN_RELEVANCE: u8 = 70;
const MAX_CONFIDENCE: u32 = 95;
const MINUTES_PER_ITEM: u32 = 20;

/// Leading stems of imperative/infinitive action verbs, English and French.
const ACTION_VERB_STEMS: &[&str] = &[
    // English
    "add", "apply", "ask", "build", "check", "clarify", "complete", "contact", "create",
    "define", "develop", "document", "emphasi", "follow", "gather", "highlight", "identify",
    "improve", "include", "learn", "list", "network", "negotiat", "obtain", "optimi",
    "practi", "prepare", "quantif", "reach", "remove", "rephrase", "replace", "research",
    "review", "rewrite", "schedule", "send", "showcase", "simplif", "start", "tailor",
    "update", "use", "write",
    // French
    "ajout", "adapt", "amélior", "analys", "candidat", "chiffr", "clarifi", "compl",
    "construi", "contact", "créer", "crée", "définir", "développ", "demand", "élabor",
    "envoy", "établi", "identifi", "inscri", "insist", "intégr", "lister", "mentionn",
    "mettre", "mett", "mise", "négoci", "obten", "optimis", "organis", "personnalis",
    "planifi", "prépar", "préciser", "privilégi", "quantifi", "raccourci", "recherch",
    "reformul", "relanc", "relir", "relis", "remplac", "renforc", "rédig", "répét",
    "retir", "revoi", "rejoin", "s'entraîn", "simplifi", "souligne", "structur", "suivr",
    "supprim", "travaill", "utilis", "valoris", "vérifi",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemSource {
    Bullet,
    Numbered,
    Step,
    Recommendation,
    Glyph,
}

impl ItemSource {
    fn bonus(self) -> i32 {
        match self {
            ItemSource::Step | ItemSource::Recommendation => 20,
            ItemSource::Numbered => 5,
            ItemSource::Bullet | ItemSource::Glyph => 0,
        }
    }
}

/// Explicit completion state carried by a checkbox marker or glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CheckState {
    completed: bool,
    priority: Priority,
}

#[derive(Debug, Clone)]
struct ItemCandidate {
    text: String,
    span: Span,
    relevance: u8,
    state: Option<CheckState>,
}

impl ItemCandidate {
    fn into_item(self) -> ChecklistItem {
        let priority = self
            .state
            .map(|s| s.priority)
            .unwrap_or_else(|| priority_for_relevance(self.relevance));
        ChecklistItem {
            text: self.text,
            completed: self.state.is_some_and(|s| s.completed),
            priority,
        }
    }
}

pub fn detect_checklists(content: &str, service_id: Option<ServiceId>) -> Vec<DetectedArtifact> {
    let candidates = collect_items(content);
    if candidates.len() < MIN_ITEMS {
        debug!(qualifying = candidates.len(), "not enough checklist items");
        return Vec::new();
    }

    let spans: Vec<Span> = candidates.iter().map(|c| c.span).collect();
    let relevance_sum: u32 = candidates.iter().map(|c| c.relevance as u32).sum();
    let confidence = (relevance_sum / candidates.len() as u32).min(MAX_CONFIDENCE) as u8;
    let title = heading_above(content, spans[0].start, "Action Checklist");
    let source = Span::covering(&spans)
        .map(|s| excerpt(content, s.start, s.end))
        .unwrap_or_default();

    let items: Vec<ChecklistItem> = candidates.into_iter().map(ItemCandidate::into_item).collect();
    let priority = priority_for_checklist(items.len());
    let data = checklist_data(items);

    let artifact = Artifact::new(
        ArtifactType::Checklist,
        title,
        ArtifactData::Checklist(data),
        confidence,
        source,
        service_id,
        priority,
    );
    vec![DetectedArtifact::new(ArtifactFamily::Checklist, artifact, spans)]
}

fn checklist_data(items: Vec<ChecklistItem>) -> ChecklistData {
    let total = items.len();
    let completed = items.iter().filter(|item| item.completed).count();
    let pending = (total - completed) as u32;
    let high = items.iter().filter(|item| item.priority == Priority::High).count();

    let difficulty = match total {
        _ if high >= 3 || total > 8 => Difficulty::Hard,
        t if t > 4 => Difficulty::Medium,
        _ => Difficulty::Easy,
    };
    let progress = if total == 0 {
        0
    } else {
        (completed as f64 / total as f64 * 100.0).round() as u32
    };

    ChecklistData {
        items,
        completable: true,
        progress,
        estimated_time: format_minutes(pending * MINUTES_PER_ITEM),
        difficulty,
    }
}

fn format_minutes(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h} h"),
        (h, m) => format!("{h} h {m} min"),
    }
}

/// Qualifying items in document order, one per line, no repeated text.
fn collect_items(content: &str) -> Vec<ItemCandidate> {
    let lib = library();
    let sources: [(&DetectionPattern, ItemSource); 5] = [
        (&lib.checklist_glyph, ItemSource::Glyph),
        (&lib.checklist_step, ItemSource::Step),
        (&lib.checklist_recommendation, ItemSource::Recommendation),
        (&lib.checklist_numbered, ItemSource::Numbered),
        (&lib.checklist_bullet, ItemSource::Bullet),
    ];

    let mut candidates = Vec::new();
    for (pattern, source) in sources {
        for candidate in pattern.candidates(content) {
            if let Some(item) = to_item(&candidate, source) {
                candidates.push(item);
            }
        }
    }
    candidates.retain(|c| c.state.is_some() || c.relevance > MIN_RELEVANCE);
    candidates.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then_with(|| b.relevance.cmp(&a.relevance))
    });

    let mut kept: Vec<ItemCandidate> = Vec::new();
    let mut seen = HashSet::new();
    for candidate in candidates {
        if kept.iter().any(|k| k.span.overlaps(&candidate.span)) {
            continue;
        }
        if !seen.insert(normalize_key(&candidate.text)) {
            continue;
        }
        kept.push(candidate);
    }
    kept
}

fn to_item(candidate: &ArtifactCandidate<'_>, source: ItemSource) -> Option<ItemCandidate> {
    let raw = candidate.group("text")?;
    let (glyph, rest) = match source {
        ItemSource::Glyph => (candidate.group("glyph").and_then(glyph_state), raw),
        _ => leading_glyph(raw),
    };
    let mark_state = candidate.group("mark").map(|mark| CheckState {
        completed: !mark.trim().is_empty(),
        priority: Priority::Medium,
    });
    let state = glyph.or(mark_state);

    let text = clean_inline(rest);
    if text.is_empty() {
        return None;
    }
    let relevance = match state {
        Some(_) => 100,
        None => relevance_score(&text, source),
    };
    Some(ItemCandidate {
        text,
        span: candidate.span,
        relevance,
        state,
    })
}

fn glyph_state(glyph: &str) -> Option<CheckState> {
    let (completed, priority) = match glyph {
        "☐" => (false, Priority::Medium),
        "☑" | "✓" | "✔" | "✅" => (true, Priority::Medium),
        "❌" => (false, Priority::High),
        _ => return None,
    };
    Some(CheckState { completed, priority })
}

/// Splits a glyph off the front of bullet text: `"☐ Relire"` → (pending, `"Relire"`).
fn leading_glyph(text: &str) -> (Option<CheckState>, &str) {
    let trimmed = text.trim_start();
    let Some(first) = trimmed.chars().next() else {
        return (None, text);
    };
    let mut buf = [0u8; 4];
    match glyph_state(first.encode_utf8(&mut buf)) {
        Some(state) => {
            let rest = trimmed[first.len_utf8()..].trim_start_matches('\u{fe0f}');
            (Some(state), rest)
        }
        None => (None, text),
    }
}

/// Lexical relevance in 0–100: length band, action verbs, digits, source bonus,
/// question and heading penalties.
fn relevance_score(text: &str, source: ItemSource) -> u8 {
    let mut score: i32 = 40;

    let length = text.chars().count();
    if (15..=150).contains(&length) {
        score += 15;
    } else if length < 8 || length > 250 {
        score -= 20;
    }

    if starts_with_action_verb(text) {
        score += 25;
    } else if contains_action_verb(text) {
        score += 10;
    }

    if text.chars().any(|c| c.is_ascii_digit()) {
        score += 5;
    }
    score += source.bonus();

    if text.ends_with('?') {
        score -= 15;
    }
    if text.ends_with(':') {
        score -= 30;
    }
    score.clamp(0, 100) as u8
}

fn priority_for_relevance(relevance: u8) -> Priority {
    match relevance {
        r if r >= 90 => Priority::High,
        r if r >= 80 => Priority::Medium,
        _ => Priority::Low,
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'').to_lowercase())
        .filter(|w| !w.is_empty())
}

fn is_action_word(word: &str) -> bool {
    ACTION_VERB_STEMS.iter().any(|stem| word.starts_with(stem))
        // French imperative plural: "Ajoutez", "Préparez".
        || (word.chars().count() >= 5 && word.ends_with("ez"))
}

fn starts_with_action_verb(text: &str) -> bool {
    words(text).next().is_some_and(|w| is_action_word(&w))
}

fn contains_action_verb(text: &str) -> bool {
    words(text).skip(1).any(|w| is_action_word(&w))
}
