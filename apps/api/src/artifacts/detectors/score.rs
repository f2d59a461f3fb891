//! Score detector: explicit global scores, category sub-scores, and generic
//! `label: N%` lines folded into one score dashboard.

use tracing::warn;

use crate::artifacts::detectors::DetectedArtifact;
use crate::artifacts::models::{
    Artifact, ArtifactData, ArtifactFamily, ArtifactType, ScoreData, ServiceId, Span, SubScore,
};
use crate::artifacts::patterns::{library, ArtifactCandidate};
use crate::artifacts::prioritizer::priority_for_score;
use crate::artifacts::text::{clean_inline, excerpt, parse_decimal, strip_markdown};

pub const MAX_SCORE: u32 = 100;
/// Ceiling for a global score inferred purely from sub-scores.
const MAX_INFERRED_SCORE: f64 = 95.0;

const MIN_SUB_SCORE_CONFIDENCE: u8 = 60;
const RATIO_BONUS: u8 = 5;
const BAR_BONUS: u8 = 10;
const BAR_ONLY_CONFIDENCE: u8 = 70;

const EXPLICIT_CONFIDENCE: u8 = 90;
const CORROBORATED_BONUS: u8 = 5;
const MAX_CONFIDENCE: u8 = 95;

const MIN_RECOMMENDATION_CHARS: usize = 10;
const MAX_RECOMMENDATION_CHARS: usize = 200;
const MAX_RECOMMENDATIONS: usize = 5;

const FILLED_GLYPHS: &[char] = &['█', '▓', '■', '●', '★'];

/// An explicit `Score: N/M` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitScore {
    pub value: f64,
    pub max: f64,
    pub span: Span,
}

impl ExplicitScore {
    /// Value rescaled to /100.
    pub fn normalized(&self) -> u32 {
        (self.value / self.max * MAX_SCORE as f64).round() as u32
    }
}

/// Everything score-shaped found in a piece of content. Also consumed by the
/// CV and ATS generators.
#[derive(Debug, Clone, Default)]
pub struct ScoreAnalysis {
    pub explicit: Option<ExplicitScore>,
    pub sub_scores: Vec<SubScore>,
    pub sub_score_spans: Vec<Span>,
    pub recommendations: Vec<String>,
}

impl ScoreAnalysis {
    /// Explicit score when stated, otherwise the confidence-weighted mean of
    /// sub-score percentages clamped to [0, 95].
    pub fn global_score(&self) -> Option<u32> {
        if let Some(explicit) = &self.explicit {
            return Some(explicit.normalized());
        }
        let total_weight: f64 = self.sub_scores.iter().map(|s| s.confidence as f64).sum();
        if total_weight <= 0.0 {
            return None;
        }
        let weighted: f64 = self
            .sub_scores
            .iter()
            .map(|s| s.percentage() * s.confidence as f64)
            .sum();
        Some((weighted / total_weight).clamp(0.0, MAX_INFERRED_SCORE).round() as u32)
    }

    /// Emitted iff an explicit score validated or a sub-score is confident enough.
    pub fn is_emittable(&self) -> bool {
        self.explicit.is_some()
            || self
                .sub_scores
                .iter()
                .any(|s| s.confidence > MIN_SUB_SCORE_CONFIDENCE)
    }

    fn confidence(&self) -> u8 {
        if self.explicit.is_some() {
            let bonus = if self.sub_scores.len() >= 2 { CORROBORATED_BONUS } else { 0 };
            return (EXPLICIT_CONFIDENCE + bonus).min(MAX_CONFIDENCE);
        }
        if self.sub_scores.is_empty() {
            return 0;
        }
        let sum: u32 = self.sub_scores.iter().map(|s| s.confidence as u32).sum();
        (sum / self.sub_scores.len() as u32).min(MAX_CONFIDENCE as u32) as u8
    }

    fn spans(&self) -> Vec<Span> {
        self.explicit
            .iter()
            .map(|e| e.span)
            .chain(self.sub_score_spans.iter().copied())
            .collect()
    }
}

pub fn detect_scores(content: &str, service_id: Option<ServiceId>) -> Vec<DetectedArtifact> {
    let analysis = analyze_scores(content);
    if !analysis.is_emittable() {
        return Vec::new();
    }
    let Some(global_score) = analysis.global_score() else {
        return Vec::new();
    };

    let spans = analysis.spans();
    let source = Span::covering(&spans)
        .map(|s| excerpt(content, s.start, s.end))
        .unwrap_or_default();
    let confidence = analysis.confidence();

    let data = ScoreData {
        global_score,
        max_score: MAX_SCORE,
        sub_scores: analysis.sub_scores,
        recommendations: analysis.recommendations,
    };
    let artifact = Artifact::new(
        ArtifactType::Score,
        "Score Overview",
        ArtifactData::Score(data),
        confidence,
        source,
        service_id,
        priority_for_score(global_score),
    );
    vec![DetectedArtifact::new(ArtifactFamily::Score, artifact, spans)]
}

/// Runs the three score rules and resolves them against each other: explicit
/// scores claim their spans first, then category lines, then generic percents.
pub fn analyze_scores(content: &str) -> ScoreAnalysis {
    let lib = library();

    let explicit: Vec<ExplicitScore> = lib
        .score_explicit
        .candidates(content)
        .filter_map(|candidate| parse_explicit(&candidate))
        .collect();
    let mut claimed: Vec<Span> = explicit.iter().map(|e| e.span).collect();

    let mut sub_scores = Vec::new();
    let mut sub_score_spans = Vec::new();
    let sub_candidates = lib
        .score_category
        .candidates(content)
        .chain(lib.score_generic.candidates(content));
    for candidate in sub_candidates {
        if claimed.iter().any(|span| span.overlaps(&candidate.span)) {
            continue;
        }
        let Some(sub_score) = parse_sub_score(&candidate) else {
            continue;
        };
        claimed.push(candidate.span);
        sub_score_spans.push(candidate.span);
        sub_scores.push(sub_score);
    }

    let recommendations = lib
        .checklist_bullet
        .candidates(content)
        .filter(|c| !claimed.iter().any(|span| span.overlaps(&c.span)))
        .filter_map(|c| c.group("text").map(clean_inline))
        .filter(|text| {
            let len = text.chars().count();
            (MIN_RECOMMENDATION_CHARS..=MAX_RECOMMENDATION_CHARS).contains(&len)
        })
        .take(MAX_RECOMMENDATIONS)
        .collect();

    ScoreAnalysis {
        explicit: explicit.into_iter().next(),
        sub_scores,
        sub_score_spans,
        recommendations,
    }
}

fn parse_explicit(candidate: &ArtifactCandidate<'_>) -> Option<ExplicitScore> {
    let value = parse_decimal(candidate.group("value")?)?;
    let max = match (candidate.group("pct"), candidate.group("max")) {
        (Some(_), _) => MAX_SCORE as f64,
        (None, Some(max)) => parse_decimal(max)?,
        // A bare number only counts after the word "score"; "Note: 3 entretiens" is not a grade.
        (None, None) => {
            let label = candidate.group("label")?.to_lowercase();
            if !label.ends_with("score") {
                return None;
            }
            MAX_SCORE as f64
        }
    };
    if !is_valid_score(value, max) {
        warn!(pattern = candidate.pattern, value, max, "discarding out-of-range explicit score");
        return None;
    }
    Some(ExplicitScore {
        value,
        max,
        span: candidate.span,
    })
}

fn parse_sub_score(candidate: &ArtifactCandidate<'_>) -> Option<SubScore> {
    let label = strip_markdown(candidate.group("label")?);
    if label.is_empty() {
        return None;
    }
    let bar = candidate.group("bar");
    let value = candidate.group("value").and_then(parse_decimal);

    let (score, max_score, confidence) = match value {
        Some(value) => {
            let (max, ratio_bonus) = match (candidate.group("pct"), candidate.group("max")) {
                (Some(_), _) => (MAX_SCORE as f64, 0),
                (None, Some(max)) => (parse_decimal(max)?, RATIO_BONUS),
                (None, None) => return None,
            };
            let bar_bonus = if bar.is_some() { BAR_BONUS } else { 0 };
            let confidence = candidate
                .confidence
                .saturating_add(ratio_bonus)
                .saturating_add(bar_bonus)
                .min(100);
            (value, max, confidence)
        }
        None => {
            let ratio = bar_ratio(bar?)?;
            ((ratio * MAX_SCORE as f64).round(), MAX_SCORE as f64, BAR_ONLY_CONFIDENCE)
        }
    };

    if !is_valid_score(score, max_score) {
        warn!(pattern = candidate.pattern, label = %label, score, max_score, "discarding out-of-range sub-score");
        return None;
    }
    Some(SubScore {
        label,
        score,
        max_score,
        confidence,
    })
}

fn is_valid_score(score: f64, max: f64) -> bool {
    max > 0.0 && score >= 0.0 && score <= max
}

/// Share of filled glyphs in a bar like `████░░░░`.
fn bar_ratio(bar: &str) -> Option<f64> {
    let total = bar.chars().count();
    if total == 0 {
        return None;
    }
    let filled = bar.chars().filter(|c| FILLED_GLYPHS.contains(c)).count();
    Some(filled as f64 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::models::Priority;

    fn score_data(detected: &DetectedArtifact) -> &ScoreData {
        match &detected.artifact.data {
            ArtifactData::Score(data) => data,
            other => panic!("expected score payload, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_score_with_sub_scores() {
        let content = "Score global : 78/100\n- Structure: 85%\n- Contenu: 72%";
        let scores = detect_scores(content, None);
        assert_eq!(scores.len(), 1);
        let data = score_data(&scores[0]);
        assert_eq!(data.global_score, 78);
        assert_eq!(data.max_score, 100);
        assert_eq!(data.sub_scores.len(), 2);
        assert_eq!(data.sub_scores[0].label, "Structure");
        assert_eq!(data.sub_scores[0].score, 85.0);
        assert_eq!(scores[0].artifact.confidence, 95);
        assert_eq!(scores[0].artifact.priority(), Priority::Medium);
    }

    #[test]
    fn test_repeated_labels_are_distinct_sub_scores() {
        let content = "Score global : 78/100\n- Critère: 80%\n- Critère: 60%";
        let data = score_data(&detect_scores(content, None)[0]).clone();
        assert_eq!(data.sub_scores.len(), 2);
    }

    #[test]
    fn test_sub_scores_always_within_bounds() {
        let content = "Score: 150/100\n- Clarté: 120%\n- Impact: 8/10\n- Lisibilité: 45%";
        let analysis = analyze_scores(content);
        assert!(analysis.explicit.is_none());
        for sub in &analysis.sub_scores {
            assert!(sub.score >= 0.0 && sub.score <= sub.max_score, "{sub:?}");
        }
        assert_eq!(analysis.sub_scores.len(), 2);
    }

    #[test]
    fn test_global_score_inferred_from_sub_scores() {
        let content = "- Impact: 8/10\n- Lisibilité: 40%";
        let scores = detect_scores(content, None);
        let data = score_data(&scores[0]);
        // (80 * 80 + 40 * 75) / 155
        assert_eq!(data.global_score, 61);
        assert_eq!(scores[0].artifact.priority(), Priority::Medium);
    }

    #[test]
    fn test_inferred_score_is_capped_below_certainty() {
        let content = "- Clarté: 100%\n- Structure: 10/10";
        let data = score_data(&detect_scores(content, None)[0]).clone();
        assert_eq!(data.global_score, 95);
    }

    #[test]
    fn test_bar_only_sub_score() {
        let content = "Expérience: ████░░░░░░";
        let analysis = analyze_scores(content);
        assert_eq!(analysis.sub_scores.len(), 1);
        assert_eq!(analysis.sub_scores[0].score, 40.0);
        assert_eq!(analysis.sub_scores[0].confidence, BAR_ONLY_CONFIDENCE);
    }

    #[test]
    fn test_bar_with_value_is_most_confident() {
        let analysis = analyze_scores("Compétences: ████████░░ 80%");
        assert_eq!(analysis.sub_scores[0].confidence, 85);
    }

    #[test]
    fn test_note_without_denominator_is_not_a_score() {
        assert!(detect_scores("Note: 3 entretiens prévus cette semaine", None).is_empty());
    }

    #[test]
    fn test_explicit_percentage_normalized() {
        let scores = detect_scores("Score ATS : 45%", None);
        let data = score_data(&scores[0]);
        assert_eq!(data.global_score, 45);
        assert_eq!(scores[0].artifact.priority(), Priority::High);
    }

    #[test]
    fn test_explicit_out_of_ten_normalized() {
        let scores = detect_scores("Note finale : 8.5/10", None);
        assert_eq!(score_data(&scores[0]).global_score, 85);
        assert_eq!(scores[0].artifact.priority(), Priority::Low);
    }

    #[test]
    fn test_recommendations_skip_sub_score_lines() {
        let content = "Score: 70/100\n- Structure: 85%\n- Ajoutez des résultats chiffrés\n- Court\n- Reformulez le titre du profil";
        let data = score_data(&detect_scores(content, None)[0]).clone();
        assert_eq!(
            data.recommendations,
            vec!["Ajoutez des résultats chiffrés", "Reformulez le titre du profil"]
        );
    }

    #[test]
    fn test_over_long_score_value_is_dropped() {
        assert!(detect_scores("Score: 1000/1000", None).is_empty());
        assert!(detect_scores("Score global : 1000", None).is_empty());
    }

    #[test]
    fn test_wide_denominator_is_kept() {
        let scores = detect_scores("Score : 450/1000", None);
        assert_eq!(score_data(&scores[0]).global_score, 45);
    }

    #[test]
    fn test_no_scores_in_prose() {
        assert!(detect_scores("Votre parcours est intéressant.", None).is_empty());
    }
}
