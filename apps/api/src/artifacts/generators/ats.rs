//! ATS analyzer: the `cover-letter` composite, rendered as a dashboard.

use crate::artifacts::detectors::score::{analyze_scores, MAX_SCORE};
use crate::artifacts::generators::keywords::{keyword_coverage, keyword_matches};
use crate::artifacts::generators::{CompositeGenerator, GeneratorInput};
use crate::artifacts::models::{
    Artifact, ArtifactData, ArtifactType, AtsDashboardData, DashboardMetric, FormatCheck, Priority,
};
use crate::artifacts::patterns::library;
use crate::artifacts::text::clean_inline;

const BASE_CONFIDENCE: u8 = 60;
const SCORE_BONUS: u8 = 10;
const KEYWORDS_BONUS: u8 = 10;
const CHECKS_BONUS: u8 = 5;
const METRICS_BONUS: u8 = 5;
const MAX_CONFIDENCE: u8 = 95;

const MAX_FORMAT_CHECKS: usize = 12;

pub struct AtsAnalyzer;

impl CompositeGenerator for AtsAnalyzer {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::Dashboard
    }

    fn generate(&self, input: &GeneratorInput<'_>) -> Option<Artifact> {
        let content = input.content;
        let analysis = analyze_scores(content);
        let keyword_matches = keyword_matches(input);

        let metrics: Vec<DashboardMetric> = analysis
            .sub_scores
            .iter()
            .map(|sub| DashboardMetric {
                label: sub.label.clone(),
                value: sub.score,
                max: sub.max_score,
            })
            .collect();
        let ats_score = analysis
            .global_score()
            .or_else(|| keyword_coverage(&keyword_matches));

        if ats_score.is_none() && keyword_matches.is_empty() && metrics.is_empty() {
            return None;
        }
        let format_checks = format_checks(content);

        let mut confidence = BASE_CONFIDENCE;
        if ats_score.is_some() {
            confidence += SCORE_BONUS;
        }
        if !keyword_matches.is_empty() {
            confidence += KEYWORDS_BONUS;
        }
        if !format_checks.is_empty() {
            confidence += CHECKS_BONUS;
        }
        if !metrics.is_empty() {
            confidence += METRICS_BONUS;
        }

        let data = AtsDashboardData {
            ats_score,
            max_score: MAX_SCORE,
            keyword_matches,
            format_checks,
            metrics,
        };
        Some(Artifact::new(
            ArtifactType::Dashboard,
            "ATS Compatibility",
            ArtifactData::AtsDashboard(data),
            confidence.min(MAX_CONFIDENCE),
            content,
            Some(input.service_id),
            Priority::High,
        ))
    }
}

/// `✅ Police lisible` / `❌ Tableaux` glyph lines and `- [x]` / `- [ ]` boxes.
fn format_checks(content: &str) -> Vec<FormatCheck> {
    let lib = library();
    let glyphs = lib.checklist_glyph.candidates(content).filter_map(|c| {
        let passed = matches!(c.group("glyph")?, "☑" | "✓" | "✔" | "✅");
        Some((c.span.start, c.group("text")?, passed))
    });
    let boxes = lib.checklist_bullet.candidates(content).filter_map(|c| {
        let passed = !c.group("mark")?.trim().is_empty();
        Some((c.span.start, c.group("text")?, passed))
    });

    let mut checks: Vec<(usize, &str, bool)> = glyphs.chain(boxes).collect();
    checks.sort_by_key(|(start, _, _)| *start);
    checks.dedup_by_key(|(start, _, _)| *start);
    checks
        .into_iter()
        .map(|(_, text, passed)| FormatCheck {
            check: clean_inline(text),
            passed,
        })
        .filter(|check| !check.check.is_empty())
        .take(MAX_FORMAT_CHECKS)
        .collect()
}
