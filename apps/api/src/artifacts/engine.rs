//! Artifact engine: runs detection and generation, then orders the result.
//!
//! Flow: generic detectors (all families) → service generator (if any) →
//! optional overlap resolution → stable prioritization. The engine holds no
//! per-call state; one instance is shared by every request.

use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::artifacts::detectors::{run_all, DetectedArtifact};
use crate::artifacts::generators::{self, GeneratorInput};
use crate::artifacts::models::{Artifact, RawContent, ServiceId, Span};
use crate::artifacts::prioritizer::prioritize;
use crate::artifacts::sanitizer;

/// Share of an artifact's spans that must already be claimed by another
/// family before the resolver drops it.
const OVERLAP_DROP_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Drop generic artifacts that mostly re-read text another family already
    /// turned into an artifact. Off by default: every family reports what it saw.
    pub resolve_overlaps: bool,
}

/// `{ artifacts, displayText }`, the shape the presentation layer consumes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutput {
    pub artifacts: Vec<Artifact>,
    pub display_text: String,
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactEngine {
    options: EngineOptions,
}

impl ArtifactEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// Generic detectors plus the composite for `service_id`, prioritized.
    pub fn generate_artifacts(
        &self,
        content: &str,
        service_id: Option<ServiceId>,
        user_context: Option<&Value>,
    ) -> Vec<Artifact> {
        let started = Instant::now();
        let mut artifacts = self.detect_unsorted(content, service_id);

        if let Some(service_id) = service_id {
            let input = GeneratorInput {
                content,
                service_id,
                user_context,
            };
            artifacts.extend(generators::generate(&input));
        }

        let artifacts = prioritize(artifacts);
        info!(
            service = service_id.map(|s| s.as_str()),
            content_bytes = content.len(),
            artifacts = artifacts.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "artifact generation complete"
        );
        artifacts
    }

    /// Generic detectors only; no service composite.
    pub fn detect_artifacts(&self, content: &str, service_id: Option<ServiceId>) -> Vec<Artifact> {
        prioritize(self.detect_unsorted(content, service_id))
    }

    pub fn clean_content_for_display(&self, content: &str, artifacts: &[Artifact]) -> String {
        sanitizer::clean_content_for_display(content, artifacts)
    }

    /// One-shot analysis: prioritized artifacts plus the sanitized display text.
    pub fn analyze(&self, raw: &RawContent) -> AnalysisOutput {
        let artifacts =
            self.generate_artifacts(&raw.content, raw.service_id, raw.user_context.as_ref());
        let display_text = self.clean_content_for_display(&raw.content, &artifacts);
        AnalysisOutput {
            artifacts,
            display_text,
        }
    }

    fn detect_unsorted(&self, content: &str, service_id: Option<ServiceId>) -> Vec<Artifact> {
        let detected = run_all(content, service_id);
        let kept = if self.options.resolve_overlaps {
            resolve_overlaps(detected)
        } else {
            detected
        };
        kept.into_iter().map(|d| d.artifact).collect()
    }
}

/// Visits artifacts by confidence (stable on ties) and drops any whose spans
/// are at least half covered by spans a different family already claimed.
/// Survivors keep their detector order.
fn resolve_overlaps(detected: Vec<DetectedArtifact>) -> Vec<DetectedArtifact> {
    let mut order: Vec<usize> = (0..detected.len()).collect();
    order.sort_by(|&a, &b| detected[b].artifact.confidence.cmp(&detected[a].artifact.confidence));

    let mut claimed: Vec<(usize, Span)> = Vec::new();
    let mut keep = vec![false; detected.len()];

    for index in order {
        let candidate = &detected[index];
        let foreign: Vec<Span> = claimed
            .iter()
            .filter(|(owner, _)| detected[*owner].family != candidate.family)
            .map(|(_, span)| *span)
            .collect();
        if covered_ratio(&candidate.spans, &foreign) >= OVERLAP_DROP_RATIO {
            info!(
                family = ?candidate.family,
                title = %candidate.artifact.title,
                confidence = candidate.artifact.confidence,
                "dropping overlapping artifact"
            );
            continue;
        }
        keep[index] = true;
        claimed.extend(candidate.spans.iter().map(|span| (index, *span)));
    }

    detected
        .into_iter()
        .zip(keep)
        .filter_map(|(d, kept)| kept.then_some(d))
        .collect()
}

/// Fraction of the bytes in `spans` that fall inside any of `claimed`.
fn covered_ratio(spans: &[Span], claimed: &[Span]) -> f64 {
    let total: usize = spans.iter().map(Span::len).sum();
    if total == 0 {
        return 0.0;
    }
    let covered: usize = spans
        .iter()
        .map(|span| {
            let mut parts: Vec<(usize, usize)> = claimed
                .iter()
                .filter(|c| c.overlaps(span))
                .map(|c| (c.start.max(span.start), c.end.min(span.end)))
                .collect();
            parts.sort_unstable();
            // Union of the clipped intervals.
            let mut sum = 0;
            let mut reach = span.start;
            for (start, end) in parts {
                let start = start.max(reach);
                if end > start {
                    sum += end - start;
                    reach = end;
                }
            }
            sum
        })
        .sum();
    covered as f64 / total as f64
}
