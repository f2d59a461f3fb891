//! Generic detectors: one pure function per artifact family.
//!
//! Detectors share nothing but the read-only pattern library, so they can run
//! in any order (or in parallel) over the same borrowed content.

pub mod chart;
pub mod checklist;
pub mod roadmap;
pub mod score;
pub mod table;

use tracing::debug;

use crate::artifacts::models::{Artifact, ArtifactFamily, ServiceId, Span};

/// An artifact plus the content spans it was built from. Spans drive the
/// optional overlap resolver; they never leave the engine.
#[derive(Debug, Clone)]
pub struct DetectedArtifact {
    pub family: ArtifactFamily,
    pub artifact: Artifact,
    pub spans: Vec<Span>,
}

impl DetectedArtifact {
    pub fn new(family: ArtifactFamily, artifact: Artifact, spans: Vec<Span>) -> Self {
        Self {
            family,
            artifact,
            spans,
        }
    }
}

pub type DetectorFn = fn(&str, Option<ServiceId>) -> Vec<DetectedArtifact>;

/// Every generic detector, keyed by family.
pub const DETECTORS: [(ArtifactFamily, DetectorFn); 5] = [
    (ArtifactFamily::Table, table::detect_tables),
    (ArtifactFamily::Score, score::detect_scores),
    (ArtifactFamily::Checklist, checklist::detect_checklists),
    (ArtifactFamily::Chart, chart::detect_charts),
    (ArtifactFamily::Roadmap, roadmap::detect_roadmaps),
];

/// Runs every detector over `content` and concatenates their output.
pub fn run_all(content: &str, service_id: Option<ServiceId>) -> Vec<DetectedArtifact> {
    if content.trim().is_empty() {
        return Vec::new();
    }
    DETECTORS
        .iter()
        .flat_map(|(family, detect)| {
            let found = detect(content, service_id);
            debug!(family = ?family, count = found.len(), "detector finished");
            found
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_all_on_plain_prose_is_empty() {
        let content = "Merci pour votre question. Voici quelques réflexions générales sur votre parcours.";
        assert!(run_all(content, None).is_empty());
    }

    #[test]
    fn test_run_all_on_blank_is_empty() {
        assert!(run_all("   \n\n ", Some(ServiceId::ResumeReview)).is_empty());
    }

    #[test]
    fn test_spans_lie_inside_content() {
        let content = "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n\nScore global : 70/100\n- Structure: 80%";
        for detected in run_all(content, None) {
            assert!(!detected.spans.is_empty());
            for span in &detected.spans {
                assert!(span.end <= content.len());
                assert!(span.start < span.end);
            }
            assert_eq!(detected.artifact.artifact_type, detected.family.artifact_type());
        }
    }
}
