//! Priority tiers and final ordering.
//!
//! Tier thresholds live here so every detector derives priority the same way.
//! The final sort is stable: artifacts with equal tier and confidence keep
//! the order their detectors produced them in.

use crate::artifacts::models::{Artifact, Priority};

/// Confidence above which a structural artifact is promoted to `high`.
const HIGH_CONFIDENCE: u8 = 80;

const WEAK_SCORE: u32 = 60;
const FAIR_SCORE: u32 = 80;

const LONG_CHECKLIST: usize = 5;

/// `high` above 80 confidence, `medium` otherwise.
pub fn priority_for_confidence(confidence: u8) -> Priority {
    if confidence > HIGH_CONFIDENCE {
        Priority::High
    } else {
        Priority::Medium
    }
}

/// Low scores need attention first: `<60` high, `<80` medium, else low.
pub fn priority_for_score(global_score: u32) -> Priority {
    if global_score < WEAK_SCORE {
        Priority::High
    } else if global_score < FAIR_SCORE {
        Priority::Medium
    } else {
        Priority::Low
    }
}

pub fn priority_for_checklist(item_count: usize) -> Priority {
    if item_count > LONG_CHECKLIST {
        Priority::High
    } else {
        Priority::Medium
    }
}

/// Stable sort by tier, then confidence descending.
pub fn prioritize(mut artifacts: Vec<Artifact>) -> Vec<Artifact> {
    artifacts.sort_by(|a, b| {
        a.priority()
            .cmp(&b.priority())
            .then_with(|| b.confidence.cmp(&a.confidence))
    });
    artifacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::models::{ArtifactData, ArtifactType, TableData};

    fn artifact(title: &str, confidence: u8, priority: Priority) -> Artifact {
        Artifact::new(
            ArtifactType::Table,
            title,
            ArtifactData::Table(TableData::new(vec![], vec![])),
            confidence,
            "",
            None,
            priority,
        )
    }

    #[test]
    fn test_priority_for_confidence() {
        assert_eq!(priority_for_confidence(81), Priority::High);
        assert_eq!(priority_for_confidence(80), Priority::Medium);
    }

    #[test]
    fn test_priority_for_score() {
        assert_eq!(priority_for_score(45), Priority::High);
        assert_eq!(priority_for_score(60), Priority::Medium);
        assert_eq!(priority_for_score(79), Priority::Medium);
        assert_eq!(priority_for_score(80), Priority::Low);
    }

    #[test]
    fn test_priority_for_checklist() {
        assert_eq!(priority_for_checklist(6), Priority::High);
        assert_eq!(priority_for_checklist(5), Priority::Medium);
    }

    #[test]
    fn test_prioritize_orders_tier_then_confidence() {
        let sorted = prioritize(vec![
            artifact("low", 99, Priority::Low),
            artifact("medium-70", 70, Priority::Medium),
            artifact("high-85", 85, Priority::High),
            artifact("medium-90", 90, Priority::Medium),
            artifact("high-95", 95, Priority::High),
        ]);
        let titles: Vec<&str> = sorted.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["high-95", "high-85", "medium-90", "medium-70", "low"]);
    }

    #[test]
    fn test_prioritize_is_stable_for_ties() {
        let sorted = prioritize(vec![
            artifact("first", 80, Priority::Medium),
            artifact("second", 80, Priority::Medium),
            artifact("third", 80, Priority::Medium),
        ]);
        let titles: Vec<&str> = sorted.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }
}
