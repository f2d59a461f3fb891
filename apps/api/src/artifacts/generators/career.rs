//! Career planner: the `career-advice` composite. A roadmap enriched with the
//! user's own positions and the skills the plan calls for.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::artifacts::detectors::roadmap::{build_roadmap_data, extract_steps, MIN_STEPS};
use crate::artifacts::generators::{CompositeGenerator, GeneratorInput};
use crate::artifacts::models::{
    Artifact, ArtifactData, ArtifactType, CareerPlanData, Priority, Span,
};
use crate::artifacts::patterns::cached_regex;
use crate::artifacts::text::{excerpt, headed_bullets, normalize_key};

const PLAN_BONUS: u8 = 5;
const MAX_CONFIDENCE: u8 = 95;
const MAX_LISTED_SKILLS: usize = 8;

static SKILLS_HEADING: OnceLock<Regex> = OnceLock::new();
const SKILLS_HEADING_SOURCE: &str = r"(?i)^(?:#{1,6}[ \t]*)?(?:\*\*)?[ \t]*(?:comp[ée]tences? (?:(?:à|a) d[ée]velopper|cl[ée]s|(?:à|a) acqu[ée]rir)|skills? to (?:develop|build|acquire)|key skills|formations? recommand[ée]es|certifications? (?:recommand[ée]es|(?:à|a) viser))\b";

pub struct CareerPlanner;

impl CompositeGenerator for CareerPlanner {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::Roadmap
    }

    fn generate(&self, input: &GeneratorInput<'_>) -> Option<Artifact> {
        let content = input.content;
        let extraction = extract_steps(content);
        if extraction.len() < MIN_STEPS {
            return None;
        }

        let current = input
            .context_str_any(&["currentPosition", "currentRole"])
            .map(str::to_string);
        let target = input
            .context_str_any(&["targetPosition", "targetRole"])
            .map(str::to_string);
        let roadmap = build_roadmap_data(content, &extraction, current, target);

        let listed = headed_bullets(
            content,
            cached_regex(&SKILLS_HEADING, SKILLS_HEADING_SOURCE),
            MAX_LISTED_SKILLS,
        );
        let mut seen = HashSet::new();
        let skills_to_develop: Vec<String> = listed
            .into_iter()
            .chain(input.context_list("skillsToDevelop"))
            .filter(|skill| seen.insert(normalize_key(skill)))
            .collect();

        let confidence = extraction
            .confidence()
            .saturating_add(PLAN_BONUS)
            .min(MAX_CONFIDENCE);
        let source = Span::covering(&extraction.spans)
            .map(|s| excerpt(content, s.start, s.end))
            .unwrap_or_default();

        Some(Artifact::new(
            ArtifactType::Roadmap,
            "Career Plan",
            ArtifactData::CareerPlan(CareerPlanData {
                roadmap,
                skills_to_develop,
            }),
            confidence,
            source,
            Some(input.service_id),
            Priority::High,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::models::ServiceId;
    use serde_json::json;

    const PLAN: &str = "Poste actuel : Développeur backend

**Phase 1 (0-3 mois)** : Consolider l'architecture
**Phase 2 (3-6 mois)** : Encadrer un junior
**Phase 3 (6-12 mois)** : Piloter un projet transverse

### Compétences à développer
- Leadership technique
- Communication écrite
";

    fn run(content: &str, ctx: Option<&serde_json::Value>) -> Option<Artifact> {
        CareerPlanner.generate(&GeneratorInput {
            content,
            service_id: ServiceId::CareerAdvice,
            user_context: ctx,
        })
    }

    fn plan(artifact: &Artifact) -> &CareerPlanData {
        match &artifact.data {
            ArtifactData::CareerPlan(data) => data,
            other => panic!("expected career plan payload, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_with_context() {
        let ctx = json!({
            "targetRole": "Tech Lead",
            "skillsToDevelop": ["Communication écrite", "Architecture distribuée"]
        });
        let artifact = run(PLAN, Some(&ctx)).unwrap();
        assert_eq!(artifact.artifact_type, ArtifactType::Roadmap);
        assert_eq!(artifact.title, "Career Plan");
        assert_eq!(artifact.priority(), Priority::High);
        assert_eq!(artifact.confidence, 80);

        let data = plan(&artifact);
        assert_eq!(data.roadmap.steps.len(), 3);
        assert_eq!(data.roadmap.current_position, "Développeur backend");
        assert_eq!(data.roadmap.target_position, "Tech Lead");
        assert_eq!(
            data.skills_to_develop,
            vec!["Leadership technique", "Communication écrite", "Architecture distribuée"]
        );
    }

    #[test]
    fn test_context_position_overrides_text() {
        let ctx = json!({ "currentRole": "Analyste" });
        let artifact = run(PLAN, Some(&ctx)).unwrap();
        assert_eq!(plan(&artifact).roadmap.current_position, "Analyste");
    }

    #[test]
    fn test_serializes_flat() {
        let artifact = run(PLAN, None).unwrap();
        let value = serde_json::to_value(&artifact).unwrap();
        assert!(value["data"]["steps"].is_array());
        assert!(value["data"]["skillsToDevelop"].is_array());
        assert!(value["data"]["successProbability"].is_number());
    }

    #[test]
    fn test_needs_two_steps() {
        assert!(run("Phase 1 : Se former au management", None).is_none());
        assert!(run("Continuez ainsi.", None).is_none());
    }
}
