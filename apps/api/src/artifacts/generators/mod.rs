//! Specialized generators: one rich composite artifact per AI service.
//!
//! Each service maps to exactly one `CompositeGenerator` through an exhaustive
//! match, so adding a `ServiceId` variant fails to compile until it is wired.
//! Generators run after the generic detectors and never replace them.

pub mod ats;
pub mod career;
pub mod cv_analysis;
pub mod interview;
pub mod keywords;
pub mod salary;

use serde_json::Value;
use tracing::debug;

use crate::artifacts::models::{Artifact, ArtifactType, ServiceId};

use self::ats::AtsAnalyzer;
use self::career::CareerPlanner;
use self::cv_analysis::CvAnalysisGenerator;
use self::interview::InterviewSimulator;
use self::salary::SalaryNegotiator;

/// Everything a generator may read. Borrowed for the duration of one call.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorInput<'a> {
    pub content: &'a str,
    pub service_id: ServiceId,
    pub user_context: Option<&'a Value>,
}

impl<'a> GeneratorInput<'a> {
    /// A string field of the user context, if present and non-blank.
    pub fn context_str(&self, key: &str) -> Option<&'a str> {
        self.user_context?
            .get(key)?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// First non-blank string field among `keys`.
    pub fn context_str_any(&self, keys: &[&str]) -> Option<&'a str> {
        keys.iter().find_map(|key| self.context_str(key))
    }

    /// A string array of the user context, or a comma-separated string.
    pub fn context_list(&self, key: &str) -> Vec<String> {
        match self.user_context.and_then(|ctx| ctx.get(key)) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(list)) => list
                .split(|c: char| c == ',' || c == ';')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Builds at most one composite artifact from the full content.
pub trait CompositeGenerator: Send + Sync {
    fn artifact_type(&self) -> ArtifactType;
    fn generate(&self, input: &GeneratorInput<'_>) -> Option<Artifact>;
}

pub fn generator_for(service_id: ServiceId) -> &'static dyn CompositeGenerator {
    match service_id {
        ServiceId::ResumeReview => &CvAnalysisGenerator,
        ServiceId::InterviewPrep => &InterviewSimulator,
        ServiceId::SalaryNegotiation => &SalaryNegotiator,
        ServiceId::CoverLetter => &AtsAnalyzer,
        ServiceId::CareerAdvice => &CareerPlanner,
    }
}

/// Runs the generator registered for `input.service_id`.
pub fn generate(input: &GeneratorInput<'_>) -> Option<Artifact> {
    let generator = generator_for(input.service_id);
    let artifact = generator.generate(input);
    debug!(
        service = input.service_id.as_str(),
        artifact_type = generator.artifact_type().as_str(),
        produced = artifact.is_some(),
        "specialized generator finished"
    );
    artifact
}
