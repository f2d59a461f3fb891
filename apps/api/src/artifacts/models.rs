//! Artifact data model: the wire contract shared with the rendering layer.
//!
//! Every payload serializes camelCase; enum tags serialize kebab/lowercase so the
//! JSON matches what the presentation layer already consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::artifacts::text::truncate_chars;

/// Maximum length (in chars) of `Artifact::source`.
pub const MAX_SOURCE_CHARS: usize = 300;

// ────────────────────────────────────────────────────────────────────────────
// Identifiers and tags
// ────────────────────────────────────────────────────────────────────────────

/// The AI flow that produced the content. Gates the specialized generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceId {
    ResumeReview,
    InterviewPrep,
    SalaryNegotiation,
    CoverLetter,
    CareerAdvice,
}

impl ServiceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::ResumeReview => "resume-review",
            ServiceId::InterviewPrep => "interview-prep",
            ServiceId::SalaryNegotiation => "salary-negotiation",
            ServiceId::CoverLetter => "cover-letter",
            ServiceId::CareerAdvice => "career-advice",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactType {
    Table,
    Chart,
    Score,
    Checklist,
    Roadmap,
    Heatmap,
    Dashboard,
    CvAnalysis,
    InterviewSimulator,
    SalaryNegotiator,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Table => "table",
            ArtifactType::Chart => "chart",
            ArtifactType::Score => "score",
            ArtifactType::Checklist => "checklist",
            ArtifactType::Roadmap => "roadmap",
            ArtifactType::Heatmap => "heatmap",
            ArtifactType::Dashboard => "dashboard",
            ArtifactType::CvAnalysis => "cv-analysis",
            ArtifactType::InterviewSimulator => "interview-simulator",
            ArtifactType::SalaryNegotiator => "salary-negotiator",
        }
    }

    /// Whether the renderer lets the user act on the widget (sort, toggle, step through).
    pub fn is_interactive(&self) -> bool {
        !matches!(self, ArtifactType::Score | ArtifactType::Heatmap)
    }

    pub fn is_exportable(&self) -> bool {
        !matches!(self, ArtifactType::InterviewSimulator)
    }
}

/// Ordering tier. Declaration order is the sort order: `High` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Structural shape a detection pattern belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFamily {
    Table,
    Score,
    Checklist,
    Chart,
    Roadmap,
}

impl ArtifactFamily {
    /// The artifact type a family's detector emits.
    pub fn artifact_type(&self) -> ArtifactType {
        match self {
            ArtifactFamily::Table => ArtifactType::Table,
            ArtifactFamily::Score => ArtifactType::Score,
            ArtifactFamily::Checklist => ArtifactType::Checklist,
            ArtifactFamily::Chart => ArtifactType::Chart,
            ArtifactFamily::Roadmap => ArtifactType::Roadmap,
        }
    }
}

/// Byte range `[start, end)` into the analyzed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Number of bytes shared with `other`.
    pub fn overlap(&self, other: &Span) -> usize {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        end.saturating_sub(start)
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.overlap(other) > 0
    }

    /// Smallest span covering every span in `spans`.
    pub fn covering(spans: &[Span]) -> Option<Span> {
        let start = spans.iter().map(|s| s.start).min()?;
        let end = spans.iter().map(|s| s.end).max()?;
        Some(Span::new(start, end))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Input
// ────────────────────────────────────────────────────────────────────────────

/// One analysis request: the AI text, the flow that produced it, and free-form
/// user context (target keywords, CV text, positions...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContent {
    pub content: String,
    #[serde(default)]
    pub service_id: Option<ServiceId>,
    #[serde(default)]
    pub user_context: Option<Value>,
}

impl RawContent {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            service_id: None,
            user_context: None,
        }
    }

    pub fn with_service(mut self, service_id: Option<ServiceId>) -> Self {
        self.service_id = service_id;
        self
    }

    pub fn with_user_context(mut self, user_context: Option<Value>) -> Self {
        self.user_context = user_context;
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Artifact envelope
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    pub ai_generated: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<ServiceId>,
    pub interactive: bool,
    pub exportable: bool,
    pub priority: Priority,
}

/// A typed, display-ready unit extracted from AI text. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    pub title: String,
    pub data: ArtifactData,
    pub confidence: u8,
    pub source: String,
    pub metadata: ArtifactMetadata,
}

impl Artifact {
    /// Builds an artifact with a fresh id and timestamp. Confidence is clamped to
    /// 100 and the source excerpt truncated to `MAX_SOURCE_CHARS`.
    pub fn new(
        artifact_type: ArtifactType,
        title: impl Into<String>,
        data: ArtifactData,
        confidence: u8,
        source: &str,
        service_id: Option<ServiceId>,
        priority: Priority,
    ) -> Self {
        let timestamp = Utc::now();
        Self {
            id: generate_artifact_id(artifact_type, timestamp),
            artifact_type,
            title: title.into(),
            data,
            confidence: confidence.min(100),
            source: truncate_chars(source.trim(), MAX_SOURCE_CHARS),
            metadata: ArtifactMetadata {
                ai_generated: true,
                timestamp,
                service_id,
                interactive: artifact_type.is_interactive(),
                exportable: artifact_type.is_exportable(),
                priority,
            },
        }
    }

    pub fn priority(&self) -> Priority {
        self.metadata.priority
    }
}

/// `<type>-<unix nanos>-<random hex>`. No shared counter, so concurrent callers
/// never coordinate.
pub fn generate_artifact_id(artifact_type: ArtifactType, at: DateTime<Utc>) -> String {
    let nanos = at
        .timestamp_nanos_opt()
        .unwrap_or_else(|| at.timestamp_micros().saturating_mul(1_000));
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", artifact_type.as_str(), nanos, &suffix[..9])
}

// ────────────────────────────────────────────────────────────────────────────
// Payloads
// ────────────────────────────────────────────────────────────────────────────

/// Type-specific payload. Untagged: the envelope's `type` already discriminates.
///
/// Variant order matters for deserialization: `CareerPlan` is a superset of
/// `Roadmap` and must be tried first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactData {
    Table(TableData),
    Score(ScoreData),
    Checklist(ChecklistData),
    Chart(ChartData),
    CareerPlan(CareerPlanData),
    Roadmap(RoadmapData),
    CvAnalysis(CvAnalysisData),
    InterviewSimulator(InterviewData),
    SalaryNegotiator(SalaryData),
    AtsDashboard(AtsDashboardData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub sortable: bool,
    pub filterable: bool,
    pub exportable: bool,
}

impl TableData {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let filterable = headers.len() <= 5;
        Self {
            headers,
            rows,
            sortable: true,
            filterable,
            exportable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScore {
    pub label: String,
    pub score: f64,
    pub max_score: f64,
    pub confidence: u8,
}

impl SubScore {
    /// Score on a 0–100 scale.
    pub fn percentage(&self) -> f64 {
        if self.max_score <= 0.0 {
            return 0.0;
        }
        self.score / self.max_score * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreData {
    pub global_score: u32,
    pub max_score: u32,
    pub sub_scores: Vec<SubScore>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistData {
    pub items: Vec<ChecklistItem>,
    pub completable: bool,
    /// Completed share of items, 0–100.
    pub progress: u32,
    pub estimated_time: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub from: f64,
    pub to: f64,
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartPoint {
    Progression(Progression),
    Value(SeriesPoint),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    #[serde(rename = "type")]
    pub chart_type: ChartKind,
    pub data: Vec<ChartPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Left empty here; filled by downstream AI enrichment.
    pub insights: Vec<String>,
    pub predictions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapStep {
    pub timeframe: String,
    pub description: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapData {
    pub steps: Vec<RoadmapStep>,
    pub current_position: String,
    pub target_position: String,
    pub timeframe: String,
    /// Heuristic estimate in [20, 90]; not a statistical probability.
    pub success_probability: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPlanData {
    #[serde(flatten)]
    pub roadmap: RoadmapData,
    pub skills_to_develop: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Strong,
    Moderate,
    Weak,
    Critical,
}

impl SectionStatus {
    pub fn from_percentage(score: f64) -> Self {
        match score {
            s if s >= 80.0 => SectionStatus::Strong,
            s if s >= 50.0 => SectionStatus::Moderate,
            s if s >= 20.0 => SectionStatus::Weak,
            _ => SectionStatus::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionScore {
    pub name: String,
    pub score: u32,
    pub status: SectionStatus,
}

/// Expected-vs-detected keyword count and its point impact on the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMatch {
    pub keyword: String,
    pub expected: u32,
    pub detected: u32,
    pub impact: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvAnalysisData {
    pub global_score: Option<u32>,
    pub max_score: u32,
    pub sections: Vec<SectionScore>,
    pub keywords: Vec<KeywordMatch>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub missing_sections: Vec<String>,
    pub ats_compatibility: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionCategory {
    Behavioral,
    Situational,
    Technical,
    Motivation,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewQuestion {
    pub question: String,
    pub category: QuestionCategory,
    pub expected_time_minutes: u32,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewData {
    pub questions: Vec<InterviewQuestion>,
    pub total_duration_minutes: u32,
    pub focus_areas: Vec<QuestionCategory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationStrategy {
    pub name: String,
    pub description: String,
    pub risk: Risk,
    /// Heuristic 0–100 estimate.
    pub success_rate: u8,
    pub timeframe: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryData {
    pub current_salary: Option<f64>,
    pub target_salary: Option<f64>,
    pub market_range: Option<SalaryRange>,
    pub currency: Option<String>,
    pub strategies: Vec<NegotiationStrategy>,
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatCheck {
    pub check: String,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetric {
    pub label: String,
    pub value: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsDashboardData {
    pub ats_score: Option<u32>,
    pub max_score: u32,
    pub keyword_matches: Vec<KeywordMatch>,
    pub format_checks: Vec<FormatCheck>,
    pub metrics: Vec<DashboardMetric>,
}
