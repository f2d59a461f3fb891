//! Chart detector: value progressions, year series, and percent series.
//!
//! Shapes are tried most-specific first; each one claims its spans so a less
//! specific shape never re-reads the same numbers.

use tracing::debug;

use crate::artifacts::detectors::DetectedArtifact;
use crate::artifacts::models::{
    Artifact, ArtifactData, ArtifactFamily, ArtifactType, ChartData, ChartKind, ChartPoint,
    Progression, SeriesPoint, ServiceId, Span,
};
use crate::artifacts::patterns::{library, ArtifactCandidate};
use crate::artifacts::prioritizer::priority_for_confidence;
use crate::artifacts::text::{clean_inline, excerpt, normalize_unit, parse_amount, parse_decimal};

const PROGRESSION_STEP: u8 = 3;
const MAX_PROGRESSION_CONFIDENCE: u8 = 92;
const YEAR_STEP: u8 = 3;
const MAX_YEAR_CONFIDENCE: u8 = 85;
const PERCENT_STEP: u8 = 5;
const MAX_PERCENT_CONFIDENCE: u8 = 75;

const MIN_SERIES_POINTS: usize = 2;
/// A percent series summing to this range is drawn as a pie.
const PIE_TOTAL_RANGE: std::ops::RangeInclusive<f64> = 95.0..=105.0;

/// One `from → to` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionMatch {
    pub label: Option<String>,
    pub from: f64,
    pub to: f64,
    pub unit: Option<String>,
    pub span: Span,
}

impl ProgressionMatch {
    pub fn change_percent(&self) -> Option<f64> {
        if self.from == 0.0 {
            return None;
        }
        Some(((self.to - self.from) / self.from * 1000.0).round() / 10.0)
    }

    fn to_point(&self) -> ChartPoint {
        ChartPoint::Progression(Progression {
            label: self.label.clone(),
            from: self.from,
            to: self.to,
            change_percent: self.change_percent(),
        })
    }
}

pub fn detect_charts(content: &str, service_id: Option<ServiceId>) -> Vec<DetectedArtifact> {
    let mut charts = Vec::new();
    let mut claimed: Vec<Span> = Vec::new();

    for (unit, group) in group_by_unit(parse_progressions(content)) {
        let spans: Vec<Span> = group.iter().map(|p| p.span).collect();
        let confidence = step_confidence(
            library().chart_progression.base_confidence,
            group.len(),
            PROGRESSION_STEP,
            MAX_PROGRESSION_CONFIDENCE,
        );
        let title = progression_title(&group, unit.as_deref());
        let data = ChartData {
            chart_type: ChartKind::Line,
            data: group.iter().map(ProgressionMatch::to_point).collect(),
            unit,
            insights: Vec::new(),
            predictions: Vec::new(),
        };
        claimed.extend(spans.iter().copied());
        charts.push(chart_artifact(content, title, data, confidence, spans, service_id));
    }

    if let Some(chart) = year_series(content, &mut claimed, service_id) {
        charts.push(chart);
    }
    if let Some(chart) = percent_series(content, &claimed, service_id) {
        charts.push(chart);
    }
    charts
}

/// Every valid progression in document order. Shared with the salary generator.
pub fn parse_progressions(content: &str) -> Vec<ProgressionMatch> {
    library()
        .chart_progression
        .candidates(content)
        .filter_map(|candidate| parse_progression(&candidate))
        .collect()
}

fn parse_progression(candidate: &ArtifactCandidate<'_>) -> Option<ProgressionMatch> {
    let from = parse_amount(candidate.group("from")?, candidate.group("from_mult"))?;
    let to = parse_amount(candidate.group("to")?, candidate.group("to_mult"))?;
    let unit = [
        candidate.group("to_unit"),
        candidate.group("from_unit"),
        candidate.group("to_cur"),
        candidate.group("from_cur"),
    ]
    .into_iter()
    .flatten()
    .find_map(normalize_unit);
    let label = candidate
        .group("label")
        .map(clean_inline)
        .filter(|label| !label.is_empty());

    Some(ProgressionMatch {
        label,
        from,
        to,
        unit,
        span: candidate.span,
    })
}

/// Groups by unit, keeping first-seen order of units and of points within each.
fn group_by_unit(progressions: Vec<ProgressionMatch>) -> Vec<(Option<String>, Vec<ProgressionMatch>)> {
    let mut groups: Vec<(Option<String>, Vec<ProgressionMatch>)> = Vec::new();
    for progression in progressions {
        match groups.iter_mut().find(|(unit, _)| *unit == progression.unit) {
            Some((_, group)) => group.push(progression),
            None => groups.push((progression.unit.clone(), vec![progression])),
        }
    }
    groups
}

fn progression_title(group: &[ProgressionMatch], unit: Option<&str>) -> String {
    if let [single] = group {
        if let Some(label) = &single.label {
            return label.clone();
        }
    }
    match unit {
        Some("€") | Some("$") | Some("£") => "Salary Progression".to_string(),
        Some("%") => "Rate Progression".to_string(),
        _ => "Progression".to_string(),
    }
}

fn year_series(
    content: &str,
    claimed: &mut Vec<Span>,
    service_id: Option<ServiceId>,
) -> Option<DetectedArtifact> {
    let pattern = &library().chart_year_value;
    let mut points: Vec<(u32, f64, Option<String>, Span)> = pattern
        .candidates(content)
        .filter(|c| !claimed.iter().any(|span| span.overlaps(&c.span)))
        .filter_map(|c| {
            let year: u32 = c.group("year")?.parse().ok()?;
            let mult = c.group("mult");
            let unit = c.group("unit").or(c.group("cur")).and_then(normalize_unit);
            let value = parse_amount(c.group("value")?, mult)?;
            // "2020 - 2022" is a date range, not a value.
            if mult.is_none() && unit.is_none() && (1900.0..=2100.0).contains(&value) {
                return None;
            }
            Some((year, value, unit, c.span))
        })
        .collect();

    if points.len() < MIN_SERIES_POINTS {
        return None;
    }
    points.sort_by_key(|(year, ..)| *year);

    let spans: Vec<Span> = points.iter().map(|(.., span)| *span).collect();
    claimed.extend(spans.iter().copied());
    let unit = points.iter().find_map(|(_, _, unit, _)| unit.clone());
    let confidence = step_confidence(pattern.base_confidence, points.len(), YEAR_STEP, MAX_YEAR_CONFIDENCE);
    let data = ChartData {
        chart_type: ChartKind::Line,
        data: points
            .iter()
            .map(|(year, value, ..)| {
                ChartPoint::Value(SeriesPoint {
                    label: year.to_string(),
                    value: *value,
                })
            })
            .collect(),
        unit,
        insights: Vec::new(),
        predictions: Vec::new(),
    };
    Some(chart_artifact(content, "Evolution Over Time".to_string(), data, confidence, spans, service_id))
}

fn percent_series(
    content: &str,
    claimed: &[Span],
    service_id: Option<ServiceId>,
) -> Option<DetectedArtifact> {
    let pattern = &library().chart_percent;
    let points: Vec<(SeriesPoint, Span)> = pattern
        .candidates(content)
        .filter(|c| !claimed.iter().any(|span| span.overlaps(&c.span)))
        .filter_map(|c| {
            let label = clean_inline(c.group("label")?);
            let value = parse_decimal(c.group("value")?)?;
            (!label.is_empty()).then(|| (SeriesPoint { label, value }, c.span))
        })
        .collect();

    if points.len() < MIN_SERIES_POINTS {
        return None;
    }
    let total: f64 = points.iter().map(|(point, _)| point.value).sum();
    let chart_type = if PIE_TOTAL_RANGE.contains(&total) {
        ChartKind::Pie
    } else {
        ChartKind::Bar
    };
    debug!(points = points.len(), total, chart_type = ?chart_type, "percent series found");

    let spans: Vec<Span> = points.iter().map(|(_, span)| *span).collect();
    let confidence = step_confidence(pattern.base_confidence, points.len(), PERCENT_STEP, MAX_PERCENT_CONFIDENCE);
    let data = ChartData {
        chart_type,
        data: points.into_iter().map(|(point, _)| ChartPoint::Value(point)).collect(),
        unit: Some("%".to_string()),
        insights: Vec::new(),
        predictions: Vec::new(),
    };
    Some(chart_artifact(content, "Breakdown".to_string(), data, confidence, spans, service_id))
}

/// Base confidence plus `step` for every point beyond the first, capped.
fn step_confidence(base: u8, points: usize, step: u8, cap: u8) -> u8 {
    let extra = points.saturating_sub(1).min(u8::MAX as usize) as u8;
    base.saturating_add(extra.saturating_mul(step)).min(cap)
}

fn chart_artifact(
    content: &str,
    title: String,
    data: ChartData,
    confidence: u8,
    spans: Vec<Span>,
    service_id: Option<ServiceId>,
) -> DetectedArtifact {
    let source = Span::covering(&spans)
        .map(|s| excerpt(content, s.start, s.end))
        .unwrap_or_default();
    let artifact = Artifact::new(
        ArtifactType::Chart,
        title,
        ArtifactData::Chart(data),
        confidence,
        source,
        service_id,
        priority_for_confidence(confidence),
    );
    DetectedArtifact::new(ArtifactFamily::Chart, artifact, spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::models::Priority;

    fn chart(detected: &DetectedArtifact) -> &ChartData {
        match &detected.artifact.data {
            ArtifactData::Chart(data) => data,
            other => panic!("expected chart payload, got {other:?}"),
        }
    }

    #[test]
    fn test_salary_progression_normalized() {
        let charts = detect_charts("35k€ → 42k€", None);
        assert_eq!(charts.len(), 1);
        let data = chart(&charts[0]);
        assert_eq!(data.chart_type, ChartKind::Line);
        assert_eq!(data.unit.as_deref(), Some("€"));
        match &data.data[0] {
            ChartPoint::Progression(p) => {
                assert_eq!(p.from, 35_000.0);
                assert_eq!(p.to, 42_000.0);
                assert_eq!(p.change_percent, Some(20.0));
            }
            other => panic!("expected progression, got {other:?}"),
        }
        assert!(data.insights.is_empty() && data.predictions.is_empty());
        assert_eq!(charts[0].artifact.confidence, 85);
        assert_eq!(charts[0].artifact.priority(), Priority::High);
        assert_eq!(charts[0].artifact.title, "Salary Progression");
    }

    #[test]
    fn test_space_grouped_thousands() {
        let charts = detect_charts("Salaire : 45 000 € → 50 000 €", None);
        assert_eq!(charts.len(), 1);
        match &chart(&charts[0]).data[0] {
            ChartPoint::Progression(p) => {
                assert_eq!(p.from, 45_000.0);
                assert_eq!(p.to, 50_000.0);
            }
            other => panic!("expected progression, got {other:?}"),
        }
        assert_eq!(charts[0].artifact.title, "Salaire");
    }

    #[test]
    fn test_year_series_with_grouped_values() {
        let content = "2022 : 38 000 €\n2023 : 41 500 €";
        let data = chart(&detect_charts(content, None)[0]).clone();
        assert_eq!(data.data.len(), 2);
        assert_eq!(
            data.data[1],
            ChartPoint::Value(SeriesPoint {
                label: "2023".to_string(),
                value: 41_500.0
            })
        );
    }

    #[test]
    fn test_progressions_grouped_per_unit() {
        let content = "Salaire: 40k€ -> 46k€\nVariable: 3k€ => 5k€\nTaux de réponse: 5% → 15%";
        let charts = detect_charts(content, None);
        assert_eq!(charts.len(), 2);
        assert_eq!(chart(&charts[0]).data.len(), 2);
        assert_eq!(charts[0].artifact.confidence, 88);
        assert_eq!(chart(&charts[1]).unit.as_deref(), Some("%"));
        assert_eq!(charts[1].artifact.title, "Taux de réponse");
    }

    #[test]
    fn test_year_series() {
        let content = "2022: 38k€\n2023: 41k€\n2024: 45k€";
        let charts = detect_charts(content, None);
        assert_eq!(charts.len(), 1);
        let data = chart(&charts[0]);
        assert_eq!(data.chart_type, ChartKind::Line);
        assert_eq!(data.data.len(), 3);
        assert_eq!(
            data.data[0],
            ChartPoint::Value(SeriesPoint {
                label: "2022".to_string(),
                value: 38_000.0
            })
        );
        assert_eq!(charts[0].artifact.confidence, 81);
    }

    #[test]
    fn test_year_ranges_are_not_series() {
        assert!(detect_charts("Poste A: 2018 - 2020\nPoste B: 2020 - 2023", None).is_empty());
    }

    #[test]
    fn test_percent_series_pie_when_summing_to_hundred() {
        let content = "Répartition du temps:\n- Technique: 50%\n- Management: 30%\n- Formation: 20%";
        let charts = detect_charts(content, None);
        assert_eq!(charts.len(), 1);
        assert_eq!(chart(&charts[0]).chart_type, ChartKind::Pie);
        assert_eq!(charts[0].artifact.confidence, 70);
        assert_eq!(charts[0].artifact.priority(), Priority::Medium);
    }

    #[test]
    fn test_percent_series_bar_otherwise() {
        let content = "Python: 80%\nSQL: 65%";
        let charts = detect_charts(content, None);
        assert_eq!(chart(&charts[0]).chart_type, ChartKind::Bar);
    }

    #[test]
    fn test_single_percent_is_not_a_series() {
        assert!(detect_charts("Taux de réussite: 70%", None).is_empty());
    }

    #[test]
    fn test_progression_claims_its_percent_values() {
        let charts = detect_charts("Taux de réponse: 5% → 15%\nConversion: 2% → 6%", None);
        assert_eq!(charts.len(), 1);
        assert_eq!(chart(&charts[0]).data.len(), 2);
    }

    #[test]
    fn test_step_confidence() {
        assert_eq!(step_confidence(85, 1, 3, 92), 85);
        assert_eq!(step_confidence(85, 10, 3, 92), 92);
        assert_eq!(step_confidence(60, 0, 5, 75), 60);
    }
}
