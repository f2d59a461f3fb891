//! Table detector: markdown pipe tables and loose before/after comparison lines.

use tracing::{debug, warn};

use crate::artifacts::detectors::DetectedArtifact;
use crate::artifacts::models::{
    Artifact, ArtifactData, ArtifactFamily, ArtifactType, ServiceId, Span, TableData,
};
use crate::artifacts::patterns::{library, ArtifactCandidate};
use crate::artifacts::prioritizer::priority_for_confidence;
use crate::artifacts::text::{clean_inline, excerpt, title_above};

pub const DEFAULT_TABLE_TITLE: &str = "Data Table";
const COMPARISON_TITLE: &str = "Before / After";

const WELL_FORMED_CONFIDENCE: u8 = 90;
const REPAIRED_CONFIDENCE: u8 = 85;
const SINGLE_ROW_CONFIDENCE: u8 = 75;
const SINGLE_COLUMN_CONFIDENCE: u8 = 60;

const MIN_COMPARISON_LINES: usize = 2;
const COMPARISON_STEP: u8 = 5;
const MAX_COMPARISON_CONFIDENCE: u8 = 75;

pub fn detect_tables(content: &str, service_id: Option<ServiceId>) -> Vec<DetectedArtifact> {
    let lib = library();
    let mut tables: Vec<DetectedArtifact> = lib
        .table_pipe
        .candidates(content)
        .filter_map(|candidate| build_pipe_table(content, &candidate, service_id))
        .collect();

    if let Some(comparison) = build_comparison_table(content, service_id) {
        tables.push(comparison);
    }
    tables
}

fn build_pipe_table(
    content: &str,
    candidate: &ArtifactCandidate<'_>,
    service_id: Option<ServiceId>,
) -> Option<DetectedArtifact> {
    let mut lines = candidate.text().lines().filter(|line| !line.trim().is_empty());
    let headers = split_row(lines.next()?);
    lines.next()?; // separator row

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for line in lines {
        let cells = split_row(line);
        if cells.len() == headers.len() {
            rows.push(cells);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        warn!(pattern = candidate.pattern, dropped, expected_columns = headers.len(), "dropped malformed table rows");
    }
    if rows.is_empty() {
        debug!("table has no well-formed rows, skipping");
        return None;
    }

    let confidence = table_confidence(headers.len(), rows.len(), dropped);
    let title = title_above(content, candidate.span.start, DEFAULT_TABLE_TITLE);
    let artifact = Artifact::new(
        ArtifactType::Table,
        title,
        ArtifactData::Table(TableData::new(headers, rows)),
        confidence,
        candidate.text(),
        service_id,
        priority_for_confidence(confidence),
    );
    Some(DetectedArtifact::new(ArtifactFamily::Table, artifact, vec![candidate.span]))
}

/// Splits `| a | b |` into `["a", "b"]`, dropping the empty edge cells the
/// outer pipes produce.
pub fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn table_confidence(columns: usize, rows: usize, dropped: usize) -> u8 {
    match (columns, rows) {
        (c, _) if c < 2 => SINGLE_COLUMN_CONFIDENCE,
        (_, 1) => SINGLE_ROW_CONFIDENCE,
        _ if dropped > 0 => REPAIRED_CONFIDENCE,
        _ => WELL_FORMED_CONFIDENCE,
    }
}

/// Two or more `Label: Avant: X Après: Y` lines become one three-column table.
fn build_comparison_table(content: &str, service_id: Option<ServiceId>) -> Option<DetectedArtifact> {
    let candidates: Vec<ArtifactCandidate<'_>> = library().table_comparison.candidates(content).collect();
    if candidates.len() < MIN_COMPARISON_LINES {
        return None;
    }

    let rows: Vec<Vec<String>> = candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let label = candidate
                .group("label")
                .map(clean_inline)
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| format!("Item {}", i + 1));
            vec![
                label,
                clean_inline(candidate.group("before").unwrap_or_default()),
                clean_inline(candidate.group("after").unwrap_or_default()),
            ]
        })
        .collect();

    let spans: Vec<Span> = candidates.iter().map(|c| c.span).collect();
    let covering = Span::covering(&spans)?;
    let extra_lines = (rows.len() - MIN_COMPARISON_LINES).min(u8::MAX as usize) as u8;
    let confidence = candidates[0]
        .confidence
        .saturating_add(extra_lines.saturating_mul(COMPARISON_STEP))
        .min(MAX_COMPARISON_CONFIDENCE);

    let headers = vec!["Item".to_string(), "Before".to_string(), "After".to_string()];
    let artifact = Artifact::new(
        ArtifactType::Table,
        title_above(content, covering.start, COMPARISON_TITLE),
        ArtifactData::Table(TableData::new(headers, rows)),
        confidence,
        excerpt(content, covering.start, covering.end),
        service_id,
        priority_for_confidence(confidence),
    );
    Some(DetectedArtifact::new(ArtifactFamily::Table, artifact, spans))
}
