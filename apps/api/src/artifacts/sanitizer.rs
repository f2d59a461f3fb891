//! Display-copy cleanup: text already rendered as an artifact is removed so the
//! presentation layer does not show it twice.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::artifacts::models::{Artifact, ArtifactFamily, ArtifactType};
use crate::artifacts::patterns::{cached_regex, library};

/// Families whose matched text is stripped. Scores and charts stay inline:
/// their numbers read naturally in prose.
const STRIPPED_FAMILIES: [ArtifactFamily; 3] = [
    ArtifactFamily::Table,
    ArtifactFamily::Checklist,
    ArtifactFamily::Roadmap,
];

static BLANK_RUN: OnceLock<Regex> = OnceLock::new();
const BLANK_RUN_SOURCE: &str = r"\n(?:[ \t]*\n){2,}";

/// Removes text matched by the table, checklist, and roadmap rules, but only
/// for families that actually produced one of `artifacts`. Idempotent.
pub fn clean_content_for_display(content: &str, artifacts: &[Artifact]) -> String {
    let present: HashSet<ArtifactType> = artifacts.iter().map(|a| a.artifact_type).collect();
    let families: Vec<ArtifactFamily> = STRIPPED_FAMILIES
        .into_iter()
        .filter(|family| present.contains(&family.artifact_type()))
        .collect();

    let mut current = single_pass(content, &families);
    loop {
        let next = single_pass(&current, &families);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn single_pass(content: &str, families: &[ArtifactFamily]) -> String {
    let lib = library();
    let mut text = content.to_string();
    for family in families {
        for pattern in lib.family(*family) {
            text = pattern.regex().replace_all(&text, "").into_owned();
        }
    }
    cached_regex(&BLANK_RUN, BLANK_RUN_SOURCE)
        .replace_all(&text, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::detectors::run_all;

    fn artifacts_for(content: &str) -> Vec<Artifact> {
        run_all(content, None).into_iter().map(|d| d.artifact).collect()
    }

    #[test]
    fn test_nothing_detected_nothing_removed() {
        let content = "Bonjour,\n\n- un seul point\n\nMerci.";
        assert_eq!(clean_content_for_display(content, &[]), content);
    }

    #[test]
    fn test_table_removed_prose_kept() {
        let content = "Voici le comparatif :\n\n| Critère | Score |\n|---|---|\n| Structure | 85/100 |\n| Contenu | 72/100 |\n\nBon courage !";
        let artifacts = artifacts_for(content);
        let cleaned = clean_content_for_display(content, &artifacts);
        assert_eq!(cleaned, "Voici le comparatif :\n\nBon courage !");
    }

    #[test]
    fn test_scores_stay_inline() {
        let content = "Score global : 78/100\n\n☐ Relire le CV\n☐ Ajouter un lien GitHub\n☐ Mettre à jour le titre";
        let artifacts = artifacts_for(content);
        let cleaned = clean_content_for_display(content, &artifacts);
        assert_eq!(cleaned, "Score global : 78/100");
    }

    #[test]
    fn test_idempotent() {
        let content = "Intro\n\n\n\n☐ Relire le CV\n☐ Ajouter un lien GitHub\n\n\n\nPhase 1 : Se former\nPhase 2 : Postuler\n\nFin";
        let artifacts = artifacts_for(content);
        let once = clean_content_for_display(content, &artifacts);
        let twice = clean_content_for_display(&once, &artifacts);
        assert_eq!(once, twice);
        assert_eq!(once, "Intro\n\nFin");
    }

    #[test]
    fn test_collapses_blank_runs() {
        assert_eq!(clean_content_for_display("a\n\n\n\nb\n", &[]), "a\n\nb");
    }
}
