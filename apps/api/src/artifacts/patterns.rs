//! Pattern library: declarative detection rules grouped by artifact family.
//!
//! Every rule is a compiled regex plus the family it feeds and a base
//! confidence. The library is compiled once on first use and shared read-only
//! by every detector, generator, and the sanitizer.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::artifacts::models::{ArtifactFamily, Span};

// ────────────────────────────────────────────────────────────────────────────
// Rule sources
// ────────────────────────────────────────────────────────────────────────────

/// Header row, separator row, then one or more data rows.
const TABLE_PIPE: &str = r"(?m)^[ \t]*\|[^\n]*\|[ \t]*\r?\n[ \t]*\|?[ \t:|-]*-[ \t:|-]*\r?\n(?:[ \t]*\|[^\n]*\|[ \t]*(?:\r?\n|\z))+";

/// `Label: Avant: X Après: Y` on a single line.
const TABLE_COMPARISON: &str = r"(?mi)^[ \t]*(?:[-*•][ \t]+)?(?:\*\*)?(?:(?P<label>[^:\n*]{1,60}?)(?:\*\*)?[ \t]*[:\-–][ \t]*)?(?:\*\*)?(?:avant|before)(?:\*\*)?[ \t]*:[ \t]*(?P<before>[^\n]+?)[ \t]*(?:[,;|]|→|->)?[ \t]*(?:\*\*)?(?:après|apres|after)(?:\*\*)?[ \t]*:[ \t]*(?P<after>[^\n]+?)[ \t]*$";

const SCORE_EXPLICIT: &str = r"(?i)\b(?P<label>(?:overall[ \t]+|global[ \t]+)?score|note|r[ée]sultat)(?:[ \t]+(?P<qualifier>globale?|totale?|finale?|g[ée]n[ée]rale?|ats|cv|moyenne?|overall))?(?:\*\*)?[ \t]*:[ \t]*(?:\*\*)?[ \t]*(?P<value>\d{1,3}(?:[.,]\d+)?)\b[ \t]*(?:/[ \t]*(?P<max>\d+)|(?P<pct>%))?";

/// Line-anchored `Label: ████░░ 80%`, `Label: 8/10`, `Label: 75%`, or bars alone.
/// Everything after the colon is optional; the detector rejects matches that
/// carry neither a bar nor a value.
const SCORE_CATEGORY: &str = r"(?m)^[ \t]*(?:[-*•+][ \t]+|\d{1,2}[.)][ \t]+)?(?:\*\*)?(?P<label>[^\n:|*]{2,60}?)(?:\*\*)?[ \t]*:[ \t]*(?:\*\*)?(?P<bar>[█▓▒░■□●○★☆]{3,})?[ \t]*\(?[ \t]*(?:(?P<value>\d{1,3}(?:[.,]\d+)?)\b[ \t]*(?:/[ \t]*(?P<max>\d+)|(?P<pct>%)))?";

const SCORE_GENERIC: &str = r"(?P<label>\p{L}[\p{L}\p{M}'’ \-]{1,40}?)[ \t]*:[ \t]*(?P<value>\d{1,3}(?:[.,]\d+)?)[ \t]*(?P<pct>%)";

const CHECKLIST_BULLET: &str = r"(?m)^[ \t]*[-*•+][ \t]+(?:\[(?P<mark>[ xX✓])\][ \t]*)?(?P<text>[^\n]+)$";

const CHECKLIST_NUMBERED: &str = r"(?m)^[ \t]*\d{1,2}[.)][ \t]+(?P<text>[^\n]+)$";

const CHECKLIST_STEP: &str = r"(?mi)^[ \t]*(?:[-*•][ \t]+)?(?:\*\*)?(?:step|[ée]tape)[ \t]*(?P<n>\d{1,2})(?:\*\*)?[ \t]*[:.)\-–]+[ \t]*(?:\*\*)?(?P<text>[^\n]+)$";

const CHECKLIST_RECOMMENDATION: &str = r"(?mi)^[ \t]*(?:[-*•][ \t]+)?(?:\*\*)?(?:recommandation|recommendation|conseil|tip|astuce|action(?:[ \t]+recommand[ée]e)?)s?(?:[ \t]*#?\d{1,2})?(?:\*\*)?[ \t]*:(?:\*\*)?[ \t]*(?P<text>[^\n]+)$";

const CHECKLIST_GLYPH: &str = r"(?m)^[ \t]*(?:[-*•][ \t]+)?(?P<glyph>☐|☑|✓|✔|✅|❌)\x{FE0F}?[ \t]*(?P<text>[^\n]+)$";

/// Amount: grouped thousands (`45 000`, `45.000`) or a plain decimal (`42,5`).
/// The grouped branch must end on a word boundary so `45 2021` stays two numbers.
macro_rules! amount {
    () => {
        r"\d{1,3}(?:[ \x{a0}\x{202f}.]\d{3})+\b|\d+(?:[.,]\d+)?"
    };
}
pub(crate) use amount;

const CHART_PROGRESSION: &str = concat!(
    r"(?:(?P<label>\p{L}[^\n:→>]{0,58}?)[ \t]*:[ \t]*)?(?P<from_cur>[€$£])?[ \t]*(?P<from>",
    amount!(),
    r")[ \t]*(?P<from_mult>[kKM])?[ \t]*(?P<from_unit>[€$£%]|euros?)?[ \t]*(?:→|->|=>|⇒)[ \t]*(?P<to_cur>[€$£])?[ \t]*(?P<to>",
    amount!(),
    r")[ \t]*(?P<to_mult>[kKM])?[ \t]*(?P<to_unit>[€$£%]|euros?)?"
);

const CHART_YEAR_VALUE: &str = concat!(
    r"\b(?P<year>(?:19|20)\d{2})[ \t]*(?::|=|-|–)[ \t]*(?P<cur>[€$£])?[ \t]*(?P<value>",
    amount!(),
    r")[ \t]*(?P<mult>[kKM])?[ \t]*(?P<unit>[€$£%]|euros?)?"
);

const CHART_PERCENT: &str = SCORE_GENERIC;

const ROADMAP_PHASE: &str = r"(?mi)^[ \t]*(?:[-*•][ \t]+|#{1,6}[ \t]+)?(?:\*\*)?phase[ \t]+(?P<n>\d{1,2})(?:\*\*)?[ \t]*(?:\((?P<time>[^)\n]{1,40})\))?[ \t]*(?:\*\*)?[ \t]*[:.\-–]+[ \t]*(?:\*\*)?(?P<desc>[^\n]+)$";

const ROADMAP_ORDINAL: &str = r"(?mi)^[ \t]*(?:[-*•][ \t]+|#{1,6}[ \t]+)?(?:\*\*)?(?P<ord>premi[èe]re?|deuxi[èe]me|seconde?|troisi[èe]me|quatri[èe]me|cinqui[èe]me|sixi[èe]me|first|third|fourth|fifth|sixth)(?:[ \t]+(?:[ée]tape|step|phase))?(?:\*\*)?[ \t]*[:.\-–]+[ \t]*(?:\*\*)?(?P<desc>[^\n]+)$";

const ROADMAP_RELATIVE: &str = r"(?mi)^[ \t]*(?:[-*•][ \t]+|#{1,6}[ \t]+)?(?:\*\*)?(?P<time>(?:dans|in|d'ici|within|sous)[ \t]+\d{1,3}(?:[ \t]*[-–à][ \t]*\d{1,3})?[ \t]*(?:mois|months?|ans?|ann[ée]es?|years?|semaines?|weeks?|jours?|days?)|(?:mois|month|semaine|week|ann[ée]e|year)[ \t]+\d{1,2}(?:[ \t]*[-–à][ \t]*\d{1,2})?)(?:\*\*)?[ \t]*[:.\-–]+[ \t]*(?:\*\*)?(?P<desc>[^\n]+)$";

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// A named regex rule. Pure and shareable across threads.
#[derive(Debug)]
pub struct DetectionPattern {
    pub name: &'static str,
    pub family: ArtifactFamily,
    pub base_confidence: u8,
    regex: Regex,
}

impl DetectionPattern {
    fn new(name: &'static str, family: ArtifactFamily, base_confidence: u8, source: &str) -> Self {
        Self {
            name,
            family,
            base_confidence,
            regex: Regex::new(source)
                .unwrap_or_else(|e| panic!("invalid built-in pattern {name}: {e}")),
        }
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Lazily yields one candidate per non-overlapping match in `content`.
    pub fn candidates<'a>(&'a self, content: &'a str) -> impl Iterator<Item = ArtifactCandidate<'a>> + 'a {
        self.regex.captures_iter(content).filter_map(move |captures| {
            let whole = captures.get(0)?;
            Some(ArtifactCandidate {
                pattern: self.name,
                span: Span::new(whole.start(), whole.end()),
                captures,
                confidence: self.base_confidence,
            })
        })
    }
}

/// One raw match, borrowed from the analyzed content.
#[derive(Debug)]
pub struct ArtifactCandidate<'h> {
    pub pattern: &'static str,
    pub span: Span,
    pub captures: Captures<'h>,
    pub confidence: u8,
}

impl<'h> ArtifactCandidate<'h> {
    /// Text of a named group that participated in the match.
    pub fn group(&self, name: &str) -> Option<&'h str> {
        self.captures.name(name).map(|m| m.as_str())
    }

    pub fn text(&self) -> &'h str {
        self.captures.get(0).map_or("", |m| m.as_str())
    }
}

pub struct PatternLibrary {
    pub table_pipe: DetectionPattern,
    pub table_comparison: DetectionPattern,
    pub score_explicit: DetectionPattern,
    pub score_category: DetectionPattern,
    pub score_generic: DetectionPattern,
    pub checklist_bullet: DetectionPattern,
    pub checklist_numbered: DetectionPattern,
    pub checklist_step: DetectionPattern,
    pub checklist_recommendation: DetectionPattern,
    pub checklist_glyph: DetectionPattern,
    pub chart_progression: DetectionPattern,
    pub chart_year_value: DetectionPattern,
    pub chart_percent: DetectionPattern,
    pub roadmap_phase: DetectionPattern,
    pub roadmap_ordinal: DetectionPattern,
    pub roadmap_relative: DetectionPattern,
}

impl PatternLibrary {
    fn compile() -> Self {
        use ArtifactFamily::*;
        Self {
            table_pipe: DetectionPattern::new("table_pipe", Table, 90, TABLE_PIPE),
            table_comparison: DetectionPattern::new("table_comparison", Table, 65, TABLE_COMPARISON),
            score_explicit: DetectionPattern::new("score_explicit", Score, 90, SCORE_EXPLICIT),
            score_category: DetectionPattern::new("score_category", Score, 75, SCORE_CATEGORY),
            score_generic: DetectionPattern::new("score_generic", Score, 65, SCORE_GENERIC),
            checklist_bullet: DetectionPattern::new("checklist_bullet", Checklist, 40, CHECKLIST_BULLET),
            checklist_numbered: DetectionPattern::new("checklist_numbered", Checklist, 40, CHECKLIST_NUMBERED),
            checklist_step: DetectionPattern::new("checklist_step", Checklist, 40, CHECKLIST_STEP),
            checklist_recommendation: DetectionPattern::new(
                "checklist_recommendation",
                Checklist,
                40,
                CHECKLIST_RECOMMENDATION,
            ),
            checklist_glyph: DetectionPattern::new("checklist_glyph", Checklist, 100, CHECKLIST_GLYPH),
            chart_progression: DetectionPattern::new("chart_progression", Chart, 85, CHART_PROGRESSION),
            chart_year_value: DetectionPattern::new("chart_year_value", Chart, 75, CHART_YEAR_VALUE),
            chart_percent: DetectionPattern::new("chart_percent", Chart, 60, CHART_PERCENT),
            roadmap_phase: DetectionPattern::new("roadmap_phase", Roadmap, 70, ROADMAP_PHASE),
            roadmap_ordinal: DetectionPattern::new("roadmap_ordinal", Roadmap, 70, ROADMAP_ORDINAL),
            roadmap_relative: DetectionPattern::new("roadmap_relative", Roadmap, 70, ROADMAP_RELATIVE),
        }
    }

    pub fn all(&self) -> [&DetectionPattern; 16] {
        [
            &self.table_pipe,
            &self.table_comparison,
            &self.score_explicit,
            &self.score_category,
            &self.score_generic,
            &self.checklist_bullet,
            &self.checklist_numbered,
            &self.checklist_step,
            &self.checklist_recommendation,
            &self.checklist_glyph,
            &self.chart_progression,
            &self.chart_year_value,
            &self.chart_percent,
            &self.roadmap_phase,
            &self.roadmap_ordinal,
            &self.roadmap_relative,
        ]
    }

    /// Every rule of one family, most specific first.
    pub fn family(&self, family: ArtifactFamily) -> Vec<&DetectionPattern> {
        self.all()
            .into_iter()
            .filter(|pattern| pattern.family == family)
            .collect()
    }
}

/// The process-wide compiled library.
pub fn library() -> &'static PatternLibrary {
    static LIBRARY: OnceLock<PatternLibrary> = OnceLock::new();
    LIBRARY.get_or_init(PatternLibrary::compile)
}

/// Compiles a helper regex into `cell` on first use.
pub(crate) fn cached_regex(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("Invalid built-in regex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups<'a>(pattern: &'a DetectionPattern, content: &'a str, name: &str) -> Vec<&'a str> {
        pattern
            .candidates(content)
            .filter_map(|c| c.group(name))
            .collect()
    }

    #[test]
    fn test_library_compiles_every_rule() {
        let lib = library();
        assert_eq!(lib.all().len(), 16);
        assert_eq!(lib.family(ArtifactFamily::Checklist).len(), 5);
        assert_eq!(lib.family(ArtifactFamily::Table).len(), 2);
    }

    #[test]
    fn test_table_pipe_requires_separator_and_row() {
        let lib = library();
        let table = "| A | B |\n|---|---|\n| 1 | 2 |";
        assert_eq!(lib.table_pipe.candidates(table).count(), 1);
        assert_eq!(lib.table_pipe.candidates("| A | B |\n| 1 | 2 |").count(), 0);
        assert_eq!(lib.table_pipe.candidates("| A | B |\n|---|---|\n").count(), 0);
    }

    #[test]
    fn test_table_pipe_accepts_alignment_and_crlf() {
        let table = "| A | B |\r\n|:--|--:|\r\n| 1 | 2 |\r\n";
        assert_eq!(library().table_pipe.candidates(table).count(), 1);
    }

    #[test]
    fn test_comparison_line() {
        let lib = library();
        let line = "- Longueur: Avant: 3 pages Après: 1 page";
        let c = lib.table_comparison.candidates(line).next().unwrap();
        assert_eq!(c.group("label"), Some("Longueur"));
        assert_eq!(c.group("before"), Some("3 pages"));
        assert_eq!(c.group("after"), Some("1 page"));
    }

    #[test]
    fn test_score_explicit_variants() {
        let lib = library();
        let c = lib.score_explicit.candidates("Score global : 78/100").next().unwrap();
        assert_eq!(c.group("value"), Some("78"));
        assert_eq!(c.group("max"), Some("100"));
        let c = lib.score_explicit.candidates("**Score ATS :** 64%").next().unwrap();
        assert_eq!(c.group("value"), Some("64"));
        assert!(c.group("pct").is_some());
        assert_eq!(groups(&lib.score_explicit, "Résultat: 7,5/10", "value"), vec!["7,5"]);
    }

    #[test]
    fn test_score_category_bar_and_ratio() {
        let lib = library();
        let c = lib.score_category.candidates("- Structure: ████████░░ 80%").next().unwrap();
        assert_eq!(c.group("label"), Some("Structure"));
        assert_eq!(c.group("bar"), Some("████████░░"));
        assert_eq!(c.group("value"), Some("80"));
        let c = lib.score_category.candidates("Compétences techniques: 8/10").next().unwrap();
        assert_eq!(c.group("max"), Some("10"));
    }

    #[test]
    fn test_checklist_sources() {
        let lib = library();
        assert_eq!(groups(&lib.checklist_bullet, "- [x] Relire le CV", "mark"), vec!["x"]);
        assert_eq!(groups(&lib.checklist_bullet, "**Gras**", "text").len(), 0);
        assert_eq!(groups(&lib.checklist_numbered, "1. Préparer", "text"), vec!["Préparer"]);
        assert_eq!(
            groups(&lib.checklist_step, "Étape 2 : Contacter les recruteurs", "text"),
            vec!["Contacter les recruteurs"]
        );
        assert_eq!(
            groups(&lib.checklist_recommendation, "Conseil: Ajoutez vos résultats", "text"),
            vec!["Ajoutez vos résultats"]
        );
        assert_eq!(groups(&lib.checklist_glyph, "✅ Fait", "glyph"), vec!["✅"]);
    }

    #[test]
    fn test_chart_progression_units() {
        let lib = library();
        let c = lib.chart_progression.candidates("35k€ → 42k€").next().unwrap();
        assert_eq!(c.group("from"), Some("35"));
        assert_eq!(c.group("from_mult"), Some("k"));
        assert_eq!(c.group("to_unit"), Some("€"));
        let c = lib
            .chart_progression
            .candidates("Taux de réponse: 5% -> 12%")
            .next()
            .unwrap();
        assert_eq!(c.group("label"), Some("Taux de réponse"));
        assert_eq!(c.group("to"), Some("12"));
    }

    #[test]
    fn test_roadmap_step_shapes() {
        let lib = library();
        let c = lib
            .roadmap_phase
            .candidates("**Phase 1 (0-3 mois)** : Consolider les bases")
            .next()
            .unwrap();
        assert_eq!(c.group("time"), Some("0-3 mois"));
        assert_eq!(c.group("desc"), Some("Consolider les bases"));
        assert_eq!(
            groups(&lib.roadmap_ordinal, "Première étape : Se former", "desc"),
            vec!["Se former"]
        );
        assert_eq!(
            groups(&lib.roadmap_relative, "Dans 6 mois: Viser un poste senior", "time"),
            vec!["Dans 6 mois"]
        );
        assert_eq!(
            groups(&lib.roadmap_relative, "Mois 1-3: Certification", "time"),
            vec!["Mois 1-3"]
        );
        assert!(lib.roadmap_ordinal.candidates("Premièrement, il faut").next().is_none());
    }
}
