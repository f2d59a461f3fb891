//! Small text utilities shared by detectors and generators.

use regex::Regex;

/// Lines scanned above a match when resolving its title.
const TITLE_LOOKBACK_LINES: usize = 3;
const MAX_TITLE_CHARS: usize = 100;

/// Truncates to at most `max` chars, ending with an ellipsis when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Removes emphasis/heading marks and a trailing colon: `"**Résultats :**"` → `"Résultats"`.
pub fn strip_markdown(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`'))
        .collect();
    cleaned
        .trim()
        .trim_start_matches('#')
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_string()
}

/// Strips bold/code markers from an inline value without touching underscores
/// inside words.
pub fn clean_inline(text: &str) -> String {
    text.replace("**", "")
        .replace("__", "")
        .replace('`', "")
        .trim()
        .trim_matches('"')
        .trim()
        .to_string()
}

/// Lowercased, whitespace-collapsed form used for de-duplication.
pub fn normalize_key(text: &str) -> String {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title for a match starting at byte `offset`: the nearest of the previous
/// three lines that is non-empty, not a table row, and short enough.
pub fn title_above(content: &str, offset: usize, fallback: &str) -> String {
    title_above_where(content, offset, fallback, |_| true)
}

/// Like `title_above`, but only accepts heading-looking lines (markdown heading,
/// bold line, or trailing colon). Used for list-shaped artifacts where the
/// previous line is usually just more prose.
pub fn heading_above(content: &str, offset: usize, fallback: &str) -> String {
    title_above_where(content, offset, fallback, |line| {
        bullet_text(line).is_none()
            && (line.starts_with('#') || line.starts_with("**") || line.ends_with(':'))
    })
}

fn title_above_where(
    content: &str,
    offset: usize,
    fallback: &str,
    accept: impl Fn(&str) -> bool,
) -> String {
    let before = content.get(..offset.min(content.len())).unwrap_or_default();
    before
        .lines()
        .rev()
        .take(TITLE_LOOKBACK_LINES)
        .map(str::trim)
        .find(|line| {
            !line.is_empty()
                && !line.starts_with('|')
                && line.chars().count() < MAX_TITLE_CHARS
                && accept(line)
        })
        .map(strip_markdown)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Text of a bullet (`-`, `*`, `•`, `+`) or numbered (`1.`, `2)`) line, without
/// the marker. `None` for any other line.
pub fn bullet_text(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let rest = if let Some(rest) = trimmed.strip_prefix(|c: char| matches!(c, '-' | '*' | '•' | '+')) {
        rest
    } else {
        let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 || digits > 2 {
            return None;
        }
        trimmed[digits..].strip_prefix(|c: char| c == '.' || c == ')')?
    };
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = clean_inline(rest);
    (!text.is_empty()).then_some(text)
}

/// Bullet items listed under the first heading line matching `heading`.
/// A blank line after the first item, or any non-bullet line, ends the section;
/// a later matching heading starts a new one.
pub fn headed_bullets(content: &str, heading: &Regex, limit: usize) -> Vec<String> {
    let mut items = Vec::new();
    let mut in_section = false;
    let mut section_has_items = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if heading.is_match(trimmed) && bullet_text(trimmed).is_none() {
            in_section = true;
            section_has_items = false;
            continue;
        }
        if !in_section {
            continue;
        }
        if trimmed.is_empty() {
            if section_has_items {
                in_section = false;
            }
            continue;
        }
        match bullet_text(trimmed) {
            Some(text) => {
                items.push(text);
                section_has_items = true;
                if items.len() >= limit {
                    break;
                }
            }
            None => in_section = false,
        }
    }
    items
}

/// Parses `72`, `72.5`, or `72,5`.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse::<f64>().ok()
}

/// Parses an amount with optional thousands grouping (`45 000`, `45.000`) and
/// a `k`/`M` multiplier: `("35", Some("k"))` → `35000`.
pub fn parse_amount(raw: &str, multiplier: Option<&str>) -> Option<f64> {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    let value = if is_thousands_grouped(&compact) {
        compact.replace('.', "").parse::<f64>().ok()?
    } else {
        parse_decimal(&compact)?
    };
    let factor = match multiplier.map(str::trim) {
        Some("k") | Some("K") => 1_000.0,
        Some("M") => 1_000_000.0,
        _ => 1.0,
    };
    Some(value * factor)
}

fn is_thousands_grouped(compact: &str) -> bool {
    let mut groups = compact.split('.');
    let Some(head) = groups.next() else {
        return false;
    };
    let tail: Vec<&str> = groups.collect();
    !tail.is_empty()
        && !head.is_empty()
        && head.len() <= 3
        && tail.iter().all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

/// Canonical currency/percent symbol for a captured unit token.
pub fn normalize_unit(raw: &str) -> Option<String> {
    let unit = raw.trim();
    let lowered = unit.to_lowercase();
    let symbol = match lowered.as_str() {
        "" => return None,
        "euro" | "euros" | "eur" | "€" => "€",
        "usd" | "$" => "$",
        "gbp" | "£" => "£",
        "%" => "%",
        _ => unit,
    };
    Some(symbol.to_string())
}

/// Case-insensitive whole-word occurrence count.
pub fn count_occurrences(haystack: &str, needle: &str) -> u32 {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return 0;
    }
    let hay = haystack.to_lowercase();
    hay.match_indices(&needle)
        .filter(|(start, _)| {
            let before = hay[..*start].chars().next_back();
            let after = hay[*start + needle.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
        .count() as u32
}

/// `content[start..end]` with both bounds clamped; empty on a non-char boundary.
pub fn excerpt(content: &str, start: usize, end: usize) -> &str {
    let end = end.min(content.len());
    content.get(start.min(end)..end).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_is_char_safe() {
        let text = "é".repeat(10);
        let cut = truncate_chars(&text, 5);
        assert_eq!(cut.chars().count(), 5);
        assert!(cut.ends_with('…'));
        assert_eq!(truncate_chars("court", 10), "court");
    }

    #[test]
    fn test_strip_markdown() {
        assert_eq!(strip_markdown("**Résultats :**"), "Résultats");
        assert_eq!(strip_markdown("## Comparatif"), "Comparatif");
        assert_eq!(strip_markdown("`code`"), "code");
    }

    #[test]
    fn test_title_above_skips_blank_and_table_rows() {
        let content = "## Comparatif des offres\n\n| A | B |";
        let offset = content.find('|').unwrap();
        assert_eq!(title_above(content, offset, "Data Table"), "Comparatif des offres");
    }

    #[test]
    fn test_title_above_falls_back() {
        assert_eq!(title_above("| A | B |", 0, "Data Table"), "Data Table");
        let long = format!("{}\n| A |", "x".repeat(150));
        let offset = long.find('|').unwrap();
        assert_eq!(title_above(&long, offset, "Data Table"), "Data Table");
    }

    #[test]
    fn test_title_above_only_looks_three_lines_back() {
        let content = "Titre lointain\n\n\n\n| A | B |";
        let offset = content.find('|').unwrap();
        assert_eq!(title_above(content, offset, "Data Table"), "Data Table");
    }

    #[test]
    fn test_heading_above_ignores_prose_and_bullets() {
        let content = "**Plan d'action :**\n- premier point\nSuite";
        let offset = content.find("Suite").unwrap();
        assert_eq!(heading_above(content, offset, "Fallback"), "Plan d'action");
        let prose = "Une phrase ordinaire.\nSuite";
        let offset = prose.find("Suite").unwrap();
        assert_eq!(heading_above(prose, offset, "Fallback"), "Fallback");
    }

    #[test]
    fn test_bullet_text() {
        assert_eq!(bullet_text("- Ajouter des chiffres"), Some("Ajouter des chiffres".to_string()));
        assert_eq!(bullet_text("2) **Relire** le CV"), Some("Relire le CV".to_string()));
        assert_eq!(bullet_text("**Gras**"), None);
        assert_eq!(bullet_text("2023. Une année"), None);
        assert_eq!(bullet_text("Texte"), None);
    }

    #[test]
    fn test_headed_bullets_collects_until_section_ends() {
        let heading = Regex::new(r"(?i)^points forts").unwrap();
        let content = "Points forts :\n\n- Clarté\n- Concision\n\nAutre paragraphe\n- Hors section";
        assert_eq!(headed_bullets(content, &heading, 10), vec!["Clarté", "Concision"]);
        assert_eq!(headed_bullets(content, &heading, 1), vec!["Clarté"]);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("35", Some("k")), Some(35_000.0));
        assert_eq!(parse_amount("1,5", Some("M")), Some(1_500_000.0));
        assert_eq!(parse_amount("45 000", None), Some(45_000.0));
        assert_eq!(parse_amount("45.000", None), Some(45_000.0));
        assert_eq!(parse_amount("45.5", None), Some(45.5));
        assert_eq!(parse_amount("abc", None), None);
    }

    #[test]
    fn test_normalize_unit() {
        assert_eq!(normalize_unit("euros").as_deref(), Some("€"));
        assert_eq!(normalize_unit("%").as_deref(), Some("%"));
        assert_eq!(normalize_unit(" "), None);
    }

    #[test]
    fn test_count_occurrences_whole_words() {
        assert_eq!(count_occurrences("Rust, rust et Rustacean", "rust"), 2);
        assert_eq!(count_occurrences("SQL sql", "SQL"), 2);
        assert_eq!(count_occurrences("anything", " "), 0);
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Mettre à jour   LinkedIn! "), "mettre à jour linkedin");
    }
}
