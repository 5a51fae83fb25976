//! Applies the pattern catalog to a unit of text.

use tracing::trace;

use super::patterns::{FieldPattern, PatternCatalog};
use crate::models::field::FieldContext;

/// A single pattern occurrence inside a unit of text.
#[derive(Debug, Clone)]
pub struct RawMatch<'p> {
    /// Pattern that produced the match.
    pub pattern: &'p FieldPattern,
    /// Character offset of the first matched character.
    pub start: usize,
    /// Character offset one past the last matched character.
    pub end: usize,
    /// Matched text.
    pub text: String,
    /// First capture group, for patterns that have one.
    pub captured: Option<String>,
}

/// Scan `text` with every catalog pattern.
///
/// Matches come out grouped by pattern, in catalog order, and within a
/// pattern in text order. Overlapping matches of different patterns are all
/// kept. Empty matches are dropped.
pub fn scan<'p>(catalog: &'p PatternCatalog, text: &str) -> Vec<RawMatch<'p>> {
    let mut results = Vec::new();
    let offsets = CharOffsets::new(text);

    for pattern in catalog {
        for caps in pattern.regex().captures_iter(text) {
            let Some(full_match) = caps.get(0) else {
                continue;
            };

            if full_match.is_empty() {
                trace!("Skipping empty match of {}", pattern.name());
                continue;
            }

            let captured = if pattern.has_capture() {
                caps.get(1).map(|m| m.as_str().to_string())
            } else {
                None
            };

            results.push(RawMatch {
                pattern,
                start: offsets.char_index(full_match.start()),
                end: offsets.char_index(full_match.end()),
                text: full_match.as_str().to_string(),
                captured,
            });
        }
    }

    results
}

/// Trimmed text within `length` characters on each side of a match.
pub fn context_around(text: &str, start: usize, end: usize, length: usize) -> FieldContext {
    FieldContext {
        before: char_slice(text, start.saturating_sub(length), start).trim().to_string(),
        after: char_slice(text, end, end.saturating_add(length)).trim().to_string(),
    }
}

/// Characters `from..to` of `text`, clamped to the text length.
pub fn char_slice(text: &str, from: usize, to: usize) -> &str {
    if from >= to {
        return "";
    }
    let start = byte_offset(text, from);
    let end = byte_offset(text, to);
    &text[start..end]
}

/// Byte offset of the given character index, or the text length past the end.
fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Byte-to-character offset lookup for one text.
struct CharOffsets {
    boundaries: Vec<usize>,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        Self {
            boundaries: text.char_indices().map(|(i, _)| i).collect(),
        }
    }

    /// Character index of a byte offset that lies on a char boundary.
    fn char_index(&self, byte: usize) -> usize {
        match self.boundaries.binary_search(&byte) {
            Ok(i) | Err(i) => i,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<'a>(matches: &'a [RawMatch<'_>]) -> Vec<&'a str> {
        matches.iter().map(|m| m.pattern.name()).collect()
    }

    #[test]
    fn test_character_offsets() {
        let catalog = PatternCatalog::builtin();
        let matches = scan(&catalog, "ФИО: _____");

        let underscore = matches
            .iter()
            .find(|m| m.pattern.name() == "long_underscore")
            .unwrap();
        assert_eq!((underscore.start, underscore.end), (5, 10));

        let marker = matches
            .iter()
            .find(|m| m.pattern.name() == "fio_marker")
            .unwrap();
        assert_eq!((marker.start, marker.end), (0, 3));
        assert_eq!(marker.captured.as_deref(), Some("ФИО"));
    }

    #[test]
    fn test_overlapping_matches_kept() {
        let catalog = PatternCatalog::builtin();
        let matches = scan(&catalog, "{{date}}");

        assert_eq!(names(&matches), vec!["double_braces", "single_braces"]);
        assert_eq!(matches[0].captured.as_deref(), Some("date"));
        assert_eq!((matches[1].start, matches[1].end), (1, 7));
    }

    #[test]
    fn test_registration_order_not_offset_order() {
        let catalog = PatternCatalog::builtin();
        let matches = scan(&catalog, "Дата ... ______");

        assert_eq!(
            names(&matches),
            vec![
                "long_underscore",
                "medium_underscore",
                "short_underscore",
                "short_underscore",
                "short_underscore",
                "dots",
                "date_marker",
            ]
        );
        assert!(matches[0].start > matches.last().unwrap().start);
    }

    #[test]
    fn test_positional_has_no_capture() {
        let catalog = PatternCatalog::builtin();
        let matches = scan(&catalog, "------");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].captured, None);
    }

    #[test]
    fn test_context_around() {
        let text = "Организация:   ________   (полное наименование)";
        let context = context_around(text, 15, 23, 30);
        assert_eq!(context.before, "Организация:");
        assert_eq!(context.after, "(полное наименование)");
    }

    #[test]
    fn test_char_slice_clamps() {
        assert_eq!(char_slice("абв", 1, 10), "бв");
        assert_eq!(char_slice("абв", 3, 5), "");
        assert_eq!(char_slice("абв", 2, 1), "");
    }
}
