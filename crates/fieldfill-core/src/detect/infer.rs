//! Field-name inference from pattern kind and surrounding text.

use super::patterns::{FieldPattern, PatternKind};
use super::scanner::char_slice;

/// Keyword rules tried against the text preceding a blank slot.
///
/// Order matters: the first rule with a keyword contained in the window wins.
const KEYWORD_RULES: &[(&[&str], &str)] = &[
    (&["фио", "ф.и.о", "имя"], "full_name"),
    (&["дата", "число"], "date"),
    (&["подпись"], "signature"),
    (&["должность"], "position"),
    (&["организация", "компания"], "organization"),
    (&["адрес"], "address"),
    (&["телефон", "тел"], "phone"),
    (&["email", "почта"], "email"),
    (&["инн"], "inn"),
    (&["кпп"], "kpp"),
    (&["огрн"], "ogrn"),
    (&["счет", "р/с", "расчетный"], "account_number"),
    (&["банк", "бик"], "bank"),
    (&["сумма"], "amount"),
    (&["номер", "№"], "number"),
];

/// Assigns semantic names to raw matches.
#[derive(Debug, Clone)]
pub struct FieldNameInferencer {
    /// Characters before a match inspected for keywords.
    window: usize,
}

impl FieldNameInferencer {
    pub fn new() -> Self {
        Self { window: 50 }
    }

    /// Set the width of the keyword window.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Infer a field name for a match starting at character `start`.
    ///
    /// Markers resolve to their fixed name, syntactic patterns to their
    /// captured identifier, and anything else to a keyword found in the
    /// preceding window. A syntactic match with a blank capture stays
    /// unnamed. Returns `None` when nothing applies.
    pub fn infer(
        &self,
        pattern: &FieldPattern,
        matched_text: &str,
        full_text: &str,
        start: usize,
    ) -> Option<String> {
        match pattern.kind() {
            PatternKind::Marker { field_name } => return Some(field_name.clone()),
            PatternKind::Syntactic => return captured_identifier(pattern, matched_text),
            PatternKind::Positional => {}
        }

        let before = char_slice(full_text, start.saturating_sub(self.window), start);
        infer_from_context(before).map(str::to_string)
    }
}

impl Default for FieldNameInferencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Look up the keyword table for a context window.
pub fn infer_from_context(context_before: &str) -> Option<&'static str> {
    let context = context_before.to_lowercase();

    KEYWORD_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| context.contains(k)))
        .map(|(_, name)| *name)
}

fn captured_identifier(pattern: &FieldPattern, matched_text: &str) -> Option<String> {
    let caps = pattern.regex().captures(matched_text)?;
    let name = caps.get(1)?.as_str().trim().to_lowercase();
    if name.is_empty() { None } else { Some(name) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::patterns::PatternCatalog;

    fn infer(pattern: &str, matched: &str, text: &str, start: usize) -> Option<String> {
        let catalog = PatternCatalog::builtin();
        FieldNameInferencer::new().infer(catalog.get(pattern).unwrap(), matched, text, start)
    }

    #[test]
    fn test_marker_ignores_context() {
        assert_eq!(
            infer("signature_marker", "Подпись", "Адрес, ИНН. Подпись: ____", 12),
            Some("signature".to_string())
        );
    }

    #[test]
    fn test_syntactic_lowercased() {
        assert_eq!(
            infer("double_braces", "{{ContractNumber}}", "№ {{ContractNumber}}", 2),
            Some("contractnumber".to_string())
        );
        assert_eq!(
            infer("square_brackets", "[ Full Name ]", "[ Full Name ]", 0),
            Some("full name".to_string())
        );
    }

    #[test]
    fn test_blank_capture_stays_unnamed() {
        assert_eq!(infer("square_brackets", "[   ]", "Телефон: [   ]", 9), None);
        assert_eq!(infer("double_braces", "{{ }}", "ИНН: {{ }}", 5), None);
        assert_eq!(infer("square_brackets", "[   ]", "[   ]", 0), None);
    }

    #[test]
    fn test_context_keywords() {
        assert_eq!(infer("long_underscore", "_____", "ИНН _____", 4), Some("inn".to_string()));
        assert_eq!(
            infer("dots", "...", "Расчетный счет ...", 15),
            Some("account_number".to_string())
        );
        assert_eq!(infer("dashes", "---", "Договор № ---", 10), Some("number".to_string()));
        assert_eq!(infer("long_underscore", "_____", "Примечание _____", 11), None);
    }

    #[test]
    fn test_rule_precedence() {
        // "дата" is tested before "номер"
        assert_eq!(infer_from_context("номер и дата договора"), Some("date"));
        // "тел" hits inside longer words
        assert_eq!(infer_from_context("Контактный тел."), Some("phone"));
    }

    #[test]
    fn test_window_limits_context() {
        let text = format!("ИНН{}_____", " ".repeat(60));
        let start = text.chars().count() - 5;
        assert_eq!(infer("long_underscore", "_____", &text, start), None);

        let wide = FieldNameInferencer::new().with_window(100);
        let catalog = PatternCatalog::builtin();
        assert_eq!(
            wide.infer(catalog.get("long_underscore").unwrap(), "_____", &text, start),
            Some("inn".to_string())
        );
    }
}
