//! Field pattern catalog.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FillError;
use crate::models::config::{PatternKindSpec, PatternSpec};

lazy_static! {
    // Blank runs
    pub static ref LONG_UNDERSCORE: Regex = Regex::new(r"_{5,}").unwrap();
    pub static ref MEDIUM_UNDERSCORE: Regex = Regex::new(r"_{3,4}").unwrap();
    pub static ref SHORT_UNDERSCORE: Regex = Regex::new(r"_{2}").unwrap();

    // Placeholder syntaxes
    pub static ref DOUBLE_BRACES: Regex = Regex::new(
        r"\{\{([a-zA-Zа-яА-Я0-9_]+)\}\}"
    ).unwrap();

    pub static ref SINGLE_BRACES: Regex = Regex::new(
        r"\{([a-zA-Zа-яА-Я0-9_]+)\}"
    ).unwrap();

    pub static ref SQUARE_BRACKETS: Regex = Regex::new(r"\[([^\]]+)\]").unwrap();
    pub static ref ANGLE_BRACKETS: Regex = Regex::new(r"<([^>]+)>").unwrap();

    pub static ref DOTS: Regex = Regex::new(r"\.{3,}").unwrap();
    pub static ref DASHES: Regex = Regex::new(r"-{3,}").unwrap();

    // Label markers
    pub static ref FIO_MARKER: Regex = Regex::new(r"(ФИО|Ф\.И\.О\.|фио)").unwrap();
    pub static ref DATE_MARKER: Regex = Regex::new(r"(Дата|дата|ДАТА)").unwrap();
    pub static ref SIGNATURE_MARKER: Regex = Regex::new(r"(Подпись|подпись|ПОДПИСЬ)").unwrap();
    pub static ref POSITION_MARKER: Regex = Regex::new(
        r"(Должность|должность|ДОЛЖНОСТЬ)"
    ).unwrap();

    pub static ref ORGANIZATION_MARKER: Regex = Regex::new(
        r"(Организация|организация|ОРГАНИЗАЦИЯ)"
    ).unwrap();

    static ref BUILTIN: PatternCatalog = PatternCatalog::from_patterns(vec![
        FieldPattern::positional("long_underscore", LONG_UNDERSCORE.clone()),
        FieldPattern::positional("medium_underscore", MEDIUM_UNDERSCORE.clone()),
        FieldPattern::positional("short_underscore", SHORT_UNDERSCORE.clone()),
        FieldPattern::syntactic("double_braces", DOUBLE_BRACES.clone()),
        FieldPattern::syntactic("single_braces", SINGLE_BRACES.clone()),
        FieldPattern::syntactic("square_brackets", SQUARE_BRACKETS.clone()),
        FieldPattern::syntactic("angle_brackets", ANGLE_BRACKETS.clone()),
        FieldPattern::positional("dots", DOTS.clone()),
        FieldPattern::positional("dashes", DASHES.clone()),
        FieldPattern::marker("fio_marker", FIO_MARKER.clone(), "full_name"),
        FieldPattern::marker("date_marker", DATE_MARKER.clone(), "date"),
        FieldPattern::marker("signature_marker", SIGNATURE_MARKER.clone(), "signature"),
        FieldPattern::marker("position_marker", POSITION_MARKER.clone(), "position"),
        FieldPattern::marker("organization_marker", ORGANIZATION_MARKER.clone(), "organization"),
    ]);
}

/// How a pattern's matches get their field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternKind {
    /// Blank slot with no embedded name; named from the preceding context.
    Positional,
    /// Delimited identifier; the first capture group is the name.
    Syntactic,
    /// Label word signalling an adjacent slot; always the given name.
    Marker { field_name: String },
}

/// A named regular expression in the catalog.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    name: String,
    regex: Regex,
    kind: PatternKind,
}

impl FieldPattern {
    pub fn new(name: impl Into<String>, regex: Regex, kind: PatternKind) -> Self {
        Self {
            name: name.into(),
            regex,
            kind,
        }
    }

    pub fn positional(name: impl Into<String>, regex: Regex) -> Self {
        Self::new(name, regex, PatternKind::Positional)
    }

    pub fn syntactic(name: impl Into<String>, regex: Regex) -> Self {
        Self::new(name, regex, PatternKind::Syntactic)
    }

    pub fn marker(name: impl Into<String>, regex: Regex, field_name: impl Into<String>) -> Self {
        Self::new(
            name,
            regex,
            PatternKind::Marker {
                field_name: field_name.into(),
            },
        )
    }

    /// Compile a pattern declared in configuration.
    pub fn from_spec(spec: &PatternSpec) -> Result<Self, FillError> {
        if spec.name.trim().is_empty() {
            return Err(FillError::Config("pattern name must not be empty".to_string()));
        }

        let regex = Regex::new(&spec.regex).map_err(|e| {
            FillError::Config(format!("invalid regex for pattern {}: {}", spec.name, e))
        })?;

        let kind = match spec.kind {
            PatternKindSpec::Positional => PatternKind::Positional,
            PatternKindSpec::Syntactic => {
                if regex.captures_len() < 2 {
                    return Err(FillError::Config(format!(
                        "syntactic pattern {} needs a capture group",
                        spec.name
                    )));
                }
                PatternKind::Syntactic
            }
            PatternKindSpec::Marker => {
                let field_name = spec
                    .field_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| {
                        FillError::Config(format!(
                            "marker pattern {} needs a field_name",
                            spec.name
                        ))
                    })?;
                PatternKind::Marker {
                    field_name: field_name.to_string(),
                }
            }
        };

        Ok(Self::new(spec.name.clone(), regex, kind))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    /// Whether matches carry a captured value.
    pub fn has_capture(&self) -> bool {
        self.regex.captures_len() > 1
    }
}

/// Ordered list of field patterns.
///
/// Registration order is the order in which matches are reported.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    patterns: Vec<FieldPattern>,
}

impl PatternCatalog {
    /// Catalog without any patterns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in catalog.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    fn from_patterns(patterns: Vec<FieldPattern>) -> Self {
        Self { patterns }
    }

    /// Append a pattern, rejecting duplicate names.
    pub fn push(&mut self, pattern: FieldPattern) -> Result<(), FillError> {
        if self.get(pattern.name()).is_some() {
            return Err(FillError::Config(format!(
                "duplicate pattern name: {}",
                pattern.name()
            )));
        }
        self.patterns.push(pattern);
        Ok(())
    }

    pub fn with_pattern(mut self, pattern: FieldPattern) -> Result<Self, FillError> {
        self.push(pattern)?;
        Ok(self)
    }

    /// Append patterns declared in configuration.
    pub fn with_specs(mut self, specs: &[PatternSpec]) -> Result<Self, FillError> {
        for spec in specs {
            self.push(FieldPattern::from_spec(spec)?)?;
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&FieldPattern> {
        self.patterns.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldPattern> {
        self.patterns.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl<'a> IntoIterator for &'a PatternCatalog {
    type Item = &'a FieldPattern;
    type IntoIter = std::slice::Iter<'a, FieldPattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.patterns.iter()
    }
}
