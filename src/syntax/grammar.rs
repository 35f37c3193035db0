//! Grammar loading
//!
//! A grammar is an ordered list of [`Rule`]s for one language, read from a
//! TOML document:
//!
//! ```toml
//! language = "python"
//! extensions = ["py"]
//!
//! [[rules]]
//! name = "keyword"
//! pattern = '\b(def|pass)\b'
//! style = { foreground = "#f92672", weight = "bold" }
//! ```
//!
//! Every pattern is compiled while loading, so a grammar that loads
//! successfully never fails to compile later. Loading is all-or-nothing.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::rules::{Rule, RuleId};
use super::style::StyleSpec;
use crate::error::GrammarLoadError;

/// Grammar document as parsed, before validation
#[derive(Debug, Deserialize)]
struct GrammarDoc {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    extensions: Vec<String>,
    #[serde(default)]
    rules: Vec<RuleDoc>,
}

#[derive(Debug, Deserialize)]
struct RuleDoc {
    name: Option<String>,
    pattern: Option<String>,
    #[serde(default)]
    style: StyleSpec,
    #[serde(default)]
    multiline: bool,
}

/// An ordered rule set for one language
#[derive(Debug, Clone)]
pub struct Grammar {
    /// Language identifier (e.g. "python")
    pub language: String,
    /// File extensions without the dot
    pub extensions: Vec<String>,
    rules: Vec<Rule>,
}

impl Grammar {
    /// Build a grammar from already compiled rules
    pub fn new(language: &str, rules: Vec<Rule>) -> Result<Self, GrammarLoadError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.name.as_str()) {
                return Err(GrammarLoadError::DuplicateRule(rule.name.clone()));
            }
        }
        Ok(Self {
            language: language.to_string(),
            extensions: Vec::new(),
            rules,
        })
    }

    /// Builder: add a file extension
    pub fn with_extension(mut self, ext: &str) -> Self {
        self.extensions.push(ext.trim_start_matches('.').to_string());
        self
    }

    /// Load a grammar document from disk
    ///
    /// The language id defaults to the file stem when the document omits it.
    pub fn load(path: &Path) -> Result<Self, GrammarLoadError> {
        let contents = fs::read_to_string(path).map_err(|source| GrammarLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());
        Self::parse(&contents, &fallback)
    }

    /// Parse a grammar document held in memory
    pub fn from_toml(contents: &str) -> Result<Self, GrammarLoadError> {
        Self::parse(contents, "unknown")
    }

    fn parse(contents: &str, fallback_language: &str) -> Result<Self, GrammarLoadError> {
        let doc: GrammarDoc = toml::from_str(contents)?;

        let mut rules = Vec::with_capacity(doc.rules.len());
        for (index, raw) in doc.rules.into_iter().enumerate() {
            let name = raw
                .name
                .ok_or(GrammarLoadError::MissingField { index, field: "name" })?;
            let pattern = raw
                .pattern
                .ok_or(GrammarLoadError::MissingField { index, field: "pattern" })?;

            let style = raw.style.resolve(&name);
            let mut rule = Rule::new(&name, &pattern, style)?;
            rule.multiline = raw.multiline;
            rules.push(rule);
        }

        let language = doc.language.unwrap_or_else(|| fallback_language.to_string());
        let mut grammar = Self::new(&language, rules)?;
        for ext in &doc.extensions {
            grammar = grammar.with_extension(ext);
        }

        tracing::debug!(
            language = %grammar.language,
            rules = grammar.rules.len(),
            "grammar loaded"
        );
        Ok(grammar)
    }

    /// Rules in declaration (precedence) order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up a rule by id
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.idx()]
    }

    /// Iterate over rules paired with their ids
    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter().enumerate().map(|(i, r)| (RuleId(i), r))
    }

    /// Annotation kinds this grammar paints with
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    /// Whether any rule can match across line breaks
    pub fn has_multiline_rules(&self) -> bool {
        self.rules.iter().any(|r| r.multiline)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::style::Color;

    const SAMPLE: &str = r##"
language = "python"
extensions = ["py", ".pyw"]

[[rules]]
name = "keyword"
pattern = '\b(def|pass)\b'
style = { foreground = "#f92672", weight = "bold" }

[[rules]]
name = "number"
pattern = '\d+'

[[rules]]
name = "docstring"
pattern = '(?s)""".*?"""'
multiline = true
style = { foreground = "yellow", slant = "italic" }
"##;

    #[test]
    fn test_parse_sample() {
        let grammar = Grammar::from_toml(SAMPLE).unwrap();
        assert_eq!(grammar.language, "python");
        assert_eq!(grammar.extensions, vec!["py", "pyw"]);
        let names: Vec<_> = grammar.kinds().collect();
        assert_eq!(names, vec!["keyword", "number", "docstring"]);

        let keyword = grammar.rule(RuleId(0));
        assert_eq!(keyword.style.fg, Color::Rgb(0xf9, 0x26, 0x72));
        assert!(keyword.style.bold);
        assert!(!keyword.multiline);

        // Missing style falls back to the default
        assert!(grammar.rule(RuleId(1)).style.is_default());
        assert!(grammar.rule(RuleId(2)).style.italic);
        assert!(grammar.has_multiline_rules());
    }

    #[test]
    fn test_missing_pattern_is_an_error() {
        let doc = r#"
[[rules]]
name = "ok"
pattern = 'a'

[[rules]]
name = "broken"
"#;
        match Grammar::from_toml(doc) {
            Err(GrammarLoadError::MissingField { index, field }) => {
                assert_eq!(index, 1);
                assert_eq!(field, "pattern");
            }
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let doc = "[[rules]]\npattern = 'a'\n";
        assert!(matches!(
            Grammar::from_toml(doc),
            Err(GrammarLoadError::MissingField { index: 0, field: "name" })
        ));
    }

    #[test]
    fn test_invalid_pattern_fails_at_load() {
        let doc = "[[rules]]\nname = 'bad'\npattern = '[a-'\n";
        assert!(matches!(
            Grammar::from_toml(doc),
            Err(GrammarLoadError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            Grammar::from_toml("rules = 42"),
            Err(GrammarLoadError::Parse(_))
        ));
        assert!(matches!(
            Grammar::from_toml("[[rules]\nname="),
            Err(GrammarLoadError::Parse(_))
        ));
    }

    #[test]
    fn test_duplicate_rule_names() {
        let doc = "[[rules]]\nname = 'a'\npattern = 'x'\n[[rules]]\nname = 'a'\npattern = 'y'\n";
        assert!(matches!(
            Grammar::from_toml(doc),
            Err(GrammarLoadError::DuplicateRule(name)) if name == "a"
        ));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("python.toml");
        fs::write(&path, "[[rules]]\nname = 'n'\npattern = '\\d'\n").unwrap();

        let grammar = Grammar::load(&path).unwrap();
        assert_eq!(grammar.language, "python");
        assert_eq!(grammar.rules().len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let err = Grammar::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, GrammarLoadError::Io { .. }));
    }
}
