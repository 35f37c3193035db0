//! Grammar registry
//!
//! Maps language ids and file extensions to shared grammars. Built-in
//! grammars are embedded in the binary; more can be loaded from a directory
//! of grammar documents at startup.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::grammar::Grammar;
use crate::error::GrammarLoadError;

const BUILTIN_PYTHON: &str = include_str!("../../languages/python.toml");

/// Known grammars, keyed by language id
#[derive(Debug, Default)]
pub struct GrammarRegistry {
    grammars: HashMap<String, Arc<Grammar>>,
    /// Lower-cased extension -> language id
    extension_map: HashMap<String, String>,
}

impl GrammarRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in grammars
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        match Grammar::from_toml(BUILTIN_PYTHON) {
            Ok(grammar) => {
                registry.register(grammar);
            }
            Err(e) => tracing::warn!(error = %e, "built-in python grammar failed to load"),
        }
        registry
    }

    /// Add a grammar, replacing any grammar with the same language id
    pub fn register(&mut self, grammar: Grammar) -> Arc<Grammar> {
        let grammar = Arc::new(grammar);
        let language = grammar.language.clone();

        self.extension_map.retain(|_, lang| *lang != language);
        for ext in &grammar.extensions {
            self.extension_map.insert(ext.to_lowercase(), language.clone());
        }
        self.grammars.insert(language, Arc::clone(&grammar));
        grammar
    }

    /// Load and register a single grammar document
    pub fn load_file(&mut self, path: &Path) -> Result<Arc<Grammar>, GrammarLoadError> {
        let grammar = Grammar::load(path)?;
        Ok(self.register(grammar))
    }

    /// Load every `*.toml` grammar in `dir`
    ///
    /// A document that fails to load is logged and skipped; that language
    /// simply stays unhighlighted. Returns how many grammars were loaded.
    pub fn load_dir(&mut self, dir: &Path) -> std::io::Result<usize> {
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match self.load_file(&path) {
                Ok(_) => loaded += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping grammar"),
            }
        }
        Ok(loaded)
    }

    /// Look up a grammar by language id
    pub fn get(&self, language: &str) -> Option<Arc<Grammar>> {
        self.grammars.get(language).cloned()
    }

    /// Detect the grammar for a file from its extension
    pub fn detect(&self, filename: &Path) -> Option<Arc<Grammar>> {
        let ext = filename.extension()?.to_str()?.to_lowercase();
        let language = self.extension_map.get(&ext)?;
        self.get(language)
    }

    /// List registered language ids
    pub fn languages(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.grammars.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}
