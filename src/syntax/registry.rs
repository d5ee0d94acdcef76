//! Grammar registry
//!
//! This module provides the GrammarRegistry that owns grammars by
//! identifier, resolves embedded grammars, and maps file extensions to
//! grammar identifiers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::grammar::Grammar;
use super::rules::{LineState, LineTokens};
use crate::error::{HighlightError, Result};

/// Grammars keyed by identifier
#[derive(Debug, Clone, Default)]
pub struct GrammarRegistry {
    /// Loaded grammars
    grammars: HashMap<String, Grammar>,
    /// Extension to grammar id mapping
    extension_map: HashMap<String, String>,
}

impl GrammarRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grammar, replacing any grammar with the same identifier
    pub fn register(&mut self, grammar: Grammar) -> Result<()> {
        grammar.validate()?;
        self.grammars.insert(grammar.id.clone(), grammar);
        Ok(())
    }

    /// Map a file extension to a grammar identifier
    pub fn add_extension(&mut self, ext: &str, grammar_id: &str) {
        self.extension_map.insert(ext.to_lowercase(), grammar_id.to_string());
    }

    /// Detect grammar from filename
    pub fn detect_grammar(&self, filename: &Path) -> Option<&str> {
        let ext = filename.extension()?.to_str()?.to_lowercase();
        self.extension_map.get(&ext).map(|s| s.as_str())
    }

    /// Get a grammar by identifier
    pub fn get(&self, id: &str) -> Option<&Grammar> {
        self.grammars.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.grammars.contains_key(id)
    }

    /// List registered grammar identifiers
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.grammars.keys().map(|s| s.as_str()).collect();
        ids.sort();
        ids
    }

    /// Classify one line with the given grammar
    pub fn tokenize_line(&self, grammar_id: &str, text: &str, state: &LineState) -> Result<LineTokens> {
        let grammar = self
            .get(grammar_id)
            .ok_or_else(|| HighlightError::UnknownGrammar(grammar_id.to_string()))?;
        Ok(grammar.tokenize_line(text, state, self))
    }

    /// Classify every line of a text, threading state from line to line
    pub fn tokenize_document(&self, grammar_id: &str, text: &str) -> Result<Vec<LineTokens>> {
        let grammar = self
            .get(grammar_id)
            .ok_or_else(|| HighlightError::UnknownGrammar(grammar_id.to_string()))?;

        let mut state = LineState::root();
        let mut lines = Vec::new();
        for line in text.lines() {
            let result = grammar.tokenize_line(line, &state, self);
            state = result.end_state.clone();
            lines.push(result);
        }
        Ok(lines)
    }
}

/// Tokenizer handed to a host editor for one grammar identifier
///
/// The host keeps the line state between calls, one state per line.
#[derive(Debug, Clone)]
pub struct TokensProvider {
    registry: Arc<GrammarRegistry>,
    grammar_id: String,
}

impl TokensProvider {
    pub fn new(registry: Arc<GrammarRegistry>, grammar_id: &str) -> Self {
        Self {
            registry,
            grammar_id: grammar_id.to_string(),
        }
    }

    pub fn grammar_id(&self) -> &str {
        &self.grammar_id
    }

    /// State of the first line of a document
    pub fn initial_state(&self) -> LineState {
        LineState::root()
    }

    /// Tokenize one line given the state the previous line ended in
    pub fn tokenize(&self, line: &str, state: &LineState) -> Result<LineTokens> {
        self.registry.tokenize_line(&self.grammar_id, line, state)
    }
}
