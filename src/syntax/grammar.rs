//! Grammar definitions
//!
//! A grammar is an identifier plus an ordered list of modes. Mode 0 is
//! the root mode. A mode either holds rules or hands whole lines over
//! to another grammar while they match a continuation pattern.

use regex::Regex;

use super::registry::GrammarRegistry;
use super::rules::{Action, LineState, LineTokens, Rule};
use super::tokens::{Token, TokenType};
use crate::error::{HighlightError, Result};

/// Name of the mode every grammar starts in
pub const ROOT_MODE: &str = "root";

/// Body of a tokenizer mode
#[derive(Debug, Clone)]
pub enum ModeBody {
    /// Ordered rules, first match wins
    Rules(Vec<Rule>),
    /// Lines matching `continue_while` are tokenized by `grammar`;
    /// the first other line leaves the mode and is tokenized again
    /// by the enclosing mode
    Embedded { grammar: String, continue_while: Regex },
}

/// A named tokenizer state
#[derive(Debug, Clone)]
pub struct Mode {
    pub name: String,
    pub body: ModeBody,
}

/// A complete grammar for one syntax
#[derive(Debug, Clone)]
pub struct Grammar {
    /// Identifier the host knows this grammar by
    pub id: String,
    modes: Vec<Mode>,
}

impl Grammar {
    /// Create a grammar with an empty root mode
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            modes: vec![Mode {
                name: ROOT_MODE.to_string(),
                body: ModeBody::Rules(Vec::new()),
            }],
        }
    }

    /// Append a rule to the root mode
    pub fn add_rule(&mut self, rule: Rule) {
        // Root is always a rule mode
        if let ModeBody::Rules(rules) = &mut self.modes[0].body {
            rules.push(rule);
        }
    }

    /// Append a rule to a named rule mode, creating the mode if needed
    pub fn add_rule_to(&mut self, mode: &str, rule: Rule) -> Result<()> {
        let idx = match self.mode_index(mode) {
            Some(idx) => idx,
            None => {
                self.modes.push(Mode {
                    name: mode.to_string(),
                    body: ModeBody::Rules(Vec::new()),
                });
                self.modes.len() - 1
            }
        };
        match &mut self.modes[idx].body {
            ModeBody::Rules(rules) => {
                rules.push(rule);
                Ok(())
            }
            ModeBody::Embedded { .. } => Err(HighlightError::Message(format!(
                "mode `{}` of grammar `{}` embeds another grammar and takes no rules",
                mode, self.id
            ))),
        }
    }

    /// Add a mode that embeds `grammar` while lines match `continue_while`
    pub fn add_embedded_mode(&mut self, name: &str, grammar: &str, continue_while: &str) -> Result<()> {
        if self.mode_index(name).is_some() {
            return Err(HighlightError::Message(format!(
                "grammar `{}` already has a mode named `{}`",
                self.id, name
            )));
        }
        let continue_while = Regex::new(continue_while).map_err(|source| HighlightError::InvalidPattern {
            rule: format!("{}.{}", self.id, name),
            source,
        })?;
        self.modes.push(Mode {
            name: name.to_string(),
            body: ModeBody::Embedded {
                grammar: grammar.to_string(),
                continue_while,
            },
        });
        Ok(())
    }

    /// Index of a mode by name
    pub fn mode_index(&self, name: &str) -> Option<usize> {
        self.modes.iter().position(|m| m.name == name)
    }

    /// Mode by index
    pub fn mode(&self, idx: usize) -> Option<&Mode> {
        self.modes.get(idx)
    }

    /// Name of the mode a line state is in
    pub fn mode_name(&self, state: &LineState) -> &str {
        self.modes
            .get(state.mode())
            .map(|m| m.name.as_str())
            .unwrap_or(ROOT_MODE)
    }

    /// Check that every push target names a mode of this grammar
    pub fn validate(&self) -> Result<()> {
        for mode in &self.modes {
            if let ModeBody::Rules(rules) = &mode.body {
                for rule in rules {
                    if let Action::Push(target) = &rule.action {
                        if self.mode_index(target).is_none() {
                            return Err(HighlightError::UnknownMode {
                                grammar: self.id.clone(),
                                mode: target.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Tokenize a single line
    ///
    /// Takes the line text and the state from the previous line.
    /// Returns tokens and the state for the next line. Embedded
    /// grammars are looked up in `registry`; a missing one leaves its
    /// lines unstyled.
    pub fn tokenize_line(&self, text: &str, prev_state: &LineState, registry: &GrammarRegistry) -> LineTokens {
        let mut state = prev_state.clone();

        // Embedded modes decide on the whole line before any rule runs
        while let Some(ModeBody::Embedded { grammar, continue_while }) =
            self.modes.get(state.mode()).map(|m| &m.body)
        {
            if !continue_while.is_match(text) {
                state.pop();
                continue;
            }

            let inner_prev = state.embedded().cloned().unwrap_or_default();
            let inner = match registry.get(grammar) {
                Some(embedded) => embedded.tokenize_line(text, &inner_prev, registry),
                None => LineTokens {
                    tokens: default_tokens(text),
                    end_state: inner_prev,
                    grammar: grammar.clone(),
                },
            };
            state.set_embedded(inner.end_state);
            return LineTokens {
                tokens: inner.tokens,
                end_state: state,
                grammar: inner.grammar,
            };
        }

        let mut tokens: Vec<Token> = Vec::new();
        let mut pos = 0;
        // Set after a zero-width transition so two in a row cannot loop
        let mut stalled = false;
        let mut cache = MatchCache::new(state.mode(), 0);

        while pos < text.len() {
            let mode = state.mode();
            let rules = match self.modes.get(mode).map(|m| &m.body) {
                Some(ModeBody::Rules(rules)) => rules.as_slice(),
                // An embedded mode entered mid-line takes effect on the next line
                _ => {
                    push_token(&mut tokens, Token::new(pos, text.len(), TokenType::Default));
                    break;
                }
            };
            if cache.mode != mode || cache.slots.len() != rules.len() {
                cache = MatchCache::new(mode, rules.len());
            }

            // First rule matching at `pos`, else the earliest place any rule could
            let mut found = None;
            let mut next_start = text.len();
            for (idx, rule) in rules.iter().enumerate() {
                match cache.next_start(idx, rule, text, pos) {
                    Some(start) if start == pos => {
                        if let Some(m) = rule.match_at(text, pos) {
                            if !(stalled && m.token_end == pos) {
                                found = Some((rule, m));
                                break;
                            }
                        }
                        // Rejected here; it may still match further on
                        let from = next_char_boundary(text, pos);
                        if let Some(later) = cache.search(idx, rule, text, from) {
                            next_start = next_start.min(later);
                        }
                    }
                    Some(start) => next_start = next_start.min(start),
                    None => {}
                }
            }

            match found {
                Some((rule, m)) => {
                    if m.token_start > m.start {
                        push_token(&mut tokens, Token::new(m.start, m.token_start, TokenType::Default));
                    }
                    if m.token_end > m.token_start {
                        push_token(&mut tokens, Token::new(m.token_start, m.token_end, rule.token_type));
                    }
                    stalled = m.token_end == pos;
                    pos = m.token_end;
                    self.apply(&rule.action, &mut state);
                }
                None => {
                    // Nothing can match before `next_start`
                    push_token(&mut tokens, Token::new(pos, next_start, TokenType::Default));
                    pos = next_start;
                    stalled = false;
                }
            }
        }

        // Transitions anchored on an empty line
        if text.is_empty() {
            if let Some(ModeBody::Rules(rules)) = self.modes.get(state.mode()).map(|m| &m.body) {
                if let Some(rule) = rules.iter().find(|r| r.match_at(text, 0).is_some()) {
                    self.apply(&rule.action, &mut state);
                }
            }
        }

        LineTokens {
            tokens,
            end_state: state,
            grammar: self.id.clone(),
        }
    }

    fn apply(&self, action: &Action, state: &mut LineState) {
        match action {
            Action::Stay => {}
            Action::Push(target) => {
                if let Some(idx) = self.mode_index(target) {
                    state.push(idx);
                }
            }
            Action::Pop => state.pop(),
        }
    }
}

/// Where each rule of one mode next matches on the current line
///
/// A search from `s` that finds the leftmost match at `q` proves no
/// match of that rule starts in `s..q`, so the result is reused until
/// tokenization moves past `q`. Each rule then scans the line about
/// once instead of once per position.
struct MatchCache {
    mode: usize,
    slots: Vec<Slot>,
}

#[derive(Clone, Copy)]
enum Slot {
    Unknown,
    At(usize),
    Never,
}

impl MatchCache {
    fn new(mode: usize, rules: usize) -> Self {
        Self {
            mode,
            slots: vec![Slot::Unknown; rules],
        }
    }

    /// Earliest start at or after `pos` where rule `idx` matches
    fn next_start(&mut self, idx: usize, rule: &Rule, text: &str, pos: usize) -> Option<usize> {
        match self.slots[idx] {
            Slot::At(start) if start >= pos => Some(start),
            Slot::Never => None,
            _ => self.search(idx, rule, text, pos),
        }
    }

    fn search(&mut self, idx: usize, rule: &Rule, text: &str, from: usize) -> Option<usize> {
        let found = rule.find_from(text, from);
        self.slots[idx] = match found {
            Some(start) => Slot::At(start),
            None => Slot::Never,
        };
        found
    }
}

/// Append a token, merging runs of default text
fn push_token(tokens: &mut Vec<Token>, token: Token) {
    if let Some(last) = tokens.last_mut() {
        if token.kind == TokenType::Default && last.kind == TokenType::Default && last.end == token.start {
            last.end = token.end;
            return;
        }
    }
    tokens.push(token);
}

fn default_tokens(text: &str) -> Vec<Token> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Token::new(0, text.len(), TokenType::Default)]
    }
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    let mut next = pos + 1;
    while next < text.len() && !text.is_char_boundary(next) {
        next += 1;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::builtin;
    use crate::syntax::{PIPELINE_GRAMMAR_ID, SHELL_GRAMMAR_ID};
    use std::time::{Duration, Instant};

    fn create_test_grammar() -> Grammar {
        let mut grammar = Grammar::new("test");
        grammar.add_rule(Rule::new("comment", r"#.*$", TokenType::Comment).unwrap());
        grammar.add_rule(
            Rule::new("opener", r"^block:$", TokenType::Keyword)
                .unwrap()
                .then(Action::Push("block".to_string())),
        );
        grammar.add_rule(Rule::new("word", r"\b[a-z]+\b", TokenType::Identifier).unwrap());
        grammar
            .add_rule_to("block", Rule::new("end", r"^end$", TokenType::Keyword).unwrap().then(Action::Pop))
            .unwrap();
        grammar
            .add_rule_to("block", Rule::new("digits", r"\d+", TokenType::Number).unwrap())
            .unwrap();
        grammar
    }

    #[test]
    fn test_first_rule_wins() {
        let registry = GrammarRegistry::new();
        let grammar = create_test_grammar();
        let result = grammar.tokenize_line("abc # note", &LineState::root(), &registry);

        assert_eq!(result.kind_at(0), Some(TokenType::Identifier));
        assert_eq!(result.kind_at(3), Some(TokenType::Default));
        assert_eq!(result.kind_at(4), Some(TokenType::Comment));
        assert!(result.end_state.is_root());
    }

    #[test]
    fn test_unmatched_text_merges_into_default() {
        let registry = GrammarRegistry::new();
        let grammar = create_test_grammar();
        let result = grammar.tokenize_line("12 ;; 34", &LineState::root(), &registry);

        assert_eq!(result.tokens, vec![Token::new(0, 8, TokenType::Default)]);
    }

    #[test]
    fn test_push_and_pop_modes() {
        let registry = GrammarRegistry::new();
        let grammar = create_test_grammar();

        let opener = grammar.tokenize_line("block:", &LineState::root(), &registry);
        assert_eq!(grammar.mode_name(&opener.end_state), "block");

        let inside = grammar.tokenize_line("42", &opener.end_state, &registry);
        assert_eq!(inside.kind_at(0), Some(TokenType::Number));

        let end = grammar.tokenize_line("end", &inside.end_state, &registry);
        assert_eq!(end.kind_at(0), Some(TokenType::Keyword));
        assert!(end.end_state.is_root());
    }

    #[test]
    fn test_validate_rejects_unknown_mode() {
        let mut grammar = Grammar::new("broken");
        grammar.add_rule(
            Rule::new("go", r"go", TokenType::Keyword)
                .unwrap()
                .then(Action::Push("nowhere".to_string())),
        );
        assert!(matches!(
            grammar.validate(),
            Err(HighlightError::UnknownMode { ref mode, .. }) if mode == "nowhere"
        ));
        assert!(create_test_grammar().validate().is_ok());
    }

    #[test]
    fn test_embedded_mode_without_grammar_is_plain() {
        let registry = GrammarRegistry::new();
        let mut grammar = Grammar::new("outer");
        grammar.add_rule(
            Rule::new("opener", r"^run:$", TokenType::Keyword)
                .unwrap()
                .then(Action::Push("inner".to_string())),
        );
        grammar.add_embedded_mode("inner", "missing", r"^\s").unwrap();

        let opener = grammar.tokenize_line("run:", &LineState::root(), &registry);
        let body = grammar.tokenize_line("  echo", &opener.end_state, &registry);
        assert_eq!(body.tokens, vec![Token::new(0, 6, TokenType::Default)]);
        assert_eq!(body.grammar, "missing");
        assert!(!body.end_state.is_root());

        let after = grammar.tokenize_line("run:", &body.end_state, &registry);
        assert_eq!(after.grammar, "outer");
        assert_eq!(after.kind_at(0), Some(TokenType::Keyword));
    }

    #[test]
    fn test_duplicate_mode_name_rejected() {
        let mut grammar = Grammar::new("dup");
        grammar.add_embedded_mode("inner", "x", r"^\s").unwrap();
        assert!(grammar.add_embedded_mode("inner", "y", r"^\s").is_err());
        assert!(grammar
            .add_rule_to("inner", Rule::new("r", "r", TokenType::Default).unwrap())
            .is_err());
    }

    #[test]
    fn test_skipping_ahead_keeps_later_matches() {
        let registry = GrammarRegistry::new();
        let mut grammar = Grammar::new("skip");
        // Matches empty text everywhere; only non-empty matches count
        grammar.add_rule(Rule::new("xs", r"x*", TokenType::Identifier).unwrap());
        grammar.add_rule(Rule::new("digits", r"\d+", TokenType::Number).unwrap());

        let result = grammar.tokenize_line("ab 12 xx", &LineState::root(), &registry);
        assert_eq!(
            result.tokens,
            vec![
                Token::new(0, 3, TokenType::Default),
                Token::new(3, 5, TokenType::Number),
                Token::new(5, 6, TokenType::Default),
                Token::new(6, 8, TokenType::Identifier),
            ]
        );
    }

    #[test]
    fn test_long_lines_tokenize_in_linear_time() {
        let registry = builtin::registry(PIPELINE_GRAMMAR_ID, SHELL_GRAMMAR_ID).unwrap();
        let shell_line = "x;".repeat(16_000);
        let pipeline_line = format!("value: {}", "a;".repeat(16_000));

        let started = Instant::now();
        let shell = registry
            .tokenize_line(SHELL_GRAMMAR_ID, &shell_line, &LineState::root())
            .unwrap();
        let pipeline = registry
            .tokenize_line(PIPELINE_GRAMMAR_ID, &pipeline_line, &LineState::root())
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());

        assert_eq!(shell.tokens, vec![Token::new(0, shell_line.len(), TokenType::Default)]);
        assert_eq!(pipeline.of_kind(TokenType::Identifier).count(), 16_000);
        assert_eq!(pipeline.tokens.last().map(|t| t.end), Some(pipeline_line.len()));
    }

    #[test]
    fn test_multibyte_text_advances_by_char() {
        let registry = GrammarRegistry::new();
        let grammar = create_test_grammar();
        let result = grammar.tokenize_line("é abc", &LineState::root(), &registry);
        assert_eq!(result.kind_at(0), Some(TokenType::Default));
        assert_eq!(result.kind_at(3), Some(TokenType::Identifier));
    }
}
