//! Pattern rules for tokenization
//!
//! This module defines the rule records a grammar mode is made of,
//! and the per-line state carried between lines.

use regex::Regex;

use super::tokens::{Token, TokenType};
use crate::error::{HighlightError, Result};

/// Mode transition performed after a rule matches
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Action {
    /// Stay in the current mode
    #[default]
    Stay,
    /// Enter the named mode of the same grammar
    Push(String),
    /// Return to the enclosing mode
    Pop,
}

/// A single-line pattern rule
///
/// Matches a regex pattern at the current position and assigns a
/// token type to the match. Rules are tried in the order they were
/// added to their mode; the first one matching wins.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Name for debugging
    pub name: String,
    /// Compiled regex pattern
    pub pattern: Regex,
    /// Token type to assign to matches
    pub token_type: TokenType,
    /// Capture group bounding the token; the whole match when `None`
    pub capture: Option<usize>,
    /// Transition after a match
    pub action: Action,
}

/// Where a rule matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    /// Start of the whole match (always the position tried)
    pub start: usize,
    /// Start of the classified token
    pub token_start: usize,
    /// End of the classified token; tokenization resumes here
    pub token_end: usize,
}

impl Rule {
    /// Create a new pattern rule
    pub fn new(name: &str, pattern: &str, token_type: TokenType) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|source| HighlightError::InvalidPattern {
            rule: name.to_string(),
            source,
        })?;
        Ok(Self {
            name: name.to_string(),
            pattern,
            token_type,
            capture: None,
            action: Action::Stay,
        })
    }

    /// Builder: classify only the given capture group
    ///
    /// Text matched before the group is emitted as default text and
    /// text matched after it is left for the next rule, which lets a
    /// pattern check its surroundings without consuming them.
    pub fn capturing(mut self, group: usize) -> Self {
        self.capture = Some(group);
        self
    }

    /// Builder: set the transition performed after a match
    pub fn then(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Start of the leftmost match at or after `from`
    pub fn find_from(&self, text: &str, from: usize) -> Option<usize> {
        if from > text.len() {
            return None;
        }
        self.pattern.find_at(text, from).map(|m| m.start())
    }

    /// Try this rule at exactly `pos`
    ///
    /// `^` and `\b` see the whole line, so anchors keep their meaning
    /// when tokenization is halfway through it.
    pub fn match_at(&self, text: &str, pos: usize) -> Option<RuleMatch> {
        if pos > text.len() {
            return None;
        }
        let caps = self.pattern.captures_at(text, pos)?;
        let whole = caps.get(0)?;
        if whole.start() != pos {
            return None;
        }

        let (token_start, token_end) = match self.capture {
            Some(group) => {
                let m = caps.get(group)?;
                (m.start(), m.end())
            }
            None => (whole.start(), whole.end()),
        };

        // An empty match only makes sense when it changes mode
        if token_end == pos && self.action == Action::Stay {
            return None;
        }

        Some(RuleMatch {
            start: pos,
            token_start,
            token_end,
        })
    }
}

/// Line state for tracking modes across lines
///
/// Holds the mode stack at the end of a line. When the current mode
/// embeds another grammar, that grammar's own state is kept alongside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineState {
    /// Entered modes, innermost last; empty = root mode
    stack: Vec<usize>,
    /// State of the embedded grammar, if one is active
    embedded: Option<Box<LineState>>,
}

impl LineState {
    /// Initial state of every document
    pub fn root() -> Self {
        Self::default()
    }

    /// Index of the current mode (0 = root)
    pub fn mode(&self) -> usize {
        self.stack.last().copied().unwrap_or(0)
    }

    /// Number of modes entered above the root
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Check if we're in the root mode
    pub fn is_root(&self) -> bool {
        self.stack.is_empty()
    }

    /// State of the embedded grammar, if one is active
    pub fn embedded(&self) -> Option<&LineState> {
        self.embedded.as_deref()
    }

    pub(crate) fn push(&mut self, mode: usize) {
        self.stack.push(mode);
        self.embedded = None;
    }

    pub(crate) fn pop(&mut self) {
        self.stack.pop();
        self.embedded = None;
    }

    pub(crate) fn set_embedded(&mut self, state: LineState) {
        self.embedded = Some(Box::new(state));
    }
}

/// Result of tokenizing a single line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTokens {
    /// Tokens covering the line, in order
    pub tokens: Vec<Token>,
    /// State at end of line (for next line)
    pub end_state: LineState,
    /// Grammar that classified this line
    pub grammar: String,
}

impl LineTokens {
    /// Tokens of the given kind
    pub fn of_kind(&self, kind: TokenType) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(move |t| t.kind == kind)
    }

    /// Classification of the token covering byte `pos`
    pub fn kind_at(&self, pos: usize) -> Option<TokenType> {
        self.tokens
            .iter()
            .find(|t| pos >= t.start && pos < t.end)
            .map(|t| t.kind)
    }
}
