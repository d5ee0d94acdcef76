//! Token classifications
//!
//! This module defines the classifications the grammars emit, the
//! dotted scope name a host editor themes them by, and their default
//! terminal styles.

use super::style::{Color, Style};

/// Classification of a matched span of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Verb-noun commands, bracketed type annotations, list-item step kinds
    Type,
    /// Known attribute/property names in pipeline files
    TypeIdentifier,
    /// Structural section keywords and script-block openers
    Keyword,
    /// Shell declaration and error-handling keywords
    KeywordControl,
    /// Shell branching and looping keywords
    ControlFlow,
    /// `#` comments
    Comment,
    /// Quoted strings
    String,
    /// Numeric literals
    Number,
    /// `true`, `false`, `null`
    Constant,
    /// `$name`
    Variable,
    /// `${name}` and `$(name)`
    VariableBracketed,
    /// `${{ expression }}` and `$(macro)` in pipeline files
    VariableEmbedded,
    /// `@{ ... }` hash literals
    Object,
    /// Any other identifier
    Identifier,
    /// Unmatched text
    Default,
}

impl TokenType {
    /// All classifications, in declaration order
    pub const ALL: [TokenType; 15] = [
        TokenType::Type,
        TokenType::TypeIdentifier,
        TokenType::Keyword,
        TokenType::KeywordControl,
        TokenType::ControlFlow,
        TokenType::Comment,
        TokenType::String,
        TokenType::Number,
        TokenType::Constant,
        TokenType::Variable,
        TokenType::VariableBracketed,
        TokenType::VariableEmbedded,
        TokenType::Object,
        TokenType::Identifier,
        TokenType::Default,
    ];

    /// Dotted scope name used by host editor themes
    pub fn scope(&self) -> &'static str {
        match self {
            TokenType::Type => "type",
            TokenType::TypeIdentifier => "type.identifier",
            TokenType::Keyword => "keyword",
            TokenType::KeywordControl => "keyword.control",
            TokenType::ControlFlow => "control.flow",
            TokenType::Comment => "comment",
            TokenType::String => "string",
            TokenType::Number => "number",
            TokenType::Constant => "constant",
            TokenType::Variable => "variable",
            TokenType::VariableBracketed => "variable.bracketed",
            TokenType::VariableEmbedded => "variable.embedded",
            TokenType::Object => "object",
            TokenType::Identifier => "identifier",
            TokenType::Default => "",
        }
    }

    /// Get the default style for this token type
    pub fn default_style(&self) -> Style {
        match self {
            TokenType::Type => Style::fg(Color::Yellow),
            TokenType::TypeIdentifier => Style::fg(Color::BrightBlue),
            TokenType::Keyword => Style::fg(Color::Magenta).with_bold(),
            TokenType::KeywordControl => Style::fg(Color::Magenta),
            TokenType::ControlFlow => Style::fg(Color::BrightMagenta),
            TokenType::Comment => Style::fg(Color::BrightBlack).with_italic(),
            TokenType::String => Style::fg(Color::Green),
            TokenType::Number => Style::fg(Color::Cyan),
            TokenType::Constant => Style::fg(Color::BrightRed),
            TokenType::Variable => Style::fg(Color::BrightCyan),
            TokenType::VariableBracketed => Style::fg(Color::BrightCyan).with_underline(),
            TokenType::VariableEmbedded => Style::fg(Color::BrightYellow),
            TokenType::Object => Style::fg(Color::Blue),
            TokenType::Identifier => Style::default(),
            TokenType::Default => Style::default(),
        }
    }

    /// Get a human-readable name for this token type
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::Type => "Type",
            TokenType::TypeIdentifier => "TypeIdentifier",
            TokenType::Keyword => "Keyword",
            TokenType::KeywordControl => "KeywordControl",
            TokenType::ControlFlow => "ControlFlow",
            TokenType::Comment => "Comment",
            TokenType::String => "String",
            TokenType::Number => "Number",
            TokenType::Constant => "Constant",
            TokenType::Variable => "Variable",
            TokenType::VariableBracketed => "VariableBracketed",
            TokenType::VariableEmbedded => "VariableEmbedded",
            TokenType::Object => "Object",
            TokenType::Identifier => "Identifier",
            TokenType::Default => "Default",
        }
    }

    /// Parse a token type from its name or scope (for TOML loading)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == name || (!t.scope().is_empty() && t.scope() == name))
    }
}

/// A classified span of a single line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Byte offset where this token starts (inclusive)
    pub start: usize,
    /// Byte offset where this token ends (exclusive)
    pub end: usize,
    /// Classification of the span
    pub kind: TokenType,
}

impl Token {
    pub fn new(start: usize, end: usize, kind: TokenType) -> Self {
        Self { start, end, kind }
    }

    /// Text of this token within its line
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        line.get(self.start..self.end).unwrap_or("")
    }

    /// Get the length of this token in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the token is empty
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_styles_not_empty() {
        assert!(!TokenType::Comment.default_style().is_default());
        assert!(!TokenType::String.default_style().is_default());
        assert!(!TokenType::Keyword.default_style().is_default());
        // Plain identifiers and unmatched text are not styled
        assert!(TokenType::Identifier.default_style().is_default());
        assert!(TokenType::Default.default_style().is_default());
    }

    #[test]
    fn test_from_name_accepts_names_and_scopes() {
        for token_type in TokenType::ALL {
            assert_eq!(TokenType::from_name(token_type.name()), Some(token_type));
        }
        assert_eq!(TokenType::from_name("keyword.control"), Some(TokenType::KeywordControl));
        assert_eq!(TokenType::from_name("variable.embedded"), Some(TokenType::VariableEmbedded));
    }

    #[test]
    fn test_from_name_invalid() {
        assert_eq!(TokenType::from_name("InvalidType"), None);
        assert_eq!(TokenType::from_name(""), None);
    }

    #[test]
    fn test_token_text() {
        let line = "key: 42";
        let token = Token::new(5, 7, TokenType::Number);
        assert_eq!(token.text(line), "42");
        assert_eq!(token.len(), 2);
        assert!(!token.is_empty());
    }
}
