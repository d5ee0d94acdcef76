//! Editor language configuration
//!
//! Comment and bracket metadata installed next to each grammar so the
//! host can toggle comments and pair brackets.

/// A pair of characters the editor inserts together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoClosingPair {
    pub open: char,
    pub close: char,
}

/// Comment syntax and bracket pairing for one grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfiguration {
    /// Line comment marker
    pub line_comment: Option<String>,
    /// Matching bracket pairs
    pub brackets: Vec<(char, char)>,
    /// Pairs closed automatically when the opener is typed
    pub auto_closing_pairs: Vec<AutoClosingPair>,
}

impl LanguageConfiguration {
    /// `#` comments, the three bracket kinds, auto-closed quotes and parentheses
    pub fn hash_comments() -> Self {
        Self {
            line_comment: Some("#".to_string()),
            brackets: vec![('{', '}'), ('[', ']'), ('(', ')')],
            auto_closing_pairs: vec![
                AutoClosingPair { open: '"', close: '"' },
                AutoClosingPair { open: '\'', close: '\'' },
                AutoClosingPair { open: '(', close: ')' },
            ],
        }
    }

    /// Character inserted after `open` is typed
    pub fn auto_close(&self, open: char) -> Option<char> {
        self.auto_closing_pairs
            .iter()
            .find(|p| p.open == open)
            .map(|p| p.close)
    }

    /// The other half of a bracket pair
    pub fn matching_bracket(&self, ch: char) -> Option<char> {
        self.brackets.iter().find_map(|&(open, close)| {
            if ch == open {
                Some(close)
            } else if ch == close {
                Some(open)
            } else {
                None
            }
        })
    }

    /// Check if a line is a comment under this configuration
    pub fn is_comment_line(&self, line: &str) -> bool {
        self.line_comment
            .as_deref()
            .is_some_and(|marker| line.trim_start().starts_with(marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_comments() {
        let config = LanguageConfiguration::hash_comments();
        assert!(config.is_comment_line("  # trigger"));
        assert!(!config.is_comment_line("trigger: none"));
        assert_eq!(config.matching_bracket('['), Some(']'));
        assert_eq!(config.matching_bracket(')'), Some('('));
        assert_eq!(config.matching_bracket('<'), None);
        assert_eq!(config.auto_close('"'), Some('"'));
        assert_eq!(config.auto_close('('), Some(')'));
        // Braces pair but are not auto-closed
        assert_eq!(config.auto_close('{'), None);
    }
}
