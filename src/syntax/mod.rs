//! Syntax module
//!
//! This module provides the tokenizer grammars handed to a host editor:
//! - Rule tables and modes
//! - The built-in shell and pipeline grammars
//! - Language configuration (comments, brackets)
//! - Token classifications and their terminal styles

mod style;
mod tokens;
mod rules;
mod grammar;
mod registry;
mod language_config;
pub mod builtin;

pub use style::{Color, Style};
pub use tokens::{Token, TokenType};
pub use rules::{Action, LineState, LineTokens, Rule, RuleMatch};
pub use grammar::{Grammar, Mode, ModeBody, ROOT_MODE};
pub use registry::{GrammarRegistry, TokensProvider};
pub use language_config::{AutoClosingPair, LanguageConfiguration};
pub use builtin::{PIPELINE_GRAMMAR_ID, SHELL_GRAMMAR_ID};
