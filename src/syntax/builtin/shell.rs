//! Shell script grammar (PowerShell flavoured)

use crate::error::Result;
use crate::syntax::grammar::Grammar;
use crate::syntax::rules::Rule;
use crate::syntax::tokens::TokenType;

/// Create the shell script grammar
pub fn shell_grammar(id: &str) -> Result<Grammar> {
    let mut grammar = Grammar::new(id);

    // Verb-noun commands
    let commands = r"(Get|Set|New|Write|Remove|Start|Stop|Restart|Invoke|Test|Enable|Disable|Clear|Export|Import|Convert|Format|Exists)-[a-zA-Z]+";
    grammar.add_rule(Rule::new("command", commands, TokenType::Type)?);

    // Keywords
    let control = r"\b(function|param|begin|process|end|filter|class|enum|break|continue|do|switch|throw|trap|try|catch|finally)\b";
    grammar.add_rule(Rule::new("keyword_control", control, TokenType::KeywordControl)?);
    let flow = r"\b(if|else|elseif|foreach|while|return)\b";
    grammar.add_rule(Rule::new("control_flow", flow, TokenType::ControlFlow)?);

    grammar.add_rule(Rule::new("comment", r"#.*", TokenType::Comment)?);
    grammar.add_rule(Rule::new("string", r#"".*?"|'.*?'"#, TokenType::String)?);

    // [string], [int] ...
    grammar.add_rule(Rule::new("type_annotation", r"\[[a-zA-Z_]\w*\]", TokenType::Type)?);

    // Variables
    grammar.add_rule(Rule::new("variable", r"\$[a-zA-Z_]\w*", TokenType::Variable)?);
    grammar.add_rule(Rule::new("variable_braced", r"\$\{[a-zA-Z_]\w*\}", TokenType::VariableBracketed)?);
    grammar.add_rule(Rule::new("subexpression", r"\$\([a-zA-Z_]\w*\)", TokenType::VariableBracketed)?);

    // Standalone numbers; the trailing boundary is checked, not consumed
    let number = r"(?:^|[\s,(\[{])(-?\d+(?:\.\d+)?)(?:[\s,)\]}]|$)";
    grammar.add_rule(Rule::new("number", number, TokenType::Number)?.capturing(1));

    // Hash literals
    grammar.add_rule(Rule::new("hashtable", r"@\{[^}]*\}", TokenType::Object)?);

    Ok(grammar)
}
