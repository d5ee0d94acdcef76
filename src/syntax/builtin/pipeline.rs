//! Pipeline YAML grammar
//!
//! Structural keywords, step kinds and known properties of pipeline
//! definition files. `pwsh:`/`powershell:` step bodies are handed to
//! the shell grammar for as long as their lines stay indented.

use crate::error::Result;
use crate::syntax::grammar::Grammar;
use crate::syntax::rules::{Action, Rule};
use crate::syntax::tokens::TokenType;

/// Mode holding the body of a script step
pub const SCRIPT_BLOCK_MODE: &str = "script-block";

const SECTIONS: &[&str] = &[
    "trigger", "pool", "steps", "stages", "jobs", "parameters", "variables", "schedules",
    "resources", "extends", "pr", "pipelines", "source", "tags", "repositories", "containers",
    "name", "services", "strategy", "matrix", "demands", "vmImage", "parallel", "deployment",
    "lifecycle", "hook", "environment", "runOnce", "canary", "rolling", "queue",
];

const LIST_ITEMS: &[&str] = &[
    "template", "dependsOn", "checkout", "task", "workspace", "name", "download", "upload",
    "publish", "group", "path", "artifact", "secure", "object", "string", "number", "boolean",
    "step", "script", "bash", "python", "node", "deployment",
];

const PROPERTIES: &[&str] = &[
    "value", "default", "values", "displayName", "timeoutInMinutes", "retryCountOnTaskFailure",
    "failOnStderr", "continueOnError", "enabled", "inputs", "workingDirectory", "clean",
    "fetchDepth", "lfs", "submodules", "persistCredentials", "condition", "target", "percent",
    "increment", "healthCheck", "pool", "workspace", "container", "service", "endpoint",
    "subscription", "tenant", "key", "secret", "registry", "path", "include", "exclude", "batch",
    "branches", "tags", "paths", "always", "none", "auto", "version", "region", "resourceGroup",
    "maxParallel", "prependPath", "targetPath", "rootFolderOrFile", "includeRootFolder",
    "archiveType", "replaceExistingArchive",
];

/// Create the pipeline grammar, embedding `shell_id` in script steps
pub fn pipeline_grammar(id: &str, shell_id: &str) -> Result<Grammar> {
    let mut grammar = Grammar::new(id);

    // Script step openers come first; they are anchored to the whole line
    let opener = r"^(\s*)(?:-\s*)?(?:pwsh|powershell):\s*(?:[|>][-+]?)?\s*$";
    grammar.add_rule(
        Rule::new("script_opener", opener, TokenType::Keyword)?
            .then(Action::Push(SCRIPT_BLOCK_MODE.to_string())),
    );

    // Indentation and list dashes stay default text
    let sections = format!(r"^\s*\b({})\b", SECTIONS.join("|"));
    grammar.add_rule(Rule::new("section", &sections, TokenType::Keyword)?.capturing(1));

    let list_items = format!(r"^\s*-\s*({})\b", LIST_ITEMS.join("|"));
    grammar.add_rule(Rule::new("list_item", &list_items, TokenType::Type)?.capturing(1));

    let properties = format!(r"^\s*({})\b", PROPERTIES.join("|"));
    grammar.add_rule(Rule::new("property", &properties, TokenType::TypeIdentifier)?.capturing(1));

    grammar.add_rule(Rule::new("constant", r"\b(true|false|null)\b", TokenType::Constant)?);

    // Strings
    grammar.add_rule(Rule::new("double_string", r#""[^"\\]*(?:\\.[^"\\]*)*""#, TokenType::String)?);
    grammar.add_rule(Rule::new("single_string", r"'[^'\\]*(?:\\.[^'\\]*)*'", TokenType::String)?);

    grammar.add_rule(Rule::new("comment", r"#.*", TokenType::Comment)?);

    // Standalone numbers only
    let number = r"(?:^|[\s,\[{])(-?\d+(?:\.\d+)?)(?:[\s,\]}]|$)";
    grammar.add_rule(Rule::new("number", number, TokenType::Number)?.capturing(1));

    // ${{ template expressions }} and $(macro) references
    grammar.add_rule(Rule::new("template_expression", r"\$\{\{[^}]+\}\}", TokenType::VariableEmbedded)?);
    grammar.add_rule(Rule::new("macro", r"\$\([\w.]+\)", TokenType::VariableEmbedded)?);

    // Generic identifiers go last so they never shadow the rules above
    grammar.add_rule(Rule::new("identifier", r"\b[a-zA-Z_]\w*\b", TokenType::Identifier)?);

    grammar.add_embedded_mode(SCRIPT_BLOCK_MODE, shell_id, r"^\s")?;

    Ok(grammar)
}
