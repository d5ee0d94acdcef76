//! Built-in grammars
//!
//! The shell script grammar and the pipeline YAML grammar that embeds it.

pub mod pipeline;
pub mod shell;

use super::grammar::Grammar;
use super::registry::GrammarRegistry;
use crate::error::Result;

/// Default identifier of the shell script grammar
pub const SHELL_GRAMMAR_ID: &str = "shell-script";
/// Default identifier of the pipeline grammar
pub const PIPELINE_GRAMMAR_ID: &str = "pipeline-yaml";

/// Get both built-in grammars, shell first
pub fn all_grammars(pipeline_id: &str, shell_id: &str) -> Result<Vec<Grammar>> {
    Ok(vec![
        shell::shell_grammar(shell_id)?,
        pipeline::pipeline_grammar(pipeline_id, shell_id)?,
    ])
}

/// Registry holding the built-in grammars and their file extensions
pub fn registry(pipeline_id: &str, shell_id: &str) -> Result<GrammarRegistry> {
    let mut registry = GrammarRegistry::new();
    for grammar in all_grammars(pipeline_id, shell_id)? {
        registry.register(grammar)?;
    }
    for ext in ["yml", "yaml"] {
        registry.add_extension(ext, pipeline_id);
    }
    for ext in ["ps1", "psm1", "psd1"] {
        registry.add_extension(ext, shell_id);
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_builtin_registry() {
        let registry = registry(PIPELINE_GRAMMAR_ID, SHELL_GRAMMAR_ID).unwrap();
        assert_eq!(registry.ids(), vec![PIPELINE_GRAMMAR_ID, SHELL_GRAMMAR_ID]);
        assert_eq!(registry.detect_grammar(Path::new("azure-pipelines.yml")), Some(PIPELINE_GRAMMAR_ID));
        assert_eq!(registry.detect_grammar(Path::new("build.ps1")), Some(SHELL_GRAMMAR_ID));
        assert_eq!(registry.detect_grammar(Path::new("README.md")), None);
    }

    #[test]
    fn test_custom_ids_are_wired_through() {
        let registry = registry("azure-yaml", "powershell2").unwrap();
        let lines = registry
            .tokenize_document("azure-yaml", "- pwsh: |\n    Get-Item .")
            .unwrap();
        assert_eq!(lines[1].grammar, "powershell2");
    }
}
