//! pipeline-highlight - print pipeline YAML files with syntax colors
//!
//! Opens the file in a headless editor host, lets the attachment loop
//! install the grammars, then prints what the host tokenized.

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use tracing::Level;

use pipeline_highlight::attach::{AttachLoop, AttachOutcome, Attacher};
use pipeline_highlight::config::Config;
use pipeline_highlight::error::{HighlightError, Result};
use pipeline_highlight::host::{EditorHost, MemoryHost};
use pipeline_highlight::render::{self, Theme};
use pipeline_highlight::syntax::builtin;

/// Parsed command line
#[derive(Debug, Default)]
struct Options {
    file: Option<PathBuf>,
    config: Option<PathBuf>,
    grammar: Option<String>,
    tokens: bool,
    no_color: bool,
    verbose: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(options) = parse_args(&args)? else {
        return Ok(());
    };
    init_tracing(options.verbose);

    let config = match &options.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let path = options
        .file
        .clone()
        .ok_or_else(|| HighlightError::Message("no input file (try --help)".to_string()))?;
    let text = fs::read_to_string(&path)?;

    let registry = Arc::new(builtin::registry(&config.pipeline_grammar, &config.shell_grammar)?);
    let attacher = Attacher::new(Arc::clone(&registry), &config.pipeline_grammar, &config.shell_grammar)?;

    // The document exists before the loop starts, so the first check attaches
    let host = Arc::new(MemoryHost::new());
    let document = host.open_document(&text);
    let (handle, _shutdown) = AttachLoop::new(attacher, config.poll_interval()).spawn(host.clone());
    match handle.await {
        Ok(outcome) => {
            if let AttachOutcome::Cancelled { .. } = outcome? {
                return Err(HighlightError::Message("attachment cancelled".to_string()));
            }
        }
        Err(e) => return Err(HighlightError::Message(format!("attachment task failed: {}", e))),
    }

    let forced = options
        .grammar
        .clone()
        .or_else(|| registry.detect_grammar(&path).map(str::to_string))
        .filter(|id| *id != config.pipeline_grammar);
    if let Some(grammar) = forced {
        if !registry.contains(&grammar) {
            return Err(HighlightError::UnknownGrammar(grammar));
        }
        host.set_document_language(document, &grammar);
    }

    let lines = host.tokenize_document(document)?;
    let mut out = io::stdout().lock();
    if options.tokens {
        render::dump_tokens(&mut out, &text, &lines)?;
    } else {
        let theme = Theme::with_colors(&config.color_overrides()?);
        let color = config.color && !options.no_color;
        render::render_document(&mut out, &text, &lines, &theme, color)?;
    }

    Ok(())
}

/// Parse arguments; `None` when the invocation was fully handled (help, version)
fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(None);
            }
            "--version" | "-V" => {
                print_version();
                return Ok(None);
            }
            "--tokens" | "-t" => options.tokens = true,
            "--no-color" => options.no_color = true,
            "--verbose" | "-v" => options.verbose = true,
            "--grammar" | "-g" => options.grammar = Some(value_of(arg, iter.next())?),
            "--config" | "-c" => options.config = Some(PathBuf::from(value_of(arg, iter.next())?)),
            other if other.starts_with('-') => {
                return Err(HighlightError::Message(format!("unknown option: {}", other)));
            }
            file => {
                if options.file.is_some() {
                    return Err(HighlightError::Message("only one input file is supported".to_string()));
                }
                options.file = Some(PathBuf::from(file));
            }
        }
    }

    Ok(Some(options))
}

fn value_of(flag: &str, value: Option<&String>) -> Result<String> {
    value
        .cloned()
        .ok_or_else(|| HighlightError::Message(format!("{} needs a value", flag)))
}

fn init_tracing(verbose: bool) {
    let from_env = env::var("PIPELINE_HIGHLIGHT_LOG")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("debug"));
    let level = if verbose || from_env { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

fn print_usage() {
    println!("pipeline-highlight {} - pipeline YAML syntax highlighter", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: pipeline-highlight [OPTIONS] FILE");
    println!();
    println!("Options:");
    println!("  -t, --tokens        Print tokens instead of colored text");
    println!("  -g, --grammar ID    Highlight with the given grammar");
    println!("  -c, --config PATH   Read configuration from PATH");
    println!("      --no-color      Print without colors");
    println!("  -v, --verbose       Log attachment progress");
    println!("  -h, --help          Show this help message");
    println!("  -V, --version       Show version information");
    println!();
    println!("Files ending in .ps1, .psm1 or .psd1 use the shell grammar.");
}

fn print_version() {
    println!("pipeline-highlight {}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let options = parse_args(&args(&["-t", "-g", "shell-script", "build.yml"]))
            .unwrap()
            .unwrap();
        assert!(options.tokens);
        assert_eq!(options.grammar.as_deref(), Some("shell-script"));
        assert_eq!(options.file, Some(PathBuf::from("build.yml")));
        assert!(!options.no_color);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--grammar"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["a.yml", "b.yml"])).is_err());
    }
}
