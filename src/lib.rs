//! pipeline-highlight - pipeline YAML and embedded shell grammars for a host editor
//!
//! The grammars are plain rule tables with a pure line classifier
//! ([`syntax`]). They reach an editor through the [`host::EditorHost`]
//! capability, which [`attach`] polls until the editor is ready.

pub mod attach;
pub mod config;
pub mod error;
pub mod host;
pub mod render;
pub mod syntax;

pub use attach::{AttachLoop, AttachOutcome, AttachState, Attacher};
pub use config::Config;
pub use error::{HighlightError, Result};
pub use host::{DocumentId, EditorHost, MemoryHost};
pub use syntax::{GrammarRegistry, LineState, LineTokens, TokenType};
