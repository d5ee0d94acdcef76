//! Host editor capability
//!
//! The editor that renders documents is owned by someone else. This
//! module describes the few operations the attachment loop needs from
//! it, so the loop works against any host, including the in-memory one.

mod memory;

use std::fmt;
use std::sync::Arc;

use crate::syntax::{LanguageConfiguration, TokensProvider};

pub use memory::MemoryHost;

/// Identifier of a document owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document#{}", self.0)
    }
}

/// Callback run by the host for every newly created document
pub type DocumentHook = Arc<dyn Fn(&dyn EditorHost, DocumentId) + Send + Sync>;

/// Operations a host editor exposes
pub trait EditorHost: Send + Sync {
    /// The host runtime is loaded
    fn is_present(&self) -> bool;

    /// The loaded runtime exposes the editor API below
    fn has_editor_api(&self) -> bool;

    /// Currently open documents, oldest first
    fn documents(&self) -> Vec<DocumentId>;

    /// Declare a grammar identifier
    fn register_language(&self, id: &str);

    /// Install the tokenizer for a grammar identifier
    fn set_tokens_provider(&self, id: &str, provider: TokensProvider);

    /// Install comment and bracket metadata for a grammar identifier
    fn set_language_configuration(&self, id: &str, config: &LanguageConfiguration);

    /// Switch a document to a grammar identifier
    fn set_document_language(&self, document: DocumentId, language: &str);

    /// Run `hook` for every document created from now on
    fn on_did_create_document(&self, hook: DocumentHook);
}
