//! In-memory editor host
//!
//! A headless host that keeps documents, grammar registrations and
//! creation hooks in memory. The command-line viewer renders through
//! it, and tests use it to drive the attachment loop.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{DocumentHook, DocumentId, EditorHost};
use crate::error::{HighlightError, Result};
use crate::syntax::{LanguageConfiguration, LineState, LineTokens, Token, TokenType, TokensProvider};

/// Grammar reported for documents without a tokenizer
pub const PLAIN_TEXT: &str = "plaintext";

struct Document {
    id: DocumentId,
    text: String,
    language: Option<String>,
}

#[derive(Default)]
struct HostState {
    present: bool,
    editor_api: bool,
    languages: Vec<String>,
    providers: HashMap<String, TokensProvider>,
    configurations: HashMap<String, LanguageConfiguration>,
    documents: Vec<Document>,
    next_id: u64,
    hooks: Vec<DocumentHook>,
    /// Every language assignment, in order
    assignments: Vec<(DocumentId, String)>,
}

/// Headless editor host
pub struct MemoryHost {
    state: Mutex<HostState>,
}

impl MemoryHost {
    /// A loaded host with the editor API and no documents
    pub fn new() -> Self {
        Self::with_flags(true, true)
    }

    /// A host whose runtime has not loaded yet
    pub fn absent() -> Self {
        Self::with_flags(false, false)
    }

    /// A loaded runtime that lacks the editor API
    pub fn without_editor_api() -> Self {
        Self::with_flags(true, false)
    }

    fn with_flags(present: bool, editor_api: bool) -> Self {
        Self {
            state: Mutex::new(HostState {
                present,
                editor_api,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Finish loading the runtime
    pub fn load(&self) {
        let mut state = self.lock();
        state.present = true;
        state.editor_api = true;
    }

    /// Create a document and notify creation hooks
    pub fn open_document(&self, text: &str) -> DocumentId {
        let (id, hooks) = {
            let mut state = self.lock();
            state.next_id += 1;
            let id = DocumentId(state.next_id);
            state.documents.push(Document {
                id,
                text: text.to_string(),
                language: None,
            });
            (id, state.hooks.clone())
        };

        // Hooks call back into the host, so they run unlocked
        for hook in hooks {
            hook(self, id);
        }
        id
    }

    /// Grammar currently assigned to a document
    pub fn document_language(&self, document: DocumentId) -> Option<String> {
        self.lock()
            .documents
            .iter()
            .find(|d| d.id == document)
            .and_then(|d| d.language.clone())
    }

    /// Every language assignment made so far
    pub fn assignments(&self) -> Vec<(DocumentId, String)> {
        self.lock().assignments.clone()
    }

    pub fn hook_count(&self) -> usize {
        self.lock().hooks.len()
    }

    pub fn registered_languages(&self) -> Vec<String> {
        self.lock().languages.clone()
    }

    pub fn language_configuration(&self, id: &str) -> Option<LanguageConfiguration> {
        self.lock().configurations.get(id).cloned()
    }

    pub fn has_tokens_provider(&self, id: &str) -> bool {
        self.lock().providers.contains_key(id)
    }

    /// Tokenize a document with the tokenizer of its assigned grammar
    ///
    /// Documents without a grammar, or whose grammar has no tokenizer,
    /// come back as unstyled lines.
    pub fn tokenize_document(&self, document: DocumentId) -> Result<Vec<LineTokens>> {
        let (text, provider) = {
            let state = self.lock();
            let doc = state
                .documents
                .iter()
                .find(|d| d.id == document)
                .ok_or_else(|| HighlightError::Message(format!("no such document: {}", document)))?;
            let provider = doc
                .language
                .as_ref()
                .and_then(|lang| state.providers.get(lang))
                .cloned();
            (doc.text.clone(), provider)
        };

        let Some(provider) = provider else {
            return Ok(text.lines().map(plain_line).collect());
        };

        let mut line_state = provider.initial_state();
        let mut lines = Vec::new();
        for line in text.lines() {
            let result = provider.tokenize(line, &line_state)?;
            line_state = result.end_state.clone();
            lines.push(result);
        }
        Ok(lines)
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorHost for MemoryHost {
    fn is_present(&self) -> bool {
        self.lock().present
    }

    fn has_editor_api(&self) -> bool {
        let state = self.lock();
        state.present && state.editor_api
    }

    fn documents(&self) -> Vec<DocumentId> {
        self.lock().documents.iter().map(|d| d.id).collect()
    }

    fn register_language(&self, id: &str) {
        let mut state = self.lock();
        if !state.languages.iter().any(|l| l == id) {
            state.languages.push(id.to_string());
        }
    }

    fn set_tokens_provider(&self, id: &str, provider: TokensProvider) {
        self.lock().providers.insert(id.to_string(), provider);
    }

    fn set_language_configuration(&self, id: &str, config: &LanguageConfiguration) {
        self.lock().configurations.insert(id.to_string(), config.clone());
    }

    fn set_document_language(&self, document: DocumentId, language: &str) {
        let mut guard = self.lock();
        let state = &mut *guard;
        if let Some(doc) = state.documents.iter_mut().find(|d| d.id == document) {
            doc.language = Some(language.to_string());
            state.assignments.push((document, language.to_string()));
        }
    }

    fn on_did_create_document(&self, hook: DocumentHook) {
        self.lock().hooks.push(hook);
    }
}

fn plain_line(line: &str) -> LineTokens {
    let tokens = if line.is_empty() {
        Vec::new()
    } else {
        vec![Token::new(0, line.len(), TokenType::Default)]
    };
    LineTokens {
        tokens,
        end_state: LineState::root(),
        grammar: PLAIN_TEXT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_flags() {
        let host = MemoryHost::absent();
        assert!(!host.is_present());
        assert!(!host.has_editor_api());

        host.load();
        assert!(host.is_present());
        assert!(host.has_editor_api());

        let host = MemoryHost::without_editor_api();
        assert!(host.is_present());
        assert!(!host.has_editor_api());
    }

    #[test]
    fn test_hooks_run_for_new_documents() {
        let host = MemoryHost::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        host.on_did_create_document(Arc::new(move |host: &dyn EditorHost, id: DocumentId| {
            counter.fetch_add(1, Ordering::SeqCst);
            host.set_document_language(id, "lang");
        }));

        let id = host.open_document("text");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(host.document_language(id), Some("lang".to_string()));
        assert_eq!(host.assignments(), vec![(id, "lang".to_string())]);
    }

    #[test]
    fn test_documents_in_creation_order() {
        let host = MemoryHost::new();
        let first = host.open_document("a");
        let second = host.open_document("b");
        assert_eq!(host.documents(), vec![first, second]);
        assert!(first < second);
    }

    #[test]
    fn test_untokenized_document_is_plain() {
        let host = MemoryHost::new();
        let id = host.open_document("one\n\ntwo");
        let lines = host.tokenize_document(id).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].tokens.is_empty());
        assert!(lines.iter().all(|l| l.grammar == PLAIN_TEXT));
        assert!(host.tokenize_document(DocumentId(99)).is_err());
    }

    #[test]
    fn test_register_language_is_idempotent() {
        let host = MemoryHost::new();
        host.register_language("a");
        host.register_language("a");
        assert_eq!(host.registered_languages(), vec!["a".to_string()]);
    }
}
