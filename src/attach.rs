//! Attachment to the host editor
//!
//! The host runtime loads on its own schedule. `Attacher` checks it once
//! per poll and performs the one-time setup as soon as the editor and a
//! document exist; `AttachLoop` repeats those checks on a fixed delay
//! until setup has run or the loop is shut down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{HighlightError, Result};
use crate::host::{DocumentId, EditorHost};
use crate::syntax::{GrammarRegistry, LanguageConfiguration, TokensProvider};

/// Delay between two checks of the host
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachState {
    /// The host is not ready yet
    Waiting,
    /// Setup has run; terminal
    Attached,
}

/// How a loop run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached { polls: u64 },
    Cancelled { polls: u64 },
}

/// One-time setup of the grammars on a host
pub struct Attacher {
    registry: Arc<GrammarRegistry>,
    pipeline_id: String,
    shell_id: String,
    configuration: LanguageConfiguration,
    state: AttachState,
}

impl Attacher {
    /// Both grammar identifiers must be present in `registry`
    pub fn new(registry: Arc<GrammarRegistry>, pipeline_id: &str, shell_id: &str) -> Result<Self> {
        for id in [pipeline_id, shell_id] {
            if !registry.contains(id) {
                return Err(HighlightError::UnknownGrammar(id.to_string()));
            }
        }
        Ok(Self {
            registry,
            pipeline_id: pipeline_id.to_string(),
            shell_id: shell_id.to_string(),
            configuration: LanguageConfiguration::hash_comments(),
            state: AttachState::Waiting,
        })
    }

    pub fn state(&self) -> AttachState {
        self.state
    }

    /// Check the host once, attaching if it is ready
    ///
    /// A host that is loaded but lacks the editor API cannot become
    /// ready later, so that case is an error rather than `Waiting`.
    pub fn poll(&mut self, host: &dyn EditorHost) -> Result<AttachState> {
        if self.state == AttachState::Attached {
            return Ok(AttachState::Attached);
        }
        if !host.is_present() {
            debug!("host editor not loaded");
            return Ok(AttachState::Waiting);
        }
        if !host.has_editor_api() {
            warn!("host editor loaded without an editor API; grammars not installed");
            return Err(HighlightError::EditorApiUnavailable);
        }
        if host.documents().is_empty() {
            debug!("host editor has no documents yet");
            return Ok(AttachState::Waiting);
        }

        self.attach(host);
        Ok(self.state)
    }

    /// Install grammars, configure the first document and hook new ones
    ///
    /// Runs at most once; later calls leave the host untouched.
    pub fn attach(&mut self, host: &dyn EditorHost) {
        if self.state == AttachState::Attached {
            debug!("grammars already attached");
            return;
        }

        for id in [&self.shell_id, &self.pipeline_id] {
            host.register_language(id);
            host.set_tokens_provider(id, TokensProvider::new(Arc::clone(&self.registry), id));
            host.set_language_configuration(id, &self.configuration);
        }
        info!(pipeline = %self.pipeline_id, shell = %self.shell_id, "grammars installed");

        match host.documents().first() {
            Some(&document) => {
                info!(%document, grammar = %self.pipeline_id, "highlighting document");
                host.set_document_language(document, &self.pipeline_id);
            }
            None => warn!("no document to highlight"),
        }

        let pipeline_id = self.pipeline_id.clone();
        host.on_did_create_document(Arc::new(move |host: &dyn EditorHost, document: DocumentId| {
            info!(%document, grammar = %pipeline_id, "highlighting new document");
            host.set_document_language(document, &pipeline_id);
        }));

        self.state = AttachState::Attached;
    }
}

/// Repeats `Attacher::poll` on a fixed delay
pub struct AttachLoop {
    attacher: Attacher,
    interval: Duration,
}

impl AttachLoop {
    pub fn new(attacher: Attacher, interval: Duration) -> Self {
        Self { attacher, interval }
    }

    /// Poll until attached, shut down, or the host turns out unusable
    ///
    /// The first check happens immediately. There is no retry limit.
    pub async fn run(mut self, host: Arc<dyn EditorHost>, mut shutdown: watch::Receiver<bool>) -> Result<AttachOutcome> {
        let mut polls = 0;
        loop {
            if *shutdown.borrow() {
                return Ok(AttachOutcome::Cancelled { polls });
            }

            polls += 1;
            if self.attacher.poll(host.as_ref())? == AttachState::Attached {
                info!(polls, "attached to host editor");
                return Ok(AttachOutcome::Attached { polls });
            }

            debug!(polls, interval_ms = self.interval.as_millis() as u64, "host editor not ready");
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancelled(&mut shutdown) => {
                    debug!(polls, "attachment loop shut down");
                    return Ok(AttachOutcome::Cancelled { polls });
                }
            }
        }
    }

    /// Run on a tokio task; sending `true` on the returned sender stops it
    pub fn spawn(self, host: Arc<dyn EditorHost>) -> (JoinHandle<Result<AttachOutcome>>, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(self.run(host, shutdown_rx));
        (handle, shutdown_tx)
    }
}

/// Resolves once shutdown is requested
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            // Sender dropped: nobody is left to request a shutdown
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::syntax::builtin;
    use crate::syntax::{PIPELINE_GRAMMAR_ID, SHELL_GRAMMAR_ID};

    fn attacher() -> Attacher {
        let registry = builtin::registry(PIPELINE_GRAMMAR_ID, SHELL_GRAMMAR_ID).unwrap();
        Attacher::new(Arc::new(registry), PIPELINE_GRAMMAR_ID, SHELL_GRAMMAR_ID).unwrap()
    }

    #[test]
    fn test_waits_for_host_and_document() {
        let host = MemoryHost::absent();
        let mut attacher = attacher();

        assert_eq!(attacher.poll(&host).unwrap(), AttachState::Waiting);
        host.load();
        assert_eq!(attacher.poll(&host).unwrap(), AttachState::Waiting);
        assert!(host.registered_languages().is_empty());

        let doc = host.open_document("trigger: none");
        assert_eq!(attacher.poll(&host).unwrap(), AttachState::Attached);
        assert_eq!(attacher.state(), AttachState::Attached);
        assert_eq!(host.document_language(doc), Some(PIPELINE_GRAMMAR_ID.to_string()));
    }

    #[test]
    fn test_setup_installs_grammars_and_configuration() {
        let host = MemoryHost::new();
        host.open_document("steps:");
        let mut attacher = attacher();
        attacher.attach(&host);

        assert_eq!(
            host.registered_languages(),
            vec![SHELL_GRAMMAR_ID.to_string(), PIPELINE_GRAMMAR_ID.to_string()]
        );
        for id in [SHELL_GRAMMAR_ID, PIPELINE_GRAMMAR_ID] {
            assert!(host.has_tokens_provider(id));
            assert_eq!(host.language_configuration(id), Some(LanguageConfiguration::hash_comments()));
        }
    }

    #[test]
    fn test_only_first_existing_document_is_assigned() {
        let host = MemoryHost::new();
        let first = host.open_document("a: 1");
        let second = host.open_document("b: 2");
        attacher().attach(&host);

        assert_eq!(host.document_language(first), Some(PIPELINE_GRAMMAR_ID.to_string()));
        assert_eq!(host.document_language(second), None);
    }

    #[test]
    fn test_attach_twice_installs_one_hook() {
        let host = MemoryHost::new();
        host.open_document("trigger: none");
        let mut attacher = attacher();
        attacher.attach(&host);
        attacher.attach(&host);
        assert_eq!(attacher.poll(&host).unwrap(), AttachState::Attached);

        assert_eq!(host.hook_count(), 1);
        let doc = host.open_document("pool: default");
        let assigned: Vec<_> = host.assignments().into_iter().filter(|(id, _)| *id == doc).collect();
        assert_eq!(assigned, vec![(doc, PIPELINE_GRAMMAR_ID.to_string())]);
    }

    #[test]
    fn test_missing_editor_api_is_error() {
        let host = MemoryHost::without_editor_api();
        let mut attacher = attacher();
        assert!(matches!(attacher.poll(&host), Err(HighlightError::EditorApiUnavailable)));
        assert_eq!(attacher.state(), AttachState::Waiting);
    }

    #[test]
    fn test_unknown_grammar_rejected() {
        let registry = Arc::new(builtin::registry(PIPELINE_GRAMMAR_ID, SHELL_GRAMMAR_ID).unwrap());
        let result = Attacher::new(registry, "azure-yaml", SHELL_GRAMMAR_ID);
        assert!(matches!(result, Err(HighlightError::UnknownGrammar(ref id)) if id == "azure-yaml"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_attaches_once_document_appears() {
        let host = Arc::new(MemoryHost::new());
        let (handle, _shutdown) = AttachLoop::new(attacher(), DEFAULT_POLL_INTERVAL).spawn(host.clone());

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!handle.is_finished());
        assert!(host.registered_languages().is_empty());

        let doc = host.open_document("trigger: none");
        let outcome = handle.await.unwrap().unwrap();
        assert!(matches!(outcome, AttachOutcome::Attached { polls } if polls >= 2));
        assert_eq!(host.document_language(doc), Some(PIPELINE_GRAMMAR_ID.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_on_shutdown() {
        let host = Arc::new(MemoryHost::absent());
        let (handle, shutdown) = AttachLoop::new(attacher(), DEFAULT_POLL_INTERVAL).spawn(host.clone());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        shutdown.send(true).unwrap();

        let outcome = handle.await.unwrap().unwrap();
        assert!(matches!(outcome, AttachOutcome::Cancelled { polls } if polls >= 1));
        assert!(host.registered_languages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_gives_up_without_editor_api() {
        let host = Arc::new(MemoryHost::without_editor_api());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let result = AttachLoop::new(attacher(), DEFAULT_POLL_INTERVAL)
            .run(host.clone(), shutdown_rx)
            .await;
        assert!(matches!(result, Err(HighlightError::EditorApiUnavailable)));
        assert_eq!(host.hook_count(), 0);
    }
}
