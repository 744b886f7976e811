use crate::config::ServerConfig;
use lsp_types::*;
use q_lsp_core::{Analyzer, Document};
use q_lsp_protocol::handlers::Handlers;
use q_lsp_protocol::line_index::LineIndex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

pub struct QLanguageServer {
    client: Client,
    analyzer: Arc<RwLock<Analyzer>>,
    handlers: Handlers,
    config: ServerConfig,
    dynamic_watch_registration: AtomicBool,
}

impl QLanguageServer {
    pub fn new(client: Client, config: ServerConfig) -> Self {
        info!("Initializing language server");

        let analyzer = Arc::new(RwLock::new(Analyzer::new()));
        Self {
            client,
            handlers: Handlers::new(analyzer.clone()),
            analyzer,
            config,
            dynamic_watch_registration: AtomicBool::new(false),
        }
    }

    pub fn analyzer(&self) -> &Arc<RwLock<Analyzer>> {
        &self.analyzer
    }

    /// Build the workspace index off the async runtime and install it.
    async fn index_workspace(&self, root: PathBuf) {
        let glob = self.config.glob.clone();
        let result = tokio::task::spawn_blocking(move || Analyzer::from_root(&root, &glob)).await;

        match result {
            Ok(Ok(analyzer)) => {
                let stats = analyzer.stats();
                info!(
                    "Workspace indexed: {} files, {} bindings",
                    stats.file_count, stats.binding_count
                );
                *self.analyzer.write().await = analyzer;
            }
            Ok(Err(e)) => error!("Failed to index workspace: {}", e),
            Err(e) => error!("Workspace indexing task failed: {}", e),
        }
    }

    async fn analyze_and_publish(&self, uri: Url, text: String, version: i32) {
        let diagnostics = {
            let mut analyzer = self.analyzer.write().await;
            analyzer.analyze_document(Document::new(uri.as_str(), text.as_str(), version))
        };
        let diagnostics = LineIndex::new(&text).to_lsp_diagnostics(diagnostics);
        info!("Found {} diagnostics for document: {}", diagnostics.len(), uri);
        self.client
            .publish_diagnostics(uri, diagnostics, Some(version))
            .await;
    }

    async fn reload_from_disk(&self, uri: Url) {
        let Ok(path) = uri.to_file_path() else {
            warn!("Ignoring change to non-file uri {}", uri);
            return;
        };
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                let diagnostics = self.analyzer.write().await.analyze(uri.as_str(), &text);
                let diagnostics = LineIndex::new(&text).to_lsp_diagnostics(diagnostics);
                self.client.publish_diagnostics(uri, diagnostics, None).await;
            }
            Err(e) => warn!("Failed analyzing {}. Error: {}", uri, e),
        }
    }
}

fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    let from_folders = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| &folder.uri);

    let root_uri = params.root_uri.as_ref().or(from_folders);
    if let Some(path) = root_uri.and_then(|uri| uri.to_file_path().ok()) {
        return Some(path);
    }

    #[allow(deprecated)]
    let root_path = params.root_path.as_ref().map(PathBuf::from);
    root_path
}

pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![".".to_string()]),
            ..Default::default()
        }),
        definition_provider: Some(OneOf::Left(true)),
        references_provider: Some(OneOf::Left(true)),
        document_highlight_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        workspace_symbol_provider: Some(OneOf::Left(true)),
        ..Default::default()
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for QLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Initialize request received");

        let dynamic_watch = params
            .capabilities
            .workspace
            .as_ref()
            .and_then(|workspace| workspace.did_change_watched_files.as_ref())
            .and_then(|watch| watch.dynamic_registration)
            .unwrap_or(false);
        self.dynamic_watch_registration
            .store(dynamic_watch, Ordering::Relaxed);

        match workspace_root(&params) {
            Some(root) => self.index_workspace(root).await,
            None => warn!("No workspace root given; only opened documents will be analyzed"),
        }

        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: "q-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("Server initialized");

        if !self.dynamic_watch_registration.load(Ordering::Relaxed) {
            return;
        }
        let options = DidChangeWatchedFilesRegistrationOptions {
            watchers: vec![FileSystemWatcher {
                glob_pattern: GlobPattern::String(self.config.glob.clone()),
                kind: None,
            }],
        };
        let registration = Registration {
            id: "q-lsp-watched-files".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: serde_json::to_value(options).ok(),
        };
        if let Err(e) = self.client.register_capability(vec![registration]).await {
            warn!("Failed to register file watcher: {}", e);
        }
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutdown request received");
        Ok(())
    }

    // Document synchronization
    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        info!("Document opened: {}", params.text_document.uri);

        let document = params.text_document;
        self.analyze_and_publish(document.uri, document.text, document.version)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        info!("Document changed: {} (version {})", uri, version);

        // Full sync: the last change carries the whole text.
        let Some(change) = params.content_changes.into_iter().last() else {
            debug!("Change notification for {} carried no content", uri);
            return;
        };
        self.analyze_and_publish(uri, change.text, version).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        // The file still exists on disk, so its index entry stays.
        info!("Document closed: {}", params.text_document.uri);
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        for change in params.changes {
            debug!("Watched file {:?}: {}", change.typ, change.uri);
            match change.typ {
                FileChangeType::DELETED => {
                    self.analyzer.write().await.remove(change.uri.as_str());
                    self.client
                        .publish_diagnostics(change.uri, Vec::new(), None)
                        .await;
                }
                FileChangeType::CREATED | FileChangeType::CHANGED => {
                    self.reload_from_disk(change.uri).await;
                }
                other => warn!("Unknown file change type {:?} for {}", other, change.uri),
            }
        }
    }

    // Language features
    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        self.handlers.hover(params).await
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        self.handlers.completion(params).await
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        self.handlers.goto_definition(params).await
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        self.handlers.find_references(params).await
    }

    async fn document_highlight(
        &self,
        params: DocumentHighlightParams,
    ) -> Result<Option<Vec<DocumentHighlight>>> {
        self.handlers.document_highlight(params).await
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        self.handlers.document_symbols(params).await
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        self.handlers.workspace_symbols(params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_prefers_root_uri() {
        #[allow(deprecated)]
        let params = InitializeParams {
            root_uri: Some(Url::parse("file:///work/project").unwrap()),
            root_path: Some("/elsewhere".to_string()),
            ..Default::default()
        };
        assert_eq!(workspace_root(&params), Some(PathBuf::from("/work/project")));
    }

    #[test]
    fn test_workspace_root_from_folders() {
        let params = InitializeParams {
            workspace_folders: Some(vec![WorkspaceFolder {
                uri: Url::parse("file:///work/folder").unwrap(),
                name: "folder".to_string(),
            }]),
            ..Default::default()
        };
        assert_eq!(workspace_root(&params), Some(PathBuf::from("/work/folder")));
    }

    #[test]
    fn test_workspace_root_missing() {
        assert_eq!(workspace_root(&InitializeParams::default()), None);
    }

    #[test]
    fn test_capabilities() {
        let capabilities = server_capabilities();
        assert_eq!(
            capabilities.text_document_sync,
            Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL))
        );
        assert_eq!(capabilities.references_provider, Some(OneOf::Left(true)));
        assert_eq!(
            capabilities.workspace_symbol_provider,
            Some(OneOf::Left(true))
        );
    }
}
