use lsp_types::*;

/// Builders for the LSP messages exercised by the server tests
pub struct LspTestClient;

impl LspTestClient {
    /// Create an initialize request rooted at `root_uri`
    pub fn create_initialize_request(root_uri: &str) -> InitializeParams {
        let root = Url::parse(root_uri).ok();
        InitializeParams {
            process_id: Some(1234),
            root_uri: root.clone(),
            capabilities: ClientCapabilities {
                workspace: Some(WorkspaceClientCapabilities {
                    did_change_watched_files: Some(DidChangeWatchedFilesClientCapabilities {
                        dynamic_registration: Some(false),
                        relative_pattern_support: None,
                    }),
                    symbol: Some(WorkspaceSymbolClientCapabilities::default()),
                    workspace_folders: Some(true),
                    ..Default::default()
                }),
                text_document: Some(TextDocumentClientCapabilities {
                    synchronization: Some(TextDocumentSyncClientCapabilities::default()),
                    completion: Some(CompletionClientCapabilities::default()),
                    hover: Some(HoverClientCapabilities {
                        dynamic_registration: Some(false),
                        content_format: Some(vec![MarkupKind::Markdown, MarkupKind::PlainText]),
                    }),
                    definition: Some(GotoCapability::default()),
                    references: Some(DynamicRegistrationClientCapabilities::default()),
                    document_highlight: Some(DynamicRegistrationClientCapabilities::default()),
                    document_symbol: Some(DocumentSymbolClientCapabilities::default()),
                    publish_diagnostics: Some(PublishDiagnosticsClientCapabilities {
                        version_support: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            workspace_folders: root.map(|uri| {
                vec![WorkspaceFolder {
                    uri,
                    name: "test-workspace".to_string(),
                }]
            }),
            client_info: Some(ClientInfo {
                name: "test-client".to_string(),
                version: Some("1.0.0".to_string()),
            }),
            ..Default::default()
        }
    }

    /// Create a document open notification
    pub fn create_did_open_notification(uri: &str, content: &str) -> DidOpenTextDocumentParams {
        DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: Url::parse(uri).unwrap(),
                language_id: "q".to_string(),
                version: 1,
                text: content.to_string(),
            },
        }
    }

    /// Create a full-sync document change notification
    pub fn create_did_change_notification(
        uri: &str,
        version: i32,
        content: &str,
    ) -> DidChangeTextDocumentParams {
        DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: Url::parse(uri).unwrap(),
                version,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: content.to_string(),
            }],
        }
    }

    pub fn create_did_close_notification(uri: &str) -> DidCloseTextDocumentParams {
        DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier {
                uri: Url::parse(uri).unwrap(),
            },
        }
    }

    /// Create a watched-files notification for a single change
    pub fn create_watched_file_change(uri: &str, typ: FileChangeType) -> DidChangeWatchedFilesParams {
        DidChangeWatchedFilesParams {
            changes: vec![FileEvent {
                uri: Url::parse(uri).unwrap(),
                typ,
            }],
        }
    }

    pub fn create_hover_request(uri: &str, line: u32, character: u32) -> HoverParams {
        HoverParams {
            text_document_position_params: Self::position(uri, line, character),
            work_done_progress_params: WorkDoneProgressParams::default(),
        }
    }

    pub fn create_goto_definition_request(
        uri: &str,
        line: u32,
        character: u32,
    ) -> GotoDefinitionParams {
        GotoDefinitionParams {
            text_document_position_params: Self::position(uri, line, character),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        }
    }

    pub fn create_references_request(
        uri: &str,
        line: u32,
        character: u32,
        include_declaration: bool,
    ) -> ReferenceParams {
        ReferenceParams {
            text_document_position: Self::position(uri, line, character),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: ReferenceContext {
                include_declaration,
            },
        }
    }

    pub fn create_workspace_symbol_request(query: &str) -> WorkspaceSymbolParams {
        WorkspaceSymbolParams {
            partial_result_params: PartialResultParams::default(),
            work_done_progress_params: WorkDoneProgressParams::default(),
            query: query.to_string(),
        }
    }

    fn position(uri: &str, line: u32, character: u32) -> TextDocumentPositionParams {
        TextDocumentPositionParams {
            text_document: TextDocumentIdentifier {
                uri: Url::parse(uri).unwrap(),
            },
            position: Position { line, character },
        }
    }
}

/// Create a test q script with file-scope and local bindings
pub fn create_test_q_source() -> &'static str {
    r#"/ trade analytics
\d .stats
.stats.vwap:{[p;s] (sum p*s) % sum s}

trades:([] sym:`a`b`c; px:1 2 3f; sz:100 200 300)

summary:{[t]
  v:.stats.vwap[t`px;t`sz];
  n:count t;
  (v;n)
  }

result:summary trades
"#
}
