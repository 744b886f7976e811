use lsp_types::*;
use q_lsp_core::Analyzer;
use q_lsp_protocol::handlers::Handlers;
use std::sync::Arc;
use tokio::sync::RwLock;

const A: &str = "file:///workspace/a.q";
const B: &str = "file:///workspace/b.q";

/// Create handlers over an analyzer holding the given documents
fn create_handlers(documents: &[(&str, &str)]) -> Handlers {
    let mut analyzer = Analyzer::new();
    for (uri, text) in documents {
        analyzer.analyze(uri, text);
    }
    Handlers::new(Arc::new(RwLock::new(analyzer)))
}

fn default_handlers() -> Handlers {
    create_handlers(&[
        (A, "f:{[x] y:x+1; y}\ng:{1+1}"),
        (B, "r:g[]\ns:count til 3"),
    ])
}

fn position_params(uri: &str, line: u32, character: u32) -> TextDocumentPositionParams {
    TextDocumentPositionParams {
        text_document: TextDocumentIdentifier {
            uri: Url::parse(uri).unwrap(),
        },
        position: Position { line, character },
    }
}

fn hover_params(uri: &str, line: u32, character: u32) -> HoverParams {
    HoverParams {
        text_document_position_params: position_params(uri, line, character),
        work_done_progress_params: WorkDoneProgressParams::default(),
    }
}

fn reference_params(uri: &str, line: u32, character: u32, include_declaration: bool) -> ReferenceParams {
    ReferenceParams {
        text_document_position: position_params(uri, line, character),
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
        context: ReferenceContext {
            include_declaration,
        },
    }
}

fn completion_params(uri: &str, line: u32, character: u32) -> CompletionParams {
    CompletionParams {
        text_document_position: position_params(uri, line, character),
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
        context: None,
    }
}

fn hover_text(hover: Hover) -> String {
    match hover.contents {
        HoverContents::Markup(markup) => markup.value,
        other => panic!("expected markup hover, got {:?}", other),
    }
}

fn labels(response: CompletionResponse) -> Vec<String> {
    match response {
        CompletionResponse::Array(items) => items.into_iter().map(|item| item.label).collect(),
        CompletionResponse::List(list) => list.items.into_iter().map(|item| item.label).collect(),
    }
}

/// Test: textDocument/hover
/// Purpose: Hovering a use shows the defining line and where it lives
#[tokio::test]
async fn test_hover_definition() {
    let handlers = default_handlers();

    // LSP Request: Hover over "g" in b.q
    let response = handlers.hover(hover_params(B, 0, 2)).await.unwrap();

    // Expected Response: the binding from a.q
    let text = hover_text(response.expect("g should resolve"));
    assert!(text.contains("g:{1+1}"), "{text}");
    assert!(text.contains("global (file:///workspace/a.q:2)"), "{text}");
}

/// Test: textDocument/hover on a local
/// Purpose: Locals are described with their container
#[tokio::test]
async fn test_hover_local() {
    let handlers = default_handlers();

    let response = handlers.hover(hover_params(A, 0, 14)).await.unwrap();

    let text = hover_text(response.expect("y should resolve"));
    assert!(text.contains("in `f`"), "{text}");
}

/// Test: textDocument/hover on a keyword
/// Purpose: Built-in keywords show their reference entry
#[tokio::test]
async fn test_hover_builtin() {
    let handlers = default_handlers();

    let response = handlers.hover(hover_params(B, 1, 3)).await.unwrap();

    let text = hover_text(response.expect("count is a built-in"));
    assert!(text.contains("count x"));
    assert!(text.contains("number of items"));
}

/// Test: textDocument/hover with nothing under the cursor
/// Purpose: Whitespace and unknown files give no hover
#[tokio::test]
async fn test_hover_nothing() {
    let handlers = default_handlers();

    assert!(handlers.hover(hover_params(B, 5, 0)).await.unwrap().is_none());
    assert!(handlers
        .hover(hover_params("file:///workspace/missing.q", 0, 0))
        .await
        .unwrap()
        .is_none());
}

/// Test: textDocument/definition
/// Purpose: A file-scope name jumps to its binding in another file
#[tokio::test]
async fn test_goto_definition() {
    let handlers = default_handlers();

    let request = GotoDefinitionParams {
        text_document_position_params: position_params(B, 0, 2),
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
    };
    let response = handlers.goto_definition(request).await.unwrap();

    match response {
        Some(GotoDefinitionResponse::Array(locations)) => {
            assert_eq!(locations.len(), 1);
            assert_eq!(locations[0].uri.as_str(), A);
            assert_eq!(locations[0].range.start, Position::new(1, 0));
        }
        other => panic!("unexpected definition response {:?}", other),
    }
}

/// Test: textDocument/references
/// Purpose: include_declaration controls whether the binding is returned
#[tokio::test]
async fn test_find_references() {
    let handlers = default_handlers();

    let with_declaration = handlers
        .find_references(reference_params(B, 0, 2, true))
        .await
        .unwrap()
        .expect("references for g");
    assert_eq!(with_declaration.len(), 2);

    let without_declaration = handlers
        .find_references(reference_params(B, 0, 2, false))
        .await
        .unwrap()
        .expect("the use in b.q");
    assert_eq!(without_declaration.len(), 1);
    assert_eq!(without_declaration[0].uri.as_str(), B);
}

/// Test: textDocument/documentHighlight
/// Purpose: Occurrences in the same container, binding marked as a write
#[tokio::test]
async fn test_document_highlight() {
    let handlers = default_handlers();

    let request = DocumentHighlightParams {
        text_document_position_params: position_params(A, 0, 14),
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
    };
    let highlights = handlers
        .document_highlight(request)
        .await
        .unwrap()
        .expect("highlights for y");

    let found: Vec<(Position, Option<DocumentHighlightKind>)> = highlights
        .iter()
        .map(|h| (h.range.start, h.kind))
        .collect();
    assert_eq!(
        found,
        vec![
            (Position::new(0, 7), Some(DocumentHighlightKind::WRITE)),
            (Position::new(0, 14), Some(DocumentHighlightKind::READ)),
        ]
    );
}

/// Test: textDocument/documentSymbol
/// Purpose: Every binding in the file, in source order, with containers
#[tokio::test]
async fn test_document_symbols() {
    let handlers = default_handlers();

    let request = DocumentSymbolParams {
        text_document: TextDocumentIdentifier {
            uri: Url::parse(A).unwrap(),
        },
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
    };
    let response = handlers.document_symbols(request).await.unwrap();

    match response {
        Some(DocumentSymbolResponse::Flat(symbols)) => {
            let found: Vec<(&str, Option<&str>)> = symbols
                .iter()
                .map(|s| (s.name.as_str(), s.container_name.as_deref()))
                .collect();
            assert_eq!(found, vec![("f", None), ("y", Some("f")), ("g", None)]);
            assert!(symbols.iter().all(|s| s.kind == SymbolKind::VARIABLE));
        }
        other => panic!("unexpected document symbol response {:?}", other),
    }
}

/// Test: workspace/symbol
/// Purpose: Fuzzy search across every indexed file
#[tokio::test]
async fn test_workspace_symbols() {
    let handlers = default_handlers();

    let request = WorkspaceSymbolParams {
        partial_result_params: PartialResultParams::default(),
        work_done_progress_params: WorkDoneProgressParams::default(),
        query: "g".to_string(),
    };
    let symbols = handlers
        .workspace_symbols(request)
        .await
        .unwrap()
        .expect("g is indexed");

    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name, "g");
    assert_eq!(symbols[0].location.uri.as_str(), A);
}

/// Test: textDocument/completion
/// Purpose: Prefix completion offers visible bindings, not the word itself
#[tokio::test]
async fn test_completion_bindings() {
    let handlers = create_handlers(&[(A, "trade:1\ntradeCount:2\nr:tr"), (B, "tradeLocal:{t:1}")]);

    // LSP Request: completion right after "tr"
    let response = handlers
        .completion(completion_params(A, 2, 4))
        .await
        .unwrap()
        .expect("completion items");

    assert_eq!(labels(response), vec!["trade", "tradeCount", "tradeLocal"]);
}

/// Test: textDocument/completion inside a function
/// Purpose: Locals of other functions are not offered
#[tokio::test]
async fn test_completion_locals() {
    let handlers = create_handlers(&[(A, "f:{total:1; tot}\ng:{totalG:2}")]);

    let response = handlers
        .completion(completion_params(A, 0, 15))
        .await
        .unwrap()
        .expect("completion items");

    assert_eq!(labels(response), vec!["total"]);
}

/// Test: textDocument/completion of keywords
/// Purpose: Built-in keywords are completed by prefix
#[tokio::test]
async fn test_completion_builtins() {
    let handlers = create_handlers(&[(A, "x:ti")]);

    let response = handlers
        .completion(completion_params(A, 0, 4))
        .await
        .unwrap()
        .expect("completion items");

    match response {
        CompletionResponse::Array(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].label, "til");
            assert_eq!(items[0].kind, Some(CompletionItemKind::KEYWORD));
        }
        other => panic!("unexpected completion response {:?}", other),
    }
}

/// Test: Shared analyzer
/// Purpose: Handlers observe updates made through the shared lock
#[test]
fn test_handlers_see_updates() {
    let handlers = create_handlers(&[]);

    tokio_test::block_on(async {
        handlers.analyzer().write().await.analyze(A, "late:1");
        let request = WorkspaceSymbolParams {
            partial_result_params: PartialResultParams::default(),
            work_done_progress_params: WorkDoneProgressParams::default(),
            query: "late".to_string(),
        };
        let symbols = handlers.workspace_symbols(request).await.unwrap();
        assert_eq!(symbols.map(|s| s.len()), Some(1));
    });
}

/// Test: Non-ASCII text before the cursor
/// Purpose: Positions are UTF-16 columns on the way in and on the way out
#[tokio::test]
async fn test_positions_are_utf16() {
    // é takes two bytes but one UTF-16 unit, so `x` on line 1 is at column 6
    let handlers = create_handlers(&[(A, "x:1\ns:\"é\";x")]);

    let request = GotoDefinitionParams {
        text_document_position_params: position_params(A, 1, 6),
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
    };
    match handlers.goto_definition(request).await.unwrap() {
        Some(GotoDefinitionResponse::Array(locations)) => {
            assert_eq!(locations.len(), 1);
            assert_eq!(
                locations[0].range,
                Range::new(Position::new(0, 0), Position::new(0, 3))
            );
        }
        other => panic!("unexpected definition response {:?}", other),
    }

    let references = handlers
        .find_references(reference_params(A, 1, 6, true))
        .await
        .unwrap()
        .expect("references to x");
    let ranges: Vec<Range> = references.iter().map(|l| l.range).collect();
    assert_eq!(
        ranges,
        vec![
            Range::new(Position::new(0, 0), Position::new(0, 1)),
            Range::new(Position::new(1, 6), Position::new(1, 7)),
        ]
    );

    let request = DocumentHighlightParams {
        text_document_position_params: position_params(A, 1, 6),
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
    };
    let highlights = handlers
        .document_highlight(request)
        .await
        .unwrap()
        .expect("highlights for x");
    assert_eq!(highlights.len(), 2);
    assert_eq!(highlights[1].range.start, Position::new(1, 6));
    assert_eq!(highlights[1].kind, Some(DocumentHighlightKind::READ));

    assert!(handlers.hover(hover_params(A, 1, 6)).await.unwrap().is_some());
}
