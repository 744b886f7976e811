use q_lsp_core::{Analyzer, Document};

/// Test: Document snapshot
/// Purpose: Verify the stored text, size and line count
#[test]
fn test_document_snapshot() {
    let document = Document::new("file:///a.q", "a:1\nb:2\n", 3);

    assert_eq!(document.uri(), "file:///a.q");
    assert_eq!(document.text(), "a:1\nb:2\n");
    assert_eq!(document.version(), 3);
    assert_eq!(document.size(), 8);
    assert_eq!(document.line_count(), 2);
}

/// Test: Empty document
/// Purpose: Empty text is a valid snapshot
#[test]
fn test_empty_document() {
    let document = Document::new("file:///empty.q", "", 1);
    assert_eq!(document.size(), 0);
    assert_eq!(document.line_count(), 0);
}

/// Test: Editor versions
/// Purpose: analyze_document keeps the version supplied by the client
#[test]
fn test_analyze_document_keeps_version() {
    let mut analyzer = Analyzer::new();

    analyzer.analyze_document(Document::new("file:///a.q", "a:1", 7));
    assert_eq!(analyzer.document("file:///a.q").map(Document::version), Some(7));

    // A plain analyze continues from the stored version
    analyzer.analyze("file:///a.q", "a:2");
    assert_eq!(analyzer.document("file:///a.q").map(Document::version), Some(8));
}

/// Test: Unicode content
/// Purpose: Multi-byte text survives analysis and is returned verbatim
#[test]
fn test_unicode_content() {
    let text = "s:\"h\u{00e9}llo \u{1f600}\"\nt:s";
    let mut analyzer = Analyzer::new();

    let diagnostics = analyzer.analyze("file:///u.q", text);

    assert!(diagnostics.is_empty());
    assert_eq!(analyzer.content("file:///u.q"), Some(text));
    assert_eq!(analyzer.find_symbols_for_file("file:///u.q").len(), 2);
}

/// Test: Serialization
/// Purpose: Documents round-trip through JSON unchanged
#[test]
fn test_document_serde() {
    let document = Document::new("file:///a.q", "f:{x}", 2);
    let json = serde_json::to_string(&document).unwrap();
    let back: Document = serde_json::from_str(&json).unwrap();
    assert_eq!(back, document);
}
