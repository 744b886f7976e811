use crate::builtins::{builtins_with_prefix, find_builtin};
use crate::convert::LspConverter;
use crate::line_index::LineIndex;
use lsp_types::*;
use q_lsp_core::{container_of, Analyzer, Container, SyntaxKind, Word};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tracing::debug;

pub struct Handlers {
    analyzer: Arc<RwLock<Analyzer>>,
}

impl Handlers {
    pub fn new(analyzer: Arc<RwLock<Analyzer>>) -> Self {
        Self { analyzer }
    }

    pub fn analyzer(&self) -> &Arc<RwLock<Analyzer>> {
        &self.analyzer
    }

    pub async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = &params.text_document_position_params;
        let uri = position.text_document.uri.as_str();
        let analyzer = self.analyzer.read().await;

        let word = word_at(&analyzer, uri, position.position);
        log_request("hover", position.position, word.as_ref());
        let Some(word) = word else {
            return Ok(None);
        };

        if let Some(builtin) = find_builtin(&word.text) {
            return Ok(Some(markdown_hover(format!(
                "```q\n{}\n```\n{}",
                builtin.signature, builtin.detail
            ))));
        }

        let definitions = analyzer.find_definition(&word, uri);
        if definitions.is_empty() {
            return Ok(None);
        }

        let mut value = String::new();
        for definition in &definitions {
            let line = analyzer
                .content(&definition.uri)
                .and_then(|text| text.lines().nth(definition.range.start.line as usize))
                .unwrap_or(word.text.as_str());
            let scope = match &word.container {
                _ if word.is_global_style() => "global".to_string(),
                Container::Global => "global".to_string(),
                container => format!("in `{container}`"),
            };
            value.push_str(&format!(
                "```q\n{}\n```\n{} ({}:{})\n\n",
                line.trim(),
                scope,
                definition.uri,
                definition.range.start.line + 1
            ));
        }
        Ok(Some(markdown_hover(value.trim_end().to_string())))
    }

    pub async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = &params.text_document_position;
        let uri = position.text_document.uri.as_str();
        let analyzer = self.analyzer.read().await;

        // The cursor usually sits right after the partial word, possibly
        // touching the next token.
        let word = word_at(&analyzer, uri, position.position)
            .filter(|word| word.kind.is_identifier())
            .or_else(|| {
                let character = position.position.character.checked_sub(1)?;
                word_at(&analyzer, uri, Position::new(position.position.line, character))
                    .filter(|word| word.kind.is_identifier())
            });
        log_request("completion", position.position, word.as_ref());
        let prefix = word.as_ref().map_or("", |word| word.text.as_str());

        let mut seen = HashSet::new();
        let mut items = Vec::new();

        // Locals used in the same container
        if let Some(word) = &word {
            for node in analyzer.find_syn_node_by_type(uri, SyntaxKind::LocalIdentifier) {
                let text = node.text();
                if text == prefix || !text.starts_with(prefix) {
                    continue;
                }
                if container_of(node, uri) != word.container {
                    continue;
                }
                if seen.insert(text.to_string()) {
                    items.push(CompletionItem {
                        label: text.to_string(),
                        kind: Some(CompletionItemKind::VARIABLE),
                        detail: Some(word.container_name()).filter(|name| !name.is_empty()),
                        ..Default::default()
                    });
                }
            }
        }

        // Bindings visible from here
        let container = word.as_ref().map(|word| &word.container);
        for binding in analyzer.find_symbols_matching_word(false, prefix) {
            let visible = binding.container.is_global()
                || binding.name.starts_with('.')
                || (Some(&binding.container) == container && binding.location.uri == uri);
            if !visible || binding.name == prefix {
                continue;
            }
            if seen.insert(binding.name.clone()) {
                let container_name = binding.container_name();
                items.push(CompletionItem {
                    label: binding.name.clone(),
                    kind: Some(CompletionItemKind::VARIABLE),
                    detail: Some(container_name).filter(|name| !name.is_empty()),
                    ..Default::default()
                });
            }
        }

        for builtin in builtins_with_prefix(prefix) {
            if seen.insert(builtin.name.to_string()) {
                items.push(CompletionItem {
                    label: builtin.name.to_string(),
                    kind: Some(CompletionItemKind::KEYWORD),
                    detail: Some(builtin.signature.to_string()),
                    documentation: Some(Documentation::String(builtin.detail.to_string())),
                    ..Default::default()
                });
            }
        }

        debug!("completion: {} items for prefix {:?}", items.len(), prefix);
        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }

    pub async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position = &params.text_document_position_params;
        let uri = position.text_document.uri.as_str();
        let analyzer = self.analyzer.read().await;

        let word = word_at(&analyzer, uri, position.position);
        log_request("definition", position.position, word.as_ref());
        let Some(word) = word else {
            return Ok(None);
        };

        let locations = LspConverter::new(&analyzer).locations(&analyzer.find_definition(&word, uri));
        if locations.is_empty() {
            Ok(None)
        } else {
            Ok(Some(GotoDefinitionResponse::Array(locations)))
        }
    }

    pub async fn find_references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let position = &params.text_document_position;
        let uri = position.text_document.uri.as_str();
        let analyzer = self.analyzer.read().await;

        let word = word_at(&analyzer, uri, position.position);
        log_request("references", position.position, word.as_ref());
        let Some(word) = word else {
            return Ok(None);
        };

        let mut references = analyzer.find_references(&word, uri);
        if !params.context.include_declaration {
            // A binding's range starts at its name.
            let definitions = analyzer.find_definition(&word, uri);
            references.retain(|reference| {
                !definitions.iter().any(|definition| {
                    definition.uri == reference.uri
                        && definition.range.start == reference.range.start
                })
            });
        }

        let locations = LspConverter::new(&analyzer).locations(&references);
        if locations.is_empty() {
            Ok(None)
        } else {
            Ok(Some(locations))
        }
    }

    pub async fn document_highlight(
        &self,
        params: DocumentHighlightParams,
    ) -> Result<Option<Vec<DocumentHighlight>>> {
        let position = &params.text_document_position_params;
        let uri = position.text_document.uri.as_str();
        let analyzer = self.analyzer.read().await;

        let word = word_at(&analyzer, uri, position.position);
        log_request("documentHighlight", position.position, word.as_ref());
        let Some(word) = word else {
            return Ok(None);
        };

        let written: Vec<Position> = analyzer
            .find_definition(&word, uri)
            .into_iter()
            .filter(|definition| definition.uri == uri)
            .map(|definition| definition.range.start)
            .collect();

        let mut converter = LspConverter::new(&analyzer);
        let highlights: Vec<DocumentHighlight> = analyzer
            .find_syn_node_locations(uri, &word)
            .into_iter()
            .map(|location| DocumentHighlight {
                kind: Some(if written.contains(&location.range.start) {
                    DocumentHighlightKind::WRITE
                } else {
                    DocumentHighlightKind::READ
                }),
                range: converter.range(uri, location.range),
            })
            .collect();

        if highlights.is_empty() {
            Ok(None)
        } else {
            Ok(Some(highlights))
        }
    }

    pub async fn document_symbols(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri.as_str();
        debug!("Handling document symbol request for {}", uri);

        let analyzer = self.analyzer.read().await;
        let mut converter = LspConverter::new(&analyzer);
        let symbols: Vec<SymbolInformation> = analyzer
            .find_symbols_for_file(uri)
            .into_iter()
            .filter_map(|binding| converter.symbol_information(binding))
            .collect();

        if symbols.is_empty() {
            debug!("No symbols found in file {}", uri);
            Ok(None)
        } else {
            Ok(Some(DocumentSymbolResponse::Flat(symbols)))
        }
    }

    pub async fn workspace_symbols(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        debug!("Handling workspace symbol request for {:?}", params.query);

        let analyzer = self.analyzer.read().await;
        let mut converter = LspConverter::new(&analyzer);
        let symbols: Vec<SymbolInformation> = analyzer
            .search(&params.query)
            .into_iter()
            .filter_map(|binding| converter.symbol_information(binding))
            .collect();

        if symbols.is_empty() {
            Ok(None)
        } else {
            Ok(Some(symbols))
        }
    }
}

/// The word under an editor position, which counts UTF-16 units.
fn word_at(analyzer: &Analyzer, uri: &str, position: Position) -> Option<Word> {
    let position = LineIndex::new(analyzer.content(uri)?).to_byte_position(position);
    analyzer.word_at_point(uri, position.line as usize, position.character as usize)
}

fn log_request(request: &str, position: Position, word: Option<&Word>) {
    let word = word
        .and_then(|word| serde_json::to_string(word).ok())
        .unwrap_or_else(|| "null".to_string());
    debug!(
        "{} {}:{} word={}",
        request, position.line, position.character, word
    );
}

fn markdown_hover(value: String) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: None,
    }
}
