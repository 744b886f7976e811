use crate::container::{container_of, for_each_with_container, Container};
use crate::diagnostics::collect_diagnostics;
use crate::document::Document;
use crate::fuzzy::FuzzyMatcher;
use crate::parser;
use crate::symbol::{Binding, BindingTable, Location};
use crate::syntax::{Node, Point, SyntaxKind, SyntaxTree};
use crate::walker;
use lsp_types::{Diagnostic, SymbolKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// The identifier under a cursor, with the container it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub kind: SyntaxKind,
    pub text: String,
    pub container: Container,
}

impl Word {
    pub fn new(kind: SyntaxKind, text: impl Into<String>, container: Container) -> Self {
        Self {
            kind,
            text: text.into(),
            container,
        }
    }

    pub fn container_name(&self) -> String {
        self.container.to_string()
    }

    /// Dotted names such as `.util.log` live in the global namespace.
    pub fn is_global_style(&self) -> bool {
        self.kind == SyntaxKind::GlobalIdentifier
    }

    /// Global-style and file-scope words are visible across the workspace.
    pub fn is_workspace_visible(&self) -> bool {
        self.is_global_style() || self.container.is_global()
    }
}

/// Everything the index keeps for one uri, replaced as a unit.
#[derive(Debug, Clone)]
struct IndexedFile {
    document: Document,
    tree: SyntaxTree,
    bindings: BindingTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerStats {
    pub file_count: usize,
    pub binding_count: usize,
}

/// Workspace-wide structural index of q files.
///
/// Each analyzed uri owns one syntax tree, one content snapshot and one
/// binding table. All queries are read-only; `analyze` and `remove` are the
/// only mutations and replace a uri's entry wholesale.
#[derive(Debug, Default)]
pub struct Analyzer {
    files: BTreeMap<String, IndexedFile>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text`, replace everything indexed for `uri`, and return the
    /// syntax diagnostics of the new content.
    pub fn analyze(&mut self, uri: &str, text: &str) -> Vec<Diagnostic> {
        let version = self
            .files
            .get(uri)
            .map_or(1, |file| file.document.version() + 1);
        self.analyze_document(Document::new(uri, text, version))
    }

    /// Like [`Analyzer::analyze`], keeping the version the editor supplied.
    pub fn analyze_document(&mut self, document: Document) -> Vec<Diagnostic> {
        let tree = parser::parse(document.text());
        let bindings = collect_bindings(document.uri(), &tree);
        let diagnostics = collect_diagnostics(&tree);

        debug!(
            "Analyzed {} (version {}): {} bindings, {} diagnostics",
            document.uri(),
            document.version(),
            bindings.len(),
            diagnostics.len()
        );

        self.files.insert(
            document.uri().to_string(),
            IndexedFile {
                document,
                tree,
                bindings,
            },
        );
        diagnostics
    }

    /// Forget everything about `uri`. Returns whether it was indexed.
    pub fn remove(&mut self, uri: &str) -> bool {
        let removed = self.files.remove(uri).is_some();
        if removed {
            info!("Removed {} from the index", uri);
        }
        removed
    }

    /// Definition locations for `word`. Workspace-visible words are looked
    /// up in every file; local words only in `uri`, within the same container.
    pub fn find_definition(&self, word: &Word, uri: &str) -> Vec<Location> {
        if word.is_workspace_visible() {
            return self
                .files
                .values()
                .flat_map(|file| file.bindings.get(&word.text))
                .map(|binding| binding.location.clone())
                .collect();
        }

        self.files
            .get(uri)
            .map(|file| {
                file.bindings
                    .get(&word.text)
                    .iter()
                    .filter(|binding| binding.container == word.container)
                    .map(|binding| binding.location.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every binding and use of `word`, with the same scope policy as
    /// [`Analyzer::find_definition`].
    pub fn find_references(&self, word: &Word, uri: &str) -> Vec<Location> {
        if word.is_workspace_visible() {
            return self
                .files
                .iter()
                .flat_map(|(file_uri, file)| {
                    name_occurrences(&file.tree, &word.text)
                        .into_iter()
                        .map(move |node| Location::new(file_uri.as_str(), node.range()))
                })
                .collect();
        }
        self.find_syn_node_locations(uri, word)
    }

    /// Binding and reference nodes for `word` in one file, restricted to the
    /// word's container unless the word is workspace-visible.
    pub fn find_syn_nodes(&self, uri: &str, word: &Word) -> Vec<Node<'_>> {
        let Some(file) = self.files.get(uri) else {
            return Vec::new();
        };
        if word.is_workspace_visible() {
            return name_occurrences(&file.tree, &word.text);
        }
        let mut nodes = Vec::new();
        for_each_with_container(&file.tree, uri, |node, container| {
            if container != &word.container {
                return;
            }
            if let Some(occurrence) = name_occurrence(node, &word.text) {
                nodes.push(occurrence);
            }
        });
        nodes
    }

    pub fn find_syn_node_locations(&self, uri: &str, word: &Word) -> Vec<Location> {
        self.find_syn_nodes(uri, word)
            .into_iter()
            .map(|node| Location::new(uri, node.range()))
            .collect()
    }

    /// Every node of `kind` in one file, unfiltered.
    pub fn find_syn_node_by_type(&self, uri: &str, kind: SyntaxKind) -> Vec<Node<'_>> {
        let Some(file) = self.files.get(uri) else {
            return Vec::new();
        };
        let mut nodes = Vec::new();
        walker::for_each(file.tree.root_node(), |node| {
            if node.kind() == kind && !node.is_missing() {
                nodes.push(node);
            }
        });
        nodes
    }

    /// Fuzzy, case-sensitive search over every binding name in the workspace.
    pub fn search(&self, query: &str) -> Vec<&Binding> {
        FuzzyMatcher::new(self.all_bindings(), binding_name).search(query)
    }

    pub fn find_symbols_for_file(&self, uri: &str) -> Vec<&Binding> {
        self.files
            .get(uri)
            .map(|file| file.bindings.symbols())
            .unwrap_or_default()
    }

    /// Bindings whose name equals `word`, or starts with it when `exact_match`
    /// is false.
    pub fn find_symbols_matching_word(&self, exact_match: bool, word: &str) -> Vec<&Binding> {
        self.files
            .values()
            .flat_map(|file| file.bindings.iter())
            .filter(|(name, _)| {
                if exact_match {
                    *name == word
                } else {
                    name.starts_with(word)
                }
            })
            .flat_map(|(_, bindings)| bindings)
            .collect()
    }

    /// The leaf token at a zero-based line and byte column.
    pub fn word_at_point(&self, uri: &str, line: usize, column: usize) -> Option<Word> {
        let file = self.files.get(uri)?;
        let node = file
            .tree
            .root_node()
            .descendant_for_position(Point::new(line, column));

        if node.child_count() > 0 {
            return None;
        }
        let text = node.text().trim();
        if text.is_empty() {
            return None;
        }

        Some(Word::new(node.kind(), text, container_of(node, uri)))
    }

    pub fn get_all_variable_symbols(&self) -> Vec<&Binding> {
        self.all_bindings()
            .filter(|binding| binding.kind == SymbolKind::VARIABLE)
            .collect()
    }

    fn all_bindings(&self) -> impl Iterator<Item = &Binding> {
        self.files
            .values()
            .flat_map(|file| file.bindings.symbols())
    }

    pub fn document(&self, uri: &str) -> Option<&Document> {
        self.files.get(uri).map(|file| &file.document)
    }

    pub fn content(&self, uri: &str) -> Option<&str> {
        self.document(uri).map(Document::text)
    }

    pub fn tree(&self, uri: &str) -> Option<&SyntaxTree> {
        self.files.get(uri).map(|file| &file.tree)
    }

    pub fn bindings(&self, uri: &str) -> Option<&BindingTable> {
        self.files.get(uri).map(|file| &file.bindings)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.files.contains_key(uri)
    }

    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn stats(&self) -> AnalyzerStats {
        AnalyzerStats {
            file_count: self.files.len(),
            binding_count: self.files.values().map(|f| f.bindings.len()).sum(),
        }
    }
}

fn binding_name(binding: &Binding) -> &str {
    &binding.name
}

fn collect_bindings(uri: &str, tree: &SyntaxTree) -> BindingTable {
    let mut table = BindingTable::default();
    for_each_with_container(tree, uri, |node, container| {
        if !walker::is_definition(node) {
            return;
        }
        let Some(target) = walker::binding_target(node) else {
            return;
        };
        let name = target.text().trim();
        if name.is_empty() {
            return;
        }
        table.insert(Binding {
            name: name.to_string(),
            // only variable, may change to function/variable later
            kind: SymbolKind::VARIABLE,
            location: Location::new(uri, node.range()),
            container: container.clone(),
        });
    });
    table
}

/// Name nodes in `tree` spelling `name`: the target of each definition and
/// every other identifier use.
fn name_occurrences<'tree>(tree: &'tree SyntaxTree, name: &str) -> Vec<Node<'tree>> {
    let mut nodes = Vec::new();
    walker::for_each(tree.root_node(), |node| {
        if let Some(occurrence) = name_occurrence(node, name) {
            nodes.push(occurrence);
        }
    });
    nodes
}

/// The name node `node` contributes for `name`, if any. A definition
/// contributes its target, which sits in the same container as the
/// definition itself.
fn name_occurrence<'tree>(node: Node<'tree>, name: &str) -> Option<Node<'tree>> {
    let occurrence = if walker::is_definition(node) {
        walker::binding_target(node)
    } else if walker::is_reference(node) && !walker::is_binding_target(node) {
        Some(node)
    } else {
        None
    };
    occurrence.filter(|occurrence| occurrence.text().trim() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "file:///a.q";

    #[test]
    fn test_word_at_point() {
        let mut analyzer = Analyzer::new();
        analyzer.analyze(URI, "f:{[x] y:x+1; y}");

        let word = analyzer.word_at_point(URI, 0, 14).expect("y at column 14");
        assert_eq!(word.text, "y");
        assert_eq!(word.kind, SyntaxKind::LocalIdentifier);
        assert_eq!(word.container, Container::Named("f".into()));

        let word = analyzer.word_at_point(URI, 0, 0).expect("f at column 0");
        assert_eq!(word.text, "f");
        assert_eq!(word.container, Container::Global);
    }

    #[test]
    fn test_word_at_point_end_of_token() {
        let mut analyzer = Analyzer::new();
        analyzer.analyze(URI, "abc");
        let word = analyzer.word_at_point(URI, 0, 3).expect("cursor right after abc");
        assert_eq!(word.text, "abc");
    }

    #[test]
    fn test_word_at_point_misses() {
        let mut analyzer = Analyzer::new();
        analyzer.analyze(URI, "a:1\n\nb:2");
        assert!(analyzer.word_at_point(URI, 1, 0).is_none());
        assert!(analyzer.word_at_point(URI, 40, 0).is_none());
        assert!(analyzer.word_at_point("file:///other.q", 0, 0).is_none());
    }

    #[test]
    fn test_analyze_bumps_version() {
        let mut analyzer = Analyzer::new();
        analyzer.analyze(URI, "a:1");
        analyzer.analyze(URI, "a:2");
        assert_eq!(analyzer.document(URI).map(Document::version), Some(2));
        assert_eq!(analyzer.content(URI), Some("a:2"));
    }

    #[test]
    fn test_references_skip_duplicate_binding_targets() {
        let mut analyzer = Analyzer::new();
        analyzer.analyze(URI, "a:1\nb:a+a");
        let word = Word::new(SyntaxKind::LocalIdentifier, "a", Container::Global);
        assert_eq!(analyzer.find_references(&word, URI).len(), 3);
    }
}
