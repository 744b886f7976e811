use crate::container::Container;
use lsp_types::{Range, SymbolKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A range inside an indexed file. The uri is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

impl Location {
    pub fn new(uri: impl Into<String>, range: Range) -> Self {
        Self {
            uri: uri.into(),
            range,
        }
    }
}

/// A definition occurrence recorded in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    pub kind: SymbolKind,
    pub location: Location,
    pub container: Container,
}

impl Binding {
    /// Container as shown to clients; empty for file scope.
    pub fn container_name(&self) -> String {
        self.container.to_string()
    }
}

/// Per-file mapping from name to every definition of that name, in source
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingTable {
    by_name: BTreeMap<String, Vec<Binding>>,
}

impl BindingTable {
    pub fn insert(&mut self, binding: Binding) {
        self.by_name
            .entry(binding.name.clone())
            .or_default()
            .push(binding);
    }

    pub fn get(&self, name: &str) -> &[Binding] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Binding])> {
        self.by_name
            .iter()
            .map(|(name, bindings)| (name.as_str(), bindings.as_slice()))
    }

    /// Every binding, ordered by where it starts in the file.
    pub fn symbols(&self) -> Vec<&Binding> {
        let mut symbols: Vec<&Binding> = self.by_name.values().flatten().collect();
        symbols.sort_by_key(|b| (b.location.range.start.line, b.location.range.start.character));
        symbols
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::Position;

    fn binding(name: &str, line: u32) -> Binding {
        Binding {
            name: name.to_string(),
            kind: SymbolKind::VARIABLE,
            location: Location::new(
                "file:///a.q",
                Range::new(Position::new(line, 0), Position::new(line, 3)),
            ),
            container: Container::Global,
        }
    }

    #[test]
    fn test_redefinitions_append() {
        let mut table = BindingTable::default();
        table.insert(binding("a", 0));
        table.insert(binding("b", 1));
        table.insert(binding("a", 2));

        let lines: Vec<u32> = table
            .get("a")
            .iter()
            .map(|b| b.location.range.start.line)
            .collect();
        assert_eq!(lines, vec![0, 2]);
        assert_eq!(table.len(), 3);
        assert!(table.get("missing").is_empty());
    }

    #[test]
    fn test_symbols_follow_source_order() {
        let mut table = BindingTable::default();
        table.insert(binding("z", 0));
        table.insert(binding("a", 1));
        table.insert(binding("z", 2));

        let names: Vec<&str> = table.symbols().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "z"]);
    }
}
