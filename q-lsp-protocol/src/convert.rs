//! Translation between analyzer results and `lsp_types` values.

use crate::line_index::LineIndex;
use anyhow::{Context, Result};
use lsp_types::{Location, Range, SymbolInformation, Url};
use q_lsp_core::{Analyzer, Binding, Location as CoreLocation};
use std::collections::HashMap;
use tracing::warn;

pub fn parse_uri(uri: &str) -> Result<Url> {
    Url::parse(uri).with_context(|| format!("invalid document uri {uri:?}"))
}

/// Converts analyzer ranges to editor ranges using the indexed content of
/// each file they point into. Line indexes are built once per file.
pub struct LspConverter<'a> {
    analyzer: &'a Analyzer,
    indexes: HashMap<&'a str, LineIndex<'a>>,
}

impl<'a> LspConverter<'a> {
    pub fn new(analyzer: &'a Analyzer) -> Self {
        Self {
            analyzer,
            indexes: HashMap::new(),
        }
    }

    /// Ranges in files the analyzer does not hold are passed through.
    pub fn range(&mut self, uri: &str, range: Range) -> Range {
        let analyzer = self.analyzer;
        let Some(document) = analyzer.document(uri) else {
            return range;
        };
        self.indexes
            .entry(document.uri())
            .or_insert_with(|| LineIndex::new(document.text()))
            .to_lsp_range(range)
    }

    pub fn location(&mut self, location: &CoreLocation) -> Option<Location> {
        match parse_uri(&location.uri) {
            Ok(uri) => Some(Location::new(uri, self.range(&location.uri, location.range))),
            Err(e) => {
                warn!("Skipping location: {:#}", e);
                None
            }
        }
    }

    /// Convert every location whose uri parses; the rest are logged and dropped.
    pub fn locations<'l>(
        &mut self,
        locations: impl IntoIterator<Item = &'l CoreLocation>,
    ) -> Vec<Location> {
        locations
            .into_iter()
            .filter_map(|location| self.location(location))
            .collect()
    }

    pub fn symbol_information(&mut self, binding: &Binding) -> Option<SymbolInformation> {
        let location = self.location(&binding.location)?;
        let container_name = binding.container_name();

        #[allow(deprecated)]
        Some(SymbolInformation {
            name: binding.name.clone(),
            kind: binding.kind,
            tags: None,
            deprecated: None,
            location,
            container_name: (!container_name.is_empty()).then_some(container_name),
        })
    }
}
