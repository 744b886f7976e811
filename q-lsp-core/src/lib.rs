pub mod analyzer;
pub mod container;
pub mod diagnostics;
pub mod document;
pub mod fuzzy;
mod lexer;
pub mod parser;
pub mod symbol;
pub mod syntax;
pub mod walker;
pub mod workspace;

pub use analyzer::{Analyzer, AnalyzerStats, Word};
pub use container::{container_of, Container};
pub use diagnostics::collect_diagnostics;
pub use document::Document;
pub use parser::parse;
pub use symbol::{Binding, BindingTable, Location};
pub use syntax::{Node, Point, SyntaxKind, SyntaxTree};
pub use workspace::{IndexError, DEFAULT_GLOB_PATTERN};
