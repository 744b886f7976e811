// Debug tool to examine the q syntax tree and diagnostics for a file
use anyhow::{Context, Result};
use q_lsp_core::{collect_diagnostics, parse, Node};

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .context("usage: debug_ast <file.q>")?;
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read file: {}", path))?;

    let tree = parse(&source);

    println!("=== Syntax tree ===");
    print_tree(tree.root_node());

    println!("\n=== Diagnostics ===");
    for diagnostic in collect_diagnostics(&tree) {
        println!(
            "{}:{} {:?} {}",
            diagnostic.range.start.line + 1,
            diagnostic.range.start.character + 1,
            diagnostic.severity,
            diagnostic.message
        );
    }

    Ok(())
}

fn print_tree(root: Node) {
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        let indent = "  ".repeat(depth);
        let text = node.text();
        let text_short = if text.len() > 80 {
            let cut = (0..=77).rev().find(|&i| text.is_char_boundary(i)).unwrap_or(0);
            format!("{}...", &text[..cut])
        } else {
            text.to_string()
        };
        let marker = if node.is_missing() { " MISSING" } else { "" };

        println!(
            "{}({}{}) \"{}\"",
            indent,
            node.kind(),
            marker,
            text_short.replace('\n', "\\n").replace('\r', "")
        );

        stack.extend(node.children().rev().map(|child| (child, depth + 1)));
    }
}
