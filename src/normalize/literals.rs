//! Literal pass: collect literal values in appearance order.

use crate::sql::tree::{NodeKind, Span, SyntaxNode, SyntaxTree};

/// Literal values found under one node, with the spans to replace.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LiteralScan {
    /// Verbatim literal text, left to right.
    pub literals: Vec<String>,
    /// One span per entry in `literals`.
    pub spans: Vec<Span>,
}

/// Depth-first, left-to-right walk recording every literal (and every
/// quoted identifier used as a value). Literal nodes are terminal.
pub fn scan_literals(tree: &SyntaxTree, node: &SyntaxNode) -> LiteralScan {
    let mut scan = LiteralScan::default();
    visit(tree, node, &mut scan);
    scan
}

fn visit(tree: &SyntaxTree, node: &SyntaxNode, scan: &mut LiteralScan) {
    match node.kind() {
        NodeKind::Literal | NodeKind::QuotedIdentifier => {
            scan.literals.push(tree.node_text(node).to_string());
            scan.spans.push(node.span());
        }
        NodeKind::SelectStmt | NodeKind::SelectCore | NodeKind::Parameter | NodeKind::Clause(_) => {
            for child in node.children() {
                visit(tree, child, scan);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::Parser;

    #[test]
    fn literals_in_appearance_order_with_duplicates() {
        let tree =
            Parser::parse_select("SELECT * FROM t WHERE a = 5 AND b = 'x' AND c = 5").unwrap();
        let scan = scan_literals(&tree, tree.root());
        assert_eq!(scan.literals, vec!["5", "'x'", "5"]);
        assert_eq!(scan.spans.len(), 3);
        assert!(scan.spans.windows(2).all(|w| w[0].end <= w[1].start));
    }

    #[test]
    fn literals_inside_subqueries_are_included() {
        let tree = Parser::parse_select(
            "SELECT a FROM t WHERE b = 1 AND c IN (SELECT d FROM u WHERE e = 'q') LIMIT 3",
        )
        .unwrap();
        let scan = scan_literals(&tree, tree.root());
        assert_eq!(scan.literals, vec!["1", "'q'", "3"]);
    }

    #[test]
    fn parameters_are_not_literals() {
        let tree = Parser::parse_select("SELECT a FROM t WHERE b = ? AND c = :name").unwrap();
        assert!(scan_literals(&tree, tree.root()).literals.is_empty());
    }
}
