//! Subquery classification pass.
//!
//! Every SELECT core below the outermost one is either a *leaf* (no SELECT
//! core beneath it) or *composite*. Leaves are normalized on their own and
//! reported in order of first encounter; the whole of every nested
//! statement is masked in the outer text. Extraction walks the entire
//! subtree first, so leaves inside a masked composite are still found.

use crate::error::Result;
use crate::normalize::NormalizationResult;
use crate::sql::tree::{NodeKind, Span, SyntaxNode};

/// Output of the classification pass for one root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubqueryScan {
    pub leaves: Vec<NormalizationResult>,
    /// Spans to replace by a single placeholder in the outer text.
    pub masked: Vec<Span>,
}

/// Classify the SELECT cores under `root`.
///
/// `normalize_leaf` is called once per leaf core, left to right; the first
/// error aborts the scan.
pub fn classify_subqueries<F>(root: &SyntaxNode, mut normalize_leaf: F) -> Result<SubqueryScan>
where
    F: FnMut(&SyntaxNode) -> Result<NormalizationResult>,
{
    let mut scan = SubqueryScan::default();
    match root.kind() {
        NodeKind::SelectStmt => {
            for child in root.children() {
                // Compound arms of the root statement are all outermost.
                let outermost = child.is_select_core();
                visit(child, outermost, &mut scan, &mut normalize_leaf)?;
            }
        }
        _ => visit(root, true, &mut scan, &mut normalize_leaf)?,
    }
    Ok(scan)
}

fn visit<F>(
    node: &SyntaxNode,
    outermost: bool,
    scan: &mut SubqueryScan,
    normalize_leaf: &mut F,
) -> Result<()>
where
    F: FnMut(&SyntaxNode) -> Result<NormalizationResult>,
{
    match node.kind() {
        NodeKind::SelectCore if outermost => visit_children(node, scan, normalize_leaf),
        NodeKind::SelectCore => {
            scan.masked.push(node.span());
            if node.has_select_core_descendant() {
                visit_children(node, scan, normalize_leaf)
            } else {
                scan.leaves.push(normalize_leaf(node)?);
                Ok(())
            }
        }
        // A nested statement reads as one placeholder, compound arms,
        // ORDER BY and LIMIT included.
        NodeKind::SelectStmt => {
            scan.masked.push(node.span());
            visit_children(node, scan, normalize_leaf)
        }
        NodeKind::Literal | NodeKind::QuotedIdentifier | NodeKind::Parameter => Ok(()),
        NodeKind::Clause(_) => visit_children(node, scan, normalize_leaf),
    }
}

fn visit_children<F>(node: &SyntaxNode, scan: &mut SubqueryScan, normalize_leaf: &mut F) -> Result<()>
where
    F: FnMut(&SyntaxNode) -> Result<NormalizationResult>,
{
    for child in node.children() {
        visit(child, false, scan, normalize_leaf)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShapeError;
    use crate::sql::parser::Parser;
    use crate::sql::tree::SyntaxTree;

    fn leaf_texts(tree: &SyntaxTree) -> (Vec<String>, usize) {
        let scan = classify_subqueries(tree.root(), |leaf| {
            Ok(NormalizationResult {
                normalized_text: tree.node_text(leaf).to_string(),
                literals: vec![],
                leaf_subqueries: vec![],
            })
        })
        .unwrap();
        let texts = scan.leaves.into_iter().map(|r| r.normalized_text).collect();
        (texts, scan.masked.len())
    }

    #[test]
    fn flat_select_has_no_subqueries() {
        let tree = Parser::parse_select("SELECT a FROM t WHERE b = 1").unwrap();
        assert_eq!(leaf_texts(&tree), (vec![], 0));
    }

    #[test]
    fn only_innermost_select_is_a_leaf() {
        let tree = Parser::parse_select(
            "SELECT * FROM a WHERE x IN (SELECT y FROM b WHERE z IN (SELECT w FROM c))",
        )
        .unwrap();
        let (leaves, masked) = leaf_texts(&tree);
        assert_eq!(leaves, vec!["SELECT w FROM c"]);
        // Two nested statements and two nested cores.
        assert_eq!(masked, 4);
    }

    #[test]
    fn sibling_leaves_in_left_to_right_order() {
        let tree = Parser::parse_select(
            "SELECT (SELECT max(p) FROM q), r FROM (SELECT r FROM s) AS t \
             WHERE EXISTS (SELECT 1 FROM u)",
        )
        .unwrap();
        let (leaves, _) = leaf_texts(&tree);
        assert_eq!(
            leaves,
            vec!["SELECT max(p) FROM q", "SELECT r FROM s", "SELECT 1 FROM u"]
        );
    }

    #[test]
    fn compound_arms_of_the_root_are_outermost() {
        let tree =
            Parser::parse_select("SELECT a FROM t UNION SELECT b FROM u EXCEPT SELECT c FROM v")
                .unwrap();
        assert_eq!(leaf_texts(&tree), (vec![], 0));
    }

    #[test]
    fn cte_bodies_are_nested() {
        let tree =
            Parser::parse_select("WITH c AS (SELECT id FROM o) SELECT * FROM c").unwrap();
        let (leaves, _) = leaf_texts(&tree);
        assert_eq!(leaves, vec!["SELECT id FROM o"]);
    }

    #[test]
    fn leaf_error_aborts_the_scan() {
        let tree = Parser::parse_select("SELECT * FROM a WHERE x IN (SELECT y FROM b)").unwrap();
        let result = classify_subqueries(tree.root(), |_| Err(ShapeError::malformed("boom")));
        assert!(matches!(result, Err(ShapeError::MalformedTree(_))));
    }
}
