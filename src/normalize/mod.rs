//! # Normalization engine
//!
//! Turns a SELECT syntax tree into a structural fingerprint. Two statements
//! that differ only in literal values (or in the length of an `IN` value
//! list) produce the same [`NormalizationResult::normalized_text`], which is
//! what the plan cache keys on.
//!
//! Normalization runs four passes over the tree:
//!
//! 1. [`literals`]: record literal text in appearance order and mark each
//!    literal span.
//! 2. [`subqueries`]: find nested SELECT cores; normalize each *leaf* core
//!    (one with no SELECT beneath it) on its own and mask every nested
//!    statement in the outer text.
//! 3. [`render::substitute`]: render the root's tokens with each marked
//!    span replaced by a single `?`.
//! 4. [`render::collapse_lists`]: fold `IN ( ? , ? , ... )` into `IN ( ? )`.
//!
//! Rendering also canonicalizes whitespace and keyword case, so the result
//! is stable under reformatting and normalizing the normalized text again
//! is a no-op.

pub mod literals;
pub mod render;
pub mod subqueries;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, ShapeError};
use crate::limits::MAX_TREE_DEPTH;
use crate::sql::parser::Parser;
use crate::sql::tree::{NodeKind, Span, SyntaxNode, SyntaxTree};

pub use render::PLACEHOLDER;

/// The fingerprint of one SELECT, with the values it abstracted away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationResult {
    /// Canonical text with literals and nested SELECTs replaced by `?`.
    pub normalized_text: String,
    /// Raw literal text in left-to-right source order, duplicates kept.
    /// Includes literals inside subqueries.
    pub literals: Vec<String>,
    /// One entry per innermost nested SELECT, left to right. Entries never
    /// have leaf subqueries of their own.
    pub leaf_subqueries: Vec<NormalizationResult>,
}

impl NormalizationResult {
    /// The cache key for this statement.
    pub fn fingerprint(&self) -> &str {
        &self.normalized_text
    }

    pub fn has_subqueries(&self) -> bool {
        !self.leaf_subqueries.is_empty()
    }
}

/// Stateless normalization engine; safe to share across threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Normalizer
    }

    /// Parse and normalize a single SELECT statement.
    pub fn normalize_sql(&self, sql: &str) -> Result<NormalizationResult> {
        let tree = Parser::parse_select(sql)?;
        self.normalize(&tree)
    }

    /// Normalize the tree's root statement.
    pub fn normalize(&self, tree: &SyntaxTree) -> Result<NormalizationResult> {
        self.normalize_node(tree, tree.root())
    }

    /// Normalize any SELECT statement or core within `tree`, treating it as
    /// the outermost SELECT. This is how a composite subquery that was
    /// masked in its parent gets its own fingerprint.
    pub fn normalize_node(&self, tree: &SyntaxTree, node: &SyntaxNode) -> Result<NormalizationResult> {
        validate(tree, node)?;
        self.run(tree, node)
    }

    fn run(&self, tree: &SyntaxTree, node: &SyntaxNode) -> Result<NormalizationResult> {
        let literal_scan = literals::scan_literals(tree, node);
        let subquery_scan = subqueries::classify_subqueries(node, |leaf| self.run(tree, leaf))?;

        let mut marks = literal_scan.spans;
        marks.extend(subquery_scan.masked);
        let fragments = render::substitute(tree, node.span(), &mut marks);
        let normalized_text = render::join(&render::collapse_lists(fragments));

        trace!(
            normalized = %normalized_text,
            literals = literal_scan.literals.len(),
            leaves = subquery_scan.leaves.len(),
            "normalized select"
        );

        Ok(NormalizationResult {
            normalized_text,
            literals: literal_scan.literals,
            leaf_subqueries: subquery_scan.leaves,
        })
    }
}

/// Reject trees the passes cannot interpret. Runs before any pass so that
/// a failure never yields a partial result.
fn validate(tree: &SyntaxTree, root: &SyntaxNode) -> Result<()> {
    match root.kind() {
        NodeKind::SelectStmt | NodeKind::SelectCore => {}
        other => {
            return Err(ShapeError::malformed(format!(
                "root must be a SELECT, found {other:?}"
            )))
        }
    }
    if root.span().is_empty() {
        return Err(ShapeError::malformed("SELECT root has an empty span"));
    }
    validate_node(root, Span::new(0, tree.token_count()))
}

/// Walks with an explicit stack so a hand-built tree of any depth is
/// rejected rather than overflowing.
fn validate_node(root: &SyntaxNode, bounds: Span) -> Result<()> {
    let mut stack = vec![(root, bounds, 1usize)];
    while let Some((node, parent, depth)) = stack.pop() {
        if depth > MAX_TREE_DEPTH {
            return Err(ShapeError::malformed(format!(
                "tree nests deeper than {MAX_TREE_DEPTH} nodes"
            )));
        }
        let span = node.span();
        if span.start > span.end {
            return Err(ShapeError::malformed(format!("inverted span {span}")));
        }
        if !parent.contains(&span) {
            return Err(ShapeError::malformed(format!(
                "{:?} span {span} escapes enclosing span {parent}",
                node.kind()
            )));
        }
        if matches!(node.kind(), NodeKind::Literal | NodeKind::QuotedIdentifier) && span.is_empty() {
            return Err(ShapeError::malformed(format!(
                "{:?} node at {span} has an empty span",
                node.kind()
            )));
        }

        let mut cursor = span.start;
        for child in node.children() {
            if child.span().start < cursor {
                return Err(ShapeError::malformed(format!(
                    "child span {} overlaps its previous sibling",
                    child.span()
                )));
            }
            cursor = child.span().end;
        }
        stack.extend(node.children().iter().rev().map(|child| (child, span, depth + 1)));
    }
    Ok(())
}
