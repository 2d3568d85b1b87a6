//! Concrete syntax tree for SELECT statements.
//!
//! A [`SyntaxTree`] owns the source text and its lexemes; every
//! [`SyntaxNode`] refers back into them through a token [`Span`]. Nodes do
//! not own tokens: any token inside a node's span that is not covered by a
//! child belongs to the node itself (keywords, punctuation, names). This is
//! all the normalizer needs to re-render a statement with parts of it
//! substituted.

use std::fmt;
use std::sync::Arc;

use crate::sql::lexer::{Lexeme, Token};

/// A half-open range `start..end` of token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `other` lies entirely within this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Grammar productions that carry no meaning for normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
    /// `WITH name AS (...)`
    CommonTableExpr,
    ResultColumn,
    From,
    /// A single table, subquery or parenthesised join in FROM.
    TableRef,
    /// `ON expr` or `USING (cols)`.
    JoinConstraint,
    /// Any composite expression: binary/unary operators, parentheses,
    /// BETWEEN, LIKE, IS, qualified column references.
    Expr,
    /// The parenthesised right-hand side of `IN`.
    InList,
    FunctionCall,
    Case,
    Cast,
    OrderingTerm,
    Limit,
}

/// The closed set of node kinds produced by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A full SELECT statement: optional CTEs, one or more cores joined by
    /// compound operators, then ORDER BY and LIMIT.
    SelectStmt,
    /// `SELECT ... FROM ... WHERE ... GROUP BY ... HAVING ...`
    SelectCore,
    /// A number, string, blob, `NULL`, `TRUE` or `FALSE` in value position.
    Literal,
    /// A double-quoted name used where a value is expected.
    QuotedIdentifier,
    /// A bound parameter such as `?` or `:name`.
    Parameter,
    Clause(Clause),
}

/// A node in the concrete syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: NodeKind,
    span: Span,
    children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        SyntaxNode {
            kind,
            span,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, span: Span, children: Vec<SyntaxNode>) -> Self {
        SyntaxNode {
            kind,
            span,
            children,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn children(&self) -> &[SyntaxNode] {
        &self.children
    }

    pub fn is_select_core(&self) -> bool {
        self.kind == NodeKind::SelectCore
    }

    /// Whether any node strictly below this one is a SELECT core.
    pub fn has_select_core_descendant(&self) -> bool {
        self.children
            .iter()
            .any(|c| c.is_select_core() || c.has_select_core_descendant())
    }

    /// All SELECT cores in this subtree (including `self`), in pre-order.
    pub fn select_cores(&self) -> Vec<&SyntaxNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_select_core() {
                out.push(node);
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

/// A parsed statement: shared source and lexemes plus the root node.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: Arc<str>,
    lexemes: Arc<[Lexeme]>,
    root: SyntaxNode,
}

impl SyntaxTree {
    /// Assemble a tree from externally produced parts.
    ///
    /// No consistency checks happen here; the normalizer validates spans
    /// before it reads anything.
    pub fn from_parts(source: Arc<str>, lexemes: Arc<[Lexeme]>, root: SyntaxNode) -> Self {
        SyntaxTree {
            source,
            lexemes,
            root,
        }
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Number of addressable tokens (the trailing EOF sentinel excluded).
    pub fn token_count(&self) -> usize {
        match self.lexemes.last() {
            Some(last) if last.token == Token::Eof => self.lexemes.len() - 1,
            _ => self.lexemes.len(),
        }
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.lexemes.get(index).map(|l| &l.token)
    }

    /// The verbatim source text of one token.
    pub fn token_text(&self, index: usize) -> &str {
        self.lexemes
            .get(index)
            .and_then(|l| self.source.get(l.start..l.end))
            .unwrap_or("")
    }

    /// The spelling of one token as it appears in a fingerprint: keywords
    /// upper-cased, operators in one spelling, parameters as `?`, and
    /// everything else verbatim.
    pub fn canonical_text(&self, index: usize) -> &str {
        match self.lexemes.get(index).and_then(|l| l.token.canonical()) {
            Some(text) => text,
            None => self.token_text(index),
        }
    }

    /// The verbatim source slice covered by `node`.
    pub fn node_text(&self, node: &SyntaxNode) -> &str {
        let span = node.span();
        if span.is_empty() {
            return "";
        }
        let (Some(first), Some(last)) = (self.lexemes.get(span.start), self.lexemes.get(span.end - 1))
        else {
            return "";
        };
        self.source.get(first.start..last.end).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::lexer::Lexer;

    fn tree_of(sql: &str, root: SyntaxNode) -> SyntaxTree {
        let lexemes = Lexer::new(sql).tokenize().unwrap();
        SyntaxTree::from_parts(Arc::from(sql), Arc::from(lexemes), root)
    }

    #[test]
    fn span_containment() {
        let outer = Span::new(2, 10);
        assert!(outer.contains(&Span::new(2, 10)));
        assert!(outer.contains(&Span::new(4, 5)));
        assert!(!outer.contains(&Span::new(1, 5)));
        assert!(!outer.contains(&Span::new(9, 11)));
        assert!(Span::new(3, 3).is_empty());
        assert_eq!(Span::new(3, 7).len(), 4);
    }

    #[test]
    fn node_text_is_verbatim_and_canonical_text_is_not() {
        let sql = "select  a FROM t where b = 'X'";
        let root = SyntaxNode::new(NodeKind::SelectCore, Span::new(0, 8));
        let tree = tree_of(sql, root);
        assert_eq!(tree.token_count(), 8);
        assert_eq!(tree.node_text(tree.root()), sql);
        assert_eq!(tree.token_text(0), "select");
        assert_eq!(tree.canonical_text(0), "SELECT");
        assert_eq!(tree.canonical_text(1), "a");
        assert_eq!(tree.canonical_text(7), "'X'");
    }

    #[test]
    fn select_core_queries() {
        let inner = SyntaxNode::new(NodeKind::SelectCore, Span::new(3, 5));
        let expr = SyntaxNode::with_children(
            NodeKind::Clause(Clause::Expr),
            Span::new(2, 6),
            vec![inner],
        );
        let outer = SyntaxNode::with_children(NodeKind::SelectCore, Span::new(0, 6), vec![expr]);
        assert!(outer.has_select_core_descendant());
        assert!(!outer.children()[0].children()[0].has_select_core_descendant());
        let cores = outer.select_cores();
        assert_eq!(cores.len(), 2);
        assert_eq!(cores[0].span(), Span::new(0, 6));
        assert_eq!(cores[1].span(), Span::new(3, 5));
    }
}
