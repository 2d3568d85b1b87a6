//! Nesting limits.
//!
//! Parsing and normalization recurse over the statement, so unbounded
//! nesting would exhaust the thread's stack and abort the process. Input
//! past these limits is rejected with an error instead.

/// Maximum nesting of expressions, subqueries and parenthesised FROM items
/// the parser accepts.
///
/// SQLite allows 1000. Each level costs a dozen parser frames here, so the
/// bound is kept well inside a default 2 MiB thread stack.
pub const MAX_EXPR_DEPTH: usize = 64;

/// Maximum node depth of a syntax tree the normalizer accepts.
///
/// One expression level nests at most a handful of nodes (one per operator
/// precedence tier), so every tree the parser can produce fits.
pub const MAX_TREE_DEPTH: usize = MAX_EXPR_DEPTH * 16;
