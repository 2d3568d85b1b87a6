//! Substitution and collapse passes.

use crate::sql::lexer::Token;
use crate::sql::tree::{Span, SyntaxTree};

/// The placeholder token every masked span renders as.
pub const PLACEHOLDER: &str = "?";

/// One rendered unit of normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    Placeholder,
    Token { token: &'a Token, text: &'a str },
}

impl<'a> Fragment<'a> {
    fn text(&self) -> &'a str {
        match self {
            Fragment::Placeholder => PLACEHOLDER,
            Fragment::Token { text, .. } => *text,
        }
    }

    fn is(&self, expected: &Token) -> bool {
        matches!(self, Fragment::Token { token, .. } if *token == expected)
    }

    /// Source parameters and masked spans are interchangeable here.
    fn is_placeholder(&self) -> bool {
        matches!(self, Fragment::Placeholder) || self.is(&Token::Placeholder)
    }
}

/// Replace every marked span inside `range` with one placeholder at the
/// span's start; copy all other tokens in canonical spelling. Marks nested
/// inside an earlier mark are subsumed by it.
pub fn substitute<'a>(tree: &'a SyntaxTree, range: Span, marks: &mut [Span]) -> Vec<Fragment<'a>> {
    marks.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = Vec::with_capacity(range.len());
    let mut marks = marks.iter().filter(|m| !m.is_empty()).peekable();
    let mut i = range.start;
    while i < range.end {
        while marks.peek().map_or(false, |m| m.end <= i || m.start < i) {
            marks.next();
        }
        match marks.peek().map(|m| (m.start, m.end)) {
            Some((start, end)) if start == i => {
                out.push(Fragment::Placeholder);
                i = end;
                marks.next();
            }
            _ => {
                if let Some(token) = tree.token(i) {
                    out.push(Fragment::Token {
                        token,
                        text: tree.canonical_text(i),
                    });
                }
                i += 1;
            }
        }
    }
    out
}

/// Collapse every `IN ( ? , ? , ... )` list to `IN ( ? )`.
///
/// The element count of a value list is a literal detail: a one-element
/// and a ten-element list produce the same fingerprint.
pub fn collapse_lists(fragments: Vec<Fragment<'_>>) -> Vec<Fragment<'_>> {
    let mut out = Vec::with_capacity(fragments.len());
    let mut i = 0;
    while i < fragments.len() {
        if fragments[i].is(&Token::In) {
            if let Some(end) = placeholder_list_end(&fragments, i + 1) {
                out.push(fragments[i]);
                out.push(fragments[i + 1]);
                out.push(Fragment::Placeholder);
                out.push(fragments[end]);
                i = end + 1;
                continue;
            }
        }
        out.push(fragments[i]);
        i += 1;
    }
    out
}

/// If `fragments[open..]` reads `( ? (, ?)* )`, the index of the `)`.
fn placeholder_list_end(fragments: &[Fragment<'_>], open: usize) -> Option<usize> {
    if !fragments.get(open)?.is(&Token::LeftParen) {
        return None;
    }
    let mut i = open + 1;
    loop {
        if !fragments.get(i)?.is_placeholder() {
            return None;
        }
        i += 1;
        let next = fragments.get(i)?;
        if next.is(&Token::RightParen) {
            return Some(i);
        }
        if !next.is(&Token::Comma) {
            return None;
        }
        i += 1;
    }
}

/// Join fragments with single spaces, except around `.`.
pub fn join(fragments: &[Fragment<'_>]) -> String {
    let mut out = String::new();
    let mut glue = false;
    for fragment in fragments {
        let is_dot = fragment.is(&Token::Dot);
        if !out.is_empty() && !glue && !is_dot {
            out.push(' ');
        }
        out.push_str(fragment.text());
        glue = is_dot;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::Parser;

    fn render(sql: &str, marks: &mut [Span]) -> String {
        let tree = Parser::parse_select(sql).unwrap();
        let range = tree.root().span();
        join(&collapse_lists(substitute(&tree, range, marks)))
    }

    #[test]
    fn unmarked_text_is_canonicalized() {
        let mut marks: [Span; 0] = [];
        assert_eq!(
            render("select  a.b,\n c FROM t   where x != :p", &mut marks),
            "SELECT a.b , c FROM t WHERE x <> ?"
        );
    }

    #[test]
    fn marked_spans_become_one_placeholder() {
        // SELECT a FROM t WHERE b = 'long' || 'x'
        //   0    1  2   3   4    5 6   7     8   9
        let mut marks = [Span::new(9, 10), Span::new(7, 10)];
        assert_eq!(
            render("SELECT a FROM t WHERE b = 'long' || 'x'", &mut marks),
            "SELECT a FROM t WHERE b = ?"
        );
    }

    #[test]
    fn in_lists_collapse_regardless_of_length() {
        let mut one = [Span::new(8, 9)];
        let mut three = [Span::new(8, 9), Span::new(10, 11), Span::new(12, 13)];
        let a = render("SELECT * FROM t WHERE id IN (7)", &mut one);
        let b = render("SELECT * FROM t WHERE id IN (1, 2, 3)", &mut three);
        assert_eq!(a, "SELECT * FROM t WHERE id IN ( ? )");
        assert_eq!(a, b);
    }

    #[test]
    fn mixed_lists_and_function_arguments_are_kept() {
        let mut marks = [Span::new(8, 9)];
        assert_eq!(
            render("SELECT * FROM t WHERE id IN (1, c)", &mut marks),
            "SELECT * FROM t WHERE id IN ( ? , c )"
        );
        let mut marks = [Span::new(3, 4), Span::new(5, 6)];
        assert_eq!(
            render("SELECT substr(1, 2) FROM t", &mut marks),
            "SELECT substr ( ? , ? ) FROM t"
        );
    }
}
