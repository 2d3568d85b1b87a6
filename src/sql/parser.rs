//! Recursive-descent SELECT parser for sqlshape.
//!
//! The entry points are [`Parser::parse_select`] for a single statement and
//! [`Parser::parse_all`] for a semicolon-separated script. Unlike an AST
//! builder, the parser keeps every token in place and records only the
//! structure the normalizer cares about: where SELECT cores begin and end,
//! which tokens are literal values, and how expressions nest.

use std::sync::Arc;

use crate::error::{Result, ShapeError};
use crate::limits::MAX_EXPR_DEPTH;
use crate::sql::lexer::{Lexeme, Lexer, Token};
use crate::sql::tree::{Clause, NodeKind, Span, SyntaxNode, SyntaxTree};

/// A recursive-descent parser that turns a lexeme stream into
/// [`SyntaxNode`]s.
pub struct Parser {
    lexemes: Vec<Lexeme>,
    pos: usize,
    /// Open expressions, statements and parenthesised FROM items.
    depth: usize,
}

impl Parser {
    /// Parse exactly one SELECT statement (a trailing `;` is allowed).
    pub fn parse_select(sql: &str) -> Result<SyntaxTree> {
        let mut trees = Self::parse_all(sql)?;
        if trees.len() > 1 {
            return Err(ShapeError::invalid_sql(format!(
                "expected a single statement, found {}",
                trees.len()
            )));
        }
        trees
            .pop()
            .ok_or_else(|| ShapeError::invalid_sql("empty statement"))
    }

    /// Parse a script of semicolon-separated SELECT statements.
    ///
    /// All returned trees share one copy of the source and lexemes.
    pub fn parse_all(sql: &str) -> Result<Vec<SyntaxTree>> {
        let lexemes = Lexer::new(sql).tokenize()?;
        let mut parser = Parser {
            lexemes,
            pos: 0,
            depth: 0,
        };
        let mut roots = Vec::new();
        loop {
            while parser.current() == &Token::Semicolon {
                parser.advance();
            }
            if parser.current() == &Token::Eof {
                break;
            }
            roots.push(parser.parse_statement()?);
            match parser.current() {
                Token::Semicolon | Token::Eof => {}
                other => {
                    return Err(parser.error(format!(
                        "unexpected {other:?} after end of statement"
                    )))
                }
            }
        }

        let source: Arc<str> = Arc::from(sql);
        let lexemes: Arc<[Lexeme]> = Arc::from(parser.lexemes);
        Ok(roots
            .into_iter()
            .map(|root| SyntaxTree::from_parts(Arc::clone(&source), Arc::clone(&lexemes), root))
            .collect())
    }

    // =======================================================================
    // Token helpers
    // =======================================================================

    fn current(&self) -> &Token {
        self.peek_ahead(0)
    }

    fn peek_ahead(&self, offset: usize) -> &Token {
        self.lexemes
            .get(self.pos + offset)
            .map(|l| &l.token)
            .unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.lexemes.len() && self.current() != &Token::Eof {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        if self.current() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {expected:?}, got {:?}", self.current())))
        }
    }

    /// Consume a bare or quoted name.
    fn expect_name(&mut self) -> Result<()> {
        match self.current() {
            Token::Identifier(_) | Token::QuotedIdentifier(_) => {
                self.advance();
                Ok(())
            }
            other => Err(self.error(format!("expected identifier, got {other:?}"))),
        }
    }

    fn at_select(&self, offset: usize) -> bool {
        matches!(self.peek_ahead(offset), Token::Select | Token::With)
    }

    fn error(&self, msg: String) -> ShapeError {
        let offset = self.lexemes.get(self.pos).map_or(0, |l| l.start);
        ShapeError::InvalidSql(format!("{msg} (at byte {offset})"))
    }

    /// Run `f` one nesting level deeper, failing once the input nests past
    /// [`MAX_EXPR_DEPTH`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_EXPR_DEPTH {
            return Err(self.error("expression nested too deeply".into()));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn node(&self, kind: NodeKind, start: usize, children: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::with_children(kind, Span::new(start, self.pos), children)
    }

    fn clause(&self, clause: Clause, start: usize, children: Vec<SyntaxNode>) -> SyntaxNode {
        self.node(NodeKind::Clause(clause), start, children)
    }

    /// One node for a whole operator chain, so long chains stay shallow.
    fn chain(&self, start: usize, mut operands: Vec<SyntaxNode>) -> SyntaxNode {
        if operands.len() == 1 {
            if let Some(only) = operands.pop() {
                return only;
            }
        }
        self.clause(Clause::Expr, start, operands)
    }

    // =======================================================================
    // Statements
    // =======================================================================

    fn parse_statement(&mut self) -> Result<SyntaxNode> {
        match self.current() {
            Token::Select | Token::With => self.parse_select_stmt(),
            Token::Insert | Token::Update | Token::Delete | Token::Create | Token::Drop
            | Token::Values => Err(self.error(format!(
                "only SELECT statements can be fingerprinted, got {:?}",
                self.current()
            ))),
            other => Err(self.error(format!(
                "unexpected token at start of statement: {other:?}"
            ))),
        }
    }

    fn parse_select_stmt(&mut self) -> Result<SyntaxNode> {
        self.nested(Self::parse_compound_select)
    }

    fn parse_compound_select(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        let mut children = Vec::new();

        if self.current() == &Token::With {
            self.advance();
            if self.current() == &Token::Recursive {
                self.advance();
            }
            children.push(self.parse_cte()?);
            while self.current() == &Token::Comma {
                self.advance();
                children.push(self.parse_cte()?);
            }
        }

        children.push(self.parse_select_core()?);
        loop {
            match self.current() {
                Token::Union => {
                    self.advance();
                    if self.current() == &Token::All {
                        self.advance();
                    }
                }
                Token::Intersect | Token::Except => self.advance(),
                _ => break,
            }
            children.push(self.parse_select_core()?);
        }

        if self.current() == &Token::Order {
            self.advance();
            self.expect(&Token::By)?;
            children.push(self.parse_ordering_term()?);
            while self.current() == &Token::Comma {
                self.advance();
                children.push(self.parse_ordering_term()?);
            }
        }

        if self.current() == &Token::Limit {
            children.push(self.parse_limit()?);
        }

        Ok(self.node(NodeKind::SelectStmt, start, children))
    }

    fn parse_cte(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        self.expect_name()?;
        if self.current() == &Token::LeftParen {
            self.advance();
            self.parse_name_list()?;
            self.expect(&Token::RightParen)?;
        }
        self.expect(&Token::As)?;
        self.expect(&Token::LeftParen)?;
        let body = self.parse_subquery_body()?;
        self.expect(&Token::RightParen)?;
        Ok(self.clause(Clause::CommonTableExpr, start, vec![body]))
    }

    /// The inside of `( ... )` wherever a subquery may appear. A lone
    /// parameter is accepted too, since that is how a masked subquery
    /// reads after normalization.
    fn parse_subquery_body(&mut self) -> Result<SyntaxNode> {
        if self.at_select(0) {
            self.parse_select_stmt()
        } else if self.current() == &Token::Placeholder {
            Ok(self.parse_parameter())
        } else {
            Err(self.error(format!("expected subquery, got {:?}", self.current())))
        }
    }

    fn parse_select_core(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        self.expect(&Token::Select)?;
        if matches!(self.current(), Token::Distinct | Token::All) {
            self.advance();
        }

        let mut children = vec![self.parse_result_column()?];
        while self.current() == &Token::Comma {
            self.advance();
            children.push(self.parse_result_column()?);
        }

        if self.current() == &Token::From {
            self.advance();
            children.push(self.parse_from_clause()?);
        }

        if self.current() == &Token::Where {
            self.advance();
            children.push(self.parse_expr()?);
        }

        if self.current() == &Token::Group {
            self.advance();
            self.expect(&Token::By)?;
            children.extend(self.parse_expr_list()?);
        }

        if self.current() == &Token::Having {
            self.advance();
            children.push(self.parse_expr()?);
        }

        Ok(self.node(NodeKind::SelectCore, start, children))
    }

    fn parse_result_column(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;

        if self.current() == &Token::Star {
            self.advance();
            return Ok(self.clause(Clause::ResultColumn, start, vec![]));
        }

        // table.*
        if matches!(
            self.current(),
            Token::Identifier(_) | Token::QuotedIdentifier(_)
        ) && self.peek_ahead(1) == &Token::Dot
            && self.peek_ahead(2) == &Token::Star
        {
            self.advance();
            self.advance();
            self.advance();
            return Ok(self.clause(Clause::ResultColumn, start, vec![]));
        }

        let expr = self.parse_expr()?;
        self.parse_optional_alias()?;
        Ok(self.clause(Clause::ResultColumn, start, vec![expr]))
    }

    fn parse_optional_alias(&mut self) -> Result<()> {
        match self.current() {
            Token::As => {
                self.advance();
                match self.current() {
                    Token::Identifier(_) | Token::QuotedIdentifier(_) | Token::StringLiteral => {
                        self.advance();
                        Ok(())
                    }
                    other => Err(self.error(format!("expected alias, got {other:?}"))),
                }
            }
            // Clause keywords are lexed as their own tokens, so any bare
            // name here can only be an implicit alias.
            Token::Identifier(_) | Token::QuotedIdentifier(_) => {
                self.advance();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn parse_name_list(&mut self) -> Result<()> {
        self.expect_name()?;
        while self.current() == &Token::Comma {
            self.advance();
            self.expect_name()?;
        }
        Ok(())
    }

    // =======================================================================
    // FROM clause + JOINs
    // =======================================================================

    fn parse_from_clause(&mut self) -> Result<SyntaxNode> {
        self.nested(Self::parse_join_list)
    }

    fn parse_join_list(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        let mut children = vec![self.parse_table_ref()?];

        loop {
            if self.current() == &Token::Comma {
                self.advance();
                children.push(self.parse_table_ref()?);
                continue;
            }
            if !self.at_join_operator() {
                break;
            }
            self.parse_join_operator()?;
            children.push(self.parse_table_ref()?);

            match self.current() {
                Token::On => {
                    let on_start = self.pos;
                    self.advance();
                    let predicate = self.parse_expr()?;
                    children.push(self.clause(Clause::JoinConstraint, on_start, vec![predicate]));
                }
                Token::Using => {
                    let using_start = self.pos;
                    self.advance();
                    self.expect(&Token::LeftParen)?;
                    self.parse_name_list()?;
                    self.expect(&Token::RightParen)?;
                    children.push(self.clause(Clause::JoinConstraint, using_start, vec![]));
                }
                _ => {}
            }
        }

        Ok(self.clause(Clause::From, start, children))
    }

    fn at_join_operator(&self) -> bool {
        matches!(
            self.current(),
            Token::Join
                | Token::Inner
                | Token::Left
                | Token::Right
                | Token::Full
                | Token::Cross
                | Token::Natural
        )
    }

    fn parse_join_operator(&mut self) -> Result<()> {
        if self.current() == &Token::Natural {
            self.advance();
        }
        match self.current() {
            Token::Left | Token::Right | Token::Full => {
                self.advance();
                if self.current() == &Token::Outer {
                    self.advance();
                }
            }
            Token::Inner | Token::Cross => self.advance(),
            _ => {}
        }
        self.expect(&Token::Join)
    }

    fn parse_table_ref(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        let mut children = Vec::new();

        if self.current() == &Token::LeftParen {
            self.advance();
            if self.at_select(0) || self.current() == &Token::Placeholder {
                children.push(self.parse_subquery_body()?);
            } else {
                children.push(self.parse_from_clause()?);
            }
            self.expect(&Token::RightParen)?;
        } else {
            self.expect_name()?;
            if self.current() == &Token::Dot {
                self.advance();
                self.expect_name()?;
            }
            // Table-valued function: name(args)
            if self.current() == &Token::LeftParen {
                self.advance();
                if self.current() != &Token::RightParen {
                    children.extend(self.parse_expr_list()?);
                }
                self.expect(&Token::RightParen)?;
            }
        }

        self.parse_optional_alias()?;
        Ok(self.clause(Clause::TableRef, start, children))
    }

    // =======================================================================
    // ORDER BY / LIMIT
    // =======================================================================

    fn parse_ordering_term(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        let expr = self.parse_expr()?;
        if matches!(self.current(), Token::Asc | Token::Desc) {
            self.advance();
        }
        if let Token::Identifier(word) = self.current() {
            if word.eq_ignore_ascii_case("NULLS") {
                self.advance();
                match self.current() {
                    Token::Identifier(w)
                        if w.eq_ignore_ascii_case("FIRST") || w.eq_ignore_ascii_case("LAST") =>
                    {
                        self.advance();
                    }
                    other => {
                        return Err(self.error(format!("expected FIRST or LAST, got {other:?}")))
                    }
                }
            }
        }
        Ok(self.clause(Clause::OrderingTerm, start, vec![expr]))
    }

    fn parse_limit(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        self.expect(&Token::Limit)?;
        let mut children = vec![self.parse_expr()?];
        if matches!(self.current(), Token::Offset | Token::Comma) {
            self.advance();
            children.push(self.parse_expr()?);
        }
        Ok(self.clause(Clause::Limit, start, children))
    }

    // =======================================================================
    // Expression parser (precedence climbing)
    // =======================================================================
    //
    // Precedence (lowest to highest):
    //   1. OR
    //   2. AND
    //   3. NOT (prefix)
    //   4. IS, BETWEEN, IN, LIKE, GLOB, comparison (=, <>, <, >, <=, >=)
    //   5. Bitwise OR (|)
    //   6. Bitwise AND (&), Shift (<<, >>)
    //   7. Concatenation (||)
    //   8. Addition (+, -)
    //   9. Multiplication (*, /, %)
    //  10. Unary (-, +, ~), postfix COLLATE
    //  11. Primary (literals, columns, function calls, parens, CAST, CASE, etc.)
    //
    // Each tier collects its operands into one node instead of nesting left,
    // so only parentheses, subqueries and CASE/CAST deepen the tree.

    fn parse_expr(&mut self) -> Result<SyntaxNode> {
        self.nested(Self::parse_or_expr)
    }

    fn parse_or_expr(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        let mut operands = vec![self.parse_and_expr()?];
        while self.current() == &Token::Or {
            self.advance();
            operands.push(self.parse_and_expr()?);
        }
        Ok(self.chain(start, operands))
    }

    fn parse_and_expr(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        let mut operands = vec![self.parse_not_expr()?];
        while self.current() == &Token::And {
            self.advance();
            operands.push(self.parse_not_expr()?);
        }
        Ok(self.chain(start, operands))
    }

    fn parse_not_expr(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        let negated = self.current() == &Token::Not;
        while self.current() == &Token::Not {
            self.advance();
        }
        let expr = self.parse_comparison_expr()?;
        if negated {
            Ok(self.clause(Clause::Expr, start, vec![expr]))
        } else {
            Ok(expr)
        }
    }

    fn parse_comparison_expr(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        let mut operands = vec![self.parse_bitor_expr()?];
        let mut predicate = false;

        loop {
            match self.current() {
                Token::Is => {
                    self.advance();
                    if self.current() == &Token::Not {
                        self.advance();
                    }
                    // `IS NULL` is predicate syntax, not a comparison with
                    // a NULL literal.
                    if self.current() == &Token::Null {
                        self.advance();
                    } else {
                        if self.current() == &Token::Distinct {
                            self.advance();
                            self.expect(&Token::From)?;
                        }
                        operands.push(self.parse_bitor_expr()?);
                    }
                }
                Token::Not => match self.peek_ahead(1) {
                    Token::Between | Token::In | Token::Like | Token::Glob => {
                        self.advance(); // NOT
                        self.parse_comparison_suffix(&mut operands)?;
                    }
                    _ => break,
                },
                Token::Between | Token::In | Token::Like | Token::Glob => {
                    self.parse_comparison_suffix(&mut operands)?;
                }
                Token::Eq | Token::NotEq | Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => {
                    self.advance();
                    operands.push(self.parse_bitor_expr()?);
                }
                _ => break,
            }
            predicate = true;
        }

        if predicate {
            Ok(self.clause(Clause::Expr, start, operands))
        } else {
            Ok(self.chain(start, operands))
        }
    }

    /// BETWEEN / IN / LIKE / GLOB with the current token on the operator.
    fn parse_comparison_suffix(&mut self, operands: &mut Vec<SyntaxNode>) -> Result<()> {
        match self.current() {
            Token::Between => {
                self.advance();
                operands.push(self.parse_bitor_expr()?);
                self.expect(&Token::And)?;
                operands.push(self.parse_bitor_expr()?);
            }
            Token::In => {
                self.advance();
                operands.push(self.parse_in_list()?);
            }
            Token::Like | Token::Glob => {
                self.advance();
                operands.push(self.parse_bitor_expr()?);
                if self.current() == &Token::Escape {
                    self.advance();
                    operands.push(self.parse_bitor_expr()?);
                }
            }
            other => {
                return Err(self.error(format!("expected BETWEEN, IN, LIKE or GLOB, got {other:?}")))
            }
        }
        Ok(())
    }

    fn parse_in_list(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        self.expect(&Token::LeftParen)?;
        let children = if self.at_select(0) {
            vec![self.parse_select_stmt()?]
        } else if self.current() == &Token::RightParen {
            vec![]
        } else {
            self.parse_expr_list()?
        };
        self.expect(&Token::RightParen)?;
        Ok(self.clause(Clause::InList, start, children))
    }

    fn parse_bitor_expr(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        let mut operands = vec![self.parse_bitand_expr()?];
        while self.current() == &Token::Pipe {
            self.advance();
            operands.push(self.parse_bitand_expr()?);
        }
        Ok(self.chain(start, operands))
    }

    fn parse_bitand_expr(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        let mut operands = vec![self.parse_concat_expr()?];
        while matches!(
            self.current(),
            Token::Ampersand | Token::ShiftLeft | Token::ShiftRight
        ) {
            self.advance();
            operands.push(self.parse_concat_expr()?);
        }
        Ok(self.chain(start, operands))
    }

    fn parse_concat_expr(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        let mut operands = vec![self.parse_add_expr()?];
        while self.current() == &Token::PipePipe {
            self.advance();
            operands.push(self.parse_add_expr()?);
        }
        Ok(self.chain(start, operands))
    }

    fn parse_add_expr(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        let mut operands = vec![self.parse_mul_expr()?];
        while matches!(self.current(), Token::Plus | Token::Minus) {
            self.advance();
            operands.push(self.parse_mul_expr()?);
        }
        Ok(self.chain(start, operands))
    }

    fn parse_mul_expr(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        let mut operands = vec![self.parse_unary_expr()?];
        while matches!(self.current(), Token::Star | Token::Slash | Token::Percent) {
            self.advance();
            operands.push(self.parse_unary_expr()?);
        }
        Ok(self.chain(start, operands))
    }

    /// Prefix `-`, `+`, `~` and postfix COLLATE. A sign directly before a
    /// number is part of the literal, so `-7` is one value.
    fn parse_unary_expr(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        while matches!(self.current(), Token::Minus | Token::Plus | Token::Tilde) {
            self.advance();
        }

        let mut operand_start = self.pos;
        let signed_number = operand_start > start
            && matches!(
                self.lexemes.get(operand_start - 1).map(|l| &l.token),
                Some(Token::Minus | Token::Plus)
            )
            && self.current() == &Token::NumberLiteral;
        let mut expr = if signed_number {
            operand_start -= 1;
            self.advance();
            self.node(NodeKind::Literal, operand_start, vec![])
        } else {
            self.parse_primary_expr()?
        };

        if self.current() == &Token::Collate {
            while self.current() == &Token::Collate {
                self.advance();
                self.expect_name()?;
            }
            expr = self.clause(Clause::Expr, operand_start, vec![expr]);
        }
        if operand_start > start {
            expr = self.clause(Clause::Expr, start, vec![expr]);
        }
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        match self.current() {
            Token::NumberLiteral
            | Token::StringLiteral
            | Token::BlobLiteral
            | Token::Null
            | Token::True
            | Token::False => {
                self.advance();
                Ok(self.node(NodeKind::Literal, start, vec![]))
            }
            Token::Placeholder => Ok(self.parse_parameter()),
            // Parenthesised expression, row value, or subquery
            Token::LeftParen => {
                self.advance();
                let children = if self.at_select(0) {
                    vec![self.parse_select_stmt()?]
                } else {
                    self.parse_expr_list()?
                };
                self.expect(&Token::RightParen)?;
                Ok(self.clause(Clause::Expr, start, children))
            }
            // CAST(expr AS type)
            Token::Cast => {
                self.advance();
                self.expect(&Token::LeftParen)?;
                let expr = self.parse_expr()?;
                self.expect(&Token::As)?;
                self.parse_type_name()?;
                self.expect(&Token::RightParen)?;
                Ok(self.clause(Clause::Cast, start, vec![expr]))
            }
            // CASE [operand] WHEN ... THEN ... [ELSE ...] END
            Token::Case => {
                self.advance();
                let mut children = Vec::new();
                if self.current() != &Token::When {
                    children.push(self.parse_expr()?);
                }
                if self.current() != &Token::When {
                    return Err(self.error(format!("expected WHEN, got {:?}", self.current())));
                }
                while self.current() == &Token::When {
                    self.advance();
                    children.push(self.parse_expr()?);
                    self.expect(&Token::Then)?;
                    children.push(self.parse_expr()?);
                }
                if self.current() == &Token::Else {
                    self.advance();
                    children.push(self.parse_expr()?);
                }
                self.expect(&Token::End)?;
                Ok(self.clause(Clause::Case, start, children))
            }
            // EXISTS (subquery)
            Token::Exists => {
                self.advance();
                self.expect(&Token::LeftParen)?;
                let body = self.parse_subquery_body()?;
                self.expect(&Token::RightParen)?;
                Ok(self.clause(Clause::Expr, start, vec![body]))
            }
            Token::Identifier(_) => self.parse_name_expr(),
            Token::QuotedIdentifier(_) => {
                if matches!(self.peek_ahead(1), Token::Dot | Token::LeftParen) {
                    self.parse_name_expr()
                } else {
                    self.advance();
                    Ok(self.node(NodeKind::QuotedIdentifier, start, vec![]))
                }
            }
            other => Err(self.error(format!("unexpected token in expression: {other:?}"))),
        }
    }

    /// Column reference (`c`, `t.c`, `s.t.c`) or function call.
    fn parse_name_expr(&mut self) -> Result<SyntaxNode> {
        let start = self.pos;
        self.expect_name()?;

        if self.current() == &Token::LeftParen {
            self.advance();
            if self.current() == &Token::Distinct {
                self.advance();
            }
            let args = match self.current() {
                Token::RightParen => vec![],
                Token::Star => {
                    // e.g. COUNT(*)
                    self.advance();
                    vec![]
                }
                _ => self.parse_expr_list()?,
            };
            self.expect(&Token::RightParen)?;
            return Ok(self.clause(Clause::FunctionCall, start, args));
        }

        while self.current() == &Token::Dot {
            self.advance();
            self.expect_name()?;
        }
        Ok(self.clause(Clause::Expr, start, vec![]))
    }

    fn parse_parameter(&mut self) -> SyntaxNode {
        let start = self.pos;
        self.advance();
        self.node(NodeKind::Parameter, start, vec![])
    }

    /// `INTEGER`, `VARCHAR(255)`, `DECIMAL(10, 2)`: the size arguments are
    /// part of the type, not literal values.
    fn parse_type_name(&mut self) -> Result<()> {
        self.expect_name()?;
        while let Token::Identifier(_) = self.current() {
            self.advance();
        }
        if self.current() == &Token::LeftParen {
            self.advance();
            loop {
                if matches!(self.current(), Token::Plus | Token::Minus) {
                    self.advance();
                }
                if self.current() != &Token::NumberLiteral {
                    return Err(self.error(format!(
                        "expected type size, got {:?}",
                        self.current()
                    )));
                }
                self.advance();
                if self.current() == &Token::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect(&Token::RightParen)?;
        }
        Ok(())
    }

    fn parse_expr_list(&mut self) -> Result<Vec<SyntaxNode>> {
        let mut exprs = vec![self.parse_expr()?];
        while self.current() == &Token::Comma {
            self.advance();
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
