//! Hand-written SQL tokenizer for sqlshape.
//!
//! The [`Lexer`] takes a raw SQL string and produces a `Vec<Lexeme>`: each
//! token paired with the byte range it occupies in the source. The ranges
//! are what lets the normalizer recover the verbatim text of literals and
//! render every other token in a canonical spelling.

use crate::error::{Result, ShapeError};

/// A single SQL token.
///
/// Literal tokens carry no decoded value: fingerprinting only ever needs
/// their verbatim source text, which lives in the owning [`Lexeme`] span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    // -----------------------------------------------------------------------
    // Keywords
    // -----------------------------------------------------------------------
    Select,
    From,
    Where,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Values,
    Not,
    And,
    Or,
    Is,
    Null,
    In,
    Between,
    Like,
    Glob,
    Escape,
    As,
    On,
    Using,
    Join,
    Inner,
    Left,
    Right,
    Outer,
    Cross,
    Full,
    Natural,
    Order,
    By,
    Asc,
    Desc,
    Group,
    Having,
    Limit,
    Offset,
    Distinct,
    Union,
    Intersect,
    Except,
    All,
    Case,
    When,
    Then,
    Else,
    End,
    Cast,
    Exists,
    With,
    Recursive,
    Collate,
    True,
    False,

    // -----------------------------------------------------------------------
    // Literals
    // -----------------------------------------------------------------------
    NumberLiteral,
    StringLiteral,
    BlobLiteral,

    // -----------------------------------------------------------------------
    // Identifiers
    // -----------------------------------------------------------------------
    Identifier(String),
    /// A `"double-quoted"` name. SQLite falls back to treating these as
    /// string literals when they do not resolve, so the parser decides per
    /// position whether one is a name or a value.
    QuotedIdentifier(String),

    // -----------------------------------------------------------------------
    // Operators & punctuation
    // -----------------------------------------------------------------------
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    Dot,
    Pipe,
    PipePipe,
    Ampersand,
    Tilde,
    ShiftLeft,
    ShiftRight,

    // -----------------------------------------------------------------------
    // Special
    // -----------------------------------------------------------------------
    /// Bound parameter: `?`, `?N`, `:name`, `@name` or `$name`.
    Placeholder,
    /// End-of-file sentinel.
    Eof,
}

impl Token {
    /// The canonical spelling of a keyword, operator or punctuation token.
    ///
    /// Returns `None` for tokens whose text must come from the source
    /// (literals and identifiers).
    pub fn canonical(&self) -> Option<&'static str> {
        let text = match self {
            Token::Select => "SELECT",
            Token::From => "FROM",
            Token::Where => "WHERE",
            Token::Insert => "INSERT",
            Token::Update => "UPDATE",
            Token::Delete => "DELETE",
            Token::Create => "CREATE",
            Token::Drop => "DROP",
            Token::Values => "VALUES",
            Token::Not => "NOT",
            Token::And => "AND",
            Token::Or => "OR",
            Token::Is => "IS",
            Token::Null => "NULL",
            Token::In => "IN",
            Token::Between => "BETWEEN",
            Token::Like => "LIKE",
            Token::Glob => "GLOB",
            Token::Escape => "ESCAPE",
            Token::As => "AS",
            Token::On => "ON",
            Token::Using => "USING",
            Token::Join => "JOIN",
            Token::Inner => "INNER",
            Token::Left => "LEFT",
            Token::Right => "RIGHT",
            Token::Outer => "OUTER",
            Token::Cross => "CROSS",
            Token::Full => "FULL",
            Token::Natural => "NATURAL",
            Token::Order => "ORDER",
            Token::By => "BY",
            Token::Asc => "ASC",
            Token::Desc => "DESC",
            Token::Group => "GROUP",
            Token::Having => "HAVING",
            Token::Limit => "LIMIT",
            Token::Offset => "OFFSET",
            Token::Distinct => "DISTINCT",
            Token::Union => "UNION",
            Token::Intersect => "INTERSECT",
            Token::Except => "EXCEPT",
            Token::All => "ALL",
            Token::Case => "CASE",
            Token::When => "WHEN",
            Token::Then => "THEN",
            Token::Else => "ELSE",
            Token::End => "END",
            Token::Cast => "CAST",
            Token::Exists => "EXISTS",
            Token::With => "WITH",
            Token::Recursive => "RECURSIVE",
            Token::Collate => "COLLATE",
            Token::True => "TRUE",
            Token::False => "FALSE",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Eq => "=",
            Token::NotEq => "<>",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Dot => ".",
            Token::Pipe => "|",
            Token::PipePipe => "||",
            Token::Ampersand => "&",
            Token::Tilde => "~",
            Token::ShiftLeft => "<<",
            Token::ShiftRight => ">>",
            Token::Placeholder => "?",
            Token::Eof => "",
            Token::NumberLiteral
            | Token::StringLiteral
            | Token::BlobLiteral
            | Token::Identifier(_)
            | Token::QuotedIdentifier(_) => return None,
        };
        Some(text)
    }
}

/// A token together with the byte range `start..end` it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

// ---------------------------------------------------------------------------
// Keyword lookup
// ---------------------------------------------------------------------------

fn keyword_token(word: &str) -> Option<Token> {
    // The input `word` is already uppercased by the caller.
    match word {
        "SELECT" => Some(Token::Select),
        "FROM" => Some(Token::From),
        "WHERE" => Some(Token::Where),
        "INSERT" => Some(Token::Insert),
        "UPDATE" => Some(Token::Update),
        "DELETE" => Some(Token::Delete),
        "CREATE" => Some(Token::Create),
        "DROP" => Some(Token::Drop),
        "VALUES" => Some(Token::Values),
        "NOT" => Some(Token::Not),
        "AND" => Some(Token::And),
        "OR" => Some(Token::Or),
        "IS" => Some(Token::Is),
        "NULL" => Some(Token::Null),
        "IN" => Some(Token::In),
        "BETWEEN" => Some(Token::Between),
        "LIKE" => Some(Token::Like),
        "GLOB" => Some(Token::Glob),
        "ESCAPE" => Some(Token::Escape),
        "AS" => Some(Token::As),
        "ON" => Some(Token::On),
        "USING" => Some(Token::Using),
        "JOIN" => Some(Token::Join),
        "INNER" => Some(Token::Inner),
        "LEFT" => Some(Token::Left),
        "RIGHT" => Some(Token::Right),
        "OUTER" => Some(Token::Outer),
        "CROSS" => Some(Token::Cross),
        "FULL" => Some(Token::Full),
        "NATURAL" => Some(Token::Natural),
        "ORDER" => Some(Token::Order),
        "BY" => Some(Token::By),
        "ASC" => Some(Token::Asc),
        "DESC" => Some(Token::Desc),
        "GROUP" => Some(Token::Group),
        "HAVING" => Some(Token::Having),
        "LIMIT" => Some(Token::Limit),
        "OFFSET" => Some(Token::Offset),
        "DISTINCT" => Some(Token::Distinct),
        "UNION" => Some(Token::Union),
        "INTERSECT" => Some(Token::Intersect),
        "EXCEPT" => Some(Token::Except),
        "ALL" => Some(Token::All),
        "CASE" => Some(Token::Case),
        "WHEN" => Some(Token::When),
        "THEN" => Some(Token::Then),
        "ELSE" => Some(Token::Else),
        "END" => Some(Token::End),
        "CAST" => Some(Token::Cast),
        "EXISTS" => Some(Token::Exists),
        "WITH" => Some(Token::With),
        "RECURSIVE" => Some(Token::Recursive),
        "COLLATE" => Some(Token::Collate),
        "TRUE" => Some(Token::True),
        "FALSE" => Some(Token::False),
        _ => None,
    }
}

fn is_identifier_byte(c: u8) -> bool {
    // Non-ASCII bytes are accepted so UTF-8 names stay in one token; spans
    // therefore always end on a character boundary.
    c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

/// A hand-written SQL tokenizer.
///
/// Create one with [`Lexer::new`], then call [`Lexer::tokenize`] to obtain
/// the full lexeme stream (terminated by [`Token::Eof`]).
pub struct Lexer<'a> {
    input: &'a [u8],
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer over the given SQL text.
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.as_bytes(),
            source: input,
            pos: 0,
        }
    }

    /// Tokenize the entire input and return the lexeme list.
    ///
    /// The returned vector always ends with a zero-width [`Token::Eof`].
    pub fn tokenize(&mut self) -> Result<Vec<Lexeme>> {
        let mut lexemes = Vec::new();
        loop {
            self.skip_whitespace_and_comments()?;
            let start = self.pos;
            let token = self.next_token()?;
            let is_eof = token == Token::Eof;
            lexemes.push(Lexeme {
                token,
                start,
                end: self.pos,
            });
            if is_eof {
                break;
            }
        }
        Ok(lexemes)
    }

    // -- helpers ------------------------------------------------------------

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.input.get(self.pos).copied()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Skip `-- line comments` and `/* block comments */`, returning `true`
    /// if a comment was actually consumed so the caller can loop.
    fn skip_comment(&mut self) -> Result<bool> {
        if self.peek() == Some(b'-') && self.peek_at(1) == Some(b'-') {
            self.pos += 2;
            while let Some(ch) = self.peek() {
                self.pos += 1;
                if ch == b'\n' {
                    break;
                }
            }
            return Ok(true);
        }
        if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'*') {
            self.pos += 2;
            loop {
                match self.peek() {
                    None => {
                        return Err(ShapeError::invalid_sql("unterminated block comment"));
                    }
                    Some(b'*') if self.peek_at(1) == Some(b'/') => {
                        self.pos += 2;
                        break;
                    }
                    _ => {
                        self.pos += 1;
                    }
                }
            }
            return Ok(true);
        }
        Ok(false)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            self.skip_whitespace();
            if !self.skip_comment()? {
                break;
            }
        }
        Ok(())
    }

    // -- main scanner -------------------------------------------------------

    fn next_token(&mut self) -> Result<Token> {
        let ch = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // ----- string literal -----
        if ch == b'\'' {
            self.read_quoted(b'\'', "string literal")?;
            return Ok(Token::StringLiteral);
        }

        // ----- blob literal X'...' -----
        if (ch == b'x' || ch == b'X') && self.peek_at(1) == Some(b'\'') {
            return self.read_blob_literal();
        }

        // ----- numeric literal -----
        if ch.is_ascii_digit() {
            return self.read_number();
        }

        // ----- dot, could be `.123` or just a dot -----
        if ch == b'.' && self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
            return self.read_number();
        }

        // ----- identifier / keyword -----
        if ch.is_ascii_alphabetic() || ch == b'_' || ch >= 0x80 {
            return Ok(self.read_identifier_or_keyword());
        }

        // ----- quoted identifiers -----
        if ch == b'"' {
            let name = self.read_quoted(b'"', "quoted identifier")?;
            return Ok(Token::QuotedIdentifier(name));
        }
        if ch == b'`' {
            let name = self.read_quoted(b'`', "quoted identifier")?;
            return Ok(Token::Identifier(name));
        }
        if ch == b'[' {
            return self.read_bracket_identifier();
        }

        // ----- parameters -----
        if ch == b'?' || ch == b':' || ch == b'@' || ch == b'$' {
            return self.read_placeholder();
        }

        self.read_operator()
    }

    // -- literal readers ----------------------------------------------------

    /// Read a `quote`-delimited run where a doubled quote escapes itself,
    /// returning the unescaped body.
    fn read_quoted(&mut self, quote: u8, what: &str) -> Result<String> {
        self.advance(); // opening quote
        let body_start = self.pos;
        let mut body = String::new();
        let mut run_start = body_start;
        loop {
            match self.advance() {
                None => {
                    return Err(ShapeError::invalid_sql(format!("unterminated {what}")));
                }
                Some(c) if c == quote => {
                    body.push_str(&self.source[run_start..self.pos - 1]);
                    if self.peek() == Some(quote) {
                        self.advance();
                        body.push(quote as char);
                        run_start = self.pos;
                    } else {
                        break;
                    }
                }
                Some(_) => {}
            }
        }
        Ok(body)
    }

    fn read_bracket_identifier(&mut self) -> Result<Token> {
        self.advance(); // [
        let start = self.pos;
        loop {
            match self.advance() {
                None => {
                    return Err(ShapeError::invalid_sql("unterminated quoted identifier"));
                }
                Some(b']') => break,
                Some(_) => {}
            }
        }
        Ok(Token::Identifier(self.source[start..self.pos - 1].to_string()))
    }

    fn read_blob_literal(&mut self) -> Result<Token> {
        self.advance(); // X or x
        self.advance(); // opening '
        let mut digits = 0usize;
        loop {
            match self.advance() {
                None => {
                    return Err(ShapeError::invalid_sql("unterminated blob literal"));
                }
                Some(b'\'') => break,
                Some(c) if c.is_ascii_hexdigit() => digits += 1,
                Some(c) => {
                    return Err(ShapeError::invalid_sql(format!(
                        "invalid character in blob literal: '{}'",
                        c as char
                    )));
                }
            }
        }
        if digits % 2 != 0 {
            return Err(ShapeError::invalid_sql(
                "blob literal must have an even number of hex digits",
            ));
        }
        Ok(Token::BlobLiteral)
    }

    fn read_number(&mut self) -> Result<Token> {
        let start = self.pos;

        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x') | Some(b'X')) {
            self.pos += 2;
            let digits = self.pos;
            while self.peek().map_or(false, |c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            if self.pos == digits {
                return Err(ShapeError::invalid_sql("invalid hexadecimal literal"));
            }
            return Ok(Token::NumberLiteral);
        }

        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Fractional part; "123." is still a real.
        if self.peek() == Some(b'.')
            && (self.pos > start || self.peek_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            self.advance();
            while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if self.peek() == Some(b'e') || self.peek() == Some(b'E') {
            self.advance();
            if self.peek() == Some(b'+') || self.peek() == Some(b'-') {
                self.advance();
            }
            if !self.peek().map_or(false, |c| c.is_ascii_digit()) {
                return Err(ShapeError::invalid_sql(
                    "invalid numeric literal: expected digit after exponent",
                ));
            }
            while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if self.peek().map_or(false, |c| c.is_ascii_alphabetic() || c == b'_') {
            return Err(ShapeError::invalid_sql(format!(
                "invalid numeric literal: {}",
                &self.source[start..=self.pos]
            )));
        }

        Ok(Token::NumberLiteral)
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let start = self.pos;
        while self.peek().map_or(false, is_identifier_byte) {
            self.advance();
        }
        let word = &self.source[start..self.pos];
        let upper = word.to_ascii_uppercase();

        keyword_token(&upper).unwrap_or_else(|| Token::Identifier(word.to_string()))
    }

    fn read_placeholder(&mut self) -> Result<Token> {
        let sigil = self.advance();
        let start = self.pos;
        if sigil == Some(b'?') {
            while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
            return Ok(Token::Placeholder);
        }
        while self.peek().map_or(false, is_identifier_byte) {
            self.advance();
        }
        if self.pos == start {
            return Err(ShapeError::invalid_sql(format!(
                "expected parameter name after '{}'",
                sigil.map(char::from).unwrap_or(' ')
            )));
        }
        Ok(Token::Placeholder)
    }

    fn read_operator(&mut self) -> Result<Token> {
        let ch = match self.advance() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };
        match ch {
            b'+' => Ok(Token::Plus),
            b'*' => Ok(Token::Star),
            b'/' => Ok(Token::Slash),
            b'%' => Ok(Token::Percent),
            b'(' => Ok(Token::LeftParen),
            b')' => Ok(Token::RightParen),
            b',' => Ok(Token::Comma),
            b';' => Ok(Token::Semicolon),
            b'.' => Ok(Token::Dot),
            b'&' => Ok(Token::Ampersand),
            b'~' => Ok(Token::Tilde),
            b'-' => Ok(Token::Minus),
            b'=' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                }
                Ok(Token::Eq)
            }
            b'!' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    Ok(Token::NotEq)
                } else {
                    Err(ShapeError::invalid_sql("expected '=' after '!'"))
                }
            }
            b'<' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    Ok(Token::LtEq)
                } else if self.peek() == Some(b'>') {
                    self.advance();
                    Ok(Token::NotEq)
                } else if self.peek() == Some(b'<') {
                    self.advance();
                    Ok(Token::ShiftLeft)
                } else {
                    Ok(Token::Lt)
                }
            }
            b'>' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    Ok(Token::GtEq)
                } else if self.peek() == Some(b'>') {
                    self.advance();
                    Ok(Token::ShiftRight)
                } else {
                    Ok(Token::Gt)
                }
            }
            b'|' => {
                if self.peek() == Some(b'|') {
                    self.advance();
                    Ok(Token::PipePipe)
                } else {
                    Ok(Token::Pipe)
                }
            }
            _ => Err(ShapeError::invalid_sql(format!(
                "unexpected character: '{}'",
                ch as char
            ))),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|l| l.token)
            .collect()
    }

    fn spans(input: &str) -> Vec<&str> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .iter()
            .map(|l| &input[l.start..l.end])
            .collect()
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let tokens = lex("select FROM Where");
        assert_eq!(tokens[0], Token::Select);
        assert_eq!(tokens[1], Token::From);
        assert_eq!(tokens[2], Token::Where);
    }

    #[test]
    fn identifiers() {
        let tokens = lex("my_table \"My Column\" `tick` [bracket]");
        assert_eq!(tokens[0], Token::Identifier("my_table".into()));
        assert_eq!(tokens[1], Token::QuotedIdentifier("My Column".into()));
        assert_eq!(tokens[2], Token::Identifier("tick".into()));
        assert_eq!(tokens[3], Token::Identifier("bracket".into()));
    }

    #[test]
    fn literal_spans_keep_source_text() {
        let input = "42 3.14 .5 1e10 'it''s' X'DEAD' 0x1F";
        assert_eq!(
            spans(input),
            vec!["42", "3.14", ".5", "1e10", "'it''s'", "X'DEAD'", "0x1F", ""]
        );
        let tokens = lex(input);
        assert_eq!(tokens[0], Token::NumberLiteral);
        assert_eq!(tokens[4], Token::StringLiteral);
        assert_eq!(tokens[5], Token::BlobLiteral);
        assert_eq!(tokens[6], Token::NumberLiteral);
    }

    #[test]
    fn doubled_quote_unescapes_in_quoted_identifier() {
        let tokens = lex("\"say \"\"hi\"\"\"");
        assert_eq!(tokens[0], Token::QuotedIdentifier("say \"hi\"".into()));
    }

    #[test]
    fn operators() {
        let tokens = lex("+ - * / % = != <> < > <= >= || << >>");
        assert_eq!(
            tokens,
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Percent,
                Token::Eq,
                Token::NotEq,
                Token::NotEq,
                Token::Lt,
                Token::Gt,
                Token::LtEq,
                Token::GtEq,
                Token::PipePipe,
                Token::ShiftLeft,
                Token::ShiftRight,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn all_parameter_styles_are_placeholders() {
        let tokens = lex("? ?1 :name @p $v");
        assert!(tokens[..5].iter().all(|t| *t == Token::Placeholder));
        assert_eq!(spans("?12 :name"), vec!["?12", ":name", ""]);
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = lex("SELECT -- this is a comment\n42 /* block */ ,");
        assert_eq!(
            tokens,
            vec![Token::Select, Token::NumberLiteral, Token::Comma, Token::Eof]
        );
    }

    #[test]
    fn unterminated_inputs_are_errors() {
        assert!(Lexer::new("'hello").tokenize().is_err());
        assert!(Lexer::new("/* oops").tokenize().is_err());
        assert!(Lexer::new("\"open").tokenize().is_err());
        assert!(Lexer::new("X'ABC'").tokenize().is_err());
    }

    #[test]
    fn canonical_spelling() {
        assert_eq!(Token::Select.canonical(), Some("SELECT"));
        assert_eq!(Token::NotEq.canonical(), Some("<>"));
        assert_eq!(Token::Placeholder.canonical(), Some("?"));
        assert_eq!(Token::StringLiteral.canonical(), None);
    }

    #[test]
    fn utf8_identifiers_stay_whole() {
        let input = "SELECT naïve FROM t";
        assert_eq!(spans(input), vec!["SELECT", "naïve", "FROM", "t", ""]);
    }

    #[test]
    fn empty_input() {
        assert_eq!(lex(""), vec![Token::Eof]);
    }
}
