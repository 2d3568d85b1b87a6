//! Rough complexity score for a normalized statement.
//!
//! The score feeds the planner's running total; it has no effect on
//! caching. Keywords are counted over lexed tokens, so names such as
//! `brand` or `selection` never contribute.

use crate::error::Result;
use crate::sql::lexer::{Lexer, Token};

const WHERE_WEIGHT: u32 = 3;
const AND_WEIGHT: u32 = 2;
const OR_WEIGHT: u32 = 2;
const JOIN_WEIGHT: u32 = 5;
const GROUP_BY_WEIGHT: u32 = 4;
const ORDER_BY_WEIGHT: u32 = 4;
const HAVING_WEIGHT: u32 = 3;
const SELECT_WEIGHT: u32 = 1;
/// Added once if any aggregate is called.
const AGGREGATE_BONUS: u32 = 5;

const AGGREGATES: [&str; 5] = ["SUM", "COUNT", "MIN", "MAX", "AVG"];

/// Score `text`; never less than 1.
pub fn estimate_complexity(text: &str) -> Result<u32> {
    let lexemes = Lexer::new(text).tokenize()?;
    let tokens: Vec<&Token> = lexemes.iter().map(|l| &l.token).collect();

    let mut score = 0;
    let mut aggregate = false;
    for (i, token) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1).copied();
        score += match token {
            Token::Where => WHERE_WEIGHT,
            Token::And => AND_WEIGHT,
            Token::Or => OR_WEIGHT,
            Token::Join => JOIN_WEIGHT,
            Token::Group if next == Some(&Token::By) => GROUP_BY_WEIGHT,
            Token::Order if next == Some(&Token::By) => ORDER_BY_WEIGHT,
            Token::Having => HAVING_WEIGHT,
            Token::Select => SELECT_WEIGHT,
            Token::Identifier(name) => {
                if next == Some(&Token::LeftParen)
                    && AGGREGATES.iter().any(|a| a.eq_ignore_ascii_case(name))
                {
                    aggregate = true;
                }
                0
            }
            _ => 0,
        };
    }
    if aggregate {
        score += AGGREGATE_BONUS;
    }
    Ok(score.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_select_scores_one() {
        assert_eq!(estimate_complexity("SELECT 1").unwrap(), 1);
        assert_eq!(estimate_complexity("").unwrap(), 1);
    }

    #[test]
    fn weights_add_up() {
        // SELECT 1 + WHERE 3 + AND 2 + OR 2
        let text = "SELECT * FROM t WHERE a = ? AND b = ? OR c = ?";
        assert_eq!(estimate_complexity(text).unwrap(), 8);

        // SELECT 1 + JOIN 5 + GROUP BY 4 + HAVING 3 + ORDER BY 4 + aggregate 5
        let text = "SELECT d , COUNT ( * ) FROM e JOIN f ON e.x = f.x \
                    GROUP BY d HAVING COUNT ( * ) > ? ORDER BY d";
        assert_eq!(estimate_complexity(text).unwrap(), 22);
    }

    #[test]
    fn aggregate_bonus_counts_once() {
        let one = estimate_complexity("SELECT max ( a ) FROM t").unwrap();
        let two = estimate_complexity("SELECT max ( a ) , min ( b ) FROM t").unwrap();
        assert_eq!(one, 6);
        assert_eq!(one, two);
    }

    #[test]
    fn keywords_inside_names_do_not_count() {
        assert_eq!(estimate_complexity("SELECT brand , selection FROM orders").unwrap(), 1);
        // A column named like an aggregate is not a call.
        assert_eq!(estimate_complexity("SELECT count FROM t").unwrap(), 1);
    }

    #[test]
    fn unlexable_text_is_an_error() {
        assert!(estimate_complexity("SELECT 'open").is_err());
    }
}
