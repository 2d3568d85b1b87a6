//! # sqlshape
//!
//! Structural fingerprints for SQL SELECT statements and a two-level plan
//! cache keyed on them.
//!
//! Statements that differ only in literal values normalize to the same
//! text, so a plan produced for one serves them all. Innermost subqueries
//! get fingerprints of their own and are cached separately.
//!
//! ```
//! use sqlshape::QueryPlanner;
//!
//! let planner = QueryPlanner::new();
//! let a = planner.plan("SELECT * FROM customers WHERE id = 101").unwrap();
//! let b = planner.plan("SELECT * FROM customers WHERE id = 202").unwrap();
//! assert_eq!(a.fingerprint, "SELECT * FROM customers WHERE id = ?");
//! assert_eq!(a.plan, b.plan);
//! assert_eq!(b.cache_hits, 1);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod limits;
pub mod normalize;
pub mod plan;
pub mod planner;
pub mod sql;

pub use cache::{CacheMetrics, Lookup, PlanCache};
pub use config::{CacheConfig, PlannerConfig};
pub use error::{Result, ShapeError};
pub use normalize::{NormalizationResult, Normalizer};
pub use plan::{HeuristicPlanGenerator, PlanGenerator, PlanRecord, PlanType};
pub use planner::{QueryPlan, QueryPlanner, SubqueryPlan};
pub use sql::{Parser, SyntaxNode, SyntaxTree};

/// Parse and normalize a single SELECT statement.
pub fn normalize_sql(sql: &str) -> Result<NormalizationResult> {
    Normalizer::new().normalize_sql(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_sql_convenience() {
        let result = normalize_sql("SELECT * FROM t WHERE a IN (1, 2, 3)").unwrap();
        assert_eq!(result.normalized_text, "SELECT * FROM t WHERE a IN ( ? )");
        assert_eq!(result.literals, vec!["1", "2", "3"]);
    }

    #[test]
    fn normalize_sql_rejects_garbage() {
        assert!(normalize_sql("SELECT FROM WHERE").is_err());
        assert!(normalize_sql("").is_err());
    }
}
