//! Plan records and the generators that produce them.
//!
//! sqlshape does not optimize or execute anything. A [`PlanRecord`] is the
//! opaque value the cache stores per fingerprint; the default
//! [`HeuristicPlanGenerator`] derives one from the normalized text alone.

pub mod complexity;

use std::collections::BTreeSet;
use std::fmt;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sql::lexer::{Lexer, Token};

pub use complexity::estimate_complexity;

/// Table name reported when a statement names none (e.g. `SELECT 1`).
pub const UNKNOWN_TABLE: &str = "unknown_table";

/// Access strategy recorded in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanType {
    #[serde(rename = "Index Scan")]
    IndexScan,
    #[serde(rename = "Full Table Scan")]
    FullTableScan,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanType::IndexScan => write!(f, "Index Scan"),
            PlanType::FullTableScan => write!(f, "Full Table Scan"),
        }
    }
}

/// The value cached for one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub plan_id: String,
    pub plan_type: PlanType,
    pub tables: BTreeSet<String>,
}

/// Produces a plan for a normalized statement on a cache miss.
///
/// Implementations receive the fingerprint text, never the raw SQL, so
/// the same plan serves every statement sharing the fingerprint.
pub trait PlanGenerator: Send + Sync {
    fn generate(&self, normalized: &str) -> Result<PlanRecord>;
}

impl<F> PlanGenerator for F
where
    F: Fn(&str) -> Result<PlanRecord> + Send + Sync,
{
    fn generate(&self, normalized: &str) -> Result<PlanRecord> {
        self(normalized)
    }
}

/// Derives a deterministic plan from the shape of the normalized text.
///
/// - `plan_id`: `PLN_` followed by the first 8 hex digits of the text's MD5.
/// - `plan_type`: index scan when the text has a `WHERE`, else a full scan.
/// - `tables`: every name directly after `FROM` or `JOIN`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicPlanGenerator;

impl HeuristicPlanGenerator {
    pub fn new() -> Self {
        HeuristicPlanGenerator
    }
}

impl PlanGenerator for HeuristicPlanGenerator {
    fn generate(&self, normalized: &str) -> Result<PlanRecord> {
        let lexemes = Lexer::new(normalized).tokenize()?;

        let plan_type = if lexemes.iter().any(|l| l.token == Token::Where) {
            PlanType::IndexScan
        } else {
            PlanType::FullTableScan
        };

        let mut tables: BTreeSet<String> = lexemes
            .windows(2)
            .filter(|pair| matches!(pair[0].token, Token::From | Token::Join))
            .filter_map(|pair| match &pair[1].token {
                Token::Identifier(name) | Token::QuotedIdentifier(name) => Some(name.clone()),
                _ => None,
            })
            .collect();
        if tables.is_empty() {
            tables.insert(UNKNOWN_TABLE.to_string());
        }

        Ok(PlanRecord {
            plan_id: plan_id(normalized),
            plan_type,
            tables,
        })
    }
}

fn plan_id(normalized: &str) -> String {
    let digest = Md5::digest(normalized.as_bytes());
    format!("PLN_{}", &hex::encode(digest)[..8])
}
