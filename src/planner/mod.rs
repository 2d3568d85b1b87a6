//! # Query planner
//!
//! Ties the pipeline together: parse, normalize, then fetch a plan for each
//! distinct leaf subquery from the subquery cache and for the whole
//! statement from the query cache. A plan is generated only on a miss, and
//! every generated plan adds its complexity score to a running total.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheMetrics, Lookup, PlanCache};
use crate::config::PlannerConfig;
use crate::error::Result;
use crate::normalize::{NormalizationResult, Normalizer};
use crate::plan::{estimate_complexity, HeuristicPlanGenerator, PlanGenerator, PlanRecord};
use crate::sql::parser::Parser;
use crate::sql::tree::SyntaxTree;

/// Plan for one leaf subquery of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubqueryPlan {
    pub fingerprint: String,
    pub plan: Arc<PlanRecord>,
    /// Served from the subquery cache rather than generated.
    pub cached: bool,
}

/// Everything the planner resolved for one statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    pub fingerprint: String,
    pub plan: Arc<PlanRecord>,
    /// In first-occurrence order.
    pub subqueries: Vec<SubqueryPlan>,
    pub literals: Vec<String>,
    /// Cache hits across both levels while planning this statement.
    pub cache_hits: usize,
}

pub struct QueryPlanner<G: PlanGenerator = HeuristicPlanGenerator> {
    normalizer: Normalizer,
    generator: G,
    queries: PlanCache,
    subqueries: PlanCache,
    total_complexity: AtomicU64,
    config: PlannerConfig,
}

impl QueryPlanner {
    pub fn new() -> Self {
        Self::with_config(PlannerConfig::default())
    }

    pub fn with_config(config: PlannerConfig) -> Self {
        Self::with_generator(config, HeuristicPlanGenerator::new())
    }
}

impl Default for QueryPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: PlanGenerator> QueryPlanner<G> {
    pub fn with_generator(config: PlannerConfig, generator: G) -> Self {
        QueryPlanner {
            normalizer: Normalizer::new(),
            generator,
            queries: PlanCache::new(config.cache).with_label("query"),
            subqueries: PlanCache::new(config.cache).with_label("subquery"),
            total_complexity: AtomicU64::new(0),
            config,
        }
    }

    /// Plan a single SELECT statement.
    pub fn plan(&self, sql: &str) -> Result<QueryPlan> {
        let tree = Parser::parse_select(sql)?;
        self.plan_tree(&tree)
    }

    /// Plan every statement of a `;`-separated script, stopping at the
    /// first error.
    pub fn plan_script(&self, sql: &str) -> Result<Vec<QueryPlan>> {
        Parser::parse_all(sql)?
            .iter()
            .map(|tree| self.plan_tree(tree))
            .collect()
    }

    pub fn plan_tree(&self, tree: &SyntaxTree) -> Result<QueryPlan> {
        let normalized = self.normalizer.normalize(tree)?;
        self.plan_normalized(normalized)
    }

    /// Resolve plans for an already normalized statement. Leaf subqueries
    /// are fetched before the statement itself.
    pub fn plan_normalized(&self, normalized: NormalizationResult) -> Result<QueryPlan> {
        let mut cache_hits = 0;
        let mut seen = HashSet::new();
        let mut subqueries = Vec::with_capacity(normalized.leaf_subqueries.len());

        for leaf in &normalized.leaf_subqueries {
            let key = leaf.fingerprint();
            if self.config.dedup_subqueries && !seen.insert(key) {
                continue;
            }
            let lookup = self.fetch(&self.subqueries, key)?;
            let cached = lookup.is_hit();
            cache_hits += usize::from(cached);
            subqueries.push(SubqueryPlan {
                fingerprint: key.to_string(),
                plan: lookup.into_record(),
                cached,
            });
        }

        let lookup = self.fetch(&self.queries, normalized.fingerprint())?;
        cache_hits += usize::from(lookup.is_hit());

        Ok(QueryPlan {
            plan: lookup.into_record(),
            fingerprint: normalized.normalized_text,
            subqueries,
            literals: normalized.literals,
            cache_hits,
        })
    }

    /// Scoring runs after the plan is cached, so a text the scorer cannot
    /// read still gets its plan; it just adds nothing to the total.
    fn fetch(&self, cache: &PlanCache, key: &str) -> Result<Lookup> {
        let lookup = cache.get_or_generate(key, |text: &str| -> Result<PlanRecord> {
            self.generator.generate(text).map_err(|e| {
                warn!(key = text, error = %e, "plan generation failed");
                e
            })
        })?;

        if let Lookup::Generated(record) = &lookup {
            match estimate_complexity(key) {
                Ok(score) => {
                    self.total_complexity.fetch_add(u64::from(score), Ordering::Relaxed);
                    debug!(
                        plan_id = %record.plan_id,
                        plan_type = %record.plan_type,
                        score,
                        "generated plan"
                    );
                }
                Err(e) => warn!(key, error = %e, "complexity scoring failed"),
            }
        }
        Ok(lookup)
    }

    pub fn query_metrics(&self) -> CacheMetrics {
        self.queries.metrics()
    }

    pub fn subquery_metrics(&self) -> CacheMetrics {
        self.subqueries.metrics()
    }

    /// Sum of complexity scores over every plan generated so far.
    pub fn total_complexity(&self) -> u64 {
        self.total_complexity.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }
}
