//! Property tests for fingerprint stability and cache accounting.

use proptest::prelude::*;
use sqlshape::{normalize_sql, CacheConfig, PlanCache, PlanRecord, PlanType};
use std::collections::BTreeSet;

/// A SQL literal as it would appear in source text.
fn literal_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<u32>().prop_map(|n| n.to_string()),
        any::<i32>().prop_map(|n| n.to_string()),
        (0u32..10_000, 0u32..100).prop_map(|(a, b)| format!("{a}.{b}")),
        "[a-zA-Z0-9 ']{0,12}".prop_map(|s| format!("'{}'", s.replace('\'', "''"))),
        Just("NULL".to_string()),
        Just("X'0aff'".to_string()),
    ]
}

const TEMPLATES: [&str; 4] = [
    "SELECT * FROM t WHERE a = {} AND b = {} OR c > {}",
    "SELECT x, {} FROM t JOIN u ON t.id = u.id WHERE u.v BETWEEN {} AND {}",
    "SELECT * FROM t WHERE a IN (SELECT b FROM u WHERE c = {}) AND d <> {} LIMIT {}",
    "SELECT CASE WHEN a = {} THEN {} ELSE {} END FROM t",
];

fn fill(template: &str, literals: &[String]) -> String {
    let mut out = String::new();
    let mut parts = template.split("{}");
    if let Some(first) = parts.next() {
        out.push_str(first);
    }
    for (part, literal) in parts.zip(literals) {
        out.push_str(literal);
        out.push_str(part);
    }
    out
}

fn record(id: u8) -> PlanRecord {
    PlanRecord {
        plan_id: format!("PLN_{id:08x}"),
        plan_type: PlanType::IndexScan,
        tables: BTreeSet::new(),
    }
}

proptest! {
    #[test]
    fn literal_values_never_change_the_fingerprint(
        template in 0..TEMPLATES.len(),
        a in prop::collection::vec(literal_strategy(), 3),
        b in prop::collection::vec(literal_strategy(), 3),
    ) {
        let first = normalize_sql(&fill(TEMPLATES[template], &a)).unwrap();
        let second = normalize_sql(&fill(TEMPLATES[template], &b)).unwrap();
        prop_assert_eq!(&first.normalized_text, &second.normalized_text);
        prop_assert_eq!(first.literals, a);
        prop_assert_eq!(second.literals, b);
    }

    #[test]
    fn in_list_length_never_changes_the_fingerprint(
        values in prop::collection::vec(literal_strategy(), 1..12),
    ) {
        let sql = format!("SELECT * FROM t WHERE id IN ({})", values.join(", "));
        let result = normalize_sql(&sql).unwrap();
        prop_assert_eq!(result.normalized_text, "SELECT * FROM t WHERE id IN ( ? )");
        prop_assert_eq!(result.literals, values);
    }

    #[test]
    fn normalization_is_idempotent(
        template in 0..TEMPLATES.len(),
        literals in prop::collection::vec(literal_strategy(), 3),
    ) {
        let first = normalize_sql(&fill(TEMPLATES[template], &literals)).unwrap();
        let second = normalize_sql(&first.normalized_text).unwrap();
        prop_assert_eq!(second.normalized_text, first.normalized_text);
        prop_assert!(second.literals.is_empty());
        prop_assert!(second.leaf_subqueries.is_empty());
    }

    #[test]
    fn requests_always_equal_hits_plus_misses(
        ops in prop::collection::vec((any::<bool>(), 0u8..6), 0..64),
    ) {
        let cache = PlanCache::new(CacheConfig::default());
        let mut lookups = 0u64;
        for (is_store, key) in ops {
            if is_store {
                cache.store(key.to_string(), record(key));
            } else {
                cache.lookup(&key.to_string());
                lookups += 1;
            }
            let m = cache.metrics();
            prop_assert_eq!(m.requests, lookups);
            prop_assert_eq!(m.requests, m.hits + m.misses);
        }
    }
}
