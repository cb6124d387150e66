//! Join planner: turns a resolver's `required_base_tables` list into an
//! ordered sequence of `INNER JOIN` clauses by walking the schema graph.
//!
//! The algorithm is a greedy connected-walk, not a shortest-path search: it
//! only succeeds when the required tables form a chain reachable from the
//! seed table, one direct edge at a time. That is a deliberate limitation
//! inherited from the schema this compiler targets — every supported query
//! shape produces such a chain.

use std::collections::HashMap;

use crate::catalog;
use crate::errors::CompileError;

/// Builds the `INNER JOIN` clauses connecting every table in
/// `required_base_tables` (in insertion order) starting from the first
/// element, the FROM seed. `table_aliases` must already contain an alias
/// for every required table (the resolver guarantees this).
///
/// Ties are broken by the insertion order of `required_base_tables`: at
/// each step every remaining table is tried against the most recently
/// attached table before the walk moves on, and a table already directly
/// reachable from the current tail is attached immediately, so the same
/// input always produces the same join order.
pub fn plan_inner_joins(
    required_base_tables: &[&'static str],
    table_aliases: &HashMap<&'static str, String>,
) -> Result<Vec<String>, CompileError> {
    if required_base_tables.len() < 2 {
        return Ok(Vec::new());
    }

    let mut processed: Vec<&'static str> = vec![required_base_tables[0]];
    let mut remaining: Vec<&'static str> = required_base_tables[1..].to_vec();
    let mut inner_joins = Vec::with_capacity(required_base_tables.len() - 1);

    for _ in 0..required_base_tables.len() - 1 {
        let last = *processed.last().expect("seed is always present");
        let mut i = 0;
        while i < remaining.len() {
            let candidate = remaining[i];
            match catalog::find_join(last, candidate) {
                Some(template) => {
                    let last_alias = &table_aliases[last];
                    let candidate_alias = &table_aliases[candidate];
                    let on_clause = catalog::render_join_template(template, last_alias, candidate_alias);
                    inner_joins.push(format!("INNER JOIN {candidate} {candidate_alias} ON {on_clause}"));
                    processed.push(candidate);
                    remaining.remove(i);
                    // Don't advance `i`: the next candidate has shifted into this slot.
                }
                None => i += 1,
            }
        }
    }

    if inner_joins.len() != required_base_tables.len() - 1 {
        return Err(CompileError::UnjoinableTables);
    }

    Ok(inner_joins)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases(tables: &[&'static str]) -> HashMap<&'static str, String> {
        tables
            .iter()
            .enumerate()
            .map(|(i, &t)| (t, format!("t{i}")))
            .collect()
    }

    #[test]
    fn plans_a_two_table_chain() {
        let tables = ["R_COLL_MAIN", "R_DATA_MAIN"];
        let joins = plan_inner_joins(&tables, &aliases(&tables)).unwrap();
        assert_eq!(joins, vec!["INNER JOIN R_DATA_MAIN t1 ON t0.coll_id = t1.coll_id"]);
    }

    #[test]
    fn plans_a_three_table_chain_through_an_intermediate() {
        let tables = ["R_DATA_MAIN", "R_RESC_MAIN", "R_OBJT_METAMAP"];
        let joins = plan_inner_joins(&tables, &aliases(&tables)).unwrap();
        assert_eq!(joins.len(), 2);
        assert!(joins[0].contains("R_RESC_MAIN"));
        assert!(joins[1].contains("R_OBJT_METAMAP"));
    }

    #[test]
    fn unreachable_tables_fail_with_unjoinable() {
        let tables = ["R_COLL_MAIN", "R_ZONE_MAIN"];
        let err = plan_inner_joins(&tables, &aliases(&tables)).unwrap_err();
        assert_eq!(err, CompileError::UnjoinableTables);
    }

    #[test]
    fn single_table_needs_no_joins() {
        let tables = ["R_DATA_MAIN"];
        let joins = plan_inner_joins(&tables, &aliases(&tables)).unwrap();
        assert!(joins.is_empty());
    }
}
