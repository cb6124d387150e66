//! Semantic resolver: walks the parsed AST once, resolving every logical
//! column onto its physical home, classifying the "special" columns that
//! need auxiliary joins, and rendering the `WHERE` clause text along the
//! way. Everything it produces is collected into a fresh [`CompileState`]
//! that the planner and emitter consume afterward.

use std::collections::HashMap;

use crate::ast::{Column, Condition, ConditionExpression, ConditionNode, Select, Selection};
use crate::catalog::{self, ColumnInfo};
use crate::errors::CompileError;

/// Scratch state for exactly one compilation. Owned by the caller of
/// [`resolve`], never shared and never reused across calls, so two
/// compilations running on different threads never see each other's state.
#[derive(Debug, Default)]
pub struct CompileState {
    pub in_select_clause: bool,
    pub required_base_tables: Vec<&'static str>,
    pub table_aliases: HashMap<&'static str, String>,
    pub select_columns: Vec<String>,
    pub where_columns: Vec<String>,
    pub bound_values: Vec<String>,
    pub conditions_sql: String,
    pub needs_meta_data: bool,
    pub needs_meta_coll: bool,
    pub needs_meta_resc: bool,
    pub needs_meta_user: bool,
    pub needs_data_perms: bool,
    pub needs_coll_perms: bool,
    pub needs_resc_hier: bool,
    pub ast_column_refs: Vec<Column>,
}

impl CompileState {
    fn new() -> Self {
        Self::default()
    }

    /// Adds `table` to the required base tables if it isn't already present
    /// and allocates it a fresh `t<k>` alias. Idempotent: calling it twice
    /// for the same table is a no-op the second time.
    fn ensure_alias(&mut self, table: &'static str) -> String {
        if let Some(alias) = self.table_aliases.get(table) {
            return alias.clone();
        }
        let alias = format!("t{}", self.table_aliases.len());
        self.required_base_tables.push(table);
        self.table_aliases.insert(table, alias.clone());
        alias
    }
}

/// The auxiliary-join classification of a logical column name, per the
/// fixed prefix rules. `None` means the column resolves through an
/// ordinary inner join instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Special {
    MetaData,
    MetaColl,
    MetaResc,
    MetaUser,
    DataAccessPermName,
    DataAccessUserName,
    DataAccessOther,
    CollAccessPermName,
    CollAccessUserName,
    CollAccessOther,
    RescHier,
}

/// The fixed alias a special column resolves through, for reuse by the
/// emitter's `ORDER BY` handling (which needs the same classification the
/// resolver applied, without re-running the rest of resolution).
pub(crate) fn special_alias(name: &str) -> Option<&'static str> {
    Some(match classify(name)? {
        Special::MetaData => catalog::ALIAS_META_DATA,
        Special::MetaColl => catalog::ALIAS_META_COLL,
        Special::MetaResc => catalog::ALIAS_META_RESC,
        Special::MetaUser => catalog::ALIAS_META_USER,
        Special::DataAccessPermName => catalog::ALIAS_DATA_ACCESS_TOKEN,
        Special::DataAccessUserName => catalog::ALIAS_DATA_ACCESS_USER,
        Special::DataAccessOther => catalog::ALIAS_DATA_ACCESS,
        Special::CollAccessPermName => catalog::ALIAS_COLL_ACCESS_TOKEN,
        Special::CollAccessUserName => catalog::ALIAS_COLL_ACCESS_USER,
        Special::CollAccessOther => catalog::ALIAS_COLL_ACCESS,
        Special::RescHier => catalog::ALIAS_RESC_HIER,
    })
}

/// Whether the auxiliary joins a special column's alias depends on were
/// actually planned during resolution. A sort-only special column — one
/// that appears in `ORDER BY` but was never projected or filtered on — would
/// otherwise reference an alias with no corresponding join in the emitted
/// SQL; the emitter treats that as [`CompileError::UnknownColumnInOrderBy`]
/// rather than silently emitting a dangling reference. Ordinary (non-special)
/// columns are always considered satisfied here; the emitter checks their
/// table membership separately.
pub(crate) fn special_join_is_planned(state: &CompileState, name: &str) -> bool {
    match classify(name) {
        None => true,
        Some(Special::MetaData) => state.needs_meta_data,
        Some(Special::MetaColl) => state.needs_meta_coll,
        Some(Special::MetaResc) => state.needs_meta_resc,
        Some(Special::MetaUser) => state.needs_meta_user,
        Some(Special::DataAccessPermName)
        | Some(Special::DataAccessUserName)
        | Some(Special::DataAccessOther) => state.needs_data_perms,
        Some(Special::CollAccessPermName)
        | Some(Special::CollAccessUserName)
        | Some(Special::CollAccessOther) => state.needs_coll_perms,
        Some(Special::RescHier) => state.needs_resc_hier,
    }
}

fn classify(name: &str) -> Option<Special> {
    match name {
        "DATA_ACCESS_PERM_NAME" => return Some(Special::DataAccessPermName),
        "DATA_ACCESS_USER_NAME" => return Some(Special::DataAccessUserName),
        "COLL_ACCESS_PERM_NAME" => return Some(Special::CollAccessPermName),
        "COLL_ACCESS_USER_NAME" => return Some(Special::CollAccessUserName),
        "DATA_RESC_HIER" => return Some(Special::RescHier),
        _ => {}
    }
    if name.starts_with("META_D") {
        Some(Special::MetaData)
    } else if name.starts_with("META_C") {
        Some(Special::MetaColl)
    } else if name.starts_with("META_R") {
        Some(Special::MetaResc)
    } else if name.starts_with("META_U") {
        Some(Special::MetaUser)
    } else if name.starts_with("DATA_ACCESS_") {
        Some(Special::DataAccessOther)
    } else if name.starts_with("COLL_ACCESS_") {
        Some(Special::CollAccessOther)
    } else {
        None
    }
}

/// Resolves one `Column`, returning its rendered SQL text (`alias.col` or
/// `CAST(alias.col AS ty)`), recording auxiliary-join requirements and a
/// handle into [`CompileState::ast_column_refs`] for later `ORDER BY` use.
fn resolve_column(state: &mut CompileState, column: &Column) -> Result<String, CompileError> {
    let info: &ColumnInfo = catalog::COLUMN_NAME_MAPPINGS
        .get(column.name.as_str())
        .ok_or_else(|| CompileError::UnknownColumn(column.name.clone()))?;

    state.ast_column_refs.push(column.clone());

    let alias = match classify(&column.name) {
        Some(Special::MetaData) => {
            state.needs_meta_data = true;
            state.ensure_alias("R_DATA_MAIN");
            catalog::ALIAS_META_DATA.to_string()
        }
        Some(Special::MetaColl) => {
            state.needs_meta_coll = true;
            state.ensure_alias("R_COLL_MAIN");
            catalog::ALIAS_META_COLL.to_string()
        }
        Some(Special::MetaResc) => {
            state.needs_meta_resc = true;
            state.ensure_alias("R_RESC_MAIN");
            catalog::ALIAS_META_RESC.to_string()
        }
        Some(Special::MetaUser) => {
            state.needs_meta_user = true;
            state.ensure_alias("R_USER_MAIN");
            catalog::ALIAS_META_USER.to_string()
        }
        Some(Special::DataAccessPermName) => {
            state.needs_data_perms = true;
            state.ensure_alias("R_DATA_MAIN");
            catalog::ALIAS_DATA_ACCESS_TOKEN.to_string()
        }
        Some(Special::DataAccessUserName) => {
            state.needs_data_perms = true;
            state.ensure_alias("R_DATA_MAIN");
            catalog::ALIAS_DATA_ACCESS_USER.to_string()
        }
        Some(Special::DataAccessOther) => {
            state.needs_data_perms = true;
            state.ensure_alias("R_DATA_MAIN");
            catalog::ALIAS_DATA_ACCESS.to_string()
        }
        Some(Special::CollAccessPermName) => {
            state.needs_coll_perms = true;
            state.ensure_alias("R_COLL_MAIN");
            catalog::ALIAS_COLL_ACCESS_TOKEN.to_string()
        }
        Some(Special::CollAccessUserName) => {
            state.needs_coll_perms = true;
            state.ensure_alias("R_COLL_MAIN");
            catalog::ALIAS_COLL_ACCESS_USER.to_string()
        }
        Some(Special::CollAccessOther) => {
            state.needs_coll_perms = true;
            state.ensure_alias("R_COLL_MAIN");
            catalog::ALIAS_COLL_ACCESS.to_string()
        }
        Some(Special::RescHier) => {
            state.needs_resc_hier = true;
            state.ensure_alias("R_RESC_MAIN");
            catalog::ALIAS_RESC_HIER.to_string()
        }
        None => state.ensure_alias(info.physical_table),
    };

    let text = match &column.cast_type {
        Some(cast_type) => format!("CAST({alias}.{} AS {cast_type})", info.physical_column),
        None => format!("{alias}.{}", info.physical_column),
    };

    if state.in_select_clause {
        // select_columns is populated by the caller so aggregates can wrap
        // this text before it lands in the list.
    } else {
        state.where_columns.push(text.clone());
    }

    Ok(text)
}

fn resolve_selection(state: &mut CompileState, selection: &Selection) -> Result<String, CompileError> {
    match selection {
        Selection::Column(column) => resolve_column(state, column),
        Selection::Function(function) => {
            if !state.in_select_clause {
                return Err(CompileError::AggregateInWhereClause);
            }
            let column_text = resolve_column(state, &function.column)?;
            Ok(format!("{}({column_text})", function.name))
        }
    }
}

fn render_expression(
    state: &mut CompileState,
    expression: &ConditionExpression,
) -> Result<String, CompileError> {
    Ok(match expression {
        ConditionExpression::Equal(v) => {
            state.bound_values.push(v.clone());
            " = ?".to_string()
        }
        ConditionExpression::NotEqual(v) => {
            state.bound_values.push(v.clone());
            " != ?".to_string()
        }
        ConditionExpression::LessThan(v) => {
            state.bound_values.push(v.clone());
            " < ?".to_string()
        }
        ConditionExpression::LessThanOrEqualTo(v) => {
            state.bound_values.push(v.clone());
            " <= ?".to_string()
        }
        ConditionExpression::GreaterThan(v) => {
            state.bound_values.push(v.clone());
            " > ?".to_string()
        }
        ConditionExpression::GreaterThanOrEqualTo(v) => {
            state.bound_values.push(v.clone());
            " >= ?".to_string()
        }
        ConditionExpression::Like(v) => {
            state.bound_values.push(v.clone());
            " LIKE ?".to_string()
        }
        ConditionExpression::In(values) => {
            let placeholders = vec!["?"; values.len()].join(", ");
            state.bound_values.extend(values.iter().cloned());
            format!(" IN ({placeholders})")
        }
        ConditionExpression::Between(low, high) => {
            state.bound_values.push(low.clone());
            state.bound_values.push(high.clone());
            " BETWEEN ? AND ?".to_string()
        }
        ConditionExpression::IsNull => " IS NULL".to_string(),
        ConditionExpression::IsNotNull => " IS NOT NULL".to_string(),
        ConditionExpression::Not(inner) => format!("NOT{}", render_expression(state, inner)?),
    })
}

/// Renders a leaf condition. A top-level `Not` is handled here rather than
/// in [`render_expression`] because it needs to land before the column, not
/// after it (`NOT t0.data_name IS NULL`, not `t0.data_name NOT IS NULL`).
fn render_condition(state: &mut CompileState, condition: &Condition) -> Result<String, CompileError> {
    let column_text = resolve_column(state, &condition.column)?;
    match &condition.expression {
        ConditionExpression::Not(inner) => Ok(format!(
            "NOT {column_text}{}",
            render_expression(state, inner)?
        )),
        expression => Ok(format!("{column_text}{}", render_expression(state, expression)?)),
    }
}

/// Renders a single term: a leaf condition or a parenthesized group.
fn render_term(state: &mut CompileState, node: &ConditionNode) -> Result<String, CompileError> {
    match node {
        ConditionNode::Leaf(condition) => render_condition(state, condition),
        ConditionNode::Grouping(inner) => Ok(format!("({})", render_chain(state, inner)?)),
        ConditionNode::And(inner) | ConditionNode::Or(inner) => render_term(state, inner),
    }
}

/// Renders a left-associative `AND`/`OR` chain. The grammar only ever
/// produces a bare term for the first element and an `And`/`Or`-wrapped
/// term for every element after it.
fn render_chain(state: &mut CompileState, nodes: &[ConditionNode]) -> Result<String, CompileError> {
    let mut sql = String::new();
    for (i, node) in nodes.iter().enumerate() {
        match node {
            ConditionNode::And(inner) => {
                sql.push_str(" AND ");
                sql.push_str(&render_term(state, inner)?);
            }
            ConditionNode::Or(inner) => {
                sql.push_str(" OR ");
                sql.push_str(&render_term(state, inner)?);
            }
            other => {
                debug_assert_eq!(i, 0, "only the first term in a chain may be bare");
                sql.push_str(&render_term(state, other)?);
            }
        }
    }
    Ok(sql)
}

/// Walks a whole `Select` once, producing the scratch state the planner
/// and emitter need. The `SELECT` list is visited before the `WHERE`
/// clause, matching the order `bound_values` must observe.
pub fn resolve(select: &Select) -> Result<CompileState, CompileError> {
    if select.selections.is_empty() {
        return Err(CompileError::EmptySelectionList);
    }

    let mut state = CompileState::new();

    state.in_select_clause = true;
    for selection in &select.selections {
        let text = resolve_selection(&mut state, selection)?;
        state.select_columns.push(text);
    }

    state.in_select_clause = false;
    if !select.conditions.is_empty() {
        state.conditions_sql = render_chain(&mut state, &select.conditions)?;
    }

    crate::debug_print!(
        "resolved {} required base table(s), {} bound value(s)",
        state.required_base_tables.len(),
        state.bound_values.len()
    );

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;
    use test_case::test_case;

    fn resolve_src(src: &str) -> CompileState {
        let tokens = lex(src).unwrap();
        let select = parse(&tokens).unwrap();
        resolve(&select).unwrap()
    }

    #[test]
    fn ordinary_columns_get_sequential_aliases() {
        let state = resolve_src("SELECT COLL_NAME, DATA_NAME");
        assert_eq!(state.required_base_tables, vec!["R_COLL_MAIN", "R_DATA_MAIN"]);
        assert_eq!(state.select_columns, vec!["t0.coll_name", "t1.data_name"]);
    }

    #[test]
    fn metadata_column_sets_flag_and_forces_entity_table() {
        let state = resolve_src("SELECT DATA_NAME, META_DATA_ATTR_NAME");
        assert!(state.needs_meta_data);
        assert_eq!(state.select_columns[1], "mmd.meta_attr_name");
        assert_eq!(state.required_base_tables, vec!["R_DATA_MAIN"]);
    }

    #[test]
    fn where_clause_binds_literal_left_to_right() {
        let state = resolve_src("SELECT DATA_NAME WHERE DATA_NAME IN ('a','b') AND DATA_SIZE > '10'");
        assert_eq!(state.bound_values, vec!["a", "b", "10"]);
        assert_eq!(
            state.conditions_sql,
            "t0.data_name IN (?, ?) AND t0.data_size > ?"
        );
    }

    #[test]
    fn unknown_column_is_rejected() {
        let err = resolve_src_err("SELECT FOO_BAR");
        assert!(matches!(err, CompileError::UnknownColumn(name) if name == "FOO_BAR"));
    }

    fn resolve_src_err(src: &str) -> CompileError {
        let tokens = lex(src).unwrap();
        let select = parse(&tokens).unwrap();
        resolve(&select).unwrap_err()
    }

    #[test_case("= '1'", " = ?"; "equal")]
    #[test_case("!= '1'", " != ?"; "not_equal")]
    #[test_case("< '1'", " < ?"; "less_than")]
    #[test_case("<= '1'", " <= ?"; "less_than_or_equal")]
    #[test_case("> '1'", " > ?"; "greater_than")]
    #[test_case(">= '1'", " >= ?"; "greater_than_or_equal")]
    #[test_case("LIKE '1'", " LIKE ?"; "like")]
    #[test_case("IS NULL", " IS NULL"; "is_null")]
    #[test_case("IS NOT NULL", " IS NOT NULL"; "is_not_null")]
    fn each_comparison_operator_emits_its_documented_fragment(rhs: &str, expected_suffix: &str) {
        let state = resolve_src(&format!("SELECT DATA_NAME WHERE DATA_NAME {rhs}"));
        assert!(
            state.conditions_sql.ends_with(expected_suffix),
            "{:?} did not end with {expected_suffix:?}",
            state.conditions_sql
        );
    }

    #[test]
    fn not_and_grouping_render_correctly() {
        let state = resolve_src(
            "SELECT DATA_NAME WHERE (DATA_SIZE BETWEEN '1' AND '2') AND NOT DATA_NAME IS NULL",
        );
        assert_eq!(
            state.conditions_sql,
            "(t0.data_size BETWEEN ? AND ?) AND NOT t0.data_name IS NULL"
        );
        assert_eq!(state.bound_values, vec!["1", "2"]);
    }
}
