//! SQL emitter: assembles the resolver's scratch state and the planner's
//! join list into the final SQL text, in the fixed order the schema and
//! permission model require.

use crate::ast::Select;
use crate::catalog;
use crate::compiler::CompileOptions;
use crate::errors::CompileError;
use crate::planner;
use crate::resolver::{self, CompileState};

/// Assembles the final SQL string. Returns the text only: the caller
/// already owns `state.bound_values` from resolution and appends whatever
/// extra bindings the permission predicate contributes.
pub fn emit(select: &Select, state: &CompileState, options: &CompileOptions) -> Result<(String, Vec<String>), CompileError> {
    let inner_joins = planner::plan_inner_joins(&state.required_base_tables, &state.table_aliases)?;

    let mut sql = String::new();

    if state.needs_resc_hier {
        sql.push_str(catalog::DATA_RESC_HIER_WITH_CLAUSE);
    }

    sql.push_str("SELECT ");
    if select.distinct {
        sql.push_str("DISTINCT ");
    }
    sql.push_str(&state.select_columns.join(", "));

    let seed = state.required_base_tables[0];
    let seed_alias = &state.table_aliases[seed];
    sql.push_str(&format!(" FROM {seed} {seed_alias}"));

    for join in &inner_joins {
        sql.push(' ');
        sql.push_str(join);
    }

    let has_data = state.table_aliases.contains_key("R_DATA_MAIN");
    let has_coll = state.table_aliases.contains_key("R_COLL_MAIN");

    if has_data {
        let alias = &state.table_aliases["R_DATA_MAIN"];
        sql.push_str(&format!(
            " INNER JOIN R_OBJT_ACCESS {pdoa} ON {alias}.data_id = {pdoa}.object_id \
              INNER JOIN R_TOKN_MAIN {pdt} ON {pdoa}.access_type_id = {pdt}.token_id \
              INNER JOIN R_USER_MAIN {pdu} ON {pdoa}.user_id = {pdu}.user_id",
            pdoa = catalog::ALIAS_DATA_ACCESS,
            pdt = catalog::ALIAS_DATA_ACCESS_TOKEN,
            pdu = catalog::ALIAS_DATA_ACCESS_USER,
        ));
    }

    if has_coll {
        let alias = &state.table_aliases["R_COLL_MAIN"];
        sql.push_str(&format!(
            " INNER JOIN R_OBJT_ACCESS {pcoa} ON {alias}.coll_id = {pcoa}.object_id \
              INNER JOIN R_TOKN_MAIN {pct} ON {pcoa}.access_type_id = {pct}.token_id \
              INNER JOIN R_USER_MAIN {pcu} ON {pcoa}.user_id = {pcu}.user_id",
            pcoa = catalog::ALIAS_COLL_ACCESS,
            pct = catalog::ALIAS_COLL_ACCESS_TOKEN,
            pcu = catalog::ALIAS_COLL_ACCESS_USER,
        ));
    }

    if state.needs_meta_data {
        let alias = &state.table_aliases["R_DATA_MAIN"];
        sql.push_str(&format!(
            " LEFT JOIN R_OBJT_METAMAP {ommd} ON {alias}.data_id = {ommd}.object_id \
              LEFT JOIN R_META_MAIN {mmd} ON {ommd}.meta_id = {mmd}.meta_id",
            ommd = catalog::ALIAS_METAMAP_DATA,
            mmd = catalog::ALIAS_META_DATA,
        ));
    }

    if state.needs_meta_coll {
        let alias = &state.table_aliases["R_COLL_MAIN"];
        sql.push_str(&format!(
            " LEFT JOIN R_OBJT_METAMAP {ommc} ON {alias}.coll_id = {ommc}.object_id \
              LEFT JOIN R_META_MAIN {mmc} ON {ommc}.meta_id = {mmc}.meta_id",
            ommc = catalog::ALIAS_METAMAP_COLL,
            mmc = catalog::ALIAS_META_COLL,
        ));
    }

    if state.needs_meta_resc {
        let alias = &state.table_aliases["R_RESC_MAIN"];
        sql.push_str(&format!(
            " LEFT JOIN R_OBJT_METAMAP {ommr} ON {alias}.resc_id = {ommr}.object_id \
              LEFT JOIN R_META_MAIN {mmr} ON {ommr}.meta_id = {mmr}.meta_id",
            ommr = catalog::ALIAS_METAMAP_RESC,
            mmr = catalog::ALIAS_META_RESC,
        ));
    }

    if state.needs_meta_user {
        let alias = &state.table_aliases["R_USER_MAIN"];
        sql.push_str(&format!(
            " LEFT JOIN R_OBJT_METAMAP {ommu} ON {alias}.user_id = {ommu}.object_id \
              LEFT JOIN R_META_MAIN {mmu} ON {ommu}.meta_id = {mmu}.meta_id",
            ommu = catalog::ALIAS_METAMAP_USER,
            mmu = catalog::ALIAS_META_USER,
        ));
    }

    if state.needs_resc_hier {
        let alias = &state.table_aliases["R_RESC_MAIN"];
        sql.push_str(&format!(" INNER JOIN T ON T.resc_id = {alias}.resc_id"));
    }

    let threshold = if options.admin_mode {
        catalog::ADMIN_THRESHOLD
    } else {
        catalog::USER_THRESHOLD
    };

    let mut permission_binds = Vec::new();
    let permission_predicate = match (has_data, has_coll) {
        (true, true) => {
            if options.admin_mode {
                format!(
                    "{pdoa}.access_type_id >= {threshold} AND {pcoa}.access_type_id >= {threshold}",
                    pdoa = catalog::ALIAS_DATA_ACCESS,
                    pcoa = catalog::ALIAS_COLL_ACCESS,
                )
            } else {
                permission_binds.push(options.invoking_user.clone());
                permission_binds.push(options.invoking_user.clone());
                format!(
                    "{pdu}.user_name = ? AND {pcu}.user_name = ? AND {pdoa}.access_type_id >= {threshold} AND {pcoa}.access_type_id >= {threshold}",
                    pdu = catalog::ALIAS_DATA_ACCESS_USER,
                    pcu = catalog::ALIAS_COLL_ACCESS_USER,
                    pdoa = catalog::ALIAS_DATA_ACCESS,
                    pcoa = catalog::ALIAS_COLL_ACCESS,
                )
            }
        }
        (true, false) => {
            if options.admin_mode {
                format!("{pdoa}.access_type_id >= {threshold}", pdoa = catalog::ALIAS_DATA_ACCESS)
            } else {
                permission_binds.push(options.invoking_user.clone());
                format!(
                    "{pdu}.user_name = ? AND {pdoa}.access_type_id >= {threshold}",
                    pdu = catalog::ALIAS_DATA_ACCESS_USER,
                    pdoa = catalog::ALIAS_DATA_ACCESS,
                )
            }
        }
        (false, true) => {
            if options.admin_mode {
                format!("{pcoa}.access_type_id >= {threshold}", pcoa = catalog::ALIAS_COLL_ACCESS)
            } else {
                permission_binds.push(options.invoking_user.clone());
                format!(
                    "{pcu}.user_name = ? AND {pcoa}.access_type_id >= {threshold}",
                    pcu = catalog::ALIAS_COLL_ACCESS_USER,
                    pcoa = catalog::ALIAS_COLL_ACCESS,
                )
            }
        }
        (false, false) => String::new(),
    };

    if !state.conditions_sql.is_empty() || !permission_predicate.is_empty() {
        sql.push_str(" WHERE ");
        match (state.conditions_sql.is_empty(), permission_predicate.is_empty()) {
            (false, false) => {
                sql.push_str(&state.conditions_sql);
                sql.push_str(" AND ");
                sql.push_str(&permission_predicate);
            }
            (false, true) => sql.push_str(&state.conditions_sql),
            (true, false) => sql.push_str(&permission_predicate),
            (true, true) => unreachable!("guarded by the outer if"),
        }
    }

    let order_by_clause = emit_order_by(select, state)?;
    sql.push_str(&order_by_clause);

    if !select.range.offset.is_empty() {
        sql.push_str(&format!(" OFFSET {}", select.range.offset));
    }

    if !select.range.number_of_rows.is_empty() {
        sql.push_str(&format!(" FETCH FIRST {} ROWS ONLY", select.range.number_of_rows));
    }

    let mut bound_values = state.bound_values.clone();
    bound_values.extend(permission_binds);

    Ok((sql, bound_values))
}

fn emit_order_by(select: &Select, state: &CompileState) -> Result<String, CompileError> {
    if select.order_by.exprs.is_empty() {
        return Ok(String::new());
    }

    let mut rendered = Vec::with_capacity(select.order_by.exprs.len());

    for sort in &select.order_by.exprs {
        let info = catalog::COLUMN_NAME_MAPPINGS
            .get(sort.column.as_str())
            .ok_or_else(|| CompileError::UnknownColumnInOrderBy(sort.column.clone()))?;

        if !resolver::special_join_is_planned(state, &sort.column) {
            // A sort-only special column: its auxiliary join was never
            // planned because nothing in SELECT/WHERE referenced it. Per
            // the open question in the design notes, this is an error
            // rather than a dangling alias in the emitted SQL.
            return Err(CompileError::UnknownColumnInOrderBy(sort.column.clone()));
        }

        let alias = match resolver::special_alias(&sort.column) {
            Some(fixed) => fixed.to_string(),
            None => state
                .table_aliases
                .get(info.physical_table)
                .cloned()
                .ok_or_else(|| CompileError::UnknownColumnInOrderBy(sort.column.clone()))?,
        };

        let ast_ref = state
            .ast_column_refs
            .iter()
            .find(|c| c.name == sort.column)
            .ok_or_else(|| CompileError::UnknownColumnInOrderBy(sort.column.clone()))?;

        let direction = if sort.ascending { "ASC" } else { "DESC" };
        let column_text = format!("{alias}.{}", info.physical_column);
        match &ast_ref.cast_type {
            Some(cast_type) => rendered.push(format!("CAST({column_text} AS {cast_type}) {direction}")),
            None => rendered.push(format!("{column_text} {direction}")),
        }
    }

    Ok(format!(" ORDER BY {}", rendered.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileOptions;
    use crate::lexer::lex;
    use crate::parser::parse;
    use crate::resolver::resolve;

    fn compile_sql(src: &str, options: &CompileOptions) -> (String, Vec<String>) {
        let tokens = lex(src).unwrap();
        let select = parse(&tokens).unwrap();
        let state = resolve(&select).unwrap();
        emit(&select, &state, options).unwrap()
    }

    #[test]
    fn simple_projection_joins_data_and_coll_and_enforces_permissions() {
        let options = CompileOptions {
            invoking_user: "alice".into(),
            admin_mode: false,
        };
        let (sql, binds) = compile_sql("SELECT COLL_NAME, DATA_NAME", &options);
        assert!(sql.starts_with(
            "SELECT DISTINCT t0.coll_name, t1.data_name FROM R_COLL_MAIN t0 INNER JOIN R_DATA_MAIN t1 ON t0.coll_id = t1.coll_id"
        ));
        assert!(sql.ends_with(
            "WHERE pdu.user_name = ? AND pcu.user_name = ? AND pdoa.access_type_id >= 1050 AND pcoa.access_type_id >= 1050"
        ));
        assert_eq!(binds, vec!["alice", "alice"]);
    }

    #[test]
    fn admin_mode_drops_username_binding() {
        let options = CompileOptions {
            invoking_user: "bob".into(),
            admin_mode: true,
        };
        let (sql, binds) = compile_sql("SELECT DATA_NAME WHERE DATA_SIZE > '1000'", &options);
        assert!(sql.ends_with("WHERE t0.data_size > ? AND pdoa.access_type_id >= 1000"));
        assert_eq!(binds, vec!["1000"]);
    }

    #[test]
    fn resource_hierarchy_prepends_cte_and_projects_hier() {
        let options = CompileOptions {
            invoking_user: "alice".into(),
            admin_mode: true,
        };
        let (sql, _binds) = compile_sql("SELECT DATA_NAME, DATA_RESC_HIER", &options);
        assert!(sql.starts_with("WITH RECURSIVE T AS ("));
        assert!(sql.contains("INNER JOIN T ON T.resc_id = "));
        assert!(sql.contains("T.hier"));
    }

    #[test]
    fn sort_only_special_column_is_rejected_instead_of_emitting_a_dangling_alias() {
        let options = CompileOptions {
            invoking_user: "alice".into(),
            admin_mode: true,
        };
        let tokens = lex("SELECT DATA_NAME ORDER BY META_DATA_ATTR_NAME").unwrap();
        let select = parse(&tokens).unwrap();
        let state = resolve(&select).unwrap();
        let err = emit(&select, &state, &options).unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnknownColumnInOrderBy(name) if name == "META_DATA_ATTR_NAME"
        ));
    }

    #[test]
    fn order_by_on_a_projected_special_column_succeeds() {
        let options = CompileOptions {
            invoking_user: "alice".into(),
            admin_mode: true,
        };
        let (sql, _binds) = compile_sql(
            "SELECT DATA_NAME, META_DATA_ATTR_NAME ORDER BY META_DATA_ATTR_NAME",
            &options,
        );
        assert!(sql.ends_with("ORDER BY mmd.meta_attr_name ASC"));
    }
}
