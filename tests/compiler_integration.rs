//! End-to-end scenarios compiling GenQuery source directly through the
//! public API, one per documented contract.

use genquery2_sql::{compile, CompileError, CompileOptions};

fn opts(user: &str, admin_mode: bool) -> CompileOptions {
    CompileOptions {
        invoking_user: user.to_string(),
        admin_mode,
    }
}

#[test]
fn simple_projection_joins_coll_and_data_with_full_permission_predicate() {
    let result = compile("SELECT COLL_NAME, DATA_NAME", &opts("alice", false)).unwrap();

    assert!(result.sql.starts_with(
        "SELECT DISTINCT t0.coll_name, t1.data_name FROM R_COLL_MAIN t0 \
         INNER JOIN R_DATA_MAIN t1 ON t0.coll_id = t1.coll_id"
    ));
    assert!(result.sql.contains("INNER JOIN R_OBJT_ACCESS pdoa"));
    assert!(result.sql.contains("INNER JOIN R_OBJT_ACCESS pcoa"));
    assert!(result.sql.ends_with(
        "WHERE pdu.user_name = ? AND pcu.user_name = ? AND \
         pdoa.access_type_id >= 1050 AND pcoa.access_type_id >= 1050"
    ));
    assert_eq!(result.bound_values, vec!["alice", "alice"]);
}

#[test]
fn user_supplied_filter_in_admin_mode_drops_username_binding() {
    let result = compile(
        "SELECT DATA_NAME WHERE DATA_SIZE > '1000'",
        &opts("bob", true),
    )
    .unwrap();

    assert!(result.sql.ends_with("WHERE t0.data_size > ? AND pdoa.access_type_id >= 1000"));
    assert_eq!(result.bound_values, vec!["1000"]);
}

#[test]
fn metadata_join_projects_and_filters_through_fixed_aliases() {
    let result = compile(
        "SELECT DATA_NAME, META_DATA_ATTR_NAME WHERE META_DATA_ATTR_VALUE LIKE 'abc%'",
        &opts("alice", true),
    )
    .unwrap();

    assert!(result.sql.contains(
        "LEFT JOIN R_OBJT_METAMAP ommd ON t0.data_id = ommd.object_id \
         LEFT JOIN R_META_MAIN mmd ON ommd.meta_id = mmd.meta_id"
    ));
    assert!(result.sql.contains("mmd.meta_attr_value LIKE ?"));
    assert_eq!(result.bound_values.last().map(String::as_str), Some("abc%"));
}

#[test]
fn resource_hierarchy_prepends_recursive_cte_and_projects_hier() {
    let result = compile("SELECT DATA_NAME, DATA_RESC_HIER", &opts("alice", true)).unwrap();

    assert!(result.sql.starts_with("WITH RECURSIVE T AS ("));
    assert!(result.sql.contains("INNER JOIN T ON T.resc_id = "));
    assert!(result.sql.contains("T.hier"));
}

#[test]
fn in_list_with_order_by_and_paging_binds_left_to_right() {
    let result = compile(
        "SELECT DATA_NAME WHERE DATA_NAME IN ('a','b','c') \
         ORDER BY DATA_NAME DESC OFFSET 10 FETCH FIRST 5 ROWS ONLY",
        &opts("alice", true),
    )
    .unwrap();

    assert!(result.sql.contains(" IN (?, ?, ?) "));
    assert!(result
        .sql
        .ends_with("ORDER BY t0.data_name DESC OFFSET 10 FETCH FIRST 5 ROWS ONLY"));
    assert_eq!(result.bound_values, vec!["a", "b", "c"]);
}

#[test]
fn unknown_column_fails_compilation_with_no_sql_produced() {
    let err = compile("SELECT FOO_BAR", &opts("alice", false)).unwrap_err();
    assert!(matches!(err, CompileError::UnknownColumn(name) if name == "FOO_BAR"));
}

#[test]
fn neither_entity_table_present_emits_no_permission_predicate() {
    // USER_NAME routes through R_USER_MAIN only — neither R_DATA_MAIN nor
    // R_COLL_MAIN is required, so the documented open question applies: no
    // predicate is appended and the query is unrestricted.
    let result = compile("SELECT USER_NAME", &opts("alice", false)).unwrap();
    assert!(!result.sql.contains("WHERE"));
    assert!(result.bound_values.is_empty());
}

#[test]
fn aggregate_projection_wraps_resolved_column_text() {
    let result = compile("SELECT COUNT(DATA_ID)", &opts("alice", true)).unwrap();
    assert!(result.sql.starts_with("SELECT DISTINCT COUNT(t0.data_id)"));
}

#[test]
fn non_integer_offset_is_an_invalid_range_value() {
    let err = compile("SELECT DATA_NAME OFFSET abc", &opts("alice", false)).unwrap_err();
    assert!(matches!(err, CompileError::InvalidRangeValue(_)));
}

#[test]
fn compile_is_deterministic_across_repeated_calls() {
    let options = opts("alice", false);
    let first = compile("SELECT COLL_NAME, DATA_NAME", &options).unwrap();
    let second = compile("SELECT COLL_NAME, DATA_NAME", &options).unwrap();
    assert_eq!(first, second);
}
