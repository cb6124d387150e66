//! The compile-time schema catalog: every physical table this compiler
//! knows how to join, the edges between them, and the dictionary that maps
//! a logical GenQuery column onto its physical home.
//!
//! Everything in this module is `'static` data computed once; nothing here
//! is ever mutated at runtime. A compilation borrows it, never owns it.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// Minimum `access_type_id` considered permitting when `admin_mode` is set.
pub const ADMIN_THRESHOLD: i32 = 1000;
/// Minimum `access_type_id` considered permitting for a regular user.
pub const USER_THRESHOLD: i32 = 1050;

/// Fixed aliases reserved for the auxiliary joins. These never collide with
/// a generated `t<k>` alias because the generator only ever produces that
/// one shape.
pub const ALIAS_META_DATA: &str = "mmd";
pub const ALIAS_META_COLL: &str = "mmc";
pub const ALIAS_META_RESC: &str = "mmr";
pub const ALIAS_META_USER: &str = "mmu";
pub const ALIAS_METAMAP_DATA: &str = "ommd";
pub const ALIAS_METAMAP_COLL: &str = "ommc";
pub const ALIAS_METAMAP_RESC: &str = "ommr";
pub const ALIAS_METAMAP_USER: &str = "ommu";
pub const ALIAS_DATA_ACCESS: &str = "pdoa";
pub const ALIAS_DATA_ACCESS_USER: &str = "pdu";
pub const ALIAS_DATA_ACCESS_TOKEN: &str = "pdt";
pub const ALIAS_COLL_ACCESS: &str = "pcoa";
pub const ALIAS_COLL_ACCESS_USER: &str = "pcu";
pub const ALIAS_COLL_ACCESS_TOKEN: &str = "pct";
pub const ALIAS_RESC_HIER: &str = "T";

/// The recursive CTE that expands every resource into its full parent
/// chain. `hier` is the semicolon-joined path from the row to its root;
/// `parent_id` is the integer parse of `resc_parent`, or `0` when that
/// column is empty (a resource with no parent is its own root).
pub const DATA_RESC_HIER_WITH_CLAUSE: &str = concat!(
    "WITH RECURSIVE T AS (",
    "SELECT resc_id, resc_name AS hier, ",
    "CASE WHEN resc_parent = '' THEN 0 ELSE CAST(resc_parent AS BIGINT) END AS parent_id ",
    "FROM R_RESC_MAIN WHERE resc_id > 0 ",
    "UNION ALL ",
    "SELECT T.resc_id, CAST((U.resc_name || ';' || T.hier) AS VARCHAR(250)), ",
    "CASE WHEN U.resc_parent = '' THEN 0 ELSE CAST(U.resc_parent AS BIGINT) END ",
    "FROM T INNER JOIN R_RESC_MAIN U ON U.resc_id = T.parent_id",
    ") ",
);

/// Every physical table this compiler can route a join through. The index
/// of a name in this array is its vertex id in the join graph, so this
/// order must stay stable — [`TABLE_EDGES`] and [`TABLE_JOINS`] are
/// positional against it.
pub const TABLE_NAMES: [&str; 20] = [
    "R_COLL_MAIN",             // 0
    "R_DATA_MAIN",             // 1
    "R_META_MAIN",             // 2
    "R_OBJT_ACCESS",           // 3
    "R_OBJT_METAMAP",          // 4
    "R_RESC_MAIN",             // 5
    "R_RULE_EXEC",             // 6
    "R_SPECIFIC_QUERY",        // 7
    "R_TICKET_ALLOWED_HOSTS",  // 8
    "R_TICKET_ALLOWED_USERS",  // 9
    "R_TICKET_ALLOWED_GROUPS", // 10
    "R_TICKET_MAIN",           // 11
    "R_TOKN_MAIN",             // 12
    "R_USER_AUTH",             // 13
    "R_USER_GROUP",            // 14
    "R_USER_MAIN",             // 15
    "R_USER_PASSWORD",         // 16
    "R_USER_SESSION_KEY",      // 17
    "R_ZONE_MAIN",             // 18
    "R_QUOTA_MAIN",            // 19
];

/// Undirected join edges between [`TABLE_NAMES`] vertex indices.
pub const TABLE_EDGES: &[(usize, usize)] = &[
    (0, 1),  // R_COLL_MAIN.coll_id = R_DATA_MAIN.coll_id
    (0, 3),  // R_COLL_MAIN.coll_id = R_OBJT_ACCESS.object_id
    (0, 4),  // R_COLL_MAIN.coll_id = R_OBJT_METAMAP.object_id
    (0, 11), // R_COLL_MAIN.coll_id = R_TICKET_MAIN.object_id
    (1, 3),  // R_DATA_MAIN.data_id = R_OBJT_ACCESS.object_id
    (1, 4),  // R_DATA_MAIN.data_id = R_OBJT_METAMAP.object_id
    (1, 5),  // R_DATA_MAIN.resc_id = R_RESC_MAIN.resc_id
    (1, 11), // R_DATA_MAIN.data_id = R_TICKET_MAIN.object_id
    (2, 4),  // R_META_MAIN.meta_id = R_OBJT_METAMAP.meta_id
    (3, 12), // R_OBJT_ACCESS.access_type_id = R_TOKN_MAIN.token_id
    (4, 5),  // R_OBJT_METAMAP.object_id = R_RESC_MAIN.resc_id
    (4, 15), // R_OBJT_METAMAP.object_id = R_USER_MAIN.user_id
    (11, 15), // R_TICKET_MAIN.user_id = R_USER_MAIN.user_id
    (11, 8), // R_TICKET_MAIN.ticket_id = R_TICKET_ALLOWED_HOSTS.ticket_id
    (11, 9), // R_TICKET_MAIN.ticket_id = R_TICKET_ALLOWED_USERS.ticket_id
    (11, 10), // R_TICKET_MAIN.ticket_id = R_TICKET_ALLOWED_GROUPS.ticket_id
    (15, 13), // R_USER_MAIN.user_id = R_USER_AUTH.user_id
    (15, 14), // R_USER_MAIN.user_id = R_USER_GROUP.group_user_id
    (15, 16), // R_USER_MAIN.user_id = R_USER_PASSWORD.user_id
    (15, 17), // R_USER_MAIN.user_id = R_USER_SESSION_KEY.user_id
];

/// Two-slot ON-clause templates, positional against [`TABLE_EDGES`]. The
/// first `{}` takes the edge's left-hand alias, the second the right-hand
/// alias — see [`render_join_template`].
pub const TABLE_JOINS: &[&str] = &[
    "{}.coll_id = {}.coll_id",
    "{}.coll_id = {}.object_id",
    "{}.coll_id = {}.object_id",
    "{}.coll_id = {}.object_id",
    "{}.data_id = {}.object_id",
    "{}.data_id = {}.object_id",
    "{}.resc_id = {}.resc_id",
    "{}.data_id = {}.object_id",
    "{}.meta_id = {}.meta_id",
    "{}.access_type_id = {}.token_id",
    "{}.object_id = {}.resc_id",
    "{}.object_id = {}.user_id",
    "{}.user_id = {}.user_id",
    "{}.ticket_id = {}.ticket_id",
    "{}.ticket_id = {}.ticket_id",
    "{}.ticket_id = {}.ticket_id",
    "{}.user_id = {}.user_id",
    "{}.user_id = {}.group_user_id",
    "{}.user_id = {}.user_id",
    "{}.user_id = {}.user_id",
];

/// Substitutes `lhs` and `rhs` into a template's two `{}` slots in order.
/// Deliberately not a general format string: the only inputs this ever
/// receives are compile-time templates and generated aliases, never
/// source-controlled text.
pub fn render_join_template(template: &str, lhs: &str, rhs: &str) -> String {
    let mut parts = template.splitn(3, "{}");
    let before = parts.next().unwrap_or_default();
    let middle = parts.next().unwrap_or_default();
    let after = parts.next().unwrap_or_default();
    format!("{before}{lhs}{middle}{rhs}{after}")
}

/// Looks up a table's vertex index in [`TABLE_NAMES`].
pub fn table_name_index(table_name: &str) -> Option<usize> {
    TABLE_NAMES.iter().position(|&name| name == table_name)
}

/// Finds the join template for an edge between two tables, trying both
/// orientations since the graph is undirected.
pub fn find_join(lhs_table: &str, rhs_table: &str) -> Option<&'static str> {
    let lhs_idx = table_name_index(lhs_table)?;
    let rhs_idx = table_name_index(rhs_table)?;
    TABLE_EDGES
        .iter()
        .position(|&(a, b)| (a, b) == (lhs_idx, rhs_idx) || (a, b) == (rhs_idx, lhs_idx))
        .map(|i| TABLE_JOINS[i])
}

/// The physical home of a logical column, plus the discriminator that
/// disambiguates logical columns sharing a physical metadata table (the
/// `META_{DATA,COLL,RESC,USER}_*` families all live in `R_META_MAIN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnInfo {
    pub physical_table: &'static str,
    pub physical_column: &'static str,
    pub discriminator: u8,
}

impl ColumnInfo {
    const fn new(physical_table: &'static str, physical_column: &'static str) -> Self {
        Self {
            physical_table,
            physical_column,
            discriminator: 0,
        }
    }

    const fn with_discriminator(
        physical_table: &'static str,
        physical_column: &'static str,
        discriminator: u8,
    ) -> Self {
        Self {
            physical_table,
            physical_column,
            discriminator,
        }
    }
}

lazy_static! {
    /// Logical column name -> physical location. Transcribed from the
    /// reference catalog's column dictionary, with the permission-name and
    /// permission-user columns split out into their own logical names
    /// (`DATA_ACCESS_PERM_NAME`, `DATA_ACCESS_USER_NAME`, and their `COLL_`
    /// counterparts) since those require distinct aliases during join
    /// resolution.
    pub static ref COLUMN_NAME_MAPPINGS: HashMap<&'static str, ColumnInfo> = {
        let mut m = HashMap::new();

        // Zone
        m.insert("ZONE_ID", ColumnInfo::new("R_ZONE_MAIN", "zone_id"));
        m.insert("ZONE_NAME", ColumnInfo::new("R_ZONE_MAIN", "zone_name"));
        m.insert("ZONE_TYPE", ColumnInfo::new("R_ZONE_MAIN", "zone_type_name"));
        m.insert("ZONE_CONNECTION", ColumnInfo::new("R_ZONE_MAIN", "zone_conn_string"));
        m.insert("ZONE_COMMENT", ColumnInfo::new("R_ZONE_MAIN", "r_comment"));
        m.insert("ZONE_CREATE_TIME", ColumnInfo::new("R_ZONE_MAIN", "create_ts"));
        m.insert("ZONE_MODIFY_TIME", ColumnInfo::new("R_ZONE_MAIN", "modify_ts"));

        // User
        m.insert("USER_ID", ColumnInfo::new("R_USER_MAIN", "user_id"));
        m.insert("USER_NAME", ColumnInfo::new("R_USER_MAIN", "user_name"));
        m.insert("USER_TYPE", ColumnInfo::new("R_USER_MAIN", "user_type_name"));
        m.insert("USER_ZONE", ColumnInfo::new("R_USER_MAIN", "zone_name"));
        m.insert("USER_INFO", ColumnInfo::new("R_USER_MAIN", "user_info"));
        m.insert("USER_COMMENT", ColumnInfo::new("R_USER_MAIN", "r_comment"));
        m.insert("USER_CREATE_TIME", ColumnInfo::new("R_USER_MAIN", "create_ts"));
        m.insert("USER_MODIFY_TIME", ColumnInfo::new("R_USER_MAIN", "modify_ts"));
        m.insert("USER_AUTH_ID", ColumnInfo::new("R_USER_AUTH", "user_id"));
        m.insert("USER_DN", ColumnInfo::new("R_USER_AUTH", "user_auth_name"));
        // Legacy alias for USER_COMMENT, kept for compatibility with older
        // GenQuery callers that still reference the pre-R_USER_AUTH name.
        m.insert("USER_DN_INVALID", ColumnInfo::new("R_USER_MAIN", "r_comment"));
        m.insert("USER_GROUP_ID", ColumnInfo::new("R_USER_GROUP", "group_user_id"));
        m.insert("USER_GROUP_NAME", ColumnInfo::new("R_USER_MAIN", "user_name"));

        // Resource
        m.insert("RESC_ID", ColumnInfo::new("R_RESC_MAIN", "resc_id"));
        m.insert("RESC_NAME", ColumnInfo::new("R_RESC_MAIN", "resc_name"));
        m.insert("RESC_ZONE_NAME", ColumnInfo::new("R_RESC_MAIN", "zone_name"));
        m.insert("RESC_TYPE_NAME", ColumnInfo::new("R_RESC_MAIN", "resc_type_name"));
        m.insert("RESC_CLASS_NAME", ColumnInfo::new("R_RESC_MAIN", "resc_class_name"));
        m.insert("RESC_HOSTNAME", ColumnInfo::new("R_RESC_MAIN", "resc_net"));
        m.insert("RESC_VAULT_PATH", ColumnInfo::new("R_RESC_MAIN", "resc_def_path"));
        m.insert("RESC_FREE_SPACE", ColumnInfo::new("R_RESC_MAIN", "free_space"));
        m.insert("RESC_FREE_SPACE_TIME", ColumnInfo::new("R_RESC_MAIN", "free_space_ts"));
        m.insert("RESC_INFO", ColumnInfo::new("R_RESC_MAIN", "resc_info"));
        m.insert("RESC_COMMENT", ColumnInfo::new("R_RESC_MAIN", "r_comment"));
        m.insert("RESC_STATUS", ColumnInfo::new("R_RESC_MAIN", "resc_status"));
        m.insert("RESC_CREATE_TIME", ColumnInfo::new("R_RESC_MAIN", "create_ts"));
        m.insert("RESC_MODIFY_TIME", ColumnInfo::new("R_RESC_MAIN", "modify_ts"));
        m.insert("RESC_CHILDREN", ColumnInfo::new("R_RESC_MAIN", "resc_children"));
        m.insert("RESC_CONTEXT", ColumnInfo::new("R_RESC_MAIN", "resc_context"));
        m.insert("RESC_PARENT", ColumnInfo::new("R_RESC_MAIN", "resc_parent"));
        m.insert("RESC_PARENT_CONTEXT", ColumnInfo::new("R_RESC_MAIN", "resc_parent_context"));

        // Data objects
        m.insert("DATA_ID", ColumnInfo::new("R_DATA_MAIN", "data_id"));
        m.insert("DATA_COLL_ID", ColumnInfo::new("R_DATA_MAIN", "coll_id"));
        m.insert("DATA_NAME", ColumnInfo::new("R_DATA_MAIN", "data_name"));
        m.insert("DATA_REPL_NUM", ColumnInfo::new("R_DATA_MAIN", "data_repl_num"));
        m.insert("DATA_VERSION", ColumnInfo::new("R_DATA_MAIN", "data_version"));
        m.insert("DATA_TYPE_NAME", ColumnInfo::new("R_DATA_MAIN", "data_type_name"));
        m.insert("DATA_SIZE", ColumnInfo::new("R_DATA_MAIN", "data_size"));
        m.insert("DATA_PATH", ColumnInfo::new("R_DATA_MAIN", "data_path"));
        m.insert("DATA_OWNER_NAME", ColumnInfo::new("R_DATA_MAIN", "data_owner_name"));
        m.insert("DATA_OWNER_ZONE", ColumnInfo::new("R_DATA_MAIN", "data_owner_zone"));
        m.insert("DATA_REPL_STATUS", ColumnInfo::new("R_DATA_MAIN", "data_is_dirty"));
        m.insert("DATA_STATUS", ColumnInfo::new("R_DATA_MAIN", "data_status"));
        m.insert("DATA_CHECKSUM", ColumnInfo::new("R_DATA_MAIN", "data_checksum"));
        m.insert("DATA_EXPIRY", ColumnInfo::new("R_DATA_MAIN", "data_expiry_ts"));
        m.insert("DATA_MAP_ID", ColumnInfo::new("R_DATA_MAIN", "data_map_id"));
        m.insert("DATA_COMMENTS", ColumnInfo::new("R_DATA_MAIN", "r_comment"));
        m.insert("DATA_CREATE_TIME", ColumnInfo::new("R_DATA_MAIN", "create_ts"));
        m.insert("DATA_MODIFY_TIME", ColumnInfo::new("R_DATA_MAIN", "modify_ts"));
        m.insert("DATA_MODE", ColumnInfo::new("R_DATA_MAIN", "data_mode"));
        m.insert("DATA_RESC_ID", ColumnInfo::new("R_DATA_MAIN", "resc_id"));
        m.insert("DATA_RESC_HIER", ColumnInfo::new("R_RESC_MAIN", "hier"));

        // Collections
        m.insert("COLL_ID", ColumnInfo::new("R_COLL_MAIN", "coll_id"));
        m.insert("COLL_NAME", ColumnInfo::new("R_COLL_MAIN", "coll_name"));
        m.insert("COLL_PARENT_NAME", ColumnInfo::new("R_COLL_MAIN", "parent_coll_name"));
        m.insert("COLL_OWNER_NAME", ColumnInfo::new("R_COLL_MAIN", "coll_owner_name"));
        m.insert("COLL_OWNER_ZONE", ColumnInfo::new("R_COLL_MAIN", "coll_owner_zone"));
        m.insert("COLL_MAP_ID", ColumnInfo::new("R_COLL_MAIN", "coll_map_id"));
        m.insert("COLL_INHERITANCE", ColumnInfo::new("R_COLL_MAIN", "coll_inheritance"));
        m.insert("COLL_COMMENTS", ColumnInfo::new("R_COLL_MAIN", "r_comment"));
        m.insert("COLL_CREATE_TIME", ColumnInfo::new("R_COLL_MAIN", "create_ts"));
        m.insert("COLL_MODIFY_TIME", ColumnInfo::new("R_COLL_MAIN", "modify_ts"));
        m.insert("COLL_TYPE", ColumnInfo::new("R_COLL_MAIN", "coll_type"));
        m.insert("COLL_INFO1", ColumnInfo::new("R_COLL_MAIN", "coll_info1"));
        m.insert("COLL_INFO2", ColumnInfo::new("R_COLL_MAIN", "coll_info2"));

        // Metadata, one family per entity kind, all physically in R_META_MAIN
        // but discriminated so they never alias onto the same join.
        m.insert("META_DATA_ATTR_NAME", ColumnInfo::new("R_META_MAIN", "meta_attr_name"));
        m.insert("META_DATA_ATTR_VALUE", ColumnInfo::new("R_META_MAIN", "meta_attr_value"));
        m.insert("META_DATA_ATTR_UNITS", ColumnInfo::new("R_META_MAIN", "meta_attr_unit"));
        m.insert("META_DATA_ATTR_ID", ColumnInfo::new("R_META_MAIN", "meta_id"));
        m.insert("META_DATA_CREATE_TIME", ColumnInfo::new("R_META_MAIN", "create_ts"));
        m.insert("META_DATA_MODIFY_TIME", ColumnInfo::new("R_META_MAIN", "modify_ts"));

        m.insert("META_COLL_ATTR_NAME", ColumnInfo::with_discriminator("R_META_MAIN", "meta_attr_name", 1));
        m.insert("META_COLL_ATTR_VALUE", ColumnInfo::with_discriminator("R_META_MAIN", "meta_attr_value", 1));
        m.insert("META_COLL_ATTR_UNITS", ColumnInfo::with_discriminator("R_META_MAIN", "meta_attr_unit", 1));
        m.insert("META_COLL_ATTR_ID", ColumnInfo::with_discriminator("R_META_MAIN", "meta_id", 1));
        m.insert("META_COLL_CREATE_TIME", ColumnInfo::with_discriminator("R_META_MAIN", "create_ts", 1));
        m.insert("META_COLL_MODIFY_TIME", ColumnInfo::with_discriminator("R_META_MAIN", "modify_ts", 1));

        m.insert("META_RESC_ATTR_NAME", ColumnInfo::with_discriminator("R_META_MAIN", "meta_attr_name", 2));
        m.insert("META_RESC_ATTR_VALUE", ColumnInfo::with_discriminator("R_META_MAIN", "meta_attr_value", 2));
        m.insert("META_RESC_ATTR_UNITS", ColumnInfo::with_discriminator("R_META_MAIN", "meta_attr_unit", 2));
        m.insert("META_RESC_ATTR_ID", ColumnInfo::with_discriminator("R_META_MAIN", "meta_id", 2));
        m.insert("META_RESC_CREATE_TIME", ColumnInfo::with_discriminator("R_META_MAIN", "create_ts", 2));
        m.insert("META_RESC_MODIFY_TIME", ColumnInfo::with_discriminator("R_META_MAIN", "modify_ts", 2));

        m.insert("META_USER_ATTR_NAME", ColumnInfo::with_discriminator("R_META_MAIN", "meta_attr_name", 3));
        m.insert("META_USER_ATTR_VALUE", ColumnInfo::with_discriminator("R_META_MAIN", "meta_attr_value", 3));
        m.insert("META_USER_ATTR_UNITS", ColumnInfo::with_discriminator("R_META_MAIN", "meta_attr_unit", 3));
        m.insert("META_USER_ATTR_ID", ColumnInfo::with_discriminator("R_META_MAIN", "meta_id", 3));
        m.insert("META_USER_CREATE_TIME", ColumnInfo::with_discriminator("R_META_MAIN", "create_ts", 3));
        m.insert("META_USER_MODIFY_TIME", ColumnInfo::with_discriminator("R_META_MAIN", "modify_ts", 3));

        // Data object permissions: the generic R_OBJT_ACCESS columns plus the
        // two logical names that resolve through an extra join instead.
        m.insert("DATA_ACCESS_TYPE", ColumnInfo::new("R_OBJT_ACCESS", "access_type_id"));
        m.insert("DATA_ACCESS_USER_ID", ColumnInfo::new("R_OBJT_ACCESS", "user_id"));
        m.insert("DATA_ACCESS_DATA_ID", ColumnInfo::new("R_OBJT_ACCESS", "object_id"));
        m.insert("DATA_ACCESS_PERM_NAME", ColumnInfo::new("R_TOKN_MAIN", "token_name"));
        m.insert("DATA_ACCESS_USER_NAME", ColumnInfo::new("R_USER_MAIN", "user_name"));
        m.insert("DATA_TOKEN_NAMESPACE", ColumnInfo::new("R_TOKN_MAIN", "token_namespace"));

        // Collection permissions, same shape.
        m.insert("COLL_ACCESS_TYPE", ColumnInfo::new("R_OBJT_ACCESS", "access_type_id"));
        m.insert("COLL_ACCESS_USER_ID", ColumnInfo::new("R_OBJT_ACCESS", "user_id"));
        m.insert("COLL_ACCESS_COLL_ID", ColumnInfo::new("R_OBJT_ACCESS", "object_id"));
        m.insert("COLL_ACCESS_PERM_NAME", ColumnInfo::new("R_TOKN_MAIN", "token_name"));
        m.insert("COLL_ACCESS_USER_NAME", ColumnInfo::new("R_USER_MAIN", "user_name"));
        m.insert("COLL_TOKEN_NAMESPACE", ColumnInfo::new("R_TOKN_MAIN", "token_namespace"));

        // Tokens
        m.insert("TOKEN_NAMESPACE", ColumnInfo::new("R_TOKN_MAIN", "token_namespace"));
        m.insert("TOKEN_ID", ColumnInfo::new("R_TOKN_MAIN", "token_id"));
        m.insert("TOKEN_NAME", ColumnInfo::new("R_TOKN_MAIN", "token_name"));
        m.insert("TOKEN_VALUE", ColumnInfo::new("R_TOKN_MAIN", "token_value"));
        m.insert("TOKEN_VALUE2", ColumnInfo::new("R_TOKN_MAIN", "token_value2"));
        m.insert("TOKEN_VALUE3", ColumnInfo::new("R_TOKN_MAIN", "token_value3"));
        m.insert("TOKEN_COMMENT", ColumnInfo::new("R_TOKN_MAIN", "r_comment"));

        // Rule execution queue
        m.insert("RULE_EXEC_ID", ColumnInfo::new("R_RULE_EXEC", "rule_exec_id"));
        m.insert("RULE_EXEC_NAME", ColumnInfo::new("R_RULE_EXEC", "rule_name"));
        m.insert("RULE_EXEC_REI_FILE_PATH", ColumnInfo::new("R_RULE_EXEC", "rei_file_path"));
        m.insert("RULE_EXEC_USER_NAME", ColumnInfo::new("R_RULE_EXEC", "user_name"));
        m.insert("RULE_EXEC_ADDRESS", ColumnInfo::new("R_RULE_EXEC", "exe_address"));
        m.insert("RULE_EXEC_TIME", ColumnInfo::new("R_RULE_EXEC", "exe_time"));
        m.insert("RULE_EXEC_FREQUENCY", ColumnInfo::new("R_RULE_EXEC", "exe_frequency"));
        m.insert("RULE_EXEC_PRIORITY", ColumnInfo::new("R_RULE_EXEC", "priority"));
        m.insert("RULE_EXEC_ESTIMATED_EXE_TIME", ColumnInfo::new("R_RULE_EXEC", "estimated_exe_time"));
        m.insert("RULE_EXEC_NOTIFICATION_ADDR", ColumnInfo::new("R_RULE_EXEC", "notification_addr"));
        m.insert("RULE_EXEC_LAST_EXE_TIME", ColumnInfo::new("R_RULE_EXEC", "last_exe_time"));
        m.insert("RULE_EXEC_STATUS", ColumnInfo::new("R_RULE_EXEC", "exe_status"));

        // Tickets
        m.insert("TICKET_ID", ColumnInfo::new("R_TICKET_MAIN", "ticket_id"));
        m.insert("TICKET_STRING", ColumnInfo::new("R_TICKET_MAIN", "ticket_string"));
        m.insert("TICKET_TYPE", ColumnInfo::new("R_TICKET_MAIN", "ticket_type"));
        m.insert("TICKET_USER_ID", ColumnInfo::new("R_TICKET_MAIN", "user_id"));
        m.insert("TICKET_OBJECT_ID", ColumnInfo::new("R_TICKET_MAIN", "object_id"));
        m.insert("TICKET_OBJECT_TYPE", ColumnInfo::new("R_TICKET_MAIN", "object_type"));
        m.insert("TICKET_USES_LIMIT", ColumnInfo::new("R_TICKET_MAIN", "uses_limit"));
        m.insert("TICKET_USES_COUNT", ColumnInfo::new("R_TICKET_MAIN", "uses_count"));
        m.insert("TICKET_WRITE_FILE_LIMIT", ColumnInfo::new("R_TICKET_MAIN", "write_file_limit"));
        m.insert("TICKET_WRITE_FILE_COUNT", ColumnInfo::new("R_TICKET_MAIN", "write_file_count"));
        m.insert("TICKET_WRITE_BYTE_LIMIT", ColumnInfo::new("R_TICKET_MAIN", "write_byte_limit"));
        m.insert("TICKET_WRITE_BYTE_COUNT", ColumnInfo::new("R_TICKET_MAIN", "write_byte_count"));
        m.insert("TICKET_EXPIRY_TS", ColumnInfo::new("R_TICKET_MAIN", "ticket_expiry_ts"));
        m.insert("TICKET_CREATE_TIME", ColumnInfo::new("R_TICKET_MAIN", "create_time"));
        m.insert("TICKET_MODIFY_TIME", ColumnInfo::new("R_TICKET_MAIN", "modify_time"));
        m.insert("TICKET_ALLOWED_HOST", ColumnInfo::new("R_TICKET_ALLOWED_HOSTS", "host"));
        m.insert("TICKET_ALLOWED_HOST_TICKET_ID", ColumnInfo::new("R_TICKET_ALLOWED_HOSTS", "ticket_id"));
        m.insert("TICKET_ALLOWED_USER_NAME", ColumnInfo::new("R_TICKET_ALLOWED_USERS", "user_name"));
        m.insert("TICKET_ALLOWED_USER_TICKET_ID", ColumnInfo::new("R_TICKET_ALLOWED_USERS", "ticket_id"));
        m.insert("TICKET_ALLOWED_GROUP_NAME", ColumnInfo::new("R_TICKET_ALLOWED_GROUPS", "group_name"));
        m.insert("TICKET_ALLOWED_GROUP_TICKET_ID", ColumnInfo::new("R_TICKET_ALLOWED_GROUPS", "ticket_id"));
        m.insert("TICKET_DATA_NAME", ColumnInfo::new("R_DATA_MAIN", "data_name"));
        m.insert("TICKET_COLL_NAME", ColumnInfo::new("R_COLL_MAIN", "coll_name"));
        m.insert("TICKET_OWNER_NAME", ColumnInfo::new("R_USER_MAIN", "user_name"));
        m.insert("TICKET_OWNER_ZONE", ColumnInfo::new("R_USER_MAIN", "zone_name"));

        // Quotas
        m.insert("QUOTA_USER_ID", ColumnInfo::new("R_QUOTA_MAIN", "user_id"));
        m.insert("QUOTA_RESC_ID", ColumnInfo::new("R_QUOTA_MAIN", "resc_id"));
        m.insert("QUOTA_LIMIT", ColumnInfo::new("R_QUOTA_MAIN", "quota_limit"));
        m.insert("QUOTA_OVER", ColumnInfo::new("R_QUOTA_MAIN", "quota_over"));
        m.insert("QUOTA_MODIFY_TIME", ColumnInfo::new("R_QUOTA_MAIN", "modify_ts"));
        m.insert("QUOTA_USER_NAME", ColumnInfo::new("R_USER_MAIN", "user_name"));
        m.insert("QUOTA_USER_TYPE", ColumnInfo::new("R_USER_MAIN", "user_type_name"));
        m.insert("QUOTA_USER_ZONE", ColumnInfo::new("R_USER_MAIN", "zone_name"));
        m.insert("QUOTA_RESC_NAME", ColumnInfo::new("R_RESC_MAIN", "resc_name"));

        m
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mapped_physical_table_exists_in_table_names() {
        for (logical, info) in COLUMN_NAME_MAPPINGS.iter() {
            assert!(
                TABLE_NAMES.contains(&info.physical_table),
                "{logical} maps to unknown table {}",
                info.physical_table
            );
        }
    }

    #[test]
    fn table_edges_are_within_bounds() {
        for &(a, b) in TABLE_EDGES {
            assert!(a < TABLE_NAMES.len());
            assert!(b < TABLE_NAMES.len());
        }
        assert_eq!(TABLE_EDGES.len(), TABLE_JOINS.len());
    }

    #[test]
    fn render_join_template_substitutes_both_slots() {
        let rendered = render_join_template("{}.coll_id = {}.coll_id", "t0", "t1");
        assert_eq!(rendered, "t0.coll_id = t1.coll_id");
    }

    #[test]
    fn find_join_works_in_either_orientation() {
        assert!(find_join("R_COLL_MAIN", "R_DATA_MAIN").is_some());
        assert!(find_join("R_DATA_MAIN", "R_COLL_MAIN").is_some());
        assert!(find_join("R_COLL_MAIN", "R_ZONE_MAIN").is_none());
    }

    #[test]
    fn discriminators_distinguish_metadata_families() {
        let data = COLUMN_NAME_MAPPINGS.get("META_DATA_ATTR_VALUE").unwrap();
        let coll = COLUMN_NAME_MAPPINGS.get("META_COLL_ATTR_VALUE").unwrap();
        assert_eq!(data.discriminator, 0);
        assert_eq!(coll.discriminator, 1);
        assert_eq!(data.physical_column, coll.physical_column);
    }
}
