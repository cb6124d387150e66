//! Public API: the single entry point the embedding layer calls to turn a
//! GenQuery source string into parameterized SQL.
//!
//! Each call to [`compile`] owns an independent [`crate::resolver::CompileState`]
//! — nothing here is shared between compilations except the immutable schema
//! catalog and the optional result cache described below. [`last_bound_values`]
//! mirrors the reference implementation's `get_bind_values()` accessor, which
//! returns the values produced by the most recent compile; since a
//! compilation is synchronous and thread-confined, this is backed by
//! thread-local storage rather than a process-wide global, so two threads
//! compiling concurrently never see each other's bindings.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::ast::Select;
use crate::config::CompilerConfig;
use crate::emitter;
use crate::errors::CompileError;
use crate::lexer;
use crate::parser;
use crate::resolver;

/// Per-compilation options. `invoking_user` is bound into the permission
/// predicate when `admin_mode` is false; `admin_mode` also selects the
/// access-level threshold (§4.6 of the schema catalog).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub invoking_user: String,
    pub admin_mode: bool,
}

/// The compiled statement: SQL text with `?` placeholders, plus the bound
/// values in left-to-right positional order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    pub sql: String,
    pub bound_values: Vec<String>,
}

thread_local! {
    static LAST_BOUND_VALUES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source: String,
    invoking_user: String,
    admin_mode: bool,
}

/// The optional compile cache described in the concurrency model: a bounded
/// map guarded by a single mutex. There is no prescribed eviction policy
/// beyond a bounded size, so this evicts in FIFO order once `cache_capacity`
/// is exceeded — the simplest policy that satisfies that contract.
struct CompileCache {
    entries: Mutex<HashMap<CacheKey, CompileResult>>,
    order: Mutex<Vec<CacheKey>>,
    capacity: usize,
    enabled: bool,
}

impl CompileCache {
    fn new(capacity: usize, enabled: bool) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            order: Mutex::new(Vec::new()),
            capacity,
            enabled,
        }
    }

    fn get(&self, key: &CacheKey) -> Option<CompileResult> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn insert(&self, key: CacheKey, result: CompileResult) {
        let mut entries = self.entries.lock().unwrap();
        let mut order = self.order.lock().unwrap();

        if !entries.contains_key(&key) {
            order.push(key.clone());
        }
        entries.insert(key, result);

        while entries.len() > self.capacity {
            if order.is_empty() {
                break;
            }
            let oldest = order.remove(0);
            entries.remove(&oldest);
        }
    }
}

fn cache() -> &'static CompileCache {
    static CACHE: OnceLock<CompileCache> = OnceLock::new();
    CACHE.get_or_init(|| {
        let config = CompilerConfig::from_env().unwrap_or_default();
        CompileCache::new(config.cache_capacity, config.cache_enabled)
    })
}

fn parse_to_ast(source: &str) -> Result<Select, CompileError> {
    let tokens = lexer::lex(source)?;
    parser::parse(&tokens)
}

/// Compiles one GenQuery source string into parameterized SQL.
///
/// The pipeline is: lex -> parse -> resolve -> plan -> emit. Any stage
/// failing aborts the whole compilation with a typed [`CompileError`]; there
/// is no partial output. On success, [`last_bound_values`] reflects the same
/// `bound_values` returned here for the calling thread.
pub fn compile(source: &str, options: &CompileOptions) -> Result<CompileResult, CompileError> {
    let key = CacheKey {
        source: source.to_string(),
        invoking_user: options.invoking_user.clone(),
        admin_mode: options.admin_mode,
    };

    let cache = cache();
    if cache.enabled {
        if let Some(hit) = cache.get(&key) {
            log::debug!("genquery2: compile cache hit");
            LAST_BOUND_VALUES.with(|last| *last.borrow_mut() = hit.bound_values.clone());
            return Ok(hit);
        }
    }

    log::debug!("genquery2: compiling source ({} bytes)", source.len());

    let select = parse_to_ast(source)?;
    let state = resolver::resolve(&select)?;
    let (sql, bound_values) = emitter::emit(&select, &state, options)?;

    let result = CompileResult { sql, bound_values };

    LAST_BOUND_VALUES.with(|last| *last.borrow_mut() = result.bound_values.clone());

    if cache.enabled {
        cache.insert(key, result.clone());
    }

    Ok(result)
}

/// Returns the `bound_values` produced by the most recent successful
/// [`compile`] call on this thread, without reordering them. A failed
/// compile leaves the previous thread-local value untouched, matching the
/// "no partial results" guarantee in the error model.
pub fn last_bound_values() -> Vec<String> {
    LAST_BOUND_VALUES.with(|last| last.borrow().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(user: &str, admin: bool) -> CompileOptions {
        CompileOptions {
            invoking_user: user.to_string(),
            admin_mode: admin,
        }
    }

    #[test]
    fn compiles_simple_projection_and_records_last_bound_values() {
        let result = compile("SELECT COLL_NAME, DATA_NAME", &options("alice", false)).unwrap();
        assert!(result.sql.starts_with("SELECT DISTINCT"));
        assert_eq!(result.bound_values, vec!["alice", "alice"]);
        assert_eq!(last_bound_values(), vec!["alice", "alice"]);
    }

    #[test]
    fn unknown_column_surfaces_as_typed_error_with_no_sql() {
        let err = compile("SELECT FOO_BAR", &options("alice", false)).unwrap_err();
        assert!(matches!(err, CompileError::UnknownColumn(name) if name == "FOO_BAR"));
    }

    #[test]
    fn deterministic_across_repeated_calls() {
        let opts = options("bob", true);
        let a = compile("SELECT DATA_NAME WHERE DATA_SIZE > '1000'", &opts).unwrap();
        let b = compile("SELECT DATA_NAME WHERE DATA_SIZE > '1000'", &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cache_returns_identical_result_on_second_lookup() {
        let opts = options("carol", false);
        let key = CacheKey {
            source: "SELECT DATA_NAME".to_string(),
            invoking_user: opts.invoking_user.clone(),
            admin_mode: opts.admin_mode,
        };
        let first = compile("SELECT DATA_NAME", &opts).unwrap();
        assert_eq!(cache().get(&key), Some(first));
    }

    #[test]
    fn cache_evicts_oldest_entry_past_capacity() {
        let cache = CompileCache::new(2, true);
        let k = |s: &str| CacheKey {
            source: s.to_string(),
            invoking_user: "u".to_string(),
            admin_mode: false,
        };
        let v = |s: &str| CompileResult {
            sql: s.to_string(),
            bound_values: Vec::new(),
        };
        cache.insert(k("a"), v("a"));
        cache.insert(k("b"), v("b"));
        cache.insert(k("c"), v("c"));
        assert!(cache.get(&k("a")).is_none());
        assert!(cache.get(&k("b")).is_some());
        assert!(cache.get(&k("c")).is_some());
    }
}
