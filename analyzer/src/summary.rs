// summary.rs — Function summaries and cross-thread tables
//
// One `FunctionSummary` per defined function; duplicates across translation
// units are resolved by the first thread to claim the function's USR. All
// cross-thread state sits behind a single coarse mutex with narrow accessor
// methods — the lock wraps one table read or update at a time and is never
// held across an AST traversal.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::typeinfo::{TypeInfo, TypeSourceKind};

// ── Function summary ────────────────────────────────────────────────────────

/// What the interprocedural pass needs to know about one function.
#[derive(Debug, Clone, Default)]
pub struct FunctionSummary {
    pub num_params: usize,
    /// Parameter position → where that parameter's type came from.
    pub param_source_kinds: HashMap<usize, TypeSourceKind>,
    pub callees: BTreeSet<String>,
    /// Callee name → one argument-type vector per call site.
    pub calling_context: HashMap<String, Vec<Vec<TypeInfo>>>,
    /// Canonical store target → merged right-hand-side type.
    pub store_to_typeinfo: HashMap<String, TypeInfo>,
}

// ── Shared tables ───────────────────────────────────────────────────────────

/// Everything the workers share, in one lockable bundle.
#[derive(Debug, Default)]
pub struct AnalysisTables {
    /// Per-translation-unit summaries, indexed by compile-command position.
    pub summaries: Vec<HashMap<String, FunctionSummary>>,
    /// Function name → translation units that published a summary for it.
    pub name_to_tu: HashMap<String, BTreeSet<usize>>,
    /// Functions that touched an intrinsically typed variable.
    pub intrinsic_fns: BTreeSet<String>,
    /// Functions that constrained a message frame via `==` or `switch`.
    pub frame_constrained_fns: BTreeSet<String>,
    /// USRs whose definition has been claimed by some translation unit.
    pub seen_usrs: HashSet<String>,
    /// Fully qualified function name → known return type.
    pub return_types: HashMap<String, TypeInfo>,
}

pub struct SharedTables {
    inner: Mutex<AnalysisTables>,
}

impl SharedTables {
    pub fn new(num_tus: usize, return_types: HashMap<String, TypeInfo>) -> Self {
        SharedTables {
            inner: Mutex::new(AnalysisTables {
                summaries: vec![HashMap::new(); num_tus],
                return_types,
                ..AnalysisTables::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AnalysisTables> {
        self.inner.lock().expect("summary lock poisoned")
    }

    /// True if some walker already claimed this USR.
    pub fn already_visited(&self, usr: &str) -> bool {
        self.lock().seen_usrs.contains(usr)
    }

    /// Claim a USR's definition. Returns true exactly once per USR; later
    /// callers (duplicate definitions from headers) get false.
    pub fn mark_definition(&self, usr: &str) -> bool {
        self.lock().seen_usrs.insert(usr.to_string())
    }

    pub fn mark_intrinsic(&self, function: &str) {
        self.lock().intrinsic_fns.insert(function.to_string());
    }

    pub fn mark_frame_constrained(&self, function: &str) {
        self.lock()
            .frame_constrained_fns
            .insert(function.to_string());
    }

    pub fn return_type_of(&self, fq_name: &str) -> Option<TypeInfo> {
        self.lock().return_types.get(fq_name).cloned()
    }

    /// Publish a finished function summary for one translation unit. Entries
    /// for the same name accumulate (overloads share a key).
    pub fn publish(&self, tu: usize, name: &str, summary: FunctionSummary) {
        let mut tables = self.lock();
        tables
            .name_to_tu
            .entry(name.to_string())
            .or_default()
            .insert(tu);
        let entry = tables.summaries[tu].entry(name.to_string()).or_default();
        entry.num_params = summary.num_params;
        entry.param_source_kinds = summary.param_source_kinds;
        entry.callees.extend(summary.callees);
        for (callee, contexts) in summary.calling_context {
            entry
                .calling_context
                .entry(callee)
                .or_default()
                .extend(contexts);
        }
        entry.store_to_typeinfo.extend(summary.store_to_typeinfo);
    }

    /// Tear down the shared wrapper once the workers have joined.
    pub fn into_results(self) -> AnalysisTables {
        self.inner
            .into_inner()
            .expect("summary lock poisoned")
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
