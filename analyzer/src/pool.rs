// pool.rs — Translation-unit worker pool
//
// One OS thread per worker, each owning a private AST provider. Compile
// commands are sharded round-robin by index. Progress and diagnostic output
// share one lock; the summary tables have their own (see summary.rs), so
// printing never blocks the analysis.
//
// A translation unit that fails to load is logged and skipped; worker
// errors never cross threads.

use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::thread;

use tracing::{trace, warn};

use crate::compdb::CompileCommand;
use crate::diag::Diagnostic;
use crate::dimension::UnitTable;
use crate::message::MavlinkSpec;
use crate::provider::{AstProvider, DumpProvider};
use crate::summary::{AnalysisTables, SharedTables};
use crate::typeinfo::TypeInfo;
use crate::walker::{self, WalkContext, WalkOptions};

// ── Options and results ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct PoolOptions {
    /// Worker count override; defaults to the available parallelism.
    pub jobs: Option<usize>,
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub tables: AnalysisTables,
}

// ── Pool ────────────────────────────────────────────────────────────────────

/// Analyze every translation unit in the compilation database and collect
/// the merged result tables.
#[allow(clippy::too_many_arguments)]
pub fn run_pool(
    commands: &[CompileCommand],
    mavlink: &MavlinkSpec,
    priors: &HashMap<String, TypeInfo>,
    interesting_writes: &BTreeSet<String>,
    unit_names: &UnitTable,
    return_types: HashMap<String, TypeInfo>,
    walk_options: &WalkOptions,
    pool_options: &PoolOptions,
) -> AnalysisOutcome {
    let tables = SharedTables::new(commands.len(), return_types);
    let progress = Mutex::new(0usize);
    let collected: Mutex<Vec<Diagnostic>> = Mutex::new(Vec::new());

    let workers = pool_options
        .jobs
        .unwrap_or_else(|| {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
        .max(1);

    thread::scope(|scope| {
        for worker in 0..workers {
            let tables = &tables;
            let progress = &progress;
            let collected = &collected;
            scope.spawn(move || {
                let mut provider = DumpProvider::new();
                let ctx = WalkContext {
                    mavlink,
                    priors,
                    interesting_writes,
                    unit_names,
                    tables,
                    num_units: unit_names.len(),
                    options: walk_options,
                };

                let mut index = worker;
                while index < commands.len() {
                    let cmd = &commands[index];
                    {
                        let mut file_no =
                            progress.lock().expect("output lock poisoned");
                        *file_no += 1;
                        println!("{}/{} {}", *file_no, commands.len(), cmd.file.display());
                    }

                    match provider.parse(cmd) {
                        Ok(root) => {
                            trace!(worker, file = %cmd.file.display(), "walking translation unit");
                            let result = walker::walk_translation_unit(&root, index, &ctx);
                            if !result.diagnostics.is_empty() {
                                {
                                    let _output = progress.lock().expect("output lock poisoned");
                                    for diagnostic in &result.diagnostics {
                                        println!("{}", diagnostic);
                                    }
                                }
                                collected
                                    .lock()
                                    .expect("diagnostic buffer poisoned")
                                    .extend(result.diagnostics);
                            }
                        }
                        Err(e) => {
                            warn!(
                                "error building translation unit for {}: {}. skipping.",
                                cmd.source_path().display(),
                                e
                            );
                        }
                    }
                    index += workers;
                }
            });
        }
    });

    AnalysisOutcome {
        diagnostics: collected
            .into_inner()
            .expect("diagnostic buffer poisoned"),
        tables: tables.into_results(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
