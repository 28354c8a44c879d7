// walker.rs — Per-function AST walker
//
// Runs once per function definition: drives the scoped environment, records
// declarations and stores, detects frame-constraining predicates, and
// publishes a summary when the function's defining translation unit exits
// its body. Branch, loop, and switch bodies get their own scope which is
// joined back into the parent on exit; a `break` joins eagerly.
//
// Preconditions: the cursor tree follows the provider contract (cursor.rs);
//   unit IDs are fully allocated before walking starts.
// Postconditions: every diagnostic for this translation unit is in the
//   returned `WalkResult`, ordered by source traversal.
// Failure modes: none — unknown constructs are walked through.
// Side effects: shared-table updates; optional append to the write-dump file.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Write;
use std::mem::take;
use std::path::PathBuf;

use tracing::{trace, warn};

use crate::cursor::{Cursor, CursorKind};
use crate::diag::{Diagnostic, SourceRef};
use crate::dimension::{UnitId, UnitTable};
use crate::expr::{self, ExprTyper};
use crate::message::MavlinkSpec;
use crate::scope::ScopeStack;
use crate::summary::{FunctionSummary, SharedTables};
use crate::typeinfo::{Frame, TypeInfo, TypeSource, TypeSourceKind};

// ── Context and results ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Append each canonical member-store target here (debugging aid).
    pub dump_writes: Option<PathBuf>,
}

/// Read-only inputs shared by every walk in the run.
pub struct WalkContext<'a> {
    pub mavlink: &'a MavlinkSpec,
    pub priors: &'a HashMap<String, TypeInfo>,
    pub interesting_writes: &'a BTreeSet<String>,
    pub unit_names: &'a UnitTable,
    pub tables: &'a SharedTables,
    pub num_units: usize,
    pub options: &'a WalkOptions,
}

#[derive(Debug, Default)]
pub struct WalkResult {
    pub diagnostics: Vec<Diagnostic>,
}

/// Walk one translation unit's cursor tree.
pub fn walk_translation_unit(
    root: &Cursor,
    tu_index: usize,
    ctx: &WalkContext<'_>,
) -> WalkResult {
    let mut walker = FunctionWalker::new(tu_index, ctx);
    walker.visit(root);
    WalkResult {
        diagnostics: walker.diagnostics,
    }
}

// ── Walker ──────────────────────────────────────────────────────────────────

struct FunctionWalker<'a> {
    ctx: &'a WalkContext<'a>,
    tu_index: usize,
    diagnostics: Vec<Diagnostic>,

    // per-function state, reset in `analyze_function`
    env: ScopeStack,
    semantic_context: String,
    current_fn: String,
    current_usr: String,
    params: HashSet<String>,
    param_index: HashMap<String, usize>,
    param_source_kinds: HashMap<usize, TypeSourceKind>,
    total_params: usize,
    had_frame_constraint: bool,
    had_taint: bool,
    had_definition: bool,
    callees: BTreeSet<String>,
    calling_context: HashMap<String, Vec<Vec<TypeInfo>>>,
    store_to_typeinfo: HashMap<String, TypeInfo>,
}

impl<'a> FunctionWalker<'a> {
    fn new(tu_index: usize, ctx: &'a WalkContext<'a>) -> Self {
        FunctionWalker {
            ctx,
            tu_index,
            diagnostics: Vec::new(),
            env: ScopeStack::new(),
            semantic_context: String::new(),
            current_fn: String::new(),
            current_usr: String::new(),
            params: HashSet::new(),
            param_index: HashMap::new(),
            param_source_kinds: HashMap::new(),
            total_params: 0,
            had_frame_constraint: false,
            had_taint: false,
            had_definition: false,
            callees: BTreeSet::new(),
            calling_context: HashMap::new(),
            store_to_typeinfo: HashMap::new(),
        }
    }

    fn typer(&self) -> ExprTyper<'_> {
        ExprTyper {
            env: &self.env,
            params: &self.params,
            param_index: &self.param_index,
            priors: self.ctx.priors,
            tables: self.ctx.tables,
            num_units: self.ctx.num_units,
        }
    }

    /// Find function definitions anywhere in the tree.
    fn visit(&mut self, c: &Cursor) {
        match c.kind {
            CursorKind::FunctionDecl | CursorKind::Method => self.analyze_function(c),
            _ => {
                for child in &c.children {
                    self.visit(child);
                }
            }
        }
    }

    fn analyze_function(&mut self, c: &Cursor) {
        if self.ctx.tables.already_visited(&c.usr) {
            return;
        }

        self.had_frame_constraint = false;
        self.had_taint = false;
        self.had_definition = false;
        self.current_fn = c.spelling.clone();
        self.current_usr = c.usr.clone();
        self.env.push();

        let saved_context_len = self.semantic_context.len();
        if c.kind == CursorKind::Method && !c.semantic_parent.is_empty() {
            if self.semantic_context.is_empty() {
                self.semantic_context = c.semantic_parent.clone();
            } else {
                self.semantic_context =
                    format!("{}::{}", self.semantic_context, c.semantic_parent);
            }
        }

        trace!(function = %self.current_fn, "walking function");
        for child in &c.children {
            self.walk_stmt(child);
        }

        if self.had_taint && self.had_definition && !self.had_frame_constraint {
            self.diagnostics.push(Diagnostic::UnconstrainedFrame {
                function: c.spelling.clone(),
            });
        }
        if self.had_frame_constraint {
            self.ctx.tables.mark_frame_constrained(&self.current_fn);
        }
        if self.had_definition {
            let summary = FunctionSummary {
                num_params: self.total_params,
                param_source_kinds: take(&mut self.param_source_kinds),
                callees: take(&mut self.callees),
                calling_context: take(&mut self.calling_context),
                store_to_typeinfo: take(&mut self.store_to_typeinfo),
            };
            self.ctx
                .tables
                .publish(self.tu_index, &self.current_fn, summary);
        }

        self.env.pop();
        self.params.clear();
        self.param_index.clear();
        self.param_source_kinds.clear();
        self.total_params = 0;
        self.callees.clear();
        self.calling_context.clear();
        self.store_to_typeinfo.clear();
        self.semantic_context.truncate(saved_context_len);
        trace!(function = %self.current_fn, "done with function");
    }

    fn walk_stmt(&mut self, c: &Cursor) {
        match c.kind {
            CursorKind::IfStmt => {
                if let Some(cond) = c.children.first() {
                    if cond.kind == CursorKind::BinaryOperator && cond.spelling == "==" {
                        self.check_frame_constraint(cond);
                    }
                }
                self.env.push();
                for child in c.children.iter().skip(1) {
                    self.walk_stmt(child);
                }
                self.env.unify_top();
                self.env.pop();
            }
            CursorKind::ForStmt | CursorKind::WhileStmt => {
                self.env.push();
                for child in &c.children {
                    self.walk_stmt(child);
                }
                self.env.unify_top();
                self.env.pop();
            }
            CursorKind::SwitchStmt => {
                if let Some(selector) = c.children.first() {
                    if self.check_frame_constraint(selector) {
                        self.diagnostics.push(Diagnostic::FrameSwitch);
                    }
                }
                self.env.push();
                for child in &c.children {
                    self.walk_stmt(child);
                }
                self.env.unify_top();
                self.env.pop();
            }
            CursorKind::BreakStmt => self.env.unify_top(),
            CursorKind::VarDecl => {
                self.handle_var_decl(c);
                for child in &c.children {
                    self.walk_stmt(child);
                }
            }
            CursorKind::BinaryOperator => {
                if c.spelling == "=" {
                    self.handle_store(c);
                }
                for child in &c.children {
                    self.walk_stmt(child);
                }
            }
            CursorKind::CallExpr => {
                self.handle_call(c);
                for child in &c.children {
                    self.walk_stmt(child);
                }
            }
            CursorKind::ParmDecl => self.handle_param(c),
            CursorKind::CompoundStmt => {
                if !self.had_definition {
                    self.had_definition = self.ctx.tables.mark_definition(&self.current_usr);
                }
                for child in &c.children {
                    self.walk_stmt(child);
                }
            }
            _ => {
                for child in &c.children {
                    self.walk_stmt(child);
                }
            }
        }
    }

    /// Does this predicate or selector touch the frame field of a message
    /// type? Looks at the first member access over a variable reference.
    fn check_frame_constraint(&mut self, c: &Cursor) -> bool {
        let hit = self.find_frame_access(c).unwrap_or(false);
        if hit {
            self.had_frame_constraint = true;
        }
        hit
    }

    fn find_frame_access(&self, c: &Cursor) -> Option<bool> {
        for child in &c.children {
            if c.kind == CursorKind::MemberRefExpr && child.kind == CursorKind::DeclRefExpr {
                let type_name = child.object_typename();
                return Some(
                    self.ctx.mavlink.frame_field_of_type.get(&type_name) == Some(&c.spelling),
                );
            }
            if let Some(hit) = self.find_frame_access(child) {
                return Some(hit);
            }
        }
        None
    }

    /// Expand the fields of a message-typed variable into the current scope.
    fn add_inner_vars(&mut self, type_name: &str, var_name: &str, source: TypeSource) {
        let Some(fields) = self.ctx.mavlink.field_units.get(type_name) else {
            return;
        };
        for (field, &unit) in fields {
            let ti = TypeInfo {
                frames: Frame::CONSTRAINED.iter().copied().collect(),
                units: [unit].into_iter().collect(),
                source: vec![source.clone()],
                dimension: None,
            };
            self.env.merge_bind(&format!("{}::{}", var_name, field), &ti);
        }
    }

    fn handle_var_decl(&mut self, c: &Cursor) {
        let type_name = c.object_typename();
        let is_framed = self.ctx.mavlink.frame_field_of_type.contains_key(&type_name);

        if is_framed {
            self.add_inner_vars(&type_name, &c.spelling, TypeSource::intrinsic(0));
        } else {
            let initializer = self.typer().type_initializer(c);
            if let Some(ti) = initializer {
                self.env.bind(&c.spelling, ti);
            }
        }

        if is_framed || self.ctx.mavlink.field_units.contains_key(&type_name) {
            self.ctx.tables.mark_intrinsic(&self.current_fn);
            if is_framed {
                self.had_taint = true;
            }
        }
    }

    fn handle_param(&mut self, c: &Cursor) {
        let type_name = c.object_typename();
        let name = c.spelling.clone();
        let index = self.total_params;
        self.param_index.insert(name.clone(), index);

        let is_framed = self.ctx.mavlink.frame_field_of_type.contains_key(&type_name);
        if is_framed || self.ctx.mavlink.field_units.contains_key(&type_name) {
            self.add_inner_vars(&type_name, &name, TypeSource::intrinsic(index as i32));
            self.param_source_kinds
                .insert(index, TypeSourceKind::Intrinsic);
            self.ctx.tables.mark_intrinsic(&self.current_fn);
            if is_framed {
                self.had_taint = true;
            }
        } else {
            self.param_source_kinds
                .insert(index, TypeSourceKind::Unknown);
            self.params.insert(name.clone());
            let ti = TypeInfo::universal(self.ctx.num_units, TypeSource::param(index as i32));
            self.env.bind(&name, ti);
        }
        self.total_params += 1;
    }

    fn handle_call(&mut self, c: &Cursor) {
        if c.spelling == "operator=" {
            self.handle_store(c);
            return;
        }
        if c.spelling.is_empty() {
            return;
        }
        let args: Vec<TypeInfo> = {
            let typer = self.typer();
            c.children.iter().map(|arg| typer.type_call_arg(arg)).collect()
        };
        self.callees.insert(c.spelling.clone());
        self.calling_context
            .entry(c.spelling.clone())
            .or_default()
            .push(args);
    }

    /// A store: type the right-hand side, canonicalize the target, compare
    /// against the prior catalog, and update the environment.
    fn handle_store(&mut self, c: &Cursor) {
        let Some(rhs) = self.typer().type_store_rhs(c) else {
            return;
        };

        let plain_target = expr::store_target_name(c);
        let member_target = match c.children.first() {
            Some(lhs)
                if matches!(lhs.kind, CursorKind::MemberRefExpr | CursorKind::ThisExpr)
                    && !expr::contains_local_ref(lhs) =>
            {
                let name = expr::qualified_store_name(&self.semantic_context, lhs);
                self.dump_write(&name);
                Some(name)
            }
            _ => None,
        };
        let target = member_target.unwrap_or(plain_target);
        if target.is_empty() {
            return;
        }

        if self.ctx.interesting_writes.contains(&target) {
            if let Some(expected) = self.ctx.priors.get(&target) {
                if rhs != *expected {
                    self.diagnostics.push(Diagnostic::IncorrectStore {
                        variable: target.clone(),
                        site: SourceRef {
                            file: c.location.file.clone(),
                            line: c.location.line,
                        },
                        got: self.unit_name(&rhs.units),
                        expected: self.unit_name(&expected.units),
                    });
                }
            }
            self.ctx.tables.mark_intrinsic(&self.current_fn);
            trace!(function = %self.current_fn, target = %target, "found interesting store");
            self.store_to_typeinfo
                .entry(target.clone())
                .or_default()
                .merge(&rhs);
            self.env.bind(&target, rhs);
        } else {
            self.env.bind(&target, rhs);
        }
    }

    fn unit_name(&self, units: &BTreeSet<UnitId>) -> String {
        let id = units.iter().next_back().copied().unwrap_or(UnitId(0));
        self.ctx
            .unit_names
            .name_of(id)
            .unwrap_or("<unknown>")
            .to_string()
    }

    fn dump_write(&self, target: &str) {
        let Some(path) = &self.ctx.options.dump_writes else {
            return;
        };
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| writeln!(f, "{}", target));
        if let Err(e) = result {
            warn!(path = %path.display(), "cannot append to write dump: {}", e);
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
