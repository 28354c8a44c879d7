// scope.rs — Scoped type environment
//
// A stack of name → TypeInfo maps, one per lexical scope. Lookup walks from
// the innermost scope outward. Joining a finished branch/loop scope back
// into its parent merges only names the parent already knows; names local
// to the child die with it.
//
// Preconditions: callers push one scope per function before binding.
// Postconditions: after `unify_top`, every parent entry is a frame- and
//   unit-wise superset of its previous value.
// Failure modes: none; binding into an empty stack is a silent no-op.
// Side effects: none.

use std::collections::HashMap;

use crate::typeinfo::TypeInfo;

#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<HashMap<String, TypeInfo>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bind `name` in the innermost scope, replacing any previous binding
    /// there.
    pub fn bind(&mut self, name: &str, ti: TypeInfo) {
        if let Some(top) = self.scopes.last_mut() {
            top.insert(name.to_string(), ti);
        }
    }

    /// Merge `ti` into the innermost binding of `name`, creating the binding
    /// if the innermost scope has none.
    pub fn merge_bind(&mut self, name: &str, ti: &TypeInfo) {
        if let Some(top) = self.scopes.last_mut() {
            match top.get_mut(name) {
                Some(existing) => existing.merge(ti),
                None => {
                    top.insert(name.to_string(), ti.clone());
                }
            }
        }
    }

    /// The innermost binding of `name`, searching inner to outer.
    pub fn lookup(&self, name: &str) -> Option<&TypeInfo> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Join the innermost scope into its parent: for every name the parent
    /// already binds, merge the child's value in. Child-only names are
    /// discarded. The child scope itself stays on the stack (a `break`
    /// unifies without popping).
    pub fn unify_top(&mut self) {
        let n = self.scopes.len();
        if n < 2 {
            return;
        }
        let (head, tail) = self.scopes.split_at_mut(n - 1);
        let parent = &mut head[n - 2];
        for (name, ti) in &tail[0] {
            if let Some(existing) = parent.get_mut(name) {
                existing.merge(ti);
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
