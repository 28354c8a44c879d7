// expr.rs — Expression typer and name canonicalization
//
// Given a cursor, produce the `TypeInfo` of the value it evaluates to, if
// one is known. Resolution order per node: function parameter, scoped
// environment, prior-types catalog, known call return type, literal,
// multiplication; anything else recurses and yields the first typed
// sub-expression.
//
// Which operand of a binary operator is being evaluated is an explicit
// `Side` parameter; at most one operand subtree is visited per side.

use std::collections::{HashMap, HashSet};

use crate::cursor::{Cursor, CursorKind, Linkage};
use crate::scope::ScopeStack;
use crate::summary::SharedTables;
use crate::typeinfo::{TypeInfo, TypeSource};

// ── Typer ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Lhs,
    Rhs,
}

/// Borrowed view of the per-function typing context.
pub struct ExprTyper<'a> {
    pub env: &'a ScopeStack,
    pub params: &'a HashSet<String>,
    pub param_index: &'a HashMap<String, usize>,
    pub priors: &'a HashMap<String, TypeInfo>,
    pub tables: &'a SharedTables,
    pub num_units: usize,
}

impl ExprTyper<'_> {
    /// The type of the expression at `c`, or nothing if no rule applies
    /// anywhere in its subtree.
    pub fn type_expr(&self, c: &Cursor) -> Option<TypeInfo> {
        match c.kind {
            CursorKind::DeclRefExpr => {
                let name = c.spelling.as_str();
                if self.params.contains(name) {
                    let index = self.param_index.get(name).copied().unwrap_or(0);
                    return Some(TypeInfo::universal(
                        self.num_units,
                        TypeSource::param(index as i32),
                    ));
                }
                if let Some(ti) = self.env.lookup(name) {
                    return Some(ti.clone());
                }
                self.priors.get(name).cloned()
            }
            CursorKind::MemberRefExpr => {
                let path = member_path(c);
                if let Some(ti) = self.env.lookup(&path) {
                    return Some(ti.clone());
                }
                if let Some(ti) = self.priors.get(&path) {
                    return Some(ti.clone());
                }
                if let Some(object) = first_decl_name(c) {
                    if let Some(ti) = self.env.lookup(&object) {
                        return Some(ti.clone());
                    }
                }
                self.first_typed(&c.children)
            }
            CursorKind::CallExpr => {
                if !c.spelling.is_empty() {
                    if let Some(ti) = self.tables.return_type_of(&c.qualified_callee()) {
                        return Some(ti);
                    }
                }
                self.first_typed(&c.children)
            }
            CursorKind::IntegerLiteral => Some(TypeInfo::from_literal(c.value.unwrap_or(0))),
            CursorKind::BinaryOperator if c.spelling == "*" => {
                let lhs = self.type_operand(c, Side::Lhs);
                let rhs = self.type_operand(c, Side::Rhs);
                if let (Some(l), Some(r)) = (&lhs, &rhs) {
                    if let Some(ti) = TypeInfo::combine_mul(l, r) {
                        return Some(ti);
                    }
                }
                self.first_typed(&c.children)
            }
            _ => self.first_typed(&c.children),
        }
    }

    /// Type one operand of a binary operator without looking at the other.
    pub fn type_operand(&self, binop: &Cursor, side: Side) -> Option<TypeInfo> {
        match side {
            Side::Lhs => binop.children.first().and_then(|c| self.type_expr(c)),
            Side::Rhs => self.first_typed(binop.children.get(1..).unwrap_or(&[])),
        }
    }

    /// Type the right-hand side of a store, skipping the target expression.
    pub fn type_store_rhs(&self, store: &Cursor) -> Option<TypeInfo> {
        self.first_typed(store.children.get(1..).unwrap_or(&[]))
    }

    /// Type a call argument, degrading to the universal type when nothing
    /// is known.
    pub fn type_call_arg(&self, c: &Cursor) -> TypeInfo {
        self.type_expr(c)
            .unwrap_or_else(|| TypeInfo::universal(self.num_units, TypeSource::unknown()))
    }

    /// Type a declaration's initializer: the first typed expression among
    /// the declaration's children.
    pub fn type_initializer(&self, decl: &Cursor) -> Option<TypeInfo> {
        self.first_typed(&decl.children)
    }

    fn first_typed(&self, children: &[Cursor]) -> Option<TypeInfo> {
        children.iter().find_map(|c| self.type_expr(c))
    }
}

// ── Name canonicalization ───────────────────────────────────────────────────

/// Render a member access left-to-right with `::` separators, e.g.
/// `msg::pos::alt` for `msg.pos.alt`.
pub fn member_path(c: &Cursor) -> String {
    let mut prefix = String::new();
    collect_member_prefix(c, &mut prefix);
    format!("{}::{}", prefix, c.spelling)
}

fn collect_member_prefix(c: &Cursor, out: &mut String) {
    for child in &c.children {
        match child.kind {
            CursorKind::DeclRefExpr => out.insert_str(0, &child.spelling),
            CursorKind::MemberRefExpr => {
                out.insert_str(0, &format!("::{}", child.spelling));
            }
            _ => {}
        }
        collect_member_prefix(child, out);
    }
}

/// The scope-resolution prefix of a member access: every member component
/// plus the first variable reference, outermost first, excluding the
/// accessed field itself.
pub fn scope_resolution_prefix(c: &Cursor) -> String {
    let mut out = String::new();
    collect_scope_prefix(c, &mut out);
    out
}

fn collect_scope_prefix(c: &Cursor, out: &mut String) -> bool {
    for child in &c.children {
        match child.kind {
            CursorKind::DeclRefExpr => {
                if out.is_empty() {
                    *out = child.spelling.clone();
                } else {
                    *out = format!("{}::{}", child.spelling, out);
                }
                return true;
            }
            CursorKind::MemberRefExpr => {
                if out.is_empty() {
                    *out = child.spelling.clone();
                } else {
                    *out = format!("{}::{}", child.spelling, out);
                }
            }
            _ => {}
        }
        if collect_scope_prefix(child, out) {
            return true;
        }
    }
    false
}

/// True if the access contains a reference to a local (auto) variable
/// anywhere in its spine.
pub fn contains_local_ref(c: &Cursor) -> bool {
    c.children.iter().any(|child| {
        (child.kind == CursorKind::DeclRefExpr && child.linkage == Linkage::None)
            || contains_local_ref(child)
    })
}

/// True if the access goes through a file-scope identifier rather than a
/// local or an implicit `this`.
pub fn is_file_scope_access(c: &Cursor) -> bool {
    matches!(
        first_ref_linkage(c),
        Some(Linkage::Internal | Linkage::External)
    )
}

fn first_ref_linkage(c: &Cursor) -> Option<Linkage> {
    for child in &c.children {
        if child.kind == CursorKind::DeclRefExpr {
            return Some(child.linkage);
        }
        if let Some(linkage) = first_ref_linkage(child) {
            return Some(linkage);
        }
    }
    None
}

/// The first variable reference in an access, if any.
pub fn first_decl_name(c: &Cursor) -> Option<String> {
    for child in &c.children {
        if child.kind == CursorKind::DeclRefExpr {
            return Some(child.spelling.clone());
        }
        if let Some(name) = first_decl_name(child) {
            return Some(name);
        }
    }
    None
}

/// The innermost component of a `::`-joined semantic context.
pub fn smallest_context(context: &str) -> &str {
    match context.rfind("::") {
        Some(i) => &context[i + 2..],
        None => context,
    }
}

/// The `Scope::field` form of a member store target.
///
/// An access with no named spine components qualifies with the innermost
/// semantic context (`Copter::alt` for `this->alt` inside a `Copter`
/// method); a file-scope access qualifies with the referenced identifier's
/// own path; anything else gets both.
pub fn qualified_store_name(semantic_context: &str, c: &Cursor) -> String {
    let scope_ops = scope_resolution_prefix(c);
    let context = smallest_context(semantic_context);
    if scope_ops.is_empty() {
        format!("{}::{}", context, c.spelling)
    } else if is_file_scope_access(c) {
        format!("{}::{}", scope_ops, c.spelling)
    } else {
        format!("{}::{}::{}", context, scope_ops, c.spelling)
    }
}

/// The plain name of a store target: the bare declaration name, or the
/// member path for a field store (array subscripts look through to the
/// indexed object).
pub fn store_target_name(store: &Cursor) -> String {
    fn descend(c: &Cursor) -> String {
        match c.kind {
            CursorKind::MemberRefExpr => member_path(c),
            CursorKind::ArraySubscriptExpr => {
                c.children.first().map(descend).unwrap_or_default()
            }
            _ => c.spelling.clone(),
        }
    }
    store.children.first().map(descend).unwrap_or_default()
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::{dimension_of, UnitId};
    use crate::typeinfo::{Frame, TypeSourceKind};

    fn member(field: &str, object: Cursor) -> Cursor {
        Cursor::new(CursorKind::MemberRefExpr, field).with_children(vec![object])
    }

    fn local_ref(name: &str) -> Cursor {
        Cursor::new(CursorKind::DeclRefExpr, name)
    }

    fn global_ref(name: &str) -> Cursor {
        Cursor::new(CursorKind::DeclRefExpr, name).with_linkage(Linkage::External)
    }

    fn meters() -> TypeInfo {
        TypeInfo {
            frames: [Frame::Global].into_iter().collect(),
            units: [UnitId(0)].into_iter().collect(),
            source: vec![TypeSource::intrinsic(-1)],
            dimension: dimension_of("m"),
        }
    }

    struct Fixture {
        env: ScopeStack,
        params: HashSet<String>,
        param_index: HashMap<String, usize>,
        priors: HashMap<String, TypeInfo>,
        tables: SharedTables,
    }

    impl Fixture {
        fn new() -> Self {
            let mut env = ScopeStack::new();
            env.push();
            Fixture {
                env,
                params: HashSet::new(),
                param_index: HashMap::new(),
                priors: HashMap::new(),
                tables: SharedTables::new(0, HashMap::new()),
            }
        }

        fn typer(&self) -> ExprTyper<'_> {
            ExprTyper {
                env: &self.env,
                params: &self.params,
                param_index: &self.param_index,
                priors: &self.priors,
                tables: &self.tables,
                num_units: 4,
            }
        }
    }

    #[test]
    fn parameter_refs_type_as_universal() {
        let mut fx = Fixture::new();
        fx.params.insert("alt".to_string());
        fx.param_index.insert("alt".to_string(), 2);

        let ti = fx.typer().type_expr(&local_ref("alt")).expect("typed");
        assert_eq!(ti.units.len(), 4);
        assert_eq!(ti.source[0].kind, TypeSourceKind::Param);
        assert_eq!(ti.source[0].param_index, 2);
    }

    #[test]
    fn environment_beats_priors() {
        let mut fx = Fixture::new();
        fx.env.bind("v", meters());
        fx.priors.insert("v".to_string(), TypeInfo::default());

        let ti = fx.typer().type_expr(&local_ref("v")).expect("typed");
        assert_eq!(ti, meters());
    }

    #[test]
    fn member_access_resolves_through_path() {
        let mut fx = Fixture::new();
        fx.env.bind("msg::alt", meters());

        let access = member("alt", local_ref("msg"));
        let ti = fx.typer().type_expr(&access).expect("typed");
        assert_eq!(ti, meters());
    }

    #[test]
    fn call_return_types_come_from_shared_table() {
        let mut returns = HashMap::new();
        returns.insert("afrl::cmasi::AirVehicleState::getU".to_string(), meters());
        let mut fx = Fixture::new();
        fx.tables = SharedTables::new(0, returns);

        let call = Cursor::new(CursorKind::CallExpr, "getU")
            .with_semantic_parent("afrl::cmasi::AirVehicleState");
        let ti = fx.typer().type_expr(&call).expect("typed");
        assert_eq!(ti, meters());
    }

    #[test]
    fn literal_times_variable_scales_dimension() {
        let mut fx = Fixture::new();
        fx.env.bind("meters_value", meters());

        let product = Cursor::new(CursorKind::BinaryOperator, "*").with_children(vec![
            local_ref("meters_value"),
            Cursor::new(CursorKind::IntegerLiteral, "").with_value(100),
        ]);
        let decl = Cursor::new(CursorKind::VarDecl, "x").with_children(vec![product]);

        let ti = fx.typer().type_initializer(&decl).expect("typed");
        let d = ti.dimension.expect("dimension");
        assert_eq!(d.coefficients()[0], 1);
        assert_eq!(d.numerator(), 100);
        assert_eq!(d.denominator(), 1);
        assert_eq!(ti.units, meters().units);
    }

    #[test]
    fn store_rhs_skips_the_target() {
        let mut fx = Fixture::new();
        fx.env.bind("lhs", TypeInfo::default());
        fx.env.bind("rhs", meters());

        let store = Cursor::new(CursorKind::BinaryOperator, "=")
            .with_children(vec![local_ref("lhs"), local_ref("rhs")]);
        let ti = fx.typer().type_store_rhs(&store).expect("typed");
        assert_eq!(ti, meters());
    }

    #[test]
    fn untyped_call_arg_degrades_to_universal() {
        let fx = Fixture::new();
        let ti = fx.typer().type_call_arg(&local_ref("mystery"));
        assert_eq!(ti.units.len(), 4);
        assert_eq!(ti.source[0].kind, TypeSourceKind::Unknown);
    }

    #[test]
    fn member_path_renders_left_to_right() {
        let access = member("alt", member("pos", local_ref("msg")));
        assert_eq!(member_path(&access), "msg::pos::alt");
    }

    #[test]
    fn qualified_name_uses_innermost_context_for_this_access() {
        let access = Cursor::new(CursorKind::MemberRefExpr, "altitude_cm")
            .with_children(vec![Cursor::new(CursorKind::ThisExpr, "")]);
        assert_eq!(
            qualified_store_name("Vehicle::Copter", &access),
            "Copter::altitude_cm"
        );
    }

    #[test]
    fn qualified_name_uses_own_prefix_for_file_scope_access() {
        let access = member("alt", global_ref("gps_state"));
        assert_eq!(
            qualified_store_name("Copter", &access),
            "gps_state::alt"
        );
    }

    #[test]
    fn qualified_name_combines_for_local_member_chains() {
        let access = member("alt", member("pos", local_ref("nav")));
        assert!(contains_local_ref(&access));
        assert_eq!(
            qualified_store_name("Copter", &access),
            "Copter::nav::pos::alt"
        );
    }

    #[test]
    fn store_target_sees_through_subscripts() {
        let subscript = Cursor::new(CursorKind::ArraySubscriptExpr, "").with_children(vec![
            member("alt", local_ref("wp")),
            Cursor::new(CursorKind::IntegerLiteral, "").with_value(0),
        ]);
        let store = Cursor::new(CursorKind::BinaryOperator, "=")
            .with_children(vec![subscript, local_ref("rhs")]);
        assert_eq!(store_target_name(&store), "wp::alt");
    }
}
