// cursor.rs — Immutable AST cursor tree
//
// The analyzer never holds parser handles: the external C/C++ frontend hands
// over a complete, immutable tree of cursor records per translation unit,
// and everything downstream pattern-matches on it. Data-only module.
//
// Provider contract (see provider.rs):
//   * `spelling` of a `BinaryOperator` node is the operator token ("=", "==",
//     "*", ...).
//   * `children` of a `CallExpr` node are its argument expressions; the
//     callee is identified by `spelling` plus `semantic_parent` (the
//     qualifier path, empty for free functions).
//   * `linkage` on a `DeclRefExpr` is the linkage of the referenced
//     declaration. No linkage identifies a local (auto) variable.
//   * `value` carries the evaluated integer of an `IntegerLiteral`.

use serde::{Deserialize, Serialize};

// ── Node kinds ──────────────────────────────────────────────────────────────

/// The syntactic category of a cursor. Mirrors the subset of the frontend's
/// node kinds the analysis dispatches on; everything else arrives as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorKind {
    TranslationUnit,
    FunctionDecl,
    Method,
    ParmDecl,
    VarDecl,
    CompoundStmt,
    IfStmt,
    ForStmt,
    WhileStmt,
    SwitchStmt,
    BreakStmt,
    BinaryOperator,
    UnaryOperator,
    CallExpr,
    DeclRefExpr,
    MemberRefExpr,
    ThisExpr,
    ArraySubscriptExpr,
    IntegerLiteral,
    #[serde(other)]
    Other,
}

/// Linkage of a declaration (or of the declaration a reference resolves to).
/// `None` means auto scope, i.e. a local variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    #[default]
    None,
    Internal,
    External,
}

// ── Source location ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: u32,
}

// ── Cursor ──────────────────────────────────────────────────────────────────

/// One node of the frontend's cursor tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub kind: CursorKind,
    #[serde(default)]
    pub spelling: String,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub linkage: Linkage,
    #[serde(default)]
    pub usr: String,
    #[serde(default)]
    pub semantic_parent: String,
    #[serde(default)]
    pub location: SourceLocation,
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub children: Vec<Cursor>,
}

impl Cursor {
    /// Create a bare node. Builder methods fill in the rest; mainly used by
    /// tests and fixture generators.
    pub fn new(kind: CursorKind, spelling: impl Into<String>) -> Self {
        Cursor {
            kind,
            spelling: spelling.into(),
            type_name: String::new(),
            linkage: Linkage::None,
            usr: String::new(),
            semantic_parent: String::new(),
            location: SourceLocation::default(),
            value: None,
            children: Vec::new(),
        }
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    pub fn with_usr(mut self, usr: impl Into<String>) -> Self {
        self.usr = usr.into();
        self
    }

    pub fn with_semantic_parent(mut self, parent: impl Into<String>) -> Self {
        self.semantic_parent = parent.into();
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.location = SourceLocation {
            file: file.into(),
            line,
        };
        self
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_children(mut self, children: Vec<Cursor>) -> Self {
        self.children = children;
        self
    }

    /// The underlying object type name: qualifiers, references, and pointer
    /// sigils stripped from `type_name`.
    pub fn object_typename(&self) -> String {
        let mut result = self.type_name.replace("const ", "");
        result.retain(|c| c != '&' && c != '*');
        result.trim().to_string()
    }

    /// Fully qualified callee name of a `CallExpr`:
    /// `semantic_parent::spelling`, or the bare spelling for free functions.
    pub fn qualified_callee(&self) -> String {
        if self.semantic_parent.is_empty() {
            self.spelling.clone()
        } else {
            format!("{}::{}", self.semantic_parent, self.spelling)
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_typename_strips_qualifiers() {
        let c = Cursor::new(CursorKind::VarDecl, "msg")
            .with_type("const mavlink_odometry_t &");
        assert_eq!(c.object_typename(), "mavlink_odometry_t");

        let p = Cursor::new(CursorKind::ParmDecl, "msg").with_type("mavlink_odometry_t *");
        assert_eq!(p.object_typename(), "mavlink_odometry_t");
    }

    #[test]
    fn qualified_callee_joins_parent() {
        let free = Cursor::new(CursorKind::CallExpr, "getAltitude");
        assert_eq!(free.qualified_callee(), "getAltitude");

        let method = Cursor::new(CursorKind::CallExpr, "getAltitude")
            .with_semantic_parent("afrl::cmasi::AirVehicleState");
        assert_eq!(
            method.qualified_callee(),
            "afrl::cmasi::AirVehicleState::getAltitude"
        );
    }

    #[test]
    fn json_roundtrip_with_defaults() {
        let json = r#"{
            "kind": "function_decl",
            "spelling": "main",
            "children": [
                { "kind": "compound_stmt" },
                { "kind": "integer_literal", "value": 7 }
            ]
        }"#;
        let c: Cursor = serde_json::from_str(json).expect("parses");
        assert_eq!(c.kind, CursorKind::FunctionDecl);
        assert_eq!(c.spelling, "main");
        assert_eq!(c.linkage, Linkage::None);
        assert_eq!(c.children.len(), 2);
        assert_eq!(c.children[1].value, Some(7));

        let back = serde_json::to_string(&c).expect("serializes");
        let again: Cursor = serde_json::from_str(&back).expect("reparses");
        assert_eq!(c, again);
    }

    #[test]
    fn unknown_kind_maps_to_other() {
        let json = r#"{ "kind": "lambda_expr" }"#;
        let c: Cursor = serde_json::from_str(json).expect("parses");
        assert_eq!(c.kind, CursorKind::Other);
    }
}
