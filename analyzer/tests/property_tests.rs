// Property-based tests for analysis invariants.
//
// Two categories:
// 1. Dimension algebra laws: associativity, commutativity, identity,
//    cancellation.
// 2. Lattice monotonicity: merging and scope unification only ever grow
//    frame/unit sets.
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use proptest::prelude::*;

use ufa::dimension::{Dimension, UnitId};
use ufa::scope::ScopeStack;
use ufa::typeinfo::{Frame, TypeInfo, TypeSource};

// ── Strategies ──────────────────────────────────────────────────────────────

fn arb_dimension() -> impl Strategy<Value = Dimension> {
    (prop::array::uniform7(-3i32..=3), 1i64..=60, 1i64..=60)
        .prop_map(|(coefficients, num, den)| Dimension::new(coefficients, num, den))
}

fn arb_typeinfo() -> impl Strategy<Value = TypeInfo> {
    (
        prop::collection::btree_set(prop::sample::select(Frame::CONSTRAINED.to_vec()), 0..5),
        prop::collection::btree_set((0u32..8).prop_map(UnitId), 0..5),
    )
        .prop_map(|(frames, units)| TypeInfo {
            frames,
            units,
            source: vec![TypeSource::unknown()],
            dimension: None,
        })
}

// ── Dimension laws ──────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn mul_is_commutative(a in arb_dimension(), b in arb_dimension()) {
        prop_assert_eq!(a * b, b * a);
    }

    #[test]
    fn mul_is_associative(a in arb_dimension(), b in arb_dimension(), c in arb_dimension()) {
        prop_assert_eq!((a * b) * c, a * (b * c));
    }

    #[test]
    fn unit_scalar_is_identity(a in arb_dimension()) {
        prop_assert_eq!(a * Dimension::scalar(1), a);
        prop_assert_eq!(Dimension::scalar(1) * a, a);
    }

    #[test]
    fn division_cancels_multiplication(a in arb_dimension(), b in arb_dimension()) {
        prop_assert_eq!((a * b) / b, a);
    }

    #[test]
    fn self_division_is_scalar_one(a in arb_dimension()) {
        prop_assert_eq!(a / a, Dimension::scalar(1));
    }
}

// ── Lattice monotonicity ────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn merge_grows_both_sets(a in arb_typeinfo(), b in arb_typeinfo()) {
        let mut merged = a.clone();
        merged.merge(&b);
        prop_assert!(merged.frames.is_superset(&a.frames));
        prop_assert!(merged.frames.is_superset(&b.frames));
        prop_assert!(merged.units.is_superset(&a.units));
        prop_assert!(merged.units.is_superset(&b.units));
        prop_assert_eq!(merged.dimension, a.dimension);
    }

    #[test]
    fn unify_makes_parent_entries_supersets(outer in arb_typeinfo(), inner in arb_typeinfo()) {
        let mut env = ScopeStack::new();
        env.push();
        env.bind("v", outer.clone());
        env.push();
        env.bind("v", inner);
        env.unify_top();
        env.pop();

        let after = env.lookup("v").expect("still bound").clone();
        prop_assert!(after.frames.is_superset(&outer.frames));
        prop_assert!(after.units.is_superset(&outer.units));
    }

    #[test]
    fn unify_never_leaks_child_only_names(inner in arb_typeinfo()) {
        let mut env = ScopeStack::new();
        env.push();
        env.push();
        env.bind("child_local", inner);
        env.unify_top();
        env.pop();
        prop_assert!(env.lookup("child_local").is_none());
    }
}
