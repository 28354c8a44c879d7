// typeinfo.rs — Semantic type lattice
//
// `TypeInfo` is the value carried through the analysis: the set of
// coordinate frames a value may be expressed in, the set of units it may be
// measured in, where that belief came from, and (when known) its physical
// dimension. The empty set means "no information contributed yet" and is
// distinct from "any".

use std::collections::BTreeSet;

use crate::dimension::{Dimension, UnitId};

// ── Coordinate frames ───────────────────────────────────────────────────────

/// The fixed coordinate-frame enumeration. `None` is strictly the largest
/// value; "any frame" is every variant below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frame {
    Global,
    LocalNed,
    Mission,
    GlobalRelativeAlt,
    LocalEnu,
    GlobalInt,
    GlobalRelativeAltInt,
    LocalOffsetNed,
    BodyNed,
    BodyOffsetNed,
    GlobalTerrainAlt,
    GlobalTerrainAltInt,
    BodyFrd,
    LocalFrd,
    LocalFlu,
    None,
}

impl Frame {
    /// Every concrete frame, in order, excluding `None`.
    pub const CONSTRAINED: [Frame; 15] = [
        Frame::Global,
        Frame::LocalNed,
        Frame::Mission,
        Frame::GlobalRelativeAlt,
        Frame::LocalEnu,
        Frame::GlobalInt,
        Frame::GlobalRelativeAltInt,
        Frame::LocalOffsetNed,
        Frame::BodyNed,
        Frame::BodyOffsetNed,
        Frame::GlobalTerrainAlt,
        Frame::GlobalTerrainAltInt,
        Frame::BodyFrd,
        Frame::LocalFrd,
        Frame::LocalFlu,
    ];

    /// Resolve a frame constant spelling from the message vocabulary.
    pub fn from_name(name: &str) -> Option<Frame> {
        let frame = match name {
            "MAV_FRAME_GLOBAL" => Frame::Global,
            "MAV_FRAME_LOCAL_NED" => Frame::LocalNed,
            "MAV_FRAME_MISSION" => Frame::Mission,
            "MAV_FRAME_GLOBAL_RELATIVE_ALT" => Frame::GlobalRelativeAlt,
            "MAV_FRAME_LOCAL_ENU" => Frame::LocalEnu,
            "MAV_FRAME_GLOBAL_INT" => Frame::GlobalInt,
            "MAV_FRAME_GLOBAL_RELATIVE_ALT_INT" => Frame::GlobalRelativeAltInt,
            "MAV_FRAME_LOCAL_OFFSET_NED" => Frame::LocalOffsetNed,
            "MAV_FRAME_BODY_NED" => Frame::BodyNed,
            "MAV_FRAME_BODY_OFFSET_NED" => Frame::BodyOffsetNed,
            "MAV_FRAME_GLOBAL_TERRAIN_ALT" => Frame::GlobalTerrainAlt,
            "MAV_FRAME_GLOBAL_TERRAIN_ALT_INT" => Frame::GlobalTerrainAltInt,
            "MAV_FRAME_BODY_FRD" => Frame::BodyFrd,
            "MAV_FRAME_LOCAL_FRD" => Frame::LocalFrd,
            "MAV_FRAME_LOCAL_FLU" => Frame::LocalFlu,
            "MAV_FRAME_NONE" => Frame::None,
            _ => return Option::None,
        };
        Some(frame)
    }
}

// ── Type provenance ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSourceKind {
    Intrinsic,
    Param,
    Unknown,
}

/// Where a `TypeInfo` came from. `param_index` is meaningful for `Param`
/// and for intrinsic parameter expansions; `-1` marks catalog entries.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSource {
    pub kind: TypeSourceKind,
    pub param_index: i32,
    pub note: String,
}

impl TypeSource {
    pub fn intrinsic(param_index: i32) -> Self {
        TypeSource {
            kind: TypeSourceKind::Intrinsic,
            param_index,
            note: String::new(),
        }
    }

    pub fn param(param_index: i32) -> Self {
        TypeSource {
            kind: TypeSourceKind::Param,
            param_index,
            note: String::new(),
        }
    }

    pub fn unknown() -> Self {
        TypeSource {
            kind: TypeSourceKind::Unknown,
            param_index: 0,
            note: String::new(),
        }
    }
}

// ── TypeInfo ────────────────────────────────────────────────────────────────

/// The lattice element: admissible frames, admissible units, provenance,
/// and optional dimension. Equality is structural over all four fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeInfo {
    pub frames: BTreeSet<Frame>,
    pub units: BTreeSet<UnitId>,
    pub source: Vec<TypeSource>,
    pub dimension: Option<Dimension>,
}

impl TypeInfo {
    /// Union `src`'s frames and units into `self` and append its provenance.
    /// The dimension is set, not merged: `self.dimension` is left alone.
    pub fn merge(&mut self, src: &TypeInfo) {
        self.frames.extend(src.frames.iter().copied());
        self.units.extend(src.units.iter().copied());
        self.source.extend(src.source.iter().cloned());
    }

    /// The conservative top: every frame except `None` and every allocated
    /// unit, tagged with `source`.
    pub fn universal(num_units: usize, source: TypeSource) -> Self {
        TypeInfo {
            frames: Frame::CONSTRAINED.iter().copied().collect(),
            units: (0..num_units as u32).map(UnitId).collect(),
            source: vec![source],
            dimension: None,
        }
    }

    /// The type of an integer literal: empty frame/unit sets and a scalar
    /// dimension `value/1`.
    pub fn from_literal(value: i64) -> Self {
        TypeInfo {
            frames: BTreeSet::new(),
            units: BTreeSet::new(),
            source: Vec::new(),
            dimension: Some(Dimension::scalar(value)),
        }
    }

    /// The type of a multiplication. Frames and units are set-unioned
    /// (matching the long-standing tool behavior; a stricter reading would
    /// intersect) and the dimensions multiply. Yields nothing unless both
    /// operands carry a dimension.
    pub fn combine_mul(lhs: &TypeInfo, rhs: &TypeInfo) -> Option<TypeInfo> {
        let (ld, rd) = match (lhs.dimension, rhs.dimension) {
            (Some(l), Some(r)) => (l, r),
            _ => return None,
        };
        Some(TypeInfo {
            frames: lhs.frames.union(&rhs.frames).copied().collect(),
            units: lhs.units.union(&rhs.units).copied().collect(),
            source: Vec::new(),
            dimension: Some(ld * rd),
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::dimension_of;

    #[test]
    fn none_is_strictly_largest() {
        for frame in Frame::CONSTRAINED {
            assert!(frame < Frame::None);
        }
    }

    #[test]
    fn merge_unions_and_keeps_dimension() {
        let mut dst = TypeInfo {
            frames: [Frame::Global].into_iter().collect(),
            units: [UnitId(0)].into_iter().collect(),
            source: vec![TypeSource::intrinsic(-1)],
            dimension: dimension_of("m"),
        };
        let src = TypeInfo {
            frames: [Frame::Global, Frame::LocalNed].into_iter().collect(),
            units: [UnitId(1)].into_iter().collect(),
            source: vec![TypeSource::unknown()],
            dimension: dimension_of("s"),
        };
        dst.merge(&src);
        assert_eq!(dst.frames.len(), 2);
        assert_eq!(dst.units.len(), 2);
        assert_eq!(dst.source.len(), 2);
        assert_eq!(dst.dimension, dimension_of("m"));
    }

    #[test]
    fn universal_excludes_none_frame() {
        let top = TypeInfo::universal(3, TypeSource::unknown());
        assert_eq!(top.frames.len(), 15);
        assert!(!top.frames.contains(&Frame::None));
        assert_eq!(top.units.len(), 3);
        assert!(top.dimension.is_none());
    }

    #[test]
    fn literal_has_scalar_dimension_only() {
        let ti = TypeInfo::from_literal(100);
        assert!(ti.frames.is_empty());
        assert!(ti.units.is_empty());
        let d = ti.dimension.expect("literal has a dimension");
        assert!(d.is_scalar());
        assert_eq!(d.numerator(), 100);
        assert_eq!(d.denominator(), 1);
    }

    #[test]
    fn combine_mul_requires_both_dimensions() {
        let meters = TypeInfo {
            frames: [Frame::Global].into_iter().collect(),
            units: [UnitId(0)].into_iter().collect(),
            source: Vec::new(),
            dimension: dimension_of("m"),
        };
        let literal = TypeInfo::from_literal(100);
        let product = TypeInfo::combine_mul(&meters, &literal).expect("both typed");
        assert_eq!(product.units, meters.units);
        assert_eq!(product.frames, meters.frames);
        let d = product.dimension.expect("dimension");
        assert_eq!(d.coefficients()[0], 1);
        assert_eq!(d.numerator(), 100);

        let untyped = TypeInfo::default();
        assert!(TypeInfo::combine_mul(&meters, &untyped).is_none());
    }

    #[test]
    fn combine_mul_unions_operand_sets() {
        let a = TypeInfo {
            frames: [Frame::Global].into_iter().collect(),
            units: [UnitId(0)].into_iter().collect(),
            source: Vec::new(),
            dimension: dimension_of("m"),
        };
        let b = TypeInfo {
            frames: [Frame::LocalNed].into_iter().collect(),
            units: [UnitId(1)].into_iter().collect(),
            source: Vec::new(),
            dimension: dimension_of("s"),
        };
        let product = TypeInfo::combine_mul(&a, &b).expect("both typed");
        assert_eq!(product.frames.len(), 2);
        assert_eq!(product.units.len(), 2);
    }
}
