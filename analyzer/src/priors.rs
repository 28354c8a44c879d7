// priors.rs — Prior-types catalog
//
// Loads the JSON catalog binding fully qualified variable names to their
// expected units and coordinate frames, and converts each entry to the
// `TypeInfo` the store handler compares against. Unit names not seen before
// allocate fresh IDs; frame spellings outside the fixed enumeration map to
// the `None` frame.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::dimension::{dimension_of, UnitTable};
use crate::typeinfo::{Frame, TypeInfo, TypeSource};

// ── Catalog schema ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct VariableEntry {
    pub variable_name: String,
    pub semantic_info: SemanticInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemanticInfo {
    #[serde(default)]
    pub coordinate_frames: Vec<String>,
    #[serde(default)]
    pub units: Vec<String>,
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum PriorsError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        message: String,
    },
}

impl fmt::Display for PriorsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorsError::Io { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            PriorsError::Parse { path, message } => {
                write!(f, "invalid prior-types JSON {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for PriorsError {}

// ── Loading ─────────────────────────────────────────────────────────────────

pub fn load_prior_types(path: &Path) -> Result<Vec<VariableEntry>, PriorsError> {
    let source = std::fs::read_to_string(path).map_err(|e| PriorsError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&source).map_err(|e| PriorsError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Convert catalog entries to their expected types. When an entry lists
/// several units, the dimension of the last one wins.
pub fn vars_to_typeinfo(
    vars: &[VariableEntry],
    units: &mut UnitTable,
) -> HashMap<String, TypeInfo> {
    let mut results = HashMap::new();
    for entry in vars {
        let mut ti = TypeInfo::default();
        for frame_name in &entry.semantic_info.coordinate_frames {
            ti.frames
                .insert(Frame::from_name(frame_name).unwrap_or(Frame::None));
        }
        for unit_name in &entry.semantic_info.units {
            ti.units.insert(units.intern(unit_name));
            if dimension_of(unit_name).is_none() {
                warn!(unit = unit_name.as_str(), "unrecognized unit");
            }
            ti.dimension = dimension_of(unit_name);
        }
        ti.source.push(TypeSource::intrinsic(-1));
        results.insert(entry.variable_name.clone(), ti);
    }
    results
}

// ── Tests ──────────────────────────────────────────────────────────────────
