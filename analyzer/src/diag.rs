// diag.rs — Analyzer diagnostics
//
// The shared diagnostic values emitted by the function walker. Each variant
// renders to the exact one-line form the tool prints on stdout, so tests can
// assert on `Display` output directly.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

// ── Source reference ─────────────────────────────────────────────────────

/// The file/line a diagnostic refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub file: String,
    pub line: u32,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A diagnostic produced while walking a translation unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A function used a framed message without constraining its frame
    /// through an equality test or a switch on the frame field.
    UnconstrainedFrame { function: String },

    /// A store whose right-hand side type disagrees with the type declared
    /// for the target in the prior-types catalog.
    IncorrectStore {
        variable: String,
        site: SourceRef,
        got: String,
        expected: String,
    },

    /// A switch statement over a message's frame field.
    FrameSwitch,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnconstrainedFrame { function } => {
                write!(f, "BUG: unconstrained MAV frame used in: {}", function)
            }
            Diagnostic::IncorrectStore {
                variable,
                site,
                got,
                expected,
            } => write!(
                f,
                "Incorrect store to variable {} in {} line {}. Got type {}, expected type {}.",
                variable, site.file, site.line, got, expected
            ),
            Diagnostic::FrameSwitch => write!(f, "Found a MAVLink frame switch!"),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
