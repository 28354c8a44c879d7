// provider.rs — AST provider interface
//
// The analysis core never talks to a C/C++ parser directly: it asks an
// `AstProvider` for the cursor tree of one translation unit at a time. The
// shipped implementation reads `<file>.ast.json` dumps produced by the
// out-of-tree frontend, resolving relative source paths against the compile
// command's directory — no process-wide working-directory changes.
//
// Each worker thread owns its own provider instance.

use std::fmt;
use std::path::PathBuf;

use crate::compdb::CompileCommand;
use crate::cursor::Cursor;

// ── Interface ───────────────────────────────────────────────────────────────

pub trait AstProvider {
    /// Build the cursor tree for one compile command.
    fn parse(&mut self, cmd: &CompileCommand) -> Result<Cursor, ProviderError>;
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ProviderError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        message: String,
    },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Io { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            ProviderError::Parse { path, message } => {
                write!(f, "invalid AST dump {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ProviderError {}

// ── Dump-backed provider ────────────────────────────────────────────────────

/// Loads the JSON cursor dump sitting next to each source file.
#[derive(Debug, Default)]
pub struct DumpProvider;

impl DumpProvider {
    pub fn new() -> Self {
        DumpProvider
    }

    fn dump_path(cmd: &CompileCommand) -> PathBuf {
        let mut os = cmd.source_path().into_os_string();
        os.push(".ast.json");
        PathBuf::from(os)
    }
}

impl AstProvider for DumpProvider {
    fn parse(&mut self, cmd: &CompileCommand) -> Result<Cursor, ProviderError> {
        let path = Self::dump_path(cmd);
        let source = std::fs::read_to_string(&path).map_err(|e| ProviderError::Io {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&source).map_err(|e| ProviderError::Parse {
            path,
            message: e.to_string(),
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
