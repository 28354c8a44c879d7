// compdb.rs — Compilation-database reader
//
// Loads `compile_commands.json` from the project's build directory. Each
// entry names one translation unit, the directory it was compiled from, and
// the original compiler invocation. The analysis only needs the directory
// and the file; the flags ride along untouched.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

// ── Schema ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CompileCommand {
    pub directory: PathBuf,
    pub file: PathBuf,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
}

impl CompileCommand {
    /// The source path, resolved against the compile directory when the
    /// entry uses a relative path.
    pub fn source_path(&self) -> PathBuf {
        if self.file.is_absolute() {
            self.file.clone()
        } else {
            self.directory.join(&self.file)
        }
    }
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum CompDbError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        message: String,
    },
}

impl fmt::Display for CompDbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompDbError::Io { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            CompDbError::Parse { path, message } => {
                write!(f, "invalid compilation database {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for CompDbError {}

// ── Loading ─────────────────────────────────────────────────────────────────

/// Load every compile command from `<dir>/compile_commands.json`.
pub fn load_compilation_database(dir: &Path) -> Result<Vec<CompileCommand>, CompDbError> {
    let path = dir.join("compile_commands.json");
    let source = std::fs::read_to_string(&path).map_err(|e| CompDbError::Io {
        path: path.clone(),
        source: e,
    })?;
    serde_json::from_str(&source).map_err(|e| CompDbError::Parse {
        path,
        message: e.to_string(),
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn write_db(content: &str) -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("ufa_compdb_test_{}", n));
        std::fs::create_dir_all(&dir).expect("create dir");
        let mut f = std::fs::File::create(dir.join("compile_commands.json")).expect("create db");
        f.write_all(content.as_bytes()).expect("write db");
        dir
    }

    #[test]
    fn loads_both_command_styles() {
        let dir = write_db(
            r#"[
  {
    "directory": "/build",
    "file": "../src/copter.cpp",
    "command": "clang++ -O2 -c ../src/copter.cpp"
  },
  {
    "directory": "/build",
    "file": "/abs/plane.cpp",
    "arguments": ["clang++", "-c", "/abs/plane.cpp"]
  }
]"#,
        );
        let cmds = load_compilation_database(&dir).expect("loads");
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].source_path(), PathBuf::from("/build/../src/copter.cpp"));
        assert_eq!(cmds[1].source_path(), PathBuf::from("/abs/plane.cpp"));
        assert!(cmds[0].command.is_some());
        assert_eq!(cmds[1].arguments.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn missing_database_is_io_error() {
        let dir = std::env::temp_dir().join("ufa_compdb_missing");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("create dir");
        assert!(matches!(
            load_compilation_database(&dir),
            Err(CompDbError::Io { .. })
        ));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let dir = write_db("not json");
        assert!(matches!(
            load_compilation_database(&dir),
            Err(CompDbError::Parse { .. })
        ));
    }
}
