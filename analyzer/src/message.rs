// message.rs — Message-definition reader
//
// Extracts semantic tables from a message-definition XML file by scanning
// tags at the text level. No general XML parsing — both supported dialects
// have a fixed, flat attribute format that maps to simple string operations.
//
// Two dialects are recognized by the root element:
//   * `mavlink` — message structs: which field selects the coordinate frame,
//     and which unit each remaining field is measured in.
//   * `MDM` — LMCP/CMASI structs: the return units of generated getters.
// Any other root is fatal.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::dimension::{dimension_of, UnitTable};
use crate::typeinfo::{TypeInfo, TypeSource};

// ── Output tables ───────────────────────────────────────────────────────────

/// Tables from the `mavlink` dialect.
#[derive(Debug, Default)]
pub struct MavlinkSpec {
    /// Message type name → the field holding its coordinate frame.
    pub frame_field_of_type: HashMap<String, String>,
    /// Message type name → field name → unit ID.
    pub field_units: HashMap<String, HashMap<String, crate::dimension::UnitId>>,
}

/// Tables from the `MDM` dialect: fully qualified getter name → return type.
#[derive(Debug, Default)]
pub struct MethodSpec {
    pub return_types: HashMap<String, TypeInfo>,
}

#[derive(Debug)]
pub enum MessageDefinitions {
    Mavlink(MavlinkSpec),
    Methods(MethodSpec),
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum MessageError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Malformed {
        path: PathBuf,
        message: String,
    },
    UnsupportedDialect {
        root: String,
    },
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::Io { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            MessageError::Malformed { path, message } => {
                write!(f, "malformed message definition {}: {}", path.display(), message)
            }
            MessageError::UnsupportedDialect { root } => {
                write!(f, "message definition not in a supported dialect (root <{}>)", root)
            }
        }
    }
}

impl std::error::Error for MessageError {}

// ── Loading ─────────────────────────────────────────────────────────────────

/// Read a message-definition file, interning every unit name it mentions.
pub fn load_message_definitions(
    path: &Path,
    units: &mut UnitTable,
) -> Result<MessageDefinitions, MessageError> {
    let source = std::fs::read_to_string(path).map_err(|e| MessageError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let tags = scan_tags(&source);
    let root = tags
        .iter()
        .find(|t| !t.closing)
        .ok_or_else(|| MessageError::Malformed {
            path: path.to_path_buf(),
            message: "no root element".to_string(),
        })?;

    match root.name.as_str() {
        "mavlink" => Ok(MessageDefinitions::Mavlink(parse_mavlink(&tags, units))),
        "MDM" => Ok(MessageDefinitions::Methods(parse_methods(&tags, units))),
        other => Err(MessageError::UnsupportedDialect {
            root: other.to_string(),
        }),
    }
}

fn parse_mavlink(tags: &[RawTag], units: &mut UnitTable) -> MavlinkSpec {
    let mut spec = MavlinkSpec::default();
    let mut current_type: Option<String> = None;

    for tag in tags {
        if tag.closing {
            if tag.name == "message" {
                current_type = None;
            }
            continue;
        }
        match tag.name.as_str() {
            "message" => {
                current_type = tag
                    .attr("name")
                    .map(|n| format!("mavlink_{}_t", n.to_lowercase()));
            }
            "field" => {
                let Some(type_name) = &current_type else { continue };
                let Some(field_name) = tag.attr("name") else { continue };
                match tag.attr("units") {
                    Some(unit_name) if !unit_name.is_empty() => {
                        if dimension_of(unit_name).is_none() {
                            warn!(unit = unit_name, "unrecognized unit");
                        }
                        let id = units.intern(unit_name);
                        spec.field_units
                            .entry(type_name.clone())
                            .or_default()
                            .insert(field_name.to_string(), id);
                    }
                    _ => {
                        if tag.attr("enum") == Some("MAV_FRAME") {
                            spec.frame_field_of_type
                                .insert(type_name.clone(), field_name.to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    spec
}

fn parse_methods(tags: &[RawTag], units: &mut UnitTable) -> MethodSpec {
    let mut spec = MethodSpec::default();
    let mut current_struct: Option<String> = None;

    for tag in tags {
        if tag.closing {
            if tag.name == "Struct" {
                current_struct = None;
            }
            continue;
        }
        if tag.name == "Struct" {
            current_struct = tag.attr("Name").map(str::to_string);
            continue;
        }
        let Some(struct_name) = &current_struct else { continue };
        let Some(unit_name) = tag.attr("Units") else { continue };
        if unit_name.eq_ignore_ascii_case("none") {
            continue;
        }
        let Some(dimension) = dimension_of(unit_name) else {
            warn!(unit = unit_name, "unrecognized unit, skipping");
            continue;
        };
        let Some(field_name) = tag.attr("Name") else { continue };

        let getter = format!(
            "afrl::cmasi::{}::get{}",
            struct_name,
            upper_first(field_name)
        );
        let id = units.intern(unit_name);
        spec.return_types.insert(
            getter,
            TypeInfo {
                frames: BTreeSet::new(),
                units: [id].into_iter().collect(),
                source: vec![TypeSource::intrinsic(-1)],
                dimension: Some(dimension),
            },
        );
    }

    spec
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Tag scanner ─────────────────────────────────────────────────────────────

struct RawTag {
    name: String,
    attrs: Vec<(String, String)>,
    closing: bool,
}

impl RawTag {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Scan every tag in the document, skipping comments, declarations, and
/// processing instructions. Element text is ignored.
fn scan_tags(source: &str) -> Vec<RawTag> {
    let mut tags = Vec::new();
    let mut i = 0;
    while let Some(off) = source[i..].find('<') {
        let start = i + off;
        let rest = &source[start..];
        if rest.starts_with("<!--") {
            match rest.find("-->") {
                Some(e) => {
                    i = start + e + 3;
                    continue;
                }
                None => break,
            }
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            match rest.find('>') {
                Some(e) => {
                    i = start + e + 1;
                    continue;
                }
                None => break,
            }
        }
        let end = match rest.find('>') {
            Some(e) => start + e,
            None => break,
        };
        let mut body = &source[start + 1..end];
        i = end + 1;

        let closing = body.starts_with('/');
        body = body.strip_prefix('/').unwrap_or(body);
        body = body.strip_suffix('/').unwrap_or(body).trim();
        if body.is_empty() {
            continue;
        }

        let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
        tags.push(RawTag {
            name: body[..name_end].to_string(),
            attrs: parse_attrs(&body[name_end..]),
            closing,
        });
    }
    tags
}

fn parse_attrs(s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut rest = s.trim_start();
    while !rest.is_empty() {
        let Some(eq) = rest.find('=') else { break };
        let name = rest[..eq].trim().to_string();
        let after = rest[eq + 1..].trim_start();
        let quote = match after.chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => break,
        };
        let Some(close) = after[1..].find(quote) else { break };
        attrs.push((name, after[1..1 + close].to_string()));
        rest = after[1 + close + 1..].trim_start();
    }
    attrs
}

// ── Tests ──────────────────────────────────────────────────────────────────
