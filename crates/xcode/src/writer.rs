//! Serializer producing the layout Xcode itself writes
//!
//! Objects are grouped into `/* Begin <isa> section */` blocks sorted by isa,
//! each block sorted by object id. Build files and file references go on a
//! single line.

use crate::plist::{Dict, Value};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

const HEADER: &str = "// !$*UTF8*$!\n";

const INLINE_ISAS: &[&str] = &["PBXBuildFile", "PBXFileReference"];

/// Serialize a project
///
/// `top` holds the top-level keys in file order; its `objects` entry is
/// replaced by the sections rendered from `objects`.
pub fn write_project(
    top: &Dict,
    objects: &BTreeMap<String, Dict>,
    annotations: &HashMap<String, String>,
) -> String {
    let mut out = String::from(HEADER);
    out.push_str("{\n");
    for (key, value) in top.iter() {
        indent(&mut out, 1);
        out.push_str(&quote(key));
        out.push_str(" = ");
        if key == "objects" {
            out.push_str("{\n");
            write_sections(&mut out, objects, annotations);
            indent(&mut out, 1);
            out.push('}');
        } else {
            write_value(&mut out, value, 1, false);
        }
        out.push_str(";\n");
    }
    out.push_str("}\n");
    out
}

fn write_sections(
    out: &mut String,
    objects: &BTreeMap<String, Dict>,
    annotations: &HashMap<String, String>,
) {
    let mut sections: BTreeMap<&str, Vec<(&str, &Dict)>> = BTreeMap::new();
    for (id, object) in objects {
        sections
            .entry(object.isa().unwrap_or_default())
            .or_default()
            .push((id, object));
    }

    for (isa, members) in sections {
        let inline = INLINE_ISAS.contains(&isa);
        let _ = writeln!(out, "\n/* Begin {} section */", isa);
        for (id, object) in members {
            indent(out, 2);
            out.push_str(&quote(id));
            if let Some(annotation) = annotations.get(id) {
                let _ = write!(out, " /* {} */", annotation);
            }
            out.push_str(" = ");
            write_dict(out, object, 2, inline);
            out.push_str(";\n");
        }
        let _ = writeln!(out, "/* End {} section */", isa);
    }
}

fn write_value(out: &mut String, value: &Value, level: usize, inline: bool) {
    match value {
        Value::String(s) => out.push_str(&quote(s)),
        Value::Annotated(s, annotation) => {
            out.push_str(&quote(s));
            let _ = write!(out, " /* {} */", annotation);
        }
        Value::Array(items) => write_array(out, items, level, inline),
        Value::Dict(dict) => write_dict(out, dict, level, inline),
    }
}

fn write_dict(out: &mut String, dict: &Dict, level: usize, inline: bool) {
    if inline {
        out.push('{');
        for (key, value) in dict.iter() {
            out.push_str(&quote(key));
            out.push_str(" = ");
            write_value(out, value, level, true);
            out.push_str("; ");
        }
        out.push('}');
        return;
    }

    out.push_str("{\n");
    for (key, value) in dict.iter() {
        indent(out, level + 1);
        out.push_str(&quote(key));
        out.push_str(" = ");
        write_value(out, value, level + 1, false);
        out.push_str(";\n");
    }
    indent(out, level);
    out.push('}');
}

fn write_array(out: &mut String, items: &[Value], level: usize, inline: bool) {
    if inline {
        out.push('(');
        for item in items {
            write_value(out, item, level, true);
            out.push_str(", ");
        }
        out.push(')');
        return;
    }

    out.push_str("(\n");
    for item in items {
        indent(out, level + 1);
        write_value(out, item, level + 1, false);
        out.push_str(",\n");
    }
    indent(out, level);
    out.push(')');
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push('\t');
    }
}

/// Quote a string unless Xcode would leave it bare
pub fn quote(s: &str) -> Cow<'_, str> {
    let bare = !s.is_empty()
        && !s.contains("//")
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'.' | b'/'));
    if bare {
        return Cow::Borrowed(s);
    }

    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    Cow::Owned(quoted)
}
