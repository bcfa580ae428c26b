//! Format a definition forest for display (tree view) or back into definition text.

use std::fmt::Write as _;

use crate::ast::{DefForest, Entity, Field};

const INDENT: &str = "  ";

/// Indented tree view. Embedded fields show `=> CODE` with the child nested below.
/// A child shared by several fields is expanded under the first one only.
///
/// ```text
/// MSG1 /root
///   F1 Field1 /root/f1 M y int
///   F2 Field2 /root/group O n group => GRP1
///     GRP1 /root/group (parent MSG1)
///       G1 Sub1 /root/group/g1 M n int
/// ```
pub fn dump_forest(forest: &DefForest) -> String {
    let mut out = String::new();
    for root in forest.roots() {
        dump_entity(&mut out, root, 0);
    }
    out
}

pub fn dump_entity(out: &mut String, entity: &Entity, depth: usize) {
    let pad = INDENT.repeat(depth);
    let h = &entity.header;
    match h.parent.as_code() {
        Some(parent) => {
            let _ = writeln!(out, "{}{} {} (parent {})", pad, h.code, h.path, parent);
        }
        None => {
            let _ = writeln!(out, "{}{} {}", pad, h.code, h.path);
        }
    }
    let mut expanded: Vec<&str> = Vec::new();
    for field in &entity.fields {
        let _ = write!(out, "{}{}{}", pad, INDENT, body_line(field));
        match field.embedded_set() {
            Some(child) if expanded.contains(&child.code()) => {
                let _ = writeln!(out, " => {} (shared)", child.header.code);
            }
            Some(child) => {
                let _ = writeln!(out, " => {}", child.header.code);
                expanded.push(child.code());
                dump_entity(out, child, depth + 2);
            }
            None => out.push('\n'),
        }
    }
}

/// Re-emit the forest as definition text: every entity followed by its bodies,
/// parents before children. Parsing the output yields the same forest.
pub fn render_source(forest: &DefForest) -> String {
    let mut out = String::new();
    for root in forest.roots() {
        render_entity(&mut out, root);
    }
    out
}

fn render_entity(out: &mut String, entity: &Entity) {
    let h = &entity.header;
    let _ = writeln!(
        out,
        "CMTCODE:{} {} PATH:{} ParentCMTCODE:{}",
        h.code, h.label, h.path, h.parent
    );
    for field in &entity.fields {
        let _ = writeln!(out, "{}", body_line(field));
    }
    // A child linked into several fields is written once.
    let mut written: Vec<&str> = Vec::new();
    for child in entity.fields.iter().filter_map(Field::embedded_set) {
        if written.contains(&child.header.code.as_str()) {
            continue;
        }
        written.push(&child.header.code);
        render_entity(out, child);
    }
}

fn body_line(field: &Field) -> String {
    format!(
        "{} {} {} {} {} {}",
        field.tag,
        field.description,
        field.path,
        if field.required { "M" } else { "O" },
        if field.signed { "y" } else { "n" },
        field.type_name
    )
}
