//! Format trees and decoded values for display (DDS-style text, DAS-style text,
//! named value listing).

use crate::ast::*;
use crate::value::Value;
use std::fmt::Write;

const INDENT: &str = "    ";

/// Type keyword as servers usually spell it.
pub fn dds_type_name(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Byte => "Byte",
        DataType::Int => "Int",
        DataType::UInt => "UInt",
        DataType::Int16 => "Int16",
        DataType::UInt16 => "UInt16",
        DataType::Int32 => "Int32",
        DataType::UInt32 => "UInt32",
        DataType::Float32 => "Float32",
        DataType::Float64 => "Float64",
        DataType::String => "String",
        DataType::Url => "Url",
        DataType::Alias => "Alias",
    }
}

/// Render the tree as DDS text that parses back to the same structure.
pub fn format_dds(dataset: &DapVar) -> String {
    let mut out = String::from("Dataset {\n");
    for c in dataset.components() {
        write_declaration(&mut out, c, 1);
    }
    let _ = writeln!(out, "}} {};", dataset.name);
    out
}

fn write_declaration(out: &mut String, var: &DapVar, depth: usize) {
    let pad = INDENT.repeat(depth);
    match &var.kind {
        VarKind::Base(base) => {
            let _ = write!(out, "{}{} {}", pad, dds_type_name(base.data_type), var.name);
            for (dim, extent) in base.dimensions.iter().zip(&base.shape) {
                match dim {
                    Some(dim) => {
                        let _ = write!(out, "[{} = {}]", dim, extent);
                    }
                    None => {
                        let _ = write!(out, "[{}]", extent);
                    }
                }
            }
            out.push_str(";\n");
        }
        VarKind::Grid(grid) => {
            let _ = writeln!(out, "{}Grid {{", pad);
            let _ = writeln!(out, "{}  Array:", pad);
            write_declaration(out, &grid.array, depth + 1);
            let _ = writeln!(out, "{}  Maps:", pad);
            for m in &grid.maps {
                write_declaration(out, m, depth + 1);
            }
            let _ = writeln!(out, "{}}} {};", pad, var.name);
        }
        VarKind::Structure { children } | VarKind::Sequence { children } | VarKind::Dataset { children } => {
            let _ = writeln!(out, "{}{} {{", pad, var.kind_name());
            for c in children {
                write_declaration(out, c, depth + 1);
            }
            let _ = writeln!(out, "{}}} {};", pad, var.name);
        }
    }
}

/// Render every node's attributes, nested the way the tree is.
pub fn format_das(dataset: &DapVar) -> String {
    let mut out = String::from("Attributes {\n");
    write_attributes(&mut out, &dataset.attributes, 1);
    for c in dataset.components() {
        write_var_attributes(&mut out, c, 1);
    }
    out.push_str("}\n");
    out
}

fn write_var_attributes(out: &mut String, var: &DapVar, depth: usize) {
    let pad = INDENT.repeat(depth);
    let _ = writeln!(out, "{}{} {{", pad, var.name);
    write_attributes(out, &var.attributes, depth + 1);
    for c in var.components() {
        write_var_attributes(out, c, depth + 1);
    }
    let _ = writeln!(out, "{}}}", pad);
}

fn write_attributes(out: &mut String, attributes: &Attributes, depth: usize) {
    let pad = INDENT.repeat(depth);
    for (name, value) in attributes {
        match value {
            AttrValue::Map(group) => {
                let _ = writeln!(out, "{}{} {{", pad, name);
                write_attributes(out, group, depth + 1);
                let _ = writeln!(out, "{}}}", pad);
            }
            v => {
                let _ = writeln!(out, "{}{}: {}", pad, name, format_attr_value(v));
            }
        }
    }
}

pub fn format_attr_value(value: &AttrValue) -> String {
    match value {
        AttrValue::Int(i) => i.to_string(),
        AttrValue::Float(f) => f.to_string(),
        AttrValue::Text(s) => format!("{:?}", s),
        AttrValue::List(items) => items
            .iter()
            .map(format_attr_value)
            .collect::<Vec<_>>()
            .join(", "),
        AttrValue::Map(group) => format!("{{{} attributes}}", group.len()),
        AttrValue::Variable(id) => format!("-> {}", id),
    }
}

/// Decoded values listed by variable id, following the tree the payload was decoded with.
pub fn format_data(var: &DapVar, value: &Value) -> String {
    let mut out = String::new();
    write_data(&mut out, var, value);
    out
}

fn write_data(out: &mut String, var: &DapVar, value: &Value) {
    match (&var.kind, value) {
        (VarKind::Base(_), v) => {
            let _ = writeln!(out, "{} = {}", var.id, format_value(v));
        }
        (VarKind::Sequence { children }, Value::List(rows)) => {
            let _ = writeln!(out, "{} ({} rows)", var.id, rows.len());
            for (i, row) in rows.iter().enumerate() {
                let cells = row.as_list().unwrap_or_default();
                let rendered: Vec<String> = children
                    .iter()
                    .zip(cells)
                    .map(|(c, v)| format!("{}={}", c.name, format_value(v)))
                    .collect();
                let _ = writeln!(out, "{}[{}] {}", INDENT, i, rendered.join(", "));
            }
        }
        (_, Value::List(items)) => {
            for (c, v) in var.components().into_iter().zip(items) {
                write_data(out, c, v);
            }
        }
        (_, v) => {
            let _ = writeln!(out, "{} = {}", var.id, format_value(v));
        }
    }
}

/// Compact single-line rendering; lists in brackets.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Byte(x) => x.to_string(),
        Value::Int16(x) => x.to_string(),
        Value::UInt16(x) => x.to_string(),
        Value::Int32(x) => x.to_string(),
        Value::UInt32(x) => x.to_string(),
        Value::Float32(x) => x.to_string(),
        Value::Float64(x) => x.to_string(),
        Value::String(s) => format!("{:?}", s),
        Value::List(items) => format!(
            "[{}]",
            items.iter().map(format_value).collect::<Vec<_>>().join(", ")
        ),
    }
}
