//! Values decoded from an XDR payload.

use serde::Serialize;

/// A single decoded value (atomic element or nested list).
///
/// Arrays are nested lists following the declared shape, Structures and Grids are
/// lists of their components' values, Sequences are lists of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Float32(f32),
    Float64(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Byte(x) => Some(*x as u64),
            Value::UInt16(x) => Some(*x as u64),
            Value::UInt32(x) => Some(*x as u64),
            Value::Int16(x) => (*x).try_into().ok(),
            Value::Int32(x) => (*x).try_into().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(x) => Some(*x as i64),
            Value::Int16(x) => Some(*x as i64),
            Value::UInt16(x) => Some(*x as i64),
            Value::Int32(x) => Some(*x as i64),
            Value::UInt32(x) => Some(*x as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(x) => Some(*x as f64),
            Value::Float64(x) => Some(*x),
            _ => self.as_i64().map(|i| i as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Atomic elements in row-major order.
    pub fn flatten(&self) -> Vec<&Value> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into<'a>(&'a self, out: &mut Vec<&'a Value>) {
        match self {
            Value::List(items) => items.iter().for_each(|v| v.flatten_into(out)),
            v => out.push(v),
        }
    }
}
