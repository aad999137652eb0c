//! Decode DODS/XDR payloads by walking a variable tree.
//!
//! One `std::io::Cursor` is threaded through the whole walk, so values are read in
//! exactly the order the DDS declared them. All multi-byte fields are big-endian.

use crate::ast::*;
use crate::error::{Error, Result};
use crate::value::Value;
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use std::io::Cursor;
use tracing::{debug, trace};

/// Marker preceding each sequence row.
pub const START_OF_SEQUENCE: u32 = 0x5A00_0000;
/// Marker ending a sequence.
pub const END_OF_SEQUENCE: u32 = 0xA500_0000;

/// Decode `bytes` as the payload of `var` (usually the dataset root).
pub fn unpack(var: &DapVar, bytes: &[u8]) -> Result<Value> {
    Unpacker::new(var).unpack(bytes)
}

#[derive(Debug)]
pub struct Unpacker<'t> {
    var: &'t DapVar,
}

impl<'t> Unpacker<'t> {
    pub fn new(var: &'t DapVar) -> Self {
        Unpacker { var }
    }

    pub fn unpack(&self, bytes: &[u8]) -> Result<Value> {
        self.unpack_with_extent(bytes).map(|(_, value)| value)
    }

    /// Decode and return (bytes_consumed, value).
    pub fn unpack_with_extent(&self, bytes: &[u8]) -> Result<(usize, Value)> {
        let mut r = Cursor::new(bytes);
        let value = self.decode(&mut r, self.var)?;
        let consumed = r.position() as usize;
        debug!(
            var = %self.var.id,
            consumed,
            trailing = bytes.len() - consumed,
            "unpacked XDR payload"
        );
        Ok((consumed, value))
    }

    fn decode(&self, r: &mut Cursor<&[u8]>, var: &DapVar) -> Result<Value> {
        match &var.kind {
            VarKind::Dataset { children } | VarKind::Structure { children } => {
                self.decode_all(r, children.iter()).map(Value::List)
            }
            VarKind::Grid(grid) => {
                let components = std::iter::once(grid.array.as_ref()).chain(grid.maps.iter());
                self.decode_all(r, components).map(Value::List)
            }
            VarKind::Sequence { children } => self.decode_sequence(r, var, children),
            VarKind::Base(base) if peek_u32(r) == Some(START_OF_SEQUENCE) => {
                self.decode_base_sequence(r, var, base)
            }
            VarKind::Base(base) => self.decode_base(r, base),
        }
    }

    fn decode_all<'v>(
        &self,
        r: &mut Cursor<&[u8]>,
        vars: impl Iterator<Item = &'v DapVar>,
    ) -> Result<Vec<Value>> {
        vars.map(|v| self.decode(r, v)).collect()
    }

    /// Rows of a declared Sequence, each preceded by a marker, until the end marker.
    fn decode_sequence(
        &self,
        r: &mut Cursor<&[u8]>,
        var: &DapVar,
        children: &Children,
    ) -> Result<Value> {
        let mut rows = Vec::new();
        while read_u32(r)? != END_OF_SEQUENCE {
            let row = self.decode_all(r, children.iter())?;
            trace!(sequence = %var.id, row = rows.len(), "decoded sequence row");
            rows.push(Value::List(row));
        }
        Ok(Value::List(rows))
    }

    /// A base-type variable streamed as a sequence: one value per marker.
    fn decode_base_sequence(
        &self,
        r: &mut Cursor<&[u8]>,
        var: &DapVar,
        base: &BaseVar,
    ) -> Result<Value> {
        let mut rows = Vec::new();
        while read_u32(r)? != END_OF_SEQUENCE {
            rows.push(self.decode_base(r, base)?);
            trace!(var = %var.id, row = rows.len(), "decoded base-type sequence row");
        }
        Ok(Value::List(rows))
    }

    fn decode_base(&self, r: &mut Cursor<&[u8]>, base: &BaseVar) -> Result<Value> {
        let data_type = base.data_type;
        let count = if base.is_scalar() {
            1
        } else {
            let count = read_u32(r)? as usize;
            if !data_type.is_text() {
                // Arrays of non-text types repeat the count.
                read_u32(r)?;
            }
            count
        };

        let flat = match data_type {
            DataType::Byte => read_bytes(r, count)?
                .iter()
                .map(|&b| Value::Byte(b))
                .collect::<Vec<_>>(),
            DataType::String | DataType::Url => (0..count)
                .map(|_| read_string(r).map(Value::String))
                .collect::<Result<Vec<_>>>()?,
            DataType::Alias => {
                return Err(Error::Decode {
                    offset: r.position() as usize,
                    reason: "alias variables have no binary encoding".to_string(),
                })
            }
            _ => {
                let mut out = Vec::with_capacity(count.min(remaining(r)));
                for _ in 0..count {
                    out.push(read_number(r, data_type)?);
                }
                out
            }
        };
        reshape(flat, &base.shape)
    }
}

/// Nest a flat row-major list according to `shape`; an empty shape unwraps the single element.
pub fn reshape(flat: Vec<Value>, shape: &[usize]) -> Result<Value> {
    let count = flat.len();
    let mismatch = || Error::Shape {
        count,
        shape: shape.to_vec(),
    };
    let size = shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
    if size != Some(count) {
        return Err(mismatch());
    }
    let mut items = flat.into_iter();
    nest(&mut items, shape).ok_or_else(mismatch)
}

fn nest(items: &mut std::vec::IntoIter<Value>, shape: &[usize]) -> Option<Value> {
    match shape.split_first() {
        None => items.next(),
        Some((&extent, rest)) => (0..extent)
            .map(|_| nest(items, rest))
            .collect::<Option<Vec<_>>>()
            .map(Value::List),
    }
}

fn read_number(r: &mut Cursor<&[u8]>, data_type: DataType) -> Result<Value> {
    let offset = r.position() as usize;
    let value = match data_type {
        DataType::Int16 => r.read_i16::<BigEndian>().map(Value::Int16),
        DataType::UInt16 => r.read_u16::<BigEndian>().map(Value::UInt16),
        DataType::Int | DataType::Int32 => r.read_i32::<BigEndian>().map(Value::Int32),
        DataType::UInt | DataType::UInt32 => r.read_u32::<BigEndian>().map(Value::UInt32),
        DataType::Float32 => r.read_f32::<BigEndian>().map(Value::Float32),
        DataType::Float64 => r.read_f64::<BigEndian>().map(Value::Float64),
        other => {
            return Err(Error::Decode {
                offset,
                reason: format!("{} is not a numeric type", other.name()),
            })
        }
    };
    value.map_err(|_| exhausted(offset, data_type.name()))
}

fn read_u32(r: &mut Cursor<&[u8]>) -> Result<u32> {
    let offset = r.position() as usize;
    r.read_u32::<BigEndian>().map_err(|_| exhausted(offset, "uint32"))
}

/// `count` raw bytes, then padding up to a multiple of 4.
fn read_bytes<'b>(r: &mut Cursor<&'b [u8]>, count: usize) -> Result<&'b [u8]> {
    let bytes = take(r, count, "byte array")?;
    skip_padding(r, count);
    Ok(bytes)
}

/// Length-prefixed string, one char per byte, padded to a multiple of 4.
fn read_string(r: &mut Cursor<&[u8]>) -> Result<String> {
    let len = read_u32(r)? as usize;
    let bytes = read_bytes(r, len)?;
    Ok(bytes.iter().map(|&b| b as char).collect())
}

fn take<'b>(r: &mut Cursor<&'b [u8]>, len: usize, what: &str) -> Result<&'b [u8]> {
    let buf: &'b [u8] = *r.get_ref();
    let start = r.position() as usize;
    let end = start
        .checked_add(len)
        .filter(|&end| end <= buf.len())
        .ok_or_else(|| exhausted(start, what))?;
    r.set_position(end as u64);
    Ok(&buf[start..end])
}

fn skip_padding(r: &mut Cursor<&[u8]>, len: usize) {
    let padding = (4 - len % 4) % 4;
    let end = (r.position() as usize + padding).min(r.get_ref().len());
    r.set_position(end as u64);
}

fn peek_u32(r: &Cursor<&[u8]>) -> Option<u32> {
    let start = r.position() as usize;
    r.get_ref().get(start..start + 4).map(BigEndian::read_u32)
}

fn remaining(r: &Cursor<&[u8]>) -> usize {
    r.get_ref().len().saturating_sub(r.position() as usize)
}

fn exhausted(offset: usize, what: &str) -> Error {
    Error::Decode {
        offset,
        reason: format!("buffer exhausted reading {}", what),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_dds;

    fn be32(v: u32) -> [u8; 4] {
        v.to_be_bytes()
    }

    #[test]
    fn scalar_float64_reads_eight_bytes() {
        let dds = parse_dds("Dataset { Float64 f; } d;").expect("dds");
        let bytes = 273.15f64.to_be_bytes();
        let (consumed, value) = Unpacker::new(&dds).unpack_with_extent(&bytes).expect("unpack");
        assert_eq!(consumed, 8);
        assert_eq!(value, Value::List(vec![Value::Float64(273.15)]));
    }

    #[test]
    fn byte_array_is_padded_to_four() {
        let dds = parse_dds("Dataset { Byte b[3]; Int32 x; } d;").expect("dds");
        let mut bytes = Vec::new();
        bytes.extend(be32(3));
        bytes.extend(be32(3));
        bytes.extend([1, 2, 3, 0xff]);
        bytes.extend(be32(7));
        let value = unpack(&dds, &bytes).expect("unpack");
        assert_eq!(
            value,
            Value::List(vec![
                Value::List(vec![Value::Byte(1), Value::Byte(2), Value::Byte(3)]),
                Value::Int32(7),
            ])
        );
    }

    #[test]
    fn int16_values_are_two_bytes_without_padding() {
        let dds = parse_dds("Dataset { Int16 s[3]; UInt16 u; } d;").expect("dds");
        let mut bytes = Vec::new();
        bytes.extend(be32(3));
        bytes.extend(be32(3));
        bytes.extend((-1i16).to_be_bytes());
        bytes.extend(2i16.to_be_bytes());
        bytes.extend(3i16.to_be_bytes());
        bytes.extend(65535u16.to_be_bytes());
        let (consumed, value) = Unpacker::new(&dds).unpack_with_extent(&bytes).expect("unpack");
        assert_eq!(consumed, 16);
        assert_eq!(
            value,
            Value::List(vec![
                Value::List(vec![Value::Int16(-1), Value::Int16(2), Value::Int16(3)]),
                Value::UInt16(65535),
            ])
        );
    }

    #[test]
    fn string_array_has_single_count_and_per_element_padding() {
        let dds = parse_dds("Dataset { String names[2]; Byte tail; } d;").expect("dds");
        let mut bytes = Vec::new();
        bytes.extend(be32(2));
        bytes.extend(be32(5));
        bytes.extend(b"hello\0\0\0");
        bytes.extend(be32(4));
        bytes.extend(b"\xe9t\xe9s");
        bytes.extend([9, 0, 0, 0]);
        let value = unpack(&dds, &bytes).expect("unpack");
        assert_eq!(
            value,
            Value::List(vec![
                Value::List(vec![
                    Value::String("hello".into()),
                    Value::String("\u{e9}t\u{e9}s".into()),
                ]),
                Value::Byte(9),
            ])
        );
    }

    #[test]
    fn two_dimensional_array_is_row_major() {
        let dds = parse_dds("Dataset { Int32 x[lat=2][lon=3]; } d;").expect("dds");
        let mut bytes = Vec::new();
        bytes.extend(be32(6));
        bytes.extend(be32(6));
        for i in 0..6i32 {
            bytes.extend(i.to_be_bytes());
        }
        let value = unpack(&dds, &bytes).expect("unpack");
        let rows = value.as_list().expect("dataset")[0].as_list().expect("array").to_vec();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1],
            Value::List(vec![Value::Int32(3), Value::Int32(4), Value::Int32(5)])
        );
    }

    #[test]
    fn grid_decodes_array_then_maps() {
        let dds = parse_dds(
            "Dataset { Grid { Array: Float32 t[time=2]; Maps: Float64 time[time=2]; } temp; } d;",
        )
        .expect("dds");
        let mut bytes = Vec::new();
        bytes.extend(be32(2));
        bytes.extend(be32(2));
        bytes.extend(1.5f32.to_be_bytes());
        bytes.extend(2.5f32.to_be_bytes());
        bytes.extend(be32(2));
        bytes.extend(be32(2));
        bytes.extend(10.0f64.to_be_bytes());
        bytes.extend(20.0f64.to_be_bytes());
        let value = unpack(&dds, &bytes).expect("unpack");
        assert_eq!(
            value,
            Value::List(vec![Value::List(vec![
                Value::List(vec![Value::Float32(1.5), Value::Float32(2.5)]),
                Value::List(vec![Value::Float64(10.0), Value::Float64(20.0)]),
            ])])
        );
    }

    #[test]
    fn sequence_rows_until_end_marker() {
        let dds = parse_dds("Dataset { Sequence { Int32 a; String s; } seq; } d;").expect("dds");
        let mut bytes = Vec::new();
        bytes.extend(be32(START_OF_SEQUENCE));
        bytes.extend(1i32.to_be_bytes());
        bytes.extend(be32(2));
        bytes.extend(b"hi\0\0");
        bytes.extend(be32(START_OF_SEQUENCE));
        bytes.extend(2i32.to_be_bytes());
        bytes.extend(be32(1));
        bytes.extend(b"x\0\0\0");
        bytes.extend(be32(END_OF_SEQUENCE));
        let (consumed, value) = Unpacker::new(&dds).unpack_with_extent(&bytes).expect("unpack");
        assert_eq!(consumed, bytes.len());
        let rows = value.as_list().expect("dataset")[0].as_list().expect("seq").to_vec();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            Value::List(vec![Value::Int32(1), Value::String("hi".into())])
        );
    }

    #[test]
    fn empty_sequence_reads_only_end_marker() {
        let dds = parse_dds("Dataset { Sequence { Int32 a; } seq; Int32 after; } d;").expect("dds");
        let mut bytes = Vec::new();
        bytes.extend(be32(END_OF_SEQUENCE));
        bytes.extend(5i32.to_be_bytes());
        let value = unpack(&dds, &bytes).expect("unpack");
        assert_eq!(
            value,
            Value::List(vec![Value::List(vec![]), Value::Int32(5)])
        );
    }

    #[test]
    fn base_variable_streamed_as_sequence() {
        let dds = parse_dds("Dataset { Int32 v; } d;").expect("dds");
        let mut bytes = Vec::new();
        bytes.extend(be32(START_OF_SEQUENCE));
        bytes.extend(5i32.to_be_bytes());
        bytes.extend(be32(START_OF_SEQUENCE));
        bytes.extend(6i32.to_be_bytes());
        bytes.extend(be32(END_OF_SEQUENCE));
        let value = unpack(&dds, &bytes).expect("unpack");
        assert_eq!(
            value,
            Value::List(vec![Value::List(vec![Value::Int32(5), Value::Int32(6)])])
        );
    }

    #[test]
    fn exhausted_buffer_is_decode_error() {
        let dds = parse_dds("Dataset { Int32 a; Float64 f; } d;").expect("dds");
        let mut bytes = Vec::new();
        bytes.extend(1i32.to_be_bytes());
        bytes.extend([0, 0, 0, 0]);
        match unpack(&dds, &bytes) {
            Err(Error::Decode { offset, .. }) => assert_eq!(offset, 4),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_sequence_is_decode_error() {
        let dds = parse_dds("Dataset { Sequence { Int32 a; } seq; } d;").expect("dds");
        let mut bytes = Vec::new();
        bytes.extend(be32(START_OF_SEQUENCE));
        bytes.extend(1i32.to_be_bytes());
        assert!(matches!(unpack(&dds, &bytes), Err(Error::Decode { .. })));
    }

    #[test]
    fn count_not_matching_shape_is_shape_error() {
        let dds = parse_dds("Dataset { Int32 x[2][2]; } d;").expect("dds");
        let mut bytes = Vec::new();
        bytes.extend(be32(3));
        bytes.extend(be32(3));
        for i in 0..3i32 {
            bytes.extend(i.to_be_bytes());
        }
        match unpack(&dds, &bytes) {
            Err(Error::Shape { count, shape }) => {
                assert_eq!(count, 3);
                assert_eq!(shape, vec![2, 2]);
            }
            other => panic!("expected shape error, got {:?}", other),
        }
    }

    #[test]
    fn alias_has_no_binary_form() {
        let dds = parse_dds("Dataset { Alias a; } d;").expect("dds");
        assert!(matches!(unpack(&dds, &[0, 0, 0, 1]), Err(Error::Decode { .. })));
    }
}
