//! Combined data responses: a copy of the DDS text, the `"\nData:\n"` marker,
//! then the XDR payload for that DDS.

use crate::ast::DapVar;
use crate::codec::Unpacker;
use crate::error::{Error, Result};
use crate::parser::parse_dds;
use crate::value::Value;
use tracing::debug;

/// Separates the DDS text from the binary payload.
pub const DATA_MARKER: &[u8] = b"\nData:\n";

/// Characters of the response quoted when the marker is missing (servers send
/// error text instead of data).
const PREVIEW_CHARS: usize = 40;

/// A data response split at the marker.
#[derive(Debug)]
pub struct DataResponse<'b> {
    /// DDS text, one char per byte.
    pub dds: String,
    /// Everything after the marker.
    pub payload: &'b [u8],
    /// Offset of `payload` in the original response.
    pub payload_offset: usize,
}

/// Result of decoding a data response.
#[derive(Debug)]
pub struct DecodedData {
    pub dataset: DapVar,
    pub value: Value,
    /// Bytes of the payload that were consumed, relative to the whole response.
    pub byte_range: (usize, usize),
}

pub fn split_data_response(bytes: &[u8]) -> Result<DataResponse<'_>> {
    let at = memchr::memmem::find(bytes, DATA_MARKER).ok_or_else(|| Error::Decode {
        offset: 0,
        reason: format!(
            "no data marker in response starting {:?}",
            latin1(&bytes[..bytes.len().min(PREVIEW_CHARS)])
        ),
    })?;
    let payload_offset = at + DATA_MARKER.len();
    Ok(DataResponse {
        dds: latin1(&bytes[..at]),
        payload: &bytes[payload_offset..],
        payload_offset,
    })
}

/// Split, parse the embedded DDS, and unpack the payload against it.
pub fn decode_data_response(bytes: &[u8]) -> Result<DecodedData> {
    let response = split_data_response(bytes)?;
    let dataset = parse_dds(&response.dds)?;
    let (consumed, value) = Unpacker::new(&dataset).unpack_with_extent(response.payload)?;
    debug!(
        dataset = %dataset.name,
        payload = response.payload.len(),
        consumed,
        "decoded data response"
    );
    let start = response.payload_offset;
    Ok(DecodedData {
        dataset,
        value,
        byte_range: (start, start + consumed),
    })
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
