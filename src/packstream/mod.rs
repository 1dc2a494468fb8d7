//! PackStream: Bolt's self-describing binary value encoding.

pub mod marker;
mod reader;
mod writer;

pub use reader::PackStreamReader;
pub use writer::{PackStreamWriter, DEFAULT_MAX_DEPTH};

use crate::errors::Result;
use crate::value::Value;

/// Encode a single `Value` to an in-memory buffer, for callers that don't
/// need a streaming writer (most message serializers do).
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut w = PackStreamWriter::new(Vec::new());
    w.write_value(value)?;
    Ok(w.into_inner())
}

/// Decode a single `Value` from a byte slice.
pub fn decode(bytes: &[u8]) -> Result<Value> {
    let mut r = PackStreamReader::new(bytes);
    r.read_value()
}
