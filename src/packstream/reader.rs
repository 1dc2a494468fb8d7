//! PackStream decoder. Marker-dispatched, recursion-capped, and
//! poison-on-first-error like [`super::writer::PackStreamWriter`].
//! Decoding is not lossy: any byte sequence the encoder produces round-trips
//! back to an equal `Value` (modulo map ordering).

use std::io::Read;

use indexmap::IndexMap;

use crate::errors::{duplicate_field, BoltError, Result};
use crate::value::{Structure, Value};

use super::marker;
use super::writer::DEFAULT_MAX_DEPTH;

pub struct PackStreamReader<R> {
    inner: R,
    max_depth: usize,
    poison: Option<String>,
}

impl<R: Read> PackStreamReader<R> {
    pub fn new(inner: R) -> Self {
        PackStreamReader {
            inner,
            max_depth: DEFAULT_MAX_DEPTH,
            poison: None,
        }
    }

    pub fn with_max_depth(inner: R, max_depth: usize) -> Self {
        PackStreamReader {
            inner,
            max_depth,
            poison: None,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn is_poisoned(&self) -> bool {
        self.poison.is_some()
    }

    pub fn read_value(&mut self) -> Result<Value> {
        if let Some(reason) = &self.poison {
            return Err(BoltError::DeserializationError(format!(
                "reader already failed: {reason}"
            )));
        }
        match self.decode_depth(0) {
            Ok(v) => Ok(v),
            Err(e) => {
                self.poison = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn decode_depth(&mut self, depth: usize) -> Result<Value> {
        if depth > self.max_depth {
            return Err(BoltError::RecursionDepthExceeded(self.max_depth));
        }
        let m = self.read_u8()?;
        match m {
            marker::NULL => Ok(Value::Null),
            marker::TRUE => Ok(Value::Boolean(true)),
            marker::FALSE => Ok(Value::Boolean(false)),
            marker::FLOAT_64 => {
                let mut buf = [0u8; 8];
                self.read_exact_buf(&mut buf)?;
                Ok(Value::Float(f64::from_be_bytes(buf)))
            }
            marker::INT_8 => {
                let mut buf = [0u8; 1];
                self.read_exact_buf(&mut buf)?;
                Ok(Value::Integer(buf[0] as i8 as i64))
            }
            marker::INT_16 => {
                let mut buf = [0u8; 2];
                self.read_exact_buf(&mut buf)?;
                Ok(Value::Integer(i16::from_be_bytes(buf) as i64))
            }
            marker::INT_32 => {
                let mut buf = [0u8; 4];
                self.read_exact_buf(&mut buf)?;
                Ok(Value::Integer(i32::from_be_bytes(buf) as i64))
            }
            marker::INT_64 => {
                let mut buf = [0u8; 8];
                self.read_exact_buf(&mut buf)?;
                Ok(Value::Integer(i64::from_be_bytes(buf)))
            }
            marker::STRING_8 => {
                let len = self.read_u8()? as usize;
                self.read_string(len)
            }
            marker::STRING_16 => {
                let len = self.read_u16()? as usize;
                self.read_string(len)
            }
            marker::STRING_32 => {
                let len = self.read_u32()? as usize;
                self.read_string(len)
            }
            marker::LIST_8 => {
                let len = self.read_u8()? as usize;
                self.read_list(len, depth)
            }
            marker::LIST_16 => {
                let len = self.read_u16()? as usize;
                self.read_list(len, depth)
            }
            marker::LIST_32 => {
                let len = self.read_u32()? as usize;
                self.read_list(len, depth)
            }
            marker::MAP_8 => {
                let len = self.read_u8()? as usize;
                self.read_map(len, depth)
            }
            marker::MAP_16 => {
                let len = self.read_u16()? as usize;
                self.read_map(len, depth)
            }
            marker::MAP_32 => {
                let len = self.read_u32()? as usize;
                self.read_map(len, depth)
            }
            marker::STRUCT_8 => {
                let len = self.read_u8()? as usize;
                let tag = self.read_u8()?;
                self.read_struct(len, tag, depth)
            }
            marker::STRUCT_16 => {
                let len = self.read_u16()? as usize;
                let tag = self.read_u8()?;
                self.read_struct(len, tag, depth)
            }
            m if (0x00..=0x7F).contains(&m) => Ok(Value::Integer(m as i64)),
            m if (marker::TINY_INT_NEGATIVE_MIN..=0xFF).contains(&m) => {
                Ok(Value::Integer(m as i8 as i64))
            }
            m if (marker::TINY_STRING_BASE..=0x8F).contains(&m) => {
                self.read_string((m & 0x0F) as usize)
            }
            m if (marker::TINY_LIST_BASE..=0x9F).contains(&m) => {
                self.read_list((m & 0x0F) as usize, depth)
            }
            m if (marker::TINY_MAP_BASE..=0xAF).contains(&m) => {
                self.read_map((m & 0x0F) as usize, depth)
            }
            m if (marker::TINY_STRUCT_BASE..=0xBF).contains(&m) => {
                let len = (m & 0x0F) as usize;
                let tag = self.read_u8()?;
                self.read_struct(len, tag, depth)
            }
            other => Err(BoltError::InvalidMessageFormat(format!(
                "unknown PackStream marker byte 0x{other:02X}"
            ))),
        }
    }

    fn read_string(&mut self, len: usize) -> Result<Value> {
        let mut buf = vec![0u8; len];
        self.read_exact_buf(&mut buf)?;
        String::from_utf8(buf)
            .map(Value::String)
            .map_err(|e| BoltError::DeserializationError(format!("invalid UTF-8 string: {e}")))
    }

    fn read_list(&mut self, len: usize, depth: usize) -> Result<Value> {
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(self.decode_depth(depth + 1)?);
        }
        Ok(Value::List(items))
    }

    fn read_map(&mut self, len: usize, depth: usize) -> Result<Value> {
        let mut map = IndexMap::with_capacity(len.min(1024));
        for _ in 0..len {
            let key = match self.decode_depth(depth + 1)? {
                Value::String(s) => s,
                other => {
                    return Err(BoltError::InvalidMessageFormat(format!(
                        "map key must be a string, got {:?}",
                        other.kind()
                    )))
                }
            };
            let value = self.decode_depth(depth + 1)?;
            if map.contains_key(&key) {
                return Err(duplicate_field(&key));
            }
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }

    fn read_struct(&mut self, len: usize, tag: u8, depth: usize) -> Result<Value> {
        let mut fields = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            fields.push(self.decode_depth(depth + 1)?);
        }
        Ok(Value::Structure(Structure::new(tag, fields)))
    }

    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact_buf(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact_buf(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact_buf(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_exact_buf(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(
                BoltError::DeserializationError(format!("truncated stream: {e}")),
            ),
            Err(e) => Err(BoltError::NetworkError(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packstream::writer::PackStreamWriter;

    fn roundtrip(value: Value) {
        let mut w = PackStreamWriter::new(Vec::new());
        w.write_value(&value).unwrap();
        let bytes = w.into_inner();
        let mut r = PackStreamReader::new(bytes.as_slice());
        let decoded = r.read_value().unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn roundtrips_scalars() {
        roundtrip(Value::Null);
        roundtrip(Value::Boolean(true));
        roundtrip(Value::Boolean(false));
        roundtrip(Value::Integer(0));
        roundtrip(Value::Integer(-16));
        roundtrip(Value::Integer(-17));
        roundtrip(Value::Integer(127));
        roundtrip(Value::Integer(128));
        roundtrip(Value::Integer(i64::MIN));
        roundtrip(Value::Integer(i64::MAX));
        roundtrip(Value::Float(3.5));
        roundtrip(Value::String("hello, bolt".to_string()));
    }

    #[test]
    fn roundtrips_nested_composites() {
        let mut map = IndexMap::new();
        map.insert("n".to_string(), Value::Integer(1));
        map.insert(
            "list".to_string(),
            Value::List(vec![Value::Null, Value::Boolean(true)]),
        );
        roundtrip(Value::Map(map));
        roundtrip(Value::Structure(Structure::new(
            0x4E,
            vec![Value::Integer(1), Value::List(vec![])],
        )));
    }

    #[test]
    fn size_boundaries_select_correct_form() {
        let s15 = Value::String("x".repeat(15));
        let mut w = PackStreamWriter::new(Vec::new());
        w.write_value(&s15).unwrap();
        assert_eq!(w.into_inner()[0] & 0xF0, marker::TINY_STRING_BASE);

        let s16 = Value::String("x".repeat(16));
        let mut w = PackStreamWriter::new(Vec::new());
        w.write_value(&s16).unwrap();
        assert_eq!(w.into_inner()[0], marker::STRING_8);

        let s256 = Value::String("x".repeat(256));
        let mut w = PackStreamWriter::new(Vec::new());
        w.write_value(&s256).unwrap();
        assert_eq!(w.into_inner()[0], marker::STRING_16);
    }

    #[test]
    fn non_string_map_key_is_invalid() {
        // 0xA1 = tiny map, 1 entry; key encoded as tiny-int 1 instead of a string.
        let bytes = [0xA1u8, 0x01, 0x01];
        let mut r = PackStreamReader::new(&bytes[..]);
        let err = r.read_value().unwrap_err();
        assert!(matches!(err, BoltError::InvalidMessageFormat(_)));
    }

    #[test]
    fn unknown_marker_is_invalid_format() {
        let bytes = [0xC5u8];
        let mut r = PackStreamReader::new(&bytes[..]);
        let err = r.read_value().unwrap_err();
        assert!(matches!(err, BoltError::InvalidMessageFormat(_)));
    }

    #[test]
    fn truncated_list_is_deserialization_error() {
        // Tiny list declaring 3 elements, but only 2 follow.
        let bytes = [0x93u8, 0x01, 0x02];
        let mut r = PackStreamReader::new(&bytes[..]);
        let err = r.read_value().unwrap_err();
        assert!(matches!(err, BoltError::DeserializationError(_)));
    }

    #[test]
    fn recursion_cap_rejects_excess_depth_on_decode() {
        let mut v = Value::Integer(1);
        for _ in 0..102 {
            v = Value::List(vec![v]);
        }
        let mut w = PackStreamWriter::with_max_depth(Vec::new(), 1000);
        w.write_value(&v).unwrap();
        let bytes = w.into_inner();
        let mut r = PackStreamReader::new(bytes.as_slice());
        let err = r.read_value().unwrap_err();
        assert!(matches!(err, BoltError::RecursionDepthExceeded(100)));
    }

    #[test]
    fn reader_poisons_after_first_error() {
        let bytes = [0xC5u8];
        let mut r = PackStreamReader::new(&bytes[..]);
        assert!(r.read_value().is_err());
        assert!(r.is_poisoned());
    }
}
