//! PackStream encoder. Chooses the smallest marker that fits, enforces a
//! recursion-depth cap, and is poison-on-first-error: once a write fails,
//! every subsequent call on the same writer is a no-op that returns the
//! same error, mirroring the chunk/message codecs built on top of it.

use std::io::Write;

use crate::errors::{BoltError, Result};
use crate::value::Value;

use super::marker;

/// Default recursion-depth cap: bounds stack usage against pathological
/// input. Configurable via [`PackStreamWriter::with_max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 100;

pub struct PackStreamWriter<W> {
    inner: W,
    max_depth: usize,
    poison: Option<String>,
}

impl<W: Write> PackStreamWriter<W> {
    pub fn new(inner: W) -> Self {
        PackStreamWriter {
            inner,
            max_depth: DEFAULT_MAX_DEPTH,
            poison: None,
        }
    }

    pub fn with_max_depth(inner: W, max_depth: usize) -> Self {
        PackStreamWriter {
            inner,
            max_depth,
            poison: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn is_poisoned(&self) -> bool {
        self.poison.is_some()
    }

    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        if let Some(reason) = &self.poison {
            return Err(BoltError::SerializationError(format!(
                "writer already failed: {reason}"
            )));
        }
        match self.encode_depth(value, 0) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.poison = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn encode_depth(&mut self, value: &Value, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(BoltError::RecursionDepthExceeded(self.max_depth));
        }
        match value {
            Value::Null => self.write_raw(&[marker::NULL]),
            Value::Boolean(false) => self.write_raw(&[marker::FALSE]),
            Value::Boolean(true) => self.write_raw(&[marker::TRUE]),
            Value::Integer(i) => self.encode_integer(*i),
            Value::Float(f) => {
                let mut buf = [marker::FLOAT_64; 9];
                buf[1..].copy_from_slice(&f.to_be_bytes());
                self.write_raw(&buf)
            }
            Value::String(s) => self.encode_string(s),
            Value::List(items) => {
                self.encode_list_header(items.len())?;
                for item in items {
                    self.encode_depth(item, depth + 1)?;
                }
                Ok(())
            }
            Value::Map(map) => {
                self.encode_map_header(map.len())?;
                for (k, v) in map {
                    self.encode_string(k)?;
                    self.encode_depth(v, depth + 1)?;
                }
                Ok(())
            }
            Value::Structure(s) => {
                self.encode_struct_header(s.fields.len(), s.tag)?;
                for f in &s.fields {
                    self.encode_depth(f, depth + 1)?;
                }
                Ok(())
            }
        }
    }

    fn encode_integer(&mut self, v: i64) -> Result<()> {
        if (-16..=127).contains(&v) {
            self.write_raw(&[v as i8 as u8])
        } else if let Ok(v8) = i8::try_from(v) {
            self.write_raw(&[marker::INT_8, v8 as u8])
        } else if let Ok(v16) = i16::try_from(v) {
            let mut buf = [marker::INT_16; 3];
            buf[1..].copy_from_slice(&v16.to_be_bytes());
            self.write_raw(&buf)
        } else if let Ok(v32) = i32::try_from(v) {
            let mut buf = [marker::INT_32; 5];
            buf[1..].copy_from_slice(&v32.to_be_bytes());
            self.write_raw(&buf)
        } else {
            let mut buf = [marker::INT_64; 9];
            buf[1..].copy_from_slice(&v.to_be_bytes());
            self.write_raw(&buf)
        }
    }

    fn encode_string(&mut self, s: &str) -> Result<()> {
        let bytes = s.as_bytes();
        self.encode_sized_header(
            bytes.len(),
            marker::TINY_STRING_BASE,
            marker::STRING_8,
            marker::STRING_16,
            Some(marker::STRING_32),
        )?;
        self.write_raw(bytes)
    }

    fn encode_list_header(&mut self, len: usize) -> Result<()> {
        self.encode_sized_header(
            len,
            marker::TINY_LIST_BASE,
            marker::LIST_8,
            marker::LIST_16,
            Some(marker::LIST_32),
        )
    }

    fn encode_map_header(&mut self, len: usize) -> Result<()> {
        self.encode_sized_header(
            len,
            marker::TINY_MAP_BASE,
            marker::MAP_8,
            marker::MAP_16,
            Some(marker::MAP_32),
        )
    }

    /// Structures have no 32-bit form: anything past `STRUCT_SIZE_MAX`
    /// fields is ill-formed.
    fn encode_struct_header(&mut self, len: usize, tag: u8) -> Result<()> {
        if len > marker::STRUCT_SIZE_MAX {
            return Err(BoltError::SerializationError(format!(
                "structure has {len} fields, exceeding the {} field limit",
                marker::STRUCT_SIZE_MAX
            )));
        }
        if len <= marker::TINY_MAX {
            self.write_raw(&[marker::TINY_STRUCT_BASE | len as u8, tag])
        } else if len <= marker::SIZE_8_MAX {
            self.write_raw(&[marker::STRUCT_8, len as u8, tag])
        } else {
            let mut buf = [0u8; 4];
            buf[0] = marker::STRUCT_16;
            buf[1..3].copy_from_slice(&(len as u16).to_be_bytes());
            buf[3] = tag;
            self.write_raw(&buf)
        }
    }

    fn encode_sized_header(
        &mut self,
        len: usize,
        tiny_base: u8,
        marker_8: u8,
        marker_16: u8,
        marker_32: Option<u8>,
    ) -> Result<()> {
        if len <= marker::TINY_MAX {
            self.write_raw(&[tiny_base | len as u8])
        } else if len <= marker::SIZE_8_MAX {
            self.write_raw(&[marker_8, len as u8])
        } else if len <= marker::SIZE_16_MAX {
            let mut buf = [0u8; 3];
            buf[0] = marker_16;
            buf[1..].copy_from_slice(&(len as u16).to_be_bytes());
            self.write_raw(&buf)
        } else if let Some(marker_32) = marker_32 {
            if len > marker::SIZE_32_MAX {
                return Err(BoltError::SerializationError(format!(
                    "size {len} exceeds the 32-bit length limit"
                )));
            }
            let mut buf = [0u8; 5];
            buf[0] = marker_32;
            buf[1..].copy_from_slice(&(len as u32).to_be_bytes());
            self.write_raw(&buf)
        } else {
            Err(BoltError::SerializationError(format!(
                "size {len} has no larger marker form available"
            )))
        }
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).map_err(BoltError::NetworkError)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(BoltError::NetworkError)
    }
}
