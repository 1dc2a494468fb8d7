//! Message chunker: frames an opaque payload as length-prefixed chunks
//! terminated by a 0-length chunk, and the inverse.

use std::io::{Read, Write};

use crate::errors::{BoltError, Result};

/// Largest payload a single chunk may carry: the length prefix is a `u16`
/// and `0x0000` is reserved as the end-of-message sentinel, so payload
/// chunks top out at `u16::MAX`.
pub const MAX_CHUNK_PAYLOAD: usize = 65535;

/// Default cap on the total size of one reassembled message. Guards
/// against unbounded memory use from a misbehaving or malicious peer;
/// `None` disables the cap entirely.
pub const DEFAULT_MAX_MESSAGE_SIZE: u64 = 16 * 1024 * 1024;

/// Writes a single logical message as one or more length-prefixed chunks
/// followed by the 0-length end-of-message marker.
pub fn chunk_write<W: Write>(sink: &mut W, payload: &[u8]) -> Result<()> {
    if payload.is_empty() {
        write_chunk_header(sink, 0)?;
        return sink.flush().map_err(BoltError::NetworkError);
    }
    for piece in payload.chunks(MAX_CHUNK_PAYLOAD) {
        write_chunk_header(sink, piece.len() as u16)?;
        sink.write_all(piece).map_err(BoltError::NetworkError)?;
    }
    write_chunk_header(sink, 0)?;
    sink.flush().map_err(BoltError::NetworkError)
}

fn write_chunk_header<W: Write>(sink: &mut W, len: u16) -> Result<()> {
    sink.write_all(&len.to_be_bytes()).map_err(BoltError::NetworkError)
}

/// Reassembles one logical message from its chunks. A `0x0000` length with
/// nothing yet accumulated is a NOOP keepalive; this function returns it as
/// an empty payload and the caller (the connection state machine) is
/// responsible for treating an empty payload as "skip and read again"
/// during streaming.
pub fn chunk_read<R: Read>(source: &mut R, max_message_size: Option<u64>) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    loop {
        let len = read_chunk_len(source)?;
        if len == 0 {
            return Ok(buffer);
        }
        let before = buffer.len() as u64;
        if let Some(cap) = max_message_size {
            if before + len as u64 > cap {
                return Err(BoltError::MessageTooLarge {
                    size: before + len as u64,
                    cap,
                });
            }
        }
        let start = buffer.len();
        buffer.resize(start + len as usize, 0);
        source
            .read_exact(&mut buffer[start..])
            .map_err(|e| classify_chunk_io_error(e))?;
    }
}

fn read_chunk_len<R: Read>(source: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    source.read_exact(&mut buf).map_err(classify_chunk_io_error)?;
    Ok(u16::from_be_bytes(buf))
}

fn classify_chunk_io_error(e: std::io::Error) -> BoltError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        BoltError::DeserializationError(format!("truncated chunk stream: {e}"))
    } else {
        BoltError::NetworkError(e)
    }
}
