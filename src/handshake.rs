//! Bolt version negotiation: a fixed 20-byte handshake.

use std::io::{Read, Write};

use crate::errors::{BoltError, Result};
use crate::version::Version;

/// `0x6060B017`, the four magic bytes every Bolt handshake request opens
/// with.
pub const MAGIC_PREAMBLE: [u8; 4] = [0x60, 0x60, 0xB0, 0x17];

const NO_VERSION: [u8; 4] = [0x00, 0x00, 0x00, 0x00];

/// Encodes up to four proposed versions as `[00 00 minor major]` each,
/// zero-padding unused slots, and builds the full 20-byte handshake
/// request.
pub fn build_handshake_request(proposed: &[Version]) -> [u8; 20] {
    assert!(proposed.len() <= 4, "at most 4 version proposals fit in a handshake");
    let mut out = [0u8; 20];
    out[0..4].copy_from_slice(&MAGIC_PREAMBLE);
    for (slot, version) in out[4..].chunks_mut(4).zip(proposed.iter()) {
        slot.copy_from_slice(&[0x00, 0x00, version.minor, version.major]);
    }
    out
}

/// Parses the server's 4-byte response. `00 00 00 00` means no proposed
/// version was acceptable: the handshake failed.
pub fn parse_handshake_response(response: [u8; 4]) -> Result<Version> {
    if response == NO_VERSION {
        return Err(BoltError::HandshakeFailed);
    }
    // response is [00, 00, minor, major]
    Ok(Version::new(response[3], response[2]))
}

/// Drives the handshake end-to-end over a transport: writes the 20-byte
/// request, reads the 4-byte response, and returns the negotiated version.
pub fn perform_handshake<T: Read + Write>(
    transport: &mut T,
    proposed: &[Version],
) -> Result<Version> {
    let request = build_handshake_request(proposed);
    transport.write_all(&request).map_err(BoltError::NetworkError)?;
    transport.flush().map_err(BoltError::NetworkError)?;
    let mut response = [0u8; 4];
    transport
        .read_exact(&mut response)
        .map_err(BoltError::NetworkError)?;
    parse_handshake_response(response)
}
