//! swamp-raff — RAFF container primitive
//!
//! Format :
//! ```text
//! Header: icon F0 9F A6 8A + "RAFF" + 0x0A (9 bytes)
//! [Chunk*]
//!   chunk  = icon[4] + name[4] + len u32 BE + payload
//!   marker = icon[4]            (internal chunk, framed by its parent)
//! ```
//!
//! Provides:
//! - `write_header`, `write_chunk`, `write_internal_chunk_marker` over any `io::Write`
//! - `ChunkReader` : sequential big-endian reader over a byte slice
//! - `RaffError` + alias `RaffResult<T>`
//!
//! The container assigns no meaning to a chunk beyond "tag + payload".

#![deny(missing_docs)]

/* ─────────────────────────── Imports ─────────────────────────── */

use std::io::{self, Write};

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use thiserror::Error;

/* ─────────────────────────── Octets ─────────────────────────── */

/// Four raw octets: an icon (usually a UTF-8 emoji) or an ASCII chunk name.
pub type FourOctets = [u8; 4];

/// Icon opening every RAFF file (🦊).
pub const HEADER_ICON: FourOctets = [0xF0, 0x9F, 0xA6, 0x8A];

/// ASCII name following the header icon.
pub const HEADER_NAME: FourOctets = *b"RAFF";

/// Full file header: icon, name, line feed.
pub const HEADER: [u8; 9] = [0xF0, 0x9F, 0xA6, 0x8A, b'R', b'A', b'F', b'F', 0x0A];

/// Renders four octets for diagnostics (emoji and ASCII names come out readable).
pub fn describe(octets: &FourOctets) -> String {
    match core::str::from_utf8(octets) {
        Ok(s) => s.to_owned(),
        Err(_) => format!("0x{:08X}", u32::from_be_bytes(*octets)),
    }
}

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Errors raised while framing or reading RAFF data.
#[derive(Debug, Error)]
pub enum RaffError {
    /// Sink or source failure, propagated unchanged.
    #[error("io: {0}")]
    Io(#[from] io::Error),

    /// The first nine octets are not a RAFF header.
    #[error("invalid RAFF header")]
    InvalidHeader,

    /// Buffer ended before a complete field could be read.
    #[error("unexpected EOF: need {needed} bytes at {at}")]
    UnexpectedEof {
        /// Number of octets the read required.
        needed: usize,
        /// Offset where the read started.
        at: usize,
    },

    /// A chunk payload does not fit the u32 length field.
    #[error("chunk payload too large: {len} bytes")]
    PayloadTooLarge {
        /// Offending payload length.
        len: usize,
    },

    /// An icon or name differs from the one the caller expects here.
    #[error("expected {} at {at}, found {}", describe(.expected), describe(.found))]
    UnexpectedTag {
        /// Octets the caller asked for.
        expected: FourOctets,
        /// Octets actually present.
        found: FourOctets,
        /// Offset of the tag.
        at: usize,
    },
}

/// Result alias for the container layer.
pub type RaffResult<T> = core::result::Result<T, RaffError>;

/* ─────────────────────────── Writer ─────────────────────────── */

/// Writes the RAFF file header. Done once per file.
pub fn write_header<W: Write + ?Sized>(writer: &mut W) -> RaffResult<()> {
    writer.write_all(&HEADER)?;
    Ok(())
}

/// Writes a complete chunk: icon, name, big-endian payload length, payload.
pub fn write_chunk<W: Write + ?Sized>(
    writer: &mut W,
    icon: FourOctets,
    name: FourOctets,
    payload: &[u8],
) -> RaffResult<()> {
    let len = u32::try_from(payload.len()).map_err(|_| RaffError::PayloadTooLarge { len: payload.len() })?;
    writer.write_all(&icon)?;
    writer.write_all(&name)?;
    writer.write_u32::<BigEndian>(len)?;
    writer.write_all(payload)?;
    Ok(())
}

/// Writes the marker of an internal chunk: only its icon.
///
/// The enclosing chunk's length frames the contents, so no name or length follows.
pub fn write_internal_chunk_marker<W: Write + ?Sized>(writer: &mut W, icon: FourOctets) -> RaffResult<()> {
    writer.write_all(&icon)?;
    Ok(())
}

/* ─────────────────────────── Reader ─────────────────────────── */

/// A chunk borrowed from the underlying buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Icon octets.
    pub icon: FourOctets,
    /// Name octets.
    pub name: FourOctets,
    /// Payload, exactly as long as the length field says.
    pub payload: &'a [u8],
}

/// Sequential reader over a byte slice (big-endian helpers).
#[derive(Debug, Clone)]
pub struct ChunkReader<'a> {
    data: &'a [u8],
    off: usize,
}

impl<'a> ChunkReader<'a> {
    /// Builds a reader at offset 0.
    pub const fn new(data: &'a [u8]) -> Self { Self { data, off: 0 } }
    /// Current offset.
    pub const fn offset(&self) -> usize { self.off }
    /// Octets left to read.
    pub const fn remaining(&self) -> usize { self.data.len().saturating_sub(self.off) }
    /// True once every octet has been consumed.
    pub const fn is_at_end(&self) -> bool { self.remaining() == 0 }

    /// Reads `n` octets (or fails on EOF).
    pub fn read_bytes(&mut self, n: usize) -> RaffResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(RaffError::UnexpectedEof { needed: n, at: self.off });
        }
        let start = self.off;
        self.off += n;
        Ok(&self.data[start..self.off])
    }

    /// Reads four raw octets.
    pub fn read_four_octets(&mut self) -> RaffResult<FourOctets> {
        let b = self.read_bytes(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    /// Reads one octet.
    pub fn read_u8(&mut self) -> RaffResult<u8> { Ok(self.read_bytes(1)?[0]) }

    /// Reads a u16 BE.
    pub fn read_u16_be(&mut self) -> RaffResult<u16> { Ok(BigEndian::read_u16(self.read_bytes(2)?)) }

    /// Reads a u32 BE.
    pub fn read_u32_be(&mut self) -> RaffResult<u32> { Ok(BigEndian::read_u32(self.read_bytes(4)?)) }

    /// Reads an i32 BE.
    pub fn read_i32_be(&mut self) -> RaffResult<i32> { Ok(BigEndian::read_i32(self.read_bytes(4)?)) }

    /// Reads and checks the RAFF file header.
    pub fn read_header(&mut self) -> RaffResult<()> {
        let at = self.off;
        let header = self.read_bytes(HEADER.len()).map_err(|_| RaffError::InvalidHeader)?;
        if header != HEADER {
            self.off = at;
            return Err(RaffError::InvalidHeader);
        }
        Ok(())
    }

    /// Reads one complete chunk.
    pub fn read_chunk(&mut self) -> RaffResult<Chunk<'a>> {
        let icon = self.read_four_octets()?;
        let name = self.read_four_octets()?;
        let len = self.read_u32_be()? as usize;
        let payload = self.read_bytes(len)?;
        Ok(Chunk { icon, name, payload })
    }

    /// Reads a chunk and checks its icon and name.
    pub fn expect_chunk(&mut self, icon: FourOctets, name: FourOctets) -> RaffResult<Chunk<'a>> {
        let at = self.off;
        let chunk = self.read_chunk()?;
        if chunk.icon != icon {
            return Err(RaffError::UnexpectedTag { expected: icon, found: chunk.icon, at });
        }
        if chunk.name != name {
            return Err(RaffError::UnexpectedTag { expected: name, found: chunk.name, at: at + 4 });
        }
        Ok(chunk)
    }

    /// Reads an internal chunk marker and checks it matches `icon`.
    pub fn expect_internal_chunk_marker(&mut self, icon: FourOctets) -> RaffResult<()> {
        let at = self.off;
        let found = self.read_four_octets()?;
        if found != icon {
            return Err(RaffError::UnexpectedTag { expected: icon, found, at });
        }
        Ok(())
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
