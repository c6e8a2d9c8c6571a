//! spk5 layout: a container shim over blobs produced elsewhere.
//!
//! ```text
//! RAFF header
//! 📦 "spk5"  (empty payload)
//! 📜 "sti0"  type info
//! 💾 "dme1"  constant memory image
//! 📒 "ldg0"  reference ledger
//! ```
//!
//! No pooling, no indexing: the three payloads are written as given.

use std::io::Write;

use tracing::{debug, instrument};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PackResult;
use crate::tags;
use crate::version::PackFormat;

/// The three opaque payloads of an spk5 pack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DelegatedBlobs {
    /// Type information.
    pub type_info: Vec<u8>,
    /// Flattened constant memory image.
    pub constant_memory: Vec<u8>,
    /// Reference ledger into the constant memory.
    pub ledger: Vec<u8>,
}

/// Writes an spk5 pack to `writer`.
#[instrument(skip_all, fields(type_info = type_info.len(), constant_memory = constant_memory.len(), ledger = ledger.len()))]
pub fn write_delegated_pack<W: Write + ?Sized>(
    writer: &mut W,
    type_info: &[u8],
    constant_memory: &[u8],
    ledger: &[u8],
) -> PackResult<()> {
    swamp_raff::write_header(writer)?;
    swamp_raff::write_chunk(writer, tags::PACK_ICON, PackFormat::Spk5.name(), &[])?;
    swamp_raff::write_chunk(writer, tags::TYPE_INFO_ICON, tags::TYPE_INFO_NAME, type_info)?;
    swamp_raff::write_chunk(writer, tags::CONSTANT_MEMORY_ICON, tags::CONSTANT_MEMORY_NAME, constant_memory)?;
    swamp_raff::write_chunk(writer, tags::LEDGER_ICON, tags::LEDGER_NAME, ledger)?;
    debug!("delegated pack written");
    Ok(())
}

/// Encodes an spk5 pack in memory.
pub fn pack_delegated(blobs: &DelegatedBlobs) -> PackResult<Vec<u8>> {
    let mut out = Vec::new();
    write_delegated_pack(&mut out, &blobs.type_info, &blobs.constant_memory, &blobs.ledger)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blobs_are_wrapped_verbatim() -> PackResult<()> {
        let blobs = DelegatedBlobs { type_info: vec![1], constant_memory: vec![2, 3], ledger: Vec::new() };
        let bytes = pack_delegated(&blobs)?;

        let mut expected = swamp_raff::HEADER.to_vec();
        expected.extend_from_slice(&[0xF0, 0x9F, 0x93, 0xA6, b's', b'p', b'k', b'5', 0, 0, 0, 0]);
        expected.extend_from_slice(&[0xF0, 0x9F, 0x93, 0x9C, b's', b't', b'i', b'0', 0, 0, 0, 1, 1]);
        expected.extend_from_slice(&[0xF0, 0x9F, 0x92, 0xBE, b'd', b'm', b'e', b'1', 0, 0, 0, 2, 2, 3]);
        expected.extend_from_slice(&[0xF0, 0x9F, 0x93, 0x92, b'l', b'd', b'g', b'0', 0, 0, 0, 0]);
        assert_eq!(bytes, expected);
        Ok(())
    }
}
