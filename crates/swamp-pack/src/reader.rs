//! Reads complete packs back, for inspection and tooling.
//!
//! Whole-buffer only: the input must hold the entire pack, and any trailing
//! octet is an error.

use swamp_raff::{Chunk, ChunkReader};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constant::{Constant, ConstantKind, ExternalFunction, FileIndex, FunctionDeclaration, TypeRef};
use crate::delegated::DelegatedBlobs;
use crate::error::{PackError, PackResult};
use crate::tags;
use crate::version::PackFormat;

/// Function record as stored on disk (names and signatures are not written).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FunctionRecord {
    /// Number of parameters.
    pub parameter_count: u8,
    /// Number of local variables.
    pub variable_count: u8,
    /// File indices of the local constant table.
    pub constant_indices: Vec<FileIndex>,
    /// Compiled body.
    pub opcodes: Vec<u8>,
}

/// Decoded spk4 pack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackContents {
    /// Opaque type-info payload.
    pub type_info: Vec<u8>,
    /// External functions, index order.
    pub external_functions: Vec<ExternalFunction>,
    /// Function declarations, index order.
    pub function_declarations: Vec<FunctionDeclaration>,
    /// Booleans, index order.
    pub booleans: Vec<bool>,
    /// Integers, index order.
    pub integers: Vec<i32>,
    /// Strings, index order.
    pub strings: Vec<String>,
    /// Resource names, index order.
    pub resource_names: Vec<String>,
    /// Function records, pool order.
    pub functions: Vec<FunctionRecord>,
}

impl PackContents {
    /// Number of entries of `kind`.
    pub fn count(&self, kind: ConstantKind) -> usize {
        match kind {
            ConstantKind::ExternalFunction => self.external_functions.len(),
            ConstantKind::FunctionDeclaration => self.function_declarations.len(),
            ConstantKind::Boolean => self.booleans.len(),
            ConstantKind::Integer => self.integers.len(),
            ConstantKind::String => self.strings.len(),
            ConstantKind::ResourceName => self.resource_names.len(),
        }
    }

    /// Total constants over all kinds.
    pub fn constant_count(&self) -> usize { ConstantKind::WRITE_ORDER.iter().map(|k| self.count(*k)).sum() }

    /// Constant stored at `index`, walking the kinds in write order.
    pub fn constant_at(&self, index: FileIndex) -> Option<Constant> {
        let mut rest = usize::from(index.get());
        for kind in ConstantKind::WRITE_ORDER {
            let n = self.count(kind);
            if rest < n {
                return Some(match kind {
                    ConstantKind::ExternalFunction => Constant::ExternalFunction(self.external_functions[rest].name.clone()),
                    ConstantKind::FunctionDeclaration => {
                        Constant::FunctionDeclaration(self.function_declarations[rest].name.clone())
                    }
                    ConstantKind::Boolean => Constant::Boolean(self.booleans[rest]),
                    ConstantKind::Integer => Constant::Integer(self.integers[rest]),
                    ConstantKind::String => Constant::String(self.strings[rest].clone()),
                    ConstantKind::ResourceName => Constant::ResourceName(self.resource_names[rest].clone()),
                });
            }
            rest -= n;
        }
        None
    }
}

/* ─────────────────────────── Entry points ─────────────────────────── */

/// Layout of a pack, from its pack-id chunk.
pub fn detect_format(bytes: &[u8]) -> PackResult<PackFormat> {
    let mut r = ChunkReader::new(bytes);
    r.read_header()?;
    let id = r.read_chunk()?;
    if id.icon != tags::PACK_ICON {
        return Err(PackError::decode("first chunk is not a pack identifier"));
    }
    PackFormat::from_name(id.name)
        .ok_or_else(|| PackError::decode(format!("unknown pack format {}", swamp_raff::describe(&id.name))))
}

/// Decodes a complete spk4 pack.
pub fn read_pack(bytes: &[u8]) -> PackResult<PackContents> {
    let mut r = ChunkReader::new(bytes);
    r.read_header()?;
    expect_empty(r.expect_chunk(tags::PACK_ICON, PackFormat::Spk4.name())?)?;
    let type_info = r.expect_chunk(tags::TYPE_INFO_ICON, tags::TYPE_INFO_NAME)?;
    let code = r.expect_chunk(tags::CODE_ICON, tags::CODE_NAME)?;
    expect_end(&r)?;

    let mut contents = PackContents { type_info: type_info.payload.to_vec(), ..PackContents::default() };
    read_code(code.payload, &mut contents)?;
    debug!(constants = contents.constant_count(), functions = contents.functions.len(), "pack read");
    Ok(contents)
}

/// Decodes a complete spk5 pack into its three blobs.
pub fn read_delegated_pack(bytes: &[u8]) -> PackResult<DelegatedBlobs> {
    let mut r = ChunkReader::new(bytes);
    r.read_header()?;
    expect_empty(r.expect_chunk(tags::PACK_ICON, PackFormat::Spk5.name())?)?;
    let type_info = r.expect_chunk(tags::TYPE_INFO_ICON, tags::TYPE_INFO_NAME)?;
    let constant_memory = r.expect_chunk(tags::CONSTANT_MEMORY_ICON, tags::CONSTANT_MEMORY_NAME)?;
    let ledger = r.expect_chunk(tags::LEDGER_ICON, tags::LEDGER_NAME)?;
    expect_end(&r)?;
    Ok(DelegatedBlobs {
        type_info: type_info.payload.to_vec(),
        constant_memory: constant_memory.payload.to_vec(),
        ledger: ledger.payload.to_vec(),
    })
}

/* ─────────────────────────── Code chunk ─────────────────────────── */

fn read_code(payload: &[u8], out: &mut PackContents) -> PackResult<()> {
    let mut r = ChunkReader::new(payload);

    r.expect_internal_chunk_marker(tags::EXTERNAL_FUNCTION_ICON)?;
    let n = usize::from(r.read_u8()?);
    for _ in 0..n {
        let (parameter_count, name, signature) = read_callable(&mut r)?;
        out.external_functions.push(ExternalFunction { name, signature, parameter_count });
    }

    r.expect_internal_chunk_marker(tags::FUNCTION_DECLARATION_ICON)?;
    let n = r.read_u32_be()?;
    for _ in 0..n {
        let (parameter_count, name, signature) = read_callable(&mut r)?;
        out.function_declarations.push(FunctionDeclaration { name, signature, parameter_count });
    }

    r.expect_internal_chunk_marker(tags::BOOLEAN_ICON)?;
    let n = usize::from(r.read_u8()?);
    for _ in 0..n {
        out.booleans.push(match r.read_u8()? {
            0 => false,
            1 => true,
            other => return Err(PackError::decode(format!("invalid boolean octet {other}"))),
        });
    }

    r.expect_internal_chunk_marker(tags::INTEGER_ICON)?;
    let n = usize::from(r.read_u8()?);
    for _ in 0..n {
        out.integers.push(r.read_i32_be()?);
    }

    r.expect_internal_chunk_marker(tags::STRING_ICON)?;
    let n = usize::from(r.read_u8()?);
    for _ in 0..n {
        out.strings.push(read_string(&mut r)?);
    }

    r.expect_internal_chunk_marker(tags::RESOURCE_NAME_ICON)?;
    let n = usize::from(r.read_u8()?);
    for _ in 0..n {
        out.resource_names.push(read_string(&mut r)?);
    }

    r.expect_internal_chunk_marker(tags::FUNCTION_ICON)?;
    let n = r.read_u32_be()?;
    let total = out.constant_count();
    for _ in 0..n {
        let parameter_count = r.read_u8()?;
        let variable_count = r.read_u8()?;
        let _reserved = r.read_u8()?;
        let constant_count = r.read_u8()?;
        let mut constant_indices = Vec::with_capacity(usize::from(constant_count));
        for _ in 0..constant_count {
            let raw = r.read_u16_be()?;
            let index = FileIndex::new(raw)
                .filter(|i| usize::from(i.get()) < total)
                .ok_or_else(|| PackError::decode(format!("constant index {raw} outside 0..{total}")))?;
            constant_indices.push(index);
        }
        let opcode_count = usize::from(r.read_u16_be()?);
        let opcodes = r.read_bytes(opcode_count)?.to_vec();
        out.functions.push(FunctionRecord { parameter_count, variable_count, constant_indices, opcodes });
    }

    expect_end(&r)
}

fn read_callable(r: &mut ChunkReader<'_>) -> PackResult<(u8, String, TypeRef)> {
    let parameter_count = r.read_u8()?;
    let name = read_string(r)?;
    let signature = TypeRef(r.read_u16_be()?);
    Ok((parameter_count, name, signature))
}

fn read_string(r: &mut ChunkReader<'_>) -> PackResult<String> {
    let len = usize::from(r.read_u8()?);
    let bytes = r.read_bytes(len)?;
    core::str::from_utf8(bytes).map(str::to_owned).map_err(|_| PackError::decode("invalid UTF-8"))
}

fn expect_empty(chunk: Chunk<'_>) -> PackResult<()> {
    if chunk.payload.is_empty() {
        Ok(())
    } else {
        Err(PackError::decode("pack identifier chunk carries a payload"))
    }
}

fn expect_end(r: &ChunkReader<'_>) -> PackResult<()> {
    if r.is_at_end() {
        Ok(())
    } else {
        Err(PackError::decode(format!("{} trailing bytes at {}", r.remaining(), r.offset())))
    }
}
