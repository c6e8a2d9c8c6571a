//! spk4 encoder: constant pool → `.swamp-pack` bytes.
//!
//! Layout :
//! ```text
//! RAFF header
//! 📦 "spk4"  (empty payload)
//! 📜 "sti0"  type info (opaque)
//! 💻 "scd0"  code:
//!     👾 count:u8   [params:u8 name:str8 signature:u16]*   external functions
//!     🛂 count:u32  [params:u8 name:str8 signature:u16]*   function declarations
//!     🐜 count:u8   [0|1]*                                 booleans
//!     🔢 count:u8   [i32 BE]*                              integers
//!     🎻 count:u8   [str8]*                                strings
//!     🌳 count:u8   [str8]*                                resource names
//!     🐊 count:u32  [params:u8 vars:u8 0:u8 n:u8 [index:u16]*n len:u16 opcodes]*
//! ```
//!
//! Every constant gets one index in a flat space shared by the six kinds, in
//! write order, starting at 0. Indices are assigned into a [`FileIndexMap`]
//! while the pools are written; the function section only reads that map,
//! which is why it has to come last.

use std::collections::HashMap;
use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use tracing::{debug, instrument, trace};

use crate::constant::{Constant, ConstantKind, ExternalFunction, FileIndex, FunctionDeclaration, TypeRef};
use crate::error::{InvariantViolation, PackError, PackResult};
use crate::repo::ConstantRepo;
use crate::tags;
use crate::version::PackFormat;

/* ─────────────────────────── File indices ─────────────────────────── */

/// Constant → file index, filled while the pools are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIndexMap {
    indices: HashMap<Constant, FileIndex>,
}

impl FileIndexMap {
    /// Empty map.
    pub fn new() -> Self { Self::default() }

    fn assign(&mut self, constant: Constant, index: FileIndex) {
        let previous = self.indices.insert(constant, index);
        debug_assert!(previous.is_none(), "constant indexed twice");
    }

    /// Index of `constant`, if it was written.
    pub fn get(&self, constant: &Constant) -> Option<FileIndex> { self.indices.get(constant).copied() }

    /// Index of `constant`; a missing one is an internal-consistency fault.
    pub fn resolve(&self, constant: &Constant, function: &str) -> PackResult<FileIndex> {
        self.get(constant).ok_or_else(|| {
            InvariantViolation::UnresolvedConstant { constant: constant.to_string(), function: function.to_owned() }
                .into()
        })
    }

    /// Number of indexed constants.
    pub fn len(&self) -> usize { self.indices.len() }

    /// True before any pool was written.
    pub fn is_empty(&self) -> bool { self.indices.is_empty() }

    /// All entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Constant, FileIndex)> + '_ {
        self.indices.iter().map(|(c, i)| (c, *i))
    }
}

/* ─────────────────────────── State machine ─────────────────────────── */

/// Where the encoder is in the fixed section order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    /// Nothing written yet.
    Idle,
    /// Writing the pool of one constant kind.
    PoolsWriting(ConstantKind),
    /// Writing function bodies.
    FunctionsWriting,
    /// Code section complete.
    Done,
}

impl EncoderState {
    /// The only state allowed after this one.
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::PoolsWriting(ConstantKind::WRITE_ORDER[0])),
            Self::PoolsWriting(kind) => match kind.next() {
                Some(next) => Some(Self::PoolsWriting(next)),
                None => Some(Self::FunctionsWriting),
            },
            Self::FunctionsWriting => Some(Self::Done),
            Self::Done => None,
        }
    }
}

/* ─────────────────────────── Encoder ─────────────────────────── */

/// Writes the code section of one pool.
///
/// Section writers must be called in [`EncoderState`] order;
/// [`Self::write_code`] does that for you.
#[derive(Debug)]
pub struct PackEncoder<'r> {
    repo: &'r ConstantRepo,
    state: EncoderState,
    indices: FileIndexMap,
    index_offset: usize,
}

impl<'r> PackEncoder<'r> {
    /// Encoder in [`EncoderState::Idle`].
    pub fn new(repo: &'r ConstantRepo) -> Self {
        Self { repo, state: EncoderState::Idle, indices: FileIndexMap::new(), index_offset: 0 }
    }

    /// Current state.
    pub const fn state(&self) -> EncoderState { self.state }

    /// Indices assigned so far.
    pub const fn indices(&self) -> &FileIndexMap { &self.indices }

    /// Gives back the index map once encoding is over.
    pub fn into_indices(self) -> FileIndexMap { self.indices }

    fn advance(&mut self, to: EncoderState) -> PackResult<()> {
        if self.state.successor() != Some(to) {
            return Err(InvariantViolation::OutOfOrder { from: self.state, to }.into());
        }
        self.state = to;
        Ok(())
    }

    /// Writes all seven sections in order and moves to [`EncoderState::Done`].
    pub fn write_code<W: Write + ?Sized>(&mut self, writer: &mut W) -> PackResult<()> {
        self.write_external_functions(writer)?;
        self.write_function_declarations(writer)?;
        self.write_booleans(writer)?;
        self.write_integers(writer)?;
        self.write_strings(writer)?;
        self.write_resource_names(writer)?;
        self.write_functions(writer)?;
        self.advance(EncoderState::Done)
    }

    /// 👾 section.
    pub fn write_external_functions<W: Write + ?Sized>(&mut self, writer: &mut W) -> PackResult<()> {
        let repo = self.repo;
        self.write_pool(
            writer,
            ConstantKind::ExternalFunction,
            repo.external_functions(),
            |f: &ExternalFunction| Constant::ExternalFunction(f.name.clone()),
            |w, f: &ExternalFunction| write_callable(w, f.parameter_count, &f.name, f.signature),
        )
    }

    /// 🛂 section.
    pub fn write_function_declarations<W: Write + ?Sized>(&mut self, writer: &mut W) -> PackResult<()> {
        let repo = self.repo;
        self.write_pool(
            writer,
            ConstantKind::FunctionDeclaration,
            repo.function_declarations(),
            |d: &FunctionDeclaration| Constant::FunctionDeclaration(d.name.clone()),
            |w, d: &FunctionDeclaration| write_callable(w, d.parameter_count, &d.name, d.signature),
        )
    }

    /// 🐜 section.
    pub fn write_booleans<W: Write + ?Sized>(&mut self, writer: &mut W) -> PackResult<()> {
        let repo = self.repo;
        self.write_pool(writer, ConstantKind::Boolean, repo.booleans(), |b: &bool| Constant::Boolean(*b), |w, b: &bool| {
            w.write_u8(u8::from(*b))?;
            Ok(())
        })
    }

    /// 🔢 section.
    pub fn write_integers<W: Write + ?Sized>(&mut self, writer: &mut W) -> PackResult<()> {
        let repo = self.repo;
        self.write_pool(writer, ConstantKind::Integer, repo.integers(), |v: &i32| Constant::Integer(*v), |w, v: &i32| {
            w.write_i32::<BigEndian>(*v)?;
            Ok(())
        })
    }

    /// 🎻 section.
    pub fn write_strings<W: Write + ?Sized>(&mut self, writer: &mut W) -> PackResult<()> {
        let repo = self.repo;
        self.write_pool(writer, ConstantKind::String, repo.strings(), |s: &String| Constant::String(s.clone()), |w, s: &String| {
            write_string(w, s, "string")
        })
    }

    /// 🌳 section.
    pub fn write_resource_names<W: Write + ?Sized>(&mut self, writer: &mut W) -> PackResult<()> {
        let repo = self.repo;
        self.write_pool(
            writer,
            ConstantKind::ResourceName,
            repo.resource_names(),
            |s: &String| Constant::ResourceName(s.clone()),
            |w, s: &String| write_string(w, s, "resource name"),
        )
    }

    /// 🐊 section. Only valid once all six pools are written.
    pub fn write_functions<W: Write + ?Sized>(&mut self, writer: &mut W) -> PackResult<()> {
        self.advance(EncoderState::FunctionsWriting)?;
        let functions = self.repo.functions();

        swamp_raff::write_internal_chunk_marker(writer, tags::FUNCTION_ICON)?;
        writer.write_u32::<BigEndian>(narrow(functions.len(), u32::MAX, "function count")?)?;

        for f in functions {
            let constant_count = narrow(f.constants.len(), u8::MAX, "function constant count")?;
            writer.write_all(&[f.parameter_count, f.variable_count, 0, constant_count])?;
            for constant in &f.constants {
                let index = self.indices.resolve(constant, &f.name)?;
                writer.write_u16::<BigEndian>(index.get())?;
            }
            writer.write_u16::<BigEndian>(narrow(f.opcodes.len(), u16::MAX, "opcode count")?)?;
            writer.write_all(&f.opcodes)?;
            trace!(function = %f.name, constants = f.constants.len(), opcodes = f.opcodes.len(), "wrote function");
        }

        debug!(count = functions.len(), "wrote functions");
        Ok(())
    }

    fn write_pool<'a, W, T, I>(
        &mut self,
        writer: &mut W,
        kind: ConstantKind,
        items: I,
        constant_of: impl Fn(&T) -> Constant,
        write_payload: impl Fn(&mut W, &T) -> PackResult<()>,
    ) -> PackResult<()>
    where
        W: Write + ?Sized,
        T: 'a + ?Sized,
        I: ExactSizeIterator<Item = &'a T>,
    {
        self.advance(EncoderState::PoolsWriting(kind))?;
        let count = items.len();

        swamp_raff::write_internal_chunk_marker(writer, kind.icon())?;
        write_count(writer, kind, count)?;

        for (position, item) in items.enumerate() {
            let index = file_index(self.index_offset + position)?;
            self.indices.assign(constant_of(item), index);
            write_payload(writer, item)?;
        }

        debug!(%kind, count, offset = self.index_offset, "wrote constant pool");
        self.index_offset += count;
        Ok(())
    }
}

/* ─────────────────────────── Field writers ─────────────────────────── */

fn write_count<W: Write + ?Sized>(writer: &mut W, kind: ConstantKind, count: usize) -> PackResult<()> {
    match kind {
        ConstantKind::FunctionDeclaration => {
            let n = u32::try_from(count).map_err(|_| PackError::pool_overflow(kind, count, u32::MAX as usize))?;
            writer.write_u32::<BigEndian>(n)?;
        }
        _ => {
            let n = u8::try_from(count).map_err(|_| PackError::pool_overflow(kind, count, u8::MAX as usize))?;
            writer.write_u8(n)?;
        }
    }
    Ok(())
}

fn write_string<W: Write + ?Sized>(writer: &mut W, s: &str, field: &'static str) -> PackResult<()> {
    writer.write_u8(narrow(s.len(), u8::MAX, field)?)?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

fn write_callable<W: Write + ?Sized>(
    writer: &mut W,
    parameter_count: u8,
    name: &str,
    signature: TypeRef,
) -> PackResult<()> {
    writer.write_u8(parameter_count)?;
    write_string(writer, name, "function name")?;
    writer.write_u16::<BigEndian>(signature.0)?;
    Ok(())
}

fn file_index(raw: usize) -> PackResult<FileIndex> {
    u16::try_from(raw)
        .ok()
        .and_then(FileIndex::new)
        .ok_or_else(|| PackError::Overflow { field: "constant index".into(), value: raw, max: FileIndex::MAX })
}

fn narrow<T>(value: usize, max: T, field: &'static str) -> PackResult<T>
where
    T: TryFrom<usize> + Into<u64>,
{
    T::try_from(value).map_err(|_| PackError::Overflow {
        field: field.into(),
        value,
        max: usize::try_from(max.into()).unwrap_or(usize::MAX),
    })
}

/* ─────────────────────────── Top level ─────────────────────────── */

/// Encodes only the payload of the code chunk.
pub fn pack_code(repo: &ConstantRepo) -> PackResult<(Vec<u8>, FileIndexMap)> {
    let mut buf = Vec::new();
    let mut encoder = PackEncoder::new(repo);
    encoder.write_code(&mut buf)?;
    Ok((buf, encoder.into_indices()))
}

/// Writes a complete spk4 pack to `writer` and returns the indices assigned.
#[instrument(skip_all, fields(constants = repo.constant_count(), functions = repo.functions().len()))]
pub fn write_pack<W: Write + ?Sized>(writer: &mut W, repo: &ConstantRepo, type_info: &[u8]) -> PackResult<FileIndexMap> {
    let (code, indices) = pack_code(repo)?;

    swamp_raff::write_header(writer)?;
    swamp_raff::write_chunk(writer, tags::PACK_ICON, PackFormat::Spk4.name(), &[])?;
    swamp_raff::write_chunk(writer, tags::TYPE_INFO_ICON, tags::TYPE_INFO_NAME, type_info)?;
    swamp_raff::write_chunk(writer, tags::CODE_ICON, tags::CODE_NAME, &code)?;

    debug!(type_info = type_info.len(), code = code.len(), "pack written");
    Ok(indices)
}

/// Encodes a complete spk4 pack in memory.
pub fn pack(repo: &ConstantRepo, type_info: &[u8]) -> PackResult<Vec<u8>> {
    pack_with_indices(repo, type_info).map(|(bytes, _)| bytes)
}

/// Like [`pack`], also returning the indices each constant received.
pub fn pack_with_indices(repo: &ConstantRepo, type_info: &[u8]) -> PackResult<(Vec<u8>, FileIndexMap)> {
    let mut out = Vec::new();
    let indices = write_pack(&mut out, repo, type_info)?;
    Ok((out, indices))
}

/* ─────────────────────────── Tests ─────────────────────────── */
