//! swamp-pack — constant pool and `.swamp-pack` encoder
//!
//! The compiler feeds constants, declarations and compiled function bodies
//! into a [`ConstantRepo`]; [`pack`] turns it into one binary artifact for
//! the runtime loader.
//!
//! - [`ConstantRepo`] : value-deduplicated scalars, name-deduplicated
//!   callables, declare-before-reference lookups
//! - [`PackEncoder`] : fixed section order, flat file-index space over the six
//!   constant kinds, function bodies resolved against a [`FileIndexMap`]
//! - [`pack_delegated`] : spk5 container shim over externally produced blobs
//! - [`read_pack`] / [`read_delegated_pack`] : whole-pack readers for tooling
//!
//! ```
//! use swamp_pack::{pack, read_pack, ConstantRepo, TypeRef};
//!
//! let mut repo = ConstantRepo::new();
//! repo.add_function_declaration("main", TypeRef(1), 0);
//! let answer = repo.add_integer(42);
//! repo.add_function("main", TypeRef(1), 0, 0, vec![answer], vec![0x01, 0x00]);
//!
//! let bytes = pack(&repo, &[])?;
//! assert_eq!(read_pack(&bytes)?.integers, vec![42]);
//! # Ok::<(), swamp_pack::PackError>(())
//! ```
//!
//! Features :
//! - `serde` : derive (dé)sérialisation on the data model and reader output
//! - `cli`   : `swamp-pack-dump` binary

#![deny(missing_docs)]
#![forbid(unsafe_code)]

/* ─────────────────────────── Modules ─────────────────────────── */

/// Data model: constants, callables, indices.
pub mod constant;
/// spk5 container shim.
pub mod delegated;
/// spk4 encoder and index assignment.
pub mod encode;
/// Error types.
pub mod error;
/// Whole-pack readers.
pub mod reader;
/// Constant pool.
pub mod repo;
/// Chunk icons and names.
pub mod tags;
/// Versions and layouts.
pub mod version;

/* ─────────────────────────── Re-exports ─────────────────────────── */

pub use constant::{Constant, ConstantKind, ExternalFunction, FileIndex, Function, FunctionDeclaration, TypeRef};
pub use delegated::{pack_delegated, write_delegated_pack, DelegatedBlobs};
pub use encode::{pack, pack_code, pack_with_indices, write_pack, EncoderState, FileIndexMap, PackEncoder};
pub use error::{DeclarationKind, InvariantViolation, PackError, PackResult};
pub use reader::{detect_format, read_delegated_pack, read_pack, FunctionRecord, PackContents};
pub use repo::ConstantRepo;
pub use version::{PackFormat, Version};

/// Prélude pratique pour importer les types/funcs clés du crate.
pub mod prelude {
    pub use super::{
        pack, pack_delegated, read_pack, Constant, ConstantKind, ConstantRepo, DelegatedBlobs, FileIndex, PackError,
        PackResult, TypeRef,
    };
}
