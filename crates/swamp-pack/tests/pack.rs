//! End-to-end behaviour of the pool + encoder.

use std::io::{self, Write};

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use swamp_pack::{
    pack, pack_with_indices, read_pack, write_pack, Constant, ConstantKind, ConstantRepo, FileIndex, PackError,
    PackResult, TypeRef,
};

const REFERENCE_HEX: &str = "f09fa68a524146460af09f93a673706b3400000000f09f939c7374693000000000f09f92bb7363643000000071f09f91be01040b636f72654c6973744d61700000f09f9b8200000001010c736f6d6546756e6374696f6e0002f09f909c0100f09f94a2020000003000000032f09f8ebb011163616e20796f752073656520746869733ff09f8cb300f09f908a000000010302000100010006303132333435";

fn hex(bytes: &[u8]) -> String { bytes.iter().map(|b| format!("{b:02x}")).collect() }

fn reference_repo() -> ConstantRepo {
    let mut repo = ConstantRepo::new();
    let declaration = repo.add_function_declaration("someFunction", TypeRef(2), 1);
    repo.add_external_function("coreListMap", 4);
    repo.add_boolean(false);
    repo.add_integer(48);
    repo.add_integer(50);
    repo.add_string("can you see this?");
    repo.add_function("functionWithOpcodes", TypeRef(3), 3, 2, vec![declaration], vec![48, 49, 50, 51, 52, 53]);
    repo
}

#[test]
fn reference_pack_is_byte_exact() -> PackResult<()> {
    let bytes = pack(&reference_repo(), &[])?;
    assert_eq!(hex(&bytes), REFERENCE_HEX);
    Ok(())
}

#[test]
fn reference_pack_indices() -> PackResult<()> {
    let (_, indices) = pack_with_indices(&reference_repo(), &[])?;
    let at = |c: Constant| indices.get(&c).map(FileIndex::get);
    assert_eq!(at(Constant::ExternalFunction("coreListMap".into())), Some(0));
    assert_eq!(at(Constant::FunctionDeclaration("someFunction".into())), Some(1));
    assert_eq!(at(Constant::Boolean(false)), Some(2));
    assert_eq!(at(Constant::Integer(48)), Some(3));
    assert_eq!(at(Constant::Integer(50)), Some(4));
    assert_eq!(at(Constant::String("can you see this?".into())), Some(5));
    assert_eq!(indices.len(), 6);
    Ok(())
}

#[test]
fn reference_pack_reads_back() -> PackResult<()> {
    let contents = read_pack(&pack(&reference_repo(), &[])?)?;
    assert_eq!(contents.external_functions[0].name, "coreListMap");
    assert_eq!(contents.function_declarations[0].signature, TypeRef(2));
    assert_eq!(contents.booleans, vec![false]);
    assert_eq!(contents.integers, vec![48, 50]);
    let f = &contents.functions[0];
    assert_eq!(f.opcodes, b"012345");
    assert_eq!(
        contents.constant_at(f.constant_indices[0]),
        Some(Constant::FunctionDeclaration("someFunction".into()))
    );
    Ok(())
}

#[test]
fn dedup_is_idempotent() {
    let mut repo = ConstantRepo::new();
    let first = repo.add_integer(5);
    let second = repo.add_integer(5);
    assert_eq!(first, second);
    assert_eq!(repo.integers().filter(|v| **v == 5).count(), 1);
}

#[test]
fn declare_before_reference() {
    let mut repo = ConstantRepo::new();
    assert!(matches!(repo.add_function_reference("f"), Err(PackError::DeclarationNotFound { .. })));
    let declared = repo.add_function_declaration("f", TypeRef(0), 0);
    assert_eq!(repo.add_function_reference("f").ok(), Some(declared));
}

#[test]
fn empty_pool_is_a_valid_pack() -> PackResult<()> {
    let contents = read_pack(&pack(&ConstantRepo::new(), &[])?)?;
    for kind in ConstantKind::WRITE_ORDER {
        assert_eq!(contents.count(kind), 0, "{kind}");
    }
    assert!(contents.functions.is_empty());
    Ok(())
}

#[test]
fn unregistered_constant_faults_every_time() {
    let mut repo = ConstantRepo::new();
    repo.add_integer(1);
    repo.add_function("main", TypeRef(0), 0, 0, vec![Constant::String("never added".into())], vec![]);
    for _ in 0..3 {
        let err = pack(&repo, &[]).unwrap_err();
        assert!(err.is_fatal(), "{err}");
    }
}

/// Accepts `budget` octets, then fails.
struct FailingSink {
    budget: usize,
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.budget == 0 {
            return Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"));
        }
        let n = buf.len().min(self.budget);
        self.budget -= n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

#[test]
fn sink_errors_propagate_unchanged() {
    let repo = reference_repo();
    for budget in [0, 5, 30, 100] {
        let err = write_pack(&mut FailingSink { budget }, &repo, &[]).unwrap_err();
        match err {
            PackError::Io(io) => assert_eq!(io.kind(), io::ErrorKind::StorageFull),
            other => panic!("budget {budget}: expected io error, got {other:?}"),
        }
    }
}

#[test]
fn writes_to_a_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("test.swamp-pack");
    let mut file = std::fs::File::create(&path)?;
    write_pack(&mut file, &reference_repo(), &[])?;
    drop(file);
    assert_eq!(hex(&std::fs::read(&path)?), REFERENCE_HEX);
    Ok(())
}

#[derive(Debug, Clone)]
enum Op {
    Str(String),
    Res(String),
    Int(i32),
    Bool(bool),
    Ext(String),
    Decl(String),
}

fn op() -> impl Strategy<Value = Op> {
    let name = "[a-d]{1,3}";
    prop_oneof![
        name.prop_map(Op::Str),
        name.prop_map(Op::Res),
        (-3i32..3).prop_map(Op::Int),
        any::<bool>().prop_map(Op::Bool),
        name.prop_map(Op::Ext),
        name.prop_map(Op::Decl),
    ]
}

proptest! {
    #[test]
    fn indices_are_dense_and_ordered_by_kind(ops in prop::collection::vec(op(), 0..60)) {
        let mut repo = ConstantRepo::new();
        let mut added = Vec::new();
        for op in ops {
            added.push(match op {
                Op::Str(s) => repo.add_string(s),
                Op::Res(s) => repo.add_resource_name(s),
                Op::Int(v) => repo.add_integer(v),
                Op::Bool(b) => repo.add_boolean(b),
                Op::Ext(s) => repo.add_external_function(s, 0),
                Op::Decl(s) => repo.add_function_declaration(s, TypeRef(0), 0),
            });
        }
        repo.add_function("all", TypeRef(0), 0, 0, added.clone(), vec![]);

        let (bytes, indices) = pack_with_indices(&repo, &[]).unwrap();
        prop_assert_eq!(indices.len(), repo.constant_count());

        let mut by_index: Vec<(u16, Constant)> = indices.iter().map(|(c, i)| (i.get(), c.clone())).collect();
        by_index.sort_by_key(|(i, _)| *i);
        for (expected, (index, _)) in by_index.iter().enumerate() {
            prop_assert_eq!(usize::from(*index), expected);
        }
        let kinds: Vec<ConstantKind> = by_index.iter().map(|(_, c)| c.kind()).collect();
        prop_assert!(kinds.windows(2).all(|w| w[0] <= w[1]));

        let contents = read_pack(&bytes).unwrap();
        let resolved: Vec<Constant> = contents.functions[0]
            .constant_indices
            .iter()
            .filter_map(|i| contents.constant_at(*i))
            .collect();
        prop_assert_eq!(resolved, added);
    }
}
