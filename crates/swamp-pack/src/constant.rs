//! Data model of the constant pool.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type-signature reference, resolved by the type-info chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypeRef(pub u16);

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Final position of a constant in the pack's flat index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FileIndex(u16);

impl FileIndex {
    /// Sentinel for "never assigned". No constant may be written with it.
    pub const NOT_SET: Self = Self(0xFFFF);
    /// Largest index a constant can receive.
    pub const MAX: usize = 0xFFFE;

    /// Wraps a raw index. `None` for the sentinel.
    pub const fn new(raw: u16) -> Option<Self> {
        if raw == Self::NOT_SET.0 { None } else { Some(Self(raw)) }
    }

    /// Raw value as written on disk.
    pub const fn get(self) -> u16 { self.0 }
}

impl fmt::Display for FileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// The six constant kinds, in the order the encoder writes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConstantKind {
    /// Engine-provided function.
    ExternalFunction,
    /// Header of a compiler-defined function.
    FunctionDeclaration,
    /// `true` / `false`.
    Boolean,
    /// Signed 32-bit integer.
    Integer,
    /// String literal.
    String,
    /// Name of an external resource (asset path, etc.).
    ResourceName,
}

impl ConstantKind {
    /// Pool-kind precedence: index ranges follow this order.
    pub const WRITE_ORDER: [Self; 6] = [
        Self::ExternalFunction,
        Self::FunctionDeclaration,
        Self::Boolean,
        Self::Integer,
        Self::String,
        Self::ResourceName,
    ];

    /// Next kind in [`Self::WRITE_ORDER`], `None` after the last one.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::ExternalFunction => Some(Self::FunctionDeclaration),
            Self::FunctionDeclaration => Some(Self::Boolean),
            Self::Boolean => Some(Self::Integer),
            Self::Integer => Some(Self::String),
            Self::String => Some(Self::ResourceName),
            Self::ResourceName => None,
        }
    }
}

impl fmt::Display for ConstantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::ExternalFunction => "external function",
            Self::FunctionDeclaration => "function declaration",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::String => "string",
            Self::ResourceName => "resource name",
        })
    }
}

/// A pooled constant.
///
/// Identity is the value: two equal constants are the same pool entry and get
/// the same file index. Function references are identified by their name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Constant {
    /// String literal.
    String(String),
    /// Resource name.
    ResourceName(String),
    /// Signed 32-bit integer.
    Integer(i32),
    /// Boolean.
    Boolean(bool),
    /// Reference to an external function, by name.
    ExternalFunction(String),
    /// Reference to a function declaration, by name.
    FunctionDeclaration(String),
}

impl Constant {
    /// Kind of this constant.
    pub const fn kind(&self) -> ConstantKind {
        match self {
            Self::String(_) => ConstantKind::String,
            Self::ResourceName(_) => ConstantKind::ResourceName,
            Self::Integer(_) => ConstantKind::Integer,
            Self::Boolean(_) => ConstantKind::Boolean,
            Self::ExternalFunction(_) => ConstantKind::ExternalFunction,
            Self::FunctionDeclaration(_) => ConstantKind::FunctionDeclaration,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "'{s}'"),
            Self::ResourceName(s) => write!(f, "resource name '{s}'"),
            Self::Integer(v) => write!(f, "int: {v}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::ExternalFunction(name) => write!(f, "externalfunc {name}"),
            Self::FunctionDeclaration(name) => write!(f, "declarefunc {name}"),
        }
    }
}

/// Builtin or engine-provided function. Has no body in the pack.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExternalFunction {
    /// Unique name within the pool.
    pub name: String,
    /// Type signature.
    pub signature: TypeRef,
    /// Number of parameters.
    pub parameter_count: u8,
}

impl ExternalFunction {
    /// External functions are registered without a signature; it stays at 0.
    pub fn new(name: impl Into<String>, parameter_count: u8) -> Self {
        Self { name: name.into(), signature: TypeRef::default(), parameter_count }
    }
}

impl fmt::Display for ExternalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[fun {} signature:{} parameter:{}]", self.name, self.signature, self.parameter_count)
    }
}

/// Header of a compiler-defined function, for forward references.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FunctionDeclaration {
    /// Unique name within the pool.
    pub name: String,
    /// Type signature.
    pub signature: TypeRef,
    /// Number of parameters.
    pub parameter_count: u8,
}

impl FunctionDeclaration {
    /// Builds a declaration.
    pub fn new(name: impl Into<String>, signature: TypeRef, parameter_count: u8) -> Self {
        Self { name: name.into(), signature, parameter_count }
    }
}

impl fmt::Display for FunctionDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[fundeclaration {} signature:{} parameter:{}]", self.name, self.signature, self.parameter_count)
    }
}

/// Compiled function body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Function {
    /// Function name.
    pub name: String,
    /// Type signature.
    pub signature: TypeRef,
    /// Number of parameters.
    pub parameter_count: u8,
    /// Number of local variables.
    pub variable_count: u8,
    /// Local constant table; opcodes address constants through it.
    pub constants: Vec<Constant>,
    /// Compiled body.
    pub opcodes: Vec<u8>,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[fun {} signature:{} parameter:{} varcount:{} constant count:{}]",
            self.name,
            self.signature,
            self.parameter_count,
            self.variable_count,
            self.constants.len()
        )
    }
}
