//! Errors of the pack layer.
//!
//! Two tiers share one type: recoverable failures a caller is expected to
//! handle (missing declaration, sink I/O, width limits, malformed input) and
//! [`InvariantViolation`]s, which mean the pool/encoder contract was broken and
//! the encode must not be retried as-is. [`PackError::is_fatal`] tells them apart.

use core::fmt;
use std::borrow::Cow;
use std::io;

use swamp_raff::RaffError;
use thiserror::Error;

use crate::constant::ConstantKind;
use crate::encode::EncoderState;

/// Which kind of declaration a reference lookup was after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// A compiler-defined function declared with `add_function_declaration`.
    Function,
    /// An engine-provided function registered with `add_external_function`.
    ExternalFunction,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Function => "function",
            Self::ExternalFunction => "external function",
        })
    }
}

/// Programming-error class faults. Not meant to be recovered from mid-encode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A function references a constant that never received a file index.
    #[error("wrong index for constant {constant} in function {function}")]
    UnresolvedConstant {
        /// The constant, rendered for diagnostics.
        constant: String,
        /// Name of the function holding the reference.
        function: String,
    },

    /// The encoder was driven out of its fixed section order.
    #[error("encoder cannot go from {from:?} to {to:?}")]
    OutOfOrder {
        /// State the encoder was in.
        from: EncoderState,
        /// State that was requested.
        to: EncoderState,
    },
}

/// Errors of the pack layer.
#[derive(Debug, Error)]
pub enum PackError {
    /// Reference to a name that no prior declaration registered.
    #[error("couldn't find a previous {kind} declaration for '{name}' and that is required")]
    DeclarationNotFound {
        /// Declaration kind that was looked up.
        kind: DeclarationKind,
        /// Fully qualified name that was looked up.
        name: String,
    },

    /// Sink or source failure, propagated unchanged.
    #[error("io: {0}")]
    Io(#[from] io::Error),

    /// Container-level failure other than I/O.
    #[error("container: {0}")]
    Container(RaffError),

    /// A value does not fit the width the pack format gives it.
    #[error("{field} is {value}, the pack format allows at most {max}")]
    Overflow {
        /// Field being written.
        field: Cow<'static, str>,
        /// Actual value.
        value: usize,
        /// Largest value the field can hold.
        max: usize,
    },

    /// Input is not a well-formed pack.
    #[error("malformed pack: {0}")]
    Decode(Cow<'static, str>),

    /// Pool/encoder contract broken by the caller.
    #[error("internal consistency fault: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl PackError {
    /// True for the programming-error class.
    pub const fn is_fatal(&self) -> bool { matches!(self, Self::Invariant(_)) }

    /// Builds a decode error.
    pub fn decode(msg: impl Into<Cow<'static, str>>) -> Self { Self::Decode(msg.into()) }

    /// Builds a width error for a constant pool of `kind`.
    pub(crate) fn pool_overflow(kind: ConstantKind, value: usize, max: usize) -> Self {
        Self::Overflow { field: Cow::Owned(format!("{kind} count")), value, max }
    }
}

impl From<RaffError> for PackError {
    fn from(err: RaffError) -> Self {
        match err {
            RaffError::Io(io) => Self::Io(io),
            other => Self::Container(other),
        }
    }
}

/// Result alias for the pack layer.
pub type PackResult<T> = core::result::Result<T, PackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_from_container_stays_io() {
        let err = PackError::from(RaffError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")));
        match err {
            PackError::Io(io) => assert_eq!(io.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected io, got {other:?}"),
        }
    }

    #[test]
    fn only_invariants_are_fatal() {
        let missing = PackError::DeclarationNotFound { kind: DeclarationKind::Function, name: "f".into() };
        assert!(!missing.is_fatal());
        let fault = PackError::from(InvariantViolation::UnresolvedConstant {
            constant: "int: 99".into(),
            function: "main".into(),
        });
        assert!(fault.is_fatal());
    }

    #[test]
    fn messages_name_the_missing_declaration() {
        let err = PackError::DeclarationNotFound { kind: DeclarationKind::ExternalFunction, name: "coreListMap".into() };
        assert_eq!(
            err.to_string(),
            "couldn't find a previous external function declaration for 'coreListMap' and that is required"
        );
    }
}
