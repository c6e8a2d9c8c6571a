//! Format versions and pack-id names.

use core::fmt;

use swamp_raff::FourOctets;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Semantic version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Version {
    /// Major.
    pub major: u8,
    /// Minor.
    pub minor: u8,
    /// Patch.
    pub patch: u8,
}

impl Version {
    /// Builds a version.
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self { Self { major, minor, patch } }

    /// Three octets, major first.
    pub const fn to_octets(self) -> [u8; 3] { [self.major, self.minor, self.patch] }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Pack layouts, told apart by the name of the pack-id chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PackFormat {
    /// Pool and functions encoded by this crate into one code chunk.
    Spk4,
    /// Type info, constant memory and ledger blobs produced elsewhere.
    Spk5,
}

impl PackFormat {
    /// Name of the pack-id chunk.
    pub const fn name(self) -> FourOctets {
        match self {
            Self::Spk4 => *b"spk4",
            Self::Spk5 => *b"spk5",
        }
    }

    /// Layout version.
    pub const fn version(self) -> Version {
        match self {
            Self::Spk4 => Version::new(4, 0, 0),
            Self::Spk5 => Version::new(5, 0, 0),
        }
    }

    /// Identifies a layout from its pack-id chunk name.
    pub fn from_name(name: FourOctets) -> Option<Self> {
        [Self::Spk4, Self::Spk5].into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for PackFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (v{})", swamp_raff::describe(&self.name()), self.version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        assert_eq!(PackFormat::from_name(*b"spk4"), Some(PackFormat::Spk4));
        assert_eq!(PackFormat::from_name(*b"spk5"), Some(PackFormat::Spk5));
        assert_eq!(PackFormat::from_name(*b"spk3"), None);
    }

    #[test]
    fn display() {
        assert_eq!(Version::new(1, 2, 3).to_string(), "1.2.3");
        assert_eq!(Version::new(1, 2, 3).to_octets(), [1, 2, 3]);
        assert_eq!(PackFormat::Spk4.to_string(), "spk4 (v4.0.0)");
    }
}
