//! Index type identifiers.

use std::fmt;

/// The access method of an index, as stored in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IdxType {
    /// Not a valid index type.
    Invalid = 0,
    /// In-memory tree, rebuilt on every start.
    VolatileTree = 1,
    /// Persistent B-tree.
    BTree = 2,
}

impl IdxType {
    /// Returns the raw catalog value.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a raw catalog value back into an index type.
    #[must_use]
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Invalid),
            1 => Some(Self::VolatileTree),
            2 => Some(Self::BTree),
            _ => None,
        }
    }

    /// Returns true for valid index types.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Returns true if indexes of this type live only in memory and must be
    /// rebuilt when the database is opened.
    #[must_use]
    pub const fn is_volatile(self) -> bool {
        matches!(self, Self::VolatileTree)
    }

    /// Returns true if this index type requires an equality operator on its
    /// key columns.
    #[must_use]
    pub const fn needs_equal_operator(self) -> bool {
        matches!(self, Self::VolatileTree | Self::BTree)
    }

    /// Returns true if this index type requires a less-than operator on its
    /// key columns.
    #[must_use]
    pub const fn needs_less_operator(self) -> bool {
        matches!(self, Self::VolatileTree | Self::BTree)
    }

    /// Returns the name of this index type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::VolatileTree => "volatile tree",
            Self::BTree => "b-tree",
        }
    }
}

impl fmt::Display for IdxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        assert_eq!(IdxType::from_u8(1), Some(IdxType::VolatileTree));
        assert_eq!(IdxType::from_u8(2), Some(IdxType::BTree));
        assert_eq!(IdxType::from_u8(9), None);
    }

    #[test]
    fn test_predicates() {
        assert!(IdxType::VolatileTree.is_volatile());
        assert!(!IdxType::BTree.is_volatile());
        assert!(IdxType::BTree.needs_less_operator());
        assert!(!IdxType::Invalid.is_valid());
    }
}
