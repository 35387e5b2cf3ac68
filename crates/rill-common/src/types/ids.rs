//! Core identifier types for RillDB.
//!
//! These types provide type-safe wrappers around numeric identifiers,
//! preventing accidental misuse of different ID types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Object identifier - the 32-bit key into the catalog.
///
/// `0` is invalid, and values `1..=19_999` are reserved for system objects
/// shipped in the init data.
///
/// # Example
///
/// ```rust
/// use rill_common::types::Oid;
///
/// let oid = Oid::new(42);
/// assert!(oid.is_valid());
/// assert!(oid.is_system());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Oid(u32);

impl Oid {
    /// Invalid OID constant, used as a sentinel value.
    pub const INVALID: Self = Self(0);

    /// All OIDs in the init data are less than or equal to this.
    pub const MAX_SYS: Self = Self(19_999);

    /// Maximum allocatable OID.
    pub const MAX: Self = Self(u32::MAX - 1);

    /// Creates a new `Oid` from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(oid: u32) -> Self {
        Self(oid)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Checks if this is a valid OID.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }

    /// Checks if this OID is in the reserved system range.
    #[inline]
    #[must_use]
    pub const fn is_system(self) -> bool {
        self.is_valid() && self.0 <= Self::MAX_SYS.0
    }

    /// Returns the next OID.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Oid(INVALID)")
        } else {
            write!(f, "Oid({})", self.0)
        }
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Oid {
    #[inline]
    fn from(oid: u32) -> Self {
        Self::new(oid)
    }
}

impl From<Oid> for u32 {
    #[inline]
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

/// Field identifier within a schema, in declaration order.
///
/// Signed so that internal layout bookkeeping can store provisional section
/// indexes as negative values.
pub type FieldId = i16;

/// Invalid field ID sentinel.
pub const INVALID_FIELD_ID: FieldId = 0x7fff;

/// Maximum number of regular fields in a schema.
pub const MAX_NUM_REGULAR_FIELDS: FieldId = 0x7fff;

/// Byte offset within a record payload.
///
/// Offsets are confined to the signed 31-bit space; all layout arithmetic
/// checks for overflow of this type.
pub type FieldOffset = i32;

/// Slot number within a heap file. `0` is invalid.
pub type SlotId = u16;

/// Invalid slot ID sentinel.
pub const INVALID_SLOT_ID: SlotId = 0;

/// Maximum valid slot ID.
pub const MAX_SLOT_ID: SlotId = 0xfffe;

/// Page number within a file.
///
/// `0` is invalid and `!0` is reserved.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PageNumber(u32);

impl PageNumber {
    /// Invalid page number, used as a sentinel value.
    pub const INVALID: Self = Self(0);

    /// Reserved page number.
    pub const RESERVED: Self = Self(u32::MAX);

    /// Creates a new `PageNumber` from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(pid: u32) -> Self {
        Self(pid)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Checks if this is a valid page number.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0 && self.0 != Self::RESERVED.0
    }
}

impl fmt::Debug for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "PageNumber(INVALID)")
        } else if *self == Self::RESERVED {
            write!(f, "PageNumber(RESERVED)")
        } else {
            write!(f, "PageNumber({})", self.0)
        }
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File identifier within the storage layer.
///
/// `0` is invalid. The two highest bit-ranges are reserved for write-ahead
/// log and temporary file spaces, which this snapshot declares but does not
/// populate.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FileId(u32);

impl FileId {
    /// Invalid file ID, used as a sentinel value.
    pub const INVALID: Self = Self(0);

    /// First file ID of the reserved write-ahead-log space.
    pub const WAL_SPACE_START: Self = Self(0xc000_0000);

    /// First file ID of the reserved temporary-file space.
    pub const TEMP_SPACE_START: Self = Self(0x8000_0000);

    /// Creates a new `FileId` from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(fid: u32) -> Self {
        Self(fid)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Checks if this is a valid regular file ID.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0 && self.0 < Self::TEMP_SPACE_START.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "FileId(INVALID)")
        } else {
            write!(f, "FileId({})", self.0)
        }
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FileId {
    #[inline]
    fn from(fid: u32) -> Self {
        Self::new(fid)
    }
}

impl From<FileId> for u32 {
    #[inline]
    fn from(fid: FileId) -> Self {
        fid.0
    }
}

/// Record identifier: a (page number, slot number) pair.
///
/// In heap-file catalog substrates the page number is the file ID and the
/// slot number is the record's sequential index within the file.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId {
    /// The page number.
    pub pid: PageNumber,
    /// The slot number within the page.
    pub sid: SlotId,
}

impl RecordId {
    /// Invalid record ID, used as a sentinel value.
    pub const INVALID: Self = Self {
        pid: PageNumber::INVALID,
        sid: INVALID_SLOT_ID,
    };

    /// Creates a new `RecordId`.
    #[inline]
    #[must_use]
    pub const fn new(pid: PageNumber, sid: SlotId) -> Self {
        Self { pid, sid }
    }

    /// Checks if both components are valid.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.pid.is_valid() && self.sid != INVALID_SLOT_ID
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({}, {})", self.pid, self.sid)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.pid, self.sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid() {
        let oid = Oid::new(42);
        assert_eq!(oid.as_u32(), 42);
        assert!(oid.is_valid());
        assert!(oid.is_system());
        assert!(!Oid::INVALID.is_valid());
        assert!(!Oid::new(20_000).is_system());
        assert_eq!(oid.next().as_u32(), 43);
    }

    #[test]
    fn test_page_number() {
        assert!(PageNumber::new(1).is_valid());
        assert!(!PageNumber::INVALID.is_valid());
        assert!(!PageNumber::RESERVED.is_valid());
    }

    #[test]
    fn test_file_id() {
        assert!(FileId::new(2).is_valid());
        assert!(!FileId::INVALID.is_valid());
        assert!(!FileId::WAL_SPACE_START.is_valid());
        assert!(!FileId::TEMP_SPACE_START.is_valid());
    }

    #[test]
    fn test_record_id() {
        let rid = RecordId::new(PageNumber::new(3), 1);
        assert!(rid.is_valid());
        assert!(!RecordId::INVALID.is_valid());
        assert!(!RecordId::new(PageNumber::new(3), INVALID_SLOT_ID).is_valid());
    }

    #[test]
    fn test_record_id_ordering() {
        let a = RecordId::new(PageNumber::new(1), 5);
        let b = RecordId::new(PageNumber::new(2), 1);
        let c = RecordId::new(PageNumber::new(2), 2);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_ordering() {
        assert!(Oid::new(1) < Oid::new(2));
        assert!(PageNumber::new(1) < PageNumber::new(2));
        assert!(FileId::new(1) < FileId::new(2));
    }
}
