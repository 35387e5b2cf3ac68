//! System-wide constants for RillDB.
//!
//! This module defines constants used across the database engine.

// =============================================================================
// Page and Alignment Constants
// =============================================================================

/// Size of a raw page in bytes (4 KB).
///
/// The database meta file consists of a single page of this size.
pub const PAGE_SIZE: usize = 4 * 1024;

/// Assumed cache line size in bytes.
pub const CACHE_LINE_SIZE: usize = 64;

/// The maximum alignment any field type may require.
///
/// Record payloads are always padded to a multiple of this at the end, and
/// every write buffer starts on a boundary of this alignment.
pub const MAX_ALIGN: usize = 8;

// =============================================================================
// Database Meta File
// =============================================================================

/// Magic number at the head of the database meta page. "RILL" in ASCII.
pub const DB_META_MAGIC: u32 = 0x5249_4C4C;

/// Format version of the database meta page.
pub const DB_META_VERSION: u32 = 1;

/// File ID of the database meta file. This is always the first file created
/// in a catalog substrate.
pub const DB_META_FILE_ID: u32 = 1;

// =============================================================================
// Init Data File
// =============================================================================

/// Upper bound on the decoded length of a single quoted token in the init
/// data file. Longer tokens fail parsing.
pub const INIT_TOKEN_LIMIT: usize = 4096;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_constants() {
        assert!(PAGE_SIZE.is_power_of_two());
        assert!(MAX_ALIGN.is_power_of_two());
        assert!(CACHE_LINE_SIZE.is_power_of_two());
    }

    #[test]
    fn test_meta_magic() {
        assert_eq!(&DB_META_MAGIC.to_be_bytes(), b"RILL");
    }
}
