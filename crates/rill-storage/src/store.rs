//! The abstract catalog file substrate.

use rill_common::types::{FileId, RecordId, SlotId};

use crate::error::StorageResult;
use crate::record::Record;

/// An opaque handle for an open catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHandle {
    fid: FileId,
}

impl FileHandle {
    #[inline]
    pub(crate) fn new(fid: FileId) -> Self {
        Self { fid }
    }

    /// Returns the file ID of the open file.
    #[inline]
    #[must_use]
    pub fn fid(&self) -> FileId {
        self.fid
    }

    /// Returns true if this handle has not been closed.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.fid != FileId::INVALID
    }

    #[inline]
    pub(crate) fn invalidate(&mut self) {
        self.fid = FileId::INVALID;
    }
}

/// An iterator handle over the records of a heap-flavored catalog file.
///
/// The handle is a plain value; all motion goes through the owning
/// [`CatalogStore`]. The end position is captured when the iterator is
/// created and does not extend, so records appended mid-iteration (for
/// instance by an update that did not fit in place) are only seen by a
/// later, resumed iteration.
#[derive(Debug, Clone)]
pub struct FileIterator {
    pub(crate) fid: FileId,
    /// Index of the next slot to look at (0-based).
    pub(crate) next_idx: u32,
    /// One past the last slot this iteration may return.
    pub(crate) end_idx: u32,
}

impl FileIterator {
    /// Returns true if this iterator has not been ended.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.fid != FileId::INVALID
    }

    /// The slot ID of the record a successful `next_record` stopped at.
    #[inline]
    pub(crate) fn current_sid(&self) -> SlotId {
        debug_assert!(self.next_idx > 0);
        self.next_idx as SlotId
    }
}

/// A pinned view of the single page of a raw-flavored catalog file.
///
/// Dropping the guard releases the page. Writers must call
/// [`PageGuard::mark_dirty`] so a persistent substrate knows to write the
/// page back; the volatile substrate ignores the bit.
#[derive(Debug)]
pub struct PageGuard<'a> {
    data: &'a mut [u8],
    dirty: &'a mut bool,
}

impl<'a> PageGuard<'a> {
    pub(crate) fn new(data: &'a mut [u8], dirty: &'a mut bool) -> Self {
        Self { data, dirty }
    }

    /// Returns the page contents.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data
    }

    /// Returns the page contents for writing. Call
    /// [`PageGuard::mark_dirty`] after modifying them.
    #[inline]
    #[must_use]
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.data
    }

    /// Marks the page as modified.
    #[inline]
    pub fn mark_dirty(&mut self) {
        *self.dirty = true;
    }
}

/// The catalog file substrate contract.
///
/// A substrate hands out distinct, monotonically allocated file IDs; the
/// first heap file created is file 2, and file 1 is the single raw file
/// holding the database meta page. Heap files store records in slots with
/// sequential 16-bit slot IDs starting at 1; appended payloads are padded
/// to the maximum alignment in storage.
pub trait CatalogStore {
    /// Creates a new catalog file and returns its file ID.
    ///
    /// With `format_heap` set the file is accessed through the record and
    /// iterator interface; otherwise it is a raw file of exactly one page.
    fn create_file(&mut self, format_heap: bool) -> StorageResult<FileId>;

    /// Opens a catalog file for access.
    fn open_file(&mut self, fid: FileId) -> StorageResult<FileHandle>;

    /// Closes a catalog file handle.
    fn close_file(&mut self, fh: &mut FileHandle);

    /// Appends a record to a heap file, assigning `rec`'s record ID.
    fn append_record(&mut self, fh: &FileHandle, rec: &mut Record<'_>) -> StorageResult<()>;

    /// Creates an iterator over all records of a heap file.
    fn iterate(&mut self, fh: &FileHandle) -> StorageResult<FileIterator>;

    /// Creates an iterator starting at `rid`. The iterator may or may not
    /// return additional records after the first one.
    fn iterate_from(&mut self, fh: &FileHandle, rid: RecordId) -> StorageResult<FileIterator>;

    /// Moves the iterator to the next valid record. Returns whether one
    /// exists; slots marked invalid are skipped.
    fn next_record(&mut self, iter: &mut FileIterator) -> StorageResult<bool>;

    /// Returns the record the last successful [`CatalogStore::next_record`]
    /// stopped at. Undefined before the first `next_record` call or after
    /// one returned false.
    fn current_record(&self, iter: &FileIterator) -> StorageResult<&[u8]>;

    /// Returns the record ID of the current record.
    fn current_record_id(&self, iter: &FileIterator) -> RecordId;

    /// Replaces the current record with `rec`.
    ///
    /// The update happens in place when the new payload fits in the
    /// original slot; otherwise the slot is marked invalid and the payload
    /// is appended as a new record. Either way `rec`'s record ID is set to
    /// the record's new location. The iterator's position is consumed: call
    /// [`CatalogStore::next_record`] to resume, which is free to return the
    /// appended replacement.
    fn update_current(&mut self, iter: &mut FileIterator, rec: &mut Record<'_>)
        -> StorageResult<()>;

    /// Releases any resource associated with the iterator.
    fn end_iterate(&mut self, iter: &mut FileIterator);

    /// Returns the first (and only) page of a raw file, pinned.
    fn first_page(&mut self, fh: &FileHandle) -> StorageResult<PageGuard<'_>>;
}
