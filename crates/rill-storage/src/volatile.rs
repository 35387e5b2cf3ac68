//! The volatile, in-memory catalog file substrate.

use rill_common::align::max_align;
use rill_common::constants::{DB_META_FILE_ID, PAGE_SIZE};
use rill_common::types::{FileId, PageNumber, RecordId, MAX_SLOT_ID};

use crate::error::{StorageError, StorageResult};
use crate::record::Record;
use crate::store::{CatalogStore, FileHandle, FileIterator, PageGuard};

/// One in-memory heap file.
///
/// Records live in `bytes`, each starting at a maximum-aligned offset.
/// `offsets[i]` is the start of slot `i`'s bytes; its size is the delta to
/// the next offset (or to the end of `bytes` for the last slot), so an
/// invalidated slot's bytes stay in place.
#[derive(Debug, Default)]
struct InmemFile {
    valid: Vec<bool>,
    offsets: Vec<usize>,
    bytes: Vec<u8>,
}

impl InmemFile {
    fn slot_len(&self, idx: usize) -> usize {
        if idx + 1 == self.offsets.len() {
            self.bytes.len() - self.offsets[idx]
        } else {
            self.offsets[idx + 1] - self.offsets[idx]
        }
    }
}

/// The in-memory catalog file substrate.
///
/// Nothing is persisted: a `VolatileStore` starts empty and everything in
/// it dies with the process. Heap files get file IDs 2, 3, ... in creation
/// order; the single raw file (the database meta page) is file 1.
#[derive(Debug, Default)]
pub struct VolatileStore {
    /// The in-memory heap files. File ID minus 2 indexes this vector.
    systables: Vec<InmemFile>,
    /// The single raw page, if created.
    dbmeta_page: Option<Box<[u8]>>,
    dbmeta_dirty: bool,
}

impl VolatileStore {
    /// Creates an empty substrate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn heap_file(&self, fid: FileId) -> StorageResult<&InmemFile> {
        let raw = fid.as_u32();
        if raw <= DB_META_FILE_ID || raw as usize > self.systables.len() + 1 {
            return Err(StorageError::InvalidFileId { fid });
        }
        Ok(&self.systables[raw as usize - 2])
    }

    fn heap_file_mut(&mut self, fid: FileId) -> StorageResult<&mut InmemFile> {
        let raw = fid.as_u32();
        if raw <= DB_META_FILE_ID || raw as usize > self.systables.len() + 1 {
            return Err(StorageError::InvalidFileId { fid });
        }
        Ok(&mut self.systables[raw as usize - 2])
    }

    fn append_to(file: &mut InmemFile, fid: FileId, rec: &mut Record<'_>) -> StorageResult<()> {
        if file.offsets.len() >= MAX_SLOT_ID as usize {
            return Err(StorageError::FileFull { fid });
        }

        let offset = file.bytes.len();
        debug_assert_eq!(max_align(offset), offset);
        let new_size = max_align(offset + rec.len());
        file.valid.push(true);
        file.offsets.push(offset);
        file.bytes.resize(new_size, 0);
        file.bytes[offset..offset + rec.len()].copy_from_slice(rec.data());

        let sid = file.offsets.len() as u16;
        rec.set_record_id(RecordId::new(PageNumber::new(fid.as_u32()), sid));
        Ok(())
    }
}

impl CatalogStore for VolatileStore {
    fn create_file(&mut self, format_heap: bool) -> StorageResult<FileId> {
        if format_heap {
            self.systables.push(InmemFile::default());
            // File ID minus 2 is the index into systables.
            let fid = FileId::new(self.systables.len() as u32 + 1);
            tracing::debug!(%fid, "created volatile heap file");
            return Ok(fid);
        }

        // The raw file is the DB meta file, which must have file ID 1.
        if self.dbmeta_page.is_some() {
            return Err(StorageError::TooManyRawFiles);
        }
        self.dbmeta_page = Some(vec![0u8; PAGE_SIZE].into_boxed_slice());
        Ok(FileId::new(DB_META_FILE_ID))
    }

    fn open_file(&mut self, fid: FileId) -> StorageResult<FileHandle> {
        let raw = fid.as_u32();
        let known_heap = raw >= 2 && raw as usize <= self.systables.len() + 1;
        let known_raw = raw == DB_META_FILE_ID && self.dbmeta_page.is_some();
        if !known_heap && !known_raw {
            return Err(StorageError::InvalidFileId { fid });
        }
        Ok(FileHandle::new(fid))
    }

    fn close_file(&mut self, fh: &mut FileHandle) {
        fh.invalidate();
    }

    fn append_record(&mut self, fh: &FileHandle, rec: &mut Record<'_>) -> StorageResult<()> {
        let fid = fh.fid();
        let file = self.heap_file_mut(fid)?;
        Self::append_to(file, fid, rec)
    }

    fn iterate(&mut self, fh: &FileHandle) -> StorageResult<FileIterator> {
        let fid = fh.fid();
        let file = self.heap_file(fid)?;
        Ok(FileIterator {
            fid,
            next_idx: 0,
            end_idx: file.offsets.len() as u32,
        })
    }

    fn iterate_from(&mut self, fh: &FileHandle, rid: RecordId) -> StorageResult<FileIterator> {
        let fid = fh.fid();
        let file = self.heap_file(fid)?;
        debug_assert_eq!(rid.pid.as_u32(), fid.as_u32());
        if !rid.is_valid() {
            return Err(StorageError::InvalidHandle);
        }
        Ok(FileIterator {
            fid,
            next_idx: u32::from(rid.sid) - 1,
            end_idx: file.offsets.len() as u32,
        })
    }

    fn next_record(&mut self, iter: &mut FileIterator) -> StorageResult<bool> {
        let file = self.heap_file(iter.fid)?;
        debug_assert!(iter.end_idx as usize <= file.offsets.len());

        let mut next_idx = iter.next_idx;
        while next_idx < iter.end_idx {
            if file.valid[next_idx as usize] {
                iter.next_idx = next_idx + 1;
                return Ok(true);
            }
            next_idx += 1;
        }
        iter.next_idx = iter.end_idx + 1;
        Ok(false)
    }

    fn current_record(&self, iter: &FileIterator) -> StorageResult<&[u8]> {
        let file = self.heap_file(iter.fid)?;
        let idx = (iter.current_sid() - 1) as usize;
        debug_assert!(file.valid[idx]);
        let begin = file.offsets[idx];
        Ok(&file.bytes[begin..begin + file.slot_len(idx)])
    }

    fn current_record_id(&self, iter: &FileIterator) -> RecordId {
        RecordId::new(PageNumber::new(iter.fid.as_u32()), iter.current_sid())
    }

    fn update_current(
        &mut self,
        iter: &mut FileIterator,
        rec: &mut Record<'_>,
    ) -> StorageResult<()> {
        let fid = iter.fid;
        let idx = (iter.current_sid() - 1) as usize;
        let file = self.heap_file_mut(fid)?;
        debug_assert!(file.valid[idx]);

        if rec.len() <= file.slot_len(idx) {
            // In-place update.
            let begin = file.offsets[idx];
            file.bytes[begin..begin + rec.len()].copy_from_slice(rec.data());
            rec.set_record_id(RecordId::new(
                PageNumber::new(fid.as_u32()),
                iter.current_sid(),
            ));
        } else {
            // Invalidate the current record and append the updated one.
            // The iterator's end does not extend, so a resumed iteration
            // over `iter` will not see the replacement.
            file.valid[idx] = false;
            Self::append_to(file, fid, rec)?;
        }
        Ok(())
    }

    fn end_iterate(&mut self, iter: &mut FileIterator) {
        iter.fid = FileId::INVALID;
    }

    fn first_page(&mut self, fh: &FileHandle) -> StorageResult<PageGuard<'_>> {
        if fh.fid().as_u32() != DB_META_FILE_ID {
            return Err(StorageError::WrongFileFlavor { fid: fh.fid() });
        }
        match self.dbmeta_page.as_deref_mut() {
            Some(page) => Ok(PageGuard::new(page, &mut self.dbmeta_dirty)),
            None => Err(StorageError::InvalidFileId { fid: fh.fid() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap_store() -> (VolatileStore, FileHandle) {
        let mut store = VolatileStore::new();
        let fid = store.create_file(true).unwrap();
        let fh = store.open_file(fid).unwrap();
        (store, fh)
    }

    #[test]
    fn test_create_file_ids() {
        let mut store = VolatileStore::new();
        assert_eq!(store.create_file(false).unwrap().as_u32(), 1);
        assert_eq!(store.create_file(true).unwrap().as_u32(), 2);
        assert_eq!(store.create_file(true).unwrap().as_u32(), 3);
        assert!(matches!(
            store.create_file(false),
            Err(StorageError::TooManyRawFiles)
        ));
    }

    #[test]
    fn test_open_rejects_unknown() {
        let mut store = VolatileStore::new();
        assert!(store.open_file(FileId::new(2)).is_err());
        store.create_file(true).unwrap();
        assert!(store.open_file(FileId::new(2)).is_ok());
        assert!(store.open_file(FileId::new(3)).is_err());
        // Meta file is only open-able once created.
        assert!(store.open_file(FileId::new(1)).is_err());
        store.create_file(false).unwrap();
        assert!(store.open_file(FileId::new(1)).is_ok());
    }

    #[test]
    fn test_append_and_iterate() {
        let (mut store, fh) = heap_store();

        for i in 0..5u8 {
            let buf = vec![i; (i as usize + 1) * 3];
            let mut rec = Record::new(&buf);
            store.append_record(&fh, &mut rec).unwrap();
            assert_eq!(rec.record_id().sid, u16::from(i) + 1);
            assert_eq!(rec.record_id().pid.as_u32(), fh.fid().as_u32());
        }

        let mut iter = store.iterate(&fh).unwrap();
        let mut seen = 0u8;
        while store.next_record(&mut iter).unwrap() {
            let bytes = store.current_record(&iter).unwrap();
            assert_eq!(bytes[0], seen);
            seen += 1;
        }
        assert_eq!(seen, 5);
    }

    #[test]
    fn test_appended_bytes_are_max_aligned() {
        let (mut store, fh) = heap_store();
        let mut rec = Record::new(&[1, 2, 3]);
        store.append_record(&fh, &mut rec).unwrap();
        let mut rec = Record::new(&[9; 8]);
        store.append_record(&fh, &mut rec).unwrap();

        let mut iter = store.iterate(&fh).unwrap();
        assert!(store.next_record(&mut iter).unwrap());
        // The first slot is padded out to the alignment boundary.
        assert_eq!(store.current_record(&iter).unwrap().len(), 8);
        assert!(store.next_record(&mut iter).unwrap());
        assert_eq!(store.current_record(&iter).unwrap(), &[9; 8]);
    }

    #[test]
    fn test_update_in_place_keeps_rid() {
        let (mut store, fh) = heap_store();
        let mut rec = Record::new(&[7u8; 64]);
        store.append_record(&fh, &mut rec).unwrap();
        let original_rid = rec.record_id();

        let mut iter = store.iterate(&fh).unwrap();
        assert!(store.next_record(&mut iter).unwrap());

        let replacement = [8u8; 64];
        let mut rec2 = Record::new(&replacement);
        store.update_current(&mut iter, &mut rec2).unwrap();
        assert_eq!(rec2.record_id(), original_rid);

        let mut iter = store.iterate(&fh).unwrap();
        assert!(store.next_record(&mut iter).unwrap());
        assert_eq!(store.current_record(&iter).unwrap(), &replacement);
        assert!(!store.next_record(&mut iter).unwrap());
    }

    #[test]
    fn test_update_grows_appends() {
        let (mut store, fh) = heap_store();
        let mut rec = Record::new(&[7u8; 64]);
        store.append_record(&fh, &mut rec).unwrap();
        let original_rid = rec.record_id();

        let mut iter = store.iterate(&fh).unwrap();
        assert!(store.next_record(&mut iter).unwrap());

        let replacement = [8u8; 72];
        let mut rec2 = Record::new(&replacement);
        store.update_current(&mut iter, &mut rec2).unwrap();
        assert_ne!(rec2.record_id(), original_rid);
        assert_eq!(rec2.record_id().sid, 2);

        // The consumed iterator does not see the appended replacement.
        assert!(!store.next_record(&mut iter).unwrap());

        // A fresh iteration skips the invalidated slot and returns the
        // replacement.
        let mut iter = store.iterate(&fh).unwrap();
        assert!(store.next_record(&mut iter).unwrap());
        assert_eq!(store.current_record(&iter).unwrap(), &replacement);
        assert_eq!(store.current_record_id(&iter).sid, 2);
        assert!(!store.next_record(&mut iter).unwrap());
    }

    #[test]
    fn test_iterate_from() {
        let (mut store, fh) = heap_store();
        let mut rids = Vec::new();
        for i in 0..4u8 {
            let buf = [i; 8];
            let mut rec = Record::new(&buf);
            store.append_record(&fh, &mut rec).unwrap();
            rids.push(rec.record_id());
        }

        let mut iter = store.iterate_from(&fh, rids[2]).unwrap();
        assert!(store.next_record(&mut iter).unwrap());
        assert_eq!(store.current_record(&iter).unwrap()[0], 2);
        assert!(store.next_record(&mut iter).unwrap());
        assert_eq!(store.current_record(&iter).unwrap()[0], 3);
        assert!(!store.next_record(&mut iter).unwrap());
    }

    #[test]
    fn test_end_iterate() {
        let (mut store, fh) = heap_store();
        let mut rec = Record::new(&[1u8; 8]);
        store.append_record(&fh, &mut rec).unwrap();
        let mut iter = store.iterate(&fh).unwrap();
        assert!(iter.is_active());
        store.end_iterate(&mut iter);
        assert!(!iter.is_active());
    }

    #[test]
    fn test_raw_page() {
        let mut store = VolatileStore::new();
        let fid = store.create_file(false).unwrap();
        let fh = store.open_file(fid).unwrap();

        {
            let mut page = store.first_page(&fh).unwrap();
            assert_eq!(page.data().len(), PAGE_SIZE);
            page.data_mut()[0..4].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
            page.mark_dirty();
        }

        let page = store.first_page(&fh).unwrap();
        assert_eq!(&page.data()[0..4], &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_raw_page_flavor_checked() {
        let (mut store, fh) = heap_store();
        assert!(matches!(
            store.first_page(&fh),
            Err(StorageError::WrongFileFlavor { .. })
        ));
    }

    #[test]
    fn test_close_invalidates_handle() {
        let (mut store, mut fh) = heap_store();
        assert!(fh.is_open());
        store.close_file(&mut fh);
        assert!(!fh.is_open());
    }
}
