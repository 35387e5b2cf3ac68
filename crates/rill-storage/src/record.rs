//! Record handles for heap-file access.

use rill_common::types::RecordId;

/// A record to be stored in, or read from, a heap-flavored catalog file.
///
/// A `Record` borrows its payload bytes; appending copies them into the
/// file. The substrate assigns the record ID on append (and on
/// update-current), so a record handed to a write operation comes back with
/// its location filled in.
#[derive(Debug)]
pub struct Record<'a> {
    data: &'a [u8],
    rid: RecordId,
}

impl<'a> Record<'a> {
    /// Creates a record over a payload buffer, with an invalid record ID.
    #[inline]
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            rid: RecordId::INVALID,
        }
    }

    /// Returns the payload bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the record's location, or `RecordId::INVALID` before the
    /// record has been stored.
    #[inline]
    #[must_use]
    pub fn record_id(&self) -> RecordId {
        self.rid
    }

    /// Sets the record's location. Substrates call this on append.
    #[inline]
    pub fn set_record_id(&mut self, rid: RecordId) {
        self.rid = rid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_common::types::PageNumber;

    #[test]
    fn test_record_basics() {
        let buf = [1u8, 2, 3, 4];
        let mut rec = Record::new(&buf);
        assert_eq!(rec.len(), 4);
        assert!(!rec.is_empty());
        assert!(!rec.record_id().is_valid());

        rec.set_record_id(RecordId::new(PageNumber::new(2), 1));
        assert!(rec.record_id().is_valid());
    }
}
