//! Core types for RillDB.

mod datum;
mod ids;

pub use datum::{Datum, DatumRef, NullableDatumRef};
pub use ids::{
    FieldId, FieldOffset, FileId, Oid, PageNumber, RecordId, SlotId, INVALID_FIELD_ID,
    INVALID_SLOT_ID, MAX_NUM_REGULAR_FIELDS, MAX_SLOT_ID,
};
