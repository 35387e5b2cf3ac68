//! The tuple layout engine.
//!
//! A [`Schema`] stores the information for accessing an ordered set of typed
//! fields in a record payload. A field value is always treated as an array
//! of fixed-length or variable-length bytes with an alignment requirement;
//! interpreting those bytes is the caller's job, guided by the field's type
//! OID. Once the layout is computed, a schema answers nullness, offset and
//! length queries against a payload and can write a datum vector out as
//! payload bytes.
//!
//! The storage layout of a record is:
//!
//! ```text
//! | non-nullable fixed-length fields |
//! | null bitmap                      |
//! | varlen end-offset array (+pad)   |
//! | varlen fields                    |
//! | nullable fixed-length fields     |
//! ```
//!
//! with the whole payload padded to an 8-byte boundary at the end. All
//! integers in the payload are little-endian, and the end offsets stored in
//! the varlen end-offset array are absolute positions from the start of the
//! payload.

use std::sync::Arc;

use rill_common::align::{align_up_checked, max_align, max_align_checked};
use rill_common::types::{
    Datum, FieldId, FieldOffset, NullableDatumRef, Oid, INVALID_FIELD_ID, MAX_NUM_REGULAR_FIELDS,
};
use rill_common::{RillError, RillResult};

use crate::fmgr::{function_call, FunctionPtr};
use crate::systables::TypeEntry;

/// The capability the layout computation needs from a catalog: type rows by
/// OID and callables by function OID.
///
/// Implemented by both the bootstrap catalog and the regular catalog cache,
/// which is what lets the schema engine run before the regular catalog
/// exists.
pub trait SchemaCatalog {
    /// Returns the type row for `typid`.
    fn find_type(&self, typid: Oid) -> RillResult<Arc<TypeEntry>>;

    /// Returns the callable registered under `funcid`.
    fn function(&self, funcid: Oid) -> RillResult<FunctionPtr>;
}

#[derive(Debug, Clone)]
struct FieldInfo {
    typid: Oid,
    typparam: u64,
    /// Cached typlen; -1 for variable-length fields. Only meaningful once
    /// the layout is computed.
    typlen: i16,
    /// Cached type alignment. Only meaningful once the layout is computed.
    typalign: u8,
    /// Whether the field is passed by reference. Only meaningful once the
    /// layout is computed.
    typbyref: bool,
    /// The field's null bit index in the payload layout; negative for
    /// non-nullable fields. Before the layout is computed, any
    /// non-negative value just means "nullable".
    nullbit_id: FieldId,
    /// Where to find the field in the payload:
    ///
    /// - `>= 0`: the byte offset of a non-nullable fixed-length field;
    /// - `< 0`: this is the `(-offset - 1)`-th variable-length field, or
    ///   the `(-offset - 1)`-th nullable fixed-length field, counting each
    ///   section separately in declaration order.
    offset: FieldOffset,
}

/// A schema: an ordered list of typed, optionally named fields, plus the
/// computed record layout.
#[derive(Debug, Clone)]
pub struct Schema {
    layout_computed: bool,
    has_only_nonnullable_fixedlen: bool,
    num_nonnullable_fixedlen: FieldId,
    num_nullable_fixedlen: FieldId,
    num_varlen: FieldId,
    /// Offset of the null bitmap. Equals the record length on the
    /// all-non-nullable-fixed-length fast path.
    null_bitmap_begin: FieldOffset,
    /// Offset of the varlen end-offset array, 4-byte aligned.
    varlen_end_array_begin: FieldOffset,
    /// Offset just past the end-offset array. Not necessarily aligned for
    /// the first varlen field.
    varlen_payload_begin: FieldOffset,
    /// Storage order: `field_reorder_idx[storage_pos]` is the declaration
    /// position of the field stored at `storage_pos`.
    field_reorder_idx: Vec<FieldId>,
    fields: Vec<FieldInfo>,
    /// Either empty or one name per field.
    field_names: Vec<String>,
}

impl Schema {
    /// Creates a schema without field names.
    ///
    /// The three vectors must be non-empty, of equal length, and no longer
    /// than the regular field limit. The layout is not computed yet; call
    /// [`Schema::compute_layout`] before using the record accessors.
    pub fn create(typid: &[Oid], typparam: &[u64], nullable: &[bool]) -> RillResult<Self> {
        Self::create_with_names(typid, typparam, nullable, Vec::new())
    }

    /// Creates a schema with field names. `field_names` must be empty or
    /// of the same length as the other vectors.
    pub fn create_with_names(
        typid: &[Oid],
        typparam: &[u64],
        nullable: &[bool],
        field_names: Vec<String>,
    ) -> RillResult<Self> {
        if typid.is_empty() {
            return Err(RillError::invalid_argument("schema has no fields"));
        }
        if typid.len() > MAX_NUM_REGULAR_FIELDS as usize {
            return Err(RillError::invalid_argument(format!(
                "schema has too many fields: {}",
                typid.len()
            )));
        }
        if typid.len() != typparam.len() || typid.len() != nullable.len() {
            return Err(RillError::invalid_argument(
                "schema field vectors have different lengths",
            ));
        }
        if !field_names.is_empty() && field_names.len() != typid.len() {
            return Err(RillError::invalid_argument(
                "schema field name vector has the wrong length",
            ));
        }

        let fields = typid
            .iter()
            .zip(typparam.iter())
            .zip(nullable.iter())
            .map(|((&typid, &typparam), &nullable)| FieldInfo {
                typid,
                typparam,
                typlen: 0,
                typalign: 1,
                typbyref: false,
                nullbit_id: if nullable { 0 } else { -1 },
                offset: 0,
            })
            .collect();

        Ok(Self {
            layout_computed: false,
            has_only_nonnullable_fixedlen: false,
            num_nonnullable_fixedlen: 0,
            num_nullable_fixedlen: 0,
            num_varlen: 0,
            null_bitmap_begin: 0,
            varlen_end_array_begin: 0,
            varlen_payload_begin: 0,
            field_reorder_idx: Vec::new(),
            fields,
            field_names,
        })
    }

    /// Returns whether [`Schema::compute_layout`] has succeeded.
    #[inline]
    #[must_use]
    pub fn is_layout_computed(&self) -> bool {
        self.layout_computed
    }

    /// Returns the number of fields.
    #[inline]
    #[must_use]
    pub fn num_fields(&self) -> FieldId {
        self.fields.len() as FieldId
    }

    /// Returns the type OID of a field.
    #[inline]
    #[must_use]
    pub fn field_type_id(&self, field_id: FieldId) -> Oid {
        self.fields[field_id as usize].typid
    }

    /// Returns the type parameter of a field.
    #[inline]
    #[must_use]
    pub fn field_type_param(&self, field_id: FieldId) -> u64 {
        self.fields[field_id as usize].typparam
    }

    /// Returns the name of a field, or an empty string if the schema is
    /// unnamed.
    #[must_use]
    pub fn field_name(&self, field_id: FieldId) -> &str {
        self.field_names
            .get(field_id as usize)
            .map_or("", String::as_str)
    }

    /// Returns the field ID carrying `field_name`, or the invalid field ID.
    #[must_use]
    pub fn field_id_from_name(&self, field_name: &str) -> FieldId {
        for (i, name) in self.field_names.iter().enumerate() {
            if name == field_name {
                return i as FieldId;
            }
        }
        INVALID_FIELD_ID
    }

    /// Returns whether a field is nullable.
    #[inline]
    #[must_use]
    pub fn field_is_nullable(&self, field_id: FieldId) -> bool {
        self.fields[field_id as usize].nullbit_id >= 0
    }

    /// Returns whether a field is passed by reference. Only meaningful
    /// once the layout is computed.
    #[inline]
    #[must_use]
    pub fn field_pass_by_ref(&self, field_id: FieldId) -> bool {
        self.fields[field_id as usize].typbyref
    }

    fn ensure_layout_computed(&self) {
        assert!(
            self.layout_computed,
            "Schema::compute_layout() must be called before querying the record layout"
        );
    }

    /// Computes the record layout of this schema, resolving type metadata
    /// through `cat`.
    ///
    /// Fails with a record-too-large error if any offset would leave the
    /// signed 31-bit space, in which case the schema remains
    /// layout-uncomputed and may be retried.
    pub fn compute_layout(&mut self, cat: &dyn SchemaCatalog) -> RillResult<()> {
        let num_fields = self.num_fields();
        let mut off: FieldOffset = 0;
        let mut num_nonnullable_fixedlen: FieldId = 0;
        let mut num_nullable_fixedlen: FieldId = 0;
        let mut num_varlen: FieldId = 0;
        let mut num_nullable: FieldId = 0;
        let mut num_nullable_varlen: FieldId = 0;

        self.layout_computed = false;
        self.field_reorder_idx = vec![0; num_fields as usize];

        // Pass 1: place the non-nullable fixed-length fields at fixed
        // aligned offsets, and assign each varlen or nullable fixed-length
        // field its provisional (negative) section index. Type metadata is
        // cached into the field info on the way.
        for i in 0..num_fields as usize {
            let typ = cat.find_type(self.fields[i].typid)?;
            self.fields[i].typlen = typ.typlen;
            self.fields[i].typalign = typ.typalign;

            if typ.typisvarlen {
                // The typlen of a varlen type must be -1 in the catalog;
                // enforce it locally so the sections stay distinguishable
                // even against a messed-up catalog row.
                self.fields[i].typlen = -1;
                debug_assert!(typ.typbyref);
                self.fields[i].typbyref = true;

                num_varlen += 1;
                self.fields[i].offset = -FieldOffset::from(num_varlen);
                if self.fields[i].nullbit_id >= 0 {
                    num_nullable_varlen += 1;
                }
            } else {
                self.fields[i].typbyref = typ.typbyref;

                if typ.typlenfunc.is_valid() {
                    // Fixed-length type with a parameterized length.
                    let f = cat.function(typ.typlenfunc)?;
                    let arg = Datum::from_u64(self.fields[i].typparam);
                    let res = function_call(f, &[NullableDatumRef::from(&arg)])?;
                    if res.is_null() {
                        return Err(RillError::corruption(format!(
                            "type length function of type {} returned NULL",
                            typ.typid
                        )));
                    }
                    self.fields[i].typlen = res.get_i16();
                    if self.fields[i].typlen <= 0 {
                        return Err(RillError::corruption(format!(
                            "type length function of type {} returned {}",
                            typ.typid, self.fields[i].typlen
                        )));
                    }
                } else if !typ.typbyref {
                    // Pass-by-value types must currently have a length of
                    // 1, 2, 4 or 8.
                    if !matches!(self.fields[i].typlen, 1 | 2 | 4 | 8) {
                        return Err(RillError::corruption(format!(
                            "pass-by-value type {} has length {}",
                            typ.typid, self.fields[i].typlen
                        )));
                    }
                }

                if self.fields[i].nullbit_id >= 0 {
                    num_nullable_fixedlen += 1;
                    self.fields[i].offset = -FieldOffset::from(num_nullable_fixedlen);
                } else {
                    // The only case with a fixed absolute offset.
                    off = align_up_checked(self.fields[i].typalign, off)
                        .ok_or(RillError::RecordTooLarge)?;
                    self.fields[i].offset = off;
                    off = off
                        .checked_add(FieldOffset::from(self.fields[i].typlen))
                        .ok_or(RillError::RecordTooLarge)?;

                    self.field_reorder_idx[num_nonnullable_fixedlen as usize] = i as FieldId;
                    num_nonnullable_fixedlen += 1;
                }
            }
        }

        self.num_nonnullable_fixedlen = num_nonnullable_fixedlen;
        self.num_nullable_fixedlen = num_nullable_fixedlen;
        self.num_varlen = num_varlen;

        if num_nonnullable_fixedlen == num_fields {
            // Fast path for a schema with only non-nullable fixed-length
            // fields: the record length is the aligned end of the fixed
            // section and the remaining sections are empty.
            off = max_align_checked(off).ok_or(RillError::RecordTooLarge)?;
            self.null_bitmap_begin = off;
            self.varlen_end_array_begin = off;
            self.varlen_payload_begin = off;
            self.has_only_nonnullable_fixedlen = true;
            self.layout_computed = true;
            return Ok(());
        }
        self.has_only_nonnullable_fixedlen = false;

        // Pass 2: assign the storage order of the varlen and nullable
        // fixed-length sections and the null bit indexes. The null bits
        // follow the storage order, not the declaration order: all
        // nullable varlen fields come first, then the nullable
        // fixed-length fields.
        for i in 0..num_fields as usize {
            if self.fields[i].typlen == -1 {
                let seqno = num_nonnullable_fixedlen + (-self.fields[i].offset - 1) as FieldId;
                self.field_reorder_idx[seqno as usize] = i as FieldId;

                if self.fields[i].nullbit_id >= 0 {
                    self.fields[i].nullbit_id = (-self.fields[i].offset - 1) as FieldId;
                    num_nullable += 1;
                }
            } else if self.fields[i].nullbit_id >= 0 {
                let seqno = num_nonnullable_fixedlen
                    + num_varlen
                    + (-self.fields[i].offset - 1) as FieldId;
                self.field_reorder_idx[seqno as usize] = i as FieldId;
                self.fields[i].nullbit_id =
                    (-self.fields[i].offset - 1) as FieldId + num_nullable_varlen;
                num_nullable += 1;
            }
        }

        // The null bitmap needs one bit per nullable field.
        self.null_bitmap_begin = off;
        off = off
            .checked_add(FieldOffset::from((num_nullable + 7) >> 3))
            .ok_or(RillError::RecordTooLarge)?;

        // The varlen end-offset array is 4-byte aligned, one entry per
        // varlen field.
        off = align_up_checked(4, off).ok_or(RillError::RecordTooLarge)?;
        self.varlen_end_array_begin = off;
        off = off
            .checked_add(4 * FieldOffset::from(num_varlen))
            .ok_or(RillError::RecordTooLarge)?;
        self.varlen_payload_begin = off;

        self.layout_computed = true;
        Ok(())
    }

    fn read_end_offset(&self, payload: &[u8], varlen_idx: usize) -> FieldOffset {
        let at = self.varlen_end_array_begin as usize + 4 * varlen_idx;
        FieldOffset::from_le_bytes(payload[at..at + 4].try_into().unwrap())
    }

    fn null_bit_set(&self, payload: &[u8], nullbit_id: FieldId) -> bool {
        let byte = payload[self.null_bitmap_begin as usize + (nullbit_id >> 3) as usize];
        byte & (1 << (nullbit_id & 7)) != 0
    }

    /// Returns whether a field is null in a record payload.
    #[must_use]
    pub fn field_is_null(&self, field_id: FieldId, payload: &[u8]) -> bool {
        self.ensure_layout_computed();
        let nullbit_id = self.fields[field_id as usize].nullbit_id;
        if nullbit_id < 0 {
            return false;
        }
        self.null_bit_set(payload, nullbit_id)
    }

    /// Returns the offset and length of a field in a record payload.
    ///
    /// For a variable-length field a length of zero is returned when the
    /// field is null; consult [`Schema::field_is_null`] first when the
    /// distinction matters.
    #[must_use]
    pub fn offset_and_length(&self, field_id: FieldId, payload: &[u8]) -> (FieldOffset, FieldOffset) {
        self.ensure_layout_computed();
        let fi = &self.fields[field_id as usize];

        if fi.offset >= 0 {
            // Non-nullable fixed-length field.
            return (fi.offset, FieldOffset::from(fi.typlen));
        }

        if fi.typlen == -1 {
            // Variable-length field: the end offset comes from the end
            // array, the begin offset is the previous end (or the start of
            // the varlen section) aligned for this field.
            let varlen_idx = (-fi.offset - 1) as usize;
            let end = self.read_end_offset(payload, varlen_idx);
            let begin = if varlen_idx > 0 {
                self.read_end_offset(payload, varlen_idx - 1)
            } else {
                self.varlen_payload_begin
            };
            let begin = align_up_checked(fi.typalign, begin)
                .expect("field offset overflow in a constructed record");
            return (begin, if end >= begin { end - begin } else { 0 });
        }

        // Nullable fixed-length field. These are stored after the varlen
        // section without an offset array, so walk the section in storage
        // order, skipping null fields, until the target is reached.
        let mut seqno = (self.num_nonnullable_fixedlen + self.num_varlen) as usize;
        let mut off = if self.num_varlen == 0 {
            self.varlen_payload_begin
        } else {
            self.read_end_offset(payload, self.num_varlen as usize - 1)
        };

        while self.field_reorder_idx[seqno] != field_id {
            let i = self.field_reorder_idx[seqno] as usize;
            if !self.null_bit_set(payload, self.fields[i].nullbit_id) {
                let aligned = align_up_checked(self.fields[i].typalign, off)
                    .expect("field offset overflow in a constructed record");
                off = aligned + FieldOffset::from(self.fields[i].typlen);
            }
            seqno += 1;
        }

        let begin = align_up_checked(fi.typalign, off)
            .expect("field offset overflow in a constructed record");
        (begin, FieldOffset::from(fi.typlen))
    }

    /// Returns a field of the payload as a datum.
    ///
    /// The returned datum borrows the payload for variable-length and
    /// pass-by-reference fields, so the payload must outlive it.
    #[must_use]
    pub fn get_field<'a>(&self, field_id: FieldId, payload: &'a [u8]) -> Datum<'a> {
        if self.field_is_null(field_id, payload) {
            return Datum::null();
        }

        let (begin, len) = self.offset_and_length(field_id, payload);
        let fi = &self.fields[field_id as usize];
        let bytes = &payload[begin as usize..(begin + len) as usize];

        if fi.typlen == -1 || fi.typbyref {
            return Datum::from_varlen_bytes(bytes);
        }

        // Pass-by-value fixed-length: load the little-endian image inline.
        let image = match len {
            1 => u64::from(bytes[0]),
            2 => u64::from(u16::from_le_bytes(bytes.try_into().unwrap())),
            4 => u64::from(u32::from_le_bytes(bytes.try_into().unwrap())),
            _ => u64::from_le_bytes(bytes.try_into().unwrap()),
        };
        Datum::from_u64(image)
    }

    /// Dissembles a payload into one datum per field, in declaration
    /// order. The datums borrow the payload.
    #[must_use]
    pub fn dissemble_payload<'a>(&self, payload: &'a [u8]) -> Vec<Datum<'a>> {
        (0..self.num_fields())
            .map(|i| self.get_field(i, payload))
            .collect()
    }

    /// Writes a datum vector as payload bytes appended to `buf`.
    ///
    /// `buf` is padded to the maximum alignment before anything is
    /// appended, which allows an optional header to precede the payload.
    /// Returns the payload length (excluding that initial padding), itself
    /// a multiple of the maximum alignment.
    ///
    /// Fails with a field-count mismatch, with a null-constraint violation
    /// when a null datum is written into a non-nullable field, and with a
    /// record-too-large error when the payload would leave the signed
    /// 31-bit offset space.
    pub fn write_payload(
        &self,
        data: &[NullableDatumRef<'_>],
        buf: &mut Vec<u8>,
    ) -> RillResult<FieldOffset> {
        self.ensure_layout_computed();
        if data.len() != self.num_fields() as usize {
            return Err(RillError::invalid_argument(format!(
                "datum vector has {} fields, schema has {}",
                data.len(),
                self.num_fields()
            )));
        }
        if buf.len() >= FieldOffset::MAX as usize {
            return Err(RillError::RecordTooLarge);
        }

        let init_len = max_align(buf.len());
        let header_end = init_len
            .checked_add(self.varlen_payload_begin as usize)
            .filter(|&v| v < FieldOffset::MAX as usize)
            .ok_or(RillError::RecordTooLarge)?;
        buf.resize(header_end, 0);

        // Offsets are kept as integers rather than pointers: appending the
        // varlen payloads below re-extends the buffer and may move it.
        let mut off = self.varlen_payload_begin;
        for &field_id in &self.field_reorder_idx {
            let fi = &self.fields[field_id as usize];
            let d = data[field_id as usize];

            if fi.offset >= 0 {
                // Non-nullable fixed-length field at a precomputed offset.
                if d.is_null() {
                    return Err(RillError::NullConstraint { field: field_id });
                }
                let at = init_len + fi.offset as usize;
                let len = fi.typlen as usize;
                if fi.typbyref {
                    let bytes = d.varlen_bytes();
                    if bytes.len() != len {
                        return Err(RillError::invalid_argument(format!(
                            "field {field_id} expects {len} bytes, datum has {}",
                            bytes.len()
                        )));
                    }
                    buf[at..at + len].copy_from_slice(bytes);
                } else {
                    buf[at..at + len].copy_from_slice(&d.fixedlen_image().to_le_bytes()[..len]);
                }
                continue;
            }

            if d.is_null() {
                // Set the null bit; a null varlen field additionally
                // repeats the running end offset in its end array entry so
                // later begin offsets stay derivable.
                let nb = fi.nullbit_id;
                buf[init_len + self.null_bitmap_begin as usize + (nb >> 3) as usize] |=
                    1 << (nb & 7);
                if fi.typlen == -1 {
                    let at =
                        init_len + self.varlen_end_array_begin as usize + 4 * (-fi.offset - 1) as usize;
                    buf[at..at + 4].copy_from_slice(&off.to_le_bytes());
                }
                continue;
            }

            let newoff =
                align_up_checked(fi.typalign, off).ok_or(RillError::RecordTooLarge)?;

            let field_len: FieldOffset;
            if fi.typlen == -1 {
                if d.varlen_len() > FieldOffset::MAX as u32 {
                    return Err(RillError::RecordTooLarge);
                }
                field_len = d.varlen_len() as FieldOffset;
                let end = newoff
                    .checked_add(field_len)
                    .ok_or(RillError::RecordTooLarge)?;
                let at =
                    init_len + self.varlen_end_array_begin as usize + 4 * (-fi.offset - 1) as usize;
                buf[at..at + 4].copy_from_slice(&end.to_le_bytes());
            } else {
                field_len = FieldOffset::from(fi.typlen);
            }

            let end = newoff
                .checked_add(field_len)
                .filter(|&v| (init_len as u64 + v as u64) < FieldOffset::MAX as u64)
                .ok_or(RillError::RecordTooLarge)?;

            debug_assert_eq!(off as usize + init_len, buf.len());
            buf.resize(init_len + end as usize, 0);
            let at = init_len + newoff as usize;
            if fi.typlen == -1 || fi.typbyref {
                let bytes = d.varlen_bytes();
                if fi.typlen != -1 && bytes.len() != field_len as usize {
                    return Err(RillError::invalid_argument(format!(
                        "field {field_id} expects {field_len} bytes, datum has {}",
                        bytes.len()
                    )));
                }
                buf[at..at + bytes.len()].copy_from_slice(bytes);
            } else {
                buf[at..at + field_len as usize]
                    .copy_from_slice(&d.fixedlen_image().to_le_bytes()[..field_len as usize]);
            }
            off = end;
        }

        debug_assert_eq!(off as usize + init_len, buf.len());
        let off = max_align_checked(off).ok_or(RillError::RecordTooLarge)?;
        if init_len as u64 + off as u64 >= FieldOffset::MAX as u64 {
            return Err(RillError::RecordTooLarge);
        }
        if init_len + off as usize > buf.len() {
            buf.resize(init_len + off as usize, 0);
        }
        Ok(off)
    }

    /// Convenience wrapper over [`Schema::write_payload`] for a vector of
    /// owned datums.
    pub fn write_payload_datums(
        &self,
        data: &[Datum<'_>],
        buf: &mut Vec<u8>,
    ) -> RillResult<FieldOffset> {
        let refs: Vec<NullableDatumRef<'_>> = data.iter().map(NullableDatumRef::from).collect();
        self.write_payload(&refs, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::BootstrapCatCache;
    use crate::systables::initoids::{
        TYP_CHAR, TYP_INT2, TYP_INT4, TYP_INT8, TYP_VARCHAR,
    };

    fn computed(
        typid: &[Oid],
        typparam: &[u64],
        nullable: &[bool],
    ) -> Schema {
        let cat = BootstrapCatCache::new().unwrap();
        let mut schema = Schema::create(typid, typparam, nullable).unwrap();
        schema.compute_layout(&cat).unwrap();
        schema
    }

    #[test]
    fn test_create_rejects_malformed_vectors() {
        assert!(Schema::create(&[], &[], &[]).is_err());
        assert!(Schema::create(&[TYP_INT4], &[0, 0], &[false]).is_err());
        assert!(Schema::create_with_names(
            &[TYP_INT4],
            &[0],
            &[false],
            vec!["a".to_string(), "b".to_string()]
        )
        .is_err());
    }

    #[test]
    fn test_all_fixed_short_circuit() {
        let schema = computed(&[TYP_INT4, TYP_INT8], &[0, 0], &[false, false]);
        assert!(schema.is_layout_computed());
        // int4 at 0, int8 aligned to 8, total 16, already max-aligned.
        assert_eq!(schema.null_bitmap_begin, 16);
        assert_eq!(schema.varlen_end_array_begin, 16);
        assert_eq!(schema.varlen_payload_begin, 16);
        assert!(schema.has_only_nonnullable_fixedlen);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let a = computed(
            &[TYP_INT4, TYP_VARCHAR, TYP_INT2],
            &[0, 10, 0],
            &[false, true, true],
        );
        let b = computed(
            &[TYP_INT4, TYP_VARCHAR, TYP_INT2],
            &[0, 10, 0],
            &[false, true, true],
        );
        assert_eq!(a.null_bitmap_begin, b.null_bitmap_begin);
        assert_eq!(a.varlen_end_array_begin, b.varlen_end_array_begin);
        assert_eq!(a.varlen_payload_begin, b.varlen_payload_begin);
        assert_eq!(a.field_reorder_idx, b.field_reorder_idx);

        let d = [
            Datum::from_i32(1),
            Datum::from_varlen_owned(b"x".to_vec()),
            Datum::from_i16(2),
        ];
        let mut buf_a = Vec::new();
        let mut buf_b = Vec::new();
        a.write_payload_datums(&d, &mut buf_a).unwrap();
        b.write_payload_datums(&d, &mut buf_b).unwrap();
        assert_eq!(buf_a, buf_b);
    }

    #[test]
    fn test_three_field_roundtrip() {
        // (INT4 non-null, VARCHAR(10) nullable, INT2 nullable)
        let schema = computed(
            &[TYP_INT4, TYP_VARCHAR, TYP_INT2],
            &[0, 10, 0],
            &[false, true, true],
        );
        assert_eq!(schema.null_bitmap_begin, 4);
        assert_eq!(schema.varlen_end_array_begin, 8);
        assert_eq!(schema.varlen_payload_begin, 12);

        let data = [
            Datum::from_i32(42),
            Datum::null(),
            Datum::from_i16(-7),
        ];
        let mut buf = Vec::new();
        let len = schema.write_payload_datums(&data, &mut buf).unwrap();
        assert_eq!(len as usize, buf.len());
        assert_eq!(len % 8, 0);

        assert!(!schema.field_is_null(0, &buf));
        assert!(schema.field_is_null(1, &buf));
        assert!(!schema.field_is_null(2, &buf));
        assert_eq!(schema.get_field(0, &buf).get_i32(), 42);
        assert!(schema.get_field(1, &buf).is_null());
        assert_eq!(schema.get_field(2, &buf).get_i16(), -7);
    }

    #[test]
    fn test_varlen_reorder() {
        // Field 0 and 2 are varlen, field 1 is the only fixed one and is
        // stored first.
        let schema = computed(
            &[TYP_VARCHAR, TYP_INT4, TYP_VARCHAR],
            &[32, 0, 8],
            &[false, false, false],
        );
        assert_eq!(schema.field_reorder_idx, vec![1, 0, 2]);

        let data = [
            Datum::from_varlen_owned(b"hello".to_vec()),
            Datum::from_i32(123),
            Datum::from_varlen_owned(b"ab".to_vec()),
        ];
        let mut buf = Vec::new();
        let len = schema.write_payload_datums(&data, &mut buf).unwrap();
        assert_eq!(len % 8, 0);

        assert_eq!(schema.offset_and_length(0, &buf).1, 5);
        assert_eq!(schema.offset_and_length(2, &buf).1, 2);
        assert_eq!(schema.get_field(0, &buf).varlen_bytes(), b"hello");
        assert_eq!(schema.get_field(1, &buf).get_i32(), 123);
        assert_eq!(schema.get_field(2, &buf).varlen_bytes(), b"ab");

        // The end-offset array entries are in declaration order of the
        // varlen fields: "hello" ends where "ab" begins.
        let end0 = schema.read_end_offset(&buf, 0);
        let end1 = schema.read_end_offset(&buf, 1);
        assert_eq!(end0, schema.varlen_payload_begin + 5);
        assert_eq!(end1, end0 + 2);
    }

    #[test]
    fn test_single_nullable_varlen_uses_one_bit_and_one_slot() {
        let schema = computed(&[TYP_VARCHAR], &[16], &[true]);
        assert_eq!(schema.num_varlen, 1);
        // One null bit rounds up to a 1-byte bitmap at offset 0; the end
        // array is 4-byte aligned after it.
        assert_eq!(schema.null_bitmap_begin, 0);
        assert_eq!(schema.varlen_end_array_begin, 4);
        assert_eq!(schema.varlen_payload_begin, 8);
    }

    #[test]
    fn test_null_varlen_repeats_end_offset() {
        let schema = computed(
            &[TYP_VARCHAR, TYP_VARCHAR],
            &[8, 8],
            &[true, true],
        );
        let data = [
            Datum::from_varlen_owned(b"abc".to_vec()),
            Datum::null(),
        ];
        let mut buf = Vec::new();
        schema.write_payload_datums(&data, &mut buf).unwrap();

        let end0 = schema.read_end_offset(&buf, 0);
        let end1 = schema.read_end_offset(&buf, 1);
        assert_eq!(end0, end1);
        assert!(schema.field_is_null(1, &buf));
        assert_eq!(schema.offset_and_length(1, &buf).1, 0);
    }

    #[test]
    fn test_char_field_resolves_length_from_typparam() {
        let schema = computed(&[TYP_CHAR, TYP_CHAR], &[3, 5], &[false, true]);
        let data = [
            Datum::from_varlen_owned(b"abc".to_vec()),
            Datum::from_varlen_owned(b"defgh".to_vec()),
        ];
        let mut buf = Vec::new();
        schema.write_payload_datums(&data, &mut buf).unwrap();

        assert_eq!(schema.offset_and_length(0, &buf), (0, 3));
        assert_eq!(schema.get_field(0, &buf).varlen_bytes(), b"abc");
        assert_eq!(schema.get_field(1, &buf).varlen_bytes(), b"defgh");
    }

    #[test]
    fn test_nullable_fixedlen_scan_skips_nulls() {
        // Three nullable fixed-length fields; the middle one null shifts
        // the third's offset left.
        let schema = computed(
            &[TYP_INT8, TYP_INT8, TYP_INT8],
            &[0, 0, 0],
            &[true, true, true],
        );
        let all = [
            Datum::from_i64(1),
            Datum::from_i64(2),
            Datum::from_i64(3),
        ];
        let mut buf_all = Vec::new();
        schema.write_payload_datums(&all, &mut buf_all).unwrap();

        let sparse = [
            Datum::from_i64(1),
            Datum::null(),
            Datum::from_i64(3),
        ];
        let mut buf_sparse = Vec::new();
        schema.write_payload_datums(&sparse, &mut buf_sparse).unwrap();

        assert!(buf_sparse.len() < buf_all.len());
        assert_eq!(schema.get_field(2, &buf_all).get_i64(), 3);
        assert_eq!(schema.get_field(2, &buf_sparse).get_i64(), 3);
        let off_all = schema.offset_and_length(2, &buf_all).0;
        let off_sparse = schema.offset_and_length(2, &buf_sparse).0;
        assert_eq!(off_all - off_sparse, 8);
    }

    #[test]
    fn test_dissemble_matches_input() {
        let schema = computed(
            &[TYP_INT4, TYP_VARCHAR, TYP_INT2, TYP_VARCHAR],
            &[0, 20, 0, 20],
            &[false, true, true, true],
        );
        let data = [
            Datum::from_i32(10),
            Datum::from_varlen_owned(b"left".to_vec()),
            Datum::null(),
            Datum::from_varlen_owned(b"right".to_vec()),
        ];
        let mut buf = Vec::new();
        schema.write_payload_datums(&data, &mut buf).unwrap();

        let back = schema.dissemble_payload(&buf);
        assert_eq!(back.len(), 4);
        assert_eq!(back[0].get_i32(), 10);
        assert_eq!(back[1].varlen_bytes(), b"left");
        assert!(back[2].is_null());
        assert_eq!(back[3].varlen_bytes(), b"right");
    }

    #[test]
    fn test_write_appends_after_existing_bytes() {
        let schema = computed(&[TYP_INT4], &[0], &[false]);
        let mut buf = vec![0xffu8; 3];
        let data = [Datum::from_i32(5)];
        let len = schema.write_payload_datums(&data, &mut buf).unwrap();
        // Payload begins at the max-aligned offset 8.
        assert_eq!(len, 8);
        assert_eq!(buf.len(), 8 + 8);
        assert_eq!(schema.get_field(0, &buf[8..]).get_i32(), 5);
    }

    #[test]
    fn test_wrong_arity_write_fails() {
        let schema = computed(&[TYP_INT4, TYP_INT4], &[0, 0], &[false, false]);
        let data = [Datum::from_i32(5)];
        let mut buf = Vec::new();
        assert!(schema.write_payload_datums(&data, &mut buf).is_err());
    }

    #[test]
    fn test_null_into_nonnullable_fails() {
        let schema = computed(&[TYP_INT4], &[0], &[false]);
        let data = [Datum::null()];
        let mut buf = Vec::new();
        let err = schema.write_payload_datums(&data, &mut buf).unwrap_err();
        assert!(matches!(err, RillError::NullConstraint { field: 0 }));
    }

    #[test]
    fn test_field_names() {
        let cat = BootstrapCatCache::new().unwrap();
        let mut schema = Schema::create_with_names(
            &[TYP_INT4, TYP_VARCHAR],
            &[0, 10],
            &[false, false],
            vec!["id".to_string(), "name".to_string()],
        )
        .unwrap();
        schema.compute_layout(&cat).unwrap();

        assert_eq!(schema.field_name(0), "id");
        assert_eq!(schema.field_id_from_name("name"), 1);
        assert_eq!(schema.field_id_from_name("missing"), INVALID_FIELD_ID);
    }
}
