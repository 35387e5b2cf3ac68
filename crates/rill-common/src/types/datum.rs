//! The datum value carrier.
//!
//! A [`Datum`] stores a single **read-only** value of a SQL type: either a
//! fixed-length value of at most 8 bytes held inline, or a variable-length
//! byte array that the datum owns or borrows. A datum carries no type
//! information; the caller picks the right typed accessor, usually guided by
//! a schema's field type OID.
//!
//! Datums move; they are never copied. A datum that owns its byte buffer
//! frees it exactly once when dropped. To pass datums into function-call
//! sites, take a [`DatumRef`] or [`NullableDatumRef`]: cheap `Copy` views
//! whose lifetime is tied to the source datum, so a view can never outlive
//! the value it reads.

use crate::error::{RillError, RillResult};
use crate::types::Oid;

/// A read-only value of a SQL type.
///
/// The four states are: null, fixed-length pass-by-value (at most 8 bytes,
/// stored inline as a little-endian image), owned variable-length bytes, and
/// borrowed variable-length bytes.
#[derive(Debug)]
pub struct Datum<'a> {
    kind: Kind<'a>,
}

#[derive(Debug)]
enum Kind<'a> {
    Null,
    Inline(u64),
    Owned(Box<[u8]>),
    Borrowed(&'a [u8]),
}

macro_rules! inline_constructors {
    ($($(#[$doc:meta])* $from:ident, $from_nullable:ident, $get:ident, $ty:ty);* $(;)?) => {
        $(
            $(#[$doc])*
            #[inline]
            #[must_use]
            pub fn $from(v: $ty) -> Datum<'static> {
                Datum {
                    kind: Kind::Inline(v as u64),
                }
            }

            /// Nullable overload: returns the null datum when `is_null` is
            /// set.
            #[inline]
            #[must_use]
            pub fn $from_nullable(v: $ty, is_null: bool) -> Datum<'static> {
                if is_null {
                    Datum::null()
                } else {
                    Self::$from(v)
                }
            }

            /// Reinterprets the low bytes of the inline value.
            #[inline]
            #[must_use]
            pub fn $get(&self) -> $ty {
                self.inline_image() as $ty
            }
        )*
    };
}

impl<'a> Datum<'a> {
    /// Returns the null datum.
    #[inline]
    #[must_use]
    pub fn null() -> Datum<'static> {
        Datum { kind: Kind::Null }
    }

    /// Returns the datum representation of a boolean.
    #[inline]
    #[must_use]
    pub fn from_bool(v: bool) -> Datum<'static> {
        Datum {
            kind: Kind::Inline(u64::from(v)),
        }
    }

    /// Nullable overload of [`Datum::from_bool`].
    #[inline]
    #[must_use]
    pub fn from_bool_nullable(v: bool, is_null: bool) -> Datum<'static> {
        if is_null {
            Self::null()
        } else {
            Self::from_bool(v)
        }
    }

    inline_constructors! {
        /// Returns the datum representation of an 8-bit integer.
        from_i8, from_i8_nullable, get_i8, i8;
        /// Returns the datum representation of an 8-bit unsigned integer.
        from_u8, from_u8_nullable, get_u8, u8;
        /// Returns the datum representation of a 16-bit integer.
        from_i16, from_i16_nullable, get_i16, i16;
        /// Returns the datum representation of a 16-bit unsigned integer.
        from_u16, from_u16_nullable, get_u16, u16;
        /// Returns the datum representation of a 32-bit integer.
        from_i32, from_i32_nullable, get_i32, i32;
        /// Returns the datum representation of a 32-bit unsigned integer.
        from_u32, from_u32_nullable, get_u32, u32;
        /// Returns the datum representation of a 64-bit integer.
        from_i64, from_i64_nullable, get_i64, i64;
        /// Returns the datum representation of a 64-bit unsigned integer.
        from_u64, from_u64_nullable, get_u64, u64;
    }

    /// Returns the datum representation of a single-precision float.
    ///
    /// The bit image is stored in the low 32 bits of the inline value, so
    /// that the integer and float views of a datum agree byte for byte.
    #[inline]
    #[must_use]
    pub fn from_f32(v: f32) -> Datum<'static> {
        Datum {
            kind: Kind::Inline(u64::from(v.to_bits())),
        }
    }

    /// Nullable overload of [`Datum::from_f32`].
    #[inline]
    #[must_use]
    pub fn from_f32_nullable(v: f32, is_null: bool) -> Datum<'static> {
        if is_null {
            Self::null()
        } else {
            Self::from_f32(v)
        }
    }

    /// Returns the datum representation of a double-precision float.
    #[inline]
    #[must_use]
    pub fn from_f64(v: f64) -> Datum<'static> {
        Datum {
            kind: Kind::Inline(v.to_bits()),
        }
    }

    /// Nullable overload of [`Datum::from_f64`].
    #[inline]
    #[must_use]
    pub fn from_f64_nullable(v: f64, is_null: bool) -> Datum<'static> {
        if is_null {
            Self::null()
        } else {
            Self::from_f64(v)
        }
    }

    /// Returns the datum representation of an object identifier.
    #[inline]
    #[must_use]
    pub fn from_oid(v: Oid) -> Datum<'static> {
        Self::from_u32(v.as_u32())
    }

    /// Nullable overload of [`Datum::from_oid`].
    #[inline]
    #[must_use]
    pub fn from_oid_nullable(v: Oid, is_null: bool) -> Datum<'static> {
        if is_null {
            Self::null()
        } else {
            Self::from_oid(v)
        }
    }

    /// Returns the datum representation of a pointer.
    ///
    /// The address is stored inline. The pointee is neither owned nor
    /// interpreted by the datum.
    #[inline]
    #[must_use]
    pub fn from_pointer(p: *const u8) -> Datum<'static> {
        Datum {
            kind: Kind::Inline(p as u64),
        }
    }

    /// Returns a fixed-length pass-by-value datum from its little-endian
    /// byte image. `bytes.len()` must be 1, 2, 4, or 8.
    pub fn from_fixedlen_bytes(bytes: &[u8]) -> RillResult<Datum<'static>> {
        let image = match bytes.len() {
            1 => u64::from(bytes[0]),
            2 => u64::from(u16::from_le_bytes([bytes[0], bytes[1]])),
            4 => u64::from(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            8 => u64::from_le_bytes(bytes.try_into().unwrap()),
            n => {
                return Err(RillError::invalid_argument(format!(
                    "unexpected pass-by-value data length {n}"
                )))
            }
        };
        Ok(Datum {
            kind: Kind::Inline(image),
        })
    }

    /// Returns a variable-length datum borrowing `bytes`.
    #[inline]
    #[must_use]
    pub fn from_varlen_bytes(bytes: &'a [u8]) -> Datum<'a> {
        debug_assert!(bytes.len() <= u32::MAX as usize);
        Datum {
            kind: Kind::Borrowed(bytes),
        }
    }

    /// Nullable overload of [`Datum::from_varlen_bytes`].
    #[inline]
    #[must_use]
    pub fn from_varlen_bytes_nullable(bytes: &'a [u8], is_null: bool) -> Datum<'a> {
        if is_null {
            Self::null()
        } else {
            Self::from_varlen_bytes(bytes)
        }
    }

    /// Returns a variable-length datum that owns `bytes`.
    #[inline]
    #[must_use]
    pub fn from_varlen_owned(bytes: impl Into<Box<[u8]>>) -> Datum<'static> {
        let bytes = bytes.into();
        debug_assert!(bytes.len() <= u32::MAX as usize);
        Datum {
            kind: Kind::Owned(bytes),
        }
    }

    /// Nullable overload of [`Datum::from_varlen_owned`]. The buffer is
    /// dropped when `is_null` is set.
    #[inline]
    #[must_use]
    pub fn from_varlen_owned_nullable(bytes: impl Into<Box<[u8]>>, is_null: bool) -> Datum<'static> {
        if is_null {
            Self::null()
        } else {
            Self::from_varlen_owned(bytes)
        }
    }

    /// Returns a datum borrowing the bytes of a string.
    ///
    /// Strings are always treated as variable-length datums; read them back
    /// with [`Datum::varlen_bytes`]. Fails if the string does not fit the
    /// 32-bit size field.
    pub fn from_cstr(s: &'a str) -> RillResult<Datum<'a>> {
        if s.len() > u32::MAX as usize {
            return Err(RillError::invalid_argument(format!(
                "string is too long: {}",
                s.len()
            )));
        }
        Ok(Self::from_varlen_bytes(s.as_bytes()))
    }

    /// Returns a datum owning the bytes of a string. Fails if the string
    /// does not fit the 32-bit size field.
    pub fn from_string(s: String) -> RillResult<Datum<'static>> {
        if s.len() > u32::MAX as usize {
            return Err(RillError::invalid_argument(format!(
                "string is too long: {}",
                s.len()
            )));
        }
        Ok(Self::from_varlen_owned(s.into_bytes()))
    }

    /// Returns true if this datum is null.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self.kind, Kind::Null)
    }

    /// Returns true if this datum carries a variable-length value.
    #[inline]
    #[must_use]
    pub fn is_varlen(&self) -> bool {
        matches!(self.kind, Kind::Owned(_) | Kind::Borrowed(_))
    }

    /// Returns the boolean value of the datum.
    #[inline]
    #[must_use]
    pub fn get_bool(&self) -> bool {
        self.inline_image() != 0
    }

    /// Returns the single-precision float value of the datum.
    #[inline]
    #[must_use]
    pub fn get_f32(&self) -> f32 {
        f32::from_bits(self.inline_image() as u32)
    }

    /// Returns the double-precision float value of the datum.
    #[inline]
    #[must_use]
    pub fn get_f64(&self) -> f64 {
        f64::from_bits(self.inline_image())
    }

    /// Returns the object identifier value of the datum.
    #[inline]
    #[must_use]
    pub fn get_oid(&self) -> Oid {
        Oid::new(self.get_u32())
    }

    /// Returns the pointer value of the datum.
    #[inline]
    #[must_use]
    pub fn get_pointer(&self) -> *const u8 {
        self.inline_image() as *const u8
    }

    /// Returns the little-endian byte image of a fixed-length pass-by-value
    /// datum. Writers copy the low `typlen` bytes of this.
    #[inline]
    #[must_use]
    pub fn fixedlen_image(&self) -> u64 {
        self.inline_image()
    }

    /// Returns the variable-length value as a byte slice.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not variable-length.
    #[inline]
    #[must_use]
    pub fn varlen_bytes(&self) -> &[u8] {
        match &self.kind {
            Kind::Owned(b) => b,
            Kind::Borrowed(b) => b,
            _ => panic!("varlen access on a fixed-length or null datum"),
        }
    }

    /// Returns the length of the variable-length value.
    #[inline]
    #[must_use]
    pub fn varlen_len(&self) -> u32 {
        self.varlen_bytes().len() as u32
    }

    /// Returns true if reading this datum requires an external buffer to
    /// still be alive (a borrowed variable-length value).
    #[inline]
    #[must_use]
    pub fn has_external_ref(&self) -> bool {
        matches!(self.kind, Kind::Borrowed(_))
    }

    /// Converts this datum into one with no external references.
    ///
    /// A borrowed variable-length value is copied into an owned buffer;
    /// everything else is returned as-is without copying.
    #[must_use]
    pub fn into_owned(self) -> Datum<'static> {
        match self.kind {
            Kind::Null => Datum { kind: Kind::Null },
            Kind::Inline(v) => Datum {
                kind: Kind::Inline(v),
            },
            Kind::Owned(b) => Datum {
                kind: Kind::Owned(b),
            },
            Kind::Borrowed(b) => Datum {
                kind: Kind::Owned(b.into()),
            },
        }
    }

    #[inline]
    fn inline_image(&self) -> u64 {
        match &self.kind {
            Kind::Null => 0,
            Kind::Inline(v) => *v,
            _ => panic!("typed accessor on a variable-length datum"),
        }
    }
}

/// A copyable, read-only view of a non-null datum.
///
/// For fixed-length values the inline image is copied into the reference;
/// for variable-length values the reference borrows the source datum's byte
/// buffer. Either way a `DatumRef` is only valid while the source datum is,
/// which the lifetime parameter enforces.
#[derive(Debug, Clone, Copy)]
pub struct DatumRef<'a> {
    kind: RefKind<'a>,
}

#[derive(Debug, Clone, Copy)]
enum RefKind<'a> {
    Inline(u64),
    Varlen(&'a [u8]),
}

impl<'a> DatumRef<'a> {
    /// Always false; use [`NullableDatumRef`] to carry nullness.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        false
    }

    /// Returns the boolean value of the referenced datum.
    #[inline]
    #[must_use]
    pub fn get_bool(&self) -> bool {
        self.inline_image() != 0
    }

    /// Reinterprets the low byte of the inline image.
    #[inline]
    #[must_use]
    pub fn get_i8(&self) -> i8 {
        self.inline_image() as i8
    }

    /// Reinterprets the low byte of the inline image.
    #[inline]
    #[must_use]
    pub fn get_u8(&self) -> u8 {
        self.inline_image() as u8
    }

    /// Reinterprets the low bytes of the inline image.
    #[inline]
    #[must_use]
    pub fn get_i16(&self) -> i16 {
        self.inline_image() as i16
    }

    /// Reinterprets the low bytes of the inline image.
    #[inline]
    #[must_use]
    pub fn get_u16(&self) -> u16 {
        self.inline_image() as u16
    }

    /// Reinterprets the low bytes of the inline image.
    #[inline]
    #[must_use]
    pub fn get_i32(&self) -> i32 {
        self.inline_image() as i32
    }

    /// Reinterprets the low bytes of the inline image.
    #[inline]
    #[must_use]
    pub fn get_u32(&self) -> u32 {
        self.inline_image() as u32
    }

    /// Returns the full inline image.
    #[inline]
    #[must_use]
    pub fn get_i64(&self) -> i64 {
        self.inline_image() as i64
    }

    /// Returns the full inline image.
    #[inline]
    #[must_use]
    pub fn get_u64(&self) -> u64 {
        self.inline_image()
    }

    /// Returns the single-precision float view of the inline image.
    #[inline]
    #[must_use]
    pub fn get_f32(&self) -> f32 {
        f32::from_bits(self.inline_image() as u32)
    }

    /// Returns the double-precision float view of the inline image.
    #[inline]
    #[must_use]
    pub fn get_f64(&self) -> f64 {
        f64::from_bits(self.inline_image())
    }

    /// Returns the object identifier view of the inline image.
    #[inline]
    #[must_use]
    pub fn get_oid(&self) -> Oid {
        Oid::new(self.get_u32())
    }

    /// Returns the little-endian byte image of a fixed-length value.
    #[inline]
    #[must_use]
    pub fn fixedlen_image(&self) -> u64 {
        self.inline_image()
    }

    /// Returns the variable-length value as a byte slice.
    ///
    /// # Panics
    ///
    /// Panics if the referenced datum is fixed-length.
    #[inline]
    #[must_use]
    pub fn varlen_bytes(&self) -> &'a [u8] {
        match self.kind {
            RefKind::Varlen(b) => b,
            RefKind::Inline(_) => panic!("varlen access on a fixed-length datum reference"),
        }
    }

    /// Returns the length of the variable-length value.
    #[inline]
    #[must_use]
    pub fn varlen_len(&self) -> u32 {
        self.varlen_bytes().len() as u32
    }

    /// Returns true if the referenced value is variable-length.
    #[inline]
    #[must_use]
    pub fn is_varlen(&self) -> bool {
        matches!(self.kind, RefKind::Varlen(_))
    }

    #[inline]
    fn inline_image(&self) -> u64 {
        match self.kind {
            RefKind::Inline(v) => v,
            RefKind::Varlen(_) => panic!("typed accessor on a variable-length datum reference"),
        }
    }
}

impl<'a, 'd: 'a> From<&'a Datum<'d>> for DatumRef<'a> {
    fn from(d: &'a Datum<'d>) -> Self {
        let kind = match &d.kind {
            // A null datum viewed through a DatumRef reads as the zero
            // image; nullness travels through NullableDatumRef only.
            Kind::Null => RefKind::Inline(0),
            Kind::Inline(v) => RefKind::Inline(*v),
            Kind::Owned(b) => RefKind::Varlen(b),
            Kind::Borrowed(b) => RefKind::Varlen(b),
        };
        DatumRef { kind }
    }
}

/// A copyable, read-only view of a possibly-null datum.
#[derive(Debug, Clone, Copy)]
pub struct NullableDatumRef<'a> {
    inner: Option<DatumRef<'a>>,
}

impl<'a> NullableDatumRef<'a> {
    /// The null reference.
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self { inner: None }
    }

    /// Returns true if the referenced datum is null.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// Converts to a non-nullable reference.
    ///
    /// # Panics
    ///
    /// Panics if the referenced datum is null.
    #[inline]
    #[must_use]
    pub fn as_datum_ref(&self) -> DatumRef<'a> {
        match self.inner {
            Some(r) => r,
            None => panic!("casting a NULL datum to a DatumRef"),
        }
    }

    /// Returns the boolean value of the referenced datum.
    #[inline]
    #[must_use]
    pub fn get_bool(&self) -> bool {
        self.as_datum_ref().get_bool()
    }

    /// See [`DatumRef::get_i8`].
    #[inline]
    #[must_use]
    pub fn get_i8(&self) -> i8 {
        self.as_datum_ref().get_i8()
    }

    /// See [`DatumRef::get_u8`].
    #[inline]
    #[must_use]
    pub fn get_u8(&self) -> u8 {
        self.as_datum_ref().get_u8()
    }

    /// See [`DatumRef::get_i16`].
    #[inline]
    #[must_use]
    pub fn get_i16(&self) -> i16 {
        self.as_datum_ref().get_i16()
    }

    /// See [`DatumRef::get_u16`].
    #[inline]
    #[must_use]
    pub fn get_u16(&self) -> u16 {
        self.as_datum_ref().get_u16()
    }

    /// See [`DatumRef::get_i32`].
    #[inline]
    #[must_use]
    pub fn get_i32(&self) -> i32 {
        self.as_datum_ref().get_i32()
    }

    /// See [`DatumRef::get_u32`].
    #[inline]
    #[must_use]
    pub fn get_u32(&self) -> u32 {
        self.as_datum_ref().get_u32()
    }

    /// See [`DatumRef::get_i64`].
    #[inline]
    #[must_use]
    pub fn get_i64(&self) -> i64 {
        self.as_datum_ref().get_i64()
    }

    /// See [`DatumRef::get_u64`].
    #[inline]
    #[must_use]
    pub fn get_u64(&self) -> u64 {
        self.as_datum_ref().get_u64()
    }

    /// See [`DatumRef::get_f32`].
    #[inline]
    #[must_use]
    pub fn get_f32(&self) -> f32 {
        self.as_datum_ref().get_f32()
    }

    /// See [`DatumRef::get_f64`].
    #[inline]
    #[must_use]
    pub fn get_f64(&self) -> f64 {
        self.as_datum_ref().get_f64()
    }

    /// See [`DatumRef::get_oid`].
    #[inline]
    #[must_use]
    pub fn get_oid(&self) -> Oid {
        self.as_datum_ref().get_oid()
    }

    /// See [`DatumRef::fixedlen_image`].
    #[inline]
    #[must_use]
    pub fn fixedlen_image(&self) -> u64 {
        self.as_datum_ref().fixedlen_image()
    }

    /// See [`DatumRef::varlen_bytes`].
    #[inline]
    #[must_use]
    pub fn varlen_bytes(&self) -> &'a [u8] {
        self.as_datum_ref().varlen_bytes()
    }

    /// See [`DatumRef::varlen_len`].
    #[inline]
    #[must_use]
    pub fn varlen_len(&self) -> u32 {
        self.as_datum_ref().varlen_len()
    }

    /// See [`DatumRef::is_varlen`].
    #[inline]
    #[must_use]
    pub fn is_varlen(&self) -> bool {
        self.as_datum_ref().is_varlen()
    }
}

impl<'a, 'd: 'a> From<&'a Datum<'d>> for NullableDatumRef<'a> {
    fn from(d: &'a Datum<'d>) -> Self {
        if d.is_null() {
            Self::null()
        } else {
            Self {
                inner: Some(DatumRef::from(d)),
            }
        }
    }
}

impl<'a> From<DatumRef<'a>> for NullableDatumRef<'a> {
    fn from(r: DatumRef<'a>) -> Self {
        Self { inner: Some(r) }
    }
}
