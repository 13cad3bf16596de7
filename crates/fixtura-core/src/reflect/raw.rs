//! Raw field writes (test-only mutation capability)
//!
//! Fixtures sometimes need to overwrite fields that the schema declares
//! final. The ordinary write path refuses to do that; [`RawFieldAccess`]
//! does not. It writes a value straight into a slot block at a byte offset,
//! skipping finality and assignability checks.
//!
//! There is exactly one handle per process, created on first use by
//! [`raw_access`]. Initialization verifies the slot layout the offsets rely
//! on and reports a [`FieldError::RawAccessUnavailable`] instead of
//! panicking if it does not hold.

use super::field::FieldDescriptor;
use super::FieldError;
use crate::object::Slots;
use crate::types::{ScalarKind, TypeRef};
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::cell::Cell;

static RAW_ACCESS: OnceCell<RawFieldAccess> = OnceCell::new();

/// Get the process-wide raw field access handle
pub fn raw_access() -> Result<&'static RawFieldAccess, FieldError> {
    RAW_ACCESS.get_or_try_init(RawFieldAccess::init)
}

/// Offset-based field writer
#[derive(Debug)]
pub struct RawFieldAccess {
    slot_size: usize,
    slot_align: usize,
}

impl RawFieldAccess {
    fn init() -> Result<Self, FieldError> {
        let slot_size = std::mem::size_of::<Value>();
        let slot_align = std::mem::align_of::<Value>();
        if std::mem::size_of::<Cell<Value>>() != slot_size
            || std::mem::align_of::<Cell<Value>>() != slot_align
        {
            return Err(FieldError::RawAccessUnavailable(
                "slot cells are not layout-compatible with values".to_string(),
            ));
        }
        if slot_size == 0 || slot_size % slot_align != 0 {
            return Err(FieldError::RawAccessUnavailable(format!(
                "unsupported slot layout (size {}, align {})",
                slot_size, slot_align
            )));
        }
        tracing::debug!(slot_size, slot_align, "raw field access initialized");
        Ok(Self {
            slot_size,
            slot_align,
        })
    }

    /// Size of one slot in bytes
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Write `value` into the field described by `field` inside `slots`
    ///
    /// Dispatches on the field's scalar kind for value-type fields and uses a
    /// reference write otherwise. The offset is checked against the block.
    pub fn write_field(
        &self,
        slots: &Slots,
        field: &FieldDescriptor,
        value: Value,
    ) -> Result<(), FieldError> {
        let offset = field.offset;
        if offset % self.slot_size != 0 || offset + self.slot_size > slots.byte_len() {
            return Err(FieldError::RawAccessUnavailable(format!(
                "offset {} of field \"{}\" is outside its slot block",
                offset, field.name
            )));
        }
        let base = slots.base_ptr();
        let mismatch = || FieldError::IncompatibleValue {
            field: field.name.clone(),
            expected: field.ty.clone(),
            found: value.type_name(),
        };

        // Offset is slot-aligned and inside the block; slots are cells.
        unsafe {
            match (&field.ty, value) {
                (TypeRef::Scalar(ScalarKind::Bool), Value::Bool(v)) => self.put_bool(base, offset, v),
                (TypeRef::Scalar(ScalarKind::I8), Value::I8(v)) => self.put_i8(base, offset, v),
                (TypeRef::Scalar(ScalarKind::I16), Value::I16(v)) => self.put_i16(base, offset, v),
                (TypeRef::Scalar(ScalarKind::I32), Value::I32(v)) => self.put_i32(base, offset, v),
                (TypeRef::Scalar(ScalarKind::I64), Value::I64(v)) => self.put_i64(base, offset, v),
                (TypeRef::Scalar(ScalarKind::F32), Value::F32(v)) => self.put_f32(base, offset, v),
                (TypeRef::Scalar(ScalarKind::F64), Value::F64(v)) => self.put_f64(base, offset, v),
                (TypeRef::Scalar(ScalarKind::Char), Value::Char(v)) => self.put_char(base, offset, v),
                (TypeRef::Scalar(_), _) => return Err(mismatch()),
                (_, Value::Null) | (_, Value::Ref(_)) => self.put_ref(base, offset, value),
                _ => return Err(mismatch()),
            }
        }
        Ok(())
    }

    /// # Safety
    ///
    /// `base + offset` must address a slot inside a live slot block.
    #[inline]
    unsafe fn put(&self, base: *mut u8, offset: usize, value: Value) {
        debug_assert_eq!((base as usize + offset) % self.slot_align, 0);
        (base.add(offset) as *mut Value).write(value);
    }

    /// Write a `boolean` slot
    ///
    /// # Safety
    ///
    /// `base + offset` must address a slot inside a live slot block.
    pub unsafe fn put_bool(&self, base: *mut u8, offset: usize, value: bool) {
        self.put(base, offset, Value::Bool(value))
    }

    /// Write a `byte` slot
    ///
    /// # Safety
    ///
    /// `base + offset` must address a slot inside a live slot block.
    pub unsafe fn put_i8(&self, base: *mut u8, offset: usize, value: i8) {
        self.put(base, offset, Value::I8(value))
    }

    /// Write a `short` slot
    ///
    /// # Safety
    ///
    /// `base + offset` must address a slot inside a live slot block.
    pub unsafe fn put_i16(&self, base: *mut u8, offset: usize, value: i16) {
        self.put(base, offset, Value::I16(value))
    }

    /// Write an `int` slot
    ///
    /// # Safety
    ///
    /// `base + offset` must address a slot inside a live slot block.
    pub unsafe fn put_i32(&self, base: *mut u8, offset: usize, value: i32) {
        self.put(base, offset, Value::I32(value))
    }

    /// Write a `long` slot
    ///
    /// # Safety
    ///
    /// `base + offset` must address a slot inside a live slot block.
    pub unsafe fn put_i64(&self, base: *mut u8, offset: usize, value: i64) {
        self.put(base, offset, Value::I64(value))
    }

    /// Write a `float` slot
    ///
    /// # Safety
    ///
    /// `base + offset` must address a slot inside a live slot block.
    pub unsafe fn put_f32(&self, base: *mut u8, offset: usize, value: f32) {
        self.put(base, offset, Value::F32(value))
    }

    /// Write a `double` slot
    ///
    /// # Safety
    ///
    /// `base + offset` must address a slot inside a live slot block.
    pub unsafe fn put_f64(&self, base: *mut u8, offset: usize, value: f64) {
        self.put(base, offset, Value::F64(value))
    }

    /// Write a `char` slot
    ///
    /// # Safety
    ///
    /// `base + offset` must address a slot inside a live slot block.
    pub unsafe fn put_char(&self, base: *mut u8, offset: usize, value: char) {
        self.put(base, offset, Value::Char(value))
    }

    /// Write a reference slot (null or object)
    ///
    /// # Safety
    ///
    /// `base + offset` must address a slot inside a live slot block.
    pub unsafe fn put_ref(&self, base: *mut u8, offset: usize, value: Value) {
        self.put(base, offset, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Modifiers;

    fn descriptor(ty: TypeRef, slot: usize) -> FieldDescriptor {
        FieldDescriptor {
            declaring_class: 0,
            name: "f".to_string(),
            ty,
            modifiers: Modifiers::FINAL,
            slot,
            offset: slot * std::mem::size_of::<Value>(),
        }
    }

    #[test]
    fn test_singleton() {
        let a = raw_access().unwrap();
        let b = raw_access().unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.slot_size(), std::mem::size_of::<Value>());
    }

    #[test]
    fn test_write_scalar_by_offset() {
        let slots = Slots::new(3);
        let access = raw_access().unwrap();
        access
            .write_field(&slots, &descriptor(TypeRef::Scalar(ScalarKind::I64), 2), Value::I64(9))
            .unwrap();
        assert_eq!(slots.get(2), Some(Value::I64(9)));
        assert_eq!(slots.get(0), Some(Value::null()));
    }

    #[test]
    fn test_write_rejects_kind_mismatch() {
        let slots = Slots::new(1);
        let access = raw_access().unwrap();
        let err = access
            .write_field(&slots, &descriptor(TypeRef::Scalar(ScalarKind::I32), 0), Value::Bool(true))
            .unwrap_err();
        assert!(matches!(err, FieldError::IncompatibleValue { .. }));
    }

    #[test]
    fn test_write_out_of_block() {
        let slots = Slots::new(1);
        let access = raw_access().unwrap();
        let err = access
            .write_field(&slots, &descriptor(TypeRef::String, 1), Value::null())
            .unwrap_err();
        assert!(matches!(err, FieldError::RawAccessUnavailable(_)));
    }
}
