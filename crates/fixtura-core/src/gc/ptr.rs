//! Heap-managed pointers
//!
//! This module provides `GcPtr<T>`, a copyable handle to a heap object.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;

/// A pointer to an object owned by a [`Heap`](super::Heap)
///
/// # Memory Layout
///
/// ```text
/// ┌─────────────────────────────────────────┐
/// │ GcHeader                                │
/// ├─────────────────────────────────────────┤  ← ptr points here
/// │ T (object data)                         │
/// └─────────────────────────────────────────┘
/// ```
///
/// Equality and hashing use the address, never the contents: the address is
/// the object's identity.
///
/// # Safety
///
/// - The pointer must always point to memory allocated by a heap
/// - The heap must outlive every dereference
pub struct GcPtr<T: ?Sized> {
    ptr: NonNull<T>,
    _phantom: PhantomData<T>,
}

impl<T: ?Sized> GcPtr<T> {
    /// Create a new pointer (used by the heap allocator)
    ///
    /// # Safety
    ///
    /// The pointer must point to a valid object allocated by a heap,
    /// with a GcHeader immediately preceding it.
    #[inline]
    pub(crate) unsafe fn new(ptr: NonNull<T>) -> Self {
        Self {
            ptr,
            _phantom: PhantomData,
        }
    }

    /// Get the raw pointer
    #[inline]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Get the address as usize (for hashing/comparison)
    #[inline]
    pub fn addr(&self) -> usize {
        // Cast to thin pointer first to handle unsized types
        self.ptr.as_ptr() as *const () as usize
    }
}

impl<T> Clone for GcPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for GcPtr<T> {}

impl<T: ?Sized> PartialEq for GcPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<T: ?Sized> Eq for GcPtr<T> {}

impl<T: ?Sized> std::hash::Hash for GcPtr<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<T: ?Sized> Deref for GcPtr<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: ?Sized> fmt::Debug for GcPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GcPtr({:#x})", self.addr())
    }
}

impl<T: ?Sized> fmt::Display for GcPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GcPtr({:#x})", self.addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leak<T>(value: T) -> GcPtr<T> {
        unsafe { GcPtr::new(NonNull::from(Box::leak(Box::new(value)))) }
    }

    fn free<T>(ptr: GcPtr<T>) {
        unsafe { drop(Box::from_raw(ptr.as_ptr())) }
    }

    #[test]
    fn test_gcptr_deref() {
        let ptr = leak(100i32);
        assert_eq!(*ptr, 100);
        free(ptr);
    }

    #[test]
    fn test_gcptr_identity() {
        let ptr1 = leak(1i32);
        let ptr2 = leak(1i32);

        // Different pointers, even if same value
        assert_ne!(ptr1, ptr2);

        // Copies share identity
        let ptr3 = ptr1;
        assert_eq!(ptr1, ptr3);
        assert_eq!(ptr1.addr(), ptr3.addr());

        free(ptr1);
        free(ptr2);
    }

    #[test]
    fn test_gcptr_size() {
        assert_eq!(
            std::mem::size_of::<GcPtr<i32>>(),
            std::mem::size_of::<*mut i32>()
        );
    }
}
