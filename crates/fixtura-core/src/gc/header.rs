//! Object header
//!
//! Every heap-allocated object is preceded by a header recording the layout
//! it was allocated with, which the heap needs to free it.

/// Header stored before each allocated object
///
/// Layout in memory:
/// ```text
/// ┌─────────────────────────────────────────┐
/// │ GcHeader (16 bytes, 8-byte aligned)     │
/// │  - size: usize (whole allocation)       │
/// │  - align: usize                         │
/// ├─────────────────────────────────────────┤
/// │ Object data (variable size)             │
/// └─────────────────────────────────────────┘
/// ```
#[repr(C, align(8))]
#[derive(Debug, Clone, Copy)]
pub struct GcHeader {
    size: usize,
    align: usize,
}

impl GcHeader {
    /// Create a new header
    pub fn new(size: usize, align: usize) -> Self {
        Self { size, align }
    }

    /// Size of the allocation (including header)
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Alignment of the allocation
    #[inline]
    pub fn align(&self) -> usize {
        self.align
    }
}
