//! Object heap
//!
//! # Memory Layout
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ GcHeader (size, align)                  │
//! ├─────────────────────────────────────────┤  ← GcPtr points here
//! │ Object data                             │
//! └─────────────────────────────────────────┘
//! ```
//!
//! A [`GcPtr`] is a copyable handle whose address is the object's identity.
//! Objects live until their [`Heap`] is dropped.

mod header;
mod heap;
mod ptr;

pub use header::GcHeader;
pub use heap::{Heap, HeapError};
pub use ptr::GcPtr;
