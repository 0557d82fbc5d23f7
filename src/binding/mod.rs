//! Resource binding
//!
//! A program's opaque uniforms and blocks are given dense sequential slots
//! once per link by the [`BindingAllocator`]. Callers describe which GPU
//! objects satisfy those resources with an immutable [`BindingSpec`], and the
//! [`BindingApplier`] validates the spec against the slot tables and issues
//! one batched bind command per category.

pub mod allocator;
pub mod applier;
pub mod buffer_view;
pub mod spec;

pub use allocator::{BindingAllocator, BindingPoint, SlotTables};
pub use applier::BindingApplier;
pub use buffer_view::{Buffer, BufferView, RangeError};
pub use spec::{BindingSpec, BindingSpecBuilder, BufferBinding, ImageBinding, SamplerBinding};

use crate::device::BufferTarget;

/// Resource category a binding declaration or slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Sampler,
    Image,
    Buffer(BufferTarget),
}

impl std::fmt::Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingKind::Sampler => write!(f, "sampler unit"),
            BindingKind::Image => write!(f, "image unit"),
            BindingKind::Buffer(target) => write!(f, "{} buffer block", target),
        }
    }
}
