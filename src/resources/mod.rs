//! Active program resources.
//!
//! After every successful link the program's active uniforms, uniform
//! blocks, storage blocks and subroutines are read back from the device
//! into per-category [`ResourceTable`]s. Tables keep the enumeration order
//! the device reported, which is the order binding slots are assigned in.

pub mod glsl_type;
pub mod introspect;

use std::collections::HashMap;

use crate::device::ShaderStage;

pub use glsl_type::{GlslType, ScalarKind};
pub use introspect::ResourceIntrospector;

/// Common accessors of every resource kind.
pub trait Resource {
    /// Compiler-assigned index, unique within the resource category.
    fn index(&self) -> u32;
    /// Resource name, unique within the resource category.
    fn name(&self) -> &str;
}

/// An active uniform, either in the default block or a member of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformEntry {
    pub index: u32,
    pub name: String,
    /// Location for direct setters; `None` for block members.
    pub location: Option<u32>,
    /// Containing uniform block; `None` for default-block uniforms.
    pub block_index: Option<u32>,
    pub ty: GlslType,
    pub array_size: u32,
    pub array_stride: i32,
    pub matrix_stride: i32,
}

/// An active uniform block or shader storage block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEntry {
    pub index: u32,
    pub name: String,
    /// Sequential binding slot assigned at allocation time.
    pub binding_index: u32,
    pub data_size: u32,
    pub num_active_variables: u32,
    pub active_variable_indices: Vec<u32>,
}

/// An active subroutine function of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubroutineEntry {
    pub index: u32,
    pub name: String,
}

impl Resource for UniformEntry {
    fn index(&self) -> u32 {
        self.index
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for BlockEntry {
    fn index(&self) -> u32 {
        self.index
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for SubroutineEntry {
    fn index(&self) -> u32 {
        self.index
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A reference to any introspected resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceEntry<'a> {
    Uniform(&'a UniformEntry),
    UniformBlock(&'a BlockEntry),
    StorageBlock(&'a BlockEntry),
    Subroutine(ShaderStage, &'a SubroutineEntry),
}

impl ResourceEntry<'_> {
    pub fn index(&self) -> u32 {
        match self {
            ResourceEntry::Uniform(entry) => entry.index,
            ResourceEntry::UniformBlock(entry) | ResourceEntry::StorageBlock(entry) => entry.index,
            ResourceEntry::Subroutine(_, entry) => entry.index,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ResourceEntry::Uniform(entry) => &entry.name,
            ResourceEntry::UniformBlock(entry) | ResourceEntry::StorageBlock(entry) => &entry.name,
            ResourceEntry::Subroutine(_, entry) => &entry.name,
        }
    }
}

/// Resources of one category, in device enumeration order.
#[derive(Debug, Clone)]
pub struct ResourceTable<T> {
    entries: Vec<T>,
    by_index: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
}

impl<T> Default for ResourceTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_index: HashMap::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<T: Resource> ResourceTable<T> {
    /// Build a table from entries in enumeration order.
    pub fn from_entries(entries: Vec<T>) -> Self {
        let mut by_index = HashMap::with_capacity(entries.len());
        let mut by_name = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            let previous = by_index.insert(entry.index(), position);
            debug_assert!(previous.is_none(), "duplicate resource index {}", entry.index());
            let previous = by_name.insert(entry.name().to_owned(), position);
            debug_assert!(previous.is_none(), "duplicate resource name {}", entry.name());
        }
        Self {
            entries,
            by_index,
            by_name,
        }
    }

    /// Look up by compiler-assigned index.
    pub fn get(&self, index: u32) -> Option<&T> {
        self.by_index.get(&index).map(|&i| &self.entries[i])
    }

    /// Look up by name.
    pub fn by_name(&self, name: &str) -> Option<&T> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Entries in enumeration order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.entries.iter_mut()
    }
}

impl<'a, T: Resource> IntoIterator for &'a ResourceTable<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Every resource table of one linked program.
#[derive(Debug, Clone, Default)]
pub struct ProgramResources {
    pub(crate) uniforms: ResourceTable<UniformEntry>,
    pub(crate) uniform_blocks: ResourceTable<BlockEntry>,
    pub(crate) storage_blocks: ResourceTable<BlockEntry>,
    pub(crate) subroutines: HashMap<ShaderStage, ResourceTable<SubroutineEntry>>,
}

impl ProgramResources {
    pub fn uniforms(&self) -> &ResourceTable<UniformEntry> {
        &self.uniforms
    }

    pub fn uniform_blocks(&self) -> &ResourceTable<BlockEntry> {
        &self.uniform_blocks
    }

    pub fn storage_blocks(&self) -> &ResourceTable<BlockEntry> {
        &self.storage_blocks
    }

    /// Subroutines of `stage`, if the program has that stage.
    pub fn subroutines(&self, stage: ShaderStage) -> Option<&ResourceTable<SubroutineEntry>> {
        self.subroutines.get(&stage)
    }

    /// Every resource, category by category.
    pub fn entries(&self) -> impl Iterator<Item = ResourceEntry<'_>> {
        let mut subroutines: Vec<_> = self.subroutines.iter().collect();
        subroutines.sort_by_key(|(stage, _)| **stage);

        self.uniforms
            .iter()
            .map(ResourceEntry::Uniform)
            .chain(self.uniform_blocks.iter().map(ResourceEntry::UniformBlock))
            .chain(self.storage_blocks.iter().map(ResourceEntry::StorageBlock))
            .chain(subroutines.into_iter().flat_map(|(stage, table)| {
                table
                    .iter()
                    .map(move |entry| ResourceEntry::Subroutine(*stage, entry))
            }))
    }
}
