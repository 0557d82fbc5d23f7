//! Sequential binding slot allocation.

use crate::binding::BindingKind;
use crate::device::{BufferTarget, DeviceCommands, ProgramId, UniformValue};
use crate::resources::{BlockEntry, ProgramResources, ResourceTable, UniformEntry};

/// A resource name and the slot assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingPoint {
    pub name: String,
    pub slot: u32,
}

/// Per-category slot tables of one linked program.
///
/// Each table lists its binding points in slot order: the point at position
/// `n` has slot `n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotTables {
    samplers: Vec<BindingPoint>,
    images: Vec<BindingPoint>,
    uniform_blocks: Vec<BindingPoint>,
    storage_blocks: Vec<BindingPoint>,
}

impl SlotTables {
    pub fn samplers(&self) -> &[BindingPoint] {
        &self.samplers
    }

    pub fn images(&self) -> &[BindingPoint] {
        &self.images
    }

    /// Block slots of one buffer target.
    pub fn buffers(&self, target: BufferTarget) -> &[BindingPoint] {
        match target {
            BufferTarget::Uniform => &self.uniform_blocks,
            BufferTarget::ShaderStorage => &self.storage_blocks,
        }
    }

    pub fn table(&self, kind: BindingKind) -> &[BindingPoint] {
        match kind {
            BindingKind::Sampler => &self.samplers,
            BindingKind::Image => &self.images,
            BindingKind::Buffer(target) => self.buffers(target),
        }
    }

    /// Slot assigned to `name` in `kind`, if any.
    pub fn slot_of(&self, kind: BindingKind, name: &str) -> Option<u32> {
        self.table(kind)
            .iter()
            .find(|point| point.name == name)
            .map(|point| point.slot)
    }

    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty()
            && self.images.is_empty()
            && self.uniform_blocks.is_empty()
            && self.storage_blocks.is_empty()
    }
}

fn push_point(table: &mut Vec<BindingPoint>, name: &str) -> u32 {
    let slot = table.len() as u32;
    table.push(BindingPoint {
        name: name.to_string(),
        slot,
    });
    slot
}

/// Assigns dense sequential slots to a program's opaque uniforms and blocks
/// and reconciles them with the device.
///
/// Samplers and images get their slot written as the uniform's integer
/// value; blocks get their compiler index routed to the slot. Allocation
/// runs once per successful link.
pub struct BindingAllocator {
    program: ProgramId,
}

impl BindingAllocator {
    pub fn new(program: ProgramId) -> Self {
        Self { program }
    }

    /// Allocate every category, recording block slots in `resources`.
    pub fn allocate<D>(&self, device: &mut D, resources: &mut ProgramResources) -> SlotTables
    where
        D: DeviceCommands + ?Sized,
    {
        let tables = SlotTables {
            samplers: self.allocate_samplers(device, &resources.uniforms),
            images: self.allocate_images(device, &resources.uniforms),
            uniform_blocks: self.allocate_blocks(
                device,
                BufferTarget::Uniform,
                &mut resources.uniform_blocks,
            ),
            storage_blocks: self.allocate_blocks(
                device,
                BufferTarget::ShaderStorage,
                &mut resources.storage_blocks,
            ),
        };

        log::debug!(
            "Allocated bindings for {}: {} samplers, {} images, {} uniform blocks, {} storage blocks",
            self.program,
            tables.samplers.len(),
            tables.images.len(),
            tables.uniform_blocks.len(),
            tables.storage_blocks.len()
        );
        tables
    }

    /// Default-block sampler uniforms, in enumeration order.
    fn allocate_samplers<D>(
        &self,
        device: &mut D,
        uniforms: &ResourceTable<UniformEntry>,
    ) -> Vec<BindingPoint>
    where
        D: DeviceCommands + ?Sized,
    {
        let mut table = Vec::new();
        for uniform in uniforms
            .iter()
            .filter(|u| u.ty.is_sampler() && u.block_index.is_none())
        {
            let slot = push_point(&mut table, &uniform.name);
            self.write_unit(device, uniform, slot);
        }
        table
    }

    /// Image uniforms, in enumeration order.
    fn allocate_images<D>(
        &self,
        device: &mut D,
        uniforms: &ResourceTable<UniformEntry>,
    ) -> Vec<BindingPoint>
    where
        D: DeviceCommands + ?Sized,
    {
        let mut table = Vec::new();
        for uniform in uniforms.iter().filter(|u| u.ty.is_image()) {
            let slot = push_point(&mut table, &uniform.name);
            self.write_unit(device, uniform, slot);
        }
        table
    }

    fn write_unit<D>(&self, device: &mut D, uniform: &UniformEntry, slot: u32)
    where
        D: DeviceCommands + ?Sized,
    {
        match uniform.location {
            Some(location) => {
                device.program_uniform(self.program, location, UniformValue::Int(&[slot as i32], 1));
                log::trace!("{} {} -> unit {}", uniform.ty, uniform.name, slot);
            }
            None => log::trace!("{} {} has no location, unit {} not written", uniform.ty, uniform.name, slot),
        }
    }

    fn allocate_blocks<D>(
        &self,
        device: &mut D,
        target: BufferTarget,
        blocks: &mut ResourceTable<BlockEntry>,
    ) -> Vec<BindingPoint>
    where
        D: DeviceCommands + ?Sized,
    {
        let mut table = Vec::new();
        for block in blocks.iter_mut() {
            let slot = push_point(&mut table, &block.name);
            block.binding_index = slot;
            match target {
                BufferTarget::Uniform => device.uniform_block_binding(self.program, block.index, slot),
                BufferTarget::ShaderStorage => {
                    device.storage_block_binding(self.program, block.index, slot)
                }
            }
            log::trace!("{} block {} (index {}) -> binding {}", target, block.name, block.index, slot);
        }
        table
    }
}
