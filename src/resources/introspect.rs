//! Reading active resources back from a linked program.

use std::collections::HashMap;

use crate::device::{
    DeviceCommands, InterfaceProperty, ProgramId, ProgramInterface, ResourceProperty,
    ShaderStage, StageSet,
};
use crate::resources::{
    BlockEntry, GlslType, ProgramResources, ResourceTable, SubroutineEntry, UniformEntry,
};

const UNIFORM_PROPERTIES: [ResourceProperty; 6] = [
    ResourceProperty::BlockIndex,
    ResourceProperty::Location,
    ResourceProperty::Type,
    ResourceProperty::ArraySize,
    ResourceProperty::ArrayStride,
    ResourceProperty::MatrixStride,
];

const BLOCK_PROPERTIES: [ResourceProperty; 2] = [
    ResourceProperty::BufferDataSize,
    ResourceProperty::NumActiveVariables,
];

fn optional_index(raw: i32) -> Option<u32> {
    u32::try_from(raw).ok()
}

/// Queries the active resources of one linked program.
///
/// Enumeration order is exactly the order the device reports; slot
/// allocation depends on it.
pub struct ResourceIntrospector<'d, D: DeviceCommands + ?Sized> {
    device: &'d D,
    program: ProgramId,
}

impl<'d, D: DeviceCommands + ?Sized> ResourceIntrospector<'d, D> {
    /// Create an introspector for `program`.
    ///
    /// # Panics
    ///
    /// Panics if `program` does not name a live program object.
    pub fn new(device: &'d D, program: ProgramId) -> Self {
        assert!(
            device.is_program(program),
            "introspection of invalid program handle {}",
            program
        );
        Self { device, program }
    }

    fn interface_value(&self, interface: ProgramInterface, property: InterfaceProperty) -> usize {
        usize::try_from(self.device.program_interface(self.program, interface, property))
            .unwrap_or(0)
    }

    /// Visit every active resource of `interface` with its index and name.
    fn for_each_named(&self, interface: ProgramInterface, mut visit: impl FnMut(u32, String)) {
        let count = self.interface_value(interface, InterfaceProperty::ActiveResources);
        let max_name_length = self.interface_value(interface, InterfaceProperty::MaxNameLength);
        let mut name_buffer = vec![0u8; max_name_length];
        let mut name_length = [0i32; 1];

        for index in 0..count as u32 {
            self.device.program_resource(
                self.program,
                interface,
                index,
                &[ResourceProperty::NameLength],
                &mut name_length,
            );
            self.device
                .program_resource_name(self.program, interface, index, &mut name_buffer);

            // The reported length may or may not count the terminator.
            let length = usize::try_from(name_length[0])
                .unwrap_or(0)
                .min(name_buffer.len());
            let bytes = &name_buffer[..length];
            let bytes = bytes.strip_suffix(&[0]).unwrap_or(bytes);
            visit(index, String::from_utf8_lossy(bytes).into_owned());
        }
    }

    /// Active uniforms, including block members.
    pub fn uniforms(&self) -> ResourceTable<UniformEntry> {
        let mut entries = Vec::new();
        let mut values = [0i32; UNIFORM_PROPERTIES.len()];

        self.for_each_named(ProgramInterface::Uniform, |index, name| {
            self.device.program_resource(
                self.program,
                ProgramInterface::Uniform,
                index,
                &UNIFORM_PROPERTIES,
                &mut values,
            );
            entries.push(UniformEntry {
                index,
                name,
                block_index: optional_index(values[0]),
                location: optional_index(values[1]),
                ty: GlslType::from_raw(values[2] as u32),
                array_size: values[3].max(0) as u32,
                array_stride: values[4],
                matrix_stride: values[5],
            });
        });

        log::trace!("Introspected {} active uniforms", entries.len());
        ResourceTable::from_entries(entries)
    }

    /// Active uniform blocks. Binding slots are assigned later by the allocator.
    pub fn uniform_blocks(&self) -> ResourceTable<BlockEntry> {
        self.blocks(ProgramInterface::UniformBlock)
    }

    /// Active shader storage blocks. Binding slots are assigned later by the allocator.
    pub fn storage_blocks(&self) -> ResourceTable<BlockEntry> {
        self.blocks(ProgramInterface::ShaderStorageBlock)
    }

    fn blocks(&self, interface: ProgramInterface) -> ResourceTable<BlockEntry> {
        let max_members =
            self.interface_value(interface, InterfaceProperty::MaxNumActiveVariables);
        let mut members = vec![0i32; max_members];
        let mut values = [0i32; BLOCK_PROPERTIES.len()];
        let mut entries = Vec::new();

        self.for_each_named(interface, |index, name| {
            self.device.program_resource(
                self.program,
                interface,
                index,
                &BLOCK_PROPERTIES,
                &mut values,
            );
            let num_active_variables = values[1].max(0) as u32;
            let written = self.device.program_resource(
                self.program,
                interface,
                index,
                &[ResourceProperty::ActiveVariables],
                &mut members,
            );
            let active_variable_indices = members[..written.min(num_active_variables as usize)]
                .iter()
                .map(|&m| m as u32)
                .collect();

            entries.push(BlockEntry {
                index,
                name,
                binding_index: 0,
                data_size: values[0].max(0) as u32,
                num_active_variables,
                active_variable_indices,
            });
        });

        log::trace!("Introspected {} active {:?} blocks", entries.len(), interface);
        ResourceTable::from_entries(entries)
    }

    /// Active subroutines of every stage in `stages`.
    pub fn subroutines(
        &self,
        stages: StageSet,
    ) -> HashMap<ShaderStage, ResourceTable<SubroutineEntry>> {
        stages
            .stages()
            .map(|stage| {
                let mut entries = Vec::new();
                self.for_each_named(ProgramInterface::Subroutine(stage), |index, name| {
                    entries.push(SubroutineEntry { index, name });
                });
                (stage, ResourceTable::from_entries(entries))
            })
            .collect()
    }

    /// Read every resource category of the program.
    pub fn introspect(&self, stages: StageSet) -> ProgramResources {
        ProgramResources {
            uniforms: self.uniforms(),
            uniform_blocks: self.uniform_blocks(),
            storage_blocks: self.storage_blocks(),
            subroutines: self.subroutines(stages),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{BlockDecl, ProgramLayout, RecordingDevice, UniformDecl};
    use crate::resources::glsl_type::{FLOAT_MAT4, FLOAT_VEC4, IMAGE_2D, SAMPLER_2D};

    fn link(layout: ProgramLayout) -> (RecordingDevice, ProgramId) {
        let mut device = RecordingDevice::with_layout(layout);
        let shader = device.create_shader(ShaderStage::Fragment);
        device.shader_source(shader, "void main() {}");
        device.compile_shader(shader);
        let program = device.create_program();
        device.attach_shader(program, shader);
        device.link_program(program);
        (device, program)
    }

    #[test]
    fn test_uniform_properties() {
        let layout = ProgramLayout::new()
            .with_uniform(
                UniformDecl::new("u_color", GlslType::from_raw(FLOAT_VEC4)).at_location(4),
            )
            .with_uniform(
                UniformDecl::new("model", GlslType::from_raw(FLOAT_MAT4))
                    .in_block(0)
                    .with_matrix_stride(16),
            )
            .with_sampler("albedo", SAMPLER_2D)
            .with_uniform_block(BlockDecl::new("Transforms", 64));
        let (device, program) = link(layout);

        let uniforms = ResourceIntrospector::new(&device, program).uniforms();
        assert_eq!(uniforms.len(), 3);

        let color = uniforms.by_name("u_color").unwrap();
        assert_eq!(color.location, Some(4));
        assert_eq!(color.block_index, None);
        assert_eq!(color.array_size, 1);

        let model = uniforms.by_name("model").unwrap();
        assert_eq!(model.location, None);
        assert_eq!(model.block_index, Some(0));
        assert_eq!(model.matrix_stride, 16);

        assert!(uniforms.by_name("albedo").unwrap().ty.is_sampler());
    }

    #[test]
    fn test_block_members() {
        let layout = ProgramLayout::new()
            .with_uniform(UniformDecl::new("view", GlslType::from_raw(FLOAT_MAT4)).in_block(0))
            .with_uniform(UniformDecl::new("proj", GlslType::from_raw(FLOAT_MAT4)).in_block(0))
            .with_uniform_block(BlockDecl::new("Camera", 128))
            .with_storage_block(BlockDecl::new("Particles", 4096).with_members(vec![0, 1, 2]));
        let (device, program) = link(layout);
        let introspector = ResourceIntrospector::new(&device, program);

        let blocks = introspector.uniform_blocks();
        let camera = blocks.by_name("Camera").unwrap();
        assert_eq!(camera.data_size, 128);
        assert_eq!(camera.num_active_variables, 2);
        assert_eq!(camera.active_variable_indices, vec![0, 1]);

        let storage = introspector.storage_blocks();
        let particles = storage.get(0).unwrap();
        assert_eq!(particles.name, "Particles");
        assert_eq!(particles.active_variable_indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_names_exclude_terminator() {
        let layout = ProgramLayout::new()
            .with_image("a", IMAGE_2D)
            .with_image("longer_name", IMAGE_2D);
        let (device, program) = link(layout);
        let uniforms = ResourceIntrospector::new(&device, program).uniforms();
        let names: Vec<_> = uniforms.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["a", "longer_name"]);
    }

    #[test]
    fn test_subroutines_per_stage() {
        let layout = ProgramLayout::new()
            .with_subroutine(ShaderStage::Fragment, "diffuse")
            .with_subroutine(ShaderStage::Fragment, "specular")
            .with_subroutine(ShaderStage::Vertex, "skinned");
        let (device, program) = link(layout);
        let subroutines = ResourceIntrospector::new(&device, program)
            .subroutines(StageSet::VERTEX | StageSet::FRAGMENT);
        assert_eq!(subroutines[&ShaderStage::Fragment].len(), 2);
        assert_eq!(
            subroutines[&ShaderStage::Vertex].get(0).map(|s| s.name.as_str()),
            Some("skinned")
        );
    }

    #[test]
    #[should_panic(expected = "invalid program handle")]
    fn test_invalid_program_is_fatal() {
        let device = RecordingDevice::new();
        ResourceIntrospector::new(&device, ProgramId(42));
    }
}
