//! Validation and batched application of binding specs.

use crate::binding::{BindingKind, BindingSpec, RangeError, SlotTables};
use crate::device::{BufferId, BufferTarget, DeviceCommands, SamplerId, TextureId};
use crate::error::{BindingError, BindingResult};

/// Slot-ordered arrays of one buffer target, ready for a ranged bind.
#[derive(Debug)]
struct BufferRanges {
    target: BufferTarget,
    buffers: Vec<BufferId>,
    offsets: Vec<u64>,
    sizes: Vec<u64>,
}

/// Every array of one apply, filled before any command is issued.
#[derive(Debug, Default)]
struct PreparedBinds {
    textures: Vec<TextureId>,
    samplers: Vec<SamplerId>,
    images: Vec<TextureId>,
    buffers: Vec<BufferRanges>,
}

/// Applies a [`BindingSpec`] against the slot tables of one program.
///
/// Every category is validated and turned into slot-ordered arrays first;
/// only when the whole spec checks out is one batched bind command issued
/// per non-empty category. A failing apply issues nothing.
pub struct BindingApplier<'t> {
    tables: &'t SlotTables,
}

impl<'t> BindingApplier<'t> {
    pub fn new(tables: &'t SlotTables) -> Self {
        Self { tables }
    }

    pub fn apply<D>(&self, device: &mut D, spec: &BindingSpec<'_>) -> BindingResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        let prepared = self.prepare(spec)?;

        if !prepared.textures.is_empty() {
            device.bind_textures(0, &prepared.textures);
            device.bind_samplers(0, &prepared.samplers);
        }
        if !prepared.images.is_empty() {
            device.bind_image_textures(0, &prepared.images);
        }
        for ranges in &prepared.buffers {
            device.bind_buffers_range(
                ranges.target,
                0,
                &ranges.buffers,
                &ranges.offsets,
                &ranges.sizes,
            );
        }
        Ok(())
    }

    fn prepare(&self, spec: &BindingSpec<'_>) -> BindingResult<PreparedBinds> {
        let mut prepared = PreparedBinds::default();

        let samplers = self.tables.samplers();
        prepared.textures.reserve(samplers.len());
        prepared.samplers.reserve(samplers.len());
        for point in samplers {
            debug_assert_eq!(point.slot as usize, prepared.textures.len());
            let binding = spec.sampler(&point.name).ok_or_else(|| BindingError::MissingBinding {
                kind: BindingKind::Sampler,
                name: point.name.clone(),
            })?;
            prepared.textures.push(binding.texture);
            prepared.samplers.push(binding.sampler.unwrap_or(SamplerId::NONE));
        }

        for point in self.tables.images() {
            debug_assert_eq!(point.slot as usize, prepared.images.len());
            let binding = spec.image(&point.name).ok_or_else(|| BindingError::MissingBinding {
                kind: BindingKind::Image,
                name: point.name.clone(),
            })?;
            prepared.images.push(binding.texture);
        }

        for target in BufferTarget::ALL {
            if let Some(ranges) = self.prepare_buffers(spec, target)? {
                prepared.buffers.push(ranges);
            }
        }

        Ok(prepared)
    }

    fn prepare_buffers(
        &self,
        spec: &BindingSpec<'_>,
        target: BufferTarget,
    ) -> BindingResult<Option<BufferRanges>> {
        let points = self.tables.buffers(target);
        if points.is_empty() {
            return Ok(None);
        }
        let declared = spec
            .buffers(target)
            .ok_or(BindingError::MissingTarget(target))?;

        let mut ranges = BufferRanges {
            target,
            buffers: Vec::with_capacity(points.len()),
            offsets: Vec::with_capacity(points.len()),
            sizes: Vec::with_capacity(points.len()),
        };
        for point in points {
            debug_assert_eq!(point.slot as usize, ranges.buffers.len());
            let binding =
                declared
                    .get(point.name.as_str())
                    .ok_or_else(|| BindingError::MissingBinding {
                        kind: BindingKind::Buffer(target),
                        name: point.name.clone(),
                    })?;
            let name = || point.name.clone();
            let (offset, size) = binding.view.resolve().map_err(|err| match err {
                RangeError::NotCreated => BindingError::BufferNotCreated { target, name: name() },
                RangeError::NotAllocated => BindingError::BufferNotAllocated { target, name: name() },
                RangeError::OffsetOutOfRange {
                    offset,
                    buffer_size,
                } => BindingError::OffsetOutOfRange {
                    target,
                    name: name(),
                    offset,
                    buffer_size,
                },
                RangeError::RangeOutOfBounds {
                    offset,
                    size,
                    buffer_size,
                } => BindingError::RangeOutOfBounds {
                    target,
                    name: name(),
                    offset,
                    size,
                    buffer_size,
                },
                RangeError::EmptyRange { offset } => BindingError::EmptyRange {
                    target,
                    name: name(),
                    offset,
                },
                RangeError::ExceedsView {
                    offset,
                    end,
                    view_end,
                } => BindingError::ExceedsView {
                    target,
                    name: name(),
                    offset,
                    end,
                    view_end,
                },
            })?;

            log::trace!("{} block {} -> binding {} ({})", target, point.name, point.slot, binding.view);
            ranges.buffers.push(binding.view.buffer().id());
            ranges.offsets.push(offset);
            ranges.sizes.push(size);
        }
        Ok(Some(ranges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BindingAllocator, Buffer, BufferBinding};
    use crate::device::{
        BlockDecl, DeviceCommand, ProgramId, ProgramLayout, RecordingDevice, ShaderStage,
        StageSet,
    };
    use crate::resources::glsl_type::{IMAGE_2D, SAMPLER_2D};
    use crate::resources::ResourceIntrospector;

    fn tables_for(layout: ProgramLayout) -> (RecordingDevice, SlotTables) {
        let mut device = RecordingDevice::with_layout(layout);
        let shader = device.create_shader(ShaderStage::Compute);
        device.shader_source(shader, "void main() {}");
        device.compile_shader(shader);
        let program: ProgramId = device.create_program();
        device.attach_shader(program, shader);
        device.link_program(program);
        let mut resources =
            ResourceIntrospector::new(&device, program).introspect(StageSet::COMPUTE);
        let tables = BindingAllocator::new(program).allocate(&mut device, &mut resources);
        device.take_commands();
        (device, tables)
    }

    #[test]
    fn test_samplers_batched_in_slot_order() {
        let (mut device, tables) = tables_for(
            ProgramLayout::new()
                .with_sampler("tex0", SAMPLER_2D)
                .with_sampler("tex1", SAMPLER_2D),
        );
        let spec = BindingSpec::of(|b| {
            b.sampler_with("tex1", TextureId(20), SamplerId(2))?
                .sampler("tex0", TextureId(10))?;
            Ok(())
        })
        .unwrap();

        BindingApplier::new(&tables).apply(&mut device, &spec).unwrap();
        assert_eq!(
            device.commands(),
            &[
                DeviceCommand::BindTextures {
                    first: 0,
                    textures: vec![TextureId(10), TextureId(20)],
                },
                DeviceCommand::BindSamplers {
                    first: 0,
                    samplers: vec![SamplerId::NONE, SamplerId(2)],
                },
            ]
        );
    }

    #[test]
    fn test_missing_sampler_issues_nothing() {
        let (mut device, tables) = tables_for(
            ProgramLayout::new()
                .with_image("target", IMAGE_2D)
                .with_sampler("tex0", SAMPLER_2D)
                .with_sampler("tex1", SAMPLER_2D),
        );
        let spec = BindingSpec::of(|b| {
            b.sampler("tex0", TextureId(1))?.image("target", TextureId(2))?;
            Ok(())
        })
        .unwrap();

        let err = BindingApplier::new(&tables).apply(&mut device, &spec).unwrap_err();
        assert_eq!(
            err,
            BindingError::MissingBinding {
                kind: BindingKind::Sampler,
                name: "tex1".to_string()
            }
        );
        assert!(device.commands().is_empty());
    }

    #[test]
    fn test_buffer_ranges_resolved() {
        let (mut device, tables) = tables_for(
            ProgramLayout::new()
                .with_uniform_block(BlockDecl::new("Matrices", 64))
                .with_uniform_block(BlockDecl::new("Lights", 16))
                .with_storage_block(BlockDecl::new("Particles", 0)),
        );
        let uniforms = Buffer::allocated(BufferId(7), 64);
        let particles = Buffer::allocated(BufferId(8), 1024);
        let spec = BindingSpec::of(|b| {
            b.buffer(BufferBinding::uniform("Lights", uniforms.create_view_from(48)))?
                .buffer(BufferBinding::uniform("Matrices", uniforms.create_view(0, 48)))?
                .buffer(BufferBinding::storage("Particles", &particles))?;
            Ok(())
        })
        .unwrap();

        BindingApplier::new(&tables).apply(&mut device, &spec).unwrap();
        let state = device.bind_state();
        assert_eq!(
            state.buffer_bindings.get(&(BufferTarget::Uniform, 0)),
            Some(&(BufferId(7), 0, 48))
        );
        assert_eq!(
            state.buffer_bindings.get(&(BufferTarget::Uniform, 1)),
            Some(&(BufferId(7), 48, 16))
        );
        assert_eq!(
            state.buffer_bindings.get(&(BufferTarget::ShaderStorage, 0)),
            Some(&(BufferId(8), 0, 1024))
        );
        assert_eq!(device.commands().len(), 2);
    }

    #[test]
    fn test_missing_target() {
        let (mut device, tables) =
            tables_for(ProgramLayout::new().with_storage_block(BlockDecl::new("Particles", 0)));
        let err = BindingApplier::new(&tables)
            .apply(&mut device, &BindingSpec::empty())
            .unwrap_err();
        assert_eq!(err, BindingError::MissingTarget(BufferTarget::ShaderStorage));
    }

    #[test]
    fn test_invalid_buffer_range_issues_nothing() {
        let (mut device, tables) = tables_for(
            ProgramLayout::new()
                .with_sampler("tex0", SAMPLER_2D)
                .with_uniform_block(BlockDecl::new("Camera", 64)),
        );
        let buffer = Buffer::allocated(BufferId(3), 64);
        let spec = BindingSpec::of(|b| {
            b.sampler("tex0", TextureId(1))?
                .buffer(BufferBinding::uniform("Camera", buffer.create_view_from(70)))?;
            Ok(())
        })
        .unwrap();

        let err = BindingApplier::new(&tables).apply(&mut device, &spec).unwrap_err();
        assert!(matches!(err, BindingError::OffsetOutOfRange { offset: 70, .. }));
        assert!(device.commands().is_empty());

        let unallocated = Buffer::new(BufferId(4));
        let spec = BindingSpec::of(|b| {
            b.sampler("tex0", TextureId(1))?
                .buffer(BufferBinding::uniform("Camera", &unallocated))?;
            Ok(())
        })
        .unwrap();
        let err = BindingApplier::new(&tables).apply(&mut device, &spec).unwrap_err();
        assert!(matches!(err, BindingError::BufferNotAllocated { .. }));
    }

    #[test]
    fn test_empty_tables_issue_nothing() {
        let (mut device, tables) = tables_for(ProgramLayout::new());
        BindingApplier::new(&tables)
            .apply(&mut device, &BindingSpec::empty())
            .unwrap();
        assert!(device.commands().is_empty());
    }
}
