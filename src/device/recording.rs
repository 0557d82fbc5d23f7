//! Recording device for testing and tooling.
//!
//! This device doesn't talk to a GPU. It simulates shader compilation and
//! linking against a declared [`ProgramLayout`], answers introspection
//! queries from that layout, and records every binding-relevant command it
//! receives so the effect of an operation can be inspected afterwards.

use std::collections::{BTreeMap, HashMap};

use crate::device::traits::DeviceCommands;
use crate::device::types::*;
use crate::resources::GlslType;

/// Declaration of one active uniform in a simulated program.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformDecl {
    pub name: String,
    pub ty: GlslType,
    /// Explicit location; `None` lets the linker pick one.
    pub location: Option<u32>,
    /// Index of the uniform block this uniform belongs to.
    pub block: Option<u32>,
    pub array_size: u32,
    pub array_stride: i32,
    pub matrix_stride: i32,
}

impl UniformDecl {
    pub fn new(name: impl Into<String>, ty: GlslType) -> Self {
        Self {
            name: name.into(),
            ty,
            location: None,
            block: None,
            array_size: 1,
            array_stride: -1,
            matrix_stride: -1,
        }
    }

    /// Pin the uniform to an explicit location.
    pub fn at_location(mut self, location: u32) -> Self {
        self.location = Some(location);
        self
    }

    /// Make the uniform a member of uniform block `block_index`.
    pub fn in_block(mut self, block_index: u32) -> Self {
        self.block = Some(block_index);
        self.location = None;
        if self.array_stride < 0 {
            self.array_stride = 0;
        }
        if self.matrix_stride < 0 {
            self.matrix_stride = 0;
        }
        self
    }

    pub fn with_array(mut self, size: u32, stride: i32) -> Self {
        self.array_size = size;
        self.array_stride = stride;
        self
    }

    pub fn with_matrix_stride(mut self, stride: i32) -> Self {
        self.matrix_stride = stride;
        self
    }
}

/// Declaration of one active uniform or storage block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDecl {
    pub name: String,
    pub data_size: u32,
    /// Member variable indices. Uniform blocks with no explicit members
    /// report every uniform declared `in_block` of them.
    pub members: Vec<u32>,
}

impl BlockDecl {
    pub fn new(name: impl Into<String>, data_size: u32) -> Self {
        Self {
            name: name.into(),
            data_size,
            members: Vec::new(),
        }
    }

    pub fn with_members(mut self, members: Vec<u32>) -> Self {
        self.members = members;
        self
    }
}

/// The set of active resources a simulated link produces.
///
/// Declaration order is the order the device enumerates the resources in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramLayout {
    pub uniforms: Vec<UniformDecl>,
    pub uniform_blocks: Vec<BlockDecl>,
    pub storage_blocks: Vec<BlockDecl>,
    pub subroutines: Vec<(ShaderStage, String)>,
}

impl ProgramLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_uniform(mut self, uniform: UniformDecl) -> Self {
        self.uniforms.push(uniform);
        self
    }

    /// Add a sampler uniform in the default block.
    pub fn with_sampler(self, name: impl Into<String>, raw_type: u32) -> Self {
        self.with_uniform(UniformDecl::new(name, GlslType::from_raw(raw_type)))
    }

    /// Add an image uniform in the default block.
    pub fn with_image(self, name: impl Into<String>, raw_type: u32) -> Self {
        self.with_uniform(UniformDecl::new(name, GlslType::from_raw(raw_type)))
    }

    pub fn with_uniform_block(mut self, block: BlockDecl) -> Self {
        self.uniform_blocks.push(block);
        self
    }

    pub fn with_storage_block(mut self, block: BlockDecl) -> Self {
        self.storage_blocks.push(block);
        self
    }

    pub fn with_subroutine(mut self, stage: ShaderStage, name: impl Into<String>) -> Self {
        self.subroutines.push((stage, name.into()));
        self
    }
}

/// A command received by the [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    LabelProgram {
        program: ProgramId,
        label: Option<String>,
    },
    ProgramUniform {
        program: ProgramId,
        location: u32,
        value: OwnedUniformValue,
    },
    UniformBlockBinding {
        program: ProgramId,
        block_index: u32,
        binding: u32,
    },
    StorageBlockBinding {
        program: ProgramId,
        block_index: u32,
        binding: u32,
    },
    BindTextures {
        first: u32,
        textures: Vec<TextureId>,
    },
    BindSamplers {
        first: u32,
        samplers: Vec<SamplerId>,
    },
    BindImageTextures {
        first: u32,
        textures: Vec<TextureId>,
    },
    BindBuffersRange {
        target: BufferTarget,
        first: u32,
        buffers: Vec<BufferId>,
        offsets: Vec<u64>,
        sizes: Vec<u64>,
    },
}

impl DeviceCommand {
    /// Whether this is one of the batched bind commands.
    pub fn is_batched_bind(&self) -> bool {
        matches!(
            self,
            DeviceCommand::BindTextures { .. }
                | DeviceCommand::BindSamplers { .. }
                | DeviceCommand::BindImageTextures { .. }
                | DeviceCommand::BindBuffersRange { .. }
        )
    }
}

/// Context-global unit bindings as seen by draw calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindState {
    pub texture_units: BTreeMap<u32, TextureId>,
    pub sampler_units: BTreeMap<u32, SamplerId>,
    pub image_units: BTreeMap<u32, TextureId>,
    pub buffer_bindings: BTreeMap<(BufferTarget, u32), (BufferId, u64, u64)>,
}

#[derive(Debug)]
struct ShaderState {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    info_log: String,
}

#[derive(Debug, Default)]
struct ProgramState {
    shaders: Vec<ShaderId>,
    linked: Option<LinkedLayout>,
    info_log: String,
    label: Option<String>,
    uniform_values: HashMap<u32, OwnedUniformValue>,
    uniform_block_bindings: HashMap<u32, u32>,
    storage_block_bindings: HashMap<u32, u32>,
}

#[derive(Debug, Clone)]
struct LinkedLayout {
    layout: ProgramLayout,
    locations: Vec<Option<u32>>,
}

impl LinkedLayout {
    fn resolve(layout: ProgramLayout) -> Self {
        let mut used: Vec<u32> = Vec::new();
        for uniform in layout.uniforms.iter().filter(|u| u.block.is_none()) {
            if let Some(location) = uniform.location {
                used.extend(location..location + uniform.array_size.max(1));
            }
        }

        let mut next = 0;
        let locations = layout
            .uniforms
            .iter()
            .map(|uniform| {
                if uniform.block.is_some() {
                    return None;
                }
                if uniform.location.is_some() {
                    return uniform.location;
                }
                let span = uniform.array_size.max(1);
                while (next..next + span).any(|l| used.contains(&l)) {
                    next += 1;
                }
                let location = next;
                used.extend(location..location + span);
                next += span;
                Some(location)
            })
            .collect();

        Self { layout, locations }
    }

    fn resource_names(&self, interface: ProgramInterface) -> Vec<&str> {
        match interface {
            ProgramInterface::Uniform => {
                self.layout.uniforms.iter().map(|u| u.name.as_str()).collect()
            }
            ProgramInterface::UniformBlock => self
                .layout
                .uniform_blocks
                .iter()
                .map(|b| b.name.as_str())
                .collect(),
            ProgramInterface::ShaderStorageBlock => self
                .layout
                .storage_blocks
                .iter()
                .map(|b| b.name.as_str())
                .collect(),
            ProgramInterface::Subroutine(stage) => self
                .layout
                .subroutines
                .iter()
                .filter(|(s, _)| *s == stage)
                .map(|(_, name)| name.as_str())
                .collect(),
        }
    }

    fn block_members(&self, interface: ProgramInterface, index: u32) -> Vec<u32> {
        let blocks = match interface {
            ProgramInterface::UniformBlock => &self.layout.uniform_blocks,
            ProgramInterface::ShaderStorageBlock => &self.layout.storage_blocks,
            _ => return Vec::new(),
        };
        let Some(block) = blocks.get(index as usize) else {
            return Vec::new();
        };
        if !block.members.is_empty() || interface == ProgramInterface::ShaderStorageBlock {
            return block.members.clone();
        }
        self.layout
            .uniforms
            .iter()
            .enumerate()
            .filter(|(_, u)| u.block == Some(index))
            .map(|(i, _)| i as u32)
            .collect()
    }

    fn property(
        &self,
        interface: ProgramInterface,
        index: u32,
        property: ResourceProperty,
        out: &mut Vec<i32>,
    ) {
        let names = self.resource_names(interface);
        let Some(name) = names.get(index as usize) else {
            out.push(-1);
            return;
        };
        if property == ResourceProperty::NameLength {
            out.push(name.len() as i32 + 1);
            return;
        }

        match interface {
            ProgramInterface::Uniform => {
                let uniform = &self.layout.uniforms[index as usize];
                let value = match property {
                    ResourceProperty::BlockIndex => uniform.block.map_or(-1, |b| b as i32),
                    ResourceProperty::Location => {
                        self.locations[index as usize].map_or(-1, |l| l as i32)
                    }
                    ResourceProperty::Type => uniform.ty.to_raw() as i32,
                    ResourceProperty::ArraySize => uniform.array_size as i32,
                    ResourceProperty::ArrayStride => uniform.array_stride,
                    ResourceProperty::MatrixStride => uniform.matrix_stride,
                    _ => -1,
                };
                out.push(value);
            }
            ProgramInterface::UniformBlock | ProgramInterface::ShaderStorageBlock => {
                let blocks = if interface == ProgramInterface::UniformBlock {
                    &self.layout.uniform_blocks
                } else {
                    &self.layout.storage_blocks
                };
                let block = &blocks[index as usize];
                match property {
                    ResourceProperty::BufferDataSize => out.push(block.data_size as i32),
                    ResourceProperty::NumActiveVariables => {
                        out.push(self.block_members(interface, index).len() as i32)
                    }
                    ResourceProperty::ActiveVariables => out.extend(
                        self.block_members(interface, index)
                            .into_iter()
                            .map(|m| m as i32),
                    ),
                    _ => out.push(-1),
                }
            }
            ProgramInterface::Subroutine(_) => out.push(-1),
        }
    }
}

/// In-memory [`DeviceCommands`] implementation.
///
/// Every link snapshots the layout set with [`RecordingDevice::set_layout`],
/// so changing the layout and reloading a program simulates an edited shader.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    layout: ProgramLayout,
    next_name: u32,
    programs: HashMap<ProgramId, ProgramState>,
    shaders: HashMap<ShaderId, ShaderState>,
    current_program: Option<ProgramId>,
    fail_next_link: Option<String>,
    bind_state: BindState,
    commands: Vec<DeviceCommand>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device whose links produce `layout`.
    pub fn with_layout(layout: ProgramLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "Recording"
    }

    /// Replace the layout used by subsequent links.
    pub fn set_layout(&mut self, layout: ProgramLayout) {
        self.layout = layout;
    }

    /// Make the next link fail with `info_log`.
    pub fn fail_next_link(&mut self, info_log: impl Into<String>) {
        self.fail_next_link = Some(info_log.into());
    }

    /// Commands received so far, oldest first.
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Drain the command log.
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Current unit bindings.
    pub fn bind_state(&self) -> &BindState {
        &self.bind_state
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program
    }

    /// Number of program objects that have not been deleted.
    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    /// Number of shader objects that have not been deleted.
    pub fn live_shader_count(&self) -> usize {
        self.shaders.len()
    }

    pub fn program_label(&self, program: ProgramId) -> Option<&str> {
        self.programs.get(&program)?.label.as_deref()
    }

    /// Last value written to a default-block uniform.
    pub fn uniform_value(&self, program: ProgramId, location: u32) -> Option<&OwnedUniformValue> {
        self.programs.get(&program)?.uniform_values.get(&location)
    }

    /// Binding a uniform block was routed to.
    pub fn uniform_block_binding_of(&self, program: ProgramId, block_index: u32) -> Option<u32> {
        self.programs
            .get(&program)?
            .uniform_block_bindings
            .get(&block_index)
            .copied()
    }

    /// Binding a storage block was routed to.
    pub fn storage_block_binding_of(&self, program: ProgramId, block_index: u32) -> Option<u32> {
        self.programs
            .get(&program)?
            .storage_block_bindings
            .get(&block_index)
            .copied()
    }

    fn next_name(&mut self) -> u32 {
        self.next_name += 1;
        self.next_name
    }

    fn linked(&self, program: ProgramId) -> Option<&LinkedLayout> {
        self.programs.get(&program)?.linked.as_ref()
    }

    fn record(&mut self, command: DeviceCommand) {
        log::trace!("RecordingDevice: {:?}", command);
        self.commands.push(command);
    }
}

impl DeviceCommands for RecordingDevice {
    fn create_program(&mut self) -> ProgramId {
        let program = ProgramId(self.next_name());
        self.programs.insert(program, ProgramState::default());
        program
    }

    fn delete_program(&mut self, program: ProgramId) {
        if program.is_none() {
            return;
        }
        if self.programs.remove(&program).is_some() {
            if self.current_program == Some(program) {
                self.current_program = None;
            }
            self.record(DeviceCommand::DeleteProgram(program));
        }
    }

    fn is_program(&self, program: ProgramId) -> bool {
        self.programs.contains_key(&program)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program;
        self.record(DeviceCommand::UseProgram(program));
    }

    fn label_program(&mut self, program: ProgramId, label: Option<&str>) {
        if let Some(state) = self.programs.get_mut(&program) {
            state.label = label.map(str::to_owned);
        }
        self.record(DeviceCommand::LabelProgram {
            program,
            label: label.map(str::to_owned),
        });
    }

    fn create_shader(&mut self, stage: ShaderStage) -> ShaderId {
        let shader = ShaderId(self.next_name());
        self.shaders.insert(
            shader,
            ShaderState {
                stage,
                source: String::new(),
                compiled: false,
                info_log: String::new(),
            },
        );
        shader
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        if let Some(state) = self.shaders.get_mut(&shader) {
            state.source = source.to_owned();
        }
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        let Some(state) = self.shaders.get_mut(&shader) else {
            return;
        };
        // `#error` directives are the only way a simulated compile fails.
        let errors: Vec<String> = state
            .source
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let message = line.trim_start().strip_prefix("#error")?;
                Some(format!("0:{}: '#error' :{}\n", i + 1, message))
            })
            .collect();
        state.compiled = errors.is_empty();
        state.info_log = errors.concat();
        log::trace!(
            "RecordingDevice: compiled {} shader {:?} (ok: {})",
            state.stage,
            shader,
            state.compiled
        );
    }

    fn shader_compiled(&self, shader: ShaderId) -> bool {
        self.shaders.get(&shader).is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.shaders
            .get(&shader)
            .map(|s| s.info_log.clone())
            .unwrap_or_default()
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if let Some(state) = self.programs.get_mut(&program) {
            state.shaders.push(shader);
        }
    }

    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if let Some(state) = self.programs.get_mut(&program) {
            state.shaders.retain(|s| *s != shader);
        }
    }

    fn link_program(&mut self, program: ProgramId) {
        let forced_failure = self.fail_next_link.take();
        let all_compiled = self.programs.get(&program).is_some_and(|state| {
            !state.shaders.is_empty() && state.shaders.iter().all(|s| self.shader_compiled(*s))
        });
        let layout = self.layout.clone();
        let Some(state) = self.programs.get_mut(&program) else {
            return;
        };

        if let Some(info_log) = forced_failure {
            state.linked = None;
            state.info_log = info_log;
        } else if !all_compiled {
            state.linked = None;
            state.info_log = "error: attached shaders are missing or not compiled\n".to_owned();
        } else {
            state.linked = Some(LinkedLayout::resolve(layout));
            state.info_log.clear();
        }
    }

    fn program_linked(&self, program: ProgramId) -> bool {
        self.linked(program).is_some()
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.programs
            .get(&program)
            .map(|s| s.info_log.clone())
            .unwrap_or_default()
    }

    fn program_interface(
        &self,
        program: ProgramId,
        interface: ProgramInterface,
        property: InterfaceProperty,
    ) -> i32 {
        let Some(linked) = self.linked(program) else {
            return 0;
        };
        match property {
            InterfaceProperty::ActiveResources => linked.resource_names(interface).len() as i32,
            InterfaceProperty::MaxNameLength => linked
                .resource_names(interface)
                .iter()
                .map(|name| name.len() as i32 + 1)
                .max()
                .unwrap_or(0),
            InterfaceProperty::MaxNumActiveVariables => {
                if !interface.is_block() {
                    return 0;
                }
                let count = linked.resource_names(interface).len() as u32;
                (0..count)
                    .map(|i| linked.block_members(interface, i).len() as i32)
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    fn program_resource(
        &self,
        program: ProgramId,
        interface: ProgramInterface,
        index: u32,
        properties: &[ResourceProperty],
        values: &mut [i32],
    ) -> usize {
        let Some(linked) = self.linked(program) else {
            return 0;
        };
        let mut out = Vec::new();
        for property in properties {
            linked.property(interface, index, *property, &mut out);
        }
        let written = out.len().min(values.len());
        values[..written].copy_from_slice(&out[..written]);
        written
    }

    fn program_resource_name(
        &self,
        program: ProgramId,
        interface: ProgramInterface,
        index: u32,
        name: &mut [u8],
    ) -> usize {
        let Some(linked) = self.linked(program) else {
            return 0;
        };
        let names = linked.resource_names(interface);
        let Some(source) = names.get(index as usize) else {
            return 0;
        };
        if name.is_empty() {
            return 0;
        }
        let written = source.len().min(name.len() - 1);
        name[..written].copy_from_slice(&source.as_bytes()[..written]);
        name[written] = 0;
        written
    }

    fn uniform_block_binding(&mut self, program: ProgramId, block_index: u32, binding: u32) {
        if let Some(state) = self.programs.get_mut(&program) {
            state.uniform_block_bindings.insert(block_index, binding);
        }
        self.record(DeviceCommand::UniformBlockBinding {
            program,
            block_index,
            binding,
        });
    }

    fn storage_block_binding(&mut self, program: ProgramId, block_index: u32, binding: u32) {
        if let Some(state) = self.programs.get_mut(&program) {
            state.storage_block_bindings.insert(block_index, binding);
        }
        self.record(DeviceCommand::StorageBlockBinding {
            program,
            block_index,
            binding,
        });
    }

    fn program_uniform(&mut self, program: ProgramId, location: u32, value: UniformValue<'_>) {
        let value = value.to_owned_value();
        if let Some(state) = self.programs.get_mut(&program) {
            state.uniform_values.insert(location, value.clone());
        }
        self.record(DeviceCommand::ProgramUniform {
            program,
            location,
            value,
        });
    }

    fn bind_textures(&mut self, first: u32, textures: &[TextureId]) {
        for (unit, texture) in (first..).zip(textures) {
            self.bind_state.texture_units.insert(unit, *texture);
        }
        self.record(DeviceCommand::BindTextures {
            first,
            textures: textures.to_vec(),
        });
    }

    fn bind_samplers(&mut self, first: u32, samplers: &[SamplerId]) {
        for (unit, sampler) in (first..).zip(samplers) {
            self.bind_state.sampler_units.insert(unit, *sampler);
        }
        self.record(DeviceCommand::BindSamplers {
            first,
            samplers: samplers.to_vec(),
        });
    }

    fn bind_image_textures(&mut self, first: u32, textures: &[TextureId]) {
        for (unit, texture) in (first..).zip(textures) {
            self.bind_state.image_units.insert(unit, *texture);
        }
        self.record(DeviceCommand::BindImageTextures {
            first,
            textures: textures.to_vec(),
        });
    }

    fn bind_buffers_range(
        &mut self,
        target: BufferTarget,
        first: u32,
        buffers: &[BufferId],
        offsets: &[u64],
        sizes: &[u64],
    ) {
        assert!(
            buffers.len() == offsets.len() && buffers.len() == sizes.len(),
            "bind_buffers_range slices differ in length"
        );
        for (i, unit) in (first..).take(buffers.len()).enumerate() {
            self.bind_state
                .buffer_bindings
                .insert((target, unit), (buffers[i], offsets[i], sizes[i]));
        }
        self.record(DeviceCommand::BindBuffersRange {
            target,
            first,
            buffers: buffers.to_vec(),
            offsets: offsets.to_vec(),
            sizes: sizes.to_vec(),
        });
    }
}
