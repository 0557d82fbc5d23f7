//! Device command interface
//!
//! The binding layer never talks to a driver directly. Every query and
//! command goes through [`DeviceCommands`], which is threaded explicitly
//! through build, introspection, allocation and apply calls. Implementations
//! are bound to the thread that owns the GPU context.

use crate::device::types::*;

/// Commands and queries the binding layer issues against a GPU context.
///
/// The surface mirrors a program-introspection capable driver: shader and
/// program objects, active-resource queries, block binding reconciliation,
/// direct uniform writes and multi-bind commands that set a contiguous range
/// of units with one call.
pub trait DeviceCommands {
    // Program objects

    /// Create an empty program object.
    fn create_program(&mut self) -> ProgramId;

    /// Delete a program object. Deleting [`ProgramId::NONE`] is a no-op.
    fn delete_program(&mut self, program: ProgramId);

    /// Whether `program` names a live program object.
    fn is_program(&self, program: ProgramId) -> bool;

    /// Make `program` current, or clear the current program with `None`.
    fn use_program(&mut self, program: Option<ProgramId>);

    /// Attach or clear (`None`) a debug label on a program object.
    fn label_program(&mut self, program: ProgramId, label: Option<&str>);

    // Shader objects

    /// Create an empty shader object for one stage.
    fn create_shader(&mut self, stage: ShaderStage) -> ShaderId;

    /// Delete a shader object.
    fn delete_shader(&mut self, shader: ShaderId);

    /// Replace the source text of a shader object.
    fn shader_source(&mut self, shader: ShaderId, source: &str);

    /// Compile the current source of a shader object.
    fn compile_shader(&mut self, shader: ShaderId);

    /// Compile status of the last compilation.
    fn shader_compiled(&self, shader: ShaderId) -> bool;

    /// Info log of the last compilation.
    fn shader_info_log(&self, shader: ShaderId) -> String;

    /// Attach a compiled shader to a program.
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId);

    /// Detach a shader from a program.
    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId);

    /// Link all attached shaders.
    fn link_program(&mut self, program: ProgramId);

    /// Link status of the last link.
    fn program_linked(&self, program: ProgramId) -> bool;

    /// Info log of the last link.
    fn program_info_log(&self, program: ProgramId) -> String;

    // Introspection

    /// Query a whole-interface property.
    fn program_interface(
        &self,
        program: ProgramId,
        interface: ProgramInterface,
        property: InterfaceProperty,
    ) -> i32;

    /// Query integer properties of one active resource.
    ///
    /// Values are written to `values` in the order of `properties`; an
    /// array-valued property expands to as many values as it has. Returns the
    /// number of values written, never more than `values.len()`.
    fn program_resource(
        &self,
        program: ProgramId,
        interface: ProgramInterface,
        index: u32,
        properties: &[ResourceProperty],
        values: &mut [i32],
    ) -> usize;

    /// Copy the name of one active resource into `name`.
    ///
    /// At most `name.len()` bytes are written, a terminating NUL included
    /// when it fits. Returns the number of bytes written excluding the NUL.
    fn program_resource_name(
        &self,
        program: ProgramId,
        interface: ProgramInterface,
        index: u32,
        name: &mut [u8],
    ) -> usize;

    // Binding reconciliation

    /// Route uniform block `block_index` to indexed binding `binding`.
    fn uniform_block_binding(&mut self, program: ProgramId, block_index: u32, binding: u32);

    /// Route storage block `block_index` to indexed binding `binding`.
    fn storage_block_binding(&mut self, program: ProgramId, block_index: u32, binding: u32);

    /// Write a default-block uniform of `program` at `location`.
    fn program_uniform(&mut self, program: ProgramId, location: u32, value: UniformValue<'_>);

    // Batched binds

    /// Bind `textures` to texture units `first..first + textures.len()`.
    fn bind_textures(&mut self, first: u32, textures: &[TextureId]);

    /// Bind `samplers` to texture units `first..first + samplers.len()`.
    fn bind_samplers(&mut self, first: u32, samplers: &[SamplerId]);

    /// Bind `textures` to image units `first..first + textures.len()`.
    fn bind_image_textures(&mut self, first: u32, textures: &[TextureId]);

    /// Bind buffer ranges to indexed bindings of `target`.
    ///
    /// The three slices have equal length.
    fn bind_buffers_range(
        &mut self,
        target: BufferTarget,
        first: u32,
        buffers: &[BufferId],
        offsets: &[u64],
        sizes: &[u64],
    );
}
