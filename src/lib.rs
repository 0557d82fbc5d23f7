//! # Shader Bindings
//!
//! Introspection-driven resource binding for linked shader programs.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`ShaderProgram`] - Builds, links and reloads a program from [`ShaderSource`]s
//! - [`ResourceIntrospector`] - Reads a program's active uniforms, blocks and subroutines
//! - [`BindingAllocator`] - Assigns sequential sampler, image and block slots once per link
//! - [`BindingSpec`] - Immutable name to GPU object declarations, built with [`BindingSpecBuilder`]
//! - [`BindingApplier`] - Validates a spec and binds it with one batched command per category
//! - [`DeviceCommands`] - The GPU context interface, with [`RecordingDevice`] for testing
//!
//! ## Example
//!
//! ```ignore
//! use shader_bindings::{BindingSpec, ProgramConfig, ShaderProgram, ShaderSource};
//!
//! let mut program = ShaderProgram::build(
//!     &mut device,
//!     vec![ShaderSource::vertex(vs), ShaderSource::fragment(fs)],
//!     ProgramConfig::default().with_label("lit"),
//! )?;
//!
//! program.apply_binding_with(&mut device, |b| {
//!     b.sampler("albedo", albedo)?
//!         .buffer(BufferBinding::uniform("Camera", &camera_buffer))?;
//!     Ok(())
//! })?;
//! program.uniform1f(&mut device, "u_time", time)?;
//! ```

pub mod binding;
pub mod config;
pub mod device;
pub mod error;
pub mod program;
pub mod resources;

// Re-export main types for convenience
pub use binding::{
    BindingAllocator, BindingApplier, BindingKind, BindingPoint, BindingSpec, BindingSpecBuilder,
    Buffer, BufferBinding, BufferView, ImageBinding, SamplerBinding, SlotTables,
};
pub use config::{set_strict_checks, strict_checks, ProgramConfig};
pub use device::{
    BufferId, BufferTarget, DeviceCommands, ProgramId, RecordingDevice, SamplerId, ShaderId,
    ShaderStage, StageSet, TextureId,
};
pub use error::{BindingError, BindingResult, ProgramError, ProgramResult};
pub use program::{ProgramVariants, ShaderProgram, ShaderSource, UniformLocator};
pub use resources::{
    BlockEntry, GlslType, ProgramResources, ResourceEntry, ResourceIntrospector, ResourceTable,
    SubroutineEntry, UniformEntry,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version.
pub fn init() {
    log::info!("Shader Bindings v{} initialized (strict checks: {})", VERSION, strict_checks());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_recording_device() {
        let device = RecordingDevice::new();
        assert_eq!(device.name(), "Recording");
    }
}
