//! Common utilities for binding integration tests.
//!
//! Every test runs against the recording device; the layouts below stand in
//! for the active resources a driver would report after linking.

#![allow(dead_code)]

use shader_bindings::device::{BlockDecl, ProgramLayout, UniformDecl};
use shader_bindings::resources::glsl_type::{
    FLOAT, FLOAT_MAT4, IMAGE_2D, SAMPLER_2D, SAMPLER_2D_SHADOW, SAMPLER_CUBE,
};
use shader_bindings::{
    DeviceCommands, GlslType, ProgramConfig, RecordingDevice, ShaderProgram, ShaderSource,
};

/// Install a test logger once per process.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Layouts
// ============================================================================

/// Two samplers in the default block.
pub fn two_sampler_layout() -> ProgramLayout {
    ProgramLayout::new()
        .with_sampler("tex0", SAMPLER_2D)
        .with_sampler("tex1", SAMPLER_CUBE)
}

/// A forward lighting program: samplers, a storage image, two uniform
/// blocks and a storage block, plus a few plain uniforms.
pub fn forward_layout() -> ProgramLayout {
    ProgramLayout::new()
        .with_uniform(UniformDecl::new("u_time", GlslType::from_raw(FLOAT)))
        .with_sampler("albedo", SAMPLER_2D)
        .with_uniform(UniformDecl::new("view", GlslType::from_raw(FLOAT_MAT4)).in_block(0))
        .with_uniform(UniformDecl::new("proj", GlslType::from_raw(FLOAT_MAT4)).in_block(0))
        .with_sampler("shadow_map", SAMPLER_2D_SHADOW)
        .with_image("light_grid", IMAGE_2D)
        .with_uniform_block(BlockDecl::new("Matrices", 128))
        .with_uniform_block(BlockDecl::new("Lights", 64))
        .with_storage_block(BlockDecl::new("Particles", 0))
}

/// Sources that compile on the recording device.
pub fn trivial_sources() -> Vec<ShaderSource> {
    vec![
        ShaderSource::vertex("#version 450\nvoid main() {}\n"),
        ShaderSource::fragment("#version 450\nvoid main() {}\n"),
    ]
}

// ============================================================================
// Test Context
// ============================================================================

/// A recording device with one program built from a layout.
pub struct TestContext {
    pub device: RecordingDevice,
    pub program: ShaderProgram,
}

impl TestContext {
    pub fn new(layout: ProgramLayout) -> Self {
        init_logging();
        let mut device = RecordingDevice::with_layout(layout);
        let program = ShaderProgram::build(
            &mut device,
            trivial_sources(),
            ProgramConfig::default().with_strict_checks(true),
        )
        .expect("trivial sources should build");
        // Allocation commands are not part of what the tests inspect.
        device.take_commands();
        Self { device, program }
    }

    /// Batched bind commands issued since the last call.
    pub fn take_batched_binds(&mut self) -> usize {
        self.device
            .take_commands()
            .iter()
            .filter(|command| command.is_batched_bind())
            .count()
    }

    pub fn is_live(&self) -> bool {
        self.device.is_program(self.program.id())
    }
}
