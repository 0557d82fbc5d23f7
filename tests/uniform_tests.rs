//! Integration tests for direct uniform setters and program variants.

mod common;

use rstest::rstest;

use common::{forward_layout, init_logging, trivial_sources};
use shader_bindings::device::{DeviceCommand, OwnedUniformValue};
use shader_bindings::{
    ProgramConfig, ProgramError, ProgramVariants, RecordingDevice, ShaderProgram, ShaderSource,
};

fn build(strict: bool) -> (RecordingDevice, ShaderProgram) {
    init_logging();
    let mut device = RecordingDevice::with_layout(forward_layout());
    let program = ShaderProgram::build(
        &mut device,
        trivial_sources(),
        ProgramConfig::default().with_strict_checks(strict),
    )
    .unwrap();
    device.take_commands();
    (device, program)
}

#[rstest]
#[case::strict(true)]
#[case::lenient(false)]
fn test_existing_uniform_written(#[case] strict: bool) {
    let (mut device, mut program) = build(strict);
    program.uniform1f(&mut device, "u_time", 0.5).unwrap();

    let location = program.uniform_location("u_time").unwrap();
    assert_eq!(
        device.take_commands(),
        vec![DeviceCommand::ProgramUniform {
            program: program.id(),
            location,
            value: OwnedUniformValue::Float(vec![0.5], 1),
        }]
    );
}

#[rstest]
#[case::strict(true)]
#[case::lenient(false)]
fn test_missing_uniform(#[case] strict: bool) {
    let (mut device, mut program) = build(strict);
    let result = program.uniform3f(&mut device, "u_missing", 1.0, 2.0, 3.0);
    if strict {
        assert_eq!(result, Err(ProgramError::UniformNotFound("u_missing".to_string())));
    } else {
        assert_eq!(result, Ok(()));
    }
    assert!(device.commands().is_empty());
}

#[test]
fn test_block_members_have_no_location() {
    let (mut device, mut program) = build(true);
    assert_eq!(program.uniform_location("view"), None);
    assert!(program.uniform_matrix4fv(&mut device, "view", false, &[0.0; 16]).is_err());
}

#[test]
fn test_sampler_uniform_holds_its_slot() {
    let (device, mut program) = build(true);
    let location = program.uniform_location("shadow_map").unwrap();
    assert_eq!(
        device.uniform_value(program.id(), location),
        Some(&OwnedUniformValue::Int(vec![1], 1))
    );
}

#[test]
fn test_variants_share_device() {
    init_logging();
    let mut device = RecordingDevice::with_layout(forward_layout());
    let mut variants = ProgramVariants::new(|samples: &u32| {
        (
            vec![
                ShaderSource::vertex("void main() {}"),
                ShaderSource::fragment(format!("#define SAMPLES {samples}\nvoid main() {{}}")),
            ],
            ProgramConfig::default().with_strict_checks(true),
        )
    });

    for samples in [1u32, 4, 4, 8] {
        let program = variants.get_or_build(&mut device, &samples).unwrap();
        program.uniform1f(&mut device, "u_time", samples as f32).unwrap();
    }
    assert_eq!(variants.len(), 3);

    variants.reload_all(&mut device).unwrap();
    assert_eq!(device.live_program_count(), 3);

    variants.destroy_all(&mut device);
    assert_eq!(device.live_program_count(), 0);
}
