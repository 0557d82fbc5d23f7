//! Compiling shader sources and linking them into a program object.

use crate::device::{DeviceCommands, ProgramId, ShaderId, ShaderStage};
use crate::error::{ProgramError, ProgramResult};
use crate::program::ShaderSource;

/// Compile every source and link the results into a new program object.
///
/// On failure every object created along the way is deleted and the error
/// carries the driver's diagnostic. Compile diagnostics are followed by the
/// line-numbered source that failed.
pub fn compile_program<D>(
    device: &mut D,
    sources: &[ShaderSource],
    label: Option<&str>,
) -> ProgramResult<ProgramId>
where
    D: DeviceCommands + ?Sized,
{
    let staged = sources
        .iter()
        .map(|source| match source.stage {
            Some(stage) => Ok((stage, source)),
            None => Err(ProgramError::MissingStage(source.display_name())),
        })
        .collect::<ProgramResult<Vec<_>>>()?;

    let mut shaders = Vec::with_capacity(staged.len());
    for (stage, source) in staged {
        match compile_shader(device, stage, source) {
            Ok(shader) => shaders.push(shader),
            Err(err) => {
                for shader in shaders {
                    device.delete_shader(shader);
                }
                return Err(err);
            }
        }
    }

    let program = device.create_program();
    for &shader in &shaders {
        device.attach_shader(program, shader);
    }
    device.link_program(program);
    let linked = device.program_linked(program);

    for shader in shaders {
        device.detach_shader(program, shader);
        device.delete_shader(shader);
    }

    if !linked {
        let info_log = device.program_info_log(program);
        log::error!("Shader program failed to link:\n{}", info_log);
        device.delete_program(program);
        return Err(ProgramError::LinkFailed(info_log));
    }

    if label.is_some() {
        device.label_program(program, label);
    }
    Ok(program)
}

fn compile_shader<D>(device: &mut D, stage: ShaderStage, source: &ShaderSource) -> ProgramResult<ShaderId>
where
    D: DeviceCommands + ?Sized,
{
    let shader = device.create_shader(stage);
    device.shader_source(shader, &source.code);
    device.compile_shader(shader);
    if device.shader_compiled(shader) {
        return Ok(shader);
    }

    let log = format!(
        "{}\nShader source:\n{}",
        device.shader_info_log(shader).trim_end(),
        source.numbered_listing()
    );
    device.delete_shader(shader);
    log::error!("Failed to compile {} shader {}:\n{}", stage, source.display_name(), log);
    Err(ProgramError::CompileFailed {
        stage,
        label: source.display_name(),
        log,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RecordingDevice;

    #[test]
    fn test_compile_and_link() {
        let mut device = RecordingDevice::new();
        let program = compile_program(
            &mut device,
            &[ShaderSource::vertex("void main() {}"), ShaderSource::fragment("void main() {}")],
            Some("triangle"),
        )
        .unwrap();

        assert!(device.is_program(program));
        assert!(device.program_linked(program));
        assert_eq!(device.program_label(program), Some("triangle"));
        assert_eq!(device.live_shader_count(), 0);
    }

    #[test]
    fn test_compile_error_lists_source() {
        let mut device = RecordingDevice::new();
        let err = compile_program(
            &mut device,
            &[
                ShaderSource::vertex("void main() {}"),
                ShaderSource::fragment("#version 450\n#error broken\n").with_label("lit.frag"),
            ],
            None,
        )
        .unwrap_err();

        match err {
            ProgramError::CompileFailed { stage, label, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert_eq!(label, "lit.frag");
                assert!(log.starts_with("0:2: '#error' : broken\nShader source:\n"));
                assert!(log.ends_with("1\t#version 450\n2\t#error broken\n"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(device.live_shader_count(), 0);
        assert_eq!(device.live_program_count(), 0);
    }

    #[test]
    fn test_link_failure_deletes_program() {
        let mut device = RecordingDevice::new();
        device.fail_next_link("error: varying mismatch");
        let err = compile_program(&mut device, &[ShaderSource::compute("void main() {}")], None)
            .unwrap_err();
        assert_eq!(err, ProgramError::LinkFailed("error: varying mismatch".to_string()));
        assert_eq!(device.live_program_count(), 0);
        assert_eq!(device.live_shader_count(), 0);
    }

    #[test]
    fn test_missing_stage() {
        let mut device = RecordingDevice::new();
        let err = compile_program(
            &mut device,
            &[ShaderSource::unstaged("void main() {}").with_label("common.glsl")],
            None,
        )
        .unwrap_err();
        assert_eq!(err, ProgramError::MissingStage("common.glsl".to_string()));
        assert_eq!(device.live_shader_count(), 0);
    }
}
