//! Typed setters for default-block uniforms.
//!
//! Every setter looks the name up through the program's [`UniformLocator`]
//! and writes the value directly to the program object, so the program
//! doesn't need to be current. A name the program doesn't have is an error
//! with strict checks and a dropped call without them.
//!
//! [`UniformLocator`]: crate::program::UniformLocator

use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};

use crate::device::{DeviceCommands, UniformValue};
use crate::error::ProgramResult;
use crate::program::ShaderProgram;

macro_rules! scalar_setters {
    ($variant:ident, $ty:ty, $(($name:ident, $vname:ident, $n:literal, [$($arg:ident),+])),+ $(,)?) => {
        $(
            #[doc = concat!("Set a `", stringify!($n), "`-component `", stringify!($ty), "` uniform.")]
            pub fn $name<D>(&mut self, device: &mut D, name: &str, $($arg: $ty),+) -> ProgramResult<()>
            where
                D: DeviceCommands + ?Sized,
            {
                self.write_uniform(device, name, UniformValue::$variant(&[$($arg),+], $n))
            }

            #[doc = concat!("Set an array of `", stringify!($n), "`-component `", stringify!($ty), "` uniforms.")]
            pub fn $vname<D>(&mut self, device: &mut D, name: &str, values: &[$ty]) -> ProgramResult<()>
            where
                D: DeviceCommands + ?Sized,
            {
                debug_assert_eq!(values.len() % $n, 0, "uniform array length is not a multiple of {}", $n);
                self.write_uniform(device, name, UniformValue::$variant(values, $n))
            }
        )+
    };
}

macro_rules! matrix_setters {
    ($(($name:ident, $columns:literal, $rows:literal)),+ $(,)?) => {
        $(
            #[doc = concat!("Set an array of ", stringify!($columns), "x", stringify!($rows), " float matrices.")]
            pub fn $name<D>(
                &mut self,
                device: &mut D,
                name: &str,
                transpose: bool,
                values: &[f32],
            ) -> ProgramResult<()>
            where
                D: DeviceCommands + ?Sized,
            {
                debug_assert_eq!(values.len() % ($columns * $rows), 0);
                self.write_uniform(
                    device,
                    name,
                    UniformValue::Matrix {
                        columns: $columns,
                        rows: $rows,
                        transpose,
                        data: values,
                    },
                )
            }
        )+
    };
}

impl ShaderProgram {
    fn write_uniform<D>(&mut self, device: &mut D, name: &str, value: UniformValue<'_>) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        let program = self.live_id()?;
        if let Some(location) = self.locator.resolve(name)? {
            device.program_uniform(program, location, value);
        }
        Ok(())
    }

    scalar_setters!(
        Int,
        i32,
        (uniform1i, uniform1iv, 1, [x]),
        (uniform2i, uniform2iv, 2, [x, y]),
        (uniform3i, uniform3iv, 3, [x, y, z]),
        (uniform4i, uniform4iv, 4, [x, y, z, w]),
    );

    scalar_setters!(
        UInt,
        u32,
        (uniform1ui, uniform1uiv, 1, [x]),
        (uniform2ui, uniform2uiv, 2, [x, y]),
        (uniform3ui, uniform3uiv, 3, [x, y, z]),
        (uniform4ui, uniform4uiv, 4, [x, y, z, w]),
    );

    scalar_setters!(
        Float,
        f32,
        (uniform1f, uniform1fv, 1, [x]),
        (uniform2f, uniform2fv, 2, [x, y]),
        (uniform3f, uniform3fv, 3, [x, y, z]),
        (uniform4f, uniform4fv, 4, [x, y, z, w]),
    );

    matrix_setters!(
        (uniform_matrix2fv, 2, 2),
        (uniform_matrix3fv, 3, 3),
        (uniform_matrix4fv, 4, 4),
        (uniform_matrix2x3fv, 2, 3),
        (uniform_matrix3x2fv, 3, 2),
        (uniform_matrix2x4fv, 2, 4),
        (uniform_matrix4x2fv, 4, 2),
        (uniform_matrix3x4fv, 3, 4),
        (uniform_matrix4x3fv, 4, 3),
    );

    /// Set a bindless texture or image handle.
    pub fn uniform_handle<D>(&mut self, device: &mut D, name: &str, handle: u64) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.write_uniform(device, name, UniformValue::Handle(&[handle]))
    }

    /// Set an array of bindless handles.
    pub fn uniform_handle_v<D>(&mut self, device: &mut D, name: &str, handles: &[u64]) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.write_uniform(device, name, UniformValue::Handle(handles))
    }

    // glam conveniences

    pub fn uniform_vec2<D>(&mut self, device: &mut D, name: &str, v: Vec2) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.uniform2fv(device, name, &v.to_array())
    }

    pub fn uniform_vec3<D>(&mut self, device: &mut D, name: &str, v: Vec3) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.uniform3fv(device, name, &v.to_array())
    }

    pub fn uniform_vec4<D>(&mut self, device: &mut D, name: &str, v: Vec4) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.uniform4fv(device, name, &v.to_array())
    }

    pub fn uniform_ivec2<D>(&mut self, device: &mut D, name: &str, v: IVec2) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.uniform2iv(device, name, &v.to_array())
    }

    pub fn uniform_ivec3<D>(&mut self, device: &mut D, name: &str, v: IVec3) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.uniform3iv(device, name, &v.to_array())
    }

    pub fn uniform_ivec4<D>(&mut self, device: &mut D, name: &str, v: IVec4) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.uniform4iv(device, name, &v.to_array())
    }

    pub fn uniform_uvec2<D>(&mut self, device: &mut D, name: &str, v: UVec2) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.uniform2uiv(device, name, &v.to_array())
    }

    pub fn uniform_uvec3<D>(&mut self, device: &mut D, name: &str, v: UVec3) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.uniform3uiv(device, name, &v.to_array())
    }

    pub fn uniform_uvec4<D>(&mut self, device: &mut D, name: &str, v: UVec4) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.uniform4uiv(device, name, &v.to_array())
    }

    pub fn uniform_mat2<D>(&mut self, device: &mut D, name: &str, m: Mat2) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.uniform_matrix2fv(device, name, false, &m.to_cols_array())
    }

    pub fn uniform_mat3<D>(&mut self, device: &mut D, name: &str, m: Mat3) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.uniform_matrix3fv(device, name, false, &m.to_cols_array())
    }

    pub fn uniform_mat4<D>(&mut self, device: &mut D, name: &str, m: Mat4) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.uniform_matrix4fv(device, name, false, &m.to_cols_array())
    }

    /// Set a `mat4[]` uniform from column-major glam matrices.
    pub fn uniform_mat4_array<D>(&mut self, device: &mut D, name: &str, matrices: &[Mat4]) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.uniform_matrix4fv(device, name, false, bytemuck::cast_slice(matrices))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ProgramConfig;
    use crate::device::{OwnedUniformValue, ProgramLayout, RecordingDevice, UniformDecl};
    use crate::error::ProgramError;
    use crate::program::{ShaderProgram, ShaderSource};
    use crate::resources::glsl_type::{FLOAT, FLOAT_MAT4, FLOAT_VEC3};
    use crate::resources::GlslType;
    use glam::{Mat4, Vec3};

    fn program(strict: bool) -> (RecordingDevice, ShaderProgram) {
        let layout = ProgramLayout::new()
            .with_uniform(UniformDecl::new("u_time", GlslType::from_raw(FLOAT)))
            .with_uniform(UniformDecl::new("u_light_dir", GlslType::from_raw(FLOAT_VEC3)))
            .with_uniform(UniformDecl::new("u_bones", GlslType::from_raw(FLOAT_MAT4)).with_array(2, 64));
        let mut device = RecordingDevice::with_layout(layout);
        let program = ShaderProgram::build(
            &mut device,
            vec![ShaderSource::vertex("void main() {}")],
            ProgramConfig::default().with_strict_checks(strict),
        )
        .unwrap();
        (device, program)
    }

    #[test]
    fn test_scalar_and_vector_setters() {
        let (mut device, mut program) = program(true);
        program.uniform1f(&mut device, "u_time", 2.5).unwrap();
        program
            .uniform_vec3(&mut device, "u_light_dir", Vec3::new(0.0, -1.0, 0.0))
            .unwrap();

        let id = program.id();
        let time = program.uniform_location("u_time").unwrap();
        let light = program.uniform_location("u_light_dir").unwrap();
        assert_eq!(
            device.uniform_value(id, time),
            Some(&OwnedUniformValue::Float(vec![2.5], 1))
        );
        assert_eq!(
            device.uniform_value(id, light),
            Some(&OwnedUniformValue::Float(vec![0.0, -1.0, 0.0], 3))
        );
    }

    #[test]
    fn test_matrix_array_setter() {
        let (mut device, mut program) = program(true);
        let bones = [Mat4::IDENTITY, Mat4::from_translation(Vec3::X)];
        program.uniform_mat4_array(&mut device, "u_bones", &bones).unwrap();

        let location = program.uniform_location("u_bones").unwrap();
        match device.uniform_value(program.id(), location) {
            Some(OwnedUniformValue::Matrix {
                columns: 4,
                rows: 4,
                transpose: false,
                data,
            }) => {
                assert_eq!(data.len(), 32);
                assert_eq!(data[28], 1.0);
            }
            other => panic!("unexpected uniform value: {other:?}"),
        }
    }

    #[test]
    fn test_strict_miss() {
        let (mut device, mut program) = program(true);
        assert_eq!(
            program.uniform1i(&mut device, "u_missing", 1),
            Err(ProgramError::UniformNotFound("u_missing".to_string()))
        );
    }

    #[test]
    fn test_lenient_miss_drops_call() {
        let (mut device, mut program) = program(false);
        device.take_commands();
        program.uniform4f(&mut device, "u_missing", 1.0, 0.0, 0.0, 1.0).unwrap();
        program.uniform_handle(&mut device, "u_missing_handle", 0xdead_beef).unwrap();
        assert!(device.commands().is_empty());
    }

    #[test]
    fn test_destroyed_program_rejects_setters() {
        let (mut device, mut program) = program(false);
        program.destroy(&mut device);
        assert_eq!(
            program.uniform1f(&mut device, "u_time", 0.0),
            Err(ProgramError::Destroyed)
        );
    }
}
