//! Common types shared between the program layer and device implementations

use bitflags::bitflags;

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u32);

        impl $name {
            /// The reserved "no object" name.
            pub const NONE: Self = Self(0);

            /// Raw driver name of the object.
            pub fn raw(self) -> u32 {
                self.0
            }

            /// Whether this is the reserved zero name.
            pub fn is_none(self) -> bool {
                self.0 == 0
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

object_id!(
    /// Handle to a linked program object
    ProgramId
);
object_id!(
    /// Handle to a shader object
    ShaderId
);
object_id!(
    /// Handle to a texture object
    TextureId
);
object_id!(
    /// Handle to a sampler-state object
    SamplerId
);
object_id!(
    /// Handle to a buffer object
    BufferId
);

/// Shader stage of a single source unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 6] = [
        ShaderStage::Vertex,
        ShaderStage::TessControl,
        ShaderStage::TessEvaluation,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
        ShaderStage::Compute,
    ];

    /// The single-bit flag for this stage.
    pub fn flag(self) -> StageSet {
        match self {
            ShaderStage::Vertex => StageSet::VERTEX,
            ShaderStage::TessControl => StageSet::TESS_CONTROL,
            ShaderStage::TessEvaluation => StageSet::TESS_EVALUATION,
            ShaderStage::Geometry => StageSet::GEOMETRY,
            ShaderStage::Fragment => StageSet::FRAGMENT,
            ShaderStage::Compute => StageSet::COMPUTE,
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::TessControl => "tessellation control",
            ShaderStage::TessEvaluation => "tessellation evaluation",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Set of shader stages present in a program.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StageSet: u32 {
        const VERTEX = 1 << 0;
        const TESS_CONTROL = 1 << 1;
        const TESS_EVALUATION = 1 << 2;
        const GEOMETRY = 1 << 3;
        const FRAGMENT = 1 << 4;
        const COMPUTE = 1 << 5;
    }
}

impl StageSet {
    /// Iterate the stages in this set in pipeline order.
    pub fn stages(self) -> impl Iterator<Item = ShaderStage> {
        ShaderStage::ALL
            .into_iter()
            .filter(move |stage| self.contains(stage.flag()))
    }
}

/// Indexed buffer binding target a shader block reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BufferTarget {
    Uniform,
    ShaderStorage,
}

impl BufferTarget {
    pub const ALL: [BufferTarget; 2] = [BufferTarget::Uniform, BufferTarget::ShaderStorage];
}

impl std::fmt::Display for BufferTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferTarget::Uniform => f.write_str("uniform"),
            BufferTarget::ShaderStorage => f.write_str("shader storage"),
        }
    }
}

/// Program interface that can be enumerated for active resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramInterface {
    Uniform,
    UniformBlock,
    ShaderStorageBlock,
    Subroutine(ShaderStage),
}

impl ProgramInterface {
    /// Block interfaces report `BufferDataSize` and `ActiveVariables`.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            ProgramInterface::UniformBlock | ProgramInterface::ShaderStorageBlock
        )
    }
}

/// Whole-interface queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceProperty {
    /// Number of active resources in the interface.
    ActiveResources,
    /// Longest name in the interface, terminator included.
    MaxNameLength,
    /// Largest member count of any block in the interface.
    MaxNumActiveVariables,
}

/// Per-resource integer properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceProperty {
    /// Length of the resource name, terminator included.
    NameLength,
    BlockIndex,
    Location,
    Type,
    ArraySize,
    ArrayStride,
    MatrixStride,
    BufferDataSize,
    NumActiveVariables,
    /// Array-valued: the member variable indices of a block.
    ActiveVariables,
}

/// A value written through a direct (non-block) uniform setter.
///
/// The vector forms carry the component count per element; the number of
/// array elements is the slice length divided by the component count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a> {
    Int(&'a [i32], u8),
    UInt(&'a [u32], u8),
    Float(&'a [f32], u8),
    Matrix {
        columns: u8,
        rows: u8,
        transpose: bool,
        data: &'a [f32],
    },
    Handle(&'a [u64]),
}

impl UniformValue<'_> {
    /// Number of array elements written by this value.
    pub fn count(&self) -> usize {
        match *self {
            UniformValue::Int(data, n) => data.len() / n as usize,
            UniformValue::UInt(data, n) => data.len() / n as usize,
            UniformValue::Float(data, n) => data.len() / n as usize,
            UniformValue::Matrix {
                columns,
                rows,
                data,
                ..
            } => data.len() / (columns as usize * rows as usize),
            UniformValue::Handle(data) => data.len(),
        }
    }

    /// Copy into an owned form, used by recording implementations.
    pub fn to_owned_value(&self) -> OwnedUniformValue {
        match *self {
            UniformValue::Int(data, n) => OwnedUniformValue::Int(data.to_vec(), n),
            UniformValue::UInt(data, n) => OwnedUniformValue::UInt(data.to_vec(), n),
            UniformValue::Float(data, n) => OwnedUniformValue::Float(data.to_vec(), n),
            UniformValue::Matrix {
                columns,
                rows,
                transpose,
                data,
            } => OwnedUniformValue::Matrix {
                columns,
                rows,
                transpose,
                data: data.to_vec(),
            },
            UniformValue::Handle(data) => OwnedUniformValue::Handle(data.to_vec()),
        }
    }
}

/// Owned counterpart of [`UniformValue`]
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedUniformValue {
    Int(Vec<i32>, u8),
    UInt(Vec<u32>, u8),
    Float(Vec<f32>, u8),
    Matrix {
        columns: u8,
        rows: u8,
        transpose: bool,
        data: Vec<f32>,
    },
    Handle(Vec<u64>),
}
