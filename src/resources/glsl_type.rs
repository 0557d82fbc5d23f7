//! GLSL data type classification.
//!
//! The device reports the type of every active uniform as a raw enumerant.
//! Binding only needs to know which of them are opaque samplers or images,
//! but the numeric shapes are kept so diagnostics and tooling can describe
//! a uniform without a driver round trip.

/// Scalar component kind of a numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Float,
    Double,
    Int,
    UInt,
    Bool,
}

/// Classified type of an active uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlslType {
    Scalar(ScalarKind),
    Vector { kind: ScalarKind, components: u8 },
    Matrix { kind: ScalarKind, columns: u8, rows: u8 },
    /// Opaque sampler type, carrying the raw enumerant.
    Sampler(u32),
    /// Opaque image type, carrying the raw enumerant.
    Image(u32),
    AtomicCounter,
    /// An enumerant this table does not know.
    Unknown(u32),
}

pub const FLOAT: u32 = 0x1406;
pub const FLOAT_VEC2: u32 = 0x8B50;
pub const FLOAT_VEC3: u32 = 0x8B51;
pub const FLOAT_VEC4: u32 = 0x8B52;
pub const INT: u32 = 0x1404;
pub const UNSIGNED_INT: u32 = 0x1405;
pub const FLOAT_MAT4: u32 = 0x8B5C;
pub const SAMPLER_2D: u32 = 0x8B5E;
pub const SAMPLER_CUBE: u32 = 0x8B60;
pub const SAMPLER_2D_SHADOW: u32 = 0x8B62;
pub const IMAGE_2D: u32 = 0x904D;
pub const IMAGE_3D: u32 = 0x904E;
pub const UNSIGNED_INT_IMAGE_2D: u32 = 0x9063;
pub const UNSIGNED_INT_ATOMIC_COUNTER: u32 = 0x92DB;

const fn scalar(kind: ScalarKind) -> GlslType {
    GlslType::Scalar(kind)
}

const fn vector(kind: ScalarKind, components: u8) -> GlslType {
    GlslType::Vector { kind, components }
}

const fn matrix(kind: ScalarKind, columns: u8, rows: u8) -> GlslType {
    GlslType::Matrix {
        kind,
        columns,
        rows,
    }
}

const NUMERIC_TYPES: &[(u32, GlslType)] = &[
    (FLOAT, scalar(ScalarKind::Float)),
    (FLOAT_VEC2, vector(ScalarKind::Float, 2)),
    (FLOAT_VEC3, vector(ScalarKind::Float, 3)),
    (FLOAT_VEC4, vector(ScalarKind::Float, 4)),
    (0x140A, scalar(ScalarKind::Double)),
    (0x8FFC, vector(ScalarKind::Double, 2)),
    (0x8FFD, vector(ScalarKind::Double, 3)),
    (0x8FFE, vector(ScalarKind::Double, 4)),
    (INT, scalar(ScalarKind::Int)),
    (0x8B53, vector(ScalarKind::Int, 2)),
    (0x8B54, vector(ScalarKind::Int, 3)),
    (0x8B55, vector(ScalarKind::Int, 4)),
    (UNSIGNED_INT, scalar(ScalarKind::UInt)),
    (0x8DC6, vector(ScalarKind::UInt, 2)),
    (0x8DC7, vector(ScalarKind::UInt, 3)),
    (0x8DC8, vector(ScalarKind::UInt, 4)),
    (0x8B56, scalar(ScalarKind::Bool)),
    (0x8B57, vector(ScalarKind::Bool, 2)),
    (0x8B58, vector(ScalarKind::Bool, 3)),
    (0x8B59, vector(ScalarKind::Bool, 4)),
    (0x8B5A, matrix(ScalarKind::Float, 2, 2)),
    (0x8B5B, matrix(ScalarKind::Float, 3, 3)),
    (FLOAT_MAT4, matrix(ScalarKind::Float, 4, 4)),
    (0x8B65, matrix(ScalarKind::Float, 2, 3)),
    (0x8B66, matrix(ScalarKind::Float, 2, 4)),
    (0x8B67, matrix(ScalarKind::Float, 3, 2)),
    (0x8B68, matrix(ScalarKind::Float, 3, 4)),
    (0x8B69, matrix(ScalarKind::Float, 4, 2)),
    (0x8B6A, matrix(ScalarKind::Float, 4, 3)),
    (0x8F46, matrix(ScalarKind::Double, 2, 2)),
    (0x8F47, matrix(ScalarKind::Double, 3, 3)),
    (0x8F48, matrix(ScalarKind::Double, 4, 4)),
    (0x8F49, matrix(ScalarKind::Double, 2, 3)),
    (0x8F4A, matrix(ScalarKind::Double, 2, 4)),
    (0x8F4B, matrix(ScalarKind::Double, 3, 2)),
    (0x8F4C, matrix(ScalarKind::Double, 3, 4)),
    (0x8F4D, matrix(ScalarKind::Double, 4, 2)),
    (0x8F4E, matrix(ScalarKind::Double, 4, 3)),
];

fn is_sampler_enum(raw: u32) -> bool {
    matches!(
        raw,
        // 1D..2D_RECT_SHADOW
        0x8B5D..=0x8B64
            // array, buffer and shadow variants, signed and unsigned samplers
            | 0x8DC0..=0x8DC5
            | 0x8DC9..=0x8DD8
            // cube map arrays
            | 0x900C..=0x900F
            // multisample
            | 0x9108..=0x910D
    )
}

fn is_image_enum(raw: u32) -> bool {
    (0x904C..=0x906C).contains(&raw)
}

impl GlslType {
    /// Classify a raw type enumerant reported by the device.
    pub fn from_raw(raw: u32) -> Self {
        if let Some((_, ty)) = NUMERIC_TYPES.iter().find(|(value, _)| *value == raw) {
            return *ty;
        }
        if is_sampler_enum(raw) {
            GlslType::Sampler(raw)
        } else if is_image_enum(raw) {
            GlslType::Image(raw)
        } else if raw == UNSIGNED_INT_ATOMIC_COUNTER {
            GlslType::AtomicCounter
        } else {
            GlslType::Unknown(raw)
        }
    }

    /// The raw enumerant for this type.
    pub fn to_raw(self) -> u32 {
        match self {
            GlslType::Sampler(raw) | GlslType::Image(raw) | GlslType::Unknown(raw) => raw,
            GlslType::AtomicCounter => UNSIGNED_INT_ATOMIC_COUNTER,
            numeric => NUMERIC_TYPES
                .iter()
                .find(|(_, ty)| *ty == numeric)
                .map(|(raw, _)| *raw)
                .unwrap_or(0),
        }
    }

    pub fn is_sampler(self) -> bool {
        matches!(self, GlslType::Sampler(_))
    }

    pub fn is_image(self) -> bool {
        matches!(self, GlslType::Image(_))
    }

    /// Samplers, images and atomic counters are handles rather than values.
    pub fn is_opaque(self) -> bool {
        matches!(
            self,
            GlslType::Sampler(_) | GlslType::Image(_) | GlslType::AtomicCounter
        )
    }
}

impl std::fmt::Display for GlslType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn prefix(kind: ScalarKind) -> &'static str {
            match kind {
                ScalarKind::Float => "",
                ScalarKind::Double => "d",
                ScalarKind::Int => "i",
                ScalarKind::UInt => "u",
                ScalarKind::Bool => "b",
            }
        }

        match *self {
            GlslType::Scalar(kind) => f.write_str(match kind {
                ScalarKind::Float => "float",
                ScalarKind::Double => "double",
                ScalarKind::Int => "int",
                ScalarKind::UInt => "uint",
                ScalarKind::Bool => "bool",
            }),
            GlslType::Vector { kind, components } => {
                write!(f, "{}vec{}", prefix(kind), components)
            }
            GlslType::Matrix {
                kind,
                columns,
                rows,
            } if columns == rows => write!(f, "{}mat{}", prefix(kind), columns),
            GlslType::Matrix {
                kind,
                columns,
                rows,
            } => write!(f, "{}mat{}x{}", prefix(kind), columns, rows),
            GlslType::Sampler(raw) => write!(f, "sampler(0x{raw:04X})"),
            GlslType::Image(raw) => write!(f, "image(0x{raw:04X})"),
            GlslType::AtomicCounter => f.write_str("atomic_uint"),
            GlslType::Unknown(raw) => write!(f, "unknown(0x{raw:04X})"),
        }
    }
}
