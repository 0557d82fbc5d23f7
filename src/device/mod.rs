//! Device abstraction layer
//!
//! Provides the command interface every GPU context implements, the handle
//! and enum types it speaks in, and a recording implementation for tests.

pub mod recording;
pub mod traits;
pub mod types;

pub use recording::{
    BindState, BlockDecl, DeviceCommand, ProgramLayout, RecordingDevice, UniformDecl,
};
pub use traits::*;
pub use types::*;
