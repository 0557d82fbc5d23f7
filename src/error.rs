//! Error types for program building and binding application.

use thiserror::Error;

use crate::binding::BindingKind;
use crate::device::{BufferTarget, ShaderStage};

/// Errors raised while building, reloading or driving a shader program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    #[error("Shader stage is not specified for {0}")]
    MissingStage(String),
    #[error("Failed to compile {stage} shader {label}:\n{log}")]
    CompileFailed {
        stage: ShaderStage,
        label: String,
        /// Info log followed by the line-numbered source.
        log: String,
    },
    #[error("Shader program failed to link:\n{0}")]
    LinkFailed(String),
    #[error("Uniform not found: {0}")]
    UniformNotFound(String),
    #[error("Shader program has been destroyed")]
    Destroyed,
}

pub type ProgramResult<T> = Result<T, ProgramError>;

/// Errors raised while declaring or applying a binding specification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("Duplicated {kind} name: {name}, existing: {existing}, new: {new}")]
    Duplicate {
        kind: BindingKind,
        name: String,
        existing: String,
        new: String,
    },
    #[error("Missing binding for {kind}: {name}")]
    MissingBinding { kind: BindingKind, name: String },
    #[error("Missing bindings for target: {0}")]
    MissingTarget(BufferTarget),
    #[error("Buffer bound to {target} buffer block {name} is not created")]
    BufferNotCreated { target: BufferTarget, name: String },
    #[error("Buffer bound to {target} buffer block {name} is not allocated")]
    BufferNotAllocated { target: BufferTarget, name: String },
    #[error(
        "Offset {offset} of {target} buffer block {name} is outside the buffer (size {buffer_size})"
    )]
    OffsetOutOfRange {
        target: BufferTarget,
        name: String,
        offset: u64,
        buffer_size: u64,
    },
    #[error(
        "Range {offset}..{offset}+{size} of {target} buffer block {name} exceeds the buffer (size {buffer_size})"
    )]
    RangeOutOfBounds {
        target: BufferTarget,
        name: String,
        offset: u64,
        size: u64,
        buffer_size: u64,
    },
    #[error("Empty range at offset {offset} bound to {target} buffer block {name}")]
    EmptyRange {
        target: BufferTarget,
        name: String,
        offset: u64,
    },
    #[error(
        "Range {offset}..{end} of {target} buffer block {name} exceeds its enclosing view (end {view_end})"
    )]
    ExceedsView {
        target: BufferTarget,
        name: String,
        offset: u64,
        end: u64,
        view_end: u64,
    },
}

pub type BindingResult<T> = Result<T, BindingError>;
