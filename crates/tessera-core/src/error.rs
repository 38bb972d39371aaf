//! Build-time error taxonomy.
//!
//! Every variant is fatal to the build call that raised it: no partial
//! program is ever returned and nothing is retried internally. Retry policy,
//! if any, belongs to the caller.

/// Broad classification of a build failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller passed shapes or mode selectors the builder does not
    /// support.
    Configuration,
    /// A required device resource is missing, or an internal partition
    /// invariant was violated.
    Allocation,
    /// A derived quantity does not fit the runtime-argument encoding.
    ResourceExhaustion,
}

/// Errors raised while building a program.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{dim} size {size} is not a multiple of tile size {tile}")]
    MisalignedShape {
        dim: &'static str,
        size: u32,
        tile: u32,
    },

    #[error("unsupported broadcast dimension: {0}")]
    UnsupportedBcastDim(String),

    #[error("shape has no tiles to schedule")]
    EmptyWork,

    #[error("core grid {x}x{y} has no cores")]
    EmptyGrid { x: u32, y: u32 },

    #[error("{operand} buffer is not allocated on device")]
    UnboundBuffer { operand: &'static str },

    #[error("core ({x},{y}) is not covered by any partition group")]
    CoreOutsidePartition { x: u32, y: u32 },

    #[error("tile count {0} exceeds the 32-bit runtime-argument range")]
    TileCountOverflow(u64),
}

impl BuildError {
    /// Map this error onto the coarse taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::MisalignedShape { .. }
            | BuildError::UnsupportedBcastDim(_)
            | BuildError::EmptyWork
            | BuildError::EmptyGrid { .. } => ErrorKind::Configuration,
            BuildError::UnboundBuffer { .. } | BuildError::CoreOutsidePartition { .. } => {
                ErrorKind::Allocation
            }
            BuildError::TileCountOverflow(_) => ErrorKind::ResourceExhaustion,
        }
    }
}
