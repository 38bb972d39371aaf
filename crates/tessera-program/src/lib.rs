//! # tessera-program
//!
//! Maps tiled tensor computations onto the device's 2D core grid.
//!
//! The pipeline: tile geometry (from `tessera-core`) feeds
//! [`work_split::split_work_to_cores`], which produces a static, disjoint,
//! load-balanced [`work_split::WorkPartition`]. A builder such as
//! [`bcast::bcast_multi_core_hw`] then assembles a [`program::Program`]
//! (kernels, staging buffers, per-core runtime arguments) and wraps it in a
//! [`bcast::CompiledProgram`] whose buffer addresses can be rebound without
//! re-partitioning or re-assembly.

pub mod bcast;
pub mod core_range;
pub mod program;
pub mod registry;
pub mod work_split;

pub use bcast::{bcast_multi_core_hw, CompiledProgram};
pub use core_range::{CoreCoord, CoreRange, CoreRangeSet};
pub use program::{
    CircularBuffer, ComputeConfig, DataMovementConfig, DataMovementProcessor, KernelHandle,
    MathFidelity, NocId, Program, RuntimeArgs,
};
pub use registry::{BcastDim, BcastOp, ParallelizationStrategy};
pub use work_split::{split_work_to_cores, WorkPartition};
