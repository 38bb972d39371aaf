//! Program container: kernels, staging buffers, runtime arguments.
//!
//! A `Program` is the mutable construction site a builder fills in. It owns
//! every instantiated kernel, every circular staging buffer, and the per-core
//! runtime-argument blocks. Once wrapped in a `CompiledProgram` the only
//! sanctioned mutation is address rebinding.

use std::collections::HashMap;

use smallvec::SmallVec;
use tessera_core::DataFormat;

use crate::core_range::{CoreCoord, CoreRangeSet};

/// Per-core ordered runtime-argument block.
///
/// Slot positions are a fixed contract between the builder and the kernel;
/// reserved slots are left at zero and never compacted.
pub type RuntimeArgs = SmallVec<[u32; 16]>;

/// Data-movement processor a kernel is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMovementProcessor {
    Riscv0,
    Riscv1,
}

/// NOC port a data-movement kernel issues transactions on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NocId {
    Noc0,
    Noc1,
}

/// Math fidelity the compute unit runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFidelity {
    LoFi,
    HiFi2,
    HiFi3,
    HiFi4,
}

/// Compile-time configuration for a reader or writer kernel.
#[derive(Debug, Clone)]
pub struct DataMovementConfig {
    pub processor: DataMovementProcessor,
    pub noc: NocId,
    pub compile_args: Vec<u32>,
}

/// Compile-time configuration for a compute kernel.
///
/// Everything here is fixed before core dispatch; nothing is reconfigurable
/// per invocation.
#[derive(Debug, Clone)]
pub struct ComputeConfig {
    pub compile_args: Vec<u32>,
    pub fidelity: MathFidelity,
    pub fp32_dest_acc: bool,
    pub math_approx: bool,
    /// Symbolic defines threaded into kernel compilation.
    pub defines: Vec<(&'static str, &'static str)>,
}

/// Opaque handle to a kernel instantiated in a `Program`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelHandle(usize);

#[derive(Debug, Clone)]
enum KernelConfig {
    DataMovement(DataMovementConfig),
    Compute(ComputeConfig),
}

#[derive(Debug, Clone)]
struct Kernel {
    source: &'static str,
    cores: CoreRangeSet,
    config: KernelConfig,
    runtime_args: HashMap<CoreCoord, RuntimeArgs>,
}

/// Fixed-capacity, double-buffered, core-local staging queue.
///
/// Each core in `cores` owns its own instance; these are software-managed
/// queues, never memory shared across cores. Capacity is at least two tiles
/// so one tile can be in flight while another is consumed.
#[derive(Debug, Clone)]
pub struct CircularBuffer {
    /// Logical stream index. Output operands start at index 16.
    pub index: u32,
    pub capacity_tiles: u32,
    pub total_bytes: u32,
    pub format: DataFormat,
    pub cores: CoreRangeSet,
}

/// All kernels, staging buffers, and runtime arguments for one build.
#[derive(Debug, Default)]
pub struct Program {
    kernels: Vec<Kernel>,
    circular_buffers: Vec<CircularBuffer>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate a reader or writer kernel over `cores`.
    pub fn create_data_movement_kernel(
        &mut self,
        source: &'static str,
        cores: CoreRangeSet,
        config: DataMovementConfig,
    ) -> KernelHandle {
        self.push_kernel(source, cores, KernelConfig::DataMovement(config))
    }

    /// Instantiate a compute kernel over `cores`.
    pub fn create_compute_kernel(
        &mut self,
        source: &'static str,
        cores: CoreRangeSet,
        config: ComputeConfig,
    ) -> KernelHandle {
        self.push_kernel(source, cores, KernelConfig::Compute(config))
    }

    fn push_kernel(
        &mut self,
        source: &'static str,
        cores: CoreRangeSet,
        config: KernelConfig,
    ) -> KernelHandle {
        tracing::debug!("kernel {} over {} cores", source, cores.num_cores());
        self.kernels.push(Kernel {
            source,
            cores,
            config,
            runtime_args: HashMap::new(),
        });
        KernelHandle(self.kernels.len() - 1)
    }

    /// Allocate one circular staging buffer per core in `cores`.
    ///
    /// `capacity_tiles` must be at least 2 (double buffering).
    pub fn add_circular_buffer(
        &mut self,
        index: u32,
        cores: CoreRangeSet,
        capacity_tiles: u32,
        format: DataFormat,
    ) -> &CircularBuffer {
        assert!(capacity_tiles >= 2, "staging buffers are double-buffered");
        let total_bytes = capacity_tiles * format.tile_size_bytes();
        self.circular_buffers.push(CircularBuffer {
            index,
            capacity_tiles,
            total_bytes,
            format,
            cores,
        });
        self.circular_buffers.last().unwrap()
    }

    /// Overwrite the runtime-argument block for `core` on `kernel`.
    pub fn set_runtime_args(&mut self, kernel: KernelHandle, core: CoreCoord, args: RuntimeArgs) {
        self.kernels[kernel.0].runtime_args.insert(core, args);
    }

    /// The runtime-argument block for `core`, if one was set.
    pub fn runtime_args(&self, kernel: KernelHandle, core: CoreCoord) -> Option<&RuntimeArgs> {
        self.kernels[kernel.0].runtime_args.get(&core)
    }

    /// Mutable access for in-place patching of address slots.
    pub fn runtime_args_mut(
        &mut self,
        kernel: KernelHandle,
        core: CoreCoord,
    ) -> Option<&mut RuntimeArgs> {
        self.kernels[kernel.0].runtime_args.get_mut(&core)
    }

    pub fn kernel_source(&self, kernel: KernelHandle) -> &'static str {
        self.kernels[kernel.0].source
    }

    pub fn kernel_cores(&self, kernel: KernelHandle) -> &CoreRangeSet {
        &self.kernels[kernel.0].cores
    }

    /// Compute config of a kernel, or None for data-movement kernels.
    pub fn compute_config(&self, kernel: KernelHandle) -> Option<&ComputeConfig> {
        match &self.kernels[kernel.0].config {
            KernelConfig::Compute(c) => Some(c),
            KernelConfig::DataMovement(_) => None,
        }
    }

    /// Data-movement config of a kernel, or None for compute kernels.
    pub fn data_movement_config(&self, kernel: KernelHandle) -> Option<&DataMovementConfig> {
        match &self.kernels[kernel.0].config {
            KernelConfig::DataMovement(c) => Some(c),
            KernelConfig::Compute(_) => None,
        }
    }

    pub fn num_kernels(&self) -> usize {
        self.kernels.len()
    }

    pub fn circular_buffers(&self) -> &[CircularBuffer] {
        &self.circular_buffers
    }
}
