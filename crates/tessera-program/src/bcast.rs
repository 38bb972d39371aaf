//! Multi-core tiled broadcast program builder (HW reduction).
//!
//! Builds a program that applies `output = a <op> bcast(b)` tile by tile,
//! where `b` collapses to one tile per NC-slice. Each active core runs an
//! independent reader / compute / writer trio; the reader and compute units
//! hand tiles through double-buffered staging queues, as do compute and
//! writer. Cores share nothing: the static work partition is the only
//! cross-core contract.

use smallvec::smallvec;
use tessera_core::{Buffer, BuildError, CoreGrid, Device, Result, Tensor, TileGeometry};

use crate::core_range::CoreCoord;
use crate::program::{
    ComputeConfig, DataMovementConfig, DataMovementProcessor, KernelHandle, MathFidelity, NocId,
    Program,
};
use crate::registry::{self, BcastDim, BcastOp, ParallelizationStrategy};
use crate::work_split::split_work_to_cores;

/// Staging stream indices. Output operands start at index 16.
const CB_IN_A: u32 = 0;
const CB_IN_B: u32 = 1;
const CB_OUT: u32 = 16;

/// Tiles held per staging queue: one in flight, one being consumed.
const STAGING_CAPACITY_TILES: u32 = 2;

/// Reader runtime-arg slots patched on rebind.
const READER_ARG_SRC_A: usize = 0;
const READER_ARG_SRC_B: usize = 4;
/// Writer runtime-arg slot patched on rebind.
const WRITER_ARG_DST: usize = 0;

/// A fully assembled broadcast program.
///
/// Owns the kernels, staging buffers, and per-core runtime arguments for one
/// work partition. The partition and kernel layout are immutable; only
/// [`CompiledProgram::rebind`] may touch the argument blocks, and it patches
/// address slots alone. Rebinding must not race an in-flight execution;
/// sequencing that exclusion is the dispatch queue's job, which is why the
/// method takes `&mut self`.
#[derive(Debug)]
pub struct CompiledProgram {
    program: Program,
    reader: KernelHandle,
    writer: KernelHandle,
    wide_compute: KernelHandle,
    narrow_compute: Option<KernelHandle>,
    num_cores: u32,
    grid: CoreGrid,
}

impl CompiledProgram {
    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn reader(&self) -> KernelHandle {
        self.reader
    }

    pub fn writer(&self) -> KernelHandle {
        self.writer
    }

    pub fn wide_compute(&self) -> KernelHandle {
        self.wide_compute
    }

    pub fn narrow_compute(&self) -> Option<KernelHandle> {
        self.narrow_compute
    }

    /// Active cores this program dispatches to.
    pub fn num_cores(&self) -> u32 {
        self.num_cores
    }

    /// Point the program at new physical buffers.
    ///
    /// Rewrites only the address-bearing slots (reader slots 0 and 4, writer
    /// slot 0) for every active core. Everything else in the argument blocks
    /// encodes the immutable work partition and stays untouched, so a
    /// program built once can be replayed against reallocated tensors
    /// without re-partitioning or re-assembly.
    pub fn rebind(&mut self, a: &Buffer, b: &Buffer, output: &Buffer) -> Result<()> {
        for i in 0..self.num_cores {
            let core = CoreCoord::from_index(i, self.grid);

            let args = self
                .program
                .runtime_args_mut(self.reader, core)
                .ok_or(BuildError::CoreOutsidePartition {
                    x: core.x,
                    y: core.y,
                })?;
            args[READER_ARG_SRC_A] = a.address();
            args[READER_ARG_SRC_B] = b.address();

            let args = self
                .program
                .runtime_args_mut(self.writer, core)
                .ok_or(BuildError::CoreOutsidePartition {
                    x: core.x,
                    y: core.y,
                })?;
            args[WRITER_ARG_DST] = output.address();
        }
        tracing::debug!(
            "rebound {} cores: a={:#x} b={:#x} out={:#x}",
            self.num_cores,
            a.address(),
            b.address(),
            output.address(),
        );
        Ok(())
    }
}

/// Build a broadcast program parallelized over the full grid.
///
/// `a` is the primary operand, `b` the broadcast operand, `output` a
/// pre-allocated destination of `a`'s shape. Only [`BcastDim::Hw`] is
/// supported by this builder. All failures are fatal and leave nothing
/// behind: shapes are validated before any kernel or staging buffer exists.
pub fn bcast_multi_core_hw(
    device: &Device,
    a: &Tensor,
    b: &Tensor,
    output: &Tensor,
    op: BcastOp,
    dim: BcastDim,
) -> Result<CompiledProgram> {
    if dim != BcastDim::Hw {
        return Err(BuildError::UnsupportedBcastDim(dim.to_string()));
    }

    let a_shape = a.shape();
    let b_shape = b.shape();
    let geometry = TileGeometry::resolve(&a_shape)?;
    let b_geometry = TileGeometry::resolve(&b_shape)?;

    // The reader walks b's tiles once per NC-slice of a, wrapping at each
    // slice boundary, so its b-tile budget scales with a's NC.
    let num_b_tiles = u64::from(a_shape.nc()) * u64::from(b_geometry.tiles_per_slice());
    if num_b_tiles > u64::from(u32::MAX) {
        return Err(BuildError::TileCountOverflow(num_b_tiles));
    }
    let num_b_tiles = num_b_tiles as u32;
    let b_unit_nc = u32::from(b_shape.has_unit_leading_dims());

    let a_buffer = a.buffer_or_err("input a")?;
    let b_buffer = b.buffer_or_err("input b")?;
    let out_buffer = output.buffer_or_err("output")?;

    let format = a.format();
    let grid = device.compute_grid();
    let partition = split_work_to_cores(grid, geometry.num_tiles)?;

    let mut program = Program::new();

    // Staging queues over every active core, one per logical stream.
    program.add_circular_buffer(CB_IN_A, partition.all_cores.clone(), STAGING_CAPACITY_TILES, format);
    program.add_circular_buffer(CB_IN_B, partition.all_cores.clone(), STAGING_CAPACITY_TILES, format);
    program.add_circular_buffer(CB_OUT, partition.all_cores.clone(), STAGING_CAPACITY_TILES, format);

    let reader = program.create_data_movement_kernel(
        registry::reader_kernel(dim, ParallelizationStrategy::MultiCoreHw),
        partition.all_cores.clone(),
        DataMovementConfig {
            processor: DataMovementProcessor::Riscv1,
            noc: NocId::Noc1,
            compile_args: vec![
                format.wire_code(),
                u32::from(a_buffer.is_dram()),
                u32::from(b_buffer.is_dram()),
            ],
        },
    );

    let writer = program.create_data_movement_kernel(
        registry::WRITER_KERNEL,
        partition.all_cores.clone(),
        DataMovementConfig {
            processor: DataMovementProcessor::Riscv0,
            noc: NocId::Noc0,
            compile_args: vec![CB_OUT, format.wire_code(), u32::from(out_buffer.is_dram())],
        },
    );

    // One compute unit per load-balanced group. The leading 1s hold the
    // batch and row granularity slots unused in HW broadcast.
    let compute_config = |tiles_per_core: u32| ComputeConfig {
        compile_args: vec![1, 1, tiles_per_core],
        fidelity: MathFidelity::HiFi4,
        fp32_dest_acc: false,
        math_approx: false,
        defines: registry::defines(dim, op),
    };

    let wide_compute = program.create_compute_kernel(
        registry::compute_kernel(dim),
        partition.wide_cores.clone(),
        compute_config(partition.tiles_per_core_wide),
    );
    let narrow_compute = if partition.narrow_cores.is_empty() {
        None
    } else {
        Some(program.create_compute_kernel(
            registry::compute_kernel(dim),
            partition.narrow_cores.clone(),
            compute_config(partition.tiles_per_core_narrow),
        ))
    };

    let mut start_tile = 0u32;
    for i in 0..partition.num_cores {
        let core = partition.core(i);
        let tiles_this_core = partition.tiles_for_core(core)?;

        program.set_runtime_args(
            reader,
            core,
            smallvec![
                a_buffer.address(),          // 0: rebindable
                0,                           // 1: reserved
                0,                           // 2: reserved
                tiles_this_core,             // 3
                b_buffer.address(),          // 4: rebindable
                0,                           // 5: reserved
                0,                           // 6: reserved
                num_b_tiles,                 // 7
                tiles_this_core,             // 8
                1,                           // 9: unit stride
                1,                           // 10: unit stride
                tiles_this_core,             // 11
                b_unit_nc,                   // 12
                start_tile,                  // 13
                geometry.tiles_per_slice(),  // 14: b-index wrap period
            ],
        );

        program.set_runtime_args(
            writer,
            core,
            smallvec![out_buffer.address(), tiles_this_core, start_tile],
        );

        start_tile += tiles_this_core;
    }

    tracing::info!(
        "bcast_{}_{}: {} tiles over {} cores on grid {}",
        dim,
        op,
        geometry.num_tiles,
        partition.num_cores,
        grid,
    );

    Ok(CompiledProgram {
        program,
        reader,
        writer,
        wide_compute,
        narrow_compute,
        num_cores: partition.num_cores,
        grid,
    })
}
