//! End-to-end tests for the multi-core broadcast program builder.

use tessera_core::{Buffer, BufferKind, DataFormat, Device, Tensor, TensorShape, TileGeometry};
use tessera_program::{bcast_multi_core_hw, BcastDim, BcastOp, CompiledProgram};

fn dram_tensor(shape: TensorShape, address: u32) -> Tensor {
    let geometry = TileGeometry::resolve(&shape).unwrap();
    let bytes = geometry.num_tiles * DataFormat::Float16B.tile_size_bytes();
    Tensor::with_buffer(
        shape,
        DataFormat::Float16B,
        Buffer::new(address, bytes, BufferKind::Dram),
    )
}

fn build(
    device: &Device,
    a_shape: TensorShape,
    b_shape: TensorShape,
    op: BcastOp,
) -> CompiledProgram {
    let a = dram_tensor(a_shape, 0x10_0000);
    let b = dram_tensor(b_shape, 0x20_0000);
    let out = dram_tensor(a_shape, 0x30_0000);
    bcast_multi_core_hw(device, &a, &b, &out, op, BcastDim::Hw).unwrap()
}

// ============================================================================
// Runtime-argument layout
// ============================================================================

#[test]
fn test_reader_block_layout() {
    let device = Device::new(4, 4);
    // A: NC=4, 2x2 tiles per slice -> 16 tiles; B: one tile per slice
    let a_shape = TensorShape::new(2, 2, 64, 64);
    let b_shape = TensorShape::new(1, 1, 32, 32);
    let cp = build(&device, a_shape, b_shape, BcastOp::Add);

    assert_eq!(cp.num_cores(), 16);
    let mut start_tile = 0u32;
    for i in 0..cp.num_cores() {
        let core = tessera_program::CoreCoord::from_index(i, device.compute_grid());
        let args = cp.program().runtime_args(cp.reader(), core).unwrap();
        assert_eq!(args.len(), 15);

        assert_eq!(args[0], 0x10_0000, "A address");
        assert_eq!(args[1], 0, "reserved");
        assert_eq!(args[2], 0, "reserved");
        assert_eq!(args[3], 1, "tiles this core");
        assert_eq!(args[4], 0x20_0000, "B address");
        assert_eq!(args[5], 0, "reserved");
        assert_eq!(args[6], 0, "reserved");
        assert_eq!(args[7], 4, "B tile budget: one per NC-slice of A");
        assert_eq!(args[8], 1, "tiles this core");
        assert_eq!(args[9], 1, "unit stride");
        assert_eq!(args[10], 1, "unit stride");
        assert_eq!(args[11], 1, "tiles this core");
        assert_eq!(args[12], 1, "B has unit leading dims");
        assert_eq!(args[13], start_tile, "start tile offset");
        assert_eq!(args[14], 4, "tiles per NC-slice (wrap period)");

        let writer_args = cp.program().runtime_args(cp.writer(), core).unwrap();
        assert_eq!(writer_args.as_slice(), &[0x30_0000, 1, start_tile]);

        start_tile += args[3];
    }
    assert_eq!(start_tile, 16, "offsets cover the whole iteration space");
}

#[test]
fn test_non_unit_broadcast_operand() {
    let device = Device::new(4, 4);
    // both operands carry NC=2; no cross-slice reuse of B tiles
    let a_shape = TensorShape::new(2, 1, 64, 64);
    let b_shape = TensorShape::new(2, 1, 32, 32);
    let cp = build(&device, a_shape, b_shape, BcastOp::Sub);

    let core = tessera_program::CoreCoord::new(0, 0);
    let args = cp.program().runtime_args(cp.reader(), core).unwrap();
    assert_eq!(args[12], 0, "unit-NC flag must be clear");
}

#[test]
fn test_per_core_tile_counts_sum_to_total() {
    let device = Device::new(4, 4);
    // 18 tiles on 16 cores
    let a_shape = TensorShape::new(2, 1, 96, 96);
    let b_shape = TensorShape::new(1, 1, 32, 32);
    let cp = build(&device, a_shape, b_shape, BcastOp::Mul);

    let mut total = 0u32;
    let mut wide = 0u32;
    let mut narrow = 0u32;
    for i in 0..cp.num_cores() {
        let core = tessera_program::CoreCoord::from_index(i, device.compute_grid());
        let tiles = cp.program().runtime_args(cp.reader(), core).unwrap()[3];
        match tiles {
            2 => wide += 1,
            1 => narrow += 1,
            other => panic!("unexpected per-core tile count {other}"),
        }
        total += tiles;
    }
    assert_eq!(total, 18);
    assert_eq!(wide, 2);
    assert_eq!(narrow, 14);
}

#[test]
fn test_random_shapes_cover_iteration_space() {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let grid_x = rng.gen_range(1..=8);
        let grid_y = rng.gen_range(1..=8);
        let device = Device::new(grid_x, grid_y);

        let a_shape = TensorShape::new(
            rng.gen_range(1..=3),
            rng.gen_range(1..=3),
            32 * rng.gen_range(1..=4),
            32 * rng.gen_range(1..=4),
        );
        let b_shape = TensorShape::new(1, 1, 32, 32);
        let cp = build(&device, a_shape, b_shape, BcastOp::Add);

        let total_tiles = TileGeometry::resolve(&a_shape).unwrap().num_tiles;
        let mut next_tile = 0u32;
        for i in 0..cp.num_cores() {
            let core = tessera_program::CoreCoord::from_index(i, device.compute_grid());
            let args = cp.program().runtime_args(cp.reader(), core).unwrap();
            assert_eq!(args[13], next_tile, "offsets must be contiguous");
            next_tile += args[3];
        }
        assert_eq!(next_tile, total_tiles, "every tile assigned exactly once");
    }
}

// ============================================================================
// Staging buffers and kernel configs
// ============================================================================

#[test]
fn test_staging_buffer_allocation() {
    let device = Device::new(4, 4);
    let cp = build(
        &device,
        TensorShape::new(1, 1, 64, 64),
        TensorShape::new(1, 1, 32, 32),
        BcastOp::Add,
    );

    let cbs = cp.program().circular_buffers();
    assert_eq!(cbs.len(), 3);
    let indices: Vec<u32> = cbs.iter().map(|cb| cb.index).collect();
    assert_eq!(indices, vec![0, 1, 16]);
    for cb in cbs {
        assert_eq!(cb.capacity_tiles, 2, "double-buffered");
        assert_eq!(cb.total_bytes, 2 * DataFormat::Float16B.tile_size_bytes());
        assert_eq!(cb.cores.num_cores(), cp.num_cores());
    }
}

#[test]
fn test_data_movement_compile_flags() {
    let device = Device::new(4, 4);
    let a = dram_tensor(TensorShape::new(1, 1, 64, 64), 0x1000);
    let b_shape = TensorShape::new(1, 1, 32, 32);
    // B lives in L1, A and output in DRAM
    let b = Tensor::with_buffer(
        b_shape,
        DataFormat::Float16B,
        Buffer::new(0x8000, 2048, BufferKind::L1),
    );
    let out = dram_tensor(TensorShape::new(1, 1, 64, 64), 0x3000);
    let cp = bcast_multi_core_hw(&device, &a, &b, &out, BcastOp::Add, BcastDim::Hw).unwrap();

    let reader_cfg = cp.program().data_movement_config(cp.reader()).unwrap();
    assert_eq!(
        reader_cfg.compile_args,
        vec![DataFormat::Float16B.wire_code(), 1, 0],
        "format, a_is_dram, b_is_dram"
    );

    let writer_cfg = cp.program().data_movement_config(cp.writer()).unwrap();
    assert_eq!(
        writer_cfg.compile_args,
        vec![16, DataFormat::Float16B.wire_code(), 1],
        "output cb index, format, out_is_dram"
    );
}

#[test]
fn test_compute_defines_select_operator() {
    let device = Device::new(4, 4);
    let cp = build(
        &device,
        TensorShape::new(1, 1, 64, 64),
        TensorShape::new(1, 1, 32, 32),
        BcastOp::Mul,
    );
    let cfg = cp.program().compute_config(cp.wide_compute()).unwrap();
    assert!(cfg.defines.contains(&("BCAST_OP", "mul_tiles_bcast")));
    assert!(cfg.defines.contains(&("BCAST_DIM", "BroadcastType::SCALAR")));
    assert!(!cfg.fp32_dest_acc);
    assert!(!cfg.math_approx);
}

// ============================================================================
// Rebinding
// ============================================================================

#[test]
fn test_rebind_patches_only_address_slots() {
    let device = Device::new(4, 4);
    let a_shape = TensorShape::new(2, 1, 96, 96);
    let b_shape = TensorShape::new(1, 1, 32, 32);
    let mut cp = build(&device, a_shape, b_shape, BcastOp::Add);

    // snapshot every block before rebinding
    let grid = device.compute_grid();
    let before: Vec<(Vec<u32>, Vec<u32>)> = (0..cp.num_cores())
        .map(|i| {
            let core = tessera_program::CoreCoord::from_index(i, grid);
            (
                cp.program().runtime_args(cp.reader(), core).unwrap().to_vec(),
                cp.program().runtime_args(cp.writer(), core).unwrap().to_vec(),
            )
        })
        .collect();

    let new_a = Buffer::new(0x40_0000, 4096, BufferKind::Dram);
    let new_b = Buffer::new(0x50_0000, 4096, BufferKind::Dram);
    let new_out = Buffer::new(0x60_0000, 4096, BufferKind::Dram);
    cp.rebind(&new_a, &new_b, &new_out).unwrap();

    for (i, (reader_before, writer_before)) in before.iter().enumerate() {
        let core = tessera_program::CoreCoord::from_index(i as u32, grid);
        let reader_after = cp.program().runtime_args(cp.reader(), core).unwrap();
        let writer_after = cp.program().runtime_args(cp.writer(), core).unwrap();

        for slot in 0..reader_before.len() {
            match slot {
                0 => assert_eq!(reader_after[slot], 0x40_0000),
                4 => assert_eq!(reader_after[slot], 0x50_0000),
                _ => assert_eq!(
                    reader_after[slot], reader_before[slot],
                    "reader slot {slot} must survive rebind"
                ),
            }
        }
        for slot in 0..writer_before.len() {
            match slot {
                0 => assert_eq!(writer_after[slot], 0x60_0000),
                _ => assert_eq!(
                    writer_after[slot], writer_before[slot],
                    "writer slot {slot} must survive rebind"
                ),
            }
        }
    }
}

#[test]
fn test_rebind_is_repeatable() {
    let device = Device::new(2, 2);
    let mut cp = build(
        &device,
        TensorShape::new(1, 1, 64, 64),
        TensorShape::new(1, 1, 32, 32),
        BcastOp::Add,
    );

    for round in 1..=3u32 {
        let a = Buffer::new(round * 0x1000, 4096, BufferKind::Dram);
        let b = Buffer::new(round * 0x2000, 4096, BufferKind::Dram);
        let out = Buffer::new(round * 0x3000, 4096, BufferKind::Dram);
        cp.rebind(&a, &b, &out).unwrap();

        let core = tessera_program::CoreCoord::new(0, 0);
        let args = cp.program().runtime_args(cp.reader(), core).unwrap();
        assert_eq!(args[0], round * 0x1000);
        assert_eq!(args[4], round * 0x2000);
    }
}
