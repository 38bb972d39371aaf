//! Broadcast kernel source selection and symbolic defines.
//!
//! Maps a (dimension, operator, strategy) triple to the stable kernel source
//! identifiers and compile-time defines the assembler threads into each
//! unit. Identifiers are process-wide constants; nothing here is recomputed
//! per build.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which dimensions of the broadcast operand are reduced to tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BcastDim {
    /// Operand spans one tile row per slice, replicated down H.
    H,
    /// Operand spans one tile column per slice, replicated across W.
    W,
    /// Operand collapses to a single tile per slice, replicated over H and W.
    Hw,
}

impl fmt::Display for BcastDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BcastDim::H => write!(f, "h"),
            BcastDim::W => write!(f, "w"),
            BcastDim::Hw => write!(f, "hw"),
        }
    }
}

/// Elementwise operator applied between each output tile and its broadcast
/// tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BcastOp {
    Add,
    Sub,
    Mul,
}

impl fmt::Display for BcastOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BcastOp::Add => write!(f, "add"),
            BcastOp::Sub => write!(f, "sub"),
            BcastOp::Mul => write!(f, "mul"),
        }
    }
}

/// How the op is spread across the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParallelizationStrategy {
    SingleCore,
    MultiCoreH,
    MultiCoreW,
    MultiCoreHw,
}

/// Fixed generic tile writer; shared by every broadcast variant.
pub const WRITER_KERNEL: &str = "dataflow/writer_unary_interleaved_start_id";

/// Reader kernel source for a (dimension, strategy) pair.
pub fn reader_kernel(dim: BcastDim, strategy: ParallelizationStrategy) -> &'static str {
    match (dim, strategy) {
        (BcastDim::Hw, ParallelizationStrategy::MultiCoreHw) => {
            "dataflow/reader_bcast_hw_interleaved_partitioned"
        }
        (BcastDim::H, _) => "dataflow/reader_bcast_h_interleaved",
        (BcastDim::W, _) => "dataflow/reader_bcast_w_interleaved",
        (BcastDim::Hw, _) => "dataflow/reader_bcast_hw_interleaved",
    }
}

/// Compute kernel source for a broadcast dimension.
pub fn compute_kernel(dim: BcastDim) -> &'static str {
    match dim {
        BcastDim::H => "compute/bcast_h",
        BcastDim::W => "compute/bcast_w",
        BcastDim::Hw => "compute/bcast_hw",
    }
}

/// Symbolic defines selecting the operator and broadcast type.
pub fn defines(dim: BcastDim, op: BcastOp) -> Vec<(&'static str, &'static str)> {
    let (bcast_op, llk_op) = match op {
        BcastOp::Add => ("add_tiles_bcast", "ELWADD"),
        BcastOp::Sub => ("sub_tiles_bcast", "ELWSUB"),
        BcastOp::Mul => ("mul_tiles_bcast", "ELWMUL"),
    };
    let bcast_type = match dim {
        BcastDim::H => "BroadcastType::ROW",
        BcastDim::W => "BroadcastType::COL",
        BcastDim::Hw => "BroadcastType::SCALAR",
    };
    vec![
        ("BCAST_OP", bcast_op),
        ("BCAST_LLKOP", llk_op),
        ("BCAST_DIM", bcast_type),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_selection() {
        assert_eq!(
            reader_kernel(BcastDim::Hw, ParallelizationStrategy::MultiCoreHw),
            "dataflow/reader_bcast_hw_interleaved_partitioned"
        );
        assert_ne!(
            reader_kernel(BcastDim::Hw, ParallelizationStrategy::SingleCore),
            reader_kernel(BcastDim::Hw, ParallelizationStrategy::MultiCoreHw),
        );
    }

    #[test]
    fn test_identifiers_are_stable() {
        // the registry contract: same inputs, same 'static identifier
        let a = compute_kernel(BcastDim::Hw);
        let b = compute_kernel(BcastDim::Hw);
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_defines_per_op() {
        let d = defines(BcastDim::Hw, BcastOp::Mul);
        assert!(d.contains(&("BCAST_OP", "mul_tiles_bcast")));
        assert!(d.contains(&("BCAST_LLKOP", "ELWMUL")));
        assert!(d.contains(&("BCAST_DIM", "BroadcastType::SCALAR")));

        let d = defines(BcastDim::H, BcastOp::Add);
        assert!(d.contains(&("BCAST_DIM", "BroadcastType::ROW")));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", BcastDim::Hw), "hw");
        assert_eq!(format!("{}", BcastOp::Sub), "sub");
    }
}
