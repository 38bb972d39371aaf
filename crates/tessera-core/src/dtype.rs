use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shape::TILE_HW;

/// Element formats understood by the device's packers and unpackers.
///
/// Plain IEEE formats plus block-float, where a group of mantissas shares one
/// exponent byte. Block-float tiles carry their shared exponents inline, so
/// their tile footprint is not `elements * element_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataFormat {
    /// 32-bit IEEE 754 single-precision float
    Float32,
    /// 16-bit IEEE 754 half-precision float
    Float16,
    /// 16-bit Brain Float (F32 exponent range, reduced mantissa)
    Float16B,
    /// 8-bit block float, 16 mantissas per shared exponent byte
    Bfp8B,
}

impl DataFormat {
    /// Size in bytes of a single element, or None for block formats.
    pub fn element_size(&self) -> Option<usize> {
        match self {
            DataFormat::Float32 => Some(4),
            DataFormat::Float16 | DataFormat::Float16B => Some(2),
            // Block formats: footprint depends on the tile, not the element
            DataFormat::Bfp8B => None,
        }
    }

    /// Bytes occupied by one full tile of this format, exponents included.
    pub fn tile_size_bytes(&self) -> u32 {
        match self {
            DataFormat::Float32 => 4 * TILE_HW,
            DataFormat::Float16 | DataFormat::Float16B => 2 * TILE_HW,
            // 1024 mantissa bytes + 64 shared exponent bytes
            DataFormat::Bfp8B => TILE_HW + 64,
        }
    }

    /// Numeric code used in compile-time kernel arguments.
    pub fn wire_code(&self) -> u32 {
        match self {
            DataFormat::Float32 => 0,
            DataFormat::Float16 => 1,
            DataFormat::Float16B => 5,
            DataFormat::Bfp8B => 6,
        }
    }

    /// Whether this is a block-float format.
    pub fn is_block_float(&self) -> bool {
        matches!(self, DataFormat::Bfp8B)
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::Float32 => write!(f, "float32"),
            DataFormat::Float16 => write!(f, "float16"),
            DataFormat::Float16B => write!(f, "float16_b"),
            DataFormat::Bfp8B => write!(f, "bfp8_b"),
        }
    }
}
