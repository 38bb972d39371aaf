use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::Result;

/// Tile height in elements.
pub const TILE_HEIGHT: u32 = 32;
/// Tile width in elements.
pub const TILE_WIDTH: u32 = 32;
/// Elements per tile.
pub const TILE_HW: u32 = TILE_HEIGHT * TILE_WIDTH;

/// Logical NCHW tensor shape in element units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorShape {
    pub n: u32,
    pub c: u32,
    pub h: u32,
    pub w: u32,
}

impl TensorShape {
    pub fn new(n: u32, c: u32, h: u32, w: u32) -> Self {
        Self { n, c, h, w }
    }

    /// Batch times channel product.
    pub fn nc(&self) -> u32 {
        self.n * self.c
    }

    /// Elements per NC-slice.
    pub fn hw(&self) -> u32 {
        self.h * self.w
    }

    /// Total number of elements.
    pub fn numel(&self) -> u64 {
        u64::from(self.nc()) * u64::from(self.hw())
    }

    /// Whether the leading batch and channel dims collapse to one slice.
    ///
    /// True for broadcast operands whose single NC-slice is reused across
    /// every NC-slice of the primary operand.
    pub fn has_unit_leading_dims(&self) -> bool {
        self.nc() == 1
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.n, self.c, self.h, self.w)
    }
}

/// Tile-unit geometry derived from a tensor shape.
///
/// `num_tiles` is the flattened iteration space the work partitioner splits
/// across cores: `nc * ht * wt` tiles in row-major tile order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGeometry {
    /// Tile rows per NC-slice (`h / TILE_HEIGHT`).
    pub ht: u32,
    /// Tile columns per NC-slice (`w / TILE_WIDTH`).
    pub wt: u32,
    /// Total tiles across all NC-slices.
    pub num_tiles: u32,
}

impl TileGeometry {
    /// Derive tile counts from a shape.
    ///
    /// Fails with a configuration error when H or W is not tile-aligned, and
    /// with a resource-exhaustion error when the total tile count does not
    /// fit the 32-bit runtime-argument encoding.
    pub fn resolve(shape: &TensorShape) -> Result<Self> {
        if shape.h % TILE_HEIGHT != 0 {
            return Err(BuildError::MisalignedShape {
                dim: "H",
                size: shape.h,
                tile: TILE_HEIGHT,
            });
        }
        if shape.w % TILE_WIDTH != 0 {
            return Err(BuildError::MisalignedShape {
                dim: "W",
                size: shape.w,
                tile: TILE_WIDTH,
            });
        }

        let ht = shape.h / TILE_HEIGHT;
        let wt = shape.w / TILE_WIDTH;
        let total = u64::from(shape.nc()) * u64::from(ht) * u64::from(wt);
        if total > u64::from(u32::MAX) {
            return Err(BuildError::TileCountOverflow(total));
        }

        Ok(Self {
            ht,
            wt,
            num_tiles: total as u32,
        })
    }

    /// Tiles per NC-slice.
    ///
    /// The reader uses this to wrap a broadcast operand's tile index back to
    /// zero at each NC boundary.
    pub fn tiles_per_slice(&self) -> u32 {
        self.ht * self.wt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_shape_products() {
        let s = TensorShape::new(2, 3, 64, 96);
        assert_eq!(s.nc(), 6);
        assert_eq!(s.hw(), 64 * 96);
        assert_eq!(s.numel(), 6 * 64 * 96);
        assert!(!s.has_unit_leading_dims());
        assert!(TensorShape::new(1, 1, 32, 32).has_unit_leading_dims());
    }

    #[test]
    fn test_resolve_geometry() {
        let s = TensorShape::new(2, 3, 64, 96);
        let g = TileGeometry::resolve(&s).unwrap();
        assert_eq!(g.ht, 2);
        assert_eq!(g.wt, 3);
        assert_eq!(g.num_tiles, 6 * 2 * 3);
        assert_eq!(g.tiles_per_slice(), 6);
    }

    #[test]
    fn test_misaligned_height() {
        let s = TensorShape::new(1, 1, 33, 32);
        let err = TileGeometry::resolve(&s).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("H size 33"));
    }

    #[test]
    fn test_misaligned_width() {
        let s = TensorShape::new(1, 1, 32, 40);
        let err = TileGeometry::resolve(&s).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_tile_count_overflow() {
        let s = TensorShape::new(u32::MAX, 1, 64, 64);
        let err = TileGeometry::resolve(&s).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceExhaustion);
    }

    #[test]
    fn test_display() {
        let s = TensorShape::new(1, 2, 32, 64);
        assert_eq!(format!("{s}"), "[1, 2, 32, 64]");
    }
}
