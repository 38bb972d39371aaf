use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shape::{TILE_HEIGHT, TILE_WIDTH};

/// Dimensions of the device's 2D compute grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoreGrid {
    pub x: u32,
    pub y: u32,
}

impl CoreGrid {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Total cores in the grid.
    pub fn num_cores(&self) -> u32 {
        self.x * self.y
    }
}

impl fmt::Display for CoreGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

/// Host-side handle to one accelerator device.
///
/// Exposes the compute grid a program builder may schedule onto and the
/// device's fixed tile dimensions. Buffer allocation and dispatch live with
/// the runtime, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    grid: CoreGrid,
}

impl Device {
    pub fn new(grid_x: u32, grid_y: u32) -> Self {
        Self {
            grid: CoreGrid::new(grid_x, grid_y),
        }
    }

    /// The grid of cores available for compute and storage.
    pub fn compute_grid(&self) -> CoreGrid {
        self.grid
    }

    /// Tile height in elements.
    pub fn tile_height(&self) -> u32 {
        TILE_HEIGHT
    }

    /// Tile width in elements.
    pub fn tile_width(&self) -> u32 {
        TILE_WIDTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid() {
        let g = CoreGrid::new(4, 4);
        assert_eq!(g.num_cores(), 16);
        assert_eq!(format!("{g}"), "4x4");
    }

    #[test]
    fn test_device_queries() {
        let d = Device::new(8, 7);
        assert_eq!(d.compute_grid().num_cores(), 56);
        assert_eq!(d.tile_height(), 32);
        assert_eq!(d.tile_width(), 32);
    }
}
