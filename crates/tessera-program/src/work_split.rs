//! Static partition of tile work across the core grid.
//!
//! Splits a flat tile count into at most two contiguous groups so every
//! active core receives either `base` or `base + 1` tiles. The partition is
//! computed once at build time; cores never negotiate work at run time, so
//! correctness rests entirely on this being a disjoint exact cover.

use tessera_core::{BuildError, CoreGrid, Result};

use crate::core_range::{CoreCoord, CoreRangeSet};

/// Static assignment of a tile iteration space to cores.
///
/// Invariants:
/// - `tiles_per_core_wide - tiles_per_core_narrow` is 0 or 1 (0 only when
///   the narrow group is empty)
/// - the wide and narrow groups are disjoint and together cover exactly
///   `num_cores` cores
/// - summing per-core tile counts over all active cores yields the total
///   tile count with no gap and no overlap
#[derive(Debug, Clone)]
pub struct WorkPartition {
    grid: CoreGrid,
    /// Active cores; cores beyond this stay idle.
    pub num_cores: u32,
    /// Every active core, for kernels bound grid-wide.
    pub all_cores: CoreRangeSet,
    /// Cores carrying `tiles_per_core_wide` tiles.
    pub wide_cores: CoreRangeSet,
    /// Cores carrying `tiles_per_core_narrow` tiles; empty when the split is
    /// even.
    pub narrow_cores: CoreRangeSet,
    pub tiles_per_core_wide: u32,
    pub tiles_per_core_narrow: u32,
}

impl WorkPartition {
    /// The grid this partition was computed against.
    pub fn grid(&self) -> CoreGrid {
        self.grid
    }

    /// Coordinate of the active core at flattened index `i`.
    pub fn core(&self, i: u32) -> CoreCoord {
        CoreCoord::from_index(i, self.grid)
    }

    /// Tile count owed to `core`.
    ///
    /// A core belonging to neither group is an internal invariant violation
    /// and aborts the build; work is never defaulted to zero.
    pub fn tiles_for_core(&self, core: CoreCoord) -> Result<u32> {
        if self.wide_cores.contains(core) {
            Ok(self.tiles_per_core_wide)
        } else if self.narrow_cores.contains(core) {
            Ok(self.tiles_per_core_narrow)
        } else {
            Err(BuildError::CoreOutsidePartition {
                x: core.x,
                y: core.y,
            })
        }
    }
}

/// Split `total_tiles` across `grid`, load-balanced to within one tile.
///
/// With `cores = min(grid.num_cores(), total_tiles)`, `base = total / cores`
/// and `rem = total % cores`, the first `rem` cores in flattened order take
/// `base + 1` tiles (the wide group) and the rest take `base` (the narrow
/// group). When `rem == 0` the narrow group is absent and the wide group
/// holds every active core at `base`.
pub fn split_work_to_cores(grid: CoreGrid, total_tiles: u32) -> Result<WorkPartition> {
    if grid.num_cores() == 0 {
        return Err(BuildError::EmptyGrid { x: grid.x, y: grid.y });
    }
    if total_tiles == 0 {
        return Err(BuildError::EmptyWork);
    }

    let max_cores = grid.num_cores();
    let num_cores = max_cores.min(total_tiles);
    let base = total_tiles / num_cores;
    let rem = total_tiles % num_cores;

    let all_cores = CoreRangeSet::contiguous(grid, 0, num_cores);
    let (wide_cores, narrow_cores, wide, narrow) = if rem == 0 {
        (all_cores.clone(), CoreRangeSet::empty(), base, 0)
    } else {
        (
            CoreRangeSet::contiguous(grid, 0, rem),
            CoreRangeSet::contiguous(grid, rem, num_cores - rem),
            base + 1,
            base,
        )
    };

    tracing::debug!(
        "split {} tiles over {} of {} cores: {} wide x {} tiles, {} narrow x {} tiles",
        total_tiles,
        num_cores,
        max_cores,
        wide_cores.num_cores(),
        wide,
        narrow_cores.num_cores(),
        narrow,
    );

    Ok(WorkPartition {
        grid,
        num_cores,
        all_cores,
        wide_cores,
        narrow_cores,
        tiles_per_core_wide: wide,
        tiles_per_core_narrow: narrow,
    })
}
