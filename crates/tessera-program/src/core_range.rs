//! Core coordinates and rectangular core-range sets.
//!
//! Kernels bind to sets of disjoint rectangles over the compute grid. Cores
//! are ordered by flattened index: core `i` sits at `(i / grid.y, i % grid.y)`,
//! so a contiguous run of indices decomposes into at most three rectangles
//! (leading partial column, full columns, trailing partial column).

use std::fmt;

use tessera_core::CoreGrid;

/// Logical coordinate of one core in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoreCoord {
    pub x: u32,
    pub y: u32,
}

impl CoreCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Core at flattened index `i` (y varies fastest).
    pub fn from_index(i: u32, grid: CoreGrid) -> Self {
        Self {
            x: i / grid.y,
            y: i % grid.y,
        }
    }

    /// Flattened index of this core.
    pub fn flat_index(&self, grid: CoreGrid) -> u32 {
        self.x * grid.y + self.y
    }
}

impl fmt::Display for CoreCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Inclusive rectangle of cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreRange {
    pub start: CoreCoord,
    pub end: CoreCoord,
}

impl CoreRange {
    pub fn new(start: CoreCoord, end: CoreCoord) -> Self {
        debug_assert!(start.x <= end.x && start.y <= end.y);
        Self { start, end }
    }

    pub fn contains(&self, core: CoreCoord) -> bool {
        core.x >= self.start.x && core.x <= self.end.x && core.y >= self.start.y && core.y <= self.end.y
    }

    pub fn num_cores(&self) -> u32 {
        (self.end.x - self.start.x + 1) * (self.end.y - self.start.y + 1)
    }
}

/// Ordered set of disjoint core rectangles.
///
/// Built from contiguous flattened-index spans, which keeps membership a
/// binary search over sorted index intervals rather than a scan of
/// rectangles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreRangeSet {
    ranges: Vec<CoreRange>,
    /// Half-open flattened-index intervals, sorted and non-overlapping.
    spans: Vec<(u32, u32)>,
    grid_height: u32,
}

impl CoreRangeSet {
    /// The empty set. Contains no core.
    pub fn empty() -> Self {
        Self {
            ranges: Vec::new(),
            spans: Vec::new(),
            grid_height: 1,
        }
    }

    /// Cores `[start, start + count)` in flattened-index order.
    pub fn contiguous(grid: CoreGrid, start: u32, count: u32) -> Self {
        debug_assert!(start + count <= grid.num_cores());
        let mut ranges = Vec::new();
        let mut pos = start;
        let end = start + count;
        while pos < end {
            let x = pos / grid.y;
            let yoff = pos % grid.y;
            let remaining = end - pos;
            if yoff == 0 && remaining >= grid.y {
                // full columns
                let ncols = remaining / grid.y;
                ranges.push(CoreRange::new(
                    CoreCoord::new(x, 0),
                    CoreCoord::new(x + ncols - 1, grid.y - 1),
                ));
                pos += ncols * grid.y;
            } else {
                // partial column
                let take = remaining.min(grid.y - yoff);
                ranges.push(CoreRange::new(
                    CoreCoord::new(x, yoff),
                    CoreCoord::new(x, yoff + take - 1),
                ));
                pos += take;
            }
        }
        let spans = if count == 0 { Vec::new() } else { vec![(start, end)] };
        Self {
            ranges,
            spans,
            grid_height: grid.y,
        }
    }

    /// The rectangles, in flattened-index order.
    pub fn ranges(&self) -> &[CoreRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Total cores covered.
    pub fn num_cores(&self) -> u32 {
        self.spans.iter().map(|(s, e)| e - s).sum()
    }

    /// Interval-membership lookup over the sorted index spans.
    pub fn contains(&self, core: CoreCoord) -> bool {
        if core.y >= self.grid_height {
            return false;
        }
        let flat = core.x * self.grid_height + core.y;
        let idx = self.spans.partition_point(|&(s, _)| s <= flat);
        idx > 0 && self.spans[idx - 1].1 > flat
    }
}
