use std::fmt;

use serde::{Deserialize, Serialize};

/// Memory space a device buffer lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferKind {
    /// Off-chip DRAM, interleaved across banks.
    Dram,
    /// On-chip core-local SRAM.
    L1,
}

/// A physical allocation on the device.
///
/// Addresses are stable for the lifetime of the allocation; a freed and
/// reallocated tensor gets a new `Buffer`, which is what
/// `CompiledProgram::rebind` exists to patch in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buffer {
    address: u32,
    size_bytes: u32,
    kind: BufferKind,
}

impl Buffer {
    pub fn new(address: u32, size_bytes: u32, kind: BufferKind) -> Self {
        Self {
            address,
            size_bytes,
            kind,
        }
    }

    /// Base address of the allocation.
    pub fn address(&self) -> u32 {
        self.address
    }

    /// Allocation size in bytes.
    pub fn size_bytes(&self) -> u32 {
        self.size_bytes
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Whether the buffer lives in off-chip DRAM.
    ///
    /// Readers and writers take this as a compile-time flag to pick the
    /// right address-generation path.
    pub fn is_dram(&self) -> bool {
        self.kind == BufferKind::Dram
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            BufferKind::Dram => "dram",
            BufferKind::L1 => "l1",
        };
        write!(f, "{kind}@{:#x}+{}", self.address, self.size_bytes)
    }
}
