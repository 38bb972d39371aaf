//! # tessera-core
//!
//! Device model and tensor metadata for the Tessera program builder.
//!
//! Provides the host-side view of an accelerator:
//! - `Device` with its 2D compute grid and tile-size constants
//! - `TensorShape` and per-tensor `TileGeometry`
//! - `DataFormat` element formats with per-tile byte sizes
//! - `Buffer` and `Tensor` handles (metadata only, no element data)
//! - The `BuildError` taxonomy shared by all program builders

pub mod buffer;
pub mod device;
pub mod dtype;
pub mod error;
pub mod shape;
pub mod tensor;

pub use buffer::{Buffer, BufferKind};
pub use device::{CoreGrid, Device};
pub use dtype::DataFormat;
pub use error::{BuildError, ErrorKind};
pub use shape::{TensorShape, TileGeometry, TILE_HEIGHT, TILE_HW, TILE_WIDTH};
pub use tensor::Tensor;

pub type Result<T> = std::result::Result<T, BuildError>;
