use crate::buffer::Buffer;
use crate::dtype::DataFormat;
use crate::error::BuildError;
use crate::shape::TensorShape;
use crate::Result;

/// Host-side tensor handle: shape, element format, device placement.
///
/// Carries no element data. Program builders consume these to derive tile
/// geometry and buffer addresses; the runtime owns the actual storage.
#[derive(Debug, Clone, Copy)]
pub struct Tensor {
    shape: TensorShape,
    format: DataFormat,
    buffer: Option<Buffer>,
}

impl Tensor {
    /// A tensor handle with no device allocation yet.
    pub fn new(shape: TensorShape, format: DataFormat) -> Self {
        Self {
            shape,
            format,
            buffer: None,
        }
    }

    /// A tensor handle bound to a device buffer.
    pub fn with_buffer(shape: TensorShape, format: DataFormat, buffer: Buffer) -> Self {
        Self {
            shape,
            format,
            buffer: Some(buffer),
        }
    }

    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    pub fn format(&self) -> DataFormat {
        self.format
    }

    /// The device allocation, if bound.
    pub fn buffer(&self) -> Option<&Buffer> {
        self.buffer.as_ref()
    }

    /// The device allocation, or an allocation error naming the operand.
    pub fn buffer_or_err(&self, operand: &'static str) -> Result<&Buffer> {
        self.buffer
            .as_ref()
            .ok_or(BuildError::UnboundBuffer { operand })
    }

    /// Bind or replace the device allocation.
    pub fn bind_buffer(&mut self, buffer: Buffer) {
        self.buffer = Some(buffer);
    }
}
