//! Persisted, chunked and quantized two dimensional arrays.

pub mod parquet_store;

use std::path::Path;

use crate::errors::StoreError;

pub use parquet_store::ParquetStore;

/// Dimensions of a stored array and of the chunks it is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayShape {
    pub dim0: usize,
    pub dim1: usize,
    pub chunk0: usize,
    pub chunk1: usize,
}

impl ArrayShape {
    /// Chunk sizes larger than the array are shrunk to the array.
    pub fn new(dim0: usize, dim1: usize, chunk0: usize, chunk1: usize) -> Self {
        ArrayShape {
            dim0,
            dim1,
            chunk0: chunk0.clamp(1, dim0.max(1)),
            chunk1: chunk1.clamp(1, dim1.max(1)),
        }
    }

    pub fn len(&self) -> usize {
        self.dim0 * self.dim1
    }

    /// Ranges of each chunk in storage order: `(rows, cols)`.
    pub fn chunks(&self) -> impl Iterator<Item = (std::ops::Range<usize>, std::ops::Range<usize>)> + '_ {
        (0..self.dim0).step_by(self.chunk0).flat_map(move |r| {
            (0..self.dim1).step_by(self.chunk1).map(move |c| {
                (
                    r..(r + self.chunk0).min(self.dim0),
                    c..(c + self.chunk1).min(self.dim1),
                )
            })
        })
    }
}

pub trait StoreWriter: Send + Sync {
    /// Writes a row-major `dim0 × dim1` array, replacing `path` atomically.
    fn write(&self, path: &Path, shape: ArrayShape, scale_factor: f32, data: &[f32]) -> Result<(), StoreError>;
}

/// An opened stored array.
pub trait ArrayHandle {
    fn shape(&self) -> ArrayShape;
    fn read_all(&self) -> Result<Vec<f32>, StoreError>;
}

pub trait StoreReader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn ArrayHandle>, StoreError>;
}

pub trait ArrayStore: StoreWriter + StoreReader {}

impl<T: StoreWriter + StoreReader> ArrayStore for T {}

// -- Tests -------------------------------------------------------------------
