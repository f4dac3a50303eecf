//! Stores arrays as _parquet_ files, one row group per chunk.
//!
//! Values are multiplied by the scale factor and rounded to `Int32`; NaN is
//! stored as null. The array shape and scale factor travel in the schema metadata.

use std::{
    collections::HashMap,
    fs::{self, File},
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow::{
    array::{ArrayRef, AsArray, Int32Array, RecordBatch},
    datatypes::{DataType, Field, Int32Type, Schema},
};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    file::properties::WriterProperties,
};
use tempfile::NamedTempFile;
use tracing::debug;

use super::{ArrayHandle, ArrayShape, StoreReader, StoreWriter};
use crate::errors::StoreError;

const DIM0: &str = "dim0";
const DIM1: &str = "dim1";
const CHUNK0: &str = "chunk0";
const CHUNK1: &str = "chunk1";
const SCALE_FACTOR: &str = "scale_factor";

#[derive(Debug, Default, Clone, Copy)]
pub struct ParquetStore;

fn quantize(value: f32, scale_factor: f32) -> Option<i32> {
    if value.is_nan() {
        None
    } else {
        Some((value * scale_factor).round() as i32)
    }
}

fn make_schema(shape: ArrayShape, scale_factor: f32) -> Schema {
    let metadata = HashMap::from([
        (DIM0.to_string(), shape.dim0.to_string()),
        (DIM1.to_string(), shape.dim1.to_string()),
        (CHUNK0.to_string(), shape.chunk0.to_string()),
        (CHUNK1.to_string(), shape.chunk1.to_string()),
        (SCALE_FACTOR.to_string(), scale_factor.to_string()),
    ]);

    Schema::new_with_metadata(vec![Field::new("value", DataType::Int32, true)], metadata)
}

impl StoreWriter for ParquetStore {
    fn write(&self, path: &Path, shape: ArrayShape, scale_factor: f32, data: &[f32]) -> Result<(), StoreError> {
        if data.len() != shape.len() {
            return Err(StoreError::InvalidShape(format!(
                "{} x {} array needs {} values, got {}",
                shape.dim0,
                shape.dim1,
                shape.len(),
                data.len()
            )));
        }

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let mut temp = NamedTempFile::new_in(dir)?;

        let schema = Arc::new(make_schema(shape, scale_factor));
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .set_max_row_group_size(shape.chunk0 * shape.chunk1)
            .build();

        let mut writer = ArrowWriter::try_new(temp.as_file_mut(), schema.clone(), Some(props))?;

        for (rows, cols) in shape.chunks() {
            let mut values = Vec::with_capacity(rows.len() * cols.len());
            for row in rows {
                let offset = row * shape.dim1;
                values.extend(
                    data[offset + cols.start..offset + cols.end]
                        .iter()
                        .map(|v| quantize(*v, scale_factor)),
                );
            }

            let column: ArrayRef = Arc::new(Int32Array::from(values));
            let batch = RecordBatch::try_new(schema.clone(), vec![column])?;
            writer.write(&batch)?;
            writer.flush()?;
        }
        writer.close()?;

        temp.persist(path).map_err(|e| StoreError::Persist {
            path: path.to_path_buf(),
            source: e.error,
        })?;
        debug!(path = %path.display(), dim0 = shape.dim0, dim1 = shape.dim1, "Array written");

        Ok(())
    }
}

/// A stored array whose header has been read.
pub struct ParquetArray {
    path: PathBuf,
    shape: ArrayShape,
    scale_factor: f32,
}

fn metadata_value<T: std::str::FromStr>(
    metadata: &HashMap<String, String>,
    key: &'static str,
    path: &Path,
) -> Result<T, StoreError> {
    metadata
        .get(key)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| StoreError::Metadata {
            key,
            path: path.to_path_buf(),
        })
}

impl ParquetArray {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
        let metadata = builder.schema().metadata();

        let shape = ArrayShape {
            dim0: metadata_value(metadata, DIM0, path)?,
            dim1: metadata_value(metadata, DIM1, path)?,
            chunk0: metadata_value(metadata, CHUNK0, path)?,
            chunk1: metadata_value(metadata, CHUNK1, path)?,
        };
        let scale_factor = metadata_value(metadata, SCALE_FACTOR, path)?;
        if shape.chunk0 == 0 || shape.chunk1 == 0 {
            return Err(StoreError::InvalidShape(format!(
                "zero chunk size in {}",
                path.display()
            )));
        }

        Ok(ParquetArray {
            path: path.to_path_buf(),
            shape,
            scale_factor,
        })
    }
}

impl ArrayHandle for ParquetArray {
    fn shape(&self) -> ArrayShape {
        self.shape
    }

    fn read_all(&self) -> Result<Vec<f32>, StoreError> {
        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&self.path)?)?.build()?;

        let mut stored = Vec::with_capacity(self.shape.len());
        for batch in reader {
            let batch = batch?;
            stored.extend(batch.column(0).as_primitive::<Int32Type>().iter());
        }
        if stored.len() != self.shape.len() {
            return Err(StoreError::InvalidShape(format!(
                "{} holds {} values, expected {}",
                self.path.display(),
                stored.len(),
                self.shape.len()
            )));
        }

        let mut data = vec![f32::NAN; self.shape.len()];
        let mut values = stored.into_iter();
        for (rows, cols) in self.shape.chunks() {
            for row in rows {
                let offset = row * self.shape.dim1;
                for (target, value) in data[offset + cols.start..offset + cols.end]
                    .iter_mut()
                    .zip(values.by_ref())
                {
                    *target = value.map_or(f32::NAN, |v| v as f32 / self.scale_factor);
                }
            }
        }

        Ok(data)
    }
}

impl StoreReader for ParquetStore {
    fn open(&self, path: &Path) -> Result<Box<dyn ArrayHandle>, StoreError> {
        Ok(Box::new(ParquetArray::open(path)?))
    }
}

// -- Tests -------------------------------------------------------------------
