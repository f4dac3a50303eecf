//! NetCDF source files as published on the ESGF archive.

use std::path::{Path, PathBuf};

use netcdf::{types::NcVariableType, AttributeValue};

use super::{RawVariable, SourceDecoder, SourceFile};
use crate::errors::DecodeError;

#[derive(Debug, Default, Clone, Copy)]
pub struct NetcdfDecoder;

struct NetcdfFile {
    path: PathBuf,
    file: netcdf::File,
}

impl SourceDecoder for NetcdfDecoder {
    fn open(&self, path: &Path) -> Result<Box<dyn SourceFile>, DecodeError> {
        let file = netcdf::open(path).map_err(|e| DecodeError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(Box::new(NetcdfFile {
            path: path.to_path_buf(),
            file,
        }))
    }
}

impl SourceFile for NetcdfFile {
    fn variables(&self) -> Vec<String> {
        self.file.variables().map(|v| v.name()).collect()
    }

    fn read_variable(&self, name: &str) -> Result<RawVariable, DecodeError> {
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| DecodeError::MissingVariable {
                name: name.to_string(),
                path: self.path.clone(),
            })?;

        if !matches!(var.vartype(), NcVariableType::Float(_)) {
            return Err(DecodeError::WrongType {
                name: name.to_string(),
                path: self.path.clone(),
            });
        }

        let shape = var.dimensions().iter().map(|d| d.len()).collect();
        let mut data = var
            .get_values::<f32, _>(..)
            .map_err(|e| DecodeError::Read {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        let fill_value = match var.attribute_value("_FillValue") {
            Some(Ok(AttributeValue::Float(v))) => Some(v),
            Some(Ok(AttributeValue::Double(v))) => Some(v as f32),
            _ => None,
        };
        if let Some(fill_value) = fill_value {
            mask_fill_value(&mut data, fill_value);
        }

        Ok(RawVariable { data, shape })
    }
}

/// Cells holding the `_FillValue` have no data and become NaN.
fn mask_fill_value(data: &mut [f32], fill_value: f32) {
    for value in data.iter_mut().filter(|v| **v == fill_value) {
        *value = f32::NAN;
    }
}

// -- Tests -------------------------------------------------------------------
