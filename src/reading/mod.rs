//! Reading gridded variables from downloaded source files.

pub mod netcdf_file;

use std::path::Path;

use tracing::debug;

use crate::{
    array::{shift_longitude, SpaceMajorArray, TimeMajorArray, Transform},
    errors::DecodeError,
};

pub use netcdf_file::NetcdfDecoder;

/// A variable as stored in the source file: flat values plus dimension sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVariable {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
}

/// An opened self-describing source file.
pub trait SourceFile {
    fn variables(&self) -> Vec<String>;
    fn read_variable(&self, name: &str) -> Result<RawVariable, DecodeError>;
}

pub trait SourceDecoder: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn SourceFile>, DecodeError>;
}

/// Loads `name` from `path` as a time-major array with longitudes in [-180, 180).
///
/// Variables with three dimensions are `(time, y, x)`, two dimensions mean a
/// single time step `(y, x)`.
pub fn load(
    decoder: &dyn SourceDecoder,
    path: &Path,
    name: &str,
    transform: Option<Transform>,
) -> Result<TimeMajorArray, DecodeError> {
    let file = decoder.open(path)?;

    if !file.variables().iter().any(|v| v == name) {
        return Err(DecodeError::MissingVariable {
            name: name.to_string(),
            path: path.to_path_buf(),
        });
    }
    let RawVariable { mut data, shape } = file.read_variable(name)?;

    let (nt, ny, nx) = match shape.as_slice() {
        [nt, ny, nx] => (*nt, *ny, *nx),
        [ny, nx] => (1, *ny, *nx),
        _ => {
            return Err(DecodeError::UnsupportedDimensions {
                name: name.to_string(),
                count: shape.len(),
            })
        }
    };
    let expected = nt * ny * nx;
    if data.len() != expected {
        return Err(DecodeError::ShapeMismatch {
            name: name.to_string(),
            expected,
            got: data.len(),
        });
    }
    debug!(variable = name, nt, ny, nx, path = %path.display(), "Loaded source variable");

    shift_longitude(&mut data, nt, ny, nx);
    if let Some(transform) = transform {
        transform.apply_in_place(&mut data);
    }

    let spatial = SpaceMajorArray {
        data,
        n_locations: ny * nx,
        n_time: nt,
    };

    Ok(spatial.transpose())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::testing::MemoryDecoder;

    fn path() -> PathBuf {
        PathBuf::from("tas_1950.nc")
    }

    #[test]
    fn should_rewrap_transform_and_transpose() {
        // 2 time steps of a 2x2 grid, space-major
        let decoder = MemoryDecoder::default().with_variable(
            "tas_1950.nc",
            "tas",
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
            vec![2, 2, 2],
        );

        let array = load(&decoder, &path(), "tas", Some(Transform::new(1.0, -1.0))).unwrap();

        assert_eq!(array.n_locations, 4);
        assert_eq!(array.n_time, 2);
        assert_eq!(&array.data[0..2], &[1.0, 5.0]);
        assert_eq!(array.data, vec![1.0, 5.0, 0.0, 4.0, 3.0, 7.0, 2.0, 6.0]);
    }

    #[test]
    fn should_load_two_dimensional_variable_as_single_step() {
        let decoder = MemoryDecoder::default().with_variable(
            "tas_1950.nc",
            "orog",
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![2, 3],
        );

        let array = load(&decoder, &path(), "orog", None).unwrap();

        assert_eq!(array.n_time, 1);
        assert_eq!(array.n_locations, 6);
        assert_eq!(array.data, vec![2.0, 3.0, 1.0, 5.0, 6.0, 4.0]);
    }

    #[test]
    fn should_fail_on_missing_variable() {
        let decoder =
            MemoryDecoder::default().with_variable("tas_1950.nc", "tas", vec![0.0; 4], vec![2, 2]);

        let err = load(&decoder, &path(), "huss", None).unwrap_err();
        assert!(matches!(err, DecodeError::MissingVariable { name, .. } if name == "huss"));
    }

    #[test]
    fn should_fail_on_integer_variable() {
        let decoder = MemoryDecoder::default().with_integer_variable("tas_1950.nc", "time_bnds");

        let err = load(&decoder, &path(), "time_bnds", None).unwrap_err();
        assert!(matches!(err, DecodeError::WrongType { .. }));
    }

    #[test]
    fn should_fail_on_inconsistent_shape() {
        let decoder =
            MemoryDecoder::default().with_variable("tas_1950.nc", "tas", vec![0.0; 7], vec![2, 2, 2]);

        let err = load(&decoder, &path(), "tas", None).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::ShapeMismatch { expected: 8, got: 7, .. }
        ));
    }

    #[test]
    fn should_fail_on_one_dimensional_variable() {
        let decoder =
            MemoryDecoder::default().with_variable("tas_1950.nc", "lat", vec![0.0; 4], vec![4]);

        let err = load(&decoder, &path(), "lat", None).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedDimensions { count: 1, .. }));
    }
}
