//! In-memory gridded arrays and the transforms applied while loading them.
//!
//! Source files store each time step as a complete spatial field (space-major).
//! The store wants one contiguous time series per location (time-major), so every
//! loaded field is rewrapped, unit corrected and transposed before it is persisted.

/// Affine unit correction, `value * multiply + add`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub multiply: f32,
    pub add: f32,
}

impl Transform {
    pub const KELVIN_TO_CELSIUS: Transform = Transform::new(1.0, -273.15);
    pub const PASCAL_TO_HECTOPASCAL: Transform = Transform::new(1.0 / 100.0, 0.0);
    pub const PER_SECOND_TO_PER_DAY: Transform = Transform::new(3600.0 * 24.0, 0.0);
    pub const KG_PER_KG_TO_G_PER_KG: Transform = Transform::new(1000.0, 0.0);

    pub const fn new(multiply: f32, add: f32) -> Self {
        Transform { multiply, add }
    }

    pub fn apply(&self, value: f32) -> f32 {
        value * self.multiply + self.add
    }

    pub fn apply_in_place(&self, data: &mut [f32]) {
        for value in data.iter_mut() {
            *value = self.apply(*value);
        }
    }
}

/// Each time step holds `n_locations` consecutive values.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceMajorArray {
    pub data: Vec<f32>,
    pub n_locations: usize,
    pub n_time: usize,
}

/// Each location holds `n_time` consecutive values.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeMajorArray {
    pub data: Vec<f32>,
    pub n_locations: usize,
    pub n_time: usize,
}

impl SpaceMajorArray {
    pub fn transpose(&self) -> TimeMajorArray {
        TimeMajorArray {
            data: transpose(&self.data, self.n_time, self.n_locations),
            n_locations: self.n_locations,
            n_time: self.n_time,
        }
    }
}

/// Transposes a row-major `rows × cols` buffer into a row-major `cols × rows` buffer.
pub fn transpose(data: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    debug_assert_eq!(data.len(), rows * cols);

    let mut out = vec![0.0; data.len()];
    for (r, row) in data.chunks_exact(cols.max(1)).enumerate().take(rows) {
        for (c, value) in row.iter().enumerate() {
            out[c * rows + r] = *value;
        }
    }
    out
}

/// Moves the longitude axis from [0, 360) to [-180, 180).
///
/// Every row of `nx` values is rotated left by `nx / 2`. For odd `nx` the
/// rotation is by `floor(nx / 2)`, so applying it twice does not restore the row.
pub fn shift_longitude(data: &mut [f32], nt: usize, ny: usize, nx: usize) {
    debug_assert_eq!(data.len(), nt * ny * nx);

    if nx == 0 {
        return;
    }
    for row in data.chunks_exact_mut(nx) {
        row.rotate_left(nx / 2);
    }
}

// -- Tests -------------------------------------------------------------------
