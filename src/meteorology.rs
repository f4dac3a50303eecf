//! Physical quantities derived from other fetched variables.

use crate::{array::TimeMajorArray, errors::DeriveError};

/// Elevation value marking sea cells in the elevation grid.
pub const NO_LAND: f32 = -999.0;

/// Ratio of the gas constants of dry air and water vapour.
const EPSILON: f32 = 0.622;

/// Station pressure from sea level pressure (hPa), reduced by the standard lapse rate.
pub fn sea_level_to_surface_pressure(pressure_msl: f32, temperature: f32, elevation: f32) -> f32 {
    let elevation = if elevation.is_nan() || elevation <= NO_LAND {
        0.0
    } else {
        elevation
    };
    let lapse = 0.0065 * elevation;
    let base = (1.0 - lapse / (temperature + 273.15 + lapse)).max(0.0);

    pressure_msl * base.powf(5.257)
}

/// Saturation vapour pressure over water in hPa (Magnus formula, Bolton 1980).
pub fn saturation_vapour_pressure(temperature: f32) -> f32 {
    6.112 * ((17.67 * temperature) / (temperature + 243.5)).exp()
}

/// Relative humidity in percent.
///
/// `specific_humidity` in g/kg, `temperature` in °C, `pressure_msl` in hPa and
/// `elevation` in metres. Results are clamped to [0, 100]; non-finite inputs give NaN.
pub fn relative_humidity(
    specific_humidity: f32,
    temperature: f32,
    pressure_msl: f32,
    elevation: f32,
) -> f32 {
    if !(specific_humidity.is_finite() && temperature.is_finite() && pressure_msl.is_finite()) {
        return f32::NAN;
    }

    let q = specific_humidity / 1000.0;
    let pressure = sea_level_to_surface_pressure(pressure_msl, temperature, elevation);
    let vapour_pressure = q * pressure / (EPSILON + (1.0 - EPSILON) * q);
    let rh = 100.0 * vapour_pressure / saturation_vapour_pressure(temperature);

    if rh.is_nan() {
        0.0
    } else {
        rh.clamp(0.0, 100.0)
    }
}

/// Computes relative humidity for every location and time step.
///
/// All time-major inputs must share one shape; `elevation` holds one value per
/// location and applies to all of its time steps.
pub fn relative_humidity_from_specific(
    specific_humidity: &TimeMajorArray,
    temperature: &TimeMajorArray,
    pressure_msl: &TimeMajorArray,
    elevation: &[f32],
) -> Result<TimeMajorArray, DeriveError> {
    let n_locations = specific_humidity.n_locations;
    let n_time = specific_humidity.n_time;
    let expected = n_locations * n_time;

    for (input, array) in [
        ("specific humidity", specific_humidity),
        ("temperature", temperature),
        ("sea level pressure", pressure_msl),
    ] {
        if array.n_locations != n_locations || array.n_time != n_time || array.data.len() != expected {
            return Err(DeriveError::ShapeMismatch {
                input,
                expected,
                got: array.data.len(),
            });
        }
    }
    if elevation.len() != n_locations {
        return Err(DeriveError::ShapeMismatch {
            input: "elevation",
            expected: n_locations,
            got: elevation.len(),
        });
    }

    let mut data = Vec::with_capacity(expected);
    for (l, z) in elevation.iter().enumerate() {
        let range = l * n_time..(l + 1) * n_time;
        let series = specific_humidity.data[range.clone()]
            .iter()
            .zip(&temperature.data[range.clone()])
            .zip(&pressure_msl.data[range]);
        for ((q, t), p) in series {
            data.push(relative_humidity(*q, *t, *p, *z));
        }
    }

    Ok(TimeMajorArray {
        data,
        n_locations,
        n_time,
    })
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn series(data: Vec<f32>, n_locations: usize) -> TimeMajorArray {
        let n_time = data.len() / n_locations;
        TimeMajorArray {
            data,
            n_locations,
            n_time,
        }
    }

    #[test]
    fn should_compute_saturation_vapour_pressure() {
        assert!((saturation_vapour_pressure(0.0) - 6.112).abs() < 1e-4);
        assert!((saturation_vapour_pressure(20.0) - 23.37).abs() < 0.05);
    }

    #[test]
    fn should_keep_pressure_at_sea_level() {
        assert_eq!(sea_level_to_surface_pressure(1013.25, 15.0, 0.0), 1013.25);
        assert_eq!(sea_level_to_surface_pressure(1013.25, 15.0, NO_LAND), 1013.25);

        let high = sea_level_to_surface_pressure(1013.25, 15.0, 1500.0);
        assert!(high > 830.0 && high < 860.0, "{high}");
    }

    #[test]
    fn should_compute_plausible_humidity() {
        // 7.3 g/kg at 20 °C near sea level is close to half saturation
        let rh = relative_humidity(7.3, 20.0, 1013.25, 0.0);
        assert!((rh - 50.0).abs() < 2.0, "{rh}");
    }

    #[test]
    fn should_clamp_supersaturation() {
        assert_eq!(relative_humidity(40.0, 5.0, 1013.25, 0.0), 100.0);
        assert_eq!(relative_humidity(-3.0, 5.0, 1013.25, 0.0), 0.0);
    }

    #[test]
    fn should_stay_in_range_for_extreme_inputs() {
        let values = [
            -1e30, -1e6, -1000.0, -273.15, -243.5, -100.0, -1.0, 0.0, 1e-6, 1.0, 50.0, 1000.0,
            1e6, 1e30, f32::MAX, f32::MIN,
        ];
        for q in values {
            for t in values {
                for p in values {
                    for z in [NO_LAND, -500.0, 0.0, 8848.0, 1e9] {
                        let rh = relative_humidity(q, t, p, z);
                        assert!(
                            (0.0..=100.0).contains(&rh),
                            "q={q} t={t} p={p} z={z} gave {rh}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn should_mark_missing_inputs() {
        assert!(relative_humidity(f32::NAN, 10.0, 1000.0, 0.0).is_nan());
        assert!(relative_humidity(5.0, f32::INFINITY, 1000.0, 0.0).is_nan());
    }

    #[test]
    fn should_broadcast_elevation_over_time() {
        let q = series(vec![7.3, 7.3, 7.3, 7.3], 2);
        let t = series(vec![20.0, 20.0, 20.0, 20.0], 2);
        let p = series(vec![1013.25, 1013.25, 1013.25, 1013.25], 2);

        let rh = relative_humidity_from_specific(&q, &t, &p, &[0.0, 1500.0]).unwrap();

        assert_eq!(rh.n_locations, 2);
        assert_eq!(rh.n_time, 2);
        assert_eq!(rh.data[0], rh.data[1]);
        assert_eq!(rh.data[2], rh.data[3]);
        assert!(rh.data[2] < rh.data[0]);
    }

    #[test]
    fn should_reject_mismatched_shapes() {
        let q = series(vec![1.0; 6], 3);
        let t = series(vec![1.0; 4], 2);
        let p = series(vec![1.0; 6], 3);

        let err = relative_humidity_from_specific(&q, &t, &p, &[0.0; 3]).unwrap_err();
        assert!(matches!(err, DeriveError::ShapeMismatch { input: "temperature", .. }));

        let t = series(vec![1.0; 6], 3);
        let err = relative_humidity_from_specific(&q, &t, &p, &[0.0; 2]).unwrap_err();
        assert!(matches!(err, DeriveError::ShapeMismatch { input: "elevation", .. }));
    }
}
