use std::fmt::Write;

use crate::catalog::{Cmip6Model, Cmip6Variable, Granularity};

/// Lists every model with its grid and the variables it provides.
pub fn models() -> String {
    let mut out = String::new();

    for model in Cmip6Model::ALL {
        let spec = model.spec();
        let grid = spec.grid;
        let _ = writeln!(
            out,
            "{model}: {} ({}), {} x {} cells from {}°N {}°E, {}° x {}°, elevation {}",
            spec.source,
            spec.institute,
            grid.nx,
            grid.ny,
            grid.lat_min,
            grid.lon_min,
            grid.dx,
            grid.dy,
            if spec.orography.is_some() { "available" } else { "unavailable" },
        );

        for variable in Cmip6Variable::ALL {
            let Some(granularity) = variable.granularity(model) else {
                continue;
            };
            let name = variable.as_str();
            let files = match granularity {
                Granularity::Yearly => "yearly files",
                Granularity::Monthly => "monthly files",
            };
            match variable.derivation(model) {
                Some(derivation) => {
                    let _ = writeln!(
                        out,
                        "  {name:<26} {files}, derived from {}",
                        derivation.source_short_name()
                    );
                }
                None => {
                    let _ = writeln!(out, "  {name:<26} {files}, {}", variable.short_name());
                }
            }
        }
    }

    out
}

// -- Tests -------------------------------------------------------------------
