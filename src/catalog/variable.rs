//! Daily variables, their units and how each model publishes them.

use std::fmt;

use super::Cmip6Model;
use crate::array::Transform;

/// How one year of a variable is split into source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Monthly,
    Yearly,
}

/// A variable that a model does not publish directly and is computed from others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Relative humidity from `huss`, `psl`, `tas` and the surface elevation.
    RelativeHumidityFromSpecific,
}

impl Derivation {
    /// Short name of the source file downloaded in place of the variable itself.
    pub fn source_short_name(&self) -> &'static str {
        match self {
            Derivation::RelativeHumidityFromSpecific => "huss",
        }
    }

    /// Unit correction applied to the source file, `huss` is converted to g/kg.
    pub fn source_transform(&self) -> Transform {
        match self {
            Derivation::RelativeHumidityFromSpecific => Transform::KG_PER_KG_TO_G_PER_KG,
        }
    }

    /// Auxiliary variables the derivation reads alongside its source.
    pub fn auxiliaries(&self) -> [Cmip6Variable; 2] {
        match self {
            Derivation::RelativeHumidityFromSpecific => {
                [Cmip6Variable::pressure_msl, Cmip6Variable::temperature_2m]
            }
        }
    }
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cmip6Variable {
    pressure_msl,
    temperature_2m_min,
    temperature_2m_max,
    temperature_2m,
    cloudcover,
    precipitation,
    runoff,
    snowfall_water_equivalent,
    relative_humidity_2m_min,
    relative_humidity_2m_max,
    relative_humidity_2m,
    windspeed_10m,
    surface_temperature,
    /// Moisture in upper portion of soil column.
    soil_moisture_0_to_10cm,
    shortwave_radiation,
}

impl Cmip6Variable {
    pub const ALL: [Cmip6Variable; 15] = [
        Cmip6Variable::pressure_msl,
        Cmip6Variable::temperature_2m_min,
        Cmip6Variable::temperature_2m_max,
        Cmip6Variable::temperature_2m,
        Cmip6Variable::cloudcover,
        Cmip6Variable::precipitation,
        Cmip6Variable::runoff,
        Cmip6Variable::snowfall_water_equivalent,
        Cmip6Variable::relative_humidity_2m_min,
        Cmip6Variable::relative_humidity_2m_max,
        Cmip6Variable::relative_humidity_2m,
        Cmip6Variable::windspeed_10m,
        Cmip6Variable::surface_temperature,
        Cmip6Variable::soil_moisture_0_to_10cm,
        Cmip6Variable::shortwave_radiation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cmip6Variable::pressure_msl => "pressure_msl",
            Cmip6Variable::temperature_2m_min => "temperature_2m_min",
            Cmip6Variable::temperature_2m_max => "temperature_2m_max",
            Cmip6Variable::temperature_2m => "temperature_2m",
            Cmip6Variable::cloudcover => "cloudcover",
            Cmip6Variable::precipitation => "precipitation",
            Cmip6Variable::runoff => "runoff",
            Cmip6Variable::snowfall_water_equivalent => "snowfall_water_equivalent",
            Cmip6Variable::relative_humidity_2m_min => "relative_humidity_2m_min",
            Cmip6Variable::relative_humidity_2m_max => "relative_humidity_2m_max",
            Cmip6Variable::relative_humidity_2m => "relative_humidity_2m",
            Cmip6Variable::windspeed_10m => "windspeed_10m",
            Cmip6Variable::surface_temperature => "surface_temperature",
            Cmip6Variable::soil_moisture_0_to_10cm => "soil_moisture_0_to_10cm",
            Cmip6Variable::shortwave_radiation => "shortwave_radiation",
        }
    }

    /// CMIP6 table short name. Daily files use the same names, without min/max for hourly data.
    pub fn short_name(&self) -> &'static str {
        match self {
            Cmip6Variable::pressure_msl => "psl",
            Cmip6Variable::temperature_2m_min => "tasmin",
            Cmip6Variable::temperature_2m_max => "tasmax",
            Cmip6Variable::temperature_2m => "tas",
            Cmip6Variable::cloudcover => "clt",
            Cmip6Variable::precipitation => "pr",
            Cmip6Variable::runoff => "mrro",
            Cmip6Variable::snowfall_water_equivalent => "prsn", // kg m-2 s-1
            Cmip6Variable::relative_humidity_2m_min => "hursmin",
            Cmip6Variable::relative_humidity_2m_max => "hursmax",
            Cmip6Variable::relative_humidity_2m => "hurs",
            Cmip6Variable::windspeed_10m => "sfcWind",
            Cmip6Variable::surface_temperature => "tslsi",
            Cmip6Variable::soil_moisture_0_to_10cm => "mrsos",
            Cmip6Variable::shortwave_radiation => "rsds",
        }
    }

    /// Multiplier applied before quantization in the persisted store.
    pub fn scale_factor(&self) -> f32 {
        match self {
            Cmip6Variable::pressure_msl => 10.0,
            Cmip6Variable::temperature_2m_min
            | Cmip6Variable::temperature_2m_max
            | Cmip6Variable::temperature_2m
            | Cmip6Variable::surface_temperature => 20.0,
            Cmip6Variable::cloudcover => 1.0,
            Cmip6Variable::precipitation
            | Cmip6Variable::runoff
            | Cmip6Variable::snowfall_water_equivalent
            | Cmip6Variable::windspeed_10m => 10.0,
            Cmip6Variable::relative_humidity_2m_min
            | Cmip6Variable::relative_humidity_2m_max
            | Cmip6Variable::relative_humidity_2m => 1.0,
            Cmip6Variable::soil_moisture_0_to_10cm => 1000.0,
            Cmip6Variable::shortwave_radiation => 1.0,
        }
    }

    /// Unit correction from the CMIP6 unit to the stored one.
    pub fn transform(&self) -> Option<Transform> {
        match self {
            Cmip6Variable::temperature_2m_min
            | Cmip6Variable::temperature_2m_max
            | Cmip6Variable::temperature_2m => Some(Transform::KELVIN_TO_CELSIUS),
            Cmip6Variable::pressure_msl => Some(Transform::PASCAL_TO_HECTOPASCAL),
            Cmip6Variable::precipitation
            | Cmip6Variable::snowfall_water_equivalent
            | Cmip6Variable::runoff => Some(Transform::PER_SECOND_TO_PER_DAY),
            _ => None,
        }
    }

    /// Dataset version on the ESGF archive.
    pub fn version(&self, model: Cmip6Model) -> &'static str {
        match model {
            Cmip6Model::CMCC_CM2_VHR4_daily => {
                if *self == Cmip6Variable::precipitation {
                    return "20210308";
                }
                "20190725"
            }
            Cmip6Model::FGOALS_f3_H_daily => "20190817",
            Cmip6Model::HiRAM_SIT_HR_daily => "20210713",
            Cmip6Model::MRI_AGCM3_2_S_daily => "20190711",
        }
    }

    /// `None` if the model does not provide this variable.
    pub fn granularity(&self, model: Cmip6Model) -> Option<Granularity> {
        use Cmip6Variable::*;
        use Granularity::*;

        match model {
            Cmip6Model::MRI_AGCM3_2_S_daily => Some(Yearly),
            Cmip6Model::CMCC_CM2_VHR4_daily => match self {
                relative_humidity_2m | temperature_2m | windspeed_10m => Some(Monthly),
                // only precipitation is published in yearly files
                precipitation => Some(Yearly),
                _ => None,
            },
            // no near surface relative humidity, only specific humidity
            Cmip6Model::FGOALS_f3_H_daily => match self {
                relative_humidity_2m | cloudcover | temperature_2m | pressure_msl
                | snowfall_water_equivalent | shortwave_radiation | windspeed_10m
                | precipitation => Some(Yearly),
                _ => None,
            },
            // no u/v wind components near surface
            Cmip6Model::HiRAM_SIT_HR_daily => match self {
                temperature_2m | temperature_2m_max | temperature_2m_min | cloudcover
                | precipitation | snowfall_water_equivalent | relative_humidity_2m
                | shortwave_radiation | windspeed_10m => Some(Yearly),
                _ => None,
            },
        }
    }

    /// Variables the model lacks and that are computed from other variables instead.
    pub fn derivation(&self, model: Cmip6Model) -> Option<Derivation> {
        match (model, self) {
            (Cmip6Model::FGOALS_f3_H_daily, Cmip6Variable::relative_humidity_2m) => {
                Some(Derivation::RelativeHumidityFromSpecific)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Cmip6Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Tests -------------------------------------------------------------------
