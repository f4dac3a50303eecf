//! HighResMIP models and their grids.

use std::{fmt, str::FromStr};

use crate::errors::ConfigError;

/// Regular latitude/longitude grid after longitude rewrap to [-180, 180).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegularGrid {
    pub nx: usize,
    pub ny: usize,
    pub lat_min: f32,
    pub lon_min: f32,
    pub dx: f32,
    pub dy: f32,
}

impl RegularGrid {
    pub fn n_locations(&self) -> usize {
        self.nx * self.ny
    }
}

/// Versions of the fixed `orog` and `sftlf` fields used to build the elevation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrographyVersions {
    pub altitude: &'static str,
    pub landmask: &'static str,
}

#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub source: &'static str,
    pub institute: &'static str,
    pub grid_label: &'static str,
    pub grid: RegularGrid,
    pub orography: Option<OrographyVersions>,
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cmip6Model {
    CMCC_CM2_VHR4_daily,
    FGOALS_f3_H_daily,
    HiRAM_SIT_HR_daily,
    MRI_AGCM3_2_S_daily,
}

impl Cmip6Model {
    pub const ALL: [Cmip6Model; 4] = [
        Cmip6Model::CMCC_CM2_VHR4_daily,
        Cmip6Model::FGOALS_f3_H_daily,
        Cmip6Model::HiRAM_SIT_HR_daily,
        Cmip6Model::MRI_AGCM3_2_S_daily,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cmip6Model::CMCC_CM2_VHR4_daily => "CMCC_CM2_VHR4_daily",
            Cmip6Model::FGOALS_f3_H_daily => "FGOALS_f3_H_daily",
            Cmip6Model::HiRAM_SIT_HR_daily => "HiRAM_SIT_HR_daily",
            Cmip6Model::MRI_AGCM3_2_S_daily => "MRI_AGCM3_2_S_daily",
        }
    }

    pub fn spec(&self) -> ModelSpec {
        match self {
            Cmip6Model::CMCC_CM2_VHR4_daily => ModelSpec {
                source: "CMCC-CM2-VHR4",
                institute: "CMCC",
                grid_label: "gr",
                grid: RegularGrid {
                    nx: 1152,
                    ny: 768,
                    lat_min: -90.0,
                    lon_min: -180.0,
                    dx: 0.3125,
                    dy: 180.0 / 768.0,
                },
                orography: Some(OrographyVersions {
                    altitude: "20210330",
                    landmask: "20210330",
                }),
            },
            Cmip6Model::FGOALS_f3_H_daily => ModelSpec {
                source: "FGOALS-f3-H",
                institute: "CAS",
                grid_label: "gr",
                grid: RegularGrid {
                    nx: 1440,
                    ny: 720,
                    lat_min: -90.0,
                    lon_min: -180.0,
                    dx: 0.25,
                    dy: 0.25,
                },
                orography: Some(OrographyVersions {
                    altitude: "20201204",
                    landmask: "20210121",
                }),
            },
            Cmip6Model::HiRAM_SIT_HR_daily => ModelSpec {
                source: "HiRAM-SIT-HR",
                institute: "AS-RCEC",
                grid_label: "gn",
                grid: RegularGrid {
                    nx: 1536,
                    ny: 768,
                    lat_min: -90.0,
                    lon_min: -180.0,
                    dx: 360.0 / 1536.0,
                    dy: 180.0 / 768.0,
                },
                orography: None,
            },
            Cmip6Model::MRI_AGCM3_2_S_daily => ModelSpec {
                source: "MRI-AGCM3-2-S",
                institute: "MRI",
                grid_label: "gn",
                grid: RegularGrid {
                    nx: 1920,
                    ny: 960,
                    lat_min: -90.0,
                    lon_min: -180.0,
                    dx: 0.1875,
                    dy: 0.1875,
                },
                orography: Some(OrographyVersions {
                    altitude: "20200305",
                    landmask: "20200305",
                }),
            },
        }
    }
}

impl fmt::Display for Cmip6Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cmip6Model {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cmip6Model::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownModel(s.to_string()))
    }
}

// -- Tests -------------------------------------------------------------------
