//! Static catalog of HighResMIP models, variables and archive locations.
//!
//! See <https://esgf-data.dkrz.de/search/cmip6-dkrz/> for the datasets.

pub mod model;
pub mod variable;

use chrono::{Datelike, NaiveDate};

pub use model::{Cmip6Model, RegularGrid};
pub use variable::{Cmip6Variable, Granularity};

/// ESGF THREDDS file servers, fastest first.
pub const MIRRORS: [&str; 5] = [
    "https://esgf3.dkrz.de/thredds/fileServer/cmip6/",
    "https://esgf.ceda.ac.uk/thredds/fileServer/esg_cmip6/",
    "https://esgf-data1.llnl.gov/thredds/fileServer/css03_data/CMIP6/",
    "https://esgf-data04.diasjp.net/thredds/fileServer/esg_dataroot/CMIP6/",
    "https://esg.lasg.ac.cn/thredds/fileServer/esg_dataroot/CMIP6/",
];

const EXPERIMENT: &str = "highresSST-present";
const MEMBER: &str = "r1i1p1f1";

/// Fixed fields used to build the elevation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedField {
    Orography,
    LandFraction,
}

impl FixedField {
    pub fn short_name(&self) -> &'static str {
        match self {
            FixedField::Orography => "orog",
            FixedField::LandFraction => "sftlf",
        }
    }
}

/// Relative archive path of a daily file covering `first..=last`.
pub fn daily_resource(
    model: Cmip6Model,
    short_name: &str,
    version: &str,
    first: NaiveDate,
    last: NaiveDate,
) -> String {
    let spec = model.spec();
    format!(
        "HighResMIP/{institute}/{source}/{EXPERIMENT}/{MEMBER}/day/{short_name}/{grid}/v{version}/{short_name}_day_{source}_{EXPERIMENT}_{MEMBER}_{grid}_{first}-{last}.nc",
        institute = spec.institute,
        source = spec.source,
        grid = spec.grid_label,
        first = first.format("%Y%m%d"),
        last = last.format("%Y%m%d"),
    )
}

/// Relative archive path of a fixed field, `None` if the model publishes no orography.
pub fn fixed_resource(model: Cmip6Model, field: FixedField) -> Option<String> {
    let spec = model.spec();
    let versions = spec.orography?;
    let version = match field {
        FixedField::Orography => versions.altitude,
        FixedField::LandFraction => versions.landmask,
    };
    let short_name = field.short_name();

    Some(format!(
        "HighResMIP/{institute}/{source}/{EXPERIMENT}/{MEMBER}/fx/{short_name}/{grid}/v{version}/{short_name}_fx_{source}_{EXPERIMENT}_{MEMBER}_{grid}.nc",
        institute = spec.institute,
        source = spec.source,
        grid = spec.grid_label,
    ))
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next.pred_opt()?;
    debug_assert_eq!(last.month(), month);

    Some((first, last))
}

/// First and last day of a calendar year.
pub fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_make_yearly_resource() {
        let (first, last) = year_bounds(1950).unwrap();
        let uri = daily_resource(Cmip6Model::FGOALS_f3_H_daily, "tas", "20190817", first, last);

        assert_eq!(
            uri,
            "HighResMIP/CAS/FGOALS-f3-H/highresSST-present/r1i1p1f1/day/tas/gr/v20190817/tas_day_FGOALS-f3-H_highresSST-present_r1i1p1f1_gr_19500101-19501231.nc"
        );
    }

    #[test]
    fn should_make_monthly_resource() {
        let (first, last) = month_bounds(1952, 2).unwrap();
        let uri = daily_resource(Cmip6Model::CMCC_CM2_VHR4_daily, "hurs", "20190725", first, last);

        assert!(uri.ends_with("hurs_day_CMCC-CM2-VHR4_highresSST-present_r1i1p1f1_gr_19520201-19520229.nc"));
    }

    #[test]
    fn should_make_fixed_resource() {
        let uri = fixed_resource(Cmip6Model::FGOALS_f3_H_daily, FixedField::LandFraction).unwrap();

        assert_eq!(
            uri,
            "HighResMIP/CAS/FGOALS-f3-H/highresSST-present/r1i1p1f1/fx/sftlf/gr/v20210121/sftlf_fx_FGOALS-f3-H_highresSST-present_r1i1p1f1_gr.nc"
        );
        assert!(fixed_resource(Cmip6Model::HiRAM_SIT_HR_daily, FixedField::Orography).is_none());
    }

    #[test]
    fn should_find_month_bounds() {
        let (first, last) = month_bounds(1950, 12).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(1950, 12, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(1950, 12, 31).unwrap());
        assert!(month_bounds(1950, 13).is_none());
    }
}
