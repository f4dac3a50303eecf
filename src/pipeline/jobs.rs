//! Planning the (variable, year) jobs of a run.

use std::{collections::HashSet, fmt, ops::RangeInclusive};

use crate::catalog::{Cmip6Model, Cmip6Variable, Granularity};

/// One variable-year; monthly jobs convert twelve files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Job {
    pub variable: Cmip6Variable,
    pub year: i32,
    pub granularity: Granularity,
}

impl Job {
    /// One key per artifact the job produces.
    pub fn keys(&self, model: Cmip6Model) -> Vec<JobKey> {
        match self.granularity {
            Granularity::Yearly => vec![JobKey {
                model,
                variable: self.variable,
                year: self.year,
                month: None,
            }],
            Granularity::Monthly => (1..=12)
                .map(|month| JobKey {
                    model,
                    variable: self.variable,
                    year: self.year,
                    month: Some(month),
                })
                .collect(),
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.variable, self.year)
    }
}

/// Identifies a single output artifact, so no two jobs ever write the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub model: Cmip6Model,
    pub variable: Cmip6Variable,
    pub year: i32,
    pub month: Option<u32>,
}

/// Cross product of `variables` and `years`, keeping only variables the model
/// publishes and dropping duplicates.
pub fn plan_jobs(model: Cmip6Model, variables: &[Cmip6Variable], years: RangeInclusive<i32>) -> Vec<Job> {
    let mut seen = HashSet::new();
    let mut jobs = Vec::new();

    for variable in variables {
        let Some(granularity) = variable.granularity(model) else {
            continue;
        };
        for year in years.clone() {
            let job = Job {
                variable: *variable,
                year,
                granularity,
            };
            let mut is_new = false;
            for key in job.keys(model) {
                is_new |= seen.insert(key);
            }
            if is_new {
                jobs.push(job);
            }
        }
    }

    jobs
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_skip_variables_without_granularity() {
        let jobs = plan_jobs(
            Cmip6Model::CMCC_CM2_VHR4_daily,
            &Cmip6Variable::ALL,
            1950..=1951,
        );

        assert_eq!(jobs.len(), 8);
        assert!(jobs.iter().all(|j| j.variable != Cmip6Variable::runoff));
        assert!(jobs.contains(&Job {
            variable: Cmip6Variable::precipitation,
            year: 1951,
            granularity: Granularity::Yearly,
        }));
    }

    #[test]
    fn should_deduplicate_repeated_variables() {
        let variables = [
            Cmip6Variable::temperature_2m,
            Cmip6Variable::temperature_2m,
            Cmip6Variable::pressure_msl,
        ];
        let jobs = plan_jobs(Cmip6Model::FGOALS_f3_H_daily, &variables, 1950..=1952);

        assert_eq!(jobs.len(), 6);
    }

    #[test]
    fn should_key_each_month() {
        let job = Job {
            variable: Cmip6Variable::windspeed_10m,
            year: 1950,
            granularity: Granularity::Monthly,
        };
        let keys = job.keys(Cmip6Model::CMCC_CM2_VHR4_daily);

        assert_eq!(keys.len(), 12);
        assert_eq!(keys[11].month, Some(12));
    }
}
