//! Run configuration and the on-disk directory layout.

use std::{
    ops::RangeInclusive,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    catalog::{Cmip6Model, Cmip6Variable, MIRRORS},
    errors::ConfigError,
};

/// Raw, rewrapped and transposed copies of one leap year of `f32` values.
const BYTES_PER_LOCATION_YEAR: usize = 3 * 366 * 4;

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub data_dir: PathBuf,
    pub years: RangeInclusive<i32>,
    /// Overrides the memory based concurrency estimate.
    pub concurrency: Option<usize>,
    pub memory_budget_mb: usize,
    pub request_timeout: Duration,
    pub mirrors: Vec<String>,
    /// Remove downloaded source files after the run.
    pub cleanup: bool,
}

impl DownloadConfig {
    pub fn new(data_dir: Option<PathBuf>, start_year: i32, end_year: i32) -> Result<Self, ConfigError> {
        if start_year > end_year {
            return Err(ConfigError::InvalidYearRange {
                start: start_year,
                end: end_year,
            });
        }
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .ok_or(ConfigError::NoHomeDirectory)?
                .join("cmip6"),
        };

        Ok(DownloadConfig {
            data_dir,
            years: start_year..=end_year,
            concurrency: None,
            memory_budget_mb: 4096,
            request_timeout: Duration::from_secs(3 * 3600),
            mirrors: MIRRORS.iter().map(|m| m.to_string()).collect(),
            cleanup: false,
        })
    }

    /// Number of jobs to run at once for `model`.
    ///
    /// Limited by the memory one yearly series needs and by the CPU count.
    pub fn concurrency(&self, model: Cmip6Model) -> usize {
        if let Some(n) = self.concurrency {
            return n.max(1);
        }
        let per_job = model.spec().grid.n_locations() * BYTES_PER_LOCATION_YEAR;
        let by_memory = self.memory_budget_mb * 1024 * 1024 / per_job.max(1);
        let cpus = std::thread::available_parallelism().map_or(1, |n| n.get());

        by_memory.clamp(1, cpus)
    }
}

/// Directories used for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    /// Scratch space for downloaded source files.
    pub download_dir: PathBuf,
    /// Converted yearly and monthly series.
    pub archive_dir: PathBuf,
    /// Long lived static fields such as the elevation grid.
    pub static_dir: PathBuf,
}

impl DataLayout {
    pub fn new(data_dir: &Path, model: Cmip6Model) -> Self {
        DataLayout {
            download_dir: data_dir.join(format!("download-{model}")),
            archive_dir: data_dir.join(format!("archive-{model}")),
            static_dir: data_dir.join(format!("store-{model}")),
        }
    }

    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.download_dir)?;
        std::fs::create_dir_all(&self.archive_dir)?;
        std::fs::create_dir_all(&self.static_dir)
    }

    pub fn source_file(&self, name: &str) -> PathBuf {
        self.download_dir.join(format!("{name}.nc"))
    }

    pub fn yearly_artifact(&self, variable: Cmip6Variable, year: i32) -> PathBuf {
        self.archive_dir.join(format!("{variable}_{year}.parquet"))
    }

    pub fn monthly_artifact(&self, variable: Cmip6Variable, year: i32, month: u32) -> PathBuf {
        self.archive_dir.join(format!("{variable}_{year}{month:02}.parquet"))
    }

    pub fn elevation_artifact(&self) -> PathBuf {
        self.static_dir.join("HSURF.parquet")
    }
}

// -- Tests -------------------------------------------------------------------
