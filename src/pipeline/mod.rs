//! Drives the jobs of one model from download to persisted artifacts.

pub mod elevation;
pub mod jobs;

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::NaiveDate;
use futures::{stream, StreamExt};
use tracing::{debug, info, instrument, trace, warn};

use crate::{
    array::{TimeMajorArray, Transform},
    catalog::{
        daily_resource, fixed_resource, month_bounds, year_bounds, Cmip6Model, Cmip6Variable,
        FixedField, Granularity, RegularGrid,
    },
    config::DataLayout,
    download::{FetchOutcome, MirrorFetcher},
    errors::{ConfigError, DecodeError, JobError, StoreError},
    meteorology::relative_humidity_from_specific,
    reading::{self, SourceDecoder},
    store::{ArrayShape, ArrayStore, StoreReader, StoreWriter},
};

use elevation::{mask_non_land, ElevationCache};
pub use jobs::{plan_jobs, Job};

/// Locations per chunk of a yearly series.
const YEARLY_CHUNK_LOCATIONS: usize = 6;
/// Side of a square elevation chunk.
const ELEVATION_CHUNK: usize = 20;

/// Steps a job passes through; a job that fails stops at the step it was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    AuxiliaryReady,
    SourceFetched,
    Normalized,
    Derived,
    Persisted,
}

fn enter(state: JobState) {
    trace!(?state, "Job state");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Every artifact of the job already existed.
    Skipped,
    Persisted { artifacts: Vec<PathBuf> },
}

#[derive(Debug)]
pub struct JobReport {
    pub job: Job,
    pub result: Result<JobOutcome, JobError>,
}

/// One source file of a job: the whole year or a single month.
struct Period {
    label: String,
    first: NaiveDate,
    last: NaiveDate,
    artifact: PathBuf,
    granularity: Granularity,
}

pub struct Pipeline {
    model: Cmip6Model,
    grid: RegularGrid,
    layout: DataLayout,
    fetcher: MirrorFetcher,
    decoder: Arc<dyn SourceDecoder>,
    store: Arc<dyn ArrayStore>,
    elevation_cache: ElevationCache,
}

impl Pipeline {
    pub fn new(
        model: Cmip6Model,
        layout: DataLayout,
        fetcher: MirrorFetcher,
        decoder: Arc<dyn SourceDecoder>,
        store: Arc<dyn ArrayStore>,
    ) -> Self {
        Pipeline {
            model,
            grid: model.spec().grid,
            layout,
            fetcher,
            decoder,
            store,
            elevation_cache: ElevationCache::default(),
        }
    }

    #[cfg(test)]
    fn with_grid(mut self, grid: RegularGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Builds the elevation grid up front, so the first jobs do not all wait on it.
    pub async fn prepare(&self) -> Result<(), JobError> {
        if self.model.spec().orography.is_some() {
            self.elevation().await?;
        }
        Ok(())
    }

    /// Runs `jobs` with at most `concurrency` in flight. `on_done` is called as
    /// each job finishes; failed jobs do not stop the others.
    pub async fn run<F>(&self, jobs: Vec<Job>, concurrency: usize, mut on_done: F) -> Vec<JobReport>
    where
        F: FnMut(&JobReport),
    {
        let mut reports = Vec::with_capacity(jobs.len());
        let mut results = stream::iter(jobs)
            .map(|job| async move {
                let result = self.run_job(job).await;
                JobReport { job, result }
            })
            .buffer_unordered(concurrency.max(1));

        while let Some(report) = results.next().await {
            if let Err(e) = &report.result {
                warn!(model = %self.model, job = %report.job, error = %e, "Job failed");
            }
            on_done(&report);
            reports.push(report);
        }

        reports
    }

    #[instrument(skip_all, fields(model = %self.model, variable = %job.variable, year = job.year))]
    pub async fn run_job(&self, job: Job) -> Result<JobOutcome, JobError> {
        let pending: Vec<Period> = self
            .periods(&job)?
            .into_iter()
            .filter(|p| !p.artifact.exists())
            .collect();
        if pending.is_empty() {
            debug!("All artifacts exist, skipping");
            return Ok(JobOutcome::Skipped);
        }

        // elevation failures are fatal for every job of the model
        let elevation = match self.model.spec().orography {
            Some(_) => Some(self.elevation().await?),
            None => None,
        };
        enter(JobState::AuxiliaryReady);

        let mut artifacts = Vec::with_capacity(pending.len());
        for period in pending {
            self.convert(job.variable, &period, elevation.clone()).await?;
            artifacts.push(period.artifact);
        }

        Ok(JobOutcome::Persisted { artifacts })
    }

    /// Removes all downloaded source files.
    pub fn cleanup_downloads(&self) -> std::io::Result<()> {
        if self.layout.download_dir.exists() {
            fs::remove_dir_all(&self.layout.download_dir)?;
            info!(path = %self.layout.download_dir.display(), "Removed downloaded source files");
        }
        Ok(())
    }

    fn periods(&self, job: &Job) -> Result<Vec<Period>, ConfigError> {
        if job.variable.granularity(self.model) != Some(job.granularity) {
            return Err(ConfigError::UndefinedGranularity {
                model: self.model,
                variable: job.variable,
            });
        }
        let invalid = || ConfigError::InvalidYearRange {
            start: job.year,
            end: job.year,
        };

        match job.granularity {
            Granularity::Yearly => {
                let (first, last) = year_bounds(job.year).ok_or_else(invalid)?;
                Ok(vec![Period {
                    label: job.year.to_string(),
                    first,
                    last,
                    artifact: self.layout.yearly_artifact(job.variable, job.year),
                    granularity: Granularity::Yearly,
                }])
            }
            Granularity::Monthly => (1..=12)
                .map(|month| -> Result<Period, ConfigError> {
                    let (first, last) = month_bounds(job.year, month).ok_or_else(invalid)?;
                    Ok(Period {
                        label: format!("{}{month:02}", job.year),
                        first,
                        last,
                        artifact: self.layout.monthly_artifact(job.variable, job.year, month),
                        granularity: Granularity::Monthly,
                    })
                })
                .collect(),
        }
    }

    /// Fetch, normalize, derive if needed and persist one period of `variable`.
    async fn convert(
        &self,
        variable: Cmip6Variable,
        period: &Period,
        elevation: Option<Arc<Vec<f32>>>,
    ) -> Result<(), JobError> {
        let derivation = variable.derivation(self.model);
        let (short_name, transform) = match derivation {
            Some(d) => (d.source_short_name(), Some(d.source_transform())),
            None => (variable.short_name(), variable.transform()),
        };

        let source = self
            .fetch_daily(short_name, variable.version(self.model), period)
            .await?;
        enter(JobState::SourceFetched);
        let mut array = self.load_source(source, short_name, transform).await?;
        enter(JobState::Normalized);

        if let Some(derivation) = derivation {
            let elevation = elevation.ok_or(ConfigError::MissingElevation(self.model))?;
            let [pressure, temperature] = derivation.auxiliaries();
            let pressure = self.fetch_and_load(pressure, period).await?;
            let temperature = self.fetch_and_load(temperature, period).await?;

            let specific_humidity = array;
            array = tokio::task::spawn_blocking(move || {
                relative_humidity_from_specific(&specific_humidity, &temperature, &pressure, &elevation)
            })
            .await??;
            enter(JobState::Derived);
        }

        let chunk_locations = match period.granularity {
            Granularity::Yearly => YEARLY_CHUNK_LOCATIONS,
            Granularity::Monthly => self.grid.nx,
        };
        let shape = ArrayShape::new(array.n_locations, array.n_time, chunk_locations, array.n_time);
        self.persist(period.artifact.clone(), shape, variable.scale_factor(), array.data)
            .await?;
        enter(JobState::Persisted);
        info!(path = %period.artifact.display(), "Artifact written");

        Ok(())
    }

    async fn fetch_daily(
        &self,
        short_name: &str,
        version: &str,
        period: &Period,
    ) -> Result<PathBuf, JobError> {
        let resource = daily_resource(self.model, short_name, version, period.first, period.last);
        let destination = self
            .layout
            .source_file(&format!("{short_name}_{}", period.label));

        self.fetch(&resource, &destination).await?;
        Ok(destination)
    }

    async fn fetch(&self, resource: &str, destination: &Path) -> Result<(), JobError> {
        match self.fetcher.fetch(resource, destination).await? {
            FetchOutcome::AlreadyPresent => {
                trace!(path = %destination.display(), "Source file reused")
            }
            FetchOutcome::Downloaded { mirror, bytes } => {
                debug!(path = %destination.display(), mirror, bytes, "Source file downloaded")
            }
        }
        Ok(())
    }

    /// Fetches and loads an auxiliary variable for the same period.
    async fn fetch_and_load(&self, variable: Cmip6Variable, period: &Period) -> Result<TimeMajorArray, JobError> {
        let short_name = variable.short_name();
        let path = self
            .fetch_daily(short_name, variable.version(self.model), period)
            .await?;

        self.load_source(path, short_name, variable.transform()).await
    }

    async fn load_source(
        &self,
        path: PathBuf,
        name: &'static str,
        transform: Option<Transform>,
    ) -> Result<TimeMajorArray, JobError> {
        let decoder = Arc::clone(&self.decoder);
        let array =
            tokio::task::spawn_blocking(move || reading::load(decoder.as_ref(), &path, name, transform))
                .await??;

        let expected = self.grid.n_locations();
        if array.n_locations != expected {
            return Err(DecodeError::ShapeMismatch {
                name: name.to_string(),
                expected,
                got: array.n_locations,
            }
            .into());
        }

        Ok(array)
    }

    async fn persist(
        &self,
        path: PathBuf,
        shape: ArrayShape,
        scale_factor: f32,
        data: Vec<f32>,
    ) -> Result<(), JobError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.write(&path, shape, scale_factor, &data)).await??;

        Ok(())
    }

    async fn elevation(&self) -> Result<Arc<Vec<f32>>, JobError> {
        self.elevation_cache
            .get_or_init(self.model, || self.build_elevation())
            .await
    }

    async fn fetch_fixed(&self, field: FixedField) -> Result<TimeMajorArray, JobError> {
        let resource = fixed_resource(self.model, field).ok_or(ConfigError::MissingElevation(self.model))?;
        let short_name = field.short_name();
        let destination = self.layout.source_file(&format!("{short_name}_fx"));

        self.fetch(&resource, &destination).await?;
        self.load_source(destination, short_name, None).await
    }

    /// Reads the elevation grid from the store, or builds it from the `orog`
    /// and `sftlf` fixed fields and stores it.
    async fn build_elevation(&self) -> Result<Vec<f32>, JobError> {
        let artifact = self.layout.elevation_artifact();
        let n_locations = self.grid.n_locations();

        if artifact.exists() {
            let store = Arc::clone(&self.store);
            let path = artifact.clone();
            let data = tokio::task::spawn_blocking(move || store.open(&path)?.read_all()).await??;
            if data.len() != n_locations {
                return Err(StoreError::InvalidShape(format!(
                    "{} holds {} cells, expected {n_locations}",
                    artifact.display(),
                    data.len()
                ))
                .into());
            }
            info!(model = %self.model, path = %artifact.display(), "Elevation grid read from store");
            return Ok(data);
        }

        let altitude = self.fetch_fixed(FixedField::Orography).await?;
        let land_fraction = self.fetch_fixed(FixedField::LandFraction).await?;

        let elevation = mask_non_land(altitude.data, &land_fraction.data);
        let shape = ArrayShape::new(self.grid.ny, self.grid.nx, ELEVATION_CHUNK, ELEVATION_CHUNK);
        let store = Arc::clone(&self.store);
        let path = artifact.clone();
        // read back, so jobs see the same quantized grid a later run would
        let elevation = tokio::task::spawn_blocking(move || {
            store.write(&path, shape, 1.0, &elevation)?;
            store.open(&path)?.read_all()
        })
        .await??;
        info!(model = %self.model, path = %artifact.display(), "Elevation grid stored");

        Ok(elevation)
    }
}

// -- Tests -------------------------------------------------------------------
