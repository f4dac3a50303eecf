use std::{fmt, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::{
    catalog::{Cmip6Model, Cmip6Variable},
    cli::{create_progress_bar, create_spinner, DownloadArgs},
    config::{DataLayout, DownloadConfig},
    download::{HttpTransport, MirrorFetcher},
    pipeline::{plan_jobs, JobOutcome, JobReport, Pipeline},
    reading::NetcdfDecoder,
    store::ParquetStore,
};

/// Counts of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub model: Cmip6Model,
    pub artifacts: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_reports(model: Cmip6Model, reports: &[JobReport]) -> Self {
        let mut summary = RunSummary {
            model,
            artifacts: 0,
            skipped: 0,
            failed: 0,
        };
        for report in reports {
            match &report.result {
                Ok(JobOutcome::Skipped) => summary.skipped += 1,
                Ok(JobOutcome::Persisted { artifacts }) => summary.artifacts += artifacts.len(),
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} artifacts written, {} jobs already done, {} jobs failed",
            self.model, self.artifacts, self.skipped, self.failed
        )
    }
}

fn make_config(args: &DownloadArgs) -> Result<DownloadConfig> {
    let mut config = DownloadConfig::new(args.data_dir.clone(), args.start_year, args.end_year)?;
    config.concurrency = args.concurrency;
    config.memory_budget_mb = args.memory_budget_mb;
    config.request_timeout = Duration::from_secs(args.timeout_secs);
    config.cleanup = args.cleanup;

    Ok(config)
}

pub async fn download(args: DownloadArgs) -> Result<RunSummary> {
    // an unknown model stops everything before any download
    let model: Cmip6Model = args.model.parse()?;
    let config = make_config(&args)?;

    let layout = DataLayout::new(&config.data_dir, model);
    layout
        .create_dirs()
        .with_context(|| format!("Failed to create directories in {}", config.data_dir.display()))?;

    let transport = HttpTransport::new(config.request_timeout)?;
    let fetcher = MirrorFetcher::new(Arc::new(transport), config.mirrors.clone());
    let pipeline = Pipeline::new(
        model,
        layout,
        fetcher,
        Arc::new(NetcdfDecoder),
        Arc::new(ParquetStore),
    );

    let bar = create_spinner(format!("Preparing elevation grid of {model}..."));
    if let Err(e) = pipeline.prepare().await {
        bar.abandon_with_message("Elevation grid unavailable");
        error!(%model, error = %e, "Cannot prepare elevation grid");
        return Err(e).context(format!("No job of {model} can run"));
    }
    bar.finish_with_message("Elevation grid ready");

    let jobs = plan_jobs(model, &Cmip6Variable::ALL, config.years.clone());
    let concurrency = config.concurrency(model);
    info!(%model, jobs = jobs.len(), concurrency, "Starting conversion");

    let bar = create_progress_bar(jobs.len() as u64, format!("Converting {model}"));
    let reports = pipeline
        .run(jobs, concurrency, |report| {
            bar.set_message(report.job.to_string());
            bar.inc(1);
        })
        .await;
    bar.finish_with_message(format!("{model} converted"));

    let summary = RunSummary::from_reports(model, &reports);
    info!(
        %model,
        artifacts = summary.artifacts,
        skipped = summary.skipped,
        failed = summary.failed,
        "Run finished"
    );

    if config.cleanup {
        pipeline
            .cleanup_downloads()
            .context("Failed to remove downloaded files")?;
    }

    Ok(summary)
}

// -- Tests -------------------------------------------------------------------
