//! Once-per-model surface elevation grid shared by all jobs of a model.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex},
};

use tokio::sync::OnceCell;

use crate::{catalog::Cmip6Model, errors::JobError, meteorology::NO_LAND};

/// Minimum land area fraction, in percent, for a cell to keep its altitude.
const LAND_THRESHOLD: f32 = 50.0;

type Cell = Arc<OnceCell<Result<Arc<Vec<f32>>, String>>>;

/// Memoizes the elevation grid per model.
///
/// Concurrent callers wait for the first initialization instead of starting
/// their own. A failed initialization is kept as well, so every later job of
/// that model fails the same way.
#[derive(Default)]
pub struct ElevationCache {
    cells: Mutex<HashMap<Cmip6Model, Cell>>,
}

impl ElevationCache {
    pub async fn get_or_init<F, Fut>(&self, model: Cmip6Model, init: F) -> Result<Arc<Vec<f32>>, JobError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<f32>, JobError>>,
    {
        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(cells.entry(model).or_default())
        };

        let result = cell
            .get_or_init(|| async move { init().await.map(Arc::new).map_err(|e| e.to_string()) })
            .await;

        result
            .clone()
            .map_err(|reason| JobError::ElevationUnavailable { model, reason })
    }
}

/// Replaces the altitude of cells that are mostly water with [`NO_LAND`].
pub fn mask_non_land(altitude: Vec<f32>, land_fraction: &[f32]) -> Vec<f32> {
    altitude
        .into_iter()
        .zip(land_fraction)
        .map(|(z, fraction)| if *fraction >= LAND_THRESHOLD { z } else { NO_LAND })
        .collect()
}

// -- Tests -------------------------------------------------------------------
