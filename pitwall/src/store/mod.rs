//! Per car/track fuel history persistence.
//!
//! The engine is kept free of I/O: the service asks it for the current
//! car/track identity, fetches the stored record through this trait, and
//! writes an updated record back after each tick. Failures are logged and
//! swallowed; persistence is never allowed to take telemetry down.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::units::ensure_positive;

/// Long-run fuel figures for one car on one track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelRecord {
    pub avg_fuel_per_lap: f32,
    pub last_lap_fuel: f32,
    pub fuel_capacity: f32,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write store file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store file {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Async get/put seam consumed by the service.
#[async_trait]
pub trait FuelHistoryStore: Send + Sync {
    async fn get(&self, car: &str, track: &str) -> Option<FuelRecord>;
    async fn put(&self, car: &str, track: &str, record: FuelRecord);
}

/// Single-JSON-file store, the whole map rewritten on every put.
///
/// Writes are serialized by the map mutex, so updates for the same key
/// cannot land out of order.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, FuelRecord>>,
}

impl JsonFileStore {
    /// Open the store, loading any existing file. A missing or corrupt file
    /// degrades to an empty map with a warning.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::load(&path).await {
            Ok(map) => map,
            Err(err) => {
                warn!(error = %err, "fuel history unavailable, starting empty");
                HashMap::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    async fn load(path: &Path) -> Result<HashMap<String, FuelRecord>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(source) => Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn key(car: &str, track: &str) -> String {
        format!("{car}::{track}")
    }

    async fn flush(&self, entries: &HashMap<String, FuelRecord>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Write {
                    path: self.path.clone(),
                    source,
                })?;
        }
        let json = serde_json::to_vec_pretty(entries).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait]
impl FuelHistoryStore for JsonFileStore {
    async fn get(&self, car: &str, track: &str) -> Option<FuelRecord> {
        let entries = self.entries.lock().await;
        let record = entries.get(&Self::key(car, track)).cloned();
        debug!(car, track, found = record.is_some(), "fuel history lookup");
        record
    }

    async fn put(&self, car: &str, track: &str, record: FuelRecord) {
        let record = FuelRecord {
            avg_fuel_per_lap: ensure_positive(record.avg_fuel_per_lap),
            last_lap_fuel: ensure_positive(record.last_lap_fuel),
            fuel_capacity: ensure_positive(record.fuel_capacity),
        };
        let mut entries = self.entries.lock().await;
        entries.insert(Self::key(car, track), record);
        if let Err(err) = self.flush(&entries).await {
            warn!(error = %err, "fuel history write failed");
        }
    }
}
