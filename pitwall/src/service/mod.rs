//! Tick scheduler.
//!
//! One fixed-period loop drives the whole backend: poll the source, run the
//! derivation engine, serialize the two payload profiles once each, fan out,
//! and persist fuel history. Any per-tick failure is logged and that tick
//! skipped; the loop exits only on cancellation.

use std::sync::Arc;

use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::broadcast::Broadcaster;
use crate::config::Config;
use crate::engine::DerivationEngine;
use crate::payload::{FrontendPayload, InputsPayload};
use crate::source::TelemetrySource;
use crate::store::FuelHistoryStore;

pub struct TelemetryService<S: TelemetrySource> {
    config: Config,
    source: S,
    engine: DerivationEngine,
    store: Arc<dyn FuelHistoryStore>,
    broadcaster: Arc<Broadcaster>,
    last_tick: i32,
    logged_vars: bool,
}

impl<S: TelemetrySource> TelemetryService<S> {
    pub fn new(
        config: Config,
        source: S,
        store: Arc<dyn FuelHistoryStore>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            config,
            source,
            engine: DerivationEngine::new(),
            store,
            broadcaster,
            last_tick: -1,
            logged_vars: false,
        }
    }

    pub fn broadcaster(&self) -> Arc<Broadcaster> {
        Arc::clone(&self.broadcaster)
    }

    /// Run the tick loop until the token is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let period = Duration::from_millis(self.config.tick_interval_ms);
        let mut ticker = interval(period);
        // A stalled source must not cause a burst of catch-up ticks.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_ms = self.config.tick_interval_ms, "telemetry service started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("telemetry service stopping");
                    return;
                }
                _ = ticker.tick() => self.step().await,
            }
        }
    }

    async fn step(&mut self) {
        if !self.source.connected() || !self.source.started() {
            return;
        }
        let Some(sample) = self.source.poll() else {
            return;
        };
        if sample.tick == self.last_tick {
            return;
        }
        self.last_tick = sample.tick;

        if !self.logged_vars {
            self.logged_vars = true;
            let mut names: Vec<&str> = sample.var_names().collect();
            names.sort_unstable();
            info!(count = names.len(), vars = ?names, "source variables available");
        }

        let snapshot = self.engine.process(&sample);

        // Seed the fuel average from history once per car/track identity.
        if self.engine.awaiting_stored() {
            if let Some((car, track)) = self.engine.car_track_identity() {
                let (car, track) = (car.to_string(), track.to_string());
                let stored = self.store.get(&car, &track).await;
                self.engine.apply_stored(stored.as_ref());
            }
        }

        let full = match FrontendPayload::new(&snapshot).to_json() {
            Ok(json) => json,
            Err(err) => {
                error!(error = %err, "full payload serialization failed, skipping tick");
                return;
            }
        };
        let inputs = match InputsPayload::from_snapshot(&snapshot).to_json() {
            Ok(json) => json,
            Err(err) => {
                error!(error = %err, "inputs payload serialization failed, skipping tick");
                return;
            }
        };
        self.broadcaster.broadcast(&full, &inputs).await;

        if let Some((car, track)) = self.engine.car_track_identity() {
            let record = self.engine.persist_record(&snapshot);
            if record.avg_fuel_per_lap > 0.0 || record.fuel_capacity > 0.0 {
                let (car, track) = (car.to_string(), track.to_string());
                self.store.put(&car, &track, record).await;
            } else {
                debug!("no fuel figures yet, skipping history write");
            }
        }
    }
}
