//! Pitwall - live sim-racing telemetry backend.
//!
//! Polls a simulator data source on a fixed tick, derives race engineering
//! figures the raw feed does not carry (fuel accounting and projections,
//! tyre pit-transition baselines, sector deltas, relative gaps) and fans the
//! result out to WebSocket subscribers as one flat JSON object per tick.
//!
//! The crate is organized around one data path:
//!
//! - [`source`] produces a [`source::RawSample`] per tick behind the
//!   [`source::TelemetrySource`] trait; a scripted [`source::SimulatedSource`]
//!   stands in for the vendor SDK.
//! - [`session`] parses the YAML session descriptor, cached by session id.
//! - [`engine`] is the pure, I/O-free derivation core producing a
//!   [`model::TelemetrySnapshot`].
//! - [`store`] persists per car/track fuel history.
//! - [`payload`] defines the wire contract; [`broadcast`] fans it out.
//! - [`service`] is the tick scheduler tying the above together.

pub mod broadcast;
pub mod config;
pub mod decode;
pub mod engine;
pub mod model;
pub mod payload;
pub mod service;
pub mod session;
pub mod source;
pub mod store;
pub mod units;

pub use broadcast::{Broadcaster, PayloadProfile};
pub use config::Config;
pub use engine::DerivationEngine;
pub use model::TelemetrySnapshot;
pub use service::TelemetryService;
pub use source::{RawSample, SimulatedSource, TelemetrySource, VarValue};
pub use store::{FuelHistoryStore, FuelRecord, JsonFileStore};
