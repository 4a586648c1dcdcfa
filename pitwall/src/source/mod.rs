//! Raw data source boundary.
//!
//! The simulator SDK is an external collaborator; the core only sees the
//! [`TelemetrySource`] trait. A source hands out one [`RawSample`] per poll:
//! a bag of named scalar/array variables plus the (rarely changing) session
//! descriptor text and a monotonically increasing tick counter. Every named
//! variable is treated as potentially absent — the [`SampleReader`] wrapper
//! substitutes documented zero values and records missing names once per run.

mod reader;
mod simulated;

pub use reader::SampleReader;
pub use simulated::SimulatedSource;

use std::collections::HashMap;

/// One value reported by the raw data source.
///
/// Variant shapes mirror what the simulator SDKs expose: scalars of a few
/// widths plus fixed-length per-car arrays.
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    Float(f32),
    Double(f64),
    Int(i32),
    Long(i64),
    Bool(bool),
    Text(String),
    FloatArray(Vec<f32>),
    IntArray(Vec<i32>),
    BoolArray(Vec<bool>),
}

/// One tick's worth of raw data.
///
/// Ephemeral: produced by a source poll and consumed by the derivation
/// engine within the same tick, never persisted.
#[derive(Debug, Clone, Default)]
pub struct RawSample {
    /// Monotonically increasing tick counter from the source.
    pub tick: i32,

    /// Raw session descriptor text, when the source exposes one.
    pub descriptor: Option<String>,

    vars: HashMap<String, VarValue>,
}

impl RawSample {
    /// Create an empty sample for the given tick.
    pub fn new(tick: i32) -> Self {
        Self {
            tick,
            descriptor: None,
            vars: HashMap::new(),
        }
    }

    /// Builder-style variable insertion.
    pub fn with_var(mut self, name: impl Into<String>, value: VarValue) -> Self {
        self.vars.insert(name.into(), value);
        self
    }

    /// Builder-style descriptor attachment.
    pub fn with_descriptor(mut self, text: impl Into<String>) -> Self {
        self.descriptor = Some(text.into());
        self
    }

    /// Insert or replace a variable.
    pub fn set_var(&mut self, name: impl Into<String>, value: VarValue) {
        self.vars.insert(name.into(), value);
    }

    /// Look up a variable by its source name.
    pub fn var(&self, name: &str) -> Option<&VarValue> {
        self.vars.get(name)
    }

    /// Names of every variable present in this sample, unordered.
    pub fn var_names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Number of variables present.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the sample carries no variables.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Polled access to a live simulation data source.
///
/// Implementations wrap whatever vendor SDK is in use. `poll` returns the
/// latest sample; the scheduler compares `RawSample::tick` against the
/// previously seen counter and skips unchanged ticks.
pub trait TelemetrySource: Send {
    /// Whether the underlying SDK currently has a simulator connection.
    fn connected(&self) -> bool;

    /// Whether the source has been started.
    fn started(&self) -> bool;

    /// Fetch the latest sample, if any is available.
    fn poll(&mut self) -> Option<RawSample>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_sample_builder() {
        let sample = RawSample::new(7)
            .with_var("Speed", VarValue::Float(42.0))
            .with_descriptor("WeekendInfo:\n");
        assert_eq!(sample.tick, 7);
        assert_eq!(sample.var("Speed"), Some(&VarValue::Float(42.0)));
        assert!(sample.var("RPM").is_none());
        assert_eq!(sample.descriptor.as_deref(), Some("WeekendInfo:\n"));
        assert_eq!(sample.len(), 1);
    }
}
