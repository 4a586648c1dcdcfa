//! Typed, defaulting access to one raw sample.
//!
//! Mirrors the best-effort field access the original SDK layer needed
//! exception handling for: here a missing or mistyped variable simply yields
//! the documented zero value. Each distinct missing name is recorded in a
//! run-wide set (owned by the engine, surfaced to clients as the
//! `missingVars` diagnostic) and logged at most once per run.

use std::collections::BTreeSet;

use tracing::warn;

use super::{RawSample, VarValue};
use crate::units::{ensure_non_negative, ensure_non_negative_i64, ensure_positive};

/// Borrowing reader over a [`RawSample`] plus the run-wide missing-name set.
pub struct SampleReader<'a> {
    sample: &'a RawSample,
    missing: &'a mut BTreeSet<String>,
}

impl<'a> SampleReader<'a> {
    pub fn new(sample: &'a RawSample, missing: &'a mut BTreeSet<String>) -> Self {
        Self { sample, missing }
    }

    fn record_missing(&mut self, name: &str) {
        if self.missing.insert(name.to_string()) {
            warn!(var = name, "source variable not available");
        }
    }

    fn lookup(&mut self, name: &str) -> Option<&'a VarValue> {
        let value = self.sample.var(name);
        if value.is_none() {
            self.record_missing(name);
        }
        value
    }

    /// Read a float variable, defaulting to `0.0`.
    ///
    /// Integer and double values coerce; other shapes count as missing.
    pub fn f32(&mut self, name: &str) -> f32 {
        match self.lookup(name) {
            Some(VarValue::Float(v)) => *v,
            Some(VarValue::Double(v)) => *v as f32,
            Some(VarValue::Int(v)) => *v as f32,
            _ => 0.0,
        }
    }

    /// Read a float and clamp it finite and non-negative.
    pub fn f32_pos(&mut self, name: &str) -> f32 {
        ensure_positive(self.f32(name))
    }

    /// Read a double variable, defaulting to `0.0`.
    pub fn f64(&mut self, name: &str) -> f64 {
        match self.lookup(name) {
            Some(VarValue::Double(v)) => *v,
            Some(VarValue::Float(v)) => *v as f64,
            _ => 0.0,
        }
    }

    /// Read an integer variable, defaulting to `0`.
    pub fn i32(&mut self, name: &str) -> i32 {
        match self.lookup(name) {
            Some(VarValue::Int(v)) => *v,
            Some(VarValue::Long(v)) => *v as i32,
            Some(VarValue::Bool(v)) => *v as i32,
            _ => 0,
        }
    }

    /// Read an integer and clamp it non-negative.
    pub fn i32_non_neg(&mut self, name: &str) -> i32 {
        ensure_non_negative(self.i32(name))
    }

    /// Read a long variable, defaulting to `0`.
    pub fn i64(&mut self, name: &str) -> i64 {
        match self.lookup(name) {
            Some(VarValue::Long(v)) => *v,
            Some(VarValue::Int(v)) => *v as i64,
            _ => 0,
        }
    }

    /// Read a long and clamp it non-negative.
    pub fn i64_non_neg(&mut self, name: &str) -> i64 {
        ensure_non_negative_i64(self.i64(name))
    }

    /// Read a boolean variable, defaulting to `false`.
    pub fn bool(&mut self, name: &str) -> bool {
        match self.lookup(name) {
            Some(VarValue::Bool(v)) => *v,
            Some(VarValue::Int(v)) => *v != 0,
            _ => false,
        }
    }

    /// Read a text variable, defaulting to empty.
    pub fn string(&mut self, name: &str) -> String {
        match self.lookup(name) {
            Some(VarValue::Text(v)) => v.clone(),
            _ => String::new(),
        }
    }

    /// Read a float array variable, defaulting to empty.
    pub fn f32s(&mut self, name: &str) -> Vec<f32> {
        match self.lookup(name) {
            Some(VarValue::FloatArray(v)) => v.clone(),
            _ => Vec::new(),
        }
    }

    /// Read a float array with every element clamped non-negative.
    pub fn f32s_pos(&mut self, name: &str) -> Vec<f32> {
        self.f32s(name).into_iter().map(ensure_positive).collect()
    }

    /// Read an integer array variable, defaulting to empty.
    pub fn i32s(&mut self, name: &str) -> Vec<i32> {
        match self.lookup(name) {
            Some(VarValue::IntArray(v)) => v.clone(),
            _ => Vec::new(),
        }
    }

    /// Read an integer array with every element clamped non-negative.
    pub fn i32s_non_neg(&mut self, name: &str) -> Vec<i32> {
        self.i32s(name).into_iter().map(ensure_non_negative).collect()
    }

    /// Read a boolean array variable, defaulting to empty.
    pub fn bools(&mut self, name: &str) -> Vec<bool> {
        match self.lookup(name) {
            Some(VarValue::BoolArray(v)) => v.clone(),
            _ => Vec::new(),
        }
    }
}
