//! Frequency/confidence truth values and the truth functions used by the
//! rule layer. Evidence amounts convert through the evidential horizon:
//! `w = k·c / (1 − c)` and `c = w / (w + k)`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::budget::{and, or};
use crate::constants::{HORIZON, MAX_CONFIDENCE};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TruthValue {
    frequency: f32,
    confidence: f32,
}

impl TruthValue {
    /// Frequency is clamped to [0, 1]; confidence to [0, MAX_CONFIDENCE].
    pub fn new(frequency: f32, confidence: f32) -> Self {
        Self {
            frequency: frequency.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, MAX_CONFIDENCE),
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// `c·(f − ½) + ½`
    pub fn expectation(&self) -> f32 {
        self.confidence * (self.frequency - 0.5) + 0.5
    }

    /// Absolute difference of expectations.
    pub fn expectation_distance(&self, other: &TruthValue) -> f32 {
        (self.expectation() - other.expectation()).abs()
    }

    /// Two-decimal rendering used in report lines, e.g. `%1.00;0.90%`.
    pub fn brief(&self) -> String {
        format!("%{:.2};{:.2}%", self.frequency, self.confidence)
    }
}

impl fmt::Display for TruthValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{:.4};{:.4}%", self.frequency, self.confidence)
    }
}

pub fn w2c(w: f32) -> f32 {
    w / (w + HORIZON)
}

pub fn c2w(c: f32) -> f32 {
    HORIZON * c / (1.0 - c)
}

// ---------------------------------------------------------------------------
// Single-premise functions
// ---------------------------------------------------------------------------

pub fn conversion(v: &TruthValue) -> TruthValue {
    let w = and(&[v.frequency, v.confidence]);
    TruthValue::new(1.0, w2c(w))
}

pub fn negation(v: &TruthValue) -> TruthValue {
    TruthValue::new(1.0 - v.frequency, v.confidence)
}

// ---------------------------------------------------------------------------
// Double-premise functions
// ---------------------------------------------------------------------------

/// Pool the evidence of two premises about the same content.
pub fn revision(v1: &TruthValue, v2: &TruthValue) -> TruthValue {
    let w1 = c2w(v1.confidence);
    let w2 = c2w(v2.confidence);
    let w = w1 + w2;
    let f = (w1 * v1.frequency + w2 * v2.frequency) / w;
    TruthValue::new(f, w2c(w))
}

pub fn deduction(v1: &TruthValue, v2: &TruthValue) -> TruthValue {
    let f = and(&[v1.frequency, v2.frequency]);
    let c = and(&[f, v1.confidence, v2.confidence]);
    TruthValue::new(f, c)
}

pub fn analogy(v1: &TruthValue, v2: &TruthValue) -> TruthValue {
    let f = and(&[v1.frequency, v2.frequency]);
    let c = and(&[v1.confidence, v2.confidence, v2.frequency]);
    TruthValue::new(f, c)
}

pub fn resemblance(v1: &TruthValue, v2: &TruthValue) -> TruthValue {
    let f = and(&[v1.frequency, v2.frequency]);
    let c = and(&[v1.confidence, v2.confidence, or(&[v1.frequency, v2.frequency])]);
    TruthValue::new(f, c)
}

pub fn abduction(v1: &TruthValue, v2: &TruthValue) -> TruthValue {
    let w = and(&[v2.frequency, v1.confidence, v2.confidence]);
    TruthValue::new(v1.frequency, w2c(w))
}

pub fn induction(v1: &TruthValue, v2: &TruthValue) -> TruthValue {
    abduction(v2, v1)
}

pub fn exemplification(v1: &TruthValue, v2: &TruthValue) -> TruthValue {
    let w = and(&[v1.frequency, v2.frequency, v1.confidence, v2.confidence]);
    TruthValue::new(1.0, w2c(w))
}

pub fn comparison(v1: &TruthValue, v2: &TruthValue) -> TruthValue {
    let f0 = or(&[v1.frequency, v2.frequency]);
    let f = if f0 == 0.0 {
        0.0
    } else {
        and(&[v1.frequency, v2.frequency]) / f0
    };
    let w = and(&[f0, v1.confidence, v2.confidence]);
    TruthValue::new(f, w2c(w))
}

pub fn intersection(v1: &TruthValue, v2: &TruthValue) -> TruthValue {
    TruthValue::new(
        and(&[v1.frequency, v2.frequency]),
        and(&[v1.confidence, v2.confidence]),
    )
}

pub fn union(v1: &TruthValue, v2: &TruthValue) -> TruthValue {
    TruthValue::new(
        or(&[v1.frequency, v2.frequency]),
        and(&[v1.confidence, v2.confidence]),
    )
}
