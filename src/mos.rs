//! Mapping from perceptual distance to a mean opinion score.

use serde::{Deserialize, Serialize};

/// Sigmoid `a / (b + exp(c * d))` fitted to listening-test MOS.
const SIGMOID_PARAMS: [f64; 3] = [1.0, -7.449e-9, 53.17];

fn sigmoid(distance: f64) -> f64 {
    let [a, b, c] = SIGMOID_PARAMS;
    a / (b + (c * distance).exp())
}

/// Approximate MOS in [1, 5] for a distance in [0, 1].
///
/// Out-of-range distances are clamped first and NaN counts as the worst
/// distance. `mos_from_distance(0.0)` is exactly 5.
pub fn mos_from_distance(distance: f64) -> f64 {
    let d = if distance.is_nan() {
        1.0
    } else {
        distance.clamp(0.0, 1.0)
    };
    1.0 + 4.0 * (sigmoid(d) / sigmoid(0.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Bad,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Quality {
    pub fn from_mos(mos: f64) -> Self {
        if mos >= 4.5 {
            Quality::Excellent
        } else if mos >= 4.0 {
            Quality::Good
        } else if mos >= 3.0 {
            Quality::Fair
        } else if mos >= 2.0 {
            Quality::Poor
        } else {
            Quality::Bad
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::Excellent => "Excellent",
            Quality::Good => "Good",
            Quality::Fair => "Fair",
            Quality::Poor => "Poor",
            Quality::Bad => "Bad",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
