use std::fmt;

use serde::{Deserialize, Serialize};

/// The three axes of the semantic space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Certainty,
    Granularity,
    Verification,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Certainty, Axis::Granularity, Axis::Verification];

    pub fn name(self) -> &'static str {
        match self {
            Axis::Certainty => "certainty",
            Axis::Granularity => "granularity",
            Axis::Verification => "verification",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point in the (certainty, granularity, verification) space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// How well established the knowledge is, in [0, 100].
    pub certainty: f64,
    /// How fine-grained the knowledge is, in [1, 1000].
    pub granularity: f64,
    /// Domain-defined verification axis.
    pub verification: f64,
}

impl Coordinates {
    pub fn new(certainty: f64, granularity: f64, verification: f64) -> Self {
        Self {
            certainty,
            granularity,
            verification,
        }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Certainty => self.certainty,
            Axis::Granularity => self.granularity,
            Axis::Verification => self.verification,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::Certainty => self.certainty = value,
            Axis::Granularity => self.granularity = value,
            Axis::Verification => self.verification = value,
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.certainty, self.granularity, self.verification]
    }

    pub fn is_finite(&self) -> bool {
        self.as_array().iter().all(|v| v.is_finite())
    }

    /// Euclidean distance in the raw 3-axis space.
    pub fn distance(&self, other: &Coordinates) -> f64 {
        let dc = self.certainty - other.certainty;
        let dg = self.granularity - other.granularity;
        let dv = self.verification - other.verification;
        (dc * dc + dg * dg + dv * dv).sqrt()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.2}, {:.2}, {:.2})",
            self.certainty, self.granularity, self.verification
        )
    }
}
