//! Distance and time-en-route summaries for a computed path.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::distance_nm;
use crate::models::Coordinate;

/// Fixed cruise speed for time-en-route estimates, in knots.
pub const CRUISE_SPEED_KT: f64 = 450.0;

/// Read-only summary derived from a path; never stored on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightMetrics {
    /// Total great-circle distance in nautical miles, rounded to one decimal.
    pub distance_nm: f64,
    pub ete_hours: u32,
    pub ete_minutes: u32,
}

impl FlightMetrics {
    /// Short `"4H 0M"` rendering used by the API and CLI.
    pub fn ete(&self) -> String {
        format!("{}H {}M", self.ete_hours, self.ete_minutes)
    }
}

impl fmt::Display for FlightMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} nm, {}H {}M",
            self.distance_nm, self.ete_hours, self.ete_minutes
        )
    }
}

/// Sum great-circle distance over consecutive path points and derive the
/// estimated time en route at `CRUISE_SPEED_KT`.
pub fn compute_metrics(path: &[Coordinate]) -> FlightMetrics {
    let mut total_nm = 0.0;
    for pair in path.windows(2) {
        total_nm += distance_nm(pair[0], pair[1]);
    }

    let hours = total_nm / CRUISE_SPEED_KT;
    let ete_hours = hours.floor() as u32;
    let ete_minutes = ((hours - hours.floor()) * 60.0).floor() as u32;

    FlightMetrics {
        distance_nm: (total_nm * 10.0).round() / 10.0,
        ete_hours,
        ete_minutes,
    }
}
