//! Discretized great-circle path generation.

use crate::geo::{intermediate_point, GeodesicError};
use crate::models::Coordinate;

/// Default number of segments along the track (produces 51 points).
pub const DEFAULT_RESOLUTION: usize = 50;

/// Sample the great-circle track from `start` to `end`.
///
/// Produces `resolution + 1` points at evenly spaced fractions; the first
/// point is exactly `start` and the last exactly `end`. Deterministic for a
/// given input. This is the only path-shaping strategy: it always follows
/// the direct track and never curves around hazards on its own.
pub fn generate_path(
    start: Coordinate,
    end: Coordinate,
    resolution: usize,
) -> Result<Vec<Coordinate>, GeodesicError> {
    if resolution == 0 {
        return Err(GeodesicError::InvalidResolution);
    }

    let mut path = Vec::with_capacity(resolution + 1);
    for i in 0..=resolution {
        if i == 0 {
            path.push(start);
        } else if i == resolution {
            path.push(end);
        } else {
            let fraction = i as f64 / resolution as f64;
            path.push(intermediate_point(start, end, fraction)?);
        }
    }
    Ok(path)
}
