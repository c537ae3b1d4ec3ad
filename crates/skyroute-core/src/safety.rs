//! Validation of candidate paths against the hazard snapshot.

use crate::models::{Coordinate, HazardSet};

/// Location of the first path point found inside a hazard polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathConflict {
    pub point_index: usize,
    pub polygon_index: usize,
}

/// Find the first path point strictly inside any hazard polygon.
pub fn first_conflict(path: &[Coordinate], hazards: &HazardSet) -> Option<PathConflict> {
    for (point_index, point) in path.iter().enumerate() {
        for (polygon_index, polygon) in hazards.polygons.iter().enumerate() {
            if polygon.contains(point.lat, point.lon) {
                return Some(PathConflict {
                    point_index,
                    polygon_index,
                });
            }
        }
    }
    None
}

/// True when no path point lies inside any hazard polygon.
pub fn is_path_safe(path: &[Coordinate], hazards: &HazardSet) -> bool {
    first_conflict(path, hazards).is_none()
}
