//! Hazard-avoiding route search.
//!
//! A lane-grid A* over the direct great-circle track: the corridor is the
//! sampled centerline plus symmetric lateral lanes offset perpendicular to
//! the local track bearing. Cells inside a hazard polygon are blocked and
//! the search advances one step at a time, switching at most one lane per
//! step, until it reaches the destination on the centerline.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{
    haversine_distance_m, initial_bearing, offset_by_bearing, GeodesicError, METERS_PER_NM,
};
use crate::models::{Coordinate, HazardSet};
use crate::path::generate_path;
use crate::safety::is_path_safe;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvoidanceConfig {
    /// Number of sample steps along the track (same meaning as path resolution).
    pub resolution: usize,
    /// Lateral lanes on each side of the centerline.
    pub lane_count: usize,
    /// Spacing between adjacent lanes in nautical miles.
    pub lane_spacing_nm: f64,
    /// Cost added per lane switched between consecutive steps, in meters.
    pub lane_change_penalty_m: f64,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            resolution: 50,
            lane_count: 16,
            lane_spacing_nm: 20.0,
            lane_change_penalty_m: 5_000.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum AvoidanceError {
    #[error("no safe path found within the search corridor")]
    NoSafePath,
    #[error(transparent)]
    Geodesic(#[from] GeodesicError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey {
    step: usize,
    lane: usize,
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    step: usize,
    lane: usize,
    g_score: FloatOrd,
    f_score: FloatOrd,
}

impl OpenNode {
    fn key(&self) -> NodeKey {
        NodeKey {
            step: self.step,
            lane: self.lane,
        }
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| self.step.cmp(&other.step))
            .then_with(|| self.lane.cmp(&other.lane))
    }
}

/// Sampled search corridor: `lanes[lane][step]` coordinates plus a blocked
/// mask for cells inside a hazard polygon.
struct Corridor {
    lanes: Vec<Vec<Coordinate>>,
    blocked: Vec<Vec<bool>>,
}

impl Corridor {
    fn num_steps(&self) -> usize {
        self.lanes.first().map(|lane| lane.len()).unwrap_or(0)
    }
}

fn build_corridor(
    start: Coordinate,
    end: Coordinate,
    hazards: &HazardSet,
    config: &AvoidanceConfig,
) -> Result<Corridor, AvoidanceError> {
    let centerline = generate_path(start, end, config.resolution)?;
    let num_lanes = config.lane_count * 2 + 1;
    let spacing_m = config.lane_spacing_nm.max(1.0) * METERS_PER_NM;

    let mut lanes: Vec<Vec<Coordinate>> = vec![Vec::with_capacity(centerline.len()); num_lanes];
    let mut blocked: Vec<Vec<bool>> = vec![vec![false; centerline.len()]; num_lanes];

    for (step, center) in centerline.iter().enumerate() {
        let heading = if step + 1 < centerline.len() {
            initial_bearing(*center, centerline[step + 1])
        } else {
            initial_bearing(centerline[step - 1], *center)
        };

        for (lane_idx, lane) in lanes.iter_mut().enumerate() {
            let offset_m = (lane_idx as f64 - config.lane_count as f64) * spacing_m;
            let point = if offset_m.abs() < f64::EPSILON {
                *center
            } else {
                let lateral = heading + if offset_m >= 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
                offset_by_bearing(*center, offset_m.abs(), lateral)
            };

            blocked[lane_idx][step] = hazards
                .polygons
                .iter()
                .any(|polygon| polygon.contains(point.lat, point.lon));
            lane.push(point);
        }
    }

    Ok(Corridor { lanes, blocked })
}

/// Search for a path from `start` to `end` that clears every hazard polygon.
///
/// Returns a path beginning exactly at `start` and ending exactly at `end`,
/// or `AvoidanceError::NoSafePath` when the corridor offers no clear route
/// (endpoints inside a hazard, or the hazard wider than the lane fan).
pub fn find_safe_path(
    start: Coordinate,
    end: Coordinate,
    hazards: &HazardSet,
    config: &AvoidanceConfig,
) -> Result<Vec<Coordinate>, AvoidanceError> {
    if hazards.is_empty() {
        return Ok(generate_path(start, end, config.resolution)?);
    }

    let corridor = build_corridor(start, end, hazards, config)?;
    let num_steps = corridor.num_steps();
    let num_lanes = corridor.lanes.len();
    let center = config.lane_count;

    if corridor.blocked[center][0] || corridor.blocked[center][num_steps - 1] {
        return Err(AvoidanceError::NoSafePath);
    }

    let goal = corridor.lanes[center][num_steps - 1];
    let start_h = haversine_distance_m(corridor.lanes[center][0], goal);

    let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
    let mut g_score: HashMap<NodeKey, f64> = HashMap::new();
    let mut came_from: HashMap<NodeKey, NodeKey> = HashMap::new();

    let start_key = NodeKey {
        step: 0,
        lane: center,
    };
    g_score.insert(start_key, 0.0);
    open_set.push(Reverse(OpenNode {
        step: 0,
        lane: center,
        g_score: FloatOrd(0.0),
        f_score: FloatOrd(start_h),
    }));

    let mut final_key: Option<NodeKey> = None;

    while let Some(Reverse(current)) = open_set.pop() {
        let current_key = current.key();
        let best_g = g_score.get(&current_key).copied().unwrap_or(f64::INFINITY);
        if current.g_score.0 > best_g + 1e-9 {
            continue;
        }

        if current.step == num_steps - 1 && current.lane == center {
            final_key = Some(current_key);
            break;
        }

        let next_step = current.step + 1;
        if next_step >= num_steps {
            continue;
        }

        let curr_point = corridor.lanes[current.lane][current.step];
        let candidate_lanes = [current.lane.wrapping_sub(1), current.lane, current.lane + 1];

        for next_lane in candidate_lanes.iter().copied() {
            if next_lane >= num_lanes {
                continue;
            }
            if corridor.blocked[next_lane][next_step] {
                continue;
            }
            // The last step must rejoin the centerline at the destination.
            if next_step == num_steps - 1 && next_lane != center {
                continue;
            }

            let next_key = NodeKey {
                step: next_step,
                lane: next_lane,
            };
            let next_point = corridor.lanes[next_lane][next_step];
            let lane_change_cost = (next_lane as i64 - current.lane as i64).unsigned_abs() as f64
                * config.lane_change_penalty_m;
            let step_cost = haversine_distance_m(curr_point, next_point) + lane_change_cost;
            let tentative_g = best_g + step_cost;

            if tentative_g < g_score.get(&next_key).copied().unwrap_or(f64::INFINITY) {
                g_score.insert(next_key, tentative_g);
                came_from.insert(next_key, current_key);

                let h_score = haversine_distance_m(next_point, goal);
                open_set.push(Reverse(OpenNode {
                    step: next_step,
                    lane: next_lane,
                    g_score: FloatOrd(tentative_g),
                    f_score: FloatOrd(tentative_g + h_score),
                }));
            }
        }
    }

    let Some(final_key) = final_key else {
        return Err(AvoidanceError::NoSafePath);
    };

    let mut keys = Vec::new();
    let mut cursor = Some(final_key);
    while let Some(key) = cursor {
        keys.push(key);
        cursor = came_from.get(&key).copied();
    }
    keys.reverse();

    let path: Vec<Coordinate> = keys
        .iter()
        .map(|key| corridor.lanes[key.lane][key.step])
        .collect();

    if !is_path_safe(&path, hazards) {
        return Err(AvoidanceError::NoSafePath);
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HazardPolygon;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn box_polygon(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> HazardPolygon {
        HazardPolygon::new(
            "TS",
            vec![
                coord(min_lat, min_lon),
                coord(max_lat, min_lon),
                coord(max_lat, max_lon),
                coord(min_lat, max_lon),
            ],
        )
    }

    #[test]
    fn empty_hazards_yield_direct_track() {
        let start = coord(0.0, -10.0);
        let end = coord(0.0, 10.0);
        let config = AvoidanceConfig::default();
        let path = find_safe_path(start, end, &HazardSet::empty(), &config).unwrap();
        assert_eq!(path, generate_path(start, end, config.resolution).unwrap());
    }

    #[test]
    fn detours_around_hazard_on_track() {
        let start = coord(0.0, -10.0);
        let end = coord(0.0, 10.0);
        let hazards = HazardSet::new(vec![box_polygon(-2.0, -3.0, 2.0, 3.0)]);
        let config = AvoidanceConfig::default();

        let direct = generate_path(start, end, config.resolution).unwrap();
        assert!(!is_path_safe(&direct, &hazards));

        let path = find_safe_path(start, end, &hazards, &config).unwrap();
        assert_eq!(path[0], start);
        assert_eq!(*path.last().unwrap(), end);
        assert!(is_path_safe(&path, &hazards));
    }

    #[test]
    fn destination_inside_hazard_has_no_safe_path() {
        let start = coord(0.0, -10.0);
        let end = coord(0.0, 10.0);
        let hazards = HazardSet::new(vec![box_polygon(-2.0, 8.0, 2.0, 12.0)]);

        let got = find_safe_path(start, end, &hazards, &AvoidanceConfig::default());
        assert!(matches!(got, Err(AvoidanceError::NoSafePath)));
    }

    #[test]
    fn hazard_wider_than_lane_fan_has_no_safe_path() {
        let start = coord(0.0, -10.0);
        let end = coord(0.0, 10.0);
        // Spans far beyond the default 16-lane / 20nm fan on both sides.
        let hazards = HazardSet::new(vec![box_polygon(-20.0, -3.0, 20.0, 3.0)]);

        let got = find_safe_path(start, end, &hazards, &AvoidanceConfig::default());
        assert!(matches!(got, Err(AvoidanceError::NoSafePath)));
    }
}
