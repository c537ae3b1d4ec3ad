//! Great-circle math on a spherical earth.

use thiserror::Error;

use crate::models::Coordinate;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
pub const METERS_PER_NM: f64 = 1_852.0;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeodesicError {
    #[error("invalid coordinate: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },
    #[error("interpolation fraction {0} is outside [0, 1]")]
    InvalidFraction(f64),
    #[error("endpoints are antipodal; the great-circle track is undefined")]
    AntipodalEndpoints,
    #[error("path resolution must be at least 1")]
    InvalidResolution,
}

/// Great-circle distance between two coordinates in meters (haversine).
pub fn haversine_distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Great-circle distance in nautical miles.
pub fn distance_nm(a: Coordinate, b: Coordinate) -> f64 {
    haversine_distance_m(a, b) / METERS_PER_NM
}

/// Angular (radian) distance between two coordinates.
fn angular_distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

/// Point along the great circle from `start` to `end` at the given fraction.
///
/// Spherical linear interpolation: the endpoints are projected onto the unit
/// sphere, weighted by `sin((1-f)·d)/sin(d)` and `sin(f·d)/sin(d)`, and the
/// blend is converted back to latitude/longitude. Identical endpoints return
/// `start`; antipodal endpoints have no unique track and are an error.
pub fn intermediate_point(
    start: Coordinate,
    end: Coordinate,
    fraction: f64,
) -> Result<Coordinate, GeodesicError> {
    if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
        return Err(GeodesicError::InvalidFraction(fraction));
    }

    let d = angular_distance(start, end);
    if d.abs() < f64::EPSILON {
        return Ok(start);
    }
    let sin_d = d.sin();
    if sin_d.abs() < 1e-12 {
        return Err(GeodesicError::AntipodalEndpoints);
    }

    let lat1 = start.lat.to_radians();
    let lon1 = start.lon.to_radians();
    let lat2 = end.lat.to_radians();
    let lon2 = end.lon.to_radians();

    let a = ((1.0 - fraction) * d).sin() / sin_d;
    let b = (fraction * d).sin() / sin_d;

    let x = a * lat1.cos() * lon1.cos() + b * lat2.cos() * lon2.cos();
    let y = a * lat1.cos() * lon1.sin() + b * lat2.cos() * lon2.sin();
    let z = a * lat1.sin() + b * lat2.sin();

    let lat = z.atan2((x * x + y * y).sqrt());
    let lon = y.atan2(x);

    Ok(Coordinate {
        lat: lat.to_degrees(),
        lon: lon.to_degrees(),
    })
}

/// Initial bearing from `a` to `b` in radians, 0 = north, π/2 = east.
pub fn initial_bearing(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_lambda = (b.lon - a.lon).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y)
}

/// Destination point a given distance and bearing from `origin`.
pub fn offset_by_bearing(origin: Coordinate, distance_m: f64, bearing_rad: f64) -> Coordinate {
    if distance_m.abs() <= f64::EPSILON {
        return origin;
    }

    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let angular = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular.sin();
    let cos_ad = angular.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    Coordinate {
        lat: lat2.to_degrees(),
        lon: lon2.to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance_m(coord(0.0, 0.0), coord(1.0, 0.0));
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = coord(40.6413, -73.7781);
        let b = coord(51.47, -0.4543);
        assert!((distance_nm(a, b) - distance_nm(b, a)).abs() < 1e-9);
    }

    #[test]
    fn distance_zero_iff_equal() {
        let a = coord(33.6846, -117.8265);
        assert!(distance_nm(a, a) < 1e-9);
        assert!(distance_nm(a, coord(33.6846, -117.8264)) > 0.0);
    }

    #[test]
    fn intermediate_point_identical_endpoints() {
        let p = coord(45.0, 9.0);
        for fraction in [0.0, 0.25, 0.5, 1.0] {
            let got = intermediate_point(p, p, fraction).unwrap();
            assert_eq!(got, p);
        }
    }

    #[test]
    fn intermediate_point_midpoint_on_equator() {
        let mid = intermediate_point(coord(0.0, -10.0), coord(0.0, 10.0), 0.5).unwrap();
        assert!(mid.lat.abs() < 1e-9);
        assert!(mid.lon.abs() < 1e-9);
    }

    #[test]
    fn intermediate_point_rejects_bad_fraction() {
        let a = coord(0.0, 0.0);
        let b = coord(1.0, 1.0);
        assert!(matches!(
            intermediate_point(a, b, -0.1),
            Err(GeodesicError::InvalidFraction(_))
        ));
        assert!(matches!(
            intermediate_point(a, b, 1.5),
            Err(GeodesicError::InvalidFraction(_))
        ));
    }

    #[test]
    fn intermediate_point_antipodal_is_error() {
        let got = intermediate_point(coord(0.0, 0.0), coord(0.0, 180.0), 0.5);
        assert_eq!(got, Err(GeodesicError::AntipodalEndpoints));
    }

    #[test]
    fn bearing_due_east_on_equator() {
        let b = initial_bearing(coord(0.0, 0.0), coord(0.0, 10.0));
        assert!((b - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn offset_round_trip_distance() {
        let origin = coord(40.0, -74.0);
        let moved = offset_by_bearing(origin, 50_000.0, 1.0);
        let dist = haversine_distance_m(origin, moved);
        assert!((dist - 50_000.0).abs() < 1.0);
    }
}
