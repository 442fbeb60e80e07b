//! Geodesic direct problem on the WGS-84 ellipsoid.
//!
//! Uses Vincenty's direct formula: given a start point, an initial azimuth
//! and a distance along the ellipsoid surface, find the end point.
//!
//! Reference: T. Vincenty, "Direct and Inverse Solutions of Geodesics on the
//! Ellipsoid with application of nested equations", Survey Review, 1975.

/// WGS-84 semi-major axis (meters)
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS-84 semi-minor axis (meters)
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

/// Convergence threshold for sigma, radians.
const TOLERANCE: f64 = 1e-12;
/// Near-antipodal lines converge slowly; radar ranges never get there.
const MAX_ITERATIONS: usize = 200;

/// Solve the direct geodesic problem.
///
/// # Arguments
/// * `lat` - Start latitude (degrees)
/// * `lon` - Start longitude (degrees)
/// * `azimuth` - Initial bearing, clockwise from north (degrees)
/// * `distance` - Distance along the ellipsoid (meters)
///
/// # Returns
/// End point as (latitude, longitude) in degrees, longitude in [-180, 180).
pub fn direct(lat: f64, lon: f64, azimuth: f64, distance: f64) -> (f64, f64) {
    if distance == 0.0 {
        return (lat, lon);
    }

    let f = WGS84_F;
    let phi1 = lat.to_radians();
    let alpha1 = azimuth.to_radians();
    let (sin_alpha1, cos_alpha1) = alpha1.sin_cos();

    let tan_u1 = (1.0 - f) * phi1.tan();
    let cos_u1 = 1.0 / (1.0 + tan_u1 * tan_u1).sqrt();
    let sin_u1 = tan_u1 * cos_u1;

    let sigma1 = tan_u1.atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let u_sq = cos_sq_alpha * (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);
    let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));

    let sigma0 = distance / (WGS84_B * a);
    let mut sigma = sigma0;
    let mut sin_sigma = sigma.sin();
    let mut cos_sigma = sigma.cos();
    let mut cos_2sigma_m = (2.0 * sigma1 + sigma).cos();

    for _ in 0..MAX_ITERATIONS {
        cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        sin_sigma = sigma.sin();
        cos_sigma = sigma.cos();

        let delta_sigma = b
            * sin_sigma
            * (cos_2sigma_m
                + b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                        - b / 6.0
                            * cos_2sigma_m
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

        let previous = sigma;
        sigma = sigma0 + delta_sigma;
        if (sigma - previous).abs() < TOLERANCE {
            cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
            sin_sigma = sigma.sin();
            cos_sigma = sigma.cos();
            break;
        }
    }

    let x = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let phi2 = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - f) * (sin_alpha * sin_alpha + x * x).sqrt());

    let lambda = (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
    let l = lambda
        - (1.0 - c)
            * f
            * sin_alpha
            * (sigma + c * sin_sigma * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

    (phi2.to_degrees(), normalize_longitude(lon + l.to_degrees()))
}

/// Project a local east/north offset (meters) from a start point.
pub fn offset(lat: f64, lon: f64, east: f64, north: f64) -> (f64, f64) {
    let distance = east.hypot(north);
    if distance == 0.0 {
        return (lat, lon);
    }
    direct(lat, lon, east.atan2(north).to_degrees(), distance)
}

/// Wrap a longitude into [-180, 180).
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dms(degrees: f64, minutes: f64, seconds: f64) -> f64 {
        degrees.signum() * (degrees.abs() + minutes / 60.0 + seconds / 3600.0)
    }

    #[test]
    fn test_zero_distance_returns_start() {
        let (lat, lon) = direct(35.3331, -97.2778, 123.0, 0.0);
        assert_eq!(lat, 35.3331);
        assert_eq!(lon, -97.2778);
    }

    #[test]
    fn test_flinders_peak_to_buninyong() {
        // Vincenty's published example
        let lat1 = dms(-37.0, 57.0, 3.72030);
        let lon1 = dms(144.0, 25.0, 29.52440);
        let azimuth = dms(306.0, 52.0, 5.37);

        let (lat2, lon2) = direct(lat1, lon1, azimuth, 54_972.271);

        assert!((lat2 - dms(-37.0, 39.0, 10.15610)).abs() < 1e-6, "lat {}", lat2);
        assert!((lon2 - dms(143.0, 55.0, 35.38390)).abs() < 1e-6, "lon {}", lon2);
    }

    #[test]
    fn test_meridian_degree_at_equator() {
        // Length of the first degree of latitude on WGS-84
        let (lat, lon) = direct(0.0, 0.0, 0.0, 110_574.39);
        assert!((lat - 1.0).abs() < 1e-5, "lat {}", lat);
        assert!(lon.abs() < 1e-9);
    }

    #[test]
    fn test_equator_degree_of_longitude() {
        let (lat, lon) = direct(0.0, 0.0, 90.0, 111_319.49);
        assert!(lat.abs() < 1e-9);
        assert!((lon - 1.0).abs() < 1e-6, "lon {}", lon);
    }

    #[test]
    fn test_crosses_antimeridian() {
        let (_, lon) = direct(0.0, 179.9, 90.0, 50_000.0);
        assert!(lon < -179.0, "lon {}", lon);
    }

    #[test]
    fn test_offset_matches_direct() {
        let (lat_a, lon_a) = offset(35.0, -97.0, 1000.0, 1000.0);
        let (lat_b, lon_b) = direct(35.0, -97.0, 45.0, 2f64.sqrt() * 1000.0);
        assert!((lat_a - lat_b).abs() < 1e-12);
        assert!((lon_a - lon_b).abs() < 1e-12);
        assert_eq!(offset(35.0, -97.0, 0.0, 0.0), (35.0, -97.0));
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(180.0), -180.0);
        assert_eq!(normalize_longitude(45.0), 45.0);
    }
}
