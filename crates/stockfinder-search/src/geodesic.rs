//! Surface distance between two points.
//!
//! The primary solver is Vincenty's inverse method on the WGS-84 ellipsoid.
//! When it fails to converge (nearly antipodal points) the spherical
//! haversine formula is used instead.

use stockfinder_core::Coordinates;

/// WGS-84 semi-major axis in meters.
const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 semi-minor axis in meters.
const WGS84_B: f64 = 6_356_752.314_245;
/// WGS-84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;

const MEAN_EARTH_RADIUS_KM: f64 = 6371.0;
const CONVERGENCE_THRESHOLD: f64 = 1e-12;
const MAX_ITERATIONS: usize = 100;

/// Distance in kilometers, rounded to three decimal places.
///
/// Symmetric by construction: the pair is put in a fixed order before solving,
/// so `distance_km(a, b)` and `distance_km(b, a)` run the identical computation.
#[must_use]
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    if a == b {
        return 0.0;
    }
    let (first, second) = ordered(a, b);
    vincenty_km(first, second).unwrap_or_else(|| {
        tracing::debug!(
            from = ?first,
            to = ?second,
            "ellipsoidal solver did not converge, using haversine"
        );
        haversine_km(first, second)
    })
}

/// Vincenty inverse solution in kilometers, or `None` if the iteration cap is
/// reached before the longitude difference settles.
#[must_use]
pub fn vincenty_km(a: Coordinates, b: Coordinates) -> Option<f64> {
    solve_vincenty(a, b, MAX_ITERATIONS)
}

/// Great-circle distance on a sphere of radius 6371 km.
#[must_use]
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    round_km(MEAN_EARTH_RADIUS_KM * c)
}

fn solve_vincenty(a: Coordinates, b: Coordinates, max_iterations: usize) -> Option<f64> {
    let l = (b.longitude - a.longitude).to_radians();
    let u1 = ((1.0 - WGS84_F) * a.latitude.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * b.latitude.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..max_iterations {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            // Coincident points.
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Both points on the equator: cos²α is zero and the term vanishes.
        let cos_2sigma_m = if cos_sq_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };
        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));

        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

        if (lambda - previous).abs() < CONVERGENCE_THRESHOLD {
            let u_sq = cos_sq_alpha * (WGS84_A.powi(2) - WGS84_B.powi(2)) / WGS84_B.powi(2);
            let big_a =
                1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = big_b
                * sin_sigma
                * (cos_2sigma_m
                    + big_b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                            - big_b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));
            let meters = WGS84_B * big_a * (sigma - delta_sigma);
            return Some(round_km(meters / 1000.0));
        }
    }

    None
}

fn ordered(a: Coordinates, b: Coordinates) -> (Coordinates, Coordinates) {
    let key = |p: &Coordinates| (p.latitude, p.longitude);
    let (ka, kb) = (key(&a), key(&b));
    let a_first = match ka.0.total_cmp(&kb.0) {
        std::cmp::Ordering::Equal => ka.1.total_cmp(&kb.1).is_le(),
        other => other.is_lt(),
    };
    if a_first {
        (a, b)
    } else {
        (b, a)
    }
}

fn round_km(km: f64) -> f64 {
    (km * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn point(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates {
            latitude,
            longitude,
        }
    }

    fn random_point(rng: &mut StdRng) -> Coordinates {
        point(
            rng.random_range(-90.0..=90.0),
            rng.random_range(-180.0..=180.0),
        )
    }

    #[test]
    fn identical_points_are_zero() {
        for p in [
            point(0.0, 0.0),
            point(40.7128, -74.006),
            point(-33.8688, 151.2093),
            point(90.0, 0.0),
        ] {
            assert_eq!(distance_km(p, p), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric_for_generated_pairs() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let a = random_point(&mut rng);
            let b = random_point(&mut rng);
            assert_eq!(distance_km(a, b), distance_km(b, a), "a={a:?} b={b:?}");
        }
    }

    #[test]
    fn distance_is_never_negative() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let d = distance_km(random_point(&mut rng), random_point(&mut rng));
            assert!(d >= 0.0 && d.is_finite(), "got {d}");
        }
    }

    #[test]
    fn matches_flinders_peak_to_buninyong_reference() {
        // Published Vincenty test pair: 54 972.271 m.
        let flinders = point(-37.951_033_42, 144.424_867_89);
        let buninyong = point(-37.652_821_14, 143.926_495_54);
        let km = vincenty_km(flinders, buninyong).unwrap();
        assert!((km - 54.972).abs() <= 0.001, "got {km}");
    }

    #[test]
    fn two_kilometers_north() {
        let user = point(40.0, -74.0);
        let store = point(40.018, -74.0);
        let km = distance_km(user, store);
        assert!((km - 2.0).abs() < 0.01, "got {km}");
    }

    #[test]
    fn rounds_to_three_decimals() {
        let km = distance_km(point(51.5074, -0.1278), point(48.8566, 2.3522));
        assert_eq!(km, (km * 1000.0).round() / 1000.0);
    }

    #[test]
    fn haversine_agrees_with_ellipsoid_for_short_distances() {
        let pairs = [
            (point(40.0, -74.0), point(40.5, -74.3)),
            (point(51.5074, -0.1278), point(51.752, -1.2577)),
            (point(35.6762, 139.6503), point(35.4437, 139.638)),
            (point(-33.8688, 151.2093), point(-34.4278, 150.8931)),
        ];
        for (a, b) in pairs {
            let ellipsoidal = vincenty_km(a, b).unwrap();
            let spherical = haversine_km(a, b);
            assert!(ellipsoidal < 100.0);
            let relative = (ellipsoidal - spherical).abs() / ellipsoidal;
            assert!(relative < 0.005, "a={a:?} b={b:?} relative={relative}");
        }
    }

    #[test]
    fn iteration_cap_yields_none() {
        let a = point(40.0, -74.0);
        let b = point(34.05, -118.24);
        assert!(solve_vincenty(a, b, 1).is_none());
        assert!(solve_vincenty(a, b, MAX_ITERATIONS).is_some());
    }

    #[test]
    fn nearly_antipodal_points_still_produce_a_distance() {
        let a = point(0.0, 0.0);
        let b = point(0.5, 179.7);
        let d = distance_km(a, b);
        match vincenty_km(a, b) {
            Some(v) => assert_eq!(d, v),
            None => assert_eq!(d, haversine_km(a, b)),
        }
        assert!(d > 19_000.0 && d < 20_100.0, "got {d}");
    }

    #[test]
    fn equatorial_points_converge() {
        let km = vincenty_km(point(0.0, 0.0), point(0.0, 1.0)).unwrap();
        // One degree of longitude on the WGS-84 equator is 111.319 km.
        assert!((km - 111.319).abs() < 0.002, "got {km}");
    }
}
