use crate::config::FareConfig;

const EARTH_RADIUS_KM: f64 = 6371.0;
const MINUTES_PER_KM: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// `base + per_km * distance`, rounded to cents. `None` for negative or non-finite input.
pub fn calculate_fare(cfg: &FareConfig, distance_km: f64) -> Option<f64> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return None;
    }
    Some(round2(cfg.base + distance_km * cfg.per_km))
}

pub fn estimate_minutes(distance_km: f64) -> i64 {
    (distance_km * MINUTES_PER_KM).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fare_is_linear_in_distance() {
        let cfg = FareConfig::default();
        assert_eq!(calculate_fare(&cfg, 0.0), Some(15.0));
        assert_eq!(calculate_fare(&cfg, 2.0), Some(31.0));
        assert_eq!(calculate_fare(&cfg, 1.234), Some(24.87));
    }

    #[test]
    fn fare_rejects_nonsense_distance() {
        let cfg = FareConfig::default();
        assert_eq!(calculate_fare(&cfg, -1.0), None);
        assert_eq!(calculate_fare(&cfg, f64::NAN), None);
    }

    #[test]
    fn haversine_known_distance() {
        // Accra -> Kumasi, roughly 200 km as the crow flies.
        let accra = Coordinates::new(5.6037, -0.1870);
        let kumasi = Coordinates::new(6.6885, -1.6244);
        let d = haversine_km(accra, kumasi);
        assert!((195.0..205.0).contains(&d), "got {d}");
        assert!((d - haversine_km(kumasi, accra)).abs() < 1e-9);
        assert_eq!(haversine_km(accra, accra), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.01);
    }

    #[test]
    fn coordinate_bounds() {
        assert!(Coordinates::new(90.0, -180.0).is_valid());
        assert!(!Coordinates::new(90.1, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, 181.0).is_valid());
        assert!(!Coordinates::new(f64::INFINITY, 0.0).is_valid());
    }

    #[test]
    fn duration_estimate() {
        assert_eq!(estimate_minutes(10.0), 30);
        assert_eq!(estimate_minutes(0.4), 1);
    }
}
