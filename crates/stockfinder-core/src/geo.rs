//! Geographic point type.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build a validated point.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinates`] when either component is
    /// non-finite or outside `[-90, 90]` / `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        let point = Self {
            latitude,
            longitude,
        };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(CoreError::InvalidCoordinates {
                latitude,
                longitude,
            })
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundary_values() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let err = Coordinates::new(90.5, 0.0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCoordinates { .. }));
    }

    #[test]
    fn rejects_nan() {
        assert!(Coordinates::new(f64::NAN, 10.0).is_err());
        assert!(Coordinates::new(10.0, f64::INFINITY).is_err());
    }
}
