//! Geographic coordinate value type.

use serde::{Deserialize, Serialize};

use crate::error::CoordinateError;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A (latitude, longitude) pair in degrees.
///
/// Values usually arrive from external payloads, so construction does not
/// validate. Use [`GeoCoordinate::is_valid`] or [`GeoCoordinate::checked`]
/// before trusting one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub lat: f64,
    pub lng: f64,
}

impl GeoCoordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a coordinate, rejecting non-finite or out-of-range components.
    pub fn checked(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        let coord = Self { lat, lng };
        coord.validate()?;
        Ok(coord)
    }

    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoordinateError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(CoordinateError::LongitudeOutOfRange(self.lng));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Great-circle distance to `other` in kilometers.
    pub fn haversine_km(&self, other: &GeoCoordinate) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }
}

impl From<(f64, f64)> for GeoCoordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}
