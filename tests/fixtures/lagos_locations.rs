//! Real Lagos-area locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap, rounded to four decimals.

use proximity_filter::GeoCoordinate;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> GeoCoordinate {
        GeoCoordinate::new(self.lat, self.lng)
    }
}

/// Where the user is standing in most tests.
pub const UNILAG: Location = Location::new("University of Lagos", 6.5158, 3.3896);

// ============================================================================
// Mainland pickup points
// ============================================================================

pub const MAINLAND: &[Location] = &[
    Location::new("Yaba Market", 6.5095, 3.3711),
    Location::new("National Stadium Surulere", 6.4996, 3.3650),
    Location::new("Oshodi Interchange", 6.5560, 3.3430),
    Location::new("Ikeja City Mall", 6.6142, 3.3580),
    Location::new("Ikorodu Garage", 6.6194, 3.5105),
];

// ============================================================================
// Island pickup points
// ============================================================================

pub const ISLAND: &[Location] = &[
    Location::new("Balogun Market", 6.4541, 3.3947),
    Location::new("Victoria Island", 6.4281, 3.4219),
    Location::new("Lekki Phase 1", 6.4478, 3.4723),
];

// ============================================================================
// Out of town (beyond listing radii)
// ============================================================================

pub const OUT_OF_TOWN: &[Location] = &[
    Location::new("Ibadan Dugbe", 7.3775, 3.9470),
    Location::new("Abuja Central", 9.0765, 7.3986),
];

pub fn all_locations() -> Vec<Location> {
    let mut all = Vec::with_capacity(10);
    all.extend_from_slice(MAINLAND);
    all.extend_from_slice(ISLAND);
    all.extend_from_slice(OUT_OF_TOWN);
    all
}
