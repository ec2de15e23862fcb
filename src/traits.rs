//! Core seams of the proximity subsystem.
//!
//! Listing types and routing backends live outside this crate; they plug in
//! through these traits.

use std::sync::Arc;

use crate::error::RoutingError;
use crate::geo::GeoCoordinate;

/// A listing (delivery order, store, product) subject to proximity filtering.
pub trait Candidate {
    /// Pickup or store location, if the listing carries one.
    fn pickup_coordinates(&self) -> Option<GeoCoordinate>;

    /// Whether the listing matches the user's search text.
    ///
    /// Listings without searchable text match everything.
    fn matches_query(&self, _query: &str) -> bool {
        true
    }
}

impl<C: Candidate + ?Sized> Candidate for &C {
    fn pickup_coordinates(&self) -> Option<GeoCoordinate> {
        (**self).pickup_coordinates()
    }

    fn matches_query(&self, query: &str) -> bool {
        (**self).matches_query(query)
    }
}

/// Resolves the travel distance between two points.
///
/// Implementations report meters and surface every failure as an error; the
/// resolver decides what a failure means for the batch.
pub trait DistanceProvider: Send + Sync {
    fn route_distance_meters(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
    ) -> Result<f64, RoutingError>;
}

impl<P: DistanceProvider + ?Sized> DistanceProvider for &P {
    fn route_distance_meters(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
    ) -> Result<f64, RoutingError> {
        (**self).route_distance_meters(origin, destination)
    }
}

impl<P: DistanceProvider + ?Sized> DistanceProvider for Arc<P> {
    fn route_distance_meters(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
    ) -> Result<f64, RoutingError> {
        (**self).route_distance_meters(origin, destination)
    }
}

impl<P: DistanceProvider + ?Sized> DistanceProvider for Box<P> {
    fn route_distance_meters(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
    ) -> Result<f64, RoutingError> {
        (**self).route_distance_meters(origin, destination)
    }
}
