//! Test fixtures for proximity-filter.
//!
//! Provides:
//! - Real Lagos locations (from OpenStreetMap)
//! - A listing type implementing `Candidate`
//! - A scripted distance provider that counts its calls

#![allow(dead_code)]

pub mod lagos_locations;

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use proximity_filter::key::same_quantized_point;
use proximity_filter::{Candidate, DistanceProvider, GeoCoordinate, RoutingError};

pub use lagos_locations::*;

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: u32,
    pub title: &'static str,
    pub pickup: Option<GeoCoordinate>,
}

impl Listing {
    pub fn at(id: u32, title: &'static str, pickup: GeoCoordinate) -> Self {
        Self {
            id,
            title,
            pickup: Some(pickup),
        }
    }

    pub fn unlocated(id: u32, title: &'static str) -> Self {
        Self {
            id,
            title,
            pickup: None,
        }
    }
}

impl Candidate for Listing {
    fn pickup_coordinates(&self) -> Option<GeoCoordinate> {
        self.pickup
    }

    fn matches_query(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(&query.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Meters(f64),
    Fail,
}

/// Provider answering from a fixed table keyed by destination.
///
/// Destinations missing from the table fail.
pub struct ScriptedProvider {
    replies: Vec<(GeoCoordinate, Reply)>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    log: Mutex<Vec<GeoCoordinate>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<(GeoCoordinate, Reply)>) -> Self {
        Self {
            replies,
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Every destination resolves to `km` kilometers.
    pub fn uniform(destinations: &[GeoCoordinate], km: f64) -> Self {
        Self::new(
            destinations
                .iter()
                .map(|dest| (*dest, Reply::Meters(km * 1000.0)))
                .collect(),
        )
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls_to(&self, destination: GeoCoordinate) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|dest| same_quantized_point(**dest, destination))
            .count()
    }
}

impl DistanceProvider for ScriptedProvider {
    fn route_distance_meters(
        &self,
        _origin: GeoCoordinate,
        destination: GeoCoordinate,
    ) -> Result<f64, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(destination);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = self
            .replies
            .iter()
            .find(|(dest, _)| same_quantized_point(*dest, destination))
            .map(|(_, reply)| *reply)
            .unwrap_or(Reply::Fail);

        match reply {
            Reply::Meters(meters) => Ok(meters),
            Reply::Fail => Err(RoutingError::Unavailable("scripted failure".to_string())),
        }
    }
}
