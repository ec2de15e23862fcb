//! proximity-filter core
//!
//! Distance-aware filtering of delivery listings: cache-first route distance
//! resolution, radius filtering with nearest-first ordering, and a listing
//! feed that never lets a stale run overwrite a fresher one.

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod filter;
pub mod geo;
pub mod haversine;
pub mod key;
pub mod osrm;
pub mod resolver;
pub mod traits;

pub use cache::{CacheConfig, DistanceCache};
pub use config::ProximityConfig;
pub use error::{ConfigError, CoordinateError, FilterError, ProximityError, RoutingError};
pub use feed::{ListingFeed, ListingState, ListingView, RunOutcome, RunTicket};
pub use filter::{DELIVERY_RADIUS_KM, FilteredCandidate, ProximityFilter, STORE_RADIUS_KM};
pub use geo::GeoCoordinate;
pub use key::CacheKey;
pub use resolver::DistanceResolver;
pub use traits::{Candidate, DistanceProvider};
