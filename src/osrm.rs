//! OSRM HTTP adapter for point-to-point route distances.

use serde::Deserialize;

use crate::error::RoutingError;
use crate::geo::GeoCoordinate;
use crate::traits::DistanceProvider;

#[derive(Debug, Clone, PartialEq)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Uses a caller-built HTTP client (proxy, TLS settings). `timeout_secs`
    /// is not applied to it.
    pub fn with_client(config: OsrmConfig, client: reqwest::blocking::Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }

    fn route_url(&self, origin: GeoCoordinate, destination: GeoCoordinate) -> String {
        // OSRM takes lng,lat pairs
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=false",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            origin.lng,
            origin.lat,
            destination.lng,
            destination.lat
        )
    }
}

impl DistanceProvider for OsrmClient {
    fn route_distance_meters(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
    ) -> Result<f64, RoutingError> {
        let url = self.route_url(origin, destination);
        tracing::debug!(%url, "requesting OSRM route");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        let text = response.text()?;

        let body = match serde_json::from_str::<OsrmRouteResponse>(&text) {
            Ok(body) => body,
            Err(err) if status.is_success() => {
                tracing::warn!(%url, error = %err, body = %text, "unparseable OSRM response");
                return Err(RoutingError::Parse(err));
            }
            Err(_) => {
                return Err(RoutingError::Status {
                    code: status.as_u16().to_string(),
                    message: Some(text),
                });
            }
        };

        parse_route_distance(body)
    }
}

fn parse_route_distance(body: OsrmRouteResponse) -> Result<f64, RoutingError> {
    if body.code != "Ok" {
        return Err(RoutingError::Status {
            code: body.code,
            message: body.message,
        });
    }

    let distance = body
        .routes
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or(RoutingError::NoRoute)?
        .distance
        .ok_or(RoutingError::NoRoute)?;

    if !distance.is_finite() || distance < 0.0 {
        return Err(RoutingError::InvalidDistance(distance));
    }
    Ok(distance)
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    routes: Option<Vec<OsrmRoute>>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: Option<f64>,
}
