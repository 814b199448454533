use std::time::Duration;

use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use shared::{Coordinate, Route, TravelMode};

use crate::config::{RoutingConfig, TransitConfig};
use crate::error::NavError;
use crate::geo;

/// Route returned to the caller, flagged when the routing service could not
/// be reached and the path degraded to a straight line.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRoute {
    pub route: Route,
    pub fallback: bool,
}

/// Client for an OSRM-style routing endpoint.
pub struct RouteFetcher {
    client: Client,
    config: RoutingConfig,
    transit: TransitConfig,
}

impl RouteFetcher {
    pub fn new(config: RoutingConfig, transit: TransitConfig) -> Result<Self, NavError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            transit,
        })
    }

    /// Fetch a route between `start` and `end` for `mode`.
    ///
    /// Any failure (network, non-success status, empty route list) degrades
    /// to a two-point straight line with unknown distance and duration, and
    /// the result is flagged as a fallback.
    ///
    /// Bus and train durations are a synthetic estimate: fixed average speed
    /// plus a randomized wait, approximate and non-deterministic.
    pub async fn fetch_route(
        &self,
        start: Coordinate,
        end: Coordinate,
        mode: TravelMode,
        rng: &mut impl Rng,
    ) -> FetchedRoute {
        match self.request_route(start, end, mode).await {
            Ok(mut route) => {
                if let Some((speed_kmh, wait_minutes)) = self.transit.estimate_params(mode) {
                    route.duration_s = route
                        .distance_m
                        .map(|d| transit_estimate_s(d, speed_kmh, wait_minutes, rng));
                }
                FetchedRoute {
                    route,
                    fallback: false,
                }
            }
            Err(err) => {
                tracing::warn!("routing unavailable, using straight line: {err}");
                FetchedRoute {
                    route: Route {
                        path: vec![start, end],
                        distance_m: None,
                        duration_s: None,
                    },
                    fallback: true,
                }
            }
        }
    }

    /// Find a routable point near `origin` for a synthetic destination.
    ///
    /// Projects a random candidate (uniform bearing, 1-4 km by default) and
    /// snaps it to the road network; candidates whose snap fails or lands
    /// within 200 m of the origin are rejected and a fresh candidate is
    /// drawn, up to the configured attempt bound.
    pub async fn nearest_routable_point(
        &self,
        origin: Coordinate,
        mode: TravelMode,
        rng: &mut impl Rng,
    ) -> Result<Coordinate, NavError> {
        let attempts = self.config.snap_attempts;
        for attempt in 1..=attempts {
            let bearing = rng.random_range(0.0..std::f64::consts::TAU);
            let distance = rng.random_range(
                self.config.random_destination_min_m..=self.config.random_destination_max_m,
            );
            let candidate = geo::destination(origin, distance, bearing);

            match self.request_nearest(candidate, mode).await {
                Ok(snapped) => {
                    let from_origin = geo::distance_m(origin, snapped);
                    if from_origin >= self.config.snap_min_distance_m {
                        tracing::debug!(
                            attempt,
                            "snapped candidate to {:.5},{:.5} ({:.0} m from origin)",
                            snapped.lat,
                            snapped.lon,
                            from_origin
                        );
                        return Ok(snapped);
                    }
                    tracing::debug!(attempt, "snapped point {from_origin:.0} m from origin, retrying");
                }
                Err(err) => {
                    tracing::debug!(attempt, "nearest point lookup failed: {err}");
                }
            }
        }
        Err(NavError::NoRoutableTarget { attempts })
    }

    async fn request_route(
        &self,
        start: Coordinate,
        end: Coordinate,
        mode: TravelMode,
    ) -> Result<Route, NavError> {
        let url = format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.config.base_url.trim_end_matches('/'),
            mode.profile(),
            start.lon,
            start.lat,
            end.lon,
            end.lat,
        );
        let response = self
            .client
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?
            .error_for_status()?;

        let body: RouteServiceResponse = response.json().await?;
        let first = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| NavError::RouteUnavailable("empty route list".to_string()))?;

        let path = first
            .geometry
            .coordinates
            .into_iter()
            .map(|[lon, lat]| Coordinate { lat, lon })
            .collect();
        Ok(Route {
            path,
            distance_m: Some(first.distance),
            duration_s: Some(first.duration),
        })
    }

    async fn request_nearest(
        &self,
        point: Coordinate,
        mode: TravelMode,
    ) -> Result<Coordinate, NavError> {
        let url = format!(
            "{}/nearest/v1/{}/{},{}",
            self.config.base_url.trim_end_matches('/'),
            mode.profile(),
            point.lon,
            point.lat,
        );
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: NearestServiceResponse = response.json().await?;
        let waypoint = body
            .waypoints
            .into_iter()
            .next()
            .ok_or_else(|| NavError::RouteUnavailable("empty waypoint list".to_string()))?;
        let [lon, lat] = waypoint.location;
        Ok(Coordinate { lat, lon })
    }
}

/// Synthetic transit duration in seconds: ride time at a fixed average speed
/// plus a wait drawn uniformly from the configured window.
fn transit_estimate_s(
    distance_m: f64,
    speed_kmh: f64,
    wait_minutes: [f64; 2],
    rng: &mut impl Rng,
) -> f64 {
    let ride_minutes = distance_m / 1000.0 / speed_kmh * 60.0;
    let wait = rng.random_range(wait_minutes[0]..=wait_minutes[1]);
    (ride_minutes + wait) * 60.0
}

#[derive(Debug, Deserialize)]
struct RouteServiceResponse {
    routes: Vec<ServiceRoute>,
}

#[derive(Debug, Deserialize)]
struct ServiceRoute {
    geometry: ServiceGeometry,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct ServiceGeometry {
    /// `[lon, lat]` pairs per GeoJSON
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct NearestServiceResponse {
    waypoints: Vec<ServiceWaypoint>,
}

#[derive(Debug, Deserialize)]
struct ServiceWaypoint {
    location: [f64; 2],
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_profile_resolution() {
        assert_eq!(TravelMode::Walk.profile(), "foot");
        assert_eq!(TravelMode::Car.profile(), "driving");
        assert_eq!(TravelMode::Bus.profile(), "driving");
        assert_eq!(TravelMode::Train.profile(), "driving");
    }

    #[test]
    fn test_transit_estimate_within_wait_window() {
        let mut rng = StdRng::seed_from_u64(7);
        // 11 km by bus at 22 km/h is 30 min of riding
        for _ in 0..50 {
            let seconds = transit_estimate_s(11_000.0, 22.0, [3.0, 10.0], &mut rng);
            assert!(seconds >= (30.0 + 3.0) * 60.0);
            assert!(seconds <= (30.0 + 10.0) * 60.0);
        }
    }

    #[test]
    fn test_transit_estimate_deterministic_with_seed() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(
            transit_estimate_s(8_000.0, 80.0, [5.0, 20.0], &mut a),
            transit_estimate_s(8_000.0, 80.0, [5.0, 20.0], &mut b)
        );
    }

    #[test]
    fn test_route_response_parsing() {
        let json = r#"{
            "code": "Ok",
            "routes": [{
                "geometry": { "coordinates": [[-76.48, 44.23], [-76.47, 44.24]] },
                "distance": 1523.4,
                "duration": 312.8
            }]
        }"#;
        let parsed: RouteServiceResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.routes.len(), 1);
        assert_eq!(parsed.routes[0].geometry.coordinates.len(), 2);
        assert_eq!(parsed.routes[0].distance, 1523.4);
    }

    #[test]
    fn test_nearest_response_parsing() {
        let json = r#"{ "code": "Ok", "waypoints": [{ "location": [-76.481, 44.232] }] }"#;
        let parsed: NearestServiceResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.waypoints[0].location, [-76.481, 44.232]);
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back_to_straight_line() {
        let fetcher = RouteFetcher::new(
            RoutingConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                timeout_secs: 1,
                ..RoutingConfig::default()
            },
            TransitConfig::default(),
        )
        .unwrap();

        let start = Coordinate {
            lat: 44.2312,
            lon: -76.4860,
        };
        let end = Coordinate {
            lat: 44.25,
            lon: -76.50,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let fetched = fetcher.fetch_route(start, end, TravelMode::Car, &mut rng).await;

        assert!(fetched.fallback);
        assert_eq!(fetched.route.path, vec![start, end]);
        assert_eq!(fetched.route.distance_m, None);
        assert_eq!(fetched.route.duration_s, None);
    }
}
