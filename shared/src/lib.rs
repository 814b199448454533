use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Travel mode selected on the screen. Bus and train share the driving
/// profile of the routing service and get a synthetic duration estimate
/// instead of the service-reported one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Car,
    Walk,
    Bus,
    Train,
}

impl TravelMode {
    /// Routing-service profile for this mode.
    pub fn profile(self) -> &'static str {
        match self {
            TravelMode::Walk => "foot",
            TravelMode::Car | TravelMode::Bus | TravelMode::Train => "driving",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub label: String,
    pub coordinate: Coordinate,
    pub category: String,
}

/// One directions result. Replaced wholesale on every new request; the
/// straight-line fallback leaves distance and duration unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub path: Vec<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeRequest {
    pub mode: TravelMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Read-only view of the session for the rendering layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<SearchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    pub route_is_fallback: bool,
    pub mode: TravelMode,
    pub search_results: Vec<SearchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// The whimsical nearby-match card: a random persona a short walk away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyMatch {
    pub name: String,
    pub portrait_url: String,
    pub coordinate: Coordinate,
    pub distance_label: String,
}
