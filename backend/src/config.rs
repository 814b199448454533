use serde::{Deserialize, Serialize};
use shared::{Coordinate, TravelMode};

/// Initial region of the screen, used until a first location fix arrives or
/// when location permission was denied.
pub const DEFAULT_LOCATION: Coordinate = Coordinate {
    lat: 44.2312,
    lon: -76.4860,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub transit: TransitConfig,
    #[serde(default)]
    pub nearby: NearbyConfig,
    #[serde(default = "default_location")]
    pub default_location: Coordinate,
    /// Input inactivity window before a search query is issued.
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_geocoder_base_url")]
    pub base_url: String,
    #[serde(default = "default_result_limit")]
    pub result_limit: u32,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_routing_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempt bound for snapping a random candidate to the road network.
    #[serde(default = "default_snap_attempts")]
    pub snap_attempts: u32,
    /// Snapped points closer than this to the origin are rejected.
    #[serde(default = "default_snap_min_distance_m")]
    pub snap_min_distance_m: f64,
    #[serde(default = "default_random_destination_min_m")]
    pub random_destination_min_m: f64,
    #[serde(default = "default_random_destination_max_m")]
    pub random_destination_max_m: f64,
}

/// Constants of the synthetic transit duration estimate. These are rough
/// heuristics, kept as configuration rather than hard-coded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitConfig {
    #[serde(default = "default_bus_speed_kmh")]
    pub bus_speed_kmh: f64,
    #[serde(default = "default_bus_wait_minutes")]
    pub bus_wait_minutes: [f64; 2],
    #[serde(default = "default_train_speed_kmh")]
    pub train_speed_kmh: f64,
    #[serde(default = "default_train_wait_minutes")]
    pub train_wait_minutes: [f64; 2],
}

impl TransitConfig {
    /// Average speed and wait window for modes that need the synthetic
    /// estimate; `None` for modes served directly by the routing service.
    pub fn estimate_params(&self, mode: TravelMode) -> Option<(f64, [f64; 2])> {
        match mode {
            TravelMode::Bus => Some((self.bus_speed_kmh, self.bus_wait_minutes)),
            TravelMode::Train => Some((self.train_speed_kmh, self.train_wait_minutes)),
            TravelMode::Car | TravelMode::Walk => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyConfig {
    #[serde(default = "default_portrait_base_url")]
    pub portrait_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_nearby_min_distance_m")]
    pub min_distance_m: f64,
    #[serde(default = "default_nearby_max_distance_m")]
    pub max_distance_m: f64,
}

fn default_location() -> Coordinate {
    DEFAULT_LOCATION
}

const fn default_search_debounce_ms() -> u64 {
    250
}

fn default_geocoder_base_url() -> String {
    "https://photon.komoot.io".to_string()
}

const fn default_result_limit() -> u32 {
    10
}

fn default_language() -> String {
    "en".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_routing_base_url() -> String {
    "https://router.project-osrm.org".to_string()
}

const fn default_snap_attempts() -> u32 {
    6
}

const fn default_snap_min_distance_m() -> f64 {
    200.0
}

const fn default_random_destination_min_m() -> f64 {
    1_000.0
}

const fn default_random_destination_max_m() -> f64 {
    4_000.0
}

const fn default_bus_speed_kmh() -> f64 {
    22.0
}

const fn default_bus_wait_minutes() -> [f64; 2] {
    [3.0, 10.0]
}

const fn default_train_speed_kmh() -> f64 {
    80.0
}

const fn default_train_wait_minutes() -> [f64; 2] {
    [5.0, 20.0]
}

fn default_portrait_base_url() -> String {
    "https://randomuser.me".to_string()
}

const fn default_nearby_min_distance_m() -> f64 {
    200.0
}

const fn default_nearby_max_distance_m() -> f64 {
    2_000.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            geocoder: GeocoderConfig::default(),
            routing: RoutingConfig::default(),
            transit: TransitConfig::default(),
            nearby: NearbyConfig::default(),
            default_location: default_location(),
            search_debounce_ms: default_search_debounce_ms(),
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_base_url(),
            result_limit: default_result_limit(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: default_routing_base_url(),
            timeout_secs: default_timeout_secs(),
            snap_attempts: default_snap_attempts(),
            snap_min_distance_m: default_snap_min_distance_m(),
            random_destination_min_m: default_random_destination_min_m(),
            random_destination_max_m: default_random_destination_max_m(),
        }
    }
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            bus_speed_kmh: default_bus_speed_kmh(),
            bus_wait_minutes: default_bus_wait_minutes(),
            train_speed_kmh: default_train_speed_kmh(),
            train_wait_minutes: default_train_wait_minutes(),
        }
    }
}

impl Default for NearbyConfig {
    fn default() -> Self {
        Self {
            portrait_base_url: default_portrait_base_url(),
            timeout_secs: default_timeout_secs(),
            min_distance_m: default_nearby_min_distance_m(),
            max_distance_m: default_nearby_max_distance_m(),
        }
    }
}
