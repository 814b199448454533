use std::cmp::Ordering;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use shared::{Coordinate, SearchResult};

use crate::config::GeocoderConfig;
use crate::error::NavError;
use crate::geo;

/// Place lookup against a Photon-style geocoding endpoint.
///
/// Failures are not surfaced to the caller: a lookup that cannot complete
/// yields an empty result set, indistinguishable from "no results".
pub struct Geocoder {
    client: Client,
    config: GeocoderConfig,
}

impl Geocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self, NavError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Look up place candidates for `query`, sorted by ascending distance
    /// from `bias`. Empty and whitespace-only queries return immediately
    /// without touching the network.
    pub async fn search(&self, query: &str, bias: Coordinate) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        match self.fetch(query, bias).await {
            Ok(mut results) => {
                results.sort_by(|a, b| {
                    let da = geo::distance_m(bias, a.coordinate);
                    let db = geo::distance_m(bias, b.coordinate);
                    da.partial_cmp(&db).unwrap_or(Ordering::Equal)
                });
                tracing::debug!("place search for {query:?} returned {} results", results.len());
                results
            }
            Err(err) => {
                tracing::warn!("place search for {query:?} failed: {err}");
                Vec::new()
            }
        }
    }

    async fn fetch(&self, query: &str, bias: Coordinate) -> Result<Vec<SearchResult>, NavError> {
        let url = format!("{}/api/", self.config.base_url.trim_end_matches('/'));
        let params = [
            ("q", query.to_string()),
            ("limit", self.config.result_limit.to_string()),
            ("lat", bias.lat.to_string()),
            ("lon", bias.lon.to_string()),
            ("lang", self.config.language.clone()),
        ];
        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?;

        let body: GeocoderResponse = response.json().await?;
        Ok(body.features.into_iter().map(into_search_result).collect())
    }
}

/// Raw geocoder response shape (GeoJSON feature collection).
#[derive(Debug, Deserialize)]
struct GeocoderResponse {
    features: Vec<GeocoderFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocoderFeature {
    geometry: GeocoderGeometry,
    #[serde(default)]
    properties: GeocoderProperties,
}

#[derive(Debug, Deserialize)]
struct GeocoderGeometry {
    /// `[lon, lat]` per GeoJSON
    coordinates: [f64; 2],
}

#[derive(Debug, Default, Deserialize)]
struct GeocoderProperties {
    name: Option<String>,
    street: Option<String>,
    housenumber: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    osm_value: Option<String>,
}

fn into_search_result(feature: GeocoderFeature) -> SearchResult {
    let [lon, lat] = feature.geometry.coordinates;
    let label = compose_label(&feature.properties);
    let category = feature
        .properties
        .osm_value
        .unwrap_or_else(|| "place".to_string());
    SearchResult {
        label,
        coordinate: Coordinate { lat, lon },
        category,
    }
}

/// Join the label components in order, dropping duplicates while keeping the
/// first occurrence. A feature with no usable components falls back to its
/// place type, then to "Unnamed place".
fn compose_label(props: &GeocoderProperties) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in [
        &props.name,
        &props.street,
        &props.housenumber,
        &props.city,
        &props.state,
        &props.country,
    ] {
        if let Some(text) = component.as_deref() {
            let text = text.trim();
            if !text.is_empty() && !parts.contains(&text) {
                parts.push(text);
            }
        }
    }

    if parts.is_empty() {
        return props
            .osm_value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("Unnamed place")
            .to_string();
    }
    parts.join(", ")
}
