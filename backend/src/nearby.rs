use std::time::Duration;

use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use shared::{Coordinate, NearbyMatch};

use crate::config::NearbyConfig;
use crate::error::NavError;
use crate::geo;

/// Shown when the portrait endpoint cannot be reached.
const PLACEHOLDER_PORTRAIT: &str = "https://randomuser.me/api/portraits/lego/1.jpg";

const MATCH_NAMES: [&str; 12] = [
    "Avery", "Blake", "Casey", "Dana", "Emerson", "Frankie", "Harper", "Jules", "Kai", "Morgan",
    "Riley", "Sage",
];

/// Builds the decorative nearby-match card: a random persona placed a short
/// walk from the current location, with a portrait fetched from a
/// randomuser-style endpoint.
pub struct MatchMaker {
    client: Client,
    config: NearbyConfig,
}

impl MatchMaker {
    pub fn new(config: NearbyConfig) -> Result<Self, NavError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Never fails: a portrait fetch error degrades to a placeholder image.
    pub async fn nearby_match(&self, origin: Coordinate, rng: &mut impl Rng) -> NearbyMatch {
        let bearing = rng.random_range(0.0..std::f64::consts::TAU);
        let distance =
            rng.random_range(self.config.min_distance_m..=self.config.max_distance_m);
        let coordinate = geo::destination(origin, distance, bearing);
        let name = MATCH_NAMES[rng.random_range(0..MATCH_NAMES.len())].to_string();

        let portrait_url = match self.fetch_portrait().await {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!("portrait fetch failed, using placeholder: {err}");
                PLACEHOLDER_PORTRAIT.to_string()
            }
        };

        NearbyMatch {
            name,
            portrait_url,
            coordinate,
            distance_label: geo::format_distance(distance),
        }
    }

    async fn fetch_portrait(&self) -> Result<String, NavError> {
        let url = format!("{}/api/", self.config.portrait_base_url.trim_end_matches('/'));
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: PortraitResponse = response.json().await?;
        body.results
            .into_iter()
            .next()
            .map(|r| r.picture.large)
            .ok_or(NavError::NoResults)
    }
}

#[derive(Debug, Deserialize)]
struct PortraitResponse {
    results: Vec<PortraitResult>,
}

#[derive(Debug, Deserialize)]
struct PortraitResult {
    picture: Picture,
}

#[derive(Debug, Deserialize)]
struct Picture {
    large: String,
}
