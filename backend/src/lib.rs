pub mod config;
pub mod error;
pub mod geo;
pub mod geocoder;
pub mod nearby;
pub mod routing;
pub mod session;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use shared::{
    Coordinate, DirectionsResponse, LocationUpdate, ModeRequest, NearbyMatch, SearchResponse,
    SearchResult, SessionSnapshot,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::error::NavError;
use crate::geocoder::Geocoder;
use crate::nearby::MatchMaker;
use crate::routing::RouteFetcher;
use crate::session::Session;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub geocoder: Arc<Geocoder>,
    pub route_fetcher: Arc<RouteFetcher>,
    pub match_maker: Arc<MatchMaker>,
    pub search_debounce: Duration,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self, NavError> {
        Ok(Self {
            session: Arc::new(Mutex::new(Session::new(config.default_location))),
            geocoder: Arc::new(Geocoder::new(config.geocoder.clone())?),
            route_fetcher: Arc::new(RouteFetcher::new(
                config.routing.clone(),
                config.transit.clone(),
            )?),
            match_maker: Arc::new(MatchMaker::new(config.nearby.clone())?),
            search_debounce: Duration::from_millis(config.search_debounce_ms),
        })
    }

    /// Lock the session state. Held only for short critical sections, never
    /// across a network call.
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/session", get(session_handler))
        .route("/api/search", get(search_handler))
        .route("/api/mode", post(mode_handler))
        .route("/api/destination", post(destination_handler))
        .route("/api/directions", post(directions_handler))
        .route("/api/location", post(location_handler))
        .route("/api/nearby", get(nearby_handler))
        .layer(cors)
        .with_state(state)
}

async fn session_handler(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session().snapshot())
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Debounced search-as-you-type lookup. Each request takes a ticket, waits
/// out the inactivity window and re-checks the ticket before issuing the
/// lookup, so rapid keystrokes supersede each other and only the most recent
/// query's results are kept.
async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let (ticket, bias) = {
        let mut session = state.session();
        let bias = match (params.lat, params.lon) {
            (Some(lat), Some(lon)) => Coordinate { lat, lon },
            _ => session.location(),
        };
        (session.begin_search(), bias)
    };

    if params.q.trim().is_empty() {
        state.session().apply_search(ticket, Vec::new());
        return Json(SearchResponse {
            results: Vec::new(),
        });
    }

    tokio::time::sleep(state.search_debounce).await;
    if !state.session().search_is_current(ticket) {
        return Json(SearchResponse {
            results: Vec::new(),
        });
    }

    let results = state.geocoder.search(&params.q, bias).await;
    let applied = state.session().apply_search(ticket, results.clone());
    Json(SearchResponse {
        results: if applied { results } else { Vec::new() },
    })
}

async fn mode_handler(
    State(state): State<AppState>,
    Json(req): Json<ModeRequest>,
) -> Json<SessionSnapshot> {
    let mut session = state.session();
    session.set_mode(req.mode);
    Json(session.snapshot())
}

async fn destination_handler(
    State(state): State<AppState>,
    Json(result): Json<SearchResult>,
) -> Json<SessionSnapshot> {
    let mut session = state.session();
    session.select_destination(result);
    Json(session.snapshot())
}

async fn location_handler(
    State(state): State<AppState>,
    Json(update): Json<LocationUpdate>,
) -> Json<SessionSnapshot> {
    let mut session = state.session();
    session.update_location(update.coordinate, update.accuracy_m);
    Json(session.snapshot())
}

/// Route to the selected destination, or to a synthetic routable point
/// nearby when none is selected. A request superseded by a newer one has its
/// result discarded, mirroring the search debounce rule.
async fn directions_handler(State(state): State<AppState>) -> Json<DirectionsResponse> {
    let (ticket, origin, mode, destination) = {
        let mut session = state.session();
        (
            session.begin_directions(),
            session.location(),
            session.mode(),
            session.destination().map(|d| d.coordinate),
        )
    };

    let mut rng = StdRng::from_os_rng();
    let end = match destination {
        Some(coordinate) => coordinate,
        None => {
            match state
                .route_fetcher
                .nearest_routable_point(origin, mode, &mut rng)
                .await
            {
                Ok(point) => point,
                Err(err) => {
                    tracing::warn!("could not synthesize destination: {err}");
                    let notice = err.notice();
                    state
                        .session()
                        .apply_directions(ticket, None, false, Some(notice.clone()));
                    return Json(DirectionsResponse {
                        route: None,
                        fallback: false,
                        notice: Some(notice),
                    });
                }
            }
        }
    };

    let fetched = state
        .route_fetcher
        .fetch_route(origin, end, mode, &mut rng)
        .await;
    let notice = fetched
        .fallback
        .then(|| NavError::RouteUnavailable("service unreachable".to_string()).notice());

    let applied = state.session().apply_directions(
        ticket,
        Some(fetched.route.clone()),
        fetched.fallback,
        notice.clone(),
    );
    if !applied {
        return Json(DirectionsResponse {
            route: None,
            fallback: false,
            notice: None,
        });
    }

    Json(DirectionsResponse {
        route: Some(fetched.route),
        fallback: fetched.fallback,
        notice,
    })
}

async fn nearby_handler(State(state): State<AppState>) -> Json<NearbyMatch> {
    let origin = state.session().location();
    let mut rng = StdRng::from_os_rng();
    Json(state.match_maker.nearby_match(origin, &mut rng).await)
}
