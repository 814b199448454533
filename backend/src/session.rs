use shared::{Coordinate, Route, SearchResult, SessionSnapshot, TravelMode};

/// Process-lifetime state of one screen session: current fix, selected
/// destination, active route, travel mode and the latest search results.
///
/// Mutated only under the state lock, in short critical sections that never
/// span a network call. In-flight search and directions requests are
/// superseded by newer ones through monotonically increasing tickets; a
/// completion holding a stale ticket is discarded.
#[derive(Debug)]
pub struct Session {
    location: Option<Coordinate>,
    accuracy_m: Option<f64>,
    destination: Option<SearchResult>,
    route: Option<Route>,
    route_is_fallback: bool,
    mode: TravelMode,
    search_results: Vec<SearchResult>,
    notice: Option<String>,
    search_seq: u64,
    directions_seq: u64,
    default_location: Coordinate,
}

impl Session {
    pub fn new(default_location: Coordinate) -> Self {
        Self {
            location: None,
            accuracy_m: None,
            destination: None,
            route: None,
            route_is_fallback: false,
            mode: TravelMode::default(),
            search_results: Vec::new(),
            notice: None,
            search_seq: 0,
            directions_seq: 0,
            default_location,
        }
    }

    /// Active location: the latest fix, or the fixed default region when no
    /// fix ever arrived (location permission denied or not yet granted).
    pub fn location(&self) -> Coordinate {
        self.location.unwrap_or(self.default_location)
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    pub fn destination(&self) -> Option<&SearchResult> {
        self.destination.as_ref()
    }

    /// Update the travel mode. Does not re-route; the caller asks for new
    /// directions explicitly.
    pub fn set_mode(&mut self, mode: TravelMode) {
        self.mode = mode;
    }

    /// Select a destination and drop the now-stale route.
    pub fn select_destination(&mut self, result: SearchResult) {
        self.destination = Some(result);
        self.route = None;
        self.route_is_fallback = false;
        self.notice = None;
    }

    /// Apply a location fix. Never blocks or invalidates pending requests,
    /// and never triggers re-routing on its own.
    pub fn update_location(&mut self, coordinate: Coordinate, accuracy_m: Option<f64>) {
        self.location = Some(coordinate);
        self.accuracy_m = accuracy_m;
    }

    pub fn begin_search(&mut self) -> u64 {
        self.search_seq += 1;
        self.search_seq
    }

    pub fn search_is_current(&self, ticket: u64) -> bool {
        ticket == self.search_seq
    }

    /// Store a completed lookup's results unless a newer search superseded
    /// it. Returns whether the results were applied.
    pub fn apply_search(&mut self, ticket: u64, results: Vec<SearchResult>) -> bool {
        if !self.search_is_current(ticket) {
            tracing::debug!("discarding superseded search result (ticket {ticket})");
            return false;
        }
        self.search_results = results;
        true
    }

    pub fn begin_directions(&mut self) -> u64 {
        self.directions_seq += 1;
        self.directions_seq
    }

    pub fn directions_is_current(&self, ticket: u64) -> bool {
        ticket == self.directions_seq
    }

    /// Replace the active route unless a newer directions request superseded
    /// this one. Returns whether the route was applied.
    pub fn apply_directions(
        &mut self,
        ticket: u64,
        route: Option<Route>,
        fallback: bool,
        notice: Option<String>,
    ) -> bool {
        if !self.directions_is_current(ticket) {
            tracing::debug!("discarding superseded directions result (ticket {ticket})");
            return false;
        }
        self.route = route;
        self.route_is_fallback = fallback;
        self.notice = notice;
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            location: self.location,
            accuracy_m: self.accuracy_m,
            destination: self.destination.clone(),
            route: self.route.clone(),
            route_is_fallback: self.route_is_fallback,
            mode: self.mode,
            search_results: self.search_results.clone(),
            notice: self.notice.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: Coordinate = Coordinate {
        lat: 44.2312,
        lon: -76.4860,
    };

    fn place(label: &str) -> SearchResult {
        SearchResult {
            label: label.to_string(),
            coordinate: Coordinate {
                lat: 44.25,
                lon: -76.50,
            },
            category: "cafe".to_string(),
        }
    }

    fn straight_route() -> Route {
        Route {
            path: vec![
                DEFAULT,
                Coordinate {
                    lat: 44.25,
                    lon: -76.50,
                },
            ],
            distance_m: Some(2_500.0),
            duration_s: Some(600.0),
        }
    }

    #[test]
    fn test_location_falls_back_to_default() {
        let session = Session::new(DEFAULT);
        assert_eq!(session.location(), DEFAULT);
    }

    #[test]
    fn test_location_fix_overwrites_default() {
        let mut session = Session::new(DEFAULT);
        let fix = Coordinate {
            lat: 44.3,
            lon: -76.4,
        };
        session.update_location(fix, Some(12.0));
        assert_eq!(session.location(), fix);
        assert_eq!(session.snapshot().accuracy_m, Some(12.0));
    }

    #[test]
    fn test_select_destination_clears_stale_route() {
        let mut session = Session::new(DEFAULT);
        let ticket = session.begin_directions();
        assert!(session.apply_directions(ticket, Some(straight_route()), false, None));
        assert!(session.snapshot().route.is_some());

        session.select_destination(place("Corner Cafe"));
        let snap = session.snapshot();
        assert!(snap.route.is_none());
        assert_eq!(snap.destination.unwrap().label, "Corner Cafe");
    }

    #[test]
    fn test_set_mode_keeps_route() {
        let mut session = Session::new(DEFAULT);
        let ticket = session.begin_directions();
        session.apply_directions(ticket, Some(straight_route()), false, None);

        session.set_mode(TravelMode::Walk);
        assert_eq!(session.mode(), TravelMode::Walk);
        assert!(session.snapshot().route.is_some(), "mode change must not re-route");
    }

    #[test]
    fn test_stale_search_result_is_discarded() {
        let mut session = Session::new(DEFAULT);
        // "Toro" is issued, then "Toronto" supersedes it
        let toro = session.begin_search();
        let toronto = session.begin_search();

        assert!(session.apply_search(toronto, vec![place("Toronto City Hall")]));
        // The earlier lookup resolves late; its results must be dropped
        assert!(!session.apply_search(toro, vec![place("Toro Restaurant")]));

        let results = session.snapshot().search_results;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "Toronto City Hall");
    }

    #[test]
    fn test_stale_directions_result_is_discarded() {
        let mut session = Session::new(DEFAULT);
        let first = session.begin_directions();
        let second = session.begin_directions();

        assert!(!session.apply_directions(first, Some(straight_route()), false, None));
        assert!(session.snapshot().route.is_none());

        assert!(session.apply_directions(second, Some(straight_route()), true, Some("Routing unavailable, showing straight line".to_string())));
        let snap = session.snapshot();
        assert!(snap.route.is_some());
        assert!(snap.route_is_fallback);
        assert!(snap.notice.is_some());
    }

    #[test]
    fn test_location_update_does_not_disturb_pending_requests() {
        let mut session = Session::new(DEFAULT);
        let search = session.begin_search();
        let directions = session.begin_directions();

        session.update_location(
            Coordinate {
                lat: 44.24,
                lon: -76.49,
            },
            None,
        );

        assert!(session.search_is_current(search));
        assert!(session.directions_is_current(directions));
    }
}
