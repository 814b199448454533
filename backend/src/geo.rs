use shared::Coordinate;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters via the haversine formula.
pub fn distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Forward geodesic projection: the point `distance_m` meters from `origin`
/// along `bearing_rad`, bearing measured clockwise from north.
pub fn destination(origin: Coordinate, distance_m: f64, bearing_rad: f64) -> Coordinate {
    let angular_distance = distance_m / EARTH_RADIUS_M;
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();

    let lat2 = f64::asin(
        lat1.sin() * angular_distance.cos()
            + lat1.cos() * angular_distance.sin() * bearing_rad.cos(),
    );
    let lon2 = lon1
        + f64::atan2(
            bearing_rad.sin() * angular_distance.sin() * lat1.cos(),
            angular_distance.cos() - lat1.sin() * lat2.sin(),
        );

    Coordinate {
        lat: lat2.to_degrees(),
        lon: normalize_longitude(lon2.to_degrees()),
    }
}

fn normalize_longitude(lon: f64) -> f64 {
    let mut normalized = lon;
    while normalized <= -180.0 {
        normalized += 360.0;
    }
    while normalized > 180.0 {
        normalized -= 360.0;
    }
    normalized
}

/// Human-readable distance: whole meters below 1 km, kilometers with one
/// decimal below 5 km and none at or above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        return format!("{} m", meters.round() as i64);
    }
    let km = meters / 1000.0;
    if km < 5.0 {
        format!("{km:.1} km")
    } else {
        format!("{km:.0} km")
    }
}

/// Human-readable duration from minutes: whole minutes below an hour, hours
/// and remaining minutes above, minutes suffix omitted when the remainder
/// is zero.
pub fn format_duration(minutes: f64) -> String {
    let total = minutes.round() as i64;
    if total < 60 {
        return format!("{total} min");
    }
    let hours = total / 60;
    let remainder = total % 60;
    if remainder == 0 {
        format!("{hours} hr")
    } else {
        format!("{hours} hr {remainder} min")
    }
}
