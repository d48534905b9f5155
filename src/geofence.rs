use serde::{Deserialize, Serialize};

use crate::{consts::{DEFAULT_GEOFENCE_RADIUS_METERS, EARTH_RADIUS_METERS}, entity::geo_location};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl From<&geo_location::Model> for Coordinates {
    fn from(location: &geo_location::Model) -> Self {
        Self::new(location.latitude, location.longitude)
    }
}

/// Great-circle distance in meters
pub fn haversine_distance(from: Coordinates, to: Coordinates) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let delta_phi = (to.latitude - from.latitude).to_radians();
    let delta_lambda = (to.longitude - from.longitude).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);

    EARTH_RADIUS_METERS * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCheck<'a> {
    /// Nearest active office, `None` when no office is configured
    pub location: Option<&'a geo_location::Model>,
    /// Rounded to the nearest meter
    pub distance: i64,
    pub radius: i32,
    pub valid: bool,
}

/// Classifies `point` against the nearest active office.
///
/// Without any active office every point is valid.
pub fn validate(point: Coordinates, locations: &[geo_location::Model]) -> GeoCheck<'_> {
    let mut nearest: Option<(&geo_location::Model, f64)> = None;

    for location in locations.iter().filter(|location| location.is_active) {
        let distance = haversine_distance(point, location.into());

        // Strictly closer only, so the first of equally distant offices wins
        if nearest.is_none_or(|(_, min)| distance < min) {
            nearest = Some((location, distance));
        }
    }

    let Some((location, distance)) = nearest else {
        return GeoCheck {
            location: None,
            distance: 0,
            radius: DEFAULT_GEOFENCE_RADIUS_METERS,
            valid: true,
        }
    };

    let radius = location.radius.filter(|radius| *radius > 0).unwrap_or(DEFAULT_GEOFENCE_RADIUS_METERS);

    GeoCheck {
        location: Some(location),
        distance: distance.round() as i64,
        radius,
        valid: distance <= f64::from(radius),
    }
}
