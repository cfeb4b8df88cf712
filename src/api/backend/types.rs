use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::Coord;

/// A renderable map entity as returned by `/locations/nearby`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "t")]
pub enum InterestPoint {
    #[serde(rename = "C")]
    Cluster {
        lat: f64,
        lon: f64,

        #[serde(rename = "numPoints")]
        num_points: u64,
    },

    #[serde(rename = "L")]
    Location {
        id: i64,
        lat: f64,
        lon: f64,

        #[serde(rename = "n")]
        name: String,
    },
}

impl InterestPoint {
    pub fn coord(&self) -> Coord {
        match self {
            InterestPoint::Cluster { lat, lon, .. } | InterestPoint::Location { lat, lon, .. } => {
                Coord::new(*lat, *lon)
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LocationDetails {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,

    #[serde(default)]
    pub chargers: Vec<Charger>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Charger {
    pub id: i64,
    pub name: String,

    #[serde(rename = "isAvailable")]
    pub is_available: bool,

    #[serde(rename = "maxPower")]
    pub max_power: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreateLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreateCharger {
    pub name: String,
    pub available: bool,

    #[serde(rename = "maxPower")]
    pub max_power: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreateReservation {
    // the backend names this field `chargedId`
    #[serde(rename = "chargedId")]
    pub charger_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Reservation {
    pub id: i64,

    #[serde(rename = "chargerId")]
    pub charger_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReservationListing {
    pub id: i64,

    #[serde(rename = "chargerId")]
    pub charger_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub charger: String,
    pub location: String,

    #[serde(rename = "maxPower")]
    pub max_power: f64,
}

impl ReservationListing {
    /// A reservation is past once its start is no longer in the future.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.start <= now
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    pub id: uuid::Uuid,
    pub email: String,

    #[serde(rename = "isAdmin", alias = "admin", default)]
    pub is_admin: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AuthResponse {
    pub message: String,
}

/// RFC 7807 body the backend attaches to every error status.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProblemDetail {
    pub status: Option<u16>,
    pub title: Option<String>,
    pub detail: Option<String>,
}

impl ProblemDetail {
    pub fn describe(&self) -> &str {
        self.detail
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("no details")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tagged_interest_points() {
        let body = r#"[
            {"t": "C", "lat": 40.5, "lon": -8.2, "numPoints": 12},
            {"t": "L", "lat": 40.6, "lon": -8.6, "id": 7, "n": "Aveiro Forum"}
        ]"#;

        let points: Vec<InterestPoint> = serde_json::from_str(body).unwrap();

        assert_eq!(
            points,
            vec![
                InterestPoint::Cluster {
                    lat: 40.5,
                    lon: -8.2,
                    num_points: 12
                },
                InterestPoint::Location {
                    id: 7,
                    lat: 40.6,
                    lon: -8.6,
                    name: "Aveiro Forum".into()
                },
            ]
        );
        assert_eq!(points[1].coord(), Coord::new(40.6, -8.6));
    }

    #[test]
    fn rejects_unknown_interest_point_tag() {
        let body = r#"{"t": "X", "lat": 0.0, "lon": 0.0}"#;
        assert!(serde_json::from_str::<InterestPoint>(body).is_err());
    }

    #[test]
    fn reservation_request_uses_backend_field_names() {
        let request = CreateReservation {
            charger_id: 3,
            start: "2026-10-20T09:00:00Z".parse().unwrap(),
            end: "2026-10-20T10:30:00Z".parse().unwrap(),
        };

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["chargedId"], 3);
        assert_eq!(json["start"], "2026-10-20T09:00:00Z");
    }

    #[test]
    fn listing_is_past_from_its_start() {
        let listing = ReservationListing {
            id: 1,
            charger_id: 2,
            start: "2026-10-19T10:00:00Z".parse().unwrap(),
            end: "2026-10-19T12:00:00Z".parse().unwrap(),
            charger: "CCS #1".into(),
            location: "Aveiro Forum".into(),
            max_power: 50.0,
        };

        assert!(listing.is_past("2026-10-19T10:00:00Z".parse().unwrap()));
        assert!(!listing.is_past("2026-10-19T09:59:59Z".parse().unwrap()));
    }

    #[test]
    fn problem_prefers_detail_over_title() {
        let problem = ProblemDetail {
            status: Some(400),
            title: Some("Bad Request".into()),
            detail: None,
        };
        assert_eq!(problem.describe(), "Bad Request");
        assert_eq!(ProblemDetail::default().describe(), "no details");
    }
}
