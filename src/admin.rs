//! Admin-only creation of locations and chargers.

use crate::api::ApiError;
use crate::api::backend::{Charger, Client, CreateCharger, CreateLocation, Location, User};
use crate::geo::is_valid_lat_lon;
use crate::notice::Notifier;

pub fn validate_location(name: &str, lat: f64, lon: f64) -> Result<CreateLocation, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Location name can't be empty".into()));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ApiError::Validation(
            "Latitude must be between -90 and 90".into(),
        ));
    }
    if !is_valid_lat_lon(lat, lon) {
        return Err(ApiError::Validation(
            "Longitude must be between -180 and 180".into(),
        ));
    }

    Ok(CreateLocation {
        name: name.to_string(),
        lat,
        lon,
    })
}

pub fn validate_charger(name: &str, max_power: f64) -> Result<CreateCharger, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Charger name can't be empty".into()));
    }
    if !max_power.is_finite() || max_power < 0.0 {
        return Err(ApiError::Validation(
            "The maximum power of the charger has to be a non-negative number".into(),
        ));
    }

    Ok(CreateCharger {
        name: name.to_string(),
        available: true,
        max_power,
    })
}

/// Fails unless the session belongs to an admin.
pub async fn require_admin(client: &Client) -> Result<User, ApiError> {
    let user = client.me().await?;
    if !user.is_admin {
        return Err(ApiError::Forbidden(format!("{} is not an admin", user.email)));
    }

    Ok(user)
}

fn error_message(e: &ApiError) -> String {
    match e {
        ApiError::Validation(message) | ApiError::Forbidden(message) => message.clone(),
        ApiError::Status { problem, .. } => format!(
            "An error has occurred: {}",
            problem.title.as_deref().unwrap_or_else(|| problem.describe())
        ),
        other => format!("An error has occurred: {other}"),
    }
}

pub async fn create_location(
    client: &Client,
    notices: &Notifier,
    name: &str,
    lat: f64,
    lon: f64,
) -> Result<Location, ApiError> {
    let result = async {
        let request = validate_location(name, lat, lon)?;
        require_admin(client).await?;
        client.create_location(&request).await
    }
    .await;

    match result {
        Ok(location) => {
            notices.success(format!("The location {} was created", location.name));
            Ok(location)
        }
        Err(e) => {
            notices.error(error_message(&e));
            Err(e)
        }
    }
}

pub async fn create_charger(
    client: &Client,
    notices: &Notifier,
    location_id: i64,
    name: &str,
    max_power: f64,
) -> Result<Charger, ApiError> {
    let result = async {
        let request = validate_charger(name, max_power)?;
        require_admin(client).await?;
        client.create_charger(location_id, &request).await
    }
    .await;

    match result {
        Ok(charger) => {
            notices.success(format!("The charger {} was created", charger.name));
            Ok(charger)
        }
        Err(e) => {
            notices.error(error_message(&e));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::backend::ProblemDetail;
    use reqwest::StatusCode;

    #[test]
    fn location_form_rules() {
        assert!(validate_location("Aveiro Forum", 40.64, -8.65).is_ok());
        assert!(validate_location("  ", 40.64, -8.65).is_err());
        assert!(validate_location("Pole", 90.5, 0.0).is_err());

        // longitudes beyond +-90 are valid, only +-180 is the limit
        assert!(validate_location("Fiji", -17.7, 178.0).is_ok());
        assert!(validate_location("Nowhere", 0.0, 180.5).is_err());
    }

    #[test]
    fn charger_form_rules() {
        let request = validate_charger("CCS #1", 50.0).unwrap();
        assert!(request.available);
        assert!(validate_charger("", 50.0).is_err());
        assert!(validate_charger("CCS #2", f64::NAN).is_err());
        assert!(validate_charger("CCS #3", -1.0).is_err());
    }

    #[test]
    fn failure_notice_uses_problem_title() {
        let e = ApiError::Status {
            status: StatusCode::FORBIDDEN,
            problem: ProblemDetail {
                status: Some(403),
                title: Some("Forbidden".into()),
                detail: Some("Access is denied".into()),
            },
        };
        assert_eq!(error_message(&e), "An error has occurred: Forbidden");
    }
}
