//! Reservation flows: book, list and cancel.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use reqwest::StatusCode;

use crate::api::ApiError;
use crate::api::backend::{Client, CreateReservation, Reservation, ReservationListing};
use crate::notice::Notifier;

pub const LOCAL_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

const UNKNOWN_ERROR: &str = "An unknown error has occurred. Try again later.";

/// Interprets a `YYYY-MM-DDTHH:MM` input in the local time zone.
pub fn parse_local(input: &str) -> Result<DateTime<Utc>, ApiError> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), LOCAL_INPUT_FORMAT)
        .map_err(|e| ApiError::Validation(format!("invalid date {input:?}: {e}")))?;

    Local
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ApiError::Validation(format!("{input} is ambiguous in the local time zone")))
}

/// User-facing message for a failed booking.
pub fn booking_error_message(e: &ApiError) -> String {
    match e {
        ApiError::Validation(message) => message.clone(),
        ApiError::Status { status, problem } if *status == StatusCode::BAD_REQUEST => {
            problem.describe().to_string()
        }
        ApiError::Status { status, .. } if *status == StatusCode::CONFLICT => {
            "Reservation overlaps with existing reservation for charger".to_string()
        }
        _ => UNKNOWN_ERROR.to_string(),
    }
}

pub async fn book(
    client: &Client,
    notices: &Notifier,
    charger_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Reservation, ApiError> {
    let request = CreateReservation {
        charger_id,
        start,
        end,
    };

    match client.create_reservation(&request).await {
        Ok(reservation) => {
            log::info!(
                "reserved charger {charger_id} from {start} to {end} as #{}",
                reservation.id
            );
            notices.success("Reservation created successfully");
            Ok(reservation)
        }
        Err(e) => {
            log::warn!("reservation for charger {charger_id} failed: {e}");
            notices.error(booking_error_message(&e));
            Err(e)
        }
    }
}

pub async fn list(client: &Client) -> Result<Vec<ReservationListing>, ApiError> {
    client.reservations().await
}

pub async fn cancel(client: &Client, notices: &Notifier, id: i64) -> Result<(), ApiError> {
    match client.cancel_reservation(id).await {
        Ok(()) => {
            notices.success("Cancelled reservation successfully");
            Ok(())
        }
        Err(e) => {
            log::warn!("cancelling reservation {id} failed: {e}");
            notices.error(UNKNOWN_ERROR);
            Err(e)
        }
    }
}
