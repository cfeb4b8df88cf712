//! "Go to" and "find closest" map actions.
//!
//! Free-text input resolves in order: empty input means the current
//! position, a `lat, lon` pair is used as is, anything else goes to the
//! geocoder.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use anyhow::anyhow;
use log::{debug, warn};

use crate::api::backend::{Client, Location};
use crate::api::{ApiError, Coord};
use crate::camera::Camera;
use crate::geo::{is_valid_lat_lon, parse_coordinate_pair};
use crate::notice::Notifier;

pub const GO_TO_ZOOM: u8 = 15;
pub const CLOSEST_ZOOM: u8 = 17;

const ADDRESS_ERROR: &str = "An error occurred while getting the address";
const CLOSEST_ERROR: &str = "An error occurred while getting the closest station";
const POSITION_ERROR: &str = "Unable to determine the current position";

pub trait Geocoder: Send + Sync {
    fn locate(&self, query: &str) -> impl Future<Output = anyhow::Result<Coord>> + Send;
}

pub trait ClosestLookup: Send + Sync {
    fn closest_to(&self, at: Coord) -> impl Future<Output = Result<Location, ApiError>> + Send;
}

impl ClosestLookup for Client {
    async fn closest_to(&self, at: Coord) -> Result<Location, ApiError> {
        self.closest(at).await
    }
}

/// One-shot position lookup, the stand-in for device geolocation.
pub trait PositionSource: Send + Sync {
    fn current(&self) -> impl Future<Output = anyhow::Result<Coord>> + Send;
}

/// Position taken from configuration; fails when none was configured.
pub struct FixedPosition(pub Option<Coord>);

impl PositionSource for FixedPosition {
    async fn current(&self) -> anyhow::Result<Coord> {
        self.0
            .ok_or_else(|| anyhow!("geolocation is not available, set NIKOGRID_POSITION"))
    }
}

/// Remembers the first position obtained and never asks again.
pub struct CachedPosition<P> {
    inner: P,
    known: Mutex<Option<Coord>>,
}

impl<P> CachedPosition<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            known: Mutex::new(None),
        }
    }

    pub fn known(&self) -> Option<Coord> {
        *self.known.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: PositionSource> PositionSource for CachedPosition<P> {
    async fn current(&self) -> anyhow::Result<Coord> {
        if let Some(known) = self.known() {
            return Ok(known);
        }

        let position = self.inner.current().await?;
        *self.known.lock().unwrap_or_else(PoisonError::into_inner) = Some(position);

        Ok(position)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    CurrentPosition,
    Coordinates(Coord),
    Address(String),
}

impl Query {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            Query::CurrentPosition
        } else if let Some(coord) = parse_coordinate_pair(input) {
            Query::Coordinates(coord)
        } else {
            Query::Address(input.to_string())
        }
    }
}

pub struct Search<L, G, P> {
    lookup: L,
    geocoder: G,
    position: P,
    camera: Camera,
    notices: Notifier,
}

impl<L: ClosestLookup, G: Geocoder, P: PositionSource> Search<L, G, P> {
    pub fn new(lookup: L, geocoder: G, position: P, camera: Camera, notices: Notifier) -> Self {
        Self {
            lookup,
            geocoder,
            position,
            camera,
            notices,
        }
    }

    async fn current_position(&self) -> Option<Coord> {
        match self.position.current().await {
            Ok(position) => Some(position),
            Err(e) => {
                warn!("position lookup failed: {e}");
                self.notices.error(POSITION_ERROR);
                None
            }
        }
    }

    /// Centers the camera on the input. Returns whether the camera moved.
    ///
    /// Out-of-range coordinates abort silently.
    pub async fn go_to(&self, input: &str) -> bool {
        let target = match Query::parse(input) {
            Query::CurrentPosition => match self.current_position().await {
                Some(position) => position,
                None => return false,
            },
            Query::Coordinates(coord) => coord,
            Query::Address(address) => match self.geocoder.locate(&address).await {
                Ok(coord) => coord,
                Err(e) => {
                    warn!("geocoding {address:?} failed: {e}");
                    self.notices.error(ADDRESS_ERROR);
                    return false;
                }
            },
        };

        if !is_valid_lat_lon(target.lat, target.lon) {
            debug!("ignoring out of range target {target}");
            return false;
        }

        self.camera.set_view(target, GO_TO_ZOOM);
        true
    }

    /// Looks up the closest available station and flies to it.
    ///
    /// If the address cannot be geocoded the search falls back to the
    /// current position. The caller highlights the returned location.
    pub async fn find_closest(&self, input: &str) -> Option<Location> {
        let origin = match Query::parse(input) {
            Query::CurrentPosition => self.current_position().await?,
            Query::Coordinates(coord) => coord,
            Query::Address(address) => match self.geocoder.locate(&address).await {
                Ok(coord) => coord,
                Err(e) => {
                    warn!("geocoding {address:?} failed: {e}");
                    self.notices.error(ADDRESS_ERROR);
                    self.current_position().await?
                }
            },
        };

        match self.lookup.closest_to(origin).await {
            Ok(location) => {
                self.camera
                    .set_view(Coord::new(location.lat, location.lon), CLOSEST_ZOOM);
                Some(location)
            }
            Err(e) => {
                warn!("closest station lookup from {origin} failed: {e}");
                self.notices.error(CLOSEST_ERROR);
                None
            }
        }
    }
}
