//! Coordinate parsing and viewport bounds.

use crate::api::Coord;

/// Highest zoom level the backend accepts for `/locations/nearby`.
pub const MAX_ZOOM: u8 = 18;

/// Parses `"lat, lon"` free text.
///
/// Anything other than exactly two comma-separated finite numbers yields
/// `None`; callers treat that as "try the next resolution strategy".
pub fn parse_coordinate_pair(text: &str) -> Option<Coord> {
    let mut parts = text.split(',');
    let (lat, lon) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }

    Some(Coord { lat, lon })
}

pub fn is_valid_lat_lon(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

/// Rectangle currently visible on the map, plus its zoom level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportBounds {
    pub west: f64,
    pub north: f64,
    pub east: f64,
    pub south: f64,
    pub zoom: u8,
}

impl ViewportBounds {
    /// Checks the constraints the backend enforces on a nearby query.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_lat_lon(self.north, self.west) || !is_valid_lat_lon(self.south, self.east) {
            return Err(format!("bounds out of range: {self}"));
        }
        if self.west > self.east {
            return Err("East must be greater than west".into());
        }
        if self.south > self.north {
            return Err("North must be greater than south".into());
        }
        if self.zoom > MAX_ZOOM {
            return Err(format!("zoom {} above {MAX_ZOOM}", self.zoom));
        }

        Ok(())
    }
}

impl std::fmt::Display for ViewportBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "w={:.5} n={:.5} e={:.5} s={:.5} z={}",
            self.west, self.north, self.east, self.south, self.zoom
        )
    }
}
