use std::time::Duration;

use anyhow::anyhow;
use reqwest::Url;

use super::types::Place;
use crate::api::Coord;
use crate::search::Geocoder;

/// Address search against a Nominatim-compatible endpoint.
#[derive(Clone)]
pub struct Nominatim {
    inner: reqwest::Client,
    base: Url,
}

impl Nominatim {
    pub fn new(base: &str, timeout: Duration) -> anyhow::Result<Self> {
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };

        let base = normalized
            .parse()
            .map_err(|e| anyhow!("{} is not a valid url: {}", base, e))?;

        let inner = reqwest::Client::builder()
            .user_agent(concat!("nikogrid-client/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { inner, base })
    }

    pub async fn search(&self, query: &str) -> anyhow::Result<Vec<Place>> {
        let url = self
            .base
            .join("search")
            .map_err(|e| anyhow!("error joining url: {e}"))?;

        let places = self
            .inner
            .get(url)
            .query(&[("format", "json"), ("limit", "1"), ("q", query)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(places)
    }
}

impl Geocoder for Nominatim {
    async fn locate(&self, query: &str) -> anyhow::Result<Coord> {
        let places = self.search(query).await?;
        let place = places
            .first()
            .ok_or_else(|| anyhow!("no results for {query:?}"))?;

        place_coord(place)
    }
}

fn place_coord(place: &Place) -> anyhow::Result<Coord> {
    let lat = place
        .lat
        .trim()
        .parse()
        .map_err(|e| anyhow!("invalid latitude {:?}: {e}", place.lat))?;
    let lon = place
        .lon
        .trim()
        .parse()
        .map_err(|e| anyhow!("invalid longitude {:?}: {e}", place.lon))?;

    Ok(Coord::new(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_coordinates_are_parsed_from_strings() {
        let places: Vec<Place> = serde_json::from_str(
            r#"[{"lat": "40.6405", "lon": "-8.6538", "display_name": "Aveiro, Portugal"}]"#,
        )
        .unwrap();

        assert_eq!(place_coord(&places[0]).unwrap(), Coord::new(40.6405, -8.6538));
    }

    #[test]
    fn malformed_place_is_an_error() {
        let place = Place {
            lat: "north".into(),
            lon: "0".into(),
            display_name: None,
        };
        assert!(place_coord(&place).is_err());
    }
}
