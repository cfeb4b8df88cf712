use std::env::VarError;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::anyhow;

use crate::api::Coord;
use crate::feed::ResponseOrdering;
use crate::geo::parse_coordinate_pair;

pub const REQUIRED_VARIABLES: &[&str] = &["NIKOGRID_BACKEND_URL"];

const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/";

pub struct Config {
    pub backend_url: String,
    pub geocoder_url: String,
    pub debounce: Duration,
    pub ordering: ResponseOrdering,
    pub position: Option<Coord>,
    pub http_timeout: Duration,
    pub auth_token: Option<String>,
}

impl Config {
    pub fn env() -> anyhow::Result<Self> {
        Self::from_vars(|name| std::env::var(name))
    }

    pub fn from_vars(var: impl Fn(&str) -> Result<String, VarError>) -> anyhow::Result<Self> {
        let vars = Vars(var);

        let backend_url = vars.env("NIKOGRID_BACKEND_URL")?;
        let geocoder_url = vars.or("NIKOGRID_GEOCODER_URL", DEFAULT_GEOCODER_URL.to_string())?;
        let debounce = Duration::from_millis(vars.or("NIKOGRID_DEBOUNCE_MS", 300)?);
        let ordering = vars.or("NIKOGRID_RESPONSE_ORDERING", ResponseOrdering::default())?;
        let http_timeout = Duration::from_secs(vars.or("NIKOGRID_HTTP_TIMEOUT_SECS", 10)?);
        let auth_token = vars.optional("NIKOGRID_AUTH_TOKEN")?;

        let position = match vars.optional("NIKOGRID_POSITION")? {
            Some(raw) => Some(
                parse_coordinate_pair(&raw)
                    .ok_or_else(|| anyhow!("NIKOGRID_POSITION must be \"lat, lon\", got {raw:?}"))?,
            ),
            None => None,
        };

        Ok(Self {
            backend_url,
            geocoder_url,
            debounce,
            ordering,
            position,
            http_timeout,
            auth_token,
        })
    }

    pub fn log(&self) {
        log::info!("Backend: {}", self.backend_url);
        log::info!("Geocoder: {}", self.geocoder_url);
        log::info!(
            "Debounce: {}ms, ordering: {}",
            self.debounce.as_millis(),
            self.ordering
        );
        log::info!("HTTP timeout: {}s", self.http_timeout.as_secs());
        match self.position {
            Some(position) => log::info!("Position: {position}"),
            None => log::info!("Position: unknown"),
        }
        if self.auth_token.is_some() {
            log::info!("Using session token from NIKOGRID_AUTH_TOKEN");
        }
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Result<String, VarError>> Vars<F> {
    fn env(&self, name: &str) -> anyhow::Result<String> {
        (self.0)(name).map_err(|e| match e {
            VarError::NotPresent => anyhow!("{name} not set"),
            VarError::NotUnicode(_) => anyhow!("{name} value is not valid unicode"),
        })
    }

    fn optional(&self, name: &str) -> anyhow::Result<Option<String>> {
        match (self.0)(name) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(anyhow!("{name} value is not valid unicode")),
        }
    }

    fn or<T>(&self, name: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr + Display,
        T::Err: Display,
    {
        match self.optional(name)? {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| anyhow!("invalid {name} value {raw:?}: {e}")),
            None => {
                log::info!("{name} not set, using default: {default}");
                Ok(default)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Config::from_vars(|name| vars.get(name).cloned().ok_or(VarError::NotPresent))
    }

    #[test]
    fn backend_url_is_required() {
        let e = load(&[]).err().unwrap();
        assert_eq!(e.to_string(), "NIKOGRID_BACKEND_URL not set");
    }

    #[test]
    fn defaults() {
        let config = load(&[("NIKOGRID_BACKEND_URL", "http://localhost:8080")]).unwrap();

        assert_eq!(config.geocoder_url, DEFAULT_GEOCODER_URL);
        assert_eq!(config.debounce, Duration::from_millis(300));
        assert_eq!(config.ordering, ResponseOrdering::LastResolvedWins);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.position, None);
        assert_eq!(config.auth_token, None);
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("NIKOGRID_BACKEND_URL", "http://localhost:8080"),
            ("NIKOGRID_DEBOUNCE_MS", "50"),
            ("NIKOGRID_RESPONSE_ORDERING", "latest-issued"),
            ("NIKOGRID_POSITION", "40.63, -8.65"),
            ("NIKOGRID_AUTH_TOKEN", "abc"),
        ])
        .unwrap();

        assert_eq!(config.debounce, Duration::from_millis(50));
        assert_eq!(config.ordering, ResponseOrdering::LatestIssuedWins);
        assert_eq!(config.position, Some(Coord::new(40.63, -8.65)));
        assert_eq!(config.auth_token.as_deref(), Some("abc"));
    }

    #[test]
    fn rejects_malformed_values() {
        let base = ("NIKOGRID_BACKEND_URL", "http://localhost:8080");

        assert!(load(&[base, ("NIKOGRID_DEBOUNCE_MS", "soon")]).is_err());
        assert!(load(&[base, ("NIKOGRID_RESPONSE_ORDERING", "random")]).is_err());
        assert!(load(&[base, ("NIKOGRID_POSITION", "north")]).is_err());
    }
}
