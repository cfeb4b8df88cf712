use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use super::types::*;
use crate::api::{ApiError, Coord};
use crate::geo::ViewportBounds;
use crate::session::{AUTH_COOKIE, Session};

#[derive(Clone)]
pub struct Client {
    inner: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
}

impl Client {
    pub fn new(base: &str, timeout: Duration) -> anyhow::Result<Self> {
        // relative joins only keep the base path when it ends with a slash
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };

        let base: Url = normalized
            .parse()
            .map_err(|e| anyhow!("{} is not a valid url: {}", base, e))?;

        let jar = Arc::new(Jar::default());
        let inner = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .build()?;

        Ok(Self { inner, jar, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Seeds the session cookie, e.g. from a token saved by an earlier login.
    pub fn with_token(self, token: &str) -> Self {
        self.jar
            .add_cookie_str(&format!("{AUTH_COOKIE}={token}; Path=/"), &self.base);
        self
    }

    /// Raw value of the session cookie, if the backend has set one.
    pub fn token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let header = header.to_str().ok()?;
        crate::session::cookie_value(header, AUTH_COOKIE).map(str::to_string)
    }

    pub fn session(&self) -> Session {
        self.token()
            .map(|token| Session::from_token(&token))
            .unwrap_or_default()
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::Url(format!("error joining url: {e}")))
    }

    pub async fn nearby(
        &self,
        bounds: &ViewportBounds,
        only_active: bool,
    ) -> Result<Vec<InterestPoint>, ApiError> {
        let url = self.url("api/v1/locations/nearby")?;

        let mut query = vec![
            ("w", bounds.west.to_string()),
            ("n", bounds.north.to_string()),
            ("e", bounds.east.to_string()),
            ("s", bounds.south.to_string()),
            ("z", bounds.zoom.to_string()),
        ];
        if only_active {
            query.push(("onlyActive", "true".to_string()));
        }

        let response = self.inner.get(url).query(&query).send().await?;
        read(response).await
    }

    pub async fn closest(&self, at: Coord) -> Result<Location, ApiError> {
        let url = self.url("api/v1/locations/closest")?;

        let response = self
            .inner
            .get(url)
            .query(&[("lat", at.lat), ("lon", at.lon)])
            .send()
            .await?;

        read(response).await
    }

    pub async fn location(&self, id: i64) -> Result<LocationDetails, ApiError> {
        let url = self.url(&format!("api/v1/locations/{id}"))?;
        let response = self.inner.get(url).send().await?;
        read(response).await
    }

    pub async fn create_location(&self, r: &CreateLocation) -> Result<Location, ApiError> {
        let url = self.url("api/v1/locations/")?;
        let response = self.inner.post(url).json(r).send().await?;
        read(response).await
    }

    pub async fn create_charger(
        &self,
        location_id: i64,
        r: &CreateCharger,
    ) -> Result<Charger, ApiError> {
        let url = self.url(&format!("api/v1/locations/{location_id}/chargers"))?;
        let response = self.inner.post(url).json(r).send().await?;
        read(response).await
    }

    pub async fn reservations(&self) -> Result<Vec<ReservationListing>, ApiError> {
        let url = self.url("api/v1/reservations/")?;
        let response = self.inner.get(url).send().await?;
        read(response).await
    }

    pub async fn create_reservation(
        &self,
        r: &CreateReservation,
    ) -> Result<Reservation, ApiError> {
        let url = self.url("api/v1/reservations/")?;
        let response = self.inner.post(url).json(r).send().await?;
        read(response).await
    }

    pub async fn cancel_reservation(&self, id: i64) -> Result<(), ApiError> {
        let url = self.url(&format!("api/v1/reservations/{id}"))?;
        let response = self.inner.delete(url).send().await?;
        expect_success(response).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let url = self.url("api/v1/auth/login")?;
        let response = self.inner.post(url).json(credentials).send().await?;
        read(response).await
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let url = self.url("api/v1/auth/register")?;
        let response = self.inner.post(url).json(credentials).send().await?;
        read(response).await
    }

    pub async fn logout(&self) -> Result<AuthResponse, ApiError> {
        let url = self.url("api/v1/auth/logout")?;
        let response = self.inner.get(url).send().await?;
        read(response).await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        let url = self.url("api/v1/auth/me")?;
        let response = self.inner.get(url).send().await?;
        read(response).await
    }
}

async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check(response).await?;
    let body = response.bytes().await?;

    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

async fn expect_success(response: Response) -> Result<(), ApiError> {
    check(response).await.map(|_| ())
}

async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // not every rejection carries a problem body (e.g. proxies, 405s)
    let problem = response
        .json::<ProblemDetail>()
        .await
        .unwrap_or_else(|_| ProblemDetail {
            status: Some(status.as_u16()),
            title: status.canonical_reason().map(str::to_string),
            detail: None,
        });

    log::debug!("backend rejected request with {status}: {}", problem.describe());

    Err(ApiError::Status { status, problem })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = Client::new("http://localhost:8080/backend", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base().as_str(), "http://localhost:8080/backend/");

        let url = client.url("api/v1/locations/nearby").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/backend/api/v1/locations/nearby");
    }

    #[test]
    fn rejects_invalid_base() {
        assert!(Client::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn seeded_token_becomes_session() {
        use base64::Engine as _;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"driver@nikogrid.pt"}"#);
        let token = format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig");

        let client = Client::new("http://localhost:8080", Duration::from_secs(1))
            .unwrap()
            .with_token(&token);

        assert_eq!(client.token().as_deref(), Some(token.as_str()));
        assert_eq!(
            client.session(),
            Session::User {
                email: "driver@nikogrid.pt".into()
            }
        );
    }
}
