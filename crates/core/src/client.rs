//! HTTP client for the Canopy REST API
//!
//! A thin wrapper over `reqwest` that carries the session cookie on every
//! request and maps responses into the crate's models and errors.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::{ApiError, ApiResult, FALLBACK_MESSAGE};
use crate::models::{
    Ack, CreateReferralRequest, CreatedReferral, Envelope, ForgotPasswordRequest, LoginRequest,
    Node, Position, ReferralLink, ResetPasswordRequest, SessionUser, SignupRequest,
};

/// API paths relative to the base URL
mod paths {
    pub const LOGIN: &str = "/auth/login";
    pub const OTP: &str = "/auth/get-otp";
    pub const SIGNUP: &str = "/auth/signup";
    pub const FORGOT_PASSWORD: &str = "/auth/forgot-password";
    pub const RESET_PASSWORD: &str = "/auth/reset-password";
    pub const LOGOUT: &str = "/auth/logout";
    pub const USER: &str = "/user";
    pub const TREE: &str = "/tree";
    pub const REF: &str = "/ref";
}

/// Cookie jar that can be emptied while the HTTP client keeps using it
#[derive(Default)]
struct SessionJar {
    inner: RwLock<Jar>,
}

impl SessionJar {
    fn add_cookie_str(&self, cookie: &str, url: &Url) {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .add_cookie_str(cookie, url);
    }

    fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Jar::default();
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cookies(url)
    }
}

/// Client for the MLM platform API with a cookie-based session
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
    jar: Arc<SessionJar>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the given base URL (e.g. `http://localhost:5000/api/v1`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if the URL cannot be parsed or has no host.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let base = Url::parse(trimmed).map_err(|e| ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() || base.host().is_none() {
            return Err(ApiError::InvalidUrl {
                url: base_url.to_string(),
                reason: "URL must be absolute with a host".to_string(),
            });
        }

        let jar = Arc::new(SessionJar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(concat!("canopy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::InvalidUrl {
                url: base_url.to_string(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { base, client, jar })
    }

    /// The base URL requests are sent to
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Seed the cookie jar from a saved `Cookie` header value (`a=1; b=2`).
    pub fn restore_cookies(&self, cookie_header: &str) {
        for pair in cookie_header.split(';').map(str::trim) {
            if !pair.is_empty() {
                self.jar.add_cookie_str(pair, &self.base);
            }
        }
    }

    /// Current cookies for the API, formatted as a `Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        self.jar
            .cookies(&self.base)
            .and_then(|value| value.to_str().ok().map(String::from))
            .filter(|value| !value.is_empty())
    }

    /// Forget every cookie held for this client and its clones.
    pub fn clear_cookies(&self) {
        self.jar.clear();
        debug!("Cleared cookies for {}", self.base);
    }

    /// `POST /auth/login`. On success the session cookie lands in the jar.
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<Ack> {
        let builder = self.request(Method::POST, paths::LOGIN)?.json(request);
        self.ack(builder, paths::LOGIN).await
    }

    /// `GET /auth/get-otp?email=` to request a signup verification code.
    pub async fn request_otp(&self, email: &str) -> ApiResult<Ack> {
        let builder = self
            .request(Method::GET, paths::OTP)?
            .query(&[("email", email)]);
        self.ack(builder, paths::OTP).await
    }

    /// `POST /auth/signup`
    pub async fn signup(&self, request: &SignupRequest) -> ApiResult<Ack> {
        let builder = self.request(Method::POST, paths::SIGNUP)?.json(request);
        self.ack(builder, paths::SIGNUP).await
    }

    /// `POST /auth/forgot-password`
    pub async fn forgot_password(&self, request: &ForgotPasswordRequest) -> ApiResult<Ack> {
        let builder = self
            .request(Method::POST, paths::FORGOT_PASSWORD)?
            .json(request);
        self.ack(builder, paths::FORGOT_PASSWORD).await
    }

    /// `POST /auth/reset-password`
    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> ApiResult<Ack> {
        let builder = self
            .request(Method::POST, paths::RESET_PASSWORD)?
            .json(request);
        self.ack(builder, paths::RESET_PASSWORD).await
    }

    /// `POST /auth/logout`
    pub async fn logout(&self) -> ApiResult<Ack> {
        let builder = self.request(Method::POST, paths::LOGOUT)?;
        self.ack(builder, paths::LOGOUT).await
    }

    /// `GET /user`: the identity behind the current session.
    pub async fn me(&self) -> ApiResult<SessionUser> {
        self.get_json(paths::USER).await
    }

    /// `GET /tree`: the placement tree as a flat list of nodes.
    pub async fn tree(&self) -> ApiResult<Vec<Node>> {
        self.get_json(paths::TREE).await
    }

    /// `POST /ref`: create a referral link for a placement side.
    pub async fn create_referral_link(&self, position: Position) -> ApiResult<CreatedReferral> {
        let builder = self
            .request(Method::POST, paths::REF)?
            .json(&CreateReferralRequest { position });
        let body = self.send(builder, paths::REF).await?;
        decode(paths::REF, &body)
    }

    /// `GET /ref`: all referral links of the current user.
    pub async fn referral_links(&self) -> ApiResult<Vec<ReferralLink>> {
        self.get_json(paths::REF).await
    }

    /// `GET /ref/{code}`: details of one referral link.
    pub async fn referral_link(&self, code: &str) -> ApiResult<ReferralLink> {
        let mut url = self.url(paths::REF)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl {
                url: self.base.to_string(),
                reason: "URL cannot hold path segments".to_string(),
            })?
            .push(code);
        let path = format!("{}/{}", paths::REF, code);
        let body = self.send(self.client.get(url), &path).await?;
        decode(&path, &body)
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        let full = format!("{}{}", self.base.as_str().trim_end_matches('/'), path);
        Url::parse(&full).map_err(|e| ApiError::InvalidUrl {
            url: full,
            reason: e.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        Ok(self.client.request(method, self.url(path)?))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let builder = self.request(Method::GET, path)?;
        let body = self.send(builder, path).await?;
        decode(path, &body)
    }

    async fn ack(&self, builder: RequestBuilder, path: &str) -> ApiResult<Ack> {
        let body = self.send(builder, path).await?;
        if body.trim().is_empty() {
            return Ok(Ack::default());
        }
        // Mutation endpoints are loosely typed; a non-JSON body still counts as success
        Ok(serde_json::from_str(&body).unwrap_or_else(|_| Ack {
            message: Some(body.trim().to_string()),
            ..Ack::default()
        }))
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, builder: RequestBuilder, path: &str) -> ApiResult<String> {
        debug!("Sending request to {}", path);
        let transport = |e: reqwest::Error| ApiError::Transport {
            path: path.to_string(),
            source: Box::new(e),
        };

        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        trace!("Response from {}: {} ({} bytes)", path, status, body.len());

        if status.is_success() {
            return Ok(body);
        }

        debug!("Request to {} failed with {}", path, status);
        let is_auth_route = path.starts_with("/auth/");
        if !is_auth_route && matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ApiError::Unauthenticated {
                status: status.as_u16(),
            });
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            message: server_message(&body),
        })
    }
}

/// Decode a JSON body that may be wrapped in `{ "data": ... }`.
fn decode<T: DeserializeOwned>(path: &str, body: &str) -> ApiResult<T> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(Envelope::into_inner)
        .map_err(|e| ApiError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
}

/// The `message` field of an error body, or the generic fallback.
fn server_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}
