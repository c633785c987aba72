//! REST client for the events API.
//!
//! Every call issues at most one request and returns an [`ApiResult`]; no
//! error escapes as anything other than an [`ApiError`]. Calls that need a
//! session check the [`SessionStore`] first and fail with an `auth` error
//! without touching the network.

pub mod normalize;

use std::time::Duration;

use anyhow::{Context, Result};
use evento_types::{
    ApiError, ApiResult, AttendeesPayload, AuthStatus, CategoriesPayload, Category, Empty, Event,
    EventPayload, EventsPayload, NewEvent, SigninPayload, User,
};
use reqwest::header::{COOKIE, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::session::{Session, SessionStore};

/// Standard User-Agent header for evento API requests.
pub const USER_AGENT: &str = concat!("evento/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`EventoClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    /// Builds client settings from the loaded config.
    ///
    /// # Errors
    /// Returns an error if the resolved base URL is invalid.
    pub fn from_config(config: &Config, base_url_flag: Option<&str>) -> Result<Self> {
        Ok(Self {
            base_url: config.resolve_base_url(base_url_flag)?,
            timeout: config.request_timeout(),
        })
    }
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SigninRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SigninResponse {
    auth_token: Value,
    user: Value,
}

#[derive(Deserialize)]
struct AuthenticationResponse {
    #[serde(default)]
    authenticated: bool,
}

/// How a non-2xx body is turned into an error.
enum ErrorShape {
    /// Merge `type`/`message`/`messages` over a default error.
    Merge(ApiError),
    /// Per-field validation map.
    Validation,
}

/// Events API client.
pub struct EventoClient<S> {
    config: ClientConfig,
    http: reqwest::Client,
    session: S,
}

impl<S: SessionStore> EventoClient<S> {
    /// Creates a client bound to a session store.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, session: S) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            http,
            session,
        })
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// `GET /events/:id`
    pub async fn get_event(&self, event_id: u64) -> ApiResult<EventPayload> {
        let request = self.request(Method::GET, &format!("/events/{event_id}"));
        let event: Event = self.fetch_json(request, generic()).await?;
        Ok(EventPayload { event })
    }

    /// `GET /events`
    pub async fn get_events(&self) -> ApiResult<EventsPayload> {
        let request = self.request(Method::GET, "/events");
        let events: Vec<Event> = self.fetch_json(request, generic()).await?;
        Ok(EventsPayload { events })
    }

    /// `GET /events/:id/attendees`
    pub async fn get_attendees(&self, event_id: u64) -> ApiResult<AttendeesPayload> {
        let request = self.request(Method::GET, &format!("/events/{event_id}/attendees"));
        let attendees: Vec<User> = self.fetch_json(request, generic()).await?;
        Ok(AttendeesPayload { attendees })
    }

    /// `GET /categories`
    pub async fn get_categories(&self) -> ApiResult<CategoriesPayload> {
        let request = self.request(Method::GET, "/categories");
        let categories: Vec<Category> = self.fetch_json(request, generic()).await?;
        Ok(CategoriesPayload { categories })
    }

    /// `GET /users/:id/events` for the signed-in user.
    pub async fn get_user_events(&self) -> ApiResult<EventsPayload> {
        let user = self.session.user().ok_or_else(ApiError::not_logged_in)?;
        let request = self.request(Method::GET, &format!("/users/{}/events", user.id));
        let events: Vec<Event> = self.fetch_json(request, generic()).await?;
        Ok(EventsPayload { events })
    }

    /// Joins (`POST`) or leaves (`DELETE`) an event.
    pub async fn update_is_attending(&self, event_id: u64, is_attending: bool) -> ApiResult<Empty> {
        self.require_login()?;
        let method = if is_attending {
            Method::POST
        } else {
            Method::DELETE
        };
        let request = self.request(method, &format!("/events/{event_id}/attendees"));
        self.execute(request, ErrorShape::Merge(ApiError::something_went_wrong()))
            .await?;
        Ok(Empty {})
    }

    /// `POST /events`
    ///
    /// Validation messages for `image_url` are also reported under `image`.
    pub async fn create_new_event(&self, event: &NewEvent) -> ApiResult<EventPayload> {
        self.require_login()?;
        let request = self.request(Method::POST, "/events").json(event);
        let response = self
            .execute(request, ErrorShape::Validation)
            .await
            .map_err(normalize::alias_image_field)?;
        let event: Event = decode(response).await?;
        Ok(EventPayload { event })
    }

    /// `POST /users`
    pub async fn register(&self, name: &str, email: &str, password: &str) -> ApiResult<Empty> {
        let body = RegisterRequest {
            name,
            email,
            password,
        };
        let request = self.request(Method::POST, "/users").json(&body);
        self.execute(request, ErrorShape::Validation).await?;
        Ok(Empty {})
    }

    /// `POST /authenticate`; on success the credentials are stored in the
    /// session.
    pub async fn signin(&self, email: &str, password: &str) -> ApiResult<SigninPayload> {
        let body = SigninRequest { email, password };
        let request = self.request(Method::POST, "/authenticate").json(&body);
        let response: SigninResponse = self
            .fetch_json(request, ApiError::invalid_credentials())
            .await?;

        let session = Session {
            auth_token: response.auth_token,
            user: response.user,
        };
        if let Err(err) = self.session.save(&session) {
            tracing::warn!(error = %format!("{err:#}"), "failed to persist session");
        }

        Ok(SigninPayload {
            user: session.user,
            auth_token: session.auth_token,
        })
    }

    /// `GET /authentication`; resets the session when the server no longer
    /// recognizes it.
    pub async fn get_authentication_status(&self) -> ApiResult<AuthStatus> {
        if !self.session.is_logged_in() {
            return Ok(AuthStatus {
                is_authenticated: false,
            });
        }

        let request = self.request(Method::GET, "/authentication");
        let response: AuthenticationResponse = self.fetch_json(request, generic()).await?;
        if !response.authenticated {
            tracing::info!("server reports session expired, clearing it");
            if let Err(err) = self.session.reset() {
                tracing::warn!(error = %format!("{err:#}"), "failed to reset session");
            }
        }

        Ok(AuthStatus {
            is_authenticated: response.authenticated,
        })
    }

    fn require_login(&self) -> ApiResult<()> {
        if self.session.is_logged_in() {
            Ok(())
        } else {
            tracing::debug!("request needs a session, none present");
            Err(ApiError::not_logged_in())
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Builds a request carrying the session cookies, if any.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        let Some(session) = self.session.load() else {
            return builder;
        };

        match session
            .cookie_header()
            .ok()
            .and_then(|h| HeaderValue::from_str(&h).ok())
        {
            Some(value) => builder.header(COOKIE, value),
            None => {
                tracing::warn!("session cookies could not be encoded, sending without them");
                builder
            }
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        default_error: ApiError,
    ) -> ApiResult<T> {
        let response = self
            .execute(request, ErrorShape::Merge(default_error))
            .await?;
        decode(response).await
    }

    /// Sends a request and turns transport failures and non-2xx statuses into
    /// errors.
    async fn execute(&self, request: RequestBuilder, shape: ErrorShape) -> ApiResult<Response> {
        let response = request.send().await.map_err(|err| {
            tracing::warn!(error = %err, "request failed");
            ApiError::something_went_wrong()
        })?;

        let status = response.status();
        tracing::debug!(
            path = %response.url().path(),
            status = status.as_u16(),
            "response received"
        );
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.map_err(|err| {
            tracing::warn!(error = %err, "failed to read error body");
            ApiError::something_went_wrong()
        })?;
        let error = match shape {
            ErrorShape::Merge(default) => normalize::merge_error_body(default, &body),
            ErrorShape::Validation => normalize::validation_error(&body),
        };
        tracing::warn!(
            status = status.as_u16(),
            kind = %error.kind,
            message = %error.message,
            "request rejected"
        );
        Err(error)
    }
}

fn generic() -> ApiError {
    ApiError::something_went_wrong()
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    response.json::<T>().await.map_err(|err| {
        tracing::warn!(error = %err, "failed to decode response body");
        ApiError::something_went_wrong()
    })
}
